//! Identifier interning.
//!
//! Every identifier that appears in a program (variable names, field names,
//! method names, type names) is interned exactly once and referred to by a
//! [`NameId`] afterwards. Interning happens during lexing and whenever the
//! runtime manufactures a name at execution time (for example when a native
//! module registers its methods). Reverse lookup is only needed when
//! rendering diagnostics and reprs.

use ahash::AHashMap;

/// Index into the interner's storage.
///
/// Uses `u32` to keep the id small; 4 billion distinct names is far more
/// than any program will produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameId(u32);

impl NameId {
    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Names the interpreter itself needs to look up on every program,
/// pre-interned at construction so hot paths never touch the string map.
#[derive(Debug, Clone, Copy)]
pub struct WellKnown {
    /// `__repr__` — user printing / debugging.
    pub repr: NameId,
    /// `__string__` — string coercion.
    pub string: NameId,
    /// `__bool__` — truthiness coercion.
    pub bool_: NameId,
    /// `__int__` — integer coercion.
    pub int: NameId,
    /// `__real__` — real coercion.
    pub real: NameId,
    /// `__char__` — character coercion.
    pub char_: NameId,
    /// `__read__` — input binding.
    pub read: NameId,
}

/// String interner mapping names to stable integer ids.
///
/// `intern` is idempotent: equal strings always yield equal ids for the
/// lifetime of the interner.
#[derive(Debug, Clone)]
pub struct Interner {
    names: Vec<String>,
    index: AHashMap<String, NameId>,
    well_known: Option<WellKnown>,
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        let mut interner = Self {
            names: Vec::new(),
            index: AHashMap::new(),
            well_known: None,
        };
        interner.well_known = Some(WellKnown {
            repr: interner.intern("__repr__"),
            string: interner.intern("__string__"),
            bool_: interner.intern("__bool__"),
            int: interner.intern("__int__"),
            real: interner.intern("__real__"),
            char_: interner.intern("__char__"),
            read: interner.intern("__read__"),
        });
        interner
    }

    /// Interns `name`, returning its stable id.
    pub fn intern(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = NameId(u32::try_from(self.names.len()).expect("interner overflow"));
        self.names.push(name.to_owned());
        self.index.insert(name.to_owned(), id);
        id
    }

    /// Returns the string for `id`.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this interner.
    #[must_use]
    pub fn name_of(&self, id: NameId) -> &str {
        &self.names[id.index()]
    }

    /// Looks up a name without interning it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<NameId> {
        self.index.get(name).copied()
    }

    /// The pre-interned well-known names.
    #[must_use]
    pub fn well_known(&self) -> WellKnown {
        self.well_known.expect("well-known names are interned in new()")
    }

    /// Number of interned names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut interner = Interner::new();
        let a = interner.intern("alpha");
        let b = interner.intern("beta");
        assert_ne!(a, b);
        assert_eq!(interner.intern("alpha"), a);
        assert_eq!(interner.name_of(a), "alpha");
        assert_eq!(interner.name_of(b), "beta");
    }

    #[test]
    fn well_known_names_resolve() {
        let interner = Interner::new();
        let wk = interner.well_known();
        assert_eq!(interner.name_of(wk.repr), "__repr__");
        assert_eq!(interner.name_of(wk.read), "__read__");
    }
}
