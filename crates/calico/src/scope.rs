//! Lexical scope frames and the evaluation context stack.
//!
//! The scope stack holds one frame per active binding region: the bottom
//! frame owns the global built-ins, function calls push opaque frames
//! (`can_access_prev = false`), and `for` statements push transparent frames
//! for their header variable. Lookup walks inward-out, stops at the first
//! opaque frame, and finally falls back to the global frame so built-ins and
//! top-level definitions stay visible inside function bodies.
//!
//! The context stack runs parallel to evaluation: each entry records the
//! area of the node being evaluated plus one sub-area per operand, so
//! operator adapters can point diagnostics at the operand that was invalid.

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::{area::SourceArea, intern::NameId, value::ObjRef};

/// One entry on the scope stack.
#[derive(Debug)]
pub struct Frame {
    vars: AHashMap<NameId, ObjRef>,
    /// Whether lookup may continue into the frame below.
    pub can_access_prev: bool,
    /// Marks frames created by function invocation.
    pub is_function_call: bool,
    /// The raw positional arguments passed to the call that created this
    /// frame. Empty for non-call frames.
    pub arguments: Vec<ObjRef>,
}

impl Frame {
    fn new(can_access_prev: bool) -> Self {
        Self {
            vars: AHashMap::new(),
            can_access_prev,
            is_function_call: false,
            arguments: Vec::new(),
        }
    }
}

/// The scope stack, innermost frame last.
#[derive(Debug)]
pub struct Scopes {
    frames: Vec<Frame>,
}

impl Scopes {
    /// Creates the stack with the global bottom frame in place.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::new(false)],
        }
    }

    pub fn push_frame(&mut self, can_access_prev: bool) {
        self.frames.push(Frame::new(can_access_prev));
    }

    /// # Panics
    /// Panics on an attempt to pop the global frame.
    pub fn pop_frame(&mut self) {
        assert!(self.frames.len() > 1, "attempted to pop the global scope frame");
        self.frames.pop();
    }

    pub fn set_is_function_call(&mut self, value: bool) {
        self.innermost().is_function_call = value;
    }

    pub fn set_arguments(&mut self, arguments: Vec<ObjRef>) {
        self.innermost().arguments = arguments;
    }

    fn innermost(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("scope stack is never empty")
    }

    /// Introduces (or overwrites) a binding in the innermost frame.
    pub fn add_variable(&mut self, name: NameId, value: ObjRef) {
        self.innermost().vars.insert(name, value);
    }

    /// Walks the accessible chain; falls back to the global frame.
    #[must_use]
    pub fn lookup(&self, name: NameId) -> Option<ObjRef> {
        for frame in self.frames.iter().rev() {
            if let Some(&value) = frame.vars.get(&name) {
                return Some(value);
            }
            if !frame.can_access_prev {
                break;
            }
        }
        self.frames[0].vars.get(&name).copied()
    }

    /// Rebinds `name` in the accessible frame that already holds it, or
    /// binds it in the innermost frame. Never writes through to the global
    /// frame from inside a function body.
    pub fn assign(&mut self, name: NameId, value: ObjRef) {
        let top = self.frames.len() - 1;
        let mut index = top;
        loop {
            let frame = &mut self.frames[index];
            if frame.vars.contains_key(&name) {
                frame.vars.insert(name, value);
                return;
            }
            if !frame.can_access_prev || index == 0 {
                break;
            }
            index -= 1;
        }
        self.frames[top].vars.insert(name, value);
    }

    /// The raw arguments of the nearest enclosing function call.
    ///
    /// Skips frames until one that is both a call frame and an opaque
    /// lookup boundary.
    #[must_use]
    pub fn arguments_of_enclosing_call(&self) -> Option<&[ObjRef]> {
        self.frames
            .iter()
            .rev()
            .find(|frame| frame.is_function_call && !frame.can_access_prev)
            .map(|frame| frame.arguments.as_slice())
    }

    /// Iterates every value reachable from any frame: bindings and raw
    /// argument lists alike. This is the garbage collector's root view of
    /// the scope stack.
    pub fn iter_roots(&self) -> impl Iterator<Item = ObjRef> + '_ {
        self.frames
            .iter()
            .flat_map(|frame| frame.vars.values().copied().chain(frame.arguments.iter().copied()))
    }
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

/// The currently-evaluating node's area plus its operand sub-areas.
#[derive(Debug, Clone)]
pub struct Context {
    pub area: SourceArea,
    pub sub_areas: SmallVec<[SourceArea; 4]>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::Interner;

    fn obj(index: usize) -> ObjRef {
        ObjRef::new(index)
    }

    #[test]
    fn lookup_stops_at_opaque_frames_but_sees_globals() {
        let mut interner = Interner::new();
        let global = interner.intern("global");
        let local = interner.intern("local");

        let mut scopes = Scopes::new();
        scopes.add_variable(global, obj(1));
        scopes.push_frame(false); // function frame
        scopes.add_variable(local, obj(2));
        scopes.push_frame(true); // for-header frame

        assert_eq!(scopes.lookup(local), Some(obj(2)));
        assert_eq!(scopes.lookup(global), Some(obj(1)));

        // An outer function's local is invisible behind an opaque frame.
        scopes.push_frame(false);
        assert_eq!(scopes.lookup(local), None);
        assert_eq!(scopes.lookup(global), Some(obj(1)));
    }

    #[test]
    fn assign_rebinds_where_found() {
        let mut interner = Interner::new();
        let name = interner.intern("total");

        let mut scopes = Scopes::new();
        scopes.push_frame(false);
        scopes.add_variable(name, obj(1));
        scopes.push_frame(true);
        scopes.assign(name, obj(2));
        scopes.pop_frame();
        assert_eq!(scopes.lookup(name), Some(obj(2)));
    }

    #[test]
    fn assign_does_not_write_through_to_globals() {
        let mut interner = Interner::new();
        let name = interner.intern("x");

        let mut scopes = Scopes::new();
        scopes.add_variable(name, obj(1));
        scopes.push_frame(false);
        scopes.assign(name, obj(2));
        assert_eq!(scopes.lookup(name), Some(obj(2)));
        scopes.pop_frame();
        assert_eq!(scopes.lookup(name), Some(obj(1)));
    }

    #[test]
    fn arguments_of_enclosing_call_skips_transparent_frames() {
        let mut scopes = Scopes::new();
        scopes.push_frame(false);
        scopes.set_is_function_call(true);
        scopes.set_arguments(vec![obj(5), obj(6)]);
        scopes.push_frame(true);

        assert_eq!(scopes.arguments_of_enclosing_call(), Some([obj(5), obj(6)].as_slice()));
    }
}
