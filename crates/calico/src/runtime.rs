//! The runtime instance and the public `Runner` API.
//!
//! A [`Runtime`] owns everything a program execution touches: the name
//! table, the type registry, the garbage-collected heap, the scope and
//! context stacks, the scripted-function table, and the pinned singletons.
//! It is constructed once per run and never shares objects with another
//! runtime.
//!
//! [`Runner`] is the embedder's entry point: parse once, run as many times
//! as you like, each run against a fresh runtime.

use std::rc::Rc;

use rand::{SeedableRng, rngs::StdRng};

use crate::{
    area::SourceArea,
    ast::{FuncBlueprint, FuncId, Program, Stmt},
    builtins,
    errors::{Diagnostic, RunResult},
    heap::{Heap, HeapStats, Slot},
    intern::{Interner, NameId, WellKnown},
    interp::{Interp, NativeFn},
    io::{CollectStringPrint, PrintWriter, ReadInput, StrInput},
    lexer::Lexer,
    parser::Parser,
    scope::{Context, Scopes},
    types::{self, BuiltinTypes, TypeDesc, TypeId},
    value::{Function, ObjKind, ObjRef, Payload},
};

/// A scripted function installed at runtime: the immutable parameter list
/// and body shared from the program's blueprint table.
#[derive(Debug, Clone)]
pub struct ScriptedFn {
    pub name: Option<NameId>,
    pub params: Rc<[NameId]>,
    pub body: Rc<Stmt>,
}

/// Process-wide interpreter state for one execution.
pub struct Runtime {
    pub interner: Interner,
    pub heap: Heap,
    pub types: Vec<TypeDesc>,
    pub scopes: Scopes,
    contexts: Vec<Context>,
    /// Scripted functions, one entry per parsed blueprint. Parameter lists
    /// and bodies are immutable once installed here.
    functions: Vec<ScriptedFn>,
    /// Intermediates the evaluator currently holds; scanned as GC roots.
    pub temp_roots: Vec<ObjRef>,
    pub builtin_types: BuiltinTypes,
    pub well_known: WellKnown,
    /// Pinned singletons, never collected.
    pub nothing: ObjRef,
    pub true_: ObjRef,
    pub false_: ObjRef,
    pub call_depth: usize,
    /// Current repr/equality nesting depth; see `interp::MAX_DATA_DEPTH`.
    pub data_depth: usize,
    /// Shared pseudo-random source for the `random` module.
    pub rng: StdRng,
}

impl Runtime {
    /// Builds a runtime: registers the built-in type suite, creates the
    /// pinned singletons, installs every method table, and binds the global
    /// built-ins. `blueprints` is the parsed program's function table.
    #[must_use]
    pub fn new(mut interner: Interner, blueprints: &[FuncBlueprint]) -> Self {
        let well_known = interner.well_known();
        let functions = blueprints
            .iter()
            .map(|blueprint| ScriptedFn {
                name: blueprint.name,
                params: blueprint.params.clone(),
                body: blueprint.body.clone(),
            })
            .collect();
        let mut rt = Self {
            interner,
            heap: Heap::new(),
            types: Vec::new(),
            scopes: Scopes::new(),
            contexts: Vec::new(),
            functions,
            temp_roots: Vec::new(),
            // Placeholder ids, fixed up immediately below once the suite
            // registers.
            builtin_types: BuiltinTypes {
                nothing: TypeId::new(0),
                boolean: TypeId::new(0),
                integer: TypeId::new(0),
                real: TypeId::new(0),
                character: TypeId::new(0),
                string: TypeId::new(0),
                array: TypeId::new(0),
                function: TypeId::new(0),
            },
            well_known,
            nothing: ObjRef::new(0),
            true_: ObjRef::new(0),
            false_: ObjRef::new(0),
            call_depth: 0,
            data_depth: 0,
            rng: StdRng::from_entropy(),
        };

        rt.builtin_types = BuiltinTypes {
            nothing: types::nothing::register(&mut rt),
            boolean: types::boolean::register(&mut rt),
            integer: types::integer::register(&mut rt),
            real: types::real::register(&mut rt),
            character: types::character::register(&mut rt),
            string: types::string::register(&mut rt),
            array: types::array::register(&mut rt),
            function: types::function::register(&mut rt),
        };

        rt.nothing = rt.alloc_pinned(rt.builtin_types.nothing, Payload::Nothing);
        rt.true_ = rt.alloc_pinned(rt.builtin_types.boolean, Payload::Boolean(true));
        rt.false_ = rt.alloc_pinned(rt.builtin_types.boolean, Payload::Boolean(false));

        types::nothing::install_methods(&mut rt);
        types::boolean::install_methods(&mut rt);
        types::integer::install_methods(&mut rt);
        types::real::install_methods(&mut rt);
        types::character::install_methods(&mut rt);
        types::string::install_methods(&mut rt);
        types::array::install_methods(&mut rt);
        types::function::install_methods(&mut rt);

        rt.bind_type_names();
        builtins::install(&mut rt);
        rt
    }

    /// Binds each built-in type's type-itself value under its display name.
    fn bind_type_names(&mut self) {
        for index in 0..self.types.len() {
            let type_id = self.types[index].id;
            let name = self.types[index].name;
            let value = self.make_type_value(type_id);
            self.scopes.add_variable(name, value);
        }
    }

    // ---- type registry ----------------------------------------------------

    /// Registers a new type and returns its id.
    pub fn register_type(&mut self, desc_for: impl FnOnce(TypeId) -> TypeDesc) -> TypeId {
        let id = TypeId::new(self.types.len());
        self.types.push(desc_for(id));
        id
    }

    #[must_use]
    pub fn type_desc(&self, id: TypeId) -> &TypeDesc {
        &self.types[id.index()]
    }

    pub fn type_desc_mut(&mut self, id: TypeId) -> &mut TypeDesc {
        &mut self.types[id.index()]
    }

    /// The display name of a value's type.
    #[must_use]
    pub fn type_name(&self, obj: ObjRef) -> &str {
        let type_id = self.heap.get(obj).type_id;
        self.interner.name_of(self.types[type_id.index()].name)
    }

    // ---- allocation -------------------------------------------------------

    /// Allocates a fresh instance; the new value starts single-use.
    pub fn alloc(&mut self, type_id: TypeId, payload: Payload) -> ObjRef {
        self.heap.allocate(Slot::new(ObjKind::Instance, type_id, payload))
    }

    /// Allocates a permanent value: marked multi-use from the start.
    fn alloc_pinned(&mut self, type_id: TypeId, payload: Payload) -> ObjRef {
        let obj = self.alloc(type_id, payload);
        self.heap.get_mut(obj).single_use = false;
        obj
    }

    pub fn alloc_integer(&mut self, value: i64) -> ObjRef {
        self.alloc(self.builtin_types.integer, Payload::Integer(value))
    }

    pub fn alloc_real(&mut self, value: f64) -> ObjRef {
        self.alloc(self.builtin_types.real, Payload::Real(value))
    }

    pub fn alloc_boolean(&mut self, value: bool) -> ObjRef {
        self.alloc(self.builtin_types.boolean, Payload::Boolean(value))
    }

    pub fn alloc_character(&mut self, value: u8) -> ObjRef {
        self.alloc(self.builtin_types.character, Payload::Character(value))
    }

    pub fn alloc_nothing(&mut self) -> ObjRef {
        self.alloc(self.builtin_types.nothing, Payload::Nothing)
    }

    pub fn alloc_string(&mut self, bytes: Vec<u8>) -> ObjRef {
        self.alloc(self.builtin_types.string, Payload::Str(bytes))
    }

    pub fn alloc_str(&mut self, text: &str) -> ObjRef {
        self.alloc_string(text.as_bytes().to_vec())
    }

    pub fn alloc_array(&mut self, items: Vec<ObjRef>) -> ObjRef {
        self.alloc(self.builtin_types.array, Payload::Array(items))
    }

    /// Allocates a native Function value, pinned multi-use (these are
    /// installed into method tables and global bindings).
    pub fn alloc_native_fn(&mut self, func: NativeFn) -> ObjRef {
        self.alloc_pinned(self.builtin_types.function, Payload::Function(Function::Native(func)))
    }

    pub fn alloc_scripted_fn(&mut self, func: FuncId) -> ObjRef {
        self.alloc(self.builtin_types.function, Payload::Function(Function::Scripted(func)))
    }

    /// Constructs a fresh instance of `type_id` via its `create` entry.
    pub fn make_instance(&mut self, type_id: TypeId) -> ObjRef {
        let create = self.types[type_id.index()].create;
        create(self, type_id)
    }

    /// Allocates the type-itself value for `type_id` (empty payload).
    pub fn make_type_value(&mut self, type_id: TypeId) -> ObjRef {
        let obj = self.heap.allocate(Slot::new(ObjKind::TypeItself, type_id, Payload::Nothing));
        self.heap.get_mut(obj).single_use = false;
        obj
    }

    /// The pinned boolean singleton for `value`.
    #[must_use]
    pub fn protected_boolean(&self, value: bool) -> ObjRef {
        if value { self.true_ } else { self.false_ }
    }

    /// Constructs an independent deep copy via the type's `deep_copy`.
    pub fn deep_copy(&mut self, obj: ObjRef) -> RunResult<ObjRef> {
        let type_id = self.heap.get(obj).type_id;
        let deep_copy = self.types[type_id.index()].deep_copy;
        deep_copy(self, obj)
    }

    // ---- payload access ---------------------------------------------------

    #[must_use]
    pub fn kind_of(&self, obj: ObjRef) -> ObjKind {
        self.heap.get(obj).kind
    }

    #[must_use]
    pub fn type_of(&self, obj: ObjRef) -> TypeId {
        self.heap.get(obj).type_id
    }

    #[must_use]
    pub fn is_instance(&self, obj: ObjRef, type_id: TypeId) -> bool {
        let slot = self.heap.get(obj);
        slot.kind == ObjKind::Instance && slot.type_id == type_id
    }

    /// # Panics
    /// Panics if `obj` is not an Integer instance; callers verify first.
    #[must_use]
    pub fn integer_value(&self, obj: ObjRef) -> i64 {
        match self.heap.get(obj).payload {
            Payload::Integer(value) => value,
            _ => panic!("expected an Integer payload"),
        }
    }

    #[must_use]
    pub fn real_value(&self, obj: ObjRef) -> f64 {
        match self.heap.get(obj).payload {
            Payload::Real(value) => value,
            _ => panic!("expected a Real payload"),
        }
    }

    #[must_use]
    pub fn boolean_value(&self, obj: ObjRef) -> bool {
        match self.heap.get(obj).payload {
            Payload::Boolean(value) => value,
            _ => panic!("expected a Boolean payload"),
        }
    }

    #[must_use]
    pub fn character_value(&self, obj: ObjRef) -> u8 {
        match self.heap.get(obj).payload {
            Payload::Character(value) => value,
            _ => panic!("expected a Character payload"),
        }
    }

    #[must_use]
    pub fn string_bytes(&self, obj: ObjRef) -> &[u8] {
        match &self.heap.get(obj).payload {
            Payload::Str(bytes) => bytes,
            _ => panic!("expected a String payload"),
        }
    }

    // ---- scripted functions -----------------------------------------------

    #[must_use]
    pub fn function(&self, func: FuncId) -> &ScriptedFn {
        &self.functions[func.index()]
    }

    // ---- context stack ----------------------------------------------------

    pub fn push_context(&mut self, context: Context) {
        self.contexts.push(context);
    }

    pub fn pop_context(&mut self) {
        self.contexts.pop();
    }

    /// The area of the node currently being evaluated.
    ///
    /// # Panics
    /// Panics outside evaluation; the evaluator pushes a base context
    /// before the first statement runs.
    #[must_use]
    pub fn ctx_area(&self) -> SourceArea {
        self.contexts.last().expect("context stack is empty outside evaluation").area
    }

    /// The sub-area for operand `index`, falling back to the whole node.
    #[must_use]
    pub fn sub_area(&self, index: usize) -> SourceArea {
        self.contexts
            .last()
            .and_then(|c| c.sub_areas.get(index).copied())
            .unwrap_or_else(|| self.ctx_area())
    }

    // ---- single-use tagging -----------------------------------------------

    /// Clears the single-use flag on `obj` and, transitively, on everything
    /// it owns. The flag itself doubles as the visited marker, so cyclic
    /// structures terminate.
    pub fn spread_multi_use(&mut self, obj: ObjRef) {
        let mut worklist = vec![obj];
        let mut edges = Vec::new();
        while let Some(current) = worklist.pop() {
            let slot = self.heap.get_mut(current);
            if !slot.single_use {
                continue;
            }
            slot.single_use = false;
            edges.clear();
            slot.payload.push_edges(&mut edges);
            worklist.extend_from_slice(&edges);
        }
    }

    // ---- garbage collection -----------------------------------------------

    /// Every root the collector must scan: scope frames, singletons, the
    /// evaluator's operand stack, and method-table Function values.
    fn gather_roots(&self) -> Vec<ObjRef> {
        let mut roots = vec![self.nothing, self.true_, self.false_];
        roots.extend(self.scopes.iter_roots());
        roots.extend_from_slice(&self.temp_roots);
        for desc in &self.types {
            roots.extend(desc.methods.values().copied());
        }
        roots
    }

    /// Runs a collection cycle now.
    pub fn collect_garbage(&mut self) -> usize {
        let roots = self.gather_roots();
        self.heap.collect(&roots)
    }

    /// Safe-point hook: collects if the trigger policy scheduled a cycle.
    pub fn maybe_collect(&mut self) {
        if self.heap.wants_cycle() {
            self.collect_garbage();
        }
    }

    /// Collects now if collection is enabled.
    pub fn gc_ping(&mut self) {
        if self.heap.is_enabled() {
            self.collect_garbage();
        }
    }

    /// Collects now regardless of the enabled flag.
    pub fn gc_force_ping(&mut self) {
        self.collect_garbage();
    }

    /// Current heap statistics, with per-type base sizes supplied by the
    /// type registry.
    #[must_use]
    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats(|type_id| self.types[type_id.index()].instance_size)
    }
}

/// A parsed program, ready to run.
pub struct Runner {
    program: Program,
    interner: Interner,
}

impl Runner {
    /// Lexes and parses `code`. The returned runner can execute the program
    /// any number of times; each run gets a fresh runtime and heap.
    pub fn new(code: &str, file_name: &str) -> Result<Self, Diagnostic> {
        let mut interner = Interner::new();
        let file = interner.intern(file_name);
        let tokens = match Lexer::new(code, file).tokenize(&mut interner) {
            Ok(tokens) => tokens,
            Err(err) => return Err(Diagnostic::from_error(err, &interner)),
        };
        let program = match Parser::new(tokens).parse() {
            Ok(program) => program,
            Err(err) => return Err(Diagnostic::from_error(err, &interner)),
        };
        Ok(Self { program, interner })
    }

    /// Executes the program against the given writer and input source.
    ///
    /// Returns the final heap statistics on success.
    pub fn run(&self, out: &mut dyn PrintWriter, input: &mut dyn ReadInput) -> Result<HeapStats, Diagnostic> {
        let mut rt = Runtime::new(self.interner.clone(), &self.program.functions);
        let result = {
            let mut interp = Interp::new(&mut rt, out, input);
            interp.run_program(&self.program)
        };
        match result {
            Ok(()) => Ok(rt.heap_stats()),
            Err(err) => Err(Diagnostic::from_error(err, &rt.interner)),
        }
    }

    /// Runs with collected stdout and no input; the common test entry.
    pub fn run_collect(&self) -> Result<String, Diagnostic> {
        self.run_collect_with_input("")
    }

    /// Runs with collected stdout, feeding `input` to `read`.
    pub fn run_collect_with_input(&self, input: &str) -> Result<String, Diagnostic> {
        let mut out = CollectStringPrint::new();
        let mut input = StrInput::new(input);
        self.run(&mut out, &mut input)?;
        Ok(out.into_output())
    }
}
