//! The AST evaluator.
//!
//! [`Interp`] walks statements and expressions recursively, resolving names
//! through the scope stack and dispatching every operator through the
//! operand type's slot table. A context (node area + operand sub-areas) is
//! pushed around each dispatch so adapters can point diagnostics at the
//! operand that was invalid.
//!
//! Garbage collection only ever runs at safe points *between* statements;
//! every intermediate the evaluator holds across a nested evaluation is
//! pushed onto the runtime's temp-root scan list first, so a cycle inside a
//! callee can never reclaim an operand of the caller.

use smallvec::{SmallVec, smallvec};

use crate::{
    area::SourceArea,
    ast::{Expr, ExprKind, FuncId, Literal, OperatorKind, Program, Stmt, StmtKind},
    errors::{ErrorKind, RunError, RunResult},
    intern::NameId,
    io::{PrintWriter, ReadInput},
    runtime::Runtime,
    scope::Context,
    value::{ObjKind, ObjRef, Payload},
    types::TypeId,
};

/// Upper bound on nested scripted calls.
///
/// Tree-walking burns native stack per call; this bound turns runaway
/// recursion into a reported error instead of a stack overflow.
pub const MAX_CALL_DEPTH: usize = 500;

/// Upper bound on data-structure recursion (repr and equality walks).
///
/// A list nested hundreds of levels deep would otherwise overflow the Rust
/// stack while formatting or comparing. Repr truncates with `...` at the
/// limit; equality reports an error.
pub const MAX_DATA_DEPTH: usize = 64;

/// A native function or method: receives the evaluated arguments (for
/// methods, the receiver is argument 0) and the `result_needed` flag.
pub type NativeFn = fn(&mut Interp<'_>, &[ObjRef], bool) -> RunResult<ObjRef>;

/// Control-flow signal produced by statement execution.
#[derive(Debug, Clone, Copy)]
pub enum Flow {
    /// Fell through; carries the statement's value if it produced one.
    Normal(Option<ObjRef>),
    Return(ObjRef),
    Break,
    Continue,
}

/// The evaluator: runtime state plus the program's I/O endpoints.
pub struct Interp<'a> {
    pub rt: &'a mut Runtime,
    pub out: &'a mut dyn PrintWriter,
    pub input: &'a mut dyn ReadInput,
}

impl<'a> Interp<'a> {
    pub fn new(rt: &'a mut Runtime, out: &'a mut dyn PrintWriter, input: &'a mut dyn ReadInput) -> Self {
        Self { rt, out, input }
    }

    /// Executes a whole program: the top-level statement sequence.
    pub fn run_program(&mut self, program: &Program) -> RunResult<()> {
        let Some(first) = program.body.first() else {
            return Ok(());
        };
        self.rt.push_context(Context {
            area: first.area,
            sub_areas: smallvec![],
        });
        let result = self.run_top_level(program);
        self.rt.pop_context();
        result
    }

    fn run_top_level(&mut self, program: &Program) -> RunResult<()> {
        for stmt in &program.body {
            self.rt.maybe_collect();
            match self.exec_stmt(stmt, false)? {
                Flow::Normal(_) => {}
                Flow::Return(_) => {
                    return Err(RunError::new(
                        ErrorKind::Type,
                        "'return' outside of a function",
                        stmt.area,
                    ));
                }
                Flow::Break => {
                    return Err(RunError::new(ErrorKind::Type, "'break' outside of a loop", stmt.area));
                }
                Flow::Continue => {
                    return Err(RunError::new(ErrorKind::Type, "'continue' outside of a loop", stmt.area));
                }
            }
        }
        Ok(())
    }

    // ---- statements -------------------------------------------------------

    pub fn exec_stmt(&mut self, stmt: &Stmt, result_needed: bool) -> RunResult<Flow> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                let value = self.eval_expr(expr, result_needed)?;
                Ok(Flow::Normal(Some(value)))
            }
            StmtKind::Block(stmts) => self.exec_block(stmts, result_needed),
            StmtKind::If { cond, then, orelse } => {
                if self.eval_condition(cond)? {
                    self.exec_stmt(then, result_needed)
                } else if let Some(orelse) = orelse {
                    self.exec_stmt(orelse, result_needed)
                } else {
                    Ok(Flow::Normal(None))
                }
            }
            StmtKind::While { cond, body } => {
                loop {
                    self.rt.maybe_collect();
                    if !self.eval_condition(cond)? {
                        break;
                    }
                    match self.exec_stmt(body, false)? {
                        Flow::Normal(_) | Flow::Continue => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal(None))
            }
            StmtKind::For { init, cond, step, body } => {
                // The header variable lives in its own transparent frame.
                self.rt.scopes.push_frame(true);
                let result = self.exec_for(init.as_ref(), cond.as_ref(), step.as_ref(), body);
                self.rt.scopes.pop_frame();
                result
            }
            StmtKind::FuncDef(func) => {
                let name = self
                    .rt
                    .function(*func)
                    .name
                    .expect("named function definition carries a name");
                let value = self.rt.alloc_scripted_fn(*func);
                self.rt.spread_multi_use(value);
                self.rt.scopes.add_variable(name, value);
                Ok(Flow::Normal(None))
            }
            StmtKind::RecordDef { name, fields, methods } => {
                self.define_record(*name, fields, methods)?;
                Ok(Flow::Normal(None))
            }
            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_expr(expr, true)?,
                    None => self.rt.nothing,
                };
                self.rt.spread_multi_use(value);
                Ok(Flow::Return(value))
            }
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),
            StmtKind::Empty => Ok(Flow::Normal(None)),
        }
    }

    /// Runs a statement sequence; the block's value is the value of its
    /// final statement. Safe points sit between the statements.
    fn exec_block(&mut self, stmts: &[Stmt], result_needed: bool) -> RunResult<Flow> {
        let last_index = stmts.len().checked_sub(1);
        let mut last = None;
        for (index, stmt) in stmts.iter().enumerate() {
            self.rt.maybe_collect();
            let is_last = Some(index) == last_index;
            match self.exec_stmt(stmt, result_needed && is_last)? {
                Flow::Normal(value) => {
                    if is_last {
                        last = value;
                    }
                }
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal(last))
    }

    fn exec_for(
        &mut self,
        init: Option<&Expr>,
        cond: Option<&Expr>,
        step: Option<&Expr>,
        body: &Stmt,
    ) -> RunResult<Flow> {
        if let Some(init) = init {
            self.eval_expr(init, false)?;
        }
        loop {
            self.rt.maybe_collect();
            if let Some(cond) = cond
                && !self.eval_condition(cond)?
            {
                break;
            }
            match self.exec_stmt(body, false)? {
                Flow::Normal(_) | Flow::Continue => {}
                Flow::Break => break,
                flow @ Flow::Return(_) => return Ok(flow),
            }
            if let Some(step) = step {
                self.eval_expr(step, false)?;
            }
        }
        Ok(Flow::Normal(None))
    }

    /// Evaluates and installs a record definition: generated type, declared
    /// fields, and the methods from the record body.
    fn define_record(&mut self, name: NameId, fields: &[NameId], methods: &[FuncId]) -> RunResult<()> {
        let type_id = crate::types::record::make_record_type(self.rt, name, fields.to_vec());
        for &method in methods {
            let method_name = self
                .rt
                .function(method)
                .name
                .expect("record methods carry their declared name");
            let value = self.rt.alloc_scripted_fn(method);
            self.rt.spread_multi_use(value);
            self.rt.type_desc_mut(type_id).add_method(method_name, value);
        }
        let type_value = self.rt.make_type_value(type_id);
        self.rt.scopes.add_variable(name, type_value);
        Ok(())
    }

    /// Evaluates a control-flow condition and coerces it via `__bool__`.
    fn eval_condition(&mut self, cond: &Expr) -> RunResult<bool> {
        self.with_context(
            Context {
                area: cond.area,
                sub_areas: smallvec![cond.area],
            },
            |interp| {
                let value = interp.eval_expr(cond, true)?;
                interp.truthy(value)
            },
        )
    }

    // ---- expressions ------------------------------------------------------

    pub fn eval_expr(&mut self, expr: &Expr, result_needed: bool) -> RunResult<ObjRef> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(self.eval_literal(literal)),
            ExprKind::Identifier(name) => self.rt.scopes.lookup(*name).ok_or_else(|| {
                RunError::name_error(
                    format!("variable '{}' is not defined", self.rt.interner.name_of(*name)),
                    expr.area,
                )
            }),
            ExprKind::ArrayLiteral(elements) => {
                let mark = self.temp_mark();
                for element in elements {
                    let value = self.eval_expr(element, true)?;
                    self.temp_push(value);
                }
                let items: Vec<ObjRef> = self.rt.temp_roots[mark..].to_vec();
                for &item in &items {
                    self.rt.spread_multi_use(item);
                }
                let array = self.rt.alloc_array(items);
                self.temp_reset(mark);
                Ok(array)
            }
            ExprKind::Operator { op, operands } => match op {
                OperatorKind::And | OperatorKind::Or => self.eval_short_circuit(*op, operands, expr.area),
                _ => self.eval_operator(*op, operands, expr.area, result_needed),
            },
            ExprKind::Call { callee, args } => {
                let mut sub_areas: SmallVec<[SourceArea; 4]> = smallvec![callee.area];
                sub_areas.extend(args.iter().map(|arg| arg.area));
                self.with_context(
                    Context {
                        area: expr.area,
                        sub_areas,
                    },
                    |interp| {
                        let mark = interp.temp_mark();
                        let callee_value = interp.eval_expr(callee, true)?;
                        interp.temp_push(callee_value);
                        for arg in args {
                            let value = interp.eval_expr(arg, true)?;
                            interp.temp_push(value);
                        }
                        let arg_values: SmallVec<[ObjRef; 4]> = SmallVec::from_slice(&interp.rt.temp_roots[mark + 1..]);
                        for &value in &arg_values {
                            interp.rt.spread_multi_use(value);
                        }
                        let result = interp.run_operator(OperatorKind::Call, callee_value, &arg_values, result_needed);
                        interp.temp_reset(mark);
                        result
                    },
                )
            }
            ExprKind::MethodCall { object, name, args } => {
                let mut sub_areas: SmallVec<[SourceArea; 4]> = smallvec![object.area];
                sub_areas.extend(args.iter().map(|arg| arg.area));
                self.with_context(
                    Context {
                        area: expr.area,
                        sub_areas,
                    },
                    |interp| {
                        let mark = interp.temp_mark();
                        let target = interp.eval_expr(object, true)?;
                        interp.temp_push(target);
                        for arg in args {
                            let value = interp.eval_expr(arg, true)?;
                            interp.temp_push(value);
                        }
                        let result = interp.dispatch_method_call(target, *name, mark, result_needed);
                        interp.temp_reset(mark);
                        result
                    },
                )
            }
            ExprKind::FieldAccess { object, name } => {
                let target = self.eval_expr(object, true)?;
                self.field_get(target, *name, expr.area)
            }
            ExprKind::Assign { target, value } => self.eval_assign(target, value, expr.area),
            ExprKind::Function(func) => Ok(self.rt.alloc_scripted_fn(*func)),
        }
    }

    fn eval_literal(&mut self, literal: &Literal) -> ObjRef {
        match literal {
            Literal::Nothing => self.rt.alloc_nothing(),
            Literal::Boolean(value) => self.rt.alloc_boolean(*value),
            Literal::Integer(value) => self.rt.alloc_integer(*value),
            Literal::Real(value) => self.rt.alloc_real(*value),
            Literal::Character(value) => self.rt.alloc_character(*value),
            Literal::Str(bytes) => self.rt.alloc_string(bytes.to_vec()),
        }
    }

    /// `&&` / `||`: the right operand is not evaluated when the left one
    /// already decides the result. Both operands coerce via `__bool__`.
    fn eval_short_circuit(&mut self, op: OperatorKind, operands: &[Expr], area: SourceArea) -> RunResult<ObjRef> {
        let sub_areas: SmallVec<[SourceArea; 4]> = operands.iter().map(|operand| operand.area).collect();
        self.with_context(Context { area, sub_areas }, |interp| {
            let left = interp.eval_expr(&operands[0], true)?;
            let left_truth = interp.truthy(left)?;
            let decided = match op {
                OperatorKind::And => !left_truth,
                _ => left_truth,
            };
            if decided {
                return Ok(interp.rt.protected_boolean(left_truth));
            }
            let right = interp.eval_expr(&operands[1], true)?;
            let right_truth = interp.truthy(right)?;
            Ok(interp.rt.protected_boolean(right_truth))
        })
    }

    fn eval_operator(
        &mut self,
        op: OperatorKind,
        operands: &[Expr],
        area: SourceArea,
        result_needed: bool,
    ) -> RunResult<ObjRef> {
        let sub_areas: SmallVec<[SourceArea; 4]> = operands.iter().map(|operand| operand.area).collect();
        self.with_context(Context { area, sub_areas }, |interp| {
            let mark = interp.temp_mark();
            for operand in operands {
                let value = interp.eval_expr(operand, true)?;
                interp.temp_push(value);
            }
            let values: SmallVec<[ObjRef; 4]> = SmallVec::from_slice(&interp.rt.temp_roots[mark..]);
            let result = interp.run_operator(op, values[0], &values[1..], result_needed);
            interp.temp_reset(mark);
            result
        })
    }

    fn eval_assign(&mut self, target: &Expr, value: &Expr, area: SourceArea) -> RunResult<ObjRef> {
        match &target.kind {
            ExprKind::Identifier(name) => {
                let stored = self.eval_expr(value, true)?;
                self.rt.spread_multi_use(stored);
                self.rt.scopes.assign(*name, stored);
                Ok(stored)
            }
            ExprKind::FieldAccess { object, name } => self.with_context(
                Context {
                    area,
                    sub_areas: smallvec![object.area, value.area],
                },
                |interp| {
                    let mark = interp.temp_mark();
                    let target_value = interp.eval_expr(object, true)?;
                    interp.temp_push(target_value);
                    let stored = interp.eval_expr(value, true)?;
                    interp.rt.spread_multi_use(stored);
                    let result = interp.field_set(target_value, *name, stored);
                    interp.temp_reset(mark);
                    result.map(|()| stored)
                },
            ),
            ExprKind::Operator {
                op: OperatorKind::Index,
                operands,
            } => self.with_context(
                Context {
                    area,
                    sub_areas: smallvec![operands[0].area, operands[1].area, value.area],
                },
                |interp| {
                    let mark = interp.temp_mark();
                    let container = interp.eval_expr(&operands[0], true)?;
                    interp.temp_push(container);
                    let index = interp.eval_expr(&operands[1], true)?;
                    interp.temp_push(index);
                    let stored = interp.eval_expr(value, true)?;
                    interp.temp_push(stored);
                    interp.rt.spread_multi_use(stored);
                    let result = interp.run_operator(OperatorKind::IndexSet, container, &[index, stored], false);
                    interp.temp_reset(mark);
                    result.map(|_| stored)
                },
            ),
            _ => Err(RunError::new(ErrorKind::Type, "invalid assignment target", target.area)),
        }
    }

    /// `object.name` — method table first, then record fields.
    fn field_get(&mut self, target: ObjRef, name: NameId, area: SourceArea) -> RunResult<ObjRef> {
        let type_id = self.rt.type_of(target);
        if let Some(&method) = self.rt.type_desc(type_id).methods.get(&name) {
            return Ok(method);
        }
        if self.rt.kind_of(target) == ObjKind::Instance
            && let Payload::Record(fields) = &self.rt.heap.get(target).payload
            && let Some(&value) = fields.get(&name)
        {
            return Ok(value);
        }
        Err(RunError::name_error(
            format!(
                "{} has no method or field '{}'",
                self.rt.type_name(target),
                self.rt.interner.name_of(name)
            ),
            area,
        ))
    }

    /// `object.name = value` — records only; the field must be declared.
    fn field_set(&mut self, target: ObjRef, name: NameId, value: ObjRef) -> RunResult<()> {
        let area = self.rt.sub_area(0);
        let type_name = self.rt.type_name(target).to_owned();
        if self.rt.kind_of(target) != ObjKind::Instance {
            return Err(RunError::type_error(format!("cannot assign a field of {type_name}"), area));
        }
        match &mut self.rt.heap.get_mut(target).payload {
            Payload::Record(fields) => {
                if let Some(slot) = fields.get_mut(&name) {
                    *slot = value;
                    return Ok(());
                }
            }
            _ => return Err(RunError::type_error(format!("cannot assign a field of {type_name}"), area)),
        }
        Err(RunError::name_error(
            format!("{type_name} has no field '{}'", self.rt.interner.name_of(name)),
            area,
        ))
    }

    /// Method-call dispatch once the receiver and arguments (starting at
    /// `mark` on the temp-root stack) are evaluated.
    fn dispatch_method_call(&mut self, target: ObjRef, name: NameId, mark: usize, result_needed: bool) -> RunResult<ObjRef> {
        let type_id = self.rt.type_of(target);
        if let Some(&method) = self.rt.type_desc(type_id).methods.get(&name) {
            // Methods receive the receiver as their first argument.
            let full_args: SmallVec<[ObjRef; 4]> = SmallVec::from_slice(&self.rt.temp_roots[mark..]);
            for &value in &full_args {
                self.rt.spread_multi_use(value);
            }
            return self.run_operator(OperatorKind::Call, method, &full_args, result_needed);
        }
        // A record field holding a function is callable as `obj.f(...)`;
        // the receiver is not passed implicitly.
        if self.rt.kind_of(target) == ObjKind::Instance
            && let Payload::Record(fields) = &self.rt.heap.get(target).payload
            && let Some(&value) = fields.get(&name)
        {
            let args: SmallVec<[ObjRef; 4]> = SmallVec::from_slice(&self.rt.temp_roots[mark + 1..]);
            for &arg in &args {
                self.rt.spread_multi_use(arg);
            }
            return self.run_operator(OperatorKind::Call, value, &args, result_needed);
        }
        Err(RunError::name_error(
            format!(
                "{} has no method or field '{}'",
                self.rt.type_name(target),
                self.rt.interner.name_of(name)
            ),
            self.rt.sub_area(0),
        ))
    }

    // ---- dispatch ---------------------------------------------------------

    /// Dispatches `op` through the operand type's slot table. An empty slot
    /// is a type error against operand 0's sub-area.
    pub fn run_operator(
        &mut self,
        op: OperatorKind,
        self_obj: ObjRef,
        args: &[ObjRef],
        result_needed: bool,
    ) -> RunResult<ObjRef> {
        let type_id = self.rt.type_of(self_obj);
        match self.rt.type_desc(type_id).operator_slot(op) {
            Some(adapter) => adapter(self, self_obj, args, result_needed),
            None => Err(RunError::type_error(
                format!(
                    "{} does not support operator '{}'",
                    self.rt.type_name(self_obj),
                    op.symbol()
                ),
                self.rt.sub_area(0),
            )),
        }
    }

    /// Invokes the named method on `target` with the receiver prepended,
    /// under a synthetic context derived from the current one.
    pub fn run_method(
        &mut self,
        name: NameId,
        target: ObjRef,
        args: &[ObjRef],
        result_needed: bool,
    ) -> RunResult<ObjRef> {
        let type_id = self.rt.type_of(target);
        let Some(&method) = self.rt.type_desc(type_id).methods.get(&name) else {
            return Err(RunError::type_error(
                format!(
                    "{} has no method '{}'",
                    self.rt.type_name(target),
                    self.rt.interner.name_of(name)
                ),
                self.rt.ctx_area(),
            ));
        };
        let mut full_args: SmallVec<[ObjRef; 4]> = smallvec![target];
        full_args.extend_from_slice(args);
        self.with_synthetic_context(full_args.len(), |interp| {
            interp.run_operator(OperatorKind::Call, method, &full_args, result_needed)
        })
    }

    /// Calls a scripted function: opaque frame, positional binding with
    /// `nothing` for missing arguments, body execution, result checking.
    pub fn call_scripted(&mut self, func: FuncId, args: &[ObjRef], result_needed: bool) -> RunResult<ObjRef> {
        if self.rt.call_depth >= MAX_CALL_DEPTH {
            return Err(RunError::new(
                ErrorKind::Fatal,
                "maximum call depth exceeded",
                self.rt.ctx_area(),
            ));
        }
        let scripted = self.rt.function(func);
        let params = scripted.params.clone();
        let body = scripted.body.clone();

        self.rt.scopes.push_frame(false);
        self.rt.scopes.set_is_function_call(true);
        self.rt.scopes.set_arguments(args.to_vec());
        for (index, &param) in params.iter().enumerate() {
            let value = match args.get(index) {
                Some(&value) => value,
                None => self.rt.alloc_nothing(),
            };
            self.rt.spread_multi_use(value);
            self.rt.scopes.add_variable(param, value);
        }
        self.rt.push_context(Context {
            area: body.area,
            sub_areas: smallvec![],
        });
        self.rt.call_depth += 1;

        let flow = self.exec_stmt(&body, result_needed);

        self.rt.call_depth -= 1;
        self.rt.pop_context();
        self.rt.scopes.pop_frame();

        let result = match flow? {
            Flow::Return(value) => Some(value),
            Flow::Normal(value) => value,
            Flow::Break => {
                return Err(RunError::new(
                    ErrorKind::Type,
                    "'break' outside of a loop",
                    self.rt.ctx_area(),
                ));
            }
            Flow::Continue => {
                return Err(RunError::new(
                    ErrorKind::Type,
                    "'continue' outside of a loop",
                    self.rt.ctx_area(),
                ));
            }
        };
        match result {
            Some(value) => {
                self.rt.spread_multi_use(value);
                Ok(value)
            }
            None if result_needed => Err(RunError::type_error(
                "function did not produce a value",
                self.rt.ctx_area(),
            )),
            None => Ok(self.rt.nothing),
        }
    }

    // ---- coercions --------------------------------------------------------

    /// Coerces `obj` for control flow via `__bool__`.
    pub fn truthy(&mut self, obj: ObjRef) -> RunResult<bool> {
        if let Payload::Boolean(value) = self.rt.heap.get(obj).payload
            && self.rt.kind_of(obj) == ObjKind::Instance
        {
            return Ok(value);
        }
        let name = self.rt.well_known.bool_;
        let result = self.run_method(name, obj, &[], true)?;
        if self.rt.is_instance(result, self.rt.builtin_types.boolean) {
            Ok(self.rt.boolean_value(result))
        } else {
            Err(RunError::type_error(
                format!("__bool__ of {} did not produce a Boolean", self.rt.type_name(obj)),
                self.rt.ctx_area(),
            ))
        }
    }

    /// Renders `obj` through its `__repr__` magic method. Truncates with
    /// `...` once the nesting limit is reached, so self-referential and
    /// very deep structures stay printable.
    pub fn repr_string(&mut self, obj: ObjRef) -> RunResult<String> {
        if self.rt.data_depth >= MAX_DATA_DEPTH {
            return Ok("...".to_owned());
        }
        self.rt.data_depth += 1;
        let result = self.repr_string_inner(obj);
        self.rt.data_depth -= 1;
        result
    }

    fn repr_string_inner(&mut self, obj: ObjRef) -> RunResult<String> {
        let name = self.rt.well_known.repr;
        let result = self.run_method(name, obj, &[], true)?;
        if self.rt.is_instance(result, self.rt.builtin_types.string) {
            Ok(String::from_utf8_lossy(self.rt.string_bytes(result)).into_owned())
        } else {
            Err(RunError::type_error(
                format!("__repr__ of {} did not produce a String", self.rt.type_name(obj)),
                self.rt.ctx_area(),
            ))
        }
    }

    /// Structural equality through the `Eq` slot; used by composite
    /// equality adapters for their element-wise walks.
    pub fn values_equal(&mut self, left: ObjRef, right: ObjRef) -> RunResult<bool> {
        if self.rt.data_depth >= MAX_DATA_DEPTH {
            return Err(RunError::new(
                ErrorKind::Fatal,
                "data structure is nested too deeply to compare",
                self.rt.ctx_area(),
            ));
        }
        self.rt.data_depth += 1;
        let result = self.with_synthetic_context(2, |interp| {
            interp.run_operator(OperatorKind::Eq, left, &[right], true)
        });
        self.rt.data_depth -= 1;
        let result = result?;
        if self.rt.is_instance(result, self.rt.builtin_types.boolean) {
            Ok(self.rt.boolean_value(result))
        } else {
            Err(RunError::type_error(
                "'==' did not produce a Boolean",
                self.rt.ctx_area(),
            ))
        }
    }

    // ---- context and temp-root helpers ------------------------------------

    /// Runs `f` with `context` pushed; the context is popped on every exit
    /// path so diagnostics never see a stale area.
    pub fn with_context<T>(&mut self, context: Context, f: impl FnOnce(&mut Self) -> RunResult<T>) -> RunResult<T> {
        self.rt.push_context(context);
        let result = f(self);
        self.rt.pop_context();
        result
    }

    /// Pushes a context derived from the current area, with `operands`
    /// sub-areas all pointing at it. Used by adapters that re-enter the
    /// evaluator (element-wise equality, callbacks) so nested diagnostics
    /// stay anchored to the originating expression.
    pub fn with_synthetic_context<T>(
        &mut self,
        operands: usize,
        f: impl FnOnce(&mut Self) -> RunResult<T>,
    ) -> RunResult<T> {
        let area = self.rt.ctx_area();
        let sub_areas: SmallVec<[SourceArea; 4]> = (0..operands).map(|_| area).collect();
        self.with_context(Context { area, sub_areas }, f)
    }

    #[must_use]
    pub fn temp_mark(&self) -> usize {
        self.rt.temp_roots.len()
    }

    pub fn temp_push(&mut self, obj: ObjRef) {
        self.rt.temp_roots.push(obj);
    }

    pub fn temp_reset(&mut self, mark: usize) {
        self.rt.temp_roots.truncate(mark);
    }

    // ---- verification helpers for adapters and natives --------------------

    /// Requires `obj` to be an instance of `type_id`; diagnostic points at
    /// operand `sub`'s sub-area.
    pub fn expect_instance(&self, obj: ObjRef, type_id: TypeId, sub: usize) -> RunResult<()> {
        if self.rt.is_instance(obj, type_id) {
            Ok(())
        } else {
            let expected = self.rt.interner.name_of(self.rt.type_desc(type_id).name);
            Err(RunError::type_error(
                format!("expected {} but got {}", expected, self.rt.type_name(obj)),
                self.rt.sub_area(sub),
            ))
        }
    }

    /// Exact operand count for an operator adapter (`self` not counted).
    pub fn expect_operands(&self, args: &[ObjRef], count: usize) -> RunResult<()> {
        if args.len() == count {
            Ok(())
        } else {
            Err(RunError::type_error(
                format!("expected exactly {} right-side operand(s), got {}", count, args.len()),
                self.rt.ctx_area(),
            ))
        }
    }

    /// Exact argument count for a free function call.
    pub fn expect_args(&self, args: &[ObjRef], count: usize) -> RunResult<()> {
        if args.len() == count {
            Ok(())
        } else {
            Err(RunError::type_error(
                format!("expected exactly {} argument(s), got {}", count, args.len()),
                self.rt.ctx_area(),
            ))
        }
    }

    /// Exact argument count for a method call (the receiver at index 0 is
    /// not counted).
    pub fn expect_method_args(&self, args: &[ObjRef], count: usize) -> RunResult<()> {
        if args.len() == count + 1 {
            Ok(())
        } else {
            Err(RunError::type_error(
                format!(
                    "method expects exactly {} argument(s), got {}",
                    count,
                    args.len().saturating_sub(1)
                ),
                self.rt.ctx_area(),
            ))
        }
    }
}
