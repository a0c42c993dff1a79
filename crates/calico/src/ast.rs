//! The AST consumed by the evaluator.
//!
//! Every node carries the [`SourceArea`] it was parsed from; identifiers and
//! field/method names are pre-interned [`NameId`]s. Function bodies (named
//! functions, anonymous function literals, and record methods) are hoisted
//! into a blueprint table on the [`Program`] and referenced by [`FuncId`],
//! so Function values never own AST directly.

use std::rc::Rc;

use strum::{EnumCount, IntoStaticStr};

use crate::{area::SourceArea, intern::NameId};

/// Operator kinds, one per slot in a type's adapter table.
///
/// `And`/`Or` are reserved entries: the evaluator implements them as
/// short-circuit forms over `__bool__` and never dispatches them to a slot.
/// `IndexSet` is the dedicated index-assignment slot used by `a[i] = v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumCount, IntoStaticStr)]
pub enum OperatorKind {
    Add,
    Sub,
    Mult,
    Div,
    Rem,
    Lshift,
    Rshift,
    Bitand,
    Bitor,
    Bitxor,
    And,
    Or,
    Not,
    Inverse,
    Neg,
    Pos,
    PreInc,
    PostInc,
    PreDec,
    PostDec,
    Lt,
    Leq,
    Gt,
    Geq,
    Eq,
    Neq,
    Index,
    IndexSet,
    Call,
}

impl OperatorKind {
    /// Index into a type's operator-slot table.
    #[inline]
    #[must_use]
    pub fn slot(self) -> usize {
        self as usize
    }

    /// The surface syntax for this operator, used in diagnostics.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mult => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Lshift => "<<",
            Self::Rshift => ">>",
            Self::Bitand => "&",
            Self::Bitor => "|",
            Self::Bitxor => "^",
            Self::And => "&&",
            Self::Or => "||",
            Self::Not => "!",
            Self::Inverse => "~",
            Self::Neg => "-",
            Self::Pos => "+",
            Self::PreInc | Self::PostInc => "++",
            Self::PreDec | Self::PostDec => "--",
            Self::Lt => "<",
            Self::Leq => "<=",
            Self::Gt => ">",
            Self::Geq => ">=",
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Index => "[]",
            Self::IndexSet => "[]=",
            Self::Call => "()",
        }
    }
}

/// Index into [`Program::functions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncId(u32);

impl FuncId {
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("function table overflow"))
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A parsed function: parameter list and body, shared cheaply via `Rc`.
///
/// The parameter list and body are immutable once the parser has produced
/// them; Function values installed at runtime alias them.
#[derive(Debug, Clone)]
pub struct FuncBlueprint {
    /// Declared name for named functions and record methods; `None` for
    /// anonymous function literals.
    pub name: Option<NameId>,
    pub params: Rc<[NameId]>,
    pub body: Rc<Stmt>,
    pub area: SourceArea,
}

/// A whole parsed program: top-level statements plus the blueprint table.
#[derive(Debug, Clone)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub functions: Vec<FuncBlueprint>,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub area: SourceArea,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Expr(Expr),
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then: Box<Stmt>,
        orelse: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Expr>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    FuncDef(FuncId),
    RecordDef {
        name: NameId,
        fields: Vec<NameId>,
        methods: Vec<FuncId>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Empty,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub area: SourceArea,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(NameId),
    ArrayLiteral(Vec<Expr>),
    /// Unary, binary, and indexing operators dispatched through the
    /// operand type's slot table. Operand 0 is `self`.
    Operator {
        op: OperatorKind,
        operands: Vec<Expr>,
    },
    /// `callee(args...)` — dispatches the `Call` slot on the callee's type.
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `object.name(args...)` — method-table lookup, then `Call` with the
    /// object prepended as the first argument.
    MethodCall {
        object: Box<Expr>,
        name: NameId,
        args: Vec<Expr>,
    },
    /// `object.name` — method-table lookup, falling back to record fields.
    FieldAccess {
        object: Box<Expr>,
        name: NameId,
    },
    /// `target = value` where target is an identifier, field access, or
    /// index expression.
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// `function (params) { ... }` literal.
    Function(FuncId),
}

#[derive(Debug, Clone)]
pub enum Literal {
    Nothing,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Character(u8),
    Str(Rc<[u8]>),
}
