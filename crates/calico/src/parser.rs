//! Recursive-descent parser with Pratt expression parsing.
//!
//! Produces a [`Program`]: top-level statements plus the hoisted function
//! blueprint table. Parse failures are reported as [`RunError`]s carrying
//! the offending token's area.

use std::rc::Rc;

use crate::{
    area::SourceArea,
    ast::{Expr, ExprKind, FuncBlueprint, FuncId, Literal, OperatorKind, Program, Stmt, StmtKind},
    errors::{ErrorKind, RunError, RunResult},
    intern::NameId,
    lexer::{Token, TokenKind},
};

/// Maximum nesting depth for statements and expressions combined.
///
/// Prevents stack overflow on pathological inputs like deeply nested
/// parentheses before the recursion ever reaches the evaluator.
const MAX_NESTING_DEPTH: u16 = 200;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: u16,
    functions: Vec<FuncBlueprint>,
}

impl Parser {
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            functions: Vec::new(),
        }
    }

    pub fn parse(mut self) -> RunResult<Program> {
        let mut body = Vec::new();
        while !matches!(self.peek().kind, TokenKind::Eof) {
            body.push(self.statement()?);
        }
        Ok(Program {
            body,
            functions: self.functions,
        })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> RunResult<Token> {
        if &self.peek().kind == kind {
            Ok(self.bump())
        } else {
            Err(self.error_here(format!(
                "expected {}, found {}",
                kind.describe(),
                self.peek().kind.describe()
            )))
        }
    }

    fn expect_identifier(&mut self) -> RunResult<(NameId, SourceArea)> {
        match self.peek().kind {
            TokenKind::Identifier(id) => {
                let area = self.bump().area;
                Ok((id, area))
            }
            _ => Err(self.error_here(format!("expected identifier, found {}", self.peek().kind.describe()))),
        }
    }

    fn error_here(&self, message: impl Into<String>) -> RunError {
        RunError::new(ErrorKind::Parse, message, self.peek().area)
    }

    fn enter(&mut self) -> RunResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self.error_here("program is nested too deeply"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // ---- statements -------------------------------------------------------

    fn statement(&mut self) -> RunResult<Stmt> {
        self.enter()?;
        let stmt = self.statement_inner();
        self.leave();
        stmt
    }

    fn statement_inner(&mut self) -> RunResult<Stmt> {
        let start = self.peek().area;
        match self.peek().kind {
            TokenKind::LBrace => self.block(),
            TokenKind::KwIf => self.if_statement(),
            TokenKind::KwWhile => self.while_statement(),
            TokenKind::KwFor => self.for_statement(),
            TokenKind::KwRecord => self.record_statement(),
            // `function name(...)` is a definition statement; a bare
            // `function (...)` literal falls through to the expression path.
            TokenKind::KwFunction if matches!(self.peek_at(1).kind, TokenKind::Identifier(_)) => {
                let func = self.function(true)?;
                let area = start.merge(self.functions[func.index()].area);
                Ok(Stmt {
                    kind: StmtKind::FuncDef(func),
                    area,
                })
            }
            TokenKind::KwReturn => {
                self.bump();
                let value = if matches!(self.peek().kind, TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.expression()?)
                };
                let end = self.expect(&TokenKind::Semicolon)?.area;
                Ok(Stmt {
                    kind: StmtKind::Return(value),
                    area: start.merge(end),
                })
            }
            TokenKind::KwBreak => {
                self.bump();
                let end = self.expect(&TokenKind::Semicolon)?.area;
                Ok(Stmt {
                    kind: StmtKind::Break,
                    area: start.merge(end),
                })
            }
            TokenKind::KwContinue => {
                self.bump();
                let end = self.expect(&TokenKind::Semicolon)?.area;
                Ok(Stmt {
                    kind: StmtKind::Continue,
                    area: start.merge(end),
                })
            }
            TokenKind::Semicolon => {
                self.bump();
                Ok(Stmt {
                    kind: StmtKind::Empty,
                    area: start,
                })
            }
            _ => {
                let expr = self.expression()?;
                let end = self.expect(&TokenKind::Semicolon)?.area;
                let area = expr.area.merge(end);
                Ok(Stmt {
                    kind: StmtKind::Expr(expr),
                    area,
                })
            }
        }
    }

    fn block(&mut self) -> RunResult<Stmt> {
        let start = self.expect(&TokenKind::LBrace)?.area;
        let mut statements = Vec::new();
        while !matches!(self.peek().kind, TokenKind::RBrace | TokenKind::Eof) {
            statements.push(self.statement()?);
        }
        let end = self.expect(&TokenKind::RBrace)?.area;
        Ok(Stmt {
            kind: StmtKind::Block(statements),
            area: start.merge(end),
        })
    }

    fn if_statement(&mut self) -> RunResult<Stmt> {
        let start = self.bump().area;
        let cond = self.expression()?;
        let then = Box::new(self.statement()?);
        let (orelse, end) = if self.eat(&TokenKind::KwElse) {
            let stmt = self.statement()?;
            let area = stmt.area;
            (Some(Box::new(stmt)), area)
        } else {
            (None, then.area)
        };
        Ok(Stmt {
            kind: StmtKind::If { cond, then, orelse },
            area: start.merge(end),
        })
    }

    fn while_statement(&mut self) -> RunResult<Stmt> {
        let start = self.bump().area;
        let cond = self.expression()?;
        let body = Box::new(self.statement()?);
        let end = body.area;
        Ok(Stmt {
            kind: StmtKind::While { cond, body },
            area: start.merge(end),
        })
    }

    fn for_statement(&mut self) -> RunResult<Stmt> {
        let start = self.bump().area;
        let init = if matches!(self.peek().kind, TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;
        let cond = if matches!(self.peek().kind, TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;
        let step = if matches!(self.peek().kind, TokenKind::LBrace) {
            None
        } else {
            Some(self.expression()?)
        };
        let body = Box::new(self.statement()?);
        let end = body.area;
        Ok(Stmt {
            kind: StmtKind::For { init, cond, step, body },
            area: start.merge(end),
        })
    }

    fn record_statement(&mut self) -> RunResult<Stmt> {
        let start = self.bump().area;
        let (name, _) = self.expect_identifier()?;
        self.expect(&TokenKind::LBrace)?;
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        while !matches!(self.peek().kind, TokenKind::RBrace | TokenKind::Eof) {
            if matches!(self.peek().kind, TokenKind::KwFunction) {
                methods.push(self.function(true)?);
            } else {
                let (field, _) = self.expect_identifier()?;
                self.expect(&TokenKind::Semicolon)?;
                fields.push(field);
            }
        }
        let end = self.expect(&TokenKind::RBrace)?.area;
        Ok(Stmt {
            kind: StmtKind::RecordDef { name, fields, methods },
            area: start.merge(end),
        })
    }

    /// Parses `function [name] (params) block` into a blueprint.
    ///
    /// `named` requires the declared name (definition statements and record
    /// methods); expression literals pass `false`.
    fn function(&mut self, named: bool) -> RunResult<FuncId> {
        let start = self.expect(&TokenKind::KwFunction)?.area;
        let name = if named {
            Some(self.expect_identifier()?.0)
        } else {
            None
        };
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        if !matches!(self.peek().kind, TokenKind::RParen) {
            loop {
                params.push(self.expect_identifier()?.0);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;
        let body = self.block()?;
        let area = start.merge(body.area);
        let func = FuncId::new(self.functions.len());
        self.functions.push(FuncBlueprint {
            name,
            params: Rc::from(params),
            body: Rc::new(body),
            area,
        });
        Ok(func)
    }

    // ---- expressions ------------------------------------------------------

    fn expression(&mut self) -> RunResult<Expr> {
        self.enter()?;
        let expr = self.assignment();
        self.leave();
        expr
    }

    /// Assignment is right-associative and binds loosest.
    fn assignment(&mut self) -> RunResult<Expr> {
        let target = self.binary(0)?;
        if !matches!(self.peek().kind, TokenKind::Assign) {
            return Ok(target);
        }
        if !is_assignable(&target.kind) {
            return Err(RunError::new(
                ErrorKind::Parse,
                "invalid assignment target",
                target.area,
            ));
        }
        self.bump();
        let value = self.expression()?;
        let area = target.area.merge(value.area);
        Ok(Expr {
            kind: ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            area,
        })
    }

    fn binary(&mut self, min_power: u8) -> RunResult<Expr> {
        let mut left = self.unary()?;
        while let Some((op, power)) = binary_operator(&self.peek().kind) {
            if power < min_power {
                break;
            }
            self.bump();
            let right = self.binary(power + 1)?;
            let area = left.area.merge(right.area);
            left = Expr {
                kind: ExprKind::Operator {
                    op,
                    operands: vec![left, right],
                },
                area,
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> RunResult<Expr> {
        let start = self.peek().area;
        let op = match self.peek().kind {
            TokenKind::Bang => Some(OperatorKind::Not),
            TokenKind::Tilde => Some(OperatorKind::Inverse),
            TokenKind::Minus => Some(OperatorKind::Neg),
            TokenKind::Plus => Some(OperatorKind::Pos),
            TokenKind::PlusPlus => Some(OperatorKind::PreInc),
            TokenKind::MinusMinus => Some(OperatorKind::PreDec),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            self.enter()?;
            let operand = self.unary();
            self.leave();
            let operand = operand?;
            let area = start.merge(operand.area);
            return Ok(Expr {
                kind: ExprKind::Operator {
                    op,
                    operands: vec![operand],
                },
                area,
            });
        }
        self.postfix()
    }

    fn postfix(&mut self) -> RunResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            match self.peek().kind {
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = if matches!(self.peek().kind, TokenKind::PlusPlus) {
                        OperatorKind::PostInc
                    } else {
                        OperatorKind::PostDec
                    };
                    let end = self.bump().area;
                    let area = expr.area.merge(end);
                    expr = Expr {
                        kind: ExprKind::Operator {
                            op,
                            operands: vec![expr],
                        },
                        area,
                    };
                }
                TokenKind::LParen => {
                    let (args, end) = self.argument_list()?;
                    let area = expr.area.merge(end);
                    expr = Expr {
                        kind: ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        area,
                    };
                }
                TokenKind::LBracket => {
                    self.bump();
                    let index = self.expression()?;
                    let end = self.expect(&TokenKind::RBracket)?.area;
                    let area = expr.area.merge(end);
                    expr = Expr {
                        kind: ExprKind::Operator {
                            op: OperatorKind::Index,
                            operands: vec![expr, index],
                        },
                        area,
                    };
                }
                TokenKind::Dot => {
                    self.bump();
                    let (name, name_area) = self.expect_identifier()?;
                    if matches!(self.peek().kind, TokenKind::LParen) {
                        let (args, end) = self.argument_list()?;
                        let area = expr.area.merge(end);
                        expr = Expr {
                            kind: ExprKind::MethodCall {
                                object: Box::new(expr),
                                name,
                                args,
                            },
                            area,
                        };
                    } else {
                        let area = expr.area.merge(name_area);
                        expr = Expr {
                            kind: ExprKind::FieldAccess {
                                object: Box::new(expr),
                                name,
                            },
                            area,
                        };
                    }
                }
                _ => return Ok(expr),
            }
        }
    }

    fn argument_list(&mut self) -> RunResult<(Vec<Expr>, SourceArea)> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if !matches!(self.peek().kind, TokenKind::RParen) {
            loop {
                args.push(self.expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.expect(&TokenKind::RParen)?.area;
        Ok((args, end))
    }

    fn primary(&mut self) -> RunResult<Expr> {
        let token = self.peek().clone();
        let area = token.area;
        let kind = match token.kind {
            TokenKind::Integer(value) => {
                self.bump();
                ExprKind::Literal(Literal::Integer(value))
            }
            TokenKind::Real(value) => {
                self.bump();
                ExprKind::Literal(Literal::Real(value))
            }
            TokenKind::Character(value) => {
                self.bump();
                ExprKind::Literal(Literal::Character(value))
            }
            TokenKind::Str(ref bytes) => {
                let literal = Literal::Str(Rc::from(bytes.as_slice()));
                self.bump();
                ExprKind::Literal(literal)
            }
            TokenKind::KwTrue => {
                self.bump();
                ExprKind::Literal(Literal::Boolean(true))
            }
            TokenKind::KwFalse => {
                self.bump();
                ExprKind::Literal(Literal::Boolean(false))
            }
            TokenKind::KwNothing => {
                self.bump();
                ExprKind::Literal(Literal::Nothing)
            }
            TokenKind::Identifier(name) => {
                self.bump();
                ExprKind::Identifier(name)
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.expression()?;
                self.expect(&TokenKind::RParen)?;
                return Ok(inner);
            }
            TokenKind::LBracket => {
                self.bump();
                let mut elements = Vec::new();
                if !matches!(self.peek().kind, TokenKind::RBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let end = self.expect(&TokenKind::RBracket)?.area;
                return Ok(Expr {
                    kind: ExprKind::ArrayLiteral(elements),
                    area: area.merge(end),
                });
            }
            TokenKind::KwFunction => {
                let func = self.function(false)?;
                let area = self.functions[func.index()].area;
                return Ok(Expr {
                    kind: ExprKind::Function(func),
                    area,
                });
            }
            _ => {
                return Err(self.error_here(format!("expected expression, found {}", token.kind.describe())));
            }
        };
        Ok(Expr { kind, area })
    }
}

/// Whether an expression form may appear on the left of `=`.
fn is_assignable(kind: &ExprKind) -> bool {
    match kind {
        ExprKind::Identifier(_) | ExprKind::FieldAccess { .. } => true,
        ExprKind::Operator { op, .. } => *op == OperatorKind::Index,
        _ => false,
    }
}

/// Binding power table for binary operators; higher binds tighter.
fn binary_operator(kind: &TokenKind) -> Option<(OperatorKind, u8)> {
    Some(match kind {
        TokenKind::OrOr => (OperatorKind::Or, 1),
        TokenKind::AndAnd => (OperatorKind::And, 2),
        TokenKind::Pipe => (OperatorKind::Bitor, 3),
        TokenKind::Caret => (OperatorKind::Bitxor, 4),
        TokenKind::Amp => (OperatorKind::Bitand, 5),
        TokenKind::EqEq => (OperatorKind::Eq, 6),
        TokenKind::Neq => (OperatorKind::Neq, 6),
        TokenKind::Lt => (OperatorKind::Lt, 7),
        TokenKind::Leq => (OperatorKind::Leq, 7),
        TokenKind::Gt => (OperatorKind::Gt, 7),
        TokenKind::Geq => (OperatorKind::Geq, 7),
        TokenKind::Shl => (OperatorKind::Lshift, 8),
        TokenKind::Shr => (OperatorKind::Rshift, 8),
        TokenKind::Plus => (OperatorKind::Add, 9),
        TokenKind::Minus => (OperatorKind::Sub, 9),
        TokenKind::Star => (OperatorKind::Mult, 10),
        TokenKind::Slash => (OperatorKind::Div, 10),
        TokenKind::Percent => (OperatorKind::Rem, 10),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{intern::Interner, lexer::Lexer};

    fn parse(source: &str) -> Program {
        let mut interner = Interner::new();
        let file = interner.intern("test.cal");
        let tokens = Lexer::new(source, file).tokenize(&mut interner).unwrap();
        Parser::new(tokens).parse().unwrap()
    }

    fn parse_err(source: &str) -> RunError {
        let mut interner = Interner::new();
        let file = interner.intern("test.cal");
        let tokens = Lexer::new(source, file).tokenize(&mut interner).unwrap();
        Parser::new(tokens).parse().unwrap_err()
    }

    #[test]
    fn precedence_shapes_arithmetic() {
        let program = parse("x = 1 + 2 * 3;");
        let StmtKind::Expr(expr) = &program.body[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Assign { value, .. } = &expr.kind else {
            panic!("expected assignment");
        };
        let ExprKind::Operator { op, operands } = &value.kind else {
            panic!("expected operator");
        };
        assert_eq!(*op, OperatorKind::Add);
        assert!(matches!(
            operands[1].kind,
            ExprKind::Operator {
                op: OperatorKind::Mult,
                ..
            }
        ));
    }

    #[test]
    fn postfix_binds_tighter_than_prefix() {
        let program = parse("-a[0];");
        let StmtKind::Expr(expr) = &program.body[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Operator { op, operands } = &expr.kind else {
            panic!("expected operator");
        };
        assert_eq!(*op, OperatorKind::Neg);
        assert!(matches!(
            operands[0].kind,
            ExprKind::Operator {
                op: OperatorKind::Index,
                ..
            }
        ));
    }

    #[test]
    fn hoists_function_blueprints() {
        let program = parse("function add(a, b) { return a + b; }");
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].params.len(), 2);
        assert!(matches!(program.body[0].kind, StmtKind::FuncDef(_)));
    }

    #[test]
    fn record_with_fields_and_methods() {
        let program = parse("record Pt { x; y; function norm(p) { return p.x * p.x + p.y * p.y; } }");
        let StmtKind::RecordDef { fields, methods, .. } = &program.body[0].kind else {
            panic!("expected record definition");
        };
        assert_eq!(fields.len(), 2);
        assert_eq!(methods.len(), 1);
    }

    #[test]
    fn for_header_fields_are_optional() {
        let program = parse("for ;; { break; }");
        let StmtKind::For { init, cond, step, .. } = &program.body[0].kind else {
            panic!("expected for statement");
        };
        assert!(init.is_none() && cond.is_none() && step.is_none());
    }

    #[test]
    fn rejects_invalid_assignment_target() {
        let err = parse_err("1 + 2 = 3;");
        assert_eq!(err.kind, ErrorKind::Parse);
        assert!(err.message.contains("assignment target"));
    }

    #[test]
    fn rejects_deep_nesting() {
        let source = format!("x = {}1{};", "(".repeat(300), ")".repeat(300));
        let err = parse_err(&source);
        assert!(err.message.contains("nested too deeply"));
    }
}
