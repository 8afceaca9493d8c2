//! Expression parsing: precedence climbing over the COOL operator table.
//!
//! # Operator precedence (lowest to highest)
//!
//! | Level | Operators | Associativity |
//! |-------|----------------------|------------------|
//! | 1 | `ID <- expr` | right |
//! | 2 | `not` (prefix) | right |
//! | 3 | `<=`, `<`, `=` | non-associative |
//! | 4 | `+`, `-` | left |
//! | 5 | `*`, `/` | left |
//! | 6 | `isvoid` (prefix) | right |
//! | 7 | `~` (prefix) | right |
//! | 8 | `.`, `@TYPE.` | left |
//! | 9 | atoms | n/a |
//!
//! Each precedence level is one method; the chain bottoms out in
//! [`Parser::parse_primary`]. Level 3 consumes at most one comparison, so
//! `a < b < c` is a syntax error rather than `(a < b) < c`.

use coolc_lex::TokenKind;
use coolc_util::Names;

use crate::ast::{CaseBranch, Expr, ExprKind};
use crate::{Parser, SyntaxError};

impl<'a> Parser<'a> {
    /// Level 1: `ID <- expr`, right-associative, else level 2.
    pub fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        if self.check_kind(TokenKind::ObjectId) && self.peek_next_is_kind(TokenKind::Assign) {
            return self.parse_assign();
        }
        self.parse_not()
    }

    fn parse_assign(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        let id = self.expect_kind(TokenKind::ObjectId)?.lexeme.clone();
        self.expect_kind(TokenKind::Assign)?;
        let rhs = self.parse_expr()?;
        Ok(Expr::new(
            line,
            ExprKind::Assign {
                id,
                rhs: Box::new(rhs),
            },
        ))
    }

    /// Level 2: prefix `not`.
    fn parse_not(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        if self.match_kind(TokenKind::Not) {
            let operand = self.parse_not()?;
            return Ok(Expr::new(line, ExprKind::Not(Box::new(operand))));
        }
        self.parse_comparison()
    }

    /// Level 3: at most one of `<=`, `<`, `=`.
    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        let lhs = self.parse_additive()?;

        if self.match_kind(TokenKind::Le) {
            let rhs = self.parse_additive()?;
            return Ok(Expr::new(line, ExprKind::Le(Box::new(lhs), Box::new(rhs))));
        }
        if self.match_atom('<') {
            let rhs = self.parse_additive()?;
            return Ok(Expr::new(line, ExprKind::Lt(Box::new(lhs), Box::new(rhs))));
        }
        if self.match_atom('=') {
            let rhs = self.parse_additive()?;
            return Ok(Expr::new(line, ExprKind::Eq(Box::new(lhs), Box::new(rhs))));
        }
        Ok(lhs)
    }

    /// Level 4: left-associative `+` and `-`.
    fn parse_additive(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        let mut term = self.parse_multiplicative()?;
        loop {
            if self.match_atom('+') {
                let rhs = self.parse_multiplicative()?;
                term = Expr::new(line, ExprKind::Plus(Box::new(term), Box::new(rhs)));
            } else if self.match_atom('-') {
                let rhs = self.parse_multiplicative()?;
                term = Expr::new(line, ExprKind::Minus(Box::new(term), Box::new(rhs)));
            } else {
                return Ok(term);
            }
        }
    }

    /// Level 5: left-associative `*` and `/`.
    fn parse_multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        let mut term = self.parse_isvoid()?;
        loop {
            if self.match_atom('*') {
                let rhs = self.parse_isvoid()?;
                term = Expr::new(line, ExprKind::Mul(Box::new(term), Box::new(rhs)));
            } else if self.match_atom('/') {
                let rhs = self.parse_isvoid()?;
                term = Expr::new(line, ExprKind::Div(Box::new(term), Box::new(rhs)));
            } else {
                return Ok(term);
            }
        }
    }

    /// Level 6: prefix `isvoid`.
    fn parse_isvoid(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        if self.match_kind(TokenKind::Isvoid) {
            let operand = self.parse_isvoid()?;
            return Ok(Expr::new(line, ExprKind::IsVoid(Box::new(operand))));
        }
        self.parse_neg()
    }

    /// Level 7: prefix `~`.
    fn parse_neg(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        if self.match_atom('~') {
            let operand = self.parse_neg()?;
            return Ok(Expr::new(line, ExprKind::Neg(Box::new(operand))));
        }
        self.parse_postfix()
    }

    /// Level 8: left-associative dispatch chains `.m(...)` and `@T.m(...)`.
    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut term = self.parse_primary()?;
        loop {
            let line = self.line();
            if self.match_atom('@') {
                let ty = self.expect_kind(TokenKind::TypeId)?.lexeme.clone();
                self.expect_atom('.')?;
                let method = self.expect_kind(TokenKind::ObjectId)?.lexeme.clone();
                let args = self.parse_args()?;
                term = Expr::new(
                    line,
                    ExprKind::StaticDispatch {
                        recv: Box::new(term),
                        ty,
                        method,
                        args,
                    },
                );
            } else if self.match_atom('.') {
                let method = self.expect_kind(TokenKind::ObjectId)?.lexeme.clone();
                let args = self.parse_args()?;
                term = Expr::new(
                    line,
                    ExprKind::Dispatch {
                        recv: Box::new(term),
                        method,
                        args,
                    },
                );
            } else {
                return Ok(term);
            }
        }
    }

    /// `"(" [expr ("," expr)*] ")"`: an actual-argument list.
    fn parse_args(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        self.expect_atom('(')?;
        let mut args = Vec::new();
        if !self.check_atom(')') {
            args.push(self.parse_expr()?);
            while self.match_atom(',') {
                args.push(self.parse_expr()?);
            }
        }
        self.expect_atom(')')?;
        Ok(args)
    }

    /// Level 9: the atoms of the expression grammar.
    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        let Some(token) = self.peek() else {
            return Err(self.syntax_error());
        };
        match token.kind {
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Let => self.parse_let(),
            TokenKind::Case => self.parse_case(),
            TokenKind::New => {
                self.advance();
                let ty = self.expect_kind(TokenKind::TypeId)?.lexeme.clone();
                Ok(Expr::new(line, ExprKind::New { ty }))
            }
            TokenKind::ObjectId if self.peek_next_is_atom('(') => {
                // `f(args)` dispatches on an implicit `self`.
                let method = self.advance().unwrap().lexeme.clone();
                let args = self.parse_args()?;
                Ok(Expr::new(
                    line,
                    ExprKind::Dispatch {
                        recv: Box::new(Expr::new(
                            line,
                            ExprKind::Id(Names::SELF.to_string()),
                        )),
                        method,
                        args,
                    },
                ))
            }
            TokenKind::ObjectId if self.peek_next_is_kind(TokenKind::Assign) => {
                self.parse_assign()
            }
            TokenKind::ObjectId => {
                let name = self.advance().unwrap().lexeme.clone();
                Ok(Expr::new(line, ExprKind::Id(name)))
            }
            TokenKind::IntConst => {
                let lexeme = self.advance().unwrap().lexeme.clone();
                let value = lexeme.parse::<u32>().unwrap_or(u32::MAX);
                Ok(Expr::new(line, ExprKind::Int(value)))
            }
            TokenKind::StrConst => {
                let lexeme = self.advance().unwrap().lexeme.clone();
                Ok(Expr::new(line, ExprKind::Str(lexeme)))
            }
            TokenKind::BoolConst => {
                let lexeme = self.advance().unwrap().lexeme.clone();
                Ok(Expr::new(line, ExprKind::Bool(lexeme == "true")))
            }
            TokenKind::Atom if self.check_atom('{') => self.parse_block(),
            TokenKind::Atom if self.check_atom('(') => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect_atom(')')?;
                Ok(Expr::new(line, ExprKind::Paren(Box::new(inner))))
            }
            _ => Err(self.syntax_error()),
        }
    }

    /// `"if" expr "then" expr "else" expr "fi"`
    fn parse_if(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        self.expect_kind(TokenKind::If)?;
        let cond = self.parse_expr()?;
        self.expect_kind(TokenKind::Then)?;
        let then_branch = self.parse_expr()?;
        self.expect_kind(TokenKind::Else)?;
        let else_branch = self.parse_expr()?;
        self.expect_kind(TokenKind::Fi)?;
        Ok(Expr::new(
            line,
            ExprKind::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
        ))
    }

    /// `"while" expr "loop" expr "pool"`
    fn parse_while(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        self.expect_kind(TokenKind::While)?;
        let cond = self.parse_expr()?;
        self.expect_kind(TokenKind::Loop)?;
        let body = self.parse_expr()?;
        self.expect_kind(TokenKind::Pool)?;
        Ok(Expr::new(
            line,
            ExprKind::While {
                cond: Box::new(cond),
                body: Box::new(body),
            },
        ))
    }

    /// `"{" (expr ";")+ "}"`
    fn parse_block(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        self.expect_atom('{')?;
        let mut exprs = Vec::new();
        loop {
            exprs.push(self.parse_expr()?);
            self.expect_atom(';')?;
            if self.check_atom('}') {
                break;
            }
        }
        self.expect_atom('}')?;
        Ok(Expr::new(line, ExprKind::Block { exprs }))
    }

    /// `"let" binding ("," binding)* "in" expr`, desugared left-outermost
    /// into nested single-binding `Let` nodes.
    fn parse_let(&mut self) -> Result<Expr, SyntaxError> {
        self.expect_kind(TokenKind::Let)?;

        struct Binding {
            line: u32,
            id: String,
            ty: String,
            init: Expr,
        }

        let mut bindings = Vec::new();
        loop {
            let line = self.line();
            let id = self.expect_kind(TokenKind::ObjectId)?.lexeme.clone();
            self.expect_atom(':')?;
            let ty = self.expect_kind(TokenKind::TypeId)?.lexeme.clone();
            let init = if self.match_kind(TokenKind::Assign) {
                self.parse_expr()?
            } else {
                Expr::no_expr(line)
            };
            bindings.push(Binding { line, id, ty, init });
            if !self.match_atom(',') {
                break;
            }
        }
        self.expect_kind(TokenKind::In)?;
        let body = self.parse_expr()?;

        let mut expr = body;
        for binding in bindings.into_iter().rev() {
            expr = Expr::new(
                binding.line,
                ExprKind::Let {
                    id: binding.id,
                    ty: binding.ty,
                    init: Box::new(binding.init),
                    body: Box::new(expr),
                },
            );
        }
        Ok(expr)
    }

    /// `"case" expr "of" (OBJECTID ":" TYPEID "=>" expr ";")+ "esac"`
    fn parse_case(&mut self) -> Result<Expr, SyntaxError> {
        let line = self.line();
        self.expect_kind(TokenKind::Case)?;
        let scrutinee = self.parse_expr()?;
        self.expect_kind(TokenKind::Of)?;
        let mut branches = Vec::new();
        loop {
            branches.push(self.parse_case_branch()?);
            if self.check_kind(TokenKind::Esac) {
                break;
            }
        }
        self.expect_kind(TokenKind::Esac)?;
        Ok(Expr::new(
            line,
            ExprKind::Case {
                scrutinee: Box::new(scrutinee),
                branches,
            },
        ))
    }

    fn parse_case_branch(&mut self) -> Result<CaseBranch, SyntaxError> {
        let line = self.line();
        let id = self.expect_kind(TokenKind::ObjectId)?.lexeme.clone();
        self.expect_atom(':')?;
        let ty = self.expect_kind(TokenKind::TypeId)?.lexeme.clone();
        self.expect_kind(TokenKind::Darrow)?;
        let body = self.parse_expr()?;
        self.expect_atom(';')?;
        Ok(CaseBranch {
            line,
            result_type: Names::NO_TYPE.to_string(),
            id,
            ty,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use coolc_lex::tokenize;

    /// Parses `source` as the body of a one-method class and returns it.
    fn parse_body(source: &str) -> Expr {
        let wrapped = format!("class Main {{ main(): Int {{ {source} }}; }};");
        let program = parse(&tokenize(&wrapped), "test.cl").unwrap();
        match &program.classes[0].features[0] {
            crate::Feature::Method(m) => m.body.clone(),
            _ => unreachable!(),
        }
    }

    fn parse_body_err(source: &str) -> SyntaxError {
        let wrapped = format!("class Main {{ main(): Int {{ {source} }}; }};");
        parse(&tokenize(&wrapped), "test.cl").unwrap_err()
    }

    #[test]
    fn test_mul_binds_tighter_than_plus() {
        let body = parse_body("1 + 2 * 3");
        let ExprKind::Plus(lhs, rhs) = &body.kind else {
            panic!("expected Plus at the top");
        };
        assert!(matches!(lhs.kind, ExprKind::Int(1)));
        assert!(matches!(rhs.kind, ExprKind::Mul(_, _)));
    }

    #[test]
    fn test_additive_is_left_associative() {
        let body = parse_body("1 - 2 - 3");
        let ExprKind::Minus(lhs, rhs) = &body.kind else {
            panic!("expected Minus at the top");
        };
        assert!(matches!(lhs.kind, ExprKind::Minus(_, _)));
        assert!(matches!(rhs.kind, ExprKind::Int(3)));
    }

    #[test]
    fn test_comparison_is_non_associative() {
        let err = parse_body_err("1 < 2 < 3");
        assert_eq!(err.token, "'<'");
    }

    #[test]
    fn test_comparison_over_additive() {
        let body = parse_body("1 + 2 = 3 + 4");
        let ExprKind::Eq(lhs, rhs) = &body.kind else {
            panic!("expected Eq at the top");
        };
        assert!(matches!(lhs.kind, ExprKind::Plus(_, _)));
        assert!(matches!(rhs.kind, ExprKind::Plus(_, _)));
    }

    #[test]
    fn test_not_binds_looser_than_comparison() {
        let body = parse_body("not 1 < 2");
        let ExprKind::Not(operand) = &body.kind else {
            panic!("expected Not at the top");
        };
        assert!(matches!(operand.kind, ExprKind::Lt(_, _)));
    }

    #[test]
    fn test_neg_binds_tighter_than_mul() {
        let body = parse_body("~1 * 2");
        let ExprKind::Mul(lhs, _) = &body.kind else {
            panic!("expected Mul at the top");
        };
        assert!(matches!(lhs.kind, ExprKind::Neg(_)));
    }

    #[test]
    fn test_isvoid_operand_is_unary_level() {
        let body = parse_body("isvoid x = true");
        let ExprKind::Eq(lhs, _) = &body.kind else {
            panic!("expected Eq at the top");
        };
        assert!(matches!(lhs.kind, ExprKind::IsVoid(_)));
    }

    #[test]
    fn test_assign_is_right_associative() {
        let body = parse_body("x <- y <- 1");
        let ExprKind::Assign { rhs, .. } = &body.kind else {
            panic!("expected Assign at the top");
        };
        assert!(matches!(rhs.kind, ExprKind::Assign { .. }));
    }

    #[test]
    fn test_assign_spans_arithmetic() {
        let body = parse_body("x <- 1 + 2");
        let ExprKind::Assign { rhs, .. } = &body.kind else {
            panic!("expected Assign at the top");
        };
        assert!(matches!(rhs.kind, ExprKind::Plus(_, _)));
    }

    #[test]
    fn test_self_dispatch_synthesized() {
        let body = parse_body("f(1)");
        let ExprKind::Dispatch { recv, method, args } = &body.kind else {
            panic!("expected Dispatch at the top");
        };
        assert!(matches!(&recv.kind, ExprKind::Id(name) if name == "self"));
        assert_eq!(method, "f");
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_dispatch_chain_left_associative() {
        let body = parse_body("a.f().g()");
        let ExprKind::Dispatch { recv, method, .. } = &body.kind else {
            panic!("expected Dispatch at the top");
        };
        assert_eq!(method, "g");
        assert!(matches!(&recv.kind, ExprKind::Dispatch { method, .. } if method == "f"));
    }

    #[test]
    fn test_static_dispatch() {
        let body = parse_body("x@A.f(1, 2)");
        let ExprKind::StaticDispatch { ty, method, args, .. } = &body.kind else {
            panic!("expected StaticDispatch at the top");
        };
        assert_eq!(ty, "A");
        assert_eq!(method, "f");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_dispatch_binds_tighter_than_neg() {
        let body = parse_body("~x.f()");
        let ExprKind::Neg(operand) = &body.kind else {
            panic!("expected Neg at the top");
        };
        assert!(matches!(operand.kind, ExprKind::Dispatch { .. }));
    }

    #[test]
    fn test_let_desugars_left_outermost() {
        let body = parse_body("let x : Int <- 1, y : Int in y");
        let ExprKind::Let { id, init, body, .. } = &body.kind else {
            panic!("expected Let at the top");
        };
        assert_eq!(id, "x");
        assert!(matches!(init.kind, ExprKind::Int(1)));
        let ExprKind::Let { id, init, body, .. } = &body.kind else {
            panic!("expected nested Let");
        };
        assert_eq!(id, "y");
        assert!(init.is_no_expr());
        assert!(matches!(&body.kind, ExprKind::Id(name) if name == "y"));
    }

    #[test]
    fn test_block_requires_expression() {
        let err = parse_body_err("{ }");
        assert_eq!(err.token, "'}'");
    }

    #[test]
    fn test_block_collects_expressions() {
        let body = parse_body("{ 1; 2; 3; }");
        let ExprKind::Block { exprs } = &body.kind else {
            panic!("expected Block at the top");
        };
        assert_eq!(exprs.len(), 3);
    }

    #[test]
    fn test_case_branches() {
        let body = parse_body("case x of a : Int => 1; b : Object => 2; esac");
        let ExprKind::Case { branches, .. } = &body.kind else {
            panic!("expected Case at the top");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].id, "a");
        assert_eq!(branches[0].ty, "Int");
        assert_eq!(branches[1].ty, "Object");
    }

    #[test]
    fn test_if_and_while() {
        let body = parse_body("if x < 0 then 1 else 2 fi");
        assert!(matches!(body.kind, ExprKind::If { .. }));
        let body = parse_body("while false loop 1 pool");
        assert!(matches!(body.kind, ExprKind::While { .. }));
    }

    #[test]
    fn test_parens_are_kept() {
        let body = parse_body("(1 + 2) * 3");
        let ExprKind::Mul(lhs, _) = &body.kind else {
            panic!("expected Mul at the top");
        };
        assert!(matches!(lhs.kind, ExprKind::Paren(_)));
    }

    #[test]
    fn test_new_self_type() {
        let body = parse_body("new SELF_TYPE");
        assert!(matches!(&body.kind, ExprKind::New { ty } if ty == "SELF_TYPE"));
    }

    #[test]
    fn test_int_literal_saturates() {
        let body = parse_body("99999999999999999999");
        assert!(matches!(body.kind, ExprKind::Int(u32::MAX)));
    }

    #[test]
    fn test_line_numbers_on_nodes() {
        let wrapped = "class Main {\n main(): Int {\n 1 + 2\n };\n};";
        let program = parse(&tokenize(wrapped), "test.cl").unwrap();
        let crate::Feature::Method(m) = &program.classes[0].features[0] else {
            unreachable!();
        };
        assert_eq!(m.line, 2);
        assert_eq!(m.body.line, 3);
    }
}
