//! AST dump in the reference toolchain's format, used for differential
//! testing of the parser.
//!
//! Every node prints a `#<line>` marker, its tag (`_class`, `_plus`, ...),
//! its children indented by two more spaces, and, for expressions, a
//! trailing `: <result_type>` line at the node's own indent. Parenthesized
//! expressions are transparent and typecase prints as `_typcase`.

use crate::ast::{Attr, CaseBranch, Class, Expr, ExprKind, Formal, Method, Program};

/// Renders the whole program dump.
///
/// # Example
///
/// ```
/// use coolc_lex::tokenize;
/// use coolc_par::{dump_program, parse};
///
/// let program = parse(&tokenize("class A { };"), "a.cl").unwrap();
/// assert!(dump_program(&program).starts_with("#1\n_program\n"));
/// ```
pub fn dump_program(program: &Program) -> String {
    let mut printer = Printer::new();
    printer.program(program);
    printer.out
}

struct Printer {
    out: String,
    offset: usize,
}

impl Printer {
    fn new() -> Self {
        Self {
            out: String::new(),
            offset: 0,
        }
    }

    fn write(&mut self, content: &str) {
        for _ in 0..self.offset {
            self.out.push(' ');
        }
        self.out.push_str(content);
        self.out.push('\n');
    }

    fn marker(&mut self, line: u32) {
        self.write(&format!("#{line}"));
    }

    fn indent(&mut self) {
        self.offset += 2;
    }

    fn dedent(&mut self) {
        self.offset -= 2;
    }

    fn program(&mut self, program: &Program) {
        self.marker(program.line);
        self.write("_program");
        self.indent();
        for class in &program.classes {
            self.class(class);
        }
        self.dedent();
    }

    fn class(&mut self, class: &Class) {
        self.marker(class.line);
        self.write("_class");
        self.indent();
        self.write(&class.name);
        self.write(&class.parent);
        self.write(&format!("\"{}\"", class.filename));
        self.write("(");
        for feature in &class.features {
            match feature {
                crate::Feature::Attr(attr) => self.attr(attr),
                crate::Feature::Method(method) => self.method(method),
            }
        }
        self.write(")");
        self.dedent();
    }

    fn attr(&mut self, attr: &Attr) {
        self.marker(attr.line);
        self.write("_attr");
        self.indent();
        self.write(&attr.name);
        self.write(&attr.ty);
        self.expr(&attr.init);
        self.dedent();
    }

    fn method(&mut self, method: &Method) {
        self.marker(method.line);
        self.write("_method");
        self.indent();
        self.write(&method.name);
        for formal in &method.formals {
            self.formal(formal);
        }
        self.write(&method.return_type);
        self.expr(&method.body);
        self.dedent();
    }

    fn formal(&mut self, formal: &Formal) {
        self.marker(formal.line);
        self.write("_formal");
        self.indent();
        self.write(&formal.name);
        self.write(&formal.ty);
        self.dedent();
    }

    fn branch(&mut self, branch: &CaseBranch) {
        self.marker(branch.line);
        self.write("_branch");
        self.indent();
        self.write(&branch.id);
        self.write(&branch.ty);
        self.expr(&branch.body);
        self.dedent();
    }

    fn expr(&mut self, expr: &Expr) {
        // Parens mirror the source but are invisible in the dump.
        if let ExprKind::Paren(inner) = &expr.kind {
            self.expr(inner);
            return;
        }
        if let ExprKind::NoExpr = &expr.kind {
            self.marker(expr.line);
            self.write("_no_expr");
            self.write(&format!(": {}", expr.result_type));
            return;
        }

        self.marker(expr.line);
        match &expr.kind {
            ExprKind::Assign { id, rhs } => {
                self.write("_assign");
                self.indent();
                self.write(id);
                self.expr(rhs);
                self.dedent();
            }
            ExprKind::StaticDispatch {
                recv,
                ty,
                method,
                args,
            } => {
                self.write("_static_dispatch");
                self.indent();
                self.expr(recv);
                self.write(ty);
                self.write(method);
                self.write("(");
                for arg in args {
                    self.expr(arg);
                }
                self.write(")");
                self.dedent();
            }
            ExprKind::Dispatch { recv, method, args } => {
                self.write("_dispatch");
                self.indent();
                self.expr(recv);
                self.write(method);
                self.write("(");
                for arg in args {
                    self.expr(arg);
                }
                self.write(")");
                self.dedent();
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.write("_cond");
                self.indent();
                self.expr(cond);
                self.expr(then_branch);
                self.expr(else_branch);
                self.dedent();
            }
            ExprKind::While { cond, body } => {
                self.write("_loop");
                self.indent();
                self.expr(cond);
                self.expr(body);
                self.dedent();
            }
            ExprKind::Block { exprs } => {
                self.write("_block");
                self.indent();
                for e in exprs {
                    self.expr(e);
                }
                self.dedent();
            }
            ExprKind::Let { id, ty, init, body } => {
                self.write("_let");
                self.indent();
                self.write(id);
                self.write(ty);
                self.expr(init);
                self.expr(body);
                self.dedent();
            }
            ExprKind::Case {
                scrutinee,
                branches,
            } => {
                self.write("_typcase");
                self.indent();
                self.expr(scrutinee);
                for branch in branches {
                    self.branch(branch);
                }
                self.dedent();
            }
            ExprKind::New { ty } => {
                self.write("_new");
                self.indent();
                self.write(ty);
                self.dedent();
            }
            ExprKind::IsVoid(e) => self.unary("_isvoid", e),
            ExprKind::Not(e) => self.unary("_comp", e),
            ExprKind::Neg(e) => self.unary("_neg", e),
            ExprKind::Plus(lhs, rhs) => self.binary("_plus", lhs, rhs),
            ExprKind::Minus(lhs, rhs) => self.binary("_sub", lhs, rhs),
            ExprKind::Mul(lhs, rhs) => self.binary("_mul", lhs, rhs),
            ExprKind::Div(lhs, rhs) => self.binary("_divide", lhs, rhs),
            ExprKind::Lt(lhs, rhs) => self.binary("_lt", lhs, rhs),
            ExprKind::Le(lhs, rhs) => self.binary("_leq", lhs, rhs),
            ExprKind::Eq(lhs, rhs) => self.binary("_eq", lhs, rhs),
            ExprKind::Int(value) => {
                self.write("_int");
                self.indent();
                self.write(&value.to_string());
                self.dedent();
            }
            ExprKind::Str(value) => {
                self.write("_string");
                self.indent();
                self.write(value);
                self.dedent();
            }
            ExprKind::Bool(value) => {
                self.write("_bool");
                self.indent();
                self.write(if *value { "1" } else { "0" });
                self.dedent();
            }
            ExprKind::Id(name) => {
                self.write("_object");
                self.indent();
                self.write(name);
                self.dedent();
            }
            ExprKind::Paren(_) | ExprKind::NoExpr => unreachable!("handled above"),
        }
        self.write(&format!(": {}", expr.result_type));
    }

    fn unary(&mut self, tag: &str, operand: &Expr) {
        self.write(tag);
        self.indent();
        self.expr(operand);
        self.dedent();
    }

    fn binary(&mut self, tag: &str, lhs: &Expr, rhs: &Expr) {
        self.write(tag);
        self.indent();
        self.expr(lhs);
        self.expr(rhs);
        self.dedent();
    }
}
