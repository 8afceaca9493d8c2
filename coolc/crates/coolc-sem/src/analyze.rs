//! The semantic analyzer: a post-order walk that decorates every
//! expression with its static type and enforces the typing rules.
//!
//! The walk mutates the AST in place (each node's `result_type` is
//! written exactly once) and returns the [`TypeEnvironment`] the code
//! generator consumes afterwards.

use coolc_par::{Attr, CaseBranch, Class, Expr, ExprKind, Method, Program};
use coolc_util::Names;

use crate::error::SemanticError;
use crate::type_env::TypeEnvironment;

/// Type-checks the program, decorating it in place.
///
/// # Example
///
/// ```
/// use coolc_lex::tokenize;
/// use coolc_par::parse;
/// use coolc_sem::analyze;
///
/// let mut program = parse(&tokenize("class Main { main(): Int { 0 }; };"), "m.cl").unwrap();
/// let env = analyze(&mut program).unwrap();
/// assert!(env.class_table.is_defined("Main"));
/// ```
pub fn analyze(program: &mut Program) -> Result<TypeEnvironment, SemanticError> {
    let env = TypeEnvironment::new(&program.classes)?;
    let mut analyzer = SemanticAnalyzer { env };
    analyzer.check_main()?;
    for class in &mut program.classes {
        analyzer.visit_class(class)?;
    }
    Ok(analyzer.env)
}

struct SemanticAnalyzer {
    env: TypeEnvironment,
}

impl SemanticAnalyzer {
    /// `Main.main` must exist and take no arguments. Checked before any
    /// body is typed.
    fn check_main(&self) -> Result<(), SemanticError> {
        if !self.env.class_table.is_defined(Names::MAIN) {
            return Err(SemanticError::MainNotDefined);
        }
        let Some(main) = self.env.method_env.get(Names::MAIN, Names::MAIN_METHOD) else {
            return Err(SemanticError::NoMainMethod);
        };
        if main.arity() != 0 {
            return Err(SemanticError::MainHasArguments);
        }
        Ok(())
    }

    fn visit_class(&mut self, class: &mut Class) -> Result<(), SemanticError> {
        self.env.enter_class(class);
        self.bind_inherited_attrs(&class.parent);

        for attr in class.attrs() {
            if attr.name != Names::SELF && self.env.object_env.is_defined(&attr.name) {
                return Err(SemanticError::InheritedAttributeRedefined(
                    attr.name.clone(),
                ));
            }
        }

        let mut seen = Vec::new();
        for feature in &mut class.features {
            if let coolc_par::Feature::Attr(attr) = feature {
                self.visit_attr(attr)?;
                seen.push(attr.name.clone());
            }
        }
        if let Some(dup) = first_duplicate(&seen) {
            return Err(SemanticError::AttributeRedefined(dup));
        }

        for feature in &mut class.features {
            if let coolc_par::Feature::Method(method) = feature {
                self.visit_method(method)?;
            }
        }

        self.env.exit_class();
        Ok(())
    }

    /// Brings every inherited attribute into scope, root-most ancestor
    /// first, so a class's own bodies see them.
    fn bind_inherited_attrs(&mut self, parent: &str) {
        let mut bindings: Vec<(String, String)> = Vec::new();
        let mut current = parent.to_string();
        while current != Names::OBJECT && current != Names::IO {
            let own: Vec<(String, String)> = self
                .env
                .class_table
                .attributes_of(&current)
                .iter()
                .map(|attr| (attr.name.clone(), attr.ty.clone()))
                .collect();
            bindings.splice(0..0, own);
            current = match self.env.class_table.get_parent(&current) {
                Some(parent) => parent.to_string(),
                None => break,
            };
        }
        for (name, ty) in bindings {
            self.env.object_env.add(name, ty);
        }
    }

    fn visit_attr(&mut self, attr: &mut Attr) -> Result<(), SemanticError> {
        if attr.name == Names::SELF {
            return Err(SemanticError::SelfAttribute);
        }
        if !self.env.is_defined(&attr.ty) {
            return Err(SemanticError::UndefinedAttributeType {
                ty: attr.ty.clone(),
                attr: attr.name.clone(),
            });
        }
        self.env.object_env.add(attr.name.clone(), attr.ty.clone());

        if attr.init.is_no_expr() {
            return Ok(());
        }
        let init_ty = self.visit_expr(&mut attr.init)?;
        if !self.env.is_subtype(&init_ty, &attr.ty) {
            return Err(SemanticError::AttributeInitMismatch {
                attr: attr.name.clone(),
                actual: init_ty,
                declared: attr.ty.clone(),
            });
        }
        Ok(())
    }

    fn visit_method(&mut self, method: &mut Method) -> Result<(), SemanticError> {
        self.env.object_env.enter_scope();
        for formal in &method.formals {
            if formal.ty == Names::SELF_TYPE {
                return Err(SemanticError::SelfTypeFormal(formal.name.clone()));
            }
            if self.env.object_env.is_defined_local(&formal.name) {
                return Err(SemanticError::FormalRedefined(formal.name.clone()));
            }
            self.env.object_env.add(formal.name.clone(), formal.ty.clone());
        }

        let body_ty = self.visit_expr(&mut method.body)?;
        if !self.env.is_subtype(&body_ty, &method.return_type) {
            return Err(SemanticError::MethodBodyMismatch {
                method: method.name.clone(),
                actual: body_ty,
                declared: method.return_type.clone(),
            });
        }
        self.env.object_env.exit_scope();
        Ok(())
    }

    /// Types one expression, writes its `result_type` and returns it.
    fn visit_expr(&mut self, expr: &mut Expr) -> Result<String, SemanticError> {
        let ty = match &mut expr.kind {
            ExprKind::Int(_) => Names::INT.to_string(),
            ExprKind::Str(_) => Names::STRING.to_string(),
            ExprKind::Bool(_) => Names::BOOL.to_string(),
            ExprKind::NoExpr => Names::NO_TYPE.to_string(),
            ExprKind::Id(name) => {
                if name.as_str() == Names::SELF {
                    Names::SELF_TYPE.to_string()
                } else {
                    match self.env.object_env.get_type(name) {
                        Some(ty) => ty.to_string(),
                        None => return Err(SemanticError::UndeclaredIdentifier(name.clone())),
                    }
                }
            }
            ExprKind::Paren(inner) => self.visit_expr(inner)?,
            ExprKind::Assign { id, rhs } => {
                if id.as_str() == Names::SELF {
                    return Err(SemanticError::AssignToSelf);
                }
                if !self.env.object_env.is_defined(id) {
                    return Err(SemanticError::AssignUndeclared(id.clone()));
                }
                let declared = self
                    .env
                    .object_env
                    .get_type(id)
                    .unwrap_or(Names::OBJECT)
                    .to_string();
                let actual = self.visit_expr(rhs)?;
                if !self.env.is_subtype(&actual, &declared) {
                    return Err(SemanticError::AssignMismatch {
                        id: id.clone(),
                        actual,
                        declared,
                    });
                }
                actual
            }
            ExprKind::New { ty } => {
                if ty.as_str() != Names::SELF_TYPE && !self.env.is_defined(ty) {
                    return Err(SemanticError::NewUndefined(ty.clone()));
                }
                ty.clone()
            }
            ExprKind::IsVoid(operand) => {
                self.visit_expr(operand)?;
                Names::BOOL.to_string()
            }
            ExprKind::Not(operand) => {
                let ty = self.visit_expr(operand)?;
                if ty != Names::BOOL {
                    return Err(SemanticError::NotNotBool(ty));
                }
                Names::BOOL.to_string()
            }
            ExprKind::Neg(operand) => {
                let ty = self.visit_expr(operand)?;
                if ty != Names::INT {
                    return Err(SemanticError::NegNotInt(ty));
                }
                Names::INT.to_string()
            }
            ExprKind::Plus(lhs, rhs) => self.visit_arith(lhs, rhs, "+")?,
            ExprKind::Minus(lhs, rhs) => self.visit_arith(lhs, rhs, "-")?,
            ExprKind::Mul(lhs, rhs) => self.visit_arith(lhs, rhs, "*")?,
            ExprKind::Div(lhs, rhs) => self.visit_arith(lhs, rhs, "/")?,
            ExprKind::Lt(lhs, rhs) => {
                self.visit_compare(lhs, rhs, "<")?;
                Names::BOOL.to_string()
            }
            ExprKind::Le(lhs, rhs) => {
                self.visit_compare(lhs, rhs, "<=")?;
                Names::BOOL.to_string()
            }
            ExprKind::Eq(lhs, rhs) => {
                let t1 = self.visit_expr(lhs)?;
                let t2 = self.visit_expr(rhs)?;
                let primitive_involved =
                    Names::is_primitive(&t1) || Names::is_primitive(&t2);
                if primitive_involved && t1 != t2 {
                    return Err(SemanticError::IllegalComparison);
                }
                Names::BOOL.to_string()
            }
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.visit_expr(cond)? != Names::BOOL {
                    return Err(SemanticError::IfPredicateNotBool);
                }
                let then_ty = self.visit_expr(then_branch)?;
                let else_ty = self.visit_expr(else_branch)?;
                self.env.combine(&[then_ty, else_ty])
            }
            ExprKind::While { cond, body } => {
                if self.visit_expr(cond)? != Names::BOOL {
                    return Err(SemanticError::LoopConditionNotBool);
                }
                self.visit_expr(body)?;
                Names::OBJECT.to_string()
            }
            ExprKind::Block { exprs } => {
                let mut last = Names::OBJECT.to_string();
                for e in exprs.iter_mut() {
                    last = self.visit_expr(e)?;
                }
                last
            }
            ExprKind::Let { id, ty, init, body } => {
                self.env.object_env.enter_scope();
                if id.as_str() == Names::SELF {
                    return Err(SemanticError::LetBindsSelf);
                }
                if !self.env.is_defined(ty) {
                    return Err(SemanticError::UndefinedLetType {
                        ty: ty.clone(),
                        id: id.clone(),
                    });
                }
                let init_ty = self.visit_expr(init)?;
                if !init.is_no_expr() && !self.env.is_subtype(&init_ty, ty) {
                    return Err(SemanticError::LetInitMismatch {
                        id: id.clone(),
                        actual: init_ty,
                        declared: ty.clone(),
                    });
                }
                self.env.object_env.add(id.clone(), ty.clone());
                let body_ty = self.visit_expr(body)?;
                self.env.object_env.exit_scope();
                body_ty
            }
            ExprKind::Case {
                scrutinee,
                branches,
            } => {
                self.visit_expr(scrutinee)?;
                let mut seen = Vec::new();
                for branch in branches.iter() {
                    if seen.contains(&branch.ty) {
                        return Err(SemanticError::DuplicateCaseBranch(branch.ty.clone()));
                    }
                    seen.push(branch.ty.clone());
                }
                let mut branch_types = Vec::new();
                for branch in branches.iter_mut() {
                    branch_types.push(self.visit_branch(branch)?);
                }
                self.env.combine(&branch_types)
            }
            ExprKind::Dispatch { recv, method, args } => {
                let recv_ty = self.visit_expr(recv)?;
                if !self.env.is_defined(&recv_ty) {
                    return Err(SemanticError::DispatchOnUndefined(recv_ty));
                }
                let mut arg_types = Vec::new();
                for arg in args.iter_mut() {
                    arg_types.push(self.visit_expr(arg)?);
                }

                let lookup_class = self.env.resolve(&recv_ty).to_string();
                let Some(info) = self.env.method_env.get(&lookup_class, method) else {
                    return Err(SemanticError::DispatchToUndefined(method.clone()));
                };
                let info = info.clone();
                self.check_call(method, &info, &arg_types)?;
                if info.return_type == Names::SELF_TYPE {
                    recv_ty
                } else {
                    info.return_type
                }
            }
            ExprKind::StaticDispatch {
                recv,
                ty,
                method,
                args,
            } => {
                let recv_ty = self.visit_expr(recv)?;
                if !self.env.is_defined(&recv_ty) {
                    return Err(SemanticError::DispatchOnUndefined(recv_ty));
                }
                let mut arg_types = Vec::new();
                for arg in args.iter_mut() {
                    arg_types.push(self.visit_expr(arg)?);
                }

                if !self.env.is_subtype(&recv_ty, ty) {
                    return Err(SemanticError::StaticDispatchMismatch {
                        actual: recv_ty,
                        declared: ty.clone(),
                    });
                }
                let Some(info) = self.env.method_env.get(ty, method) else {
                    return Err(SemanticError::StaticDispatchToUndefined(method.clone()));
                };
                let info = info.clone();
                self.check_call(method, &info, &arg_types)?;
                if info.return_type == Names::SELF_TYPE {
                    recv_ty
                } else {
                    info.return_type
                }
            }
        };
        expr.result_type = ty.clone();
        Ok(ty)
    }

    fn visit_branch(&mut self, branch: &mut CaseBranch) -> Result<String, SemanticError> {
        self.env.object_env.enter_scope();
        if !self.env.is_defined(&branch.ty) {
            return Err(SemanticError::UndefinedBranchType {
                ty: branch.ty.clone(),
                id: branch.id.clone(),
            });
        }
        self.env.object_env.add(branch.id.clone(), branch.ty.clone());
        let body_ty = self.visit_expr(&mut branch.body)?;
        branch.result_type = body_ty.clone();
        self.env.object_env.exit_scope();
        Ok(body_ty)
    }

    /// Both operands of an arithmetic operator must be exactly `Int`.
    fn visit_arith(
        &mut self,
        lhs: &mut Expr,
        rhs: &mut Expr,
        op: &'static str,
    ) -> Result<String, SemanticError> {
        self.visit_compare(lhs, rhs, op)?;
        Ok(Names::INT.to_string())
    }

    fn visit_compare(
        &mut self,
        lhs: &mut Expr,
        rhs: &mut Expr,
        op: &'static str,
    ) -> Result<(), SemanticError> {
        let t1 = self.visit_expr(lhs)?;
        let t2 = self.visit_expr(rhs)?;
        if t1 != Names::INT || t2 != Names::INT {
            return Err(SemanticError::NonIntArguments {
                lhs: t1,
                op,
                rhs: t2,
            });
        }
        Ok(())
    }

    /// Arity and argument conformance of a (static or dynamic) call.
    fn check_call(
        &self,
        method: &str,
        info: &crate::method_env::MethodInfo,
        arg_types: &[String],
    ) -> Result<(), SemanticError> {
        if info.arity() != arg_types.len() {
            return Err(SemanticError::DispatchArity(method.to_string()));
        }
        for ((param, declared), actual) in info.formals.iter().zip(arg_types) {
            if !self.env.is_subtype(actual, declared) {
                return Err(SemanticError::DispatchArgMismatch {
                    method: method.to_string(),
                    param: param.clone(),
                    actual: actual.clone(),
                    declared: declared.clone(),
                });
            }
        }
        Ok(())
    }
}

fn first_duplicate(names: &[String]) -> Option<String> {
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Some(name.clone());
        }
    }
    None
}
