//! Method environment: per-class ordered method tables.
//!
//! Each class gets the full table of methods it responds to, inherited
//! ones included, built by cloning the parent's table and then applying
//! the class's own declarations. `IndexMap::insert` keeps the slot of an
//! existing key, so an override lands in the slot the ancestor introduced
//! which is exactly the property the backend's dispatch tables need.

use coolc_par::Method;
use coolc_util::Names;
use indexmap::IndexMap;

use crate::class_table::ClassTable;
use crate::error::SemanticError;

/// Signature and owner of one method as seen from some class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    /// The class whose definition provides the code (the last overrider).
    pub owner: String,
    /// Formal names and declared types, in order.
    pub formals: Vec<(String, String)>,
    pub return_type: String,
}

impl MethodInfo {
    pub fn arity(&self) -> usize {
        self.formals.len()
    }

    fn from_method(owner: &str, method: &Method) -> Self {
        Self {
            owner: owner.to_string(),
            formals: method
                .formals
                .iter()
                .map(|f| (f.name.clone(), f.ty.clone()))
                .collect(),
            return_type: method.return_type.clone(),
        }
    }
}

/// Maps every class to its complete, ordered method table.
#[derive(Debug)]
pub struct MethodEnvironment {
    tables: IndexMap<String, IndexMap<String, MethodInfo>>,
}

impl MethodEnvironment {
    /// Builds the tables in inheritance-DFS order, so a parent's table is
    /// always complete before any of its children clone it. Definition
    /// and redefinition checks run here.
    pub fn new(class_table: &ClassTable) -> Result<Self, SemanticError> {
        let mut tables: IndexMap<String, IndexMap<String, MethodInfo>> = IndexMap::new();

        for class_name in class_table.defined_classes() {
            let mut table = match class_table.get_parent(class_name) {
                Some(parent) => tables[parent].clone(),
                None => IndexMap::new(),
            };

            let class = class_table
                .get_class(class_name)
                .expect("defined class has a definition");
            for method in class.methods() {
                check_declaration(method, class_table)?;
                if let Some(inherited) = table.get(&method.name) {
                    check_override(method, inherited)?;
                }
                table.insert(
                    method.name.clone(),
                    MethodInfo::from_method(class_name, method),
                );
            }
            tables.insert(class_name.to_string(), table);
        }
        Ok(Self { tables })
    }

    /// Looks up a method as seen from `class`, inherited or own.
    pub fn get(&self, class: &str, method: &str) -> Option<&MethodInfo> {
        self.tables.get(class)?.get(method)
    }

    /// The methods `class` responds to, in dispatch-slot order.
    pub fn methods_for(&self, class: &str) -> impl Iterator<Item = (&str, &MethodInfo)> {
        self.tables
            .get(class)
            .into_iter()
            .flat_map(|table| table.iter().map(|(name, info)| (name.as_str(), info)))
    }

    /// Dispatch-slot index of a method within its class's table.
    pub fn method_offset(&self, class: &str, method: &str) -> Option<usize> {
        self.tables.get(class)?.get_index_of(method)
    }
}

/// Formal and return types of a declaration must name defined classes,
/// and no formal may be called `self`.
fn check_declaration(method: &Method, class_table: &ClassTable) -> Result<(), SemanticError> {
    for formal in &method.formals {
        if formal.name == Names::SELF {
            return Err(SemanticError::SelfFormal);
        }
        if !class_table.is_defined(&formal.ty) {
            return Err(SemanticError::UndefinedFormalType {
                ty: formal.ty.clone(),
                formal: formal.name.clone(),
            });
        }
    }
    if !class_table.is_defined(&method.return_type) {
        return Err(SemanticError::UndefinedReturnType {
            ty: method.return_type.clone(),
            method: method.name.clone(),
        });
    }
    Ok(())
}

/// An override must match the inherited signature exactly.
fn check_override(method: &Method, inherited: &MethodInfo) -> Result<(), SemanticError> {
    if method.formals.len() != inherited.arity() {
        return Err(SemanticError::RedefinedMethodArity(method.name.clone()));
    }
    for (formal, (_, original_ty)) in method.formals.iter().zip(&inherited.formals) {
        if formal.ty != *original_ty {
            return Err(SemanticError::RedefinedMethodParam {
                method: method.name.clone(),
                actual: formal.ty.clone(),
                original: original_ty.clone(),
            });
        }
    }
    if method.return_type != inherited.return_type {
        return Err(SemanticError::RedefinedMethodReturn {
            method: method.name.clone(),
            actual: method.return_type.clone(),
            original: inherited.return_type.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coolc_lex::tokenize;
    use coolc_par::parse;

    fn env_for(source: &str) -> Result<(ClassTable, MethodEnvironment), SemanticError> {
        let program = parse(&tokenize(source), "test.cl").unwrap();
        let table = ClassTable::new(&program.classes)?;
        let env = MethodEnvironment::new(&table)?;
        Ok((table, env))
    }

    #[test]
    fn test_builtin_methods_visible() {
        let (_, env) = env_for("class Main { };").unwrap();
        assert!(env.get("Object", "abort").is_some());
        assert!(env.get("IO", "out_string").is_some());
        assert!(env.get("String", "substr").is_some());
        // inherited from Object
        assert!(env.get("Main", "abort").is_some());
        assert!(env.get("Int", "copy").is_some());
    }

    #[test]
    fn test_inherited_method_resolves_without_reentry() {
        let (_, env) = env_for(
            "class A { f(x : Int) : Int { x }; }; class B inherits A { };",
        )
        .unwrap();
        let info = env.get("B", "f").unwrap();
        assert_eq!(info.owner, "A");
        assert_eq!(info.arity(), 1);
        assert_eq!(info.return_type, "Int");
    }

    #[test]
    fn test_dispatch_slot_order_parents_first() {
        let (_, env) = env_for(
            "class A inherits IO { f() : Int { 1 }; }; class B inherits A { g() : Int { 2 }; };",
        )
        .unwrap();
        let names: Vec<_> = env.methods_for("B").map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "abort",
                "type_name",
                "copy",
                "out_string",
                "out_int",
                "in_string",
                "in_int",
                "f",
                "g"
            ]
        );
    }

    #[test]
    fn test_override_keeps_slot() {
        let (_, env) = env_for(
            "class A { f() : Int { 1 }; g() : Int { 2 }; };\
             class B inherits A { g() : Int { 3 }; };",
        )
        .unwrap();
        assert_eq!(env.method_offset("A", "g"), env.method_offset("B", "g"));
        assert_eq!(env.get("B", "g").unwrap().owner, "B");
        assert_eq!(env.get("A", "g").unwrap().owner, "A");
    }

    #[test]
    fn test_self_formal_rejected() {
        let err = env_for("class A { f(self : Int) : Int { 1 }; };").unwrap_err();
        assert_eq!(err, SemanticError::SelfFormal);
    }

    #[test]
    fn test_undefined_formal_type() {
        let err = env_for("class A { f(x : Nope) : Int { 1 }; };").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Class Nope of formal parameter x is undefined."
        );
    }

    #[test]
    fn test_undefined_return_type() {
        let err = env_for("class A { f() : Nope { 1 }; };").unwrap_err();
        assert_eq!(err.to_string(), "Undefined return type Nope in method f.");
    }

    #[test]
    fn test_override_arity_mismatch() {
        let err = env_for(
            "class A { f(x : Int) : Int { x }; };\
             class B inherits A { f(x : Int, y : Int) : Int { x }; };",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Incompatible number of formal parameters in redefined method f."
        );
    }

    #[test]
    fn test_override_param_type_mismatch() {
        let err = env_for(
            "class A { f(x : Int) : Int { x }; };\
             class B inherits A { f(x : String) : Int { 1 }; };",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "In redefined method f, parameter type String is different from original type Int."
        );
    }

    #[test]
    fn test_override_return_type_mismatch() {
        let err = env_for(
            "class A { f() : Int { 1 }; };\
             class B inherits A { f() : Bool { true }; };",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "In redefined method f, return type Bool is different from original return type Int."
        );
    }

    #[test]
    fn test_exact_override_accepted() {
        let (_, env) = env_for(
            "class A { f(x : Int) : SELF_TYPE { self }; };\
             class B inherits A { f(x : Int) : SELF_TYPE { self }; };",
        )
        .unwrap();
        assert_eq!(env.get("B", "f").unwrap().owner, "B");
    }
}
