//! The combined type environment handed from the analyzer to the backend.
//!
//! Bundles the class table, the method environment and the scope stack,
//! and owns the `SELF_TYPE`-aware subtype and least-upper-bound rules.

use coolc_par::Class;
use coolc_util::Names;

use crate::class_table::ClassTable;
use crate::error::SemanticError;
use crate::method_env::MethodEnvironment;
use crate::object_env::ObjectEnvironment;

#[derive(Debug)]
pub struct TypeEnvironment {
    pub class_table: ClassTable,
    pub method_env: MethodEnvironment,
    pub object_env: ObjectEnvironment,
    /// The class currently being analyzed; what `SELF_TYPE` resolves to.
    pub self_type: String,
}

impl TypeEnvironment {
    /// Builds the class table and method environment, running all their
    /// construction-time checks.
    pub fn new(classes: &[Class]) -> Result<Self, SemanticError> {
        let class_table = ClassTable::new(classes)?;
        let method_env = MethodEnvironment::new(&class_table)?;
        Ok(Self {
            class_table,
            method_env,
            object_env: ObjectEnvironment::new(),
            self_type: String::new(),
        })
    }

    pub fn enter_class(&mut self, class: &Class) {
        self.self_type = class.name.clone();
        self.object_env.enter_scope();
        self.object_env.add(Names::SELF, Names::SELF_TYPE);
    }

    pub fn exit_class(&mut self) {
        self.object_env.exit_scope();
        self.self_type.clear();
    }

    /// `SELF_TYPE`-aware subtype check. `_no_type` conforms to anything;
    /// `SELF_TYPE` on either side resolves to the current class, except
    /// that `SELF_TYPE <= SELF_TYPE` holds outright.
    pub fn is_subtype(&self, a: &str, b: &str) -> bool {
        if a == Names::NO_TYPE || (a == Names::SELF_TYPE && b == Names::SELF_TYPE) {
            return true;
        }
        self.class_table.is_subtype(self.resolve(a), self.resolve(b))
    }

    /// Defined-ness including `SELF_TYPE`.
    pub fn is_defined(&self, ty: &str) -> bool {
        self.class_table.is_defined(ty)
    }

    /// Least upper bound of a set of types. The result is `SELF_TYPE`
    /// exactly when every input is; otherwise `SELF_TYPE` inputs resolve
    /// to the current class before combining.
    pub fn combine(&self, types: &[String]) -> String {
        if types.is_empty() {
            return Names::OBJECT.to_string();
        }
        if types.iter().all(|ty| ty == Names::SELF_TYPE) {
            return Names::SELF_TYPE.to_string();
        }
        let mut common = self.resolve(&types[0]).to_string();
        for ty in &types[1..] {
            common = self.class_table.lub(&common, self.resolve(ty));
        }
        common
    }

    /// Substitutes the current class for `SELF_TYPE`.
    pub fn resolve<'a>(&'a self, ty: &'a str) -> &'a str {
        if ty == Names::SELF_TYPE {
            &self.self_type
        } else {
            ty
        }
    }
}
