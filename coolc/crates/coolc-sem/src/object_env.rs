//! Object environment: the lexically scoped identifier-to-type stack.
//!
//! Scopes are pushed around class bodies, methods, `let` bindings and
//! case branches; lookup walks from the innermost scope outwards.

use rustc_hash::FxHashMap;

/// A stack of scopes mapping identifiers to their declared types.
#[derive(Debug, Default)]
pub struct ObjectEnvironment {
    stack: Vec<FxHashMap<String, String>>,
}

impl ObjectEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_scope(&mut self) {
        self.stack.push(FxHashMap::default());
    }

    pub fn exit_scope(&mut self) {
        self.stack.pop();
    }

    /// Binds `id` in the innermost scope, shadowing outer bindings.
    pub fn add(&mut self, id: impl Into<String>, ty: impl Into<String>) {
        if let Some(scope) = self.stack.last_mut() {
            scope.insert(id.into(), ty.into());
        }
    }

    /// Is `id` bound in any scope?
    pub fn is_defined(&self, id: &str) -> bool {
        self.stack.iter().any(|scope| scope.contains_key(id))
    }

    /// Is `id` bound in the innermost scope?
    pub fn is_defined_local(&self, id: &str) -> bool {
        self.stack
            .last()
            .is_some_and(|scope| scope.contains_key(id))
    }

    /// The innermost binding's declared type.
    pub fn get_type(&self, id: &str) -> Option<&str> {
        self.stack
            .iter()
            .rev()
            .find_map(|scope| scope.get(id).map(String::as_str))
    }
}
