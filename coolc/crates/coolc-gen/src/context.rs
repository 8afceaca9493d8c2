//! Identifier-to-location resolution inside one method or init routine.
//!
//! Attributes live at `12 + 4i($s0)`; formals at positive `$fp` offsets
//! (the first formal highest, matching left-to-right caller pushes);
//! `let` and `case` temporaries at negative `$fp` offsets in push order.
//! Resolution order is local, formal, attribute, then `self`.

use rustc_hash::FxHashMap;

/// Where an identifier's value lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// `offset($fp)`, negative: a stack temporary.
    Local(i32),
    /// `offset($fp)`, positive: a caller-pushed argument.
    Formal(i32),
    /// `offset($s0)`: an attribute slot.
    Attr(i32),
    /// The receiver itself, in `$s0`.
    SelfRef,
}

/// First attribute slot, right after the tag, size and dispatch words.
const ATTR_BASE: i32 = 12;

#[derive(Default)]
pub struct Context {
    attr_offsets: FxHashMap<String, i32>,
    formal_offsets: FxHashMap<String, i32>,
    scopes: Vec<FxHashMap<String, i32>>,
    /// Number of stack temporaries currently live.
    depth: i32,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the attribute layout of the current class (all slots,
    /// inherited first).
    pub fn set_attrs<'a>(&mut self, names: impl Iterator<Item = &'a str>) {
        self.attr_offsets.clear();
        for (i, name) in names.enumerate() {
            self.attr_offsets
                .insert(name.to_string(), ATTR_BASE + 4 * i as i32);
        }
    }

    /// Starts a method body: binds the formals and resets temporaries.
    pub fn enter_method<'a>(&mut self, formals: impl ExactSizeIterator<Item = &'a str>) {
        self.formal_offsets.clear();
        self.scopes.clear();
        self.depth = 0;
        let count = formals.len() as i32;
        for (i, name) in formals.enumerate() {
            // pushed left to right, so the first formal is the deepest
            self.formal_offsets
                .insert(name.to_string(), 12 + 4 * (count - 1 - i as i32));
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    /// Accounts for one freshly pushed stack word and returns its
    /// `$fp`-relative offset.
    pub fn push_slot(&mut self) -> i32 {
        let offset = -4 - 4 * self.depth;
        self.depth += 1;
        offset
    }

    pub fn pop_slot(&mut self) {
        self.depth -= 1;
    }

    /// Binds an identifier to a stack slot in the innermost scope.
    pub fn bind(&mut self, id: &str, offset: i32) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(id.to_string(), offset);
        }
    }

    /// Resolves an identifier use; `None` only for names the analyzer
    /// would have rejected.
    pub fn resolve(&self, id: &str) -> Option<Location> {
        for scope in self.scopes.iter().rev() {
            if let Some(offset) = scope.get(id) {
                return Some(Location::Local(*offset));
            }
        }
        if let Some(offset) = self.formal_offsets.get(id) {
            return Some(Location::Formal(*offset));
        }
        if let Some(offset) = self.attr_offsets.get(id) {
            return Some(Location::Attr(*offset));
        }
        if id == coolc_util::Names::SELF {
            return Some(Location::SelfRef);
        }
        None
    }
}
