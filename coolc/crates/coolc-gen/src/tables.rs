//! Prototype objects and dispatch tables.
//!
//! A prototype is the canonical memory image `Object.copy` clones to make
//! an instance: `[-1, tag, 3 + |attrs|, dispTab, slot defaults...]`.
//! Primitive-typed slots default to the shared zero constants so a fresh
//! object never holds a bare `0` where a `String`/`Int`/`Bool` object is
//! expected; everything else starts void.

use coolc_util::Names;

use crate::mips::Mips;

/// Per-class object image.
pub struct Prototype {
    name: String,
    tag: usize,
    /// Declared types of all attribute slots, inherited first.
    attr_types: Vec<String>,
}

impl Prototype {
    pub fn new(name: impl Into<String>, tag: usize, attr_types: Vec<String>) -> Self {
        Self {
            name: name.into(),
            tag,
            attr_types,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> usize {
        self.tag
    }

    pub fn serialize(&self, mips: &mut Mips) {
        mips.global(&Names::form_prot_obj(&self.name))
            .word(-1)
            .label(&Names::form_prot_obj(&self.name))
            .word(self.tag)
            .word(self.attr_types.len() + 3)
            .word(Names::form_disp_table(&self.name));

        for ty in &self.attr_types {
            let default: &str = if ty == Names::STRING && self.name != Names::STRING {
                "str_const0"
            } else if ty == Names::INT && self.name != Names::INT {
                "int_const0"
            } else if ty == Names::BOOL && self.name != Names::BOOL {
                "bool_const0"
            } else {
                "0"
            };
            mips.word(default);
        }
    }
}

/// Per-class method table: `[Owner.method, ...]` in slot order.
pub struct DispatchTable {
    name: String,
    /// `(owning class, method name)` per slot.
    methods: Vec<(String, String)>,
}

impl DispatchTable {
    pub fn new(name: impl Into<String>, methods: Vec<(String, String)>) -> Self {
        Self {
            name: name.into(),
            methods,
        }
    }

    pub fn is_for(&self, class: &str) -> bool {
        self.name == class
    }

    pub fn serialize(&self, mips: &mut Mips) {
        mips.label(&Names::form_disp_table(&self.name));
        for (owner, method) in &self.methods {
            mips.word(Names::form_method(owner, method));
        }
    }
}
