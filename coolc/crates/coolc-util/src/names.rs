//! Well-known names shared across the compiler.
//!
//! The basic-class names and the runtime symbols appear in the lexer's
//! keyword handling, the semantic analyzer's environments and the backend's
//! label forming. Keeping them in one place means the spelling can never
//! drift between phases.

/// Namespace for the fixed names of the COOL world.
///
/// # Example
///
/// ```
/// use coolc_util::Names;
///
/// assert_eq!(Names::form_init("Main"), "Main_init");
/// assert_eq!(Names::form_disp_table("IO"), "IO_dispTab");
/// ```
pub struct Names;

impl Names {
    /// Root of the inheritance tree.
    pub const OBJECT: &'static str = "Object";
    /// Built-in I/O class.
    pub const IO: &'static str = "IO";
    /// Built-in integer class.
    pub const INT: &'static str = "Int";
    /// Built-in string class.
    pub const STRING: &'static str = "String";
    /// Built-in boolean class.
    pub const BOOL: &'static str = "Bool";

    /// The type that stands for "the runtime class of self".
    pub const SELF_TYPE: &'static str = "SELF_TYPE";
    /// Sentinel carried by AST nodes the analyzer has not typed yet.
    pub const NO_TYPE: &'static str = "_no_type";
    /// The identifier bound to the receiver in every method body.
    pub const SELF: &'static str = "self";

    /// Entry class and method the runtime calls after heap setup.
    pub const MAIN: &'static str = "Main";
    pub const MAIN_METHOD: &'static str = "main";

    /// Data-section table of class name string constants, indexed by tag.
    pub const NAME_TAB: &'static str = "class_nameTab";
    /// Data-section table of `(protObj, init)` pairs, indexed by tag.
    pub const OBJ_TAB: &'static str = "class_objTab";
    /// First free heap word, expected by the runtime allocator.
    pub const HEAP_START: &'static str = "heap_start";

    /// Runtime entry points the generated code calls into.
    pub const DISPATCH_ABORT: &'static str = "_dispatch_abort";
    pub const CASE_NO_MATCH: &'static str = "case_abort";
    pub const CASE_ON_VOID: &'static str = "case_abort2";
    pub const EQUALITY_TEST: &'static str = "equality_test";
    pub const OBJECT_COPY: &'static str = "Object.copy";
    pub const GC_ASSIGN: &'static str = "_GenGC_Assign";

    /// Forms the prototype-object label for a class.
    pub fn form_prot_obj(class: &str) -> String {
        format!("{class}_protObj")
    }

    /// Forms the dispatch-table label for a class.
    pub fn form_disp_table(class: &str) -> String {
        format!("{class}_dispTab")
    }

    /// Forms the attribute-initializer routine label for a class.
    pub fn form_init(class: &str) -> String {
        format!("{class}_init")
    }

    /// Forms the code label for a method, `Class.method`.
    pub fn form_method(class: &str, method: &str) -> String {
        format!("{class}.{method}")
    }

    /// True for the three classes whose instances are unboxed-by-copy
    /// primitives (`Int`, `String`, `Bool`).
    pub fn is_primitive(name: &str) -> bool {
        name == Self::INT || name == Self::STRING || name == Self::BOOL
    }

    /// True for any of the five classes installed by the class table itself.
    pub fn is_basic(name: &str) -> bool {
        name == Self::OBJECT || name == Self::IO || Self::is_primitive(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_forming() {
        assert_eq!(Names::form_prot_obj("Object"), "Object_protObj");
        assert_eq!(Names::form_disp_table("String"), "String_dispTab");
        assert_eq!(Names::form_init("A"), "A_init");
        assert_eq!(Names::form_method("Main", "main"), "Main.main");
    }

    #[test]
    fn test_primitive_classification() {
        assert!(Names::is_primitive("Int"));
        assert!(Names::is_primitive("String"));
        assert!(Names::is_primitive("Bool"));
        assert!(!Names::is_primitive("Object"));
        assert!(!Names::is_primitive("IO"));
        assert!(!Names::is_primitive("Main"));
    }

    #[test]
    fn test_basic_classification() {
        for name in ["Object", "IO", "Int", "String", "Bool"] {
            assert!(Names::is_basic(name));
        }
        assert!(!Names::is_basic("Main"));
        assert!(!Names::is_basic("SELF_TYPE"));
    }
}
