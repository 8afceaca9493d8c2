//! coolc-gen - MIPS code generation for COOL.
//!
//! The last phase of the pipeline: a type-decorated AST plus the type
//! environment in, SPIM-compatible assembly text out. The module is laid
//! out as the runtime expects it:
//!
//! - data segment: runtime tag words, collector configuration, prototype
//!   objects, the constant pools, `class_nameTab` / `class_objTab`, and
//!   per-class dispatch tables;
//! - text segment: one `{Class}_init` routine per class and one code
//!   label `{Class}.{method}` per user-defined method.
//!
//! A well-typed program cannot fail here; [`CodegenError`] only reports
//! internal invariant violations.

pub mod consts;
pub mod context;
pub mod mips;
pub mod module;
pub mod tables;

use thiserror::Error;

pub use consts::ConstPool;
pub use context::{Context, Location};
pub use mips::{Addr, Mips, Reg};
pub use module::generate;
pub use tables::{DispatchTable, Prototype};

/// Internal invariant violation during code generation. Seeing one of
/// these on a program that passed semantic analysis is a compiler bug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodegenError {
    #[error("unknown method offset for {class}.{method}")]
    UnknownMethodOffset { class: String, method: String },

    #[error("unknown class {0} during code generation")]
    UnknownClass(String),

    #[error("unresolved identifier {0} during code generation")]
    UnresolvedIdentifier(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use coolc_lex::tokenize;
    use coolc_par::parse;
    use coolc_sem::analyze;

    fn compile(source: &str) -> String {
        let mut program = parse(&tokenize(source), "test.cl").unwrap();
        let env = analyze(&mut program).unwrap();
        generate(&program, &env).unwrap()
    }

    const MINIMAL: &str = "class Main { main(): Int { 0 }; };";

    #[test]
    fn test_minimal_program_layout() {
        let asm = compile(MINIMAL);
        for needle in [
            "\t.data\t",
            "\t.globl\theap_start",
            "heap_start:",
            "\t.text\t",
            "\t.globl\tMain_init",
            "\t.globl\tMain.main",
            "Main_protObj:",
            "Main_dispTab:",
            "class_nameTab:",
            "class_objTab:",
            "Main_init:",
            "Main.main:",
            "_MemMgr_INITIALIZER:",
            "\t.word\t_GenGC_Init",
        ] {
            assert!(asm.contains(needle), "missing {needle:?} in:\n{asm}");
        }
        // Main.main loads the integer constant zero
        assert!(asm.contains("\tla\t$a0 int_const0"));
    }

    #[test]
    fn test_tags_in_dfs_order() {
        let asm = compile(MINIMAL);
        // Object=0, IO=1, Int=2, Bool=3, String=4, Main=5
        assert!(asm.contains("_int_tag:\n\t.word\t2"));
        assert!(asm.contains("_bool_tag:\n\t.word\t3"));
        assert!(asm.contains("_string_tag:\n\t.word\t4"));
        assert!(asm.contains("Main_protObj:\n\t.word\t5"));
    }

    #[test]
    fn test_tag_range_is_contiguous() {
        use crate::module::Tags;
        let source = "\
            class A { }; class B inherits A { }; class C inherits B { };\
            class D inherits A { }; class E { };\
            class Main { main(): Int { 0 }; };";
        let mut program = parse(&tokenize(source), "test.cl").unwrap();
        let env = analyze(&mut program).unwrap();
        let tags = Tags::new(&env);
        // A's subtree is A, B, C, D
        assert_eq!(tags.last_descendant("A"), tags.tag("A") + 3);
        assert_eq!(tags.tag("B"), tags.tag("A") + 1);
        assert_eq!(tags.last_descendant("B"), tags.tag("C"));
        assert_eq!(tags.last_descendant("C"), tags.tag("C"));
        assert_eq!(tags.tag("D"), tags.tag("C") + 1);
        // leaves close their own range
        assert_eq!(tags.last_descendant("E"), tags.tag("E"));
        // Object's range covers every class
        assert_eq!(tags.tag("Object"), 0);
        assert_eq!(tags.last_descendant("Object"), tags.tag("Main"));
    }

    #[test]
    fn test_dispatch_table_override_keeps_slot() {
        let source = "\
            class A { f() : Int { 1 }; g() : Int { 2 }; };\
            class B inherits A { g() : Int { 3 }; };\
            class Main { main(): Int { 0 }; };";
        let asm = compile(source);
        assert!(asm.contains(
            "A_dispTab:\n\t.word\tObject.abort\n\t.word\tObject.type_name\n\t.word\tObject.copy\n\t.word\tA.f\n\t.word\tA.g\n"
        ));
        assert!(asm.contains(
            "B_dispTab:\n\t.word\tObject.abort\n\t.word\tObject.type_name\n\t.word\tObject.copy\n\t.word\tA.f\n\t.word\tB.g\n"
        ));
    }

    #[test]
    fn test_subclass_layout_extends_parent() {
        let source = "\
            class A { a1 : Int; a2 : String; };\
            class B inherits A { b1 : Bool; };\
            class Main { main(): Int { 0 }; };";
        let asm = compile(source);
        // A: 2 attrs -> size 5; its slots are the prefix of B's
        assert!(asm.contains(
            "\t.word\t5\n\t.word\tA_dispTab\n\t.word\tint_const0\n\t.word\tstr_const0\n"
        ));
        assert!(asm.contains(
            "\t.word\t6\n\t.word\tB_dispTab\n\t.word\tint_const0\n\t.word\tstr_const0\n\t.word\tbool_const0\n"
        ));
    }

    #[test]
    fn test_method_prolog_epilog() {
        let source = "class Main { f(x : Int, y : Int) : Int { x }; main(): Int { 0 }; };";
        let asm = compile(source);
        let f = asm.split("Main.f:").nth(1).unwrap();
        assert!(f.starts_with("\n\taddiu\t$sp $sp -12"));
        // two arguments popped by the epilog: 12 + 8
        assert!(f.contains("\taddiu\t$sp $sp 20\n\tjr\t$ra"));
        // x is the first of two formals: highest offset
        assert!(f.contains("\tlw\t$a0 16($fp)"));
    }

    #[test]
    fn test_init_chains_to_parent() {
        let source = "\
            class A { x : Int <- 7; };\
            class B inherits A { y : Int <- 8; };\
            class Main { main(): Int { 0 }; };";
        let asm = compile(source);
        let b_init = asm.split("B_init:").nth(1).unwrap();
        assert!(b_init.contains("\tjal\tA_init"));
        // B's own attribute lands after A's: offset 16
        assert!(b_init.contains("\tla\t$a0 int_const8\n\tsw\t$a0 16($s0)\n\taddiu\t$a1 $s0 16\n\tjal\t_GenGC_Assign"));
        let a_init = asm.split("A_init:").nth(1).unwrap();
        assert!(a_init.contains("\tjal\tObject_init"));
        assert!(a_init.contains("\tsw\t$a0 12($s0)"));
    }

    #[test]
    fn test_object_init_is_terminal() {
        let asm = compile(MINIMAL);
        let object_init = asm.split("Object_init:").nth(1).unwrap();
        let body: String = object_init
            .lines()
            .take_while(|line| !line.ends_with(':'))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(!body.contains("jal"));
        assert!(body.contains("\tmove\t$a0 $s0"));
    }

    #[test]
    fn test_dynamic_dispatch_sequence() {
        let source = "class Main inherits IO { main(): Object { out_string(\"hi\") }; };";
        let asm = compile(source);
        let main = asm.split("Main.main:").nth(1).unwrap();
        // argument pushed, receiver checked, table loaded, slot called
        assert!(main.contains("\tsw\t$a0 0($sp)\n\taddiu\t$sp $sp -4"));
        assert!(main.contains("\tjal\t_dispatch_abort"));
        assert!(main.contains("\tlw\t$t1 8($a0)"));
        // out_string is slot 3 of IO's table: offset 12
        assert!(main.contains("\tlw\t$t1 12($t1)\n\tjalr\t$t1"));
    }

    #[test]
    fn test_static_dispatch_uses_named_table() {
        let source = "\
            class A { f() : Int { 1 }; };\
            class B inherits A { f() : Int { 2 }; };\
            class Main { main(): Int { (new B)@A.f() }; };";
        let asm = compile(source);
        assert!(asm.contains("\tla\t$t1 A_dispTab"));
    }

    #[test]
    fn test_new_named_class() {
        let source = "class A { }; class Main { main(): Object { new A }; };";
        let asm = compile(source);
        assert!(asm.contains("\tla\t$a0 A_protObj\n\tjal\tObject.copy\n\tjal\tA_init"));
    }

    #[test]
    fn test_new_self_type_uses_obj_tab() {
        let source = "\
            class X { m(): SELF_TYPE { new SELF_TYPE }; };\
            class Main { main(): Int { 0 }; };";
        let asm = compile(source);
        let expected = "\tla\t$t1 class_objTab\n\
                        \tlw\t$t2 0($s0)\n\
                        \tsll\t$t2 $t2 3\n\
                        \taddu\t$t1 $t1 $t2\n\
                        \tmove\t$t5 $t1\n\
                        \tlw\t$a0 0($t1)\n\
                        \tjal\tObject.copy\n\
                        \tlw\t$t1 4($t5)\n\
                        \tjalr\t$t1";
        assert!(asm.contains(expected), "missing objTab sequence in:\n{asm}");
    }

    #[test]
    fn test_if_sequence() {
        let source = "class Main { main(): Int { if true then 1 else 2 fi }; };";
        let asm = compile(source);
        let main = asm.split("Main.main:").nth(1).unwrap();
        assert!(main.contains("\tlw\t$t1 12($a0)\n\tbeqz\t$t1 label_0"));
        assert!(main.contains("\tb\tlabel_1"));
    }

    #[test]
    fn test_while_result_is_void() {
        let source = "class Main { main(): Object { while false loop 0 pool }; };";
        let asm = compile(source);
        let main = asm.split("Main.main:").nth(1).unwrap();
        assert!(main.contains("\tbeq\t$t1 $zero label_1"));
        assert!(main.contains("label_1:\n\tmove\t$a0 $zero"));
    }

    #[test]
    fn test_arith_copies_before_mutating() {
        let source = "class Main { main(): Int { 1 + 2 }; };";
        let asm = compile(source);
        let main = asm.split("Main.main:").nth(1).unwrap();
        let expected = "\tjal\tObject.copy\n\
                        \taddiu\t$sp $sp 4\n\
                        \tlw\t$t1 0($sp)\n\
                        \tlw\t$t1 12($t1)\n\
                        \tlw\t$t2 12($a0)\n\
                        \tadd\t$t1 $t1 $t2\n\
                        \tsw\t$t1 12($a0)";
        assert!(main.contains(expected), "missing arith sequence in:\n{main}");
    }

    #[test]
    fn test_eq_fast_path_and_fallback() {
        let source = "class Main { main(): Bool { 1 = 2 }; };";
        let asm = compile(source);
        let main = asm.split("Main.main:").nth(1).unwrap();
        assert!(main.contains("\tla\t$a0 bool_const1\n\tbeq\t$t1 $t2 label_0"));
        assert!(main.contains("\tla\t$a1 bool_const0\n\tjal\tequality_test"));
    }

    #[test]
    fn test_let_binds_stack_slot() {
        let source = "class Main { main(): Int { let x : Int <- 5 in x }; };";
        let asm = compile(source);
        let main = asm.split("Main.main:").nth(1).unwrap();
        assert!(main.contains("\tla\t$a0 int_const5"));
        // bound value pushed, then read back from the slot
        assert!(main.contains("\tsw\t$a0 0($sp)\n\taddiu\t$sp $sp -4\n\tlw\t$a0 -4($fp)"));
    }

    #[test]
    fn test_let_without_init_object_type_is_void() {
        let source = "class Main { main(): Bool { let x : Object in isvoid x }; };";
        let asm = compile(source);
        let main = asm.split("Main.main:").nth(1).unwrap();
        assert!(main.contains("\tmove\t$a0 $zero\n\tsw\t$a0 0($sp)"));
    }

    #[test]
    fn test_case_tests_most_specific_first() {
        let source = "\
            class A { }; class B inherits A { };\
            class Main { main(): Object {\
                case new B of a : A => a; b : B => b; esac }; };";
        let asm = compile(source);
        let main = asm.split("Main.main:").nth(1).unwrap();
        assert!(main.contains("\tjal\tcase_abort2"));
        assert!(main.contains("\tlw\t$t1 0($a0)"));
        // tags: A=5 with last descendant 6, B=6 exactly; B's range test
        // must come before A's
        let b_test = main.find("\tblt\t$t1 6").unwrap();
        let a_test = main.find("\tblt\t$t1 5").unwrap();
        assert!(b_test < a_test);
        assert!(main.contains("\tbgt\t$t1 6"));
        assert!(main.contains("\tjal\tcase_abort"));
    }

    #[test]
    fn test_attribute_assignment_notifies_gc() {
        let source = "class Main { x : Int; main(): Int { x <- 3 }; };";
        let asm = compile(source);
        let main = asm.split("Main.main:").nth(1).unwrap();
        assert!(main.contains("\tsw\t$a0 12($s0)\n\taddiu\t$a1 $s0 12\n\tjal\t_GenGC_Assign"));
    }

    #[test]
    fn test_string_literal_pooled_once() {
        let source = "class Main inherits IO { main(): Object {\
                      { out_string(\"dup\"); out_string(\"dup\"); } }; };";
        let asm = compile(source);
        assert!(asm.contains("\t.ascii\t\"dup\""));
        assert_eq!(asm.matches("\t.ascii\t\"dup\"").count(), 1);
    }

    #[test]
    fn test_name_tab_lists_all_classes() {
        let asm = compile(MINIMAL);
        let name_tab = asm.split("class_nameTab:").nth(1).unwrap();
        let words: Vec<&str> = name_tab
            .lines()
            .skip(1)
            .take_while(|line| line.starts_with("\t.word"))
            .collect();
        assert_eq!(words.len(), 6);
        // the filename constant "test.cl" exists alongside class names
        assert!(asm.contains("\t.ascii\t\"test.cl\""));
        assert!(asm.contains("\t.ascii\t\"Main\""));
    }

    #[test]
    fn test_obj_tab_pairs() {
        let asm = compile(MINIMAL);
        let obj_tab = asm.split("class_objTab:").nth(1).unwrap();
        assert!(obj_tab.starts_with(
            "\n\t.word\tObject_protObj\n\t.word\tObject_init\n\t.word\tIO_protObj\n\t.word\tIO_init"
        ));
        assert!(obj_tab.contains("\t.word\tMain_protObj\n\t.word\tMain_init"));
    }
}
