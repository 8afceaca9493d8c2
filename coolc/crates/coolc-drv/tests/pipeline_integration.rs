//! End-to-end pipeline tests: source text in, assembly or the exact
//! diagnostic line out.

use coolc_drv::compile_source;

#[test]
fn test_hello_world_compiles() {
    let source = r#"class Main inherits IO {
    main(): SELF_TYPE {
        out_string("Hello, World.\n")
    };
};
"#;
    let asm = compile_source(source, "hello.cl").unwrap();
    for needle in [
        "Main.main:",
        "Main_protObj:",
        "Main_init:",
        "\t.ascii\t\"Hello, World.\\n\"",
        "IO_dispTab:",
        "\t.word\tIO.out_string",
        "\tjal\t_dispatch_abort",
        "\t.globl\theap_start",
    ] {
        assert!(asm.contains(needle), "missing {needle:?}");
    }
    // out_string sits in slot 3; the dispatch loads offset 12
    assert!(asm.contains("\tlw\t$t1 12($t1)\n\tjalr\t$t1"));
}

#[test]
fn test_minimal_program_backend_artifacts() {
    let asm = compile_source("class Main { main(): Int { 0 }; };", "s1.cl").unwrap();
    assert!(asm.contains("Main_protObj:"));
    assert!(asm.contains("\tla\t$a0 int_const0"));
}

#[test]
fn test_unterminated_comment_is_syntax_error() {
    let err = compile_source("(* hi", "s2.cl").unwrap_err();
    assert_eq!(
        err.to_string(),
        "\"s2.cl\", line 1: syntax error at or near ERROR = EOF in comment"
    );
}

#[test]
fn test_inheritance_cycle_message() {
    let err = compile_source(
        "class A inherits B { }; class B inherits A { }; class Main { main(): Int { 0 }; };",
        "s3.cl",
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Class B, or an ancestor of B, is involved in an inheritance cycle."
    );
}

#[test]
fn test_missing_main_message() {
    let err = compile_source("class Foo { };", "s4.cl").unwrap_err();
    assert_eq!(err.to_string(), "Class Main is not defined.");
}

#[test]
fn test_override_arity_message() {
    let err = compile_source(
        "class A { f(x : Int) : Int { x }; };\
         class B inherits A { f(x : Int, y : Int) : Int { x }; };\
         class Main { main(): Int { 0 }; };",
        "s5.cl",
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Incompatible number of formal parameters in redefined method f."
    );
}

#[test]
fn test_self_type_new_emits_obj_tab_lookup() {
    let asm = compile_source(
        "class X { m(): SELF_TYPE { new SELF_TYPE }; };\
         class Main { main(): Int { 0 }; };",
        "s6.cl",
    )
    .unwrap();
    assert!(asm.contains("\tla\t$t1 class_objTab"));
    assert!(asm.contains("\tsll\t$t2 $t2 3"));
    assert!(asm.contains("\tlw\t$t1 4($t5)\n\tjalr\t$t1"));
}

#[test]
fn test_larger_program_compiles() {
    let source = r#"class Shape inherits IO {
    sides : Int;
    name : String <- "shape";

    init(n : Int, s : String) : SELF_TYPE {
        {
            sides <- n;
            name <- s;
            self;
        }
    };

    describe() : SELF_TYPE {
        {
            out_string(name);
            out_string(" has ");
            out_int(sides);
            out_string(" sides\n");
            self;
        }
    };
};

class Square inherits Shape {
    describe() : SELF_TYPE {
        {
            out_string("square: ");
            self@Shape.describe();
        }
    };
};

class Main {
    main() : Object {
        let shapes : Shape <- (new Square).init(4, "square"),
            count : Int <- 0
        in
            while count < 3 loop
                {
                    shapes.describe();
                    count <- count + 1;
                }
            pool
    };
};
"#;
    let asm = compile_source(source, "shapes.cl").unwrap();
    for needle in [
        "Shape_init:",
        "Square_init:",
        "Shape.describe:",
        "Square.describe:",
        "Shape.init:",
        "\tla\t$t1 Shape_dispTab",
        "Square_protObj:",
    ] {
        assert!(asm.contains(needle), "missing {needle:?}");
    }
    // Square inherits Shape's attribute slots
    let square = asm.split("Square_protObj:").nth(1).unwrap();
    let rows: Vec<&str> = square.lines().skip(1).take(4).collect();
    assert_eq!(
        rows,
        vec![
            "\t.word\t3", // tag follows Shape's, inside IO's subtree
            "\t.word\t5",
            "\t.word\tSquare_dispTab",
            "\t.word\tint_const0",
        ]
    );
}

#[test]
fn test_case_program_compiles() {
    let source = r#"class A { };
class B inherits A { };
class Main {
    classify(x : A) : Int {
        case x of
            b : B => 2;
            a : A => 1;
            o : Object => 0;
        esac
    };
    main() : Int { classify(new B) };
};
"#;
    let asm = compile_source(source, "case.cl").unwrap();
    assert!(asm.contains("\tjal\tcase_abort2"));
    assert!(asm.contains("\tjal\tcase_abort"));
}

#[test]
fn test_dump_formats() {
    let tokens = coolc_lex::tokenize("class Main { main(): Int { 0 }; };");
    let dump = coolc_lex::dump_tokens("main.cl", &tokens);
    assert!(dump.starts_with("#name \"main.cl\"\n#1 CLASS\n#1 TYPEID Main\n#1 '{'\n"));

    let program = coolc_par::parse(&tokens, "main.cl").unwrap();
    let ast = coolc_par::dump_program(&program);
    assert!(ast.starts_with("#1\n_program\n  #1\n  _class\n    Main\n    Object\n"));
    assert!(ast.contains("    : _no_type\n"));
}
