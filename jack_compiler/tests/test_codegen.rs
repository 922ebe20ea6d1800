use jack_compiler::{
    compile::{CodeGen, CodeGenErrorKind, OperandError, SymbolKind, VmInstr},
    compile_reader, compile_str, parse_str, JackError,
};

const POINT: &str = include_str!("point.jack");
const POINT_VM: &str = include_str!("point.vm");
const MAIN: &str = include_str!("main.jack");
const MAIN_VM: &str = include_str!("main.vm");

fn compile_lines(source: &str) -> Vec<String> {
    match compile_str(source) {
        Ok(code) => code.iter().map(VmInstr::to_string).collect(),
        Err(err) => panic!("{}", err),
    }
}

fn codegen_error(source: &str) -> CodeGenErrorKind {
    match compile_str(source) {
        Err(JackError::CodeGen(err)) => err.kind,
        other => panic!("expected code generation error, found {other:?}"),
    }
}

#[test]
fn test_compile_point() {
    let code = compile_str(POINT).unwrap();
    assert_eq!(code.to_string(), POINT_VM);
}

#[test]
fn test_compile_main() {
    let code = compile_str(MAIN).unwrap();
    assert_eq!(code.to_string(), MAIN_VM);
}

#[test]
fn test_compile_reader() {
    let code = compile_reader(MAIN.as_bytes()).unwrap();
    assert_eq!(code.to_string(), MAIN_VM);
}

#[test]
fn test_constructor_prologue() {
    const SOURCE: &str =
        "class Point { field int x,y; constructor Point new(int ax,int ay){ let x=ax; let y=ay; return this; } }";

    let class = parse_str(SOURCE).unwrap();
    let mut codegen = CodeGen::new();
    let code = codegen.compile(&class).unwrap();

    let x = codegen.class_symbols().get("x").unwrap();
    assert_eq!((x.kind, x.position), (SymbolKind::Field, 0));
    let y = codegen.class_symbols().get("y").unwrap();
    assert_eq!((y.kind, y.position), (SymbolKind::Field, 1));

    let lines: Vec<String> = code.iter().map(VmInstr::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "function Point.new 0",
            "push constant 2",
            "call Memory.alloc 1",
            "pop pointer 0",
            "push argument 0",
            "pop this 0",
            "push argument 1",
            "pop this 1",
            "push pointer 0",
            "return",
        ]
    );
}

#[test]
fn test_constructor_without_fields_allocates_one_word() {
    let lines = compile_lines("class Unit { constructor Unit new() { return this; } }");
    assert_eq!(lines[1], "push constant 1");
    assert_eq!(lines[2], "call Memory.alloc 1");
}

#[test]
fn test_method_call_on_field() {
    const SOURCE: &str = "class Game {
        field Square square;
        method void dispose() {
            do square.dispose();
            return;
        }
    }";

    let lines = compile_lines(SOURCE);
    assert_eq!(
        &lines[3..7],
        &["push this 0", "call Square.dispose 1", "pop temp 0", "push constant 0"]
    );
}

#[test]
fn test_if_without_else() {
    const SOURCE: &str = "class Main {
        function void f(int x) {
            if (x > 1) { let x = x - 2; }
            return;
        }
    }";

    let lines = compile_lines(SOURCE);
    assert_eq!(
        &lines[1..],
        &[
            "push argument 0",
            "push constant 1",
            "gt",
            "not",
            "if-goto Main_1",
            "push argument 0",
            "push constant 2",
            "sub",
            "pop argument 0",
            "label Main_1",
            "push constant 0",
            "return",
        ]
    );
}

#[test]
fn test_unqualified_call_to_non_method() {
    const SOURCE: &str = "class Main {
        method void run() {
            do helper(1, 2);
            do step();
            return;
        }
        method void step() { return; }
    }";

    let lines = compile_lines(SOURCE);

    // Not a method of this class: no implicit object argument.
    assert_eq!(&lines[3..7], &["push constant 1", "push constant 2", "call Main.helper 2", "pop temp 0"]);
    // A method: the current object goes first.
    assert_eq!(&lines[7..10], &["push pointer 0", "call Main.step 1", "pop temp 0"]);
}

#[test]
fn test_keyword_constants() {
    const SOURCE: &str = "class Main {
        function boolean f() {
            var boolean a, b;
            let a = true;
            let b = false;
            let a = null;
            return ~a;
        }
    }";

    let lines = compile_lines(SOURCE);
    assert_eq!(
        &lines[1..],
        &[
            "push constant 1",
            "neg",
            "pop local 0",
            "push constant 0",
            "pop local 1",
            "push constant 0",
            "pop local 0",
            "push local 0",
            "not",
            "return",
        ]
    );
}

#[test]
fn test_subroutine_scope_shadows_class_scope() {
    const SOURCE: &str = "class Main {
        static int x;
        function int f(int x) { return x; }
        function int g() { return x; }
    }";

    let lines = compile_lines(SOURCE);
    assert_eq!(lines[1], "push argument 0");
    assert_eq!(lines[4], "push static 0");
}

#[test]
fn test_labels_unique_per_class() {
    const SOURCE: &str = "class Main {
        function void f() { while (true) { } return; }
        function void g() { if (false) { } else { } return; }
    }";

    let labels: Vec<String> = compile_str(SOURCE)
        .unwrap()
        .iter()
        .filter_map(|instr| match instr {
            VmInstr::Label(label) => Some(label.to_string()),
            _ => None,
        })
        .collect();

    assert_eq!(labels, vec!["Main_1", "Main_2", "Main_3", "Main_4"]);
}

#[test]
fn test_undeclared_variable() {
    const SOURCE: &str = "class Main {\n  function void f() {\n    let y = 1;\n    return;\n  }\n}";

    let err = compile_str(SOURCE).unwrap_err();
    match &err {
        JackError::CodeGen(err) => assert_eq!(err.kind, CodeGenErrorKind::NotFound("y".into())),
        other => panic!("unexpected {other:?}"),
    }

    let line = err.source_line().unwrap();
    assert_eq!(line.number, 3);
    assert_eq!(line.text, "    let y = 1;");
}

#[test]
fn test_undeclared_receiver_variable() {
    let kind = codegen_error("class Main { function void f() { do thing.go(); return; } }");
    assert_eq!(kind, CodeGenErrorKind::NotFound("thing".into()));
}

#[test]
fn test_duplicate_declarations() {
    assert_eq!(
        codegen_error("class Main { field int a; static int a; }"),
        CodeGenErrorKind::DuplicateName("a".into())
    );
    assert_eq!(
        codegen_error("class Main { function void f(int a) { var int a; return; } }"),
        CodeGenErrorKind::DuplicateName("a".into())
    );
}

#[test]
fn test_too_many_locals() {
    let names: Vec<String> = (0..=u16::MAX as u32).map(|i| format!("v{i}")).collect();
    let source = format!(
        "class Main {{ function void f() {{ var int {}; return; }} }}",
        names.join(", ")
    );

    match compile_str(&source) {
        Err(JackError::CodeGen(err)) => {
            assert_eq!(err.kind, CodeGenErrorKind::TooManySymbols(SymbolKind::Local));
            let span = err.span.expect("error span");
            assert_eq!(span.fragment(&source), "v65535");
        }
        Err(err) => panic!("expected code generation error, found {err}"),
        Ok(code) => panic!("expected code generation error, compiled {} instructions", code.len()),
    }
}

#[test]
fn test_string_with_unencodable_char() {
    let kind = codegen_error("class Main { function void f() { do Output.printString(\"\u{1F600}\"); return; } }");
    assert_eq!(kind, CodeGenErrorKind::CharOutOfRange('\u{1F600}'));
}

#[test]
fn test_operand_errors_are_reported() {
    assert_eq!(VmInstr::pop(jack_compiler::compile::Segment::Constant, 0), Err(OperandError::PopConstant));
}

#[test]
fn test_codegen_reuse() {
    let mut codegen = CodeGen::new();

    let point = parse_str(POINT).unwrap();
    let first = codegen.compile(&point).unwrap();

    let main = parse_str(MAIN).unwrap();
    codegen.compile(&main).unwrap();
    assert!(codegen.class_symbols().get("x").is_err());

    // Labels and tables start over for every class.
    let again = codegen.compile(&point).unwrap();
    assert_eq!(first, again);
}
