use jack_compiler::{
    parse_str,
    parsing::{Expr, FieldScope, Receiver, Stmt, SubroutineKind, Type},
    JackError,
};

const POINT: &str = include_str!("point.jack");
const MAIN: &str = include_str!("main.jack");

fn parse_error(source: &str) -> String {
    match parse_str(source) {
        Err(JackError::Parse(err)) => err.message,
        other => panic!("expected parse error, found {other:?}"),
    }
}

#[test]
fn test_parse_point() {
    let class = parse_str(POINT).unwrap();

    assert_eq!(class.name.as_str(), "Point");
    assert_eq!(class.fields.len(), 2);
    assert_eq!(class.fields[0].scope, FieldScope::Instance);
    assert_eq!(class.fields[0].ty, Type::Int);
    assert_eq!(class.fields[0].names.len(), 2);
    assert_eq!(class.fields[1].scope, FieldScope::Static);

    let kinds: Vec<_> = class.subroutines.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SubroutineKind::Constructor,
            SubroutineKind::Method,
            SubroutineKind::Method,
            SubroutineKind::Method,
            SubroutineKind::Method,
            SubroutineKind::Method,
            SubroutineKind::Function,
        ]
    );

    let new = &class.subroutines[0];
    assert_eq!(new.return_type, Some(Type::Class("Point".into())));
    assert_eq!(new.parameters.len(), 2);
    assert!(matches!(new.body.statements.last(), Some(Stmt::Return(Some(_)))));

    let dist_sq = &class.subroutines[2];
    assert_eq!(dist_sq.body.local_count(), 2);
    assert_eq!(dist_sq.parameters[0].ty, Type::Class("Point".into()));

    let shift = &class.subroutines[4];
    assert_eq!(shift.return_type, None);
    match &shift.body.statements[0] {
        Stmt::Do(call) => {
            assert_eq!(call.receiver, Receiver::None);
            assert_eq!(call.name.as_str(), "move");
            assert_eq!(call.arguments.len(), 2);
        }
        stmt => panic!("unexpected {stmt:?}"),
    }
}

#[test]
fn test_parse_main() {
    let class = parse_str(MAIN).unwrap();
    let main = &class.subroutines[0];

    assert_eq!(main.body.local_count(), 4);

    match &main.body.statements[3] {
        Stmt::While(stmt) => match &stmt.body[0] {
            Stmt::Let(stmt) => {
                assert_eq!(stmt.name.as_str(), "a");
                assert!(matches!(stmt.index, Some(Expr::Ident(_))));
            }
            stmt => panic!("unexpected {stmt:?}"),
        },
        stmt => panic!("unexpected {stmt:?}"),
    }

    match &main.body.statements[5] {
        Stmt::If(stmt) => {
            assert_eq!(stmt.then_branch.len(), 1);
            assert_eq!(stmt.else_branch.as_ref().map(Vec::len), Some(1));
        }
        stmt => panic!("unexpected {stmt:?}"),
    }

    match &main.body.statements[7] {
        Stmt::Do(call) => assert!(matches!(call.receiver, Receiver::Var(ref v) if v.as_str() == "a")),
        stmt => panic!("unexpected {stmt:?}"),
    }
}

#[test]
fn test_parse_empty_class() {
    let class = parse_str("class Empty {}").unwrap();
    assert!(class.fields.is_empty());
    assert!(class.subroutines.is_empty());
}

#[test]
fn test_parse_naming_conventions() {
    assert!(parse_error("class point {}").contains("uppercase"));
    assert!(parse_error("class Point { function void Main() { return; } }").contains("lowercase"));
}

#[test]
fn test_parse_trailing_tokens() {
    assert!(parse_error("class A {} class B {}").contains("after the end of class"));
}

#[test]
fn test_parse_do_requires_call() {
    let message = parse_error("class A { function void f() { do x + 1; return; } }");
    assert!(message.contains("subroutine call"), "{message}");
}

#[test]
fn test_parse_var_after_statement() {
    let message = parse_error("class A { function void f() { let x = 1; var int y; return; } }");
    assert!(message.contains("expected '}'"), "{message}");
}

#[test]
fn test_parse_error_reports_line() {
    let err = parse_str("class A {\n  function void f() {\n    let x = ;\n  }\n}").unwrap_err();

    let token = err.token().unwrap();
    assert_eq!(token.literal, ";");

    let line = err.source_line().unwrap();
    assert_eq!(line.number, 3);
    assert_eq!(line.text, "    let x = ;");
}

#[test]
fn test_parse_unexpected_end() {
    assert!(parse_str("class A { function void f() {").is_err());
}

#[test]
fn test_parse_lex_error_passes_through() {
    assert!(matches!(parse_str("class A { field int x; $ }"), Err(JackError::Lex(_))));
}
