use rill::{Engine, EvalError, ParseErrorType, INT};

#[test]
fn test_syntax_fun_synonym() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(
        engine.eval::<INT>("fun f() { return 3; } var r = f(); r")?,
        3
    );

    Ok(())
}

#[test]
fn test_syntax_optional_semicolons() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(
        engine.eval::<INT>("var x = 1 var y = 2; var r = x + y r")?,
        3
    );

    Ok(())
}

#[test]
fn test_syntax_else_if_chains() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(
        engine.eval::<String>(
            r#"
                func grade(n) {
                    if (n >= 90) {
                        return "A";
                    } else if (n >= 80) {
                        return "B";
                    } else if (n >= 70) {
                        return "C";
                    } else {
                        return "F";
                    }
                }
                var r = grade(85) + grade(95) + grade(3);
                r
            "#
        )?,
        "BAF"
    );

    Ok(())
}

#[test]
fn test_syntax_parse_errors() {
    let engine = Engine::new();

    // unterminated block
    assert!(engine.compile("if (true) {").is_err());
    // missing parenthesis
    assert!(engine.compile("if true { }").is_err());
    // `then` is reserved but used by no production
    assert!(engine.compile("then").is_err());
    // keywords are not variable names
    assert!(engine.compile("var while = 1;").is_err());

    // only identifiers and member accesses can be called
    let err = engine.compile("var x = [1](2);").unwrap_err();
    assert!(matches!(*err.0, ParseErrorType::MalformedCallExpr(_)));

    // calls are not assignment targets
    let err = engine.compile("func f() { } f() = 3;").unwrap_err();
    assert!(matches!(*err.0, ParseErrorType::AssignmentToInvalidLHS(_)));

    // unexpected character
    let err = engine.compile("var x = 1 @ 2;").unwrap_err();
    assert!(matches!(*err.0, ParseErrorType::BadInput(_)));
}

#[test]
fn test_syntax_parse_error_positions() {
    let engine = Engine::new();

    let err = engine.compile("var x = 1;\nvar = 2;").unwrap_err();
    assert_eq!(err.position().line(), Some(2));

    let rendered = err.to_string();
    assert!(rendered.contains("<input>:2:"), "got {rendered:?}");
}

#[test]
fn test_syntax_class_body_restrictions() {
    let engine = Engine::new();

    // only `var` and `func` belong in a class body
    assert!(engine.compile("class C { if (true) { } }").is_err());
    assert!(engine.compile("class C { var x = 1; return; }").is_err());

    // `;` is permitted between declarations
    assert!(engine
        .compile("class C { var x = 1; ; func m() { } ; }")
        .is_ok());
}

#[test]
fn test_syntax_for_header_forms() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    // `..` may be written as two consecutive dot tokens
    assert_eq!(
        engine.eval::<INT>("var sum = 0; for (i = 1 . . 4) { sum += i; } sum")?,
        6
    );

    // a for header needs `=` or `=>` after the variable
    assert!(engine.compile("for (i in [1]) { }").is_err());

    Ok(())
}

#[test]
fn test_syntax_trailing_commas() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(engine.eval::<INT>("var a = [1, 2, 3,]; var n = len(a); n")?, 3);
    assert_eq!(
        engine.eval::<INT>(r#"var d = {"a": 1,}; var n = len(d); n"#)?,
        1
    );
    assert_eq!(
        engine.eval::<INT>("func f(a, b,) { return a + b; } var r = f(1, 2,); r")?,
        3
    );

    Ok(())
}
