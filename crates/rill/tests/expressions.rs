use rill::{Engine, EvalError, FLOAT, INT};

#[test]
fn test_expressions_precedence() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(engine.eval::<INT>("var x = 2 + 3 * 4; x")?, 14);
    assert_eq!(engine.eval::<INT>("var x = (2 + 3) * 4; x")?, 20);
    assert_eq!(engine.eval::<INT>("var x = 2 * 3 + 4 * 5; x")?, 26);
    assert_eq!(engine.eval::<INT>("var x = 10 - 2 - 3; x")?, 5);
    assert_eq!(engine.eval::<INT>("var x = 100 / 10 / 5; x")?, 2);

    // comparison binds tighter than `and`/`or`
    assert!(engine.eval::<bool>("var x = 1 < 2 and 3 < 4; x")?);
    assert!(engine.eval::<bool>("var x = 1 < 2 or 3 > 4; x")?);
    assert!(!engine.eval::<bool>("var x = 1 > 2 and 3 < 4; x")?);

    // equality binds tighter than `and`
    assert!(engine.eval::<bool>("var x = 1 == 1 and 2 == 2; x")?);

    Ok(())
}

#[test]
fn test_expressions_unary() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    // `-x + y` parses as `(-x) + y`
    assert_eq!(engine.eval::<INT>("var x = -2 + 5; x")?, 3);
    assert_eq!(engine.eval::<INT>("var x = -(2 + 5); x")?, -7);
    assert_eq!(engine.eval::<FLOAT>("var x = -2.5; x")?, -2.5);
    assert!(engine.eval::<bool>("var x = not false; x")?);
    assert!(engine.eval::<bool>("var x = not 0; x")?);
    assert!(!engine.eval::<bool>("var x = not 42; x")?);

    Ok(())
}

#[test]
fn test_expressions_number_literals() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(engine.eval::<INT>("var x = 12345; x")?, 12345);
    assert_eq!(engine.eval::<FLOAT>("var x = 2.5; x")?, 2.5);
    assert_eq!(engine.eval::<FLOAT>("var x = 3. ; x")?, 3.0);

    Ok(())
}

#[test]
fn test_expressions_output_type_mismatch() {
    let engine = Engine::new();

    let err = engine.eval::<INT>("var x = \"hello\"; x").unwrap_err();
    assert!(matches!(*err, EvalError::ErrorMismatchOutputType(_, _, _)));
}
