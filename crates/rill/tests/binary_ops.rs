use rill::{Engine, EvalError, FLOAT, INT};

#[test]
fn test_binary_ops_floor_division() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(engine.eval::<INT>("var x = 7 / 2; x")?, 3);
    assert_eq!(engine.eval::<INT>("var x = -7 / 2; x")?, -4);
    assert_eq!(engine.eval::<INT>("var x = 7 / -2; x")?, -4);
    assert_eq!(engine.eval::<INT>("var x = -7 / -2; x")?, 3);

    // any float operand makes it IEEE division
    assert_eq!(engine.eval::<FLOAT>("var x = 7.0 / 2; x")?, 3.5);
    assert_eq!(engine.eval::<FLOAT>("var x = 7 / 2.0; x")?, 3.5);

    Ok(())
}

#[test]
fn test_binary_ops_modulo() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(engine.eval::<INT>("var x = 7 % 3; x")?, 1);
    assert_eq!(engine.eval::<INT>("var x = -7 % 3; x")?, 2);
    assert_eq!(engine.eval::<INT>("var x = 7 % -3; x")?, -2);

    Ok(())
}

#[test]
fn test_binary_ops_division_by_zero() {
    let engine = Engine::new();

    let err = engine.eval::<INT>("var x = 1 / 0; x").unwrap_err();
    assert!(matches!(*err, EvalError::ErrorArithmetic(_, _)));

    let err = engine.eval::<INT>("var x = 1 % 0; x").unwrap_err();
    assert!(matches!(*err, EvalError::ErrorArithmetic(_, _)));

    let err = engine.eval::<FLOAT>("var x = 1.0 / 0.0; x").unwrap_err();
    assert!(matches!(*err, EvalError::ErrorArithmetic(_, _)));
}

#[test]
fn test_binary_ops_integer_overflow() {
    let engine = Engine::new();

    let err = engine
        .eval::<INT>("var x = 9223372036854775807 + 1; x")
        .unwrap_err();
    assert!(matches!(*err, EvalError::ErrorArithmetic(_, _)));
}

#[test]
fn test_binary_ops_string_concat() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(engine.eval::<String>(r#"var x = "ab" + "cd"; x"#)?, "abcd");
    // `+` with at least one string operand coerces the other to string
    assert_eq!(engine.eval::<String>(r#"var x = "a" + 1; x"#)?, "a1");
    assert_eq!(engine.eval::<String>(r#"var x = 1 + "a"; x"#)?, "1a");
    assert_eq!(engine.eval::<String>(r#"var x = "v=" + 2.5; x"#)?, "v=2.5");
    assert_eq!(engine.eval::<String>(r#"var x = "n=" + null; x"#)?, "n=null");

    Ok(())
}

#[test]
fn test_binary_ops_array_concat() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(
        engine.eval::<INT>("var a = [1] + [2, 3]; var n = len(a); n")?,
        3
    );
    // concatenation produces a new array
    assert_eq!(
        engine.eval::<INT>(
            "
                var a = [1];
                var b = a + [2];
                append(a, 9);
                var n = len(b);
                n
            "
        )?,
        2
    );

    Ok(())
}

#[test]
fn test_binary_ops_comparison() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert!(engine.eval::<bool>("var x = 1 < 1.5; x")?);
    assert!(engine.eval::<bool>("var x = 2.5 >= 2; x")?);
    assert!(engine.eval::<bool>(r#"var x = "abc" < "abd"; x"#)?);
    assert!(engine.eval::<bool>(r#"var x = "b" > "a"; x"#)?);

    let err = engine.eval::<bool>("var x = 1 < \"a\"; x").unwrap_err();
    assert!(matches!(*err, EvalError::ErrorMismatchDataType(_, _, _)));

    Ok(())
}

#[test]
fn test_binary_ops_equality() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert!(engine.eval::<bool>("var x = 1 == 1.0; x")?);
    assert!(engine.eval::<bool>("var x = null == null; x")?);
    assert!(engine.eval::<bool>("var x = [1, 2] == [1, 2]; x")?);
    assert!(engine.eval::<bool>("var x = 1 != 2; x")?);

    // booleans compare by identity, not by numeric equality
    assert!(!engine.eval::<bool>("var x = true == 1; x")?);
    assert!(!engine.eval::<bool>(r#"var x = 1 == "1"; x"#)?);

    Ok(())
}

#[test]
fn test_binary_ops_membership() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert!(engine.eval::<bool>("var x = 2 in [1, 2, 3]; x")?);
    assert!(engine.eval::<bool>("var x = 4 not_in [1, 2, 3]; x")?);
    assert!(engine.eval::<bool>(r#"var x = "ell" in "hello"; x"#)?);
    assert!(engine.eval::<bool>(r#"var x = "k" in {"k": 1}; x"#)?);
    assert!(engine.eval::<bool>(r#"var x = "q" not_in {"k": 1}; x"#)?);

    // dict membership requires a string key
    let err = engine.eval::<bool>(r#"var x = 1 in {"k": 1}; x"#).unwrap_err();
    assert!(matches!(*err, EvalError::ErrorMismatchDataType(_, _, _)));

    // membership in a non-collection is a type error
    let err = engine.eval::<bool>("var x = 1 in 2; x").unwrap_err();
    assert!(matches!(*err, EvalError::ErrorMismatchDataType(_, _, _)));

    Ok(())
}
