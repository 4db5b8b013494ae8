use rill::{Engine, EvalError, INT};

#[test]
fn test_functions_recursion() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(
        engine.eval::<INT>(
            "
                func fact(n) {
                    if (n <= 1) { return 1; }
                    return n * fact(n - 1);
                }
                var r = fact(5);
                r
            "
        )?,
        120
    );

    Ok(())
}

#[test]
fn test_functions_fall_through_returns_null() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert!(engine.eval::<bool>(
        "
            func noop() { var x = 1; }
            var r = noop() == null;
            r
        "
    )?);

    assert!(engine.eval::<bool>(
        "
            func bare() { return; }
            var r = bare() == null;
            r
        "
    )?);

    Ok(())
}

#[test]
fn test_functions_return_unwinds_within_one_call() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    // return unwinds through nested blocks within one call
    assert_eq!(
        engine.eval::<INT>(
            "
                func f() {
                    while (true) {
                        if (true) { return 7; }
                    }
                }
                var r = f();
                r
            "
        )?,
        7
    );

    // but never escapes across a call boundary
    assert_eq!(
        engine.eval::<INT>(
            "
                func inner() { return 1; }
                func outer() {
                    inner();
                    return 2;
                }
                var r = outer();
                r
            "
        )?,
        2
    );

    Ok(())
}

#[test]
fn test_functions_arity_checked() {
    let engine = Engine::new();

    let err = engine
        .eval::<INT>("func f(a) { return a; } var r = f(1, 2); r")
        .unwrap_err();
    assert!(matches!(*err, EvalError::ErrorArityMismatch(_, 1, 2, _)));

    let err = engine
        .eval::<INT>("func f(a, b) { return a; } var r = f(1); r")
        .unwrap_err();
    assert!(matches!(*err, EvalError::ErrorArityMismatch(_, 2, 1, _)));
}

#[test]
fn test_functions_shared_captured_frame() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    // functions capturing the same frame observe each other's mutations
    assert_eq!(
        engine.eval::<INT>(
            "
                var n = 0;
                func bump() { n += 1; }
                func double() { n *= 2; }
                bump();
                double();
                bump();
                n
            "
        )?,
        3
    );

    Ok(())
}

#[test]
fn test_functions_are_values() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(
        engine.eval::<INT>(
            "
                func f() { return 7; }
                var g = f;
                var r = g();
                r
            "
        )?,
        7
    );

    assert_eq!(
        engine.eval::<String>("func f() { } var t = type(f); t")?,
        "function"
    );

    Ok(())
}

#[test]
fn test_functions_call_errors() {
    let engine = Engine::new();

    let err = engine.eval::<INT>("var x = 1; x(); 0").unwrap_err();
    assert!(matches!(*err, EvalError::ErrorNotAFunction(_, _)));

    let err = engine.eval::<INT>("nope(); 0").unwrap_err();
    assert!(matches!(*err, EvalError::ErrorVariableNotFound(_, _)));
}
