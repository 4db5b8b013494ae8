use rill::{Engine, EvalError, INT};

#[test]
fn test_var_scope_blocks() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    // a variable declared inside a block is not visible after the block
    let err = engine
        .eval::<INT>("if (true) { var x = 1; } x")
        .unwrap_err();
    assert!(matches!(*err, EvalError::ErrorVariableNotFound(_, _)));

    // shadowing inside a block leaves the outer binding untouched
    assert_eq!(
        engine.eval::<INT>("var x = 1; if (true) { var x = 2; } x")?,
        1
    );

    // assigning (not declaring) inside a block mutates the outer binding
    assert_eq!(
        engine.eval::<INT>("var x = 1; if (true) { x = 2; } x")?,
        2
    );

    Ok(())
}

#[test]
fn test_var_scope_set_never_creates() {
    let engine = Engine::new();

    let err = engine.eval::<INT>("y = 1; y").unwrap_err();
    assert!(matches!(*err, EvalError::ErrorVariableNotFound(_, _)));

    let err = engine.eval::<INT>("missing").unwrap_err();
    assert!(matches!(*err, EvalError::ErrorVariableNotFound(_, _)));
}

#[test]
fn test_var_scope_multi_declarations() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    // a declarator without `= expr` defaults to null
    assert!(engine.eval::<bool>("var a = 1, b, c = 3; var r = b == null; r")?);
    assert_eq!(engine.eval::<INT>("var a = 1, b, c = 3; var r = a + c; r")?, 4);

    Ok(())
}

#[test]
fn test_var_scope_closure_capture() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    // a closure captures the environment at definition time, so later
    // mutations of the captured variable are observed
    assert_eq!(
        engine.eval::<INT>(
            "
                var x = 1;
                func f() { return x; }
                x = 2;
                var r = f();
                r
            "
        )?,
        2
    );

    // a function sees bindings added to its defining frame after definition
    assert_eq!(
        engine.eval::<INT>(
            "
                func f() { return g; }
                var g = 5;
                var r = f();
                r
            "
        )?,
        5
    );

    Ok(())
}

#[test]
fn test_var_scope_persistent_scope() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();
    let scope = engine.new_global_scope();

    engine.run_with_scope(&scope, "var x = 40;")?;
    engine.run_with_scope(&scope, "x += 2;")?;

    assert_eq!(engine.eval_with_scope::<INT>(&scope, "x")?, 42);

    Ok(())
}
