use rill::{Engine, EvalError, FLOAT, INT};

#[test]
fn test_builtins_type() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    for (expr, expected) in [
        ("true", "bool"),
        ("1", "int"),
        ("1.5", "float"),
        ("\"s\"", "string"),
        ("null", "null"),
        ("[]", "array"),
        ("{}", "dict"),
    ] {
        assert_eq!(
            engine.eval::<String>(&format!("var t = type({expr}); t"))?,
            expected
        );
    }

    // built-ins themselves report "unknown"
    assert_eq!(engine.eval::<String>("var t = type(print); t")?, "unknown");

    Ok(())
}

#[test]
fn test_builtins_coercions() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(engine.eval::<INT>(r#"var x = int("42"); x"#)?, 42);
    assert_eq!(engine.eval::<INT>(r#"var x = int(" 42 "); x"#)?, 42);
    assert_eq!(engine.eval::<INT>("var x = int(3.9); x")?, 3);
    assert_eq!(engine.eval::<INT>("var x = int(-3.9); x")?, -3);
    assert_eq!(engine.eval::<INT>("var x = int(true); x")?, 1);

    assert_eq!(engine.eval::<FLOAT>(r#"var x = float("2.5"); x"#)?, 2.5);
    assert_eq!(engine.eval::<FLOAT>("var x = float(2); x")?, 2.0);

    assert_eq!(engine.eval::<String>("var x = str(42); x")?, "42");
    assert_eq!(engine.eval::<String>("var x = str(2.0); x")?, "2.0");
    assert_eq!(engine.eval::<String>("var x = str(null); x")?, "null");
    assert_eq!(engine.eval::<String>("var x = str(true); x")?, "true");

    let err = engine.eval::<INT>(r#"var x = int("abc"); x"#).unwrap_err();
    assert!(matches!(*err, EvalError::ErrorMismatchDataType(_, _, _)));

    Ok(())
}

#[test]
fn test_builtins_len_arity_and_types() {
    let engine = Engine::new();

    let err = engine.eval::<INT>("var x = len(1); x").unwrap_err();
    assert!(matches!(*err, EvalError::ErrorMismatchDataType(_, _, _)));

    let err = engine.eval::<INT>("var x = len(); x").unwrap_err();
    assert!(matches!(*err, EvalError::ErrorArityMismatch(_, 1, 0, _)));

    let err = engine.eval::<INT>(r#"var x = len("a", "b"); x"#).unwrap_err();
    assert!(matches!(*err, EvalError::ErrorArityMismatch(_, 1, 2, _)));
}

#[test]
fn test_builtins_range() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(
        engine.eval::<INT>("var n = len(range(5)); n")?,
        5
    );
    assert_eq!(
        engine.eval::<String>(r#"var s = str_join(range(2, 5), ","); s"#)?,
        "2,3,4"
    );
    assert_eq!(
        engine.eval::<INT>(
            "
                var sum = 0;
                foreach (i => v in range(1, 10, 2)) { sum += v; }
                sum
            "
        )?,
        25
    );
    assert_eq!(
        engine.eval::<INT>(
            "
                var sum = 0;
                foreach (i => v in range(10, 1, -2)) { sum += v; }
                sum
            "
        )?,
        30
    );
    assert_eq!(engine.eval::<INT>("var n = len(range(5, 5)); n")?, 0);

    let err = engine.eval::<INT>("var r = range(1, 5, 0); 0").unwrap_err();
    assert!(matches!(*err, EvalError::ErrorArithmetic(_, _)));

    Ok(())
}

#[test]
fn test_builtins_math() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(engine.eval::<FLOAT>(r#"var x = math("sin", 0); x"#)?, 0.0);
    assert_eq!(engine.eval::<FLOAT>(r#"var x = math("exp", 0); x"#)?, 1.0);
    assert_eq!(
        engine.eval::<FLOAT>(r#"var x = math("pow", 2, 10); x"#)?,
        1024.0
    );

    // ceil/floor/round return integers
    assert_eq!(engine.eval::<INT>(r#"var x = math("ceil", 2.1); x"#)?, 3);
    assert_eq!(engine.eval::<INT>(r#"var x = math("floor", 2.9); x"#)?, 2);
    assert_eq!(engine.eval::<INT>(r#"var x = math("round", 2.4); x"#)?, 2);
    assert_eq!(engine.eval::<INT>(r#"var x = math("round", 2.6); x"#)?, 3);

    // round ties to even
    assert_eq!(engine.eval::<INT>(r#"var x = math("round", 2.5); x"#)?, 2);
    assert_eq!(engine.eval::<INT>(r#"var x = math("round", 3.5); x"#)?, 4);

    // domain violations
    let err = engine.eval::<FLOAT>(r#"var x = math("log", 0); x"#).unwrap_err();
    assert!(matches!(*err, EvalError::ErrorArithmetic(_, _)));
    let err = engine.eval::<FLOAT>(r#"var x = math("asin", 2); x"#).unwrap_err();
    assert!(matches!(*err, EvalError::ErrorArithmetic(_, _)));

    // unknown operations are catchable errors
    let err = engine.eval::<FLOAT>(r#"var x = math("tanh", 1); x"#).unwrap_err();
    assert!(matches!(*err, EvalError::ErrorRuntime(_, _)));

    Ok(())
}

#[test]
fn test_builtins_math_random() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    for _ in 0..32 {
        let x = engine.eval::<FLOAT>(r#"var x = math("random"); x"#)?;
        assert!((0.0..1.0).contains(&x), "got {x}");

        let y = engine.eval::<FLOAT>(r#"var y = math("random", 5, 10); y"#)?;
        assert!((5.0..=10.0).contains(&y), "got {y}");
    }

    assert_eq!(
        engine.eval::<FLOAT>(r#"var x = math("random", 3, 3); x"#)?,
        3.0
    );

    Ok(())
}

#[test]
fn test_builtins_json_round_trip() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert!(engine.eval::<bool>(
        r#"
            var d = {"a": 1, "b": [true, null, 2.5], "c": {"n": "s"}};
            var back = json_decode(json_encode(d));
            var r = back == d;
            r
        "#
    )?);

    // decoded objects preserve key order
    assert_eq!(
        engine.eval::<String>(
            r#"
                var back = json_decode("{\"b\": 1, \"a\": 2}");
                var joined = str_join(keys(back), ",");
                joined
            "#
        )?,
        "b,a"
    );

    // integral numbers decode as ints, others as floats
    assert_eq!(
        engine.eval::<String>(
            r#"
                var back = json_decode("[1, 2.5]");
                var t = type(back[0]) + "/" + type(back[1]);
                t
            "#
        )?,
        "int/float"
    );

    Ok(())
}

#[test]
fn test_builtins_json_relaxed_dialect() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    // trailing commas
    assert_eq!(
        engine.eval::<INT>(r#"var d = json_decode("{\"a\": 1,}"); var x = d["a"]; x"#)?,
        1
    );
    assert_eq!(
        engine.eval::<INT>(r#"var a = json_decode("[1, 2, 3,]"); var n = len(a); n"#)?,
        3
    );

    // case-insensitive keyword spellings
    assert!(engine.eval::<bool>(
        r#"
            var a = json_decode("[True, FALSE, Null]");
            var r = a[0] == true and a[1] == false and a[2] == null;
            r
        "#
    )?);

    // single-quoted strings
    assert_eq!(
        engine.eval::<String>(r#"var d = json_decode("{'k': 'v'}"); var x = d["k"]; x"#)?,
        "v"
    );

    Ok(())
}

#[test]
fn test_builtins_json_failures() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    // decode failure raises a catchable error with a fixed message
    assert_eq!(
        engine.eval::<String>(
            r#"
                var msg = "";
                try { json_decode("{"); } catch e { msg = e; }
                msg
            "#
        )?,
        "Invalid JSON string"
    );

    // functions are not JSON-representable
    let err = engine
        .eval::<String>("func f() { } var s = json_encode(f); s")
        .unwrap_err();
    assert!(matches!(*err, EvalError::ErrorMismatchDataType(_, _, _)));

    Ok(())
}

#[test]
fn test_builtins_regexp() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(
        engine.eval::<INT>(r#"var x = regexp_match("\\d+", "abc123"); x"#)?,
        1
    );
    assert_eq!(
        engine.eval::<INT>(r#"var x = regexp_match("^z", "abc"); x"#)?,
        0
    );

    assert_eq!(
        engine.eval::<String>(
            r#"
                var found = regexp_find("\\d+", "a1b22c333");
                var joined = str_join(found, ",");
                joined
            "#
        )?,
        "1,22,333"
    );

    // capture groups are flattened into a single list
    assert_eq!(
        engine.eval::<String>(
            r#"
                var found = regexp_find("(\\w)=(\\d)", "a=1 b=2");
                var joined = str_join(found, ",");
                joined
            "#
        )?,
        "a,1,b,2"
    );

    assert_eq!(
        engine.eval::<String>(r##"var s = regexp_replace("\\d+", "a1b22", "#"); s"##)?,
        "a#b#"
    );

    // an invalid pattern is a catchable error
    let err = engine
        .eval::<INT>(r#"var x = regexp_match("(", "a"); x"#)
        .unwrap_err();
    assert!(matches!(*err, EvalError::ErrorRuntime(_, _)));

    Ok(())
}

#[test]
fn test_builtins_read_write() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();
    let dir = tempfile::tempdir().expect("temporary directory");
    let path = dir.path().join("out.txt");
    let path = path.display();

    assert_eq!(
        engine.eval::<String>(&format!(
            r#"
                write("hello file", "{path}");
                var content = read("{path}");
                content
            "#
        ))?,
        "hello file"
    );

    // write stringifies non-string content
    assert_eq!(
        engine.eval::<String>(&format!(
            r#"
                write(42, "{path}");
                var content = read("{path}");
                content
            "#
        ))?,
        "42"
    );

    // I/O failures surface as catchable errors
    assert!(engine.eval::<bool>(
        r#"
            var caught = false;
            try { read("/nonexistent/definitely/missing.txt"); } catch e { caught = true; }
            caught
        "#
    )?);

    Ok(())
}

#[test]
fn test_builtins_cmd_args() -> Result<(), Box<EvalError>> {
    let mut engine = Engine::new();
    engine.set_script_args(vec!["alpha".to_string(), "beta".to_string()]);

    assert_eq!(engine.eval::<INT>("var n = len(cmd_args()); n")?, 2);
    assert_eq!(
        engine.eval::<String>("var args = cmd_args(); var x = args[0]; x")?,
        "alpha"
    );

    let engine = Engine::new();
    assert_eq!(engine.eval::<INT>("var n = len(cmd_args()); n")?, 0);

    Ok(())
}
