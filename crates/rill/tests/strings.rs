use rill::{Engine, EvalError, INT};

#[test]
fn test_strings_literals_and_escapes() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(engine.eval::<INT>(r#"var s = "a\nb"; var n = len(s); n"#)?, 3);
    assert_eq!(
        engine.eval::<String>(r#"var s = "tab\there"; s"#)?,
        "tab\there"
    );
    assert_eq!(engine.eval::<String>(r#"var s = 'it\'s'; s"#)?, "it's");
    assert_eq!(engine.eval::<String>(r#"var s = "back\\slash"; s"#)?, "back\\slash");

    // triple-quoted strings span lines
    assert_eq!(
        engine.eval::<String>("var s = '''line1\nline2'''; s")?,
        "line1\nline2"
    );

    Ok(())
}

#[test]
fn test_strings_len_counts_characters() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(engine.eval::<INT>(r#"var s = "héllo"; var n = len(s); n"#)?, 5);

    Ok(())
}

#[test]
fn test_strings_indexing() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(engine.eval::<String>(r#"var s = "hello"; var c = s[1]; c"#)?, "e");

    let err = engine
        .eval::<String>(r#"var s = "hi"; var c = s[2]; c"#)
        .unwrap_err();
    assert!(matches!(*err, EvalError::ErrorStringBounds(2, 2, _)));

    let err = engine
        .eval::<String>(r#"var s = "hi"; var c = s[-1]; c"#)
        .unwrap_err();
    assert!(matches!(*err, EvalError::ErrorStringBounds(_, -1, _)));

    // strings are immutable
    let err = engine.eval::<INT>(r#"var s = "hi"; s[0] = "H"; 0"#).unwrap_err();
    assert!(matches!(*err, EvalError::ErrorMismatchDataType(_, _, _)));

    Ok(())
}

#[test]
fn test_strings_slicing() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(
        engine.eval::<String>(r#"var s = "hello"; var t = s[1:4]; t"#)?,
        "ell"
    );
    assert_eq!(
        engine.eval::<String>(r#"var s = "hello"; var t = s[1:100]; t"#)?,
        "ello"
    );
    assert_eq!(
        engine.eval::<String>(r#"var s = "hello"; var t = s[3:2]; t"#)?,
        ""
    );
    assert_eq!(
        engine.eval::<String>(r#"var s = "hello"; var t = s[-3:5]; t"#)?,
        "llo"
    );

    Ok(())
}

#[test]
fn test_strings_split_join() -> Result<(), Box<EvalError>> {
    let engine = Engine::new();

    assert_eq!(
        engine.eval::<INT>(r#"var parts = str_split("a,b,c", ","); var n = len(parts); n"#)?,
        3
    );
    assert_eq!(
        engine.eval::<String>(r#"var parts = str_split("a,b,c", ","); var x = parts[1]; x"#)?,
        "b"
    );
    assert_eq!(
        engine.eval::<String>(r#"var joined = str_join([1, 2, 3], "-"); joined"#)?,
        "1-2-3"
    );

    // the separator must not be empty
    let err = engine
        .eval::<INT>(r#"var parts = str_split("abc", ""); 0"#)
        .unwrap_err();
    assert!(matches!(*err, EvalError::ErrorMismatchDataType(_, _, _)));

    Ok(())
}
