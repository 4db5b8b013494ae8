use rill::{Engine, EvalError};
use std::cell::RefCell;
use std::rc::Rc;

fn engine_with_capture() -> (Engine, Rc<RefCell<String>>) {
    let output = Rc::new(RefCell::new(String::new()));
    let mut engine = Engine::new();
    let sink = output.clone();
    engine.on_print(move |text| sink.borrow_mut().push_str(text));
    (engine, output)
}

#[test]
fn test_print_arithmetic_scenario() -> Result<(), Box<EvalError>> {
    let (engine, output) = engine_with_capture();

    engine.run("var x = 2; var y = 3; println(x * y + 1);")?;

    assert_eq!(*output.borrow(), "7\n");
    Ok(())
}

#[test]
fn test_print_factorial_scenario() -> Result<(), Box<EvalError>> {
    let (engine, output) = engine_with_capture();

    engine.run(
        "
            func fact(n) {
                if (n <= 1) { return 1; }
                return n * fact(n - 1);
            }
            println(fact(5));
        ",
    )?;

    assert_eq!(*output.borrow(), "120\n");
    Ok(())
}

#[test]
fn test_print_foreach_scenario() -> Result<(), Box<EvalError>> {
    let (engine, output) = engine_with_capture();

    engine.run("var a = [1, 2, 3]; foreach (i => v in a) { println(v * 10); }")?;

    assert_eq!(*output.borrow(), "10\n20\n30\n");
    Ok(())
}

#[test]
fn test_print_class_scenario() -> Result<(), Box<EvalError>> {
    let (engine, output) = engine_with_capture();

    engine.run(
        "
            class C {
                var _v = 0;
                func set(x) { this._v = x; }
                func get() { return this._v; }
            }
            var c = new C();
            c.set(7);
            println(c.get());
        ",
    )?;
    assert_eq!(*output.borrow(), "7\n");

    // the same access from outside the class must fail
    let err = engine
        .run(
            "
                class C { var _v = 0; }
                var c = new C();
                println(c._v);
            ",
        )
        .unwrap_err();
    assert!(matches!(*err, EvalError::ErrorPrivateAccess(_, _, _)));

    Ok(())
}

#[test]
fn test_print_catch_scenario() -> Result<(), Box<EvalError>> {
    let (engine, output) = engine_with_capture();

    engine.run(r#"try { raise "boom"; } catch e { println(e); }"#)?;

    let printed = output.borrow();
    let line = printed.trim_end();
    let suffix = line.rsplit(": ").next().expect("at least one segment");
    assert_eq!(suffix, "boom");

    Ok(())
}

#[test]
fn test_print_dict_json_scenario() -> Result<(), Box<EvalError>> {
    let (engine, output) = engine_with_capture();

    engine.run(
        r#"
            var d = {"a": 1, "b": 2};
            d["c"] = 3;
            println(len(d));
            println(json_encode(d));
        "#,
    )?;

    assert_eq!(*output.borrow(), "3\n{\"a\":1,\"b\":2,\"c\":3}\n");
    Ok(())
}

#[test]
fn test_print_joins_arguments_with_spaces() -> Result<(), Box<EvalError>> {
    let (engine, output) = engine_with_capture();

    engine.run(r#"print("a", 1); print("b"); println(); println("x", true);"#)?;

    assert_eq!(*output.borrow(), "a 1b\nx true\n");
    Ok(())
}

#[test]
fn test_print_value_formatting() -> Result<(), Box<EvalError>> {
    let (engine, output) = engine_with_capture();

    engine.run(r#"println([1, "two", 3.0]); println({"k": null});"#)?;

    assert_eq!(
        *output.borrow(),
        "[1, \"two\", 3.0]\n{\"k\": null}\n"
    );
    Ok(())
}
