//! End-to-end scenarios exercising the lexer, parser, and evaluator together
//! through `gm_core::run`, the same entry point `gm-cli`'s file-run mode uses.

use gm_core::repl::ExecError;
use gm_core::{Runtime, Value};
use pretty_assertions::assert_eq;

fn eval(source: &str) -> Value {
    let mut rt = Runtime::new();
    match gm_core::run(source, &mut rt) {
        Ok(Value::Error(e)) => panic!("unexpected runtime error: {}", e.message),
        Ok(v) => v,
        Err(ExecError::Parse(errors)) => panic!("unexpected parse errors: {errors:?}"),
    }
}

/// Runs `source` expecting an uncaught runtime error, which surfaces as
/// `Ok(Value::Error)` rather than `Err`, and returns its message.
fn eval_err(source: &str) -> String {
    let mut rt = Runtime::new();
    match gm_core::run(source, &mut rt) {
        Ok(Value::Error(e)) => e.message.clone(),
        Ok(v) => panic!("expected a runtime error, got {v}"),
        Err(ExecError::Parse(errors)) => panic!("unexpected parse errors: {errors:?}"),
    }
}

#[test]
fn arithmetic_promotes_int_to_float() {
    assert_eq!(eval("1 + 2 * 3;"), Value::Int(7));
    assert_eq!(eval("1 + 2.5;"), Value::Float(3.5));
}

#[test]
fn var_let_const_declarations() {
    assert_eq!(eval("var x = 1; x = 2; x;"), Value::Int(2));
    assert_eq!(eval("let y = 1; y = 2; y;"), Value::Int(2));
}

#[test]
fn let_declaration_pins_its_type() {
    let err = eval_err("let y = 1; y = \"oops\"; y;");
    assert!(err.contains("pinned"), "expected a type-pin error, got: {err}");
}

#[test]
fn const_cannot_be_reassigned() {
    let err = eval_err("const z = 1; z = 2; z;");
    assert!(err.contains("const"), "expected an immutable-assign error, got: {err}");
}

#[test]
fn if_else_chooses_the_matching_branch() {
    assert_eq!(eval("if (1 < 2) { 10; } else { 20; }"), Value::Int(10));
    assert_eq!(eval("if (1 > 2) { 10; } else { 20; }"), Value::Int(20));
}

#[test]
fn while_loop_accumulates() {
    let result = eval(
        r#"
        var total = 0;
        var i = 0;
        while (i < 5) {
            total = total + i;
            i = i + 1;
        }
        total;
        "#,
    );
    assert_eq!(result, Value::Int(10));
}

#[test]
fn for_loop_respects_break_and_continue() {
    let result = eval(
        r#"
        var total = 0;
        for (var i = 0; i < 10; i = i + 1) {
            if (i == 5) { break; }
            if (i % 2 == 0) { continue; }
            total = total + i;
        }
        total;
        "#,
    );
    // 1 + 3 = 4, loop stops before adding 5 or beyond.
    assert_eq!(result, Value::Int(4));
}

#[test]
fn foreach_over_a_list() {
    let result = eval(
        r#"
        var total = 0;
        foreach n in [1, 2, 3, 4] {
            total = total + n;
        }
        total;
        "#,
    );
    assert_eq!(result, Value::Int(10));
}

#[test]
fn foreach_over_a_range() {
    let result = eval(
        r#"
        var total = 0;
        foreach n in 1...5 {
            total = total + n;
        }
        total;
        "#,
    );
    assert_eq!(result, Value::Int(15));
}

#[test]
fn switch_falls_through_empty_cases_until_a_break() {
    let result = eval(
        r#"
        func classify(n) {
            var label = "";
            switch (n) {
                case 1:
                case 2:
                    label = "small";
                    break;
                case 3:
                    label = "medium";
                    break;
                default:
                    label = "large";
            }
            return label;
        }
        classify(1) + "," + classify(2) + "," + classify(3) + "," + classify(9);
        "#,
    );
    assert_eq!(result, Value::str_from("small,small,medium,large"));
}

#[test]
fn functions_close_over_their_defining_scope() {
    let result = eval(
        r#"
        func make_adder(n) {
            return func(x) { return x + n; };
        }
        var add5 = make_adder(5);
        add5(10);
        "#,
    );
    assert_eq!(result, Value::Int(15));
}

#[test]
fn recursive_functions_compute_factorial() {
    let result = eval(
        r#"
        func fact(n) {
            if (n <= 1) { return 1; }
            return n * fact(n - 1);
        }
        fact(10);
        "#,
    );
    assert_eq!(result, Value::Int(3628800));
}

#[test]
fn structs_carry_fields_and_methods() {
    let result = eval(
        r#"
        struct Point {
            x = 0;
            y = 0;
            func magnitude_sq() {
                return this.x * this.x + this.y * this.y;
            }
        }
        var p = new Point(3, 4);
        p.magnitude_sq();
        "#,
    );
    assert_eq!(result, Value::Int(25));
}

#[test]
fn struct_field_mutation_is_visible_through_the_same_instance() {
    let result = eval(
        r#"
        struct Counter {
            count = 0;
            func bump() {
                this.count = this.count + 1;
            }
        }
        var c = new Counter();
        c.bump();
        c.bump();
        c.count;
        "#,
    );
    assert_eq!(result, Value::Int(2));
}

#[test]
fn enum_members_evaluate_to_sequential_ints() {
    let result = eval(
        r#"
        enum Color { Red, Green, Blue }
        Color.Red + Color.Green + Color.Blue;
        "#,
    );
    assert_eq!(result, Value::Int(0 + 1 + 2));
}

#[test]
fn enum_members_can_be_assigned_explicit_bases() {
    let result = eval("enum Status { Ok = 200, Created, BadRequest = 400 } Status.Created;");
    assert_eq!(result, Value::Int(201));
}

#[test]
fn list_indexing_supports_negative_indices_and_slices() {
    assert_eq!(eval("[1, 2, 3][-1];"), Value::Int(3));
    assert_eq!(eval("len([1, 2, 3][1:3]);"), Value::Int(2));
}

#[test]
fn out_of_bounds_indexing_is_a_runtime_error() {
    let err = eval_err("[1, 2, 3][10];");
    assert!(err.contains("index"), "expected an index error, got: {err}");
}

#[test]
fn an_uncaught_runtime_error_surfaces_as_an_inspectable_error_value() {
    let mut rt = Runtime::new();
    let result = gm_core::run("[1, 2, 3][10];", &mut rt).expect("parses and runs");
    assert_eq!(result.type_tag(), "error");
    match &result {
        Value::Error(e) => assert!(e.message.contains("index"), "expected an index error, got: {}", e.message),
        other => panic!("expected an error value, got {other:?}"),
    }
}

#[test]
fn integer_division_by_zero_errors_but_float_division_does_not() {
    let err = eval_err("1 / 0;");
    assert!(err.contains("zero"), "expected a division-by-zero error, got: {err}");
    match eval("1.0 / 0.0;") {
        Value::Float(f) => assert!(f.is_infinite()),
        other => panic!("expected a float, got {other:?}"),
    }
}

#[test]
fn strict_equality_requires_matching_type_tags() {
    assert_eq!(eval("1 === 1;"), Value::Bool(true));
    assert_eq!(eval("1 === 1.0;"), Value::Bool(false));
    assert_eq!(eval("1 == 1.0;"), Value::Bool(true));
}

#[test]
fn maps_and_sets_preserve_insertion_order() {
    assert_eq!(eval(r#"to_string(map { "b": 1, "a": 2 });"#), Value::str_from(r#"{b: 1, a: 2}"#));
    assert_eq!(eval("to_string(set { 3, 1, 2, 1 });"), Value::str_from("{3, 1, 2}"));
}

#[test]
fn builtin_list_operations_round_trip() {
    let result = eval(
        r#"
        var l = list();
        pushback_list(l, 1);
        pushback_list(l, 2);
        pushfront_list(l, 0);
        popback_list(l);
        l;
        "#,
    );
    assert_eq!(result, Value::list(vec![Value::Int(0), Value::Int(1)]));
}

#[test]
fn conversion_round_trips_for_representable_integers() {
    assert_eq!(eval("to_int(to_string(42));"), Value::Int(42));
    assert_eq!(eval("to_string(to_int(\"42\"));"), Value::str_from("42"));
}

#[test]
fn import_exposes_builtins_under_a_namespace() {
    assert_eq!(eval("import math; math.abs(-5);"), Value::Int(5));
}

#[test]
fn undefined_name_is_a_runtime_error() {
    let err = eval_err("totally_undefined_name;");
    assert!(err.contains("undefined"), "expected an undefined-name error, got: {err}");
}

#[test]
fn arity_mismatch_is_a_runtime_error() {
    let err = eval_err("func f(a, b) { return a + b; } f(1);");
    assert!(err.contains("expects"), "expected an arity error, got: {err}");
}

#[test]
fn deep_recursion_hits_the_guard_instead_of_overflowing_the_stack() {
    let err = eval_err("func loop_forever(n) { return loop_forever(n + 1); } loop_forever(0);");
    assert!(err.contains("recursion"), "expected a recursion error, got: {err}");
}
