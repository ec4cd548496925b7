use naslvalue::oracle::{LocalEngine, Observation, observe};
use naslvalue::ops::{self, BinaryOp, Comparison};
use naslvalue::{Kind, Slot, Value};

fn int(n: i64) -> Value {
    Value::Integer(n)
}

fn pure(text: &str) -> Value {
    Value::PureText(text.as_bytes().to_vec())
}

fn add(lhs: &Value, rhs: &Value) -> Value {
    ops::binary(lhs, BinaryOp::Add, rhs).expect("addition is supported")
}

#[test]
fn addition_scenarios_display_and_type() {
    let cases = [
        (vec![int(3), int(1)], "4", "int"),
        (vec![pure("foo"), int(1)], "foo1", "data"),
        (vec![Value::Absent, int(1)], "1", "int"),
        (vec![int(1), Value::Absent], "1", "int"),
        (vec![Value::Absent, Value::Absent], "", "undef"),
        (vec![int(-2), pure("7")], "5", "int"),
    ];
    for (setup, display, type_tag) in cases {
        let direct = add(&setup[0], &setup[1]);
        assert_eq!(
            Observation::of(&direct),
            Observation {
                display: display.into(),
                type_tag: type_tag.into(),
            },
            "{setup:?}"
        );
        let scripted = observe(&LocalEngine, "x0 + x1", &setup).expect("script runs");
        assert_eq!(scripted, Observation::of(&direct), "{setup:?}");
    }
}

#[test]
fn typeof_of_bound_values() {
    for (value, type_tag) in [
        (int(3), "int"),
        (int(-2), "int"),
        (pure("foo"), "data"),
        (Value::Absent, "undef"),
    ] {
        let observed = observe(&LocalEngine, "x0", std::slice::from_ref(&value)).expect("run");
        assert_eq!(observed, Observation::of(&value));
        assert_eq!(observed.type_tag, type_tag);
    }
}

#[test]
fn text_subtraction() {
    let result = ops::binary(&pure("abcd"), BinaryOp::Sub, &pure("bc")).expect("supported");
    assert_eq!(result, pure("ad"));
    assert_eq!(result.runtime_type_tag(), "data");

    let missing = ops::binary(&pure("abcd"), BinaryOp::Sub, &pure("zx")).expect("supported");
    assert_eq!(missing, pure("abcd"));
}

#[test]
fn division_and_modulo_by_zero_yield_zero() {
    for n in [i64::MIN, -7, 0, 5, i64::MAX] {
        assert_eq!(ops::binary(&int(n), BinaryOp::Div, &int(0)), Ok(int(0)));
        assert_eq!(ops::binary(&int(n), BinaryOp::Rem, &int(0)), Ok(int(0)));
    }
    let observed = observe(&LocalEngine, "x0 / x1", &[int(5), int(0)]).expect("run");
    assert_eq!(observed.display, "0");
    assert_eq!(observed.type_tag, "int");
}

#[test]
fn absent_is_the_additive_identity() {
    for n in [-3, 0, 1, 42] {
        assert_eq!(add(&Value::Absent, &int(n)), int(n));
        assert_eq!(add(&int(n), &Value::Absent), int(n));
    }
    assert_eq!(add(&Value::Absent, &Value::Absent), Value::Absent);
}

#[test]
fn integer_encodings_round_trip() {
    for (text, n) in [("25", 25), ("-25", -25), ("0", 0), ("017", 15), ("0x66", 102)] {
        assert_eq!(Value::integer(text), Ok(int(n)), "{text}");
    }
    assert_eq!(Value::integer(b"25"), Ok(int(25)));
    assert_eq!(Value::integer(7_i64), Value::integer("7"));
}

#[test]
fn coercion_is_idempotent() {
    let values = [
        Value::Absent,
        int(12),
        pure("34"),
        pure("abc"),
        Value::ImpureText(b"\xff".to_vec()),
    ];
    let kinds = [
        Kind::Absent,
        Kind::Integer,
        Kind::PureText,
        Kind::ImpureText,
        Kind::Collection,
    ];
    for value in &values {
        for kind in kinds {
            if let Ok(once) = value.coerce(kind) {
                assert_eq!(once.coerce(kind), Ok(once.clone()), "{value:?} -> {kind}");
            }
        }
    }
}

#[test]
fn unsupported_pairings_are_reported_not_raised() {
    let collection = Value::Collection(Default::default());
    let err = ops::binary(&collection, BinaryOp::Add, &int(1)).unwrap_err();
    assert_eq!((err.op, err.left, err.right), ("+", Kind::Collection, Kind::Integer));
    assert!(ops::binary(&pure("a"), BinaryOp::Mul, &pure("b")).is_err());
    assert_eq!(ops::compare(&collection, Comparison::Eq, &int(1)), Ok(false));
}

#[test]
fn kind_transition_is_shared_and_one_shot() {
    let first = Slot::new(Value::Absent);
    let second = first.clone();

    assert_eq!(second.index(&int(22)), Ok(Value::Absent));
    assert_eq!(first.kind(), Kind::Collection);
    assert_eq!(first.runtime_type_tag(), "array");

    assert_eq!(first.index(&int(22)), Ok(Value::Absent));
    first.with(|value| {
        let Value::Collection(collection) = value else {
            panic!("expected a collection, got {value:?}");
        };
        assert!(collection.is_empty());
    });
}

#[test]
fn kind_transition_through_scripts() {
    let observed = observe(&LocalEngine, "typeof(x0)", &[]).expect("run");
    assert_eq!(observed.display, "undef");

    let mut env = naslvalue::expr::Environment::new();
    let value = naslvalue::expr::evaluate("v = NULL; v[0]; typeof(v)", &mut env).expect("run");
    assert_eq!(value, pure("array"));
}
