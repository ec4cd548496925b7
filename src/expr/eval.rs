use std::collections::HashMap;

use crate::cell::Slot;
use crate::coerce::HostValue;
use crate::interpreter::{ErrorCode, ScriptError};
use crate::ops::{self, BinaryOp};
use crate::value::{Collection, Key, Kind, Value};

use super::{Expr, Place, parse};

/// Variable bindings plus everything `display()` has written.
#[derive(Debug, Default)]
pub struct Environment {
    vars: HashMap<String, Slot>,
    output: Vec<u8>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `values` to `x0`, `x1`, ... in order.
    pub fn with_bindings(values: impl IntoIterator<Item = Value>) -> Self {
        let mut env = Self::new();
        for (idx, value) in values.into_iter().enumerate() {
            env.bind(format!("x{idx}"), value);
        }
        env
    }

    /// Rebinds `name` to a fresh cell; handles to the old cell keep
    /// the old value.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), Slot::new(value));
    }

    /// Cell bound to `name`. Unknown names start out Absent.
    pub fn slot(&mut self, name: &str) -> Slot {
        self.vars.entry(name.to_string()).or_default().clone()
    }

    pub fn get(&self, name: &str) -> Value {
        self.vars.get(name).map(Slot::get).unwrap_or_default()
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}

/// Runs `source` and returns the value of its last statement.
pub fn evaluate(source: &str, env: &mut Environment) -> Result<Value, ScriptError> {
    let statements = parse(source)?;
    let mut last = Value::Absent;
    for statement in &statements {
        last = eval(statement, env)?;
    }
    Ok(last)
}

fn eval(expr: &Expr, env: &mut Environment) -> Result<Value, ScriptError> {
    let value = match expr {
        Expr::Literal(value) => value.clone(),
        Expr::Var(name) => env.get(name),
        Expr::Index(base, key) => {
            let key = eval(key, env)?;
            match base.as_ref() {
                Expr::Var(name) => env.slot(name).index(&key)?,
                other => ops::index(&eval(other, env)?, &key)?,
            }
        }
        Expr::Unary(op, operand) => ops::unary(*op, &eval(operand, env)?)?,
        Expr::Binary(lhs, op, rhs) => {
            let lhs = eval(lhs, env)?;
            let rhs = eval(rhs, env)?;
            ops::binary(&lhs, *op, &rhs)?
        }
        Expr::Compare(lhs, cmp, rhs) => {
            let lhs = eval(lhs, env)?;
            let rhs = eval(rhs, env)?;
            Value::from(ops::compare(&lhs, *cmp, &rhs)?)
        }
        Expr::Match {
            needle,
            haystack,
            negated,
        } => {
            let needle = eval(needle, env)?;
            let haystack = eval(haystack, env)?;
            Value::from(ops::contains(&haystack, &needle)? != *negated)
        }
        Expr::And(lhs, rhs) => {
            Value::from(eval(lhs, env)?.to_boolean() && eval(rhs, env)?.to_boolean())
        }
        Expr::Or(lhs, rhs) => {
            Value::from(eval(lhs, env)?.to_boolean() || eval(rhs, env)?.to_boolean())
        }
        Expr::Step {
            target,
            delta,
            prefix,
        } => {
            let slot = env.slot(target);
            match (*prefix, *delta > 0) {
                (true, true) => slot.pre_increment()?.get(),
                (true, false) => slot.pre_decrement()?.get(),
                (false, true) => slot.post_increment()?,
                (false, false) => slot.post_decrement()?,
            }
        }
        Expr::Assign { target, op, value } => assign(target, *op, value, env)?,
        Expr::Call(name, args) => call(name, args, env)?,
    };
    Ok(value)
}

fn assign(
    target: &Place,
    op: Option<BinaryOp>,
    value: &Expr,
    env: &mut Environment,
) -> Result<Value, ScriptError> {
    let rhs = eval(value, env)?;
    match target {
        Place::Var(name) => {
            let result = match op {
                Some(op) => ops::binary(&env.get(name), op, &rhs)?,
                None => rhs,
            };
            env.bind(name.clone(), result.clone());
            Ok(result)
        }
        Place::Index(name, key) => {
            let key = eval(key, env)?;
            env.slot(name).set_index(&key, rhs.clone())?;
            Ok(rhs)
        }
    }
}

fn call(name: &str, args: &[Expr], env: &mut Environment) -> Result<Value, ScriptError> {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(eval(arg, env)?);
    }
    match name {
        "typeof" => {
            let tag = values.first().map_or("undef", Value::runtime_type_tag);
            Ok(Value::PureText(tag.as_bytes().to_vec()))
        }
        "display" => {
            for value in &values {
                env.output.extend_from_slice(&value.display_bytes());
            }
            Ok(Value::Absent)
        }
        "make_list" => Ok(Value::Collection(
            values
                .into_iter()
                .enumerate()
                .map(|(idx, value)| (Key::Int(idx as i64), value))
                .collect(),
        )),
        "make_array" => {
            let mut collection = Collection::new();
            let mut pairs = values.into_iter();
            while let Some(key) = pairs.next() {
                let value = pairs.next().unwrap_or_default();
                collection.insert(Key::try_from(&key)?, value);
            }
            Ok(Value::Collection(collection))
        }
        _ => Err(ScriptError::new(
            ErrorCode::UnknownFunction,
            format!("unknown function `{name}`"),
        )),
    }
}

/// Parses a command-line binding: `null`, `int:<text>`, `str:<ascii>`,
/// `data:<bytes>`, or any literal expression such as `'foo'`.
pub fn parse_binding(text: &str) -> Result<Value, ScriptError> {
    if text == "null" {
        return Ok(Value::Absent);
    }
    let constructed = if let Some(rest) = text.strip_prefix("int:") {
        Value::construct(Kind::Integer, rest)
    } else if let Some(rest) = text.strip_prefix("str:") {
        Value::construct(Kind::PureText, rest)
    } else if let Some(rest) = text.strip_prefix("data:") {
        Value::construct(Kind::ImpureText, HostValue::from(rest))
    } else {
        return evaluate(text, &mut Environment::new());
    };
    Ok(constructed?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Value {
        evaluate(source, &mut Environment::new()).expect("evaluates")
    }

    #[test]
    fn oracle_script_runs_locally() {
        let mut env = Environment::with_bindings([Value::Integer(3), Value::Integer(1)]);
        evaluate(
            "display(x0 + x1);\ndisplay('\\n' + typeof(x0 + x1));",
            &mut env,
        )
        .expect("script runs");
        assert_eq!(env.output(), b"4\nint");
    }

    #[test]
    fn undefined_variables_are_absent() {
        assert_eq!(run("typeof(nothing)"), Value::PureText(b"undef".to_vec()));
        assert_eq!(run("nothing + 1"), Value::Integer(1));
    }

    #[test]
    fn indexing_a_variable_promotes_it() {
        let mut env = Environment::new();
        evaluate("x = NULL; x[22]", &mut env).expect("index");
        assert_eq!(env.get("x").runtime_type_tag(), "array");
        assert_eq!(
            evaluate("x[22] = 'v'; x[22]", &mut env),
            Ok(Value::PureText(b"v".to_vec()))
        );
    }

    #[test]
    fn increments_through_variables() {
        let mut env = Environment::new();
        assert_eq!(evaluate("n = 6; n++", &mut env), Ok(Value::Integer(6)));
        assert_eq!(env.get("n"), Value::Integer(7));
        assert_eq!(evaluate("--n", &mut env), Ok(Value::Integer(6)));
    }

    #[test]
    fn compound_assignment() {
        assert_eq!(run("n = 6; n += 34"), Value::Integer(40));
        assert_eq!(run("n = 6; n -= 34"), Value::Integer(-28));
        assert_eq!(run("n = 6; n *= 3"), Value::Integer(18));
        assert_eq!(run("n = 8; n /= 2"), Value::Integer(4));
        assert_eq!(run("n = 8; n %= 3"), Value::Integer(2));
        assert_eq!(run("n = 1; n <<= 3"), Value::Integer(8));
    }

    #[test]
    fn compound_assignment_rebinds() {
        let mut env = Environment::new();
        evaluate("n = 1", &mut env).expect("bind");
        let before = env.slot("n");
        evaluate("n += 1", &mut env).expect("add");
        assert_eq!(before.get(), Value::Integer(1));
        assert_eq!(env.get("n"), Value::Integer(2));
    }

    #[test]
    fn comparisons_and_matches_yield_integers() {
        assert_eq!(run("1 == '1'"), Value::Integer(1));
        assert_eq!(run("'bc' >< 'abcd'"), Value::Integer(1));
        assert_eq!(run("'bd' >!< 'abcd'"), Value::Integer(1));
        assert_eq!(run("'1' >< 123"), Value::Integer(1));
        assert_eq!(run("1 >< '123'"), Value::Integer(1));
        assert_eq!(run("0 || ''"), Value::Integer(0));
    }

    #[test]
    fn collections_from_builtins() {
        let value = run("make_array(1, 'a', 'k', 2)");
        assert_eq!(value.to_display_string(), "[ 1: 'a', k: 2 ]");
        assert_eq!(run("make_list(5, 6)[1]"), Value::Integer(6));
    }

    #[test]
    fn unsupported_operations_surface_as_script_errors() {
        let err = evaluate("make_list() + 1", &mut Environment::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedOperation);
        let err = evaluate("nope(1)", &mut Environment::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownFunction);
    }

    #[test]
    fn escaped_bytes_never_make_pure_text_non_ascii() {
        assert_eq!(run(r"'\xff'"), Value::ImpureText(vec![0xff]));
        assert_eq!(run("'\u{2764}'"), Value::ImpureText("\u{2764}".as_bytes().to_vec()));
        assert_eq!(run(r"'\x41'"), Value::PureText(b"A".to_vec()));
    }

    #[test]
    fn impure_text_literals_read_back_unchanged() {
        let shapes: [&[u8]; 8] = [
            b"foo",
            b"",
            b"say \"hi\"",
            b"\"",
            b"\xff",
            b"a\xff\xfe\"b",
            b"\x00\\n",
            "\u{2764}".as_bytes(),
        ];
        for bytes in shapes {
            let value = Value::ImpureText(bytes.to_vec());
            assert_eq!(run(&value.as_nasl()), value, "{}", value.as_nasl());
        }
    }

    #[test]
    fn extreme_integers_read_back_unchanged() {
        for n in [i64::MIN, i64::MIN + 1, -1, 0, i64::MAX] {
            let value = Value::Integer(n);
            assert_eq!(run(&value.as_nasl()), value, "{}", value.as_nasl());
        }
        let keyed: Collection = [
            (Key::Int(i64::MIN), Value::Integer(i64::MIN)),
            (Key::Text(vec![0xff]), Value::PureText(b"x".to_vec())),
        ]
        .into_iter()
        .collect();
        let value = Value::Collection(keyed);
        assert_eq!(run(&value.as_nasl()), value);
    }

    #[test]
    fn bindings() {
        assert_eq!(parse_binding("null"), Ok(Value::Absent));
        assert_eq!(parse_binding("int:0x10"), Ok(Value::Integer(16)));
        assert_eq!(parse_binding("str:foo"), Ok(Value::PureText(b"foo".to_vec())));
        assert_eq!(parse_binding("data:foo"), Ok(Value::ImpureText(b"foo".to_vec())));
        assert_eq!(parse_binding("-2"), Ok(Value::Integer(-2)));
        assert_eq!(parse_binding("'a'"), Ok(Value::PureText(b"a".to_vec())));
        assert_eq!(
            parse_binding("int:abc").map_err(|err| err.code),
            Err(ErrorCode::Coercion)
        );
    }
}
