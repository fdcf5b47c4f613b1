//! Built-in query functions.
//!
//! The JMESPath string, collection and type functions selectors use, plus
//! `glob`, `lower` and `split` for matching resource identifiers.

use std::cmp::Ordering;

use serde_json::{Map, Value};
use stratus_core::errors::SelectorError;

use super::ast::Ast;
use super::eval::{interpret, values_equal};

/// An evaluated function argument, or an unevaluated `&expr`.
pub(crate) enum Arg<'a> {
    Value(Value),
    Expref(&'a Ast),
}

impl Arg<'_> {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Value(v) => type_name(v),
            Self::Expref(_) => "expref",
        }
    }
}

pub(crate) fn call(name: &str, args: Vec<Arg<'_>>) -> Result<Value, SelectorError> {
    let f = Call { name, args };
    match name {
        "contains" => {
            f.arity(2)?;
            let needle = f.value(1)?;
            match f.value(0)? {
                Value::Array(items) => Ok(Value::Bool(items.iter().any(|i| values_equal(i, needle)))),
                Value::String(s) => match needle {
                    Value::String(n) => Ok(Value::Bool(s.contains(n.as_str()))),
                    _ => Ok(Value::Bool(false)),
                },
                _ => Err(f.invalid(0, "array or string")),
            }
        }
        "starts_with" => {
            f.arity(2)?;
            Ok(Value::Bool(f.string(0)?.starts_with(f.string(1)?)))
        }
        "ends_with" => {
            f.arity(2)?;
            Ok(Value::Bool(f.string(0)?.ends_with(f.string(1)?)))
        }
        "glob" => {
            f.arity(2)?;
            let pattern = glob::Pattern::new(f.string(1)?).map_err(|e| SelectorError::InvalidType {
                function: name.to_string(),
                expected: "a valid glob pattern".to_string(),
                actual: e.msg.to_string(),
            })?;
            Ok(Value::Bool(pattern.matches(f.string(0)?)))
        }
        "lower" => {
            f.arity(1)?;
            Ok(Value::String(f.string(0)?.to_lowercase()))
        }
        "split" => {
            f.arity(2)?;
            let parts = f
                .string(0)?
                .split(f.string(1)?)
                .map(|p| Value::String(p.to_string()))
                .collect();
            Ok(Value::Array(parts))
        }
        "join" => {
            f.arity(2)?;
            let glue = f.string(0)?;
            let parts = f
                .array(1)?
                .iter()
                .map(|v| v.as_str().ok_or_else(|| f.invalid(1, "array of strings")))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::String(parts.join(glue)))
        }
        "keys" => {
            f.arity(1)?;
            Ok(Value::Array(f.object(0)?.keys().cloned().map(Value::String).collect()))
        }
        "values" => {
            f.arity(1)?;
            Ok(Value::Array(f.object(0)?.values().cloned().collect()))
        }
        "length" => {
            f.arity(1)?;
            let len = match f.value(0)? {
                Value::String(s) => s.chars().count(),
                Value::Array(a) => a.len(),
                Value::Object(o) => o.len(),
                _ => return Err(f.invalid(0, "string, array or object")),
            };
            Ok(Value::from(len))
        }
        "not_null" => {
            if f.args.is_empty() {
                return Err(f.arity_error("at least 1"));
            }
            for arg in &f.args {
                if let Arg::Value(v) = arg {
                    if !v.is_null() {
                        return Ok(v.clone());
                    }
                }
            }
            Ok(Value::Null)
        }
        "sort" => {
            f.arity(1)?;
            let items = f.array(0)?;
            let keys: Vec<&Value> = items.iter().collect();
            sorted(&f, 0, &keys, items)
        }
        "sort_by" => {
            f.arity(2)?;
            let items = f.array(0)?;
            let expr = f.expref(1)?;
            let keys = items
                .iter()
                .map(|item| interpret(expr, item))
                .collect::<Result<Vec<_>, _>>()?;
            let key_refs: Vec<&Value> = keys.iter().collect();
            sorted(&f, 1, &key_refs, items)
        }
        "to_string" => {
            f.arity(1)?;
            Ok(match f.value(0)? {
                Value::String(s) => Value::String(s.clone()),
                other => Value::String(other.to_string()),
            })
        }
        "type" => {
            f.arity(1)?;
            Ok(Value::String(f.args[0].type_name().to_string()))
        }
        _ => Err(SelectorError::UnknownFunction {
            name: name.to_string(),
        }),
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

struct Call<'n, 'a> {
    name: &'n str,
    args: Vec<Arg<'a>>,
}

impl<'a> Call<'_, 'a> {
    fn arity(&self, expected: usize) -> Result<(), SelectorError> {
        if self.args.len() == expected {
            Ok(())
        } else {
            Err(self.arity_error(&expected.to_string()))
        }
    }

    fn arity_error(&self, expected: &str) -> SelectorError {
        SelectorError::InvalidArity {
            function: self.name.to_string(),
            expected: expected.to_string(),
            actual: self.args.len(),
        }
    }

    fn invalid(&self, index: usize, expected: &str) -> SelectorError {
        SelectorError::InvalidType {
            function: self.name.to_string(),
            expected: expected.to_string(),
            actual: self
                .args
                .get(index)
                .map(Arg::type_name)
                .unwrap_or("nothing")
                .to_string(),
        }
    }

    fn value(&self, index: usize) -> Result<&Value, SelectorError> {
        match self.args.get(index) {
            Some(Arg::Value(v)) => Ok(v),
            _ => Err(self.invalid(index, "value")),
        }
    }

    fn expref(&self, index: usize) -> Result<&'a Ast, SelectorError> {
        match self.args.get(index) {
            Some(Arg::Expref(ast)) => Ok(*ast),
            _ => Err(self.invalid(index, "expref")),
        }
    }

    fn string(&self, index: usize) -> Result<&str, SelectorError> {
        self.value(index)?
            .as_str()
            .ok_or_else(|| self.invalid(index, "string"))
    }

    fn array(&self, index: usize) -> Result<&Vec<Value>, SelectorError> {
        self.value(index)?
            .as_array()
            .ok_or_else(|| self.invalid(index, "array"))
    }

    fn object(&self, index: usize) -> Result<&Map<String, Value>, SelectorError> {
        self.value(index)?
            .as_object()
            .ok_or_else(|| self.invalid(index, "object"))
    }
}

/// Order keys that are all numbers or all strings.
fn key_order(f: &Call<'_, '_>, arg: usize, keys: &[&Value]) -> Result<(), SelectorError> {
    let all_numbers = keys.iter().all(|k| k.is_number());
    let all_strings = keys.iter().all(|k| k.is_string());
    if all_numbers || all_strings {
        Ok(())
    } else {
        Err(f.invalid(arg, "array of numbers or array of strings"))
    }
}

fn cmp_keys(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y))
            .unwrap_or(Ordering::Equal),
    }
}

fn sorted(
    f: &Call<'_, '_>,
    arg: usize,
    keys: &[&Value],
    items: &[Value],
) -> Result<Value, SelectorError> {
    key_order(f, arg, keys)?;
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| cmp_keys(keys[a], keys[b]));
    Ok(Value::Array(order.into_iter().map(|i| items[i].clone()).collect()))
}
