//! The matching engine: walk a schema against a JSON value.
//!
//! `unify` either produces the accepted value (records come back keyed by
//! internal field names, with defaults filled in) or an error value shaped
//! like the offending part of the input: a message string for scalar
//! mismatches, an object for map/record mismatches, an array with `null`
//! padding at passing positions for sequences.
//!
//! The engine is pure with respect to the schema: schemas are frozen before
//! first use and shared read-only, so concurrent calls need no locking.

use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use serde_json::{Map, Value};

use crate::record::RecordType;
use crate::schema::Schema;

pub fn unify(schema: &Schema, data: &Value) -> Result<Value, Value> {
    match schema {
        Schema::Any => Ok(data.clone()),

        Schema::Atom => match data {
            Value::String(_) => Ok(data.clone()),
            _ => Err(message("expected an atom")),
        },
        Schema::Bool => match data {
            Value::Bool(_) => Ok(data.clone()),
            _ => Err(message("expected a boolean")),
        },
        Schema::Int => match data {
            Value::Number(n) if n.as_i64().is_some() || n.as_u64().is_some() => Ok(data.clone()),
            _ => Err(message("expected an integer")),
        },
        Schema::Float => match data {
            Value::Number(n) if n.is_f64() => Ok(data.clone()),
            _ => Err(message("expected a float")),
        },
        Schema::Str => match data {
            Value::String(_) => Ok(data.clone()),
            _ => Err(message("expected a string")),
        },
        Schema::Date => match data {
            Value::String(s) if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() => {
                Ok(data.clone())
            }
            _ => Err(message("expected a date")),
        },

        Schema::Literal(expected) => {
            if literal_eq(expected, data) {
                Ok(data.clone())
            } else {
                Err(message(format!("must equal {expected}")))
            }
        }

        Schema::ListOf(elem) => {
            let Value::Array(items) = data else {
                return Err(message("expected a list"));
            };
            unify_positions(items.iter().map(|v| unify(elem, v)))
        }

        Schema::Tuple(elems) => {
            let arity_err = || message(format!("expected a tuple of {} elements", elems.len()));
            let Value::Array(items) = data else {
                return Err(arity_err());
            };
            if items.len() != elems.len() {
                return Err(arity_err());
            }
            unify_positions(elems.iter().zip(items).map(|(s, v)| unify(s, v)))
        }

        Schema::TypedMap { keys, values } => {
            let Value::Object(map) = data else {
                return Err(message("expected a map"));
            };
            let mut out = Map::new();
            let mut errors = Map::new();
            for (k, v) in map {
                if let Err(e) = unify(keys, &Value::String(k.clone())) {
                    errors.insert(k.clone(), message(format!("invalid key: {}", error_text(&e))));
                    continue;
                }
                match unify(values, v) {
                    Ok(accepted) => {
                        out.insert(k.clone(), accepted);
                    }
                    Err(e) => {
                        errors.insert(k.clone(), e);
                    }
                }
            }
            if errors.is_empty() {
                Ok(Value::Object(out))
            } else {
                Err(Value::Object(errors))
            }
        }
        Schema::UntypedMap => match data {
            Value::Object(_) => Ok(data.clone()),
            _ => Err(message("expected a map")),
        },

        Schema::OneOf(arms) => {
            for arm in arms {
                if let Ok(accepted) = unify(arm, data) {
                    return Ok(accepted);
                }
            }
            Err(message(expected_oneof(arms)))
        }

        Schema::Nullable(inner) => match data {
            Value::Null => Ok(Value::Null),
            _ => unify(inner, data),
        },

        Schema::All(parts) => {
            let mut accepted = data.clone();
            for part in parts {
                accepted = unify(part, data)?;
            }
            Ok(accepted)
        }

        Schema::Raw { test, message: msg } => {
            if test(data) {
                Ok(data.clone())
            } else {
                Err(message(msg.as_str()))
            }
        }

        Schema::Record(ty) => unify_record(ty, data).map(Value::Object),

        Schema::RecordRef(handle) => match handle.get() {
            Some(ty) => unify_record(ty, data).map(Value::Object),
            None => Err(message(format!(
                "unresolved record reference {}",
                handle.name()
            ))),
        },
    }
}

/// Walk one record's frozen field table against an input map.
///
/// Output is keyed by internal field names; absent optional keys take their
/// default (or `null` when nullable); unknown input keys are ignored.
/// Errors are keyed by external keys, mirroring the input.
pub(crate) fn unify_record(ty: &RecordType, data: &Value) -> Result<Map<String, Value>, Value> {
    let Value::Object(map) = data else {
        return Err(message("expected a map"));
    };
    let mut out = Map::new();
    let mut errors = Map::new();
    for field in ty.fields().values() {
        match map.get(&field.json_key) {
            None if field.required => {
                errors.insert(field.json_key.clone(), message("is missing"));
            }
            None => {
                let filled = field.default.clone().unwrap_or(Value::Null);
                out.insert(field.name.clone(), filled);
            }
            Some(v) => match unify(&field.schema, v) {
                Ok(accepted) => {
                    out.insert(field.name.clone(), accepted);
                }
                Err(e) => {
                    errors.insert(field.json_key.clone(), e);
                }
            },
        }
    }
    if errors.is_empty() {
        Ok(out)
    } else {
        Err(Value::Object(errors))
    }
}

fn message(text: impl Into<String>) -> Value {
    Value::String(text.into())
}

fn error_text(e: &Value) -> String {
    match e {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Per-position results → padded error array (null where the element passed).
fn unify_positions(results: impl Iterator<Item = Result<Value, Value>>) -> Result<Value, Value> {
    let mut out = Vec::new();
    let mut errors = Vec::new();
    let mut failed = false;
    for r in results {
        match r {
            Ok(v) => {
                out.push(v);
                errors.push(Value::Null);
            }
            Err(e) => {
                failed = true;
                errors.push(e);
            }
        }
    }
    if failed {
        Err(Value::Array(errors))
    } else {
        Ok(Value::Array(out))
    }
}

fn expected_oneof(arms: &[Schema]) -> String {
    let described: Vec<String> = arms.iter().map(Schema::describe).collect();
    match described.split_last() {
        None => "expected nothing".to_owned(),
        Some((only, [])) => format!("expected {only}"),
        Some((last, init)) => format!("expected either {} or {last}", init.join(", ")),
    }
}

/// Literal equality; numbers compare numerically so `1` matches `1.0`.
/// Integer representations compare exactly — going through f64 would round
/// values past 2^53.
fn literal_eq(expected: &Value, data: &Value) -> bool {
    match (expected, data) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
                x == y
            } else if a.is_f64() || b.is_f64() {
                match (a.as_f64(), b.as_f64()) {
                    (Some(x), Some(y)) => OrderedFloat(x) == OrderedFloat(y),
                    _ => a == b,
                }
            } else {
                // Mixed-sign integers with no shared representation.
                false
            }
        }
        _ => expected == data,
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_mismatch_messages() {
        assert_eq!(
            unify(&Schema::Int, &json!("x")).unwrap_err(),
            json!("expected an integer")
        );
        assert_eq!(
            unify(&Schema::Float, &json!(1)).unwrap_err(),
            json!("expected a float")
        );
        assert_eq!(
            unify(&Schema::Bool, &json!(0)).unwrap_err(),
            json!("expected a boolean")
        );
        assert_eq!(
            unify(&Schema::Str, &json!(null)).unwrap_err(),
            json!("expected a string")
        );
        assert_eq!(
            unify(&Schema::Atom, &json!(1)).unwrap_err(),
            json!("expected an atom")
        );
    }

    #[test]
    fn int_accepts_the_full_unsigned_range() {
        assert!(unify(&Schema::Int, &json!(u64::MAX)).is_ok());
        assert!(unify(&Schema::Int, &json!(i64::MIN)).is_ok());
        assert!(unify(&Schema::Int, &json!(1.5)).is_err());
    }

    #[test]
    fn dates_parse_iso_calendar_strings() {
        assert_eq!(
            unify(&Schema::Date, &json!("2026-08-23")).unwrap(),
            json!("2026-08-23")
        );
        assert_eq!(
            unify(&Schema::Date, &json!("not a date")).unwrap_err(),
            json!("expected a date")
        );
        assert_eq!(
            unify(&Schema::Date, &json!("2026-02-30")).unwrap_err(),
            json!("expected a date")
        );
    }

    #[test]
    fn literal_numbers_compare_numerically() {
        let lit = Schema::literal(1.0);
        assert!(unify(&lit, &json!(1)).is_ok());
        assert_eq!(
            unify(&lit, &json!(2)).unwrap_err(),
            json!("must equal 1.0")
        );
        assert!(unify(&Schema::literal(Value::Null), &json!(null)).is_ok());
        assert!(unify(&Schema::literal("on"), &json!("on")).is_ok());
    }

    #[test]
    fn literal_large_integers_compare_exactly() {
        // Past 2^53 adjacent integers collapse to the same f64.
        let lit = Schema::literal(u64::MAX);
        assert!(unify(&lit, &json!(u64::MAX)).is_ok());
        assert!(unify(&lit, &json!(u64::MAX - 1)).is_err());

        let lit = Schema::literal(i64::MIN);
        assert!(unify(&lit, &json!(i64::MIN)).is_ok());
        assert!(unify(&lit, &json!(i64::MIN + 1)).is_err());

        // Opposite signs never match, even without a shared representation.
        assert!(unify(&Schema::literal(-1), &json!(u64::MAX)).is_err());
        // Small integers still match their float spelling.
        assert!(unify(&Schema::literal(2.0), &json!(2)).is_ok());
    }

    #[test]
    fn list_errors_are_padded_arrays() {
        let s = Schema::list_of(Schema::Int);
        assert_eq!(unify(&s, &json!([1, 2])).unwrap(), json!([1, 2]));
        assert_eq!(
            unify(&s, &json!([1, "x", 3])).unwrap_err(),
            json!([null, "expected an integer", null])
        );
        assert_eq!(unify(&s, &json!(7)).unwrap_err(), json!("expected a list"));
    }

    #[test]
    fn tuples_check_arity_and_positions() {
        let s = Schema::tuple([Schema::Int, Schema::Str]);
        assert_eq!(unify(&s, &json!([1, "a"])).unwrap(), json!([1, "a"]));
        assert_eq!(
            unify(&s, &json!([1])).unwrap_err(),
            json!("expected a tuple of 2 elements")
        );
        assert_eq!(
            unify(&s, &json!([1, 2])).unwrap_err(),
            json!([null, "expected a string"])
        );
    }

    #[test]
    fn typed_maps_validate_keys_and_values() {
        let s = Schema::typed_map(Schema::Str, Schema::Int);
        assert_eq!(
            unify(&s, &json!({"a": 1, "b": 2})).unwrap(),
            json!({"a": 1, "b": 2})
        );
        assert_eq!(
            unify(&s, &json!({"a": "x"})).unwrap_err(),
            json!({"a": "expected an integer"})
        );
        assert_eq!(unify(&s, &json!([])).unwrap_err(), json!("expected a map"));
    }

    #[test]
    fn oneof_takes_first_accepting_arm_and_aggregates_failures() {
        let s = Schema::oneof([Schema::Int, Schema::Float, Schema::Str]);
        assert_eq!(unify(&s, &json!(1.5)).unwrap(), json!(1.5));
        assert_eq!(
            unify(&s, &json!(true)).unwrap_err(),
            json!("expected either an integer, a float or a string")
        );
    }

    #[test]
    fn nullable_accepts_null_and_delegates() {
        let s = Schema::nullable(Schema::Int);
        assert_eq!(unify(&s, &json!(null)).unwrap(), json!(null));
        assert_eq!(unify(&s, &json!(3)).unwrap(), json!(3));
        assert_eq!(
            unify(&s, &json!("x")).unwrap_err(),
            json!("expected an integer")
        );
    }

    #[test]
    fn all_reports_first_failing_conjunct() {
        let s = Schema::all([
            Schema::Int,
            Schema::raw(|v| v.as_i64().is_some_and(|n| n % 2 == 0), "must be even"),
        ]);
        assert!(unify(&s, &json!(4)).is_ok());
        assert_eq!(unify(&s, &json!(3)).unwrap_err(), json!("must be even"));
        assert_eq!(
            unify(&s, &json!("x")).unwrap_err(),
            json!("expected an integer")
        );
    }
}
