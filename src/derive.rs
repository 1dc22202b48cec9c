//! Descriptor → schema derivation.
//!
//! One pure, deterministic recursive mapping from [`TypeDesc`] to [`Schema`].
//! Rules are tried in order; the first match wins. Descriptors the rules do
//! not cover (tuples, opaque values) go through the per-record fallback,
//! which by default derives the fully permissive `Any` schema and may
//! instead be configured to reject unknown descriptors outright.

use std::sync::Arc;

use crate::descriptor::{Primitive, TypeDesc};
use crate::error::ConstructionError;
use crate::schema::Schema;

/// Per-record hook for descriptors with no derivation rule.
/// `None` means "reject": derivation fails with a construction error.
pub type TypeFallback = Arc<dyn Fn(&TypeDesc) -> Option<Schema> + Send + Sync>;

/// The default fallback: accept anything.
pub(crate) fn permissive_fallback() -> TypeFallback {
    Arc::new(|_| Some(Schema::Any))
}

/// Fallback that rejects every descriptor it sees. Used to enforce a closed
/// type vocabulary per record.
pub(crate) fn rejecting_fallback() -> TypeFallback {
    Arc::new(|_| None)
}

/// Derive the validator for one type descriptor.
pub fn derive(desc: &TypeDesc, fallback: &TypeFallback) -> Result<Schema, ConstructionError> {
    match desc {
        TypeDesc::Literal(v) => Ok(Schema::Literal(v.clone())),

        TypeDesc::Primitive(p) => Ok(derive_primitive(*p)),

        // Composed by reference: the target's field table is shared, not
        // copied, so later edits are impossible and cycles stay finite.
        TypeDesc::Record(ty) => Ok(Schema::Record(ty.clone())),
        TypeDesc::RecordRef(handle) => Ok(Schema::RecordRef(handle.clone())),

        TypeDesc::List(elem) => Ok(Schema::ListOf(Box::new(derive(elem, fallback)?))),

        TypeDesc::Union(options) => {
            let arms = options
                .iter()
                .map(|o| derive(o, fallback))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Schema::OneOf(arms))
        }

        TypeDesc::Map { key, value } => Ok(Schema::TypedMap {
            keys: Box::new(derive(key, fallback)?),
            values: Box::new(derive(value, fallback)?),
        }),
        TypeDesc::UntypedMap => Ok(Schema::UntypedMap),

        TypeDesc::Range { lo, hi } => {
            let (lo, hi) = (*lo, *hi);
            Ok(Schema::all([
                Schema::Int,
                Schema::raw(
                    move |v| v.as_i64().is_some_and(|n| lo <= n && n <= hi),
                    format!("must be in range {lo}..{hi}"),
                ),
            ]))
        }

        // Tuples are never auto-derived: the source syntax for them is
        // ambiguous, so a tuple-typed field needs an explicit schema
        // override or takes whatever the fallback says (default: Any).
        TypeDesc::Tuple(_) | TypeDesc::Opaque(_) => match fallback(desc) {
            Some(schema) => Ok(schema),
            None => Err(ConstructionError::UnknownType {
                descriptor: desc.to_string(),
            }),
        },
    }
}

fn derive_primitive(p: Primitive) -> Schema {
    match p {
        Primitive::Any => Schema::Any,
        Primitive::Atom => Schema::Atom,
        Primitive::Bool => Schema::Bool,
        Primitive::Float => Schema::Float,
        Primitive::Int => Schema::Int,
        Primitive::String => Schema::Str,
        Primitive::Date => Schema::Date,
        Primitive::Number => Schema::oneof([Schema::Int, Schema::Float]),
        Primitive::NegInt => guarded_int(|n| n < 0, "must be <0"),
        Primitive::NonNegInt => guarded_int(|n| n >= 0, "must be >=0"),
        Primitive::PosInt => guarded_int(|n| n > 0, "must be >0"),
    }
}

fn guarded_int(test: impl Fn(i64) -> bool + Send + Sync + 'static, message: &str) -> Schema {
    Schema::all([
        Schema::Int,
        Schema::raw(
            move |v| match v.as_i64() {
                Some(n) => test(n),
                // Integers above i64::MAX are non-negative by construction.
                None => v.as_u64().is_some() && test(i64::MAX),
            },
            message,
        ),
    ])
}

// ------------------------------- Tests ------------------------------------ //
