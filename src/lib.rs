//! Declarative record types over loosely-typed JSON.
//!
//! Declare a record once as a list of named, typed fields and get both
//! directions for free: `parse` validates a `serde_json::Value` against the
//! derived schema and produces an immutable record instance, and `dump`
//! serializes an instance back to an external-keyed map.
//!
//! Pipeline, leaves first:
//! - [`TypeDesc`]: the declarative type vocabulary for a field.
//! - [`derive::derive`]: recursive mapping from a descriptor to a [`Schema`].
//! - [`Field`]: one declaration; resolution decides requiredness, external
//!   key, default, and the effective (possibly nullable-wrapped) schema.
//! - [`RecordType`]: the frozen, ordered field table; `parse` / `parse_list`
//!   / `dump` run against it with no locking from any number of threads.
//!
//! Record types are meant to be built once, at startup, and shared:
//!
//! ```
//! use once_cell::sync::Lazy;
//! use serde_json::json;
//! use json_rec::{Field, RecordType, TypeDesc};
//!
//! static USER: Lazy<RecordType> = Lazy::new(|| {
//!     RecordType::builder("User")
//!         .field(Field::new("user_name", TypeDesc::string()))
//!         .field(Field::new("age", TypeDesc::non_neg_int()).nullable())
//!         .build()
//!         .expect("User record definition")
//! });
//!
//! let user = USER.parse(&json!({"userName": "Ada", "age": 36})).unwrap();
//! assert_eq!(user.get("user_name"), Some(&json!("Ada")));
//!
//! // Errors mirror the shape of the input.
//! let err = USER.parse(&json!({"age": -1})).unwrap_err();
//! assert_eq!(
//!     err.errors,
//!     json!({"userName": "is missing", "age": "must be >=0"})
//! );
//!
//! // dump reverses the key mapping and omits nil fields by default.
//! let dumped = serde_json::to_value(user.dump()).unwrap();
//! assert_eq!(dumped, json!({"userName": "Ada", "age": 36}));
//! ```

pub mod derive;
pub mod descriptor;
pub mod error;
pub mod field;
pub mod record;
pub mod schema;
pub mod unify;

pub use descriptor::{Primitive, TypeDesc};
pub use error::{ConstructionError, ParseError};
pub use field::{lower_camel, Field, KeyTransform, ResolvedField};
pub use record::{Record, RecordBuilder, RecordHandle, RecordType};
pub use schema::{Predicate, Schema};
pub use unify::unify;
