//! Descriptor-driven JSON validation and transformation.
//!
//! A [`Registry`] holds named [`Descriptor`]s. [`Registry::decode`] checks an
//! untyped JSON value against one of them and produces a [`Typed`] value with
//! internal key names; [`Registry::encode`] goes the other way. Failures are
//! [`ValidationError`]s naming the key, the enclosing descriptor, what was
//! expected and what was found.
//!
//! ```
//! use json_cast::{Descriptor, Field, Registry};
//! use serde_json::json;
//!
//! let registry = Registry::builder()
//!     .with("Point", Descriptor::object(
//!         vec![
//!             Field::new("x-pos", "x", Descriptor::NUMBER),
//!             Field::new("y-pos", "y", Descriptor::optional(Descriptor::NUMBER)),
//!         ],
//!         Descriptor::Never,
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let typed = registry.decode(&json!({ "x-pos": 1 }), "Point").unwrap();
//! assert_eq!(typed.clone().into_json(), json!({ "x": 1 }));
//! assert_eq!(registry.encode(&typed, "Point").unwrap(), json!({ "x-pos": 1 }));
//!
//! let err = registry.decode(&json!({ "x-pos": "1" }), "Point").unwrap_err();
//! assert_eq!(err.to_string(), r#"Invalid value for key "x-pos" on Point. Expected number but got "1""#);
//! ```
pub mod descriptor;
pub mod diagnostics;
pub mod error;
pub mod jq_exec;
pub mod path_de;
pub mod registry;
pub mod theme;
pub mod transform;
pub mod typed;

pub use descriptor::{Descriptor, Field, ObjectDescriptor, Primitive};
pub use diagnostics::ValidationError;
pub use error::{Error, SchemaError};
pub use registry::Registry;
pub use transform::Direction;
pub use typed::Typed;
