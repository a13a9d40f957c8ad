//! JSON codec for script object graphs
//!
//! Arrays, mappings and extensible objects are written once each into a flat
//! record table and referenced by id everywhere they appear, so shared
//! substructure and cycles survive a round trip and deep graphs stay shallow
//! in JSON. Types are written by name
//! and resolved through a host-supplied lookup when decoding. Functions,
//! traits and host-wrapped values have no serialized form.
//!
//! # Example
//!
//! ```
//! use graph_serde::{from_json, to_json};
//! use object_model::{BuiltinTypes, Value};
//!
//! let builtins = BuiltinTypes::new();
//! let shared = Value::array(vec![Value::Number(1.0)]);
//! let pair = Value::array(vec![shared.clone(), shared]);
//!
//! let json = to_json(&pair).unwrap();
//! let back = from_json(&json, |name| builtins.by_name(name)).unwrap();
//! if let Value::Array(items) = &back {
//!     let items = items.borrow();
//!     assert!(items[0].identical(&items[1]));
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decode;
pub mod encode;
pub mod error;
pub mod node;

pub use decode::{decode, from_json, Decoder};
pub use encode::{encode, to_json, Encoder};
pub use error::CodecError;
pub use node::{Entry, Field, Graph, Node, Record};
