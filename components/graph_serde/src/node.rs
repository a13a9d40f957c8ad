//! Serialized form of a value graph
//!
//! A graph is a flat table: every array, mapping and object becomes one
//! [`Record`] whose id is its position in the table, and every slot inside a
//! record holds a leaf [`Node`]. Containers are referenced by id from those
//! slots, so shared and cyclic structure survives a round trip and the JSON
//! nesting depth does not grow with the depth of the value graph.

use serde::{Deserialize, Serialize};

/// A complete serialized graph
///
/// ```
/// use graph_serde::{Graph, Node, Record};
///
/// let graph = Graph {
///     root: Node::Ref { id: 0 },
///     records: vec![Record::Array { items: vec![Node::Number { value: 1.0 }, Node::Ref { id: 0 }] }],
/// };
/// let json = serde_json::to_string(&graph).unwrap();
/// assert_eq!(
///     json,
///     r#"{"root":{"type":"ref","id":0},"records":[{"type":"array","items":[{"type":"number","value":1.0},{"type":"ref","id":0}]}]}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    /// The top-level value
    pub root: Node,
    /// Containers and objects, indexed by id
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<Record>,
}

/// A leaf slot: a primitive, a type name or a reference to a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// The void value
    Void,
    /// Boolean
    Bool {
        /// Payload
        value: bool,
    },
    /// Finite number
    Number {
        /// Payload
        value: f64,
    },
    /// String
    String {
        /// Payload
        value: String,
    },
    /// A type, resolved by name when decoding
    Type {
        /// Type name
        name: String,
    },
    /// Reference to the record with the given id
    Ref {
        /// Position of the record in [`Graph::records`]
        id: u32,
    },
}

/// Contents of one array, mapping or object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    /// Array elements in order
    Array {
        /// Elements
        items: Vec<Node>,
    },
    /// Mapping entries in insertion order
    Map {
        /// Entries
        entries: Vec<Entry>,
    },
    /// Extensible object
    Object {
        /// Name of the object's type
        type_name: String,
        /// Own attributes in definition order
        attributes: Vec<Field>,
    },
}

/// Mapping entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Key
    pub key: String,
    /// Value
    pub value: Node,
}

/// Own attribute of an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Attribute name
    pub name: String,
    /// Private flag
    #[serde(default, skip_serializing_if = "is_false")]
    pub private: bool,
    /// Constant flag
    #[serde(default, skip_serializing_if = "is_false")]
    pub constant: bool,
    /// Attribute value
    pub value: Node,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}
