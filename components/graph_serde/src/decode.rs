//! Record table to value graph

use std::rc::Rc;

use indexmap::IndexMap;
use object_model::{AttributeFlags, ExtObject, IdentityRegistry, TypeRef, Value};
use tracing::debug;

use crate::error::CodecError;
use crate::node::{Graph, Node, Record};

/// Rebuilds a value graph, resolving type names through a host lookup
///
/// Decoding runs in two passes over the record table: every container and
/// object is created empty and registered under its id, then each one is
/// filled. References in either direction resolve, and nothing recurses.
pub struct Decoder<'a> {
    registry: IdentityRegistry,
    lookup: &'a dyn Fn(&str) -> Option<TypeRef>,
}

impl<'a> Decoder<'a> {
    /// Create a decoder using `lookup` to find types by name
    pub fn new(lookup: &'a dyn Fn(&str) -> Option<TypeRef>) -> Self {
        Self {
            registry: IdentityRegistry::new(),
            lookup,
        }
    }

    /// Number of distinct reference values rebuilt by the last decode
    pub fn distinct_references(&self) -> usize {
        self.registry.len()
    }

    /// Decode one graph
    ///
    /// Each call decodes an independent graph with its own ids.
    pub fn decode(&mut self, graph: &Graph) -> Result<Value, CodecError> {
        self.registry = IdentityRegistry::new();
        let mut shells = Vec::with_capacity(graph.records.len());
        for (index, record) in graph.records.iter().enumerate() {
            let id = u32::try_from(index).map_err(|_| CodecError::IdsExhausted)?;
            let shell = self.shell(record)?;
            if !self.registry.bind(id, &shell) {
                return Err(CodecError::IdsExhausted);
            }
            shells.push(shell);
        }
        for (record, shell) in graph.records.iter().zip(&shells) {
            self.fill(record, shell)?;
        }
        self.leaf(&graph.root)
    }

    fn shell(&self, record: &Record) -> Result<Value, CodecError> {
        Ok(match record {
            Record::Array { items } => Value::array(Vec::with_capacity(items.len())),
            Record::Map { entries } => Value::map(IndexMap::with_capacity(entries.len())),
            Record::Object { type_name, .. } => {
                Value::Object(Rc::new(ExtObject::new(self.find_type(type_name)?)))
            }
        })
    }

    fn fill(&self, record: &Record, shell: &Value) -> Result<(), CodecError> {
        match (record, shell) {
            (Record::Array { items }, Value::Array(out)) => {
                let decoded = items
                    .iter()
                    .map(|item| self.leaf(item))
                    .collect::<Result<Vec<_>, _>>()?;
                out.borrow_mut().extend(decoded);
            }
            (Record::Map { entries }, Value::Map(out)) => {
                for entry in entries {
                    let decoded = self.leaf(&entry.value)?;
                    out.borrow_mut().insert(entry.key.clone(), decoded);
                }
            }
            (Record::Object { attributes, .. }, Value::Object(obj)) => {
                for field in attributes {
                    let flags = AttributeFlags {
                        private: field.private,
                        constant: field.constant,
                        init: false,
                    };
                    obj.define(&field.name, self.leaf(&field.value)?, flags);
                }
            }
            (_, other) => return Err(CodecError::Unsupported(other.kind_name())),
        }
        Ok(())
    }

    fn leaf(&self, node: &Node) -> Result<Value, CodecError> {
        match node {
            Node::Void => Ok(Value::Void),
            Node::Bool { value } => Ok(Value::Bool(*value)),
            Node::Number { value } => Ok(Value::Number(*value)),
            Node::String { value } => Ok(Value::string(value)),
            Node::Type { name } => Ok(Value::Type(self.find_type(name)?)),
            Node::Ref { id } => self
                .registry
                .get(*id)
                .cloned()
                .ok_or(CodecError::UnknownId(*id)),
        }
    }

    fn find_type(&self, name: &str) -> Result<TypeRef, CodecError> {
        (self.lookup)(name).ok_or_else(|| CodecError::UnknownType(name.to_string()))
    }
}

/// Decode a record table, resolving type names through `lookup`
pub fn decode<F>(graph: &Graph, lookup: F) -> Result<Value, CodecError>
where
    F: Fn(&str) -> Option<TypeRef>,
{
    let mut decoder = Decoder::new(&lookup);
    let value = decoder.decode(graph)?;
    debug!(
        references = decoder.distinct_references(),
        "decoded value graph"
    );
    Ok(value)
}

/// Decode a JSON string produced by [`crate::to_json`]
pub fn from_json<F>(text: &str, lookup: F) -> Result<Value, CodecError>
where
    F: Fn(&str) -> Option<TypeRef>,
{
    let graph: Graph = serde_json::from_str(text)?;
    decode(&graph, lookup)
}
