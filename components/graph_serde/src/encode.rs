//! Value graph to record table

use std::collections::VecDeque;

use object_model::{own_attributes, IdentityRegistry, Value};
use tracing::debug;

use crate::error::CodecError;
use crate::node::{Entry, Field, Graph, Node, Record};

/// Walks a value graph, assigning ids to reference values on first sight
///
/// The walk is breadth-first over a work queue, so deep graphs do not
/// consume native stack. Ids are handed out in the order records are
/// emitted, which keeps every id equal to its record's position.
#[derive(Debug, Default)]
pub struct Encoder {
    registry: IdentityRegistry,
    records: Vec<Record>,
    pending: VecDeque<Value>,
}

impl Encoder {
    /// Create an encoder with an empty identity registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct reference values seen so far
    pub fn distinct_references(&self) -> usize {
        self.registry.len()
    }

    /// Records emitted so far, indexed by id
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Encode one value and everything reachable from it
    ///
    /// Containers come out as [`Node::Ref`]. Values already encoded by this
    /// encoder, including in earlier calls, keep their id and are not
    /// emitted again.
    pub fn encode(&mut self, value: &Value) -> Result<Node, CodecError> {
        let node = self.slot(value)?;
        while let Some(next) = self.pending.pop_front() {
            let record = self.record(&next)?;
            self.records.push(record);
        }
        Ok(node)
    }

    /// Finish with `root` as the top-level value
    pub fn into_graph(self, root: Node) -> Graph {
        Graph {
            root,
            records: self.records,
        }
    }

    /// Leaf form of a value, queueing containers not seen before
    fn slot(&mut self, value: &Value) -> Result<Node, CodecError> {
        match value {
            Value::Void => Ok(Node::Void),
            Value::Bool(b) => Ok(Node::Bool { value: *b }),
            Value::Number(n) if n.is_finite() => Ok(Node::Number { value: *n }),
            Value::Number(n) => Err(CodecError::NonFinite(*n)),
            Value::String(s) => Ok(Node::String {
                value: s.to_string(),
            }),
            Value::Type(t) => Ok(Node::Type {
                name: t.name().to_string(),
            }),
            Value::Array(_) | Value::Map(_) | Value::Object(_) => {
                let (id, new) = self
                    .registry
                    .register(value)
                    .ok_or(CodecError::IdsExhausted)?;
                if new {
                    self.pending.push_back(value.clone());
                }
                Ok(Node::Ref { id })
            }
            other => Err(CodecError::Unsupported(other.kind_name())),
        }
    }

    fn record(&mut self, value: &Value) -> Result<Record, CodecError> {
        match value {
            Value::Array(items) => {
                let snapshot = items.borrow().clone();
                let items = snapshot
                    .iter()
                    .map(|item| self.slot(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Record::Array { items })
            }
            Value::Map(entries) => {
                let snapshot = entries.borrow().clone();
                let mut out = Vec::with_capacity(snapshot.len());
                for (key, item) in &snapshot {
                    out.push(Entry {
                        key: key.clone(),
                        value: self.slot(item)?,
                    });
                }
                Ok(Record::Map { entries: out })
            }
            Value::Object(obj) => {
                let mut attributes = Vec::new();
                for (name, attr) in own_attributes(value).unwrap_or_default() {
                    attributes.push(Field {
                        name,
                        private: attr.is_private(),
                        constant: attr.is_constant(),
                        value: self.slot(&attr.value)?,
                    });
                }
                Ok(Record::Object {
                    type_name: obj.type_ref().name().to_string(),
                    attributes,
                })
            }
            other => Err(CodecError::Unsupported(other.kind_name())),
        }
    }
}

/// Encode a value graph to a record table
pub fn encode(value: &Value) -> Result<Graph, CodecError> {
    let mut encoder = Encoder::new();
    let root = encoder.encode(value)?;
    debug!(
        references = encoder.distinct_references(),
        "encoded value graph"
    );
    Ok(encoder.into_graph(root))
}

/// Encode a value graph to a JSON string
pub fn to_json(value: &Value) -> Result<String, CodecError> {
    Ok(serde_json::to_string(&encode(value)?)?)
}
