//! Codec errors

use thiserror::Error;

/// Failure to encode or decode an object graph
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value kind has no serialized form
    #[error("cannot serialize {0} values")]
    Unsupported(&'static str),

    /// NaN and infinities have no JSON representation
    #[error("number {0} has no JSON representation")]
    NonFinite(f64),

    /// A serialized object names a type the host does not know
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// A back-reference to an id that was never defined
    #[error("reference to undefined id {0}")]
    UnknownId(u32),

    /// The graph has more reference values than ids can number
    #[error("too many reference values for one graph")]
    IdsExhausted,

    /// The input is not a well-formed record table
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
