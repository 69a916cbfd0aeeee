use thiserror::Error;

/// Errors surfaced by training and checkpointing.
///
/// Shape problems are fatal by design: a checkpoint either matches the
/// architecture it describes exactly, or loading fails as a whole.
#[derive(Debug, Error)]
pub enum MlpError {
    /// A persisted parameter's shape disagrees with the architecture
    /// reconstructed from the checkpoint descriptor.
    #[error(
        "shape mismatch for parameter `{name}`: checkpoint stores {stored:?}, model expects {expected:?}"
    )]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        stored: Vec<usize>,
    },

    /// A batch's feature dimensionality disagrees with the model's input size.
    #[error("input batch has {found} features, model expects {expected}")]
    InputShape { expected: usize, found: usize },

    /// The checkpoint lacks a parameter the architecture requires.
    #[error("checkpoint is missing parameter `{name}`")]
    MissingParameter { name: String },

    /// The checkpoint carries a parameter the architecture does not declare.
    #[error("checkpoint contains unknown parameter `{name}`")]
    UnknownParameter { name: String },

    /// Parameter values could not be read out of (or into) a tensor.
    #[error("tensor data error: {0}")]
    TensorData(String),

    #[error("checkpoint io failed")]
    Io(#[from] std::io::Error),

    #[error("checkpoint encoding failed")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("checkpoint decoding failed")]
    Decode(#[from] rmp_serde::decode::Error),
}
