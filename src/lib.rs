pub mod checkpoint;
pub mod data;
pub mod error;
pub mod mlp;
pub mod training;

pub mod prelude {
    pub use crate::checkpoint::{self, Snapshot};
    pub use crate::data::{SyntheticDataset, VectorBatch, VectorBatcher, VectorItem};
    pub use crate::error::MlpError;
    pub use crate::mlp::{Mlp, MlpConfig};
    pub use crate::training::{EvalOutcome, TrainOutcome, TrainingConfig, evaluate, train};
}
