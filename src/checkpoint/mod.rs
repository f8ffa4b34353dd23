//! Model persistence: the JSON model document and the stage/final file layout.

mod manager;
mod model_file;

pub use manager::CheckpointManager;
pub use model_file::ModelDocument;
