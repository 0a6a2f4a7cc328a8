//! On-disk state of a harvest: the CSV dataset and the UID checkpoint file.

pub mod checkpoint;
pub mod dedupe;
pub mod error;
pub mod record;
pub mod sink;

pub use checkpoint::CheckpointStore;
pub use dedupe::dedupe;
pub use error::DatasetError;
pub use record::{MessageRecord, DATASET_HEADER};
pub use sink::BatchSink;
