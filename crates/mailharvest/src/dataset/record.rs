use serde::{Deserialize, Serialize};

/// Column order of the dataset file.
pub const DATASET_HEADER: [&str; 5] = ["text", "label", "category", "from", "date"];

/// One labeled training example. Field order matches [`DATASET_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Subject followed by the normalized body.
    pub text: String,
    pub label: u8,
    pub category: String,
    #[serde(rename = "from")]
    pub sender: String,
    /// `YYYY-MM-DD`, or empty when the message had no usable Date header.
    pub date: String,
}
