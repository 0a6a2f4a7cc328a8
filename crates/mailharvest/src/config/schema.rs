use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::email::Uid;

/// Top-level harvester configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestConfig {
    pub version: String,
    #[serde(default)]
    pub imap: ImapSettings,
    #[serde(default)]
    pub dataset: DatasetSettings,
    #[serde(default)]
    pub ingest: IngestSettings,
    #[serde(default = "default_categories")]
    pub categories: Vec<CategorySpec>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            imap: ImapSettings::default(),
            dataset: DatasetSettings::default(),
            ingest: IngestSettings::default(),
            categories: default_categories(),
        }
    }
}

/// Gmail inbox partitions harvested for training data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Primary,
    Updates,
    Promotions,
    Social,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Primary => "primary",
            Category::Updates => "updates",
            Category::Promotions => "promotions",
            Category::Social => "social",
        }
    }

    /// Ground-truth label used when no explicit mapping is configured.
    pub fn default_label(&self) -> u8 {
        match self {
            Category::Primary | Category::Updates => 0,
            Category::Promotions | Category::Social => 1,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A category paired with the label its messages receive in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub category: Category,
    pub label: u8,
}

impl CategorySpec {
    pub fn new(category: Category, label: u8) -> Self {
        Self { category, label }
    }
}

fn default_categories() -> Vec<CategorySpec> {
    [
        Category::Primary,
        Category::Updates,
        Category::Promotions,
        Category::Social,
    ]
    .into_iter()
    .map(|c| CategorySpec::new(c, c.default_label()))
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImapSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub use_tls: bool,
    #[serde(default)]
    pub username: String,
    /// Consulted when `username` is empty.
    #[serde(default = "default_username_env_var")]
    pub username_env_var: Option<String>,
    /// Plain password in the config file. Prefer the file or env var sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_insecure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_file: Option<String>,
    #[serde(default = "default_password_env_var")]
    pub password_env_var: Option<String>,
    #[serde(default = "default_folder")]
    pub folder: String,
    /// UID SEARCH criteria; `{category}` is replaced with the category name.
    #[serde(default = "default_category_query")]
    pub category_query: String,
}

fn default_host() -> String {
    "imap.gmail.com".to_string()
}

fn default_port() -> u16 {
    993
}

fn default_true() -> bool {
    true
}

fn default_username_env_var() -> Option<String> {
    Some("GMAIL_USER".to_string())
}

fn default_password_env_var() -> Option<String> {
    Some("GMAIL_APP_PASS".to_string())
}

fn default_folder() -> String {
    "INBOX".to_string()
}

fn default_category_query() -> String {
    "X-GM-RAW \"category:{category}\"".to_string()
}

impl Default for ImapSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            use_tls: true,
            username: String::new(),
            username_env_var: default_username_env_var(),
            password_insecure: None,
            password_file: None,
            password_env_var: default_password_env_var(),
            folder: default_folder(),
            category_query: default_category_query(),
        }
    }
}

impl ImapSettings {
    /// Builds the UID SEARCH criteria for one category.
    pub fn query_for(&self, category: Category) -> String {
        self.category_query.replace("{category}", category.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSettings {
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("full_email_dataset.csv")
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("processed_uids.txt")
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            checkpoint_path: default_checkpoint_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
    #[serde(default = "default_min_body_length")]
    pub min_body_length: usize,
    /// Upper bound on session attempts per category. `None` retries forever.
    #[serde(default)]
    pub max_connect_attempts: Option<u32>,
    #[serde(default)]
    pub processing_order: ProcessingOrder,
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
}

fn default_batch_size() -> usize {
    50
}

fn default_fetch_delay_ms() -> u64 {
    100
}

fn default_retry_backoff_secs() -> u64 {
    10
}

fn default_min_body_length() -> usize {
    30
}

fn default_operation_timeout_secs() -> u64 {
    60
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            fetch_delay_ms: default_fetch_delay_ms(),
            retry_backoff_secs: default_retry_backoff_secs(),
            min_body_length: default_min_body_length(),
            max_connect_attempts: None,
            processing_order: ProcessingOrder::default(),
            operation_timeout_secs: default_operation_timeout_secs(),
        }
    }
}

/// Order in which a category's UIDs are walked.
///
/// Stores return listings in ascending UID order, which for an IMAP mailbox
/// is arrival order. The default walks the newest messages first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProcessingOrder {
    OldestFirst,
    #[default]
    NewestFirst,
}

impl ProcessingOrder {
    /// Reorders an ascending store listing according to the policy.
    pub fn apply(&self, mut ascending: Vec<Uid>) -> Vec<Uid> {
        if *self == ProcessingOrder::NewestFirst {
            ascending.reverse();
        }
        ascending
    }
}
