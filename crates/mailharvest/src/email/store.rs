//! Remote mail store boundary used by the ingestion pipeline.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::config::Category;

use super::error::Result;

/// Identifier the store assigns to a message within a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid(pub u32);

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Uid {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(Uid)
    }
}

/// A message as returned by the store, before normalization.
#[derive(Debug, Clone, Default)]
pub struct FetchedMessage {
    pub uid: Option<Uid>,
    pub subject: String,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub sender: String,
    /// Calendar date (`YYYY-MM-DD`) of the Date header, if present.
    pub date: Option<String>,
}

impl FetchedMessage {
    /// Best available body: plain text, then HTML, then empty. A blank
    /// plain-text part counts as missing.
    pub fn body(&self) -> &str {
        self.text_body
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .or(self.html_body.as_deref())
            .unwrap_or("")
    }
}

/// Opens sessions against a remote mail store.
#[async_trait]
pub trait MailStore: Send + Sync {
    type Session: MailSession;

    /// Connects, authenticates and opens the configured folder.
    async fn connect(&self) -> Result<Self::Session>;
}

/// A live, authenticated session.
#[async_trait]
pub trait MailSession: Send {
    /// Lists the UIDs in a category, in ascending UID order.
    async fn list_uids(&mut self, category: Category) -> Result<Vec<Uid>>;

    /// Fetches one message. `Ok(None)` means the UID no longer resolves.
    async fn fetch_message(&mut self, uid: Uid) -> Result<Option<FetchedMessage>>;

    /// Closes the session.
    async fn logout(&mut self) -> Result<()>;
}
