//! Remote mail store access.
//!
//! The pipeline talks to the store through the [`MailStore`] and
//! [`MailSession`] traits. [`ImapStore`] is the production implementation
//! on top of `async-imap`; errors carry an explicit [`ErrorKind`] so the
//! retry policy never has to inspect error text.

pub mod client;
pub mod error;
pub mod parser;
pub mod store;

pub use client::{ImapSession, ImapStore};
pub use error::{EmailError, ErrorKind};
pub use parser::parse_message;
pub use store::{FetchedMessage, MailSession, MailStore, Uid};
