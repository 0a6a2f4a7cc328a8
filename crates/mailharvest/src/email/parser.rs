//! RFC 5322 message parsing into [`FetchedMessage`].

use chrono::NaiveDate;
use log::debug;
use mail_parser::{Message, MessageParser, PartType};

use super::error::{EmailError, Result};
use super::store::{FetchedMessage, Uid};

/// Parses a raw message fetched with `BODY.PEEK[]`.
pub fn parse_message(uid: Uid, raw_email: &[u8]) -> Result<FetchedMessage> {
    let message = MessageParser::default()
        .parse(raw_email)
        .ok_or_else(|| EmailError::ParseError(format!("UID {} is not a valid message", uid)))?;

    let fetched = FetchedMessage {
        uid: Some(uid),
        subject: message.subject().unwrap_or_default().to_string(),
        text_body: text_body(&message),
        html_body: html_body(&message),
        sender: sender_address(&message),
        date: calendar_date(&message),
    };

    debug!(
        "Parsed email UID={} subject={:?} text={} html={}",
        uid,
        fetched.subject,
        fetched.text_body.is_some(),
        fetched.html_body.is_some()
    );

    Ok(fetched)
}

// `text_bodies()` falls back to HTML parts when a message has no plain text,
// and `html_bodies()` carries converted text parts, so the part type has to
// be checked.
fn text_body(message: &Message) -> Option<String> {
    join_parts(message.text_bodies().filter_map(|part| match &part.body {
        PartType::Text(text) => Some(text.as_ref()),
        _ => None,
    }))
}

fn html_body(message: &Message) -> Option<String> {
    join_parts(message.html_bodies().filter_map(|part| match &part.body {
        PartType::Html(html) => Some(html.as_ref()),
        _ => None,
    }))
}

/// Joins the inline parts of one type. Blank parts are dropped, and a body
/// with nothing left is absent.
fn join_parts<'a>(parts: impl Iterator<Item = &'a str>) -> Option<String> {
    let parts: Vec<&str> = parts.filter(|part| !part.trim().is_empty()).collect();
    (!parts.is_empty()).then(|| parts.join("\n"))
}

/// Bare address of the first From mailbox, or its display name when the
/// address is missing.
fn sender_address(message: &Message) -> String {
    message
        .from()
        .and_then(|addr| addr.first())
        .and_then(|addr| addr.address().or_else(|| addr.name()))
        .unwrap_or_default()
        .to_string()
}

fn calendar_date(message: &Message) -> Option<String> {
    let date = message.date()?;
    NaiveDate::from_ymd_opt(date.year as i32, date.month as u32, date.day as u32)
        .map(|d| d.format("%Y-%m-%d").to_string())
}
