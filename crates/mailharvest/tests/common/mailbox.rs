//! In-memory mail store for driving the pipeline without a server.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use mailharvest::email::error::Result;
use mailharvest::{Category, EmailError, FetchedMessage, MailSession, MailStore, Uid};

#[derive(Default)]
struct MailboxState {
    categories: HashMap<Category, BTreeMap<Uid, FetchedMessage>>,
    /// UIDs listed but no longer fetchable.
    vanished: Vec<(Category, Uid)>,
    connect_failures: VecDeque<EmailError>,
    list_errors: HashMap<Category, EmailError>,
    fetch_errors: HashMap<Uid, EmailError>,
    /// Successful fetches left before the connection drops.
    fetches_until_drop: Option<usize>,
    fetch_log: Vec<Uid>,
    connects: usize,
    logouts: usize,
}

/// Cloneable handle to a scripted mailbox. Clones share state, so a test can
/// keep one handle for assertions after moving another into a `Harvester`.
#[derive(Clone, Default)]
pub struct ScriptedStore {
    state: Arc<Mutex<MailboxState>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MailboxState> {
        self.state.lock().unwrap()
    }

    pub fn add(&self, category: Category, uid: u32, message: FetchedMessage) -> &Self {
        let message = FetchedMessage {
            uid: Some(Uid(uid)),
            ..message
        };
        self.state()
            .categories
            .entry(category)
            .or_default()
            .insert(Uid(uid), message);
        self
    }

    /// Adds `count` distinct, long-enough messages with UIDs `first..first+count`.
    pub fn add_many(&self, category: Category, first: u32, count: u32) -> &Self {
        for uid in first..first + count {
            self.add(
                category,
                uid,
                message(
                    &format!("{} #{}", category, uid),
                    &format!("Body of {} message {} padded to a useful length.", category, uid),
                ),
            );
        }
        self
    }

    pub fn add_vanished(&self, category: Category, uid: u32) -> &Self {
        self.state().vanished.push((category, Uid(uid)));
        self
    }

    pub fn fail_connect(&self, error: EmailError) -> &Self {
        self.state().connect_failures.push_back(error);
        self
    }

    pub fn fail_listing(&self, category: Category, error: EmailError) -> &Self {
        self.state().list_errors.insert(category, error);
        self
    }

    /// Fails the next fetch of `uid` once.
    pub fn fail_fetch(&self, uid: u32, error: EmailError) -> &Self {
        self.state().fetch_errors.insert(Uid(uid), error);
        self
    }

    /// Drops the connection after `fetches` more successful fetches.
    pub fn disconnect_after(&self, fetches: usize) -> &Self {
        self.state().fetches_until_drop = Some(fetches);
        self
    }

    pub fn fetch_log(&self) -> Vec<Uid> {
        self.state().fetch_log.clone()
    }

    pub fn clear_fetch_log(&self) {
        self.state().fetch_log.clear();
    }

    pub fn connects(&self) -> usize {
        self.state().connects
    }

    pub fn logouts(&self) -> usize {
        self.state().logouts
    }
}

#[async_trait]
impl MailStore for ScriptedStore {
    type Session = ScriptedSession;

    async fn connect(&self) -> Result<ScriptedSession> {
        let mut state = self.state();
        state.connects += 1;
        if let Some(err) = state.connect_failures.pop_front() {
            return Err(err);
        }
        Ok(ScriptedSession {
            state: Arc::clone(&self.state),
        })
    }
}

pub struct ScriptedSession {
    state: Arc<Mutex<MailboxState>>,
}

#[async_trait]
impl MailSession for ScriptedSession {
    async fn list_uids(&mut self, category: Category) -> Result<Vec<Uid>> {
        let state = self.state.lock().unwrap();
        if let Some(err) = state.list_errors.get(&category) {
            return Err(clone_error(err));
        }

        let mut uids: Vec<Uid> = state
            .categories
            .get(&category)
            .map(|messages| messages.keys().copied().collect())
            .unwrap_or_default();
        uids.extend(
            state
                .vanished
                .iter()
                .filter(|(c, _)| *c == category)
                .map(|(_, uid)| *uid),
        );
        uids.sort();
        Ok(uids)
    }

    async fn fetch_message(&mut self, uid: Uid) -> Result<Option<FetchedMessage>> {
        let mut state = self.state.lock().unwrap();

        if state.fetches_until_drop == Some(0) {
            state.fetches_until_drop = None;
            return Err(EmailError::ConnectionClosed);
        }
        if let Some(err) = state.fetch_errors.remove(&uid) {
            return Err(err);
        }

        if let Some(remaining) = state.fetches_until_drop.as_mut() {
            *remaining -= 1;
        }
        state.fetch_log.push(uid);
        Ok(state
            .categories
            .values()
            .find_map(|messages| messages.get(&uid))
            .cloned())
    }

    async fn logout(&mut self) -> Result<()> {
        self.state.lock().unwrap().logouts += 1;
        Ok(())
    }
}

/// `EmailError` carries no `Clone`; persistent scripted failures are rebuilt.
fn clone_error(err: &EmailError) -> EmailError {
    match err {
        EmailError::ConnectionFailed(m) => EmailError::ConnectionFailed(m.clone()),
        EmailError::ConnectionClosed => EmailError::ConnectionClosed,
        EmailError::Timeout(m) => EmailError::Timeout(m.clone()),
        other => EmailError::ProtocolError(other.to_string()),
    }
}

pub fn message(subject: &str, body: &str) -> FetchedMessage {
    FetchedMessage {
        uid: None,
        subject: subject.to_string(),
        text_body: Some(body.to_string()),
        html_body: None,
        sender: "newsletter@example.com".to_string(),
        date: Some("2024-06-01".to_string()),
    }
}
