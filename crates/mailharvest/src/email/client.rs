//! IMAP implementation of the mail store.

use std::future::Future;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use async_imap::Session;
use async_native_tls::TlsConnector;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use secrecy::{ExposeSecret, SecretString};

use crate::config::{Category, ImapSettings};
use crate::secrets;

use super::error::{EmailError, Result};
use super::parser::parse_message;
use super::store::{FetchedMessage, MailSession, MailStore, Uid};

/// Type alias for the underlying async stream (using async-std compatible TcpStream).
type AsyncTcpStream = async_io::Async<TcpStream>;

/// Type alias for the TLS stream used by the IMAP session.
type TlsStream = async_native_tls::TlsStream<AsyncTcpStream>;

/// Opens authenticated IMAP sessions with the configured folder examined.
pub struct ImapStore {
    settings: ImapSettings,
    password: SecretString,
    timeout: Duration,
}

impl ImapStore {
    /// Validates the settings and resolves the password up front, so missing
    /// credentials fail before any session is attempted.
    pub fn from_config(settings: &ImapSettings, timeout: Duration) -> Result<Self> {
        if !settings.use_tls {
            return Err(EmailError::ConfigError(
                "TLS is required for secure email connections".to_string(),
            ));
        }

        let username = secrets::resolve_username(settings)
            .map_err(|e| EmailError::CredentialsNotFound(format!("IMAP username: {}", e)))?;
        let password = secrets::resolve_password(settings)
            .map_err(|e| EmailError::CredentialsNotFound(e.to_string()))?;

        Ok(Self {
            settings: ImapSettings {
                username,
                ..settings.clone()
            },
            password,
            timeout,
        })
    }

    async fn open(&self) -> Result<ImapSession> {
        let addr = format!("{}:{}", self.settings.host, self.settings.port);
        info!("Connecting to IMAP server at {}", addr);

        let tcp_stream = connect_tcp(&addr).await?;

        let tls_stream = TlsConnector::new()
            .connect(&self.settings.host, tcp_stream)
            .await?;

        let client = async_imap::Client::new(tls_stream);
        let mut session = client
            .login(&self.settings.username, self.password.expose_secret())
            .await
            .map_err(|(e, _)| match EmailError::from(e) {
                err if err.is_transient() => err,
                err => EmailError::AuthenticationFailed(err.to_string()),
            })?;
        info!("Successfully authenticated to IMAP server");

        // EXAMINE keeps the folder read-only so nothing is marked as seen.
        session
            .examine(&self.settings.folder)
            .await
            .map_err(|e| match e {
                async_imap::error::Error::No(_) => {
                    EmailError::FolderNotFound(self.settings.folder.clone())
                }
                other => EmailError::from(other),
            })?;
        debug!("Folder '{}' examined", self.settings.folder);

        Ok(ImapSession {
            session: Some(session),
            settings: self.settings.clone(),
            timeout: self.timeout,
        })
    }
}

#[async_trait]
impl MailStore for ImapStore {
    type Session = ImapSession;

    async fn connect(&self) -> Result<ImapSession> {
        with_timeout(self.timeout, "connect", self.open()).await
    }
}

/// Resolves `addr` and connects to the first address that accepts.
async fn connect_tcp(addr: &str) -> Result<AsyncTcpStream> {
    let candidates = addr
        .to_socket_addrs()
        .map_err(|e| EmailError::ConnectionFailed(format!("cannot resolve {}: {}", addr, e)))?;

    let mut last_error = None;
    for candidate in candidates {
        match AsyncTcpStream::connect(candidate).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("TCP connect to {} failed: {}", candidate, e);
                last_error = Some(e);
            }
        }
    }

    Err(match last_error {
        Some(e) if e.kind() == std::io::ErrorKind::TimedOut => EmailError::Timeout(e.to_string()),
        Some(e) => EmailError::ConnectionFailed(e.to_string()),
        None => EmailError::ConnectionFailed(format!("no addresses for {}", addr)),
    })
}

async fn with_timeout<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| EmailError::Timeout(format!("{} exceeded {:?}", operation, limit)))?
}

/// A logged-in IMAP session on the configured folder.
pub struct ImapSession {
    session: Option<Session<TlsStream>>,
    settings: ImapSettings,
    timeout: Duration,
}

impl ImapSession {
    fn session_mut(&mut self) -> Result<&mut Session<TlsStream>> {
        self.session
            .as_mut()
            .ok_or_else(|| EmailError::ConnectionFailed("Not connected".to_string()))
    }
}

#[async_trait]
impl MailSession for ImapSession {
    async fn list_uids(&mut self, category: Category) -> Result<Vec<Uid>> {
        let query = self.settings.query_for(category);
        let limit = self.timeout;
        let session = self.session_mut()?;
        debug!("Searching with query: {}", query);

        let found = with_timeout(limit, "uid search", async {
            session.uid_search(&query).await.map_err(EmailError::from)
        })
        .await?;

        // UID SEARCH returns an unordered set; the listing contract is ascending.
        let mut uids: Vec<Uid> = found.into_iter().map(Uid).collect();
        uids.sort_unstable();
        debug!("Found {} messages in category {}", uids.len(), category);
        Ok(uids)
    }

    async fn fetch_message(&mut self, uid: Uid) -> Result<Option<FetchedMessage>> {
        let limit = self.timeout;
        let session = self.session_mut()?;
        debug!("Fetching email with UID {}", uid);

        // BODY.PEEK[] fetches without setting \Seen. The stream is drained
        // completely so no response is left behind for the next command.
        let fetches = with_timeout(limit, "uid fetch", async {
            let stream = session
                .uid_fetch(uid.to_string(), "(UID BODY.PEEK[])")
                .await?;
            stream.try_collect::<Vec<_>>().await.map_err(EmailError::from)
        })
        .await?;

        let raw = fetches
            .iter()
            .filter(|f| f.uid.is_none() || f.uid == Some(uid.0))
            .find_map(|f| f.body());

        match raw {
            Some(body) => parse_message(uid, body).map(Some),
            None => {
                debug!("UID {} no longer resolves", uid);
                Ok(None)
            }
        }
    }

    async fn logout(&mut self) -> Result<()> {
        if let Some(mut session) = self.session.take() {
            info!("Disconnecting from IMAP server");
            with_timeout(self.timeout, "logout", async {
                session.logout().await.map_err(EmailError::from)
            })
            .await?;
        }
        Ok(())
    }
}

impl Drop for ImapSession {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("ImapSession dropped without logout - connection will be closed");
        }
    }
}
