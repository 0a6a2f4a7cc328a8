//! Mail store error types.

use thiserror::Error;

/// How the session layer should react to an [`EmailError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network-level failure; reopen the session and try again.
    Transient,
    /// Anything else; abort the current unit of work.
    Fatal,
}

/// Errors that can occur while talking to the remote mail store.
#[derive(Error, Debug)]
pub enum EmailError {
    /// Failed to connect to the IMAP server, or the socket failed mid-session.
    #[error("IMAP connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS/SSL error during the handshake or on an established stream.
    #[error("TLS error: {0}")]
    TlsError(String),

    /// Operation timed out.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// The server closed the connection (EOF).
    #[error("IMAP connection closed by server")]
    ConnectionClosed,

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Failed to retrieve credentials.
    #[error("Credentials not found: {0}")]
    CredentialsNotFound(String),

    /// IMAP protocol error (BAD/NO responses, unparseable responses).
    #[error("IMAP protocol error: {0}")]
    ProtocolError(String),

    /// Failed to parse an email message.
    #[error("Failed to parse email: {0}")]
    ParseError(String),

    /// Folder not found.
    #[error("IMAP folder '{0}' not found")]
    FolderNotFound(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl EmailError {
    /// Classifies the error for the retry policy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EmailError::ConnectionFailed(_)
            | EmailError::TlsError(_)
            | EmailError::Timeout(_)
            | EmailError::ConnectionClosed => ErrorKind::Transient,
            _ => ErrorKind::Fatal,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

impl From<async_native_tls::Error> for EmailError {
    fn from(err: async_native_tls::Error) -> Self {
        EmailError::TlsError(err.to_string())
    }
}

impl From<async_imap::error::Error> for EmailError {
    fn from(err: async_imap::error::Error) -> Self {
        use async_imap::error::Error as ImapError;

        match err {
            ImapError::Io(io) => match io.kind() {
                std::io::ErrorKind::TimedOut => EmailError::Timeout(io.to_string()),
                std::io::ErrorKind::UnexpectedEof => EmailError::ConnectionClosed,
                _ => EmailError::ConnectionFailed(io.to_string()),
            },
            ImapError::ConnectionLost => EmailError::ConnectionClosed,
            other => EmailError::ProtocolError(other.to_string()),
        }
    }
}

/// Result type for mail store operations.
pub type Result<T> = std::result::Result<T, EmailError>;
