use std::fmt;

/// Failure of a remote price update. No variant is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    Transport(String),
    /// The platform answered with a non-2xx status.
    Status {
        status: u16,
        reason: String,
        body: String,
    },
    /// A 2xx response whose body or committed price could not be read.
    Decode(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Transport(msg) => write!(f, "Shopify request failed: {msg}"),
            RemoteError::Status {
                status,
                reason,
                body,
            } => write!(f, "Shopify API error: {status} {reason} - {body}"),
            RemoteError::Decode(msg) => write!(f, "Shopify response invalid: {msg}"),
        }
    }
}

impl std::error::Error for RemoteError {}
