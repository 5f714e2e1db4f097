/// Errors produced by the xtuis client.
///
/// A local rate-limit denial ([`Error::RateLimited`]) is kept apart from the
/// ways the server or the network can fail, so callers can retry the former
/// later and treat the others on their own terms.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A local quota window is exhausted. No request was sent.
    #[error("you have reached the limit of sending messages this {window}")]
    RateLimited {
        /// Name of the exhausted window, e.g. `day` or `minute`.
        window: String,
    },

    /// The payload was rejected before any quota was consumed.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The request could not be completed (connection, timeout, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with something other than `200 OK`.
    #[error("server returned status code {0}")]
    Status(reqwest::StatusCode),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True if the send was refused locally and may succeed once the window rolls.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
