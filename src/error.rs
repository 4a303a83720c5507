//! Error handling for charlad.
//!
//! All per-session failures are contained within that session's cleanup
//! path; the only fatal error class is a bind failure at startup, which
//! propagates out of `main` as `anyhow::Error`.

use thiserror::Error;

/// Errors that end a client session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The nickname claimed during the handshake is already registered.
    #[error("nickname in use: {0}")]
    NicknameInUse(String),

    /// Read or write failure on the peer stream.
    #[error("peer i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Line framing failure (e.g. a line exceeding the length bound).
    #[error("framing error: {0}")]
    Codec(#[from] tokio_util::codec::LinesCodecError),
}

impl SessionError {
    /// Static label for structured logging.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NicknameInUse(_) => "nickname_in_use",
            Self::Io(_) => "peer_io",
            Self::Codec(_) => "framing",
        }
    }
}
