use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Ledger read errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Address decode error: {0}")]
    AddressDecode(String),

    #[error("Key encode error: {0}")]
    KeyEncode(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Entry decode error{}: {path}: {reason}", location(.index))]
    EntryDecode {
        index: Option<usize>,
        path: String,
        reason: String,
    },

    #[error("Missing data: {}", .0.join(", "))]
    MissingData(Vec<String>),

    #[error("Arithmetic error: {0}")]
    Arithmetic(String),
}

fn location(index: &Option<usize>) -> String {
    match index {
        Some(index) => format!(" at response index {}", index),
        None => String::new(),
    }
}

impl Error {
    /// Structural mismatch at `path` in a decoded value tree.
    pub fn decode(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::EntryDecode {
            index: None,
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wire-level failure while decoding the response entry at `index`.
    pub fn wire(index: usize, path: impl Into<String>, err: stellar_xdr::curr::Error) -> Self {
        Error::EntryDecode {
            index: Some(index),
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Failure to build or encode a value we send.
    pub fn encode(err: stellar_xdr::curr::Error) -> Self {
        Error::KeyEncode(err.to_string())
    }

    pub fn missing<S: Into<String>>(pieces: impl IntoIterator<Item = S>) -> Self {
        Error::MissingData(pieces.into_iter().map(Into::into).collect())
    }

    /// Tags a decode error with the response index it came from.
    pub fn at_index(self, index: usize) -> Self {
        match self {
            Error::EntryDecode { path, reason, .. } => Error::EntryDecode {
                index: Some(index),
                path,
                reason,
            },
            other => other,
        }
    }
}

/// Failures of the ledger read service, passed through untouched.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),
}
