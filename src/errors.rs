//! uix error handling
//!
//! Malformed *data* (broken trees, bad paths, unusable payloads) never becomes
//! an error: the applicator skips it and the integrity checker reports it.
//! `UixError` covers operational faults only. The oracle can fail to produce
//! a batch, a session or batch file can be undecodable, or I/O can fail. These
//! are handed to the caller, which decides whether to retry or abort.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum UixError {
    /// The external oracle reported a failure.
    #[error("Oracle error: {message}")]
    #[diagnostic(
        code(uix::oracle::failed),
        help("the tree and history were left unchanged")
    )]
    Oracle { message: String },

    /// The oracle answered without a usable batch.
    #[error("Oracle returned no patch")]
    #[diagnostic(
        code(uix::oracle::empty),
        help("the tree and history were left unchanged")
    )]
    OracleEmpty,

    /// The oracle's answer could not be decoded into a batch.
    #[error("Malformed oracle response: {source}")]
    #[diagnostic(code(uix::oracle::decode))]
    OracleResponse {
        #[source]
        source: serde_json::Error,
    },

    /// The verification collaborator could not be reached.
    #[error("Verification unavailable: {message}")]
    #[diagnostic(code(uix::verify))]
    Verification { message: String },

    #[error("Malformed session record: {source}")]
    #[diagnostic(
        code(uix::session::decode),
        help("a session record is a JSON object; absent collections are allowed")
    )]
    Session {
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not encode session: {source}")]
    #[diagnostic(code(uix::session::encode))]
    Encode {
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not access {}: {source}", path.display())]
    #[diagnostic(code(uix::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UixError {
    pub fn oracle(message: impl Into<String>) -> Self {
        UixError::Oracle {
            message: message.into(),
        }
    }

    pub fn verification(message: impl Into<String>) -> Self {
        UixError::Verification {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        UixError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures attributable to the oracle rather than local state.
    pub fn is_oracle(&self) -> bool {
        matches!(
            self,
            UixError::Oracle { .. } | UixError::OracleEmpty | UixError::OracleResponse { .. }
        )
    }
}
