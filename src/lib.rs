pub use crate::ast::{Node, NodeKind, Scalar, Tree};
pub use crate::errors::UixError;
pub use crate::history::History;
pub use crate::patch::{apply, Author, EditOp, PatchBatch};
pub use crate::session::{Action, Session, SessionRecord};

pub mod ast;
pub mod cli;
pub mod errors;
pub mod history;
pub mod integrity;
pub mod oracle;
pub mod patch;
pub mod projection;
pub mod session;
