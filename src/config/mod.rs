#[allow(clippy::module_inception)]
mod config;
pub mod flow;

pub use config::*;
pub use flow::{FlowConfig, InputKind, PersistenceOwner, PersistencePolicy, QuestionSpec, QuestionTag};
