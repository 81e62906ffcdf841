//! Project time estimates from a chat-completion model.
//!
//! A form collects the team, the technology stack (or construction type) and
//! a task list; [`prompt`] turns it into one question, [`llm_interaction`]
//! sends it upstream and [`breakdown`] reads the reply back as a headline
//! plus label/value rows. [`web_server`] puts a browser UI and a small JSON
//! API in front of that.

pub mod breakdown;
pub mod constants;
pub mod estimation;
pub mod form;
pub mod llm_interaction;
pub mod prompt;
pub mod web_server;
pub mod workspace;

pub use breakdown::{BreakdownItem, Estimate};
pub use estimation::Estimator;
pub use form::{ProjectDetails, ProjectForm, ProjectKind, ProjectSpec, Task, Team};
pub use llm_interaction::{ChatClient, ChatConfig, ChatError};
