//! Agent definitions are pure configuration: a prompt, a model id, and an
//! ordered tool list. Which tool to call and when is decided by the
//! external tool-calling framework, not here.

pub mod definition;

pub use definition::{web_recon_agent, AgentDefinition};
