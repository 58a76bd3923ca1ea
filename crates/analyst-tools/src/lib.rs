//! Tool framework for the stock analyst
//!
//! Tools are the functions a model may call mid-conversation: web research
//! for the analyst, stock analysis for the financial assistant.

pub mod registry;
pub mod tool;

pub use registry::{ToolRegistry, ToolRegistryBuilder};
pub use tool::Tool;
