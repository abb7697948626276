//! HR onboarding: an LLM-assisted new-hire workflow.

pub mod config;
pub mod error;
pub mod llm;
pub mod onboarding;
pub mod store;
