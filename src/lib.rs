//! cmdgate - command authorization and execution engine
//!
//! This library decides whether an externally proposed shell command (for
//! example, one generated by an LLM acting as an autonomous operator) may
//! run on the host, under what conditions, and executes it once
//! authorized. It provides:
//! - Subshell detection and grammar-backed command segmentation
//! - Prefix-based allow/deny validation with hardcoded blocks
//! - Caller-owned session approval memory with optional local persistence
//! - Sandboxed execution under a memory ceiling and timeout
//!
//! # Example
//!
//! ```no_run
//! use cmdgate::security::{GateConfig, ValidationOutcome, validate_with_config};
//! use cmdgate::session::SessionPrefixes;
//! use cmdgate::shell::run_sandboxed;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = GateConfig {
//!         include_default_lists: true,
//!         ..GateConfig::default()
//!     };
//!     let session = SessionPrefixes::new();
//!
//!     let command = "kubectl get pods | grep error";
//!     let suggested = vec!["kubectl get".to_string(), "grep".to_string()];
//!
//!     match validate_with_config(command, &suggested, &config, &session) {
//!         ValidationOutcome::Allowed => {
//!             let result = run_sandboxed(command, 30).await?;
//!             println!("{}", result.output);
//!         }
//!         ValidationOutcome::Denied { message, .. } => eprintln!("denied: {message}"),
//!         ValidationOutcome::ApprovalRequired { prefixes, .. } => {
//!             eprintln!("needs approval for: {prefixes:?}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod security;
pub mod session;
pub mod shell;
pub mod utils;

// Re-export commonly used types
pub use security::{DenyReason, GateConfig, ValidationOutcome, validate_command, validate_with_config};
pub use session::{ApprovedPrefixStore, ExecutionMode, SessionPrefixes};
pub use shell::{ExecutionResult, run_sandboxed};
