//! Security module: command authorization for LLM-proposed shell commands.
//!
//! The pipeline, leaves first: subshell detection over the raw text, a
//! grammar-backed segmenter, boundary-aware prefix matchers, the
//! effective-list resolver, and the policy evaluator that combines them
//! into one verdict per command.

mod lists;
mod matcher;
mod segmenter;
mod subshell;
mod validator;

pub use lists::{
    DEFAULT_ALLOW_LIST, DEFAULT_DENY_LIST, GateConfig, HARDCODED_BLOCKS, effective_lists,
};
pub use matcher::{matches_deny_prefix, matches_prefix};
pub use segmenter::{SegmentError, split_segments};
pub use subshell::contains_subshell;
pub use validator::{
    DenyReason, ValidationOutcome, validate_command, validate_segment, validate_with_config,
};
