//! Shell execution module.
//!
//! This module runs commands that have already passed policy validation,
//! under resource limits and a wall-clock timeout.

mod sandbox;

pub use sandbox::{
    ExecutionResult, MEMORY_LIMIT_ENV, memory_limit_mb, run_sandboxed, ulimit_prefix,
};
