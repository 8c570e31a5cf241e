//! Allow/deny list configuration and the effective-list resolver.
//!
//! The resolver is copy-on-read: every call returns freshly allocated
//! lists, so nothing downstream can mutate caller-owned configuration and
//! no trust decision can leak between unrelated conversations.

use serde::Deserialize;

/// Prefixes that are always blocked and cannot be overridden by any
/// configuration, including an explicit allow-list entry.
pub const HARDCODED_BLOCKS: &[&str] = &["sudo", "su"];

/// Built-in allow list of read-only inspection commands, merged in when
/// [`GateConfig::include_default_lists`] is set (typical for served
/// deployments; interactive users build their own trusted set over time).
pub const DEFAULT_ALLOW_LIST: &[&str] = &[
    // Kubernetes read-only commands
    "kubectl get",
    "kubectl describe",
    "kubectl logs",
    "kubectl top",
    "kubectl explain",
    "kubectl api-resources",
    "kubectl config view",
    "kubectl config current-context",
    "kubectl cluster-info",
    "kubectl version",
    "kubectl auth can-i",
    "kubectl diff",
    "kubectl events",
    "kube-lineage",
    // JSON processing
    "jq",
    // Text processing
    "cat",
    "grep",
    "head",
    "tail",
    "sort",
    "uniq",
    "wc",
    "cut",
    "tr",
    "echo",
    "base64",
    // File system inspection
    "ls",
    "find",
    "stat",
    "du",
    "df",
    // Archive inspection
    "tar -tf",
    "tar -tvf",
    "tar -tfv",
    "tar -ftv",
    "gzip -l",
    "zcat",
    "zgrep",
    // Process/system info
    "id",
    "whoami",
    "hostname",
    "uname",
    "date",
    "which",
    "type",
];

/// Built-in deny list. Intentionally empty: denials are always opted into
/// by the user, never imposed by defaults.
pub const DEFAULT_DENY_LIST: &[&str] = &[];

/// Caller-owned configuration for the command gate. Consumed read-only;
/// the engine never writes approvals or anything else back into it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// User allow-list prefixes.
    pub allow: Vec<String>,
    /// User deny-list prefixes.
    pub deny: Vec<String>,
    /// Merge the built-in default lists into the user lists.
    pub include_default_lists: bool,
}

/// Compute the `(allow, deny)` lists in force for one validation call.
///
/// Always returns new containers; the result never aliases the
/// configuration's internal storage.
pub fn effective_lists(config: &GateConfig) -> (Vec<String>, Vec<String>) {
    if config.include_default_lists {
        (
            merged(DEFAULT_ALLOW_LIST, &config.allow),
            merged(DEFAULT_DENY_LIST, &config.deny),
        )
    } else {
        (config.allow.clone(), config.deny.clone())
    }
}

fn merged(defaults: &[&str], user: &[String]) -> Vec<String> {
    let mut out: Vec<String> = defaults.iter().map(|p| (*p).to_string()).collect();
    for prefix in user {
        if !out.iter().any(|existing| existing == prefix) {
            out.push(prefix.clone());
        }
    }
    out
}
