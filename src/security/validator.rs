//! Whole-command policy evaluation.
//!
//! Combines the subshell detector, the segmenter and the prefix matchers
//! into a single verdict for a command. Validation is pure: it performs no
//! I/O, never panics on attacker-controlled input, and any ambiguity
//! resolves toward denial or approval-required, never silent allowance.

use tracing::debug;

use super::lists::{GateConfig, HARDCODED_BLOCKS, effective_lists};
use super::matcher::{matches_deny_prefix, matches_prefix};
use super::segmenter::{SegmentError, split_segments};
use super::subshell::contains_subshell;
use crate::session::SessionPrefixes;

/// Why a command was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Matched a permanently blocked prefix (`sudo`, `su`).
    HardcodedBlock,
    /// Matched a configured deny-list prefix.
    DenyList,
    /// Command/process substitution found in the raw text.
    SubshellDetected,
    /// Control structure (`for`, `if`, `case`, ...) found.
    CompoundStatement,
    /// The command could not be parsed into segments.
    ParseError,
    /// A model-suggested prefix does not occur in the command text.
    PrefixNotInCommand,
}

/// Verdict for a command, produced by [`validate_command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Every segment matched the allow list; the command may run.
    Allowed,
    /// The command must not run.
    Denied { reason: DenyReason, message: String },
    /// At least one segment is in neither list; a human must approve the
    /// listed prefixes before the command may run.
    ApprovalRequired { prefixes: Vec<String>, message: String },
}

impl ValidationOutcome {
    /// User-facing denial text with a reason-specific label, suitable for
    /// returning directly to the proposing model. `None` unless denied.
    pub fn denial_text(&self) -> Option<String> {
        let ValidationOutcome::Denied { reason, message } = self else {
            return None;
        };
        let text = match reason {
            DenyReason::HardcodedBlock => format!("Command blocked: {message}"),
            DenyReason::DenyList => format!("Command blocked by configuration: {message}"),
            DenyReason::SubshellDetected => format!("Security error: {message}"),
            DenyReason::CompoundStatement | DenyReason::ParseError => {
                format!("Parse error: {message}")
            }
            DenyReason::PrefixNotInCommand => format!("Invalid prefix: {message}"),
        };
        Some(text)
    }
}

fn denied(reason: DenyReason, message: String) -> ValidationOutcome {
    ValidationOutcome::Denied { reason, message }
}

/// Check a segment against the permanently blocked prefixes, using the
/// deny matcher over the lowercased segment.
fn check_hardcoded_blocks(segment: &str) -> Option<&'static str> {
    let lowered = segment.to_lowercase();
    HARDCODED_BLOCKS
        .iter()
        .find(|block| matches_deny_prefix(&lowered, block))
        .copied()
}

/// Validate one segment, in fixed priority order: hardcoded block, deny
/// list, allow list, otherwise approval-required.
pub fn validate_segment(
    segment: &str,
    allow_list: &[String],
    deny_list: &[String],
) -> ValidationOutcome {
    if let Some(blocked) = check_hardcoded_blocks(segment) {
        return denied(
            DenyReason::HardcodedBlock,
            format!(
                "Command contains '{blocked}' which is permanently blocked for security reasons \
                 and cannot be overridden."
            ),
        );
    }

    for deny_prefix in deny_list {
        if matches_deny_prefix(segment, deny_prefix) {
            return denied(
                DenyReason::DenyList,
                format!(
                    "Command matches deny list pattern '{deny_prefix}'. This command is blocked \
                     by configuration."
                ),
            );
        }
    }

    for allow_prefix in allow_list {
        if matches_prefix(segment, allow_prefix) {
            return ValidationOutcome::Allowed;
        }
    }

    ValidationOutcome::ApprovalRequired {
        prefixes: Vec::new(),
        message: format!("Command segment '{segment}' is not in the allow list."),
    }
}

/// Validate a whole command against allow/deny lists.
///
/// `suggested_prefixes` are the model-claimed prefixes, one expected per
/// command segment; each must occur literally in the command text, which
/// prevents the model from claiming a safe-looking prefix for a command
/// that executes something else entirely.
pub fn validate_command(
    command: &str,
    suggested_prefixes: &[String],
    allow_list: &[String],
    deny_list: &[String],
) -> ValidationOutcome {
    for prefix in suggested_prefixes {
        if !command.contains(prefix.as_str()) {
            return denied(
                DenyReason::PrefixNotInCommand,
                format!("Suggested prefix '{prefix}' does not appear in the command."),
            );
        }
    }

    if contains_subshell(command) {
        return denied(
            DenyReason::SubshellDetected,
            "Command contains subshell constructs ($(), ``, <(), >()) which are not allowed \
             for security reasons."
                .to_string(),
        );
    }

    let segments = match split_segments(command) {
        Ok(segments) => segments,
        Err(SegmentError::CompoundStatement(kind)) => {
            debug!(kind = %kind, "rejecting compound statement");
            return denied(
                DenyReason::CompoundStatement,
                "Compound statements (for, while, if, case, etc.) are not supported. Only \
                 simple one-liner commands are allowed."
                    .to_string(),
            );
        }
        Err(SegmentError::Unparseable) => {
            return denied(
                DenyReason::ParseError,
                "Failed to parse command.".to_string(),
            );
        }
    };

    if segments.is_empty() {
        return denied(
            DenyReason::ParseError,
            "Failed to parse command: no valid command segments found.".to_string(),
        );
    }

    let mut any_needs_approval = false;
    for segment in &segments {
        match validate_segment(segment, allow_list, deny_list) {
            outcome @ ValidationOutcome::Denied { .. } => return outcome,
            ValidationOutcome::ApprovalRequired { .. } => any_needs_approval = true,
            ValidationOutcome::Allowed => {}
        }
    }

    if any_needs_approval {
        // Ask only for prefixes not already satisfied by the allow list,
        // deduplicated in first-seen order. If the filter leaves nothing,
        // fall back to the full suggested set so the caller is never handed
        // an approval request naming no prefixes.
        let mut prefixes: Vec<String> = Vec::new();
        for prefix in suggested_prefixes {
            let already_allowed = allow_list
                .iter()
                .any(|allowed| matches_prefix(prefix, allowed));
            if !already_allowed && !prefixes.contains(prefix) {
                prefixes.push(prefix.clone());
            }
        }
        if prefixes.is_empty() {
            prefixes = suggested_prefixes.to_vec();
        }
        return ValidationOutcome::ApprovalRequired {
            prefixes,
            message: "Command not in allow list.".to_string(),
        };
    }

    ValidationOutcome::Allowed
}

/// Validate against a caller-owned [`GateConfig`] plus one conversation's
/// session-approved prefixes.
///
/// Session prefixes are folded into a fresh copy of the allow list, never
/// written back into the configuration, so an approval in one conversation
/// has no effect on any other conversation sharing the same config.
pub fn validate_with_config(
    command: &str,
    suggested_prefixes: &[String],
    config: &GateConfig,
    session: &SessionPrefixes,
) -> ValidationOutcome {
    let (mut allow_list, deny_list) = effective_lists(config);
    session.merge_into(&mut allow_list);
    validate_command(command, suggested_prefixes, &allow_list, &deny_list)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_segment_hardcoded_block() {
        let outcome = validate_segment("sudo ls", &[], &[]);
        assert!(matches!(
            outcome,
            ValidationOutcome::Denied {
                reason: DenyReason::HardcodedBlock,
                ..
            }
        ));
    }

    #[test]
    fn test_segment_hardcoded_block_beats_allow_list() {
        // Even an explicit allow entry cannot override the hardcoded block.
        let allow = strings(&["sudo"]);
        let outcome = validate_segment("sudo ls", &allow, &[]);
        assert!(matches!(
            outcome,
            ValidationOutcome::Denied {
                reason: DenyReason::HardcodedBlock,
                ..
            }
        ));
    }

    #[test]
    fn test_segment_su_blocked_but_not_sort() {
        let outcome = validate_segment("su root", &[], &[]);
        assert!(matches!(outcome, ValidationOutcome::Denied { .. }));

        // "sort" starts with the letters of "su" but is not a boundary match.
        let allow = strings(&["sort"]);
        assert_eq!(
            validate_segment("sort file.txt", &allow, &[]),
            ValidationOutcome::Allowed
        );
    }

    #[test]
    fn test_segment_deny_before_allow() {
        let allow = strings(&["kubectl get"]);
        let deny = strings(&["kubectl get secret"]);
        let outcome = validate_segment("kubectl get secret my-secret", &allow, &deny);
        assert!(matches!(
            outcome,
            ValidationOutcome::Denied {
                reason: DenyReason::DenyList,
                ..
            }
        ));
    }

    #[test]
    fn test_segment_allowed() {
        let allow = strings(&["kubectl get"]);
        assert_eq!(
            validate_segment("kubectl get pods", &allow, &[]),
            ValidationOutcome::Allowed
        );
    }

    #[test]
    fn test_segment_unknown_needs_approval() {
        let outcome = validate_segment("custom-tool --flag", &[], &[]);
        assert!(matches!(outcome, ValidationOutcome::ApprovalRequired { .. }));
    }

    #[test]
    fn test_pipeline_fully_allowed() {
        let allow = strings(&["kubectl get", "grep", "head"]);
        let suggested = strings(&["kubectl get", "grep", "head"]);
        let outcome = validate_command(
            "kubectl get pods | grep error | head -10",
            &suggested,
            &allow,
            &[],
        );
        assert_eq!(outcome, ValidationOutcome::Allowed);
    }

    #[test]
    fn test_slash_boundary_deny_wins_over_allow() {
        let allow = strings(&["kubectl get"]);
        let deny = strings(&["kubectl get secret"]);
        let suggested = strings(&["kubectl get"]);
        let outcome = validate_command("kubectl get secret/my-secret", &suggested, &allow, &deny);
        assert!(matches!(
            outcome,
            ValidationOutcome::Denied {
                reason: DenyReason::DenyList,
                ..
            }
        ));
    }

    #[test]
    fn test_plural_deny_in_pipeline() {
        let allow = strings(&["kubectl get", "grep"]);
        let deny = strings(&["kubectl get secret"]);
        let suggested = strings(&["kubectl get", "grep"]);
        let outcome = validate_command(
            "kubectl get secrets | grep token",
            &suggested,
            &allow,
            &deny,
        );
        assert!(matches!(
            outcome,
            ValidationOutcome::Denied {
                reason: DenyReason::DenyList,
                ..
            }
        ));
    }

    #[test]
    fn test_subshell_denied_regardless_of_allow_list() {
        let allow = strings(&["echo"]);
        let outcome = validate_command("echo $(whoami)", &strings(&["echo"]), &allow, &[]);
        assert!(matches!(
            outcome,
            ValidationOutcome::Denied {
                reason: DenyReason::SubshellDetected,
                ..
            }
        ));
    }

    #[test]
    fn test_compound_statement_denied_despite_allowed_words() {
        let allow = strings(&["echo"]);
        let outcome = validate_command(
            "for i in 1 2 3; do echo $i; done",
            &strings(&["echo"]),
            &allow,
            &[],
        );
        assert!(matches!(
            outcome,
            ValidationOutcome::Denied {
                reason: DenyReason::CompoundStatement,
                ..
            }
        ));
    }

    #[test]
    fn test_fabricated_prefix_denied() {
        let allow = strings(&["kubectl get"]);
        let suggested = strings(&["kubectl get", "grep"]);
        let outcome = validate_command("kubectl get pods", &suggested, &allow, &[]);
        assert!(matches!(
            outcome,
            ValidationOutcome::Denied {
                reason: DenyReason::PrefixNotInCommand,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_command_needs_approval_with_prefixes() {
        let suggested = strings(&["custom-tool"]);
        let outcome = validate_command("custom-tool --flag", &suggested, &[], &[]);
        match outcome {
            ValidationOutcome::ApprovalRequired { prefixes, .. } => {
                assert_eq!(prefixes, vec!["custom-tool"]);
            }
            other => panic!("expected ApprovalRequired, got {other:?}"),
        }
    }

    #[test]
    fn test_approval_prefixes_exclude_already_allowed() {
        let allow = strings(&["grep"]);
        let suggested = strings(&["custom-tool", "grep"]);
        let outcome = validate_command("custom-tool --flag | grep foo", &suggested, &allow, &[]);
        match outcome {
            ValidationOutcome::ApprovalRequired { prefixes, .. } => {
                assert_eq!(prefixes, vec!["custom-tool"]);
            }
            other => panic!("expected ApprovalRequired, got {other:?}"),
        }
    }

    #[test]
    fn test_approval_prefixes_deduplicated_in_order() {
        let suggested = strings(&["jq", "jq"]);
        let outcome = validate_command("jq .a data.json | jq .b", &suggested, &[], &[]);
        match outcome {
            ValidationOutcome::ApprovalRequired { prefixes, .. } => {
                assert_eq!(prefixes, vec!["jq"]);
            }
            other => panic!("expected ApprovalRequired, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_command_is_parse_error() {
        let outcome = validate_command("", &[], &[], &[]);
        assert!(matches!(
            outcome,
            ValidationOutcome::Denied {
                reason: DenyReason::ParseError,
                ..
            }
        ));
    }

    #[test]
    fn test_leading_pipe_is_denied_not_skipped() {
        let allow = strings(&["grep"]);
        let outcome = validate_command("| grep foo", &strings(&["grep"]), &allow, &[]);
        assert!(matches!(
            outcome,
            ValidationOutcome::Denied {
                reason: DenyReason::ParseError,
                ..
            }
        ));
    }

    #[test]
    fn test_first_denial_wins_in_segment_order() {
        let allow = strings(&["grep"]);
        let deny = strings(&["kubectl get secret", "cat"]);
        let suggested = strings(&["kubectl get secret", "cat"]);
        let outcome = validate_command(
            "kubectl get secrets | cat",
            &suggested,
            &allow,
            &deny,
        );
        match outcome {
            ValidationOutcome::Denied { reason, message } => {
                assert_eq!(reason, DenyReason::DenyList);
                assert!(message.contains("kubectl get secret"));
            }
            other => panic!("expected Denied, got {other:?}"),
        }
    }

    #[test]
    fn test_denial_text_labels() {
        let outcome = validate_command("echo `id`", &[], &[], &[]);
        let text = outcome.denial_text().unwrap();
        assert!(text.starts_with("Security error:"));

        assert_eq!(ValidationOutcome::Allowed.denial_text(), None);
    }

    #[test]
    fn test_session_prefixes_isolated_between_conversations() {
        let config = GateConfig {
            allow: vec![],
            deny: vec![],
            include_default_lists: false,
        };

        let mut session_a = SessionPrefixes::new();
        session_a.approve("custom-tool");

        let session_b = SessionPrefixes::new();
        let suggested = strings(&["custom-tool"]);

        // Conversation A's approval makes the command run for A...
        assert_eq!(
            validate_with_config("custom-tool --flag", &suggested, &config, &session_a),
            ValidationOutcome::Allowed
        );
        // ...but conversation B, sharing the same config, still needs approval.
        assert!(matches!(
            validate_with_config("custom-tool --flag", &suggested, &config, &session_b),
            ValidationOutcome::ApprovalRequired { .. }
        ));
        // And the shared config itself was never mutated.
        assert!(config.allow.is_empty());
    }
}
