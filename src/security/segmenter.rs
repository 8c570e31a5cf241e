//! Command segmentation via a real bash grammar parse.
//!
//! Splits a command into simple segments at top-level `|`, `&&`, `||`, `;`
//! and `&` boundaries using tree-sitter-bash, so operators inside quoted
//! strings are never mis-split. Control structures (`for`, `if`, `case`,
//! ...) are rejected outright rather than degraded into something that
//! merely looks like a simple command.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use tree_sitter::Node;
use tree_sitter::Parser;
use tree_sitter::Tree;
use tree_sitter_bash::LANGUAGE as BASH;

/// Why a command could not be split into simple segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// A shell control structure was found; carries the offending keyword
    /// or grammar node kind.
    CompoundStatement(String),
    /// The grammar could not make sense of the input at all.
    Unparseable,
}

// Keywords scanned for when the grammar itself gives up on the input.
const COMPOUND_KEYWORDS: &[&str] = &["for", "while", "until", "if", "case", "select", "function"];
const COMPOUND_END_KEYWORDS: &[&str] = &["done", "fi", "esac"];

// Grammar node kinds that represent control structures. `subshell` here is
// the parenthesized-group form `( ... )`, distinct from the substitution
// constructs handled by the subshell detector.
const COMPOUND_NODE_KINDS: &[&str] = &[
    "for_statement",
    "c_style_for_statement",
    "while_statement",
    "if_statement",
    "case_statement",
    "function_definition",
    "subshell",
    "compound_statement",
];

// Node kinds that yield one segment each, sliced from the source text. A
// redirected_statement keeps its redirect inside the segment, matching how
// the prefix matcher sees `ls > out` as an `ls` invocation.
const SEGMENT_NODE_KINDS: &[&str] = &["command", "redirected_statement", "variable_assignment"];

// Containers to descend into looking for segments.
const CONTAINER_NODE_KINDS: &[&str] = &["program", "list", "pipeline"];

#[expect(clippy::expect_used)]
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("valid regex"));

/// Parse the command with tree-sitter-bash, returning a Tree on success or
/// None if parsing failed outright.
fn try_parse_bash(command: &str) -> Option<Tree> {
    let lang = BASH.into();
    let mut parser = Parser::new();
    #[expect(clippy::expect_used)]
    parser.set_language(&lang).expect("load bash grammar");
    let old_tree: Option<&Tree> = None;
    parser.parse(command, old_tree)
}

/// Split a command (already confirmed subshell-free) into ordered simple
/// segments.
///
/// Any input the grammar cannot fully model resolves to an error, never to
/// a partial segmentation: control structures become
/// [`SegmentError::CompoundStatement`], everything else
/// [`SegmentError::Unparseable`].
pub fn split_segments(command: &str) -> Result<Vec<String>, SegmentError> {
    let tree = match try_parse_bash(command) {
        Some(tree) if !tree.root_node().has_error() => tree,
        _ => {
            debug!("bash grammar failed to parse command, falling back to keyword scan");
            return Err(fallback_error(command));
        }
    };

    let mut segments = Vec::new();
    collect_segments(tree.root_node(), command, &mut segments)?;
    Ok(segments)
}

fn collect_segments(
    node: Node,
    source: &str,
    segments: &mut Vec<String>,
) -> Result<(), SegmentError> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if !child.is_named() {
            // Operator and punctuation tokens ("&&", ";", "|", ...) mark
            // the boundaries between segments; nothing to collect.
            continue;
        }
        let kind = child.kind();
        if kind == "comment" {
            continue;
        }
        if SEGMENT_NODE_KINDS.contains(&kind) {
            let text = source[child.start_byte()..child.end_byte()].trim();
            if !text.is_empty() {
                segments.push(text.to_string());
            }
        } else if CONTAINER_NODE_KINDS.contains(&kind) {
            collect_segments(child, source, segments)?;
        } else if COMPOUND_NODE_KINDS.contains(&kind) {
            return Err(SegmentError::CompoundStatement(kind.to_string()));
        } else {
            // Anything the walker does not recognize fails closed.
            debug!(kind, "unsupported bash grammar node");
            return Err(SegmentError::Unparseable);
        }
    }
    Ok(())
}

fn fallback_error(command: &str) -> SegmentError {
    match detect_compound_keyword(command) {
        Some(keyword) => SegmentError::CompoundStatement(keyword),
        None => SegmentError::Unparseable,
    }
}

/// Scan for compound-statement keywords as whole words. This catches
/// constructs the grammar rejects before producing a useful tree.
fn detect_compound_keyword(command: &str) -> Option<String> {
    WORD.find_iter(command)
        .map(|m| m.as_str())
        .find(|word| COMPOUND_KEYWORDS.contains(word) || COMPOUND_END_KEYWORDS.contains(word))
        .map(str::to_owned)
}
