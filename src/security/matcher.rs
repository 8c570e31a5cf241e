//! Boundary-aware prefix matching for allow/deny lists.
//!
//! Two predicates with deliberately asymmetric strictness: the allow-side
//! match is lenient, the deny-side match additionally covers the plural
//! form of the prefix so that resource-type aliases cannot slip past it.

/// Check whether a command segment starts with `prefix` at a word boundary.
///
/// A boundary is end-of-segment, whitespace, or `/` (the latter covers
/// `kubectl get secret/my-secret` against `kubectl get secret`).
///
/// Used for allow-list matching and for filtering prefixes that still need
/// human approval.
pub fn matches_prefix(segment: &str, prefix: &str) -> bool {
    starts_at_boundary(segment.trim(), prefix.trim())
}

/// Check whether a segment matches a deny-list prefix.
///
/// Same boundary rule as [`matches_prefix`], but the prefix is also tried
/// in its pluralized form (`prefix` + `s`). This catches aliases like
/// `secrets` for a deny entry of `kubectl get secret`. The `+ "s"` rule is
/// a literal heuristic, not a linguistic pluralizer, and is kept as such.
pub fn matches_deny_prefix(segment: &str, prefix: &str) -> bool {
    let segment = segment.trim();
    let prefix = prefix.trim();

    if starts_at_boundary(segment, prefix) {
        return true;
    }
    starts_at_boundary(segment, &format!("{prefix}s"))
}

fn starts_at_boundary(segment: &str, prefix: &str) -> bool {
    let Some(rest) = segment.strip_prefix(prefix) else {
        return false;
    };
    match rest.chars().next() {
        None => true,
        Some(next) => next.is_whitespace() || next == '/',
    }
}
