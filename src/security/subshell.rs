//! Detection of command and process substitution.
//!
//! This check runs before segmentation: a parser handed a string with a
//! subshell could be confused into treating the subshell contents as a
//! separate, seemingly safe segment, so validation short-circuits instead.

use once_cell::sync::Lazy;
use regex::Regex;

// $(...) - command substitution, but not $VAR or ${VAR}
#[expect(clippy::expect_used)]
static COMMAND_SUBSTITUTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\([^)]*\)").expect("valid regex"));

// <(...) or >(...) - process substitution
#[expect(clippy::expect_used)]
static PROCESS_SUBSTITUTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[<>]\([^)]*\)").expect("valid regex"));

/// Returns true if the raw command text contains `$(...)`, backticks,
/// `<(...)` or `>(...)`. Ordinary variable expansion (`$VAR`, `${VAR}`)
/// does not trigger it.
pub fn contains_subshell(command: &str) -> bool {
    if command.contains('`') {
        return true;
    }
    if COMMAND_SUBSTITUTION.is_match(command) {
        return true;
    }
    PROCESS_SUBSTITUTION.is_match(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_substitution() {
        assert!(contains_subshell("echo $(whoami)"));
        assert!(contains_subshell("kubectl get pods -n $(cat ns.txt)"));
    }

    #[test]
    fn test_backtick_substitution() {
        assert!(contains_subshell("echo `whoami`"));
        assert!(contains_subshell("ls `pwd`"));
    }

    #[test]
    fn test_process_substitution() {
        assert!(contains_subshell("diff <(ls a) <(ls b)"));
        assert!(contains_subshell("tee >(wc -l)"));
    }

    #[test]
    fn test_variable_expansion_is_benign() {
        assert!(!contains_subshell("echo $HOME"));
        assert!(!contains_subshell("echo ${HOME}"));
        assert!(!contains_subshell("kubectl get pods -n $NAMESPACE"));
    }

    #[test]
    fn test_plain_commands() {
        assert!(!contains_subshell("ls -la"));
        assert!(!contains_subshell("kubectl get pods | grep error"));
    }
}
