//! Destination naming for published spaces.
//!
//! Names are lowercase `[a-z0-9-]`, at most [`MAX_BASE_LEN`] characters before
//! the prefix and random suffix, and never start or end with a hyphen.
//! Every call draws a fresh suffix, so republishing the same model lands in a
//! new space instead of overwriting the old one.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Maximum length of the sanitized model-name portion.
pub const MAX_BASE_LEN: usize = 40;

/// Base used when nothing survives sanitizing.
pub const PLACEHOLDER_BASE: &str = "model";

/// Prefix marking spaces created by this pipeline.
pub const NAME_PREFIX: &str = "ml";

/// Length of the random collision-avoidance suffix.
pub const SUFFIX_LEN: usize = 6;

/// A generated destination inside a hosting account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceTarget {
    pub account: String,
    pub name: String,
}

impl SpaceTarget {
    /// Draw a new destination for `model_name` under `account`.
    pub fn generate(account: &str, owner: &str, model_name: &str) -> Self {
        let name = space_name(model_name, &random_suffix());
        tracing::debug!(owner = %owner, model_name = %model_name, space = %name, "generated space name");
        Self {
            account: account.to_string(),
            name,
        }
    }

    /// Full destination identifier, `{account}/{name}`.
    pub fn space_id(&self) -> String {
        format!("{}/{}", self.account, self.name)
    }
}

/// Reduce a display name to the `[a-z0-9-]` base of a space name.
pub fn sanitize_base(model_name: &str) -> String {
    let mut base = String::with_capacity(model_name.len());
    let mut pending_hyphen = false;

    for c in model_name.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !base.is_empty() {
                base.push('-');
            }
            pending_hyphen = false;
            base.push(c);
        }
    }

    if base.len() > MAX_BASE_LEN {
        base.truncate(MAX_BASE_LEN);
        while base.ends_with('-') {
            base.pop();
        }
    }

    if base.is_empty() {
        PLACEHOLDER_BASE.to_string()
    } else {
        base
    }
}

/// Compose a space name from a display name and a suffix token.
pub fn space_name(model_name: &str, suffix: &str) -> String {
    format!("{}-{}-{}", NAME_PREFIX, sanitize_base(model_name), suffix)
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(base: &str) {
        assert!(!base.is_empty());
        assert!(base.len() <= MAX_BASE_LEN, "too long: {}", base);
        assert!(
            base.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
            "bad chars: {}",
            base
        );
        assert!(!base.starts_with('-') && !base.ends_with('-'), "edge hyphen: {}", base);
        assert!(!base.contains("--"), "hyphen run: {}", base);
    }

    #[test]
    fn test_example_name() {
        assert_eq!(sanitize_base("My Cool Model!!"), "my-cool-model");
        let target = SpaceTarget::generate("acct", "Alice Smith", "My Cool Model!!");
        assert!(target.name.starts_with("ml-my-cool-model-"));
        assert_eq!(target.name.len(), "ml-my-cool-model-".len() + SUFFIX_LEN);
        assert!(target.space_id().starts_with("acct/ml-my-cool-model-"));
    }

    #[test]
    fn test_whitespace_and_hyphen_runs_collapse() {
        assert_eq!(sanitize_base("  a \t b--c - - d  "), "a-b-c-d");
        assert_eq!(sanitize_base("---x---"), "x");
    }

    #[test]
    fn test_removed_characters_do_not_leave_hyphens() {
        assert_eq!(sanitize_base("a!-!b"), "a-b");
        assert_eq!(sanitize_base("Model_v2.1"), "modelv21");
    }

    #[test]
    fn test_empty_result_uses_placeholder() {
        assert_eq!(sanitize_base(""), PLACEHOLDER_BASE);
        assert_eq!(sanitize_base("!!! ???"), PLACEHOLDER_BASE);
        assert_eq!(sanitize_base("日本語"), PLACEHOLDER_BASE);
    }

    #[test]
    fn test_long_names_are_truncated_without_trailing_hyphen() {
        let name = format!("{} tail", "a".repeat(MAX_BASE_LEN - 1));
        let base = sanitize_base(&name);
        assert_eq!(base, "a".repeat(MAX_BASE_LEN - 1));
        assert_well_formed(&base);

        let base = sanitize_base(&"word ".repeat(30));
        assert_well_formed(&base);
    }

    #[test]
    fn test_sanitized_bases_are_well_formed() {
        for name in [
            "My Cool Model!!",
            "UPPER lower 123",
            "  - leading and trailing -  ",
            "tabs\tand\nnewlines",
            "émoji 🚀 model",
            "x",
        ] {
            assert_well_formed(&sanitize_base(name));
        }
    }

    #[test]
    fn test_suffix_is_random_and_url_safe() {
        let a = SpaceTarget::generate("acct", "owner", "model");
        let b = SpaceTarget::generate("acct", "owner", "model");
        assert_ne!(a.name, b.name);

        let suffix = random_suffix();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_space_name_layout() {
        assert_eq!(space_name("Fraud Detector", "abc123"), "ml-fraud-detector-abc123");
    }
}
