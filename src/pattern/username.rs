//! `@handle` mentions, as highlighted by social platforms.

use super::{compile_insensitive, Matcher, Pattern, PatternError};

/// Matches `@` followed by 1-15 word characters, at start of text or after
/// whitespace.
///
/// Platforms require 4-15 characters for a handle but highlight from one,
/// so the lower bound is 1. `(?<![^\s])` is the constant-width form of
/// "preceded by whitespace or nothing".
pub const USER_NAME_REGEX: &str = r"(?<![^\s])@[A-Za-z0-9_]{1,15}\b";

/// Pattern matching user mentions like `@bob`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserNamePattern;

impl Pattern for UserNamePattern {
    fn name(&self) -> &str {
        "username"
    }

    fn compile(&self) -> Result<Box<dyn Matcher>, PatternError> {
        compile_insensitive(self.name(), USER_NAME_REGEX)
    }
}
