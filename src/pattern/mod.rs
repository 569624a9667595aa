//! Patterns: matchers plus an optional pre-callback transform.
//!
//! # Architecture
//!
//! - [`Pattern`]: trait producing a fresh [`Matcher`] per pass and
//!   transforming matched substrings
//! - [`Matcher`]: reports [`MatchUnit`]s for a text
//! - Built-ins: [`LinkPattern`], [`UserNamePattern`], [`UnicodePattern`],
//!   and [`RegexPattern`] for caller-supplied expressions
//!
//! # Example
//!
//! ```rust
//! use annotext::pattern::{Pattern, UserNamePattern};
//!
//! let matcher = UserNamePattern.compile().unwrap();
//! let units = matcher.match_units("hi @bob").unwrap();
//! assert_eq!(units[0].range, 3..7);
//! ```

mod custom;
mod link;
mod unicode;
mod username;

use std::borrow::Cow;
use std::ops::Range;

use thiserror::Error;

pub use custom::RegexPattern;
pub use link::LinkPattern;
pub use unicode::{decode_escape, UnicodePattern};
pub use username::UserNamePattern;

/// Pattern errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern '{pattern}' failed to compile: {message}")]
    Construction { pattern: String, message: String },

    #[error("pattern '{pattern}' failed while matching: {message}")]
    Match { pattern: String, message: String },
}

impl PatternError {
    pub fn construction(pattern: &str, message: impl ToString) -> Self {
        Self::Construction {
            pattern: pattern.to_string(),
            message: message.to_string(),
        }
    }
}

/// Failure reported by a matcher engine while scanning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct MatchError(pub String);

/// One addressable match: a whole match (group 0) or one capture group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchUnit {
    /// Byte range in the scanned text.
    pub range: Range<usize>,
    /// Capture group index, 0 for the whole match.
    pub group: usize,
}

impl MatchUnit {
    #[must_use]
    pub fn whole(range: Range<usize>) -> Self {
        Self { range, group: 0 }
    }
}

/// A compiled matcher.
///
/// Units are reported in ascending position order: match by match, and
/// within a match group 0 first followed by every participating group.
pub trait Matcher {
    fn match_units(&self, text: &str) -> Result<Vec<MatchUnit>, MatchError>;
}

/// A pattern that can be bound to an annotation callback.
pub trait Pattern: Send + Sync {
    /// Pattern name (e.g., "link", "username"), used in logs and errors.
    fn name(&self) -> &str;

    /// Build a fresh matcher. Called once per pass; never cached.
    fn compile(&self) -> Result<Box<dyn Matcher>, PatternError>;

    /// Rewrite a matched substring before the callback sees it.
    ///
    /// Must be total: on anything it cannot interpret, return the input.
    fn transform<'a>(&self, matched: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(matched)
    }
}

impl Matcher for fancy_regex::Regex {
    fn match_units(&self, text: &str) -> Result<Vec<MatchUnit>, MatchError> {
        let mut units = Vec::new();
        for captures in self.captures_iter(text) {
            let captures = captures.map_err(|e| MatchError(e.to_string()))?;
            for group in 0..captures.len() {
                if let Some(m) = captures.get(group) {
                    units.push(MatchUnit {
                        range: m.start()..m.end(),
                        group,
                    });
                }
            }
        }
        Ok(units)
    }
}

impl Matcher for regex::Regex {
    fn match_units(&self, text: &str) -> Result<Vec<MatchUnit>, MatchError> {
        let mut units = Vec::new();
        for captures in self.captures_iter(text) {
            for group in 0..captures.len() {
                if let Some(m) = captures.get(group) {
                    units.push(MatchUnit {
                        range: m.start()..m.end(),
                        group,
                    });
                }
            }
        }
        Ok(units)
    }
}

/// Compile a case-insensitive `fancy-regex` expression for a built-in pattern.
fn compile_insensitive(name: &str, source: &str) -> Result<Box<dyn Matcher>, PatternError> {
    let regex = fancy_regex::Regex::new(&format!("(?i){source}"))
        .map_err(|e| PatternError::construction(name, e))?;
    Ok(Box::new(regex))
}
