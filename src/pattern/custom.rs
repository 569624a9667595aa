//! Caller-supplied regular expression patterns.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use super::{Matcher, Pattern, PatternError};

type TransformFn = dyn Fn(&str) -> String + Send + Sync;

/// A named `fancy-regex` pattern with an optional transform.
///
/// The expression is compiled lazily in [`Pattern::compile`], so an invalid
/// source is reported when a text is processed, not when the pattern is built.
///
/// ```rust
/// use annotext::pattern::{Pattern, RegexPattern};
///
/// let hashtag = RegexPattern::new("hashtag", r"(?<![^\s])#\w+")
///     .with_transform(|tag| tag.to_uppercase());
/// assert_eq!(hashtag.transform("#rust"), "#RUST");
/// ```
#[derive(Clone)]
pub struct RegexPattern {
    name: String,
    source: String,
    case_insensitive: bool,
    transform: Option<Arc<TransformFn>>,
}

impl RegexPattern {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            case_insensitive: false,
            transform: None,
        }
    }

    #[must_use]
    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    #[must_use]
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for RegexPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexPattern")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("case_insensitive", &self.case_insensitive)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl Pattern for RegexPattern {
    fn name(&self) -> &str {
        &self.name
    }

    fn compile(&self) -> Result<Box<dyn Matcher>, PatternError> {
        let source = if self.case_insensitive {
            Cow::Owned(format!("(?i){}", self.source))
        } else {
            Cow::Borrowed(self.source.as_str())
        };
        let regex = fancy_regex::Regex::new(&source)
            .map_err(|e| PatternError::construction(&self.name, e))?;
        Ok(Box::new(regex))
    }

    fn transform<'a>(&self, matched: &'a str) -> Cow<'a, str> {
        match &self.transform {
            Some(transform) => Cow::Owned(transform(matched)),
            None => Cow::Borrowed(matched),
        }
    }
}
