//! Text annotation: patterns in, styled text out.
//!
//! Provides the single-text pipeline and the types it produces.
//!
//! # Features
//!
//! - **Ordered passes** - bindings apply in registration order, each seeing
//!   the text rewritten by the previous ones
//! - **Length-changing rewrites** - replacements may grow or shrink the text
//! - **Attribute merging** - callback overrides layer over inherited styles
//!
//! # Example
//!
//! ```rust
//! use annotext::annotate::{AnnotationPipeline, Attributes, MatchedResponse, FONT};
//! use annotext::pattern::UserNamePattern;
//!
//! let mut pipeline = AnnotationPipeline::new();
//! pipeline.register(UserNamePattern, |handle| {
//!     MatchedResponse::new(handle).with_attribute(FONT, "bold")
//! });
//!
//! let styled = pipeline.process("thanks @bob", &Attributes::new()).unwrap();
//! assert_eq!(styled.attributes_at(7).unwrap()[FONT], "bold");
//! ```

pub mod pipeline;
pub mod styled;

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::pattern::PatternError;

pub use pipeline::{AnnotationCallback, AnnotationPipeline, MatcherBinding};
pub use styled::{
    merge_attributes, Attributes, StyleRun, StyledText, FONT, FOREGROUND_COLOR, LINK_TARGET,
};

/// Annotation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotateError {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("annotation job {index} timed out after {after:?}")]
    Timeout { index: usize, after: Duration },

    #[error("annotation job {index} was cancelled before it started")]
    Cancelled { index: usize },

    #[error("annotation task failed: {0}")]
    Join(String),
}

pub type Result<T> = std::result::Result<T, AnnotateError>;

/// What a callback returns for one match.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchedResponse {
    /// Text replacing the match.
    pub replacement: String,
    /// Attributes merged over those already at the match.
    pub attributes: Option<Attributes>,
}

impl MatchedResponse {
    pub fn new(replacement: impl Into<String>) -> Self {
        Self {
            replacement: replacement.into(),
            attributes: None,
        }
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Add one override, creating the override set if needed.
    #[must_use]
    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes
            .get_or_insert_with(Attributes::new)
            .insert(key.to_string(), value.into());
        self
    }
}
