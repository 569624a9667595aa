//! Annotation pipeline: ordered pattern passes over one text.
//!
//! Each registered binding is one pass. A pass compiles its pattern, scans
//! the text as left by the previous pass, and rewrites every match through
//! the binding's callback. Within a pass, earlier replacements shift later
//! matches; the shift (drift) starts at zero for every pass.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use tracing::debug;

use super::styled::{merge_attributes, Attributes, StyledText};
use super::{AnnotateError, MatchedResponse, Result};
use crate::pattern::{Pattern, PatternError};

/// Callback mapping a (transformed) match to its replacement and styling.
pub type AnnotationCallback = dyn Fn(&str) -> MatchedResponse + Send + Sync;

/// A registered pattern and its callback.
#[derive(Clone)]
pub struct MatcherBinding {
    pattern: Arc<dyn Pattern>,
    callback: Arc<AnnotationCallback>,
}

impl MatcherBinding {
    pub fn new<P, F>(pattern: P, callback: F) -> Self
    where
        P: Pattern + 'static,
        F: Fn(&str) -> MatchedResponse + Send + Sync + 'static,
    {
        Self {
            pattern: Arc::new(pattern),
            callback: Arc::new(callback),
        }
    }

    pub fn pattern(&self) -> &dyn Pattern {
        self.pattern.as_ref()
    }

    /// Run a single pass of this binding over `styled`.
    ///
    /// `fallback` styles replacements made in a text that has no runs.
    fn apply(&self, mut styled: StyledText, fallback: &Attributes) -> Result<StyledText> {
        let pattern = self.pattern();
        let matcher = pattern.compile()?;

        // Substrings come from the text as it stood when this pass started.
        let scanned = styled.text().to_owned();
        let units = matcher
            .match_units(&scanned)
            .map_err(|e| PatternError::Match {
                pattern: pattern.name().to_string(),
                message: e.to_string(),
            })?;

        debug!(pattern = pattern.name(), units = units.len(), "applying pattern pass");

        let mut drift: isize = 0;
        for unit in units {
            let Some(adjusted) =
                shift_range(&unit.range, drift).filter(|r| styled.is_valid_range(r))
            else {
                debug!(
                    pattern = pattern.name(),
                    group = unit.group,
                    start = unit.range.start,
                    "skipping match unit outside rewritten text"
                );
                continue;
            };

            let matched = &scanned[unit.range.clone()];
            let transformed = pattern.transform(matched);
            let response = (self.callback)(&transformed);

            let mut attributes = styled.inherited_attributes(adjusted.start, fallback);
            if let Some(overrides) = &response.attributes {
                merge_attributes(&mut attributes, overrides);
            }

            styled.splice(adjusted, &response.replacement, attributes);
            drift += byte_len(&response.replacement) - byte_len(matched);
        }

        Ok(styled)
    }
}

impl fmt::Debug for MatcherBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherBinding")
            .field("pattern", &self.pattern.name())
            .finish_non_exhaustive()
    }
}

#[allow(clippy::cast_possible_wrap)]
fn byte_len(s: &str) -> isize {
    s.len() as isize
}

fn shift_range(range: &Range<usize>, drift: isize) -> Option<Range<usize>> {
    Some(range.start.checked_add_signed(drift)?..range.end.checked_add_signed(drift)?)
}

/// Ordered set of [`MatcherBinding`]s applied to texts.
///
/// Cloning is cheap (bindings are reference counted), which is how the
/// dispatcher snapshots the bindings for a batch.
///
/// # Example
///
/// ```rust
/// use annotext::annotate::{AnnotationPipeline, Attributes, MatchedResponse};
/// use annotext::pattern::UnicodePattern;
///
/// let mut pipeline = AnnotationPipeline::new();
/// pipeline.register(UnicodePattern, |decoded| MatchedResponse::new(decoded));
///
/// let styled = pipeline.process("wave U+1F44B", &Attributes::new()).unwrap();
/// assert_eq!(styled.text(), "wave 👋");
/// ```
#[derive(Clone, Default, Debug)]
pub struct AnnotationPipeline {
    bindings: Vec<MatcherBinding>,
}

impl AnnotationPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding. Registration order is application order.
    pub fn register<P, F>(&mut self, pattern: P, callback: F) -> &mut Self
    where
        P: Pattern + 'static,
        F: Fn(&str) -> MatchedResponse + Send + Sync + 'static,
    {
        self.register_binding(MatcherBinding::new(pattern, callback))
    }

    pub fn register_binding(&mut self, binding: MatcherBinding) -> &mut Self {
        self.bindings.push(binding);
        self
    }

    pub fn bindings(&self) -> &[MatcherBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Annotate `text`, starting from `base` over the full range.
    ///
    /// Any pattern failure aborts the whole call: no partial result is
    /// returned and the remaining bindings are not attempted.
    pub fn process(&self, text: &str, base: &Attributes) -> Result<StyledText> {
        let styled = self
            .bindings
            .iter()
            .try_fold(StyledText::new(text, base), |styled, binding| {
                binding.apply(styled, base)
            })?;
        Ok(styled.coalesced())
    }

    /// [`process`](Self::process) on the blocking thread pool.
    pub async fn process_async(
        self: Arc<Self>,
        text: String,
        base: Attributes,
    ) -> Result<StyledText> {
        tokio::task::spawn_blocking(move || self.process(&text, &base))
            .await
            .map_err(|e| AnnotateError::Join(e.to_string()))?
    }
}
