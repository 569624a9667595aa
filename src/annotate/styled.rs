//! Styled text: a string plus contiguous attribute runs.
//!
//! Offsets are byte offsets into the UTF-8 buffer. Runs always cover the
//! whole buffer with no gaps or overlaps, and every boundary sits on a
//! `char` boundary.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::Serialize;
use serde_json::Value;

/// Foreground color attribute key.
pub const FOREGROUND_COLOR: &str = "foregroundColor";
/// Font attribute key.
pub const FONT: &str = "font";
/// Link target attribute key (usually the matched URL).
pub const LINK_TARGET: &str = "linkTarget";

/// Style attributes keyed by opaque, renderer-defined names.
pub type Attributes = BTreeMap<String, Value>;

/// Copy every key of `overrides` onto `target`, leaving other keys alone.
pub fn merge_attributes(target: &mut Attributes, overrides: &Attributes) {
    for (key, value) in overrides {
        target.insert(key.clone(), value.clone());
    }
}

/// A byte range of a [`StyledText`] sharing one attribute set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleRun {
    pub start: usize,
    pub end: usize,
    pub attributes: Attributes,
}

impl StyleRun {
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Result of annotating a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledText {
    text: String,
    runs: Vec<StyleRun>,
}

impl StyledText {
    /// Create styled text with `base` applied over the full range.
    ///
    /// An empty text has no runs.
    pub fn new(text: impl Into<String>, base: &Attributes) -> Self {
        let text = text.into();
        let runs = if text.is_empty() {
            Vec::new()
        } else {
            vec![StyleRun {
                start: 0,
                end: text.len(),
                attributes: base.clone(),
            }]
        };
        Self { text, runs }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn runs(&self) -> &[StyleRun] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Attributes in effect at byte `offset`, or `None` past the end.
    pub fn attributes_at(&self, offset: usize) -> Option<&Attributes> {
        self.runs
            .iter()
            .find(|run| run.start <= offset && offset < run.end)
            .map(|run| &run.attributes)
    }

    /// Runs intersecting `range`.
    pub fn runs_in(&self, range: Range<usize>) -> impl Iterator<Item = &StyleRun> {
        self.runs
            .iter()
            .filter(move |run| run.start < range.end && range.start < run.end)
    }

    /// Find the byte range of the first occurrence of `needle`.
    pub fn find(&self, needle: &str) -> Option<Range<usize>> {
        self.text
            .find(needle)
            .map(|start| start..start + needle.len())
    }

    #[must_use]
    pub fn into_text(self) -> String {
        self.text
    }

    /// Whether `range` can be spliced: inside the buffer and on char boundaries.
    pub(crate) fn is_valid_range(&self, range: &Range<usize>) -> bool {
        range.start <= range.end
            && range.end <= self.text.len()
            && self.text.is_char_boundary(range.start)
            && self.text.is_char_boundary(range.end)
    }

    /// Attributes a replacement starting at `offset` inherits.
    ///
    /// At the very end of the buffer this is the last run; for an empty
    /// buffer it is `fallback`.
    pub(crate) fn inherited_attributes(&self, offset: usize, fallback: &Attributes) -> Attributes {
        self.attributes_at(offset)
            .or_else(|| self.runs.last().map(|run| &run.attributes))
            .unwrap_or(fallback)
            .clone()
    }

    /// Replace `range` with `replacement`, styling the new text with `attributes`.
    ///
    /// Runs before the range are kept, runs after it are shifted by the
    /// length difference, and runs straddling an edge are cut.
    pub(crate) fn splice(
        &mut self,
        range: Range<usize>,
        replacement: &str,
        attributes: Attributes,
    ) {
        debug_assert!(self.is_valid_range(&range));
        self.text.replace_range(range.clone(), replacement);

        let new_end = range.start + replacement.len();
        let shift = |offset: usize| offset - range.end + new_end;

        let mut before = Vec::with_capacity(self.runs.len() + 1);
        let mut after = Vec::new();
        for run in std::mem::take(&mut self.runs) {
            if run.start < range.start {
                before.push(StyleRun {
                    start: run.start,
                    end: run.end.min(range.start),
                    attributes: run.attributes.clone(),
                });
            }
            if run.end > range.end {
                after.push(StyleRun {
                    start: shift(run.start.max(range.end)),
                    end: shift(run.end),
                    attributes: run.attributes,
                });
            }
        }

        if !replacement.is_empty() {
            before.push(StyleRun {
                start: range.start,
                end: new_end,
                attributes,
            });
        }
        before.extend(after);
        self.runs = before;
    }

    /// Merge adjacent runs carrying identical attributes.
    #[must_use]
    pub(crate) fn coalesced(mut self) -> Self {
        let mut runs: Vec<StyleRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs {
            match runs.last_mut() {
                Some(last) if last.end == run.start && last.attributes == run.attributes => {
                    last.end = run.end;
                }
                _ => runs.push(run),
            }
        }
        self.runs = runs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(pairs: &[(&str, Value)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn assert_covering(styled: &StyledText) {
        let mut cursor = 0;
        for run in styled.runs() {
            assert_eq!(run.start, cursor, "gap or overlap in {:?}", styled.runs());
            assert!(run.end > run.start);
            cursor = run.end;
        }
        assert_eq!(cursor, styled.len());
    }

    #[test]
    fn new_applies_base_over_full_range() {
        let base = attrs(&[(FONT, json!("system"))]);
        let styled = StyledText::new("hello", &base);
        assert_eq!(styled.runs().len(), 1);
        assert_eq!(styled.runs()[0].range(), 0..5);
        assert_eq!(styled.attributes_at(4), Some(&base));
        assert_eq!(styled.attributes_at(5), None);
    }

    #[test]
    fn empty_text_has_no_runs() {
        let styled = StyledText::new("", &Attributes::new());
        assert!(styled.runs().is_empty());
        assert!(styled.is_empty());
    }

    #[test]
    fn splice_shorter_replacement_shifts_following_runs() {
        let base = attrs(&[(FONT, json!("system"))]);
        let bold = attrs(&[(FONT, json!("bold"))]);
        let mut styled = StyledText::new("abc U+1F602 xyz", &base);
        styled.splice(4..11, "😂", bold.clone());

        assert_eq!(styled.text(), "abc 😂 xyz");
        assert_covering(&styled);
        assert_eq!(styled.runs().len(), 3);
        assert_eq!(styled.runs()[1].range(), 4..8);
        assert_eq!(styled.runs()[1].attributes, bold);
        assert_eq!(styled.runs()[2].range(), 8..12);
        assert_eq!(styled.runs()[2].attributes, base);
    }

    #[test]
    fn splice_longer_replacement_inside_run() {
        let base = Attributes::new();
        let red = attrs(&[(FOREGROUND_COLOR, json!("red"))]);
        let mut styled = StyledText::new("a:b", &base);
        styled.splice(1..2, " => ", red.clone());

        assert_eq!(styled.text(), "a => b");
        assert_covering(&styled);
        assert_eq!(styled.attributes_at(1), Some(&red));
        assert_eq!(styled.attributes_at(5), Some(&base));
    }

    #[test]
    fn splice_across_run_boundary_cuts_both_runs() {
        let base = Attributes::new();
        let red = attrs(&[(FOREGROUND_COLOR, json!("red"))]);
        let blue = attrs(&[(FOREGROUND_COLOR, json!("blue"))]);
        let mut styled = StyledText::new("0123456789", &base);
        styled.splice(2..5, "234", red);
        styled.splice(4..7, "X", blue.clone());

        assert_eq!(styled.text(), "0123X789");
        assert_covering(&styled);
        let colors: Vec<_> = styled
            .runs()
            .iter()
            .map(|run| (run.range(), run.attributes.get(FOREGROUND_COLOR).cloned()))
            .collect();
        assert_eq!(
            colors,
            vec![
                (0..2, None),
                (2..4, Some(json!("red"))),
                (4..5, Some(json!("blue"))),
                (5..8, None),
            ]
        );
    }

    #[test]
    fn splice_with_empty_replacement_drops_the_run() {
        let base = Attributes::new();
        let mut styled = StyledText::new("keep-drop-keep", &base);
        styled.splice(4..9, "", attrs(&[(FONT, json!("x"))]));
        assert_eq!(styled.text(), "keep-keep");
        assert_covering(&styled);
        assert!(styled.runs().iter().all(|run| run.attributes.is_empty()));
    }

    #[test]
    fn inherited_attributes_at_end_uses_last_run() {
        let base = attrs(&[(FONT, json!("system"))]);
        let styled = StyledText::new("abc", &base);
        assert_eq!(styled.inherited_attributes(3, &Attributes::new()), base);

        let empty = StyledText::new("", &Attributes::new());
        assert_eq!(empty.inherited_attributes(0, &base), base);
    }

    #[test]
    fn coalesced_merges_equal_neighbours() {
        let base = Attributes::new();
        let mut styled = StyledText::new("abcdef", &base);
        styled.splice(2..4, "cd", base.clone());
        assert_eq!(styled.runs().len(), 3);
        let styled = styled.coalesced();
        assert_eq!(styled.runs().len(), 1);
        assert_eq!(styled.runs()[0].range(), 0..6);
    }

    #[test]
    fn merge_overwrites_only_incoming_keys() {
        let mut target = attrs(&[(FONT, json!("system")), (FOREGROUND_COLOR, json!("black"))]);
        merge_attributes(&mut target, &attrs(&[(FOREGROUND_COLOR, json!("red"))]));
        assert_eq!(target.get(FONT), Some(&json!("system")));
        assert_eq!(target.get(FOREGROUND_COLOR), Some(&json!("red")));
    }

    #[test]
    fn serializes_runs_with_offsets() {
        let styled = StyledText::new("hi", &attrs(&[(FONT, json!("system"))]));
        let value = serde_json::to_value(&styled).unwrap();
        assert_eq!(value["text"], "hi");
        assert_eq!(value["runs"][0]["start"], 0);
        assert_eq!(value["runs"][0]["end"], 2);
        assert_eq!(value["runs"][0]["attributes"]["font"], "system");
    }
}
