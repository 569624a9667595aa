//! URL detection backed by `linkify`.

use linkify::{LinkFinder, LinkKind};

use super::{MatchError, MatchUnit, Matcher, Pattern, PatternError};

/// Pattern matching URLs (`https://example.com/path`, `www.example.com`).
///
/// Span detection is delegated to [`linkify`]; this pattern has no grammar
/// of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkPattern;

struct LinkMatcher {
    finder: LinkFinder,
}

impl Matcher for LinkMatcher {
    fn match_units(&self, text: &str) -> Result<Vec<MatchUnit>, MatchError> {
        Ok(self
            .finder
            .links(text)
            .map(|link| MatchUnit::whole(link.start()..link.end()))
            .collect())
    }
}

impl Pattern for LinkPattern {
    fn name(&self) -> &str {
        "link"
    }

    fn compile(&self) -> Result<Box<dyn Matcher>, PatternError> {
        let mut finder = LinkFinder::new();
        finder.kinds(&[LinkKind::Url]);
        finder.url_must_have_scheme(false);
        Ok(Box::new(LinkMatcher { finder }))
    }
}
