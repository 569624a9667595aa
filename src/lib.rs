//! `annotext` - pattern-based text annotation
//!
//! # Features
//!
//! - **Patterns**: URLs, `@mentions`, `U+XXXX` escapes, or any regex
//! - **Ordered rewriting**: each pattern pass sees the previous pass's output,
//!   with match offsets kept correct across length-changing replacements
//! - **Styled output**: contiguous attribute runs over the final text
//! - **Batches**: many texts in parallel, completed exactly once
//!
//! # Example
//!
//! ```rust
//! use annotext::annotate::{AnnotationPipeline, Attributes, MatchedResponse, FONT};
//! use annotext::pattern::{UnicodePattern, UserNamePattern};
//!
//! let mut pipeline = AnnotationPipeline::new();
//! pipeline
//!     .register(UserNamePattern, |s| MatchedResponse::new(s).with_attribute(FONT, "bold"))
//!     .register(UnicodePattern, |s| MatchedResponse::new(s));
//!
//! let styled = pipeline.process("see @bob and U+1F602 now", &Attributes::new()).unwrap();
//! assert_eq!(styled.text(), "see @bob and 😂 now");
//! ```

pub mod annotate;
pub mod config;
pub mod dispatch;
pub mod input;
pub mod pattern;

pub use annotate::{
    AnnotateError, AnnotationPipeline, Attributes, MatchedResponse, MatcherBinding, StyleRun,
    StyledText,
};
pub use config::AnnotateConfig;
pub use dispatch::{Annotated, BatchItem, BatchOutcome, Dispatcher, DispatcherConfig};
pub use pattern::{
    LinkPattern, MatchUnit, Matcher, Pattern, PatternError, RegexPattern, UnicodePattern,
    UserNamePattern,
};

/// Version of annotext
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
