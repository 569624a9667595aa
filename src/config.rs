//! Annotation configuration loaded from `~/.config/annotext/annotext.toml`.
//!
//! Every section is optional. With no file at all the defaults reproduce the
//! classic review-feed styling: links blue with a link target, mentions red
//! and bold, unicode escapes decoded, body text black in the system font.
//!
//! ```toml
//! [base]
//! foregroundColor = "black"
//!
//! [username]
//! attributes = { foregroundColor = "purple" }
//!
//! [[patterns]]
//! name = "hashtag"
//! regex = "(?<![^\\s])#\\w+"
//! attributes = { foregroundColor = "green" }
//!
//! [dispatcher]
//! max_concurrency = 4
//! job_timeout_ms = 2000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use crate::annotate::{
    AnnotationPipeline, Attributes, MatchedResponse, FONT, FOREGROUND_COLOR, LINK_TARGET,
};
use crate::dispatch::DispatcherConfig;
use crate::pattern::{LinkPattern, RegexPattern, UnicodePattern, UserNamePattern};

/// Settings for one built-in pattern.
#[derive(Debug, Clone, Deserialize)]
pub struct BuiltinRule {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Add the matched text as `linkTarget`. Defaults on for links only.
    #[serde(default)]
    pub link_target: Option<bool>,
    /// Overrides for the built-in's default attributes.
    #[serde(default)]
    pub attributes: Option<Attributes>,
}

impl Default for BuiltinRule {
    fn default() -> Self {
        Self {
            enabled: true,
            link_target: None,
            attributes: None,
        }
    }
}

fn enabled_by_default() -> bool {
    true
}

/// A caller-defined regex rule, applied after the built-ins.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomRule {
    pub name: String,
    pub regex: String,
    #[serde(default)]
    pub case_insensitive: bool,
    /// Literal replacement; the match is kept when absent.
    #[serde(default)]
    pub replacement: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
}

/// Dispatcher section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatcherSettings {
    pub max_concurrency: Option<usize>,
    pub job_timeout_ms: Option<u64>,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnnotateConfig {
    /// Attributes applied to the whole text before any pattern runs.
    pub base: Attributes,
    pub link: BuiltinRule,
    pub username: BuiltinRule,
    pub unicode: BuiltinRule,
    pub patterns: Vec<CustomRule>,
    pub dispatcher: DispatcherSettings,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            link: BuiltinRule::default(),
            username: BuiltinRule::default(),
            unicode: BuiltinRule::default(),
            patterns: Vec::new(),
            dispatcher: DispatcherSettings::default(),
        }
    }
}

fn default_base() -> Attributes {
    Attributes::from([
        (FOREGROUND_COLOR.to_string(), json!("black")),
        (FONT.to_string(), json!({ "family": "system", "size": 14 })),
    ])
}

fn default_link_attributes() -> Attributes {
    Attributes::from([(FOREGROUND_COLOR.to_string(), json!("blue"))])
}

fn default_username_attributes() -> Attributes {
    Attributes::from([
        (FOREGROUND_COLOR.to_string(), json!("red")),
        (FONT.to_string(), json!({ "family": "system", "size": 14, "weight": "bold" })),
    ])
}

impl AnnotateConfig {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file at the default location yields the defaults; an
    /// explicitly given path must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = config_path();
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        Self::from_toml_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Register enabled built-ins (link, username, unicode) then custom rules.
    pub fn build_pipeline(&self) -> AnnotationPipeline {
        let mut pipeline = AnnotationPipeline::new();

        if self.link.enabled {
            let attributes = self
                .link
                .attributes
                .clone()
                .unwrap_or_else(default_link_attributes);
            let link_target = self.link.link_target.unwrap_or(true);
            pipeline.register(LinkPattern, move |url| {
                let mut response = MatchedResponse::new(url).with_attributes(attributes.clone());
                if link_target {
                    response = response.with_attribute(LINK_TARGET, url);
                }
                response
            });
        }

        if self.username.enabled {
            let attributes = self
                .username
                .attributes
                .clone()
                .unwrap_or_else(default_username_attributes);
            let link_target = self.username.link_target.unwrap_or(false);
            pipeline.register(UserNamePattern, styled_callback(attributes, link_target));
        }

        if self.unicode.enabled {
            let attributes = self.unicode.attributes.clone().unwrap_or_default();
            let link_target = self.unicode.link_target.unwrap_or(false);
            pipeline.register(UnicodePattern, styled_callback(attributes, link_target));
        }

        for rule in &self.patterns {
            let pattern =
                RegexPattern::new(&rule.name, &rule.regex).case_insensitive(rule.case_insensitive);
            let attributes = rule.attributes.clone();
            let replacement = rule.replacement.clone();
            pipeline.register(pattern, move |matched| {
                let text = replacement.as_deref().unwrap_or(matched);
                let response = MatchedResponse::new(text);
                if attributes.is_empty() {
                    response
                } else {
                    response.with_attributes(attributes.clone())
                }
            });
        }

        pipeline
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        let mut config = DispatcherConfig::default();
        if let Some(max) = self.dispatcher.max_concurrency {
            config = config.with_max_concurrency(max);
        }
        if let Some(ms) = self.dispatcher.job_timeout_ms {
            config = config.with_job_timeout(Duration::from_millis(ms));
        }
        config
    }
}

fn styled_callback(
    attributes: Attributes,
    link_target: bool,
) -> impl Fn(&str) -> MatchedResponse + Send + Sync + 'static {
    move |matched| {
        let mut response = MatchedResponse::new(matched);
        if !attributes.is_empty() {
            response = response.with_attributes(attributes.clone());
        }
        if link_target {
            response = response.with_attribute(LINK_TARGET, matched);
        }
        response
    }
}

/// Return the path to the config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("annotext")
        .join("annotext.toml")
}
