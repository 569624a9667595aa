//! Review payload decoding.
//!
//! Accepts either `{"reviews": ["...", ...]}` or a bare JSON array of
//! strings, from a file or stdin.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Reviews { reviews: Vec<String> },
    List(Vec<String>),
}

/// Decode texts from a JSON payload.
pub fn parse_texts(json: &str) -> Result<Vec<String>> {
    let payload: Payload = serde_json::from_str(json)
        .context("expected {\"reviews\": [..]} or an array of strings")?;
    Ok(match payload {
        Payload::Reviews { reviews } => reviews,
        Payload::List(texts) => texts,
    })
}

/// Read and decode texts from `path`, or stdin when `None` or `-`.
pub fn load_texts(path: Option<&Path>) -> Result<Vec<String>> {
    let content = match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    let texts = parse_texts(&content)?;
    tracing::debug!(count = texts.len(), "decoded input texts");
    Ok(texts)
}

/// [`load_texts`] on the blocking thread pool.
pub async fn load_texts_blocking(path: Option<PathBuf>) -> Result<Vec<String>> {
    tokio::task::spawn_blocking(move || load_texts(path.as_deref()))
        .await
        .context("input reader task failed")?
}
