use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;

use annotext::{input, AnnotateConfig, BatchItem, Dispatcher};

use super::output::print_results;
use crate::OutputFormat;

pub async fn cmd_annotate(
    config_path: Option<&Path>,
    input_path: Option<&Path>,
    format: OutputFormat,
    jobs: Option<usize>,
    timeout_ms: Option<u64>,
    ordered: bool,
) -> Result<()> {
    let config = AnnotateConfig::load(config_path)?;
    let texts = input::load_texts_blocking(input_path.map(Path::to_path_buf)).await?;

    let mut dispatcher_config = config.dispatcher_config();
    if let Some(jobs) = jobs {
        dispatcher_config = dispatcher_config.with_max_concurrency(jobs);
    }
    if let Some(ms) = timeout_ms {
        dispatcher_config = dispatcher_config.with_job_timeout(Duration::from_millis(ms));
    }

    let dispatcher = Dispatcher::with_config(config.build_pipeline(), dispatcher_config);
    let items = texts
        .into_iter()
        .map(|text| BatchItem::new(text, config.base.clone()));

    let start = Instant::now();
    let outcome = dispatcher.run(items).await;
    let elapsed = start.elapsed();

    let (submitted, failed) = (outcome.submitted, outcome.failed);
    let results = if ordered {
        outcome.into_submission_order()
    } else {
        outcome.results
    };

    print_results(&results, format)?;

    if failed > 0 {
        eprintln!("⚠️  {failed} of {submitted} texts failed to annotate");
    }
    tracing::debug!(elapsed_ms = elapsed.as_secs_f64() * 1000.0, "annotate finished");

    Ok(())
}
