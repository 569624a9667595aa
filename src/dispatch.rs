//! Concurrent batch annotation.
//!
//! Every text in a batch runs as its own job on the blocking thread pool.
//! Jobs report into a channel sized to the batch; one collector task counts
//! exactly one report per job, keeps the successes, and then completes the
//! batch once.
//!
//! # Example
//!
//! ```rust,no_run
//! use annotext::annotate::{AnnotationPipeline, Attributes, MatchedResponse};
//! use annotext::dispatch::{BatchItem, Dispatcher};
//! use annotext::pattern::UserNamePattern;
//!
//! # async fn example() {
//! let mut pipeline = AnnotationPipeline::new();
//! pipeline.register(UserNamePattern, |s| MatchedResponse::new(s));
//!
//! let dispatcher = Dispatcher::new(pipeline);
//! let items = ["hi @a", "hi @b"].map(|t| BatchItem::new(t, Attributes::new()));
//! let outcome = dispatcher.run(items).await;
//! assert_eq!(outcome.results.len(), 2);
//! # }
//! ```

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::annotate::{AnnotateError, AnnotationPipeline, Attributes, StyledText};

/// Dispatcher tuning.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Maximum jobs running at once.
    pub max_concurrency: usize,
    /// Per-job deadline. A job past it counts as failed.
    pub job_timeout: Option<Duration>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_concurrency: std::thread::available_parallelism().map_or(4, NonZeroUsize::get),
            job_timeout: None,
        }
    }
}

impl DispatcherConfig {
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = Some(timeout);
        self
    }
}

/// One text to annotate, with its base attributes.
#[derive(Debug, Clone, Default)]
pub struct BatchItem {
    pub text: String,
    pub attributes: Attributes,
}

impl BatchItem {
    pub fn new(text: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            text: text.into(),
            attributes,
        }
    }
}

/// A successful job, tagged with its position in the submitted batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotated {
    pub index: usize,
    pub styled: StyledText,
}

/// Everything a finished batch delivers.
///
/// `results` is in completion order, not submission order.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub results: Vec<Annotated>,
    pub submitted: usize,
    pub failed: usize,
}

impl BatchOutcome {
    /// Results re-sorted into submission order.
    #[must_use]
    pub fn into_submission_order(mut self) -> Vec<Annotated> {
        self.results.sort_by_key(|annotated| annotated.index);
        self.results
    }

    /// Styled texts in completion order.
    #[must_use]
    pub fn into_styled(self) -> Vec<StyledText> {
        self.results.into_iter().map(|a| a.styled).collect()
    }
}

type JobReport = (usize, Result<StyledText, AnnotateError>);

/// Runs an [`AnnotationPipeline`] over many texts in parallel.
///
/// The dispatcher owns a snapshot of the pipeline, so bindings cannot change
/// while a batch is in flight.
pub struct Dispatcher {
    pipeline: Arc<AnnotationPipeline>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(pipeline: AnnotationPipeline) -> Self {
        Self::with_config(pipeline, DispatcherConfig::default())
    }

    pub fn with_config(pipeline: AnnotationPipeline, config: DispatcherConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            config,
        }
    }

    pub fn pipeline(&self) -> &AnnotationPipeline {
        &self.pipeline
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Start a batch and return immediately.
    ///
    /// `on_complete` runs exactly once, on the collector task, after every
    /// job has finished. Must be called from within a tokio runtime.
    pub fn submit_all<I, F>(&self, items: I, on_complete: F) -> JoinHandle<()>
    where
        I: IntoIterator<Item = BatchItem>,
        F: FnOnce(BatchOutcome) + Send + 'static,
    {
        let (total, reports) = self.spawn_jobs(items);
        tokio::spawn(async move {
            let outcome = collect(total, reports).await;
            on_complete(outcome);
        })
    }

    /// Run a batch to completion.
    pub async fn run<I>(&self, items: I) -> BatchOutcome
    where
        I: IntoIterator<Item = BatchItem>,
    {
        let (total, reports) = self.spawn_jobs(items);
        collect(total, reports).await
    }

    fn spawn_jobs<I>(&self, items: I) -> (usize, mpsc::Receiver<JobReport>)
    where
        I: IntoIterator<Item = BatchItem>,
    {
        let items: Vec<BatchItem> = items.into_iter().collect();
        let total = items.len();
        let (tx, rx) = mpsc::channel(total.max(1));
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));

        debug!(jobs = total, concurrency = self.config.max_concurrency, "dispatching batch");

        for (index, item) in items.into_iter().enumerate() {
            let tx = tx.clone();
            let semaphore = Arc::clone(&semaphore);
            let pipeline = Arc::clone(&self.pipeline);
            let timeout = self.config.job_timeout;

            tokio::spawn(async move {
                let result = run_job(pipeline, semaphore, index, item, timeout).await;
                // Only fails if the collector is gone, and then nobody is waiting.
                let _ = tx.send((index, result)).await;
            });
        }

        (total, rx)
    }
}

async fn run_job(
    pipeline: Arc<AnnotationPipeline>,
    semaphore: Arc<Semaphore>,
    index: usize,
    item: BatchItem,
    timeout: Option<Duration>,
) -> Result<StyledText, AnnotateError> {
    // The batch semaphore is never closed while jobs are queued on it.
    let permit = semaphore
        .acquire_owned()
        .await
        .map_err(|_| AnnotateError::Cancelled { index })?;

    // The permit lives as long as the blocking work, so a timed-out job
    // still occupies its slot until the pass actually returns.
    let handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        pipeline.process(&item.text, &item.attributes)
    });

    let joined = match timeout {
        Some(after) => tokio::time::timeout(after, handle)
            .await
            .map_err(|_| AnnotateError::Timeout { index, after })?,
        None => handle.await,
    };

    joined.map_err(|e| AnnotateError::Join(e.to_string()))?
}

/// Count down one report per job.
async fn collect(total: usize, mut reports: mpsc::Receiver<JobReport>) -> BatchOutcome {
    let mut outcome = BatchOutcome {
        submitted: total,
        ..BatchOutcome::default()
    };

    for _ in 0..total {
        let Some((index, result)) = reports.recv().await else {
            break;
        };
        match result {
            Ok(styled) => outcome.results.push(Annotated { index, styled }),
            Err(e) => warn!(index, error = %e, "annotation job failed"),
        }
    }

    // Jobs that vanished without reporting count as failures too.
    outcome.failed = total - outcome.results.len();

    info!(
        submitted = outcome.submitted,
        succeeded = outcome.results.len(),
        failed = outcome.failed,
        "batch complete"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::MatchedResponse;
    use crate::pattern::{MatchError, MatchUnit, Matcher, Pattern, PatternError, UserNamePattern};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    /// Fails to compile on its `fail_on`-th compilation (1-based).
    struct FlakyPattern {
        calls: AtomicUsize,
        fail_on: usize,
    }

    impl Pattern for FlakyPattern {
        fn name(&self) -> &str {
            "flaky"
        }

        fn compile(&self) -> Result<Box<dyn Matcher>, PatternError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on {
                return Err(PatternError::construction("flaky", "engineered failure"));
            }
            UserNamePattern.compile()
        }
    }

    struct SlowMatcher;

    impl Matcher for SlowMatcher {
        fn match_units(&self, text: &str) -> Result<Vec<MatchUnit>, MatchError> {
            if text.contains("slow") {
                std::thread::sleep(Duration::from_millis(300));
            }
            Ok(Vec::new())
        }
    }

    struct SlowPattern;

    impl Pattern for SlowPattern {
        fn name(&self) -> &str {
            "slow"
        }

        fn compile(&self) -> Result<Box<dyn Matcher>, PatternError> {
            Ok(Box::new(SlowMatcher))
        }
    }

    fn items(texts: &[&str]) -> Vec<BatchItem> {
        texts
            .iter()
            .map(|t| BatchItem::new(*t, Attributes::new()))
            .collect()
    }

    fn flaky_pipeline(fail_on: usize) -> AnnotationPipeline {
        let mut pipeline = AnnotationPipeline::new();
        pipeline.register(
            FlakyPattern {
                calls: AtomicUsize::new(0),
                fail_on,
            },
            |s| MatchedResponse::new(s.to_uppercase()),
        );
        pipeline
    }

    #[tokio::test]
    async fn completion_fires_once_with_successes_only() {
        let dispatcher = Dispatcher::new(flaky_pipeline(3));
        let fired = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel();

        let counter = Arc::clone(&fired);
        let handle = dispatcher.submit_all(items(&["@a", "@b", "@c", "@d", "@e"]), move |outcome| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(outcome);
        });

        let outcome = rx.await.unwrap();
        handle.await.unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.submitted, 5);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.results.len(), 4);
        for annotated in &outcome.results {
            assert_eq!(annotated.styled.text(), annotated.styled.text().to_uppercase());
        }
    }

    #[tokio::test]
    async fn results_can_be_restored_to_submission_order() {
        let mut pipeline = AnnotationPipeline::new();
        pipeline.register(UserNamePattern, |s| MatchedResponse::new(format!("<{s}>")));
        let dispatcher =
            Dispatcher::with_config(pipeline, DispatcherConfig::default().with_max_concurrency(2));

        let outcome = dispatcher.run(items(&["@0", "@1", "@2", "@3"])).await;
        let ordered = outcome.into_submission_order();

        let texts: Vec<_> = ordered.iter().map(|a| a.styled.text().to_string()).collect();
        assert_eq!(texts, vec!["<@0>", "<@1>", "<@2>", "<@3>"]);
        let indices: Vec<_> = ordered.iter().map(|a| a.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn empty_batch_completes_immediately() {
        let dispatcher = Dispatcher::new(AnnotationPipeline::new());
        let outcome = dispatcher.run(Vec::new()).await;
        assert_eq!(outcome.submitted, 0);
        assert_eq!(outcome.failed, 0);
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn timed_out_job_counts_as_failure() {
        let mut pipeline = AnnotationPipeline::new();
        pipeline.register(SlowPattern, |s| MatchedResponse::new(s));
        let config = DispatcherConfig::default().with_job_timeout(Duration::from_millis(50));
        let dispatcher = Dispatcher::with_config(pipeline, config);

        let outcome = dispatcher.run(items(&["fast", "slow", "also fast"])).await;
        assert_eq!(outcome.failed, 1);
        let mut indices: Vec<_> = outcome.results.iter().map(|a| a.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 2]);
    }

    #[tokio::test]
    async fn every_job_failing_still_completes() {
        let mut pipeline = AnnotationPipeline::new();
        pipeline.register(
            crate::pattern::RegexPattern::new("broken", "(oops"),
            |s| MatchedResponse::new(s),
        );
        let dispatcher = Dispatcher::new(pipeline);

        let outcome = dispatcher.run(items(&["a", "b", "c"])).await;
        assert_eq!(outcome.failed, 3);
        assert!(outcome.into_styled().is_empty());
    }

    /// Sleeps on every text and records the highest number of overlapping scans.
    struct CountingMatcher {
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl Matcher for CountingMatcher {
        fn match_units(&self, _text: &str) -> Result<Vec<MatchUnit>, MatchError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(200));
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    struct CountingPattern {
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl Pattern for CountingPattern {
        fn name(&self) -> &str {
            "counting"
        }

        fn compile(&self) -> Result<Box<dyn Matcher>, PatternError> {
            Ok(Box::new(CountingMatcher {
                running: Arc::clone(&self.running),
                peak: Arc::clone(&self.peak),
            }))
        }
    }

    #[tokio::test]
    async fn timed_out_jobs_keep_their_concurrency_slot() {
        let peak = Arc::new(AtomicUsize::new(0));
        let mut pipeline = AnnotationPipeline::new();
        pipeline.register(
            CountingPattern {
                running: Arc::new(AtomicUsize::new(0)),
                peak: Arc::clone(&peak),
            },
            |s| MatchedResponse::new(s),
        );
        let config = DispatcherConfig::default()
            .with_max_concurrency(1)
            .with_job_timeout(Duration::from_millis(20));
        let dispatcher = Dispatcher::with_config(pipeline, config);

        let outcome = dispatcher.run(items(&["a", "b", "c", "d"])).await;

        assert_eq!(outcome.failed, 4);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn config_clamps_concurrency_to_one() {
        let config = DispatcherConfig::default().with_max_concurrency(0);
        assert_eq!(config.max_concurrency, 1);
    }
}
