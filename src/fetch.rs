use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::{JoinError, JoinSet};

use crate::api::FragmentSource;
use crate::config::FetchOptions;
use crate::formats::{FetchStats, FragmentResult, ParsedFragment, TocNode, Warning, WarningKind};
use crate::parser::ParseEngine;
use crate::retry::{RetryFailure, RetryPolicy};
use crate::toc::{FetchJob, flatten_jobs};

const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    /// Document order, independent of completion order.
    pub warnings: Vec<Warning>,
    pub stats: FetchStats,
}

#[derive(Debug)]
struct JobReport {
    index: usize,
    attempts: u32,
    content: Option<FragmentResult>,
    warning: Option<Warning>,
}

/// Fetches and parses every topic of `roots` with at most
/// `options.concurrency` fragment requests in flight, attaching each result to
/// the node its job was created from. A topic never stops the others, not even
/// one whose task panics.
pub async fn fetch_all(
    roots: &mut [TocNode],
    source: Arc<dyn FragmentSource>,
    options: &FetchOptions,
) -> FetchOutcome {
    let mut slots = flatten_jobs(roots);
    let total = slots.len();
    let concurrency = options.concurrency.max(1).min(total.max(1));
    tracing::info!(
        topics = total,
        concurrency,
        engine = options.engine.as_str(),
        "fetch fragments"
    );

    let retry = Arc::new(options.retry.clone());
    let mut join_set = JoinSet::new();
    let mut running = HashMap::new();
    let mut next_idx = 0usize;
    let mut warnings: Vec<Option<Warning>> = vec![None; total];
    let mut stats = FetchStats {
        topics: total,
        ..FetchStats::default()
    };
    let mut done = 0usize;
    let started_at = Instant::now();
    let mut last_progress_log_at = started_at;

    while next_idx < total || !join_set.is_empty() {
        while next_idx < total && join_set.len() < concurrency {
            let job = slots[next_idx].job.clone();
            let source = Arc::clone(&source);
            let retry = Arc::clone(&retry);
            let engine = options.engine;
            let handle = join_set.spawn(async move {
                run_job(job, source.as_ref(), &retry, engine).await
            });
            running.insert(handle.id(), next_idx);
            next_idx += 1;
        }

        let Some(joined) = join_set.join_next_with_id().await else {
            break;
        };
        let report = match joined {
            Ok((id, report)) => {
                running.remove(&id);
                report
            }
            Err(err) => {
                let Some(index) = running.remove(&err.id()) else {
                    continue;
                };
                crashed_job(&slots[index].job, &err)
            }
        };

        stats.requests += u64::from(report.attempts);
        if let Some(content) = report.content {
            slots[report.index].attach(content);
            stats.fetched += 1;
        }
        if let Some(warning) = report.warning {
            tracing::warn!(
                topic_id = %warning.topic_id,
                name = %warning.name,
                kind = ?warning.kind,
                attempts = warning.attempts,
                error = %warning.message,
                "topic failed; skipping"
            );
            stats.failed += 1;
            warnings[report.index] = Some(warning);
        }

        done += 1;
        if options.progress
            && (done == total || last_progress_log_at.elapsed() >= PROGRESS_INTERVAL)
        {
            tracing::info!(
                done,
                total,
                failed = stats.failed,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                "fetch fragments: progress"
            );
            last_progress_log_at = Instant::now();
        }
    }

    FetchOutcome {
        warnings: warnings.into_iter().flatten().collect(),
        stats,
    }
}

fn crashed_job(job: &FetchJob, err: &JoinError) -> JobReport {
    JobReport {
        index: job.index,
        attempts: 0,
        content: None,
        warning: Some(Warning {
            topic_id: job.topic_id.clone(),
            name: job.name.clone(),
            kind: WarningKind::Permanent,
            message: format!("fetch task failed: {err}"),
            attempts: 0,
        }),
    }
}

async fn run_job(
    job: FetchJob,
    source: &dyn FragmentSource,
    retry: &RetryPolicy,
    engine: ParseEngine,
) -> JobReport {
    let attempted = retry
        .execute(&job.topic_id, || source.fetch_fragment(&job.topic_id))
        .await;

    let warning = |kind, message: String| Warning {
        topic_id: job.topic_id.clone(),
        name: job.name.clone(),
        kind,
        message,
        attempts: attempted.attempts,
    };

    let html = match &attempted.outcome {
        Ok(html) => html.clone(),
        Err(RetryFailure::Exhausted(err)) => {
            let message = format!("gave up after {} attempts: {err}", attempted.attempts);
            return JobReport {
                index: job.index,
                attempts: attempted.attempts,
                content: None,
                warning: Some(warning(WarningKind::TransientExhausted, message)),
            };
        }
        Err(RetryFailure::Permanent(err)) => {
            return JobReport {
                index: job.index,
                attempts: attempted.attempts,
                content: None,
                warning: Some(warning(WarningKind::Permanent, err.to_string())),
            };
        }
    };

    match engine.parse(&html) {
        Ok(parsed) => {
            if parsed.blocks.is_empty() {
                tracing::debug!(topic_id = %job.topic_id, "no content blocks recognized");
            }
            JobReport {
                index: job.index,
                attempts: attempted.attempts,
                content: Some(FragmentResult {
                    raw_markup: html,
                    parsed,
                }),
                warning: None,
            }
        }
        Err(err) => JobReport {
            index: job.index,
            attempts: attempted.attempts,
            content: Some(FragmentResult {
                raw_markup: html,
                parsed: ParsedFragment::default(),
            }),
            warning: Some(warning(WarningKind::Permanent, err.to_string())),
        },
    }
}
