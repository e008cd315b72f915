use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use crate::api::{FragmentSource, HansardClient, TocSource};
use crate::cli::FetchArgs;
use crate::config::{FetchOptions, resolve_workers, retry_policy_from_parts};
use crate::error::{RunError, TocError};
use crate::fetch::fetch_all;
use crate::formats::DayReport;
use crate::ids::unique_day_ids;
use crate::storage::write_day;
use crate::toc::find_topic_branch;

/// Mirrors every day named by `args.urls`. A failed day does not stop the
/// remaining days; the command fails at the end if any day failed.
pub async fn run(args: FetchArgs) -> anyhow::Result<()> {
    let days = unique_day_ids(&args.urls)?;
    let retry = retry_policy_from_parts(
        args.retry_attempts,
        args.retry_base_delay_ms,
        args.retry_backoff,
        args.retry_max_delay_ms,
        &args.retry_statuses,
    )?;
    let base_options = FetchOptions {
        concurrency: resolve_workers(args.workers),
        engine: args.parse_engine,
        retry,
        progress: !args.no_progress,
        linked_topic: None,
    };

    let client = Arc::new(
        HansardClient::new(&args.api_base, Duration::from_secs(args.timeout_secs.max(1)))
            .context("build hansard client")?,
    );
    let out_dir = Path::new(&args.out);

    let mut failed_days = Vec::new();
    for ids in &days {
        let mut options = base_options.clone();
        if args.linked_topic_only {
            options.linked_topic = ids.topic_id.clone();
            if options.linked_topic.is_none() {
                tracing::warn!(
                    day_id = %ids.day_id,
                    "url names no topic; mirroring the whole day"
                );
            }
        }

        let fragments: Arc<dyn FragmentSource> = client.clone();
        let report = match run_day(&*client, fragments, &ids.day_id, &options).await {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(day_id = %ids.day_id, error = %err, "day failed");
                failed_days.push(ids.day_id.clone());
                continue;
            }
        };

        let path = write_day(out_dir, &report, args.force)
            .with_context(|| format!("write day {}", ids.day_id))?;
        tracing::info!(
            day_id = %ids.day_id,
            path = %path.display(),
            warnings = report.warnings.len(),
            "wrote day"
        );
    }

    if !failed_days.is_empty() {
        anyhow::bail!(
            "{} of {} day(s) failed: {}",
            failed_days.len(),
            days.len(),
            failed_days.join(", ")
        );
    }
    Ok(())
}

pub async fn run_day(
    toc: &dyn TocSource,
    fragments: Arc<dyn FragmentSource>,
    day_id: &str,
    options: &FetchOptions,
) -> Result<DayReport, RunError> {
    let day_id = day_id.trim();
    tracing::info!(day_id, "retrieve table of contents");
    let mut roots = toc.fetch_toc(day_id).await?;

    if let Some(topic_id) = options.linked_topic.as_deref() {
        roots = find_topic_branch(roots, topic_id).ok_or_else(|| TocError::TopicNotFound {
            day_id: day_id.to_owned(),
            topic_id: topic_id.to_owned(),
        })?;
        tracing::info!(day_id, topic_id, "restricted to linked topic");
    }

    let outcome = fetch_all(&mut roots, fragments, options).await;
    tracing::info!(
        day_id,
        topics = outcome.stats.topics,
        fetched = outcome.stats.fetched,
        failed = outcome.stats.failed,
        requests = outcome.stats.requests,
        "day complete"
    );

    Ok(DayReport {
        day_id: day_id.to_owned(),
        roots,
        warnings: outcome.warnings,
        stats: outcome.stats,
    })
}
