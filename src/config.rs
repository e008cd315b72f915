use std::time::Duration;

use crate::parser::ParseEngine;
use crate::retry::RetryPolicy;

pub const WORKER_ENV_VARS: [&str; 2] = ["HANSARD_WORKERS", "WORKERS"];

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub concurrency: usize,
    pub engine: ParseEngine,
    pub retry: RetryPolicy,
    pub progress: bool,
    /// Restrict the day to the branch holding this topic before fetching.
    pub linked_topic: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            concurrency: default_workers(),
            engine: ParseEngine::default(),
            retry: RetryPolicy::default(),
            progress: true,
            linked_topic: None,
        }
    }
}

pub fn default_workers() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cores.saturating_mul(2).clamp(4, 32)
}

/// `--workers`, then `HANSARD_WORKERS`, then `WORKERS`, then the default.
pub fn resolve_workers(cli: Option<usize>) -> usize {
    resolve_workers_with(cli, |key| std::env::var(key).ok())
}

pub fn resolve_workers_with(cli: Option<usize>, env: impl Fn(&str) -> Option<String>) -> usize {
    if let Some(workers) = cli {
        return workers.max(1);
    }

    for key in WORKER_ENV_VARS {
        let Some(raw) = env(key) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match raw.parse::<i64>() {
            Ok(n) => return usize::try_from(n.max(1)).unwrap_or(usize::MAX),
            Err(err) => {
                tracing::warn!(key, value = raw, %err, "ignoring invalid worker count");
            }
        }
    }

    default_workers()
}

pub fn retry_policy_from_parts(
    attempts: u32,
    base_delay_ms: u64,
    backoff: f64,
    max_delay_ms: u64,
    statuses: &[u16],
) -> anyhow::Result<RetryPolicy> {
    if attempts == 0 {
        anyhow::bail!("--retry-attempts must be >= 1");
    }
    if !backoff.is_finite() || backoff < 1.0 {
        anyhow::bail!("--retry-backoff must be a finite number >= 1.0");
    }
    let mut transient_statuses = statuses.to_vec();
    transient_statuses.sort_unstable();
    transient_statuses.dedup();

    Ok(RetryPolicy {
        max_attempts: attempts,
        base_delay: Duration::from_millis(base_delay_ms),
        backoff_multiplier: backoff,
        max_delay: Duration::from_millis(max_delay_ms.max(base_delay_ms)),
        transient_statuses,
    })
}
