//! Reconciliation helpers shared by the resources.
//!
//! - [`fetch_concurrently`]: bounded fan-out over ids with every failure kept
//! - [`poll_until`]: bounded retry loop over an asynchronous transition
//! - [`diff_ids`]: attach/detach sets for vSwitch membership
//! - [`wait_for_port`]: wait for a TCP service after a reboot

use std::collections::BTreeSet;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tokio::net::TcpStream;

use crate::client::RobotError;

/// Upper bound on Robot requests in flight during a fan-out.
pub const MAX_CONCURRENT_FETCHES: usize = 10;

/// Run `fetch` for every id with at most `limit` futures in flight.
///
/// Returns all values in completion order, or [`RobotError::Multiple`]
/// carrying every failure when at least one fetch failed.
pub async fn fetch_concurrently<I, T, F, Fut>(
    ids: I,
    limit: usize,
    fetch: F,
) -> Result<Vec<T>, RobotError>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, RobotError>>,
{
    let results: Vec<Result<T, RobotError>> = stream::iter(ids)
        .map(fetch)
        .buffer_unordered(limit.max(1))
        .collect()
        .await;

    let mut values = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(err) => errors.push(err),
        }
    }

    if errors.is_empty() {
        Ok(values)
    } else {
        tracing::warn!(
            failed = errors.len(),
            succeeded = values.len(),
            "Concurrent fetch failed"
        );
        Err(RobotError::Multiple { errors })
    }
}

/// How long to wait for a server-side transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Number of fetches before giving up.
    pub max_retries: u32,
    /// Pause between fetches.
    pub interval: Duration,
}

impl WaitPolicy {
    /// Create a policy.
    pub const fn new(max_retries: u32, interval: Duration) -> Self {
        Self {
            max_retries,
            interval,
        }
    }
}

impl Default for WaitPolicy {
    /// 20 attempts, 15 seconds apart.
    fn default() -> Self {
        Self::new(20, Duration::from_secs(15))
    }
}

/// Fetch until `ready` accepts the value.
///
/// A fetch error aborts immediately. After `max_retries` unready values the
/// result is [`RobotError::Timeout`] naming `what`.
pub async fn poll_until<T, F, Fut, P>(
    policy: &WaitPolicy,
    what: &str,
    mut fetch: F,
    mut ready: P,
) -> Result<T, RobotError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RobotError>>,
    P: FnMut(&T) -> bool,
{
    for attempt in 1..=policy.max_retries {
        let value = fetch().await?;
        if ready(&value) {
            tracing::debug!(what, attempt, "Wait finished");
            return Ok(value);
        }

        tracing::info!(what, attempt, max = policy.max_retries, "Still waiting");
        if attempt < policy.max_retries {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(RobotError::Timeout(what.to_string()))
}

/// Servers to attach and detach to move from `old` to `new`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerDiff {
    /// In `new` but not in `old`, ascending.
    pub to_add: Vec<i64>,
    /// In `old` but not in `new`, ascending.
    pub to_remove: Vec<i64>,
}

impl ServerDiff {
    /// Whether nothing has to change.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Set difference between two id lists. Order and duplicates are ignored.
pub fn diff_ids(old: &[i64], new: &[i64]) -> ServerDiff {
    let old: BTreeSet<i64> = old.iter().copied().collect();
    let new: BTreeSet<i64> = new.iter().copied().collect();
    ServerDiff {
        to_add: new.difference(&old).copied().collect(),
        to_remove: old.difference(&new).copied().collect(),
    }
}

/// Join ids with `-`, e.g. `1-2-3`.
pub fn join_ids<T: Display>(ids: &[T]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("-")
}

/// How to wait for a TCP port to accept connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortWait {
    /// Port to probe.
    pub port: u16,
    /// Give up after this long.
    pub deadline: Duration,
    /// Pause between probes.
    pub interval: Duration,
    /// Timeout for a single connection attempt.
    pub connect_timeout: Duration,
}

impl Default for PortWait {
    /// SSH: port 22, 3 minutes, probing every 10 seconds.
    fn default() -> Self {
        Self {
            port: 22,
            deadline: Duration::from_secs(180),
            interval: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Probe `host:port` until a connection succeeds or the deadline passes.
pub async fn wait_for_port(host: &str, wait: &PortWait) -> Result<(), RobotError> {
    let started = Instant::now();
    loop {
        match tokio::time::timeout(wait.connect_timeout, TcpStream::connect((host, wait.port)))
            .await
        {
            Ok(Ok(_)) => {
                tracing::info!(host, port = wait.port, "Port is reachable");
                return Ok(());
            },
            Ok(Err(e)) => {
                tracing::debug!(host, port = wait.port, error = %e, "Port not reachable yet")
            },
            Err(_) => tracing::debug!(host, port = wait.port, "Connection attempt timed out"),
        }

        if started.elapsed() + wait.interval > wait.deadline {
            break;
        }
        tokio::time::sleep(wait.interval).await;
    }

    Err(RobotError::Timeout(format!(
        "{}:{} to accept connections within {:?}",
        host, wait.port, wait.deadline
    )))
}
