use serde::Serialize;

use crate::api::{DrawData, DrawProvider};
use crate::db::DrawStore;
use crate::models::Draw;

pub const UP_TO_DATE_MESSAGE: &str = "already up to date";

/// What happened to one draw number during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DrawOutcome {
    Added,
    /// Another writer stored it first
    AlreadyPresent,
    /// Upstream answered 404
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawSyncResult {
    pub draw_number: i64,
    #[serde(flatten)]
    pub outcome: DrawOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub message: String,
    pub records_added: usize,
    pub last_known_draw: i64,
    pub previous_local_max: i64,
    /// Pending draws left for the next run because of the backfill cap
    pub deferred: usize,
    pub results: Vec<DrawSyncResult>,
}

impl SyncSummary {
    fn up_to_date(local_max: i64, remote_max: i64) -> Self {
        Self {
            message: UP_TO_DATE_MESSAGE.to_owned(),
            records_added: 0,
            last_known_draw: remote_max,
            previous_local_max: local_max,
            deferred: 0,
            results: Vec::new(),
        }
    }

    pub fn is_up_to_date(&self) -> bool {
        self.results.is_empty() && self.deferred == 0
    }

    /// Draw numbers attempted in this run that are still missing locally
    pub fn missing(&self) -> impl Iterator<Item = i64> + '_ {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, DrawOutcome::NotFound | DrawOutcome::Failed(_)))
            .map(|r| r.draw_number)
    }
}

/// Hard failures: the run did not get to reconcile anything
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("upstream unreachable: {0}")]
    Upstream(anyhow::Error),
    #[error("failed to read local draws: {0}")]
    Storage(anyhow::Error),
}

/// Brings the local results table up to date with an upstream provider.
///
/// A run attempts, in ascending order, every draw number missing from
/// `1..=local max` followed by everything after the local maximum up to the
/// upstream latest. Per-draw failures are recorded and skipped, so the next
/// run picks them up again.
#[derive(Debug)]
pub struct Synchronizer<P, S> {
    provider: P,
    store: S,
    max_backfill: Option<usize>,
}

impl<P, S> Synchronizer<P, S>
where
    P: DrawProvider,
    S: DrawStore,
{
    pub fn new(provider: P, store: S) -> Self {
        Self {
            provider,
            store,
            max_backfill: None,
        }
    }

    /// Attempt at most `max_backfill` draws per run; `None` is unbounded
    pub fn with_max_backfill(mut self, max_backfill: Option<usize>) -> Self {
        self.max_backfill = max_backfill;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn sync(&self) -> Result<SyncSummary, SyncError> {
        let bounds = self
            .store
            .draw_number_bounds()
            .map_err(SyncError::Storage)?;
        let local_max = bounds.map_or(0, |(_, highest)| highest);
        log::info!("Last stored draw: {local_max}");

        let latest = self.provider.latest_draw().await.map_err(|e| {
            log::error!(
                "Failed to fetch latest draw from {}: {e}",
                self.provider.provider_type()
            );
            SyncError::Upstream(e)
        })?;
        let remote_max = latest.draw_number;
        log::info!("Latest draw upstream: {remote_max}");

        if local_max > remote_max {
            log::warn!("Local draws go past upstream latest ({local_max} > {remote_max})");
        }

        // holes are counted from the first draw: a failure at the bottom of a
        // run leaves it below the lowest stored number
        let mut pending = match bounds {
            Some((_, highest)) => self.missing_between(1, highest)?,
            None => Vec::new(),
        };
        let new_draws =
            usize::try_from(remote_max.saturating_sub(local_max).max(0)).unwrap_or(usize::MAX);
        let total = pending.len().saturating_add(new_draws);

        if total == 0 {
            log::info!("Results are {UP_TO_DATE_MESSAGE}");
            return Ok(SyncSummary::up_to_date(local_max, remote_max));
        }

        let attempted = match self.max_backfill {
            Some(cap) if total > cap => {
                log::warn!(
                    "Backfill capped at {cap} draws, {} left for the next run",
                    total - cap
                );
                cap
            }
            _ => total,
        };
        let deferred = total - attempted;

        pending.truncate(attempted);
        let room = attempted - pending.len();
        pending.extend((local_max + 1..=remote_max).take(room));

        log::info!(
            "Backfilling {} draws ({}..={})",
            pending.len(),
            pending.first().copied().unwrap_or_default(),
            pending.last().copied().unwrap_or_default()
        );

        let mut results = Vec::with_capacity(pending.len());
        for draw_number in pending {
            let outcome = self.sync_draw(draw_number, &latest).await;
            match &outcome {
                DrawOutcome::Added => log::info!("Draw {draw_number} stored"),
                DrawOutcome::AlreadyPresent => log::debug!("Draw {draw_number} already stored"),
                DrawOutcome::NotFound => log::warn!("Draw {draw_number} not published upstream"),
                DrawOutcome::Failed(reason) => log::warn!("Draw {draw_number} skipped: {reason}"),
            }
            results.push(DrawSyncResult {
                draw_number,
                outcome,
            });
        }

        let records_added = results
            .iter()
            .filter(|r| r.outcome == DrawOutcome::Added)
            .count();
        let mut summary = SyncSummary {
            message: String::new(),
            records_added,
            last_known_draw: remote_max,
            previous_local_max: local_max,
            deferred,
            results,
        };

        let missing = summary.missing().count();
        summary.message = if missing == 0 {
            "sync completed".to_owned()
        } else {
            format!("sync completed, {missing} draws still missing")
        };
        log::info!("{}: {records_added} draws added", summary.message);

        Ok(summary)
    }

    /// Numbers absent from the store in `lowest..=highest`
    fn missing_between(&self, lowest: i64, highest: i64) -> Result<Vec<i64>, SyncError> {
        let stored = self
            .store
            .draw_numbers_between(lowest, highest)
            .map_err(SyncError::Storage)?;

        if stored.len() as i64 == highest - lowest + 1 {
            return Ok(Vec::new());
        }

        let mut stored = stored.into_iter().peekable();
        let gaps: Vec<i64> = (lowest..=highest)
            .filter(|n| {
                if stored.peek() == Some(n) {
                    stored.next();
                    false
                } else {
                    true
                }
            })
            .collect();

        log::info!("Found {} gaps below the last stored draw", gaps.len());
        Ok(gaps)
    }

    async fn sync_draw(&self, draw_number: i64, latest: &DrawData) -> DrawOutcome {
        let data = if draw_number == latest.draw_number {
            latest.clone()
        } else {
            match self.provider.specified_draw(draw_number).await {
                Ok(Some(data)) => data,
                Ok(None) => return DrawOutcome::NotFound,
                Err(e) => return DrawOutcome::Failed(format!("fetch failed: {e}")),
            }
        };

        let draw = match Draw::try_from(&data) {
            Ok(draw) => draw,
            Err(e) => return DrawOutcome::Failed(format!("malformed payload: {e}")),
        };

        match self.store.insert_draw(&draw) {
            Ok(true) => DrawOutcome::Added,
            Ok(false) => DrawOutcome::AlreadyPresent,
            Err(e) => DrawOutcome::Failed(format!("insert failed: {e}")),
        }
    }
}
