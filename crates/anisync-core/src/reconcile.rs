//! Per-service decision on what to write back for one watched episode
//!
//! `plan` is pure: it looks at the service's view of the anime, the episode
//! the user reached and the user's preferences, and returns the update to
//! issue (or why none is needed). Executing the decision lives in
//! [`crate::update`].

use anisync_models::{CatalogEntry, ListStatus, WatchStatus};
use anisync_sources::{RewatchStyle, ServiceCapabilities};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// The user's list state for one anime on one service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    NoEntry,
    PlanToWatch,
    Watching,
    Completed,
    Rewatching,
    /// On hold, dropped
    Other,
}

impl ListState {
    pub fn of(status: Option<&ListStatus>) -> Self {
        match status {
            None => ListState::NoEntry,
            Some(status) if status.is_rewatch_in_progress() => ListState::Rewatching,
            Some(status) => match status.status {
                WatchStatus::PlanToWatch => ListState::PlanToWatch,
                WatchStatus::Watching => ListState::Watching,
                WatchStatus::Completed => ListState::Completed,
                WatchStatus::Rewatching => ListState::Rewatching,
                WatchStatus::OnHold | WatchStatus::Dropped => ListState::Other,
            },
        }
    }
}

impl fmt::Display for ListState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ListState::NoEntry => "not on list",
            ListState::PlanToWatch => "plan to watch",
            ListState::Watching => "watching",
            ListState::Completed => "completed",
            ListState::Rewatching => "rewatching",
            ListState::Other => "on hold/dropped",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    /// Service already has this episode or a later one
    AlreadyWatched,
    AlreadyCompleted,
    /// User only syncs plan-to-watch entries
    NotOnPlanToWatch,
    /// Completed entry played again, but the user does not track rewatches
    RewatchDisabled,
}

impl fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NoOpReason::AlreadyWatched => "service reports episode already watched",
            NoOpReason::AlreadyCompleted => "already completed",
            NoOpReason::NotOnPlanToWatch => "not on plan to watch list",
            NoOpReason::RewatchDisabled => "completed, rewatch tracking disabled",
        };
        f.write_str(text)
    }
}

/// How the rewatch counter changes with an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewatchCount {
    Unchanged,
    SetTo(u32),
    /// Service cannot set status and count together: complete first, then
    /// send the count from that response plus one
    BumpFromResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedUpdate {
    pub target_status: WatchStatus,
    pub episode_progress: u32,
    pub is_rewatching: Option<bool>,
    pub rewatch_count: RewatchCount,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl PlannedUpdate {
    fn new(target_status: WatchStatus, episode_progress: u32) -> Self {
        Self {
            target_status,
            episode_progress,
            is_rewatching: None,
            rewatch_count: RewatchCount::Unchanged,
            start_date: None,
            end_date: None,
        }
    }

    pub fn increments_rewatch_count(&self) -> bool {
        self.rewatch_count != RewatchCount::Unchanged
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconciliationDecision {
    NoOp { reason: NoOpReason },
    Update(PlannedUpdate),
}

impl ReconciliationDecision {
    fn no_op(reason: NoOpReason) -> Self {
        ReconciliationDecision::NoOp { reason }
    }

    pub fn is_no_op(&self) -> bool {
        matches!(self, ReconciliationDecision::NoOp { .. })
    }

    pub fn update(&self) -> Option<&PlannedUpdate> {
        match self {
            ReconciliationDecision::Update(update) => Some(update),
            ReconciliationDecision::NoOp { .. } => None,
        }
    }
}

/// Everything besides the entry itself that shapes a decision
#[derive(Debug, Clone, Copy)]
pub struct ReconcileContext {
    pub plan_to_watch_only: bool,
    pub rewatch_completed: bool,
    pub capabilities: ServiceCapabilities,
    /// `Some(false)` keeps a completed entry as it is instead of evaluating
    /// the rewatch policy (used when marking cours the user passed over)
    pub override_rewatch_check: Option<bool>,
}

impl ReconcileContext {
    pub fn new(capabilities: ServiceCapabilities) -> Self {
        Self {
            plan_to_watch_only: false,
            rewatch_completed: false,
            capabilities,
            override_rewatch_check: None,
        }
    }

    pub fn plan_to_watch_only(mut self, value: bool) -> Self {
        self.plan_to_watch_only = value;
        self
    }

    pub fn rewatch_completed(mut self, value: bool) -> Self {
        self.rewatch_completed = value;
        self
    }

    pub fn override_rewatch_check(mut self, value: Option<bool>) -> Self {
        self.override_rewatch_check = value;
        self
    }
}

/// Decide the update for `entry` now that the user reached episode `progress`
pub fn plan(
    entry: &CatalogEntry,
    progress: u32,
    ctx: &ReconcileContext,
    now: DateTime<Utc>,
) -> ReconciliationDecision {
    if !ctx.capabilities.supports_rewatch {
        return plan_without_rewatch(entry, progress, ctx);
    }

    let state = ListState::of(entry.list_status.as_ref());
    let watched = entry.watched_episodes();

    if state == ListState::Watching {
        return progress_update(entry, progress, false, ctx, now);
    }

    let rewatch_triggered =
        ctx.override_rewatch_check != Some(false) && state == ListState::Completed;

    if ctx.plan_to_watch_only {
        if state == ListState::PlanToWatch {
            return progress_update(entry, progress, false, ctx, now);
        }
        // Only a completed entry may start a rewatch
        if rewatch_triggered {
            if !ctx.rewatch_completed {
                return ReconciliationDecision::no_op(NoOpReason::RewatchDisabled);
            }
            return progress_update(entry, progress, true, ctx, now);
        }
        let reason = if state != ListState::NoEntry && watched >= progress {
            NoOpReason::AlreadyWatched
        } else {
            NoOpReason::NotOnPlanToWatch
        };
        return ReconciliationDecision::no_op(reason);
    }

    if state == ListState::Completed {
        if !rewatch_triggered {
            return ReconciliationDecision::no_op(NoOpReason::AlreadyCompleted);
        }
        if !ctx.rewatch_completed {
            return ReconciliationDecision::no_op(NoOpReason::RewatchDisabled);
        }
        return progress_update(entry, progress, true, ctx, now);
    }

    progress_update(entry, progress, false, ctx, now)
}

/// Progress write for services with rewatch support
fn progress_update(
    entry: &CatalogEntry,
    progress: u32,
    set_rewatching: bool,
    ctx: &ReconcileContext,
    now: DateTime<Utc>,
) -> ReconciliationDecision {
    let total = entry.total_episodes;
    let progress = clamp_progress(progress, total);
    let watched = entry.watched_episodes();
    let status = entry.list_status;
    let in_rewatch = status.map_or(false, |s| s.is_rewatch_in_progress());
    let already_completed = status.map_or(false, |s| s.status == WatchStatus::Completed);
    let rewatch_count = status.map_or(0, |s| s.rewatch_count);
    let single_episode = total == 1;

    let advancing =
        progress > watched || single_episode || (set_rewatching && watched == progress);

    if !advancing {
        if set_rewatching {
            return ReconciliationDecision::Update(rewatch_progress(
                progress,
                true,
                rewatch_count,
                ctx.capabilities,
            ));
        }
        return ReconciliationDecision::no_op(NoOpReason::AlreadyWatched);
    }

    if single_episode || (total > 0 && progress == total) {
        let keep_dates = in_rewatch || already_completed;
        // Rewatching-status services counted this rewatch when it started
        let bump = set_rewatching
            || (in_rewatch && ctx.capabilities.rewatch_style == RewatchStyle::CompletedFlag);

        let mut update = PlannedUpdate::new(
            WatchStatus::Completed,
            if single_episode { 1 } else { progress },
        );
        if !keep_dates {
            update.end_date = Some(now);
            if single_episode {
                update.start_date = Some(now);
            }
        }
        if bump || in_rewatch {
            update.is_rewatching = Some(false);
        }
        if bump {
            update.rewatch_count = if ctx.capabilities.atomic_rewatch_count {
                RewatchCount::SetTo(rewatch_count + 1)
            } else {
                RewatchCount::BumpFromResponse
            };
        }
        return ReconciliationDecision::Update(update);
    }

    if in_rewatch || set_rewatching {
        return ReconciliationDecision::Update(rewatch_progress(
            progress,
            set_rewatching && !in_rewatch,
            rewatch_count,
            ctx.capabilities,
        ));
    }

    let mut update = PlannedUpdate::new(WatchStatus::Watching, progress);
    if progress == 1 {
        update.start_date = Some(now);
    }
    ReconciliationDecision::Update(update)
}

/// Progress inside a rewatch, in the service's own representation
fn rewatch_progress(
    progress: u32,
    starting: bool,
    rewatch_count: u32,
    capabilities: ServiceCapabilities,
) -> PlannedUpdate {
    match capabilities.rewatch_style {
        RewatchStyle::RewatchingStatus => {
            let mut update = PlannedUpdate::new(WatchStatus::Rewatching, progress);
            update.is_rewatching = Some(true);
            if starting {
                update.rewatch_count = RewatchCount::SetTo(rewatch_count + 1);
            }
            update
        }
        RewatchStyle::CompletedFlag => {
            let mut update = PlannedUpdate::new(WatchStatus::Completed, progress);
            update.is_rewatching = Some(true);
            update
        }
    }
}

/// Services without rewatch support: completed is terminal and rewatch
/// fields are never written
fn plan_without_rewatch(entry: &CatalogEntry, progress: u32, ctx: &ReconcileContext) -> ReconciliationDecision {
    let state = ListState::of(entry.list_status.as_ref());
    if matches!(state, ListState::Completed | ListState::Rewatching) {
        return ReconciliationDecision::no_op(NoOpReason::AlreadyCompleted);
    }
    if ctx.plan_to_watch_only && state != ListState::PlanToWatch {
        return ReconciliationDecision::no_op(NoOpReason::NotOnPlanToWatch);
    }

    let total = entry.total_episodes;
    let progress = clamp_progress(progress, total);
    let watched = entry.watched_episodes();
    if state != ListState::NoEntry && progress <= watched && total != 1 {
        return ReconciliationDecision::no_op(NoOpReason::AlreadyWatched);
    }

    if total == 1 || (total > 0 && progress == total) {
        ReconciliationDecision::Update(PlannedUpdate::new(WatchStatus::Completed, progress))
    } else {
        ReconciliationDecision::Update(PlannedUpdate::new(WatchStatus::Watching, progress))
    }
}

/// Never report more episodes than the service knows about
fn clamp_progress(progress: u32, total: u32) -> u32 {
    if total > 0 {
        progress.min(total)
    } else {
        progress
    }
}

#[cfg(test)]
mod tests;
