use super::*;
use anisync_config::ServiceKind;
use chrono::TimeZone;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
}

fn anime(total: u32, status: Option<ListStatus>) -> CatalogEntry {
    let mut entry = CatalogEntry::new(1, "Frieren");
    entry.total_episodes = total;
    entry.list_status = status;
    entry
}

fn listed(status: WatchStatus, watched: u32) -> Option<ListStatus> {
    Some(ListStatus::new(status, watched))
}

fn rewatching(watched: u32, count: u32) -> Option<ListStatus> {
    Some(ListStatus {
        status: WatchStatus::Completed,
        episodes_watched: watched,
        rewatch_count: count,
        is_rewatching: true,
    })
}

fn mal() -> ReconcileContext {
    ReconcileContext::new(ServiceCapabilities::for_kind(ServiceKind::Mal))
}

fn anilist() -> ReconcileContext {
    ReconcileContext::new(ServiceCapabilities::for_kind(ServiceKind::AniList))
}

fn kitsu() -> ReconcileContext {
    ReconcileContext::new(ServiceCapabilities::for_kind(ServiceKind::Kitsu))
}

fn annict() -> ReconcileContext {
    ReconcileContext::new(ServiceCapabilities::for_kind(ServiceKind::Annict))
}

fn expect_update(decision: ReconciliationDecision) -> PlannedUpdate {
    match decision {
        ReconciliationDecision::Update(update) => update,
        other => panic!("expected an update, got {:?}", other),
    }
}

fn expect_no_op(decision: ReconciliationDecision) -> NoOpReason {
    match decision {
        ReconciliationDecision::NoOp { reason } => reason,
        other => panic!("expected a no-op, got {:?}", other),
    }
}

#[test]
fn test_first_episode_of_new_entry() {
    let update = expect_update(plan(&anime(24, None), 1, &mal(), now()));
    assert_eq!(update.target_status, WatchStatus::Watching);
    assert_eq!(update.episode_progress, 1);
    assert_eq!(update.start_date, Some(now()));
    assert_eq!(update.end_date, None);
    assert!(!update.increments_rewatch_count());
}

#[test]
fn test_later_episode_has_no_start_date() {
    let update = expect_update(plan(&anime(24, listed(WatchStatus::Watching, 4)), 5, &mal(), now()));
    assert_eq!(update.target_status, WatchStatus::Watching);
    assert_eq!(update.episode_progress, 5);
    assert_eq!(update.start_date, None);
}

#[test]
fn test_final_episode_completes() {
    let update = expect_update(plan(&anime(24, listed(WatchStatus::Watching, 23)), 24, &mal(), now()));
    assert_eq!(update.target_status, WatchStatus::Completed);
    assert_eq!(update.episode_progress, 24);
    assert_eq!(update.end_date, Some(now()));
    assert_eq!(update.start_date, None);
    assert_eq!(update.rewatch_count, RewatchCount::Unchanged);
}

#[test]
fn test_same_progress_twice_is_a_no_op() {
    let entry = anime(24, listed(WatchStatus::Watching, 7));
    for _ in 0..2 {
        assert_eq!(expect_no_op(plan(&entry, 7, &mal(), now())), NoOpReason::AlreadyWatched);
    }

    let done = anime(24, listed(WatchStatus::Completed, 24));
    for _ in 0..2 {
        assert!(plan(&done, 24, &mal(), now()).is_no_op());
        assert!(plan(&done, 24, &annict(), now()).is_no_op());
    }
}

#[test]
fn test_never_decreases_progress() {
    let entry = anime(24, listed(WatchStatus::Watching, 10));
    assert!(plan(&entry, 3, &mal(), now()).is_no_op());

    let on_hold = anime(24, listed(WatchStatus::OnHold, 10));
    assert!(plan(&on_hold, 3, &mal(), now()).is_no_op());
    assert!(plan(&on_hold, 3, &annict(), now()).is_no_op());
}

#[test]
fn test_progress_is_clamped_to_total() {
    let update = expect_update(plan(&anime(12, listed(WatchStatus::Watching, 10)), 15, &mal(), now()));
    assert_eq!(update.episode_progress, 12);
    assert_eq!(update.target_status, WatchStatus::Completed);

    // Unknown length leaves progress alone
    let update = expect_update(plan(&anime(0, None), 15, &mal(), now()));
    assert_eq!(update.episode_progress, 15);
    assert_eq!(update.target_status, WatchStatus::Watching);
}

#[test]
fn test_completed_without_rewatch_preference() {
    let entry = anime(24, listed(WatchStatus::Completed, 24));
    assert_eq!(expect_no_op(plan(&entry, 1, &mal(), now())), NoOpReason::RewatchDisabled);
}

#[test]
fn test_start_rewatch_completed_flag() {
    let ctx = mal().rewatch_completed(true);
    let entry = anime(24, Some(ListStatus {
        rewatch_count: 2,
        ..ListStatus::new(WatchStatus::Completed, 24)
    }));

    let update = expect_update(plan(&entry, 1, &ctx, now()));
    assert_eq!(update.target_status, WatchStatus::Completed);
    assert_eq!(update.is_rewatching, Some(true));
    assert_eq!(update.episode_progress, 1);
    assert_eq!(update.rewatch_count, RewatchCount::Unchanged);
    assert_eq!(update.start_date, None);
}

#[test]
fn test_start_rewatch_rewatching_status_counts_immediately() {
    let ctx = kitsu().rewatch_completed(true);
    let entry = anime(24, Some(ListStatus {
        rewatch_count: 1,
        ..ListStatus::new(WatchStatus::Completed, 24)
    }));

    let update = expect_update(plan(&entry, 1, &ctx, now()));
    assert_eq!(update.target_status, WatchStatus::Rewatching);
    assert_eq!(update.is_rewatching, Some(true));
    assert_eq!(update.rewatch_count, RewatchCount::SetTo(2));
}

#[test]
fn test_rewatch_progress_stays_completed_with_flag() {
    let update = expect_update(plan(&anime(24, rewatching(3, 1)), 4, &mal(), now()));
    assert_eq!(update.target_status, WatchStatus::Completed);
    assert_eq!(update.is_rewatching, Some(true));
    assert_eq!(update.episode_progress, 4);
    assert!(!update.increments_rewatch_count());
}

#[test]
fn test_finishing_rewatch_two_step_count() {
    let update = expect_update(plan(&anime(24, rewatching(23, 1)), 24, &mal(), now()));
    assert_eq!(update.target_status, WatchStatus::Completed);
    assert_eq!(update.is_rewatching, Some(false));
    assert_eq!(update.rewatch_count, RewatchCount::BumpFromResponse);
    // Original watch dates are kept
    assert_eq!(update.start_date, None);
    assert_eq!(update.end_date, None);
}

#[test]
fn test_finishing_rewatch_atomic_count() {
    let update = expect_update(plan(&anime(24, rewatching(23, 1)), 24, &anilist(), now()));
    assert_eq!(update.rewatch_count, RewatchCount::SetTo(2));
}

#[test]
fn test_finishing_rewatch_already_counted_at_start() {
    let entry = anime(24, Some(ListStatus {
        rewatch_count: 2,
        ..ListStatus::new(WatchStatus::Rewatching, 23)
    }));
    let update = expect_update(plan(&entry, 24, &kitsu(), now()));
    assert_eq!(update.target_status, WatchStatus::Completed);
    assert_eq!(update.is_rewatching, Some(false));
    assert_eq!(update.rewatch_count, RewatchCount::Unchanged);
}

#[test]
fn test_single_episode_movie() {
    let update = expect_update(plan(&anime(1, None), 1, &mal(), now()));
    assert_eq!(update.target_status, WatchStatus::Completed);
    assert_eq!(update.episode_progress, 1);
    assert_eq!(update.start_date, Some(now()));
    assert_eq!(update.end_date, Some(now()));

    // Rewatching a completed movie counts immediately and keeps dates
    let ctx = mal().rewatch_completed(true);
    let update = expect_update(plan(&anime(1, listed(WatchStatus::Completed, 1)), 1, &ctx, now()));
    assert_eq!(update.target_status, WatchStatus::Completed);
    assert_eq!(update.rewatch_count, RewatchCount::BumpFromResponse);
    assert_eq!(update.start_date, None);
    assert_eq!(update.end_date, None);
}

#[test]
fn test_restart_at_last_episode_counts_rewatch() {
    let ctx = anilist().rewatch_completed(true);
    let update = expect_update(plan(&anime(12, listed(WatchStatus::Completed, 12)), 12, &ctx, now()));
    assert_eq!(update.target_status, WatchStatus::Completed);
    assert_eq!(update.rewatch_count, RewatchCount::SetTo(1));
}

#[test]
fn test_plan_to_watch_only() {
    let ctx = mal().plan_to_watch_only(true);

    let update = expect_update(plan(&anime(12, listed(WatchStatus::PlanToWatch, 0)), 1, &ctx, now()));
    assert_eq!(update.target_status, WatchStatus::Watching);

    assert_eq!(expect_no_op(plan(&anime(12, None), 1, &ctx, now())), NoOpReason::NotOnPlanToWatch);
    assert_eq!(
        expect_no_op(plan(&anime(12, listed(WatchStatus::OnHold, 2)), 3, &ctx, now())),
        NoOpReason::NotOnPlanToWatch
    );
    assert_eq!(
        expect_no_op(plan(&anime(12, listed(WatchStatus::OnHold, 5)), 3, &ctx, now())),
        NoOpReason::AlreadyWatched
    );
}

#[test]
fn test_plan_to_watch_only_still_short_circuits_watching() {
    let ctx = mal().plan_to_watch_only(true);
    let update = expect_update(plan(&anime(12, listed(WatchStatus::Watching, 2)), 3, &ctx, now()));
    assert_eq!(update.episode_progress, 3);
}

#[test]
fn test_plan_to_watch_only_rewatch_branch() {
    let ctx = mal().plan_to_watch_only(true);
    let done = anime(12, listed(WatchStatus::Completed, 12));
    assert_eq!(expect_no_op(plan(&done, 1, &ctx, now())), NoOpReason::RewatchDisabled);

    let ctx = ctx.rewatch_completed(true);
    let update = expect_update(plan(&done, 1, &ctx, now()));
    assert_eq!(update.is_rewatching, Some(true));

    // A rewatch already in progress is left alone
    assert_eq!(
        expect_no_op(plan(&anime(12, rewatching(4, 0)), 5, &ctx, now())),
        NoOpReason::NotOnPlanToWatch
    );
}

#[test]
fn test_override_keeps_completed_entry() {
    let ctx = mal().rewatch_completed(true).override_rewatch_check(Some(false));
    let done = anime(12, listed(WatchStatus::Completed, 12));
    assert_eq!(expect_no_op(plan(&done, 12, &ctx, now())), NoOpReason::AlreadyCompleted);
}

#[test]
fn test_reduced_path() {
    let ctx = annict();

    let update = expect_update(plan(&anime(12, None), 3, &ctx, now()));
    assert_eq!(update.target_status, WatchStatus::Watching);
    assert_eq!(update.is_rewatching, None);
    assert_eq!(update.start_date, None);

    let update = expect_update(plan(&anime(12, listed(WatchStatus::Watching, 11)), 12, &ctx, now()));
    assert_eq!(update.target_status, WatchStatus::Completed);
    assert_eq!(update.rewatch_count, RewatchCount::Unchanged);

    assert_eq!(
        expect_no_op(plan(&anime(12, listed(WatchStatus::Watching, 4)), 4, &ctx, now())),
        NoOpReason::AlreadyWatched
    );

    // Completed is terminal even when the user tracks rewatches
    let ctx = ctx.rewatch_completed(true);
    assert_eq!(
        expect_no_op(plan(&anime(12, listed(WatchStatus::Completed, 12)), 1, &ctx, now())),
        NoOpReason::AlreadyCompleted
    );

    let ctx = annict().plan_to_watch_only(true);
    assert_eq!(expect_no_op(plan(&anime(12, None), 1, &ctx, now())), NoOpReason::NotOnPlanToWatch);
    let update = expect_update(plan(&anime(12, listed(WatchStatus::PlanToWatch, 0)), 1, &ctx, now()));
    assert_eq!(update.target_status, WatchStatus::Watching);
}

#[test]
fn test_list_state_classification() {
    assert_eq!(ListState::of(None), ListState::NoEntry);
    assert_eq!(ListState::of(rewatching(1, 0).as_ref()), ListState::Rewatching);
    assert_eq!(
        ListState::of(listed(WatchStatus::Dropped, 3).as_ref()),
        ListState::Other
    );
}

#[test]
fn test_decision_json_shape() {
    let no_op = plan(&anime(12, listed(WatchStatus::Watching, 4)), 4, &mal(), now());
    let value = serde_json::to_value(&no_op).unwrap();
    assert_eq!(value["kind"], "no_op");
    assert_eq!(value["reason"], "already_watched");

    let update = plan(&anime(12, None), 1, &mal(), now());
    let value = serde_json::to_value(&update).unwrap();
    assert_eq!(value["kind"], "update");
    assert_eq!(value["episode_progress"], 1);
    assert_eq!(value["rewatch_count"], "unchanged");
}
