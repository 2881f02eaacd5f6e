use super::*;

const KEY: JobKey = JobKey {
    kind: JobKind::ReapplyAll,
    pack_id: None,
};

#[test]
fn second_start_returns_running_snapshot() {
    let jobs = JobRegistry::new();
    assert!(jobs.try_start(KEY, 3).started());
    jobs.record(KEY, SourceId(1), Ok(()));

    let again = jobs.try_start(KEY, 99);
    assert!(!again.started());
    assert_eq!(again.snapshot().total, 3);
    assert_eq!(again.snapshot().done, 1);
}

#[test]
fn keys_with_different_packs_are_independent() {
    let jobs = JobRegistry::new();
    let scoped = JobKey::new(JobKind::ReapplyAll, Some(PackId(4)));
    assert!(jobs.try_start(KEY, 1).started());
    assert!(jobs.try_start(scoped, 1).started());
}

#[test]
fn progress_survives_completion_until_next_run() {
    let jobs = JobRegistry::new();
    jobs.try_start(KEY, 2);
    jobs.record(KEY, SourceId(1), Ok(()));
    jobs.record(KEY, SourceId(2), Err("boom".to_string()));
    jobs.finish(KEY);

    let snap = jobs.snapshot(KEY);
    assert!(!snap.running);
    assert_eq!(snap.phase, JobPhase::Completed);
    assert_eq!((snap.total, snap.done, snap.ok), (2, 2, 1));
    assert_eq!(snap.errors[0].source_id, SourceId(2));
    assert!(snap.finished_at.is_some());

    let restarted = jobs.try_start(KEY, 5);
    assert!(restarted.started());
    assert!(restarted.snapshot().errors.is_empty());
}

#[test]
fn unknown_slot_reads_as_idle() {
    let jobs = JobRegistry::new();
    let snap = jobs.snapshot(JobKey::new(JobKind::ApplyMissing, None));
    assert_eq!(snap.phase, JobPhase::Idle);
    assert!(!snap.running);
}

#[test]
fn kinds_parse_from_paths() {
    assert_eq!("reapply-all".parse::<JobKind>().unwrap(), JobKind::ReapplyAll);
    assert_eq!("apply_missing".parse::<JobKind>().unwrap(), JobKind::ApplyMissing);
    assert!("nope".parse::<JobKind>().is_err());
}

#[test]
fn busy_slot_queues_a_single_rerun() {
    let jobs = JobRegistry::new();
    assert!(jobs.start_or_queue(KEY, 2).started());
    jobs.record(KEY, SourceId(1), Err("boom".to_string()));

    let queued = jobs.start_or_queue(KEY, 5);
    assert!(!queued.started());
    assert!(queued.snapshot().rerun_queued);
    assert!(!jobs.start_or_queue(KEY, 5).started());

    assert!(jobs.finish_or_rerun(KEY));
    let rerun = jobs.snapshot(KEY);
    assert!(rerun.running);
    assert!(!rerun.rerun_queued);
    assert_eq!((rerun.done, rerun.ok), (0, 0));
    assert!(rerun.errors.is_empty());

    jobs.set_total(KEY, 4);
    assert_eq!(jobs.snapshot(KEY).total, 4);
    assert!(!jobs.finish_or_rerun(KEY));
    assert_eq!(jobs.snapshot(KEY).phase, JobPhase::Completed);
}

#[test]
fn plain_start_never_queues() {
    let jobs = JobRegistry::new();
    jobs.try_start(KEY, 1);
    jobs.try_start(KEY, 1);
    assert!(!jobs.snapshot(KEY).rerun_queued);
    assert!(!jobs.finish_or_rerun(KEY));
}
