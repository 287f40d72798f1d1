//! End-to-end tests: producers, classifier and state machine together.

use chrono::{Duration, Utc};
use desk_pet::core::{
    create_shared_log, ActivityClassifier, Advance, AnimationStateMachine, BehaviorState,
    ClassifierConfig, CycleRanges, RngSource, DEFAULT_RETENTION_MINUTES,
};
use desk_pet::sprite::SheetLayout;
use desk_pet::ActivityKind;
use std::sync::Arc;
use std::thread;

fn machine_for(log: desk_pet::SharedActivityLog) -> AnimationStateMachine {
    let classifier = ActivityClassifier::new(log, ClassifierConfig::default());
    AnimationStateMachine::new(
        SheetLayout::default().full_library().unwrap(),
        CycleRanges::default(),
        Box::new(classifier),
        Box::new(RngSource::seeded(11)),
    )
}

/// Advance until the current cycle ends and return the outcome.
fn finish_cycle(machine: &mut AnimationStateMachine) -> Advance {
    loop {
        match machine.advance_frame() {
            Advance::Frame => continue,
            other => return other,
        }
    }
}

#[test]
fn test_concurrent_typing_promotes_to_active() {
    let log = create_shared_log(DEFAULT_RETENTION_MINUTES);
    let mut machine = machine_for(log.clone());
    assert_eq!(machine.state(), BehaviorState::Lazy);

    let producers: Vec<_> = [(ActivityKind::Key, 120), (ActivityKind::Mouse, 400)]
        .into_iter()
        .map(|(kind, count)| {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for _ in 0..count {
                    log.record(kind);
                }
            })
        })
        .collect();

    // The timer keeps ticking while producers write, short of a full cycle.
    for _ in 0..5 {
        machine.advance_frame();
    }
    for handle in producers {
        handle.join().unwrap();
    }

    assert_eq!(log.count_within(1.0, Some(ActivityKind::Key)), 120);
    assert_eq!(log.count_within(1.0, Some(ActivityKind::Mouse)), 400);

    let outcome = finish_cycle(&mut machine);
    assert_eq!(
        outcome,
        Advance::Reselected {
            from: BehaviorState::Lazy,
            to: BehaviorState::Active,
        }
    );
    assert_eq!(machine.state(), BehaviorState::Active);
}

#[test]
fn test_classification_scenarios() {
    let now = Utc::now();
    let classify = |keys: i64, key_span: Duration, moves: i64, move_span: Duration| {
        let log = create_shared_log(DEFAULT_RETENTION_MINUTES);
        let mut events = Vec::new();
        for i in 0..keys {
            events.push((ActivityKind::Key, now - key_span * i as i32 / keys as i32));
        }
        for i in 0..moves {
            events.push((ActivityKind::Mouse, now - move_span * i as i32 / moves as i32));
        }
        events.sort_by_key(|(_, at)| *at);
        for (kind, at) in events {
            log.record_at(kind, at);
        }
        ActivityClassifier::new(log, ClassifierConfig::default()).classify_at(now)
    };

    // 60 keys in the last 10 seconds: 60 > 0.25 * 200.
    assert_eq!(
        classify(60, Duration::seconds(10), 0, Duration::zero()),
        BehaviorState::Active
    );
    // 5 keys and 10 moves over five minutes: under both long thresholds.
    assert_eq!(
        classify(5, Duration::minutes(5), 10, Duration::minutes(5)),
        BehaviorState::Lazy
    );
    // 300 keys over five minutes: not a burst, but at or above 5 * 50.
    assert_eq!(
        classify(300, Duration::minutes(5), 0, Duration::zero()),
        BehaviorState::Idle
    );
}

#[test]
fn test_interact_returns_to_interrupted_state() {
    let log = create_shared_log(DEFAULT_RETENTION_MINUTES);
    let mut machine = machine_for(log.clone());

    // Make the classifier answer Idle: steady typing, no burst.
    let now = Utc::now();
    for i in (0..300).rev() {
        log.record_at(ActivityKind::Key, now - Duration::seconds(i));
    }
    let outcome = finish_cycle(&mut machine);
    assert_eq!(
        outcome,
        Advance::Reselected {
            from: BehaviorState::Lazy,
            to: BehaviorState::Idle,
        }
    );

    machine.interact();
    assert_eq!(machine.state(), BehaviorState::Interact);

    let outcome = finish_cycle(&mut machine);
    assert_eq!(
        outcome,
        Advance::Reselected {
            from: BehaviorState::Interact,
            to: BehaviorState::Idle,
        }
    );
    let selection = machine.selection();
    assert_eq!(selection.cycle_count, 0);
    assert!(CycleRanges::default().idle.contains(selection.target_cycles));
}
