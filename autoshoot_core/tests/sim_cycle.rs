//! Full shooting runs against the simulated rig, paced by a manual clock.

use std::sync::atomic::AtomicBool;

use autoshoot_core::runner::{RunEnd, RunParams, run, run_with};
use autoshoot_core::{AbortReason, AutoShoot, CycleCfg, CycleState, MemoryStatusBoard};
use autoshoot_hardware::{FeedState, SimParams, SimRig};
use autoshoot_traits::{ManualClock, StatusBoard};
use rstest::rstest;

fn build(rig: &SimRig, board: &MemoryStatusBoard, cycle: CycleCfg) -> AutoShoot {
    AutoShoot::builder()
        .with_vision(rig.vision())
        .with_shooter(rig.shooter())
        .with_feeder(rig.feeder())
        .with_heading(rig.gyro())
        .with_cycle(cycle)
        .with_status_board(board.clone())
        .build()
        .expect("build")
}

/// Wheel at speed from the second tick on, no ripple.
fn ideal() -> SimParams {
    SimParams {
        spin_response: 1.0,
        ripple: 0.0,
        ..SimParams::default()
    }
}

#[rstest]
fn realistic_spin_up_fires_repeatedly_until_tick_limit() {
    let rig = SimRig::new(SimParams::default());
    let board = MemoryStatusBoard::new();
    let mut cmd = build(&rig, &board, CycleCfg::default());
    let params = RunParams {
        max_ticks: Some(400),
        ..RunParams::default()
    };

    let mut feeding_ticks = 0u64;
    let report = run_with(
        &mut cmd,
        &ManualClock::new(),
        &params,
        &AtomicBool::new(false),
        |c, _| {
            if c.state() == CycleState::Feeding {
                feeding_ticks += 1;
            }
        },
    )
    .expect("run");

    assert_eq!(report.end, RunEnd::TickLimit);
    assert_eq!(report.ticks, 400);
    assert!(cmd.shots_fired() >= 2, "shots: {}", cmd.shots_fired());
    assert!(feeding_ticks >= 50);
    assert_eq!(cmd.finish_reason(), None);

    // interrupted end leaves the rig safe
    let snap = rig.snapshot();
    assert_eq!(snap.feed, FeedState::Idle);
    assert_eq!(snap.commanded_speed, 0.0);
    assert!(!snap.auto_mode);
    assert!(!snap.indicator_on);
    assert_eq!(board.get_status("Robot Mode:").as_deref(), Some("TeleOp"));
}

#[rstest]
fn ideal_wheel_feeds_on_first_consistent_tick() {
    let rig = SimRig::new(ideal());
    let board = MemoryStatusBoard::new();
    let mut cmd = build(&rig, &board, CycleCfg::default());

    let mut first_feed = None;
    run_with(
        &mut cmd,
        &ManualClock::new(),
        &RunParams {
            max_ticks: Some(60),
            ..RunParams::default()
        },
        &AtomicBool::new(false),
        |c, n| {
            if first_feed.is_none() && c.state() == CycleState::Feeding {
                first_feed = Some(n);
            }
        },
    )
    .expect("run");

    // tick 1 reads a stopped wheel; it leaves the window on tick 51
    assert_eq!(first_feed, Some(52));
    assert_eq!(rig.snapshot().feed_starts, 1);
}

#[rstest]
fn losing_target_mid_shot_finishes_the_command() {
    let rig = SimRig::new(SimParams {
        lose_alignment_after_ticks: Some(60),
        ..ideal()
    });
    let board = MemoryStatusBoard::new();
    let mut cmd = build(&rig, &board, CycleCfg::default());
    let clock = ManualClock::new();

    let report = run(&mut cmd, &clock, &RunParams::default(), &AtomicBool::new(false))
        .expect("run");

    assert_eq!(report.end, RunEnd::Finished);
    assert_eq!(report.ticks, 61);
    // no sleep after the finishing tick
    assert_eq!(report.elapsed_ms, 60 * 20);
    assert_eq!(cmd.finish_reason(), Some(AbortReason::StabilityLost));
    assert_eq!(rig.snapshot().feed, FeedState::Idle);
}

#[rstest]
fn await_timeout_finishes_when_never_aligned() {
    let rig = SimRig::new(SimParams {
        align_after_ticks: u64::MAX,
        ..ideal()
    });
    let board = MemoryStatusBoard::new();
    let mut cmd = build(
        &rig,
        &board,
        CycleCfg {
            await_timeout_ms: Some(1000),
            ..CycleCfg::default()
        },
    );
    let report = run(
        &mut cmd,
        &ManualClock::new(),
        &RunParams::default(),
        &AtomicBool::new(false),
    )
    .expect("run");
    assert_eq!(report.end, RunEnd::Finished);
    assert_eq!(cmd.finish_reason(), Some(AbortReason::StabilityTimeout));
}

#[rstest]
fn max_runtime_cancels_a_long_wait() {
    let rig = SimRig::new(SimParams {
        align_after_ticks: u64::MAX,
        ..ideal()
    });
    let board = MemoryStatusBoard::new();
    let mut cmd = build(&rig, &board, CycleCfg::default());
    let report = run(
        &mut cmd,
        &ManualClock::new(),
        &RunParams {
            max_run_ms: 2000,
            ..RunParams::default()
        },
        &AtomicBool::new(false),
    )
    .expect("run");
    assert_eq!(report.end, RunEnd::MaxRuntime);
    assert_eq!(report.ticks, 100);
    assert_eq!(cmd.state(), CycleState::AwaitStability);
    assert!(!rig.snapshot().auto_mode);
}

#[rstest]
fn ball_load_dip_mid_feed_aborts_the_shot() {
    let rig = SimRig::new(SimParams {
        spin_response: 0.5,
        ripple: 0.0,
        ..SimParams::default()
    });
    let board = MemoryStatusBoard::new();
    let mut cmd = build(&rig, &board, CycleCfg::default());

    let mut dipped = false;
    let report = run_with(
        &mut cmd,
        &ManualClock::new(),
        &RunParams {
            max_ticks: Some(400),
            ..RunParams::default()
        },
        &AtomicBool::new(false),
        |c, _| {
            if !dipped && c.state() == CycleState::Feeding {
                rig.disturb(-5.0);
                dipped = true;
            }
        },
    )
    .expect("run");

    assert!(dipped);
    assert_eq!(report.end, RunEnd::Finished);
    assert_eq!(cmd.finish_reason(), Some(AbortReason::StabilityLost));
    let snap = rig.snapshot();
    assert_eq!(snap.feed_starts, 1);
    assert_eq!(snap.feed, FeedState::Idle);
}
