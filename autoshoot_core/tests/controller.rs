//! Controller behavior against scripted collaborators that record every call.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use autoshoot_core::{
    AbortReason, AutoShoot, CycleCfg, CycleState, MemoryStatusBoard, ShootError, ShootStatus,
};
use autoshoot_traits::{Feeder, HeadingSensor, Shooter, StatusBoard, Vision};
use rstest::rstest;

const DT: Duration = Duration::from_millis(20);

type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    EnableIndicator,
    DisableIndicator,
    ResetAlignment,
    CalcAlign(f64),
    Spin(f64),
    ShooterStop,
    AutoMode(bool),
    Feed,
    Reverse,
    FeederStop,
}

type Log = Rc<RefCell<Vec<Call>>>;

/// Speed and alignment as functions of the 1-based tick number.
struct ScriptVision {
    log: Log,
    tick: Rc<Cell<u64>>,
    speed: Box<dyn Fn(u64) -> f64>,
    aligned: Box<dyn Fn(u64) -> bool>,
    fail_speed_at: Option<u64>,
    fail_enable: Rc<Cell<bool>>,
}

impl Vision for ScriptVision {
    fn enable_indicator(&mut self) -> HwResult<()> {
        self.log.borrow_mut().push(Call::EnableIndicator);
        if self.fail_enable.get() {
            return Err("indicator relay open".into());
        }
        Ok(())
    }
    fn disable_indicator(&mut self) -> HwResult<()> {
        self.log.borrow_mut().push(Call::DisableIndicator);
        Ok(())
    }
    fn reset_alignment(&mut self) {
        self.log.borrow_mut().push(Call::ResetAlignment);
    }
    fn calc_align(&mut self, heading: f64) -> HwResult<()> {
        self.tick.set(self.tick.get() + 1);
        self.log.borrow_mut().push(Call::CalcAlign(heading));
        Ok(())
    }
    fn auto_target_speed(&mut self) -> HwResult<f64> {
        Ok(60.0)
    }
    fn is_aligned(&self) -> bool {
        (self.aligned)(self.tick.get())
    }
    fn current_shooter_speed(&mut self) -> HwResult<f64> {
        if self.fail_speed_at == Some(self.tick.get()) {
            return Err("encoder unplugged".into());
        }
        Ok((self.speed)(self.tick.get()))
    }
}

struct SpyShooter {
    log: Log,
}

impl Shooter for SpyShooter {
    fn spin(&mut self, speed: f64) -> HwResult<()> {
        self.log.borrow_mut().push(Call::Spin(speed));
        Ok(())
    }
    fn stop(&mut self) -> HwResult<()> {
        self.log.borrow_mut().push(Call::ShooterStop);
        Ok(())
    }
    fn set_auto_mode(&mut self, on: bool) -> HwResult<()> {
        self.log.borrow_mut().push(Call::AutoMode(on));
        Ok(())
    }
}

struct SpyFeeder {
    log: Log,
    fail_stop: bool,
}

impl Feeder for SpyFeeder {
    fn feed(&mut self) -> HwResult<()> {
        self.log.borrow_mut().push(Call::Feed);
        Ok(())
    }
    fn reverse(&mut self) -> HwResult<()> {
        self.log.borrow_mut().push(Call::Reverse);
        Ok(())
    }
    fn stop(&mut self) -> HwResult<()> {
        self.log.borrow_mut().push(Call::FeederStop);
        if self.fail_stop {
            return Err("feeder stalled".into());
        }
        Ok(())
    }
}

struct FixedHeading(f64);

impl HeadingSensor for FixedHeading {
    fn current_heading(&mut self) -> HwResult<f64> {
        Ok(self.0)
    }
}

struct Rig {
    cmd: AutoShoot,
    log: Log,
    board: MemoryStatusBoard,
}

impl Rig {
    fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    fn tick(&mut self) -> ShootStatus {
        self.cmd.tick(DT).expect("tick")
    }

    /// Tick until `state` is reached; returns the tick number it was entered on.
    fn run_until(&mut self, state: CycleState, max: u64) -> u64 {
        for n in 1..=max {
            self.tick();
            if self.cmd.state() == state {
                return n;
            }
        }
        panic!("{state} not reached within {max} ticks");
    }

    fn feeder_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Feed | Call::Reverse | Call::FeederStop))
            .collect()
    }
}

struct RigOpts {
    speed: Box<dyn Fn(u64) -> f64>,
    aligned: Box<dyn Fn(u64) -> bool>,
    fail_speed_at: Option<u64>,
    fail_enable: Rc<Cell<bool>>,
    fail_feeder_stop: bool,
    cycle: CycleCfg,
}

impl Default for RigOpts {
    fn default() -> Self {
        Self {
            speed: Box::new(|_| 60.0),
            aligned: Box::new(|_| true),
            fail_speed_at: None,
            fail_enable: Rc::new(Cell::new(false)),
            fail_feeder_stop: false,
            cycle: CycleCfg::default(),
        }
    }
}

fn rig(opts: RigOpts) -> Rig {
    rig_with_board(opts, MemoryStatusBoard::new())
}

fn rig_with_board(opts: RigOpts, board: MemoryStatusBoard) -> Rig {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let cmd = AutoShoot::builder()
        .with_vision(ScriptVision {
            log: log.clone(),
            tick: Rc::new(Cell::new(0)),
            speed: opts.speed,
            aligned: opts.aligned,
            fail_speed_at: opts.fail_speed_at,
            fail_enable: opts.fail_enable,
        })
        .with_shooter(SpyShooter { log: log.clone() })
        .with_feeder(SpyFeeder {
            log: log.clone(),
            fail_stop: opts.fail_feeder_stop,
        })
        .with_heading(FixedHeading(42.0))
        .with_cycle(opts.cycle)
        .with_status_board(board.clone())
        .build()
        .expect("build");
    Rig { cmd, log, board }
}

fn status(board: &MemoryStatusBoard) -> Option<String> {
    board.get_status("Robot Mode:")
}

#[test]
fn initialize_arms_indicator_auto_mode_and_status() {
    let mut r = rig(RigOpts::default());
    r.cmd.initialize().expect("init");
    assert_eq!(
        r.calls(),
        vec![Call::EnableIndicator, Call::AutoMode(true), Call::ResetAlignment]
    );
    assert_eq!(status(&r.board).as_deref(), Some("Auto Shoot"));
    assert_eq!(r.cmd.state(), CycleState::Purge);
    assert!(!r.cmd.is_finished());
}

#[test]
fn every_tick_aligns_on_current_heading_and_spins_to_auto_speed() {
    let mut r = rig(RigOpts::default());
    r.cmd.initialize().expect("init");
    r.clear();
    r.tick();
    let calls = r.calls();
    assert_eq!(calls[0], Call::CalcAlign(42.0));
    assert!(calls.contains(&Call::Spin(60.0)));
}

#[test]
fn purge_reverses_for_three_ticks_then_stops() {
    let mut r = rig(RigOpts::default());
    r.cmd.initialize().expect("init");
    r.clear();

    for _ in 0..3 {
        assert_eq!(r.tick(), ShootStatus::Running(CycleState::Purge));
    }
    // reverse is edge-triggered: one call for the whole purge
    assert_eq!(r.feeder_calls(), vec![Call::Reverse]);

    assert_eq!(
        r.tick(),
        ShootStatus::Running(CycleState::AwaitStability)
    );
    assert_eq!(r.feeder_calls(), vec![Call::Reverse, Call::FeederStop]);
}

#[test]
fn feeds_once_window_overflows_then_pauses_and_feeds_again() {
    let mut r = rig(RigOpts::default());
    r.cmd.initialize().expect("init");

    // window of 50 needs 51 samples before the speed counts as consistent
    let feeding_at = r.run_until(CycleState::Feeding, 200);
    assert_eq!(feeding_at, 51);
    assert_eq!(r.feeder_calls().last(), Some(&Call::Feed));

    // 500 ms feed window at 20 ms ticks
    let pause_after = r.run_until(CycleState::Pause, 200);
    assert_eq!(pause_after, 25);
    assert_eq!(r.cmd.shots_fired(), 1);
    assert_eq!(r.feeder_calls().last(), Some(&Call::FeederStop));

    // 1000 ms pause, back to waiting, then straight into the next shot
    assert_eq!(r.run_until(CycleState::AwaitStability, 200), 50);
    assert_eq!(r.run_until(CycleState::Feeding, 10), 1);

    let feeds = r.feeder_calls().iter().filter(|c| **c == Call::Feed).count();
    assert_eq!(feeds, 2);
}

#[test]
fn unstable_speed_never_starts_feeding() {
    // a wheel still ramping never matches the reading one window ago
    let mut r = rig(RigOpts {
        speed: Box::new(|n| n as f64 * 0.5),
        ..RigOpts::default()
    });
    r.cmd.initialize().expect("init");
    for _ in 0..300 {
        r.tick();
    }
    assert_eq!(r.cmd.state(), CycleState::AwaitStability);
    assert!(!r.feeder_calls().contains(&Call::Feed));
}

#[test]
fn misaligned_robot_never_feeds() {
    let mut r = rig(RigOpts {
        aligned: Box::new(|_| false),
        ..RigOpts::default()
    });
    r.cmd.initialize().expect("init");
    for _ in 0..200 {
        r.tick();
    }
    assert_eq!(r.cmd.state(), CycleState::AwaitStability);
    let v = r.cmd.last_verdict();
    assert!(v.consistent && !v.aligned);
}

#[test]
fn losing_alignment_mid_feed_aborts_and_stops_feeder_same_tick() {
    let mut r = rig(RigOpts {
        aligned: Box::new(|n| n <= 60),
        ..RigOpts::default()
    });
    r.cmd.initialize().expect("init");
    assert_eq!(r.run_until(CycleState::Feeding, 100), 51);

    for _ in 52..=60 {
        assert_eq!(r.tick(), ShootStatus::Running(CycleState::Feeding));
    }
    r.clear();
    assert_eq!(r.tick(), ShootStatus::Finished(AbortReason::StabilityLost));
    assert!(r.cmd.is_finished());
    assert_eq!(r.cmd.finish_reason(), Some(AbortReason::StabilityLost));
    assert_eq!(r.cmd.shots_fired(), 0);
    // the transition tick still spins, then stops the feeder
    assert_eq!(
        r.calls(),
        vec![Call::CalcAlign(42.0), Call::Spin(60.0), Call::FeederStop]
    );

    // finished ticks touch nothing
    r.clear();
    assert_eq!(r.tick(), ShootStatus::Finished(AbortReason::StabilityLost));
    assert!(r.calls().is_empty());
}

#[test]
fn speed_dip_mid_feed_aborts() {
    let mut r = rig(RigOpts {
        speed: Box::new(|n| if n == 55 { 59.0 } else { 60.0 }),
        ..RigOpts::default()
    });
    r.cmd.initialize().expect("init");
    assert_eq!(r.run_until(CycleState::Done, 100), 55);
    assert_eq!(r.cmd.finish_reason(), Some(AbortReason::StabilityLost));
}

#[test]
fn await_timeout_gives_up() {
    let mut r = rig(RigOpts {
        aligned: Box::new(|_| false),
        cycle: CycleCfg {
            await_timeout_ms: Some(200),
            ..CycleCfg::default()
        },
        ..RigOpts::default()
    });
    r.cmd.initialize().expect("init");
    r.run_until(CycleState::Done, 100);
    assert_eq!(r.cmd.finish_reason(), Some(AbortReason::StabilityTimeout));
}

#[test]
fn end_interrupted_stops_every_actuator_once() {
    let mut r = rig(RigOpts::default());
    r.cmd.initialize().expect("init");
    r.run_until(CycleState::Feeding, 100);
    r.clear();

    r.cmd.end(true);
    let calls = r.calls();
    for expected in [
        Call::DisableIndicator,
        Call::ShooterStop,
        Call::FeederStop,
        Call::AutoMode(false),
    ] {
        assert_eq!(
            calls.iter().filter(|c| **c == expected).count(),
            1,
            "{expected:?} in {calls:?}"
        );
    }
    assert_eq!(status(&r.board).as_deref(), Some("TeleOp"));
}

#[test]
fn end_twice_is_harmless() {
    let mut r = rig(RigOpts::default());
    r.cmd.initialize().expect("init");
    r.tick();
    r.cmd.end(false);
    r.cmd.end(false);
    assert_eq!(status(&r.board).as_deref(), Some("TeleOp"));
}

#[test]
fn end_without_initialize_is_safe() {
    let mut r = rig(RigOpts::default());
    r.cmd.end(true);
    assert!(r.calls().contains(&Call::FeederStop));
    // we never published, so we do not restore anything
    assert_eq!(status(&r.board), None);
}

#[test]
fn failing_stop_does_not_prevent_the_rest_of_cleanup() {
    let mut r = rig(RigOpts {
        fail_feeder_stop: true,
        ..RigOpts::default()
    });
    r.cmd.initialize().expect("init");
    r.cmd.end(true);
    let calls = r.calls();
    assert!(calls.contains(&Call::AutoMode(false)));
    assert_eq!(status(&r.board).as_deref(), Some("TeleOp"));
}

#[rstest]
#[case(Some("Manual"), None, Some("Manual"))]
#[case(None, None, Some("TeleOp"))]
#[case(Some("Manual"), Some("Climb"), Some("Climb"))]
#[case(None, Some("Climb"), Some("Climb"))]
fn status_is_restored_only_if_still_ours(
    #[case] before: Option<&str>,
    #[case] overwritten_with: Option<&str>,
    #[case] after: Option<&str>,
) {
    let mut board = MemoryStatusBoard::new();
    if let Some(b) = before {
        board.set_status("Robot Mode:", b);
    }
    let mut r = rig_with_board(RigOpts::default(), board.clone());
    r.cmd.initialize().expect("init");
    assert_eq!(status(&board).as_deref(), Some("Auto Shoot"));
    r.tick();
    if let Some(other) = overwritten_with {
        board.set_status("Robot Mode:", other);
    }
    r.cmd.end(false);
    assert_eq!(status(&board).as_deref(), after);
}

#[test]
fn failed_initialize_does_not_restore_an_earlier_runs_status() {
    let mut board = MemoryStatusBoard::new();
    board.set_status("Robot Mode:", "Manual");
    let fail_enable = Rc::new(Cell::new(false));
    let mut r = rig_with_board(
        RigOpts {
            fail_enable: fail_enable.clone(),
            ..RigOpts::default()
        },
        board.clone(),
    );

    // first run: someone else takes the display, so "Manual" is never restored
    r.cmd.initialize().expect("init");
    board.set_status("Robot Mode:", "Climb");
    r.cmd.end(false);
    assert_eq!(status(&board).as_deref(), Some("Climb"));

    // second run fails before it can record what the display showed
    board.set_status("Robot Mode:", "Auto Shoot");
    fail_enable.set(true);
    let err = r.cmd.initialize().expect_err("indicator fails");
    assert!(format!("{err:#}").contains("enable targeting indicator"));
    r.cmd.end(true);
    assert_eq!(status(&board).as_deref(), Some("TeleOp"));
}

#[test]
fn reinitialize_starts_a_fresh_cycle() {
    let mut r = rig(RigOpts::default());
    r.cmd.initialize().expect("init");
    r.run_until(CycleState::Pause, 200);
    r.cmd.end(true);

    r.cmd.initialize().expect("re-init");
    assert_eq!(r.cmd.state(), CycleState::Purge);
    assert_eq!(r.cmd.shots_fired(), 0);
    // the window starts empty again: 51 ticks before the first feed
    assert_eq!(r.run_until(CycleState::Feeding, 200), 51);
}

#[test]
fn sensor_failure_surfaces_as_typed_error() {
    let mut r = rig(RigOpts {
        fail_speed_at: Some(2),
        ..RigOpts::default()
    });
    r.cmd.initialize().expect("init");
    r.tick();
    let err = r.cmd.tick(DT).expect_err("speed read fails");
    let typed = err
        .chain()
        .find_map(|e| e.downcast_ref::<ShootError>())
        .expect("ShootError in chain");
    assert!(matches!(typed, ShootError::Hardware(msg) if msg.contains("encoder unplugged")));
    assert!(format!("{err:#}").contains("read shooter speed"));
}
