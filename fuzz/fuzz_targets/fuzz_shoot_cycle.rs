#![no_main]
use std::time::Duration;

use autoshoot_core::{
    CycleCfg, CycleState, ShootCycleStateMachine, SlidingWindowFilter, StabilityDetector,
};
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Tick {
    speed: f64,
    aligned: bool,
    dt_ms: u8,
}

#[derive(Debug, Arbitrary)]
struct Input {
    capacity: u8,
    threshold: f64,
    purge_ms: u16,
    feed_ms: u16,
    pause_ms: u16,
    await_timeout_ms: Option<u16>,
    ticks: Vec<Tick>,
}

fuzz_target!(|input: Input| {
    let mut window = SlidingWindowFilter::new(usize::from(input.capacity));
    let detector = StabilityDetector::new(input.threshold);
    let mut cycle = ShootCycleStateMachine::new(&CycleCfg {
        purge_ms: u64::from(input.purge_ms),
        feed_ms: u64::from(input.feed_ms.max(1)),
        pause_ms: u64::from(input.pause_ms.max(1)),
        await_timeout_ms: input.await_timeout_ms.map(|t| u64::from(t.max(1))),
    });

    for t in &input.ticks {
        let before = cycle.state();
        let verdict = detector.evaluate(t.speed, t.aligned, &mut window);
        let transition = cycle.advance(Duration::from_millis(u64::from(t.dt_ms)), verdict.is_ready());
        assert!(window.len() <= window.capacity());
        if before == CycleState::Done {
            assert!(transition.is_none());
        }
        if let Some(tr) = transition {
            assert_eq!(tr.from, before);
            if tr.to == CycleState::Feeding {
                assert!(verdict.is_ready());
            }
        }
    }
});
