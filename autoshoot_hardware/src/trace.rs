//! Replay of recorded shooter telemetry through the `Vision` interface.
//!
//! Each `calc_align` call moves to the next recorded sample; the speed,
//! target and alignment reads then report that sample. Reading past the end
//! yields `HwError::TraceExhausted`.

use autoshoot_traits::Vision;

use crate::error::HwError;

type HwResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSample {
    pub speed: f64,
    pub target_speed: f64,
    pub aligned: bool,
}

#[derive(Debug, Clone)]
pub struct TraceVision {
    samples: Vec<TraceSample>,
    /// Index of the sample for the current tick; `None` before the first tick.
    cursor: Option<usize>,
}

impl TraceVision {
    pub fn new(samples: Vec<TraceSample>) -> Self {
        Self {
            samples,
            cursor: None,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor.map_or(0, |c| c + 1)
    }

    fn current(&self) -> Result<&TraceSample, HwError> {
        self.cursor
            .and_then(|c| self.samples.get(c))
            .ok_or(HwError::TraceExhausted(self.samples.len()))
    }
}

impl Vision for TraceVision {
    // recorded runs have no light to drive
    fn enable_indicator(&mut self) -> HwResult<()> {
        Ok(())
    }

    fn disable_indicator(&mut self) -> HwResult<()> {
        Ok(())
    }

    fn reset_alignment(&mut self) {}

    fn calc_align(&mut self, _heading: f64) -> HwResult<()> {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next >= self.samples.len() {
            return Err(Box::new(HwError::TraceExhausted(self.samples.len())));
        }
        self.cursor = Some(next);
        Ok(())
    }

    fn auto_target_speed(&mut self) -> HwResult<f64> {
        Ok(self.current()?.target_speed)
    }

    fn is_aligned(&self) -> bool {
        self.current().is_ok_and(|s| s.aligned)
    }

    fn current_shooter_speed(&mut self) -> HwResult<f64> {
        Ok(self.current()?.speed)
    }
}
