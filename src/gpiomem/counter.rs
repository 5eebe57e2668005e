use std::time::Instant;

use crate::sccb::CycleCounter;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Nanoseconds since `enable()`, truncated to 32 bits.
///
/// Stands still until enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicCounter {
	started: Option<Instant>,
}

impl MonotonicCounter {
	pub fn new() -> Self {
		MonotonicCounter { started: None }
	}
}

impl CycleCounter for MonotonicCounter {
	fn enable(&mut self) {
		if self.started.is_none() {
			self.started = Some(Instant::now());
		}
	}

	fn cycles(&self) -> u32 {
		match self.started {
			Some(started) => started.elapsed().as_nanos() as u32,
			None => 0,
		}
	}

	fn frequency(&self) -> u32 {
		NANOS_PER_SECOND
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sccb::CycleTimer;

	#[test]
	fn disabled_counter_stands_still() {
		let counter = MonotonicCounter::new();
		assert_eq!(counter.cycles(), 0);
		assert_eq!(counter.cycles(), 0);
	}

	#[test]
	fn timer_starts() {
		let mut timer = CycleTimer::new(MonotonicCounter::new());
		timer.enable().unwrap();
		let start = timer.now();
		timer.wait_since(start, 10_000);
		assert!(timer.now().wrapping_sub(start) >= 10_000);
	}
}
