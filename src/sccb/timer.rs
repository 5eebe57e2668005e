use std::hint::spin_loop;

use super::CycleCounter;
use crate::SccbError;

// how often to poll the counter after enabling it before giving up
const START_PROBE_READS: u32 = 64;

/// Busy-wait delays on top of a [`CycleCounter`].
#[derive(Debug)]
pub struct CycleTimer<C> {
	counter: C,
}

impl<C: CycleCounter> CycleTimer<C> {
	pub fn new(counter: C) -> Self {
		CycleTimer { counter }
	}

	pub fn counter(&self) -> &C {
		&self.counter
	}

	/// Enable the counter and check it actually counts.
	pub fn enable(&mut self) -> Result<(), SccbError> {
		self.counter.enable();
		let first = self.counter.cycles();
		for _ in 0..START_PROBE_READS {
			if self.counter.cycles() != first {
				return Ok(());
			}
			spin_loop();
		}
		Err(SccbError::TimerNotRunning)
	}

	pub fn now(&self) -> u32 {
		self.counter.cycles()
	}

	/// Spin until at least `wait` cycles passed since `start`.
	///
	/// Uses wrapping subtraction, so a counter overflow between `start` and
	/// now doesn't end the wait early.
	pub fn wait_since(&self, start: u32, wait: u32) {
		while self.counter.cycles().wrapping_sub(start) < wait {
			spin_loop();
		}
	}

	pub fn wait(&self, wait: u32) {
		if 0 == wait {
			return;
		}
		let start = self.now();
		self.wait_since(start, wait);
	}
}
