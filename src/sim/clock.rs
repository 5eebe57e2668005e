use std::cell::Cell;
use std::rc::Rc;

use crate::sccb::CycleCounter;

/// Counter that advances by one each time it is read, once enabled.
#[derive(Clone, Debug)]
pub struct SimCounter {
	time: Rc<Cell<u32>>,
	frequency: u32,
	running: bool,
	stalled: bool,
}

impl SimCounter {
	pub fn new(frequency: u32) -> Self {
		Self::with_time(Rc::new(Cell::new(0)), frequency)
	}

	pub(super) fn with_time(time: Rc<Cell<u32>>, frequency: u32) -> Self {
		SimCounter {
			time,
			frequency,
			running: false,
			stalled: false,
		}
	}

	pub fn starting_at(self, value: u32) -> Self {
		self.time.set(value);
		self
	}

	/// never starts counting, even after `enable`
	pub fn stalled(mut self) -> Self {
		self.stalled = true;
		self
	}

	/// current value without advancing
	pub fn peek(&self) -> u32 {
		self.time.get()
	}
}

impl CycleCounter for SimCounter {
	fn enable(&mut self) {
		self.running = true;
	}

	fn cycles(&self) -> u32 {
		let now = self.time.get();
		if self.running && !self.stalled {
			self.time.set(now.wrapping_add(1));
		}
		now
	}

	fn frequency(&self) -> u32 {
		self.frequency
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counts_only_when_enabled() {
		let mut counter = SimCounter::new(1000).starting_at(u32::MAX);
		assert_eq!(counter.cycles(), u32::MAX);
		assert_eq!(counter.cycles(), u32::MAX);
		counter.enable();
		assert_eq!(counter.cycles(), u32::MAX);
		assert_eq!(counter.cycles(), 0);
		assert_eq!(counter.peek(), 1);
	}

	#[test]
	fn stalled_never_counts() {
		let mut counter = SimCounter::new(1000).stalled();
		counter.enable();
		assert_eq!(counter.cycles(), 0);
		assert_eq!(counter.cycles(), 0);
	}
}
