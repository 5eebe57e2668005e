use super::{
	CycleCounter,
	CycleTimer,
	Line,
	Mode,
	Pins,
};

/// Drives the clock and data lines, with an optional settle delay after
/// each level change.
///
/// Settle delays are measured from right before the pin write, not from
/// when the wait starts.
#[derive(Debug)]
pub struct LineDriver<P, C> {
	pins: P,
	timer: CycleTimer<C>,
	modes: [Mode; 2],
}

impl<P: Pins, C: CycleCounter> LineDriver<P, C> {
	/// Lines are assumed released (input) until configured.
	pub fn new(pins: P, timer: CycleTimer<C>) -> Self {
		LineDriver {
			pins,
			timer,
			modes: [Mode::Input; 2],
		}
	}

	pub fn timer(&self) -> &CycleTimer<C> {
		&self.timer
	}

	pub fn timer_mut(&mut self) -> &mut CycleTimer<C> {
		&mut self.timer
	}

	pub fn mode(&self, line: Line) -> Mode {
		self.modes[line.index()]
	}

	fn set_level(&mut self, line: Line, high: bool, settle: u32) {
		debug_assert_eq!(self.mode(line), Mode::Output, "{:?} line not in output mode", line);
		let start = self.timer.now();
		self.pins.write(line, high);
		self.timer.wait_since(start, settle);
	}

	pub fn set_high(&mut self, line: Line, settle: u32) {
		self.set_level(line, true, settle);
	}

	pub fn set_low(&mut self, line: Line, settle: u32) {
		self.set_level(line, false, settle);
	}

	/// Release the line so another device can drive it.
	///
	/// Latch goes high first: switching direction with a low latch would
	/// glitch the line low.
	pub fn as_input(&mut self, line: Line) {
		self.pins.write(line, true);
		self.pins.set_mode(line, Mode::Input);
		self.modes[line.index()] = Mode::Input;
	}

	/// Open-drain output, starting released (high).
	pub fn as_output(&mut self, line: Line) {
		self.pins.write(line, true);
		self.pins.set_mode(line, Mode::Output);
		self.modes[line.index()] = Mode::Output;
	}

	pub(crate) fn ensure_output(&mut self, line: Line) {
		if Mode::Output != self.mode(line) {
			self.as_output(line);
		}
	}

	pub fn read(&mut self, line: Line) -> bool {
		debug_assert_eq!(self.mode(line), Mode::Input, "{:?} line not in input mode", line);
		self.pins.read(line)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sim::SimBus;

	fn driver(sim: &SimBus) -> LineDriver<crate::sim::SimPins, crate::sim::SimCounter> {
		let mut timer = CycleTimer::new(sim.counter(1_000_000));
		timer.enable().unwrap();
		LineDriver::new(sim.pins(), timer)
	}

	#[test]
	fn released_line_reads_high() {
		let sim = SimBus::new();
		let mut d = driver(&sim);
		d.as_output(Line::Data);
		d.set_low(Line::Data, 0);
		assert!(!sim.level(Line::Data));
		d.as_input(Line::Data);
		assert!(d.read(Line::Data));
		assert_eq!(d.mode(Line::Data), Mode::Input);
	}

	#[test]
	fn as_input_doesnt_glitch_low() {
		let sim = SimBus::new();
		let mut d = driver(&sim);
		d.as_output(Line::Clock);
		d.as_input(Line::Clock);
		d.as_output(Line::Clock);
		assert!(sim.transitions().is_empty());
	}

	#[test]
	fn settle_counts_from_pin_write() {
		let sim = SimBus::new();
		let mut d = driver(&sim);
		d.as_output(Line::Clock);
		d.set_low(Line::Clock, 50);
		let after = d.timer().now();
		let edge = sim.transitions()[0];
		assert_eq!(edge.line, Line::Clock);
		assert!(!edge.level);
		assert!(after.wrapping_sub(edge.at) >= 50);
	}

	#[test]
	fn zero_settle_doesnt_wait() {
		let sim = SimBus::new();
		let mut d = driver(&sim);
		d.as_output(Line::Data);
		let before = d.timer().now();
		d.set_low(Line::Data, 0);
		d.set_high(Line::Data, 0);
		// only the reads for the two timestamps and wait checks
		assert!(d.timer().now().wrapping_sub(before) < 8);
	}
}
