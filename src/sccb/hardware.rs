#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Line {
	Clock,
	Data,
}

impl Line {
	pub(crate) fn index(self) -> usize {
		match self {
			Line::Clock => 0,
			Line::Data => 1,
		}
	}
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Mode {
	/// actively driven; open-drain, so "high" only releases the line
	Output,
	/// floating, externally readable
	Input,
}

/// Pin control for the two bus lines.
///
/// Both lines are expected to be wired open-drain with an external pull-up.
pub trait Pins {
	/// `Mode::Output` must configure open-drain, no internal pull and the
	/// fastest slew rate available.
	fn set_mode(&mut self, line: Line, mode: Mode);

	/// set the output latch; only visible on the line in `Mode::Output`
	fn write(&mut self, line: Line, high: bool);

	fn read(&mut self, line: Line) -> bool;
}

/// Free-running unsigned counter driven by the CPU clock.
pub trait CycleCounter {
	/// start counting; called once before the first `cycles()`
	fn enable(&mut self);

	/// current counter value; wraps around
	fn cycles(&self) -> u32;

	/// counter ticks per second
	fn frequency(&self) -> u32;
}
