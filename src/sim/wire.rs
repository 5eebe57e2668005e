use std::cell::{
	Cell,
	RefCell,
};
use std::rc::Rc;

use super::{
	Condition,
	Edge,
	Levels,
	Monitor,
	SimCounter,
	SimDevice,
};
use crate::sccb::{
	Line,
	Mode,
	Pins,
};

// devices only react to edges, so a change settles within a few rounds
const SETTLE_ROUNDS: usize = 8;

/// A level change on one line, stamped with the simulated time.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Transition {
	pub at: u32,
	pub line: Line,
	pub level: bool,
}

#[derive(Debug)]
struct Wire {
	time: Rc<Cell<u32>>,
	latches: [bool; 2],
	modes: [Mode; 2],
	levels: Levels,
	devices: Vec<SimDevice>,
	monitor: Monitor,
	transitions: Vec<Transition>,
}

impl Wire {
	fn new() -> Self {
		Wire {
			time: Rc::new(Cell::new(0)),
			latches: [true; 2],
			modes: [Mode::Input; 2],
			levels: Levels { clock: true, data: true },
			devices: Vec::new(),
			monitor: Monitor::default(),
			transitions: Vec::new(),
		}
	}

	fn master_pulls_low(&self, line: Line) -> bool {
		Mode::Output == self.modes[line.index()] && !self.latches[line.index()]
	}

	// wired-AND with pull-ups; slaves can only drive data
	fn resolve(&self) -> Levels {
		Levels {
			clock: !self.master_pulls_low(Line::Clock),
			data: !self.master_pulls_low(Line::Data)
				&& !self.devices.iter().any(|d| d.pulls_data_low()),
		}
	}

	fn level(&self, line: Line) -> bool {
		match line {
			Line::Clock => self.levels.clock,
			Line::Data => self.levels.data,
		}
	}

	// propagate a master change to monitor and devices, then any change
	// the devices made in response
	fn settle(&mut self) {
		let mut from_master = true;
		for _ in 0..SETTLE_ROUNDS {
			let prev = self.levels;
			let now = self.resolve();
			if now == prev {
				return;
			}
			self.levels = now;

			let at = self.time.get();
			if prev.clock != now.clock {
				self.transitions.push(Transition { at, line: Line::Clock, level: now.clock });
			}
			if prev.data != now.data {
				self.transitions.push(Transition { at, line: Line::Data, level: now.data });
			}

			let edge = Edge::classify(prev, now, from_master);
			self.monitor.observe(edge, now);
			for device in &mut self.devices {
				device.observe(edge, now);
			}
			from_master = false;
		}
		error!("simulated bus didn't settle after {} rounds", SETTLE_ROUNDS);
	}
}

/// Shared state of a simulated bus.
///
/// Cloning gives another handle to the same bus.
#[derive(Clone, Debug)]
pub struct SimBus {
	wire: Rc<RefCell<Wire>>,
}

impl Default for SimBus {
	fn default() -> Self {
		Self::new()
	}
}

impl SimBus {
	pub fn new() -> Self {
		SimBus {
			wire: Rc::new(RefCell::new(Wire::new())),
		}
	}

	/// Master side pin control.
	pub fn pins(&self) -> SimPins {
		SimPins {
			wire: self.wire.clone(),
		}
	}

	/// Counter sharing the time base used to stamp transitions.
	pub fn counter(&self, frequency: u32) -> SimCounter {
		SimCounter::with_time(self.wire.borrow().time.clone(), frequency)
	}

	pub fn attach(&self, device: SimDevice) {
		let mut wire = self.wire.borrow_mut();
		wire.devices.push(device);
		wire.settle();
	}

	pub fn level(&self, line: Line) -> bool {
		self.wire.borrow().level(line)
	}

	pub fn transitions(&self) -> Vec<Transition> {
		self.wire.borrow().transitions.clone()
	}

	pub fn conditions(&self) -> Vec<Condition> {
		self.wire.borrow().monitor.conditions().to_vec()
	}

	/// Forget recorded transitions and conditions.
	pub fn clear_trace(&self) {
		let mut wire = self.wire.borrow_mut();
		wire.transitions.clear();
		wire.monitor.clear();
	}

	/// Register content of the attached device with `address`.
	pub fn register(&self, address: u8, register: u8) -> Option<u8> {
		self.wire.borrow().devices.iter()
			.find(|d| d.address() == address)
			.map(|d| d.register(register))
	}

	pub fn set_register(&self, address: u8, register: u8, value: u8) -> bool {
		let mut wire = self.wire.borrow_mut();
		match wire.devices.iter_mut().find(|d| d.address() == address) {
			Some(device) => {
				device.set_register(register, value);
				true
			},
			None => false,
		}
	}
}

/// Master side of a [`SimBus`].
#[derive(Clone, Debug)]
pub struct SimPins {
	wire: Rc<RefCell<Wire>>,
}

impl Pins for SimPins {
	fn set_mode(&mut self, line: Line, mode: Mode) {
		let mut wire = self.wire.borrow_mut();
		wire.modes[line.index()] = mode;
		wire.settle();
	}

	fn write(&mut self, line: Line, high: bool) {
		let mut wire = self.wire.borrow_mut();
		wire.latches[line.index()] = high;
		wire.settle();
	}

	fn read(&mut self, line: Line) -> bool {
		self.wire.borrow().level(line)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn idle_lines_pulled_up() {
		let sim = SimBus::new();
		let mut pins = sim.pins();
		assert!(pins.read(Line::Clock));
		assert!(pins.read(Line::Data));
	}

	#[test]
	fn latch_only_visible_as_output() {
		let sim = SimBus::new();
		let mut pins = sim.pins();
		pins.write(Line::Data, false);
		assert!(pins.read(Line::Data));
		pins.set_mode(Line::Data, Mode::Output);
		assert!(!pins.read(Line::Data));
		assert_eq!(sim.transitions(), vec![Transition { at: 0, line: Line::Data, level: false }]);
	}

	#[test]
	fn device_registers_accessible() {
		let sim = SimBus::new();
		sim.attach(SimDevice::new(0x21));
		assert!(sim.set_register(0x21, 0x0a, 0x76));
		assert!(!sim.set_register(0x22, 0x0a, 0x76));
		assert_eq!(sim.register(0x21, 0x0a), Some(0x76));
		assert_eq!(sim.register(0x22, 0x0a), None);
	}

	#[test]
	fn clear_trace_forgets_history() {
		let sim = SimBus::new();
		let mut pins = sim.pins();
		pins.set_mode(Line::Clock, Mode::Output);
		pins.write(Line::Clock, false);
		sim.clear_trace();
		assert!(sim.transitions().is_empty());
		assert!(!sim.level(Line::Clock));
	}

	#[test]
	fn master_start_and_stop_decoded() {
		let sim = SimBus::new();
		let mut pins = sim.pins();
		pins.set_mode(Line::Data, Mode::Output);
		pins.set_mode(Line::Clock, Mode::Output);
		pins.write(Line::Data, false);
		pins.write(Line::Data, true);
		assert_eq!(sim.conditions(), vec![Condition::Start, Condition::Stop]);
	}
}
