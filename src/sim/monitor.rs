use super::{
	Edge,
	Levels,
};

/// Bus event as seen by a logic analyzer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Condition {
	Start,
	Stop,
	/// eight bits clocked after a start or an acknowledge bit, any direction
	Byte(u8),
	/// ninth clock with data low
	Ack,
	/// ninth clock with data high
	Nack,
}

/// Passive decoder; samples data on rising clock edges.
#[derive(Clone, Debug, Default)]
pub struct Monitor {
	active: bool,
	bits: u8,
	shift: u8,
	log: Vec<Condition>,
}

impl Monitor {
	pub fn observe(&mut self, edge: Edge, levels: Levels) {
		match edge {
			Edge::Start => {
				self.log.push(Condition::Start);
				self.active = true;
				self.bits = 0;
				self.shift = 0;
			},
			Edge::Stop => {
				self.log.push(Condition::Stop);
				self.active = false;
			},
			Edge::ClockRise if self.active => {
				if self.bits < 8 {
					self.shift = (self.shift << 1) | levels.data as u8;
					self.bits += 1;
					if 8 == self.bits {
						self.log.push(Condition::Byte(self.shift));
					}
				} else {
					self.log.push(if levels.data { Condition::Nack } else { Condition::Ack });
					self.bits = 0;
					self.shift = 0;
				}
			},
			_ => (),
		}
	}

	pub fn conditions(&self) -> &[Condition] {
		&self.log
	}

	pub fn clear(&mut self) {
		self.log.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn clock_bit(monitor: &mut Monitor, data: bool) {
		monitor.observe(Edge::ClockRise, Levels { clock: true, data });
		monitor.observe(Edge::ClockFall, Levels { clock: false, data });
	}

	#[test]
	fn decodes_byte_and_ack() {
		let mut monitor = Monitor::default();
		monitor.observe(Edge::Start, Levels { clock: true, data: false });
		for &bit in &[true, false, true, false, false, true, false, true] {
			clock_bit(&mut monitor, bit);
		}
		clock_bit(&mut monitor, false);
		// partial byte before the stop is dropped
		clock_bit(&mut monitor, false);
		monitor.observe(Edge::Stop, Levels { clock: true, data: true });
		assert_eq!(monitor.conditions(), &[
			Condition::Start,
			Condition::Byte(0xa5),
			Condition::Ack,
			Condition::Stop,
		][..]);
	}

	#[test]
	fn ignores_clock_outside_transaction() {
		let mut monitor = Monitor::default();
		clock_bit(&mut monitor, true);
		assert!(monitor.conditions().is_empty());
	}
}
