use super::{
	Edge,
	Levels,
};

/// When a [`SimDevice`] drives the acknowledge bit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AckTiming {
	/// from the falling edge after the eighth bit until the falling edge
	/// after the ninth
	Normal,
	/// released again on the rising edge of the ninth clock
	Brief,
	/// only pulled low on the rising edge of the ninth clock
	Late,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Phase {
	Idle,
	Receive,
	Acknowledge { transmit: bool },
	Transmit,
	MasterAck { acked: bool },
}

/// Register-mapped slave with 8-bit register addresses.
///
/// Writing a single byte after the address sets the register pointer, more
/// bytes get stored starting at the pointer. Reads return the register at
/// the pointer; the pointer advances after each stored byte and each read
/// byte the master acknowledges.
#[derive(Clone, Debug)]
pub struct SimDevice {
	address: u8,
	registers: [u8; 256],
	pointer: u8,
	phase: Phase,
	shift: u8,
	bits: u8,
	// byte within the current transaction, 0 is the address
	index: usize,
	pull_low: bool,
	ack_timing: AckTiming,
	refuse_byte: Option<usize>,
	refuse_transactions: usize,
	readable: bool,
}

impl SimDevice {
	pub fn new(address: u8) -> Self {
		SimDevice {
			address,
			registers: [0; 256],
			pointer: 0,
			phase: Phase::Idle,
			shift: 0,
			bits: 0,
			index: 0,
			pull_low: false,
			ack_timing: AckTiming::Normal,
			refuse_byte: None,
			refuse_transactions: 0,
			readable: true,
		}
	}

	pub fn with_register(mut self, register: u8, value: u8) -> Self {
		self.registers[register as usize] = value;
		self
	}

	pub fn with_ack_timing(mut self, timing: AckTiming) -> Self {
		self.ack_timing = timing;
		self
	}

	/// Don't acknowledge the byte at `index` of any transaction (0 is the
	/// address byte).
	pub fn refuse_byte(mut self, index: usize) -> Self {
		self.refuse_byte = Some(index);
		self
	}

	/// Ignore the next `count` transactions addressed to this device.
	pub fn refuse_transactions(mut self, count: usize) -> Self {
		self.refuse_transactions = count;
		self
	}

	/// Don't acknowledge the address byte of read transactions, like
	/// devices with write-only registers.
	pub fn write_only(mut self) -> Self {
		self.readable = false;
		self
	}

	pub fn address(&self) -> u8 {
		self.address
	}

	pub fn register(&self, register: u8) -> u8 {
		self.registers[register as usize]
	}

	pub fn set_register(&mut self, register: u8, value: u8) {
		self.registers[register as usize] = value;
	}

	pub fn pulls_data_low(&self) -> bool {
		self.pull_low
	}

	pub fn observe(&mut self, edge: Edge, levels: Levels) {
		match edge {
			Edge::Start => {
				self.pull_low = false;
				self.phase = Phase::Receive;
				self.shift = 0;
				self.bits = 0;
				self.index = 0;
			},
			Edge::Stop => {
				self.pull_low = false;
				self.phase = Phase::Idle;
			},
			Edge::ClockRise => self.clock_rise(levels.data),
			Edge::ClockFall => self.clock_fall(),
			Edge::DataChange => (),
		}
	}

	fn clock_rise(&mut self, data: bool) {
		match self.phase {
			Phase::Receive if self.bits < 8 => {
				self.shift = (self.shift << 1) | data as u8;
				self.bits += 1;
			},
			Phase::Acknowledge { .. } => match self.ack_timing {
				AckTiming::Normal => (),
				AckTiming::Brief => self.pull_low = false,
				AckTiming::Late => self.pull_low = true,
			},
			Phase::MasterAck { .. } => {
				self.phase = Phase::MasterAck { acked: !data };
			},
			_ => (),
		}
	}

	fn clock_fall(&mut self) {
		match self.phase {
			Phase::Receive if 8 == self.bits => self.byte_received(),
			Phase::Acknowledge { transmit } => {
				self.pull_low = false;
				if transmit {
					self.load_byte();
				} else {
					self.phase = Phase::Receive;
					self.shift = 0;
					self.bits = 0;
					self.index += 1;
				}
			},
			Phase::Transmit => {
				if self.bits < 8 {
					self.drive_next_bit();
				} else {
					// master's turn to acknowledge
					self.pull_low = false;
					self.phase = Phase::MasterAck { acked: false };
				}
			},
			Phase::MasterAck { acked } => {
				if acked {
					self.pointer = self.pointer.wrapping_add(1);
					self.load_byte();
				} else {
					self.phase = Phase::Idle;
				}
			},
			_ => (),
		}
	}

	fn byte_received(&mut self) {
		let byte = self.shift;
		if 0 == self.index {
			if byte >> 1 != self.address {
				self.phase = Phase::Idle;
				return;
			}
			if 0 != byte & 1 && !self.readable {
				self.phase = Phase::Idle;
				return;
			}
			if self.refuse_transactions > 0 {
				self.refuse_transactions -= 1;
				self.phase = Phase::Idle;
				return;
			}
		}
		if Some(self.index) == self.refuse_byte {
			self.phase = Phase::Idle;
			return;
		}

		let transmit = 0 == self.index && 0 != byte & 1;
		if 1 == self.index {
			self.pointer = byte;
		} else if self.index >= 2 {
			self.registers[self.pointer as usize] = byte;
			self.pointer = self.pointer.wrapping_add(1);
		}
		self.phase = Phase::Acknowledge { transmit };
		self.pull_low = AckTiming::Late != self.ack_timing;
	}

	fn load_byte(&mut self) {
		self.shift = self.registers[self.pointer as usize];
		self.bits = 0;
		self.phase = Phase::Transmit;
		self.drive_next_bit();
	}

	fn drive_next_bit(&mut self) {
		self.pull_low = 0 == self.shift & 0x80;
		self.shift <<= 1;
		self.bits += 1;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const LOW: Levels = Levels { clock: false, data: false };

	fn clock(device: &mut SimDevice, data: bool) {
		device.observe(Edge::ClockRise, Levels { clock: true, data });
		device.observe(Edge::ClockFall, LOW);
	}

	fn send(device: &mut SimDevice, byte: u8) -> bool {
		for bit in (0..8).rev() {
			clock(device, 0 != byte & (1 << bit));
		}
		let acked = device.pulls_data_low();
		clock(device, !acked);
		acked
	}

	#[test]
	fn stores_written_bytes() {
		let mut device = SimDevice::new(0x21);
		device.observe(Edge::Start, Levels { clock: true, data: false });
		device.observe(Edge::ClockFall, LOW);
		assert!(send(&mut device, 0x42));
		assert!(send(&mut device, 0x10));
		assert!(send(&mut device, 0xaa));
		assert!(send(&mut device, 0xbb));
		assert_eq!(device.register(0x10), 0xaa);
		assert_eq!(device.register(0x11), 0xbb);
	}

	#[test]
	fn ignores_other_address() {
		let mut device = SimDevice::new(0x21);
		device.observe(Edge::Start, Levels { clock: true, data: false });
		device.observe(Edge::ClockFall, LOW);
		assert!(!send(&mut device, 0x44));
		assert!(!send(&mut device, 0x42));
	}

	#[test]
	fn refuses_selected_byte() {
		let mut device = SimDevice::new(0x21).refuse_byte(1);
		device.observe(Edge::Start, Levels { clock: true, data: false });
		device.observe(Edge::ClockFall, LOW);
		assert!(send(&mut device, 0x42));
		assert!(!send(&mut device, 0x10));
	}
}
