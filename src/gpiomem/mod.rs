//! Pins on the GPIO block of BCM283x/BCM2711 SoCs (Raspberry Pi), mapped
//! through `/dev/gpiomem`.
//!
//! The GPIO block has no open-drain mode; it is emulated by switching a
//! pin to output (driving low) for a low level and to input (floating) for
//! a high level. The bus lines need external pull-ups, internal pulls are
//! left alone.

mod counter;
mod mapped;

pub use self::counter::MonotonicCounter;

use self::mapped::{
	Mapped,
	open_mapped,
};
use crate::sccb::{
	Line,
	Mode,
	Pins,
};

pub const DEFAULT_DEVICE: &str = "/dev/gpiomem";

#[allow(dead_code)]
mod consts {
	pub const BLOCK_SIZE: usize = 0x1000;
	pub const PIN_COUNT: u8 = 54;

	// register offsets
	pub const GPFSEL0: usize = 0x00; // function select, 10 pins per register
	pub const GPSET0: usize = 0x1c; // output set
	pub const GPCLR0: usize = 0x28; // output clear
	pub const GPLEV0: usize = 0x34; // pin level

	pub const FSEL_MASK: u32 = 0b111;
	pub const FSEL_INPUT: u32 = 0b000;
	pub const FSEL_OUTPUT: u32 = 0b001;
}

use self::consts::*;

/// Two GPIO pins used as clock and data line.
#[derive(Debug)]
pub struct GpioMem {
	map: Mapped,
	// BCM pin numbers, indexed by `Line::index`
	pins: [u8; 2],
	latches: [bool; 2],
	modes: [Mode; 2],
}

impl GpioMem {
	pub fn open(path: &str, data_pin: u8, clock_pin: u8) -> crate::AResult<Self> {
		ensure!(data_pin < PIN_COUNT, "invalid data pin {} (only {} GPIOs)", data_pin, PIN_COUNT);
		ensure!(clock_pin < PIN_COUNT, "invalid clock pin {} (only {} GPIOs)", clock_pin, PIN_COUNT);
		ensure!(data_pin != clock_pin, "data and clock need separate pins (both {})", data_pin);

		let map = with_context!(("couldn't map {}", path), {
			Ok(open_mapped(path, BLOCK_SIZE)?)
		})?;
		debug!("mapped GPIO block from {}: data pin {}, clock pin {}", path, data_pin, clock_pin);

		let mut gpio = GpioMem {
			map,
			pins: [0; 2],
			latches: [true; 2],
			modes: [Mode::Input; 2],
		};
		gpio.pins[Line::Data.index()] = data_pin;
		gpio.pins[Line::Clock.index()] = clock_pin;
		// released until configured
		gpio.select(data_pin, FSEL_INPUT);
		gpio.select(clock_pin, FSEL_INPUT);
		Ok(gpio)
	}

	fn pin(&self, line: Line) -> u8 {
		self.pins[line.index()]
	}

	fn select(&mut self, pin: u8, function: u32) {
		let offset = GPFSEL0 + 4 * (pin as usize / 10);
		let shift = 3 * (pin as u32 % 10);
		let value = self.map.read_dword(offset);
		self.map.write_dword(offset, (value & !(FSEL_MASK << shift)) | (function << shift));
	}

	fn bank(pin: u8) -> (usize, u32) {
		(4 * (pin as usize / 32), 1u32 << (pin % 32))
	}

	// a low latch in output mode is the only state that drives the pin
	fn apply(&mut self, line: Line) {
		let pin = self.pin(line);
		if Mode::Output == self.modes[line.index()] && !self.latches[line.index()] {
			let (bank, bit) = Self::bank(pin);
			self.map.write_dword(GPCLR0 + bank, bit);
			self.select(pin, FSEL_OUTPUT);
		} else {
			self.select(pin, FSEL_INPUT);
		}
	}
}

impl Pins for GpioMem {
	fn set_mode(&mut self, line: Line, mode: Mode) {
		self.modes[line.index()] = mode;
		self.apply(line);
	}

	fn write(&mut self, line: Line, high: bool) {
		if self.latches[line.index()] == high {
			return;
		}
		self.latches[line.index()] = high;
		if Mode::Output == self.modes[line.index()] {
			self.apply(line);
		}
	}

	fn read(&mut self, line: Line) -> bool {
		let (bank, bit) = Self::bank(self.pin(line));
		0 != self.map.read_dword(GPLEV0 + bank) & bit
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bank_and_bit() {
		assert_eq!(GpioMem::bank(2), (0, 1 << 2));
		assert_eq!(GpioMem::bank(31), (0, 1 << 31));
		assert_eq!(GpioMem::bank(32), (4, 1));
	}

	#[test]
	fn rejects_invalid_pins() {
		assert!(GpioMem::open(DEFAULT_DEVICE, 54, 3).is_err());
		assert!(GpioMem::open(DEFAULT_DEVICE, 3, 3).is_err());
	}
}
