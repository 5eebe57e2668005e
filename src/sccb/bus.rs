use super::{
	CycleCounter,
	CycleTimer,
	Line,
	LineDriver,
	Pins,
};
use crate::SccbError;

/// Target bus clock in Hz.
pub const BUS_FREQUENCY: u32 = 100_000;

pub(super) const WRITE_BIT: u8 = 0;
pub(super) const READ_BIT: u8 = 1;

/// Address byte for a 7-bit slave address and direction bit.
pub(super) fn address_byte(slave: u8, direction: u8) -> Result<u8, SccbError> {
	if slave > 0x7f {
		return Err(SccbError::InvalidAddress { address: slave });
	}
	Ok((slave << 1) | direction)
}

/// Handle for one bit-banged bus.
///
/// The half-period is derived from the counter frequency once on
/// construction and never changes afterwards.
#[derive(Debug)]
pub struct Bus<P, C> {
	pub(super) driver: LineDriver<P, C>,
	pub(super) half_period: u32,
	initialized: bool,
}

impl<P: Pins, C: CycleCounter> Bus<P, C> {
	pub fn new(pins: P, counter: C) -> Result<Self, SccbError> {
		let frequency = counter.frequency();
		let half_period = frequency / BUS_FREQUENCY / 2;
		if 0 == half_period {
			return Err(SccbError::ClockTooSlow { frequency });
		}

		Ok(Bus {
			driver: LineDriver::new(pins, CycleTimer::new(counter)),
			half_period,
			initialized: false,
		})
	}

	/// half a bus clock period, in counter cycles
	pub fn half_period(&self) -> u32 {
		self.half_period
	}

	pub fn driver(&self) -> &LineDriver<P, C> {
		&self.driver
	}

	/// Start the cycle counter and configure both lines as outputs.
	///
	/// Fails with `TimerNotRunning` if the counter doesn't count; the bus
	/// stays unusable then.
	pub fn init(&mut self) -> Result<(), SccbError> {
		if self.initialized {
			warn!("bus already initialized");
		}
		self.driver.timer_mut().enable()?;
		self.driver.as_output(Line::Data);
		self.driver.as_output(Line::Clock);
		self.initialized = true;
		debug!("bus initialized: half period {} cycles", self.half_period);
		Ok(())
	}

	pub(super) fn ensure_initialized(&self) -> Result<(), SccbError> {
		if !self.initialized {
			return Err(SccbError::NotInitialized);
		}
		Ok(())
	}

	/// Check whether a device acknowledges `slave`.
	pub fn probe(&mut self, slave: u8) -> Result<bool, SccbError> {
		let address = address_byte(slave, WRITE_BIT)?;
		let mut tx = self.start_transaction()?;
		match tx.send_bytes(&[address]) {
			Ok(()) => Ok(true),
			Err(SccbError::NoAcknowledge { .. }) => Ok(false),
			Err(e) => Err(e),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sccb::Mode;
	use crate::sim::{
		SimBus,
		SimCounter,
		SimDevice,
	};

	#[test]
	fn half_period_from_frequency() {
		let sim = SimBus::new();
		let bus = Bus::new(sim.pins(), sim.counter(168_000_000)).unwrap();
		assert_eq!(bus.half_period(), 840);
	}

	#[test]
	fn slow_clock_rejected() {
		let sim = SimBus::new();
		match Bus::new(sim.pins(), sim.counter(199_999)) {
			Err(e) => assert_eq!(e, SccbError::ClockTooSlow { frequency: 199_999 }),
			Ok(_) => panic!("accepted clock too slow"),
		}
	}

	#[test]
	fn address_byte_boundaries() {
		assert_eq!(address_byte(0x7f, WRITE_BIT), Ok(0xfe));
		assert_eq!(address_byte(0x7f, READ_BIT), Ok(0xff));
		assert_eq!(address_byte(0x00, READ_BIT), Ok(0x01));
		assert_eq!(address_byte(0x80, WRITE_BIT), Err(SccbError::InvalidAddress { address: 0x80 }));
	}

	#[test]
	fn init_fails_on_stalled_counter() {
		let sim = SimBus::new();
		let counter: SimCounter = sim.counter(1_600_000).stalled();
		let mut bus = Bus::new(sim.pins(), counter).unwrap();
		assert_eq!(bus.init(), Err(SccbError::TimerNotRunning));
		assert_eq!(bus.probe(0x21), Err(SccbError::NotInitialized));
		assert!(sim.transitions().is_empty());
	}

	#[test]
	fn probe_finds_device() {
		let sim = SimBus::new();
		sim.attach(SimDevice::new(0x21));
		let mut bus = Bus::new(sim.pins(), sim.counter(1_600_000)).unwrap();
		bus.init().unwrap();
		assert_eq!(bus.probe(0x21), Ok(true));
		assert_eq!(bus.probe(0x30), Ok(false));
		// stop after the missing acknowledge drives data again
		assert_eq!(bus.driver().mode(Line::Data), Mode::Output);
		assert_eq!(bus.probe(0x21), Ok(true));
	}
}
