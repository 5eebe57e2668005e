use super::{
	Bus,
	CycleCounter,
	Pins,
	bus::{
		READ_BIT,
		WRITE_BIT,
		address_byte,
	},
};
use crate::SccbError;

/// Register level access to devices on the bus.
///
/// Every operation is a complete transaction; after a failure it can be
/// repeated from scratch.
pub trait RegisterAccess {
	/// Write `value` to `register`: start, address byte (write), register,
	/// value, stop. All three bytes need to be acknowledged.
	fn write_register(&mut self, slave: u8, register: u8, value: u8) -> Result<(), SccbError>;

	/// Select `register` in a first transaction, read it in a second one.
	fn read_register(&mut self, slave: u8, register: u8) -> Result<u8, SccbError>;

	/// Write a table of `(register, value)` pairs in order; stops at the
	/// first failure.
	fn write_registers(&mut self, slave: u8, table: &[(u8, u8)]) -> Result<(), SccbError> {
		for &(register, value) in table {
			self.write_register(slave, register, value)?;
		}
		Ok(())
	}

	/// Replace the bits in `mask` with those from `bits`; returns the new
	/// register value. Doesn't write if nothing changes.
	fn update_register(&mut self, slave: u8, register: u8, mask: u8, bits: u8) -> Result<u8, SccbError> {
		let old = self.read_register(slave, register)?;
		let new = (old & !mask) | (bits & mask);
		if new != old {
			self.write_register(slave, register, new)?;
		}
		Ok(new)
	}

	/// Repeat transactions up to `attempts` times while they are not
	/// acknowledged.
	fn with_retries(&mut self, attempts: usize) -> Retrying<Self> {
		Retrying {
			inner: self,
			attempts: attempts.max(1),
		}
	}
}

impl<P: Pins, C: CycleCounter> RegisterAccess for Bus<P, C> {
	fn write_register(&mut self, slave: u8, register: u8, value: u8) -> Result<(), SccbError> {
		let address = address_byte(slave, WRITE_BIT)?;
		trace!("slave 0x{:02x}: write 0x{:02x} to 0x{:02x}", slave, value, register);
		let mut tx = self.start_transaction()?;
		tx.send_bytes(&[address, register, value])
	}

	fn read_register(&mut self, slave: u8, register: u8) -> Result<u8, SccbError> {
		let address = address_byte(slave, WRITE_BIT)?;
		trace!("slave 0x{:02x}: read 0x{:02x}", slave, register);
		{
			let mut tx = self.start_transaction()?;
			tx.send_bytes(&[address, register])?;
		}

		let mut tx = self.start_transaction()?;
		tx.send_bytes(&[address | READ_BIT])?;
		let value = tx.receive_byte();
		tx.send_nack();
		Ok(value)
	}
}

/// See [`RegisterAccess::with_retries`].
pub struct Retrying<'a, A: ?Sized + RegisterAccess + 'a> {
	inner: &'a mut A,
	attempts: usize,
}

impl<'a, A: ?Sized + RegisterAccess> Retrying<'a, A> {
	fn retry<T, F>(&mut self, what: &str, mut f: F) -> Result<T, SccbError>
	where
		F: FnMut(&mut A) -> Result<T, SccbError>,
	{
		let mut attempt = 1;
		loop {
			match f(&mut *self.inner) {
				Err(e) if e.is_no_acknowledge() && attempt < self.attempts => {
					warn!("{} failed (attempt {}/{}): {}", what, attempt, self.attempts, e);
					attempt += 1;
				},
				result => return result,
			}
		}
	}
}

impl<'a, A: ?Sized + RegisterAccess> RegisterAccess for Retrying<'a, A> {
	fn write_register(&mut self, slave: u8, register: u8, value: u8) -> Result<(), SccbError> {
		self.retry("register write", |bus| bus.write_register(slave, register, value))
	}

	fn read_register(&mut self, slave: u8, register: u8) -> Result<u8, SccbError> {
		self.retry("register read", |bus| bus.read_register(slave, register))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sim::{
		SimBus,
		SimCounter,
		SimDevice,
		SimPins,
	};

	fn setup(sim: &SimBus) -> Bus<SimPins, SimCounter> {
		let mut bus = Bus::new(sim.pins(), sim.counter(1_600_000)).unwrap();
		bus.init().unwrap();
		bus
	}

	#[test]
	fn write_table_in_order() {
		let sim = SimBus::new();
		sim.attach(SimDevice::new(0x21));
		let mut bus = setup(&sim);
		bus.write_registers(0x21, &[(0x12, 0x80), (0x11, 0x01), (0x12, 0x04)]).unwrap();
		assert_eq!(sim.register(0x21, 0x11), Some(0x01));
		assert_eq!(sim.register(0x21, 0x12), Some(0x04));
	}

	#[test]
	fn update_only_touches_masked_bits() {
		let sim = SimBus::new();
		sim.attach(SimDevice::new(0x21).with_register(0x3a, 0b1010_0101));
		let mut bus = setup(&sim);
		assert_eq!(bus.update_register(0x21, 0x3a, 0x0f, 0x03), Ok(0b1010_0011));
		assert_eq!(sim.register(0x21, 0x3a), Some(0b1010_0011));
	}

	#[test]
	fn unchanged_update_skips_write() {
		let sim = SimBus::new();
		sim.attach(SimDevice::new(0x21).with_register(0x3a, 0x0f));
		let mut bus = setup(&sim);
		assert_eq!(bus.update_register(0x21, 0x3a, 0x0f, 0xff), Ok(0x0f));
		// only the two transactions of the read
		let starts = sim.conditions().into_iter()
			.filter(|c| *c == crate::sim::Condition::Start)
			.count();
		assert_eq!(starts, 2);
	}

	#[test]
	fn retries_until_acknowledged() {
		let sim = SimBus::new();
		sim.attach(SimDevice::new(0x21).refuse_transactions(2));
		let mut bus = setup(&sim);
		bus.with_retries(3).write_register(0x21, 0x01, 0x99).unwrap();
		assert_eq!(sim.register(0x21, 0x01), Some(0x99));
	}

	#[test]
	fn retries_give_up() {
		let sim = SimBus::new();
		sim.attach(SimDevice::new(0x21).refuse_transactions(5));
		let mut bus = setup(&sim);
		assert_eq!(
			bus.with_retries(3).write_register(0x21, 0x01, 0x99),
			Err(SccbError::NoAcknowledge { index: 0 }),
		);
		assert_eq!(sim.register(0x21, 0x01), Some(0x00));
	}

	#[test]
	fn invalid_address_not_retried() {
		let sim = SimBus::new();
		let mut bus = setup(&sim);
		assert_eq!(
			bus.with_retries(3).read_register(0x80, 0x00),
			Err(SccbError::InvalidAddress { address: 0x80 }),
		);
		assert!(sim.transitions().is_empty());
	}
}
