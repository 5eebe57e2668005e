use std::ops::{
	Deref,
	DerefMut,
};

use super::{
	Bus,
	CycleCounter,
	Line,
	Pins,
};
use crate::SccbError;

/// An open transaction: started with a start condition, the stop condition
/// is sent when it gets dropped, whether the transfer succeeded or not.
pub struct Transaction<'a, P: Pins + 'a, C: CycleCounter + 'a>(&'a mut Bus<P, C>);

impl<'a, P: Pins, C: CycleCounter> Transaction<'a, P, C> {
	/// Send bytes MSB first, each one needs to be acknowledged.
	///
	/// Stops at the first byte without acknowledge.
	pub fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), SccbError> {
		for (index, &byte) in bytes.iter().enumerate() {
			for bit in (0..8).rev() {
				self.0.send_bit(0 != byte & (1 << bit));
				self.0.clock_pulse();
			}
			if !self.0.wait_for_slave_ack() {
				return Err(SccbError::NoAcknowledge { index });
			}
			// slave releases data on this edge
			self.0.driver.set_low(Line::Clock, 0);
			if let Some(&next) = bytes.get(index + 1) {
				// stage first bit of the next byte while the clock is low
				self.0.driver.as_output(Line::Data);
				self.0.send_bit(0 != next & 0x80);
			}
		}
		Ok(())
	}

	/// Receive a single byte, MSB first. Doesn't acknowledge it; follow
	/// up with `send_nack`.
	pub fn receive_byte(&mut self) -> u8 {
		self.0.receive_byte()
	}

	pub fn send_nack(&mut self) {
		self.0.send_nack()
	}
}

impl<'a, P: Pins, C: CycleCounter> Drop for Transaction<'a, P, C> {
	fn drop(&mut self) {
		self.0.send_stop();
	}
}

impl<'a, P: Pins, C: CycleCounter> Deref for Transaction<'a, P, C> {
	type Target = Bus<P, C>;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl<'a, P: Pins, C: CycleCounter> DerefMut for Transaction<'a, P, C> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.0
	}
}

impl<P: Pins, C: CycleCounter> Bus<P, C> {
	/// Send a start condition; the returned transaction sends the stop
	/// condition when dropped.
	pub fn start_transaction(&mut self) -> Result<Transaction<P, C>, SccbError> {
		self.ensure_initialized()?;
		self.send_start();
		Ok(Transaction(self))
	}

	// data falls while clock is high
	fn send_start(&mut self) {
		let half = self.half_period;
		let d = &mut self.driver;
		d.ensure_output(Line::Data);
		d.set_high(Line::Data, 0);
		d.set_high(Line::Clock, 0);
		d.set_low(Line::Data, half);
		d.set_low(Line::Clock, 0);
	}

	// data rises while clock is high
	fn send_stop(&mut self) {
		let half = self.half_period;
		let d = &mut self.driver;
		// clock is still high after a missing acknowledge; pulling data
		// down then would look like a start condition
		d.set_low(Line::Clock, 0);
		d.ensure_output(Line::Data);
		d.set_low(Line::Data, 0);
		d.set_low(Line::Clock, half);
		d.set_high(Line::Clock, half);
		d.set_high(Line::Data, 2 * half);
	}

	// data may only change while clock is low
	fn send_bit(&mut self, bit: bool) {
		if bit {
			self.driver.set_high(Line::Data, 0);
		} else {
			self.driver.set_low(Line::Data, 0);
		}
	}

	fn clock_pulse(&mut self) {
		let half = self.half_period;
		self.driver.set_low(Line::Clock, half);
		self.driver.set_high(Line::Clock, half);
		self.driver.set_low(Line::Clock, 0);
	}

	/// Ninth clock after a byte; leaves the clock high.
	///
	/// Some slaves only pull data low briefly, so it counts as acknowledged
	/// if either the sample before or after the rising edge is low.
	fn wait_for_slave_ack(&mut self) -> bool {
		let half = self.half_period;
		let d = &mut self.driver;
		d.as_input(Line::Data);
		d.set_low(Line::Clock, half);
		let before_edge = !d.read(Line::Data);
		d.set_high(Line::Clock, half);
		let after_edge = !d.read(Line::Data);
		before_edge || after_edge
	}

	// the slave shifts out a bit on each falling clock edge (the first
	// one right after the acknowledge of the address byte); sample it half
	// a period later, still before the rising edge.
	fn receive_byte(&mut self) -> u8 {
		let half = self.half_period;
		let d = &mut self.driver;
		d.as_input(Line::Data);
		let mut value = 0u8;
		for _ in 0..8 {
			d.set_low(Line::Clock, half);
			value <<= 1;
			if d.read(Line::Data) {
				value |= 1;
			}
			d.set_high(Line::Clock, half);
		}
		d.set_low(Line::Clock, 0);
		value
	}

	// data stays high during the ninth clock
	fn send_nack(&mut self) {
		let half = self.half_period;
		let d = &mut self.driver;
		d.ensure_output(Line::Data);
		d.set_high(Line::Data, 0);
		d.set_low(Line::Clock, half);
		d.set_high(Line::Clock, half);
		d.set_low(Line::Clock, 0);
		d.set_low(Line::Data, half);
	}
}
