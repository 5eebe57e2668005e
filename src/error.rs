use failure::Fail;

/// Errors reported by the bus.
///
/// Only `NoAcknowledge` is expected during normal operation; the caller may
/// repeat the whole transaction. All other kinds are configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Fail)]
pub enum SccbError {
	/// The addressed slave didn't pull the data line low for the byte at
	/// `index` (counted from the address byte of the transaction).
	///
	/// An absent device and a refusing device look the same.
	#[fail(display = "no acknowledge for byte {} of transaction", index)]
	NoAcknowledge {
		index: usize,
	},

	/// The cycle counter didn't start counting after it was enabled; any
	/// delay would spin forever.
	#[fail(display = "cycle counter not running after enable")]
	TimerNotRunning,

	/// The counter frequency is too low to time a bus half-period.
	#[fail(display = "counter frequency {} Hz too low for bus timing", frequency)]
	ClockTooSlow {
		frequency: u32,
	},

	/// Slave addresses have 7 bits.
	#[fail(display = "invalid slave address 0x{:02x} (needs to fit 7 bits)", address)]
	InvalidAddress {
		address: u8,
	},

	#[fail(display = "bus used before init")]
	NotInitialized,
}

impl SccbError {
	pub fn is_no_acknowledge(&self) -> bool {
		match self {
			SccbError::NoAcknowledge { .. } => true,
			_ => false,
		}
	}
}
