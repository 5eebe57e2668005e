//! Bit-banged SCCB (I²C compatible) bus master.
//!
//! Layers, bottom up:
//! - [`CycleTimer`]: busy-wait delays on a free-running cycle counter
//! - [`LineDriver`]: open-drain clock and data lines with settle delays
//! - [`Bus`] / [`Transaction`]: start/stop framing, byte transfer and
//!   acknowledge handling
//! - [`RegisterAccess`]: register read/write transactions
//!
//! The bus needs exclusive, uninterrupted access to both lines for a whole
//! transaction; share it between threads only behind a lock around
//! complete transactions.

mod bus;
mod hardware;
mod line;
mod low_level;
mod operations;
mod timer;

pub use self::bus::{
	BUS_FREQUENCY,
	Bus,
};

pub use self::hardware::{
	CycleCounter,
	Line,
	Mode,
	Pins,
};

pub use self::line::LineDriver;

pub use self::low_level::Transaction;

pub use self::operations::{
	RegisterAccess,
	Retrying,
};

pub use self::timer::CycleTimer;
