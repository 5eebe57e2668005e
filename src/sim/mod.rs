//! Software model of an open-drain two-wire bus.
//!
//! [`SimBus`] hands out [`SimPins`] and a [`SimCounter`] sharing one notion
//! of time, so a [`Bus`](crate::sccb::Bus) can run against simulated
//! [`SimDevice`]s without hardware. Every change of a line level is
//! recorded as a [`Transition`], and a passive [`Monitor`] decodes them into
//! [`Condition`]s.

mod clock;
mod device;
mod monitor;
mod wire;

pub use self::clock::SimCounter;

pub use self::device::{
	AckTiming,
	SimDevice,
};

pub use self::monitor::{
	Condition,
	Monitor,
};

pub use self::wire::{
	SimBus,
	SimPins,
	Transition,
};

/// Levels of both lines after pull-ups and all drivers are considered.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Levels {
	pub clock: bool,
	pub data: bool,
}

/// What a level change means on the bus.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Edge {
	Start,
	Stop,
	ClockRise,
	ClockFall,
	/// data change that isn't a start or stop condition
	DataChange,
}

impl Edge {
	/// Only the master frames transactions; a slave changing data while
	/// the clock is high is just noise.
	pub(crate) fn classify(prev: Levels, now: Levels, from_master: bool) -> Edge {
		if prev.clock != now.clock {
			if now.clock { Edge::ClockRise } else { Edge::ClockFall }
		} else if now.clock && from_master {
			if now.data { Edge::Stop } else { Edge::Start }
		} else {
			Edge::DataChange
		}
	}
}
