#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate sccb_bitbang;
use sccb_bitbang::*;

use std::process::exit;
use std::str::FromStr;

use sccb_bitbang::gpiomem::{
	DEFAULT_DEVICE,
	GpioMem,
	MonotonicCounter,
};
use sccb_bitbang::sccb::{
	Bus,
	CycleCounter,
	Pins,
	RegisterAccess,
};
use sccb_bitbang::sim::{
	SimBus,
	SimDevice,
};

// address and identification registers of an OV7670 camera
const SIMULATED_SLAVE: u8 = 0x21;
const SIMULATED_REGISTERS: [(u8, u8); 4] = [
	(0x0a, 0x76), // PID
	(0x0b, 0x73), // VER
	(0x1c, 0x7f), // MIDH
	(0x1d, 0xa2), // MIDL
];

// the simulated counter only advances when read; keep half-periods short
const SIMULATED_FREQUENCY: u32 = 16_000_000;

// 7-bit addresses outside the reserved ranges
const SCAN_FIRST: u8 = 0x08;
const SCAN_LAST: u8 = 0x77;

/// Number with optional `0x` prefix for hex.
struct Number<T>(T);

impl FromStr for Number<u8> {
	type Err = std::num::ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.starts_with("0x") || s.starts_with("0X") {
			u8::from_str_radix(&s[2..], 16).map(Number)
		} else {
			s.parse().map(Number)
		}
	}
}

impl FromStr for Number<usize> {
	type Err = std::num::ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.parse().map(Number)
	}
}

fn get_param<T>(matches: &clap::ArgMatches, name: &str) -> AResult<T>
where
	Number<T>: FromStr,
	failure::Error: From<<Number<T> as FromStr>::Err>,
{
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	param.parse::<Number<T>>().map(|n| n.0).map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid paramater {}: {}", name, e);
		e.context(msg).into()
	})
}

fn get_param_or<T>(matches: &clap::ArgMatches, name: &str, default: T) -> AResult<T>
where
	Number<T>: FromStr,
	failure::Error: From<<Number<T> as FromStr>::Err>,
{
	if matches.is_present(name) {
		get_param(matches, name)
	} else {
		Ok(default)
	}
}

fn read<A: RegisterAccess>(bus: &mut A, sub_m: &clap::ArgMatches) -> AResult<()> {
	let slave: u8 = get_param(sub_m, "SLAVE")?;
	let register: u8 = get_param(sub_m, "REGISTER")?;

	let value = bus.read_register(slave, register)?;
	println!("0x{:02x}", value);

	Ok(())
}

fn write<A: RegisterAccess>(bus: &mut A, sub_m: &clap::ArgMatches) -> AResult<()> {
	let slave: u8 = get_param(sub_m, "SLAVE")?;
	let register: u8 = get_param(sub_m, "REGISTER")?;
	let value: u8 = get_param(sub_m, "VALUE")?;

	bus.write_register(slave, register, value)?;
	info!("slave 0x{:02x}: wrote 0x{:02x} to register 0x{:02x}", slave, value, register);

	Ok(())
}

fn dump<A: RegisterAccess>(bus: &mut A, sub_m: &clap::ArgMatches) -> AResult<()> {
	let slave: u8 = get_param(sub_m, "SLAVE")?;
	let from: u8 = get_param_or(sub_m, "FROM", 0x00)?;
	let to: u8 = get_param_or(sub_m, "TO", 0xff)?;
	ensure!(from <= to, "empty register range 0x{:02x}..=0x{:02x}", from, to);

	for register in from..=to {
		let i = register - from;
		if 0 == i % 16 {
			print!("{:02x}:", register);
		} else if 0 == i % 8 {
			print!(" ");
		}
		match bus.read_register(slave, register) {
			Ok(value) => print!(" {:02x}", value),
			Err(ref e) if e.is_no_acknowledge() => print!(" --"),
			Err(e) => return Err(e.into()),
		}
		if 15 == i % 16 {
			println!();
		}
	}
	if 0 != (to as usize - from as usize + 1) % 16 {
		println!();
	}

	Ok(())
}

fn scan<P: Pins, C: CycleCounter>(bus: &mut Bus<P, C>) -> AResult<()> {
	let mut found = 0;
	for slave in SCAN_FIRST..=SCAN_LAST {
		if bus.probe(slave)? {
			println!("0x{:02x}", slave);
			found += 1;
		}
	}
	info!("{} device(s) found", found);

	Ok(())
}

fn run<P: Pins, C: CycleCounter>(mut bus: Bus<P, C>, matches: &clap::ArgMatches) -> AResult<()> {
	let attempts: usize = get_param_or(matches, "retries", 1)?;
	bus.init()?;

	match matches.subcommand() {
		("read", Some(sub_m)) => {
			read(&mut bus.with_retries(attempts), sub_m)
		},
		("write", Some(sub_m)) => {
			write(&mut bus.with_retries(attempts), sub_m)
		},
		("dump", Some(sub_m)) => {
			dump(&mut bus.with_retries(attempts), sub_m)
		},
		("scan", _) => {
			scan(&mut bus)
		},
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg device: -d --device +takes_value "GPIO memory device (default /dev/gpiomem)")
		(@arg sda: --sda +takes_value "BCM GPIO number of the data line (default 2)")
		(@arg scl: --scl +takes_value "BCM GPIO number of the clock line (default 3)")
		(@arg retries: -r --retries +takes_value "attempts per transaction (default 1)")
		(@arg simulate: --simulate "use a simulated OV7670 camera at 0x21 instead of GPIO")
		(@subcommand read =>
			(about: "read a register")
			(@arg SLAVE: +required "7-bit slave address")
			(@arg REGISTER: +required "register address")
		)
		(@subcommand write =>
			(about: "write a register")
			(@arg SLAVE: +required "7-bit slave address")
			(@arg REGISTER: +required "register address")
			(@arg VALUE: +required "value to write")
		)
		(@subcommand dump =>
			(about: "read a range of registers")
			(@arg SLAVE: +required "7-bit slave address")
			(@arg FROM: "first register (default 0x00)")
			(@arg TO: "last register (default 0xff)")
		)
		(@subcommand scan =>
			(about: "list addresses of devices acknowledging their address")
		)
	).get_matches();

	if matches.is_present("simulate") {
		let sim = SimBus::new();
		let mut camera = SimDevice::new(SIMULATED_SLAVE);
		for &(register, value) in &SIMULATED_REGISTERS {
			camera = camera.with_register(register, value);
		}
		sim.attach(camera);
		let bus = Bus::new(sim.pins(), sim.counter(SIMULATED_FREQUENCY))?;
		return run(bus, &matches);
	}

	let device = matches.value_of("device").unwrap_or(DEFAULT_DEVICE);
	let sda: u8 = get_param_or(&matches, "sda", 2)?;
	let scl: u8 = get_param_or(&matches, "scl", 3)?;
	let gpio = GpioMem::open(device, sda, scl)?;
	let bus = Bus::new(gpio, MonotonicCounter::new())?;
	run(bus, &matches)
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
