//! Minimal ET-Bus switch device.
//!
//! Runs a virtual on/off switch on the local network: announces itself,
//! learns the hub address, answers `command` envelopes and reports its
//! state back.
//!
//! Run with: cargo run --example switch_device -- --id plug-01 --name "Desk Plug"

use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use etbus_rs::{DeviceIdentity, EtBus, StaticSignal, SystemClock, UdpTransport};

#[derive(Parser)]
#[command(name = "switch-device")]
#[command(about = "Run a virtual ET-Bus switch", long_about = None)]
struct Cli {
    /// Device id, unique on the bus
    #[arg(long, default_value = "switch-demo")]
    id: String,

    /// Human-friendly name shown by the hub
    #[arg(long, default_value = "Demo Switch")]
    name: String,

    /// Firmware version to report
    #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
    fw: String,

    /// Reported signal strength in dBm
    #[arg(long, default_value = "-60", allow_hyphen_values = true)]
    rssi: i32,
}

fn main() -> Result<(), etbus_rs::TransportError> {
    env_logger::init();
    let cli = Cli::parse();

    let identity = DeviceIdentity::new(&cli.id, "switch", &cli.name, &cli.fw);
    let mut bus = EtBus::new(
        identity,
        UdpTransport::new()?,
        SystemClock::new(),
        StaticSignal::new(cli.rssi),
    );

    // The hub drives the switch; we mirror every accepted command.
    let on = Rc::new(Cell::new(false));
    let switch = Rc::clone(&on);
    bus.on_command(move |class, payload| {
        if class != "switch" {
            return;
        }
        if let Some(state) = payload.get("on").and_then(|v| v.as_bool()) {
            switch.set(state);
            println!("switch -> {}", if state { "on" } else { "off" });
        }
    });

    bus.start()?;
    bus.send_switch_state(on.get())?;

    let mut reported = on.get();
    loop {
        bus.poll();
        if on.get() != reported {
            reported = on.get();
            if let Err(err) = bus.send_switch_state(reported) {
                log::debug!("state report failed: {err}");
            }
        }
        thread::sleep(Duration::from_millis(10));
    }
}
