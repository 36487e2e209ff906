use std::{error::Error, sync::mpsc};

use clap::Parser;

use asicd::{AttrRegistry, ServerHandle, SoftSwitch, ValueKind};

// Object types served by the bundled soft switch.
const PORT: u32 = 1;
const VLAN: u32 = 2;
const ROUTE: u32 = 3;

#[derive(Debug, Parser)]
struct Cli {
    /// Listen for connections on this port
    port: u16,
}

/// Attribute table for the soft switch: a representative slice of the
/// kinds a forwarding device exposes.
fn registry() -> AttrRegistry {
    let mut registry = AttrRegistry::new();
    registry
        .register(PORT, 1, ValueKind::Bool) // admin state
        .register(PORT, 2, ValueKind::U32) // speed
        .register(PORT, 3, ValueKind::U32List) // hardware lanes
        .register(PORT, 4, ValueKind::Mac) // source MAC
        .register(PORT, 5, ValueKind::CharData) // interface name
        .register(VLAN, 1, ValueKind::U16) // vlan id
        .register(VLAN, 2, ValueKind::ObjectList) // member ports
        .register(ROUTE, 1, ValueKind::IpPrefix) // destination
        .register(ROUTE, 2, ValueKind::ObjectId); // next hop
    registry
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let cli = Cli::parse();
    let handle = ServerHandle::start(cli.port, registry(), SoftSwitch::new())?;
    eprintln!("serving on {}", handle.local_addr());

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })?;
    rx.recv()?;

    handle.stop()?;
    Ok(())
}
