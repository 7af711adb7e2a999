//! Integration tests for the command bus arbiter.

use sdram_controller::controller::{BusOwner, CommandBusArbiter, RefreshStatus};
use sdram_controller::pins::{decode, BusCommand, Command};

fn status(initialised: bool, in_progress: bool) -> RefreshStatus {
    RefreshStatus {
        initialised,
        in_progress,
        ..RefreshStatus::default()
    }
}

/// Tests that the refresh side owns the bus after reset and during init.
#[test]
fn test_refresh_owns_bus_until_initialised() {
    let mut arbiter = CommandBusArbiter::new(false);
    assert_eq!(arbiter.owner(), BusOwner::Refresh);
    assert_eq!(arbiter.update(&status(false, false), false), BusOwner::Refresh);
    assert_eq!(arbiter.update(&status(true, false), false), BusOwner::ReadWrite);
}

/// Tests that ownership never moves to refresh while a burst is in flight.
#[test]
fn test_no_handover_mid_burst() {
    let mut arbiter = CommandBusArbiter::new(false);
    arbiter.update(&status(true, false), false);

    assert_eq!(arbiter.update(&status(true, true), true), BusOwner::ReadWrite);
    assert_eq!(arbiter.update(&status(true, true), false), BusOwner::Refresh);
    assert_eq!(arbiter.update(&status(true, true), false), BusOwner::Refresh);
    assert_eq!(arbiter.update(&status(true, false), false), BusOwner::ReadWrite);
}

/// Tests that the grant is gated on the read/write side being idle.
#[test]
fn test_grant_gating() {
    let arbiter = CommandBusArbiter::new(false);
    assert!(arbiter.grant(true, false));
    assert!(!arbiter.grant(true, true));
    assert!(!arbiter.grant(false, false));
}

/// Tests that the owner's command reaches the pins.
#[test]
fn test_drive_selects_owner() {
    let mut arbiter = CommandBusArbiter::new(false);
    let refresh = Some(BusCommand::new(Command::Refresh));
    let act = Some(BusCommand::with_payload(Command::Activate, 1, 7));

    let pins = arbiter.drive(0, refresh, None);
    assert_eq!(decode(&pins), Command::Refresh);

    arbiter.update(&status(true, false), false);
    let pins = arbiter.drive(1, None, act);
    assert_eq!(decode(&pins), Command::Activate);
    assert_eq!(pins.ba, 1);
    assert_eq!(pins.a, 7);

    let pins = arbiter.drive(2, None, None);
    assert_eq!(decode(&pins), Command::Nop);
    assert!(!pins.dq_oe);
}
