//! Multi-channel SDR SDRAM Controller Library.
//!
//! This crate implements a cycle-accurate model of an SDRAM controller that
//! lets several streaming clients share one single-data-rate SDRAM device as
//! an elastic buffer. Clients see simple word FIFOs; the controller decides
//! each cycle whether words bypass the device or are staged in it.
//!
//! # Architecture
//!
//! * **Controller**: refresh scheduler, command bus arbiter, burst sequencer,
//!   channel buffers, and the top-level scheduler.
//! * **Pins**: command encoding onto the physical control pins.
//! * **Device**: a behavioral SDRAM model that checks every command it sees.
//!
//! # Modules
//!
//! * `common`: Shared types, address arithmetic, and error handling.
//! * `config`: Configuration loading, parsing, and cycle conversion.
//! * `controller`: The controller state machines.
//! * `fifo`: Bounded FIFOs and client ports.
//! * `pins`: Commands and their pin encoding.
//! * `sim`: Client workloads.
//! * `soc`: Device model and system harness.
//! * `stats`: Statistics collection.

/// Shared types, address arithmetic, and error handling.
///
/// Provides the word and address types used throughout the controller and
/// the error types raised by configuration and by the device model.
pub mod common;

/// Configuration system for geometry, timing, burst, and channel settings.
///
/// Loads and parses TOML configuration files and converts datasheet
/// durations into whole clock cycles.
pub mod config;

/// SDRAM controller core.
///
/// Implements the refresh scheduler, command bus arbiter, burst sequencer,
/// channel buffer manager, and top-level scheduler, composed per cycle by
/// `Controller::tick`.
pub mod controller;

/// Bounded FIFOs and the client-facing channel ports.
pub mod fifo;

/// Command set and the pin-level codec.
pub mod pins;

/// Client workloads that stream data through the controller.
pub mod sim;

/// Behavioral SDRAM device model and the system harness around it.
pub mod soc;

/// Statistics collection and reporting.
pub mod stats;
