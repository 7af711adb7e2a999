//! End-to-end tests: controller wired to the behavioral SDRAM model.

use sdram_controller::common::{GlobalAddr, ProtocolViolation, Word};
use sdram_controller::config::Config;
use sdram_controller::controller::{BusOwner, Controller, SchedulerState};
use sdram_controller::pins::{decode, Command, PinState};
use sdram_controller::sim::{Pattern, RunError, Workload};
use sdram_controller::soc::{PinDevice, System};

/// A device that accepts every command and never drives the data bus.
struct SilentDevice;

impl PinDevice for SilentDevice {
    fn name(&self) -> &str {
        "silent"
    }

    fn tick(&mut self, _pins: &PinState) -> Result<Option<Word>, ProtocolViolation> {
        Ok(None)
    }
}

/// Creates a small configuration: 4 banks of 16 rows of 256 words.
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.timing.t_startup_ns = 200;
    config.geometry.row_bits = 4;
    config.geometry.col_bits = 8;
    config.channels.window_words = 256;
    config.channels.fifo_depth = 16;
    config
}

/// Shortens retention to 20 000 cycles with 100 refreshes per period.
fn with_short_retention(mut config: Config) -> Config {
    config.timing.t_refresh_period_ns = 200_000;
    config.timing.refreshes_per_period = 100;
    config
}

/// Writes as fast as the port accepts and reads every `read_every` cycles,
/// checking order. Returns the number of words read back.
fn stream(
    system: &mut System,
    cycles: u64,
    read_every: u64,
    mut check: impl FnMut(&System),
) -> u32 {
    let port = system.port(0);
    let mut written: u32 = 0;
    let mut read: u32 = 0;
    for cycle in 0..cycles {
        if port.write(written as Word) {
            written += 1;
        }
        if cycle % read_every == 0 {
            if let Some(word) = port.read() {
                assert_eq!(word, read as Word);
                read += 1;
            }
        }
        system.tick().unwrap();
        check(system);
    }
    read
}

/// Tests the canonical round trip: 160 words written, then read back.
#[test]
fn test_round_trip_160_words() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut system = System::new(&create_test_config()).unwrap();
    let port = system.port(0);

    let mut written: Word = 0;
    while written < 160 {
        if port.write(written) {
            written += 1;
        }
        system.tick().unwrap();
        assert!(system.cycle() < 10_000, "writes stalled");
    }

    let mut got = Vec::new();
    while got.len() < 160 {
        if let Some(word) = port.read() {
            got.push(word);
        }
        system.tick().unwrap();
        assert!(system.cycle() < 20_000, "reads stalled");
    }
    assert_eq!(got, (0..160).collect::<Vec<Word>>());

    for _ in 0..500 {
        system.tick().unwrap();
        assert!(!port.r_rdy());
    }

    let stats = system.controller.stats();
    assert!(stats.words_to_device > 0);
    assert_eq!(stats.words_to_device, stats.words_from_device);
    assert_eq!(stats.bypass_words + stats.words_to_device, 160);
    assert_eq!(stats.write_bursts, stats.read_bursts);
}

/// Tests that staged words land at the start of the channel's window.
#[test]
fn test_device_contents() {
    let mut system = System::new(&create_test_config()).unwrap();
    let port = system.port(0);
    let mut written: Word = 0;
    while written < 64 {
        if port.write(written) {
            written += 1;
        }
        system.tick().unwrap();
    }
    for _ in 0..200 {
        system.tick().unwrap();
    }

    let sdram = system.sdram().unwrap();
    assert_eq!(sdram.words_written(), 32);
    for i in 0..32 {
        assert_eq!(sdram.peek(GlobalAddr::new(i)), Some(32 + i as Word));
    }
}

/// Tests that refresh and bursts never share the bus.
#[test]
fn test_mutual_exclusion() {
    let mut config = with_short_retention(create_test_config());
    config.timing.refresh_threshold = 0;
    let mut system = System::new(&config).unwrap();

    let read = stream(&mut system, 20_000, 2, |s| {
        let c = &s.controller;
        if c.owner() == BusOwner::Refresh {
            assert!(!c.sequencer().in_progress());
        }
        if c.status().refresh_in_progress {
            assert!(!c.sequencer().in_progress());
            assert_eq!(c.scheduler_state(), SchedulerState::Refreshing);
        }
    });
    assert!(read > 1_000);

    let stats = system.controller.stats();
    assert!(stats.refreshes > 50);
    assert!(stats.cycles_refresh > 0);
    assert!(!system.controller.status().refresh_lapsed);
}

/// Tests that a refresh only ever follows a completed turn.
#[test]
fn test_refresh_lands_between_turns() {
    let mut config = with_short_retention(create_test_config());
    config.timing.refresh_threshold = 0;
    let mut system = System::new(&config).unwrap();
    let port = system.port(0);
    let bursts_per_turn = u64::from(config.burst.bursts_per_turn);

    let mut activates = 0u64;
    let mut refreshes_after_init = 0u64;
    let mut written: u32 = 0;
    let mut read: u32 = 0;
    for cycle in 0..20_000u64 {
        if port.write(written as Word) {
            written += 1;
        }
        if cycle % 2 == 0 {
            if let Some(word) = port.read() {
                assert_eq!(word, read as Word);
                read += 1;
            }
        }
        let pins = system.tick().unwrap();
        match decode(&pins) {
            Command::Activate => activates += 1,
            Command::Refresh if system.controller.status().initialised => {
                assert_eq!(activates % bursts_per_turn, 0);
                refreshes_after_init += 1;
            }
            _ => {}
        }
    }
    assert!(activates > 100);
    assert!(refreshes_after_init > 50);
}

/// Tests that prompt grants keep the budget from ever running out.
#[test]
fn test_refresh_liveness() {
    let config = with_short_retention(create_test_config());
    let mut system = System::new(&config).unwrap();

    stream(&mut system, 60_000, 2, |s| {
        assert!(!s.controller.status().refresh_lapsed);
    });

    let stats = system.controller.stats();
    assert!(stats.refreshes >= 290, "only {} refreshes", stats.refreshes);
    assert_eq!(stats.lapses, 0);
    // The device also saw the two power-up refreshes, and possibly one
    // still inside its tRC window.
    let sdram = system.sdram().unwrap();
    assert!(sdram.refreshes() >= stats.refreshes + 2);
    assert!(sdram.refreshes() <= stats.refreshes + 3);
}

/// Tests the lapse path: requests stay up while traffic continues, the lapse
/// flag sticks, and the first granted refresh clears it.
#[test]
fn test_withheld_refresh_lapses() {
    let config = with_short_retention(create_test_config());
    let mut system = System::new(&config).unwrap();
    system.controller.set_refresh_permit(false);
    let port = system.port(0);

    let mut written: u32 = 0;
    let mut read: u32 = 0;
    let mut requested_at = None;
    let mut lapsed_at = None;
    for cycle in 0..25_000u64 {
        if port.write(written as Word) {
            written += 1;
        }
        if cycle % 2 == 0 {
            if let Some(word) = port.read() {
                assert_eq!(word, read as Word);
                read += 1;
            }
        }
        system.tick().unwrap();

        let status = system.controller.status();
        if requested_at.is_some() {
            assert!(status.request_to_refresh_soon);
        } else if status.request_to_refresh_soon {
            requested_at = Some(cycle);
        }
        if lapsed_at.is_some() {
            assert!(status.refresh_lapsed);
        } else if status.refresh_lapsed {
            lapsed_at = Some(cycle);
        }
    }

    let requested_at = requested_at.unwrap();
    let lapsed_at = lapsed_at.unwrap();
    assert!(requested_at < lapsed_at);
    assert!(lapsed_at > 20_000 && lapsed_at < 20_100);
    assert_eq!(system.controller.stats().refreshes, 0);

    let bursts_before = system.controller.stats().write_bursts;
    assert!(bursts_before > 100);

    system.controller.set_refresh_permit(true);
    let recovered = system
        .run_until(200, |s| !s.controller.status().refresh_lapsed)
        .unwrap();
    assert!(recovered);
    assert_eq!(system.controller.stats().lapses, 1);
    assert_eq!(
        system.controller.refresh().budget().level(),
        system.controller.timing().refresh_period
    );
}

/// Tests three channels sharing the device through the workload driver.
#[test]
fn test_multi_channel_round_trip() {
    let mut config = create_test_config();
    config.channels.count = 3;
    let mut system = System::new(&config).unwrap();

    let mut workload = Workload::new(&system, 200, Pattern::WriteThenRead);
    let cycles = workload.run(&mut system, 200_000).unwrap();
    assert!(cycles > 0);
    assert!(workload.streams().iter().all(|s| s.read() == 200));

    for ch in system.controller.channels().iter() {
        assert!(ch.counters().bypass_words >= 32);
        assert!(ch.counters().write_turns > 0);
        assert_eq!(ch.counters().write_turns, ch.counters().read_turns);
        assert_eq!(ch.backlog(), 0);
    }

    let sdram = system.sdram().unwrap();
    assert_eq!(sdram.peek(GlobalAddr::new(2 * 256)), Some((2 << 12) + 32));
    assert_eq!(sdram.peek(GlobalAddr::new(256)), Some((1 << 12) + 32));
}

/// Tests that a workload larger than the buffering deadlocks into a timeout
/// rather than corrupting data.
#[test]
fn test_write_first_overflow_times_out() {
    let mut system = System::new(&create_test_config()).unwrap();
    let mut workload = Workload::new(&system, 1_000, Pattern::WriteThenRead);
    let err = workload.run(&mut system, 20_000).unwrap_err();
    match err {
        RunError::Timeout { pending, .. } => assert_eq!(pending, 1_000),
        other => panic!("unexpected error: {}", other),
    }
}

/// Tests the JSON statistics report.
#[test]
fn test_stats_json() {
    let mut system = System::new(&create_test_config()).unwrap();
    let mut workload = Workload::new(&system, 100, Pattern::Interleaved);
    workload.run(&mut system, 10_000).unwrap();

    let json = system.controller.stats().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["cycles"].as_u64(), Some(system.cycle()));
    assert_eq!(value["bypass_words"].as_u64(), Some(100));
    assert!(value.get("start_time").is_none());
}

/// Tests that reads from a device that never answers show up in the stats.
#[test]
fn test_undriven_reads_reported() {
    let controller = Controller::new(&create_test_config()).unwrap();
    let mut system = System::with_device(controller, Box::new(SilentDevice));
    assert!(system.sdram().is_none());
    let port = system.port(0);

    let mut written: Word = 0;
    for _ in 0..3_000 {
        if written < 64 {
            if port.write(written) {
                written += 1;
            }
        } else {
            port.read();
        }
        system.tick().unwrap();
    }

    let stats = system.controller.stats();
    assert!(stats.read_turns > 0);
    assert_eq!(stats.undriven_reads, stats.words_from_device);
    assert!(stats.to_json().unwrap().contains("\"undriven_reads\""));
}
