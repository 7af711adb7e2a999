//! Integration tests for the top-level scheduler's turn and refresh ordering.

use sdram_controller::common::{BurstKind, Word};
use sdram_controller::config::{Config, Timing};
use sdram_controller::controller::{
    ChannelBufferManager, Decision, RefreshStatus, SchedulerState, TopLevelScheduler,
};

/// Creates a configuration with `count` channels and 16-word turns.
fn create_test_config(count: usize) -> Config {
    let mut config = Config::default();
    config.timing.t_startup_ns = 200;
    config.geometry.row_bits = 4;
    config.geometry.col_bits = 8;
    config.channels.count = count;
    config.channels.window_words = 256;
    config.channels.fifo_depth = 16;
    config
}

/// Feeds every channel until each one is ready for a write turn.
fn create_staged_channels(config: &Config) -> ChannelBufferManager {
    let timing = Timing::from_config(config).unwrap();
    let mut channels = ChannelBufferManager::new(config, &timing);
    let mut next: Word = 0;
    for _ in 0..500 {
        for i in 0..channels.len() {
            if channels.channel(i).port().write(next) {
                next += 1;
            }
        }
        channels.tick();
        if (0..channels.len()).all(|i| channels.eligible(i) == Some(BurstKind::Write)) {
            return channels;
        }
    }
    panic!("channels never became eligible");
}

fn status(request_soon: bool) -> RefreshStatus {
    RefreshStatus {
        initialised: true,
        request_soon,
        ..RefreshStatus::default()
    }
}

/// Runs one turn for the channel the scheduler just picked, with a refresh
/// pending throughout, and returns the decision taken once it ends.
fn finish_turn(
    scheduler: &mut TopLevelScheduler,
    channels: &mut ChannelBufferManager,
) -> Decision {
    let busy = scheduler.tick(&status(true), true, channels);
    assert_eq!(busy.start, None);
    assert!(!busy.enable_refresh);
    channels.retire_turns();
    scheduler.tick(&status(true), false, channels)
}

/// Tests that the scheduler waits for initialisation before doing anything.
#[test]
fn test_waits_for_initialisation() {
    let config = create_test_config(1);
    let channels = create_staged_channels(&config);
    let mut scheduler = TopLevelScheduler::new();

    let decision = scheduler.tick(&RefreshStatus::default(), false, &channels);
    assert_eq!(decision.start, None);
    assert_eq!(scheduler.state(), SchedulerState::WaitForInitialize);

    scheduler.tick(&status(false), false, &channels);
    assert_eq!(scheduler.state(), SchedulerState::RefreshOrIdle);
}

/// Tests that a pending refresh wins over an eligible channel when idle.
#[test]
fn test_refresh_first_when_idle() {
    let config = create_test_config(2);
    let channels = create_staged_channels(&config);
    let mut scheduler = TopLevelScheduler::new();
    scheduler.tick(&status(false), false, &channels);

    let decision = scheduler.tick(&status(true), false, &channels);
    assert!(decision.enable_refresh);
    assert_eq!(decision.start, None);
    assert_eq!(scheduler.state(), SchedulerState::Refreshing);
}

/// Tests that the next channel in the rotation is served before a pending
/// refresh, and that the refresh follows once the rotation wraps.
#[test]
fn test_next_channel_before_refresh() {
    let config = create_test_config(2);
    let mut channels = create_staged_channels(&config);
    let mut scheduler = TopLevelScheduler::new();
    scheduler.tick(&status(false), false, &channels);

    let first = scheduler.tick(&status(false), false, &channels);
    assert_eq!(first.start, Some((0, BurstKind::Write)));
    channels.begin_turn(0, BurstKind::Write);

    let second = finish_turn(&mut scheduler, &mut channels);
    assert!(!second.enable_refresh);
    assert_eq!(second.start, Some((1, BurstKind::Write)));
    assert_eq!(scheduler.state(), SchedulerState::WriteChannelToDevice(1));
    channels.begin_turn(1, BurstKind::Write);

    let third = finish_turn(&mut scheduler, &mut channels);
    assert!(third.enable_refresh);
    assert_eq!(third.start, None);
    assert_eq!(scheduler.state(), SchedulerState::Refreshing);
}

/// Tests that a lone channel never holds off a pending refresh.
#[test]
fn test_single_channel_yields_to_refresh() {
    let config = create_test_config(1);
    let mut channels = create_staged_channels(&config);
    let mut scheduler = TopLevelScheduler::new();
    scheduler.tick(&status(false), false, &channels);

    let first = scheduler.tick(&status(false), false, &channels);
    assert_eq!(first.start, Some((0, BurstKind::Write)));
    channels.begin_turn(0, BurstKind::Write);

    let next = finish_turn(&mut scheduler, &mut channels);
    assert!(next.enable_refresh);
    assert_eq!(scheduler.state(), SchedulerState::Refreshing);
}

/// Tests that an ineligible next channel does not delay a pending refresh.
#[test]
fn test_idle_next_channel_yields_to_refresh() {
    let config = create_test_config(3);
    let mut channels = create_staged_channels(&config);
    let mut scheduler = TopLevelScheduler::new();
    scheduler.tick(&status(false), false, &channels);

    scheduler.tick(&status(false), false, &channels);
    channels.begin_turn(0, BurstKind::Write);
    scheduler.tick(&status(true), true, &channels);
    channels.retire_turns();
    // Channel 1 is mid-turn as far as eligibility is concerned.
    channels.begin_turn(1, BurstKind::Write);

    let next = scheduler.tick(&status(true), false, &channels);
    assert!(next.enable_refresh);
    assert_eq!(scheduler.state(), SchedulerState::Refreshing);
}
