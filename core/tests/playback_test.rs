mod common;

use std::sync::Arc;

use common::{MockAudioHost, MockCore};
use picobridge_core::audio::{AudioRing, AudioSpec, PlaybackBridge};
use picobridge_core::core::Region;

fn bridge(host: MockAudioHost) -> PlaybackBridge<MockAudioHost> {
    PlaybackBridge::new(host, Arc::new(AudioRing::new(4096)), 44_100)
}

#[test]
fn test_open_with_exact_grant() {
    let mut core = MockCore::new();
    let mut bridge = bridge(MockAudioHost::default());

    bridge.open(&mut core).unwrap();

    let state = bridge.state();
    assert!(state.is_open);
    assert_eq!(state.requested_rate, 44_100);
    assert_eq!(state.actual_rate, 44_100);
    assert_eq!(state.requested_block_size, 735);
    assert_eq!(state.actual_block_size, 735);
    assert!(core.rerates.is_empty());
    assert_eq!(bridge.host().opens, vec![(AudioSpec::stereo(44_100, 735), true)]);
    assert_eq!(bridge.host().resumes, 1);
}

#[test]
fn test_coerced_rate_rerates_once_and_reopens_with_exact_block() {
    let mut core = MockCore::new();
    let mut bridge = bridge(MockAudioHost::coercing(48_000));

    bridge.open(&mut core).unwrap();

    assert_eq!(bridge.state().actual_rate, 48_000);
    assert_eq!(core.rerates, vec![48_000]);

    // Granted block (735) no longer matches 48 kHz / 60 Hz = 800 frames,
    // so the device is reopened with the block spelled out.
    let opens = &bridge.host().opens;
    assert_eq!(opens.len(), 2);
    assert_eq!(opens[1], (AudioSpec::stereo(48_000, 800), false));
    assert_eq!(bridge.host().closes, 1);
    assert_eq!(bridge.state().actual_block_size, 800);
}

#[test]
fn test_coerced_rate_with_matching_block_skips_reopen() {
    let mut core = MockCore::new();
    let host = MockAudioHost {
        grant_rate: Some(48_000),
        grant_block: Some(800),
        ..MockAudioHost::default()
    };
    let mut bridge = bridge(host);

    bridge.open(&mut core).unwrap();

    assert_eq!(bridge.host().opens.len(), 1);
    assert_eq!(core.rerates, vec![48_000]);
    assert_eq!(bridge.state().actual_block_size, 800);
}

#[test]
fn test_reopen_against_coercing_host_rerates_at_most_once_per_open() {
    let mut core = MockCore::new();
    let mut bridge = bridge(MockAudioHost::coercing(48_000));

    bridge.open(&mut core).unwrap();
    assert_eq!(core.rerates, vec![48_000]);

    bridge.close();
    bridge.open(&mut core).unwrap();

    // The second open asks for the rate already granted, so the core is
    // left alone.
    assert_eq!(core.rerates, vec![48_000]);
    assert_eq!(core.sample_rate, 48_000);
    let state = bridge.state();
    assert_eq!(state.requested_rate, 48_000);
    assert_eq!(state.actual_rate, 48_000);
    assert_eq!(state.actual_block_size, 800);
    assert_eq!(
        bridge.host().opens.last(),
        Some(&(AudioSpec::stereo(48_000, 800), true))
    );
}

#[test]
fn test_reopen_coerced_elsewhere_rerates_once() {
    let mut core = MockCore::new();
    let mut bridge = bridge(MockAudioHost::coercing(48_000));
    bridge.open(&mut core).unwrap();

    bridge.host_mut().grant_rate = Some(32_000);
    bridge.open(&mut core).unwrap();

    assert_eq!(core.rerates, vec![48_000, 32_000]);
    assert_eq!(bridge.state().actual_rate, 32_000);
}

#[test]
fn test_block_matches_tracks_core_timing() {
    let mut core = MockCore::new();
    let mut bridge = bridge(MockAudioHost::default());
    assert!(bridge.block_matches(&core));

    bridge.open(&mut core).unwrap();
    assert!(bridge.block_matches(&core));

    core.region = Region::Pal;
    assert!(!bridge.block_matches(&core));
}

#[test]
fn test_open_failure_leaves_bridge_closed() {
    let mut core = MockCore::new();
    let mut bridge = bridge(MockAudioHost::failing());

    assert!(bridge.open(&mut core).is_err());
    assert!(!bridge.is_open());
    assert!(!bridge.push(&[1, 2]));
    assert_eq!(bridge.ring().unread(), 0);
}

#[test]
fn test_push_dropped_while_closed() {
    let mut core = MockCore::new();
    let mut bridge = bridge(MockAudioHost::default());
    bridge.open(&mut core).unwrap();

    assert!(bridge.push(&[5, 5]));
    bridge.close();
    assert!(!bridge.push(&[6, 6]));
    assert_eq!(bridge.ring().unread(), 2);
    assert!(bridge.host().consumer.is_none());
}

#[test]
fn test_open_clears_ring() {
    let mut core = MockCore::new();
    let mut bridge = bridge(MockAudioHost::default());
    bridge.ring().push(&[9; 32]);

    bridge.open(&mut core).unwrap();

    assert_eq!(bridge.ring().unread(), 0);
    assert_eq!(bridge.ring().generation(), 1);
}

#[test]
fn test_host_consumer_pulls_pushed_blocks() {
    let mut core = MockCore::new();
    let mut bridge = bridge(MockAudioHost::default());
    bridge.open(&mut core).unwrap();

    bridge.push(&[100, -100, 200, -200]);

    let mut out = [0i16; 6];
    let consumer = bridge.host_mut().consumer.as_mut().unwrap();
    assert_eq!(consumer.fill(&mut out), 4);
    assert_eq!(out, [100, -100, 200, -200, 0, 0]);
}

#[test]
fn test_close_when_closed_is_noop() {
    let mut bridge = bridge(MockAudioHost::default());
    bridge.close();
    assert_eq!(bridge.host().closes, 0);
}
