use std::time::Duration;

use tokio::time;
use wildfire_scene::{
    playback::PlaybackError, Engine, FrameCause, Playback, Scenario, SimulationClock, TickPeriod,
};

fn playback(hour: u8, period: TickPeriod) -> Playback {
    let scenario = Scenario::bundled().expect("bundled scenario");
    Playback::new(
        Engine::from_scenario(&scenario),
        SimulationClock::new(hour, period).unwrap(),
    )
}

#[tokio::test(start_paused = true)]
async fn scrubbing_while_running_pauses_playback() {
    let playback = playback(6, TickPeriod::Normal);
    playback.start().unwrap();
    time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(playback.current_hour(), 8);

    let frame = playback.set_hour(10).unwrap();
    assert!(!playback.is_running());
    assert_eq!(playback.current_hour(), 10);
    assert_eq!(frame.scene.hour, 10);
    assert_eq!(frame.scene.time_label, "10:00 AM");

    time::sleep(Duration::from_secs(10)).await;
    assert_eq!(playback.current_hour(), 10);
}

#[tokio::test(start_paused = true)]
async fn full_day_wraps_to_midnight() {
    let playback = playback(22, TickPeriod::Fast);
    let mut rx = playback.subscribe();
    playback.start().unwrap();
    time::sleep(Duration::from_millis(1_250)).await;
    playback.stop();

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert_eq!(first.cause, FrameCause::Tick);
    assert_eq!(first.scene.hour, 23);
    assert_eq!(second.scene.hour, 0);
    assert!(second.scene.fires.is_empty());
    assert!(second.sequence > first.sequence);
}

#[tokio::test(start_paused = true)]
async fn period_change_does_not_double_tick() {
    let playback = playback(6, TickPeriod::Slow);
    let mut rx = playback.subscribe();
    playback.start().unwrap();
    time::sleep(Duration::from_millis(100)).await;

    playback.set_tick_period_ms(500).unwrap();
    time::sleep(Duration::from_millis(2_100)).await;
    playback.stop();

    let mut hours = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        hours.push(frame.scene.hour);
    }
    // 500 ms ticks from t=100: 600, 1100, 1600, 2100
    assert_eq!(hours, vec![7, 8, 9, 10]);
}

#[tokio::test]
async fn unknown_tick_period_is_rejected() {
    let playback = playback(6, TickPeriod::Normal);
    assert!(playback.set_tick_period_ms(750).is_err());
    assert_eq!(playback.tick_period(), TickPeriod::Normal);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn period_change_outside_runtime_leaves_running_clock_alone() {
    let playback = playback(6, TickPeriod::Normal);
    playback.start().unwrap();

    let remote = playback.clone();
    let result = std::thread::spawn(move || remote.set_tick_period(TickPeriod::Slow))
        .join()
        .unwrap();
    assert!(matches!(result, Err(PlaybackError::NoRuntime)));
    assert_eq!(playback.tick_period(), TickPeriod::Normal);
    assert!(playback.is_running());
    playback.stop();

    // a stopped clock needs no driver, so any thread may re-time it
    let remote = playback.clone();
    std::thread::spawn(move || remote.set_tick_period(TickPeriod::Slow))
        .join()
        .unwrap()
        .unwrap();
    assert_eq!(playback.tick_period(), TickPeriod::Slow);
}
