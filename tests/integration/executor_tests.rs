//! Integration tests for the IntentExecutor → registry → outputs pipeline.
//!
//! These verify that intents arriving as raw ids or free text reach the
//! right outputs, that refusals carry a usable snapshot, and that events
//! are reported in order.

use std::time::Duration;

use lampctl::Error;
use lampctl::adapters::log_sink::MemorySink;
use lampctl::adapters::sim::PinWrite;
use lampctl::app::commands::{Action, Intent, IntentParams, Target};
use lampctl::app::events::AppEvent;
use lampctl::app::phrases::Locale;
use lampctl::app::ports::NullSink;
use lampctl::drivers::channel::LedColour;
use lampctl::sensors::SensorResult;

use crate::mock_hw::MockRig;

fn params(interval: Option<f32>, times: Option<u32>, duration: Option<f32>) -> IntentParams {
    IntentParams {
        duration,
        interval,
        times,
    }
}

// ── Raw intents ──────────────────────────────────────────────

#[test]
fn raw_intent_turns_channel_on() {
    let (exec, rig) = MockRig::executor();
    let mut sink = MemorySink::default();

    let snap = exec
        .execute_raw("RED", "on", IntentParams::default(), &mut sink)
        .unwrap();
    assert!(snap.get(LedColour::Red).unwrap().steady_on);
    assert!(rig.monitor(LedColour::Red).is_active());

    assert!(matches!(
        sink.events.first(),
        Some(AppEvent::ChannelChanged {
            colour: LedColour::Red,
            ..
        })
    ));
    assert!(matches!(
        sink.events.last(),
        Some(AppEvent::IntentApplied(_))
    ));
}

#[test]
fn unknown_channel_and_action_are_rejected() {
    let (exec, _rig) = MockRig::executor();
    let mut sink = MemorySink::default();

    let err = exec
        .execute_raw("purple", "on", IntentParams::default(), &mut sink)
        .unwrap_err();
    assert_eq!(err.error, Error::UnknownTarget("purple".into()));
    assert!(err.snapshot.all_off());

    let err = exec
        .execute_raw("red", "dance", IntentParams::default(), &mut sink)
        .unwrap_err();
    assert_eq!(err.error, Error::UnknownAction("dance".into()));

    assert_eq!(sink.events.len(), 2);
    assert!(
        sink.events
            .iter()
            .all(|e| matches!(e, AppEvent::IntentRejected { .. }))
    );
}

#[test]
fn out_of_range_parameters_touch_nothing() {
    let (exec, rig) = MockRig::executor();

    let err = exec
        .execute_raw("red", "blink", params(Some(0.001), None, None), &mut NullSink)
        .unwrap_err();
    assert!(matches!(err.error, Error::InvalidParameter(_)));

    let err = exec
        .execute_raw("red", "pulse", params(None, Some(0), None), &mut NullSink)
        .unwrap_err();
    assert!(matches!(err.error, Error::InvalidParameter(_)));

    let err = exec
        .execute_raw("buzzer", "pulse", params(None, None, Some(f32::NAN)), &mut NullSink)
        .unwrap_err();
    assert!(matches!(err.error, Error::InvalidParameter(_)));

    assert_eq!(rig.monitor(LedColour::Red).write_count(), 0);
    assert_eq!(rig.buzzer.write_count(), 0);
}

#[test]
fn led_pulse_runs_fixed_blink() {
    let (exec, rig) = MockRig::executor();
    let mut sink = MemorySink::default();

    let snap = exec
        .execute_raw("white", "pulse", params(Some(0.02), Some(2), None), &mut sink)
        .unwrap();
    assert!(snap.all_off());
    assert_eq!(rig.monitor(LedColour::White).activations(), 2);
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::FixedBlinkDone {
            colour: LedColour::White,
            cycles: 2
        }
    )));
}

#[test]
fn buzzer_pulse_uses_given_duration() {
    let (exec, rig) = MockRig::executor();
    let start = std::time::Instant::now();
    let snap = exec
        .execute_raw("buzzer", "buzz", params(None, None, Some(0.05)), &mut NullSink)
        .unwrap();
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert!(!snap.buzzer);
    assert_eq!(
        rig.buzzer.writes(),
        vec![PinWrite::Activate, PinWrite::Deactivate]
    );
}

#[test]
fn unsupported_combinations_are_refused() {
    let (exec, _rig) = MockRig::executor();
    for (target, action) in [
        (Target::Buzzer, Action::Blink),
        (Target::Buzzer, Action::Toggle),
        (Target::All, Action::Toggle),
        (Target::All, Action::Pulse),
    ] {
        let err = exec
            .execute(&Intent::new(target, action), &mut NullSink)
            .unwrap_err();
        assert!(
            matches!(err.error, Error::Unsupported { .. }),
            "{target} {action}"
        );
    }
}

// ── Free text ────────────────────────────────────────────────

#[test]
fn free_text_drives_outputs() {
    let (exec, rig) = MockRig::executor();

    exec.execute_text("please turn on the blue light", &mut NullSink)
        .unwrap();
    assert!(rig.monitor(LedColour::Blue).is_active());

    exec.execute_text("party mode", &mut NullSink).unwrap();
    assert!(exec.snapshot().channels.iter().all(|e| e.state.blinking));

    let snap = exec.execute_text("lights out", &mut NullSink).unwrap();
    assert!(snap.all_off());
}

#[test]
fn free_text_in_spanish() {
    let (exec, rig) = MockRig::executor();
    exec.execute_text_in("enciende la luz roja", Locale::Es, &mut NullSink)
        .unwrap();
    assert!(rig.monitor(LedColour::Red).is_active());
}

#[test]
fn unrecognised_text_reports_state() {
    let (exec, _rig) = MockRig::executor();
    exec.execute_raw("white", "on", IntentParams::default(), &mut NullSink)
        .unwrap();

    let err = exec
        .execute_text("  make me a sandwich ", &mut NullSink)
        .unwrap_err();
    assert_eq!(err.error, Error::Unrecognised("make me a sandwich".into()));
    assert!(err.snapshot.get(LedColour::White).unwrap().steady_on);
}

// ── Sensor / lifecycle ───────────────────────────────────────

#[test]
fn sensor_read_emits_event() {
    let (exec, rig) = MockRig::executor();
    let mut sink = MemorySink::default();

    rig.sensor.set(18.5, 60.0);
    let result = exec.read_sensor(&mut sink);
    let reading = result.reading().unwrap();
    assert!((reading.humidity - 60.0).abs() < 0.05);

    rig.sensor.fail_next(1);
    assert!(!exec.read_sensor(&mut sink).is_success());
    assert!(matches!(
        sink.events.last(),
        Some(AppEvent::SensorRead(SensorResult::Failed { .. }))
    ));
}

#[test]
fn intents_after_shutdown_are_refused() {
    let (exec, rig) = MockRig::executor();
    exec.execute_raw("red", "blink", params(Some(0.02), None, None), &mut NullSink)
        .unwrap();

    let mut sink = MemorySink::default();
    exec.shutdown(&mut sink).unwrap();
    assert!(matches!(sink.events.last(), Some(AppEvent::ShutDown)));
    assert!(rig.monitor(LedColour::Red).is_released());

    let err = exec
        .execute_raw("red", "on", IntentParams::default(), &mut NullSink)
        .unwrap_err();
    assert_eq!(err.error, Error::ShutDown);
    assert!(err.snapshot.all_off());
}
