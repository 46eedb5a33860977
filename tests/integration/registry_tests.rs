//! Integration tests for the registry → channel → blink task pipeline.
//!
//! Timing-based assertions use generous margins; they check ordering and
//! counts, not precise periods.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lampctl::Error;
use lampctl::adapters::sim::{PinWrite, SimActuator};
use lampctl::app::ports::Actuator;
use lampctl::drivers::actuator::{ActiveLevel, PinActuator};
use lampctl::drivers::channel::{ChannelState, LedColour};
use lampctl::error::BlinkError;
use lampctl::registry::ActuatorRegistry;
use lampctl::sensors::climate::SimClimateSensor;

use crate::mock_hw::{MockRig, RecordingPin, StuckActuator, StuckControl, within};

const RED: LedColour = LedColour::Red;
const BLUE: LedColour = LedColour::Blue;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// ── Start-up ─────────────────────────────────────────────────

#[test]
fn registry_starts_all_off() {
    let (reg, _rig) = MockRig::registry();
    assert!(reg.snapshot().all_off());
    assert_eq!(reg.snapshot().channels.len(), 3);
}

// ── Steady on / off ──────────────────────────────────────────

#[test]
fn turn_on_then_off_sets_flags() {
    let (reg, rig) = MockRig::registry();

    let state = reg.set_channel(RED, true).unwrap();
    assert_eq!(
        state,
        ChannelState {
            steady_on: true,
            blinking: false
        }
    );
    assert!(rig.monitor(RED).is_active());

    reg.set_channel(RED, false).unwrap();
    assert_eq!(reg.snapshot().get(RED), Some(ChannelState::default()));
    assert!(!rig.monitor(RED).is_active());
}

#[test]
fn repeated_off_is_idempotent() {
    let (reg, rig) = MockRig::registry();
    reg.set_channel(BLUE, true).unwrap();
    reg.set_channel(BLUE, false).unwrap();
    let first = reg.snapshot();
    let writes = rig.monitor(BLUE).write_count();

    reg.set_channel(BLUE, false).unwrap();
    assert_eq!(reg.snapshot(), first);
    assert_eq!(rig.monitor(BLUE).write_count(), writes, "no redundant write");
}

#[test]
fn toggle_flips_steady_state() {
    let (reg, _rig) = MockRig::registry();
    assert!(reg.toggle_channel(RED).unwrap());
    assert!(!reg.toggle_channel(RED).unwrap());

    reg.blink_channel(RED, ms(20)).unwrap();
    // Blinking counts as off.
    assert!(reg.toggle_channel(RED).unwrap());
    assert!(!reg.snapshot().get(RED).unwrap().blinking);
}

// ── Continuous blink ─────────────────────────────────────────

#[test]
fn blink_then_off_stops_all_toggling() {
    let (reg, rig) = MockRig::registry();
    reg.blink_channel(RED, ms(10)).unwrap();
    assert!(reg.snapshot().get(RED).unwrap().blinking);

    thread::sleep(ms(80));
    reg.set_channel(RED, false).unwrap();
    let writes = rig.monitor(RED).write_count();
    assert!(writes >= 2, "expected the task to toggle, got {writes}");
    assert!(!rig.monitor(RED).is_active());

    thread::sleep(ms(80));
    assert_eq!(rig.monitor(RED).write_count(), writes);
    assert_eq!(reg.snapshot().get(RED), Some(ChannelState::default()));
}

#[test]
fn reblink_keeps_a_single_task() {
    let (reg, rig) = MockRig::registry();
    assert_eq!(reg.live_blink_tasks(RED), Some(0));
    reg.blink_channel(RED, ms(10)).unwrap();
    assert_eq!(reg.live_blink_tasks(RED), Some(1));

    for interval in [5, 15, 8] {
        thread::sleep(ms(45));
        reg.blink_channel(RED, ms(interval)).unwrap();
        assert_eq!(
            reg.live_blink_tasks(RED),
            Some(1),
            "superseded task still running"
        );
    }
    thread::sleep(ms(45));
    reg.set_channel(RED, false).unwrap();
    assert_eq!(reg.live_blink_tasks(RED), Some(0));

    assert!(rig.monitor(RED).alternates(), "{:?}", rig.monitor(RED).writes());
}

#[test]
fn channels_blink_independently() {
    let (reg, rig) = MockRig::registry();
    reg.blink_channel(RED, ms(10)).unwrap();
    reg.set_channel(BLUE, true).unwrap();
    thread::sleep(ms(50));

    let snap = reg.snapshot();
    assert!(snap.get(RED).unwrap().blinking);
    assert!(snap.get(BLUE).unwrap().steady_on);
    assert_eq!(rig.monitor(BLUE).writes(), vec![PinWrite::Activate]);
    reg.set_channel(RED, false).unwrap();
}

#[test]
fn steady_on_cancels_blink() {
    let (reg, rig) = MockRig::registry();
    reg.blink_channel(BLUE, ms(10)).unwrap();
    thread::sleep(ms(35));
    reg.set_channel(BLUE, true).unwrap();
    let writes = rig.monitor(BLUE).write_count();

    thread::sleep(ms(50));
    assert_eq!(rig.monitor(BLUE).write_count(), writes);
    assert!(rig.monitor(BLUE).is_active());
    assert!(reg.snapshot().get(BLUE).unwrap().steady_on);
}

// ── Fixed blink ──────────────────────────────────────────────

#[test]
fn fixed_blink_runs_exact_cycles_and_ends_off() {
    let (reg, rig) = MockRig::registry();
    let done = reg.run_fixed(RED, 3, ms(100)).unwrap();
    assert_eq!(done, 3);

    let monitor = rig.monitor(RED);
    assert_eq!(monitor.activations(), 3);
    assert_eq!(monitor.deactivations(), 3);
    assert!(monitor.alternates());
    assert_eq!(reg.snapshot().get(RED), Some(ChannelState::default()));
}

#[test]
fn fixed_blink_supersedes_continuous() {
    let (reg, rig) = MockRig::registry();
    reg.blink_channel(BLUE, ms(10)).unwrap();
    thread::sleep(ms(30));
    reg.run_fixed(BLUE, 2, ms(10)).unwrap();
    let writes = rig.monitor(BLUE).write_count();

    thread::sleep(ms(50));
    assert_eq!(rig.monitor(BLUE).write_count(), writes);
    assert!(rig.monitor(BLUE).alternates());
    assert!(!reg.snapshot().get(BLUE).unwrap().blinking);
}

// ── Aggregate ────────────────────────────────────────────────

#[test]
fn all_on_cancels_blinks() {
    let (reg, rig) = MockRig::registry();
    reg.blink_all(ms(10)).unwrap();
    thread::sleep(ms(30));
    assert!(reg.snapshot().channels.iter().all(|e| e.state.blinking));

    reg.set_all(true).unwrap();
    let counts: Vec<usize> = rig.leds.iter().map(|(_, p)| p.write_count()).collect();
    thread::sleep(ms(50));

    let snap = reg.snapshot();
    for (entry, ((_, monitor), before)) in snap.channels.iter().zip(rig.leds.iter().zip(counts)) {
        assert!(entry.state.steady_on);
        assert!(!entry.state.blinking);
        assert!(monitor.is_active());
        assert_eq!(monitor.write_count(), before);
    }
}

#[test]
fn all_off_silences_buzzer() {
    let (reg, rig) = MockRig::registry();
    reg.set_all(true).unwrap();
    reg.set_buzzer(true).unwrap();
    assert!(reg.snapshot().buzzer);

    reg.set_all(false).unwrap();
    assert!(reg.snapshot().all_off());
    assert!(!rig.buzzer.is_active());
}

// ── Buzzer ───────────────────────────────────────────────────

#[test]
fn buzzer_pulse_ends_silent() {
    let (reg, rig) = MockRig::registry();
    reg.pulse_buzzer(ms(30)).unwrap();
    assert_eq!(
        rig.buzzer.writes(),
        vec![PinWrite::Activate, PinWrite::Deactivate]
    );
    assert!(!reg.snapshot().buzzer);
}

// ── Sensor ───────────────────────────────────────────────────

#[test]
fn sensor_failure_leaves_state_unchanged() {
    let (reg, rig) = MockRig::registry();
    reg.set_channel(RED, true).unwrap();
    let before = reg.snapshot();

    rig.sensor.fail_next(1);
    let result = reg.read_sensor();
    assert!(!result.is_success());
    assert_eq!(reg.snapshot(), before);

    let ok = reg.read_sensor();
    assert!(ok.is_success());
    let reading = ok.reading().unwrap();
    assert!((reading.temperature - 22.0).abs() < 0.05);
}

#[test]
fn corrupted_frame_is_reported_not_raised() {
    let (reg, rig) = MockRig::registry();
    rig.sensor.set_frame([0x02, 0x8C, 0x01, 0x5F, 0x00]);
    assert!(!reg.read_sensor().is_success());
}

// ── Cancellation timeout ─────────────────────────────────────

fn wedged_registry() -> (Arc<ActuatorRegistry>, StuckControl) {
    let (stuck, control) = StuckActuator::new();
    let (sensor, _) = SimClimateSensor::new();
    let leds: Vec<(LedColour, Box<dyn Actuator>)> =
        vec![(RED, Box::new(stuck) as Box<dyn Actuator>)];
    let reg = ActuatorRegistry::new(
        leds,
        Box::new(SimActuator::new("buzzer").0),
        Box::new(sensor),
        ms(50),
    )
    .unwrap();

    control.arm();
    reg.blink_channel(RED, ms(10)).unwrap();
    // Let the task enter its first (blocking) write.
    thread::sleep(ms(20));
    (Arc::new(reg), control)
}

#[test]
fn wedged_task_reports_timeout_and_keeps_state() {
    let (reg, control) = wedged_registry();

    let err = {
        let reg = Arc::clone(&reg);
        within(ms(2000), move || reg.set_channel(RED, false)).unwrap_err()
    };
    assert!(matches!(
        err,
        Error::Blink(BlinkError::CancelTimeout { channel: RED, .. })
    ));
    assert!(reg.snapshot().get(RED).unwrap().blinking);
    assert_eq!(reg.live_blink_tasks(RED), Some(1));

    control.unblock();
    reg.set_channel(RED, false).unwrap();
    assert_eq!(reg.snapshot().get(RED), Some(ChannelState::default()));
    assert_eq!(reg.live_blink_tasks(RED), Some(0));
}

#[test]
fn shutdown_is_bounded_with_a_wedged_task() {
    let (reg, control) = wedged_registry();

    let result = {
        let reg = Arc::clone(&reg);
        within(ms(2000), move || reg.shutdown())
    };
    assert!(matches!(
        result,
        Err(Error::Blink(BlinkError::CancelTimeout { channel: RED, .. }))
    ));
    assert!(reg.is_shut_down());
    assert!(reg.snapshot().all_off());
    assert_eq!(reg.set_channel(RED, true), Err(Error::ShutDown));
    assert!(!control.is_released(), "release waits for the stuck write");

    // The task finishes the release once its write returns.
    control.unblock();
    thread::sleep(ms(100));
    assert!(control.is_released());
    assert_eq!(reg.live_blink_tasks(RED), Some(0));
}

// ── Hardware pin adapter ─────────────────────────────────────

#[test]
fn pin_actuator_drives_active_low_led() {
    let pin = RecordingPin::default();
    let (sensor, _) = SimClimateSensor::new();
    let leds: Vec<(LedColour, Box<dyn Actuator>)> = vec![(
        RED,
        Box::new(PinActuator::new(pin.clone(), ActiveLevel::Low, "red")) as Box<dyn Actuator>,
    )];
    let reg = ActuatorRegistry::new(
        leds,
        Box::new(SimActuator::new("buzzer").0),
        Box::new(sensor),
        ms(500),
    )
    .unwrap();

    // Start-up off is a high level on an active-low pin.
    assert_eq!(pin.levels(), vec![true]);
    reg.set_channel(RED, true).unwrap();
    reg.run_fixed(RED, 2, ms(10)).unwrap();
    reg.shutdown().unwrap();

    assert_eq!(pin.levels(), vec![true, false, true, false, true]);
}

// ── Shutdown ─────────────────────────────────────────────────

#[test]
fn shutdown_releases_everything() {
    let (reg, rig) = MockRig::registry();
    reg.blink_channel(RED, ms(10)).unwrap();
    reg.set_channel(BLUE, true).unwrap();
    reg.set_buzzer(true).unwrap();
    thread::sleep(ms(25));

    reg.shutdown().unwrap();
    assert!(reg.is_shut_down());
    assert!(reg.snapshot().all_off());
    for (_, monitor) in &rig.leds {
        assert!(monitor.is_released());
        assert!(!monitor.is_active());
        assert_eq!(monitor.writes().last(), Some(&PinWrite::Release));
    }
    assert!(rig.buzzer.is_released());
    assert!(rig.sensor.is_released());

    // Second call is a no-op; further requests are refused.
    reg.shutdown().unwrap();
    assert_eq!(reg.set_channel(RED, true), Err(Error::ShutDown));
    assert_eq!(reg.set_all(false), Err(Error::ShutDown));
}
