//! Integration tests for the blink monitoring pipeline


use blink_monitor::{
    alerts::AdvisoryKind,
    blink_fsm::BlinkState,
    clock::ManualClock,
    notification::NotificationDispatcher,
    session::{MonitorSession, Phase},
};
use std::time::Duration;
use test_helpers::{advisory_titles, calibrate, feed, synthetic_face, test_config, test_session, RecordingSink};

const BLINK: [f64; 5] = [0.30, 0.15, 0.15, 0.30, 0.30];

fn blinks(session: &mut MonitorSession, clock: &ManualClock, count: usize) -> u64 {
    let mut detected = 0;
    for _ in 0..count {
        detected += feed(session, clock, &BLINK, 30.0)
            .iter()
            .filter(|r| r.blink_detected)
            .count() as u64;
    }
    detected
}

#[test]
fn test_baseline_from_constant_open_eyes() {
    let (mut session, clock) = test_session(test_config());
    let reports = calibrate(&mut session, &clock, 0.30);

    let last = reports.last().unwrap();
    let result = last.calibration.expect("last calibration frame reports the result");
    assert!((result.baseline_ear - 0.30).abs() < 1e-9);
    assert!(result.std_dev < 1e-9);
    assert_eq!(result.samples, 30);
    assert_eq!(last.phase, Phase::Tracking);
    assert_eq!(advisory_titles(&reports), vec!["Calibration Complete".to_string()]);
}

#[test]
fn test_calibration_and_classification_are_exclusive() {
    let (mut session, clock) = test_session(test_config());
    let reports = calibrate(&mut session, &clock, 0.30);

    for report in &reports {
        let sample = report.sample.unwrap();
        assert!(sample.is_closed.is_none());
        assert!(sample.threshold.is_none());
        assert!(report.transition.is_none());
    }
    assert_eq!(session.blink_state_machine().state(), BlinkState::Open);

    let next = feed(&mut session, &clock, &[0.30], 30.0);
    let sample = next[0].sample.unwrap();
    assert_eq!(sample.is_closed, Some(false));
    assert!((sample.threshold.unwrap() - 0.234).abs() < 1e-9);
    assert!(next[0].calibration.is_none());
}

#[test]
fn test_short_closure_counts_once_on_reopening() {
    let (mut session, clock) = test_session(test_config());
    calibrate(&mut session, &clock, 0.30);

    let reports = feed(&mut session, &clock, &BLINK, 30.0);
    let detected: Vec<bool> = reports.iter().map(|r| r.blink_detected).collect();
    assert_eq!(detected, vec![false, false, false, false, true]);

    let closed: Vec<Option<bool>> = reports.iter().map(|r| r.sample.unwrap().is_closed).collect();
    assert_eq!(closed, vec![Some(false), Some(true), Some(true), Some(false), Some(false)]);

    let last = reports.last().unwrap();
    assert_eq!(last.total_blinks, 1);
    assert_eq!(last.bpm, 1);
    assert_eq!(last.blink_state, BlinkState::Open);
    assert_eq!(last.status_text().as_deref(), Some("Blink Detected! Total: 1"));
}

#[test]
fn test_long_closure_is_not_a_blink() {
    let (mut session, clock) = test_session(test_config());
    calibrate(&mut session, &clock, 0.30);

    let mut ears = vec![0.30];
    ears.extend([0.10; 9]);
    ears.extend([0.30; 3]);
    let reports = feed(&mut session, &clock, &ears, 30.0);

    assert!(reports.iter().all(|r| !r.blink_detected));
    assert!(reports.iter().any(|r| r.blink_state == BlinkState::HeldClosed));
    assert_eq!(reports.last().unwrap().blink_state, BlinkState::Open);
    assert_eq!(session.blink_state_machine().total_blinks(), 0);
    assert!(session.rate_window().is_empty());
}

#[test]
fn test_no_face_frames_leave_state_untouched() {
    let (mut session, clock) = test_session(test_config());
    calibrate(&mut session, &clock, 0.30);
    feed(&mut session, &clock, &[0.30, 0.15], 30.0);

    let fsm = session.blink_state_machine().clone();
    let calibrator = session.calibrator().clone();
    let smoothed = session.last_smoothed_ear();

    for _ in 0..5 {
        clock.advance(1.0 / 30.0);
        let report = session.process_frame(None);
        assert!(!report.face_detected);
        assert!(!report.glasses_detected);
        assert!(report.sample.is_none());
        assert!(report.transition.is_none());
        assert_eq!(report.blink_state, BlinkState::Closed);
    }

    assert_eq!(session.blink_state_machine(), &fsm);
    assert_eq!(session.calibrator(), &calibrator);
    assert_eq!(session.last_smoothed_ear(), smoothed);

    // The interrupted closure still completes as one blink
    let reports = feed(&mut session, &clock, &[0.15, 0.30, 0.30], 30.0);
    assert!(reports.last().unwrap().blink_detected);
    assert_eq!(session.face_frames(), 35);
    assert_eq!(session.frames_processed(), 40);
}

#[test]
fn test_calibration_counts_only_face_frames() {
    let (mut session, clock) = test_session(test_config());
    let face = synthetic_face(0.30);

    for i in 0..60 {
        clock.advance(0.1);
        let report = if i % 2 == 0 {
            session.process_frame(Some(&face))
        } else {
            session.process_frame(None)
        };
        if i < 58 {
            assert!(matches!(report.phase, Phase::Calibrating { .. }), "frame {i}");
        }
    }
    assert_eq!(session.calibrator().frame_count(), 30);
    assert!(session.calibrator().is_calibrated());
}

#[test]
fn test_glasses_lower_ear_and_raise_threshold() {
    let mut config = test_config();
    config.compensation.glasses_variance_threshold = -1.0;
    let (mut session, clock) = test_session(config);
    let reports = calibrate(&mut session, &clock, 0.30);

    assert!(reports.iter().all(|r| r.glasses_detected));
    let baseline = session.calibrator().baseline_ear().unwrap();
    assert!((baseline - 0.30 * 0.92).abs() < 1e-9);

    let report = &feed(&mut session, &clock, &[0.30], 30.0)[0];
    assert!((report.sample.unwrap().threshold.unwrap() - baseline * 0.81).abs() < 1e-9);
}

#[test]
fn test_rate_window_forgets_old_blinks() {
    let (mut session, clock) = test_session(test_config());
    calibrate(&mut session, &clock, 0.30);
    assert_eq!(blinks(&mut session, &clock, 3), 3);

    clock.advance(61.0);
    let report = session.process_frame(None);
    assert_eq!(report.bpm, 0);
    assert_eq!(report.total_blinks, 3);
}

#[test]
fn test_hourly_advisory_cadence() {
    let (mut session, clock) = test_session(test_config());
    calibrate(&mut session, &clock, 0.30);

    clock.set(3590.0);
    assert_eq!(blinks(&mut session, &clock, 3), 3);

    clock.set(3600.0);
    let report = session.process_frame(None);
    assert_eq!(report.advisories.len(), 1);
    assert_eq!(report.advisories[0].kind, AdvisoryKind::Fatigue);
    assert_eq!(report.advisories[0].bpm, Some(3));
    assert_eq!(report.seconds_until_next_advisory, 3600);

    clock.set(7150.0);
    assert_eq!(blinks(&mut session, &clock, 26), 26);
    clock.set(7199.0);
    assert!(session.process_frame(None).advisories.is_empty());

    clock.set(7200.0);
    let report = session.process_frame(None);
    assert_eq!(report.advisories[0].kind, AdvisoryKind::Stress);
    assert_eq!(
        report.status_text().as_deref(),
        Some("Fast Blink Rate! (26 BPM) - You may be stressed.")
    );
}

#[test]
fn test_advisories_reach_the_sink() {
    let sink = RecordingSink::default();
    let dispatcher = NotificationDispatcher::spawn(Box::new(sink.clone()), 8).unwrap();
    let clock = ManualClock::new(0.0);
    let mut session = MonitorSession::new(test_config(), Box::new(clock.clone()))
        .unwrap()
        .with_notifier(dispatcher);

    session.start();
    calibrate(&mut session, &clock, 0.30);
    clock.set(3600.0);
    session.process_frame(None);
    let stopped = session.finish();

    assert_eq!(stopped.kind, AdvisoryKind::Stopped);
    assert_eq!(
        sink.titles(),
        vec![
            "Blink Monitor Started".to_string(),
            "Calibration Complete".to_string(),
            "Low Blink Rate Detected".to_string(),
            "Blink Monitor Stopped".to_string(),
        ]
    );
}

#[test]
fn test_stop_advisory_survives_a_full_queue() {
    let sink = RecordingSink::slow(Duration::from_millis(50));
    let dispatcher = NotificationDispatcher::spawn(Box::new(sink.clone()), 1).unwrap();
    let clock = ManualClock::new(0.0);
    let mut session = MonitorSession::new(test_config(), Box::new(clock.clone()))
        .unwrap()
        .with_notifier(dispatcher);

    session.start();
    calibrate(&mut session, &clock, 0.30);
    session.finish();

    let titles = sink.titles();
    assert_eq!(titles.first().map(String::as_str), Some("Blink Monitor Started"));
    assert_eq!(titles.last().map(String::as_str), Some("Blink Monitor Stopped"));
}
