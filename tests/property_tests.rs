//! Property tests for the pipeline stages

use proptest::prelude::*;

use blink_monitor::{
    alerts::AlertPolicy,
    blink_fsm::{BlinkState, BlinkStateMachine},
    calibration::{percentile_value, CalibrationStep, Calibrator},
    filters::{exponential::ExponentialFilter, EarFilter},
    rate::BlinkRateWindow,
};

fn blink_sequence(episodes: &[(usize, usize)]) -> Vec<bool> {
    let mut closed = vec![false; 3];
    for &(closed_frames, open_frames) in episodes {
        closed.extend(std::iter::repeat(true).take(closed_frames));
        closed.extend(std::iter::repeat(false).take(open_frames));
    }
    closed
}

proptest! {
    #[test]
    fn pt_smoothing_stays_between_previous_and_raw(
        alpha in 0.01_f64..=1.0,
        samples in prop::collection::vec(0.0_f64..1.0, 1..50),
    ) {
        let mut filter = ExponentialFilter::new(alpha);
        let mut previous: Option<f64> = None;
        for &raw in &samples {
            let smoothed = filter.apply(raw);
            match previous {
                None => prop_assert_eq!(smoothed, raw),
                Some(prev) => {
                    prop_assert!(smoothed >= prev.min(raw) - 1e-12);
                    prop_assert!(smoothed <= prev.max(raw) + 1e-12);
                }
            }
            previous = Some(smoothed);
        }
    }

    #[test]
    fn pt_baseline_is_frozen_percentile(
        window in prop::collection::vec(0.05_f64..0.5, 1..60),
        later in prop::collection::vec(0.0_f64..1.0, 0..20),
    ) {
        let mut calibrator = Calibrator::new(window.len(), 0.7);
        let mut completed = None;
        for &ear in &window {
            if let CalibrationStep::Completed(result) = calibrator.observe(ear) {
                completed = Some(result);
            }
        }
        let result = completed.unwrap();
        prop_assert_eq!(Some(result.baseline_ear), percentile_value(&window, 0.7));
        prop_assert_eq!(result.samples, window.len());

        let min = window.iter().copied().fold(f64::INFINITY, f64::min);
        let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(result.baseline_ear >= min && result.baseline_ear <= max);

        for &ear in &later {
            prop_assert_eq!(calibrator.observe(ear), CalibrationStep::AlreadyCalibrated);
        }
        prop_assert_eq!(calibrator.baseline_ear(), Some(result.baseline_ear));
        prop_assert_eq!(calibrator.frame_count(), window.len());
    }

    #[test]
    fn pt_each_bounded_closure_is_one_blink(
        episodes in prop::collection::vec((1_usize..=7, 2_usize..6), 0..20),
    ) {
        let mut fsm = BlinkStateMachine::default();
        let detected = blink_sequence(&episodes)
            .into_iter()
            .filter(|&closed| fsm.update(closed).blink_detected)
            .count();
        prop_assert_eq!(detected, episodes.len());
        prop_assert_eq!(fsm.total_blinks(), episodes.len() as u64);
        prop_assert_eq!(fsm.state(), BlinkState::Open);
    }

    #[test]
    fn pt_overlong_closures_never_count(
        episodes in prop::collection::vec((8_usize..40, 2_usize..6), 1..10),
    ) {
        let mut fsm = BlinkStateMachine::default();
        for closed in blink_sequence(&episodes) {
            prop_assert!(!fsm.update(closed).blink_detected);
        }
        prop_assert_eq!(fsm.total_blinks(), 0);
    }

    #[test]
    fn pt_blinks_never_exceed_reopenings(closed in prop::collection::vec(any::<bool>(), 0..200)) {
        let mut fsm = BlinkStateMachine::default();
        let reopenings = closed.windows(2).filter(|w| w[0] && !w[1]).count();
        let detected = closed.iter().filter(|&&c| fsm.update(c).blink_detected).count();
        prop_assert!(detected <= reopenings);
    }

    #[test]
    fn pt_rate_counts_trailing_minute(
        mut times in prop::collection::vec(0.0_f64..600.0, 0..100),
        now_offset in 0.0_f64..120.0,
    ) {
        times.sort_by(f64::total_cmp);
        let now = times.last().copied().unwrap_or(0.0) + now_offset;
        let mut window = BlinkRateWindow::default();
        for &t in &times {
            window.record(t);
        }
        let expected = times.iter().filter(|&&t| now - t <= 60.0).count();
        prop_assert_eq!(window.blinks_per_minute(now), expected);
        prop_assert!(window.timestamps().all(|t| now - t <= 60.0));
    }

    #[test]
    fn pt_advisories_respect_cooldown(steps in prop::collection::vec(1.0_f64..2000.0, 1..100)) {
        let mut policy = AlertPolicy::default();
        let mut now = 0.0;
        let mut last_emitted = 0.0;
        for step in steps {
            now += step;
            if policy.evaluate(now, 12).is_some() {
                prop_assert!(now - last_emitted >= 3600.0);
                last_emitted = now;
            } else {
                prop_assert!(now - last_emitted < 3600.0);
            }
        }
    }
}
