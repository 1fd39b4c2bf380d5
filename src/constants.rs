//! Constants used throughout the application

/// Landmark indices of the 6-point EAR formulation, ordered p1..p6
pub const LEFT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];
pub const RIGHT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Wider eye contour rings used by the glasses heuristic
pub const LEFT_EYE_CONTOUR: [usize; 16] = [33, 7, 163, 144, 145, 153, 154, 155, 133, 173, 157, 158, 159, 160, 161, 246];
pub const RIGHT_EYE_CONTOUR: [usize; 16] = [
    362, 382, 381, 380, 374, 373, 390, 249, 263, 466, 388, 387, 386, 385, 384, 398,
];

/// Face orientation landmarks
pub const NOSE_TIP: usize = 4;
pub const LEFT_EAR: usize = 234;
pub const RIGHT_EAR: usize = 454;
pub const FOREHEAD: usize = 10;
pub const CHIN: usize = 152;

/// Number of points in a face mesh with refined iris landmarks
pub const NUM_FACE_MESH_LANDMARKS: usize = 478;

/// Calibration defaults
pub const DEFAULT_CALIBRATION_FRAMES: usize = 30;
pub const DEFAULT_BASELINE_PERCENTILE: f64 = 0.7;

/// Temporal smoothing weight given to the newest sample
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.7;

/// EAR compensation for head nodding and eyewear
pub const DEFAULT_PITCH_GAIN: f64 = 0.2;
pub const DEFAULT_GLASSES_EAR_SCALE: f64 = 0.92;
pub const DEFAULT_GLASSES_VARIANCE_THRESHOLD: f64 = 60.0;

/// Sentinel EAR reported when an eye cannot be measured ("fully open")
pub const FALLBACK_EAR: f64 = 1.0;

/// Closure threshold as a fraction of baseline EAR
pub const DEFAULT_EAR_THRESHOLD_ADJUSTMENT: f64 = 0.78;
pub const DEFAULT_GLASSES_THRESHOLD_BONUS: f64 = 0.03;

/// Blink duration bounds in frames
pub const BLINK_DURATION_MIN_FRAMES: u32 = 1;
pub const BLINK_DURATION_MAX_FRAMES: u32 = 7;
pub const MIN_OPEN_FRAMES: u32 = 2;

/// Sliding window for blink rate, in seconds
pub const RATE_WINDOW_SECS: f64 = 60.0;

/// Alert cadence and classification bounds
pub const NOTIFICATION_INTERVAL_SECS: f64 = 3600.0;
pub const SLOW_BLINK_THRESHOLD: usize = 10;
pub const FAST_BLINK_THRESHOLD: usize = 25;

/// Notification delivery defaults
pub const DEFAULT_APP_NAME: &str = "Blink Monitor";
pub const DEFAULT_NOTIFICATION_TIMEOUT_SECS: u32 = 30;
pub const DEFAULT_NOTIFICATION_QUEUE: usize = 16;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
