//! Core types and conventions shared by the resolver and the heading pipeline

/// Rotation of the display relative to the device's natural orientation
///
/// Supplied by the host with every sample and used only to pick the axis
/// remap that keeps azimuth relative to the top of the screen.
///
/// # Example
/// ```
/// use compass_heading::DisplayRotation;
///
/// assert_eq!(DisplayRotation::from_degrees(90), Some(DisplayRotation::Rotation90));
/// assert_eq!(DisplayRotation::from_degrees(45), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayRotation {
    /// Natural orientation
    #[default]
    Rotation0,
    /// Rotated 90° counter-clockwise
    Rotation90,
    /// Upside down
    Rotation180,
    /// Rotated 90° clockwise
    Rotation270,
}

impl DisplayRotation {
    /// All four rotations, in increasing angle
    pub const ALL: [DisplayRotation; 4] = [
        DisplayRotation::Rotation0,
        DisplayRotation::Rotation90,
        DisplayRotation::Rotation180,
        DisplayRotation::Rotation270,
    ];

    /// Parse a rotation given in degrees; only 0, 90, 180 and 270 are accepted
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees {
            0 => Some(DisplayRotation::Rotation0),
            90 => Some(DisplayRotation::Rotation90),
            180 => Some(DisplayRotation::Rotation180),
            270 => Some(DisplayRotation::Rotation270),
            _ => None,
        }
    }

    /// Rotation angle in degrees
    pub fn degrees(self) -> i32 {
        match self {
            DisplayRotation::Rotation0 => 0,
            DisplayRotation::Rotation90 => 90,
            DisplayRotation::Rotation180 => 180,
            DisplayRotation::Rotation270 => 270,
        }
    }
}

/// Sensor accuracy as reported to the host
///
/// Non-negative levels come straight from the platform sensor. The two
/// negative sentinels are produced by the pipeline itself when no heading
/// can ever be delivered for the current activation.
///
/// # Example
/// ```
/// use compass_heading::Accuracy;
///
/// assert_eq!(Accuracy::SensorAbsent.code(), -3);
/// assert_eq!(Accuracy::from_code(3), Some(Accuracy::HIGH));
/// assert_eq!(Accuracy::from_code(-1), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accuracy {
    /// The device has no rotation vector sensor
    SensorAbsent,
    /// The platform refused to register the sensor listener
    RegistrationFailed,
    /// Platform accuracy level (0 = unreliable .. 3 = high)
    Level(u8),
}

impl Accuracy {
    /// Readings cannot be trusted
    pub const UNRELIABLE: Accuracy = Accuracy::Level(0);
    /// Low accuracy, calibration advised
    pub const LOW: Accuracy = Accuracy::Level(1);
    /// Medium accuracy
    pub const MEDIUM: Accuracy = Accuracy::Level(2);
    /// Maximum accuracy
    pub const HIGH: Accuracy = Accuracy::Level(3);

    /// Sentinel code for a missing sensor
    pub const SENSOR_ABSENT_CODE: i32 = -3;
    /// Sentinel code for a refused registration
    pub const REGISTRATION_FAILED_CODE: i32 = -2;

    /// Integer code delivered to the host
    pub fn code(self) -> i32 {
        match self {
            Accuracy::SensorAbsent => Self::SENSOR_ABSENT_CODE,
            Accuracy::RegistrationFailed => Self::REGISTRATION_FAILED_CODE,
            Accuracy::Level(level) => i32::from(level),
        }
    }

    /// Decode a host integer; unknown negative codes are rejected
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            Self::SENSOR_ABSENT_CODE => Some(Accuracy::SensorAbsent),
            Self::REGISTRATION_FAILED_CODE => Some(Accuracy::RegistrationFailed),
            level => u8::try_from(level).ok().map(Accuracy::Level),
        }
    }

    /// True for the negative sentinels
    pub fn is_sentinel(self) -> bool {
        !matches!(self, Accuracy::Level(_))
    }
}

/// Reason the platform sensor could not be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFailure {
    /// No rotation vector sensor on this device
    Absent,
    /// Listener registration was refused
    RegistrationFailed,
}

impl SensorFailure {
    /// Accuracy sentinel reported for this failure
    pub fn accuracy(self) -> Accuracy {
        match self {
            SensorFailure::Absent => Accuracy::SensorAbsent,
            SensorFailure::RegistrationFailed => Accuracy::RegistrationFailed,
        }
    }
}

/// When the pipeline reports sample accuracy to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccuracyPolicy {
    /// Report the accuracy of the first processed sample of each activation
    #[default]
    OncePerSession,
    /// Report again whenever a processed sample carries a different accuracy
    /// than the one last reported
    OnChange,
}

/// Heading pipeline settings
///
/// # Example
/// ```
/// use compass_heading::{AccuracyPolicy, HeadingSettings};
///
/// let settings = HeadingSettings {
///     smoothing: 0.5,                          // smoother, slower
///     accuracy_policy: AccuracyPolicy::OnChange,
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingSettings {
    /// Low-pass filter alpha in (0, 1]
    ///
    /// Higher values follow the sensor more closely; lower values smooth
    /// more but lag behind real rotation.
    pub smoothing: f32,
    /// Accuracy reporting policy
    pub accuracy_policy: AccuracyPolicy,
}

impl HeadingSettings {
    /// Default low-pass alpha for rotation vector samples
    pub const DEFAULT_SMOOTHING: f32 = 0.96;
}

impl Default for HeadingSettings {
    fn default() -> Self {
        Self {
            smoothing: Self::DEFAULT_SMOOTHING,
            accuracy_policy: AccuracyPolicy::default(),
        }
    }
}
