//! Heading pipeline: rate gate, smoothing, resolution and event emission
//!
//! The pipeline is the only part of the crate that produces events. Sensor
//! samples and location updates may arrive from different threads; the
//! sensor-side state and the geomagnetic model sit behind separate locks so a
//! slow declination query never holds up sample processing for longer than
//! the final store.

use crate::filter::VectorFilter;
use crate::geomag::{GeomagneticModel, current_decimal_year};
use crate::math::normalize_degrees;
use crate::orientation::{RotationVector, azimuth};
use crate::types::{Accuracy, AccuracyPolicy, DisplayRotation, HeadingSettings, SensorFailure};
use log::{debug, trace, warn};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Event delivered to the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeadingEvent {
    /// True heading in degrees within `[0, 360)`, or the magnetic azimuth
    /// while no declination is known
    Heading(f32),
    /// Sensor accuracy level or failure sentinel
    AccuracyChanged(Accuracy),
}

/// Receiver of pipeline events
///
/// Implemented for any `Fn(HeadingEvent) + Send + Sync`. Events are emitted
/// after the pipeline's internal locks have been released, so a sink may call
/// back into the pipeline.
pub trait HeadingSink {
    fn emit(&self, event: HeadingEvent);
}

impl<F> HeadingSink for F
where
    F: Fn(HeadingEvent) + Send + Sync,
{
    fn emit(&self, event: HeadingEvent) {
        self(event)
    }
}

/// Combine a magnetic azimuth with declination
///
/// A declination of exactly zero means "unknown" and passes the magnetic
/// azimuth through untouched.
///
/// # Example
/// ```
/// use compass_heading::true_heading;
///
/// assert_eq!(true_heading(350.0, 20.0), 10.0);
/// assert_eq!(true_heading(10.0, -20.0), 350.0);
/// ```
pub fn true_heading(magnetic_azimuth: f32, declination: f32) -> f32 {
    if declination != 0.0 {
        normalize_degrees(magnetic_azimuth + declination)
    } else {
        magnetic_azimuth
    }
}

/// Per-activation state, dropped on stop
#[derive(Debug)]
struct Session {
    rate_ms: u64,
    last_emission: Option<u64>,
    /// Last accuracy sent to the host; `None` until the first report
    reported_accuracy: Option<Accuracy>,
    filter: VectorFilter,
}

impl Session {
    fn new(rate_ms: u64, smoothing: f32) -> Self {
        Self {
            rate_ms,
            last_emission: None,
            reported_accuracy: None,
            filter: VectorFilter::new(smoothing),
        }
    }

    /// Claim the emission slot for `now_ms`, or `false` if the rate gate is closed
    fn pass_rate_gate(&mut self, now_ms: u64) -> bool {
        let rate_ms = self.rate_ms;
        if self
            .last_emission
            .is_some_and(|last| now_ms.saturating_sub(last) < rate_ms)
        {
            return false;
        }
        self.last_emission = Some(now_ms);
        true
    }

    /// Record and return `accuracy` if the policy says it should be reported
    fn take_accuracy_report(&mut self, policy: AccuracyPolicy, accuracy: Accuracy) -> Option<Accuracy> {
        let due = match (policy, self.reported_accuracy) {
            (_, None) => true,
            (AccuracyPolicy::OncePerSession, Some(_)) => false,
            (AccuracyPolicy::OnChange, Some(previous)) => previous != accuracy,
        };
        if due {
            self.reported_accuracy = Some(accuracy);
        }
        due.then_some(accuracy)
    }

    fn heading(&mut self, raw: RotationVector, display_rotation: DisplayRotation, declination: f32) -> Option<f32> {
        if raw.is_degenerate() {
            debug!("Dropping degenerate rotation vector {:?}", raw);
            return None;
        }

        let smoothed = RotationVector::Xyz(*self.filter.update(raw.canonical_xyz()));
        let magnetic = azimuth(&smoothed, display_rotation);
        if magnetic.is_nan() {
            debug!("Rotation vector {:?} resolved to NaN azimuth", smoothed);
            return None;
        }

        Some(true_heading(magnetic, declination))
    }
}

#[derive(Debug, Default)]
struct PipelineState {
    /// Degrees, east positive; zero until a location is known
    declination: f32,
    session: Option<Session>,
}

/// True heading pipeline
///
/// Starts Stopped. While Active, every sample that passes the rate gate is
/// smoothed, resolved into a magnetic azimuth and corrected by the last
/// declination supplied through [`set_location`](Self::set_location).
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use nalgebra::Vector3;
/// use compass_heading::{Accuracy, DisplayRotation, HeadingEvent, HeadingPipeline};
///
/// let events = Arc::new(Mutex::new(Vec::new()));
/// let sink = {
///     let events = Arc::clone(&events);
///     move |event: HeadingEvent| events.lock().unwrap().push(event)
/// };
///
/// let pipeline = HeadingPipeline::new(sink);
/// pipeline.start(100);
/// pipeline.on_sample(Vector3::<f32>::zeros(), DisplayRotation::Rotation0, Accuracy::HIGH, 0);
///
/// assert_eq!(
///     *events.lock().unwrap(),
///     vec![HeadingEvent::AccuracyChanged(Accuracy::HIGH), HeadingEvent::Heading(0.0)]
/// );
/// ```
pub struct HeadingPipeline<S> {
    sink: S,
    settings: HeadingSettings,
    state: Mutex<PipelineState>,
    model: Mutex<GeomagneticModel>,
}

impl<S: HeadingSink> HeadingPipeline<S> {
    /// Pipeline with default settings and the embedded geomagnetic model
    pub fn new(sink: S) -> Self {
        Self::with_settings(sink, HeadingSettings::default())
    }

    /// Pipeline with custom settings and the embedded geomagnetic model
    pub fn with_settings(sink: S, settings: HeadingSettings) -> Self {
        Self::with_model(sink, settings, GeomagneticModel::new())
    }

    /// Pipeline with custom settings and model
    pub fn with_model(sink: S, settings: HeadingSettings, model: GeomagneticModel) -> Self {
        Self {
            sink,
            settings,
            state: Mutex::new(PipelineState::default()),
            model: Mutex::new(model),
        }
    }

    /// Begin a session emitting at most one heading per `rate_ms`
    ///
    /// Starting an active pipeline restarts the session: the filter, rate
    /// gate and accuracy bookkeeping are reset and the new rate applies.
    pub fn start(&self, rate_ms: u64) {
        let mut state = self.lock_state();
        if state.session.is_some() {
            debug!("Restarting heading session at {} ms", rate_ms);
        } else {
            debug!("Starting heading session at {} ms", rate_ms);
        }
        state.session = Some(Session::new(rate_ms, self.settings.smoothing));
    }

    /// End the session; samples are ignored until the next `start`
    ///
    /// The last declination is kept.
    pub fn stop(&self) {
        if self.lock_state().session.take().is_some() {
            debug!("Heading session stopped");
        }
    }

    /// Whether a session is running
    pub fn is_active(&self) -> bool {
        self.lock_state().session.is_some()
    }

    /// Declination currently applied, in degrees
    pub fn declination(&self) -> f32 {
        self.lock_state().declination
    }

    /// The event sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Process one raw rotation vector sample
    ///
    /// # Arguments
    /// * `raw` - Rotation vector reading (3 or 4 components)
    /// * `display_rotation` - Current screen rotation
    /// * `accuracy` - Accuracy the platform attached to this sample
    /// * `now_ms` - Monotonic timestamp in milliseconds
    ///
    /// Ignored while stopped. Samples arriving within `rate_ms` of the last
    /// processed one are dropped before they reach the filter. A degenerate
    /// sample or NaN azimuth suppresses this cycle's heading but still uses
    /// up the emission slot.
    pub fn on_sample(
        &self,
        raw: impl Into<RotationVector>,
        display_rotation: DisplayRotation,
        accuracy: Accuracy,
        now_ms: u64,
    ) {
        let (accuracy_report, heading) = {
            let mut state = self.lock_state();
            let declination = state.declination;
            let Some(session) = state.session.as_mut() else {
                trace!("Sample at {} ms ignored while stopped", now_ms);
                return;
            };
            if !session.pass_rate_gate(now_ms) {
                return;
            }

            let accuracy_report = session.take_accuracy_report(self.settings.accuracy_policy, accuracy);
            let heading = session.heading(raw.into(), display_rotation, declination);
            (accuracy_report, heading)
        };

        if let Some(accuracy) = accuracy_report {
            self.sink.emit(HeadingEvent::AccuracyChanged(accuracy));
        }
        if let Some(heading) = heading {
            self.sink.emit(HeadingEvent::Heading(heading));
        }
    }

    /// Forward a platform accuracy change while active
    pub fn on_accuracy_changed(&self, accuracy: Accuracy) {
        {
            let mut state = self.lock_state();
            let Some(session) = state.session.as_mut() else {
                return;
            };
            if self.settings.accuracy_policy == AccuracyPolicy::OnChange {
                session.reported_accuracy = Some(accuracy);
            }
        }
        self.sink.emit(HeadingEvent::AccuracyChanged(accuracy));
    }

    /// Report that the platform sensor cannot be used
    ///
    /// Emits the matching sentinel accuracy and leaves the pipeline stopped.
    pub fn sensor_unavailable(&self, failure: SensorFailure) {
        warn!("Rotation vector sensor unavailable: {:?}", failure);
        self.lock_state().session = None;
        self.sink.emit(HeadingEvent::AccuracyChanged(failure.accuracy()));
    }

    /// Report accuracy again with the next processed sample
    pub fn rearm_accuracy(&self) {
        if let Some(session) = self.lock_state().session.as_mut() {
            session.reported_accuracy = None;
        }
    }

    /// Update declination for a new location using today's UTC date
    pub fn set_location(&self, latitude: f64, longitude: f64, altitude_km: f64) {
        self.set_location_at(latitude, longitude, altitude_km, current_decimal_year());
    }

    /// Update declination for a new location at an explicit decimal year
    ///
    /// Takes effect from the next sample; emits nothing. A location that
    /// yields a non-finite declination is ignored.
    ///
    /// The model lock is held until the declination is stored, so concurrent
    /// updates land in the order they queried the model.
    pub fn set_location_at(&self, latitude: f64, longitude: f64, altitude_km: f64, year: f64) {
        let mut model = self.model.lock().unwrap_or_else(PoisonError::into_inner);
        let declination = model.declination(latitude, longitude, year, altitude_km);

        if !declination.is_finite() {
            debug!(
                "Ignoring location ({}, {}, {} km) with declination {}",
                latitude, longitude, altitude_km, declination
            );
            return;
        }

        trace!(
            "Declination {:.3}° at ({}, {}, {} km) for {:.3}",
            declination, latitude, longitude, altitude_km, year
        );
        self.lock_state().declination = declination as f32;
        drop(model);
    }

    fn lock_state(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
