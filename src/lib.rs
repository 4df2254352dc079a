//! Compass Heading - true heading from a device rotation vector sensor
//!
//! This library turns the raw output of a platform rotation vector sensor into
//! a true compass heading (degrees clockwise from geographic north). Samples
//! are smoothed with an exponential low-pass filter, resolved into a magnetic
//! azimuth relative to the top of the screen, and corrected for local magnetic
//! declination computed from the World Magnetic Model.
//!
//! # Features
//!
//! - Exponential low-pass smoothing of sensor vectors
//! - Rotation vector to azimuth conversion with display rotation remapping
//! - Embedded WMM-2020 coefficients plus a `WMM.COF` parser
//! - Declination, dip and intensity from a degree 12 spherical harmonic model
//! - Rate-limited heading pipeline with accuracy reporting, safe to drive from
//!   a sensor thread and a location thread at once
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use nalgebra::Vector4;
//! use compass_heading::{Accuracy, DisplayRotation, HeadingEvent, HeadingPipeline};
//!
//! let headings = Arc::new(Mutex::new(Vec::new()));
//! let sink = {
//!     let headings = Arc::clone(&headings);
//!     move |event: HeadingEvent| {
//!         if let HeadingEvent::Heading(degrees) = event {
//!             headings.lock().unwrap().push(degrees);
//!         }
//!     }
//! };
//!
//! let pipeline = HeadingPipeline::new(sink);
//! pipeline.set_location_at(40.0, -105.0, 1.6, 2022.5); // Boulder, CO
//! pipeline.start(50);
//!
//! // Device lying flat with its top edge toward magnetic north
//! let level = Vector4::new(0.0f32, 0.0, 0.0, 1.0);
//! pipeline.on_sample(level, DisplayRotation::Rotation0, Accuracy::HIGH, 0);
//!
//! let heading = headings.lock().unwrap()[0];
//! assert!((heading - 7.8).abs() < 0.1); // magnetic north is ~7.8° east of true north
//! ```

mod axes;
pub mod compass;
mod error;
mod filter;
pub mod geomag;
mod math;
mod orientation;
mod pipeline;
mod types;

// Re-export all public types and functions
pub use axes::{Axis, AxisRemap, remap_axes};
pub use error::{CoefficientError, CoefficientResult};
pub use filter::VectorFilter;
pub use geomag::{
    CofFile, CofText, CoefficientSource, CoefficientTable, EmbeddedCoefficients, GaussCoefficient,
    GeomagneticField, GeomagneticModel, current_decimal_year, decimal_year,
};
pub use math::{DEG_TO_RAD, RAD_TO_DEG, Vector3Ext, normalize_degrees};
pub use orientation::{RotationVector, azimuth, azimuth_with_remap, orientation_angles, rotation_matrix};
pub use pipeline::{HeadingEvent, HeadingPipeline, HeadingSink, true_heading};
pub use types::*;
