use approx::assert_relative_eq;
use compass_heading::{
    DisplayRotation, GeomagneticModel, RotationVector, VectorFilter, azimuth, normalize_degrees, true_heading,
};
use nalgebra::{Vector3, Vector4};
use rand::prelude::*;
use rand_pcg::Pcg64;

const SEED: u64 = 0x5eed_c0de;

fn random_unit_quaternion(rng: &mut Pcg64) -> Vector4<f32> {
    loop {
        let candidate = Vector4::new(
            rng.random_range(-1.0f32..1.0),
            rng.random_range(-1.0f32..1.0),
            rng.random_range(-1.0f32..1.0),
            rng.random_range(-1.0f32..1.0),
        );
        let norm = candidate.norm();
        if norm > 0.1 && norm <= 1.0 {
            return candidate / norm;
        }
    }
}

/// Azimuth is always within [0, 360) or NaN
#[test]
fn test_azimuth_range_for_random_vectors() {
    let mut rng = Pcg64::seed_from_u64(SEED);

    for _ in 0..2_000 {
        let samples: [RotationVector; 3] = [
            random_unit_quaternion(&mut rng).into(),
            random_unit_quaternion(&mut rng).xyz().into(),
            // arbitrary, not normalized readings
            Vector3::new(
                rng.random_range(-3.0f32..3.0),
                rng.random_range(-3.0f32..3.0),
                rng.random_range(-3.0f32..3.0),
            )
            .into(),
        ];

        for sample in samples {
            for rotation in DisplayRotation::ALL {
                let result = azimuth(&sample, rotation);
                assert!(
                    result.is_nan() || (0.0..360.0).contains(&result),
                    "{:?} {:?} gave {}",
                    sample,
                    rotation,
                    result
                );
            }
        }
    }
}

/// For a level device each display rotation adds its angle to the azimuth
#[test]
fn test_level_device_rotation_offsets() {
    let mut rng = Pcg64::seed_from_u64(SEED + 1);

    for _ in 0..500 {
        let half = rng.random_range(-90.0f32..90.0).to_radians() * 0.5;
        let sample = RotationVector::Xyzw(Vector4::new(0.0, 0.0, half.sin(), half.cos()));
        let base = azimuth(&sample, DisplayRotation::Rotation0);

        for rotation in DisplayRotation::ALL {
            let expected = normalize_degrees(base + rotation.degrees() as f32);
            let d = (azimuth(&sample, rotation) - expected).rem_euclid(360.0);
            assert!(d.min(360.0 - d) < 1e-2);
        }
    }
}

/// Repeated identical input converges monotonically in every component
#[test]
fn test_filter_converges_monotonically() {
    let mut rng = Pcg64::seed_from_u64(SEED + 2);

    for _ in 0..200 {
        let alpha = rng.random_range(0.05f32..0.95);
        let start = Vector3::new(
            rng.random_range(-1.0f32..1.0),
            rng.random_range(-1.0f32..1.0),
            rng.random_range(-1.0f32..1.0),
        );
        let target = Vector3::new(
            rng.random_range(-1.0f32..1.0),
            rng.random_range(-1.0f32..1.0),
            rng.random_range(-1.0f32..1.0),
        );

        let mut filter = VectorFilter::new(alpha);
        filter.update(start);
        let mut previous = (target - start).abs();
        for _ in 0..400 {
            let error = (target - *filter.update(target)).abs();
            for axis in 0..3 {
                assert!(error[axis] <= previous[axis]);
            }
            previous = error;
        }
        assert!(previous.max() < 1e-5, "alpha {} left error {}", alpha, previous.max());
    }
}

/// Declination is a pure function of its inputs, whatever the query order
#[test]
fn test_declination_is_pure() {
    let mut rng = Pcg64::seed_from_u64(SEED + 3);
    let mut shared = GeomagneticModel::new();

    let queries: Vec<(f64, f64, f64, f64)> = (0..300)
        .map(|_| {
            (
                rng.random_range(-89.0..89.0),
                rng.random_range(-180.0..180.0),
                rng.random_range(2020.0..2025.0),
                rng.random_range(0.0..20.0),
            )
        })
        .collect();

    for _ in 0..3 {
        for _ in 0..300 {
            let (lat, lon, year, alt) = *queries.choose(&mut rng).unwrap();
            // perturb one input at a time to exercise partial cache reuse
            match rng.random_range(0..4) {
                0 => shared.declination(lat + 1.0, lon, year, alt),
                1 => shared.declination(lat, lon + 1.0, year, alt),
                2 => shared.declination(lat, lon, year + 0.5, alt),
                _ => shared.declination(lat, lon, year, alt + 1.0),
            };

            let cached = shared.declination(lat, lon, year, alt);
            let fresh = GeomagneticModel::new().declination(lat, lon, year, alt);
            assert_eq!(cached.to_bits(), fresh.to_bits());
            assert!(cached > -180.0 && cached <= 180.0);
        }
    }
}

/// Field components are consistent with each other
#[test]
fn test_field_components_consistent() {
    let mut rng = Pcg64::seed_from_u64(SEED + 4);
    let mut model = GeomagneticModel::new();

    for _ in 0..500 {
        let field = model.field(
            rng.random_range(-90.0..=90.0),
            rng.random_range(-180.0..180.0),
            rng.random_range(2020.0..2025.0),
            rng.random_range(-1.0..100.0),
        );
        assert_relative_eq!(field.horizontal_intensity, field.north.hypot(field.east), max_relative = 1e-12);
        assert_relative_eq!(
            field.total_intensity,
            field.horizontal_intensity.hypot(field.vertical),
            max_relative = 1e-12
        );
        // the main field is between roughly 20 000 and 70 000 nT near the surface
        assert!(field.total_intensity > 15_000.0 && field.total_intensity < 70_000.0);
        assert!(field.dip.abs() <= 90.0);
    }
}

/// Heading normalization never leaves [0, 360)
#[test]
fn test_true_heading_range() {
    let mut rng = Pcg64::seed_from_u64(SEED + 5);

    for _ in 0..10_000 {
        let magnetic = rng.random_range(0.0f32..360.0);
        let declination = rng.random_range(-180.0f32..180.0);
        let heading = true_heading(magnetic, declination);
        assert!((0.0..360.0).contains(&heading), "{} + {} = {}", magnetic, declination, heading);
    }
}
