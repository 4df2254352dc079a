use compass_heading::{Accuracy, DisplayRotation, GeomagneticModel, HeadingEvent, HeadingPipeline};
use nalgebra::Vector4;

const SAMPLE_PERIOD_MS: u64 = 20; // 50 Hz sensor
const LATITUDE: f64 = 40.0; // Boulder, CO
const LONGITUDE: f64 = -105.0;
const ALTITUDE_KM: f64 = 1.6;
const YEAR: f64 = 2022.5;

fn main() {
    let mut model = GeomagneticModel::new();
    let field = model.field(LATITUDE, LONGITUDE, YEAR, ALTITUDE_KM);
    println!(
        "Declination: {:.2}, Dip: {:.2}, Intensity: {:.0} nT",
        field.declination, field.dip, field.total_intensity
    );

    let pipeline = HeadingPipeline::new(|event: HeadingEvent| match event {
        HeadingEvent::Heading(degrees) => println!("Heading: {:.2}", degrees),
        HeadingEvent::AccuracyChanged(accuracy) => println!("Accuracy: {:?}", accuracy),
    });
    pipeline.set_location_at(LATITUDE, LONGITUDE, ALTITUDE_KM, YEAR);
    pipeline.start(100);

    for i in 0..36u64 {
        // this loop should repeat each time the rotation vector sensor reports
        let turn = (i as f32 * 10.0).to_radians() * 0.5;
        let rotation_vector = Vector4::new(0.0, 0.0, -turn.sin(), turn.cos()); // replace with actual sensor data

        pipeline.on_sample(rotation_vector, DisplayRotation::Rotation0, Accuracy::HIGH, i * SAMPLE_PERIOD_MS);
    }

    pipeline.stop();
}
