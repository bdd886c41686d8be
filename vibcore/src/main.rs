use nalgebra::DMatrix;

use vibcore::algorithm::baseline::BaselineParams;
use vibcore::data::spectrum::Spectrum;
use vibcore::error::VibError;

/// Demo: synthesize a kinetic Raman run (a band at 1000 cm^-1 decaying
/// over five frames on a tilted background), then baseline-correct,
/// integrate the band and print the conversion trend.
fn main() -> Result<(), VibError> {
    env_logger::init();

    let n = 201;
    let frames = 5;
    let abscissa: Vec<f64> = (0..n).map(|i| 800.0 + 2.0 * i as f64).collect();

    let mut data = Vec::with_capacity(n * frames);
    for t in 0..frames {
        let scale = 1.0 - t as f64 / 5.0;
        for &x in &abscissa {
            let band = scale * (-((x - 1000.0) / 15.0).powi(2)).exp();
            let background = 0.002 * (x - 800.0) + 0.1;
            data.push(band + background);
        }
    }
    let intensity = DMatrix::from_vec(n, frames, data);
    let timestamps: Vec<f64> = (0..frames).map(|t| 30.0 * t as f64).collect();

    let mut spectrum = Spectrum::raman(abscissa, intensity, timestamps, "demo_run")?;
    println!("{spectrum}");

    // Straight baseline matching the synthetic background tilt.
    let angle = 0.002_f64.atan().to_degrees();
    spectrum.baseline(BaselineParams::new(0.0, angle, 0.1))?;
    spectrum.integrate(950.0, 1050.0)?;

    for (t, conversion) in spectrum.conversion_trace()? {
        println!("t = {t:6.1} s   conversion = {conversion:.3}");
    }
    Ok(())
}
