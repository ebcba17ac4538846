use std::path::Path;

use anyhow::Result;

use rusty_baseline::data::{write_parquet, MetadataColumn, MetadataValue, SpectralDataset};

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Slowly varying instrument background: a tilted parabola.
fn background(x: f64, lo: f64, hi: f64, level: f64) -> f64 {
    let t = (x - lo) / (hi - lo);
    level * (1.0 + 0.4 * t - 0.6 * (t - 0.5).powi(2))
}

fn generate_spectrum(
    wavelengths: &[f64],
    peaks: &[(f64, f64, f64)],
    level: f64,
    noise_level: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    let lo = wavelengths[0];
    let hi = wavelengths[wavelengths.len() - 1];
    wavelengths
        .iter()
        .map(|&wl| {
            let signal: f64 = peaks
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(wl, mu, sigma, amp))
                .sum();
            background(wl, lo, hi, level) + signal + rng.gauss(0.0, noise_level)
        })
        .collect()
}

/// Three spectrometer ranges with gaps between them, 0.2 nm sampling.
fn gapped_axis() -> Vec<f64> {
    [(240.0, 342.0), (382.0, 469.0), (492.0, 849.0)]
        .iter()
        .flat_map(|&(lo, hi)| {
            let n = ((hi - lo) / 0.2) as usize;
            (0..n).map(move |i| lo + 0.2 * i as f64)
        })
        .map(|w: f64| (w * 1000.0).round() / 1000.0)
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);
    let wavelengths = gapped_axis();

    // emission lines (centre nm, width nm, height) per target
    let targets: [(&str, Vec<(f64, f64, f64)>); 3] = [
        ("basalt", vec![(288.2, 0.3, 900.0), (393.4, 0.25, 1400.0), (656.3, 0.4, 700.0)]),
        ("gypsum", vec![(317.9, 0.3, 1100.0), (422.7, 0.3, 1600.0), (766.5, 0.35, 500.0)]),
        ("hematite", vec![(259.9, 0.2, 800.0), (404.6, 0.3, 900.0), (538.3, 0.3, 650.0)]),
    ];
    let distances = [1.5, 2.5, 4.0];
    let shots_per_distance = 3;

    let mut rows = Vec::new();
    let mut target_col = Vec::new();
    let mut distance_col = Vec::new();
    let mut shot_col = Vec::new();

    for (name, lines) in &targets {
        for &distance in &distances {
            // signal falls off with distance, background less so
            let scale = 2.5 / distance;
            let peaks: Vec<(f64, f64, f64)> = lines
                .iter()
                .map(|&(mu, sigma, amp)| (mu, sigma, amp * scale))
                .collect();
            for shot in 0..shots_per_distance {
                let level = 300.0 + 150.0 * scale.sqrt();
                rows.push(generate_spectrum(&wavelengths, &peaks, level, 4.0, &mut rng));
                target_col.push(MetadataValue::String(name.to_string()));
                distance_col.push(MetadataValue::Float(distance));
                shot_col.push(MetadataValue::Integer(shot));
            }
        }
    }

    let dataset = SpectralDataset::from_rows(wavelengths, &rows)?.with_metadata(vec![
        MetadataColumn::new("meta", "target", target_col),
        MetadataColumn::new("meta", "distance", distance_col),
        MetadataColumn::new("meta", "shot", shot_col),
    ])?;

    let output_path = Path::new("sample_data.parquet");
    write_parquet(output_path, &dataset)?;

    println!(
        "Wrote {} spectra ({} wavelengths each) to {}",
        dataset.len(),
        dataset.wavelengths.len(),
        output_path.display()
    );
    Ok(())
}
