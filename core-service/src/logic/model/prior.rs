//! Synthetic training prior
//!
//! Used while the catalog is too small to describe "normal". Sizes are a
//! mix of three log-normal populations (ordinary, large, very large).
//! Hours lean toward business hours with a uniform minority.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::logic::types::FeaturePoint;

/// (mu, sigma, count) of each size population, in ln(bytes)
const SIZE_POPULATIONS: [(f64, f64, usize); 3] = [
    (15.0, 2.0, 80),  // ordinary: KB to a few MB
    (16.5, 1.5, 15),  // large: ~5-15 MB
    (18.0, 1.0, 5),   // very large: 20 MB+
];

const BUSINESS_HOURS: std::ops::RangeInclusive<u32> = 8..=18;
const BUSINESS_HOUR_SAMPLES: usize = 85;
const ANY_HOUR_SAMPLES: usize = 15;

/// Standard normal draw (Box-Muller)
fn standard_normal(rng: &mut StdRng) -> f64 {
    // 1 - [0, 1) keeps ln away from zero
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn log_normal(rng: &mut StdRng, mu: f64, sigma: f64) -> f64 {
    (mu + sigma * standard_normal(rng)).exp()
}

/// Generate the prior. Same seed, same points.
pub fn synthetic_prior(seed: u64) -> Vec<FeaturePoint> {
    let mut rng = StdRng::seed_from_u64(seed);

    let sizes: Vec<u64> = SIZE_POPULATIONS
        .iter()
        .flat_map(|&(mu, sigma, count)| {
            (0..count)
                .map(|_| log_normal(&mut rng, mu, sigma).round() as u64)
                .collect::<Vec<_>>()
        })
        .collect();

    let mut hours: Vec<u32> = (0..BUSINESS_HOUR_SAMPLES)
        .map(|_| rng.gen_range(BUSINESS_HOURS))
        .collect();
    hours.extend((0..ANY_HOUR_SAMPLES).map(|_| rng.gen_range(0..24)));

    sizes
        .into_iter()
        .zip(hours)
        .map(|(size, hour)| FeaturePoint::new(size, hour))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prior_shape() {
        let points = synthetic_prior(42);
        assert_eq!(points.len(), 100);
        assert!(points.iter().all(|p| p.hour < 24));

        let business = points[..BUSINESS_HOUR_SAMPLES]
            .iter()
            .filter(|p| BUSINESS_HOURS.contains(&p.hour))
            .count();
        assert_eq!(business, BUSINESS_HOUR_SAMPLES);
    }

    #[test]
    fn test_uniform_hours_follow_business_hours() {
        let points = synthetic_prior(42);
        assert_eq!(points[BUSINESS_HOUR_SAMPLES..].len(), ANY_HOUR_SAMPLES);
        assert!(points[BUSINESS_HOUR_SAMPLES..].iter().all(|p| p.hour < 24));
    }

    #[test]
    fn test_prior_is_reproducible() {
        assert_eq!(synthetic_prior(7), synthetic_prior(7));
    }

    #[test]
    fn test_very_large_population_is_larger() {
        let points = synthetic_prior(42);
        let mean_ln = |slice: &[FeaturePoint]| {
            slice.iter().map(|p| (p.size_bytes.max(1) as f64).ln()).sum::<f64>() / slice.len() as f64
        };
        assert!(mean_ln(&points[95..]) > mean_ln(&points[..80]));
    }
}
