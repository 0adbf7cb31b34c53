use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Actions `0..n`, with its own sampling RNG.
#[derive(Clone, Debug)]
pub struct Discrete {
    n: usize,
    rng: StdRng,
}

impl Discrete {
    pub fn new(n: usize) -> Self {
        Discrete {
            n,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Uniformly random valid action.
    pub fn sample(&mut self) -> usize {
        self.rng.gen_range(0..self.n)
    }

    pub fn contains(&self, action: usize) -> bool {
        action < self.n
    }
}

/// Box of `f32` vectors bounded elementwise by `low` and `high`.
///
/// Infinite bounds are allowed; sampling draws from a standard normal on
/// dimensions that are unbounded on both sides, and from a half-normal
/// offset from the finite bound on dimensions bounded on one side.
#[derive(Clone, Debug)]
pub struct BoxSpace {
    low: Array1<f32>,
    high: Array1<f32>,
    rng: StdRng,
}

impl BoxSpace {
    pub fn new(low: Array1<f32>, high: Array1<f32>) -> Self {
        assert_eq!(low.len(), high.len(), "box bounds must have the same length");
        BoxSpace {
            low,
            high,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn shape(&self) -> usize {
        self.low.len()
    }

    pub fn low(&self) -> &Array1<f32> {
        &self.low
    }

    pub fn high(&self) -> &Array1<f32> {
        &self.high
    }

    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn sample(&mut self) -> Array1<f32> {
        let rng = &mut self.rng;
        self.low
            .iter()
            .zip(self.high.iter())
            .map(|(&low, &high)| {
                let normal: f32 = rng.sample(StandardNormal);
                match (low.is_finite(), high.is_finite()) {
                    (true, true) => rng.gen_range(low..=high),
                    (true, false) => low + normal.abs(),
                    (false, true) => high - normal.abs(),
                    (false, false) => normal,
                }
            })
            .collect()
    }

    pub fn contains(&self, value: &Array1<f32>) -> bool {
        value.len() == self.low.len()
            && value
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(&v, (&low, &high))| v >= low && v <= high)
    }
}
