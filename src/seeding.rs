use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::env::Environment;
use crate::error::Result;

/// Independent RNG streams owned by the agent, all derived from one seed.
#[derive(Clone, Debug)]
pub struct SeededRngs {
    /// Exploration draws and replay sampling.
    pub numeric: StdRng,
    /// Approximator weight initialisation.
    pub init: StdRng,
}

/// Seeds every random stream a training run touches from a single value.
///
/// Fans out to the numeric RNG, the approximator-initialisation RNG, the
/// environment's own RNG (through a seeded reset) and the environment's
/// action and observation spaces.
pub fn seed_all<E: Environment>(seed: u64, env: &mut E) -> Result<SeededRngs> {
    env.reset(Some(seed))?;
    env.action_space_mut().seed(seed);
    env.observation_space_mut().seed(seed);
    debug!("Seeded numeric, init, environment and space RNGs with {}", seed);

    Ok(SeededRngs {
        numeric: StdRng::seed_from_u64(seed),
        init: StdRng::seed_from_u64(seed),
    })
}
