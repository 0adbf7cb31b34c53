use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Training curve: `(frame, mean reward)` pairs recorded at each progress report.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub frames: Vec<usize>,
    pub mean_rewards: Vec<f32>,
}

#[derive(Serialize)]
struct CurveRecord {
    frame: usize,
    mean_reward: f32,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: usize, mean_reward: f32) {
        self.frames.push(frame);
        self.mean_rewards.push(mean_reward);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.frames.iter().copied().zip(self.mean_rewards.iter().copied())
    }

    /// Writes the curve as `frame,mean_reward` rows for an external plotter.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut wtr = WriterBuilder::new().has_headers(true).from_path(path)?;
        for (frame, mean_reward) in self.iter() {
            wtr.serialize(CurveRecord { frame, mean_reward })?;
        }
        wtr.flush()?;
        Ok(())
    }
}
