//! Per-window capacity limits and scoring, fixed when a window is created.

use std::fs::File;
use std::io::BufReader;
use std::mem;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::aligner::scoring::Scoring;
use crate::errors::PoaError;
use crate::graphs::NodeId;

/// Capacity ceilings of a single window
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowLimits {
    pub max_nodes: usize,
    pub max_out_edges: usize,
    pub max_in_edges: usize,
    pub max_aligned_nodes: usize,
    pub max_read_length: usize,
}

impl Default for WindowLimits {
    fn default() -> Self {
        Self {
            max_nodes: 1024,
            max_out_edges: 50,
            max_in_edges: 50,
            max_aligned_nodes: 50,
            max_read_length: 1024,
        }
    }
}

impl WindowLimits {
    pub fn validate(&self) -> Result<(), PoaError> {
        let named = [
            ("max_nodes", self.max_nodes),
            ("max_out_edges", self.max_out_edges),
            ("max_in_edges", self.max_in_edges),
            ("max_aligned_nodes", self.max_aligned_nodes),
            ("max_read_length", self.max_read_length),
        ];

        if let Some((name, _)) = named.iter().find(|(_, v)| *v == 0) {
            return Err(PoaError::InvalidConfig(format!("{name} should be larger than zero")));
        }

        if self.max_nodes > NodeId::MAX as usize {
            return Err(PoaError::InvalidConfig(
                format!("max_nodes ({}) does not fit the node id type", self.max_nodes)));
        }

        let per_node = self.max_out_edges.max(self.max_in_edges).max(self.max_aligned_nodes);
        let adjacency_bytes = self.max_nodes.checked_mul(per_node)
            .and_then(|slots| slots.checked_mul(mem::size_of::<NodeId>()));
        let matrix_bytes = self.max_read_length.checked_add(1)
            .and_then(|cols| cols.checked_mul(self.max_nodes + 1))
            .and_then(|cells| cells.checked_mul(mem::size_of::<i32>()));

        for (name, bytes) in [("adjacency", adjacency_bytes), ("score matrix", matrix_bytes)] {
            if bytes.map_or(true, |b| b > isize::MAX as usize) {
                return Err(PoaError::InvalidConfig(format!("{name} buffers for these limits are too large")));
            }
        }

        Ok(())
    }

    /// Longest possible alignment path, plus one step for the transient sums in the
    /// score recurrence
    fn max_path_steps(&self) -> u128 {
        self.max_nodes as u128 + self.max_read_length as u128 + 1
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub limits: WindowLimits,
    pub scoring: Scoring,
}

impl WindowConfig {
    pub fn new(limits: WindowLimits, scoring: Scoring) -> Self {
        Self { limits, scoring }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PoaError> {
        let reader = File::open(path).map(BufReader::new)?;
        let config: Self = serde_json::from_reader(reader)
            .map_err(|e| PoaError::InvalidConfig(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PoaError> {
        self.limits.validate()?;

        if self.scoring.match_score <= 0 {
            return Err(PoaError::InvalidConfig("match score should be positive".to_string()));
        }

        if self.scoring.mismatch_score > 0 || self.scoring.gap_score > 0 {
            return Err(PoaError::InvalidConfig("mismatch and gap scores can't be positive".to_string()));
        }

        // Every score matrix cell has to fit an i32
        let max_abs = [self.scoring.match_score, self.scoring.mismatch_score, self.scoring.gap_score]
            .into_iter()
            .map(i32::unsigned_abs)
            .max()
            .unwrap_or(0);

        if self.limits.max_path_steps() * max_abs as u128 > i32::MAX as u128 {
            return Err(PoaError::InvalidConfig(
                "scores are too large for the window limits, alignment scores would overflow".to_string()));
        }

        Ok(())
    }
}
