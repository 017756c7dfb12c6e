//! Work partitioning for stage dispatches.
//!
//! The global extent of each axis is rounded up to a multiple of the stage's
//! work-group extent. Rounding only guarantees coverage; work items past the
//! true extent still run and the stage body has to discard them.

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::error::{Result, WinogradError};

/// Smallest multiple of `group` that is greater than or equal to `extent`.
pub fn round_up(extent: usize, group: usize) -> Result<usize> {
    if group == 0 {
        return Err(WinogradError::InvalidPartition { extent, group });
    }
    match extent % group {
        0 => Ok(extent),
        rem => Ok(extent + (group - rem)),
    }
}

/// Number of dimensions for a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkDimension {
    Two,
    Three,
}

impl WorkDimension {
    pub fn ndim(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

impl fmt::Display for WorkDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D", self.ndim())
    }
}

/// Global and local extents for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkExtent {
    dimension: WorkDimension,
    /// Extent the stage actually needs per axis
    useful: Vec<usize>,
    global: Vec<usize>,
    local: Vec<usize>,
}

impl WorkExtent {
    /// Partition `useful` into groups of `local`, rounding every axis up.
    pub fn new(useful: &[usize], local: &[usize]) -> Result<Self> {
        let dimension = match (useful.len(), local.len()) {
            (2, 2) => WorkDimension::Two,
            (3, 3) => WorkDimension::Three,
            (u, l) => {
                return Err(WinogradError::dispatch(
                    "partition".to_string(),
                    format!("unsupported dimensionality: {} extents with {} group sizes", u, l),
                ))
            }
        };

        let global = useful
            .iter()
            .zip(local)
            .map(|(&extent, &group)| round_up(extent, group))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            dimension,
            useful: useful.to_vec(),
            global,
            local: local.to_vec(),
        })
    }

    pub fn dimension(&self) -> WorkDimension {
        self.dimension
    }

    pub fn global(&self) -> &[usize] {
        &self.global
    }

    pub fn local(&self) -> &[usize] {
        &self.local
    }

    pub fn useful(&self) -> &[usize] {
        &self.useful
    }

    /// Work items the device will launch
    pub fn total_work_items(&self) -> usize {
        self.global.iter().product()
    }

    /// Work items that map onto real data
    pub fn useful_work_items(&self) -> usize {
        self.useful.iter().product()
    }

    pub fn work_groups(&self) -> usize {
        self.global
            .iter()
            .zip(&self.local)
            .map(|(g, l)| g / l)
            .product()
    }

    /// Ratio of useful to launched work items, in (0, 1]
    pub fn efficiency(&self) -> f64 {
        let total = self.total_work_items();
        if total == 0 {
            return 0.0;
        }
        self.useful_work_items() as f64 / total as f64
    }
}

impl fmt::Display for WorkExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} global={:?} local={:?} ({:.1}% useful)",
            self.dimension,
            self.global,
            self.local,
            self.efficiency() * 100.0
        )
    }
}
