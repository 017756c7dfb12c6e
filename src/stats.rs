//! Operation count and throughput for a Winograd run.

use std::fmt;
use std::time::Duration;
use crate::geometry::TileGeometry;
use crate::problem::ProblemShape;

/// Floating-point operations for one F(2,3) run.
///
/// Filter transform `K·C·60`, data transform `C·P·112`, elementwise
/// multiply-accumulate over C channels `16·K·P·(2C−1)`, inverse transform
/// `K·P·112`. With no channels the accumulate term is zero.
pub fn winograd_flop_count(k: u64, c: u64, p: u64) -> u64 {
    k * c * 60 + c * p * 112 + 16 * k * p * (2 * c).saturating_sub(1) + k * p * 112
}

/// Timing and throughput of one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WinogradStatistics {
    pub flop: u64,
    pub elapsed: Duration,
}

impl WinogradStatistics {
    pub fn new(shape: &ProblemShape, geometry: &TileGeometry, elapsed: Duration) -> Self {
        Self::from_counts(shape.k, shape.c, geometry.p, elapsed)
    }

    pub fn from_counts(k: usize, c: usize, p: usize, elapsed: Duration) -> Self {
        Self {
            flop: winograd_flop_count(k as u64, c as u64, p as u64),
            elapsed,
        }
    }

    pub fn seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// flop / (1024² · seconds)
    pub fn mflops(&self) -> f64 {
        self.flop as f64 / (1024.0 * 1024.0 * self.seconds())
    }
}

impl fmt::Display for WinogradStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Floating point operations: {}", self.flop)?;
        writeln!(f, "Time Elapsed: {}", self.seconds())?;
        write!(f, "MFlop/s: {}", self.mflops())
    }
}
