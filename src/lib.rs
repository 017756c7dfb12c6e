//! # winograd-cl - Winograd F(2,3) Convolution on OpenCL Accelerators
//!
//! Computes a valid 3x3 convolution of a multi-channel image with a bank of
//! filters using Winograd minimal filtering. Filters and 4x4 input patches are
//! moved into a transform domain where the convolution becomes an elementwise
//! product, and the product is transformed back into 2x2 output tiles.
//!
//! ## Pipeline
//!
//! 1. `filter_transform` - U = G g G^T for every (k, c) filter
//! 2. `data_transform` - V = B^T d B for every (c, tile) patch
//! 3. `calc_M` - M = sum over c of U ⊙ V for every (k, tile)
//! 4. `calc_Y` - Y = A^T M A, scattered into the output image
//!
//! Stages 1 and 2 are independent; 3 needs both; 4 needs 3.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use winograd_cl::gpu::HostRuntime;
//! use winograd_cl::gpu::constants::WINOGRAD_KERNELS;
//! use winograd_cl::pipeline::RunContext;
//!
//! let problem = winograd_cl::io::read_problem("input.txt")?;
//! let mut context = RunContext::new(HostRuntime::new(), WINOGRAD_KERNELS)?;
//! let result = context.run(&problem)?;
//! println!("{}", result.statistics);
//! winograd_cl::io::write_output("output.txt", &problem.shape(), &result.output)?;
//! # Ok::<(), winograd_cl::error::WinogradError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Pipeline configuration (JSON)
//! - [`error`] - Error types and result handling
//! - [`geometry`] - Tile counts and output extents
//! - [`gpu`] - Accelerator runtimes (host reference, OpenCL)
//! - [`io`] - Text input and output formats
//! - [`layout`] - Device buffer sizes and roles
//! - [`partition`] - Global/local work extents
//! - [`pipeline`] - Stage orchestration
//! - [`problem`] - Problem shape and host tensors
//! - [`reference`] - Direct convolution for verification
//! - [`stage`] - Stage binding contract and dependency state
//! - [`stats`] - Operation count and throughput
//! - [`transform`] - Fixed transform matrices

pub mod config;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod io;
pub mod layout;
pub mod partition;
pub mod pipeline;
pub mod problem;
pub mod reference;
pub mod stage;
pub mod stats;
pub mod transform;

pub use error::{Result, WinogradError};
pub use geometry::TileGeometry;
pub use pipeline::{RunContext, RunResult};
pub use problem::{Problem, ProblemShape};

#[cfg(test)]
mod tests;
