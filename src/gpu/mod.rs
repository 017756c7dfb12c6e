//! Accelerator support for the Winograd pipeline
//!
//! This module provides the runtime abstraction the pipeline dispatches
//! through, a host reference runtime that is always available, and an
//! OpenCL runtime behind the `gpu` feature.

pub mod constants;
pub mod host_backend;
pub mod memory;
pub mod runtime;

#[cfg(feature = "gpu")]
pub mod backend;

pub use host_backend::{DispatchRecord, HostBuffer, HostRuntime, HostStage};
pub use memory::{BufferPool, DeviceBuffers};
pub use runtime::{AcceleratorRuntime, ComputeStage, DeviceType};

#[cfg(feature = "gpu")]
pub use backend::{OclRuntime, OclStage};
