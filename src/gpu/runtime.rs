//! Accelerator runtime abstraction.
//!
//! The pipeline only talks to a device through these two traits, so the
//! OpenCL backend and the host reference backend are interchangeable.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::layout::BufferSpec;
use crate::partition::WorkExtent;

/// Supported device types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    Host,
    Cpu,
    IntelGpu,
    NvidiaGpu,
    AmdGpu,
    Gpu,
}

/// A compiled stage that can be bound to operands and dispatched.
pub trait ComputeStage {
    type Buffer;

    /// Kernel name the stage was compiled from
    fn name(&self) -> &str;

    /// Bind buffer operands followed by scalar parameters, by position
    fn bind(&mut self, operands: &[&Self::Buffer], scalars: &[i32]) -> Result<()>;
}

/// Device, queue and program services used by the pipeline.
///
/// All work is submitted to a single in-order queue.
pub trait AcceleratorRuntime {
    type Buffer;
    type Stage: ComputeStage<Buffer = Self::Buffer>;

    fn device_type(&self) -> DeviceType;

    /// Human-readable device description
    fn device_info(&self) -> Result<String>;

    /// Largest single allocation the device accepts, if known
    fn max_alloc_bytes(&self) -> Option<u64>;

    fn create_buffer(&self, spec: &BufferSpec) -> Result<Self::Buffer>;

    /// Blocking host-to-device copy
    fn upload(&self, buffer: &Self::Buffer, data: &[f32]) -> Result<()>;

    /// Build `source` and look up every kernel in `names`
    fn compile(&self, source: &str, names: &[&str]) -> Result<HashMap<String, Self::Stage>>;

    /// Submit a bound stage to the queue
    fn enqueue(&self, stage: &Self::Stage, extent: &WorkExtent) -> Result<()>;

    /// Block until every submitted stage has completed
    fn finish(&self) -> Result<()>;

    /// Blocking device-to-host copy
    fn download(&self, buffer: &Self::Buffer, out: &mut [f32]) -> Result<()>;
}
