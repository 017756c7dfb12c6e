//! Stage orchestration for one Winograd run.
//!
//! A [`RunContext`] owns the runtime, the four compiled stages and a pool of
//! device buffers. Each [`RunContext::run`] validates the problem, sizes and
//! uploads the buffers, binds and submits the stages in dependency order,
//! waits on the queue and reads `Y` back.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use ndarray::Array3;
use crate::error::{Result, WinogradError};
use crate::geometry::TileGeometry;
use crate::gpu::memory::{BufferPool, DeviceBuffers};
use crate::gpu::runtime::{AcceleratorRuntime, ComputeStage};
use crate::layout::{BufferLayout, BufferRole};
use crate::problem::Problem;
use crate::stage::{plan_stages, PipelineState, StageKind};
use crate::stats::WinogradStatistics;
use crate::transform;

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct RunResult {
    pub geometry: TileGeometry,
    /// Time from the first dispatch to the end of the finish barrier
    pub elapsed: Duration,
    pub statistics: WinogradStatistics,
    /// `Y[K][out_H][out_W]`
    pub output: Array3<f32>,
}

/// Per-context state for repeated runs on one device.
///
/// Runs take `&mut self`, so a context can never be driven by two runs at
/// once.
pub struct RunContext<R: AcceleratorRuntime> {
    runtime: R,
    stages: HashMap<StageKind, R::Stage>,
    pool: BufferPool<R::Buffer>,
    reuse_buffers: bool,
}

impl<R: AcceleratorRuntime> RunContext<R> {
    /// Compile the four stages from `source`
    pub fn new(runtime: R, source: &str) -> Result<Self> {
        let names: Vec<&str> = StageKind::ALL.iter().map(|kind| kind.name()).collect();
        let mut compiled = runtime.compile(source, &names)?;

        let mut stages = HashMap::new();
        for kind in StageKind::ALL {
            let stage = compiled.remove(kind.name()).ok_or_else(|| WinogradError::Compile {
                kernel: kind.name().to_string(),
                log: "runtime did not return the kernel".to_string(),
            })?;
            stages.insert(kind, stage);
        }
        log::info!("compiled {} stages", stages.len());

        Ok(Self {
            runtime,
            stages,
            pool: BufferPool::new(),
            reuse_buffers: true,
        })
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Keep buffers pooled between runs of the same shape
    pub fn set_reuse_buffers(&mut self, reuse: bool) {
        self.reuse_buffers = reuse;
        if !reuse {
            self.pool.clear();
        }
    }

    /// (allocated, reused) buffer sets so far
    pub fn pool_stats(&self) -> (usize, usize) {
        self.pool.stats()
    }

    /// Number of shapes whose buffers are currently pooled
    pub fn pooled_shapes(&self) -> usize {
        self.pool.len()
    }

    /// Bound the number of pooled shapes, evicting the oldest beyond it
    pub fn set_max_pooled_shapes(&mut self, max_shapes: usize) {
        self.pool.set_max_shapes(max_shapes);
    }

    /// Execute the full pipeline for `problem`.
    ///
    /// Shape, partition and capacity errors are raised before any device
    /// buffer is touched. A runtime failure aborts the run; its buffers are
    /// dropped rather than pooled since their contents are undefined.
    pub fn run(&mut self, problem: &Problem) -> Result<RunResult> {
        let shape = problem.shape();
        let geometry = TileGeometry::new(&shape)?;
        let plan = plan_stages(&shape, &geometry)?;
        let layout = BufferLayout::new(&shape, &geometry)?;
        layout.check_capacity(self.runtime.max_alloc_bytes())?;

        log::info!(
            "K={} C={} H={} W={}: {}x{} tiles, P={}, {} bytes on device",
            shape.k, shape.c, shape.h, shape.w,
            geometry.num_h_tiles, geometry.num_w_tiles, geometry.p,
            layout.total_bytes()
        );

        let buffers = self.pool.acquire(&self.runtime, &layout)?;
        let mut state = self.upload(problem, &buffers)?;

        let start = Instant::now();
        for spec in &plan {
            let stage = self.stages.get_mut(&spec.kind).ok_or_else(|| WinogradError::Compile {
                kernel: spec.kind.name().to_string(),
                log: "stage missing from context".to_string(),
            })?;
            stage.bind(&buffers.select(&spec.operands), &spec.scalars)?;
            log::debug!("dispatch {}: {}", spec.kind, spec.extent);
            self.runtime.enqueue(stage, &spec.extent)?;
            state = state.advance(spec.kind)?;
        }
        self.runtime.finish()?;
        let elapsed = start.elapsed();

        let mut y = vec![0.0f32; layout.elements(BufferRole::Y)];
        self.runtime.download(buffers.get(BufferRole::Y), &mut y)?;
        state = state.read_back()?;
        log::debug!("run finished in state {:?}", state);

        if self.reuse_buffers {
            self.pool.release(buffers);
        }

        let output = Array3::from_shape_vec((shape.k, geometry.out_h, geometry.out_w), y)
            .map_err(|e| WinogradError::dispatch("readback".to_string(), e.to_string()))?;

        Ok(RunResult {
            geometry,
            elapsed,
            statistics: WinogradStatistics::new(&shape, &geometry, elapsed),
            output,
        })
    }

    fn upload(&self, problem: &Problem, buffers: &DeviceBuffers<R::Buffer>) -> Result<PipelineState> {
        let uploads: [(BufferRole, &[f32]); 5] = [
            (BufferRole::Filters, problem.filter_slice()?),
            (BufferRole::Image, problem.image_slice()?),
            (BufferRole::G, &transform::G),
            (BufferRole::B, &transform::B),
            (BufferRole::A, &transform::A),
        ];
        for (role, data) in uploads {
            self.runtime.upload(buffers.get(role), data)?;
        }
        Ok(PipelineState::Uploaded)
    }
}
