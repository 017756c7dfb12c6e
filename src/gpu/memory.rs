use std::collections::{HashMap, VecDeque};
use crate::error::{Result, WinogradError};
use crate::gpu::constants::DEFAULT_MAX_POOLED_SHAPES;
use crate::gpu::runtime::AcceleratorRuntime;
use crate::layout::{BufferLayout, BufferRole};
use crate::problem::ProblemShape;

/// The nine device buffers of one run, indexed by [`BufferRole`]
pub struct DeviceBuffers<B> {
    shape: ProblemShape,
    buffers: Vec<B>,
}

impl<B> DeviceBuffers<B> {
    /// Allocate every buffer in `layout`
    pub fn allocate<R>(runtime: &R, layout: &BufferLayout) -> Result<Self>
    where
        R: AcceleratorRuntime<Buffer = B>,
    {
        let buffers = layout
            .specs()
            .iter()
            .map(|spec| {
                log::debug!("allocating {} ({} bytes)", spec.role, spec.bytes);
                runtime.create_buffer(spec)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            shape: layout.shape(),
            buffers,
        })
    }

    pub fn shape(&self) -> ProblemShape {
        self.shape
    }

    pub fn get(&self, role: BufferRole) -> &B {
        &self.buffers[role.index()]
    }

    /// Buffers for `roles`, in the given order
    pub fn select(&self, roles: &[BufferRole]) -> Vec<&B> {
        roles.iter().map(|&role| self.get(role)).collect()
    }
}

/// Device buffer pool keyed by problem shape.
///
/// Buffers are only handed out again for an identical shape, so a layout is
/// never reused across differing dimensions. At most `max_shapes` sets are
/// retained; releasing beyond that drops the least recently released set.
pub struct BufferPool<B> {
    buffers: HashMap<ProblemShape, DeviceBuffers<B>>,
    /// Pooled shapes, least recently released first
    order: VecDeque<ProblemShape>,
    max_shapes: usize,
    allocated_count: usize,
    reused_count: usize,
    evicted_count: usize,
}

impl<B> BufferPool<B> {
    pub fn new() -> Self {
        Self::with_max_shapes(DEFAULT_MAX_POOLED_SHAPES)
    }

    /// Pool retaining buffers for at most `max_shapes` shapes
    pub fn with_max_shapes(max_shapes: usize) -> Self {
        Self {
            buffers: HashMap::new(),
            order: VecDeque::new(),
            max_shapes,
            allocated_count: 0,
            reused_count: 0,
            evicted_count: 0,
        }
    }

    /// Get buffers for `layout`, reusing a pooled set if the shape matches
    pub fn acquire<R>(&mut self, runtime: &R, layout: &BufferLayout) -> Result<DeviceBuffers<B>>
    where
        R: AcceleratorRuntime<Buffer = B>,
    {
        let shape = layout.shape();
        if let Some(buffers) = self.buffers.remove(&shape) {
            self.order.retain(|pooled| *pooled != shape);
            self.reused_count += 1;
            log::debug!("reusing pooled buffers for {:?}", shape);
            return Ok(buffers);
        }

        self.allocated_count += 1;
        DeviceBuffers::allocate(runtime, layout).map_err(|e| match e {
            WinogradError::Allocation { .. } => e,
            other => WinogradError::Allocation {
                buffer: "pool".to_string(),
                reason: other.to_string(),
            },
        })
    }

    /// Return buffers after a completed run, evicting the oldest set when full
    pub fn release(&mut self, buffers: DeviceBuffers<B>) {
        let shape = buffers.shape();
        self.order.retain(|pooled| *pooled != shape);
        if self.max_shapes == 0 {
            self.evicted_count += 1;
            return;
        }
        self.buffers.insert(shape, buffers);
        self.order.push_back(shape);
        self.evict_excess();
    }

    /// Change the retention bound, evicting the oldest sets beyond it
    pub fn set_max_shapes(&mut self, max_shapes: usize) {
        self.max_shapes = max_shapes;
        self.evict_excess();
    }

    fn evict_excess(&mut self) {
        while self.order.len() > self.max_shapes {
            if let Some(oldest) = self.order.pop_front() {
                self.buffers.remove(&oldest);
                self.evicted_count += 1;
                log::debug!("evicted pooled buffers for {:?}", oldest);
            }
        }
    }

    /// (allocated, reused)
    pub fn stats(&self) -> (usize, usize) {
        (self.allocated_count, self.reused_count)
    }

    /// Buffer sets dropped to stay within the retention bound
    pub fn evicted_count(&self) -> usize {
        self.evicted_count
    }

    pub fn max_shapes(&self) -> usize {
        self.max_shapes
    }

    /// Whether buffers for `shape` are pooled
    pub fn contains(&self, shape: &ProblemShape) -> bool {
        self.buffers.contains_key(shape)
    }

    /// Number of shapes currently pooled
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Clear all buffers
    pub fn clear(&mut self) {
        self.buffers.clear();
        self.order.clear();
        self.allocated_count = 0;
        self.reused_count = 0;
        self.evicted_count = 0;
    }
}

impl<B> Default for BufferPool<B> {
    fn default() -> Self {
        Self::new()
    }
}
