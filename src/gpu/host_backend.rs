//! Host reference runtime.
//!
//! Executes the stage contract on the CPU, one work item at a time over the
//! full rounded-up global extent, so the padding items a device would launch
//! are exercised and discarded here too. Used when no OpenCL device is
//! available and as the reference the device kernels are checked against.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use crate::error::{Result, WinogradError};
use crate::geometry::{OUTPUT_TILE, TILE_ELEMENTS, FILTER_SIZE, ALPHA};
use crate::gpu::runtime::{AcceleratorRuntime, ComputeStage, DeviceType};
use crate::layout::{AccessMode, BufferSpec};
use crate::partition::{WorkDimension, WorkExtent};
use crate::stage::StageKind;
use crate::transform;

/// Host-memory buffer handle. Clones share the same storage.
#[derive(Debug, Clone)]
pub struct HostBuffer {
    data: Rc<RefCell<Vec<f32>>>,
    access: AccessMode,
}

impl HostBuffer {
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn access(&self) -> AccessMode {
        self.access
    }

    /// Copy of the current contents
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.borrow().clone()
    }

    /// Whether two handles refer to the same storage
    pub fn same_storage(&self, other: &HostBuffer) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

/// One submitted dispatch, as recorded by [`HostRuntime`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRecord {
    pub stage: String,
    pub global: Vec<usize>,
    pub local: Vec<usize>,
}

/// A stage executed on the host
#[derive(Debug, Clone)]
pub struct HostStage {
    kind: StageKind,
    operands: Vec<HostBuffer>,
    scalars: Vec<i32>,
}

impl HostStage {
    fn new(kind: StageKind) -> Self {
        Self {
            kind,
            operands: Vec::new(),
            scalars: Vec::new(),
        }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    fn scalar_args<const N: usize>(&self) -> Result<[usize; N]> {
        if self.scalars.len() != N {
            return Err(self.error(format!("expected {} scalar arguments, {} bound", N, self.scalars.len())));
        }
        let mut args = [0usize; N];
        for (slot, &value) in args.iter_mut().zip(&self.scalars) {
            *slot = usize::try_from(value)
                .map_err(|_| self.error(format!("negative scalar argument {}", value)))?;
        }
        Ok(args)
    }

    fn error(&self, reason: String) -> WinogradError {
        WinogradError::Dispatch {
            operation: format!("enqueue {}", self.kind.name()),
            reason,
        }
    }

    fn check_len(&self, position: usize, needed: usize) -> Result<()> {
        let len = self.operands[position].len();
        if len < needed {
            return Err(self.error(format!(
                "operand {} holds {} elements, stage needs {}",
                position, len, needed
            )));
        }
        Ok(())
    }

    /// Run every work item of `extent`
    fn execute(&self, extent: &WorkExtent) -> Result<()> {
        if self.operands.len() != 3 {
            return Err(self.error("stage is not bound".to_string()));
        }
        let output_buffer = &self.operands[2];
        if output_buffer.access == AccessMode::ReadOnly {
            return Err(self.error("output operand is read-only".to_string()));
        }
        if self.operands[..2].iter().any(|input| input.same_storage(output_buffer)) {
            return Err(self.error("output operand aliases an input".to_string()));
        }

        match self.kind {
            StageKind::FilterTransform => {
                let [k_count, c_count] = self.scalar_args::<2>()?;
                self.check_len(0, k_count * c_count * FILTER_SIZE * FILTER_SIZE)?;
                self.check_len(1, ALPHA * FILTER_SIZE)?;
                self.check_len(2, k_count * c_count * TILE_ELEMENTS)?;

                let filters = self.operands[0].data.borrow();
                let g_matrix = self.operands[1].data.borrow();
                let mut u = output_buffer.data.borrow_mut();

                for_each_2d(extent, |k, c| {
                    if k >= k_count || c >= c_count {
                        return;
                    }
                    let base = (k * c_count + c) * FILTER_SIZE * FILTER_SIZE;
                    let tile = transform::filter_tile(&g_matrix, &filters[base..base + FILTER_SIZE * FILTER_SIZE]);
                    let out = (k * c_count + c) * TILE_ELEMENTS;
                    u[out..out + TILE_ELEMENTS].copy_from_slice(&tile);
                });
            }
            StageKind::DataTransform => {
                let [c_count, p, h, w, h_tiles, w_tiles] = self.scalar_args::<6>()?;
                self.check_len(0, c_count * h * w)?;
                self.check_len(1, ALPHA * ALPHA)?;
                self.check_len(2, c_count * p * TILE_ELEMENTS)?;
                if h_tiles * w_tiles > p {
                    return Err(self.error(format!("{}x{} tiles exceed P = {}", h_tiles, w_tiles, p)));
                }

                let image = self.operands[0].data.borrow();
                let b_matrix = self.operands[1].data.borrow();
                let mut v = output_buffer.data.borrow_mut();

                for_each_3d(extent, |c, th, tw| {
                    if c >= c_count || th >= h_tiles || tw >= w_tiles {
                        return;
                    }
                    let mut patch = [0.0f32; TILE_ELEMENTS];
                    for i in 0..ALPHA {
                        for j in 0..ALPHA {
                            let row = th * OUTPUT_TILE + i;
                            let col = tw * OUTPUT_TILE + j;
                            if row < h && col < w {
                                patch[i * ALPHA + j] = image[c * h * w + row * w + col];
                            }
                        }
                    }
                    let tile = transform::data_tile(&b_matrix, &patch);
                    let out = (c * p + th * w_tiles + tw) * TILE_ELEMENTS;
                    v[out..out + TILE_ELEMENTS].copy_from_slice(&tile);
                });
            }
            StageKind::CalcM => {
                let [k_count, p, c_count] = self.scalar_args::<3>()?;
                self.check_len(0, k_count * c_count * TILE_ELEMENTS)?;
                self.check_len(1, c_count * p * TILE_ELEMENTS)?;
                self.check_len(2, k_count * p * TILE_ELEMENTS)?;

                let u = self.operands[0].data.borrow();
                let v = self.operands[1].data.borrow();
                let mut m = output_buffer.data.borrow_mut();

                for_each_2d(extent, |k, b| {
                    if k >= k_count || b >= p {
                        return;
                    }
                    for e in 0..TILE_ELEMENTS {
                        let mut sum = 0.0f32;
                        for c in 0..c_count {
                            sum += u[(k * c_count + c) * TILE_ELEMENTS + e] * v[(c * p + b) * TILE_ELEMENTS + e];
                        }
                        m[(k * p + b) * TILE_ELEMENTS + e] = sum;
                    }
                });
            }
            StageKind::CalcY => {
                let [out_h, out_w, k_count, p, h_tiles, w_tiles] = self.scalar_args::<6>()?;
                self.check_len(0, k_count * p * TILE_ELEMENTS)?;
                self.check_len(1, ALPHA * OUTPUT_TILE)?;
                self.check_len(2, k_count * out_h * out_w)?;
                if h_tiles * w_tiles > p {
                    return Err(self.error(format!("{}x{} tiles exceed P = {}", h_tiles, w_tiles, p)));
                }

                let m = self.operands[0].data.borrow();
                let a_matrix = self.operands[1].data.borrow();
                let mut y = output_buffer.data.borrow_mut();

                for_each_3d(extent, |k, th, tw| {
                    if k >= k_count || th >= h_tiles || tw >= w_tiles {
                        return;
                    }
                    let base = (k * p + th * w_tiles + tw) * TILE_ELEMENTS;
                    let tile = transform::output_tile(&a_matrix, &m[base..base + TILE_ELEMENTS]);
                    for i in 0..OUTPUT_TILE {
                        for j in 0..OUTPUT_TILE {
                            let row = th * OUTPUT_TILE + i;
                            let col = tw * OUTPUT_TILE + j;
                            if row < out_h && col < out_w {
                                y[k * out_h * out_w + row * out_w + col] = tile[i * OUTPUT_TILE + j];
                            }
                        }
                    }
                });
            }
        }
        Ok(())
    }
}

impl ComputeStage for HostStage {
    type Buffer = HostBuffer;

    fn name(&self) -> &str {
        self.kind.name()
    }

    fn bind(&mut self, operands: &[&HostBuffer], scalars: &[i32]) -> Result<()> {
        self.operands = operands.iter().map(|&buffer| buffer.clone()).collect();
        self.scalars = scalars.to_vec();
        Ok(())
    }
}

fn for_each_2d<F: FnMut(usize, usize)>(extent: &WorkExtent, mut body: F) {
    let global = extent.global();
    for i in 0..global[0] {
        for j in 0..global[1] {
            body(i, j);
        }
    }
}

fn for_each_3d<F: FnMut(usize, usize, usize)>(extent: &WorkExtent, mut body: F) {
    let global = extent.global();
    for i in 0..global[0] {
        for j in 0..global[1] {
            for l in 0..global[2] {
                body(i, j, l);
            }
        }
    }
}

/// CPU runtime implementing the same stage contract as the OpenCL kernels
pub struct HostRuntime {
    max_alloc_bytes: Option<u64>,
    failing_stage: Option<String>,
    dispatch_log: RefCell<Vec<DispatchRecord>>,
    finish_count: Cell<usize>,
    allocated_count: Cell<usize>,
}

impl HostRuntime {
    pub fn new() -> Self {
        log::info!("using host reference runtime");
        Self {
            max_alloc_bytes: None,
            failing_stage: None,
            dispatch_log: RefCell::new(Vec::new()),
            finish_count: Cell::new(0),
            allocated_count: Cell::new(0),
        }
    }

    /// Limit the size of a single allocation
    pub fn with_max_alloc_bytes(mut self, bytes: u64) -> Self {
        self.max_alloc_bytes = Some(bytes);
        self
    }

    /// Make every enqueue of the named stage fail
    pub fn with_failing_stage(mut self, name: &str) -> Self {
        self.failing_stage = Some(name.to_string());
        self
    }

    /// Dispatches submitted so far, in order
    pub fn dispatch_log(&self) -> Vec<DispatchRecord> {
        self.dispatch_log.borrow().clone()
    }

    pub fn finish_count(&self) -> usize {
        self.finish_count.get()
    }

    pub fn allocated_count(&self) -> usize {
        self.allocated_count.get()
    }
}

impl Default for HostRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl AcceleratorRuntime for HostRuntime {
    type Buffer = HostBuffer;
    type Stage = HostStage;

    fn device_type(&self) -> DeviceType {
        DeviceType::Host
    }

    fn device_info(&self) -> Result<String> {
        Ok(format!(
            "Device: Host reference runtime\n\
             Vendor: n/a\n\
             Max Allocation: {}",
            self.max_alloc_bytes
                .map(|b| format!("{} bytes", b))
                .unwrap_or_else(|| "unlimited".to_string())
        ))
    }

    fn max_alloc_bytes(&self) -> Option<u64> {
        self.max_alloc_bytes
    }

    fn create_buffer(&self, spec: &BufferSpec) -> Result<HostBuffer> {
        if let Some(limit) = self.max_alloc_bytes {
            if spec.bytes as u64 > limit {
                return Err(WinogradError::Allocation {
                    buffer: spec.role.name().to_string(),
                    reason: format!("{} bytes exceeds {} byte limit", spec.bytes, limit),
                });
            }
        }
        self.allocated_count.set(self.allocated_count.get() + 1);
        Ok(HostBuffer {
            data: Rc::new(RefCell::new(vec![0.0; spec.elements])),
            access: spec.access,
        })
    }

    fn upload(&self, buffer: &HostBuffer, data: &[f32]) -> Result<()> {
        let mut storage = buffer.data.borrow_mut();
        if storage.len() != data.len() {
            return Err(WinogradError::dispatch(
                "upload".to_string(),
                format!("buffer holds {} elements, got {}", storage.len(), data.len()),
            ));
        }
        storage.copy_from_slice(data);
        Ok(())
    }

    fn compile(&self, source: &str, names: &[&str]) -> Result<HashMap<String, HostStage>> {
        log::debug!("host runtime ignores {} bytes of device source", source.len());
        names
            .iter()
            .map(|&name| {
                StageKind::from_name(name)
                    .map(|kind| (name.to_string(), HostStage::new(kind)))
                    .ok_or_else(|| WinogradError::Compile {
                        kernel: name.to_string(),
                        log: format!("no host implementation for kernel '{}'", name),
                    })
            })
            .collect()
    }

    fn enqueue(&self, stage: &HostStage, extent: &WorkExtent) -> Result<()> {
        let name = stage.kind.name();
        if self.failing_stage.as_deref() == Some(name) {
            return Err(stage.error("injected failure".to_string()));
        }

        let expected = match stage.kind {
            StageKind::FilterTransform | StageKind::CalcM => WorkDimension::Two,
            StageKind::DataTransform | StageKind::CalcY => WorkDimension::Three,
        };
        if extent.dimension() != expected {
            return Err(stage.error(format!("expected a {} range, got {}", expected, extent.dimension())));
        }
        for (&global, &local) in extent.global().iter().zip(extent.local()) {
            if local == 0 || global % local != 0 {
                return Err(stage.error(format!(
                    "invalid work group size: global {} is not a multiple of local {}",
                    global, local
                )));
            }
        }

        self.dispatch_log.borrow_mut().push(DispatchRecord {
            stage: name.to_string(),
            global: extent.global().to_vec(),
            local: extent.local().to_vec(),
        });
        stage.execute(extent)
    }

    fn finish(&self) -> Result<()> {
        // Host dispatches complete synchronously.
        self.finish_count.set(self.finish_count.get() + 1);
        Ok(())
    }

    fn download(&self, buffer: &HostBuffer, out: &mut [f32]) -> Result<()> {
        let storage = buffer.data.borrow();
        if storage.len() != out.len() {
            return Err(WinogradError::dispatch(
                "download".to_string(),
                format!("buffer holds {} elements, destination {}", storage.len(), out.len()),
            ));
        }
        out.copy_from_slice(&storage);
        Ok(())
    }
}
