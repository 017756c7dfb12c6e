use ocl::{Buffer, Context, Device, Kernel, Platform, Program, Queue, SpatialDims};
use ocl::enums::{DeviceInfo, DeviceInfoResult, ProgramInfo, ProgramInfoResult};
use ocl::DeviceType as OclDeviceType;
use std::collections::HashMap;
use std::fmt;
use crate::config::DevicePreference;
use crate::error::{Result, WinogradError};
use crate::gpu::runtime::{AcceleratorRuntime, ComputeStage, DeviceType};
use crate::layout::{AccessMode, BufferSpec};
use crate::partition::{WorkDimension, WorkExtent};

fn device_error(operation: &str, e: impl fmt::Display) -> WinogradError {
    WinogradError::dispatch(operation.to_string(), e.to_string())
}

/// A kernel from the compiled program.
///
/// The `ocl` kernel object is rebuilt on every bind, since buffer handles
/// change between problem shapes.
pub struct OclStage {
    name: String,
    program: Program,
    queue: Queue,
    kernel: Option<Kernel>,
}

impl ComputeStage for OclStage {
    type Buffer = Buffer<f32>;

    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&mut self, operands: &[&Buffer<f32>], scalars: &[i32]) -> Result<()> {
        let kernel = {
            let mut builder = Kernel::builder();
            builder
                .program(&self.program)
                .name(self.name.as_str())
                .queue(self.queue.clone());
            for &buffer in operands {
                builder.arg(buffer);
            }
            for &scalar in scalars {
                builder.arg(scalar);
            }
            builder
                .build()
                .map_err(|e| device_error(&format!("bind {}", self.name), e))?
        };
        self.kernel = Some(kernel);
        Ok(())
    }
}

/// OpenCL runtime: one device, one context, one in-order queue
pub struct OclRuntime {
    context: Context,
    queue: Queue,
    device: Device,
    device_type: DeviceType,
}

impl OclRuntime {
    /// Select a device according to `preference` and create its queue
    pub fn new(preference: DevicePreference) -> Result<Self> {
        let (platform, device, device_type) = Self::find_device(preference)?;

        let context = Context::builder()
            .platform(platform)
            .devices(device)
            .build()
            .map_err(|e| device_error("create context", e))?;

        let queue = Queue::new(&context, device, None)
            .map_err(|e| device_error("create queue", e))?;

        log::info!("OpenCL runtime initialized on {:?}", device_type);

        Ok(Self {
            context,
            queue,
            device,
            device_type,
        })
    }

    /// Find the first device matching `preference`.
    ///
    /// GPUs are ranked Intel, NVIDIA, AMD, then any other vendor.
    fn find_device(preference: DevicePreference) -> Result<(Platform, Device, DeviceType)> {
        // ocl panics when no ICD loader is present
        let platforms = std::panic::catch_unwind(Platform::list)
            .map_err(|_| device_error("list platforms", "OpenCL is not available on this host"))?;

        if platforms.is_empty() {
            return Err(device_error("list platforms", "no OpenCL platforms found"));
        }

        let mut candidates = Vec::new();
        for platform in &platforms {
            let devices = Device::list_all(platform).map_err(|e| device_error("list devices", e))?;
            for device in devices {
                let kind = match device.info(DeviceInfo::Type).map_err(|e| device_error("query device", e))? {
                    DeviceInfoResult::Type(kind) => kind,
                    _ => continue,
                };
                let vendor = device.vendor().map_err(|e| device_error("query device", e))?;
                candidates.push((*platform, device, classify(kind, &vendor)));
            }
        }

        let wanted = |device_type: DeviceType| match preference {
            DevicePreference::Gpu => is_gpu(device_type),
            DevicePreference::Cpu => device_type == DeviceType::Cpu,
            DevicePreference::Any => true,
        };

        let rank = |device_type: DeviceType| match device_type {
            DeviceType::IntelGpu => 0,
            DeviceType::NvidiaGpu => 1,
            DeviceType::AmdGpu => 2,
            DeviceType::Gpu => 3,
            DeviceType::Cpu => 4,
            DeviceType::Host => 5,
        };

        candidates
            .into_iter()
            .filter(|(_, _, device_type)| wanted(*device_type))
            .min_by_key(|(_, _, device_type)| rank(*device_type))
            .ok_or_else(|| device_error("select device", format!("no OpenCL device matches {:?}", preference)))
    }
}

fn classify(kind: OclDeviceType, vendor: &str) -> DeviceType {
    if kind == OclDeviceType::GPU {
        if vendor.contains("Intel") {
            DeviceType::IntelGpu
        } else if vendor.contains("NVIDIA") {
            DeviceType::NvidiaGpu
        } else if vendor.contains("AMD") || vendor.contains("Advanced Micro Devices") {
            DeviceType::AmdGpu
        } else {
            DeviceType::Gpu
        }
    } else {
        DeviceType::Cpu
    }
}

fn is_gpu(device_type: DeviceType) -> bool {
    matches!(
        device_type,
        DeviceType::IntelGpu | DeviceType::NvidiaGpu | DeviceType::AmdGpu | DeviceType::Gpu
    )
}

impl AcceleratorRuntime for OclRuntime {
    type Buffer = Buffer<f32>;
    type Stage = OclStage;

    fn device_type(&self) -> DeviceType {
        self.device_type
    }

    fn device_info(&self) -> Result<String> {
        let name = self.device.name().map_err(|e| device_error("query device", e))?;
        let vendor = self.device.vendor().map_err(|e| device_error("query device", e))?;
        let version = self.device.version().map_err(|e| device_error("query device", e))?;
        let max_compute_units = match self.device.info(DeviceInfo::MaxComputeUnits).map_err(|e| device_error("query device", e))? {
            DeviceInfoResult::MaxComputeUnits(units) => units,
            _ => return Err(device_error("query device", "failed to get max compute units")),
        };
        let max_work_group_size = self.device.max_wg_size().map_err(|e| device_error("query device", e))?;
        let global_mem_size: u64 = match self.device.info(DeviceInfo::GlobalMemSize).map_err(|e| device_error("query device", e))? {
            DeviceInfoResult::GlobalMemSize(size) => size,
            _ => return Err(device_error("query device", "failed to get global memory size")),
        };

        Ok(format!(
            "Device: {}\nVendor: {}\nVersion: {}\nCompute Units: {}\nMax Work Group Size: {}\nGlobal Memory: {} MB",
            name, vendor, version, max_compute_units, max_work_group_size, global_mem_size / (1024 * 1024)
        ))
    }

    fn max_alloc_bytes(&self) -> Option<u64> {
        match self.device.info(DeviceInfo::MaxMemAllocSize) {
            Ok(DeviceInfoResult::MaxMemAllocSize(size)) => Some(size),
            _ => None,
        }
    }

    fn create_buffer(&self, spec: &BufferSpec) -> Result<Buffer<f32>> {
        let flags = match spec.access {
            AccessMode::ReadOnly => ocl::flags::MEM_READ_ONLY,
            AccessMode::ReadWrite => ocl::flags::MEM_READ_WRITE,
        };
        Buffer::<f32>::builder()
            .queue(self.queue.clone())
            .flags(flags)
            .len(spec.elements)
            .build()
            .map_err(|e| WinogradError::Allocation {
                buffer: spec.role.name().to_string(),
                reason: e.to_string(),
            })
    }

    fn upload(&self, buffer: &Buffer<f32>, data: &[f32]) -> Result<()> {
        buffer.write(data).enq().map_err(|e| device_error("upload", e))
    }

    fn compile(&self, source: &str, names: &[&str]) -> Result<HashMap<String, OclStage>> {
        let program = Program::builder()
            .source(source)
            .devices(self.device)
            .build(&self.context)
            .map_err(|e| WinogradError::Compile {
                kernel: names.join(", "),
                log: e.to_string(),
            })?;

        let available = match program.info(ProgramInfo::KernelNames) {
            Ok(ProgramInfoResult::KernelNames(list)) => list,
            Ok(_) => String::new(),
            Err(e) => {
                return Err(WinogradError::Compile {
                    kernel: names.join(", "),
                    log: e.to_string(),
                })
            }
        };
        let available: Vec<&str> = available.split(';').map(str::trim).collect();

        let mut stages = HashMap::new();
        for &name in names {
            if !available.contains(&name) {
                return Err(WinogradError::Compile {
                    kernel: name.to_string(),
                    log: format!("kernel not found in program (available: {})", available.join(", ")),
                });
            }
            stages.insert(
                name.to_string(),
                OclStage {
                    name: name.to_string(),
                    program: program.clone(),
                    queue: self.queue.clone(),
                    kernel: None,
                },
            );
        }
        Ok(stages)
    }

    fn enqueue(&self, stage: &OclStage, extent: &WorkExtent) -> Result<()> {
        let operation = format!("enqueue {}", stage.name);
        let kernel = stage
            .kernel
            .as_ref()
            .ok_or_else(|| device_error(&operation, "stage is not bound"))?;

        let (global, local) = match extent.dimension() {
            WorkDimension::Two => (
                SpatialDims::Two(extent.global()[0], extent.global()[1]),
                SpatialDims::Two(extent.local()[0], extent.local()[1]),
            ),
            WorkDimension::Three => (
                SpatialDims::Three(extent.global()[0], extent.global()[1], extent.global()[2]),
                SpatialDims::Three(extent.local()[0], extent.local()[1], extent.local()[2]),
            ),
        };

        unsafe {
            kernel
                .cmd()
                .global_work_size(global)
                .local_work_size(local)
                .enq()
                .map_err(|e| device_error(&operation, e))?;
        }
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        self.queue.finish().map_err(|e| device_error("finish", e))
    }

    fn download(&self, buffer: &Buffer<f32>, out: &mut [f32]) -> Result<()> {
        buffer.read(out).enq().map_err(|e| device_error("download", e))
    }
}

impl fmt::Display for OclRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpenCL runtime ({:?})", self.device_type)
    }
}
