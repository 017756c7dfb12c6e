//! Constants for GPU dispatch

/// Work-group extent for the filter transform, over (K, C)
pub const FILTER_TRANSFORM_GROUP: [usize; 2] = [8, 4];

/// Work-group extent for the data transform, over (C, tile rows, tile columns)
pub const DATA_TRANSFORM_GROUP: [usize; 3] = [4, 4, 4];

/// Work-group extent for the elementwise product, over (K, P)
pub const CALC_M_GROUP: [usize; 2] = [8, 8];

/// Work-group extent for the inverse transform, over (K, tile rows, tile columns)
pub const CALC_Y_GROUP: [usize; 3] = [2, 8, 8];

/// Default number of problem shapes whose buffers stay pooled between runs
pub const DEFAULT_MAX_POOLED_SHAPES: usize = 4;

/// Bundled OpenCL C source for the four stages
pub const WINOGRAD_KERNELS: &str = include_str!("winograd.cl");

/// Size in bytes of one buffer element
pub const ELEMENT_BYTES: usize = std::mem::size_of::<f32>();
