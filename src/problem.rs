//! Convolution problem description: shape plus host-side tensors.

use ndarray::{Array3, Array4, ArrayView3, ArrayView4};
use serde::{Deserialize, Serialize};
use crate::error::{Result, WinogradError};
use crate::geometry::FILTER_SIZE;

/// Dimensions of a single-image convolution problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProblemShape {
    /// Output channels (number of filters)
    pub k: usize,
    /// Input channels
    pub c: usize,
    /// Image height
    pub h: usize,
    /// Image width
    pub w: usize,
}

impl ProblemShape {
    /// Create a shape, rejecting zero extents
    pub fn new(k: usize, c: usize, h: usize, w: usize) -> Result<Self> {
        for (name, value) in [("K", k), ("C", c), ("H", h), ("W", w)] {
            if value == 0 {
                return Err(WinogradError::invalid_shape(name, "must be greater than zero"));
            }
        }
        Ok(Self { k, c, h, w })
    }

    /// Number of filter coefficients, K·C·3·3
    pub fn filter_len(&self) -> Result<usize> {
        checked_product("filters", &[self.k, self.c, FILTER_SIZE, FILTER_SIZE])
    }

    /// Number of image values, C·H·W
    pub fn image_len(&self) -> Result<usize> {
        checked_product("image", &[self.c, self.h, self.w])
    }
}

fn checked_product(buffer: &str, dims: &[usize]) -> Result<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| WinogradError::Capacity {
            buffer: buffer.to_string(),
            reason: format!("element count {:?} overflows usize", dims),
        })
}

/// A loaded convolution problem.
///
/// Filters are laid out `[K, C, 3, 3]` and the image `[C, H, W]`, both in
/// standard (row-major) order so they can be uploaded as flat slices.
#[derive(Debug, Clone)]
pub struct Problem {
    shape: ProblemShape,
    filters: Array4<f32>,
    image: Array3<f32>,
}

impl Problem {
    /// Build a problem from owned arrays
    pub fn new(filters: Array4<f32>, image: Array3<f32>) -> Result<Self> {
        let (k, c, fh, fw) = filters.dim();
        if fh != FILTER_SIZE || fw != FILTER_SIZE {
            return Err(WinogradError::invalid_shape(
                "filters".to_string(),
                format!("expected {}x{} kernels, got {}x{}", FILTER_SIZE, FILTER_SIZE, fh, fw),
            ));
        }
        let (ic, h, w) = image.dim();
        if ic != c {
            return Err(WinogradError::invalid_shape(
                "image".to_string(),
                format!("filters expect {} input channels, image has {}", c, ic),
            ));
        }
        let shape = ProblemShape::new(k, c, h, w)?;

        Ok(Self {
            shape,
            filters: filters.as_standard_layout().into_owned(),
            image: image.as_standard_layout().into_owned(),
        })
    }

    /// Build a problem from flat vectors in (k,c,row,col) and (c,row,col) order
    pub fn from_vecs(shape: ProblemShape, filters: Vec<f32>, image: Vec<f32>) -> Result<Self> {
        let filters = Array4::from_shape_vec((shape.k, shape.c, FILTER_SIZE, FILTER_SIZE), filters)
            .map_err(|e| WinogradError::invalid_shape("filters".to_string(), e.to_string()))?;
        let image = Array3::from_shape_vec((shape.c, shape.h, shape.w), image)
            .map_err(|e| WinogradError::invalid_shape("image".to_string(), e.to_string()))?;
        Self::new(filters, image)
    }

    pub fn shape(&self) -> ProblemShape {
        self.shape
    }

    pub fn filters(&self) -> ArrayView4<'_, f32> {
        self.filters.view()
    }

    pub fn image(&self) -> ArrayView3<'_, f32> {
        self.image.view()
    }

    /// Filters as a contiguous slice for upload
    pub fn filter_slice(&self) -> Result<&[f32]> {
        self.filters
            .as_slice()
            .ok_or_else(|| WinogradError::invalid_shape("filters", "not contiguous"))
    }

    /// Image as a contiguous slice for upload
    pub fn image_slice(&self) -> Result<&[f32]> {
        self.image
            .as_slice()
            .ok_or_else(|| WinogradError::invalid_shape("image", "not contiguous"))
    }
}
