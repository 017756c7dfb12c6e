//! Device buffer layout for one pipeline run.
//!
//! Nine buffers per run: the two uploaded tensors, the three transform
//! matrices, the two transform-domain intermediates, the elementwise product
//! and the final output.

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::error::{Result, WinogradError};
use crate::geometry::{TileGeometry, ALPHA, FILTER_SIZE, OUTPUT_TILE, TILE_ELEMENTS};
use crate::gpu::constants::ELEMENT_BYTES;
use crate::problem::ProblemShape;

/// Role of a device buffer within the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferRole {
    Filters,
    Image,
    G,
    B,
    A,
    U,
    V,
    M,
    Y,
}

impl BufferRole {
    /// All roles in allocation order
    pub const ALL: [BufferRole; 9] = [
        BufferRole::Filters,
        BufferRole::Image,
        BufferRole::G,
        BufferRole::B,
        BufferRole::A,
        BufferRole::U,
        BufferRole::V,
        BufferRole::M,
        BufferRole::Y,
    ];

    /// Position in [`BufferRole::ALL`]
    pub fn index(self) -> usize {
        match self {
            BufferRole::Filters => 0,
            BufferRole::Image => 1,
            BufferRole::G => 2,
            BufferRole::B => 3,
            BufferRole::A => 4,
            BufferRole::U => 5,
            BufferRole::V => 6,
            BufferRole::M => 7,
            BufferRole::Y => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BufferRole::Filters => "filters",
            BufferRole::Image => "image",
            BufferRole::G => "G",
            BufferRole::B => "B",
            BufferRole::A => "A",
            BufferRole::U => "U",
            BufferRole::V => "V",
            BufferRole::M => "M",
            BufferRole::Y => "Y",
        }
    }

    /// Fixed transform matrices
    pub fn is_constant(self) -> bool {
        matches!(self, BufferRole::G | BufferRole::B | BufferRole::A)
    }

    /// Buffers written by a stage
    pub fn is_stage_output(self) -> bool {
        matches!(self, BufferRole::U | BufferRole::V | BufferRole::M | BufferRole::Y)
    }

    pub fn access(self) -> AccessMode {
        if self.is_constant() {
            AccessMode::ReadOnly
        } else {
            AccessMode::ReadWrite
        }
    }
}

impl fmt::Display for BufferRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Device-side access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// Intended size and access of one device buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferSpec {
    pub role: BufferRole,
    pub elements: usize,
    pub bytes: usize,
    pub access: AccessMode,
}

impl BufferSpec {
    fn new(role: BufferRole, dims: &[usize]) -> Result<Self> {
        let overflow = || WinogradError::Capacity {
            buffer: role.name().to_string(),
            reason: format!("element count {:?} overflows usize", dims),
        };
        let elements = dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(overflow)?;
        let bytes = elements.checked_mul(ELEMENT_BYTES).ok_or_else(overflow)?;

        Ok(Self {
            role,
            elements,
            bytes,
            access: role.access(),
        })
    }
}

/// Sizes of all nine buffers for one problem shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferLayout {
    shape: ProblemShape,
    specs: Vec<BufferSpec>,
}

impl BufferLayout {
    /// Compute the layout. Nothing is allocated here.
    pub fn new(shape: &ProblemShape, geometry: &TileGeometry) -> Result<Self> {
        let ProblemShape { k, c, h, w } = *shape;
        let p = geometry.p;

        let specs = BufferRole::ALL
            .iter()
            .map(|&role| {
                let dims: Vec<usize> = match role {
                    BufferRole::Filters => vec![k, c, FILTER_SIZE, FILTER_SIZE],
                    BufferRole::Image => vec![c, h, w],
                    BufferRole::G => vec![ALPHA, FILTER_SIZE],
                    BufferRole::B => vec![ALPHA, ALPHA],
                    BufferRole::A => vec![ALPHA, OUTPUT_TILE],
                    BufferRole::U => vec![k, c, TILE_ELEMENTS],
                    BufferRole::V => vec![c, p, TILE_ELEMENTS],
                    BufferRole::M => vec![k, p, TILE_ELEMENTS],
                    BufferRole::Y => vec![k, geometry.out_h, geometry.out_w],
                };
                BufferSpec::new(role, &dims)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { shape: *shape, specs })
    }

    pub fn shape(&self) -> ProblemShape {
        self.shape
    }

    pub fn spec(&self, role: BufferRole) -> &BufferSpec {
        &self.specs[role.index()]
    }

    pub fn specs(&self) -> &[BufferSpec] {
        &self.specs
    }

    pub fn elements(&self, role: BufferRole) -> usize {
        self.spec(role).elements
    }

    pub fn total_bytes(&self) -> u64 {
        self.specs.iter().map(|s| s.bytes as u64).sum()
    }

    /// Reject any buffer larger than the device's maximum single allocation.
    pub fn check_capacity(&self, max_alloc_bytes: Option<u64>) -> Result<()> {
        let Some(limit) = max_alloc_bytes else {
            return Ok(());
        };
        for spec in &self.specs {
            if spec.bytes as u64 > limit {
                return Err(WinogradError::Capacity {
                    buffer: spec.role.name().to_string(),
                    reason: format!("{} bytes exceeds the device limit of {} bytes", spec.bytes, limit),
                });
            }
        }
        Ok(())
    }
}
