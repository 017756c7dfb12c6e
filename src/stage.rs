//! The four compute stages and their binding contract.
//!
//! Operands and scalars are bound by position. The positions below are the
//! contract every stage implementation (OpenCL or host) reads them by.

use std::fmt;
use serde::{Deserialize, Serialize};
use crate::error::{Result, WinogradError};
use crate::geometry::TileGeometry;
use crate::gpu::constants::{CALC_M_GROUP, CALC_Y_GROUP, DATA_TRANSFORM_GROUP, FILTER_TRANSFORM_GROUP};
use crate::layout::BufferRole;
use crate::partition::WorkExtent;
use crate::problem::ProblemShape;

/// One of the four pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKind {
    FilterTransform,
    DataTransform,
    CalcM,
    CalcY,
}

impl StageKind {
    /// Stages in submission order
    pub const ALL: [StageKind; 4] = [
        StageKind::FilterTransform,
        StageKind::DataTransform,
        StageKind::CalcM,
        StageKind::CalcY,
    ];

    /// Kernel name in the program source
    pub fn name(self) -> &'static str {
        match self {
            StageKind::FilterTransform => "filter_transform",
            StageKind::DataTransform => "data_transform",
            StageKind::CalcM => "calc_M",
            StageKind::CalcY => "calc_Y",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Buffer operands in binding order: two inputs, then the output
    pub fn operands(self) -> [BufferRole; 3] {
        match self {
            StageKind::FilterTransform => [BufferRole::Filters, BufferRole::G, BufferRole::U],
            StageKind::DataTransform => [BufferRole::Image, BufferRole::B, BufferRole::V],
            StageKind::CalcM => [BufferRole::U, BufferRole::V, BufferRole::M],
            StageKind::CalcY => [BufferRole::M, BufferRole::A, BufferRole::Y],
        }
    }

    /// Buffer this stage writes
    pub fn output(self) -> BufferRole {
        self.operands()[2]
    }

    /// Scalar parameters in binding order, following the buffer operands
    pub fn scalars(self, shape: &ProblemShape, geometry: &TileGeometry) -> Result<Vec<i32>> {
        let ProblemShape { k, c, h, w } = *shape;
        let values: Vec<(&str, usize)> = match self {
            StageKind::FilterTransform => vec![("K", k), ("C", c)],
            StageKind::DataTransform => vec![
                ("C", c),
                ("P", geometry.p),
                ("H", h),
                ("W", w),
                ("num_h_tiles", geometry.num_h_tiles),
                ("num_w_tiles", geometry.num_w_tiles),
            ],
            StageKind::CalcM => vec![("K", k), ("P", geometry.p), ("C", c)],
            StageKind::CalcY => vec![
                ("out_H", geometry.out_h),
                ("out_W", geometry.out_w),
                ("K", k),
                ("P", geometry.p),
                ("num_h_tiles", geometry.num_h_tiles),
                ("num_w_tiles", geometry.num_w_tiles),
            ],
        };

        values
            .into_iter()
            .map(|(name, value)| {
                i32::try_from(value).map_err(|_| WinogradError::Capacity {
                    buffer: self.name().to_string(),
                    reason: format!("scalar {} = {} does not fit a 32-bit device int", name, value),
                })
            })
            .collect()
    }

    /// Global and local extents for this stage
    pub fn extent(self, shape: &ProblemShape, geometry: &TileGeometry) -> Result<WorkExtent> {
        match self {
            StageKind::FilterTransform => WorkExtent::new(&[shape.k, shape.c], &FILTER_TRANSFORM_GROUP),
            StageKind::DataTransform => WorkExtent::new(
                &[shape.c, geometry.num_h_tiles, geometry.num_w_tiles],
                &DATA_TRANSFORM_GROUP,
            ),
            StageKind::CalcM => WorkExtent::new(&[shape.k, geometry.p], &CALC_M_GROUP),
            StageKind::CalcY => WorkExtent::new(
                &[shape.k, geometry.num_h_tiles, geometry.num_w_tiles],
                &CALC_Y_GROUP,
            ),
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stage fully resolved for one problem shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub kind: StageKind,
    pub operands: [BufferRole; 3],
    pub scalars: Vec<i32>,
    pub extent: WorkExtent,
}

impl StageSpec {
    pub fn new(kind: StageKind, shape: &ProblemShape, geometry: &TileGeometry) -> Result<Self> {
        Ok(Self {
            kind,
            operands: kind.operands(),
            scalars: kind.scalars(shape, geometry)?,
            extent: kind.extent(shape, geometry)?,
        })
    }
}

/// All four stages for one problem shape, in submission order.
///
/// Building the plan surfaces every partitioning error before any device
/// resource is committed.
pub fn plan_stages(shape: &ProblemShape, geometry: &TileGeometry) -> Result<Vec<StageSpec>> {
    StageKind::ALL
        .iter()
        .map(|&kind| StageSpec::new(kind, shape, geometry))
        .collect()
}

/// Progress of one run through the stage chain.
///
/// The two transforms are independent and may complete in either order;
/// both must be done before `calc_M`, and `calc_M` before `calc_Y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uploaded,
    UTransformed,
    VTransformed,
    TransformsComplete,
    MComputed,
    YComputed,
    ReadBack,
}

impl PipelineState {
    /// State after `stage` completes
    pub fn advance(self, stage: StageKind) -> Result<Self> {
        use PipelineState::*;
        let next = match (self, stage) {
            (Uploaded, StageKind::FilterTransform) => UTransformed,
            (Uploaded, StageKind::DataTransform) => VTransformed,
            (UTransformed, StageKind::DataTransform) => TransformsComplete,
            (VTransformed, StageKind::FilterTransform) => TransformsComplete,
            (TransformsComplete, StageKind::CalcM) => MComputed,
            (MComputed, StageKind::CalcY) => YComputed,
            (state, stage) => {
                return Err(WinogradError::StageOrder {
                    stage: stage.name().to_string(),
                    state: format!("{:?}", state),
                })
            }
        };
        Ok(next)
    }

    /// State after the output has been read back
    pub fn read_back(self) -> Result<Self> {
        match self {
            PipelineState::YComputed => Ok(PipelineState::ReadBack),
            state => Err(WinogradError::StageOrder {
                stage: "readback".to_string(),
                state: format!("{:?}", state),
            }),
        }
    }
}
