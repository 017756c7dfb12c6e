use crate::error::WinogradError;
use crate::geometry::TileGeometry;
use crate::layout::BufferRole;
use crate::problem::ProblemShape;
use crate::stage::{plan_stages, PipelineState, StageKind};

fn setup(k: usize, c: usize, h: usize, w: usize) -> (ProblemShape, TileGeometry) {
    let shape = ProblemShape::new(k, c, h, w).unwrap();
    let geometry = TileGeometry::new(&shape).unwrap();
    (shape, geometry)
}

#[test]
fn test_stage_names() {
    let names: Vec<&str> = StageKind::ALL.iter().map(|k| k.name()).collect();
    assert_eq!(names, vec!["filter_transform", "data_transform", "calc_M", "calc_Y"]);
    for kind in StageKind::ALL {
        assert_eq!(StageKind::from_name(kind.name()), Some(kind));
    }
    assert_eq!(StageKind::from_name("calc_m"), None);
}

#[test]
fn test_operand_binding_order() {
    assert_eq!(
        StageKind::FilterTransform.operands(),
        [BufferRole::Filters, BufferRole::G, BufferRole::U]
    );
    assert_eq!(
        StageKind::DataTransform.operands(),
        [BufferRole::Image, BufferRole::B, BufferRole::V]
    );
    assert_eq!(StageKind::CalcM.operands(), [BufferRole::U, BufferRole::V, BufferRole::M]);
    assert_eq!(StageKind::CalcY.operands(), [BufferRole::M, BufferRole::A, BufferRole::Y]);
    assert_eq!(StageKind::CalcY.output(), BufferRole::Y);
}

#[test]
fn test_scalar_binding_order() {
    // K=3, C=2, H=10, W=8 -> out 8x6, tiles 4x3, P=12
    let (shape, geometry) = setup(3, 2, 10, 8);
    assert_eq!(StageKind::FilterTransform.scalars(&shape, &geometry).unwrap(), vec![3, 2]);
    assert_eq!(
        StageKind::DataTransform.scalars(&shape, &geometry).unwrap(),
        vec![2, 12, 10, 8, 4, 3]
    );
    assert_eq!(StageKind::CalcM.scalars(&shape, &geometry).unwrap(), vec![3, 12, 2]);
    assert_eq!(
        StageKind::CalcY.scalars(&shape, &geometry).unwrap(),
        vec![8, 6, 3, 12, 4, 3]
    );
}

#[test]
fn test_scalar_overflow_is_capacity_error() {
    let (shape, geometry) = setup(i32::MAX as usize + 1, 1, 4, 4);
    assert!(matches!(
        StageKind::FilterTransform.scalars(&shape, &geometry),
        Err(WinogradError::Capacity { .. })
    ));
}

#[test]
fn test_stage_extents() {
    // K=3, C=5, H=W=20 -> tiles 9x9, P=81
    let (shape, geometry) = setup(3, 5, 20, 20);
    let plan = plan_stages(&shape, &geometry).unwrap();
    assert_eq!(plan.len(), 4);

    assert_eq!(plan[0].kind, StageKind::FilterTransform);
    assert_eq!(plan[0].extent.global(), &[8, 8]);
    assert_eq!(plan[0].extent.local(), &[8, 4]);

    assert_eq!(plan[1].kind, StageKind::DataTransform);
    assert_eq!(plan[1].extent.global(), &[8, 12, 12]);
    assert_eq!(plan[1].extent.local(), &[4, 4, 4]);

    assert_eq!(plan[2].kind, StageKind::CalcM);
    assert_eq!(plan[2].extent.global(), &[8, 88]);
    assert_eq!(plan[2].extent.local(), &[8, 8]);

    assert_eq!(plan[3].kind, StageKind::CalcY);
    assert_eq!(plan[3].extent.global(), &[4, 16, 16]);
    assert_eq!(plan[3].extent.local(), &[2, 8, 8]);
}

#[test]
fn test_state_filter_first() {
    let state = PipelineState::Uploaded
        .advance(StageKind::FilterTransform)
        .unwrap();
    assert_eq!(state, PipelineState::UTransformed);
    let state = state.advance(StageKind::DataTransform).unwrap();
    assert_eq!(state, PipelineState::TransformsComplete);
    let state = state.advance(StageKind::CalcM).unwrap();
    assert_eq!(state, PipelineState::MComputed);
    let state = state.advance(StageKind::CalcY).unwrap();
    assert_eq!(state, PipelineState::YComputed);
    assert_eq!(state.read_back().unwrap(), PipelineState::ReadBack);
}

#[test]
fn test_state_data_first() {
    let state = PipelineState::Uploaded
        .advance(StageKind::DataTransform)
        .unwrap();
    assert_eq!(state, PipelineState::VTransformed);
    let state = state.advance(StageKind::FilterTransform).unwrap();
    assert_eq!(state, PipelineState::TransformsComplete);
}

#[test]
fn test_calc_m_needs_both_transforms() {
    assert!(PipelineState::Uploaded.advance(StageKind::CalcM).is_err());
    assert!(PipelineState::UTransformed.advance(StageKind::CalcM).is_err());
    let err = PipelineState::VTransformed.advance(StageKind::CalcM).unwrap_err();
    match err {
        WinogradError::StageOrder { stage, state } => {
            assert_eq!(stage, "calc_M");
            assert_eq!(state, "VTransformed");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_calc_y_needs_m() {
    assert!(PipelineState::TransformsComplete.advance(StageKind::CalcY).is_err());
    assert!(PipelineState::Uploaded.advance(StageKind::CalcY).is_err());
}

#[test]
fn test_transform_cannot_repeat() {
    assert!(PipelineState::UTransformed.advance(StageKind::FilterTransform).is_err());
    assert!(PipelineState::MComputed.advance(StageKind::DataTransform).is_err());
}

#[test]
fn test_read_back_requires_y() {
    assert!(PipelineState::MComputed.read_back().is_err());
    assert!(PipelineState::Uploaded.read_back().is_err());
}
