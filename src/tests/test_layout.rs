use crate::error::WinogradError;
use crate::geometry::TileGeometry;
use crate::layout::{AccessMode, BufferLayout, BufferRole};
use crate::problem::ProblemShape;

fn layout(k: usize, c: usize, h: usize, w: usize) -> BufferLayout {
    let shape = ProblemShape::new(k, c, h, w).unwrap();
    let geometry = TileGeometry::new(&shape).unwrap();
    BufferLayout::new(&shape, &geometry).unwrap()
}

#[test]
fn test_buffer_sizes() {
    // K=2, C=3, H=6, W=8 -> out 4x6, tiles 2x3, P=6
    let layout = layout(2, 3, 6, 8);
    assert_eq!(layout.elements(BufferRole::Filters), 2 * 3 * 9);
    assert_eq!(layout.elements(BufferRole::Image), 3 * 6 * 8);
    assert_eq!(layout.elements(BufferRole::G), 12);
    assert_eq!(layout.elements(BufferRole::B), 16);
    assert_eq!(layout.elements(BufferRole::A), 8);
    assert_eq!(layout.elements(BufferRole::U), 2 * 3 * 16);
    assert_eq!(layout.elements(BufferRole::V), 3 * 6 * 16);
    assert_eq!(layout.elements(BufferRole::M), 2 * 6 * 16);
    assert_eq!(layout.elements(BufferRole::Y), 2 * 4 * 6);
}

#[test]
fn test_byte_sizes_are_f32() {
    let layout = layout(1, 1, 4, 4);
    for spec in layout.specs() {
        assert_eq!(spec.bytes, spec.elements * 4, "{}", spec.role);
    }
    let total: u64 = layout.specs().iter().map(|s| s.bytes as u64).sum();
    assert_eq!(layout.total_bytes(), total);
}

#[test]
fn test_nine_roles_in_order() {
    let layout = layout(1, 1, 4, 4);
    assert_eq!(layout.specs().len(), 9);
    for (i, spec) in layout.specs().iter().enumerate() {
        assert_eq!(spec.role, BufferRole::ALL[i]);
        assert_eq!(spec.role.index(), i);
    }
}

#[test]
fn test_access_modes() {
    let layout = layout(1, 1, 4, 4);
    for role in [BufferRole::G, BufferRole::B, BufferRole::A] {
        assert_eq!(layout.spec(role).access, AccessMode::ReadOnly);
    }
    for role in [BufferRole::Filters, BufferRole::Image, BufferRole::U, BufferRole::V, BufferRole::M, BufferRole::Y] {
        assert_eq!(layout.spec(role).access, AccessMode::ReadWrite);
    }
}

#[test]
fn test_stage_outputs() {
    let outputs: Vec<BufferRole> = BufferRole::ALL.into_iter().filter(|r| r.is_stage_output()).collect();
    assert_eq!(outputs, vec![BufferRole::U, BufferRole::V, BufferRole::M, BufferRole::Y]);
}

#[test]
fn test_capacity_limit() {
    let layout = layout(4, 4, 16, 16);
    assert!(layout.check_capacity(None).is_ok());
    assert!(layout.check_capacity(Some(u64::MAX)).is_ok());

    // V is the largest buffer here: 4 * 49 * 16 floats
    let v_bytes = layout.spec(BufferRole::V).bytes as u64;
    match layout.check_capacity(Some(v_bytes - 1)) {
        Err(WinogradError::Capacity { buffer, .. }) => assert_eq!(buffer, "V"),
        other => panic!("expected capacity error, got {:?}", other),
    }
}

#[test]
fn test_overflowing_size_is_capacity_error() {
    let shape = ProblemShape::new(usize::MAX / 2, 3, 4, 4).unwrap();
    let geometry = TileGeometry::new(&shape).unwrap();
    assert!(matches!(
        BufferLayout::new(&shape, &geometry),
        Err(WinogradError::Capacity { .. })
    ));
}
