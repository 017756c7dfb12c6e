use crate::error::WinogradError;
use crate::geometry::{TileGeometry, ALPHA};
use crate::problem::ProblemShape;

fn geometry(k: usize, c: usize, h: usize, w: usize) -> TileGeometry {
    TileGeometry::new(&ProblemShape::new(k, c, h, w).unwrap()).unwrap()
}

#[test]
fn test_smallest_image_is_one_tile() {
    let g = geometry(1, 1, 4, 4);
    assert_eq!((g.out_h, g.out_w), (2, 2));
    assert_eq!((g.num_h_tiles, g.num_w_tiles), (1, 1));
    assert_eq!(g.p, 1);
    assert_eq!(g.alpha, ALPHA);
    assert_eq!(g.alpha, 4);
}

#[test]
fn test_rectangular_image() {
    let g = geometry(2, 3, 8, 12);
    assert_eq!((g.out_h, g.out_w), (6, 10));
    assert_eq!((g.num_h_tiles, g.num_w_tiles), (3, 5));
    assert_eq!(g.p, 15);
    assert_eq!(g.output_plane(), 60);
}

#[test]
fn test_tile_count_is_true_ceiling() {
    // Even H, W always give an even output extent, so ceiling and floor
    // division agree; pin that the result covers every output row/column.
    for h in (4..40).step_by(2) {
        let g = geometry(1, 1, h, 6);
        assert_eq!(g.num_h_tiles, (g.out_h + 1) / 2);
        assert_eq!(g.num_h_tiles * 2, g.out_h);
    }
}

#[test]
fn test_odd_height_rejected() {
    let err = TileGeometry::new(&ProblemShape::new(1, 1, 5, 4).unwrap()).unwrap_err();
    match err {
        WinogradError::InvalidShape { name, .. } => assert_eq!(name, "H"),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_odd_width_rejected() {
    let err = TileGeometry::new(&ProblemShape::new(1, 1, 4, 7).unwrap()).unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn test_too_small_image_rejected() {
    assert!(TileGeometry::new(&ProblemShape::new(1, 1, 2, 4).unwrap()).is_err());
}

#[test]
fn test_zero_dimension_rejected() {
    assert!(ProblemShape::new(0, 1, 4, 4).is_err());
    assert!(ProblemShape::new(1, 0, 4, 4).is_err());
    assert!(ProblemShape::new(1, 1, 0, 4).is_err());
    assert!(ProblemShape::new(1, 1, 4, 0).is_err());
}

#[test]
fn test_only_image_extents_are_extent_errors() {
    let odd = TileGeometry::new(&ProblemShape::new(1, 1, 5, 4).unwrap()).unwrap_err();
    assert!(odd.is_image_extent_error());
    let narrow = TileGeometry::new(&ProblemShape::new(1, 1, 4, 2).unwrap()).unwrap_err();
    assert!(narrow.is_image_extent_error());
    assert!(ProblemShape::new(1, 1, 0, 4).unwrap_err().is_image_extent_error());

    for err in [
        ProblemShape::new(0, 1, 4, 4).unwrap_err(),
        ProblemShape::new(1, 0, 4, 4).unwrap_err(),
    ] {
        assert!(err.is_invalid_input());
        assert!(!err.is_image_extent_error());
    }
}

#[test]
fn test_tile_index_is_row_major() {
    let g = geometry(1, 1, 8, 10);
    assert_eq!(g.num_w_tiles, 4);
    assert_eq!(g.tile_index(0, 0), 0);
    assert_eq!(g.tile_index(0, 3), 3);
    assert_eq!(g.tile_index(1, 0), 4);
    assert_eq!(g.tile_index(2, 3), g.p - 1);
}
