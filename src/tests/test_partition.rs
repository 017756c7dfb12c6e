use crate::error::WinogradError;
use crate::partition::{round_up, WorkDimension, WorkExtent};

#[test]
fn test_round_up_exact_multiple_unchanged() {
    assert_eq!(round_up(16, 8).unwrap(), 16);
    assert_eq!(round_up(4, 4).unwrap(), 4);
    assert_eq!(round_up(0, 4).unwrap(), 0);
}

#[test]
fn test_round_up_to_next_multiple() {
    assert_eq!(round_up(5, 4).unwrap(), 8);
    assert_eq!(round_up(9, 8).unwrap(), 16);
    assert_eq!(round_up(1, 2).unwrap(), 2);
}

#[test]
fn test_round_up_smaller_than_group() {
    // Extent below the group size launches one full group of padding items
    assert_eq!(round_up(3, 8).unwrap(), 8);
    assert_eq!(round_up(1, 4).unwrap(), 4);
}

#[test]
fn test_round_up_zero_group_rejected() {
    assert_eq!(
        round_up(5, 0),
        Err(WinogradError::InvalidPartition { extent: 5, group: 0 })
    );
}

#[test]
fn test_work_extent_two_dimensional() {
    let extent = WorkExtent::new(&[3, 5], &[8, 4]).unwrap();
    assert_eq!(extent.dimension(), WorkDimension::Two);
    assert_eq!(extent.global(), &[8, 8]);
    assert_eq!(extent.local(), &[8, 4]);
    assert_eq!(extent.useful(), &[3, 5]);
    assert_eq!(extent.total_work_items(), 64);
    assert_eq!(extent.useful_work_items(), 15);
    assert_eq!(extent.work_groups(), 2);
    assert!((extent.efficiency() - 15.0 / 64.0).abs() < 1e-12);
}

#[test]
fn test_work_extent_three_dimensional() {
    let extent = WorkExtent::new(&[2, 9, 16], &[2, 8, 8]).unwrap();
    assert_eq!(extent.dimension(), WorkDimension::Three);
    assert_eq!(extent.global(), &[2, 16, 16]);
    assert_eq!(extent.work_groups(), 4);
}

#[test]
fn test_work_extent_mismatched_dims_rejected() {
    assert!(WorkExtent::new(&[2, 3], &[2, 2, 2]).is_err());
    assert!(WorkExtent::new(&[2], &[2]).is_err());
}

#[test]
fn test_work_extent_zero_group_rejected() {
    assert!(matches!(
        WorkExtent::new(&[4, 4], &[4, 0]),
        Err(WinogradError::InvalidPartition { .. })
    ));
}

#[test]
fn test_work_extent_display() {
    let extent = WorkExtent::new(&[8, 8], &[8, 8]).unwrap();
    let text = extent.to_string();
    assert!(text.starts_with("2D"));
    assert!(text.contains("100.0% useful"));
}
