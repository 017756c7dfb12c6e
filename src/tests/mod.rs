// Test modules for all components
pub mod test_geometry;
pub mod test_layout;
pub mod test_partition;
pub mod test_stage;
