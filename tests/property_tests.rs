#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;
    use winograd_cl::geometry::TileGeometry;
    use winograd_cl::gpu::constants::WINOGRAD_KERNELS;
    use winograd_cl::gpu::HostRuntime;
    use winograd_cl::layout::{BufferLayout, BufferRole};
    use winograd_cl::partition::{round_up, WorkExtent};
    use winograd_cl::reference::{direct_conv, max_abs_diff};
    use winograd_cl::stage::plan_stages;
    use winograd_cl::{Problem, ProblemShape, RunContext};

    // Strategy for valid (K, C, H, W) with even image extents of at least 4
    fn shape_strategy(max_kc: usize, max_hw: usize) -> impl Strategy<Value = ProblemShape> {
        (1..=max_kc, 1..=max_kc, 2..=max_hw / 2, 2..=max_hw / 2)
            .prop_map(|(k, c, h, w)| ProblemShape::new(k, c, h * 2, w * 2).unwrap())
    }

    // Strategy for a problem with bounded values
    fn problem_strategy() -> impl Strategy<Value = Problem> {
        shape_strategy(4, 12).prop_flat_map(|shape| {
            (
                prop::collection::vec(-2.0f32..2.0, shape.filter_len().unwrap()),
                prop::collection::vec(-4.0f32..4.0, shape.image_len().unwrap()),
            )
                .prop_map(move |(filters, image)| Problem::from_vecs(shape, filters, image).unwrap())
        })
    }

    proptest! {
        #[test]
        fn test_round_up_is_smallest_covering_multiple(extent in 0usize..10_000, group in 1usize..64) {
            let rounded = round_up(extent, group).unwrap();
            prop_assert!(rounded >= extent);
            prop_assert_eq!(rounded % group, 0);
            prop_assert!(rounded < extent + group);
        }

        #[test]
        fn test_work_extent_covers_useful_range(
            a in 1usize..200,
            b in 1usize..200,
            c in 1usize..200,
        ) {
            let extent = WorkExtent::new(&[a, b, c], &[4, 4, 4]).unwrap();
            prop_assert!(extent.total_work_items() >= extent.useful_work_items());
            prop_assert!(extent.efficiency() > 0.0 && extent.efficiency() <= 1.0);
            for (g, u) in extent.global().iter().zip(extent.useful()) {
                prop_assert!(g >= u);
            }
        }

        #[test]
        fn test_tiles_cover_output(shape in shape_strategy(8, 200)) {
            let geometry = TileGeometry::new(&shape).unwrap();
            prop_assert_eq!(geometry.out_h, shape.h - 2);
            prop_assert_eq!(geometry.out_w, shape.w - 2);
            prop_assert!(geometry.num_h_tiles * 2 >= geometry.out_h);
            prop_assert!(geometry.num_w_tiles * 2 >= geometry.out_w);
            prop_assert_eq!(geometry.p, geometry.num_h_tiles * geometry.num_w_tiles);
        }

        #[test]
        fn test_odd_extent_always_rejected(k in 1usize..8, c in 1usize..8, h in 2usize..100, w in 2usize..100) {
            let shape = ProblemShape::new(k, c, h * 2 + 1, w * 2).unwrap();
            prop_assert!(TileGeometry::new(&shape).unwrap_err().is_invalid_input());
        }

        #[test]
        fn test_layout_grows_with_channels(shape in shape_strategy(8, 64)) {
            let geometry = TileGeometry::new(&shape).unwrap();
            let layout = BufferLayout::new(&shape, &geometry).unwrap();
            let wider = ProblemShape::new(shape.k, shape.c + 1, shape.h, shape.w).unwrap();
            let wider_layout = BufferLayout::new(&wider, &geometry).unwrap();

            prop_assert!(wider_layout.total_bytes() > layout.total_bytes());
            for role in [BufferRole::Filters, BufferRole::Image, BufferRole::U, BufferRole::V] {
                prop_assert!(wider_layout.elements(role) > layout.elements(role));
            }
            prop_assert_eq!(wider_layout.elements(BufferRole::M), layout.elements(BufferRole::M));
            prop_assert_eq!(wider_layout.elements(BufferRole::Y), layout.elements(BufferRole::Y));
        }

        #[test]
        fn test_layout_monotonic_in_every_dimension(shape in shape_strategy(8, 64), axis in 0usize..4) {
            let ProblemShape { k, c, h, w } = shape;
            let grown = match axis {
                0 => ProblemShape::new(k + 1, c, h, w),
                1 => ProblemShape::new(k, c + 1, h, w),
                2 => ProblemShape::new(k, c, h + 2, w),
                _ => ProblemShape::new(k, c, h, w + 2),
            }
            .unwrap();

            let layout = BufferLayout::new(&shape, &TileGeometry::new(&shape).unwrap()).unwrap();
            let grown_layout = BufferLayout::new(&grown, &TileGeometry::new(&grown).unwrap()).unwrap();
            for role in BufferRole::ALL {
                prop_assert!(grown_layout.elements(role) >= layout.elements(role), "{} shrank", role);
            }
        }

        #[test]
        fn test_every_dispatch_divides_evenly(shape in shape_strategy(40, 120)) {
            let geometry = TileGeometry::new(&shape).unwrap();
            for spec in plan_stages(&shape, &geometry).unwrap() {
                for (g, l) in spec.extent.global().iter().zip(spec.extent.local()) {
                    prop_assert_eq!(g % l, 0);
                }
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_pipeline_matches_direct_convolution(problem in problem_strategy()) {
            let mut context = RunContext::new(HostRuntime::new(), WINOGRAD_KERNELS).unwrap();
            let result = context.run(&problem).unwrap();
            let expected = direct_conv(problem.filters(), problem.image());
            prop_assert_eq!(result.output.dim(), expected.dim());
            let error = max_abs_diff(&expected, &result.output);
            prop_assert!(error < 1e-3, "max error {}", error);
        }
    }
}
