//! Property tests for outline segment counts in both pipelines.

use std::sync::Arc;

use polydebug_render::prelude::*;
use proptest::prelude::*;

fn coordinate() -> impl Strategy<Value = f32> {
    (-10_000i32..10_000i32).prop_map(|v| v as f32 * 0.01)
}

fn vertex() -> impl Strategy<Value = Vec2> {
    (coordinate(), coordinate()).prop_map(|(x, y)| Vec2::new(x, y))
}

fn transform() -> impl Strategy<Value = Transform2D> {
    (vertex(), -3.0f32..3.0, 0.1f32..4.0).prop_map(|(t, r, s)| {
        Transform2D::from_translation(t)
            .with_rotation(r)
            .with_scale(Vec2::new(s, s))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn both_pipelines_draw_n_segments_for_n_vertices(
        polygons in prop::collection::vec(
            (prop::collection::vec(vertex(), 3..32), transform()),
            1..6,
        )
    ) {
        let mut scene = Scene::new();
        let root = scene.spawn("root");
        let mut expected = 0;
        for (i, (points, local)) in polygons.iter().enumerate() {
            let id = scene.spawn_child(root, &format!("p{i}")).unwrap();
            scene.set_transform(id, *local).unwrap();
            scene.attach_shape(id, Polygon::with_vertices(points.clone())).unwrap();
            expected += points.len();
        }

        let mut renderer = PolygonDebugRenderer::new(root)
            .with_line_material(Arc::new(SharedLineMaterial::new()));
        renderer.on_activate(&scene);

        let mut gizmos = GizmoRecorder::new();
        let preview = renderer.draw_preview(&scene, &SelectionSet::new(), &mut gizmos);
        let mut gpu = GpuLineRecorder::new();
        let runtime = renderer.draw_runtime(HostKind::Editor, &scene, &mut gpu).unwrap();

        prop_assert_eq!(preview.segments, expected);
        prop_assert_eq!(runtime.segments, expected);
        prop_assert_eq!(gizmos.lines().len(), expected);
        prop_assert_eq!(gpu.segments().len(), expected);
        prop_assert_eq!(gpu.matrix_depth(), 0);

        // Same world-space endpoints from both pipelines.
        for (g, s) in gizmos.lines().iter().zip(gpu.segments()) {
            prop_assert!(g.from.abs_diff_eq(s.from, 1e-3));
            prop_assert!(g.to.abs_diff_eq(s.to, 1e-3));
        }
    }
}
