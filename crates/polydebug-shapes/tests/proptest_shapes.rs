//! Property tests for shape notification and outline invariants.

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use polydebug_shapes::prelude::*;
use proptest::prelude::*;

/// Finite coordinates in a modest range.
fn finite_f32() -> impl Strategy<Value = f32> {
    (-100_000i32..100_000i32).prop_map(|v| v as f32 * 0.01)
}

fn vertex_strategy() -> impl Strategy<Value = Vec2> {
    (finite_f32(), finite_f32()).prop_map(|(x, y)| Vec2::new(x, y))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1_000))]

    #[test]
    fn polygon_outline_has_one_edge_per_vertex(
        points in prop::collection::vec(vertex_strategy(), 3..64)
    ) {
        let polygon = Polygon::with_vertices(points.clone());
        let edges = polygon.outline();
        prop_assert_eq!(edges.len(), points.len());
        for (i, edge) in edges.iter().enumerate() {
            prop_assert_eq!(edge.start, points[i]);
            prop_assert_eq!(edge.end, points[(i + 1) % points.len()]);
        }
    }

    #[test]
    fn radius_notifies_iff_request_differs_from_stored(
        requests in prop::collection::vec(finite_f32(), 1..50)
    ) {
        let mut circle = Circle::new();
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        circle.changed_mut().subscribe_infallible(move || c.set(c.get() + 1));

        let mut expected = 0u32;
        for r in requests {
            let before = circle.radius();
            circle.set_radius(r).unwrap();
            if r != before {
                expected += 1;
            }
            prop_assert!(circle.radius() >= 0.0);
            prop_assert_eq!(count.get(), expected);
        }
    }

    #[test]
    fn fresh_sequences_always_notify(
        lists in prop::collection::vec(prop::collection::vec(vertex_strategy(), 1..8), 1..10)
    ) {
        let mut polygon = Polygon::new();
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        polygon.changed_mut().subscribe_infallible(move || c.set(c.get() + 1));

        let n = lists.len() as u32;
        for list in lists {
            let verts: Vertices = Arc::from(list);
            polygon.set_vertices(Some(Arc::clone(&verts))).unwrap();
            polygon.set_vertices(Some(verts)).unwrap();
        }
        prop_assert_eq!(count.get(), n);
    }
}
