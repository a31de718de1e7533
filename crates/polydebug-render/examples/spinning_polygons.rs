//! Three polygon outlines spinning at different speeds.
//!
//! Run with:
//!   cargo run --example spinning_polygons --features renderer -p polydebug-render
//!
//! Set `RUST_LOG=polydebug_render=trace` to see per-frame draw stats.

use std::f32::consts::TAU;

use polydebug_render::backend::{run_windowed, WindowConfig};
use polydebug_render::prelude::*;

/// A regular polygon with `sides` vertices on a circle of `radius`.
fn regular(sides: usize, radius: f32) -> Vec<Vec2> {
    (0..sides)
        .map(|i| {
            let angle = TAU * i as f32 / sides as f32;
            Vec2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let mut scene = Scene::new();
    let root = scene.spawn("root");

    let square = scene.spawn_child(root, "square")?;
    scene.attach_shape(square, Polygon::new())?;
    scene.set_transform(square, Transform2D::from_translation(Vec2::new(-2.5, 0.0)))?;

    let triangle = scene.spawn_child(root, "triangle")?;
    scene.attach_shape(triangle, Polygon::with_vertices(regular(3, 0.8)))?;

    let hexagon = scene.spawn_child(root, "hexagon")?;
    scene.attach_shape(hexagon, Polygon::with_vertices(regular(6, 0.7)))?;
    scene.set_transform(hexagon, Transform2D::from_translation(Vec2::new(2.5, 0.0)))?;

    let spinners = [(square, 0.5_f32), (triangle, -1.0), (hexagon, 2.0)];

    let config = DebugDrawConfig {
        draw_in_build: true,
        draw_color: Color::rgba(0.2, 1.0, 0.4, 1.0),
        ..Default::default()
    };
    let renderer = PolygonDebugRenderer::new(root).with_config(config);

    run_windowed(
        scene,
        renderer,
        move |scene, frame| {
            let t = frame as f32 / 60.0;
            for (id, speed) in spinners {
                if let Some(current) = scene.transform(id).copied() {
                    // Only fails for despawned nodes.
                    let _ = scene.set_transform(id, current.with_rotation(t * speed));
                }
            }
            SceneChange::Unchanged
        },
        WindowConfig {
            title: "polydebug -- spinning polygons".to_owned(),
            ..Default::default()
        },
    )
}
