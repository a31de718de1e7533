//! Shared line material behaviour across renderers.

use std::sync::Arc;

use polydebug_render::prelude::*;

fn scene_with_two_roots() -> (Scene, NodeId, NodeId) {
    let mut scene = Scene::new();
    let a = scene.spawn("a");
    let b = scene.spawn("b");
    scene.attach_shape(a, Polygon::new()).unwrap();
    scene.attach_shape(b, Polygon::new()).unwrap();
    (scene, a, b)
}

#[test]
fn two_renderers_in_one_frame_create_the_material_once() {
    let (scene, a, b) = scene_with_two_roots();
    let material = Arc::new(SharedLineMaterial::new());
    let mut first = PolygonDebugRenderer::new(a).with_line_material(Arc::clone(&material));
    let mut second = PolygonDebugRenderer::new(b).with_line_material(Arc::clone(&material));

    let mut gpu = GpuLineRecorder::new();
    first.draw_runtime(HostKind::Editor, &scene, &mut gpu).unwrap();
    second.draw_runtime(HostKind::Editor, &scene, &mut gpu).unwrap();

    assert_eq!(gpu.materials_created(), 1);
    assert_eq!(material.creations(), 1);
    assert_eq!(gpu.count(|c| matches!(c, GpuCall::SetPass(_))), 2);
    assert_eq!(gpu.segments().len(), 8);
}

#[test]
fn material_is_reused_across_frames() {
    let (scene, a, _) = scene_with_two_roots();
    let material = Arc::new(SharedLineMaterial::new());
    let mut renderer = PolygonDebugRenderer::new(a).with_line_material(Arc::clone(&material));

    let mut gpu = GpuLineRecorder::new();
    for _ in 0..5 {
        renderer.draw_runtime(HostKind::Editor, &scene, &mut gpu).unwrap();
        gpu.clear();
    }
    assert_eq!(gpu.materials_created(), 1);
    assert_eq!(material.get(), gpu.bound_material());
}

#[test]
fn isolated_holders_do_not_share() {
    let (scene, a, b) = scene_with_two_roots();
    let mut first = PolygonDebugRenderer::new(a).with_line_material(Arc::new(SharedLineMaterial::new()));
    let mut second = PolygonDebugRenderer::new(b).with_line_material(Arc::new(SharedLineMaterial::new()));

    let mut gpu = GpuLineRecorder::new();
    first.draw_runtime(HostKind::Editor, &scene, &mut gpu).unwrap();
    second.draw_runtime(HostKind::Editor, &scene, &mut gpu).unwrap();
    assert_eq!(gpu.materials_created(), 2);
}

#[test]
fn shutdown_forces_recreation_on_next_draw() {
    let (scene, a, _) = scene_with_two_roots();
    let material = Arc::new(SharedLineMaterial::new());
    let mut renderer = PolygonDebugRenderer::new(a).with_line_material(Arc::clone(&material));

    let mut gpu = GpuLineRecorder::new();
    renderer.draw_runtime(HostKind::Editor, &scene, &mut gpu).unwrap();
    assert!(material.shutdown().is_some());
    assert!(!material.is_created());

    renderer.draw_runtime(HostKind::Editor, &scene, &mut gpu).unwrap();
    assert_eq!(gpu.materials_created(), 2);
    assert_eq!(material.creations(), 2);
}

#[test]
fn switching_backends_requires_shutdown() {
    let (scene, a, _) = scene_with_two_roots();
    let material = Arc::new(SharedLineMaterial::new());
    let mut renderer = PolygonDebugRenderer::new(a).with_line_material(Arc::clone(&material));

    let mut old_backend = GpuLineRecorder::new();
    renderer.draw_runtime(HostKind::Editor, &scene, &mut old_backend).unwrap();
    assert_eq!(old_backend.materials_created(), 1);

    let mut new_backend = GpuLineRecorder::new();
    renderer.draw_runtime(HostKind::Editor, &scene, &mut new_backend).unwrap();
    assert_eq!(new_backend.materials_created(), 0, "the holder does not track backends");

    material.shutdown();
    let mut new_backend = GpuLineRecorder::new();
    renderer.draw_runtime(HostKind::Editor, &scene, &mut new_backend).unwrap();
    assert_eq!(new_backend.materials_created(), 1);
    let created = new_backend.calls().iter().find_map(|c| match c {
        GpuCall::CreateMaterial(id) => Some(*id),
        _ => None,
    });
    assert_eq!(new_backend.bound_material(), created);
    assert_eq!(material.creations(), 2);
}

#[test]
fn renderers_default_to_the_global_holder() {
    let mut scene = Scene::new();
    let a = scene.spawn("a");
    let first = PolygonDebugRenderer::new(a);
    let second = PolygonDebugRenderer::new(a);
    assert!(Arc::ptr_eq(first.line_material(), second.line_material()));
    assert!(Arc::ptr_eq(first.line_material(), &SharedLineMaterial::global()));
}
