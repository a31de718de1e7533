//! Tests for the wgpu line backend that need no GPU: camera math only.

#[cfg(feature = "renderer")]
mod tests {
    use polydebug_render::backend::Camera2D;

    fn project(m: &[f32; 16], x: f32, y: f32) -> (f32, f32) {
        (m[0] * x + m[4] * y + m[12], m[1] * x + m[5] * y + m[13])
    }

    #[test]
    fn default_camera_is_centered_on_origin() {
        let camera = Camera2D::default();
        let m = camera.orthographic_matrix();
        assert_eq!(project(&m, 0.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn visible_corners_map_to_clip_corners() {
        let camera = Camera2D {
            width: 4.0,
            height: 2.0,
            x: 1.0,
            y: 1.0,
        };
        let m = camera.orthographic_matrix();
        let (x, y) = project(&m, 3.0, 2.0);
        assert!((x - 1.0).abs() < 1e-6 && (y - 1.0).abs() < 1e-6);
        let (x, y) = project(&m, -1.0, 0.0);
        assert!((x + 1.0).abs() < 1e-6 && (y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn fit_aspect_keeps_height() {
        let mut camera = Camera2D::default();
        camera.fit_aspect(1600, 400);
        assert_eq!(camera.height, 6.0);
        assert_eq!(camera.width, 24.0);

        camera.fit_aspect(0, 400);
        assert_eq!(camera.width, 24.0, "zero-sized surfaces are ignored");
    }
}
