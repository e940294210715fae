//! End-to-end render tests
//!
//! These need a GPU adapter (a software one is fine). When none is available
//! the tests log a message and return early.

use glam::Vec3;
use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;
use synth::assets::{Model, ModelPart};
use synth::core::{CameraPose, ObjectAttributes, Placement};
use synth::graphics::{Lighting, Material, Mesh, RenderRequest};
use synth::{RendererConfig, SynthError, SynthRenderer};

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;
const BACKGROUND_COLOR: [u8; 3] = [40, 80, 120];

fn try_renderer() -> Option<SynthRenderer> {
    match SynthRenderer::new(RendererConfig::new(WIDTH, HEIGHT)) {
        Ok(renderer) => Some(renderer),
        Err(SynthError::ContextCreation(reason)) => {
            eprintln!("skipping GPU test: {reason}");
            None
        }
        Err(err) => panic!("renderer creation failed: {err}"),
    }
}

fn write_backgrounds(dir: &Path) {
    RgbImage::from_pixel(32, 32, Rgb(BACKGROUND_COLOR))
        .save(dir.join("solid.png"))
        .unwrap();
}

/// Renderer with one solid background and a unit cube named "cube"
fn scene_renderer() -> Option<(SynthRenderer, tempfile::TempDir)> {
    let mut renderer = try_renderer()?;
    let dir = tempfile::tempdir().unwrap();
    write_backgrounds(dir.path());
    assert_eq!(renderer.add_background_images_directory(dir.path()).unwrap(), 1);

    let cube = Model::from_parts(vec![ModelPart::new(
        "cube",
        Mesh::cube(1.0),
        Material::from_rgb(0.9, 0.2, 0.2),
    )]);
    renderer.insert_model("cube", cube).unwrap();
    Some((renderer, dir))
}

fn cube_request(class_id: u32) -> RenderRequest {
    RenderRequest::new(
        vec![Placement::new(
            "cube",
            ObjectAttributes::default().with_class(class_id),
        )],
        0,
        CameraPose::default(),
    )
    .with_segmentation(true)
}

fn assert_pixel_near(actual: &[u8], expected: [u8; 3]) {
    for (a, e) in actual.iter().zip(expected) {
        assert!(a.abs_diff(e) <= 1, "expected {expected:?}, got {actual:?}");
    }
}

#[test]
fn test_background_only_render() {
    let Some((renderer, _dir)) = scene_renderer() else {
        return;
    };
    let request = RenderRequest::new(Vec::new(), 0, CameraPose::default());

    let result = renderer.render_image(&request).unwrap();
    assert_eq!(result.image.width, WIDTH);
    assert_eq!(result.image.height, HEIGHT);
    assert_eq!(result.image.channels, 3);
    assert_eq!(result.image.data.len(), (WIDTH * HEIGHT * 3) as usize);
    assert!(result.segmentation.is_none());
    assert!(result.bounding_rects.is_empty());

    for (x, y) in [(0, 0), (WIDTH / 2, HEIGHT / 2), (WIDTH - 1, HEIGHT - 1)] {
        assert_pixel_near(result.image.pixel(x, y), BACKGROUND_COLOR);
    }
}

#[test]
fn test_cube_is_drawn_over_background() {
    let Some((renderer, _dir)) = scene_renderer() else {
        return;
    };

    let result = renderer.render_image(&cube_request(7)).unwrap();
    let center = result.image.pixel(WIDTH / 2, HEIGHT / 2);
    assert_ne!(center, BACKGROUND_COLOR.as_slice());
    assert_pixel_near(result.image.pixel(0, 0), BACKGROUND_COLOR);

    let segmentation = result.segmentation.unwrap();
    assert_eq!(segmentation.width, WIDTH);
    assert_eq!(segmentation.height, HEIGHT);
    assert_eq!(segmentation.id_at(WIDTH / 2, HEIGHT / 2), 7);
    assert_eq!(segmentation.id_at(0, 0), 0);
    assert_eq!(segmentation.id_at(WIDTH - 1, HEIGHT - 1), 0);

    let count = segmentation.count(7);
    assert_eq!(count + segmentation.count(0), (WIDTH * HEIGHT) as usize);
    assert!(count > 0);

    let rect = result.bounding_rects[0].rect.unwrap();
    assert_eq!(result.bounding_rects[0].name, "cube");
    assert!(rect.left() < (WIDTH / 2) as f32 && rect.right() > (WIDTH / 2) as f32);
    assert!(rect.top() < (HEIGHT / 2) as f32 && rect.bottom() > (HEIGHT / 2) as f32);
}

#[test]
fn test_large_class_id_survives_segmentation() {
    let Some((renderer, _dir)) = scene_renderer() else {
        return;
    };

    let result = renderer.render_image(&cube_request(0x102030)).unwrap();
    let segmentation = result.segmentation.unwrap();
    assert_eq!(segmentation.id_at(WIDTH / 2, HEIGHT / 2), 0x102030);
}

#[test]
fn test_render_is_idempotent() {
    let Some((renderer, _dir)) = scene_renderer() else {
        return;
    };
    let request = cube_request(3).with_lighting(Lighting {
        sun_direction: Vec3::new(1.0, -1.0, 0.0),
        ..Default::default()
    });

    let first = renderer.render_image(&request).unwrap();
    let second = renderer.render_image(&request).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_bounds_match_render_result() {
    let Some((renderer, _dir)) = scene_renderer() else {
        return;
    };
    let request = cube_request(1);

    let result = renderer.render_image(&request).unwrap();
    let projection_view = renderer.projection_view(&request.camera).unwrap();
    let bounds = renderer
        .compute_objects_bounding_rects(&request.placements, projection_view)
        .unwrap();
    assert_eq!(bounds, result.bounding_rects);
}

#[test]
fn test_invalid_background_index() {
    let Some((renderer, _dir)) = scene_renderer() else {
        return;
    };
    let mut request = cube_request(1);
    request.background_index = 5;

    let result = renderer.render_image(&request);
    assert!(matches!(
        result,
        Err(SynthError::InvalidBackgroundIndex { index: 5, count: 1 })
    ));
}

#[test]
fn test_unknown_model_in_request() {
    let Some((renderer, _dir)) = scene_renderer() else {
        return;
    };
    let request = RenderRequest::new(
        vec![Placement::new("teapot", ObjectAttributes::default())],
        0,
        CameraPose::default(),
    );

    assert!(matches!(
        renderer.render_image(&request),
        Err(SynthError::UnknownModel(name)) if name == "teapot"
    ));
}

#[test]
fn test_directory_scan_counts_only_images() {
    let Some(mut renderer) = try_renderer() else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    for name in ["one.png", "two.png", "three.png"] {
        RgbImage::new(4, 4).save(dir.path().join(name)).unwrap();
    }
    fs::write(dir.path().join("readme.txt"), "text").unwrap();
    fs::write(dir.path().join("cube.obj"), "v 0 0 0").unwrap();

    assert_eq!(renderer.add_background_images_directory(dir.path()).unwrap(), 3);
    assert_eq!(renderer.background_images_count().unwrap(), 3);
}

#[test]
fn test_oversized_background_is_skipped() {
    let Some(mut renderer) = try_renderer() else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let too_wide = renderer.max_texture_dimension() + 1;
    RgbImage::new(too_wide, 2)
        .save(dir.path().join("a_panorama.png"))
        .unwrap();
    RgbImage::new(4, 4).save(dir.path().join("b_small.png")).unwrap();

    assert_eq!(renderer.add_background_images_directory(dir.path()).unwrap(), 1);
    assert_eq!(renderer.background_images_count().unwrap(), 1);
}

#[test]
fn test_far_object_is_drawn_over_background() {
    let Some((renderer, _dir)) = scene_renderer() else {
        return;
    };
    // Beyond the background quad's depth once projected
    let attributes = ObjectAttributes::at(Vec3::new(0.0, 0.0, -90.0))
        .with_scale(10.0)
        .with_class(9);
    let request = RenderRequest::new(
        vec![Placement::new("cube", attributes)],
        0,
        CameraPose::default(),
    )
    .with_segmentation(true);

    let projection_view = renderer.projection_view(&request.camera).unwrap();
    let clip = projection_view * Vec3::new(0.0, 0.0, -85.0).extend(1.0);
    assert!(clip.z / clip.w > 0.999);

    let result = renderer.render_image(&request).unwrap();
    assert_ne!(
        result.image.pixel(WIDTH / 2, HEIGHT / 2),
        BACKGROUND_COLOR.as_slice()
    );
    assert_eq!(result.segmentation.unwrap().id_at(WIDTH / 2, HEIGHT / 2), 9);
}

#[test]
fn test_queries_from_other_thread_are_rejected() {
    let Some((renderer, _dir)) = scene_renderer() else {
        return;
    };
    let pose = CameraPose::default();

    std::thread::scope(|scope| {
        scope
            .spawn(|| {
                assert!(matches!(renderer.background_images_count(), Err(SynthError::WrongThread)));
                assert!(matches!(renderer.projection_view(&pose), Err(SynthError::WrongThread)));
                assert!(matches!(renderer.models(), Err(SynthError::WrongThread)));
                assert!(matches!(renderer.models_extent(), Err(SynthError::WrongThread)));
            })
            .join()
            .unwrap()
    });
    assert_eq!(renderer.background_images_count().unwrap(), 1);
    assert!(renderer.models().unwrap().contains("cube"));
}

#[test]
fn test_load_models_stops_at_first_failure() {
    let Some(mut renderer) = try_renderer() else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("tri.obj");
    fs::write(&good, "v 0 0 0\nv 2 0 0\nv 0 1 -1\nf 1 2 3\n").unwrap();
    let missing = dir.path().join("missing.obj");

    let result = renderer.load_models(&[
        ("first", good.as_path()),
        ("broken", missing.as_path()),
        ("last", good.as_path()),
    ]);
    assert!(matches!(
        result,
        Err(SynthError::ModelLoadFailure { ref name, .. }) if name == "broken"
    ));

    let extents = renderer.models_extent().unwrap();
    assert_eq!(extents.len(), 1);
    assert_eq!(extents[0].name, "first");
    let extent = extents[0].extent.unwrap();
    assert_eq!(extent.min, Vec3::new(0.0, 0.0, -1.0));
    assert_eq!(extent.max, Vec3::new(2.0, 1.0, 0.0));
}

#[test]
fn test_use_from_other_thread_is_rejected() {
    let Some((renderer, _dir)) = scene_renderer() else {
        return;
    };
    let request = cube_request(1);

    let result = std::thread::scope(|scope| {
        scope
            .spawn(|| renderer.render_image(&request).map(|_| ()))
            .join()
            .unwrap()
    });
    assert!(matches!(result, Err(SynthError::WrongThread)));
    assert!(renderer.render_image(&request).is_ok());
}
