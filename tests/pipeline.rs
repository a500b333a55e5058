//! End-to-end pipeline scenarios: decode, resolve, rasterize, compose,
//! export, and the session state machine around them.

use std::io::Cursor;
use std::sync::Once;

use framepix::{
    CropRegion, CropUnit, DisplayGeometry, EditorSession, Stage, Template, TemplateModel,
    centered_square_crop, compose, decode_photo, export, rasterize, resolve,
};

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .try_init();
    });
}

fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([
            (x % 256) as u8,
            (y % 256) as u8,
            ((x + y) % 256) as u8,
            255,
        ])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn scenario_display_selection_maps_to_source_pixels() {
    init_tracing();
    // Source 1000x800 shown at 250x200; selection (50,50)-(150,150).
    let photo = decode_photo(&gradient_png(1000, 800)).unwrap();
    let display = DisplayGeometry {
        width: 250.0,
        height: 200.0,
    };
    let region = CropRegion {
        x: 50.0,
        y: 50.0,
        width: 100.0,
        height: 100.0,
        unit: CropUnit::Pixels,
    };

    let crop = resolve(region, (photo.width, photo.height), display).unwrap();
    assert_eq!((crop.x, crop.y), (200.0, 200.0));
    assert_eq!((crop.width, crop.height), (400.0, 400.0));

    let raster = rasterize(&photo, crop, 1.0).unwrap();
    assert_eq!(raster.width, 400);
    assert_eq!(raster.height, 400);
}

#[test]
fn masked_pixel_count_tracks_circle_area() {
    let photo = decode_photo(&gradient_png(200, 200)).unwrap();
    let display = DisplayGeometry {
        width: 100.0,
        height: 100.0,
    };

    for density in [1.0f32, 2.0] {
        let region = centered_square_crop(display);
        let crop = resolve(region, (photo.width, photo.height), display).unwrap();
        let raster = rasterize(&photo, crop, density).unwrap();

        let radius = raster.radius();
        let covered = raster
            .rgba8_premul
            .chunks_exact(4)
            .filter(|px| px[3] > 0)
            .count() as f64;
        let expected = std::f64::consts::PI * radius * radius;
        // One pixel row of antialiased edge around the ideal circle.
        let ring = std::f64::consts::PI * ((radius + 0.5).powi(2) - (radius - 0.5).powi(2));
        assert!(
            (covered - expected).abs() <= ring,
            "density {density}: covered {covered}, expected {expected}"
        );
    }
}

#[test]
fn edge_touching_crop_clamps_and_bounds_radius() {
    let photo = decode_photo(&gradient_png(100, 100)).unwrap();
    let display = DisplayGeometry {
        width: 100.0,
        height: 100.0,
    };
    // Square hanging off the bottom-right corner.
    let region = CropRegion {
        x: 60.0,
        y: 60.0,
        width: 60.0,
        height: 60.0,
        unit: CropUnit::Pixels,
    };

    let crop = resolve(region, (photo.width, photo.height), display).unwrap();
    assert_eq!((crop.width, crop.height), (40.0, 40.0));

    let raster = rasterize(&photo, crop, 1.0).unwrap();
    assert!(raster.radius() >= 0.0);
    assert!(raster.radius() <= f64::from(raster.width.min(raster.height)) / 2.0);
}

#[test]
fn compose_twice_is_byte_identical() {
    let photo = decode_photo(&gradient_png(128, 128)).unwrap();
    let display = DisplayGeometry {
        width: 128.0,
        height: 128.0,
    };
    let crop = resolve(
        centered_square_crop(display),
        (photo.width, photo.height),
        display,
    )
    .unwrap();

    let mut model = TemplateModel::new(Template::default());
    model.name = "Ada Lovelace".to_string();
    model.designation = "Analyst".to_string();
    model.photo = Some(rasterize(&photo, crop, 2.0).unwrap());

    let a = compose(&model).unwrap();
    let b = compose(&model).unwrap();
    assert_eq!(a.pixels.rgba8_premul, b.pixels.rgba8_premul);
}

#[test]
fn export_round_trips_at_exact_scaled_dimensions() {
    let model = TemplateModel::new(Template::default());
    let surface = compose(&model).unwrap();

    let artifact = export(&surface, 3.0, "Ada").unwrap();
    assert_eq!(artifact.file_name, "Ada-frame.png");

    let decoded = image::load_from_memory(&artifact.png).unwrap();
    assert_eq!(decoded.width(), surface.width * 3);
    assert_eq!(decoded.height(), surface.height * 3);
}

#[test]
fn empty_fields_fall_back_to_placeholders_and_default_file_name() {
    let model = TemplateModel::new(Template::default());
    assert_eq!(model.display_name(), "Your Name");
    assert_eq!(model.display_designation(), "Designation");

    let surface = compose(&model).unwrap();
    let artifact = export(&surface, 3.0, "").unwrap();
    assert_eq!(artifact.file_name, "photo-frame.png");
}

#[test]
fn full_session_walkthrough() {
    init_tracing();
    let mut session = EditorSession::new(Template::default(), 2.0).unwrap();
    assert_eq!(session.stage(), Stage::Uploading);

    session.load_photo(&gradient_png(640, 480)).unwrap();
    session.advance().unwrap();
    assert_eq!(session.stage(), Stage::Cropping);

    session.set_display(DisplayGeometry {
        width: 320.0,
        height: 240.0,
    });
    let region = centered_square_crop(DisplayGeometry {
        width: 320.0,
        height: 240.0,
    });
    session.confirm_crop(region).unwrap();
    session.advance().unwrap();
    assert_eq!(session.stage(), Stage::Composing);

    session.set_name("Ada");
    session.set_designation("Engineer");
    let artifact = session.export_artifact(3.0).unwrap();
    assert_eq!(artifact.file_name, "Ada-frame.png");

    let decoded = image::load_from_memory(&artifact.png).unwrap();
    assert_eq!(decoded.width(), 960);
    assert_eq!(decoded.height(), 960);
}

#[test]
fn reset_mid_export_discards_stale_artifact() {
    init_tracing();
    let mut session = EditorSession::new(Template::default(), 1.0).unwrap();
    session.load_photo(&gradient_png(64, 64)).unwrap();
    session.advance().unwrap();
    session
        .confirm_crop(centered_square_crop(DisplayGeometry {
            width: 64.0,
            height: 64.0,
        }))
        .unwrap();
    session.advance().unwrap();

    // The "async" encode: capture the token, produce the artifact, and only
    // then hand it back -- after the user has reset the session.
    let run = session.current_run();
    let artifact = session.export_artifact(2.0).unwrap();

    session.reset();
    assert!(session.accept_export(run, artifact).is_none());
}

#[test]
fn re_crop_supersedes_previous_raster() {
    init_tracing();
    let mut session = EditorSession::new(Template::default(), 1.0).unwrap();
    session.load_photo(&gradient_png(100, 100)).unwrap();
    session.advance().unwrap();

    let display = DisplayGeometry {
        width: 100.0,
        height: 100.0,
    };
    session.set_display(display);
    session.confirm_crop(centered_square_crop(display)).unwrap();
    let first = session.raster().unwrap().rgba8_premul.clone();

    session
        .confirm_crop(CropRegion {
            x: 0.0,
            y: 0.0,
            width: 40.0,
            height: 40.0,
            unit: CropUnit::Pixels,
        })
        .unwrap();
    let second = session.raster().unwrap().rgba8_premul.clone();
    assert_ne!(first, second);
}
