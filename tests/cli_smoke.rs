use std::io::Cursor;
use std::path::PathBuf;

fn framepix_exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_framepix")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "framepix.exe"
            } else {
                "framepix"
            });
            p
        })
}

fn write_photo_fixture(path: &std::path::Path, width: u32, height: u32) {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, &buf).unwrap();
}

#[test]
fn cli_compose_writes_print_scale_png() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let photo_path = dir.join("photo.png");
    let out_path = dir.join("out.png");
    let _ = std::fs::remove_file(&out_path);
    write_photo_fixture(&photo_path, 200, 160);

    let status = std::process::Command::new(framepix_exe())
        .args([
            "compose",
            "--photo",
            photo_path.to_string_lossy().as_ref(),
            "--name",
            "Ada",
            "--designation",
            "Engineer",
            "--crop",
            "50,50,100,100",
            "--display",
            "250x200",
            "--out",
            out_path.to_string_lossy().as_ref(),
        ])
        .status()
        .unwrap();

    assert!(status.success());
    let decoded = image::open(&out_path).unwrap();
    // Built-in 320x320 template at the 3x default export scale.
    assert_eq!(decoded.width(), 960);
    assert_eq!(decoded.height(), 960);
}

#[test]
fn cli_preview_writes_scale_one_png() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let photo_path = dir.join("preview_photo.png");
    let out_path = dir.join("preview.png");
    let _ = std::fs::remove_file(&out_path);
    write_photo_fixture(&photo_path, 64, 64);

    let status = std::process::Command::new(framepix_exe())
        .args([
            "preview",
            "--photo",
            photo_path.to_string_lossy().as_ref(),
            "--out",
            out_path.to_string_lossy().as_ref(),
        ])
        .status()
        .unwrap();

    assert!(status.success());
    let decoded = image::open(&out_path).unwrap();
    assert_eq!(decoded.width(), 320);
    assert_eq!(decoded.height(), 320);
}

#[test]
fn cli_rejects_malformed_crop() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let photo_path = dir.join("bad_crop_photo.png");
    write_photo_fixture(&photo_path, 64, 64);

    let status = std::process::Command::new(framepix_exe())
        .args([
            "compose",
            "--photo",
            photo_path.to_string_lossy().as_ref(),
            "--crop",
            "10,10,50",
        ])
        .status()
        .unwrap();

    assert!(!status.success());
}
