use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "framepix", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a frame and export it as a print-scale PNG.
    Compose(ComposeArgs),
    /// Render the scale-1 preview PNG instead of the export.
    Preview(ComposeArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Input photo (PNG/JPEG/WEBP).
    #[arg(long)]
    photo: PathBuf,

    /// Crop selection as `x,y,w,h` in display pixels, or with a trailing `%`
    /// for percentages of the display. Defaults to the centered square.
    #[arg(long)]
    crop: Option<String>,

    /// Display size the crop coordinates refer to, as `WxH`. Defaults to the
    /// photo's natural size.
    #[arg(long)]
    display: Option<String>,

    /// Name text field.
    #[arg(long, default_value = "")]
    name: String,

    /// Designation text field.
    #[arg(long, default_value = "")]
    designation: String,

    /// Device pixel density the crop raster is produced at.
    #[arg(long, default_value_t = 1.0)]
    density: f32,

    /// Export scale factor.
    #[arg(long, default_value_t = framepix::DEFAULT_EXPORT_SCALE)]
    scale: f64,

    /// Template JSON; the built-in variant when omitted.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Output path. Defaults to the suggested file name in the current
    /// directory.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => run(args, false),
        Command::Preview(args) => run(args, true),
    }
}

fn run(args: ComposeArgs, preview: bool) -> anyhow::Result<()> {
    let template = match &args.template {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("read template '{}'", path.display()))?;
            serde_json::from_str(&json).with_context(|| "parse template JSON")?
        }
        None => framepix::Template::default(),
    };

    let mut session = framepix::EditorSession::new(template, args.density)?;

    let bytes = std::fs::read(&args.photo)
        .with_context(|| format!("read photo '{}'", args.photo.display()))?;
    session.load_photo(&bytes)?;
    session.advance()?;

    if let Some(display) = &args.display {
        session.set_display(parse_display(display)?);
    }
    let region = match &args.crop {
        Some(spec) => parse_crop(spec)?,
        None => {
            let photo = session.photo().context("no photo loaded")?;
            framepix::centered_square_crop(framepix::DisplayGeometry {
                width: f64::from(photo.width),
                height: f64::from(photo.height),
            })
        }
    };
    session.confirm_crop(region)?;
    session.advance()?;

    session.set_name(args.name.clone());
    session.set_designation(args.designation.clone());

    let (png, suggested) = if preview {
        let surface = session.compose_preview()?;
        let artifact = framepix::export(&surface, 1.0, session.name())?;
        (artifact.png, artifact.file_name)
    } else {
        let artifact = session.export_artifact(args.scale)?;
        (artifact.png, artifact.file_name)
    };

    let out = args.out.unwrap_or_else(|| PathBuf::from(&suggested));
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&out, &png).with_context(|| format!("write png '{}'", out.display()))?;

    eprintln!("wrote {}", out.display());
    Ok(())
}

fn parse_display(spec: &str) -> anyhow::Result<framepix::DisplayGeometry> {
    let (w, h) = spec
        .split_once(['x', 'X'])
        .with_context(|| format!("display must be WxH, got '{spec}'"))?;
    Ok(framepix::DisplayGeometry {
        width: w.trim().parse().with_context(|| "parse display width")?,
        height: h.trim().parse().with_context(|| "parse display height")?,
    })
}

fn parse_crop(spec: &str) -> anyhow::Result<framepix::CropRegion> {
    let (body, unit) = match spec.strip_suffix('%') {
        Some(body) => (body, framepix::CropUnit::Percent),
        None => (spec, framepix::CropUnit::Pixels),
    };
    let parts: Vec<f64> = body
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("crop must be x,y,w,h, got '{spec}'"))?;
    anyhow::ensure!(parts.len() == 4, "crop must have exactly four components");
    Ok(framepix::CropRegion {
        x: parts[0],
        y: parts[1],
        width: parts[2],
        height: parts[3],
        unit,
    })
}
