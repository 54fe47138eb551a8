use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use eraser_core::inpainting::domain::inpainter::Inpainter;
use eraser_core::inpainting::infrastructure::command_inpainter::CommandInpainter;
use eraser_core::inpainting::infrastructure::mask_preview_inpainter::MaskPreviewInpainter;
use eraser_core::masking::domain::mask_location::MaskLocation;
use eraser_core::masking::domain::mask_rasterizer;
use eraser_core::pipeline::inpaint_video_use_case::InpaintVideoUseCase;
use eraser_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use eraser_core::pipeline::synthesize_mask_use_case::SynthesizeMaskUseCase;
use eraser_core::shared::constants::IMAGE_EXTENSIONS;
use eraser_core::shared::error::InpaintError;
use eraser_core::shared::region::Region;
use eraser_core::shared::video_metadata::VideoMetadata;
use eraser_core::video::domain::image_writer::ImageWriter;
use eraser_core::video::domain::video_codec::VideoCodec;
use eraser_core::video::domain::video_reader::VideoReader;
use eraser_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use eraser_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use eraser_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Erase a static rectangle from a video with an inpainting model.
#[derive(Parser)]
#[command(name = "eraser")]
struct Cli {
    /// Source video.
    input: PathBuf,

    /// Result video.
    output: PathBuf,

    /// Left edge of the region in pixels (fractions are truncated).
    #[arg(long, allow_negative_numbers = true)]
    x: f64,

    /// Top edge of the region in pixels.
    #[arg(long, allow_negative_numbers = true)]
    y: f64,

    /// Region width in pixels.
    #[arg(long, allow_negative_numbers = true)]
    width: f64,

    /// Region height in pixels.
    #[arg(long, allow_negative_numbers = true)]
    height: f64,

    /// Write the mask video itself as the result instead of inpainting.
    #[arg(long)]
    mask_only: bool,

    /// Inpainting program with {video}, {mask} and {output} placeholders.
    #[arg(long)]
    inpaint_command: Option<String>,

    /// Directory for per-request mask files (default: system temp dir).
    #[arg(long, conflicts_with = "mask_path")]
    mask_dir: Option<PathBuf>,

    /// Always write the mask to this one file. Unsafe with concurrent runs.
    #[arg(long)]
    mask_path: Option<PathBuf>,

    /// Keep the per-request mask file after the run.
    #[arg(long)]
    keep_mask: bool,

    /// Mask codec: png (lossless) or mpeg4.
    #[arg(long, default_value = "png")]
    codec: String,

    /// Also save the single mask frame as an image.
    #[arg(long)]
    mask_preview: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let codec: VideoCodec = cli.codec.parse()?;
    let region = Region::from_coordinates(cli.x, cli.y, cli.width, cli.height);
    log::info!("Erasing region {region} from {}", cli.input.display());

    if let Some(preview) = &cli.mask_preview {
        write_mask_preview(&mut FfmpegReader::new(), &cli.input, &region, preview)?;
    }

    let synthesizer = SynthesizeMaskUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(FfmpegWriter::with_codec(codec)),
        mask_location(&cli, codec),
        None,
    );
    let mut use_case = InpaintVideoUseCase::new(
        synthesizer,
        build_inpainter(&cli)?,
        Box::new(StdoutPipelineLogger::default()),
        None,
    )
    .keep_mask(cli.keep_mask);

    let outcome = use_case.execute(&cli.input, &region, &cli.output)?;
    if let Some(mask) = &outcome.kept_mask {
        log::info!("Mask kept at {}", mask.display());
    }
    log::info!("Output written to {}", outcome.output.display());
    Ok(())
}

fn mask_location(cli: &Cli, codec: VideoCodec) -> MaskLocation {
    if let Some(path) = &cli.mask_path {
        return MaskLocation::Fixed(path.clone());
    }
    let dir = cli.mask_dir.clone().unwrap_or_else(std::env::temp_dir);
    MaskLocation::per_request_in(dir)
        .with_extension(codec.container())
}

/// Lowercase container extension the mask is written with.
fn mask_container(location: &MaskLocation) -> String {
    match location {
        MaskLocation::Fixed(path) => path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_lowercase(),
        MaskLocation::PerRequest { extension, .. } => extension.to_lowercase(),
    }
}

fn build_inpainter(cli: &Cli) -> Result<Box<dyn Inpainter>, Box<dyn std::error::Error>> {
    if cli.mask_only {
        return Ok(Box::new(MaskPreviewInpainter::new()));
    }
    let template = cli
        .inpaint_command
        .as_deref()
        .ok_or("--inpaint-command is required unless --mask-only is used")?;
    Ok(Box::new(CommandInpainter::from_template(template)?))
}

fn read_metadata(
    reader: &mut dyn VideoReader,
    input: &Path,
) -> Result<VideoMetadata, InpaintError> {
    let opened = reader.open(input);
    reader.close();

    let metadata_error = |reason: String| InpaintError::Metadata {
        path: input.to_path_buf(),
        reason,
    };
    let metadata = opened.map_err(|e| metadata_error(e.to_string()))?;
    metadata.validate().map_err(metadata_error)?;
    Ok(metadata)
}

fn write_mask_preview(
    reader: &mut dyn VideoReader,
    input: &Path,
    region: &Region,
    preview: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = read_metadata(reader, input)?;
    let mask = mask_rasterizer::rasterize(metadata.width, metadata.height, region);
    ImageFileWriter::new().write(preview, &mask)?;
    log::info!("Mask preview written to {}", preview.display());
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        let input = cli.input.display();
        return Err(format!("Input file not found: {input}").into());
    }
    for (name, value) in [
        ("x", cli.x),
        ("y", cli.y),
        ("width", cli.width),
        ("height", cli.height),
    ] {
        if !value.is_finite() {
            return Err(format!("--{name} must be finite, got {value}").into());
        }
    }
    if cli.width <= 0.0 || cli.height <= 0.0 {
        log::warn!(
            "Region {}x{} is empty; the mask will not cover any pixels",
            cli.width,
            cli.height
        );
    }
    let codec: VideoCodec = cli.codec.parse()?;
    if !cli.mask_only && cli.inpaint_command.is_none() {
        return Err("--inpaint-command is required unless --mask-only is used".into());
    }
    if cli.mask_only && cli.inpaint_command.is_some() {
        return Err("--mask-only and --inpaint-command are mutually exclusive".into());
    }
    if cli.keep_mask && cli.mask_path.is_some() {
        log::warn!("--keep-mask has no effect with --mask-path; the fixed mask is always kept");
    }
    if !codec.is_lossless() {
        log::warn!("{} masks are lossy; edges of the region may blur", cli.codec);
    }
    if let Some(path) = &cli.mask_path {
        if codec.is_lossless() && has_extension(path, &["mp4"]) {
            return Err("Lossless masks cannot be stored in .mp4; use .avi, .mov or .mkv".into());
        }
    }
    if cli.mask_only {
        let container = mask_container(&mask_location(cli, codec));
        if !has_extension(&cli.output, &[container.as_str()]) {
            return Err(format!(
                "--mask-only output must be a .{container} file like the mask, got {}",
                cli.output.display()
            )
            .into());
        }
    }
    if let Some(preview) = &cli.mask_preview {
        if !has_extension(preview, IMAGE_EXTENSIONS) {
            return Err(format!(
                "Mask preview must be an image file ({}), got {}",
                IMAGE_EXTENSIONS.join(", "),
                preview.display()
            )
            .into());
        }
    }
    Ok(())
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
