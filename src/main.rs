use anyhow::{bail, Context, Result};
use clap::Parser;
use imagen::cli::{Cli, Commands, RenderArgs};
use imagen::{
    calculate_aspect_ratio, format_file_size, generate_output_path, ImageProcessor,
    ProcessConfig, RenditionKind, RenditionRequest, ServerConfig,
};
use log::LevelFilter;
use std::path::PathBuf;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logger
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Serve(args) => serve(args.into()),
        Commands::Digitize {
            input,
            output,
            render,
        } => process_rendition(input, output, render, None),
        Commands::Compress {
            input,
            output,
            render,
            quality,
        } => process_rendition(input, output, render, Some(quality)),
        Commands::Info { input } => process_info(input),
    }
}

fn serve(config: ServerConfig) -> Result<()> {
    actix_web::rt::System::new()
        .block_on(imagen::server::run(config))
        .context("HTTP server failed")
}

fn process_rendition(
    input: PathBuf,
    output: Option<PathBuf>,
    render: RenderArgs,
    quality: Option<String>,
) -> Result<()> {
    let kind = if quality.is_some() {
        RenditionKind::Compressed
    } else {
        RenditionKind::Digitized
    };

    let output_path = generate_output_path(&input, output.as_deref(), &kind.to_string());

    let mut request = RenditionRequest::new(render.resolution, render.bits_per_channel);
    request.quality = quality;
    let request = kind.prepare(request)?;

    let config = ProcessConfig::from(render.process);
    config.validate()?;

    let processor = ImageProcessor::new(config);
    let written = processor
        .process_file(&input, &output_path, &request)
        .with_context(|| format!("Failed to render {}", input.display()))?;

    println!(
        "{} image saved to: {} ({})",
        kind,
        output_path.display(),
        format_file_size(written)
    );

    Ok(())
}

fn process_info(input: PathBuf) -> Result<()> {
    if !input.exists() {
        bail!("File does not exist: {}", input.display());
    }

    let metadata = ImageProcessor::default().get_metadata(&input)?;
    let aspect_ratio = calculate_aspect_ratio(metadata.width, metadata.height);

    println!("=== Image Information ===");
    println!("File: {}", input.display());
    println!("Size: {}", format_file_size(metadata.file_size));
    println!("Dimensions: {} x {} pixels", metadata.width, metadata.height);
    println!("Aspect Ratio: {:.2}:1", aspect_ratio);
    println!("Format: {}", metadata.format);

    Ok(())
}
