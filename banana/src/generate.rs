use std::path::Path;

use anyhow::Context;
use banana_config::Config;
use banana_imagegen::{GenerationInput, GenerationResult, ImageFormat, ReferenceImage};

use crate::args::GenerateArgs;

/// Run the pipeline once and write the image to `args.out`
///
/// # Errors
///
/// Returns an error if a reference image cannot be read, generation fails,
/// or the output cannot be written
pub async fn run(config: &Config, args: GenerateArgs) -> anyhow::Result<()> {
    let dispatcher = banana_imagegen::build_dispatcher(config)?;

    let mode = match args.mode {
        Some(mode) => mode,
        None => dispatcher
            .default_mode()
            .context("no image generation modes are configured")?
            .to_string(),
    };

    let mut reference_images = Vec::with_capacity(args.references.len());
    for path in &args.references {
        reference_images.push(read_reference(path).await?);
    }

    let input = GenerationInput {
        prompt: args.prompt,
        mode,
        reference_images,
        aspect_ratio: args.aspect_ratio,
        resolution: args.resolution,
        temperature: args.temperature,
        skip_optimization: args.skip_optimization,
    };

    let image = match dispatcher.generate(input).await {
        GenerationResult::Success(image) => image,
        GenerationResult::Failure(failure) => return Err(anyhow::Error::new(failure)),
    };

    let written_as = args
        .out
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let matches = match written_as.as_deref() {
        Some("jpeg") => image.format == ImageFormat::Jpeg,
        Some(ext) => ext == image.format.extension(),
        None => false,
    };
    if !matches {
        tracing::warn!(
            path = %args.out.display(),
            format = image.format.as_str(),
            "output file extension does not match the image format"
        );
    }

    tokio::fs::write(&args.out, &image.bytes)
        .await
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    tracing::info!(
        path = %args.out.display(),
        width = image.width,
        height = image.height,
        bytes = image.bytes.len(),
        "image written"
    );

    Ok(())
}

async fn read_reference(path: &Path) -> anyhow::Result<ReferenceImage> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read reference image {}", path.display()))?;

    let format = ImageFormat::from_magic(&data).unwrap_or(ImageFormat::Png);
    Ok(ReferenceImage::new(data, format.mime_type()))
}
