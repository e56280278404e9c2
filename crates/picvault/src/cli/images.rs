//! Image command handlers.

use super::commands::OutputFormat;
use picvault::{ImageService, ImageView, Upload, ValidationError};
use std::path::Path;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Upload a file.
pub async fn upload(
    service: &ImageService,
    directory: &str,
    file: &Path,
    tags: Vec<String>,
) -> CliResult {
    let data = tokio::fs::read(file).await.map_err(|e| {
        picvault::PicvaultError::from(ValidationError::new(format!(
            "Cannot read {}: {}",
            file.display(),
            e
        )))
    })?;

    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            picvault::PicvaultError::from(ValidationError::new(format!(
                "{} has no file name",
                file.display()
            )))
        })?;

    let content_type = image::ImageFormat::from_path(file)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");

    let id = service
        .save_image(
            Upload::new(directory, filename, data)
                .with_content_type(content_type)
                .with_tags(tags),
        )
        .await?;

    println!("{}", id);
    Ok(())
}

/// List a directory.
pub async fn list(
    service: &ImageService,
    directory: &str,
    tags: &[String],
    page: i64,
    page_size: i64,
    format: OutputFormat,
) -> CliResult {
    let listing = service.list_images(directory, tags, page, page_size).await?;
    let views = service.describe_images(&listing).await?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "images": views,
                "total": listing.total,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Human => {
            println!("Images in '{}':", directory);
            println!("{:-<80}", "");
            for view in &views {
                print_view(view);
                println!("{:-<80}", "");
            }
            println!("Showing {} of {} images", views.len(), listing.total);
        }
    }

    Ok(())
}

/// Show one image.
pub async fn show(service: &ImageService, id: i64, format: OutputFormat) -> CliResult {
    let view = service.get_image(id).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Human => print_view(&view),
    }
    Ok(())
}

/// Delete images.
pub async fn delete(service: &ImageService, ids: &[i64]) -> CliResult {
    service.delete_images(ids).await?;
    println!("Deleted {} image(s)", ids.len());
    Ok(())
}

/// List directories.
pub async fn directories(service: &ImageService) -> CliResult {
    for directory in service.list_directories().await? {
        println!("{}", directory);
    }
    Ok(())
}

fn print_view(view: &ImageView) {
    println!("#{} {} ({} bytes)", view.id, view.name, view.size);
    println!("  created:   {}", view.created_at);
    println!("  tags:      {}", view.tags.join(", "));
    println!("  url:       {}", view.url);
    println!("  thumbnail: {}", view.thumbnail_url);
}
