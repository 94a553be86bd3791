//! Exporting the edited image to disk, converting format if necessary.

use std::io::Write;
use std::path::Path;

use image::ImageFormat;

use crate::error::EditError;
use crate::ports::ImagePayload;

/// File name used when no output path is given.
pub const DEFAULT_OUTPUT_FILENAME: &str = "snapedit-ai-result.png";

/// Output path that prints the result as a data URL instead of a file.
pub const STDOUT_TARGET: &str = "-";

/// Formats the output path's extension may request.
const SUPPORTED_FORMATS: &[ImageFormat] = &[ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::WebP];

/// Whether `target` names stdout rather than a file.
#[must_use]
pub fn is_stdout(target: &Path) -> bool {
    target == Path::new(STDOUT_TARGET)
}

/// Export to `target`: a file via [`save_image`], or a data URL line on
/// `stdout` when the target is [`STDOUT_TARGET`].
///
/// # Errors
///
/// Returns any error from [`save_image`] or from writing to `stdout`.
pub fn export<W: Write>(
    image: &ImagePayload,
    target: &Path,
    stdout: &mut W,
) -> Result<(), EditError> {
    if is_stdout(target) {
        writeln!(stdout, "{}", image.to_data_url())?;
        Ok(())
    } else {
        save_image(image, target)
    }
}

/// Save an image, converting to the format named by the path's extension.
///
/// A path without an extension receives the bytes unchanged.
///
/// # Errors
///
/// Returns an error if the extension names an unsupported format, the image
/// cannot be decoded for conversion, or the file cannot be written.
pub fn save_image(image: &ImagePayload, output_path: &Path) -> Result<(), EditError> {
    match target_format(output_path)? {
        Some(format) if format.to_mime_type() != image.mime_type => {
            tracing::debug!(
                from = %image.mime_type,
                to = format.to_mime_type(),
                "converting before save"
            );
            convert_and_save(&image.data, format, output_path)
        }
        _ => std::fs::write(output_path, &image.data).map_err(EditError::Io),
    }
}

/// The format requested by the path's extension, if it has one.
fn target_format(path: &Path) -> Result<Option<ImageFormat>, EditError> {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Ok(None);
    };
    ImageFormat::from_extension(ext)
        .filter(|f| SUPPORTED_FORMATS.contains(f))
        .map(Some)
        .ok_or_else(|| {
            EditError::InvalidArgument(format!(
                "Unsupported output format '.{ext}'. Valid: png, jpg, jpeg, webp"
            ))
        })
}

fn convert_and_save(data: &[u8], format: ImageFormat, output_path: &Path) -> Result<(), EditError> {
    let img = image::load_from_memory(data)
        .map_err(|e| EditError::ImageConversion(format!("Failed to decode image: {e}")))?;

    // JPEG carries no alpha channel.
    let img = if format == ImageFormat::Jpeg {
        image::DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        img
    };

    img.save_with_format(output_path, format).map_err(|e| {
        EditError::ImageConversion(format!("Failed to save as {}: {e}", format.to_mime_type()))
    })
}
