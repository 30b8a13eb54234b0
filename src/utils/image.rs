//! Image loading for the command-line front end.
//!
//! The gateway trusts its callers to hand it validated images; this is the
//! caller-side check.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use url::Url;

/// Largest image accepted, in bytes.
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Download timeout for remote images.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// MIME types the backends accept.
pub const SUPPORTED_MIME_TYPES: [&str; 7] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/svg+xml",
];

const USER_AGENT: &str = concat!("genai-gateway/", env!("CARGO_PKG_VERSION"));

/// Image bytes with their declared MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// Raw image bytes.
    pub bytes: Vec<u8>,
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
}

/// Loads an image from an `http(s)` URL or a local path.
pub async fn load(source: &str) -> Result<LoadedImage> {
    match Url::parse(source) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => download(url).await,
        _ => load_file(Path::new(source)),
    }
}

/// Reads an image file, taking the MIME type from its extension.
pub fn load_file(path: &Path) -> Result<LoadedImage> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .with_context(|| format!("Cannot determine image type of {}", path.display()))?;
    let mime_type = mime_for_extension(&extension)
        .with_context(|| format!("Unsupported image type: .{extension}"))?;

    let size = fs::metadata(path)
        .with_context(|| format!("Failed to read image file: {}", path.display()))?
        .len();
    check_size(usize::try_from(size).unwrap_or(usize::MAX))?;

    let bytes =
        fs::read(path).with_context(|| format!("Failed to read image file: {}", path.display()))?;
    debug!(path = %path.display(), mime_type, size = bytes.len(), "Loaded image file");
    Ok(LoadedImage {
        bytes,
        mime_type: mime_type.to_string(),
    })
}

async fn download(url: Url) -> Result<LoadedImage> {
    info!(url = %url, "Downloading image");
    let client = reqwest::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("Failed to download image: {url}"))?;
    let status = response.status();
    if !status.is_success() {
        bail!("Failed to download image: HTTP {status}");
    }

    let mime_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map_or("application/octet-stream", |value| {
            value.split(';').next().unwrap_or(value).trim()
        })
        .to_ascii_lowercase();
    if !is_supported(&mime_type) {
        bail!("Unsupported image type: {mime_type}");
    }
    if let Some(length) = response.content_length() {
        check_size(usize::try_from(length).unwrap_or(usize::MAX))?;
    }

    let bytes = read_body(response, MAX_IMAGE_BYTES).await?;
    debug!(mime_type, size = bytes.len(), "Downloaded image");
    Ok(LoadedImage { bytes, mime_type })
}

/// Reads the body chunk by chunk, giving up as soon as it passes `limit`.
async fn read_body(mut response: reqwest::Response, limit: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .context("Failed to read image data")?
    {
        bytes.extend_from_slice(&chunk);
        if bytes.len() > limit {
            bail!(
                "Image is too large: more than {limit} bytes (limit {} MB)",
                MAX_IMAGE_BYTES / (1024 * 1024)
            );
        }
    }
    Ok(bytes)
}

/// Returns true if `mime_type` is on the allow-list.
pub fn is_supported(mime_type: &str) -> bool {
    SUPPORTED_MIME_TYPES.contains(&mime_type)
}

fn mime_for_extension(extension: &str) -> Option<&'static str> {
    match extension {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

fn check_size(size: usize) -> Result<()> {
    if size > MAX_IMAGE_BYTES {
        bail!(
            "Image is too large: {size} bytes (limit {} MB)",
            MAX_IMAGE_BYTES / (1024 * 1024)
        );
    }
    Ok(())
}
