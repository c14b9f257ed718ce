//! Image sources for signature and image fields: data URLs and remote URLs.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use base64::prelude::*;
use image::DynamicImage;

use crate::coords::Rect;

/// Raw bytes as returned by a blob fetch.
#[derive(Debug, Clone)]
pub struct FetchedBlob {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Fetches remote images. Called once per field, in draw order.
pub trait BlobFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<FetchedBlob>;
}

/// Blocking HTTP fetcher. Must not be built or used on an async worker.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<HttpFetcher> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("building the HTTP client")?;
        Ok(HttpFetcher { client })
    }
}

impl BlobFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedBlob> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("failed to download {url}"))?
            .error_for_status()
            .with_context(|| format!("failed to download {url}"))?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().context("failed to read image data")?.to_vec();
        Ok(FetchedBlob { content_type, bytes })
    }
}

/// Image encodings that can be embedded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// From a media type such as `image/png; charset=binary`.
    /// `None` means the type is unknown or generic.
    pub fn from_media_type(media_type: &str) -> Option<Result<ImageKind>> {
        let essence = media_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "" | "application/octet-stream" | "binary/octet-stream" => None,
            "image/png" => Some(Ok(ImageKind::Png)),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Ok(ImageKind::Jpeg)),
            other => Some(Err(anyhow!("unsupported image type {other}"))),
        }
    }

    pub fn sniff(bytes: &[u8]) -> Option<ImageKind> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageKind::Png)
        } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
            Some(ImageKind::Jpeg)
        } else {
            None
        }
    }

    fn format(self) -> image::ImageFormat {
        match self {
            ImageKind::Png => image::ImageFormat::Png,
            ImageKind::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Split `data:<type>;base64,<payload>` and decode the payload.
pub fn parse_data_url(url: &str) -> Result<(String, Vec<u8>)> {
    let rest = url.strip_prefix("data:").ok_or_else(|| anyhow!("not a data URL"))?;
    let (header, payload) = rest.split_once(',').ok_or_else(|| anyhow!("data URL has no payload"))?;
    let Some(media_type) = header.strip_suffix(";base64") else {
        bail!("only base64 data URLs are supported");
    };
    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64_STANDARD.decode(payload).context("bad base64 in data URL")?;
    Ok((media_type.to_string(), bytes))
}

/// Resolve a field value to encoded image bytes.
pub fn load_source(source: &str, fetcher: &dyn BlobFetcher) -> Result<(ImageKind, Vec<u8>)> {
    let (declared, bytes) = if source.starts_with("data:") {
        let (media_type, bytes) = parse_data_url(source)?;
        (Some(media_type), bytes)
    } else if source.starts_with("http://") || source.starts_with("https://") {
        let blob = fetcher.fetch(source)?;
        (blob.content_type, blob.bytes)
    } else {
        bail!("image value is neither a data URL nor an absolute http(s) URL");
    };

    let kind = match declared.as_deref().and_then(ImageKind::from_media_type) {
        Some(kind) => kind?,
        None => ImageKind::sniff(&bytes).ok_or_else(|| anyhow!("unrecognized image data"))?,
    };
    Ok((kind, bytes))
}

pub fn decode(kind: ImageKind, bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory_with_format(bytes, kind.format())
        .with_context(|| format!("failed to decode {kind:?} image"))
}

/// Largest rect with the image's aspect ratio that fits in `bounds`, centered.
pub fn contain(image_width: u32, image_height: u32, bounds: Rect) -> Rect {
    let (iw, ih) = (f64::from(image_width), f64::from(image_height));
    let scale = (bounds.width / iw).min(bounds.height / ih);
    let (w, h) = (iw * scale, ih * scale);
    Rect::new(
        bounds.x + (bounds.width - w) / 2.0,
        bounds.y + (bounds.height - h) / 2.0,
        w,
        h,
    )
}
