use std::path::PathBuf;

use anyhow::Context;
use base64::Engine as _;

use crate::assets::decode::decode_image;
use crate::assets::raster::RasterImage;
use crate::foundation::error::{AssetRole, StageError, StageResult};

/// Where an input image comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSource {
    /// Local file.
    Path(PathBuf),
    /// Encoded bytes already in memory (e.g. returned by the background generator).
    Bytes(Vec<u8>),
    /// `data:` URL with a base64 payload.
    DataUrl(String),
    /// `http(s)://` URL; requires the `http` feature.
    Url(String),
}

impl AssetSource {
    /// Classify a user-provided string.
    pub fn parse(s: &str) -> Self {
        let t = s.trim();
        if t.starts_with("data:") {
            Self::DataUrl(t.to_string())
        } else if t.starts_with("http://") || t.starts_with("https://") {
            Self::Url(t.to_string())
        } else {
            Self::Path(PathBuf::from(t))
        }
    }

    /// Short description for logs; never includes inline payloads.
    pub fn describe(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Bytes(b) => format!("<{} bytes>", b.len()),
            Self::DataUrl(u) => format!("<data url, {} chars>", u.len()),
            Self::Url(u) => u.clone(),
        }
    }

    /// Fetch the encoded bytes without decoding.
    pub fn fetch_bytes(&self) -> anyhow::Result<Vec<u8>> {
        match self {
            Self::Path(p) => {
                std::fs::read(p).with_context(|| format!("read image file '{}'", p.display()))
            }
            Self::Bytes(b) => Ok(b.clone()),
            Self::DataUrl(u) => decode_data_url(u),
            Self::Url(u) => fetch_url(u),
        }
    }
}

impl From<Vec<u8>> for AssetSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// Encoded bytes plus their decoded raster.
#[derive(Clone, Debug)]
pub struct LoadedAsset {
    /// Raw encoded bytes as fetched.
    pub bytes: Vec<u8>,
    /// Decoded premultiplied raster.
    pub image: RasterImage,
}

/// Fetch and decode `source`, mapping any failure to [`StageError::AssetLoad`].
#[tracing::instrument(skip(source), fields(source = %source.describe()))]
pub fn load(source: &AssetSource, role: AssetRole) -> StageResult<LoadedAsset> {
    let bytes = source
        .fetch_bytes()
        .map_err(|e| StageError::asset_load(role, e))?;
    let image = decode_image(&bytes).map_err(|e| StageError::asset_load(role, e))?;
    tracing::debug!(
        width = image.width(),
        height = image.height(),
        "decoded {role} image"
    );
    Ok(LoadedAsset { bytes, image })
}

fn decode_data_url(url: &str) -> anyhow::Result<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .context("data URL must start with 'data:'")?;
    let (meta, payload) = rest
        .split_once(',')
        .context("data URL is missing the ',' separator")?;
    if !meta.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
        anyhow::bail!("data URL must be base64-encoded");
    }
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(payload.as_bytes())
        .context("decode base64 data URL payload")
}

#[cfg(feature = "http")]
fn fetch_url(url: &str) -> anyhow::Result<Vec<u8>> {
    let resp = reqwest::blocking::get(url)
        .with_context(|| format!("fetch '{url}'"))?
        .error_for_status()
        .with_context(|| format!("fetch '{url}'"))?;
    let body = resp.bytes().with_context(|| format!("read body of '{url}'"))?;
    Ok(body.to_vec())
}

#[cfg(not(feature = "http"))]
fn fetch_url(url: &str) -> anyhow::Result<Vec<u8>> {
    anyhow::bail!("fetching '{url}' requires the `http` feature")
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
