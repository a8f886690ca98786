use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use anyhow::Context;

use crate::foundation::error::{StageError, StageResult};

const FONT_EXTENSIONS: [&str; 3] = ["ttf", "otf", "ttc"];

type ReadFn = Arc<dyn Fn(&Path) -> std::io::Result<Vec<u8>> + Send + Sync>;

/// Font provisioning settings.
#[derive(Clone, Debug)]
pub struct FontProviderOpts {
    /// Directories searched for `<id>.{ttf,otf,ttc}`.
    pub search_dirs: Vec<PathBuf>,
    /// Upper bound on one provisioning attempt.
    pub timeout: Duration,
    /// Generic family name reported when falling back.
    pub fallback_family: String,
    /// Candidate font files for the fallback family; the first readable one wins.
    pub fallback_files: Vec<PathBuf>,
}

/// A font ready for shaping.
#[derive(Clone, Debug)]
pub struct ResolvedFont {
    /// Family name registered for the font (or the generic fallback name).
    pub family: String,
    /// Font file bytes; `None` when even the fallback could not be read.
    pub bytes: Option<Arc<Vec<u8>>>,
    /// `true` when this is the fallback rather than the requested font.
    pub is_fallback: bool,
}

/// Resolves font identifiers to loaded fonts with a bounded wait.
///
/// One provider is meant to live for the whole process; successful resolutions are cached so a
/// second request for the same identifier performs no IO.
pub struct FontProvider {
    opts: FontProviderOpts,
    loaded: Mutex<HashMap<String, Arc<ResolvedFont>>>,
    fallback: OnceLock<Arc<ResolvedFont>>,
    read: ReadFn,
}

impl std::fmt::Debug for FontProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontProvider")
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl FontProvider {
    /// Provider reading fonts from the filesystem.
    pub fn new(opts: FontProviderOpts) -> Self {
        Self::with_reader(opts, Arc::new(|p: &Path| std::fs::read(p)))
    }

    pub(crate) fn with_reader(opts: FontProviderOpts, read: ReadFn) -> Self {
        Self {
            opts,
            loaded: Mutex::new(HashMap::new()),
            fallback: OnceLock::new(),
            read,
        }
    }

    /// Resolve `font_id`, degrading to the fallback family on timeout or any failure.
    pub fn ensure(&self, font_id: &str) -> Arc<ResolvedFont> {
        match self.try_ensure(font_id) {
            Ok(font) => font,
            Err(err) => {
                tracing::warn!(font = font_id, error = %err, "font unavailable, using fallback");
                self.fallback()
            }
        }
    }

    /// Resolve `font_id`, reporting why it failed instead of falling back.
    pub fn try_ensure(&self, font_id: &str) -> StageResult<Arc<ResolvedFont>> {
        let key = font_id.trim();
        if key.is_empty() {
            return Err(StageError::validation("font identifier must be non-empty"));
        }
        if let Some(font) = self.cached(key) {
            return Ok(font);
        }

        let (tx, rx) = mpsc::channel();
        let id = key.to_string();
        let dirs = self.opts.search_dirs.clone();
        let read = Arc::clone(&self.read);
        std::thread::Builder::new()
            .name("font-load".to_string())
            .spawn(move || {
                let _ = tx.send(load_font(&id, &dirs, read.as_ref()));
            })
            .context("spawn font loader thread")?;

        let font = match rx.recv_timeout(self.opts.timeout) {
            Ok(Ok((family, bytes))) => Arc::new(ResolvedFont {
                family,
                bytes: Some(Arc::new(bytes)),
                is_fallback: false,
            }),
            Ok(Err(e)) => return Err(StageError::Other(e)),
            Err(RecvTimeoutError::Timeout) => {
                return Err(StageError::FontTimeout {
                    font: key.to_string(),
                    waited_ms: self.opts.timeout.as_millis() as u64,
                });
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(StageError::Other(anyhow::anyhow!(
                    "font loader for '{key}' exited without a result"
                )));
            }
        };

        tracing::debug!(font = key, family = %font.family, "font registered");
        let mut loaded = self.loaded.lock().unwrap_or_else(|p| p.into_inner());
        Ok(Arc::clone(loaded.entry(key.to_string()).or_insert(font)))
    }

    /// The fallback font, loaded once.
    pub fn fallback(&self) -> Arc<ResolvedFont> {
        Arc::clone(self.fallback.get_or_init(|| {
            let bytes = self
                .opts
                .fallback_files
                .iter()
                .find_map(|p| (self.read)(p.as_path()).ok().filter(|b| family_name_of(b).is_ok()));
            if bytes.is_none() {
                tracing::warn!("no fallback font file readable; text will be skipped");
            }
            Arc::new(ResolvedFont {
                family: self.opts.fallback_family.clone(),
                bytes: bytes.map(Arc::new),
                is_fallback: true,
            })
        }))
    }

    fn cached(&self, key: &str) -> Option<Arc<ResolvedFont>> {
        let loaded = self.loaded.lock().unwrap_or_else(|p| p.into_inner());
        loaded.get(key).cloned()
    }
}

fn load_font(
    id: &str,
    dirs: &[PathBuf],
    read: &(dyn Fn(&Path) -> std::io::Result<Vec<u8>> + Send + Sync),
) -> anyhow::Result<(String, Vec<u8>)> {
    let path = locate_font(id, dirs).with_context(|| format!("font '{id}' not found"))?;
    let bytes = read(path.as_path()).with_context(|| format!("read font '{}'", path.display()))?;
    let family = family_name_of(&bytes)?;
    Ok((family, bytes))
}

/// Find the file for `id`: a direct path, or `<dir>/<id>.<ext>` matched loosely on the stem.
pub(crate) fn locate_font(id: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let direct = Path::new(id);
    if has_font_extension(direct) && direct.is_file() {
        return Some(direct.to_path_buf());
    }

    let want = normalize_font_key(id);
    for dir in dirs {
        let Ok(entries) = std::fs::read_dir(dir) else {
            continue;
        };
        let mut matches: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| has_font_extension(p))
            .filter(|p| {
                p.file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|s| normalize_font_key(s) == want)
            })
            .collect();
        matches.sort();
        if let Some(p) = matches.into_iter().next() {
            return Some(p);
        }
    }
    None
}

fn has_font_extension(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FONT_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

fn normalize_font_key(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Register `bytes` with a scratch font collection and return the first family name.
pub(crate) fn family_name_of(bytes: &[u8]) -> anyhow::Result<String> {
    let mut font_ctx = parley::FontContext::default();
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.to_vec()), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .context("no font families registered from font bytes")?;
    let name = font_ctx
        .collection
        .family_name(family_id)
        .context("registered font family has no name")?;
    Ok(name.to_string())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
