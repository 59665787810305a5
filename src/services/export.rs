//! Destinations for a captured QR image: the system clipboard and PNG files.
//!
//! Both sinks are blocking; the render adapter calls them from
//! `tokio::task::spawn_blocking` so the event loop never waits on them.

use camino::{Utf8Path, Utf8PathBuf};
use image::RgbaImage;
use std::borrow::Cow;
use std::fs;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("selected path is not valid UTF-8: {0}")]
    NonUtf8Path(String),
}

/// Writes an image object to the system clipboard
pub trait ClipboardSink: Send + Sync {
    fn write_image(&self, image: &RgbaImage) -> Result<(), ExportError>;
}

/// Saves PNG bytes somewhere the user picks
pub trait FileSink: Send + Sync {
    /// # Returns
    /// The written path, or `None` if the user cancelled
    fn save_png(&self, suggested_name: &str, png: &[u8])
    -> Result<Option<Utf8PathBuf>, ExportError>;
}

/// Clipboard access through `arboard`
///
/// On X11 and Wayland the copied image is served only while the
/// `arboard::Clipboard` that set it is alive, so one handle is opened on the
/// first write and kept until this sink is dropped.
#[derive(Default)]
pub struct ArboardClipboard {
    handle: Mutex<Option<arboard::Clipboard>>,
}

impl ArboardClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn is_open(&self) -> bool {
        self.handle.lock().unwrap().is_some()
    }
}

impl ClipboardSink for ArboardClipboard {
    fn write_image(&self, image: &RgbaImage) -> Result<(), ExportError> {
        let mut handle = self.handle.lock().unwrap();
        let opened = match handle.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new().map_err(|e| ExportError::Clipboard(e.to_string()))?,
        };
        let clipboard = handle.insert(opened);

        let data = arboard::ImageData {
            width: image.width() as usize,
            height: image.height() as usize,
            bytes: Cow::Borrowed(image.as_raw().as_slice()),
        };

        clipboard
            .set_image(data)
            .map_err(|e| ExportError::Clipboard(e.to_string()))
    }
}

/// Native save dialog (`rfd`) followed by a plain file write
#[derive(Debug, Clone)]
pub struct DialogFileSink {
    title: String,
}

impl DialogFileSink {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl FileSink for DialogFileSink {
    fn save_png(
        &self,
        suggested_name: &str,
        png: &[u8],
    ) -> Result<Option<Utf8PathBuf>, ExportError> {
        let picked = rfd::FileDialog::new()
            .set_title(&self.title)
            .set_file_name(suggested_name)
            .add_filter("PNG image", &["png"])
            .save_file();

        let Some(path) = picked else {
            return Ok(None);
        };

        let path = Utf8PathBuf::try_from(path)
            .map_err(|e| ExportError::NonUtf8Path(e.into_path_buf().display().to_string()))?;

        write_png(&path, png)?;
        Ok(Some(path))
    }
}

/// Saves into a fixed directory without asking; used for headless runs and tests
#[derive(Debug, Clone)]
pub struct DirectoryFileSink {
    dir: Utf8PathBuf,
}

impl DirectoryFileSink {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FileSink for DirectoryFileSink {
    fn save_png(
        &self,
        suggested_name: &str,
        png: &[u8],
    ) -> Result<Option<Utf8PathBuf>, ExportError> {
        let path = self.dir.join(suggested_name);
        write_png(&path, png)?;
        Ok(Some(path))
    }
}

fn write_png(path: &Utf8Path, png: &[u8]) -> Result<(), ExportError> {
    fs::write(path, png).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Wrote {} bytes to {}", png.len(), path);
    Ok(())
}
