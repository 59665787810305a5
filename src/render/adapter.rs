// RenderAdapter - owns the QR widget and the export/copy actions
//
// Lifecycle: Uninitialized --mount--> Ready --sync--> Ready --dispose--> Disposed.
// The widget is constructed exactly once and updated in place afterwards.

use crate::render::feedback::Feedback;
use crate::render::widget::{QrWidget, RenderError, RenderParams};
use crate::services::export::{ClipboardSink, FileSink};
use image::RgbaImage;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Where the rendered image is shown
pub trait DisplaySurface: Send {
    /// Show `image`, replacing whatever was shown before
    fn attach(&mut self, image: &RgbaImage);

    /// Clear the display
    fn detach(&mut self);
}

/// Builds the widget from the first snapshot
pub type WidgetFactory<W> = Box<dyn Fn(&RenderParams) -> W + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    Uninitialized,
    Ready,
    Disposed,
}

/// Messages and names used by the export/copy actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLabels {
    pub export_file_name: String,
    pub saved: String,
    pub copied: String,
}

impl Default for ActionLabels {
    fn default() -> Self {
        Self {
            export_file_name: "qr.png".to_string(),
            saved: "Saved".to_string(),
            copied: "Copied".to_string(),
        }
    }
}

/// Bridges (payload, options) to a [`QrWidget`] and a [`DisplaySurface`].
///
/// Export and copy capture the current image synchronously, then hand it to a
/// sink on a blocking tokio task. The task finishes on its own even if the
/// payload changes meanwhile; a success shows feedback through [`Feedback`].
///
/// Dropping the adapter disposes the widget and detaches the surface.
pub struct RenderAdapter<W: QrWidget> {
    factory: WidgetFactory<W>,
    widget: Option<W>,
    phase: RenderPhase,
    surface: Box<dyn DisplaySurface>,
    clipboard: Arc<dyn ClipboardSink>,
    files: Arc<dyn FileSink>,
    feedback: Feedback,
    labels: ActionLabels,
    runtime: tokio::runtime::Handle,
}

impl<W: QrWidget + 'static> RenderAdapter<W> {
    pub fn new(
        factory: WidgetFactory<W>,
        surface: Box<dyn DisplaySurface>,
        clipboard: Arc<dyn ClipboardSink>,
        files: Arc<dyn FileSink>,
        feedback: Feedback,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        Self {
            factory,
            widget: None,
            phase: RenderPhase::Uninitialized,
            surface,
            clipboard,
            files,
            feedback,
            labels: ActionLabels::default(),
            runtime,
        }
    }

    pub fn with_labels(mut self, labels: ActionLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    pub fn feedback(&self) -> &Feedback {
        &self.feedback
    }

    /// Construct the widget from the initial snapshot and show it.
    pub fn mount(&mut self, params: &RenderParams) -> Result<(), RenderError> {
        match self.phase {
            RenderPhase::Ready => return Err(RenderError::AlreadyMounted),
            RenderPhase::Disposed => return Err(RenderError::Disposed),
            RenderPhase::Uninitialized => {}
        }

        let widget = (self.factory)(params);
        self.widget = Some(widget);
        self.phase = RenderPhase::Ready;
        tracing::debug!(
            "QR widget mounted ({}x{}, level {})",
            params.width,
            params.height,
            params.error_correction
        );

        self.present();
        Ok(())
    }

    /// Push a new snapshot to the widget, mounting it first if needed.
    ///
    /// A payload the widget cannot render is logged and clears the display;
    /// it is not an error for the caller.
    pub fn sync(&mut self, params: &RenderParams) -> Result<(), RenderError> {
        let widget = match self.phase {
            RenderPhase::Uninitialized => return self.mount(params),
            RenderPhase::Disposed => return Err(RenderError::Disposed),
            RenderPhase::Ready => self.widget.as_mut().ok_or(RenderError::Disposed)?,
        };

        if let Err(e) = widget.update(params) {
            tracing::warn!("QR render failed for {} byte payload: {}", params.payload.len(), e);
        }
        self.present();
        Ok(())
    }

    /// Dispose the widget and detach the display. Idempotent.
    pub fn dispose(&mut self) {
        if self.phase == RenderPhase::Disposed {
            return;
        }
        if let Some(mut widget) = self.widget.take() {
            widget.dispose();
        }
        self.surface.detach();
        self.phase = RenderPhase::Disposed;
        tracing::debug!("QR widget disposed");
    }

    fn present(&mut self) {
        let Some(widget) = self.widget.as_ref() else {
            return;
        };
        match widget.raster() {
            Ok(image) => self.surface.attach(&image),
            Err(e) => {
                tracing::debug!("Nothing to display: {}", e);
                self.surface.detach();
            }
        }
    }

    /// Save the current image as PNG.
    ///
    /// # Returns
    /// `None` if there was nothing to save; otherwise a handle resolving to
    /// `true` when the file was written and "Saved" was shown.
    pub fn export(&self) -> Option<JoinHandle<bool>> {
        let png = match self.ready_widget().map(|w| w.png()) {
            Some(Ok(png)) => png,
            Some(Err(e)) => {
                tracing::warn!("Export skipped: {}", e);
                return None;
            }
            None => {
                tracing::debug!("Export skipped: widget not mounted");
                return None;
            }
        };

        let files = Arc::clone(&self.files);
        let feedback = self.feedback.clone();
        let name = self.labels.export_file_name.clone();
        let saved = self.labels.saved.clone();

        Some(self.runtime.spawn(async move {
            match tokio::task::spawn_blocking(move || files.save_png(&name, &png)).await {
                Ok(Ok(Some(path))) => {
                    tracing::info!("QR code exported to {}", path);
                    feedback.show(saved);
                    true
                }
                Ok(Ok(None)) => {
                    tracing::debug!("Export cancelled");
                    false
                }
                Ok(Err(e)) => {
                    tracing::error!("Export failed: {}", e);
                    false
                }
                Err(e) => {
                    tracing::error!("Export task panicked: {}", e);
                    false
                }
            }
        }))
    }

    /// Put the current image on the clipboard.
    ///
    /// Failures are swallowed: no feedback, nothing propagated, only a debug log.
    pub fn copy(&self) -> Option<JoinHandle<bool>> {
        let image = match self.ready_widget().map(|w| w.raster()) {
            Some(Ok(image)) => image,
            Some(Err(e)) => {
                tracing::debug!("Copy skipped: {}", e);
                return None;
            }
            None => return None,
        };

        let clipboard = Arc::clone(&self.clipboard);
        let feedback = self.feedback.clone();
        let copied = self.labels.copied.clone();

        Some(self.runtime.spawn(async move {
            match tokio::task::spawn_blocking(move || clipboard.write_image(&image)).await {
                Ok(Ok(())) => {
                    feedback.show(copied);
                    true
                }
                Ok(Err(e)) => {
                    tracing::debug!("Clipboard write failed silently: {}", e);
                    false
                }
                Err(e) => {
                    tracing::debug!("Clipboard task aborted: {}", e);
                    false
                }
            }
        }))
    }

    fn ready_widget(&self) -> Option<&W> {
        match self.phase {
            RenderPhase::Ready => self.widget.as_ref(),
            _ => None,
        }
    }
}

impl<W: QrWidget> Drop for RenderAdapter<W> {
    fn drop(&mut self) {
        if self.phase == RenderPhase::Disposed {
            return;
        }
        if let Some(mut widget) = self.widget.take() {
            widget.dispose();
        }
        self.surface.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RenderOptions;
    use crate::render::widget::{QrCodeWidget, QrStyle};
    use crate::services::export::ExportError;
    use camino::Utf8PathBuf;
    use mockall::mock;
    use std::sync::Mutex;

    mock! {
        Clipboard {}
        impl ClipboardSink for Clipboard {
            fn write_image(&self, image: &RgbaImage) -> Result<(), ExportError>;
        }
    }

    mock! {
        Files {}
        impl FileSink for Files {
            fn save_png(&self, suggested_name: &str, png: &[u8]) -> Result<Option<Utf8PathBuf>, ExportError>;
        }
    }

    #[derive(Default)]
    struct SurfaceLog {
        attached: usize,
        detached: usize,
        last_width: Option<u32>,
    }

    struct RecordingSurface(Arc<Mutex<SurfaceLog>>);

    impl DisplaySurface for RecordingSurface {
        fn attach(&mut self, image: &RgbaImage) {
            let mut log = self.0.lock().unwrap();
            log.attached += 1;
            log.last_width = Some(image.width());
        }

        fn detach(&mut self) {
            let mut log = self.0.lock().unwrap();
            log.detached += 1;
            log.last_width = None;
        }
    }

    fn adapter(
        clipboard: MockClipboard,
        files: MockFiles,
    ) -> (RenderAdapter<QrCodeWidget>, Arc<Mutex<SurfaceLog>>) {
        let log = Arc::new(Mutex::new(SurfaceLog::default()));
        let runtime = tokio::runtime::Handle::current();
        let adapter = RenderAdapter::new(
            Box::new(|params| QrCodeWidget::create(params, QrStyle::default())),
            Box::new(RecordingSurface(Arc::clone(&log))),
            Arc::new(clipboard),
            Arc::new(files),
            Feedback::new(std::time::Duration::from_millis(1500), runtime.clone()),
            runtime,
        );
        (adapter, log)
    }

    fn params(payload: &str) -> RenderParams {
        RenderParams::new(payload, &RenderOptions::default())
    }

    #[tokio::test]
    async fn test_mount_attaches_once() {
        let (mut adapter, log) = adapter(MockClipboard::new(), MockFiles::new());

        adapter.mount(&params("hello")).unwrap();

        assert_eq!(adapter.phase(), RenderPhase::Ready);
        assert_eq!(log.lock().unwrap().attached, 1);
        assert!(matches!(
            adapter.mount(&params("again")),
            Err(RenderError::AlreadyMounted)
        ));
    }

    #[tokio::test]
    async fn test_unrenderable_payload_detaches() {
        let (mut adapter, log) = adapter(MockClipboard::new(), MockFiles::new());
        adapter.mount(&params("hello")).unwrap();

        adapter.sync(&params(&"x".repeat(5000))).unwrap();

        assert_eq!(log.lock().unwrap().last_width, None);
        assert!(adapter.copy().is_none());
    }

    #[tokio::test]
    async fn test_copy_failure_is_silent() {
        let mut clipboard = MockClipboard::new();
        clipboard
            .expect_write_image()
            .times(1)
            .returning(|_| Err(ExportError::Clipboard("permission denied".to_string())));
        let (mut adapter, _log) = adapter(clipboard, MockFiles::new());
        adapter.mount(&params("hello")).unwrap();

        let copied = adapter.copy().unwrap().await.unwrap();

        assert!(!copied);
        assert_eq!(adapter.feedback().current(), "");
    }

    #[tokio::test]
    async fn test_export_cancel_sets_no_feedback() {
        let mut files = MockFiles::new();
        files
            .expect_save_png()
            .withf(|name, png| name.to_string() == "qr.png" && png.starts_with(b"\x89PNG"))
            .times(1)
            .returning(|_, _| Ok(None));
        let (mut adapter, _log) = adapter(MockClipboard::new(), files);
        adapter.mount(&params("hello")).unwrap();

        let saved = adapter.export().unwrap().await.unwrap();

        assert!(!saved);
        assert_eq!(adapter.feedback().current(), "");
    }

    #[tokio::test]
    async fn test_dispose_detaches_and_blocks_actions() {
        let (mut adapter, log) = adapter(MockClipboard::new(), MockFiles::new());
        adapter.mount(&params("hello")).unwrap();

        adapter.dispose();
        adapter.dispose();

        assert_eq!(adapter.phase(), RenderPhase::Disposed);
        assert_eq!(log.lock().unwrap().detached, 1);
        assert!(adapter.export().is_none());
        assert!(matches!(adapter.sync(&params("late")), Err(RenderError::Disposed)));
    }

    #[tokio::test]
    async fn test_drop_detaches_surface() {
        let (mut adapter, log) = adapter(MockClipboard::new(), MockFiles::new());
        adapter.mount(&params("hello")).unwrap();

        drop(adapter);

        assert_eq!(log.lock().unwrap().detached, 1);
    }
}
