// EventLoopBridge - marshals work between the tokio runtime and the Slint event loop
//
// Slint owns the main thread; export/copy and feedback timers run on tokio.
// Anything that touches the window from a tokio task or the state-listener
// thread goes through update_ui(), which queues the closure on the Slint loop.

use slint::{ComponentHandle, Weak};
use std::future::Future;

/// Cloneable handle pairing a weak window reference with the tokio runtime
///
/// # Example
/// ```ignore
/// let bridge = EventLoopBridge::new(&ui, runtime.handle().clone());
/// bridge.update_ui(|ui| ui.set_feedback("Saved".into()));
/// ```
pub struct EventLoopBridge<T: ComponentHandle> {
    ui_weak: Weak<T>,
    tokio_handle: tokio::runtime::Handle,
}

// Manual Clone implementation to avoid requiring T: Clone
impl<T: ComponentHandle> Clone for EventLoopBridge<T> {
    fn clone(&self) -> Self {
        Self {
            ui_weak: self.ui_weak.clone(),
            tokio_handle: self.tokio_handle.clone(),
        }
    }
}

impl<T: ComponentHandle + 'static> EventLoopBridge<T> {
    pub fn new(ui: &T, tokio_handle: tokio::runtime::Handle) -> Self {
        Self {
            ui_weak: ui.as_weak(),
            tokio_handle,
        }
    }

    /// Run `update` on the Slint event loop thread.
    ///
    /// Safe to call from any thread. Dropped with a warning if the event loop
    /// has already stopped.
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        if let Err(e) = self.ui_weak.upgrade_in_event_loop(move |ui| update(&ui)) {
            tracing::warn!("Failed to queue UI update to event loop: {:?}", e);
        }
    }

    /// Spawn a future on the tokio runtime from a Slint callback
    pub fn spawn_async<F, Fut>(&self, future_factory: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.tokio_handle.spawn(async move {
            future_factory().await;
        });
    }
}
