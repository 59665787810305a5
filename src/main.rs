//! QrDesk - QR code generator for links, contacts, Wi-Fi, events and messages
//!
//! Main entry point for the GUI application.
//!
//! # Overview
//!
//! This binary crate provides the Slint GUI frontend for QrDesk. It initializes:
//! - Configuration loading ([`ConfigManager`])
//! - Logging infrastructure (daily file rotation + console output)
//! - Tokio async runtime (save/copy tasks, feedback timers)
//! - Form state ([`FormController`])
//! - GUI controller ([`GuiController`] - wires the window to state and renderer)
//!
//! Threading model:
//! - **Main thread**: Runs the Slint event loop
//! - **Tokio workers**: Clipboard writes, save dialogs, feedback countdowns
//! - **State listener**: Background std::thread that re-renders on payload changes
//!
//! # Configuration Files
//!
//! `QrDesk Data/QrDesk Settings.yaml` is created with defaults on first run.

use anyhow::Result;
use qrdesk::ui::GuiController;
use qrdesk::{APP_NAME, ConfigManager, FormController, VERSION};
use std::sync::Arc;

fn main() -> Result<()> {
    // Settings are read first so "Debug Mode" can pick the log level
    let config_manager = ConfigManager::new("QrDesk Data")?;
    let created = config_manager.write_default_if_missing()?;
    let config = config_manager.load_config()?;

    // The guard flushes the file appender on exit
    let _guard = qrdesk::logging::setup_logging("logs", "qrdesk", config.settings.debug_mode, true)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);
    if created {
        tracing::info!(
            "Wrote default settings to {}",
            config_manager.settings_path()
        );
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("qrdesk-worker")
        .build()?;

    let form = Arc::new(FormController::new());
    form.load_from_settings(&config.settings);

    let gui_controller =
        GuiController::new(Arc::clone(&form), &config.settings, runtime.handle().clone())?;

    tracing::info!("GUI controller initialized, launching window");

    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");

    // Pending save dialogs or clipboard writes get a moment to finish
    runtime.shutdown_timeout(std::time::Duration::from_secs(2));

    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
