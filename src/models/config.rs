use crate::models::{DEFAULT_URL, ErrorCorrectionLevel, PixelSize, RenderOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings file structure for `QrDesk Settings.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(rename = "QrDesk_Settings", default)]
    pub settings: QrSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrSettings {
    #[serde(rename = "Default Error Correction", default)]
    pub default_error_correction: ErrorCorrectionLevel,

    #[serde(rename = "Default Pixel Size", default)]
    pub default_pixel_size: PixelSize,

    #[serde(rename = "Initial URL", default = "default_initial_url")]
    pub initial_url: String,

    #[serde(rename = "Feedback Millis", default = "default_feedback_millis")]
    pub feedback_millis: u64,

    #[serde(rename = "Export File Name", default = "default_export_file_name")]
    pub export_file_name: String,

    #[serde(rename = "Debug Mode", default)]
    pub debug_mode: bool,

    #[serde(rename = "Strings", default)]
    pub strings: Strings,
}

impl Default for QrSettings {
    fn default() -> Self {
        Self {
            default_error_correction: ErrorCorrectionLevel::default(),
            default_pixel_size: PixelSize::default(),
            initial_url: default_initial_url(),
            feedback_millis: default_feedback_millis(),
            export_file_name: default_export_file_name(),
            debug_mode: false,
            strings: Strings::default(),
        }
    }
}

fn default_initial_url() -> String {
    DEFAULT_URL.to_string()
}

fn default_feedback_millis() -> u64 {
    1500
}

fn default_export_file_name() -> String {
    "qr.png".to_string()
}

/// Every user-facing message, in one overridable table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strings {
    #[serde(rename = "Window Title", default = "default_window_title")]
    pub window_title: String,

    #[serde(rename = "Saved", default = "default_saved")]
    pub saved: String,

    #[serde(rename = "Copied", default = "default_copied")]
    pub copied: String,

    #[serde(rename = "Event Range Invalid", default = "default_event_range_invalid")]
    pub event_range_invalid: String,

    #[serde(rename = "Save Dialog Title", default = "default_save_dialog_title")]
    pub save_dialog_title: String,
}

impl Default for Strings {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            saved: default_saved(),
            copied: default_copied(),
            event_range_invalid: default_event_range_invalid(),
            save_dialog_title: default_save_dialog_title(),
        }
    }
}

fn default_window_title() -> String {
    "QR Code Generator".to_string()
}

fn default_saved() -> String {
    "Saved".to_string()
}

fn default_copied() -> String {
    "Copied".to_string()
}

fn default_event_range_invalid() -> String {
    "Start date cannot be later than end date.".to_string()
}

fn default_save_dialog_title() -> String {
    "Save QR Code".to_string()
}

impl QrSettings {
    /// Render options the window starts with
    pub fn initial_options(&self) -> RenderOptions {
        RenderOptions {
            error_correction: self.default_error_correction,
            pixel_size: self.default_pixel_size,
        }
    }

    pub fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.feedback_millis)
    }
}
