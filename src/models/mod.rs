//! Data models for QrDesk.
//!
//! - [`AppState`]: active content type, all form records, render options
//! - [`FormState`] and the per-type field records ([`UrlFields`], [`VCardFields`], ...)
//! - [`FieldKey`] / [`FieldValue`]: typed single-field edits
//! - [`RenderOptions`]: error-correction level and pixel size
//! - [`AppConfig`]: settings and the user-facing string table from `QrDesk Settings.yaml`

pub mod app_state;
pub mod config;
pub mod content;
pub mod options;

pub use app_state::AppState;
pub use config::{AppConfig, QrSettings, Strings};
pub use content::{
    ContentType, DEFAULT_URL, EventField, EventFields, FieldKey, FieldValue, FormError, FormState,
    MessageField, MessageFields, MessageKind, UrlField, UrlFields, VCardField, VCardFields,
    WifiField, WifiFields,
};
pub use options::{ErrorCorrectionLevel, OptionError, PixelSize, RenderOptions};
