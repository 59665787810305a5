// QrDesk - turn form input into a live QR code
//
// This is the library crate containing the form model, payload encoders and
// the QR render adapter. The binary crate (main.rs) provides the GUI entry point.

pub mod config;
pub mod logging;
pub mod models;
pub mod render;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{AppConfig, AppState, ContentType, FieldKey, FormState, RenderOptions};
pub use render::{RenderAdapter, RenderPhase};
pub use state::{FormController, StateChange};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
