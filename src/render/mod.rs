//! QR rendering: widget, lifecycle adapter, transient feedback.
//!
//! - [`QrCodeWidget`]: `qrcode` matrix painted into an `image::RgbaImage`
//! - [`RenderAdapter`]: creates the widget once, updates it in place, exports and copies
//! - [`Feedback`]: "Saved" / "Copied" message with a self-resetting countdown

pub mod adapter;
pub mod feedback;
pub mod widget;

pub use adapter::{ActionLabels, DisplaySurface, RenderAdapter, RenderPhase, WidgetFactory};
pub use feedback::Feedback;
pub use widget::{QrCodeWidget, QrStyle, QrWidget, RenderError, RenderParams};
