//! Services: framework-agnostic logic with no Slint dependency.
//!
//! - [`encoder`]: turns a form record into QR payload text (vCard, Wi-Fi, VEVENT,
//!   mailto/SMSTO/tel). Pure string formatting, no validation, no escaping
//!   beyond the mailto query values.
//! - [`export`]: clipboard and PNG file sinks used by the render adapter.

pub mod encoder;
pub mod export;

pub use encoder::{EncodePayload, encode, percent_encode_component};
pub use export::{ArboardClipboard, ClipboardSink, DialogFileSink, DirectoryFileSink, ExportError, FileSink};
