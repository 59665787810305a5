//! The QR widget: payload + options in, raster image out.
//!
//! [`QrCodeWidget`] builds the module matrix with the `qrcode` crate and paints it
//! into an `image::RgbaImage`. The adapter only sees the [`QrWidget`] trait.

use crate::models::{ErrorCorrectionLevel, RenderOptions};
use image::{ImageFormat, Rgba, RgbaImage};
use qrcode::{Color, EcLevel, QrCode};
use std::io::Cursor;
use thiserror::Error;

/// Errors raised while rendering or capturing the QR image
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("payload cannot be encoded as a QR code: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("no QR image has been rendered")]
    NoImage,

    #[error("the QR widget is already mounted")]
    AlreadyMounted,

    #[error("the QR widget has been disposed")]
    Disposed,

    #[error("failed to encode PNG: {0}")]
    Png(#[from] image::ImageError),
}

/// Everything the widget needs for one render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderParams {
    pub payload: String,
    pub width: u32,
    pub height: u32,
    pub error_correction: ErrorCorrectionLevel,
}

impl RenderParams {
    pub fn new(payload: impl Into<String>, options: &RenderOptions) -> Self {
        let size = options.pixel_size.pixels();
        Self {
            payload: payload.into(),
            width: size,
            height: size,
            error_correction: options.error_correction,
        }
    }
}

/// Colors used when painting modules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrStyle {
    pub dark: Rgba<u8>,
    pub light: Rgba<u8>,
}

impl Default for QrStyle {
    fn default() -> Self {
        Self {
            dark: Rgba([0x22, 0x22, 0x22, 0xff]),
            light: Rgba([0xff, 0xff, 0xff, 0xff]),
        }
    }
}

/// A long-lived rendering resource, updated in place.
pub trait QrWidget: Send {
    /// Re-render with new content or options
    fn update(&mut self, params: &RenderParams) -> Result<(), RenderError>;

    /// Current image as RGBA pixels
    fn raster(&self) -> Result<RgbaImage, RenderError>;

    /// Current image as PNG bytes
    fn png(&self) -> Result<Vec<u8>, RenderError>;

    /// Release the rendered image; later captures fail with [`RenderError::Disposed`]
    fn dispose(&mut self);
}

/// [`QrWidget`] backed by `qrcode` + `image`
#[derive(Debug)]
pub struct QrCodeWidget {
    style: QrStyle,
    image: Option<RgbaImage>,
    disposed: bool,
}

impl QrCodeWidget {
    /// Build the widget and render the initial snapshot.
    ///
    /// An unrenderable payload still yields a widget; it simply has no image
    /// until a later [`QrWidget::update`] succeeds.
    pub fn create(params: &RenderParams, style: QrStyle) -> Self {
        let mut widget = Self {
            style,
            image: None,
            disposed: false,
        };
        if let Err(e) = widget.update(params) {
            tracing::warn!("Initial QR render failed: {}", e);
        }
        widget
    }

    fn render(&self, params: &RenderParams) -> Result<RgbaImage, RenderError> {
        let code = QrCode::with_error_correction_level(
            params.payload.as_bytes(),
            to_ec_level(params.error_correction),
        )?;
        Ok(paint(&code, params.width, params.height, self.style))
    }
}

impl QrWidget for QrCodeWidget {
    fn update(&mut self, params: &RenderParams) -> Result<(), RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        match self.render(params) {
            Ok(image) => {
                self.image = Some(image);
                Ok(())
            }
            Err(e) => {
                self.image = None;
                Err(e)
            }
        }
    }

    fn raster(&self) -> Result<RgbaImage, RenderError> {
        if self.disposed {
            return Err(RenderError::Disposed);
        }
        self.image.clone().ok_or(RenderError::NoImage)
    }

    fn png(&self) -> Result<Vec<u8>, RenderError> {
        let image = self.raster()?;
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png)?;
        Ok(bytes.into_inner())
    }

    fn dispose(&mut self) {
        self.image = None;
        self.disposed = true;
    }
}

fn to_ec_level(level: ErrorCorrectionLevel) -> EcLevel {
    match level {
        ErrorCorrectionLevel::Low => EcLevel::L,
        ErrorCorrectionLevel::Medium => EcLevel::M,
        ErrorCorrectionLevel::Quartile => EcLevel::Q,
        ErrorCorrectionLevel::High => EcLevel::H,
    }
}

/// Paint the module matrix centered on a `width x height` canvas.
///
/// Modules are scaled by the largest integer factor that fits (at least 1);
/// if even one pixel per module overflows, the canvas grows to fit the matrix.
fn paint(code: &QrCode, width: u32, height: u32, style: QrStyle) -> RgbaImage {
    let modules = code.width() as u32;
    let scale = (width.min(height) / modules).max(1);
    let extent = modules * scale;
    let (canvas_w, canvas_h) = (width.max(extent), height.max(extent));
    let (offset_x, offset_y) = ((canvas_w - extent) / 2, (canvas_h - extent) / 2);

    let mut image = RgbaImage::from_pixel(canvas_w, canvas_h, style.light);
    for (index, color) in code.to_colors().into_iter().enumerate() {
        if color != Color::Dark {
            continue;
        }
        let index = index as u32;
        let (mx, my) = (index % modules, index / modules);
        for dy in 0..scale {
            for dx in 0..scale {
                image.put_pixel(
                    offset_x + mx * scale + dx,
                    offset_y + my * scale + dy,
                    style.dark,
                );
            }
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PixelSize;

    fn params(payload: &str, size: PixelSize) -> RenderParams {
        RenderParams::new(
            payload,
            &RenderOptions {
                error_correction: ErrorCorrectionLevel::Medium,
                pixel_size: size,
            },
        )
    }

    fn widget(payload: &str, size: PixelSize) -> QrCodeWidget {
        QrCodeWidget::create(&params(payload, size), QrStyle::default())
    }

    #[test]
    fn test_raster_matches_pixel_size() {
        let widget = widget("https://example.com", PixelSize::Large);
        let image = widget.raster().unwrap();
        assert_eq!(image.dimensions(), (300, 300));
    }

    #[test]
    fn test_corners_are_light_and_finder_is_dark() {
        let widget = widget("hello", PixelSize::Medium);
        let image = widget.raster().unwrap();
        let style = QrStyle::default();

        // Version 1 (21 modules) scales by 9 → 189px, offset 5px
        assert_eq!(*image.get_pixel(0, 0), style.light);
        assert_eq!(*image.get_pixel(6, 6), style.dark);
    }

    #[test]
    fn test_update_in_place_changes_size() {
        let mut widget = widget("hello", PixelSize::Small);
        widget.update(&params("hello", PixelSize::Large)).unwrap();
        assert_eq!(widget.raster().unwrap().dimensions(), (300, 300));
    }

    #[test]
    fn test_png_bytes_decode() {
        let widget = widget("WIFI:T:WPA;S:Home;P:secret;H:true;;", PixelSize::Medium);
        let png = widget.png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 200);
    }

    #[test]
    fn test_oversized_payload_has_no_image() {
        let huge = "x".repeat(5000);
        let mut widget = widget("ok", PixelSize::Medium);

        assert!(matches!(
            widget.update(&params(&huge, PixelSize::Medium)),
            Err(RenderError::Encode(_))
        ));
        assert!(matches!(widget.raster(), Err(RenderError::NoImage)));

        widget.update(&params("ok", PixelSize::Medium)).unwrap();
        assert!(widget.raster().is_ok());
    }

    #[test]
    fn test_disposed_widget_refuses_work() {
        let mut widget = widget("hello", PixelSize::Medium);
        widget.dispose();
        assert!(matches!(widget.raster(), Err(RenderError::Disposed)));
        assert!(matches!(
            widget.update(&params("hello", PixelSize::Medium)),
            Err(RenderError::Disposed)
        ));
    }
}
