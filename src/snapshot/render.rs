//! Rendering seam and a software canvas renderer.
//!
//! The engine only needs [`Renderer`]: given a test case and a configuration,
//! produce an RGBA image. [`CanvasRenderer`] is the in-crate adapter: views
//! draw into an RGB [`Canvas`] sized for the device, with an extra band of
//! render-offset pixels on top that is cropped away after capture. The
//! offset comes from the engine's settings on every call.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use std::future::Future;
use std::sync::Arc;

use super::configuration::{Configuration, InterfaceStyle};
use super::types::{SnapshotError, SnapshotResult, TestCase};

/// Produces the image of a test case under one configuration.
///
/// `F` is the view factory type the renderer knows how to drive.
pub trait Renderer<F> {
    /// Render `test_case` for `config`, waiting its render delay before
    /// capture and cropping the top `render_offset` rows from the result
    fn render(
        &self,
        test_case: &TestCase<F>,
        config: &Configuration,
        render_offset: u32,
    ) -> impl Future<Output = SnapshotResult<RgbaImage>>;
}

/// A drawable view.
pub trait View: Send {
    /// Draw into `frame` of the canvas using the colors for `style`
    fn draw(&self, canvas: &mut Canvas, frame: Frame, style: InterfaceStyle);
}

/// Factory understood by [`CanvasRenderer`]; `None` means no view could be built.
pub type ViewFactory = Arc<dyn Fn() -> Option<Box<dyn View>> + Send + Sync>;

/// Wrap a closure as a [`ViewFactory`]
pub fn view_factory<V, F>(build: F) -> ViewFactory
where
    V: View + 'static,
    F: Fn() -> V + Send + Sync + 'static,
{
    Arc::new(move || Some(Box::new(build()) as Box<dyn View>))
}

/// Region of the canvas a view is laid out in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Colors for an interface style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Window background
    pub background: [u8; 3],
    /// Text and strokes
    pub foreground: [u8; 3],
    /// Highlights
    pub accent: [u8; 3],
}

impl Palette {
    /// Palette for `style`; `Default` uses the light palette
    pub fn for_style(style: InterfaceStyle) -> Self {
        match style {
            InterfaceStyle::Dark => Self {
                background: [18, 18, 20],
                foreground: [235, 235, 240],
                accent: [10, 132, 255],
            },
            InterfaceStyle::Light | InterfaceStyle::Default => Self {
                background: [255, 255, 255],
                foreground: [20, 20, 24],
                accent: [0, 122, 255],
            },
        }
    }
}

/// Largest capture surface the canvas renderer allocates, in pixels
pub const MAX_SURFACE_PIXELS: u64 = 64 * 1024 * 1024;

/// An RGB drawing surface views paint into.
///
/// Drawing is clipped: writes outside the surface are dropped and reads
/// outside it return black.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    /// Create a canvas filled with `color`
    pub fn new(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, Rgb(color)),
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Draw a filled rectangle, clipped to the canvas
    pub fn draw_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        let right = x.saturating_add(w).min(self.width());
        let bottom = y.saturating_add(h).min(self.height());
        for py in y..bottom {
            for px in x..right {
                self.image.put_pixel(px, py, Rgb(color));
            }
        }
    }

    /// Draw a single line of 8x8 glyphs starting at (`x`, `y`)
    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, fg: [u8; 3], bg: [u8; 3]) {
        let mut left = x;
        for ch in text.chars() {
            if left >= self.width() {
                break;
            }
            let glyph = BASIC_FONTS.get(ch).unwrap_or([0; 8]);
            self.draw_glyph(left, y, glyph, fg, bg);
            left = left.saturating_add(8);
        }
    }

    fn draw_glyph(&mut self, x: u32, y: u32, glyph: [u8; 8], fg: [u8; 3], bg: [u8; 3]) {
        for (dy, bits) in (0u32..).zip(glyph) {
            for dx in 0..8 {
                // lowest bit is the leftmost column
                let color = if bits & (1 << dx) != 0 { fg } else { bg };
                self.set_pixel(x.saturating_add(dx), y.saturating_add(dy), color);
            }
        }
    }

    /// Color at (`x`, `y`)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.image
            .get_pixel_checked(x, y)
            .map(|pixel| pixel.0)
            .unwrap_or([0, 0, 0])
    }

    /// Paint one pixel
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if let Some(pixel) = self.image.get_pixel_mut_checked(x, y) {
            *pixel = Rgb(color);
        }
    }

    /// Take the painted pixels
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

/// Software renderer drawing [`View`]s into a [`Canvas`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CanvasRenderer;

impl CanvasRenderer {
    /// Surface size for a device: device size plus the offset band
    pub fn surface_size(&self, config: &Configuration, render_offset: u32) -> SnapshotResult<(u32, u32)> {
        let (width, height) = config.size();
        let surface_height = height.checked_add(render_offset).ok_or_else(|| {
            SnapshotError::RenderFailure(format!(
                "surface height overflows: {} + {}",
                height, render_offset
            ))
        })?;
        if width == 0 || height == 0 {
            return Err(SnapshotError::RenderFailure(format!(
                "invalid capture surface {}x{} for {}",
                width,
                surface_height,
                config.id()
            )));
        }
        if u64::from(width) * u64::from(surface_height) > MAX_SURFACE_PIXELS {
            return Err(SnapshotError::RenderFailure(format!(
                "capture surface {}x{} for {} exceeds {} pixels",
                width,
                surface_height,
                config.id(),
                MAX_SURFACE_PIXELS
            )));
        }
        Ok((width, surface_height))
    }

    /// Frame the view occupies: everything below the offset band
    pub fn view_frame(&self, config: &Configuration, render_offset: u32) -> Frame {
        let (width, height) = config.size();
        Frame {
            x: 0,
            y: render_offset,
            width,
            height,
        }
    }

    fn crop(&self, captured: RgbImage, frame: Frame) -> SnapshotResult<RgbaImage> {
        let bottom = frame.y.checked_add(frame.height);
        if bottom.is_none_or(|bottom| bottom > captured.height()) || frame.width > captured.width() {
            return Err(SnapshotError::RenderFailure(format!(
                "crop region {}x{}+{} outside capture {}x{}",
                frame.width,
                frame.height,
                frame.y,
                captured.width(),
                captured.height()
            )));
        }
        let cropped =
            image::imageops::crop_imm(&captured, frame.x, frame.y, frame.width, frame.height)
                .to_image();
        Ok(DynamicImage::ImageRgb8(cropped).to_rgba8())
    }
}

impl Renderer<ViewFactory> for CanvasRenderer {
    async fn render(
        &self,
        test_case: &TestCase<ViewFactory>,
        config: &Configuration,
        render_offset: u32,
    ) -> SnapshotResult<RgbaImage> {
        let (width, surface_height) = self.surface_size(config, render_offset)?;
        let frame = self.view_frame(config, render_offset);
        let style = config.interface_style;

        let view = (test_case.view_factory)().ok_or_else(|| {
            SnapshotError::RenderFailure(format!("no view for {}", test_case.name))
        })?;
        let mut canvas = Canvas::new(width, surface_height, Palette::for_style(style).background);

        tokio::time::sleep(test_case.render_delay).await;
        view.draw(&mut canvas, frame, style);

        tracing::debug!(
            test = %test_case.name,
            config = %config.id(),
            width,
            height = frame.height,
            render_offset,
            "captured view"
        );
        self.crop(canvas.into_image(), frame)
    }
}

/// A titled card with a line of body text, styled by interface style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextCard {
    /// Header text
    pub title: String,
    /// Body text
    pub body: String,
}

impl TextCard {
    /// Create a card
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

impl View for TextCard {
    fn draw(&self, canvas: &mut Canvas, frame: Frame, style: InterfaceStyle) {
        let palette = Palette::for_style(style);
        canvas.draw_rect(frame.x, frame.y, frame.width, frame.height, palette.background);
        canvas.draw_rect(frame.x, frame.y, frame.width, 24, palette.accent);
        canvas.draw_text(frame.x + 8, frame.y + 8, &self.title, palette.background, palette.accent);
        canvas.draw_text(
            frame.x + 8,
            frame.y + 40,
            &self.body,
            palette.foreground,
            palette.background,
        );
    }
}
