//! Traits and supporting types that mirror the subset of the HTML Canvas 2D
//! context the poster pipeline draws through. Implement them for any backend
//! (recording, cairo, a host webview bridge, ...).

use std::io::Cursor;

use crate::error::{PosterError, Result};

/// Paint used for fill and stroke. Posters only ever paint flat colors.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Color(String),
}

impl From<&str> for Paint {
    fn from(color: &str) -> Self {
        Paint::Color(color.to_string())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl ImageData {
    /// Decodes PNG bytes into straight-alpha RGBA8.
    pub fn decode_png(bytes: &[u8]) -> Result<Self> {
        let mut decoder = png::Decoder::new(Cursor::new(bytes));
        decoder.set_transformations(png::Transformations::normalize_to_color8());
        let mut reader = decoder.read_info()?;
        let size = reader
            .output_buffer_size()
            .ok_or_else(|| PosterError::InvalidImage("PNG dimensions overflow".into()))?;
        let mut buf = vec![0; size];
        let info = reader.next_frame(&mut buf)?;
        buf.truncate(info.buffer_size());

        let data = match info.color_type {
            png::ColorType::Rgba => buf,
            png::ColorType::Rgb => buf
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 255])
                .collect(),
            png::ColorType::GrayscaleAlpha => buf
                .chunks_exact(2)
                .flat_map(|px| [px[0], px[0], px[0], px[1]])
                .collect(),
            png::ColorType::Grayscale => buf.iter().flat_map(|&g| [g, g, g, 255]).collect(),
            png::ColorType::Indexed => {
                return Err(PosterError::InvalidImage(
                    "indexed PNG was not expanded".into(),
                ));
            }
        };

        Ok(Self {
            width: info.width,
            height: info.height,
            data,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TextAlign {
    Left,
    Right,
    Center,
    Start,
    End,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TextBaseline {
    Top,
    Hanging,
    Middle,
    Alphabetic,
    Ideographic,
    Bottom,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

pub trait CanvasState {
    /// Saves all current drawing state attributes onto a stack (transform, styles, clipping, etc.). Mirrors save().
    fn save(&mut self) -> Result<()>;
    /// Pops the last saved state from the stack and restores it. Mirrors restore().
    fn restore(&mut self) -> Result<()>;
}

pub trait CanvasTransforms {
    /// Multiplies the current transform by a scaling matrix. Mirrors scale().
    fn scale(&mut self, x: f64, y: f64) -> Result<()>;
    /// Translates the current transform by (x, y). Mirrors translate().
    fn translate(&mut self, x: f64, y: f64) -> Result<()>;
}

pub trait CanvasCompositing {
    /// Sets the horizontal offset of the shadow blur. Mirrors shadowOffsetX.
    fn set_shadow_offset_x(&mut self, value: f64) -> Result<()>;
    fn shadow_offset_x(&self) -> Result<f64>;

    /// Sets the vertical offset of the shadow blur. Mirrors shadowOffsetY.
    fn set_shadow_offset_y(&mut self, value: f64) -> Result<()>;
    fn shadow_offset_y(&self) -> Result<f64>;

    /// Sets the blur radius for shadows. Mirrors shadowBlur.
    fn set_shadow_blur(&mut self, value: f64) -> Result<()>;
    fn shadow_blur(&self) -> Result<f64>;

    /// Sets the shadow color string. Mirrors shadowColor.
    fn set_shadow_color(&mut self, value: String) -> Result<()>;
    fn shadow_color(&self) -> Result<String>;
}

pub trait CanvasLineStyles {
    /// Sets stroke thickness in user units. Mirrors lineWidth.
    fn set_line_width(&mut self, value: f64) -> Result<()>;
    fn line_width(&self) -> Result<f64>;

    /// Sets the line dash pattern segments. Mirrors setLineDash().
    fn set_line_dash(&mut self, segments: Vec<f64>) -> Result<()>;
    fn line_dash(&self) -> Result<Vec<f64>>;
}

pub trait CanvasFillStrokeStyles {
    /// Sets the paint used for fills. Mirrors fillStyle.
    fn set_fill_style(&mut self, style: Paint) -> Result<()>;
    fn fill_style(&self) -> Result<Paint>;

    /// Sets the paint used for strokes. Mirrors strokeStyle.
    fn set_stroke_style(&mut self, style: Paint) -> Result<()>;
    fn stroke_style(&self) -> Result<Paint>;
}

pub trait CanvasPaths {
    /// Starts a new empty path list. Mirrors beginPath().
    fn begin_path(&mut self) -> Result<()>;
    /// Closes the current subpath with a straight line. Mirrors closePath().
    fn close_path(&mut self) -> Result<()>;
    /// Moves the current point without drawing. Mirrors moveTo().
    fn move_to(&mut self, x: f64, y: f64) -> Result<()>;
    /// Adds a straight line from the current point to (x, y). Mirrors lineTo().
    fn line_to(&mut self, x: f64, y: f64) -> Result<()>;
    /// Adds a clockwise arc centered at (x, y), joined to the current point by a line. Mirrors arc().
    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64) -> Result<()>;
    /// Adds a rect subpath. Mirrors rect().
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> Result<()>;

    /// Fills the current path. The path is kept for later stroke/clip calls. Mirrors fill().
    fn fill(&mut self, fill_rule: FillRule) -> Result<()>;
    /// Strokes the current path. Mirrors stroke().
    fn stroke(&mut self) -> Result<()>;
    /// Intersects the clipping region with the current path. Mirrors clip().
    fn clip(&mut self, fill_rule: FillRule) -> Result<()>;
}

pub trait CanvasText {
    /// Sets the CSS font string used for text rendering. Mirrors font.
    fn set_font(&mut self, value: String) -> Result<()>;
    fn font(&self) -> Result<String>;

    /// Sets horizontal text alignment relative to the anchor point. Mirrors textAlign.
    fn set_text_align(&mut self, value: TextAlign) -> Result<()>;
    fn text_align(&self) -> Result<TextAlign>;

    /// Sets the baseline alignment for text. Mirrors textBaseline.
    fn set_text_baseline(&mut self, value: TextBaseline) -> Result<()>;
    fn text_baseline(&self) -> Result<TextBaseline>;

    /// Fills the given text at (x, y); `max_width` lets the surface squeeze it horizontally. Mirrors fillText().
    fn fill_text(&mut self, text: &str, x: f64, y: f64, max_width: Option<f64>) -> Result<()>;
    /// Strokes the given text at (x, y). Mirrors strokeText().
    fn stroke_text(&mut self, text: &str, x: f64, y: f64, max_width: Option<f64>) -> Result<()>;
    /// Measures the advance width of the given text using current font settings. Mirrors measureText().
    fn measure_text(&self, text: &str) -> Result<TextMetrics>;
}

pub trait CanvasDrawImage {
    /// Draws and scales the source image to the given destination size. Mirrors drawImage(image, dx, dy, dw, dh).
    fn draw_image_scaled(
        &mut self,
        image: &dyn CanvasImageSource,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
    ) -> Result<()>;
}

pub trait CanvasImageSource {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Returns a view over straight-alpha RGBA pixels. Length must be width * height * 4.
    fn data_rgba(&self) -> Option<&[u8]>;
}

impl CanvasImageSource for ImageData {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn data_rgba(&self) -> Option<&[u8]> {
        Some(self.data.as_slice())
    }
}

pub trait CanvasRenderingContext2D:
    CanvasState
    + CanvasTransforms
    + CanvasCompositing
    + CanvasPaths
    + CanvasLineStyles
    + CanvasFillStrokeStyles
    + CanvasText
    + CanvasDrawImage
{
}

impl<T> CanvasRenderingContext2D for T where
    T: CanvasState
        + CanvasTransforms
        + CanvasCompositing
        + CanvasPaths
        + CanvasLineStyles
        + CanvasFillStrokeStyles
        + CanvasText
        + CanvasDrawImage
{
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(width: u32, height: u32, color: png::ColorType, pixels: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(color);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(pixels).unwrap();
        }
        out
    }

    #[test]
    fn decodes_rgb_png_with_opaque_alpha() {
        let bytes = encode(2, 1, png::ColorType::Rgb, &[255, 0, 0, 0, 0, 255]);
        let image = ImageData::decode_png(&bytes).unwrap();
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.data, vec![255, 0, 0, 255, 0, 0, 255, 255]);
    }

    #[test]
    fn decodes_rgba_png_untouched() {
        let pixels = [10, 20, 30, 40];
        let bytes = encode(1, 1, png::ColorType::Rgba, &pixels);
        let image = ImageData::decode_png(&bytes).unwrap();
        assert_eq!(image.data_rgba(), Some(&pixels[..]));
    }

    #[test]
    fn rejects_garbage_bytes() {
        assert!(ImageData::decode_png(b"not a png").is_err());
    }
}
