//! Poster compositing over a Canvas-2D-like surface.
//!
//! Callers describe a poster in resolution-independent virtual units through
//! [`Painter`]; shapes, images, and text are converted to physical pixels with
//! the session [`Scale`] and drawn through the surface traits in [`api`]. Any
//! backend implementing those traits can be drawn on: [`backends::recording`]
//! records operations for inspection, and `backends::cairo` (feature `cairo`)
//! rasterizes and exports PNG files.

pub mod api;
pub mod compositor;
pub mod config;
pub mod error;
pub mod guard;
pub mod painter;
pub mod path;
pub mod style;
pub mod surface;
pub mod text;
pub mod units;

pub mod backends {
    #[cfg(feature = "cairo")]
    pub mod cairo;
    pub mod recording;
}

pub use api::{CanvasImageSource, CanvasRenderingContext2D, ImageData, Paint};
pub use compositor::ShapeStyle;
pub use config::SessionConfig;
pub use error::{PosterError, Result};
pub use painter::Painter;
pub use path::Rect;
pub use style::{Border, BorderStyle, Shadow, StyleArg};
pub use surface::{
    DrawSurface, ExportOptions, ExportedImage, ImageFetcher, RasterExport, load_images,
};
pub use text::TextStyle;
pub use units::Scale;
