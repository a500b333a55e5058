#![forbid(unsafe_code)]

//! Crop-and-compose pipeline for circular photo frames.
//!
//! Stages, each a pure function from inputs to an artifact:
//! 1. [`decode_photo`]: bytes to premultiplied RGBA8.
//! 2. [`resolve`]: display-space crop selection to source pixels.
//! 3. [`rasterize`]: circularly masked crop at device pixel density.
//! 4. [`compose`]: template + text + photo into a composed surface.
//! 5. [`export`]: print-scale lossless PNG with a derived file name.
//!
//! [`EditorSession`] carries the artifacts through the
//! `Uploading -> Cropping -> Composing` state machine.

pub mod compose;
pub mod error;
pub mod export;
pub mod geometry;
pub mod photo;
pub mod raster;
pub mod render;
pub mod session;
pub mod template;
pub mod text;

pub use compose::{ComposedSurface, DrawOp, ScenePlan, compose};
pub use error::{FramepixError, FramepixResult};
pub use export::{DEFAULT_EXPORT_SCALE, ExportArtifact, export, export_file_name};
pub use geometry::{
    CENTER_CROP_FRACTION, CropRegion, CropUnit, DisplayGeometry, SourceRect, centered_square_crop,
    resolve,
};
pub use photo::{SourcePhoto, decode_photo};
pub use raster::{CircularRaster, rasterize};
pub use render::{FramePixels, render_plan};
pub use session::{EditorSession, RunId, Stage};
pub use template::{
    DESIGNATION_PLACEHOLDER, Element, NAME_PLACEHOLDER, PHOTO_PLACEHOLDER, PaintStyle, PhotoSlot,
    Rgba8, Template, TemplateModel, TextSlot,
};
pub use text::{TextBrush, TextLayoutEngine, TextStyle};
