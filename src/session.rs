//! Pipeline state machine: `Uploading -> Cropping -> Composing`, with
//! artifact-preserving backward transitions and a single reset.
//!
//! Asynchronous stages (photo decode, export encode) are modeled as
//! token-gated completions: callers capture the current [`RunId`] when the
//! work starts and hand it back with the result. A mismatching token means
//! the session was reset or re-uploaded in the meantime, and the result is
//! discarded instead of overwriting newer state.

use crate::compose::{ComposedSurface, compose};
use crate::error::{FramepixError, FramepixResult};
use crate::export::{ExportArtifact, export};
use crate::geometry::{CropRegion, DisplayGeometry, resolve};
use crate::photo::{SourcePhoto, decode_photo};
use crate::raster::{CircularRaster, rasterize};
use crate::template::{Template, TemplateModel};

/// Identity of one pipeline run. Bumped on reset and re-upload, so stale
/// asynchronous completions can be detected and dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Uploading,
    Cropping,
    Composing,
}

/// Explicit context for one editing session, passed through the pure stage
/// functions instead of living as ambient mutable state.
pub struct EditorSession {
    stage: Stage,
    run: u64,
    pixel_density: f32,
    template: Template,
    photo: Option<SourcePhoto>,
    display: Option<DisplayGeometry>,
    crop: Option<CropRegion>,
    raster: Option<CircularRaster>,
    name: String,
    designation: String,
}

impl EditorSession {
    pub fn new(template: Template, pixel_density: f32) -> FramepixResult<Self> {
        template.validate()?;
        if !pixel_density.is_finite() || pixel_density <= 0.0 {
            return Err(FramepixError::validation(
                "pixel density must be finite and > 0",
            ));
        }
        Ok(Self {
            stage: Stage::Uploading,
            run: 0,
            pixel_density,
            template,
            photo: None,
            display: None,
            crop: None,
            raster: None,
            name: String::new(),
            designation: String::new(),
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Token for work starting now; completions must hand it back.
    pub fn current_run(&self) -> RunId {
        RunId(self.run)
    }

    pub fn photo(&self) -> Option<&SourcePhoto> {
        self.photo.as_ref()
    }

    pub fn crop(&self) -> Option<CropRegion> {
        self.crop
    }

    pub fn raster(&self) -> Option<&CircularRaster> {
        self.raster.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn designation(&self) -> &str {
        &self.designation
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_designation(&mut self, designation: impl Into<String>) {
        self.designation = designation.into();
    }

    /// Record the on-screen size the photo is rendered at. Defaults to the
    /// photo's natural size when never set (crop coordinates are then source
    /// coordinates).
    pub fn set_display(&mut self, display: DisplayGeometry) {
        self.display = Some(display);
    }

    /// Decode photo bytes and apply them under the current run token.
    pub fn load_photo(&mut self, bytes: &[u8]) -> FramepixResult<()> {
        let run = self.current_run();
        let photo = decode_photo(bytes)?;
        if !self.apply_decoded(run, photo) {
            // Token was taken and applied synchronously; cannot be stale.
            return Err(FramepixError::validation("decode applied to stale run"));
        }
        Ok(())
    }

    /// Apply a completed photo decode. Returns `false` (and changes nothing)
    /// when the token is stale.
    pub fn apply_decoded(&mut self, run: RunId, photo: SourcePhoto) -> bool {
        if run != self.current_run() {
            tracing::warn!(?run, current = self.run, "discarding stale photo decode");
            return false;
        }
        if self.photo.is_some() {
            // Replacing the photo mid-session resets the photo and crop
            // artifacts only, not the whole pipeline; text fields and stage
            // survive. In-flight work against the old photo becomes stale.
            self.run += 1;
            self.crop = None;
            self.raster = None;
        }
        self.display = None;
        self.photo = Some(photo);
        true
    }

    /// Resolve the selection to source pixels and rasterize the circular
    /// crop. On failure nothing is stored and the stage does not move.
    #[tracing::instrument(skip(self))]
    pub fn confirm_crop(&mut self, region: CropRegion) -> FramepixResult<()> {
        let photo = self
            .photo
            .as_ref()
            .ok_or_else(|| FramepixError::not_ready("no photo loaded"))?;
        if self.stage != Stage::Cropping {
            return Err(FramepixError::not_ready("not at the cropping stage"));
        }

        let display = self.display.unwrap_or(DisplayGeometry {
            width: f64::from(photo.width),
            height: f64::from(photo.height),
        });
        let crop_px = resolve(region, (photo.width, photo.height), display)?;
        let raster = rasterize(photo, crop_px, self.pixel_density)?;

        self.crop = Some(region);
        self.raster = Some(raster);
        Ok(())
    }

    /// Move one stage forward. Requires the stage's prerequisite artifact.
    pub fn advance(&mut self) -> FramepixResult<Stage> {
        self.stage = match self.stage {
            Stage::Uploading => {
                if self.photo.is_none() {
                    return Err(FramepixError::not_ready("no photo loaded"));
                }
                Stage::Cropping
            }
            Stage::Cropping => {
                if self.raster.is_none() {
                    return Err(FramepixError::not_ready("no confirmed crop"));
                }
                Stage::Composing
            }
            Stage::Composing => {
                return Err(FramepixError::not_ready("already at the final stage"));
            }
        };
        Ok(self.stage)
    }

    /// Move one stage back. Always permitted; artifacts still valid for the
    /// target stage are preserved.
    pub fn back(&mut self) -> Stage {
        self.stage = match self.stage {
            Stage::Uploading => Stage::Uploading,
            Stage::Cropping => Stage::Uploading,
            Stage::Composing => Stage::Cropping,
        };
        self.stage
    }

    /// Discard every artifact and return to `Uploading`. Invalidates all
    /// in-flight completions.
    pub fn reset(&mut self) {
        self.run += 1;
        self.stage = Stage::Uploading;
        self.photo = None;
        self.display = None;
        self.crop = None;
        self.raster = None;
        self.name.clear();
        self.designation.clear();
    }

    /// Snapshot of the artwork description for the current state.
    pub fn model(&self) -> TemplateModel {
        TemplateModel {
            template: self.template.clone(),
            name: self.name.clone(),
            designation: self.designation.clone(),
            photo: self.raster.clone(),
        }
    }

    /// Compose the preview surface for the composing stage.
    pub fn compose_preview(&self) -> FramepixResult<ComposedSurface> {
        if self.stage != Stage::Composing {
            return Err(FramepixError::not_ready("not at the composing stage"));
        }
        compose(&self.model())
    }

    /// Compose and export in one step, using the name field as the file name
    /// hint.
    pub fn export_artifact(&self, scale_factor: f64) -> FramepixResult<ExportArtifact> {
        let surface = self.compose_preview()?;
        export(&surface, scale_factor, &self.name)
    }

    /// Apply a completed export. Returns `None` when the token is stale; the
    /// artifact must then be dropped and no download triggered.
    pub fn accept_export(&self, run: RunId, artifact: ExportArtifact) -> Option<ExportArtifact> {
        if run != self.current_run() {
            tracing::warn!(?run, current = self.run, "discarding stale export");
            return None;
        }
        Some(artifact)
    }
}
