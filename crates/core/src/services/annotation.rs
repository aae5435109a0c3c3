//! Sticker annotations on journal pages.
//!
//! Annotations are persisted in percentage space so they survive any
//! container size, and edited in pixel space. Conversion is relative to the
//! container width on every axis, `y` and `height` included, so a sticker
//! keeps its shape and place when only the page height changes.
//!
//! [`AnnotationSession`] holds one editing session: the stored percent set
//! and the working pixel set derived from it. Edits touch only the working
//! set until [`AnnotationSession::save`] writes it back.

use moodlog_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Identifier of an annotation, unique within one entry.
pub type AnnotationId = i64;

/// Default placement and size of a newly added sticker, in pixels.
pub const DEFAULT_STICKER_X: f64 = 50.0;
pub const DEFAULT_STICKER_Y: f64 = 50.0;
pub const DEFAULT_STICKER_SIZE: f64 = 100.0;

/// Errors from annotation editing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnnotationError {
    #[error("Annotation {0} not found")]
    NotFound(AnnotationId),

    #[error("Invalid container size {width}x{height}")]
    InvalidContainer { width: f64, height: f64 },

    #[error("Duplicate annotation id {0}")]
    DuplicateId(AnnotationId),

    #[error("Annotation {0} has a non-finite coordinate")]
    NonFinite(AnnotationId),

    #[error("Annotation {0} has no sticker")]
    MissingAsset(AnnotationId),
}

impl From<AnnotationError> for AppError {
    fn from(err: AnnotationError) -> Self {
        match err {
            AnnotationError::NotFound(id) => Self::NotFound(format!("Annotation {id}")),
            other => Self::Validation(other.to_string()),
        }
    }
}

/// A stored annotation, positioned as percentages of its container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: AnnotationId,
    /// Sticker image reference.
    pub asset_ref: String,
    pub x_percent: f64,
    pub y_percent: f64,
    pub width_percent: f64,
    pub height_percent: f64,
    #[serde(default)]
    pub rotation_degrees: f64,
    #[serde(default)]
    pub z_order: i32,
}

/// An annotation positioned in pixels for a concrete container.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelAnnotation {
    pub id: AnnotationId,
    pub asset_ref: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation_degrees: f64,
    pub z_order: i32,
}

/// Rendered size of the page an annotation sits on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSize {
    width: f64,
    height: f64,
}

impl ContainerSize {
    /// Both dimensions must be positive and finite.
    pub fn new(width: f64, height: f64) -> Result<Self, AnnotationError> {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            Ok(Self { width, height })
        } else {
            Err(AnnotationError::InvalidContainer { width, height })
        }
    }

    #[must_use]
    pub const fn width(self) -> f64 {
        self.width
    }

    #[must_use]
    pub const fn height(self) -> f64 {
        self.height
    }
}

/// Convert a pixel annotation to percentages of `container`.
#[must_use]
pub fn to_percent(a: &PixelAnnotation, container: ContainerSize) -> Annotation {
    Annotation {
        id: a.id,
        asset_ref: a.asset_ref.clone(),
        x_percent: a.x / container.width * 100.0,
        y_percent: a.y / container.width * 100.0,
        width_percent: a.width / container.width * 100.0,
        height_percent: a.height / container.width * 100.0,
        rotation_degrees: a.rotation_degrees,
        z_order: a.z_order,
    }
}

/// Convert a stored annotation to pixels for `container`.
#[must_use]
pub fn to_pixels(a: &Annotation, container: ContainerSize) -> PixelAnnotation {
    PixelAnnotation {
        id: a.id,
        asset_ref: a.asset_ref.clone(),
        x: a.x_percent / 100.0 * container.width,
        y: a.y_percent / 100.0 * container.width,
        width: a.width_percent / 100.0 * container.width,
        height: a.height_percent / 100.0 * container.width,
        rotation_degrees: a.rotation_degrees,
        z_order: a.z_order,
    }
}

/// Check a stored set before it is persisted.
pub fn validate_annotations(annotations: &[Annotation]) -> Result<(), AnnotationError> {
    let mut seen = std::collections::HashSet::with_capacity(annotations.len());

    for a in annotations {
        if !seen.insert(a.id) {
            return Err(AnnotationError::DuplicateId(a.id));
        }
        if a.asset_ref.trim().is_empty() {
            return Err(AnnotationError::MissingAsset(a.id));
        }
        let coords = [
            a.x_percent,
            a.y_percent,
            a.width_percent,
            a.height_percent,
            a.rotation_degrees,
        ];
        if !coords.iter().all(|v| v.is_finite()) {
            return Err(AnnotationError::NonFinite(a.id));
        }
    }

    Ok(())
}

/// Decode the JSON column of an entry.
pub fn decode_annotations(value: &serde_json::Value) -> AppResult<Vec<Annotation>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value.clone())
        .map_err(|e| AppError::Internal(format!("Corrupt annotations column: {e}")))
}

/// Encode annotations for the JSON column.
pub fn encode_annotations(annotations: &[Annotation]) -> AppResult<serde_json::Value> {
    serde_json::to_value(annotations)
        .map_err(|e| AppError::Internal(format!("Failed to encode annotations: {e}")))
}

/// One annotation editing session over an entry.
#[derive(Debug, Clone)]
pub struct AnnotationSession {
    container: ContainerSize,
    stored: Vec<Annotation>,
    working: Vec<PixelAnnotation>,
    selected: Option<AnnotationId>,
    next_id: AnnotationId,
}

impl AnnotationSession {
    /// Open a session on a stored set, rendered at `container`.
    #[must_use]
    pub fn open(stored: Vec<Annotation>, container: ContainerSize) -> Self {
        let working = stored.iter().map(|a| to_pixels(a, container)).collect();
        let next_id = stored.iter().map(|a| a.id).max().map_or(1, |max| max + 1);

        Self {
            container,
            stored,
            working,
            selected: None,
            next_id,
        }
    }

    /// Persisted annotations, as of the last save.
    #[must_use]
    pub fn stored(&self) -> &[Annotation] {
        &self.stored
    }

    /// Annotations as currently edited, in pixels.
    #[must_use]
    pub fn working(&self) -> &[PixelAnnotation] {
        &self.working
    }

    #[must_use]
    pub const fn container(&self) -> ContainerSize {
        self.container
    }

    #[must_use]
    pub const fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    /// Add a sticker at the default position and select it.
    pub fn add(&mut self, asset_ref: impl Into<String>) -> AnnotationId {
        let id = self.next_id;
        self.next_id += 1;

        let z_order = i32::try_from(self.working.len() + 1).unwrap_or(i32::MAX);
        self.working.push(PixelAnnotation {
            id,
            asset_ref: asset_ref.into(),
            x: DEFAULT_STICKER_X,
            y: DEFAULT_STICKER_Y,
            width: DEFAULT_STICKER_SIZE,
            height: DEFAULT_STICKER_SIZE,
            rotation_degrees: 0.0,
            z_order,
        });
        self.selected = Some(id);

        debug!(id, "Added sticker");
        id
    }

    /// Select an annotation.
    pub fn select(&mut self, id: AnnotationId) -> Result<(), AnnotationError> {
        self.find(id)?;
        self.selected = Some(id);
        Ok(())
    }

    /// Clear the selection.
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Move an annotation to a new pixel position.
    pub fn drag(&mut self, id: AnnotationId, x: f64, y: f64) -> Result<(), AnnotationError> {
        let a = self.find_mut(id)?;
        a.x = x;
        a.y = y;
        Ok(())
    }

    /// Resize an annotation. Resizing from a corner may also move it.
    pub fn resize(
        &mut self,
        id: AnnotationId,
        width: f64,
        height: f64,
        x: f64,
        y: f64,
    ) -> Result<(), AnnotationError> {
        let a = self.find_mut(id)?;
        a.width = width;
        a.height = height;
        a.x = x;
        a.y = y;
        Ok(())
    }

    /// Set an annotation's rotation.
    pub fn rotate(&mut self, id: AnnotationId, degrees: f64) -> Result<(), AnnotationError> {
        self.find_mut(id)?.rotation_degrees = degrees;
        Ok(())
    }

    /// Remove an annotation from both the working and the stored set.
    pub fn delete(&mut self, id: AnnotationId) -> Result<(), AnnotationError> {
        let before = self.working.len();
        self.working.retain(|a| a.id != id);
        self.stored.retain(|a| a.id != id);

        if self.working.len() == before {
            return Err(AnnotationError::NotFound(id));
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(())
    }

    /// Reflow the working set for a new container size. The stored set is
    /// not touched.
    pub fn resize_container(&mut self, container: ContainerSize) {
        let old = self.container;
        self.working = self
            .working
            .iter()
            .map(|a| to_pixels(&to_percent(a, old), container))
            .collect();
        self.container = container;
    }

    /// Write the working set back as the stored set and return it.
    pub fn save(&mut self) -> Vec<Annotation> {
        self.stored = self
            .working
            .iter()
            .map(|a| to_percent(a, self.container))
            .collect();
        self.stored.clone()
    }

    fn find(&self, id: AnnotationId) -> Result<&PixelAnnotation, AnnotationError> {
        self.working
            .iter()
            .find(|a| a.id == id)
            .ok_or(AnnotationError::NotFound(id))
    }

    fn find_mut(&mut self, id: AnnotationId) -> Result<&mut PixelAnnotation, AnnotationError> {
        self.working
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AnnotationError::NotFound(id))
    }
}
