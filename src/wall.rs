//! Wall canvas model: placed images and bounds clamping.
//!
//! DESIGN
//! ======
//! Every placed image is one `WallItem { url, state }`, so insertion and
//! removal can never leave a URL paired with another image's geometry.
//! The editor's wire format still carries two parallel arrays (`images`
//! and `imageStates`); `WallWire` converts at the serde boundary and
//! rejects payloads whose arrays disagree in length.

use serde::{Deserialize, Serialize};

pub const MIN_WALL_SIZE: f64 = 200.0;
pub const MAX_WALL_SIZE: f64 = 2000.0;
pub const DEFAULT_WALL_WIDTH: f64 = 800.0;
pub const DEFAULT_WALL_HEIGHT: f64 = 600.0;
pub const DEFAULT_WALL_COLOR: &str = "#fff";

const DEFAULT_ITEM_OFFSET: f64 = 100.0;
const DEFAULT_ITEM_SIZE: f64 = 150.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WallError {
    #[error("wall size must be between {MIN_WALL_SIZE}px and {MAX_WALL_SIZE}px")]
    InvalidDimensions,
    #[error("images and imageStates must have the same length ({images} vs {states})")]
    MisalignedArrays { images: usize, states: usize },
}

// =============================================================================
// IMAGE STATE
// =============================================================================

/// Geometry and styling of one placed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageState {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub shape: String,
    pub frame: String,
    pub is_decor: bool,
    pub z_index: i32,
}

impl Default for ImageState {
    fn default() -> Self {
        Self {
            x: DEFAULT_ITEM_OFFSET,
            y: DEFAULT_ITEM_OFFSET,
            width: DEFAULT_ITEM_SIZE,
            height: DEFAULT_ITEM_SIZE,
            shape: "square".into(),
            frame: String::new(),
            is_decor: false,
            z_index: 0,
        }
    }
}

impl ImageState {
    /// Fit this rectangle inside `[0, wall_width] x [0, wall_height]`.
    ///
    /// Size shrinks first, then the origin slides back so the far edge sits
    /// on the wall boundary.
    pub fn clamp_to(&mut self, wall_width: f64, wall_height: f64) {
        self.width = self.width.clamp(0.0, wall_width);
        self.height = self.height.clamp(0.0, wall_height);
        self.x = self.x.min(wall_width - self.width).max(0.0);
        self.y = self.y.min(wall_height - self.height).max(0.0);
    }
}

/// One image placed on the wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallItem {
    pub url: String,
    pub state: ImageState,
}

// =============================================================================
// WALL
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WallWire", into = "WallWire")]
pub struct Wall {
    pub color: String,
    pub width: f64,
    pub height: f64,
    /// Background image URL, if any.
    pub image: Option<String>,
    pub items: Vec<WallItem>,
}

impl Default for Wall {
    fn default() -> Self {
        Self {
            color: DEFAULT_WALL_COLOR.into(),
            width: DEFAULT_WALL_WIDTH,
            height: DEFAULT_WALL_HEIGHT,
            image: None,
            items: Vec::new(),
        }
    }
}

impl Wall {
    /// Change wall dimensions and re-clamp every image into the new bounds.
    pub fn resize(&mut self, width: f64, height: f64) -> Result<(), WallError> {
        validate_dimensions(width, height)?;
        self.width = width;
        self.height = height;
        self.clamp_items();
        Ok(())
    }

    /// Clamp every image into the current wall bounds.
    pub fn clamp_items(&mut self) {
        let (width, height) = (self.width, self.height);
        for item in &mut self.items {
            item.state.clamp_to(width, height);
        }
    }

    /// Prepare an incoming wall for storage over `previous`. A size change
    /// goes through [`Wall::resize`]; otherwise images are clamped to the
    /// unchanged bounds. Returns whether the size changed.
    pub fn settle(&mut self, previous: &Wall) -> Result<bool, WallError> {
        let (width, height) = (self.width, self.height);
        let resized = (previous.width - width).abs() > f64::EPSILON || (previous.height - height).abs() > f64::EPSILON;
        if resized {
            self.resize(width, height)?;
        } else {
            self.clamp_items();
        }
        Ok(resized)
    }
}

fn validate_dimensions(width: f64, height: f64) -> Result<(), WallError> {
    let in_range = |v: f64| v.is_finite() && (MIN_WALL_SIZE..=MAX_WALL_SIZE).contains(&v);
    if in_range(width) && in_range(height) {
        Ok(())
    } else {
        Err(WallError::InvalidDimensions)
    }
}

// =============================================================================
// WIRE FORMAT
// =============================================================================

/// Editor wire shape: parallel `images` / `imageStates` arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallWire {
    #[serde(default)]
    pub wall_color: Option<String>,
    #[serde(default)]
    pub wall_width: Option<f64>,
    #[serde(default)]
    pub wall_height: Option<f64>,
    #[serde(default)]
    pub wall_image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub image_states: Vec<ImageState>,
}

impl TryFrom<WallWire> for Wall {
    type Error = WallError;

    fn try_from(wire: WallWire) -> Result<Self, Self::Error> {
        if wire.images.len() != wire.image_states.len() {
            return Err(WallError::MisalignedArrays { images: wire.images.len(), states: wire.image_states.len() });
        }
        let width = wire.wall_width.unwrap_or(DEFAULT_WALL_WIDTH);
        let height = wire.wall_height.unwrap_or(DEFAULT_WALL_HEIGHT);
        validate_dimensions(width, height)?;

        let items = wire
            .images
            .into_iter()
            .zip(wire.image_states)
            .map(|(url, state)| WallItem { url, state })
            .collect();

        Ok(Self {
            color: wire.wall_color.unwrap_or_else(|| DEFAULT_WALL_COLOR.into()),
            width,
            height,
            image: wire.wall_image.filter(|s| !s.is_empty()),
            items,
        })
    }
}

impl From<Wall> for WallWire {
    fn from(wall: Wall) -> Self {
        let (images, image_states) = wall
            .items
            .into_iter()
            .map(|item| (item.url, item.state))
            .unzip();
        Self {
            wall_color: Some(wall.color),
            wall_width: Some(wall.width),
            wall_height: Some(wall.height),
            wall_image: wall.image,
            images,
            image_states,
        }
    }
}

#[cfg(test)]
#[path = "wall_test.rs"]
mod tests;
