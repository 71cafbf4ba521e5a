use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::color::Rgb;

/// A fully transparent pixel
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// A unique, stable identifier for a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    /// Creates a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents a single raster layer in the document
#[derive(Clone, PartialEq)]
pub struct Layer {
    /// Unique identifier for the layer
    pub id: LayerId,
    /// Display name of the layer
    pub name: String,
    /// Whether the layer takes part in compositing and export
    pub visible: bool,
    /// Uniform opacity multiplier applied when compositing, 0.0..=1.0
    pub opacity: f32,
    /// Locked layers reject strokes and preset stamps
    pub locked: bool,
    /// Straight-alpha RGBA8 pixels at canvas resolution
    pub buffer: RgbaImage,
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("visible", &self.visible)
            .field("opacity", &self.opacity)
            .field("locked", &self.locked)
            .field("buffer", &format_args!("{}x{}", self.buffer.width(), self.buffer.height()))
            .finish()
    }
}

impl Layer {
    /// Creates a visible, unlocked, fully transparent layer
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            id: LayerId::new(),
            name: name.to_string(),
            visible: true,
            opacity: 1.0,
            locked: false,
            buffer: RgbaImage::from_pixel(width, height, TRANSPARENT),
        }
    }

    /// Creates a layer filled with an opaque colour
    pub fn new_filled(name: &str, width: u32, height: u32, color: Rgb) -> Self {
        Self {
            buffer: RgbaImage::from_pixel(width, height, color.with_alpha(255)),
            ..Self::new(name, width, height)
        }
    }

    /// Resets every pixel to fully transparent
    pub fn clear(&mut self) {
        for pixel in self.buffer.pixels_mut() {
            *pixel = TRANSPARENT;
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.buffer.pixels().all(|p| p[3] == 0)
    }

    /// Applies a partial metadata update; pixel data is never touched
    pub fn apply(&mut self, update: LayerUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(visible) = update.visible {
            self.visible = visible;
        }
        if let Some(opacity) = update.opacity {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(locked) = update.locked {
            self.locked = locked;
        }
    }
}

/// Partial update for a layer's metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerUpdate {
    pub name: Option<String>,
    pub visible: Option<bool>,
    pub opacity: Option<f32>,
    pub locked: Option<bool>,
}

impl LayerUpdate {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn visible(visible: bool) -> Self {
        Self {
            visible: Some(visible),
            ..Self::default()
        }
    }

    pub fn opacity(opacity: f32) -> Self {
        Self {
            opacity: Some(opacity),
            ..Self::default()
        }
    }

    pub fn locked(locked: bool) -> Self {
        Self {
            locked: Some(locked),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_layer_is_transparent() {
        let layer = Layer::new("Layer 2", 8, 4);
        assert!(layer.is_transparent());
        assert_eq!(layer.buffer.dimensions(), (8, 4));
        assert!(layer.visible);
        assert!(!layer.locked);
    }

    #[test]
    fn clear_resets_filled_layer_to_transparent() {
        let mut layer = Layer::new_filled("Background", 4, 4, Rgb::WHITE);
        assert!(!layer.is_transparent());
        layer.clear();
        assert!(layer.is_transparent());
    }

    #[test]
    fn update_merges_only_given_fields() {
        let mut layer = Layer::new("Layer 1", 2, 2);
        layer.apply(LayerUpdate {
            visible: Some(false),
            opacity: Some(1.5),
            ..LayerUpdate::default()
        });
        assert!(!layer.visible);
        assert_eq!(layer.opacity, 1.0);
        assert_eq!(layer.name, "Layer 1");
        assert!(!layer.locked);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(LayerId::new(), LayerId::new());
    }
}
