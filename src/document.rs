use log::{debug, warn};

use crate::color::Rgb;
use crate::layer::{Layer, LayerId, LayerUpdate};

/// Ordered stack of raster layers, bottom first, plus the active layer
///
/// There is always at least one layer and the active id always names one of them.
#[derive(Debug, Clone)]
pub struct Document {
    layers: Vec<Layer>,
    active_layer: LayerId,
    width: u32,
    height: u32,
}

impl Document {
    /// Creates a document with a single opaque "Background" layer
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        let background = Layer::new_filled("Background", width, height, background);
        Self {
            active_layer: background.id,
            layers: vec![background],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Layers in compositing order, bottom to top
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn active_layer_id(&self) -> LayerId {
        self.active_layer
    }

    pub fn active_layer(&self) -> Option<&Layer> {
        self.layer(self.active_layer)
    }

    pub fn active_layer_mut(&mut self) -> Option<&mut Layer> {
        let id = self.active_layer;
        self.layer_mut(id)
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.id == id)
    }

    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// Selects an existing layer; unknown ids are ignored
    pub fn set_active_layer(&mut self, id: LayerId) -> bool {
        if self.layer(id).is_none() {
            debug!("Ignoring selection of unknown layer {}", id);
            return false;
        }
        self.active_layer = id;
        true
    }

    /// Appends a transparent layer on top and makes it active
    pub fn add_layer(&mut self) -> LayerId {
        let name = format!("Layer {}", self.layers.len() + 1);
        let layer = Layer::new(&name, self.width, self.height);
        let id = layer.id;
        debug!("Adding layer {} ({})", name, id);
        self.layers.push(layer);
        self.active_layer = id;
        id
    }

    /// Removes a layer. Refuses to remove the last one or an unknown id.
    ///
    /// When the active layer is removed the new topmost layer becomes active.
    pub fn delete_layer(&mut self, id: LayerId) -> Option<Layer> {
        if self.layers.len() <= 1 {
            warn!("Refusing to delete the last remaining layer");
            return None;
        }
        let index = self.index_of(id)?;
        let removed = self.layers.remove(index);

        if self.active_layer == id {
            if let Some(top) = self.layers.last() {
                self.active_layer = top.id;
            }
        }
        debug!("Deleted layer {} ({})", removed.name, removed.id);
        Some(removed)
    }

    /// Merges metadata into a layer without touching its pixels
    pub fn update_layer(&mut self, id: LayerId, update: LayerUpdate) -> bool {
        match self.layer_mut(id) {
            Some(layer) => {
                layer.apply(update);
                true
            }
            None => false,
        }
    }

    /// Moves the layer at `from` so it ends up at `to`
    ///
    /// An out-of-range `from` is rejected; `to` is clamped to the top of the stack.
    pub fn reorder_layers(&mut self, from: usize, to: usize) -> bool {
        if from >= self.layers.len() {
            debug!("Ignoring reorder from out-of-range index {}", from);
            return false;
        }
        let layer = self.layers.remove(from);
        let to = to.min(self.layers.len());
        self.layers.insert(to, layer);
        true
    }

    /// Resets a layer to fully transparent, whatever it held before
    pub fn clear_layer(&mut self, id: LayerId) -> bool {
        match self.layer_mut(id) {
            Some(layer) => {
                layer.clear();
                true
            }
            None => false,
        }
    }
}
