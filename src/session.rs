use log::{debug, info};

use crate::brush::BrushSettings;
use crate::config::CanvasConfig;
use crate::document::Document;
use crate::error::ExportResult;
use crate::export::{self, ExportFormat, ExportedImage};
use crate::history::History;
use crate::layer::{Layer, LayerId, LayerUpdate};
use crate::preset::Preset;
use crate::stroke::{Point, StrokeState};

/// One painting session: the layer stack, its undo history and the stroke in progress
///
/// Every operation is infallible from the caller's point of view. Requests that make
/// no sense in the current state (locked layer, unknown id, nothing to undo) are
/// ignored.
#[derive(Debug)]
pub struct PaintSession {
    config: CanvasConfig,
    document: Document,
    history: History,
    stroke: StrokeState,
}

impl Default for PaintSession {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl PaintSession {
    /// Creates a session with a single background layer and a baseline snapshot
    pub fn new(config: CanvasConfig) -> Self {
        let document = Document::new(config.width, config.height, config.background);
        let mut history = History::new();
        history.snapshot(document.layers(), document.active_layer_id());
        info!("New {}x{} painting session", config.width, config.height);
        Self {
            config,
            document,
            history,
            stroke: StrokeState::default(),
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn width(&self) -> u32 {
        self.document.width()
    }

    pub fn height(&self) -> u32 {
        self.document.height()
    }

    /// Layers bottom to top, read-only
    pub fn layers(&self) -> &[Layer] {
        self.document.layers()
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.document.layer(id)
    }

    pub fn active_layer_id(&self) -> LayerId {
        self.document.active_layer_id()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_drawing(&self) -> bool {
        self.stroke.is_drawing()
    }

    /// Points recorded for the stroke in progress
    pub fn stroke_path(&self) -> &[Point] {
        self.stroke.path()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_index(&self) -> Option<usize> {
        self.history.index()
    }

    fn snapshot(&mut self) {
        self.history
            .snapshot(self.document.layers(), self.document.active_layer_id());
    }

    // --- Strokes ---

    /// Begins a stroke on the active layer
    ///
    /// A stroke already in progress is ended first. Locked or missing active layers
    /// reject the stroke. The pre-stroke pixels are snapshotted before anything is drawn.
    pub fn start_stroke(&mut self, point: Point, brush: &BrushSettings) {
        if self.stroke.is_drawing() {
            debug!("Stroke started while drawing; ending the previous one");
            self.end_stroke();
        }

        match self.document.active_layer() {
            Some(layer) if !layer.locked => {}
            Some(layer) => {
                debug!("Ignoring stroke on locked layer {}", layer.name);
                return;
            }
            None => return,
        }

        self.snapshot();
        self.stroke.start(point);
        debug!("Stroke started with {:?}", brush.brush_type);
    }

    /// Adds a sample to the stroke and draws the stroke up to it on the active layer
    pub fn continue_stroke(&mut self, point: Point, brush: &BrushSettings) {
        if !self.stroke.is_drawing() {
            return;
        }
        let Some(layer) = self.document.active_layer_mut() else {
            return;
        };
        if self.stroke.extend(point, brush, &mut layer.buffer) {
            self.history.mark_dirty();
        }
    }

    /// Finishes the stroke; everything up to the last sample is already drawn
    pub fn end_stroke(&mut self) {
        if let Some(path) = self.stroke.finish() {
            debug!("Stroke ended after {} samples", path.len());
        }
    }

    /// Ends a stroke in progress before an edit that changes what it draws on
    fn settle_stroke(&mut self) {
        if self.stroke.is_drawing() {
            self.end_stroke();
        }
    }

    // --- Layers ---

    /// Appends a transparent layer on top, selects it and records history
    pub fn add_layer(&mut self) -> LayerId {
        self.settle_stroke();
        self.snapshot();
        let id = self.document.add_layer();
        self.history.mark_dirty();
        id
    }

    /// Removes a layer; the last remaining layer can't be deleted
    pub fn delete_layer(&mut self, id: LayerId) {
        if self.document.len() <= 1 || self.document.layer(id).is_none() {
            debug!("Ignoring delete of layer {}", id);
            return;
        }
        self.settle_stroke();
        self.snapshot();
        if self.document.delete_layer(id).is_some() {
            self.history.mark_dirty();
        }
    }

    /// Merges metadata into a layer. Not recorded in history.
    pub fn update_layer(&mut self, id: LayerId, update: LayerUpdate) {
        self.document.update_layer(id, update);
    }

    /// Moves a layer within the stack. Not recorded in history.
    pub fn reorder_layers(&mut self, from_index: usize, to_index: usize) {
        self.document.reorder_layers(from_index, to_index);
    }

    /// Selects the layer strokes go to, ending any stroke in progress
    pub fn set_active_layer(&mut self, id: LayerId) {
        if self.document.active_layer_id() != id && self.document.layer(id).is_some() {
            self.settle_stroke();
        }
        self.document.set_active_layer(id);
    }

    /// Resets a layer to fully transparent after recording history
    pub fn clear_layer(&mut self, id: LayerId) {
        if self.document.layer(id).is_none() {
            return;
        }
        self.settle_stroke();
        self.snapshot();
        self.document.clear_layer(id);
        self.history.mark_dirty();
    }

    /// Stamps a mannequin onto the active layer
    pub fn stamp_preset(&mut self, preset: Preset) {
        match self.document.active_layer() {
            Some(layer) if !layer.locked => {}
            _ => {
                debug!("Ignoring {} preset: no writable active layer", preset.label());
                return;
            }
        }
        self.settle_stroke();
        self.snapshot();
        if let Some(layer) = self.document.active_layer_mut() {
            preset.stamp(&mut layer.buffer);
            self.history.mark_dirty();
        }
    }

    // --- History ---

    /// Steps back one snapshot. A stroke in progress is ended first.
    pub fn undo(&mut self) {
        self.settle_stroke();
        let active = self.document.active_layer_id();
        if self.history.undo(self.document.layers_mut(), active) {
            debug!("Undo -> {:?}", self.history.index());
        }
    }

    /// Steps forward one snapshot. A stroke in progress is ended first.
    pub fn redo(&mut self) {
        self.settle_stroke();
        if self.history.redo(self.document.layers_mut()) {
            debug!("Redo -> {:?}", self.history.index());
        }
    }

    // --- Export ---

    /// Flattens the visible layers and encodes them in `format`
    pub fn export_canvas(&self, format: ExportFormat) -> ExportResult<ExportedImage> {
        export::export(self.document.layers(), self.width(), self.height(), format)
    }
}
