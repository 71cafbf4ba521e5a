use std::collections::{HashMap, VecDeque};

use image::RgbaImage;
use log::debug;

use crate::layer::{Layer, LayerId};

/// Maximum number of snapshots kept; the oldest is evicted first
pub const MAX_HISTORY: usize = 50;

/// Full copy of every layer's pixels at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub per_layer: HashMap<LayerId, RgbaImage>,
    pub active_layer_id: LayerId,
}

impl HistorySnapshot {
    pub fn capture(layers: &[Layer], active_layer_id: LayerId) -> Self {
        Self {
            per_layer: layers
                .iter()
                .map(|layer| (layer.id, layer.buffer.clone()))
                .collect(),
            active_layer_id,
        }
    }

    /// Writes the saved pixels back into matching layers
    ///
    /// Layers without an entry are left alone, entries for layers that no longer
    /// exist are ignored.
    pub fn restore(&self, layers: &mut [Layer]) {
        for layer in layers.iter_mut() {
            if let Some(saved) = self.per_layer.get(&layer.id) {
                layer.buffer.clone_from(saved);
            }
        }
    }
}

/// Linear undo/redo over full-canvas snapshots
///
/// Snapshots are taken *before* each mutation. When live pixels have changed since
/// the entry at the current index, `undo` first checkpoints them so `redo` can
/// bring them back.
#[derive(Debug, Default)]
pub struct History {
    entries: VecDeque<HistorySnapshot>,
    /// `None` is the empty history (index -1)
    index: Option<usize>,
    dirty: bool,
}

impl History {
    /// Creates a new empty history
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Returns true if there is an earlier state to go back to
    ///
    /// Unsaved live changes count: the entry at the current index is then earlier.
    pub fn can_undo(&self) -> bool {
        match self.index {
            Some(index) => index > 0 || self.dirty,
            None => false,
        }
    }

    /// Returns true if there is a later snapshot to go forward to
    ///
    /// Never while live pixels have unsaved changes, redo would overwrite them.
    pub fn can_redo(&self) -> bool {
        match self.index {
            Some(index) => !self.dirty && index + 1 < self.entries.len(),
            None => false,
        }
    }

    /// Records that live pixels no longer match the snapshot at the current index
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Captures every layer, dropping any redo entries past the current index
    ///
    /// When nothing changed since the current entry, that entry is kept as is
    /// rather than stored twice.
    pub fn snapshot(&mut self, layers: &[Layer], active_layer_id: LayerId) {
        let snapshot = HistorySnapshot::capture(layers, active_layer_id);
        if let Some(index) = self.unchanged_index(&snapshot) {
            self.entries.truncate(index + 1);
            return;
        }
        self.push(snapshot);
        self.dirty = false;
    }

    fn unchanged_index(&self, snapshot: &HistorySnapshot) -> Option<usize> {
        if self.dirty {
            return None;
        }
        let index = self.index?;
        let current = self.entries.get(index)?;
        (current.per_layer == snapshot.per_layer).then_some(index)
    }

    fn push(&mut self, snapshot: HistorySnapshot) {
        let keep = self.index.map_or(0, |index| index + 1);
        self.entries.truncate(keep);
        self.entries.push_back(snapshot);
        while self.entries.len() > MAX_HISTORY {
            self.entries.pop_front();
        }
        self.index = Some(self.entries.len() - 1);
        debug!("History snapshot {}/{}", self.entries.len(), MAX_HISTORY);
    }

    /// Restores the previous snapshot. Returns false if there is nothing to undo.
    pub fn undo(&mut self, layers: &mut [Layer], active_layer_id: LayerId) -> bool {
        if !self.can_undo() {
            return false;
        }
        if self.dirty {
            self.push(HistorySnapshot::capture(layers, active_layer_id));
        }
        let Some(target) = self.index.and_then(|index| index.checked_sub(1)) else {
            return false;
        };
        self.restore_to(target, layers);
        true
    }

    /// Restores the next snapshot. Returns false if already at the newest one.
    pub fn redo(&mut self, layers: &mut [Layer]) -> bool {
        if !self.can_redo() {
            return false;
        }
        let Some(target) = self.index.map(|index| index + 1) else {
            return false;
        };
        self.restore_to(target, layers);
        true
    }

    fn restore_to(&mut self, target: usize, layers: &mut [Layer]) {
        if let Some(snapshot) = self.entries.get(target) {
            snapshot.restore(layers);
            self.index = Some(target);
            self.dirty = false;
            debug!("History restored to {}/{}", target, self.entries.len());
        }
    }
}
