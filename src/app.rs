use std::path::Path;

use crate::brush::{BrushSettings, BrushType};
use crate::color::Rgb;
use crate::export::ExportFormat;
use crate::layer::{LayerId, LayerUpdate};
use crate::preset::Preset;
use crate::renderer::Renderer;
use crate::session::PaintSession;
use crate::stroke::Point;

/// Pressure reported for mouse input, which has none
const MOUSE_PRESSURE: f32 = 0.5;

/// Layer panel requests, applied once the layer list is no longer borrowed
enum LayerAction {
    Select(LayerId),
    Update(LayerId, LayerUpdate),
    Move { from: usize, to: usize },
    Delete(LayerId),
}

/// Host preferences persisted between runs
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
struct Preferences {
    brush: BrushSettings,
    export_format: ExportFormat,
}

pub struct PaintApp {
    prefs: Preferences,
    session: PaintSession,
    renderer: Renderer,
    status: Option<String>,
}

impl PaintApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let prefs: Preferences = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        let session = PaintSession::default();
        let renderer = Renderer::new(session.width(), session.height());
        Self {
            prefs,
            session,
            renderer,
            status: None,
        }
    }

    fn export(&mut self) {
        let result = self
            .session
            .export_canvas(self.prefs.export_format)
            .and_then(|image| image.save_to(Path::new(".")));
        self.status = Some(match result {
            Ok(path) => format!("Exported {}", path.display()),
            Err(err) => {
                log::error!("Export failed: {}", err);
                format!("Export failed: {}", err)
            }
        });
    }

    fn brush_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Brush");
        ui.horizontal_wrapped(|ui| {
            for brush_type in BrushType::ALL {
                let current = &mut self.prefs.brush.brush_type;
                ui.selectable_value(current, brush_type, brush_type.label());
            }
        });

        ui.horizontal(|ui| {
            ui.label("Color:");
            let brush = &mut self.prefs.brush;
            let mut rgb = [brush.color.r, brush.color.g, brush.color.b];
            if egui::color_picker::color_edit_button_srgb(ui, &mut rgb).changed() {
                brush.color = Rgb::new(rgb[0], rgb[1], rgb[2]);
            }
            ui.monospace(brush.color.to_string());
        });
        ui.add(egui::Slider::new(&mut self.prefs.brush.size, 1.0..=100.0).text("Size"));
        ui.add(egui::Slider::new(&mut self.prefs.brush.opacity, 0.01..=1.0).text("Opacity"));
        ui.add(egui::Slider::new(&mut self.prefs.brush.smoothing, 0..=100).text("Smoothing"));
    }

    fn layers_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Layers");
        ui.horizontal(|ui| {
            if ui.button("Add Layer").clicked() {
                self.session.add_layer();
            }
            if ui.button("Clear").clicked() {
                let active = self.session.active_layer_id();
                self.session.clear_layer(active);
                self.status = Some("Layer cleared".to_owned());
            }
        });

        let mut actions = Vec::new();
        let active = self.session.active_layer_id();
        let count = self.session.layers().len();

        // Topmost layer first, the way layer stacks are usually listed
        for (index, layer) in self.session.layers().iter().enumerate().rev() {
            ui.horizontal(|ui| {
                if ui.selectable_label(layer.id == active, layer.name.as_str()).clicked() {
                    actions.push(LayerAction::Select(layer.id));
                }
                let mut visible = layer.visible;
                if ui.checkbox(&mut visible, "👁").changed() {
                    actions.push(LayerAction::Update(layer.id, LayerUpdate::visible(visible)));
                }
                let mut locked = layer.locked;
                if ui.checkbox(&mut locked, "🔒").changed() {
                    actions.push(LayerAction::Update(layer.id, LayerUpdate::locked(locked)));
                }
                if ui.add_enabled(index + 1 < count, egui::Button::new("⬆")).clicked() {
                    actions.push(LayerAction::Move { from: index, to: index + 1 });
                }
                if ui.add_enabled(index > 0, egui::Button::new("⬇")).clicked() {
                    actions.push(LayerAction::Move { from: index, to: index - 1 });
                }
                if ui.add_enabled(count > 1, egui::Button::new("🗑")).clicked() {
                    actions.push(LayerAction::Delete(layer.id));
                }
            });
            let mut opacity = layer.opacity;
            if ui
                .add(egui::Slider::new(&mut opacity, 0.0..=1.0).text("Opacity"))
                .changed()
            {
                actions.push(LayerAction::Update(layer.id, LayerUpdate::opacity(opacity)));
            }
            ui.separator();
        }

        for action in actions {
            match action {
                LayerAction::Select(id) => self.session.set_active_layer(id),
                LayerAction::Update(id, update) => self.session.update_layer(id, update),
                LayerAction::Move { from, to } => self.session.reorder_layers(from, to),
                LayerAction::Delete(id) => self.session.delete_layer(id),
            }
        }
    }

    fn actions_panel(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.session.can_undo(), egui::Button::new("Undo"))
                .clicked()
            {
                self.session.undo();
            }
            if ui
                .add_enabled(self.session.can_redo(), egui::Button::new("Redo"))
                .clicked()
            {
                self.session.redo();
            }
        });

        ui.heading("Presets");
        ui.horizontal(|ui| {
            for preset in Preset::ALL {
                if ui.button(preset.label()).clicked() {
                    self.session.stamp_preset(preset);
                    self.status = Some(format!("{} mannequin added to layer", preset.label()));
                }
            }
        });

        ui.heading("Export");
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.prefs.export_format, ExportFormat::Png, "PNG");
            ui.selectable_value(&mut self.prefs.export_format, ExportFormat::Jpeg, "JPEG");
            if ui.button("Export").clicked() {
                self.export();
            }
        });

        if let Some(status) = &self.status {
            ui.label(status.as_str());
        }
    }

    /// Maps a screen position inside `rect` to canvas pixels
    fn to_canvas(&self, pos: egui::Pos2, rect: egui::Rect) -> Point {
        let x = (pos.x - rect.min.x) / rect.width() * self.session.width() as f32;
        let y = (pos.y - rect.min.y) / rect.height() * self.session.height() as f32;
        Point::new(x, y, MOUSE_PRESSURE)
    }

    fn canvas(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let available = ui.available_size();
        let aspect = self.session.width() as f32 / self.session.height() as f32;
        let size = if available.x / available.y > aspect {
            egui::vec2(available.y * aspect, available.y)
        } else {
            egui::vec2(available.x, available.x / aspect)
        };

        let (response, painter) = ui.allocate_painter(size, egui::Sense::drag());
        let rect = response.rect;

        if let Some(pos) = response.interact_pointer_pos() {
            let point = self.to_canvas(pos, rect);
            if response.drag_started() {
                self.session.start_stroke(point, &self.prefs.brush);
            } else if response.dragged() {
                self.session.continue_stroke(point, &self.prefs.brush);
            }
        }
        if response.drag_stopped() {
            self.session.end_stroke();
        }

        self.renderer.render(ctx, &painter, rect, self.session.layers());
    }
}

impl eframe::App for PaintApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.prefs);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("tools_panel")
            .resizable(false)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.brush_panel(ui);
                    ui.separator();
                    self.actions_panel(ui);
                    ui.separator();
                    self.layers_panel(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.canvas(ctx, ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_restore_brush_and_format() {
        let prefs = Preferences {
            brush: BrushSettings::new(BrushType::Airbrush, 24.0, Rgb::new(0, 128, 255)),
            export_format: ExportFormat::Jpeg,
        };
        let json = serde_json::to_string(&prefs).unwrap();
        let back: Preferences = serde_json::from_str(&json).unwrap();
        assert_eq!(back.brush, prefs.brush);
        assert_eq!(back.export_format, ExportFormat::Jpeg);
    }

    #[test]
    fn missing_preferences_fall_back_to_defaults() {
        let prefs: Preferences = serde_json::from_str(r#"{"export_format": "jpeg"}"#).unwrap();
        assert_eq!(prefs.brush, BrushSettings::default());
        assert_eq!(prefs.export_format, ExportFormat::Jpeg);
    }
}
