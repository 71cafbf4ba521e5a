#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod brush;
pub mod color;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod history;
pub mod layer;
pub mod preset;
pub mod renderer;
pub mod session;
pub mod stroke;

pub use app::PaintApp;
pub use brush::{BrushSettings, BrushType};
pub use color::Rgb;
pub use config::CanvasConfig;
pub use document::Document;
pub use error::{ColorParseError, ExportError};
pub use export::{ExportFormat, ExportedImage};
pub use history::{History, HistorySnapshot, MAX_HISTORY};
pub use layer::{Layer, LayerId, LayerUpdate};
pub use preset::Preset;
pub use renderer::Renderer;
pub use session::PaintSession;
pub use stroke::Point;
