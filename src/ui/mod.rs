pub mod app;
pub mod commands;
pub mod grid;
pub mod theme;

pub use app::{App, Flow};
pub use commands::Command;
pub use grid::Grid;
pub use theme::Theme;
