//! Terminal UI for Flightdeck.
//!
//! A message-driven dashboard: a single-threaded reducer owns all UI state
//! while background workers keep the status header and log panel fresh.
//!
//! ## Screens
//!
//! - Main menu
//! - Work-item selection
//! - Workflow progress tracking
//! - Live log viewer (also composable as a side panel, Tab toggles)
//! - Doctor (environment diagnostics)
//!
//! ## Global hotkeys
//!
//! - `Tab` - toggle the side log panel
//! - `Ctrl+L` - toggle the full-screen log viewer
//! - `Esc` - back to the main menu
//! - `q` / `Ctrl+C` - quit

pub mod app;
pub mod command;
pub mod doctor;
pub mod header;
pub mod input;
pub mod message;
pub mod model;
pub mod screen;
pub mod spinner;
pub mod theme;
pub mod view;

pub use app::{Dashboard, DashboardOptions};
pub use header::{HeaderUpdateWorker, HeaderWorkerConfig};
pub use message::Message;
pub use model::Model;
pub use screen::Screen;
pub use spinner::{SpinnerHandle, SpinnerWorker};
pub use theme::{Theme, ThemeName, load_theme};
