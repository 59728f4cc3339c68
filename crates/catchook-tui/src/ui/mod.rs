//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, title/status bars and overlays
//! - `input`: keyboard handling per screen and overlay
//! - `styles`: color palette and text styles
//! - `screens`: one renderer per route (login, setup, dashboard, users)

pub mod input;
pub mod render;
pub mod screens;
pub mod styles;
