//! Software rendering module
//!
//! Raycast walls, billboards and overlays into a single RGBA framebuffer.

pub mod framebuffer;
pub mod scene;

pub use framebuffer::{Framebuffer, Rgba};
pub use scene::{SceneRenderer, danger_level};
