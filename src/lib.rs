//! Scoped, shared-ownership wrappers over raw OpenGL objects, plus the
//! pieces of a small billboard game built on top of them.
//!
//! Every GL object type comes in three layers: the owning type
//! (`Buffer`, `Texture2D`, ...), a `*Binding` type whose existence means
//! the object is bound and whose methods mutate bound-object state, and
//! a `Scoped*Binding` guard that records the previous binding on entry
//! and restores it on drop.

pub mod application;
pub mod billboard;
pub mod buffer;
pub mod debug_draw;
pub mod draw;
pub mod error;
pub mod framebuffer;
pub mod game;
pub mod geometry;
pub mod handle;
pub mod mesh;
pub mod minefield;
pub mod scene;
pub mod shader;
pub mod texture;
pub mod vertex_array;

pub use error::{Error, Result};
