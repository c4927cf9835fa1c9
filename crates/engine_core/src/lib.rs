//! Core engine types and utilities for Voidstrike.
//!
//! This crate provides the foundational types used across all engine systems:
//! - Transform and spatial helpers
//! - Frame time management
//! - Component types shared by every simulated object

pub mod components;
pub mod time;
pub mod transform;

pub use components::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
