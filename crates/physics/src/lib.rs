//! Kinematics and sphere collision for Voidstrike.
//!
//! Everything here works on plain `Transform`/`Velocity` values so the game
//! crate can call it from whatever storage it keeps entities in.

pub mod collision;
pub mod integrator;

pub use collision::*;
pub use integrator::*;
