//! Rendering contract for Voidstrike.
//!
//! The simulation hands a [`FrameSnapshot`] to whatever implements
//! [`Renderer`] once per frame and never reads anything back. A concrete GPU
//! backend lives outside this workspace; [`HeadlessRenderer`] is used by the
//! binary and by tests.

pub mod assets;
pub mod camera;
pub mod frame;
pub mod renderer;
pub mod ui;

pub use assets::*;
pub use camera::*;
pub use frame::*;
pub use renderer::*;
pub use ui::*;
