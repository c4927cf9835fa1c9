//! Renderer trait and the headless implementation.

use crate::{assets::AssetStore, camera::CameraUniform, frame::FrameSnapshot};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer used before init")]
    NotInitialized,
    #[error("invalid surface size {width}x{height}")]
    InvalidSurface { width: u32, height: u32 },
    #[error("backend error: {0}")]
    Backend(String),
}

/// Output surface description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
}

impl SurfaceConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Anything that can draw a [`FrameSnapshot`].
pub trait Renderer {
    fn init(&mut self, surface: &SurfaceConfig) -> Result<(), RenderError>;

    fn render(&mut self, frame: &FrameSnapshot) -> Result<(), RenderError>;

    fn resize(&mut self, width: u32, height: u32);
}

/// Running totals kept by [`HeadlessRenderer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: u64,
    /// Items drawn in the last frame.
    pub draws: usize,
    pub particles: usize,
    /// Items in the last frame whose geometry id is not in the asset store.
    pub missing_meshes: usize,
    pub ui_nodes: usize,
}

/// Renderer that validates and counts instead of drawing.
#[derive(Debug)]
pub struct HeadlessRenderer {
    assets: AssetStore,
    surface: Option<SurfaceConfig>,
    stats: RenderStats,
    last_camera: CameraUniform,
    /// Geometry ids already reported missing, so each one logs once.
    reported_missing: HashSet<String>,
}

impl HeadlessRenderer {
    pub fn new(assets: AssetStore) -> Self {
        Self {
            assets,
            surface: None,
            stats: RenderStats::default(),
            last_camera: CameraUniform::default(),
            reported_missing: HashSet::new(),
        }
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn surface(&self) -> Option<SurfaceConfig> {
        self.surface
    }

    pub fn last_camera(&self) -> &CameraUniform {
        &self.last_camera
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }
}

impl Renderer for HeadlessRenderer {
    fn init(&mut self, surface: &SurfaceConfig) -> Result<(), RenderError> {
        if surface.width == 0 || surface.height == 0 {
            return Err(RenderError::InvalidSurface {
                width: surface.width,
                height: surface.height,
            });
        }
        log::info!(
            "Headless renderer initialized at {}x{} ({} assets)",
            surface.width,
            surface.height,
            self.assets.len()
        );
        self.surface = Some(*surface);
        Ok(())
    }

    fn render(&mut self, frame: &FrameSnapshot) -> Result<(), RenderError> {
        if self.surface.is_none() {
            return Err(RenderError::NotInitialized);
        }

        let mut draws = 0;
        let mut missing = 0;
        for item in frame.drawable() {
            let Some(mesh) = &item.mesh else { continue };
            if self.assets.contains(&mesh.geometry_id) {
                draws += 1;
            } else {
                missing += 1;
                if self.reported_missing.insert(mesh.geometry_id.clone()) {
                    log::warn!("No geometry loaded for '{}' ({})", mesh.geometry_id, item.name);
                }
            }
        }

        self.last_camera.update(&frame.camera);
        self.stats.frames += 1;
        self.stats.draws = draws;
        self.stats.missing_meshes = missing;
        self.stats.particles = frame.particles.len();
        self.stats.ui_nodes = frame.ui.as_ref().map_or(0, |ui| ui.visible_count());
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            // Minimized; keep the previous size.
            return;
        }
        self.surface = Some(SurfaceConfig::new(width, height));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::RenderItem;
    use engine_core::{MeshInstance, Transform};

    #[test]
    fn render_requires_init() {
        let mut renderer = HeadlessRenderer::new(AssetStore::new());
        assert!(matches!(
            renderer.render(&FrameSnapshot::default()),
            Err(RenderError::NotInitialized)
        ));
        assert!(renderer.init(&SurfaceConfig::new(0, 600)).is_err());
    }

    #[test]
    fn counts_draws_and_missing_meshes() {
        let mut assets = AssetStore::new();
        assets.insert("earth", ());
        let mut renderer = HeadlessRenderer::new(assets);
        renderer.init(&SurfaceConfig::new(800, 600)).unwrap();

        let t = Transform::default();
        let mut frame = FrameSnapshot::default();
        frame.items.push(RenderItem::new("planet", &t, Some(MeshInstance::new("earth"))));
        frame.items.push(RenderItem::new("rock", &t, Some(MeshInstance::new("meteor_a"))));
        frame.items.push(RenderItem::new("empty", &t, None));

        renderer.render(&frame).unwrap();
        let stats = renderer.stats();
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.draws, 1);
        assert_eq!(stats.missing_meshes, 1);
    }

    #[test]
    fn resize_ignores_zero_sizes() {
        let mut renderer = HeadlessRenderer::new(AssetStore::new());
        renderer.init(&SurfaceConfig::new(800, 600)).unwrap();
        renderer.resize(0, 0);
        assert_eq!(renderer.surface(), Some(SurfaceConfig::new(800, 600)));
        renderer.resize(1024, 768);
        assert_eq!(renderer.surface(), Some(SurfaceConfig::new(1024, 768)));
    }
}
