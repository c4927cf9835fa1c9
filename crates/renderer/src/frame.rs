//! Per-frame data handed from the simulation to a renderer.

use crate::{camera::CameraSnapshot, ui::UiNode};
use bytemuck::{Pod, Zeroable};
use engine_core::{MeshInstance, Transform, TransformRaw};
use glam::{Vec3, Vec4};

/// One scene object as the renderer sees it.
#[derive(Debug, Clone)]
pub struct RenderItem {
    pub name: String,
    /// `None` for objects without a visual. They are skipped, not errors.
    pub mesh: Option<MeshInstance>,
    pub model: TransformRaw,
    pub visible: bool,
}

impl RenderItem {
    pub fn new(name: impl Into<String>, transform: &Transform, mesh: Option<MeshInstance>) -> Self {
        Self {
            name: name.into(),
            mesh,
            model: TransformRaw::from(transform),
            visible: true,
        }
    }
}

/// Billboard particle instance.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
}

impl ParticleInstance {
    pub fn new(position: Vec3, size: f32, color: Vec4) -> Self {
        Self {
            position: position.to_array(),
            size,
            color: color.to_array(),
        }
    }
}

/// Everything a renderer needs for one frame. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct FrameSnapshot {
    /// Opaque background/environment id, e.g. `sky_galaxy`.
    pub background: Option<String>,
    pub camera: CameraSnapshot,
    pub items: Vec<RenderItem>,
    pub particles: Vec<ParticleInstance>,
    pub ui: Option<UiNode>,
}

impl FrameSnapshot {
    pub fn new(camera: CameraSnapshot) -> Self {
        Self {
            camera,
            ..Default::default()
        }
    }

    /// Items that should actually be drawn.
    pub fn drawable(&self) -> impl Iterator<Item = &RenderItem> {
        self.items.iter().filter(|item| item.visible && item.mesh.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drawable_skips_hidden_and_meshless() {
        let t = Transform::default();
        let mut frame = FrameSnapshot::default();
        frame.items.push(RenderItem::new("ship", &t, Some(MeshInstance::new("ship_x-wing"))));
        frame.items.push(RenderItem::new("marker", &t, None));
        let mut hidden = RenderItem::new("bullet", &t, Some(MeshInstance::new("bullet")));
        hidden.visible = false;
        frame.items.push(hidden);

        let names: Vec<_> = frame.drawable().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["ship"]);
    }

    #[test]
    fn particle_instance_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 32);
        let p = ParticleInstance::new(Vec3::ONE, 2.0, Vec4::new(1.0, 0.5, 0.0, 1.0));
        let bytes: &[u8] = bytemuck::bytes_of(&p);
        assert_eq!(bytes.len(), 32);
    }
}
