//! Components shared by every kind of scene object.

use hecs::Entity;

/// Identity and hierarchy of a scene object.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    /// Participates in update and collision.
    pub active: bool,
    pub visible: bool,
    pub parent: Option<Entity>,
    pub children: Vec<Entity>,
    /// Slot for a renderer-side proxy. The simulation never reads it.
    pub render_handle: Option<u64>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            visible: true,
            parent: None,
            children: Vec::new(),
            render_handle: None,
        }
    }
}

/// What a scene object is, for update dispatch and collision response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Ship,
    Bullet,
    Celestial(CelestialKind),
    /// Particle effects and other purely visual objects.
    Effect,
    /// Anything else with a transform; integrated if it carries a physics body.
    Prop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CelestialKind {
    Planet,
    Meteor,
    Generic,
}

impl CelestialKind {
    /// Damage a ship takes when it scrapes this body.
    pub fn contact_damage(self) -> f32 {
        match self {
            CelestialKind::Planet => 18.0,
            CelestialKind::Meteor => 12.0,
            CelestialKind::Generic => 10.0,
        }
    }

    /// Whether the body breaks apart on contact with a ship or a bullet.
    pub fn is_destructible(self) -> bool {
        matches!(self, CelestialKind::Meteor)
    }
}
