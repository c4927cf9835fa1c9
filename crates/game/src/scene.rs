//! Scene: entity storage, deferred add/remove and per-frame update fan-out.
//!
//! Components live in a `hecs::World`. The scene keeps its own ordered list
//! of top-level entities on top of that, because update order and the ship
//! scan order are part of the game's behavior and a `World` does not promise
//! any iteration order.
//!
//! Children (thruster flames, trails, bullet lasers) are never in the
//! top-level list. Their parent's update recursion is the only thing that
//! updates them, so each one runs exactly once per frame.

use std::collections::HashSet;

use engine_core::{MeshInstance, Transform, Velocity};
use hecs::{DynamicBundle, Entity, World};
use physics::{integrate, PhysicsBody};
use rand::rngs::StdRng;
use rand::SeedableRng;
use renderer::{FrameSnapshot, RenderItem, UiNode};

use crate::bullet;
use crate::camera::Camera;
use crate::celestial;
use crate::components::{Kind, SceneNode};
use crate::effects;
use crate::ship;

pub struct Scene {
    pub world: World,
    pub camera: Camera,
    /// Opaque environment id consumed by the renderer.
    pub background: Option<String>,
    /// Top-level entities in update order.
    entities: Vec<Entity>,
    pending_add: Vec<Entity>,
    pending_remove: HashSet<Entity>,
    /// Ships in registration order; bullets scan them in this order.
    ships: Vec<Entity>,
    rng: StdRng,
}

impl Scene {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_rng(width, height, StdRng::from_entropy())
    }

    /// Scene whose effect and spawn randomness is reproducible.
    pub fn with_seed(width: u32, height: u32, seed: u64) -> Self {
        Self::with_rng(width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(width: u32, height: u32, rng: StdRng) -> Self {
        Self {
            world: World::new(),
            camera: Camera::new(width, height),
            background: None,
            entities: Vec::new(),
            pending_add: Vec::new(),
            pending_remove: HashSet::new(),
            ships: Vec::new(),
            rng,
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Spawn a top-level entity. It joins the update list at the next flush.
    pub fn spawn(&mut self, components: impl DynamicBundle) -> Entity {
        let entity = self.world.spawn(components);
        self.add(entity);
        entity
    }

    /// Spawn an entity owned by `parent`. It is updated and rendered through
    /// the parent only.
    pub fn spawn_child(&mut self, parent: Entity, components: impl DynamicBundle) -> Entity {
        let child = self.world.spawn(components);
        if let Ok(mut node) = self.world.get::<&mut SceneNode>(child) {
            node.parent = Some(parent);
        }
        match self.world.get::<&mut SceneNode>(parent) {
            Ok(mut node) => node.children.push(child),
            Err(_) => log::warn!("spawn_child: parent {:?} has no scene node", parent),
        }
        child
    }

    /// Queue an existing entity for the update list. Adding something that is
    /// already listed or already pending does nothing.
    pub fn add(&mut self, entity: Entity) {
        if self.entities.contains(&entity) || self.pending_add.contains(&entity) {
            log::debug!("Entity {:?} already in scene", entity);
            return;
        }
        if self.pending_remove.contains(&entity) {
            log::warn!("Entity {:?} is being removed; ignoring add", entity);
            return;
        }
        self.pending_add.push(entity);
    }

    /// Deactivate and hide `entity` and its whole subtree now; despawn them at
    /// the next flush.
    pub fn remove(&mut self, entity: Entity) {
        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            match self.world.get::<&mut SceneNode>(current) {
                Ok(mut node) => {
                    node.active = false;
                    node.visible = false;
                    stack.extend(node.children.iter().copied());
                }
                Err(_) => {
                    if current == entity {
                        log::debug!("remove: unknown entity {:?}", entity);
                    }
                }
            }
            self.pending_remove.insert(current);
        }
    }

    /// Apply queued adds, then queued removals.
    pub fn flush(&mut self) {
        for entity in std::mem::take(&mut self.pending_add) {
            if self.world.contains(entity) && !self.pending_remove.contains(&entity) {
                self.entities.push(entity);
            }
        }

        if self.pending_remove.is_empty() {
            return;
        }
        let removed = std::mem::take(&mut self.pending_remove);
        self.entities.retain(|e| !removed.contains(e));
        self.ships.retain(|e| !removed.contains(e));
        for entity in removed {
            let parent = self
                .world
                .get::<&SceneNode>(entity)
                .ok()
                .and_then(|node| node.parent);
            if let Some(parent) = parent {
                if let Ok(mut node) = self.world.get::<&mut SceneNode>(parent) {
                    node.children.retain(|c| *c != entity);
                }
            }
            // Already gone if a parent and child were despawned in the same flush.
            let _ = self.world.despawn(entity);
        }
    }

    /// Drop everything, e.g. when switching levels.
    pub fn clear(&mut self) {
        self.world.clear();
        self.entities.clear();
        self.pending_add.clear();
        self.pending_remove.clear();
        self.ships.clear();
        self.background = None;
    }

    /// Mark a ship for bullet and collision scans. Idempotent.
    pub fn register_ship(&mut self, entity: Entity) {
        if !self.ships.contains(&entity) {
            self.ships.push(entity);
        }
    }

    // ── Update ──────────────────────────────────────────────────────────

    /// Flush pending changes, integrate the camera, then update every active
    /// top-level entity in list order, each followed by its children.
    pub fn update(&mut self, dt: f32) {
        self.flush();
        self.camera.integrate(dt);

        let order = self.entities.clone();
        for entity in order {
            if self.is_active(entity) {
                self.update_entity(entity, dt);
            }
        }
    }

    fn update_entity(&mut self, entity: Entity, dt: f32) {
        let Some(kind) = self.kind(entity) else {
            return;
        };
        match kind {
            Kind::Ship => ship::update(self, entity, dt),
            Kind::Bullet => bullet::update(self, entity, dt),
            Kind::Celestial(_) => celestial::update(self, entity, dt),
            Kind::Effect => effects::update(self, entity, dt),
            Kind::Prop => self.integrate_prop(entity, dt),
        }

        for child in self.children(entity) {
            if self.is_active(child) {
                self.update_entity(child, dt);
            }
        }
    }

    fn integrate_prop(&mut self, entity: Entity, dt: f32) {
        if let Ok((transform, velocity, body)) = self
            .world
            .query_one_mut::<(&mut Transform, &mut Velocity, &PhysicsBody)>(entity)
        {
            integrate(transform, velocity, body, dt);
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Top-level entities in update order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn ships(&self) -> &[Entity] {
        &self.ships
    }

    /// Alive and not removed. Unknown entities are inactive.
    pub fn is_active(&self, entity: Entity) -> bool {
        self.world
            .get::<&SceneNode>(entity)
            .map(|node| node.active)
            .unwrap_or(false)
    }

    pub fn kind(&self, entity: Entity) -> Option<Kind> {
        self.world.get::<&Kind>(entity).ok().map(|k| *k)
    }

    pub fn name(&self, entity: Entity) -> Option<String> {
        self.world.get::<&SceneNode>(entity).ok().map(|n| n.name.clone())
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<&SceneNode>(entity).ok().and_then(|n| n.parent)
    }

    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        self.world
            .get::<&SceneNode>(entity)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.world.get::<&Transform>(entity).ok().map(|t| *t)
    }

    pub fn set_transform(&mut self, entity: Entity, transform: Transform) {
        if let Ok(mut t) = self.world.get::<&mut Transform>(entity) {
            *t = transform;
        }
    }

    pub fn velocity(&self, entity: Entity) -> Option<Velocity> {
        self.world.get::<&Velocity>(entity).ok().map(|v| *v)
    }

    pub fn set_velocity(&mut self, entity: Entity, velocity: Velocity) {
        if let Ok(mut v) = self.world.get::<&mut Velocity>(entity) {
            *v = velocity;
        }
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Split borrow for systems that mutate components while drawing randoms.
    pub(crate) fn world_and_rng(&mut self) -> (&mut World, &mut StdRng) {
        (&mut self.world, &mut self.rng)
    }

    // ── Rendering ───────────────────────────────────────────────────────

    /// Build the immutable per-frame view handed to the renderer.
    pub fn snapshot(&self, ui: Option<UiNode>) -> FrameSnapshot {
        let mut frame = FrameSnapshot::new(self.camera.snapshot());
        frame.background = self.background.clone();
        frame.ui = ui;
        for &entity in &self.entities {
            self.collect_render(entity, &mut frame);
        }
        frame
    }

    fn collect_render(&self, entity: Entity, frame: &mut FrameSnapshot) {
        let Ok(node) = self.world.get::<&SceneNode>(entity) else {
            return;
        };
        if !node.active || !node.visible {
            return;
        }
        if let Ok(transform) = self.world.get::<&Transform>(entity) {
            let mesh = self.world.get::<&MeshInstance>(entity).ok().map(|m| (*m).clone());
            frame.items.push(RenderItem::new(node.name.clone(), &transform, mesh));
        }
        effects::collect_particles(self, entity, &mut frame.particles);
        for &child in &node.children {
            self.collect_render(child, frame);
        }
    }
}
