//! Rectangle rigid-body world
//!
//! A small axis-aligned box simulator: gravity and forces integrate dynamic
//! bodies, overlaps with static bodies are pushed apart along the shallow
//! axis, and every step reports the pairs that started touching.
//!
//! Only dynamic-vs-static pairs are resolved. The course has one dynamic body.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::SIM_DT;

/// Handle for a body in a `PhysicsWorld`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Axis-aligned rectangle stored as center and half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    /// Rectangle centered on `(x, y)` with full `width` and `height`
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            center: Vec2::new(x, y),
            half: Vec2::new(width / 2.0, height / 2.0),
        }
    }

    pub fn width(&self) -> f32 {
        self.half.x * 2.0
    }

    pub fn height(&self) -> f32 {
        self.half.y * 2.0
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let d = (point - self.center).abs();
        d.x <= self.half.x && d.y <= self.half.y
    }
}

/// Result of an overlap test between two boxes
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the boxes overlap
    pub hit: bool,
    /// Center of the overlap region
    pub point: Vec2,
    /// Separation direction, pointing from `b` toward `a`
    pub normal: Vec2,
    /// Overlap depth along `normal`
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Overlap test between two boxes
///
/// `slop` widens both boxes so resting contacts that sit exactly on a surface
/// still count as touching.
pub fn box_box_collision(a: &Aabb, b: &Aabb, slop: f32) -> CollisionResult {
    let delta = a.center - b.center;
    let overlap = a.half + b.half + Vec2::splat(slop) - delta.abs();
    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return CollisionResult::miss();
    }

    let lo = a.min().max(b.min());
    let hi = a.max().min(b.max());
    let point = (lo + hi) * 0.5;

    // Separate along the shallow axis
    let (normal, penetration) = if overlap.x < overlap.y {
        (Vec2::new(delta.x.signum(), 0.0), overlap.x - slop)
    } else {
        (Vec2::new(0.0, delta.y.signum()), overlap.y - slop)
    };

    CollisionResult {
        hit: true,
        point,
        normal,
        penetration,
    }
}

/// Reflect the normal component of `velocity`, scaled by restitution
///
/// Standard reflection: v' = v - (1 + e)(v·n)n. Only applied when moving
/// into the surface.
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2, restitution: f32) -> Vec2 {
    let vn = velocity.dot(normal);
    if vn >= 0.0 {
        return velocity;
    }
    velocity - (1.0 + restitution) * vn * normal
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    Static,
    Dynamic,
}

/// What a body stands for in the course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyLabel {
    Wall,
    Player,
    Goal,
}

/// Creation parameters for a body
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub shape: Aabb,
    pub kind: BodyKind,
    pub label: BodyLabel,
    pub restitution: f32,
    pub mass: f32,
}

impl BodyDesc {
    pub fn fixed(shape: Aabb, label: BodyLabel) -> Self {
        Self {
            shape,
            kind: BodyKind::Static,
            label,
            restitution: 0.0,
            mass: 0.0,
        }
    }

    /// Dynamic body with unit density (mass = area / 1000)
    pub fn dynamic(shape: Aabb, label: BodyLabel, restitution: f32) -> Self {
        Self {
            shape,
            kind: BodyKind::Dynamic,
            label,
            restitution,
            mass: shape.width() * shape.height() * 0.001,
        }
    }
}

/// A rigid body
#[derive(Debug, Clone)]
pub struct Body {
    pub id: BodyId,
    pub kind: BodyKind,
    pub label: BodyLabel,
    pub shape: Aabb,
    pub vel: Vec2,
    pub mass: f32,
    pub restitution: f32,
    /// Force accumulated for the next step, cleared after it
    force: Vec2,
}

impl Body {
    pub fn is_static(&self) -> bool {
        self.kind == BodyKind::Static
    }

    pub fn pos(&self) -> Vec2 {
        self.shape.center
    }
}

/// A pair of bodies that started touching during a step
///
/// Velocities are sampled after integration and before the collision
/// response, so they carry the approach speed.
#[derive(Debug, Clone)]
pub struct Contact {
    pub a: BodyId,
    pub b: BodyId,
    pub vel_a: Vec2,
    pub vel_b: Vec2,
    pub a_static: bool,
    pub b_static: bool,
    /// Center of the overlap region
    pub point: Vec2,
}

impl Contact {
    pub fn involves(&self, id: BodyId) -> bool {
        self.a == id || self.b == id
    }

    /// The other body of the pair, if `id` is part of it
    pub fn other(&self, id: BodyId) -> Option<BodyId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Surface tuning for a world
#[derive(Debug, Clone, Copy)]
pub struct WorldParams {
    pub gravity: Vec2,
    pub air_friction: f32,
    pub wall_friction: f32,
    pub rest_speed: f32,
}

/// Distance within which resting bodies keep their contact alive
const CONTACT_SLOP: f32 = 0.5;
/// Upper bound on substeps per `step`
const MAX_PHYSICS_SUBSTEPS: u32 = 16;

/// Body storage plus the set of pairs currently touching
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    params: WorldParams,
    bodies: Vec<Body>,
    touching: HashSet<(BodyId, BodyId)>,
    next_id: u32,
}

impl PhysicsWorld {
    pub fn new(params: WorldParams) -> Self {
        Self {
            params,
            bodies: Vec::new(),
            touching: HashSet::new(),
            next_id: 1,
        }
    }

    /// Add a body and return its handle
    pub fn add(&mut self, desc: BodyDesc) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        self.bodies.push(Body {
            id,
            kind: desc.kind,
            label: desc.label,
            shape: desc.shape,
            vel: Vec2::ZERO,
            mass: desc.mass,
            restitution: desc.restitution,
            force: Vec2::ZERO,
        });
        id
    }

    /// Remove every body and forget ongoing contacts
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.touching.clear();
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        // Bodies are pushed in id order and never removed individually
        match self.bodies.binary_search_by_key(&id, |b| b.id) {
            Ok(i) => Some(&self.bodies[i]),
            Err(_) => None,
        }
    }

    fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        match self.bodies.binary_search_by_key(&id, |b| b.id) {
            Ok(i) => Some(&mut self.bodies[i]),
            Err(_) => None,
        }
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Accumulate a force on a dynamic body for the next step
    pub fn apply_force(&mut self, id: BodyId, force: Vec2) {
        if let Some(body) = self.body_mut(id) {
            if !body.is_static() {
                body.force += force;
            }
        }
    }

    /// Change velocity instantly by `impulse / mass`
    pub fn apply_impulse(&mut self, id: BodyId, impulse: Vec2) {
        if let Some(body) = self.body_mut(id) {
            if !body.is_static() && body.mass > 0.0 {
                body.vel += impulse / body.mass;
            }
        }
    }

    pub fn set_velocity(&mut self, id: BodyId, vel: Vec2) {
        if let Some(body) = self.body_mut(id) {
            if !body.is_static() {
                body.vel = vel;
            }
        }
    }

    pub fn set_position(&mut self, id: BodyId, pos: Vec2) {
        if let Some(body) = self.body_mut(id) {
            body.shape.center = pos;
        }
    }

    /// Advance the world by `dt` seconds
    ///
    /// Fast bodies are integrated in substeps so no step moves a body further
    /// than half its overlap span with the thinnest static body. Returns the
    /// pairs that started touching, sorted by (min, max) id.
    pub fn step(&mut self, dt: f32) -> Vec<Contact> {
        let substeps = self.substeps_for(dt);
        let h = dt / substeps as f32;

        let statics: Vec<(BodyId, Aabb)> = self
            .bodies
            .iter()
            .filter(|b| b.is_static())
            .map(|b| (b.id, b.shape))
            .collect();

        let mut now_touching = HashSet::new();
        let mut started = Vec::new();
        for _ in 0..substeps {
            self.integrate(h);
            self.resolve(&statics, &mut now_touching, &mut started);
        }
        for body in &mut self.bodies {
            body.force = Vec2::ZERO;
        }

        self.touching = now_touching;
        started.sort_by_key(|c| (c.a, c.b));
        started
    }

    fn substeps_for(&self, dt: f32) -> u32 {
        let thinnest = |static_side: bool| {
            self.bodies
                .iter()
                .filter(|b| b.is_static() == static_side)
                .map(|b| b.shape.half.min_element())
                .fold(f32::INFINITY, f32::min)
        };
        let span = thinnest(true) + thinnest(false);
        if !span.is_finite() || span <= 0.0 {
            return 1;
        }

        let gravity = self.params.gravity;
        let travel = self
            .bodies
            .iter()
            .filter(|b| !b.is_static())
            .map(|b| {
                let accel = gravity + b.force / b.mass.max(f32::EPSILON);
                (b.vel + accel * dt).length() * dt
            })
            .fold(0.0, f32::max);

        ((travel / (span * 0.5)).ceil() as u32).clamp(1, MAX_PHYSICS_SUBSTEPS)
    }

    fn integrate(&mut self, h: f32) {
        let params = self.params;
        // Drag is specified per 60 Hz step
        let damping = (1.0 - params.air_friction).powf(h / SIM_DT);

        for body in self.bodies.iter_mut().filter(|b| !b.is_static()) {
            let accel = params.gravity + body.force / body.mass.max(f32::EPSILON);
            body.vel = (body.vel + accel * h) * damping;
            body.shape.center += body.vel * h;
        }
    }

    fn resolve(
        &mut self,
        statics: &[(BodyId, Aabb)],
        now_touching: &mut HashSet<(BodyId, BodyId)>,
        started: &mut Vec<Contact>,
    ) {
        let params = self.params;
        for body in self.bodies.iter_mut().filter(|b| !b.is_static()) {
            for &(static_id, static_shape) in statics {
                let result = box_box_collision(&body.shape, &static_shape, CONTACT_SLOP);
                if !result.hit {
                    continue;
                }

                let key = ordered(body.id, static_id);
                // Reported once per step, and only if not touching last step
                if now_touching.insert(key) && !self.touching.contains(&key) {
                    let (vel_a, vel_b, a_static, b_static) = if key.0 == body.id {
                        (body.vel, Vec2::ZERO, false, true)
                    } else {
                        (Vec2::ZERO, body.vel, true, false)
                    };
                    started.push(Contact {
                        a: key.0,
                        b: key.1,
                        vel_a,
                        vel_b,
                        a_static,
                        b_static,
                        point: result.point,
                    });
                }

                if result.penetration > 0.0 {
                    body.shape.center += result.normal * result.penetration;
                }

                let approach = -body.vel.dot(result.normal);
                if approach > 0.0 {
                    let restitution = if approach < params.rest_speed {
                        0.0
                    } else {
                        body.restitution
                    };
                    let normal_vel = result.normal * body.vel.dot(result.normal);
                    let tangent_vel = body.vel - normal_vel;
                    // Coulomb friction: tangential loss bounded by the normal impulse
                    let tangent_speed = tangent_vel.length();
                    let tangent_vel = if tangent_speed > 0.0 {
                        let drop = (params.wall_friction * approach).min(tangent_speed);
                        tangent_vel * (1.0 - drop / tangent_speed)
                    } else {
                        tangent_vel
                    };
                    body.vel =
                        reflect_velocity(normal_vel, result.normal, restitution) + tangent_vel;
                }
            }
        }
    }
}

fn ordered(a: BodyId, b: BodyId) -> (BodyId, BodyId) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> WorldParams {
        WorldParams {
            gravity: Vec2::new(0.0, 1200.0),
            air_friction: 0.0,
            wall_friction: 0.0,
            rest_speed: 60.0,
        }
    }

    fn floor_world() -> (PhysicsWorld, BodyId, BodyId) {
        let mut world = PhysicsWorld::new(params());
        let floor = world.add(BodyDesc::fixed(
            Aabb::new(200.0, 410.0, 400.0, 20.0),
            BodyLabel::Wall,
        ));
        let player = world.add(BodyDesc::dynamic(
            Aabb::new(200.0, 300.0, 40.0, 40.0),
            BodyLabel::Player,
            0.5,
        ));
        (world, floor, player)
    }

    #[test]
    fn test_box_box_collision_picks_shallow_axis() {
        let a = Aabb::new(0.0, -18.0, 40.0, 40.0);
        let b = Aabb::new(0.0, 10.0, 400.0, 20.0);
        let result = box_box_collision(&a, &b, 0.0);
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::new(0.0, -1.0));
        assert!((result.penetration - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_box_box_collision_miss() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(20.0, 0.0, 10.0, 10.0);
        assert!(!box_box_collision(&a, &b, 0.0).hit);
    }

    #[test]
    fn test_reflect_velocity() {
        // Falling onto a floor whose normal points up
        let reflected = reflect_velocity(Vec2::new(0.0, 100.0), Vec2::NEG_Y, 1.0);
        assert!((reflected.y + 100.0).abs() < 0.001);

        let damped = reflect_velocity(Vec2::new(0.0, 100.0), Vec2::NEG_Y, 0.5);
        assert!((damped.y + 50.0).abs() < 0.001);

        // Separating velocity is untouched
        let away = reflect_velocity(Vec2::new(0.0, -100.0), Vec2::NEG_Y, 0.5);
        assert_eq!(away, Vec2::new(0.0, -100.0));
    }

    #[test]
    fn test_dynamic_body_falls() {
        let (mut world, _, player) = floor_world();
        let before = world.body(player).unwrap().pos().y;
        world.step(SIM_DT);
        assert!(world.body(player).unwrap().pos().y > before);
    }

    #[test]
    fn test_landing_settles_on_floor() {
        let (mut world, floor, player) = floor_world();
        let mut starts = Vec::new();
        for _ in 0..240 {
            starts.extend(world.step(SIM_DT));
        }
        let landings: Vec<_> = starts
            .iter()
            .filter(|c| c.involves(floor) && c.involves(player))
            .collect();
        assert!(!landings.is_empty());
        // The body rests on the floor instead of sinking through it
        let body = world.body(player).unwrap();
        assert!(body.shape.max().y <= 400.0 + CONTACT_SLOP + 0.01);
        assert!(body.vel.y.abs() < 30.0);
        // Resting does not keep re-reporting the contact every step
        assert!(landings.len() < 10, "got {} contact starts", landings.len());
    }

    #[test]
    fn test_contact_velocity_is_approach_speed() {
        let (mut world, floor, player) = floor_world();
        world.set_velocity(player, Vec2::new(0.0, 500.0));
        let contact = (0..60)
            .flat_map(|_| world.step(SIM_DT))
            .find(|c| c.involves(floor))
            .expect("player should hit the floor");
        let vel = if contact.a == player { contact.vel_a } else { contact.vel_b };
        assert!(vel.y > 400.0);
        assert!(contact.a_static != contact.b_static);
    }

    #[test]
    fn test_static_bodies_ignore_forces() {
        let (mut world, floor, _) = floor_world();
        world.apply_force(floor, Vec2::new(1000.0, 0.0));
        world.apply_impulse(floor, Vec2::new(1000.0, 0.0));
        world.step(SIM_DT);
        assert_eq!(world.body(floor).unwrap().pos(), Vec2::new(200.0, 410.0));
    }

    #[test]
    fn test_impulse_scales_with_mass() {
        let (mut world, _, player) = floor_world();
        let mass = world.body(player).unwrap().mass;
        world.apply_impulse(player, Vec2::new(0.0, -mass * 800.0));
        assert!((world.body(player).unwrap().vel.y + 800.0).abs() < 0.01);
    }

    #[test]
    fn test_fast_body_does_not_tunnel_through_pillar() {
        let no_gravity = WorldParams {
            gravity: Vec2::ZERO,
            ..params()
        };
        for i in 0..40 {
            let mut world = PhysicsWorld::new(no_gravity);
            world.add(BodyDesc::fixed(
                Aabb::new(300.0, 200.0, 10.0, 400.0),
                BodyLabel::Wall,
            ));
            let start_x = 200.0 + i as f32 * 0.83;
            let player = world.add(BodyDesc::dynamic(
                Aabb::new(start_x, 200.0, 40.0, 40.0),
                BodyLabel::Player,
                0.5,
            ));
            world.set_velocity(player, Vec2::new(2400.0, 0.0));
            for _ in 0..10 {
                world.step(SIM_DT);
            }
            let x = world.body(player).unwrap().pos().x;
            assert!(x < 300.0, "offset {} ended at x = {}", i, x);
        }
    }

    #[test]
    fn test_substeps_report_one_contact_start() {
        let (mut world, floor, player) = floor_world();
        world.set_velocity(player, Vec2::new(0.0, 3000.0));
        let starts: Vec<_> = (0..3).flat_map(|_| world.step(SIM_DT)).collect();
        assert_eq!(starts.iter().filter(|c| c.involves(floor)).count(), 1);
    }

    #[test]
    fn test_clear_empties_world() {
        let (mut world, _, _) = floor_world();
        world.clear();
        assert!(world.is_empty());
        assert!(world.step(SIM_DT).is_empty());
    }
}
