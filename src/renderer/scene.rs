//! Frame snapshot in viewport pixels
//!
//! Everything is placed relative to the camera, y down. The pipeline maps
//! the result to clip space.

use glam::Vec2;

use super::shapes::{circle, rect, rect_outline};
use super::vertex::Vertex;
use crate::Rgba;
use crate::consts::*;
use crate::sim::{Aabb, Camera, GameState};

const PARTICLE_SEGMENTS: u32 = 6;

/// Vertices plus the clear color for one frame
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub background: Rgba,
    pub vertices: Vec<Vertex>,
}

fn visible(shape: &Aabb, camera: &Camera) -> bool {
    let min = camera.to_screen(shape.min());
    let max = camera.to_screen(shape.max());
    max.x >= 0.0 && max.y >= 0.0 && min.x <= camera.viewport.x && min.y <= camera.viewport.y
}

fn push_box(vertices: &mut Vec<Vertex>, shape: &Aabb, camera: &Camera, color: Rgba) {
    if visible(shape, camera) {
        vertices.extend(rect(
            camera.to_screen(shape.min()),
            camera.to_screen(shape.max()),
            color,
        ));
    }
}

/// Build the frame for `state`: walls, goal, player, then particles on top
pub fn build_scene(state: &GameState) -> Frame {
    let camera = &state.camera;
    let mut vertices = Vec::with_capacity(state.walls.len() * 6 + 64);

    for wall in &state.walls {
        push_box(&mut vertices, &wall.shape, camera, wall.color);
    }

    if let Some(goal) = state.goal_shape() {
        push_box(&mut vertices, &goal, camera, GOAL_COLOR);
        if visible(&goal, camera) {
            let [r, g, b, _] = GOAL_COLOR;
            vertices.extend(rect_outline(
                camera.to_screen(goal.min()),
                camera.to_screen(goal.max()),
                3.0,
                [r * 0.7, g * 0.7, b * 0.7, 1.0],
            ));
        }
    }

    if let Some(player) = state.player_body() {
        push_box(&mut vertices, &player.shape, camera, PLAYER_COLOR);
    }

    for particle in state.effects.particles() {
        let [r, g, b, a] = particle.color;
        let pos = camera.to_screen(particle.pos);
        if pos.cmplt(Vec2::ZERO).any() || pos.cmpgt(camera.viewport).any() {
            continue;
        }
        vertices.extend(circle(
            pos,
            PARTICLE_RADIUS,
            [r, g, b, a * particle.alpha()],
            PARTICLE_SEGMENTS,
        ));
    }

    Frame {
        background: state.difficulty.background(),
        vertices,
    }
}
