//! Shape generation for 2D primitives

use glam::Vec2;
use std::f32::consts::PI;

use super::vertex::Vertex;
use crate::Rgba;

/// Two triangles covering the rectangle from `min` to `max`
pub fn rect(min: Vec2, max: Vec2, color: Rgba) -> [Vertex; 6] {
    [
        Vertex::new(min.x, min.y, color),
        Vertex::new(max.x, min.y, color),
        Vertex::new(min.x, max.y, color),
        Vertex::new(min.x, max.y, color),
        Vertex::new(max.x, min.y, color),
        Vertex::new(max.x, max.y, color),
    ]
}

/// Rectangle band of `width` inside the edges of `min`..`max`
pub fn rect_outline(min: Vec2, max: Vec2, width: f32, color: Rgba) -> Vec<Vertex> {
    let w = width.min((max.x - min.x) / 2.0).min((max.y - min.y) / 2.0);
    let mut vertices = Vec::with_capacity(24);
    // Top, bottom, left, right
    vertices.extend(rect(min, Vec2::new(max.x, min.y + w), color));
    vertices.extend(rect(Vec2::new(min.x, max.y - w), max, color));
    vertices.extend(rect(
        Vec2::new(min.x, min.y + w),
        Vec2::new(min.x + w, max.y - w),
        color,
    ));
    vertices.extend(rect(
        Vec2::new(max.x - w, min.y + w),
        Vec2::new(max.x, max.y - w),
        color,
    ));
    vertices
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: Rgba, segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}
