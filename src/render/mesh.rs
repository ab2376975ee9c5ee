use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use std::f32::consts::PI;

use crate::collision::{BoxCollider, ColliderShape};
use crate::frame::{FrameRenderer, FrameView};
use crate::scene::{Color, Geometry, Material, NodeContent};

const COLLIDER_BOX: [f32; 4] = [0.0, 1.0, 0.5, 1.0];
const COLLIDER_SPHERE: [f32; 4] = [1.0, 0.5, 0.0, 1.0];
const MODEL_BOUNDS: [f32; 4] = [0.3, 0.5, 0.9, 1.0];
const DOLLY_MARKER: [f32; 4] = [0.2, 0.8, 0.2, 1.0];
const CONTROLLER_MARKER: [f32; 4] = [0.8, 0.8, 0.2, 1.0];
const LOADING_TRACK: [f32; 4] = [0.3, 0.3, 0.3, 1.0];
const LOADING_FILL: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

const SPHERE_SEGMENTS: u32 = 24;
const LOADING_BAR_HALF_WIDTH: f32 = 0.3;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl LineVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };

    pub fn new(position: Vec3, color: [f32; 4]) -> Self {
        Self {
            position: position.to_array(),
            color,
        }
    }
}

fn rgba(color: Color, alpha: f32) -> [f32; 4] {
    let [r, g, b] = color.to_array();
    [r, g, b, alpha]
}

/// One frame's worth of world-space lines plus what the GPU pass needs to
/// draw them.
#[derive(Debug, Clone)]
pub struct LineBatch {
    pub vertices: Vec<LineVertex>,
    pub view_proj: Mat4,
    pub clear_color: Color,
    pub loading: Option<f32>,
}

impl Default for LineBatch {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            view_proj: Mat4::IDENTITY,
            clear_color: Color::BLACK,
            loading: None,
        }
    }
}

impl LineBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.loading = None;
    }

    pub fn line_count(&self) -> usize {
        self.vertices.len() / 2
    }

    pub fn line(&mut self, a: Vec3, b: Vec3, color: [f32; 4]) {
        self.gradient_line(a, color, b, color);
    }

    pub fn gradient_line(&mut self, a: Vec3, color_a: [f32; 4], b: Vec3, color_b: [f32; 4]) {
        self.vertices.push(LineVertex::new(a, color_a));
        self.vertices.push(LineVertex::new(b, color_b));
    }

    /// Twelve edges of `bounds` after `transform`.
    pub fn wire_box(&mut self, transform: Mat4, bounds: &BoxCollider, color: [f32; 4]) {
        let (min, max) = (bounds.min, bounds.max);
        let corner = |i: usize| {
            transform.transform_point3(Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            ))
        };
        for (a, b) in [
            (0, 1), (2, 3), (4, 5), (6, 7),
            (0, 2), (1, 3), (4, 6), (5, 7),
            (0, 4), (1, 5), (2, 6), (3, 7),
        ] {
            self.line(corner(a), corner(b), color);
        }
    }

    /// Three great circles.
    pub fn wire_sphere(&mut self, center: Vec3, radius: f32, color: [f32; 4]) {
        for axis in 0..3 {
            for seg in 0..SPHERE_SEGMENTS {
                let point = |s: u32| {
                    let (sin, cos) = (2.0 * PI * s as f32 / SPHERE_SEGMENTS as f32).sin_cos();
                    let offset = match axis {
                        0 => Vec3::new(cos, sin, 0.0),
                        1 => Vec3::new(cos, 0.0, sin),
                        _ => Vec3::new(0.0, cos, sin),
                    };
                    center + offset * radius
                };
                self.line(point(seg), point(seg + 1), color);
            }
        }
    }

    /// Wireframe of `geometry` placed by `world`.
    pub fn geometry(&mut self, geometry: &Geometry, material: &Material, world: Mat4) {
        let flat = rgba(material.color, material.opacity);
        let color_of = |i: u32| match (&geometry.colors, material.vertex_colors) {
            (Some(colors), true) => colors
                .get(i as usize)
                .map(|&c| rgba(c, material.opacity))
                .unwrap_or(flat),
            _ => flat,
        };

        for [a, b] in geometry.edges() {
            let (Some(&pa), Some(&pb)) = (geometry.positions.get(a as usize), geometry.positions.get(b as usize)) else {
                continue;
            };
            self.gradient_line(world.transform_point3(pa), color_of(a), world.transform_point3(pb), color_of(b));
        }
    }

    /// Ground cross with a short upright.
    pub fn marker(&mut self, at: Vec3, size: f32, color: [f32; 4]) {
        self.line(at - Vec3::X * size, at + Vec3::X * size, color);
        self.line(at - Vec3::Z * size, at + Vec3::Z * size, color);
        self.line(at, at + Vec3::Y * size, color);
    }

    /// Horizontal bar one unit in front of the camera.
    pub fn loading_bar(&mut self, camera_world: Mat4, progress: f32) {
        let progress = if progress.is_finite() { progress.clamp(0.0, 1.0) } else { 0.0 };
        let left = Vec3::new(-LOADING_BAR_HALF_WIDTH, 0.0, -1.0);
        let right = Vec3::new(LOADING_BAR_HALF_WIDTH, 0.0, -1.0);
        let fill = left.lerp(right, progress);

        let to_world = |p: Vec3| camera_world.transform_point3(p);
        self.line(to_world(left), to_world(right), LOADING_TRACK);
        if progress > 0.0 {
            let lift = Vec3::new(0.0, 0.005, 0.0);
            self.line(to_world(left + lift), to_world(fill + lift), LOADING_FILL);
        }
    }

    /// Rebuilds the batch from a frame snapshot.
    pub fn capture(&mut self, view: &FrameView<'_>) {
        self.clear();
        self.clear_color = view.scene.background;
        self.loading = view.loading;

        let Some(camera_world) = view.scene.world_matrix(view.rig.camera) else {
            log::warn!("camera node missing; nothing to draw");
            return;
        };
        let camera = view.rig.perspective(view.scene).copied().unwrap_or_default();
        self.view_proj = camera.view_projection(camera_world);

        if let Some(progress) = view.loading {
            self.loading_bar(camera_world, progress);
            return;
        }

        for (id, node) in view.scene.iter() {
            let Some(world) = view.scene.world_matrix(id) else {
                continue;
            };
            match &node.content {
                NodeContent::Mesh(mesh) => self.geometry(&mesh.geometry, &mesh.material, world),
                NodeContent::Model(model) => self.wire_box(world, &model.bounds, MODEL_BOUNDS),
                NodeContent::Controller if view.controller.is_some() => {
                    self.marker(world.w_axis.truncate(), 0.05, CONTROLLER_MARKER)
                }
                _ => {}
            }
        }

        for collider in view.colliders.colliders() {
            match collider.render_shape() {
                ColliderShape::Sphere { center, radius } => self.wire_sphere(center, radius, COLLIDER_SPHERE),
                ColliderShape::Box { center, half_extents } => self.wire_box(
                    Mat4::IDENTITY,
                    &BoxCollider::from_center_half_extents(center, half_extents),
                    COLLIDER_BOX,
                ),
            }
        }

        if let Some(dolly) = view.scene.world_position(view.rig.dolly) {
            self.marker(dolly, 0.25, DOLLY_MARKER);
        }
    }
}

impl FrameRenderer for LineBatch {
    fn render(&mut self, view: &FrameView<'_>) {
        self.capture(view);
    }
}
