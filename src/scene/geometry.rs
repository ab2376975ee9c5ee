use glam::Vec3;
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub Vec3);

impl Color {
    pub const BLACK: Self = Self(Vec3::ZERO);
    pub const WHITE: Self = Self(Vec3::ONE);

    /// From 0xRRGGBB.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self(Vec3::new(channel(16), channel(8), channel(0)))
    }

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self(Vec3::new(r, g, b))
    }

    pub fn to_array(self) -> [f32; 3] {
        self.0.to_array()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Lines,
    Triangles,
}

/// CPU-side geometry in the owning node's local space.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub colors: Option<Vec<Color>>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl Geometry {
    /// Flat disc in the XY plane facing +Z.
    pub fn circle(radius: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let mut positions = vec![Vec3::ZERO];
        let mut indices = Vec::with_capacity(segments as usize * 3);

        for seg in 0..=segments {
            let theta = 2.0 * PI * seg as f32 / segments as f32;
            positions.push(Vec3::new(radius * theta.cos(), radius * theta.sin(), 0.0));
        }

        for seg in 1..=segments {
            indices.extend_from_slice(&[seg, seg + 1, 0]);
        }

        Self {
            positions,
            colors: None,
            indices,
            topology: Topology::Triangles,
        }
    }

    /// Annulus in the XY plane facing +Z.
    pub fn ring(inner_radius: f32, outer_radius: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let mut positions = Vec::with_capacity((segments as usize + 1) * 2);
        let mut indices = Vec::with_capacity(segments as usize * 6);

        for seg in 0..=segments {
            let theta = 2.0 * PI * seg as f32 / segments as f32;
            let (sin, cos) = theta.sin_cos();
            positions.push(Vec3::new(inner_radius * cos, inner_radius * sin, 0.0));
            positions.push(Vec3::new(outer_radius * cos, outer_radius * sin, 0.0));
        }

        for seg in 0..segments {
            let inner = seg * 2;
            let outer = inner + 1;
            let next_inner = inner + 2;
            let next_outer = inner + 3;
            indices.extend_from_slice(&[inner, outer, next_outer, inner, next_outer, next_inner]);
        }

        Self {
            positions,
            colors: None,
            indices,
            topology: Topology::Triangles,
        }
    }

    /// One-unit ray down -Z fading from grey to black.
    pub fn pointer_line() -> Self {
        Self {
            positions: vec![Vec3::ZERO, Vec3::NEG_Z],
            colors: Some(vec![Color::rgb(0.5, 0.5, 0.5), Color::BLACK]),
            indices: vec![0, 1],
            topology: Topology::Lines,
        }
    }

    pub fn translated(mut self, offset: Vec3) -> Self {
        for p in &mut self.positions {
            *p += offset;
        }
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Index pairs for drawing as a wireframe.
    pub fn edges(&self) -> Vec<[u32; 2]> {
        match self.topology {
            Topology::Lines => self.indices.chunks_exact(2).map(|e| [e[0], e[1]]).collect(),
            Topology::Triangles => self
                .indices
                .chunks_exact(3)
                .flat_map(|t| [[t[0], t[1]], [t[1], t[2]], [t[2], t[0]]])
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Color,
    pub opacity: f32,
    pub transparent: bool,
    pub additive: bool,
    pub vertex_colors: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            opacity: 1.0,
            transparent: false,
            additive: false,
            vertex_colors: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: Material,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_unpack_channels() {
        let grey = Color::from_hex(0x505050);
        assert!((grey.0.x - 80.0 / 255.0).abs() < 1e-6);
        assert_eq!(Color::from_hex(0xffffff), Color::WHITE);
    }

    #[test]
    fn circle_fans_around_center() {
        let disc = Geometry::circle(6.5, 64);
        assert_eq!(disc.vertex_count(), 66);
        assert_eq!(disc.indices.len(), 64 * 3);
        assert!((disc.positions[1].length() - 6.5).abs() < 1e-5);
        assert_eq!(disc.edges().len(), 64 * 3);
    }

    #[test]
    fn ring_translates_to_pointer_distance() {
        let ring = Geometry::ring(0.02, 0.04, 32).translated(Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(ring.vertex_count(), 66);
        assert!(ring.positions.iter().all(|p| p.z == -1.0));
        assert!(ring.indices.iter().all(|&i| (i as usize) < ring.vertex_count()));
    }

    #[test]
    fn pointer_line_is_single_edge() {
        let line = Geometry::pointer_line();
        assert_eq!(line.edges(), vec![[0, 1]]);
    }
}
