//! Model loading (CPU side).
//!
//! Models arrive as bytes, get their format sniffed from the header, and are
//! flattened into one triangle list with node transforms applied. The result
//! feeds both the renderer (as bounds and wireframe) and, for collidable
//! placements, the collider set.
//!
//! Loads are asynchronous relative to the frame loop: see [`AssetLoader`]
//! for how results travel back and [`LoadTracker`] for the startup barrier.

mod loader;
mod tracker;

use std::path::Path;

use glam::{Mat4, Vec3};

use crate::collision::BoxCollider;
use crate::error::AssetError;

pub use loader::{AssetLoader, LoadEvent, LoadId, LoadMessage, LoadReporter};
pub use tracker::{LoadState, LoadTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Glb,
    GltfJson,
    Fbx,
}

impl ModelFormat {
    const FBX_MAGIC: &'static [u8] = b"Kaydara FBX Binary";

    /// Header first, extension as a fallback.
    pub fn detect(path: &Path, bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"glTF") {
            return Some(Self::Glb);
        }
        if bytes.starts_with(Self::FBX_MAGIC) {
            return Some(Self::Fbx);
        }
        if bytes.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{') {
            return Some(Self::GltfJson);
        }

        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "glb" => Some(Self::Glb),
            "gltf" => Some(Self::GltfJson),
            "fbx" => Some(Self::Fbx),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Glb => "GLB",
            Self::GltfJson => "glTF",
            Self::Fbx => "FBX",
        }
    }
}

/// Flattened triangle mesh of a whole model file, in model space.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelData {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub bounds: BoxCollider,
}

impl ModelData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Decodes a model file already in memory.
pub fn parse_model(path: &Path, bytes: &[u8]) -> Result<ModelData, AssetError> {
    match ModelFormat::detect(path, bytes) {
        Some(ModelFormat::Glb | ModelFormat::GltfJson) => parse_gltf(path, bytes),
        Some(format @ ModelFormat::Fbx) => Err(AssetError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: format.name(),
        }),
        None => Err(AssetError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: "unrecognised",
        }),
    }
}

fn parse_gltf(path: &Path, bytes: &[u8]) -> Result<ModelData, AssetError> {
    let gltf_err = |source| AssetError::Gltf {
        path: path.to_path_buf(),
        source,
    };

    // Images are skipped: only geometry matters here.
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes).map_err(gltf_err)?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(gltf_err)?;

    let mut positions = Vec::new();
    let mut indices = Vec::new();

    let roots: Vec<gltf::Node> = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().collect(),
        None => document.nodes().collect(),
    };

    let mut stack: Vec<(gltf::Node, Mat4)> = roots.into_iter().map(|n| (n, Mat4::IDENTITY)).collect();
    while let Some((node, parent)) = stack.pop() {
        let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

        if let Some(mesh) = node.mesh() {
            for prim in mesh.primitives() {
                if prim.mode() != gltf::mesh::Mode::Triangles {
                    continue;
                }
                let reader = prim.reader(|buf| buffers.get(buf.index()).map(|b| b.0.as_slice()));
                let Some(pos_iter) = reader.read_positions() else {
                    continue;
                };

                let start = positions.len() as u32;
                positions.extend(pos_iter.map(|p| world.transform_point3(Vec3::from_array(p))));
                let added = positions.len() as u32 - start;

                match reader.read_indices() {
                    Some(idx) => indices.extend(idx.into_u32().map(|i| i + start)),
                    None => indices.extend(start..start + added - added % 3),
                }
            }
        }

        stack.extend(node.children().map(|child| (child, world)));
    }

    let bounds = match BoxCollider::enclosing(&positions) {
        Some(bounds) if indices.len() >= 3 => bounds,
        _ => return Err(AssetError::EmptyModel(path.to_path_buf())),
    };

    Ok(ModelData {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        positions,
        indices,
        bounds,
    })
}
