//! Geometry preprocessing for the dissolve effect.
//!
//! The dissolve vertex shader moves every triangle independently, so it needs two
//! per-vertex attributes that are constant across a triangle:
//! - `aRandom`: one pseudo-random scalar in `[0, 1)` per triangle
//! - `aCenter`: the triangle centroid
//!
//! Both are derived in one pass over a non-indexed triangle list, where every three
//! consecutive vertices form one triangle. Indexed meshes must be flattened with
//! [`MeshGeometry::to_non_indexed`] first.

use glam::Vec3;
use rand::Rng;

use crate::error::{DissolveError, Result};

/// Shader attribute name of the per-triangle random value.
pub const RANDOM_ATTRIBUTE: &str = "aRandom";

/// Shader attribute name of the per-triangle centroid.
pub const CENTER_ATTRIBUTE: &str = "aCenter";

/// Vertex positions with optional normals and an optional index buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    positions: Vec<Vec3>,
    normals: Option<Vec<Vec3>>,
    indices: Option<Vec<u32>>,
}

impl MeshGeometry {
    /// Creates a non-indexed geometry from a triangle list.
    pub fn new(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            normals: None,
            indices: None,
        }
    }

    /// Creates an indexed geometry.
    pub fn indexed(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals: None,
            indices: Some(indices),
        }
    }

    /// Attaches per-vertex normals.
    #[must_use]
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Returns the vertex positions.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Returns the vertex normals, if any.
    pub fn normals(&self) -> Option<&[Vec3]> {
        self.normals.as_deref()
    }

    /// Returns the index buffer, if any.
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    /// Returns true if the geometry has an index buffer.
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Returns the number of vertices in the position buffer.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns the number of triangles described by the geometry.
    pub fn triangle_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len() / 3,
            None => self.positions.len() / 3,
        }
    }

    /// Expands the index buffer so that every three consecutive vertices form a triangle.
    ///
    /// A geometry that is already non-indexed is returned unchanged.
    pub fn to_non_indexed(&self) -> Result<MeshGeometry> {
        if let Some(normals) = &self.normals {
            if normals.len() != self.positions.len() {
                return Err(DissolveError::IncompatibleGeometry(format!(
                    "{} normals for {} positions",
                    normals.len(),
                    self.positions.len()
                )));
            }
        }

        let Some(indices) = &self.indices else {
            return Ok(self.clone());
        };

        if indices.len() % 3 != 0 {
            return Err(DissolveError::IncompatibleGeometry(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }

        let mut positions = Vec::with_capacity(indices.len());
        let mut normals = self
            .normals
            .as_ref()
            .map(|_| Vec::with_capacity(indices.len()));

        for &index in indices {
            let i = index as usize;
            let position = self.positions.get(i).ok_or_else(|| {
                DissolveError::IncompatibleGeometry(format!(
                    "index {i} out of range for {} vertices",
                    self.positions.len()
                ))
            })?;
            positions.push(*position);
            if let (Some(out), Some(src)) = (normals.as_mut(), self.normals.as_ref()) {
                out.push(src[i]);
            }
        }

        log::debug!(
            "flattened {} indexed vertices into {} triangle-list vertices",
            self.positions.len(),
            positions.len()
        );

        Ok(MeshGeometry {
            positions,
            normals,
            indices: None,
        })
    }

    /// Derives the dissolve attributes using the thread-local random generator.
    pub fn dissolve_attributes(&self) -> Result<DissolveAttributes> {
        derive_dissolve_attributes(self, &mut rand::thread_rng())
    }
}

/// Per-vertex attributes consumed by the dissolve shader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DissolveAttributes {
    /// `aRandom`: one value per vertex, equal across each triangle.
    pub a_random: Vec<f32>,
    /// `aCenter`: one centroid per vertex, equal across each triangle.
    pub a_center: Vec<Vec3>,
}

impl DissolveAttributes {
    /// Returns the number of vertices covered.
    pub fn len(&self) -> usize {
        self.a_random.len()
    }

    /// Returns true if no vertices are covered.
    pub fn is_empty(&self) -> bool {
        self.a_random.is_empty()
    }

    /// Returns the centroids as a flat `[x, y, z, ...]` buffer for upload.
    pub fn center_components(&self) -> Vec<f32> {
        self.a_center.iter().flat_map(|c| c.to_array()).collect()
    }
}

/// Derives `aRandom` and `aCenter` for a non-indexed triangle list.
///
/// Fails with [`DissolveError::IncompatibleGeometry`] if the geometry still has an
/// index buffer or its vertex count is not a multiple of 3.
pub fn derive_dissolve_attributes<R: Rng>(
    geometry: &MeshGeometry,
    rng: &mut R,
) -> Result<DissolveAttributes> {
    if geometry.is_indexed() {
        return Err(DissolveError::IncompatibleGeometry(
            "geometry is indexed; flatten it with to_non_indexed first".into(),
        ));
    }
    derive_from_triangles(geometry.positions(), rng)
}

/// Derives `aRandom` and `aCenter` from a flat `[x, y, z, ...]` position buffer.
///
/// The buffer length must be a multiple of 9 (three vertices per triangle).
pub fn derive_dissolve_attributes_from_buffer<R: Rng>(
    positions: &[f32],
    rng: &mut R,
) -> Result<DissolveAttributes> {
    if positions.len() % 9 != 0 {
        return Err(DissolveError::IncompatibleGeometry(format!(
            "position buffer length {} is not a whole number of triangles",
            positions.len()
        )));
    }
    let vertices: Vec<Vec3> = positions.chunks_exact(3).map(Vec3::from_slice).collect();
    derive_from_triangles(&vertices, rng)
}

fn derive_from_triangles<R: Rng>(
    positions: &[Vec3],
    rng: &mut R,
) -> Result<DissolveAttributes> {
    if positions.len() % 3 != 0 {
        return Err(DissolveError::IncompatibleGeometry(format!(
            "vertex count {} is not a multiple of 3",
            positions.len()
        )));
    }

    let mut a_random = Vec::with_capacity(positions.len());
    let mut a_center = Vec::with_capacity(positions.len());

    for triangle in positions.chunks_exact(3) {
        let random: f32 = rng.gen();
        let center = (triangle[0] + triangle[1] + triangle[2]) / 3.0;
        for _ in 0..3 {
            a_random.push(random);
            a_center.push(center);
        }
    }

    log::debug!("derived dissolve attributes for {} triangles", positions.len() / 3);

    Ok(DissolveAttributes { a_random, a_center })
}
