use serde::{Deserialize, Serialize};

pub type Pt3 = nalgebra::Point3<f32>;
pub type Vec3 = nalgebra::Vector3<f32>;

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Pt3,
    pub max: Pt3,
}

impl Aabb {
    pub fn new(min: Pt3, max: Pt3) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Pt3 {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains(&self, p: &Pt3) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    fn grow(&mut self, p: &Pt3) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }
}

/// Output of one assembly pass: parallel vertex/index/UV arrays.
///
/// `triangles.len()` is always a multiple of 3 and every index is below
/// `vertices.len()`. There is exactly one UV per vertex.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshBuffers {
    pub vertices: Vec<[f32; 3]>,
    pub triangles: Vec<u32>,
    pub uvs: Vec<[f32; 2]>,
}

impl MeshBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.triangles.clear();
        self.uvs.clear();
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounds of all vertices, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<Aabb> {
        let mut iter = self.vertices.iter().map(|v| Pt3::from(*v));
        let first = iter.next()?;
        let mut bounds = Aabb::new(first, first);
        for p in iter {
            bounds.grow(&p);
        }
        Some(bounds)
    }

    /// Area-weighted per-vertex normals following the current winding.
    ///
    /// Vertices not referenced by any non-degenerate triangle get a zero normal.
    pub fn compute_normals(&self) -> Vec<[f32; 3]> {
        let mut normals = vec![Vec3::zeros(); self.vertices.len()];

        for chunk in self.triangles.chunks_exact(3) {
            let i0 = chunk[0] as usize;
            let i1 = chunk[1] as usize;
            let i2 = chunk[2] as usize;

            let v0 = Vec3::from(self.vertices[i0]);
            let v1 = Vec3::from(self.vertices[i1]);
            let v2 = Vec3::from(self.vertices[i2]);

            let normal = (v1 - v0).cross(&(v2 - v0));

            normals[i0] += normal;
            normals[i1] += normal;
            normals[i2] += normal;
        }

        normals
            .into_iter()
            .map(|n| {
                let len = n.magnitude();
                if len > 1e-8 {
                    (n / len).into()
                } else {
                    [0.0; 3]
                }
            })
            .collect()
    }

    /// Flattens the buffers into one little-endian blob: three `u32` byte
    /// lengths (vertices, triangles, uvs) followed by the raw arrays.
    pub fn to_bytes(&self) -> Vec<u8> {
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&self.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&self.triangles);
        let uv_bytes: &[u8] = bytemuck::cast_slice(&self.uvs);

        let mut bytes =
            Vec::with_capacity(12 + vertex_bytes.len() + index_bytes.len() + uv_bytes.len());
        bytes.extend_from_slice(&(vertex_bytes.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(index_bytes.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(uv_bytes.len() as u32).to_le_bytes());
        bytes.extend_from_slice(vertex_bytes);
        bytes.extend_from_slice(index_bytes);
        bytes.extend_from_slice(uv_bytes);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshBuffers {
        MeshBuffers {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            triangles: vec![0, 1, 2, 0, 2, 3],
            uvs: vec![[0.0; 2]; 4],
        }
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let bounds = quad().bounds().unwrap();
        assert_eq!(bounds.min, Pt3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, Pt3::new(1.0, 1.0, 0.0));
        assert!(MeshBuffers::new().bounds().is_none());
    }

    #[test]
    fn normals_follow_winding() {
        let normals = quad().compute_normals();
        for n in normals {
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn byte_blob_layout() {
        let mesh = quad();
        let bytes = mesh.to_bytes();
        let vertex_len = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let index_len = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let uv_len = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        assert_eq!(vertex_len, 4 * 12);
        assert_eq!(index_len, 6 * 4);
        assert_eq!(uv_len, 4 * 8);
        assert_eq!(bytes.len(), 12 + 48 + 24 + 32);
    }
}
