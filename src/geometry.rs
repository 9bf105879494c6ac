//! CPU-side geometry: vertex format, primitives, OBJ import, and tangent synthesis.
//!
//! Everything in this module runs before GPU upload. [`MeshData`] is the
//! intermediate representation; it can be recentered, given a tangent basis,
//! and finally uploaded as a [`Mesh`](crate::mesh::Mesh).
//!
//! # Vertex Layout
//!
//! [`Vertex`] occupies 44 bytes:
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |
//! | tangent   | Float32x3 | 32     | 3               |

use glam::{Vec2, Vec3};
use std::path::Path;

/// Errors that can occur when importing geometry.
#[derive(Debug)]
pub enum GeometryError {
    /// File could not be read.
    Io(std::io::Error),
    /// The geometry data was invalid or corrupt.
    Parse(String),
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::Io(e) => write!(f, "IO error: {}", e),
            GeometryError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for GeometryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeometryError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GeometryError {
    fn from(e: std::io::Error) -> Self {
        GeometryError::Io(e)
    }
}

/// A vertex with position, normal, texture coordinates, and tangent.
///
/// `#[repr(C)]` plus [`bytemuck::Pod`] makes the struct safe to cast to a
/// byte slice for GPU upload. The tangent is the third basis vector needed
/// for tangent-space normal mapping; the bitangent is reconstructed in the
/// shader as `cross(normal, tangent)`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// The 3D position of this vertex in model space.
    pub position: [f32; 3],
    /// The surface normal vector (should be normalized for correct lighting).
    pub normal: [f32; 3],
    /// Texture coordinates, typically in the range [0, 1].
    pub uv: [f32; 2],
    /// Tangent vector aligned with the U texture axis.
    pub tangent: [f32; 3],
}

impl Vertex {
    /// The wgpu vertex buffer layout descriptor for this vertex type.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
            // tangent
            wgpu::VertexAttribute {
                offset: 32,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };

    /// Creates a new vertex with a zero tangent.
    ///
    /// Call [`MeshData::compute_tangents`] to fill tangents in afterwards.
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            tangent: [0.0, 0.0, 0.0],
        }
    }
}

/// Raw geometry data before GPU upload.
#[derive(Clone, Debug)]
pub struct MeshData {
    /// Vertex positions, normals, UVs, and tangents.
    pub vertices: Vec<Vertex>,
    /// Triangle indices.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Creates mesh data from vertices and indices.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// A unit quad in the XY plane facing +Z, spanning -1 to 1.
    pub fn quad() -> Self {
        let vertices = vec![
            Vertex::new([-1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            Vertex::new([-1.0, -1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
            Vertex::new([1.0, -1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
        ];
        let indices = vec![0, 2, 1, 2, 3, 1];

        let mut data = Self::new(vertices, indices);
        data.compute_tangents();
        data
    }

    /// A unit cube centered at the origin, spanning -0.5 to 0.5 on all axes.
    ///
    /// Each face has its own set of vertices for correct flat normals and
    /// independent UV coordinates (24 vertices, 12 triangles).
    pub fn cube() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            // Front face (Z+)
            Vertex::new([-0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [0.0, 0.0]),
            Vertex::new([ 0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [1.0, 0.0]),
            Vertex::new([ 0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [1.0, 1.0]),
            Vertex::new([-0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [0.0, 1.0]),
            // Back face (Z-)
            Vertex::new([ 0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [0.0, 0.0]),
            Vertex::new([-0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [1.0, 0.0]),
            Vertex::new([-0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [1.0, 1.0]),
            Vertex::new([ 0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [0.0, 1.0]),
            // Top face (Y+)
            Vertex::new([-0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [0.0, 0.0]),
            Vertex::new([ 0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [1.0, 0.0]),
            Vertex::new([ 0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [1.0, 1.0]),
            Vertex::new([-0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [0.0, 1.0]),
            // Bottom face (Y-)
            Vertex::new([-0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [0.0, 0.0]),
            Vertex::new([ 0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [1.0, 0.0]),
            Vertex::new([ 0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [1.0, 1.0]),
            Vertex::new([-0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [0.0, 1.0]),
            // Right face (X+)
            Vertex::new([ 0.5, -0.5,  0.5], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex::new([ 0.5, -0.5, -0.5], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex::new([ 0.5,  0.5, -0.5], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex::new([ 0.5,  0.5,  0.5], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
            // Left face (X-)
            Vertex::new([-0.5, -0.5, -0.5], [-1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex::new([-0.5, -0.5,  0.5], [-1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex::new([-0.5,  0.5,  0.5], [-1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex::new([-0.5,  0.5, -0.5], [-1.0,  0.0,  0.0], [0.0, 1.0]),
        ];

        #[rustfmt::skip]
        let indices: Vec<u32> = vec![
            0,  1,  2,  2,  3,  0,  // front
            4,  5,  6,  6,  7,  4,  // back
            8,  9,  10, 10, 11, 8,  // top
            12, 13, 14, 14, 15, 12, // bottom
            16, 17, 18, 18, 19, 16, // right
            20, 21, 22, 22, 23, 20, // left
        ];

        let mut data = Self::new(vertices, indices);
        data.compute_tangents();
        data
    }

    /// Loads an OBJ model, recenters it, and computes a tangent basis.
    ///
    /// Vertices are deduplicated per (position, normal, texcoord) index
    /// triple, so a corner shared with identical attributes is stored once
    /// while hard edges keep distinct normals. All shapes in the file are
    /// merged into a single index range.
    pub fn load_obj(path: impl AsRef<Path>) -> Result<Self, GeometryError> {
        let path = path.as_ref();
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                single_index: true,
                triangulate: true,
                ..Default::default()
            },
        )
        .map_err(|e| GeometryError::Parse(format!("OBJ parse error: {}", e)))?;

        // A broken or missing .mtl is a warning; geometry still loads.
        if let Err(e) = materials {
            log::warn!(
                "Materials for '{}' could not be loaded: {}",
                path.display(),
                e
            );
        }

        if models.is_empty() {
            return Err(GeometryError::Parse("OBJ file contains no geometry".into()));
        }

        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for model in &models {
            let mesh = &model.mesh;
            let base = vertices.len() as u32;
            let vertex_count = mesh.positions.len() / 3;

            for i in 0..vertex_count {
                let position = [
                    mesh.positions[i * 3],
                    mesh.positions[i * 3 + 1],
                    mesh.positions[i * 3 + 2],
                ];
                let normal = if mesh.normals.len() >= (i + 1) * 3 {
                    [
                        mesh.normals[i * 3],
                        mesh.normals[i * 3 + 1],
                        mesh.normals[i * 3 + 2],
                    ]
                } else {
                    [0.0, 0.0, 0.0]
                };
                let uv = if mesh.texcoords.len() >= (i + 1) * 2 {
                    [mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]]
                } else {
                    [0.0, 0.0]
                };
                vertices.push(Vertex::new(position, normal, uv));
            }

            indices.extend(mesh.indices.iter().map(|&i| base + i));
        }

        let mut data = Self::new(vertices, indices);
        if data.vertices.iter().all(|v| v.normal == [0.0, 0.0, 0.0]) {
            data.recalculate_normals();
        }
        data.recenter();
        data.compute_tangents();

        log::info!(
            "Loaded OBJ model '{}': {} vertices, {} triangles",
            path.display(),
            data.vertices.len(),
            data.indices.len() / 3
        );
        Ok(data)
    }

    /// Loads an OBJ model, falling back to a unit cube if the file cannot
    /// be read or parsed. The viewer always has something to show.
    pub fn load_obj_or_cube(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_obj(path) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Failed to load '{}' ({}); using cube", path.display(), e);
                Self::cube()
            }
        }
    }

    /// Computes the axis-aligned bounding box as `(min, max)` corners.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }

        (min, max)
    }

    /// Returns the center point of the bounding box.
    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    /// Translates all vertices by the given offset.
    pub fn translate(&mut self, offset: Vec3) {
        for v in &mut self.vertices {
            v.position[0] += offset.x;
            v.position[1] += offset.y;
            v.position[2] += offset.z;
        }
    }

    /// Centers the geometry at the origin.
    pub fn recenter(&mut self) {
        let center = self.center();
        self.translate(-center);
    }

    /// Recalculates smooth vertex normals from face geometry.
    pub fn recalculate_normals(&mut self) {
        for v in &mut self.vertices {
            v.normal = [0.0, 0.0, 0.0];
        }

        for tri in self.indices.chunks(3) {
            if tri.len() < 3 {
                continue;
            }
            let i0 = tri[0] as usize;
            let i1 = tri[1] as usize;
            let i2 = tri[2] as usize;

            let p0 = Vec3::from(self.vertices[i0].position);
            let p1 = Vec3::from(self.vertices[i1].position);
            let p2 = Vec3::from(self.vertices[i2].position);

            // Unnormalized cross product weights by face area
            let face_normal = (p1 - p0).cross(p2 - p0);

            for &i in &[i0, i1, i2] {
                self.vertices[i].normal[0] += face_normal.x;
                self.vertices[i].normal[1] += face_normal.y;
                self.vertices[i].normal[2] += face_normal.z;
            }
        }

        for v in &mut self.vertices {
            v.normal = Vec3::from(v.normal).normalize_or_zero().into();
        }
    }

    /// Computes per-vertex tangents from positions and UVs.
    ///
    /// For each triangle the tangent is derived from the position edges and
    /// UV deltas, then accumulated onto its three vertices so that shared
    /// vertices end up with an averaged, renormalized tangent. Triangles
    /// with degenerate UVs contribute nothing; a vertex touched only by
    /// such triangles keeps a zero tangent.
    pub fn compute_tangents(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.indices.chunks(3) {
            if tri.len() < 3 {
                continue;
            }
            let i0 = tri[0] as usize;
            let i1 = tri[1] as usize;
            let i2 = tri[2] as usize;

            let p0 = Vec3::from(self.vertices[i0].position);
            let p1 = Vec3::from(self.vertices[i1].position);
            let p2 = Vec3::from(self.vertices[i2].position);

            let uv0 = Vec2::from(self.vertices[i0].uv);
            let uv1 = Vec2::from(self.vertices[i1].uv);
            let uv2 = Vec2::from(self.vertices[i2].uv);

            let edge1 = p1 - p0;
            let edge2 = p2 - p0;
            let duv1 = uv1 - uv0;
            let duv2 = uv2 - uv0;

            let denom = duv1.x * duv2.y - duv2.x * duv1.y;
            if denom.abs() < 1e-8 {
                continue;
            }
            let f = 1.0 / denom;
            let tangent = (edge1 * duv2.y - edge2 * duv1.y) * f;

            accum[i0] += tangent;
            accum[i1] += tangent;
            accum[i2] += tangent;
        }

        for (v, t) in self.vertices.iter_mut().zip(&accum) {
            v.tangent = t.normalize_or_zero().into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_shape() {
        let quad = MeshData::quad();
        assert_eq!(quad.vertices.len(), 4);
        assert_eq!(quad.indices.len(), 6);
    }

    #[test]
    fn cube_shape() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
    }

    #[test]
    fn bounds_and_center() {
        let vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex::new([2.0, 4.0, 6.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex::new([-1.0, -1.0, -1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let geom = MeshData::new(vertices, vec![0, 1, 2]);

        let (min, max) = geom.bounds();
        assert_eq!(min, Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(max, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(geom.center(), Vec3::new(0.5, 1.5, 2.5));
    }

    #[test]
    fn recenter_moves_to_origin() {
        let vertices = vec![
            Vertex::new([2.0, 2.0, 2.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
            Vertex::new([4.0, 4.0, 4.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        ];
        let mut geom = MeshData::new(vertices, vec![0, 1, 0]);

        geom.recenter();

        let center = geom.center();
        assert!(center.x.abs() < 0.001);
        assert!(center.y.abs() < 0.001);
        assert!(center.z.abs() < 0.001);
    }

    #[test]
    fn tangents_are_unit_length() {
        let cube = MeshData::cube();
        for v in &cube.vertices {
            let len = Vec3::from(v.tangent).length();
            assert!((len - 1.0).abs() < 1e-4, "tangent length {}", len);
        }
    }

    #[test]
    fn quad_tangent_follows_u_axis() {
        // The quad's U axis runs along +X, so tangents must too.
        let quad = MeshData::quad();
        for v in &quad.vertices {
            let t = Vec3::from(v.tangent);
            assert!((t - Vec3::X).length() < 1e-4, "tangent {:?}", t);
        }
    }

    #[test]
    fn tangents_orthogonal_to_normals() {
        let cube = MeshData::cube();
        for v in &cube.vertices {
            let dot = Vec3::from(v.tangent).dot(Vec3::from(v.normal));
            assert!(dot.abs() < 1e-4);
        }
    }

    #[test]
    fn degenerate_uvs_yield_finite_tangents() {
        // All UVs identical: every triangle is skipped, tangents stay zero.
        let vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.5, 0.5]),
            Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.5, 0.5]),
            Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.5, 0.5]),
        ];
        let mut geom = MeshData::new(vertices, vec![0, 1, 2]);

        geom.compute_tangents();

        for v in &geom.vertices {
            for c in v.tangent {
                assert!(c.is_finite());
                assert_eq!(c, 0.0);
            }
        }
    }

    #[test]
    fn load_obj_dedups_shared_corners() {
        use std::io::Write;

        let obj = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
";
        let dir = std::env::temp_dir();
        let path = dir.join("helion_test_quad.obj");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(obj.as_bytes()).unwrap();

        let data = MeshData::load_obj(&path).unwrap();
        std::fs::remove_file(&path).ok();

        // Four unique (position, uv, normal) triples across two triangles.
        assert_eq!(data.vertices.len(), 4);
        assert_eq!(data.indices.len(), 6);

        // load_obj recenters: the quad spanned [0,1]^2.
        let center = data.center();
        assert!(center.length() < 1e-5);
    }

    #[test]
    fn missing_mtl_is_nonfatal() {
        use std::io::Write;

        let obj = "\
mtllib does_not_exist.mtl
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
f 1 2 3
";
        let dir = std::env::temp_dir();
        let path = dir.join("helion_test_missing_mtl.obj");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(obj.as_bytes()).unwrap();

        let data = MeshData::load_obj(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(data.vertices.len(), 3);
        assert_eq!(data.indices.len(), 3);
    }

    #[test]
    fn missing_obj_falls_back_to_cube() {
        let data = MeshData::load_obj_or_cube("definitely/not/a/real/path.obj");
        assert_eq!(data.vertices.len(), 24);
        assert_eq!(data.indices.len(), 36);
    }

    #[test]
    fn recalculate_normals_smooths() {
        let vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0]),
            Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0]),
            Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0]),
        ];
        let mut geom = MeshData::new(vertices, vec![0, 1, 2]);

        geom.recalculate_normals();

        for v in &geom.vertices {
            assert!((Vec3::from(v.normal) - Vec3::Z).length() < 1e-5);
        }
    }
}
