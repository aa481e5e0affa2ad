//! Indexed triangle meshes

use crate::rasterizer::{Color, Material, Vec2, Vec3, Vertex};

/// Vertex list plus a triangle index list (groups of three)
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Used by instances that carry no material of their own
    pub material: Option<Material>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> u32 {
        self.vertices.push(vertex);
        (self.vertices.len() - 1) as u32
    }

    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate complete index triples; a trailing partial group is ignored
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }

    /// Tint every vertex
    pub fn with_color(mut self, color: Color) -> Self {
        for v in &mut self.vertices {
            v.color = color;
        }
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    /// Axis-aligned cube centered on the origin, `size` wide, outward CCW faces
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        let positions = [
            // Front
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
            // Back
            Vec3::new(-h, -h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(h, -h, -h),
            // Top
            Vec3::new(-h, h, -h),
            Vec3::new(-h, h, h),
            Vec3::new(h, h, h),
            Vec3::new(h, h, -h),
            // Bottom
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, -h, h),
            Vec3::new(-h, -h, h),
            // Right
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(h, h, h),
            Vec3::new(h, -h, h),
            // Left
            Vec3::new(-h, -h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(-h, h, h),
            Vec3::new(-h, h, -h),
        ];

        let normals = [
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
        ];

        let uvs = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];

        let mut mesh = Mesh::new();
        for (face, normal) in normals.iter().enumerate() {
            let corners = &positions[face * 4..face * 4 + 4];
            let tangent = (corners[1] - corners[0]).normalize();
            let bitangent = (corners[3] - corners[0]).normalize();

            let base = mesh.vertices.len() as u32;
            for (i, &pos) in corners.iter().enumerate() {
                mesh.add_vertex(Vertex {
                    tangent,
                    bitangent,
                    ..Vertex::new(pos, uvs[i], *normal)
                });
            }
            mesh.add_triangle(base, base + 1, base + 2);
            mesh.add_triangle(base, base + 2, base + 3);
        }
        mesh
    }

    /// Unit-normal quad in the XY plane facing +z
    pub fn quad(size: f32) -> Self {
        let h = size * 0.5;
        let n = Vec3::new(0.0, 0.0, 1.0);
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Vertex::new(Vec3::new(-h, -h, 0.0), Vec2::new(0.0, 0.0), n));
        let b = mesh.add_vertex(Vertex::new(Vec3::new(h, -h, 0.0), Vec2::new(1.0, 0.0), n));
        let c = mesh.add_vertex(Vertex::new(Vec3::new(h, h, 0.0), Vec2::new(1.0, 1.0), n));
        let d = mesh.add_vertex(Vertex::new(Vec3::new(-h, h, 0.0), Vec2::new(0.0, 1.0), n));
        mesh.add_triangle(a, b, c);
        mesh.add_triangle(a, c, d);
        mesh
    }

    /// Single CCW triangle in the XY plane facing +z
    pub fn triangle(size: f32) -> Self {
        let h = size * 0.5;
        let n = Vec3::new(0.0, 0.0, 1.0);
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Vertex::new(Vec3::new(-h, -h, 0.0), Vec2::new(0.0, 0.0), n));
        let b = mesh.add_vertex(Vertex::new(Vec3::new(h, -h, 0.0), Vec2::new(1.0, 0.0), n));
        let c = mesh.add_vertex(Vertex::new(Vec3::new(0.0, h, 0.0), Vec2::new(0.5, 1.0), n));
        mesh.add_triangle(a, b, c);
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_faces_point_outward() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.triangle_count(), 12);

        for [a, b, c] in cube.triangles() {
            let (p0, p1, p2) = (cube.vertices[a].pos, cube.vertices[b].pos, cube.vertices[c].pos);
            let face = (p1 - p0).cross(p2 - p0).normalize();
            assert!(face.dot(cube.vertices[a].normal) > 0.99);
            // Centroid lies on the outward side
            let centroid = (p0 + p1 + p2) * (1.0 / 3.0);
            assert!(face.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_cube_tangent_frame_matches_normal() {
        let cube = Mesh::cube(1.0);
        for v in &cube.vertices {
            let n = v.tangent.cross(v.bitangent);
            assert!(n.dot(v.normal) > 0.99);
        }
    }

    #[test]
    fn test_partial_index_group_is_ignored() {
        let mut mesh = Mesh::triangle(1.0);
        mesh.indices.push(0);
        assert_eq!(mesh.triangles().count(), 1);
    }

    #[test]
    fn test_with_color_tints_vertices() {
        let quad = Mesh::quad(1.0).with_color(Color::RED);
        assert!(quad.vertices.iter().all(|v| v.color == Color::RED));
    }
}
