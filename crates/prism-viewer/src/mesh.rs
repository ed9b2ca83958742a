//! Pyramid geometry and its GPU buffers.
//!
//! The pyramid is a non-indexed list of six triangles: four sides meeting at
//! the apex and a square base split in two. Each side carries the
//! axis-aligned normal of the direction it faces.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Interleaved vertex: position, normal, texture coordinate.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

const fn v(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> MeshVertex {
    MeshVertex { position, normal, uv }
}

const APEX: [f32; 3] = [0.0, 0.5, 0.0];
const FRONT_LEFT: [f32; 3] = [-0.5, -0.5, 0.5];
const FRONT_RIGHT: [f32; 3] = [0.5, -0.5, 0.5];
const BACK_LEFT: [f32; 3] = [-0.5, -0.5, -0.5];
const BACK_RIGHT: [f32; 3] = [0.5, -0.5, -0.5];

pub const PYRAMID_VERTICES: [MeshVertex; 18] = [
    // front
    v(APEX, [0.0, 0.0, 1.0], [0.5, 1.0]),
    v(FRONT_LEFT, [0.0, 0.0, 1.0], [0.0, 0.0]),
    v(FRONT_RIGHT, [0.0, 0.0, 1.0], [1.0, 0.0]),
    // left
    v(APEX, [-1.0, 0.0, 0.0], [0.5, 1.0]),
    v(FRONT_LEFT, [-1.0, 0.0, 0.0], [1.0, 0.0]),
    v(BACK_LEFT, [-1.0, 0.0, 0.0], [0.0, 0.0]),
    // back
    v(APEX, [0.0, 0.0, -1.0], [0.5, 1.0]),
    v(BACK_LEFT, [0.0, 0.0, -1.0], [1.0, 0.0]),
    v(BACK_RIGHT, [0.0, 0.0, -1.0], [0.0, 0.0]),
    // right
    v(APEX, [1.0, 0.0, 0.0], [0.5, 1.0]),
    v(FRONT_RIGHT, [1.0, 0.0, 0.0], [0.0, 0.0]),
    v(BACK_RIGHT, [1.0, 0.0, 0.0], [1.0, 0.0]),
    // base, left half
    v(FRONT_LEFT, [0.0, -1.0, 0.0], [0.0, 0.0]),
    v(BACK_LEFT, [0.0, -1.0, 0.0], [0.0, 1.0]),
    v(BACK_RIGHT, [0.0, -1.0, 0.0], [1.0, 1.0]),
    // base, right half
    v(FRONT_LEFT, [0.0, -1.0, 0.0], [0.0, 0.0]),
    v(FRONT_RIGHT, [0.0, -1.0, 0.0], [1.0, 0.0]),
    v(BACK_RIGHT, [0.0, -1.0, 0.0], [1.0, 1.0]),
];

pub const PYRAMID_VERTEX_COUNT: u32 = PYRAMID_VERTICES.len() as u32;

const LIT_ATTRS: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

// Same stride as the lit layout; normal and uv are skipped.
const MARKER_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

/// Position, normal and uv at locations 0, 1, 2.
pub fn lit_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &LIT_ATTRS,
    }
}

/// Position only at location 0, reading the same interleaved data.
pub fn marker_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &MARKER_ATTRS,
    }
}

/// Vertex buffers for the lit pyramid and the light markers.
///
/// Both hold the same vertices; they are separate so each draw binds its own
/// buffer.
pub struct MeshBuffers {
    pub lit: wgpu::Buffer,
    pub marker: wgpu::Buffer,
    pub vertex_count: u32,
}

impl MeshBuffers {
    pub fn new(device: &wgpu::Device) -> Self {
        let contents = bytemuck::cast_slice(&PYRAMID_VERTICES);
        let lit = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("prism pyramid vbo"),
            contents,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let marker = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("prism marker vbo"),
            contents,
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            lit,
            marker,
            vertex_count: PYRAMID_VERTEX_COUNT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_eight_floats() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 32);
        assert_eq!(lit_layout().array_stride, marker_layout().array_stride);
        assert_eq!(LIT_ATTRS[2].offset, 24);
    }

    #[test]
    fn eighteen_vertices_six_triangles() {
        assert_eq!(PYRAMID_VERTEX_COUNT, 18);
        assert_eq!(PYRAMID_VERTICES.len() % 3, 0);
    }

    #[test]
    fn normals_are_unit_length() {
        for vert in &PYRAMID_VERTICES {
            let [x, y, z] = vert.normal;
            assert!(((x * x + y * y + z * z).sqrt() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn sides_share_the_apex_and_base_is_flat() {
        for side in PYRAMID_VERTICES[..12].chunks(3) {
            assert_eq!(side[0].position, APEX);
            assert_eq!(side[0].uv, [0.5, 1.0]);
        }
        for vert in &PYRAMID_VERTICES[12..] {
            assert_eq!(vert.position[1], -0.5);
            assert_eq!(vert.normal, [0.0, -1.0, 0.0]);
        }
    }

    #[test]
    fn fits_in_unit_cube_around_origin() {
        for vert in &PYRAMID_VERTICES {
            assert!(vert.position.iter().all(|c| c.abs() <= 0.5));
            assert!(vert.uv.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }
}
