use std::{f32::consts::TAU, mem::size_of};

use bytemuck::{cast_slice, Pod, Zeroable};
use glam::{vec2, vec3, Vec2, Vec3};
use wgpu::util::DeviceExt;

#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 0,
            shader_location: 0,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x3,
            offset: 12,
            shader_location: 1,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 24,
            shader_location: 2,
        },
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Vertex>() as _,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[derive(Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl Mesh {
    pub fn upload(device: &wgpu::Device, label: &str, data: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", label)),
            contents: cast_slice(data.vertices.as_slice()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", label)),
            contents: cast_slice(data.indices.as_slice()),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as _,
        }
    }
}

pub fn torus(
    major_radius: f32,
    minor_radius: f32,
    radial_segments: u32,
    tubular_segments: u32,
) -> MeshData {
    let mut data = MeshData::default();

    for j in 0..=radial_segments {
        let v = j as f32 / radial_segments as f32 * TAU;
        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * TAU;

            let ring = major_radius + minor_radius * v.cos();
            let position = vec3(ring * u.cos(), ring * u.sin(), minor_radius * v.sin());
            let center = vec3(major_radius * u.cos(), major_radius * u.sin(), 0.0);

            data.vertices.push(Vertex {
                position,
                normal: (position - center).normalize(),
                uv: vec2(
                    i as f32 / tubular_segments as f32,
                    j as f32 / radial_segments as f32,
                ),
            });
        }
    }

    let stride = tubular_segments + 1;
    for j in 1..=radial_segments {
        for i in 1..=tubular_segments {
            let a = (stride * j + i - 1) as u16;
            let b = (stride * (j - 1) + i - 1) as u16;
            let c = (stride * (j - 1) + i) as u16;
            let d = (stride * j + i) as u16;
            data.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    data
}

/// Unit-radius sphere; the moon scales it through its model matrix.
pub fn uv_sphere(width_segments: u32, height_segments: u32) -> MeshData {
    let mut data = MeshData::default();

    for y in 0..=height_segments {
        let v = y as f32 / height_segments as f32;
        let theta = v * std::f32::consts::PI;
        for x in 0..=width_segments {
            let u = x as f32 / width_segments as f32;
            let phi = u * TAU;

            let position = vec3(
                theta.sin() * phi.cos(),
                theta.cos(),
                theta.sin() * phi.sin(),
            );

            data.vertices.push(Vertex {
                position,
                normal: position,
                uv: vec2(u, 1.0 - v),
            });
        }
    }

    let stride = width_segments + 1;
    for y in 1..=height_segments {
        for x in 1..=width_segments {
            let a = (stride * y + x - 1) as u16;
            let b = (stride * (y - 1) + x - 1) as u16;
            let c = (stride * (y - 1) + x) as u16;
            let d = (stride * y + x) as u16;
            data.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    data
}

/// Unit cube centered on the origin, one quad per face so every face can
/// carry the avatar texture.
pub fn unit_cube() -> MeshData {
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (-Vec3::X, Vec3::Y, -Vec3::Z),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (-Vec3::Y, -Vec3::Z, Vec3::X),
        (Vec3::Z, Vec3::Y, -Vec3::X),
        (-Vec3::Z, Vec3::Y, Vec3::X),
    ];

    let mut data = MeshData::default();
    for (normal, up, right) in faces {
        let base = data.vertices.len() as u16;
        for (corner_x, corner_y) in [(-0.5, -0.5), (-0.5, 0.5), (0.5, -0.5), (0.5, 0.5)] {
            data.vertices.push(Vertex {
                position: normal * 0.5 + right * corner_x + up * corner_y,
                normal,
                uv: vec2(corner_x + 0.5, 0.5 - corner_y),
            });
        }
        data.indices
            .extend_from_slice(&[base, base + 2, base + 1, base + 1, base + 2, base + 3]);
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_indices_in_range(data: &MeshData) {
        let count = data.vertices.len();
        assert!(data.indices.iter().all(|&i| (i as usize) < count));
    }

    #[test]
    fn torus_vertices_sit_on_the_tube() {
        let data = torus(3.0, 1.0, 16, 32);

        assert_eq!(data.vertices.len(), 17 * 33);
        assert_eq!(data.indices.len(), (16 * 32 * 6) as usize);
        assert_indices_in_range(&data);

        for vertex in &data.vertices {
            let ring_distance = vec2(vertex.position.x, vertex.position.y).length() - 3.0;
            let tube_distance = vec2(ring_distance, vertex.position.z).length();
            assert!((tube_distance - 1.0).abs() < 1e-4);
            assert!((vertex.normal.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn sphere_vertices_sit_on_the_unit_sphere() {
        let data = uv_sphere(32, 32);

        assert_eq!(data.vertices.len(), 33 * 33);
        assert_indices_in_range(&data);

        for vertex in &data.vertices {
            assert!((vertex.position.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn cube_has_six_textured_faces() {
        let data = unit_cube();

        assert_eq!(data.vertices.len(), 24);
        assert_eq!(data.indices.len(), 36);
        assert_indices_in_range(&data);

        for vertex in &data.vertices {
            assert!((vertex.position.abs().max_element() - 0.5).abs() < 1e-6);
            assert!((vertex.normal.length() - 1.0).abs() < 1e-6);
            assert!(vertex.uv.min_element() >= 0.0 && vertex.uv.max_element() <= 1.0);
        }
    }
}
