use std::{f32::consts::TAU, mem::size_of, time::SystemTime};

use bytemuck::{bytes_of, cast_slice, Pod, Zeroable};
use glam::{const_vec3, vec3, Mat4, Vec3, Vec4};
use log::info;
use rand::prelude::*;
use rand_pcg::Pcg64Mcg;
use wgpu::util::DeviceExt;

use crate::{
    entity::{Scene, Starfield},
    time::Time,
};

use super::{mesh::CameraExt, render_target::DEPTH_TEXTURE_FORMAT};

#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
#[repr(C)]
struct Uniforms {
    view: Mat4,
    proj: Mat4,
    params: Vec4, // star size, elapsed, twinkle speed
}

impl Uniforms {
    fn new(scene: &Scene, time: Time) -> Self {
        Self {
            view: scene.camera.view_matrix(),
            proj: scene.camera.proj_matrix(),
            params: Vec4::new(
                scene.starfield.star_size,
                time.elapsed,
                scene.starfield.twinkle_speed,
                0.0,
            ),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
#[repr(C)]
struct StarInstance {
    position: Vec3,
    phase: f32,
    color: Vec3,
    brightness: f32,
}

/// Fixed star shell, generated once and uploaded as immutable instances.
fn star_instances(starfield: &Starfield, seed: u64) -> Vec<StarInstance> {
    let mut rng = Pcg64Mcg::seed_from_u64(seed);

    (0..starfield.count)
        .map(|_| {
            let theta = (1.0 - 2.0 * rng.gen::<f32>()).acos();
            let phi = rng.gen::<f32>() * TAU;
            let distance = starfield.radius + rng.gen::<f32>() * starfield.depth;

            StarInstance {
                position: vec3(
                    distance * theta.sin() * phi.cos(),
                    distance * theta.cos(),
                    distance * theta.sin() * phi.sin(),
                ),
                phase: rng.gen::<f32>() * TAU,
                // Desaturated; brightness varies per star instead.
                color: Vec3::ONE,
                brightness: rng.gen_range(0.5..1.0),
            }
        })
        .collect()
}

pub struct StarfieldPass {
    uniform_buffer: wgpu::Buffer,
    _vertex_buffer: wgpu::Buffer,
    _index_buffer: wgpu::Buffer,
    _instance_buffer: wgpu::Buffer,
    render_bundle: wgpu::RenderBundle,
}

impl StarfieldPass {
    const QUAD_VERTICES: [Vec3; 4] = [
        const_vec3!([-0.5, -0.5, 0.]),
        const_vec3!([-0.5, 0.5, 0.]),
        const_vec3!([0.5, -0.5, 0.]),
        const_vec3!([0.5, 0.5, 0.]),
    ];
    const QUAD_INDICES: [u16; 6] = [0, 2, 1, 1, 2, 3];

    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat, scene: &Scene) -> Self {
        let unix_milli = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        info!("Seeded starfield RNG with {}", unix_milli);
        let instances = star_instances(&scene.starfield, unix_milli);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Starfield Uniform Buffer"),
            size: size_of::<Uniforms>() as _,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Starfield Vertex Buffer"),
            contents: bytes_of(&Self::QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Starfield Index Buffer"),
            contents: bytes_of(&Self::QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Starfield Instance Buffer"),
            contents: cast_slice(instances.as_slice()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: None,
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(size_of::<Uniforms>() as _),
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(
                                size_of::<StarInstance>() as _
                            ),
                        },
                        count: None,
                    },
                ],
            });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: instance_buffer.as_entire_binding(),
                },
            ],
        });

        let render_pipeline = Self::make_render_pipeline(device, color_format, &bind_group_layout);

        let render_bundle = Self::make_render_bundle(
            device,
            color_format,
            &render_pipeline,
            &bind_group,
            &vertex_buffer,
            &index_buffer,
            scene.starfield.count,
        );

        Self {
            uniform_buffer,
            _vertex_buffer: vertex_buffer,
            _index_buffer: index_buffer,
            _instance_buffer: instance_buffer,
            render_bundle,
        }
    }

    fn make_render_pipeline(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let shader_module = device.create_shader_module(&wgpu::include_wgsl!("starfield.wgsl"));

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Starfield Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: size_of::<Vec3>() as _,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    }],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fs_main",
                targets: &[wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                }],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_TEXTURE_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
    }

    fn make_render_bundle(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        render_pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
        vertex_buffer: &wgpu::Buffer,
        index_buffer: &wgpu::Buffer,
        star_count: u32,
    ) -> wgpu::RenderBundle {
        let mut encoder =
            device.create_render_bundle_encoder(&wgpu::RenderBundleEncoderDescriptor {
                label: None,
                color_formats: &[color_format],
                depth_stencil: Some(wgpu::RenderBundleDepthStencil {
                    format: DEPTH_TEXTURE_FORMAT,
                    depth_read_only: false,
                    stencil_read_only: true,
                }),
                sample_count: 1,
                multiview: None,
            });

        encoder.set_pipeline(render_pipeline);
        encoder.set_bind_group(0, bind_group, &[]);
        encoder.set_vertex_buffer(0, vertex_buffer.slice(..));
        encoder.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        encoder.draw_indexed(0..(Self::QUAD_INDICES.len() as _), 0, 0..star_count);

        encoder.finish(&wgpu::RenderBundleDescriptor { label: None })
    }

    pub fn update(&self, queue: &wgpu::Queue, scene: &Scene, time: Time) {
        queue.write_buffer(&self.uniform_buffer, 0, bytes_of(&Uniforms::new(scene, time)));
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        rpass.execute_bundles(Some(&self.render_bundle).into_iter());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::STAR_COUNT;

    #[test]
    fn stars_fill_the_shell_between_radius_and_depth() {
        let starfield = Starfield {
            radius: 50.0,
            depth: 30.0,
            count: STAR_COUNT,
            star_size: 0.5,
            twinkle_speed: 0.5,
        };
        let stars = star_instances(&starfield, 1234);

        assert_eq!(stars.len(), STAR_COUNT as usize);
        for star in &stars {
            let distance = star.position.length();
            assert!(distance >= 50.0 - 1e-3);
            assert!(distance <= 80.0 + 1e-3);
            assert!(star.brightness >= 0.5 && star.brightness < 1.0);
        }
    }

    #[test]
    fn star_shell_is_deterministic_per_seed() {
        let starfield = Starfield {
            radius: 50.0,
            depth: 30.0,
            count: 16,
            star_size: 0.5,
            twinkle_speed: 0.5,
        };
        let a = star_instances(&starfield, 9);
        let b = star_instances(&starfield, 9);

        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.position, y.position);
            assert_eq!(x.phase, y.phase);
        }
    }
}
