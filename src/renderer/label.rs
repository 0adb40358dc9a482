use std::mem::size_of;

use bytemuck::{bytes_of, cast_slice, Pod, Zeroable};
use glam::{const_vec3, vec2, Mat4, Vec2, Vec3, Vec4};
use wgpu::util::DeviceExt;

use crate::{
    entity::{Label, Scene},
    time::Time,
};

use super::{mesh::CameraExt, render_target::DEPTH_TEXTURE_FORMAT};

const LABEL_COUNT: usize = 2;

#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
#[repr(C)]
struct Uniforms {
    view: Mat4,
    proj: Mat4,
}

#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
#[repr(C)]
struct LabelInstance {
    position: Vec4,
    half_size: Vec4,
    color: Vec4,
    glow: Vec4, // rgb, pulsing emissive intensity
}

/// Billboard extents derived from the label's font size and glyph count.
fn label_half_size(label: &Label) -> Vec2 {
    vec2(
        label.size * label.text.len() as f32 * 0.3,
        label.size * 0.6,
    )
}

fn label_instances(scene: &Scene) -> [LabelInstance; LABEL_COUNT] {
    let mut instances = [LabelInstance::default(); LABEL_COUNT];
    for (instance, label) in instances.iter_mut().zip(&scene.labels) {
        instance.position = label.position.extend(1.0);
        instance.half_size = label_half_size(label).extend(0.0).extend(0.0);
        instance.color = label.color.extend(1.0);
        instance.glow = label.glow_color.extend(label.emissive_intensity);
    }
    instances
}

pub struct LabelPass {
    uniform_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    render_pipeline: wgpu::RenderPipeline,
}

impl LabelPass {
    const QUAD_VERTICES: [Vec3; 4] = [
        const_vec3!([-1., -1., 0.]),
        const_vec3!([-1., 1., 0.]),
        const_vec3!([1., -1., 0.]),
        const_vec3!([1., 1., 0.]),
    ];
    const QUAD_INDICES: [u16; 6] = [0, 2, 1, 1, 2, 3];

    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat, scene: &Scene) -> Self {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Label Uniform Buffer"),
            size: size_of::<Uniforms>() as _,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Label Instance Buffer"),
            contents: cast_slice(&label_instances(scene)),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Label Vertex Buffer"),
            contents: bytes_of(&Self::QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Label Index Buffer"),
            contents: bytes_of(&Self::QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
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
                                size_of::<LabelInstance>() as _
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

        Self {
            uniform_buffer,
            instance_buffer,
            vertex_buffer,
            index_buffer,
            bind_group,
            render_pipeline,
        }
    }

    fn make_render_pipeline(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> wgpu::RenderPipeline {
        let shader_module = device.create_shader_module(&wgpu::include_wgsl!("label.wgsl"));

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Label Render Pipeline"),
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

    pub fn update(&self, queue: &wgpu::Queue, scene: &Scene, _time: Time) {
        let uniforms = Uniforms {
            view: scene.camera.view_matrix(),
            proj: scene.camera.proj_matrix(),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytes_of(&uniforms));
        queue.write_buffer(&self.instance_buffer, 0, cast_slice(&label_instances(scene)));
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        rpass.set_pipeline(&self.render_pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..(Self::QUAD_INDICES.len() as _), 0, 0..LABEL_COUNT as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{animate, entity::Scene, time::Time};

    #[test]
    fn instances_carry_the_pulsing_emissive() {
        let mut scene = Scene::with_seed(1.5, 7);
        animate::run(&mut scene, Time { delta: 0.016, elapsed: 0.4 });

        let instances = label_instances(&scene);
        for (instance, label) in instances.iter().zip(&scene.labels) {
            assert_eq!(instance.glow.w, label.emissive_intensity);
            assert_eq!(instance.position, label.position.extend(1.0));
        }
    }

    #[test]
    fn wider_text_gets_a_wider_billboard() {
        let scene = Scene::with_seed(1.5, 7);
        let name = label_half_size(&scene.labels[0]);
        let role = label_half_size(&scene.labels[1]);

        assert!(name.x > role.x);
        assert!(name.y > role.y);
    }
}
