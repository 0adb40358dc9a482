use std::{mem::size_of, num::NonZeroU32};

use bytemuck::{bytes_of, Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3, Vec4};
use image::RgbaImage;

use crate::{
    assets::TextureState,
    entity::{Camera, Scene, FLOATING_CUBE_COUNT},
    time::Time,
};

use super::{
    geometry::{self, Mesh, Vertex},
    render_target::DEPTH_TEXTURE_FORMAT,
};

const MAX_POINT_LIGHTS: usize = 8;
const OBJECT_COUNT: usize = 3 + FLOATING_CUBE_COUNT;
const OBJECT_UNIFORM_STRIDE: u64 = 256;

pub trait CameraExt {
    fn proj_matrix(&self) -> Mat4;
    fn view_matrix(&self) -> Mat4;
}

impl CameraExt for Camera {
    fn proj_matrix(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov.to_radians(), self.aspect_ratio, self.near, self.far)
    }

    fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_lh(self.position, self.target, Vec3::Y)
    }
}

#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
#[repr(C)]
struct PointLightUniform {
    position: Vec4,
    color: Vec4, // w carries the intensity
}

#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
#[repr(C)]
struct FrameUniforms {
    view_proj: Mat4,
    camera_position: Vec4,
    ambient: Vec4,       // rgb, intensity
    sun_direction: Vec4, // xyz toward the light, w intensity
    fog_color: Vec4,
    fog_params: Vec4, // near, far, elapsed, point light count
    point_lights: [PointLightUniform; MAX_POINT_LIGHTS],
}

impl FrameUniforms {
    fn new(scene: &Scene, time: Time) -> Self {
        let lights = &scene.lights;

        let mut point_lights = [PointLightUniform::default(); MAX_POINT_LIGHTS];
        let count = lights.points.len().min(MAX_POINT_LIGHTS);
        for (uniform, light) in point_lights.iter_mut().zip(&lights.points) {
            uniform.position = light.position.extend(1.0);
            uniform.color = light.color.extend(light.intensity);
        }

        Self {
            view_proj: scene.camera.proj_matrix() * scene.camera.view_matrix(),
            camera_position: scene.camera.position.extend(1.0),
            ambient: Vec3::ONE.extend(lights.ambient_intensity),
            sun_direction: lights.sun_direction.extend(lights.sun_intensity),
            fog_color: scene.fog.color.extend(1.0),
            fog_params: Vec4::new(scene.fog.near, scene.fog.far, time.elapsed, count as f32),
            point_lights,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Pod, Zeroable)]
#[repr(C)]
struct ObjectUniforms {
    model: Mat4,
    color: Vec4,
    emissive: Vec4, // rgb, intensity
    params: Vec4,   // wobble factor, wobble speed, textured flag
}

fn model_matrix(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        scale,
        Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z),
        position,
    )
}

fn object_uniforms(scene: &Scene) -> [ObjectUniforms; OBJECT_COUNT] {
    let mut uniforms = [ObjectUniforms::default(); OBJECT_COUNT];

    let torus = &scene.torus;
    uniforms[0] = ObjectUniforms {
        model: model_matrix(torus.position, torus.rotation, Vec3::ONE),
        color: torus.color.extend(1.0),
        emissive: torus.emissive.extend(torus.emissive_intensity),
        params: Vec4::ZERO,
    };

    let cube = &scene.avatar_cube;
    uniforms[1] = ObjectUniforms {
        model: model_matrix(cube.position, cube.rotation, Vec3::splat(cube.size)),
        color: match cube.texture {
            TextureState::Loading => cube.placeholder_color.extend(1.0),
            TextureState::Ready => Vec4::ONE,
        },
        emissive: Vec4::ZERO,
        params: Vec4::new(
            0.0,
            0.0,
            match cube.texture {
                TextureState::Loading => 0.0,
                TextureState::Ready => 1.0,
            },
            0.0,
        ),
    };

    let moon = &scene.moon;
    uniforms[2] = ObjectUniforms {
        model: model_matrix(moon.position, moon.rotation, Vec3::splat(moon.radius)),
        color: moon.color.extend(1.0),
        emissive: Vec4::ZERO,
        params: Vec4::new(moon.wobble_factor, moon.wobble_speed, 0.0, 0.0),
    };

    for (uniform, member) in uniforms[3..].iter_mut().zip(&scene.floating_cubes) {
        let spec = &member.spec;
        uniform.model = model_matrix(
            spec.position + Vec3::Y * member.bob_offset,
            member.rotation,
            Vec3::splat(spec.scale),
        );
        uniform.color = spec.color.extend(1.0);
    }

    uniforms
}

pub struct MeshPass {
    frame_uniform_buffer: wgpu::Buffer,
    object_uniform_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    object_bind_group: wgpu::BindGroup,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    texture_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    render_pipeline: wgpu::RenderPipeline,
    torus: Mesh,
    cube: Mesh,
    sphere: Mesh,
}

impl MeshPass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        scene: &Scene,
    ) -> Self {
        let frame_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform Buffer"),
            size: size_of::<FrameUniforms>() as _,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let object_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Object Uniform Buffer"),
            size: OBJECT_COUNT as u64 * OBJECT_UNIFORM_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: None,
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(size_of::<FrameUniforms>() as _),
                    },
                    count: None,
                }],
            });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &frame_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_uniform_buffer.as_entire_binding(),
            }],
        });

        let object_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: None,
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(size_of::<ObjectUniforms>() as _),
                    },
                    count: None,
                }],
            });
        let object_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: None,
            layout: &object_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &object_uniform_buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(size_of::<ObjectUniforms>() as _),
                }),
            }],
        });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: None,
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Bilinear Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // A 1x1 stand-in until the avatar decode lands; the placeholder
        // color itself comes through the object uniforms.
        let placeholder = upload_texture(device, queue, "Placeholder Texture", 1, 1, &[255; 4]);
        let texture_bind_group = make_texture_bind_group(
            device,
            &texture_bind_group_layout,
            &placeholder,
            &sampler,
        );

        let render_pipeline = Self::make_render_pipeline(
            device,
            color_format,
            &[
                &frame_bind_group_layout,
                &object_bind_group_layout,
                &texture_bind_group_layout,
            ],
        );

        let torus_entity = &scene.torus;
        let torus = Mesh::upload(
            device,
            "Torus",
            &geometry::torus(torus_entity.major_radius, torus_entity.minor_radius, 16, 32),
        );
        let cube = Mesh::upload(device, "Cube", &geometry::unit_cube());
        let sphere = Mesh::upload(device, "Sphere", &geometry::uv_sphere(32, 32));

        Self {
            frame_uniform_buffer,
            object_uniform_buffer,
            frame_bind_group,
            object_bind_group,
            texture_bind_group_layout,
            texture_bind_group,
            sampler,
            render_pipeline,
            torus,
            cube,
            sphere,
        }
    }

    fn make_render_pipeline(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
    ) -> wgpu::RenderPipeline {
        let shader_module = device.create_shader_module(&wgpu::include_wgsl!("mesh.wgsl"));

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts,
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader_module,
                entry_point: "vs_main",
                buffers: &[Vertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader_module,
                entry_point: "fs_main",
                targets: &[color_format.into()],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_TEXTURE_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        })
    }

    pub fn install_avatar_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
    ) {
        let (width, height) = image.dimensions();
        let texture = upload_texture(device, queue, "Avatar Texture", width, height, image.as_raw());
        self.texture_bind_group = make_texture_bind_group(
            device,
            &self.texture_bind_group_layout,
            &texture,
            &self.sampler,
        );
    }

    pub fn update(&self, queue: &wgpu::Queue, scene: &Scene, time: Time) {
        queue.write_buffer(
            &self.frame_uniform_buffer,
            0,
            bytes_of(&FrameUniforms::new(scene, time)),
        );

        for (i, uniforms) in object_uniforms(scene).iter().enumerate() {
            queue.write_buffer(
                &self.object_uniform_buffer,
                i as u64 * OBJECT_UNIFORM_STRIDE,
                bytes_of(uniforms),
            );
        }
    }

    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>) {
        rpass.set_pipeline(&self.render_pipeline);
        rpass.set_bind_group(0, &self.frame_bind_group, &[]);
        rpass.set_bind_group(2, &self.texture_bind_group, &[]);

        let meshes: [&Mesh; OBJECT_COUNT] = {
            let mut meshes = [&self.cube; OBJECT_COUNT];
            meshes[0] = &self.torus;
            meshes[2] = &self.sphere;
            meshes
        };

        for (i, mesh) in meshes.iter().enumerate() {
            rpass.set_bind_group(
                1,
                &self.object_bind_group,
                &[i as u32 * OBJECT_UNIFORM_STRIDE as u32],
            );
            rpass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            rpass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: NonZeroU32::new(4 * width),
            rows_per_image: NonZeroU32::new(height),
        },
        size,
    );
    texture
}

fn make_texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &wgpu::Texture,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: None,
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture_view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;
    use crate::entity::Scene;

    #[test]
    fn placeholder_flag_follows_the_texture_state() {
        let mut scene = Scene::with_seed(1.5, 7);

        let loading = object_uniforms(&scene);
        assert_eq!(loading[1].params.z, 0.0);
        assert_eq!(loading[1].color, scene.avatar_cube.placeholder_color.extend(1.0));

        scene.avatar_cube.texture = TextureState::Ready;
        let ready = object_uniforms(&scene);
        assert_eq!(ready[1].params.z, 1.0);
        assert_eq!(ready[1].color, Vec4::ONE);
    }

    #[test]
    fn cluster_members_keep_their_spec_color_and_scale() {
        let scene = Scene::with_seed(1.5, 11);
        let uniforms = object_uniforms(&scene);

        for (uniform, member) in uniforms[3..].iter().zip(&scene.floating_cubes) {
            assert_eq!(uniform.color, member.spec.color.extend(1.0));
            let scale = uniform.model.transform_vector3(vec3(1.0, 0.0, 0.0)).length();
            assert!((scale - member.spec.scale).abs() < 1e-5);
        }
    }

    #[test]
    fn frame_uniforms_track_camera_fog_and_lights() {
        let scene = Scene::with_seed(1.5, 7);
        let uniforms = FrameUniforms::new(&scene, Time { delta: 0.016, elapsed: 2.0 });

        assert_eq!(uniforms.camera_position, scene.camera.position.extend(1.0));
        assert_eq!(uniforms.fog_params.x, scene.fog.near);
        assert_eq!(uniforms.fog_params.y, scene.fog.far);
        assert_eq!(uniforms.fog_params.z, 2.0);
        assert_eq!(uniforms.fog_params.w, scene.lights.points.len() as f32);
    }
}
