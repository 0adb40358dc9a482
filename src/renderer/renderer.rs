use anyhow::{Context, Result};
use image::RgbaImage;

use crate::{
    entity::Scene,
    time::Time,
    window::{Size, Window},
};

use super::{
    label::LabelPass,
    mesh::MeshPass,
    render_target::{RenderTarget, DEPTH_TEXTURE_FORMAT},
    starfield::StarfieldPass,
};

pub struct Renderer {
    surface: wgpu::Surface,
    surface_format: wgpu::TextureFormat,
    device: wgpu::Device,
    queue: wgpu::Queue,
    depth_target: RenderTarget,
    clear_color: wgpu::Color,
    mesh_pass: MeshPass,
    starfield_pass: StarfieldPass,
    label_pass: LabelPass,
}

impl Renderer {
    pub async fn new(window: &impl Window, scene: &Scene) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::Backends::PRIMARY);
        let surface = unsafe { instance.create_surface(&window) };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No adapter found")?;

        let surface_format = surface
            .get_preferred_format(&adapter)
            .context("No preferred format found")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor::default(), None)
            .await?;

        let size = window.size();
        Self::configure_surface(&surface, &device, surface_format, size);

        let depth_target = RenderTarget::new(&device, "Depth Texture", DEPTH_TEXTURE_FORMAT, size);

        let mesh_pass = MeshPass::new(&device, &queue, surface_format, scene);
        let starfield_pass = StarfieldPass::new(&device, surface_format, scene);
        let label_pass = LabelPass::new(&device, surface_format, scene);

        // The night backdrop doubles as the fog color.
        let fog = scene.fog.color;
        let clear_color = wgpu::Color {
            r: fog.x as f64,
            g: fog.y as f64,
            b: fog.z as f64,
            a: 1.0,
        };

        Ok(Self {
            surface,
            surface_format,
            device,
            queue,
            depth_target,
            clear_color,
            mesh_pass,
            starfield_pass,
            label_pass,
        })
    }

    fn configure_surface(
        surface: &wgpu::Surface,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: Size,
    ) {
        surface.configure(
            device,
            &wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: size.width,
                height: size.height,
                present_mode: wgpu::PresentMode::Fifo,
            },
        )
    }

    pub fn resize(&mut self, size: Size) {
        Self::configure_surface(&self.surface, &self.device, self.surface_format, size);
        self.depth_target =
            RenderTarget::new(&self.device, "Depth Texture", DEPTH_TEXTURE_FORMAT, size);
    }

    pub fn install_avatar_texture(&mut self, image: &RgbaImage) {
        self.mesh_pass
            .install_avatar_texture(&self.device, &self.queue, image);
    }

    pub fn render(&mut self, scene: &Scene, time: Time) {
        self.mesh_pass.update(&self.queue, scene, time);
        self.starfield_pass.update(&self.queue, scene, time);
        self.label_pass.update(&self.queue, scene, time);

        let surface_texture = self
            .surface
            .get_current_texture()
            .expect("Failed to get next surface texture");

        let surface_texture_view = surface_texture.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Command Encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: true,
                    },
                }],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_target.texture_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: false,
                    }),
                    stencil_ops: None,
                }),
            });
            self.mesh_pass.draw(&mut rpass);
            self.starfield_pass.draw(&mut rpass);
            self.label_pass.draw(&mut rpass);
        }

        self.queue.submit(Some(encoder.finish()));

        surface_texture.present();
    }
}
