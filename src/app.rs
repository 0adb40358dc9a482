use std::sync::mpsc::{Receiver, TryRecvError};

use anyhow::Result;
use image::RgbaImage;
use log::{info, warn};
use winit::{dpi::PhysicalPosition, event::MouseScrollDelta, window::Window};

use crate::{
    animate,
    assets::{self, TextureState},
    entity::Scene,
    renderer::Renderer,
    scroll::ScrollController,
    time::FrameClock,
    window::HasSize,
};

const SCROLL_PAGES: f32 = 2.0;

pub struct App {
    window: Window,
    scene: Scene,
    clock: FrameClock,
    scroll: ScrollController,
    avatar_rx: Option<Receiver<Result<RgbaImage>>>,
    renderer: Renderer,
}

impl App {
    pub async fn new(window: Window) -> Result<Self> {
        let size = window.size();
        let scene = Scene::new(size.aspect_ratio());
        info!("{:#?}", &scene);

        let renderer = Renderer::new(&window, &scene).await?;

        let avatar_rx = assets::load_texture(assets::asset_path("ayobami.png"));

        Ok(Self {
            window,
            scene,
            clock: FrameClock::new(),
            scroll: ScrollController::new(SCROLL_PAGES, size.height as f32),
            avatar_rx: Some(avatar_rx),
            renderer,
        })
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    pub fn on_resize(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            // Minimized; keep the last surface.
            return;
        }

        self.scene.camera.aspect_ratio = size.width as f32 / size.height as f32;
        self.scroll.set_viewport_height(size.height as f32);
        self.renderer.resize(size.into());
    }

    pub fn on_mouse_scroll(&mut self, delta: MouseScrollDelta) {
        let dy = match delta {
            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => y as f32,
            MouseScrollDelta::LineDelta(_, y) => y * 60.0,
        };
        self.scroll.on_wheel_pixels(dy);
    }

    fn poll_avatar(&mut self) {
        let settled = match self.avatar_rx.as_ref().map(Receiver::try_recv) {
            Some(Ok(Ok(image))) => {
                info!(
                    "Avatar texture ready ({}x{})",
                    image.width(),
                    image.height()
                );
                self.renderer.install_avatar_texture(&image);
                self.scene.avatar_cube.texture = TextureState::Ready;
                true
            }
            Some(Ok(Err(e))) => {
                warn!("Avatar texture unavailable, keeping placeholder: {:#}", e);
                true
            }
            Some(Err(TryRecvError::Disconnected)) => true,
            Some(Err(TryRecvError::Empty)) | None => false,
        };

        if settled {
            self.avatar_rx = None;
        }
    }

    pub fn render(&mut self) {
        let time = self.clock.tick();

        self.poll_avatar();

        self.scroll.update(time.delta);
        animate::run(&mut self.scene, time);
        animate::scroll_camera(&mut self.scene.camera, self.scroll.offset());

        self.renderer.render(&self.scene, time);
    }
}
