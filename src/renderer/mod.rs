mod geometry;
mod label;
mod mesh;
mod render_target;
mod renderer;
mod starfield;

pub use self::renderer::Renderer;
