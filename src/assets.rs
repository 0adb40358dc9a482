use std::{
    env,
    path::PathBuf,
    sync::mpsc::{self, Receiver},
    thread,
};

use anyhow::{Context, Result};
use image::RgbaImage;
use log::debug;

/// Binary loading state for the one asset-bound object in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureState {
    Loading,
    Ready,
}

/// Resolves a static asset, honoring the deployment sub-path flag.
pub fn asset_path(file: &str) -> PathBuf {
    let mut path = PathBuf::new();
    if env::var_os("GITHUB_PAGES").is_some() {
        path.push("next3js");
    }
    path.push("assets");
    path.push(file);
    path
}

/// Decodes `path` on a background thread; the frame loop polls the
/// receiver and keeps the placeholder up until a result arrives.
pub fn load_texture(path: PathBuf) -> Receiver<Result<RgbaImage>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        debug!("Loading texture from {:?}", path);
        let result = image::open(&path)
            .with_context(|| format!("Failed to load texture {:?}", path))
            .map(|image| image.to_rgba8());
        // The receiver is gone if the window closed first.
        let _ = tx.send(result);
    });
    rx
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn asset_path_honors_the_deployment_flag() {
        env::remove_var("GITHUB_PAGES");
        assert_eq!(asset_path("avatar.png"), PathBuf::from("assets/avatar.png"));

        env::set_var("GITHUB_PAGES", "true");
        assert_eq!(
            asset_path("avatar.png"),
            PathBuf::from("next3js/assets/avatar.png")
        );
        env::remove_var("GITHUB_PAGES");
    }

    #[test]
    fn load_texture_delivers_a_decoded_image() {
        let dir = env::temp_dir().join("nightfall-asset-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("avatar.png");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let rx = load_texture(path);
        let image = rx.recv().unwrap().unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0), &image::Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn load_texture_reports_a_missing_file() {
        let rx = load_texture(PathBuf::from("no-such-texture.png"));
        assert!(rx.recv().unwrap().is_err());
    }
}
