use std::time::SystemTime;

use glam::{vec3, Vec3};
use log::info;
use rand::prelude::*;
use rand_pcg::Pcg64Mcg;

use crate::{animate, assets::TextureState};

pub const FLOATING_CUBE_COUNT: usize = 8;
pub const STAR_COUNT: u32 = 800;

#[derive(Debug, Clone)]
pub struct Scene {
    pub camera: Camera,
    pub torus: Torus,
    pub avatar_cube: AvatarCube,
    pub moon: Moon,
    pub floating_cubes: Vec<FloatingCube>,
    pub starfield: Starfield,
    pub labels: [Label; 2],
    pub lights: Lights,
    pub fog: Fog,
}

impl Scene {
    pub fn new(aspect_ratio: f32) -> Self {
        let unix_milli = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        info!("Seeded scene RNG with {}", unix_milli);
        Self::with_seed(aspect_ratio, unix_milli)
    }

    pub fn with_seed(aspect_ratio: f32, seed: u64) -> Self {
        let mut rng = Pcg64Mcg::seed_from_u64(seed);

        let mut camera = Camera {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            fov: 50.0,
            aspect_ratio,
            near: 0.1,
            far: 1000.0,
        };
        animate::scroll_camera(&mut camera, 0.0);

        let labels = [
            Label {
                text: "AYOBAMI ADEOYE",
                position: vec3(0.0, 8.0, -10.0),
                size: 3.0,
                color: Vec3::ONE,
                glow_color: vec3(1.0, 1.0, 0.533), // #ffff88
                emissive_intensity: 0.3,
            },
            Label {
                text: "SOFTWARE ENGINEER",
                position: vec3(-2.0, -2.0, 20.0),
                size: 0.8,
                color: vec3(1.0, 0.388, 0.278),      // #ff6347
                glow_color: vec3(1.0, 0.267, 0.267), // #ff4444
                emissive_intensity: 0.3,
            },
        ];

        let lights = Lights::compose(&labels);

        Self {
            camera,
            torus: Torus {
                position: Vec3::ZERO,
                rotation: Vec3::ZERO,
                major_radius: 3.0,
                minor_radius: 1.0,
                color: vec3(1.0, 0.388, 0.278),   // #ff6347
                emissive: vec3(1.0, 0.091, 0.267), // #ff1744
                emissive_intensity: 0.05,
            },
            avatar_cube: AvatarCube {
                position: vec3(2.0, 0.0, -5.0),
                rotation: Vec3::ZERO,
                size: 3.0,
                placeholder_color: vec3(0.29, 0.565, 0.886), // #4a90e2
                texture: TextureState::Loading,
            },
            moon: Moon {
                position: vec3(-10.0, 0.0, 30.0),
                rotation: Vec3::ZERO,
                radius: 3.0,
                color: Vec3::ONE,
                wobble_factor: 0.1,
                wobble_speed: 0.5,
            },
            floating_cubes: floating_cluster(&mut rng),
            starfield: Starfield {
                radius: 50.0,
                depth: 30.0,
                count: STAR_COUNT,
                star_size: 0.5,
                twinkle_speed: 0.5,
            },
            labels,
            lights,
            fog: Fog {
                color: vec3(0.102, 0.102, 0.18), // #1a1a2e
                near: 10.0,
                far: 40.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Torus {
    pub position: Vec3,
    pub rotation: Vec3,
    pub major_radius: f32,
    pub minor_radius: f32,
    pub color: Vec3,
    pub emissive: Vec3,
    pub emissive_intensity: f32,
}

#[derive(Debug, Clone)]
pub struct AvatarCube {
    pub position: Vec3,
    pub rotation: Vec3,
    pub size: f32,
    pub placeholder_color: Vec3,
    pub texture: TextureState,
}

#[derive(Debug, Clone, Copy)]
pub struct Moon {
    pub position: Vec3,
    pub rotation: Vec3,
    pub radius: f32,
    pub color: Vec3,
    pub wobble_factor: f32,
    pub wobble_speed: f32,
}

/// Construction-time state of one cluster member; never mutated after
/// scene assembly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatingObjectSpec {
    pub position: Vec3,
    pub scale: f32,
    pub color: Vec3,
    pub float_speed: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct FloatingCube {
    pub spec: FloatingObjectSpec,
    pub rotation: Vec3,
    pub bob_offset: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Starfield {
    pub radius: f32,
    pub depth: f32,
    pub count: u32,
    pub star_size: f32,
    pub twinkle_speed: f32,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub text: &'static str,
    pub position: Vec3,
    pub size: f32,
    pub color: Vec3,
    pub glow_color: Vec3,
    pub emissive_intensity: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

#[derive(Debug, Clone)]
pub struct Lights {
    pub ambient_intensity: f32,
    pub sun_direction: Vec3,
    pub sun_intensity: f32,
    pub points: Vec<PointLight>,
}

impl Lights {
    fn compose(labels: &[Label]) -> Self {
        let mut points = vec![PointLight {
            position: vec3(-5.0, 2.0, 5.0),
            color: vec3(0.29, 0.565, 0.886), // #4a90e2
            intensity: 0.5,
        }];

        // Three warm bulbs around each label so the glow reads on nearby
        // geometry as well as on the billboard itself.
        for label in labels {
            points.push(PointLight {
                position: label.position + vec3(0.0, 1.0, 2.0),
                color: label.glow_color,
                intensity: 2.0,
            });
            points.push(PointLight {
                position: label.position + vec3(-2.0, 0.0, 2.0),
                color: label.glow_color,
                intensity: 1.5,
            });
            points.push(PointLight {
                position: label.position + vec3(2.0, 0.0, 2.0),
                color: label.glow_color,
                intensity: 1.5,
            });
        }

        Self {
            ambient_intensity: 0.3,
            sun_direction: vec3(5.0, 5.0, 5.0).normalize(),
            sun_intensity: 0.8,
            points,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Fog {
    pub color: Vec3,
    pub near: f32,
    pub far: f32,
}

fn floating_cluster(rng: &mut Pcg64Mcg) -> Vec<FloatingCube> {
    (0..FLOATING_CUBE_COUNT)
        .map(|i| FloatingCube {
            spec: FloatingObjectSpec {
                position: vec3(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                ),
                scale: rng.gen_range(0.3..0.6),
                color: hsl(i as f32 * 45.0, 0.7, 0.6),
                float_speed: rng.gen_range(1.0..2.0),
            },
            rotation: Vec3::ZERO,
            bob_offset: 0.0,
        })
        .collect()
}

pub fn hsl(hue_deg: f32, saturation: f32, lightness: f32) -> Vec3 {
    let hue = hue_deg.rem_euclid(360.0) / 60.0;
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = chroma * (1.0 - (hue % 2.0 - 1.0).abs());
    let (r, g, b) = match hue as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    let m = lightness - chroma / 2.0;
    vec3(r + m, g + m, b + m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_scene_state() {
        let scene = Scene::with_seed(16.0 / 9.0, 7);

        assert_eq!(scene.camera.position, vec3(-3.0, 0.0, 30.0));
        assert_eq!(scene.camera.target, Vec3::ZERO);
        assert_eq!(scene.avatar_cube.texture, TextureState::Loading);
        assert_eq!(scene.starfield.count, STAR_COUNT);
        assert_eq!(scene.labels.len(), 2);
        // Accent light plus three bulbs per label.
        assert_eq!(scene.lights.points.len(), 7);
    }

    #[test]
    fn floating_cluster_has_eight_bounded_members() {
        let scene = Scene::with_seed(1.5, 42);

        assert_eq!(scene.floating_cubes.len(), FLOATING_CUBE_COUNT);
        for member in &scene.floating_cubes {
            assert!(member.spec.scale >= 0.3 && member.spec.scale < 0.6);
            assert!(member.spec.position.abs().max_element() < 10.0);
            assert!(member.spec.float_speed >= 1.0 && member.spec.float_speed < 2.0);
        }
    }

    #[test]
    fn same_seed_reproduces_the_cluster() {
        let a = Scene::with_seed(1.5, 99);
        let b = Scene::with_seed(1.5, 99);

        for (x, y) in a.floating_cubes.iter().zip(&b.floating_cubes) {
            assert_eq!(x.spec, y.spec);
        }
    }

    #[test]
    fn cluster_colors_step_around_the_hue_wheel() {
        let scene = Scene::with_seed(1.5, 3);
        let colors: Vec<_> = scene
            .floating_cubes
            .iter()
            .map(|member| member.spec.color)
            .collect();

        // hsl(0) is red-dominant, hsl(135) green-dominant, hsl(225) blue-dominant.
        assert!(colors[0].x > colors[0].y && colors[0].x > colors[0].z);
        assert!(colors[3].y > colors[3].x && colors[3].y > colors[3].z);
        assert!(colors[5].z > colors[5].x && colors[5].z > colors[5].y);
    }

    #[test]
    fn hsl_hits_the_primaries() {
        assert!(hsl(0.0, 1.0, 0.5).abs_diff_eq(vec3(1.0, 0.0, 0.0), 1e-6));
        assert!(hsl(120.0, 1.0, 0.5).abs_diff_eq(vec3(0.0, 1.0, 0.0), 1e-6));
        assert!(hsl(240.0, 1.0, 0.5).abs_diff_eq(vec3(0.0, 0.0, 1.0), 1e-6));
    }
}
