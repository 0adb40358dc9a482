use glam::{vec3, Vec3};

use crate::{
    entity::{Camera, Scene},
    time::Time,
};

pub type Animator = fn(&mut Scene, Time);

/// One update function per object, walked in order every frame. Each entry
/// mutates only the object it owns; the camera is written by
/// [`scroll_camera`] alone.
pub const ANIMATORS: &[Animator] = &[torus, avatar_cube, moon, floating_cluster, labels];

pub fn run(scene: &mut Scene, time: Time) {
    for animator in ANIMATORS {
        animator(scene, time);
    }
}

/// Derives the camera pose from the normalized scroll offset.
pub fn scroll_camera(camera: &mut Camera, offset: f32) {
    camera.position = vec3(-3.0 + offset * 10.0, offset * 5.0, 30.0 - offset * 20.0);
    camera.target = Vec3::ZERO;
}

fn torus(scene: &mut Scene, time: Time) {
    let torus = &mut scene.torus;
    torus.rotation.x += time.delta * 0.5;
    torus.rotation.y += time.delta * 0.3;
    torus.position.y = (time.elapsed * 0.5).sin() * 0.3;
}

// The cube and moon step by a fixed amount per displayed frame, not per
// second; their angular speed tracks the refresh rate.
fn avatar_cube(scene: &mut Scene, _time: Time) {
    scene.avatar_cube.rotation.y += 0.01;
    scene.avatar_cube.rotation.z += 0.01;
}

fn moon(scene: &mut Scene, _time: Time) {
    let moon = &mut scene.moon;
    moon.rotation.x += 0.005;
    moon.rotation.y += 0.075;
    moon.rotation.z += 0.05;
}

fn floating_cluster(scene: &mut Scene, time: Time) {
    for member in &mut scene.floating_cubes {
        let speed = member.spec.float_speed;
        member.bob_offset = (time.elapsed * speed).sin() * 0.3;
        member.rotation.x = (time.elapsed * speed * 0.5).sin() * 0.3;
        member.rotation.z = (time.elapsed * speed * 0.4).cos() * 0.3;
    }
}

fn labels(scene: &mut Scene, time: Time) {
    let pulse = 1.0 + (time.elapsed * 2.0).sin() * 0.1;
    for label in &mut scene.labels {
        label.emissive_intensity = pulse * 0.3;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_scene() -> Scene {
        Scene::with_seed(16.0 / 9.0, 7)
    }

    #[test]
    fn camera_follows_the_scroll_offset() {
        let mut camera = test_scene().camera;

        scroll_camera(&mut camera, 0.0);
        assert_eq!(camera.position, vec3(-3.0, 0.0, 30.0));
        assert_eq!(camera.target, Vec3::ZERO);

        scroll_camera(&mut camera, 0.5);
        assert_eq!(camera.position, vec3(2.0, 2.5, 20.0));
        assert_eq!(camera.target, Vec3::ZERO);

        scroll_camera(&mut camera, 1.0);
        assert_eq!(camera.position, vec3(7.0, 5.0, 10.0));
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn torus_spin_strictly_increases() {
        let mut scene = test_scene();
        let mut elapsed = 0.0;
        let mut last = scene.torus.rotation;

        for delta in [0.016, 0.033, 0.008, 0.1, 0.016] {
            elapsed += delta;
            torus(&mut scene, Time { delta, elapsed });
            assert!(scene.torus.rotation.x > last.x);
            assert!(scene.torus.rotation.y > last.y);
            last = scene.torus.rotation;
        }
    }

    #[test]
    fn torus_bob_is_bounded_and_periodic() {
        let mut scene = test_scene();
        let period = 4.0 * std::f32::consts::PI;

        for i in 0..200 {
            let elapsed = i as f32 * 0.1;
            torus(&mut scene, Time { delta: 0.016, elapsed });
            assert!(scene.torus.position.y.abs() <= 0.3 + 1e-6);
        }

        torus(&mut scene, Time { delta: 0.016, elapsed: 1.3 });
        let first = scene.torus.position.y;
        torus(&mut scene, Time { delta: 0.016, elapsed: 1.3 + period });
        assert!((scene.torus.position.y - first).abs() < 1e-3);
    }

    #[test]
    fn cube_and_moon_spin_is_monotonic_for_any_frame_delta() {
        let mut scene = test_scene();
        let mut last_cube = scene.avatar_cube.rotation;
        let mut last_moon = scene.moon.rotation;

        for delta in [0.002, 0.5, 0.016, 0.033, 0.0] {
            let time = Time { delta, elapsed: 0.0 };
            avatar_cube(&mut scene, time);
            moon(&mut scene, time);

            assert!(scene.avatar_cube.rotation.y > last_cube.y);
            assert!(scene.avatar_cube.rotation.z > last_cube.z);
            assert!(scene.moon.rotation.x > last_moon.x);
            assert!(scene.moon.rotation.y > last_moon.y);
            assert!(scene.moon.rotation.z > last_moon.z);
            last_cube = scene.avatar_cube.rotation;
            last_moon = scene.moon.rotation;
        }
    }

    #[test]
    fn cluster_bob_stays_within_float_intensity() {
        let mut scene = test_scene();

        for i in 0..100 {
            let elapsed = i as f32 * 0.25;
            floating_cluster(&mut scene, Time { delta: 0.016, elapsed });
            for member in &scene.floating_cubes {
                assert!(member.bob_offset.abs() <= 0.3 + 1e-6);
                assert!(member.rotation.x.abs() <= 0.3 + 1e-6);
            }
        }
    }

    #[test]
    fn cluster_base_spec_is_never_mutated() {
        let mut scene = test_scene();
        let specs: Vec<_> = scene
            .floating_cubes
            .iter()
            .map(|member| member.spec)
            .collect();

        for i in 0..50 {
            run(&mut scene, Time { delta: 0.016, elapsed: i as f32 * 0.016 });
        }

        for (member, spec) in scene.floating_cubes.iter().zip(&specs) {
            assert_eq!(member.spec, *spec);
        }
    }

    #[test]
    fn label_pulse_stays_near_its_base_intensity() {
        let mut scene = test_scene();

        for i in 0..100 {
            let elapsed = i as f32 * 0.1;
            labels(&mut scene, Time { delta: 0.016, elapsed });
            for label in &scene.labels {
                assert!(label.emissive_intensity >= 0.27 - 1e-6);
                assert!(label.emissive_intensity <= 0.33 + 1e-6);
            }
        }
    }

    #[test]
    fn only_the_camera_depends_on_the_offset() {
        let mut near = test_scene();
        let mut far = near.clone();
        let time = Time { delta: 1.0 / 60.0, elapsed: 0.5 };

        run(&mut near, time);
        scroll_camera(&mut near.camera, 0.0);
        run(&mut far, time);
        scroll_camera(&mut far.camera, 1.0);

        assert_ne!(near.camera.position, far.camera.position);
        assert_eq!(near.torus.rotation, far.torus.rotation);
        assert_eq!(near.avatar_cube.rotation, far.avatar_cube.rotation);
        assert_eq!(near.moon.rotation, far.moon.rotation);
        for (a, b) in near.floating_cubes.iter().zip(&far.floating_cubes) {
            assert_eq!(a.rotation, b.rotation);
            assert_eq!(a.bob_offset, b.bob_offset);
        }
    }
}
