use std::f32::consts::FRAC_PI_2;

use render_ngin::camera::{Camera, PlanarCamera};
use render_ngin::{Point2, Point3, Rad, Vector2, Vector3};

fn assert_close(label: &str, actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "{label}: {actual} should be within 1e-4 of {expected}"
    );
}

fn planar_round_trip(camera: &mut PlanarCamera, world: Point2<f32>) {
    let canvas = camera.project(world);
    let back = camera.unproject(canvas);
    assert_close("x", back.x, world.x);
    assert_close("y", back.y, world.y);
}

fn spatial_round_trip(camera: &mut Camera, world: Point3<f32>) {
    let depth = camera.view_depth(world);
    let canvas = camera.project(world);
    let back = camera.unproject(canvas, depth);
    assert_close("x", back.x, world.x);
    assert_close("y", back.y, world.y);
    assert_close("z", back.z, world.z);
}

#[test]
fn should_round_trip_planar_projection_for_default_pose() {
    let mut camera = PlanarCamera::new(800, 600, 10.0);
    planar_round_trip(&mut camera, Point2::new(0.3, -0.2));
    planar_round_trip(&mut camera, Point2::new(-4.0, 2.5));
}

#[test]
fn should_round_trip_planar_projection_after_rotation_and_zoom() {
    let mut camera = PlanarCamera::new(800, 600, 10.0);
    camera.set_pose(Vector2::new(2.0, -1.0), Rad(FRAC_PI_2));
    planar_round_trip(&mut camera, Point2::new(0.7, 0.1));

    camera.set_zoom(4.0);
    planar_round_trip(&mut camera, Point2::new(0.7, 0.1));

    // incremental operators keep the inverse exact too
    camera.translate(Vector2::new(0.5, 0.25));
    camera.rotate(Rad(0.3));
    planar_round_trip(&mut camera, Point2::new(-1.2, 0.8));
}

#[test]
fn should_map_canvas_deltas_to_world_deltas_without_drift() {
    let mut camera = PlanarCamera::new(800, 600, 10.0);
    camera.set_pose(Vector2::new(1.0, 1.0), Rad(0.5));
    camera.set_zoom(2.0);

    let a = Point2::new(0.0, 0.0);
    let b = Point2::new(0.6, -0.4);
    let pixel_a = camera.project(a);
    let pixel_b = camera.project(b);
    let delta = camera.unproject_delta(Vector2::new(pixel_b.x - pixel_a.x, pixel_b.y - pixel_a.y));
    assert_close("dx", delta.x, b.x - a.x);
    assert_close("dy", delta.y, b.y - a.y);
}

#[test]
fn should_round_trip_spatial_projection_for_default_pose() {
    let mut camera = Camera::perspective(800, 600, 45.0, 0.1, 500.0);
    camera.look_at(
        Point3::new(0.0, 5.0, 10.0),
        Point3::new(0.0, 0.0, 0.0),
        Vector3::unit_y(),
    );
    spatial_round_trip(&mut camera, Point3::new(1.0, 2.0, -3.0));
    spatial_round_trip(&mut camera, Point3::new(-2.5, 0.5, 1.0));
}

#[test]
fn should_round_trip_spatial_projection_after_rotation_and_zoom() {
    let mut camera = Camera::perspective(800, 600, 45.0, 0.1, 500.0);
    camera.look_at(
        Point3::new(0.0, 0.0, 10.0),
        Point3::new(0.0, 0.0, 0.0),
        Vector3::unit_y(),
    );
    camera.rotate(Vector3::unit_y(), Rad(FRAC_PI_2));
    spatial_round_trip(&mut camera, Point3::new(-8.0, 1.0, 0.5));

    camera.set_zoom(4.0);
    spatial_round_trip(&mut camera, Point3::new(-8.0, 1.0, 0.5));
}

#[test]
fn should_round_trip_orthographic_projection() {
    let mut camera = Camera::orthographic(800, 600, 45.0, 0.1, 100.0);
    camera.look_at(
        Point3::new(3.0, 3.0, 3.0),
        Point3::new(0.0, 0.0, 0.0),
        Vector3::unit_y(),
    );
    spatial_round_trip(&mut camera, Point3::new(0.2, -0.1, 0.3));

    camera.set_zoom(4.0);
    spatial_round_trip(&mut camera, Point3::new(0.1, 0.05, -0.2));
}

#[test]
fn should_recenter_after_resize() {
    let mut camera = PlanarCamera::new(800, 600, 10.0);
    let canvas = camera.project(Point2::new(0.0, 0.0));
    assert_close("center x", canvas.x, 400.0);
    assert_close("center y", canvas.y, 300.0);

    camera.resize(400, 400);
    let canvas = camera.project(Point2::new(0.0, 0.0));
    assert_close("center x", canvas.x, 200.0);
    assert_close("center y", canvas.y, 200.0);
}
