//! Camera, projection and orbit controls.
//!
//! The [`OrbitController`] collects pointer input from winit window events and applies it
//! to a [`Camera`] once per frame in [`OrbitController::update`]: left drag orbits around
//! the target, right drag pans the target, the wheel zooms.

use std::f32::consts::PI;

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use wgpu::util::DeviceExt;
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use crate::config::CameraConfig;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

// Keeps the camera from flipping over the poles.
const POLAR_EPSILON: f32 = 0.000_001;

#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>, T: Into<Point3<f32>>>(position: P, target: T) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).magnitude()
    }
}

#[derive(Debug, Clone)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn fovy(&self) -> Rad<f32> {
        self.fovy
    }

    /// Applies a new lens, keeping the aspect ratio.
    pub fn configure(&mut self, config: &CameraConfig) {
        self.fovy = Deg(config.fovy).into();
        self.znear = config.znear;
        self.zfar = config.zfar;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Orbit controls around `camera.target`.
///
/// Input handlers only accumulate deltas; nothing touches the camera until `update`.
#[derive(Debug)]
pub struct OrbitController {
    rotate_speed: f32,
    zoom_speed: f32,
    pan_speed: f32,
    min_distance: f32,
    max_distance: f32,
    // azimuth and polar deltas in radians
    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
    pan_delta: (f32, f32),
    dragging: Option<MouseButton>,
    cursor: Option<PhysicalPosition<f64>>,
    viewport_height: f32,
}

impl OrbitController {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            pan_speed: config.pan_speed,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            pan_delta: (0.0, 0.0),
            dragging: None,
            cursor: None,
            viewport_height: 1.0,
        }
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    /// Rotate left by `angle` radians around the target.
    pub fn rotate_left(&mut self, angle: f32) {
        self.theta_delta -= angle;
    }

    /// Rotate up by `angle` radians around the target.
    pub fn rotate_up(&mut self, angle: f32) {
        self.phi_delta -= angle;
    }

    /// Moves the camera closer, `factor` > 1 zooms in.
    pub fn dolly_in(&mut self, factor: f32) {
        self.scale /= factor;
    }

    pub fn dolly_out(&mut self, factor: f32) {
        self.scale *= factor;
    }

    /// Pan in view space, in units of viewport heights.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan_delta.0 += dx;
        self.pan_delta.1 += dy;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => self.dragging = Some(*button),
                ElementState::Released => self.dragging = None,
            },
            WindowEvent::CursorMoved { position, .. } => {
                if let (Some(button), Some(last)) = (self.dragging, self.cursor) {
                    let dx = (position.x - last.x) as f32;
                    let dy = (position.y - last.y) as f32;
                    match button {
                        MouseButton::Left => {
                            self.rotate_left(2.0 * PI * dx / self.viewport_height * self.rotate_speed);
                            self.rotate_up(2.0 * PI * dy / self.viewport_height * self.rotate_speed);
                        }
                        MouseButton::Right | MouseButton::Middle => {
                            self.pan(
                                dx / self.viewport_height * self.pan_speed,
                                dy / self.viewport_height * self.pan_speed,
                            );
                        }
                        _ => (),
                    }
                }
                self.cursor = Some(*position);
            }
            WindowEvent::CursorLeft { .. } => {
                self.dragging = None;
                self.cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                let factor = (1.0f32 / 0.95).powf(self.zoom_speed * scroll.abs());
                if scroll > 0.0 {
                    self.dolly_in(factor);
                } else if scroll < 0.0 {
                    self.dolly_out(factor);
                }
            }
            _ => (),
        }
    }

    /// Applies the accumulated input to `camera` and clears it.
    pub fn update(&mut self, camera: &mut Camera, fovy: Rad<f32>) {
        let offset = camera.position - camera.target;
        let radius = offset.magnitude();

        if self.pan_delta != (0.0, 0.0) {
            // Pan so that one viewport height of mouse travel moves the target by the
            // visible height at the target's distance.
            let visible = 2.0 * radius * (fovy.0 / 2.0).tan();
            let forward = (-offset).normalize();
            let right = forward.cross(camera.up).normalize();
            let up = right.cross(forward);
            let pan = right * (-self.pan_delta.0 * visible) + up * (self.pan_delta.1 * visible);
            camera.target += pan;
        }

        // y-up spherical coordinates
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            PI / 2.0
        };

        theta += self.theta_delta;
        phi = (phi + self.phi_delta).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        let radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        let offset = Vector3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = camera.target + offset;

        self.theta_delta = 0.0;
        self.phi_delta = 0.0;
        self.scale = 1.0;
        self.pan_delta = (0.0, 0.0);
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, config: &CameraConfig, projection: &Projection) -> Self {
        let camera = Camera::new(config.position, config.target);
        let controller = OrbitController::new(config);

        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Moves the camera to the configured pose and resets the controls.
    pub fn configure(&mut self, config: &CameraConfig, viewport_height: u32) {
        self.camera = Camera::new(config.position, config.target);
        self.controller = OrbitController::new(config);
        self.controller.set_viewport_height(viewport_height);
    }

    /// Runs the orbit controller and uploads the new view projection.
    pub fn update(&mut self, projection: &Projection, queue: &wgpu::Queue) {
        self.controller.update(&mut self.camera, projection.fovy());
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Deg;

    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-3,
            "expected {expected}, got {actual}"
        );
    }

    fn controller() -> OrbitController {
        OrbitController::new(&CameraConfig::default())
    }

    fn fovy() -> Rad<f32> {
        Deg(75.0).into()
    }

    #[test]
    fn update_without_input_keeps_the_camera() {
        let mut camera = Camera::new((0.0, 20.0, 50.0), (0.0, 0.0, 0.0));
        controller().update(&mut camera, fovy());
        assert_close(camera.position.x, 0.0);
        assert_close(camera.position.y, 20.0);
        assert_close(camera.position.z, 50.0);
    }

    #[test]
    fn orbiting_preserves_distance() {
        let mut camera = Camera::new((0.0, 20.0, 50.0), (0.0, 0.0, 0.0));
        let distance = camera.distance();
        let mut controller = controller();
        controller.rotate_left(0.7);
        controller.rotate_up(-0.2);
        controller.update(&mut camera, fovy());
        assert_close(camera.distance(), distance);
        assert!(camera.position.x.abs() > 1.0);
    }

    #[test]
    fn polar_angle_is_clamped() {
        let mut camera = Camera::new((0.0, 20.0, 50.0), (0.0, 0.0, 0.0));
        let mut controller = controller();
        controller.rotate_up(10.0);
        controller.update(&mut camera, fovy());
        assert!(camera.position.y > 0.0);
        assert!(camera.position.y <= camera.distance());
        let view = camera.calc_matrix();
        assert!(view.x.x.is_finite());
    }

    #[test]
    fn zoom_scales_distance_within_bounds() {
        let config = CameraConfig {
            min_distance: 10.0,
            max_distance: 60.0,
            ..Default::default()
        };
        let mut controller = OrbitController::new(&config);
        let mut camera = Camera::new((0.0, 0.0, 40.0), (0.0, 0.0, 0.0));

        controller.dolly_in(2.0);
        controller.update(&mut camera, fovy());
        assert_close(camera.distance(), 20.0);

        controller.dolly_in(100.0);
        controller.update(&mut camera, fovy());
        assert_close(camera.distance(), 10.0);

        controller.dolly_out(100.0);
        controller.update(&mut camera, fovy());
        assert_close(camera.distance(), 60.0);
    }

    #[test]
    fn panning_moves_target_and_position_together() {
        let mut camera = Camera::new((0.0, 0.0, 50.0), (0.0, 0.0, 0.0));
        let mut controller = controller();
        controller.pan(0.5, 0.0);
        controller.update(&mut camera, fovy());
        assert!(camera.target.x < 0.0);
        assert_close(camera.distance(), 50.0);
        assert_close(camera.position.x, camera.target.x);
    }

    #[test]
    fn projection_tracks_aspect_on_resize() {
        let mut projection = Projection::new(800, 600, Deg(75.0), 0.1, 1000.0);
        assert_close(projection.aspect(), 800.0 / 600.0);
        projection.resize(1920, 1080);
        assert_close(projection.aspect(), 1920.0 / 1080.0);
        projection.resize(100, 0);
        assert!(projection.aspect().is_finite());
    }
}
