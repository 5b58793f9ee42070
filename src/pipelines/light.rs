use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::config::{LightConfig, hex_to_linear};

/// Ambient and directional light, bound at group 2 of the PBR pipeline.
#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// Ambient colour, pre-multiplied by its intensity.
    ambient: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
    /// Unit vector pointing from the surface toward the light.
    direction: [f32; 3],
    _padding2: u32,
    /// Directional colour, pre-multiplied by its intensity.
    color: [f32; 3],
    _padding3: u32,
}

impl LightUniform {
    pub fn new(config: &LightConfig) -> Self {
        let scale = |c: [f32; 3], s: f32| [c[0] * s, c[1] * s, c[2] * s];
        // A light placed at the origin has no direction; fall back to straight down.
        let position = Vector3::from(config.directional_position);
        let direction = if position.magnitude2() > 0.0 {
            position.normalize()
        } else {
            Vector3::unit_y()
        };
        Self {
            ambient: scale(hex_to_linear(config.ambient_colour), config.ambient_intensity),
            _padding: 0,
            direction: direction.into(),
            _padding2: 0,
            color: scale(
                hex_to_linear(config.directional_colour),
                config.directional_intensity,
            ),
            _padding3: 0,
        }
    }

    pub fn ambient(&self) -> [f32; 3] {
        self.ambient
    }

    pub fn direction(&self) -> [f32; 3] {
        self.direction
    }

    pub fn color(&self) -> [f32; 3] {
        self.color
    }
}

impl LightResources {
    pub fn new(uniform: LightUniform, device: &wgpu::Device) -> Self {
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Replaces the light setup, e.g. after a new scene config was applied.
    pub fn configure(&mut self, config: &LightConfig, queue: &wgpu::Queue) {
        self.uniform = LightUniform::new(config);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_three_vec4s() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 48);
    }

    #[test]
    fn intensities_scale_the_colours() {
        let uniform = LightUniform::new(&LightConfig::default());
        let grey = hex_to_linear(0x404040);
        assert_eq!(uniform.ambient(), [grey[0] * 2.0, grey[1] * 2.0, grey[2] * 2.0]);
        assert_eq!(uniform.color(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn direction_points_at_the_light() {
        let uniform = LightUniform::new(&LightConfig::default());
        let d = Vector3::from(uniform.direction());
        assert!((d.magnitude() - 1.0).abs() < 1e-6);
        assert!((d.x - d.y).abs() < 1e-6 && (d.y - d.z).abs() < 1e-6 && d.x > 0.0);

        let config = LightConfig {
            directional_position: [0.0; 3],
            ..Default::default()
        };
        assert_eq!(LightUniform::new(&config).direction(), [0.0, 1.0, 0.0]);
    }
}
