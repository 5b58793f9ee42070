//! Render pipelines and their WGSL shaders.
//!
//! - `pbr`: metallic/roughness shading with displacement and normal mapping
//! - `background`: the full-screen backdrop
//! - `light`: light uniform and bind group
//! - `basic`: the shared pipeline builder

pub mod background;
pub mod basic;
pub mod light;
pub mod pbr;

use crate::config::MaterialConfig;

#[derive(Debug)]
pub struct Pipelines {
    /// Single sided, replace blending.
    pub opaque: wgpu::RenderPipeline,
    /// Configured by the model material, double sided and alpha blended by default.
    pub transparent: wgpu::RenderPipeline,
    pub background: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        light_bind_group_layout: &wgpu::BindGroupLayout,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        material: &MaterialConfig,
    ) -> Self {
        let opaque = pbr::mk_pbr_pipeline(
            device,
            "Opaque Pipeline",
            config,
            light_bind_group_layout,
            camera_bind_group_layout,
            pbr::PbrVariant::opaque(),
        );
        let transparent = pbr::mk_pbr_pipeline(
            device,
            "Transparent Pipeline",
            config,
            light_bind_group_layout,
            camera_bind_group_layout,
            pbr::PbrVariant::from_material(material),
        );
        let background = background::mk_background_pipeline(device, config);
        Self {
            opaque,
            transparent,
            background,
        }
    }
}
