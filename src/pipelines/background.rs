use crate::{
    data_structures::texture::{Texture, create_clamp_sampler},
    pipelines::basic::{DepthTest, mk_render_pipeline},
    resources::texture::background_layout,
};

/// Draws one full-screen triangle per backdrop; no vertex buffers.
pub fn mk_background_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Background Pipeline Layout"),
        bind_group_layouts: &[Some(&background_layout(device))],
        immediate_size: 0,
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Background Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("background.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        "Background Pipeline",
        &layout,
        config.format,
        Some(wgpu::BlendState::REPLACE),
        None,
        Some(DepthTest::backdrop()),
        &[],
        shader,
    )
}

pub fn mk_background_bind_group(device: &wgpu::Device, texture: &Texture) -> wgpu::BindGroup {
    let sampler = create_clamp_sampler(device);
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &background_layout(device),
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
        label: Some("background_bind_group"),
    })
}
