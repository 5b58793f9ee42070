use crate::{
    config::MaterialConfig,
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
    },
    pipelines::basic::{DepthTest, mk_render_pipeline},
    resources::texture::pbr_material_layout,
};

/// How a PBR pipeline blends and culls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PbrVariant {
    pub blend: wgpu::BlendState,
    pub cull_mode: Option<wgpu::Face>,
}

impl PbrVariant {
    /// Single sided, no blending. Used for the floor.
    pub fn opaque() -> Self {
        Self {
            blend: wgpu::BlendState::REPLACE,
            cull_mode: Some(wgpu::Face::Back),
        }
    }

    /// The variant the configured model material asks for.
    pub fn from_material(material: &MaterialConfig) -> Self {
        Self {
            blend: if material.transparent {
                wgpu::BlendState::ALPHA_BLENDING
            } else {
                wgpu::BlendState::REPLACE
            },
            cull_mode: if material.double_sided {
                None
            } else {
                Some(wgpu::Face::Back)
            },
        }
    }
}

pub fn mk_pbr_pipeline(
    device: &wgpu::Device,
    label: &str,
    config: &wgpu::SurfaceConfiguration,
    light_bind_group_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    variant: PbrVariant,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[
            Some(&pbr_material_layout(device)),
            Some(camera_bind_group_layout),
            Some(light_bind_group_layout),
        ],
        immediate_size: 0,
    });

    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("PBR Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("pbr.wgsl").into()),
    };

    mk_render_pipeline(
        device,
        label,
        &render_pipeline_layout,
        config.format,
        Some(variant.blend),
        variant.cull_mode,
        Some(DepthTest::standard()),
        &[ModelVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_material_is_blended_and_double_sided() {
        let variant = PbrVariant::from_material(&MaterialConfig::default());
        assert_eq!(variant.blend, wgpu::BlendState::ALPHA_BLENDING);
        assert_eq!(variant.cull_mode, None);
    }

    #[test]
    fn opaque_culls_back_faces() {
        let variant = PbrVariant::opaque();
        assert_eq!(variant.blend, wgpu::BlendState::REPLACE);
        assert_eq!(variant.cull_mode, Some(wgpu::Face::Back));

        let single_sided = MaterialConfig {
            transparent: false,
            double_sided: false,
            ..Default::default()
        };
        assert_eq!(PbrVariant::from_material(&single_sided), variant);
    }
}
