//! Meshes, PBR materials and models.
//!
//! A [`Model`] owns its GPU meshes and materials, the [`SceneNode`] graph that places them,
//! and one instance buffer holding the world transform of every mesh node. Drawing walks a
//! precomputed list of [`DrawCall`]s, one per primitive.

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::data_structures::{
    instance::{Instance, InstanceRaw},
    pbr::{PbrTextureSet, TextureChannel},
    scene_graph::{DrawCall, SceneNode},
    texture::create_repeat_sampler,
};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 11]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

impl Mesh {
    pub fn new(device: &wgpu::Device, name: &str, vertices: &[ModelVertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", name)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: indices.len() as u32,
        }
    }
}

/// Scalar material inputs, mirrored by `MaterialParams` in `pbr.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialParams {
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub displacement_scale: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            emissive: [0.0; 3],
            emissive_intensity: 1.0,
            displacement_scale: 0.0,
            metalness: 0.0,
            roughness: 1.0,
            opacity: 1.0,
        }
    }
}

#[derive(Debug)]
pub struct Material {
    pub name: String,
    pub params: MaterialParams,
    pub textures: PbrTextureSet,
    pub params_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        textures: PbrTextureSet,
        params: MaterialParams,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} params")),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let sampler = create_repeat_sampler(device);

        let mut entries: Vec<wgpu::BindGroupEntry> = textures
            .iter()
            .map(|(channel, texture)| wgpu::BindGroupEntry {
                binding: channel.index() as u32,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: TextureChannel::ALL.len() as u32,
            resource: wgpu::BindingResource::Sampler(&sampler),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: TextureChannel::ALL.len() as u32 + 1,
            resource: params_buffer.as_entire_binding(),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &entries,
            label: Some(name),
        });

        Self {
            name: name.to_string(),
            params,
            textures,
            params_buffer,
            bind_group,
        }
    }
}

/// Meshes and materials placed by a scene graph.
#[derive(Debug)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub graph: SceneNode,
    instance_buffer: wgpu::Buffer,
    draws: Vec<DrawCall>,
}

impl Model {
    pub fn new(
        device: &wgpu::Device,
        meshes: Vec<Mesh>,
        materials: Vec<Material>,
        mut graph: SceneNode,
    ) -> Self {
        graph.update_world_transforms(&Instance::default());
        let (transforms, draws) = graph.draw_list();
        let instance_data = transforms.iter().map(Instance::to_raw).collect::<Vec<_>>();
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(&instance_data),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            meshes,
            materials,
            graph,
            instance_buffer,
            draws,
        }
    }

    /// Replaces every material of the model with `material` and rebinds all mesh nodes to it.
    pub fn bind_material(&mut self, material: Material) -> usize {
        self.materials = vec![material];
        let rebound = self.graph.assign_material(0);
        self.draws = self.graph.draw_list().1;
        rebound
    }

    /// Recomputes world transforms below `root` and uploads them.
    pub fn write_transforms(&mut self, root: &Instance, queue: &wgpu::Queue) {
        self.graph.update_world_transforms(root);
        let raw_instances: Vec<InstanceRaw> = self
            .graph
            .draw_list()
            .0
            .iter()
            .map(Instance::to_raw)
            .collect();
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&raw_instances),
        );
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    pub fn instance_buffer(&self) -> &wgpu::Buffer {
        &self.instance_buffer
    }
}

pub trait DrawModel<'a> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'a Mesh,
        material: &'a Material,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );

    fn draw_model(
        &mut self,
        model: &'a Model,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'b Mesh,
        material: &'b Material,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }

    fn draw_model(
        &mut self,
        model: &'b Model,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(1, model.instance_buffer.slice(..));
        for draw in &model.draws {
            let (Some(mesh), Some(material)) =
                (model.meshes.get(draw.mesh), model.materials.get(draw.material))
            else {
                log::warn!("Skipping draw with dangling mesh {} or material {}", draw.mesh, draw.material);
                continue;
            };
            self.draw_mesh_instanced(
                mesh,
                material,
                draw.instance..draw.instance + 1,
                camera_bind_group,
                light_bind_group,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_struct() {
        let desc = ModelVertex::desc();
        assert_eq!(
            desc.array_stride as usize,
            std::mem::size_of::<ModelVertex>()
        );
        assert_eq!(std::mem::size_of::<ModelVertex>(), 14 * 4);
    }

    #[test]
    fn material_params_fit_a_uniform_block() {
        // two vec4s on the shader side
        assert_eq!(std::mem::size_of::<MaterialParams>(), 32);
        let params = MaterialParams::default();
        assert_eq!(params.roughness, 1.0);
        assert_eq!(params.metalness, 0.0);
    }
}
