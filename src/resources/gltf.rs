//! glTF / GLB loading.
//!
//! Nodes become [`SceneNode`]s with their local transforms, every primitive becomes a
//! [`Mesh`], and glTF materials become PBR [`Material`]s using whichever channels the file
//! provides.

use std::io::{BufReader, Cursor};

use crate::{
    data_structures::{
        instance::Instance,
        model::{Material, MaterialParams, Mesh, Model, ModelVertex},
        pbr::{PbrTextureSet, TextureChannel},
        scene_graph::{Primitive, SceneNode},
        texture::Texture,
    },
    error::LoadError,
    resources::{
        mesh::{compute_tangents, ensure_normals},
        texture::{load_binary, load_texture, pbr_material_layout, relative_to},
    },
};

pub async fn load_model_gltf(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Model> {
    let gltf_bytes = load_binary(file_name).await?;
    let gltf_reader = BufReader::new(Cursor::new(gltf_bytes));
    let gltf = gltf::Gltf::from_reader(gltf_reader)?;

    // Load buffers
    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                buffer_data.push(gltf.blob.as_deref().map(Vec::from).unwrap_or_default());
            }
            gltf::buffer::Source::Uri(uri) => {
                buffer_data.push(load_binary(&relative_to(file_name, uri)).await?);
            }
        }
    }

    let layout = pbr_material_layout(device);
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let textures = load_material_textures(&material, &buffer_data, file_name, device, queue).await;
        let params = material_params(&material);
        let name = material.name().unwrap_or("gltf material").to_string();
        materials.push(Material::new(device, &name, textures, params, &layout));
    }
    // Primitives without a material use this one.
    let default_material = materials.len();
    materials.push(Material::new(
        device,
        "gltf default material",
        PbrTextureSet::neutral(device, queue),
        MaterialParams::default(),
        &layout,
    ));

    let mut meshes = Vec::new();
    let mut root = SceneNode::new(file_name);
    let scene = gltf.default_scene().or_else(|| gltf.scenes().next());
    for node in scene.iter().flat_map(|scene| scene.nodes()) {
        root.add_child(to_scene_node(
            node,
            &buffer_data,
            device,
            &mut meshes,
            default_material,
        ));
    }

    if meshes.is_empty() {
        return Err(LoadError::EmptyModel(file_name.to_string()).into());
    }
    Ok(Model::new(device, meshes, materials, root))
}

/// The scalar factors of a glTF material. Texture channels multiply with these.
fn material_params(material: &gltf::Material<'_>) -> MaterialParams {
    let pbr = material.pbr_metallic_roughness();
    MaterialParams {
        emissive: material.emissive_factor(),
        emissive_intensity: material.emissive_strength().unwrap_or(1.0),
        metalness: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        opacity: pbr.base_color_factor()[3],
        ..Default::default()
    }
}

fn to_scene_node(
    node: gltf::scene::Node,
    buffers: &[Vec<u8>],
    device: &wgpu::Device,
    meshes: &mut Vec<Mesh>,
    default_material: usize,
) -> SceneNode {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node {}", node.index()));
    let (position, rotation, scale) = node.transform().decomposed();
    let local = Instance {
        position: position.into(),
        rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        scale: scale.into(),
    };

    let mut primitives = Vec::new();
    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh.name().unwrap_or("unknown_mesh");
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

            let mut vertices: Vec<ModelVertex> = match reader.read_positions() {
                Some(positions) => positions
                    .map(|position| ModelVertex {
                        position,
                        ..Default::default()
                    })
                    .collect(),
                None => {
                    log::warn!("Primitive {} of {} has no positions", primitive.index(), mesh_name);
                    continue;
                }
            };
            if let Some(normals) = reader.read_normals() {
                vertices
                    .iter_mut()
                    .zip(normals)
                    .for_each(|(v, normal)| v.normal = normal);
            } else {
                ensure_normals(&mut vertices);
            }
            if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
                vertices
                    .iter_mut()
                    .zip(tex_coords)
                    .for_each(|(v, uv)| v.tex_coords = uv);
            }
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..vertices.len() as u32).collect(),
            };
            if let Some(tangents) = reader.read_tangents() {
                // glTF stores the bitangent sign in w
                vertices.iter_mut().zip(tangents).for_each(|(v, tangent)| {
                    let tangent: cgmath::Vector4<f32> = tangent.into();
                    let normal: cgmath::Vector3<f32> = v.normal.into();
                    v.tangent = tangent.truncate().into();
                    v.bitangent = (normal.cross(tangent.truncate()) * tangent.w).into();
                });
            } else {
                compute_tangents(&mut vertices, &indices);
            }

            primitives.push(Primitive {
                mesh: meshes.len(),
                material: primitive.material().index().unwrap_or(default_material),
            });
            meshes.push(Mesh::new(device, mesh_name, &vertices, &indices));
        }
    }

    let mut scene_node = SceneNode::new(name)
        .with_local(local)
        .with_primitives(primitives);
    for child in node.children() {
        scene_node.add_child(to_scene_node(child, buffers, device, meshes, default_material));
    }
    scene_node
}

async fn load_material_textures(
    material: &gltf::Material<'_>,
    buffers: &[Vec<u8>],
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> PbrTextureSet {
    let pbr = material.pbr_metallic_roughness();
    // glTF packs roughness into green and metalness into blue, the channels the shader reads.
    let metallic_roughness = pbr.metallic_roughness_texture().map(|t| t.texture());
    let sources = [
        (TextureChannel::BaseColor, pbr.base_color_texture().map(|t| t.texture())),
        (TextureChannel::Normal, material.normal_texture().map(|t| t.texture())),
        (TextureChannel::Metallic, metallic_roughness.clone()),
        (TextureChannel::Roughness, metallic_roughness),
        (TextureChannel::Occlusion, material.occlusion_texture().map(|t| t.texture())),
        (TextureChannel::Emission, material.emissive_texture().map(|t| t.texture())),
    ];

    let mut set = PbrTextureSet::neutral(device, queue);
    for (channel, texture) in sources {
        let Some(texture) = texture else { continue };
        match load_image(texture.source(), buffers, file_name, channel.is_linear(), device, queue).await {
            Ok(loaded) => set.set(channel, loaded),
            Err(e) => log::warn!(
                "Could not load the {} texture of {}: {}",
                channel.label(),
                file_name,
                e
            ),
        }
    }
    set
}

async fn load_image(
    image: gltf::Image<'_>,
    buffers: &[Vec<u8>],
    file_name: &str,
    linear: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    match image.source() {
        gltf::image::Source::View { view, mime_type } => {
            let buffer = buffers
                .get(view.buffer().index())
                .ok_or_else(|| anyhow::anyhow!("image view points to a missing buffer"))?;
            let bytes = buffer
                .get(view.offset()..view.offset() + view.length())
                .ok_or_else(|| anyhow::anyhow!("image view exceeds its buffer"))?;
            Texture::from_bytes(device, queue, bytes, file_name, mime_type.split('/').last(), linear)
        }
        gltf::image::Source::Uri { uri, mime_type } => {
            if uri.starts_with("data:") {
                anyhow::bail!("embedded data URIs are not supported, use a .glb file instead");
            }
            load_texture(
                &relative_to(file_name, uri),
                linear,
                device,
                queue,
                mime_type.and_then(|mt| mt.split('/').last()),
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATERIALS: &str = r#"{
        "asset": { "version": "2.0" },
        "extensionsUsed": ["KHR_materials_emissive_strength"],
        "materials": [
            {
                "pbrMetallicRoughness": {
                    "baseColorFactor": [1.0, 1.0, 1.0, 0.5],
                    "metallicFactor": 0.25,
                    "roughnessFactor": 0.75
                },
                "emissiveFactor": [1.0, 0.5, 0.0],
                "extensions": {
                    "KHR_materials_emissive_strength": { "emissiveStrength": 4.0 }
                }
            },
            {}
        ]
    }"#;

    #[test]
    fn factors_and_emissive_strength_are_read() {
        let gltf = gltf::Gltf::from_slice(MATERIALS.as_bytes()).unwrap();
        let params = material_params(&gltf.materials().next().unwrap());
        assert_eq!(params.emissive, [1.0, 0.5, 0.0]);
        assert_eq!(params.emissive_intensity, 4.0);
        assert_eq!(params.metalness, 0.25);
        assert_eq!(params.roughness, 0.75);
        assert_eq!(params.opacity, 0.5);
    }

    #[test]
    fn missing_factors_use_gltf_defaults() {
        let gltf = gltf::Gltf::from_slice(MATERIALS.as_bytes()).unwrap();
        let params = material_params(&gltf.materials().nth(1).unwrap());
        assert_eq!(params.emissive, [0.0; 3]);
        assert_eq!(params.emissive_intensity, 1.0);
        assert_eq!(params.metalness, 1.0);
        assert_eq!(params.roughness, 1.0);
        assert_eq!(params.opacity, 1.0);
    }
}
