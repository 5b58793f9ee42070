use std::io::{BufReader, Cursor};

use crate::{
    data_structures::{
        model::{Material, MaterialParams, Mesh, Model, ModelVertex},
        pbr::{PbrTextureSet, TextureChannel},
        scene_graph::{Primitive, SceneNode},
    },
    error::LoadError,
    resources::{
        mesh::{compute_tangents, ensure_normals},
        texture::{load_string, load_texture, pbr_material_layout, relative_to},
    },
};

/// Loads a Wavefront obj file with its mtl library.
///
/// Every obj object becomes one child node of the returned graph. A missing mtl file is not
/// fatal, the meshes fall back to a neutral material.
pub async fn load_model_obj(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Model> {
    let obj_text = load_string(file_name).await?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| async move {
            match load_string(&relative_to(file_name, &p)).await {
                Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                Err(e) => {
                    log::warn!("Material library {p} of {file_name} not found: {e}");
                    Err(tobj::LoadError::OpenFileFailed)
                }
            }
        },
    )
    .await?;

    let layout = pbr_material_layout(device);
    let mut materials = Vec::new();
    for m in obj_materials.unwrap_or_default() {
        let mut textures = PbrTextureSet::neutral(device, queue);
        let maps = [
            (TextureChannel::BaseColor, &m.diffuse_texture),
            (TextureChannel::Normal, &m.normal_texture),
        ];
        for (channel, path) in maps {
            let Some(path) = path else { continue };
            match load_texture(
                &relative_to(file_name, path),
                channel.is_linear(),
                device,
                queue,
                None,
            )
            .await
            {
                Ok(texture) => textures.set(channel, texture),
                Err(e) => log::warn!("Could not load {path} referenced by {file_name}: {e}"),
            }
        }
        let params = MaterialParams {
            opacity: m.dissolve.unwrap_or(1.0),
            ..Default::default()
        };
        materials.push(Material::new(device, &m.name, textures, params, &layout));
    }
    let default_material = materials.len();
    materials.push(Material::new(
        device,
        "obj default material",
        PbrTextureSet::neutral(device, queue),
        MaterialParams::default(),
        &layout,
    ));

    let mut root = SceneNode::new(file_name);
    let mut meshes = Vec::new();
    for m in &models {
        let mesh = &m.mesh;
        let mut vertices = (0..mesh.positions.len() / 3)
            .map(|i| ModelVertex {
                position: [
                    mesh.positions[i * 3],
                    mesh.positions[i * 3 + 1],
                    mesh.positions[i * 3 + 2],
                ],
                // obj uvs start at the bottom left, wgpu samples from the top left
                tex_coords: match mesh.texcoords.get(i * 2..i * 2 + 2) {
                    Some(uv) => [uv[0], 1.0 - uv[1]],
                    None => [0.0, 0.0],
                },
                normal: match mesh.normals.get(i * 3..i * 3 + 3) {
                    Some(n) => [n[0], n[1], n[2]],
                    None => [0.0, 0.0, 0.0],
                },
                ..Default::default()
            })
            .collect::<Vec<_>>();
        if vertices.is_empty() {
            log::warn!("Object {} in {} has no vertices", m.name, file_name);
            continue;
        }
        ensure_normals(&mut vertices);
        compute_tangents(&mut vertices, &mesh.indices);

        let primitive = Primitive {
            mesh: meshes.len(),
            material: mesh
                .material_id
                .filter(|id| *id < default_material)
                .unwrap_or(default_material),
        };
        meshes.push(Mesh::new(device, &m.name, &vertices, &mesh.indices));
        root.add_child(SceneNode::new(&m.name).with_primitives(vec![primitive]));
    }

    if meshes.is_empty() {
        return Err(LoadError::EmptyModel(file_name.to_string()).into());
    }
    Ok(Model::new(device, meshes, materials, root))
}
