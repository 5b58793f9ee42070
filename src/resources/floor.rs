use cgmath::Rotation3;

use crate::{
    config::FloorConfig,
    data_structures::{
        instance::Instance,
        model::{Material, MaterialParams, Mesh, Model},
        pbr::PbrTextureSet,
        scene_graph::{Primitive, SceneNode},
    },
    resources::{mesh::plane, pbr::load_texture_or_solid, texture::pbr_material_layout},
};

/// Lays the xy plane flat on the ground, facing up, at the configured height.
pub fn floor_transform(config: &FloorConfig) -> Instance {
    Instance {
        position: cgmath::Vector3::new(0.0, config.height, 0.0),
        rotation: cgmath::Quaternion::from_angle_x(cgmath::Deg(-90.0)),
        scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
    }
}

/// Builds the ground plane with `texture_file` tiled across it.
///
/// A missing texture leaves the floor plain white.
pub async fn mk_floor(
    config: &FloorConfig,
    texture_file: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Model {
    let texture = load_texture_or_solid(texture_file, [255, 255, 255, 255], device, queue).await;
    let (vertices, indices) = plane(config.size, config.repeat);
    let mesh = Mesh::new(device, "floor", &vertices, &indices);
    let material = Material::new(
        device,
        "floor",
        PbrTextureSet::with_base_color(texture, device, queue),
        MaterialParams::default(),
        &pbr_material_layout(device),
    );
    let graph = SceneNode::new("floor")
        .with_local(floor_transform(config))
        .with_primitives(vec![Primitive {
            mesh: 0,
            material: 0,
        }]);
    Model::new(device, vec![mesh], vec![material], graph)
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};

    use super::*;

    #[test]
    fn floor_faces_up_below_the_origin() {
        let transform = floor_transform(&FloorConfig::default());
        let up = transform.rotation * Vector3::unit_z();
        assert!((up - Vector3::unit_y()).magnitude() < 1e-6, "{:?}", up);
        assert_eq!(transform.position.y, -0.5);
    }
}
