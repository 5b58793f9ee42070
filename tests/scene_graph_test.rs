use cgmath::{One, Quaternion, Vector3};
use flow_showcase::{
    config::ModelConfig,
    data_structures::{instance::Instance, scene_graph::DrawCall},
    showcase::RotatingModel,
};

use crate::common::test_utils::{assert_close, nested_graph};

mod common;

#[test]
fn rebinding_reaches_every_mesh_node() {
    let mut graph = nested_graph();
    assert_eq!(graph.assign_material(0), 3);

    let (_, draws) = graph.draw_list();
    assert_eq!(draws.len(), 4);
    assert!(draws.iter().all(|draw| draw.material == 0));
}

#[test]
fn group_nodes_are_not_drawn() {
    let graph = nested_graph();
    let names: Vec<_> = graph.mesh_nodes().iter().map(|n| n.name.clone()).collect();
    assert_eq!(names, ["peel", "leaf", "stem"]);

    let (transforms, draws) = graph.draw_list();
    assert_eq!(transforms.len(), 3);
    assert_eq!(
        draws[1..3],
        [
            DrawCall {
                mesh: 1,
                material: 1,
                instance: 1
            },
            DrawCall {
                mesh: 2,
                material: 2,
                instance: 1
            },
        ]
    );
}

#[test]
fn model_transform_scales_and_lifts_children() {
    let mut graph = nested_graph();
    let placement = RotatingModel::new((), &ModelConfig::default()).transform;
    graph.update_world_transforms(&placement);

    let peel = graph.mesh_nodes()[0].world_transform().clone();
    // The group's offset of one unit shrinks with the model.
    assert_close(peel.position.x, 0.1);
    assert_close(peel.position.y, 15.0);
    assert_close(peel.scale.x, 0.1);

    let stem = graph.mesh_nodes()[2].world_transform().clone();
    assert_eq!(stem.position, Vector3::new(0.0, 15.0, 0.0));
}

#[test]
fn spinning_the_root_moves_offset_children_around_the_axis() {
    let mut graph = nested_graph();
    let mut root = Instance::new();
    root.rotate_y(std::f32::consts::FRAC_PI_2);
    graph.update_world_transforms(&root);

    let peel = graph.mesh_nodes()[0].world_transform().clone();
    assert_close(peel.position.x, 0.0);
    assert_close(peel.position.z, -1.0);
    assert_ne!(peel.rotation, Quaternion::one());
}
