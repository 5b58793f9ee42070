use flow_showcase::data_structures::{
    instance::Instance,
    scene_graph::{Primitive, SceneNode},
};

/// A root with an empty group node holding two mesh nodes, the second with two primitives,
/// plus one mesh node directly below the root. Materials are all different.
pub fn nested_graph() -> SceneNode {
    let mut group = SceneNode::new("group").with_local(Instance {
        position: cgmath::Vector3::new(1.0, 0.0, 0.0),
        ..Instance::new()
    });
    group.add_child(SceneNode::new("peel").with_primitives(vec![Primitive {
        mesh: 0,
        material: 0,
    }]));
    group.add_child(SceneNode::new("leaf").with_primitives(vec![
        Primitive {
            mesh: 1,
            material: 1,
        },
        Primitive {
            mesh: 2,
            material: 2,
        },
    ]));

    let mut root = SceneNode::new("root");
    root.add_child(group);
    root.add_child(SceneNode::new("stem").with_primitives(vec![Primitive {
        mesh: 3,
        material: 3,
    }]));
    root
}

pub fn assert_close(a: f32, b: f32) {
    assert!((a - b).abs() < 1e-5, "{a} != {b}");
}
