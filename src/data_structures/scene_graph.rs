//! Scene graph of a loaded model.
//!
//! A model file yields a tree of [`SceneNode`]s. Nodes carry a local transform and, when
//! they are mesh nodes, a list of [`Primitive`]s referencing meshes and materials of the
//! owning [`Model`](crate::data_structures::model::Model) by index. The graph holds no GPU
//! state, which keeps traversal, material rebinding and draw list construction plain data
//! operations.

use crate::data_structures::instance::Instance;

/// One drawable piece of a mesh node: a mesh and the material it is drawn with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Primitive {
    pub mesh: usize,
    pub material: usize,
}

/// A single draw: `mesh` with `material`, transformed by instance `instance` of the
/// model's instance buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawCall {
    pub mesh: usize,
    pub material: usize,
    pub instance: u32,
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    pub local: Instance,
    world: Instance,
    pub primitives: Vec<Primitive>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: Instance::default(),
            world: Instance::default(),
            primitives: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_local(mut self, local: Instance) -> Self {
        self.local = local;
        self
    }

    pub fn with_primitives(mut self, primitives: Vec<Primitive>) -> Self {
        self.primitives = primitives;
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    pub fn is_mesh_node(&self) -> bool {
        !self.primitives.is_empty()
    }

    pub fn world_transform(&self) -> &Instance {
        &self.world
    }

    /// Depth-first, parents before children.
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a SceneNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }

    pub fn visit_mut(&mut self, f: &mut dyn FnMut(&mut SceneNode)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }

    pub fn mesh_nodes(&self) -> Vec<&SceneNode> {
        let mut nodes = Vec::new();
        self.visit(&mut |node| {
            if node.is_mesh_node() {
                nodes.push(node);
            }
        });
        nodes
    }

    /// Recomputes world transforms of the subtree below `parent`.
    pub fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        let world = self.world.clone();
        for child in &mut self.children {
            child.update_world_transforms(&world);
        }
    }

    /// Points every primitive of every mesh node at `material`.
    ///
    /// Returns the number of mesh nodes that were rebound.
    pub fn assign_material(&mut self, material: usize) -> usize {
        let mut rebound = 0;
        self.visit_mut(&mut |node| {
            if node.is_mesh_node() {
                node.primitives
                    .iter_mut()
                    .for_each(|primitive| primitive.material = material);
                rebound += 1;
            }
        });
        rebound
    }

    /// World transforms of all mesh nodes in traversal order, and one draw call per primitive
    /// referencing its node's transform by index.
    pub fn draw_list(&self) -> (Vec<Instance>, Vec<DrawCall>) {
        let mut transforms = Vec::new();
        let mut draws = Vec::new();
        for node in self.mesh_nodes() {
            let instance = transforms.len() as u32;
            transforms.push(node.world.clone());
            draws.extend(node.primitives.iter().map(|primitive| DrawCall {
                mesh: primitive.mesh,
                material: primitive.material,
                instance,
            }));
        }
        (transforms, draws)
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};

    use super::*;

    fn mesh(mesh: usize, material: usize) -> Primitive {
        Primitive { mesh, material }
    }

    /// root
    /// ├── body (mesh 0, material 0)
    /// │   └── leaf (meshes 1 and 2, material 1)
    /// └── pivot
    ///     └── stem (mesh 3, material 0)
    fn orange() -> SceneNode {
        let mut root = SceneNode::new("root");
        let mut body = SceneNode::new("body").with_primitives(vec![mesh(0, 0)]);
        body.add_child(
            SceneNode::new("leaf")
                .with_local(Instance::from(Vector3::new(0.0, 10.0, 0.0)))
                .with_primitives(vec![mesh(1, 1), mesh(2, 1)]),
        );
        let mut pivot =
            SceneNode::new("pivot").with_local(Instance::from(Vector3::new(5.0, 0.0, 0.0)));
        pivot.add_child(SceneNode::new("stem").with_primitives(vec![mesh(3, 0)]));
        root.add_child(body);
        root.add_child(pivot);
        root
    }

    #[test]
    fn visits_parents_before_children() {
        let graph = orange();
        let mut names = Vec::new();
        graph.visit(&mut |node| names.push(node.name.clone()));
        assert_eq!(names, ["root", "body", "leaf", "pivot", "stem"]);
    }

    #[test]
    fn only_nodes_with_primitives_are_mesh_nodes() {
        let graph = orange();
        let names: Vec<_> = graph.mesh_nodes().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["body", "leaf", "stem"]);
    }

    #[test]
    fn assigning_a_material_rebinds_every_mesh_node() {
        let mut graph = orange();
        let rebound = graph.assign_material(7);
        assert_eq!(rebound, 3);
        for node in graph.mesh_nodes() {
            assert!(
                node.primitives.iter().all(|p| p.material == 7),
                "{} kept a loader material",
                node.name
            );
        }
        // meshes are untouched
        let (_, draws) = graph.draw_list();
        let meshes: Vec<_> = draws.iter().map(|d| d.mesh).collect();
        assert_eq!(meshes, [0, 1, 2, 3]);
    }

    #[test]
    fn world_transforms_follow_the_hierarchy() {
        let mut graph = orange();
        let root = Instance {
            position: Vector3::new(0.0, 15.0, 0.0),
            scale: Vector3::new(0.1, 0.1, 0.1),
            ..Default::default()
        };
        graph.update_world_transforms(&root);
        let (transforms, _) = graph.draw_list();
        assert_eq!(transforms.len(), 3);
        // leaf sits 10 units above body, scaled by the root
        assert!((transforms[1].position - Vector3::new(0.0, 16.0, 0.0)).magnitude() < 1e-5);
        // stem inherits the pivot offset
        assert!((transforms[2].position - Vector3::new(0.5, 15.0, 0.0)).magnitude() < 1e-5);
    }

    #[test]
    fn primitives_of_one_node_share_an_instance() {
        let graph = orange();
        let (_, draws) = graph.draw_list();
        let instances: Vec<_> = draws.iter().map(|d| d.instance).collect();
        assert_eq!(instances, [0, 1, 1, 2]);
    }
}
