//! Scene data: models, textures, PBR texture sets, scene graphs and instances.
//!
//! - `model` contains meshes, materials and the GPU resources of a 3D model
//! - `texture` wraps a GPU texture and its view and sampler
//! - `pbr` names the seven texture channels of a material and holds one texture per channel
//! - `instance` holds per-instance transformation data
//! - `scene_graph` places meshes hierarchically and assigns their materials

pub mod instance;
pub mod model;
pub mod pbr;
pub mod scene_graph;
pub mod texture;
