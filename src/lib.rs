//! flow-showcase
//!
//! A single showcase scene on wgpu that runs natively and in the browser: an orbit camera,
//! ambient and directional light, a tiled floor, a backdrop image and a model shaded with a
//! seven map PBR set that spins around its vertical axis. Clicking reverses the spin.
//!
//! High-level modules
//! - `camera`: perspective projection, orbit controller and the camera uniform
//! - `config`: scene configuration with the showcase defaults, loadable from TOML
//! - `context`: window, surface, device, queue and the shared GPU resources
//! - `data_structures`: meshes, materials, PBR texture sets, instances and scene graphs
//! - `flow`: the event loop and the `GraphicsFlow` trait scenes implement
//! - `pipelines`: PBR, background and light resources
//! - `render`: render composition, grouping draws by pipeline
//! - `resources`: asset loading for glTF, OBJ, textures and generated meshes
//! - `scheduler`: per-frame phase order and frame timing
//! - `showcase`: the scene itself
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scheduler;
pub mod showcase;

pub use config::SceneConfig;
pub use flow::{GraphicsFlow, Out, init_logger, run};
pub use showcase::run_showcase;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Browser entry point. Reads `scene.toml` from the asset root when present.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() {
    init_logger();
    wasm_bindgen_futures::spawn_local(async {
        let config = SceneConfig::load_or_default("scene.toml").await;
        if let Err(e) = run_showcase(config) {
            log::error!("Showcase stopped: {:#}", e);
        }
    });
}
