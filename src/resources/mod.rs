//! Loading of models, textures and text assets.
//!
//! Assets are addressed relative to the asset root: `./assets/` natively and
//! `<origin>/assets/` in the browser.

pub mod floor;
pub mod gltf;
pub mod mesh;
pub mod obj;
pub mod pbr;
pub mod texture;

pub use texture::{load_binary, load_string};

use crate::{data_structures::model::Model, error::LoadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Gltf,
    Obj,
}

/// Picks a loader by file extension.
pub fn model_format(file_name: &str) -> Result<ModelFormat, LoadError> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("gltf") | Some("glb") => Ok(ModelFormat::Gltf),
        Some("obj") => Ok(ModelFormat::Obj),
        _ => Err(LoadError::UnsupportedModelFormat(file_name.to_string())),
    }
}

pub async fn load_model(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Model> {
    let model = match model_format(file_name)? {
        ModelFormat::Gltf => gltf::load_model_gltf(file_name, device, queue).await?,
        ModelFormat::Obj => obj::load_model_obj(file_name, device, queue).await?,
    };
    log::info!(
        "Loaded {} with {} meshes and {} materials",
        file_name,
        model.meshes.len(),
        model.materials.len()
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_are_picked_by_extension() {
        assert_eq!(model_format("images/orange/orange.glb").unwrap(), ModelFormat::Gltf);
        assert_eq!(model_format("scene.GLTF").unwrap(), ModelFormat::Gltf);
        assert_eq!(model_format("hut.obj").unwrap(), ModelFormat::Obj);
    }

    #[test]
    fn fbx_is_rejected() {
        let err = model_format("images/orange/orange.fbx").unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedModelFormat(name) if name.ends_with(".fbx")));
        assert!(model_format("no_extension").is_err());
    }
}
