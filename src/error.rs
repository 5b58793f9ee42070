//! Typed errors for the loaders and the scene config.
//!
//! Most of the crate propagates `anyhow::Error`; these types exist where callers match on the
//! failure (tests, fallbacks) rather than just report it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported model format `{0}` (expected gltf, glb or obj)")]
    UnsupportedModelFormat(String),
    #[error("model file {0} contains no meshes")]
    EmptyModel(String),
    #[error("could not decode image {name}: {source}")]
    Image {
        name: String,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not parse scene config: {0}")]
    Parse(#[from] toml::de::Error),
}
