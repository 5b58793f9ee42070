//! Scene configuration.
//!
//! Every constant the showcase needs (asset paths, camera, lights, floor, model placement,
//! material parameters and the rotation speed) lives in [`SceneConfig`]. All sections are
//! `#[serde(default)]`, so a `scene.toml` only has to name what it overrides:
//!
//! ```toml
//! [model]
//! rotation_speed = 0.02
//!
//! [assets]
//! background = "images/sky.png"
//! ```

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, resources::load_string};

/// Top level configuration for the showcase scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SceneConfig {
    pub window: WindowConfig,
    pub assets: AssetConfig,
    pub camera: CameraConfig,
    pub lights: LightConfig,
    pub floor: FloorConfig,
    pub model: ModelConfig,
    pub material: MaterialConfig,
}

/// Where the output goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Native window title.
    pub title: String,
    /// Id of the canvas element used on the web.
    pub canvas_id: String,
    /// Clear colour shown until (or instead of) the backdrop.
    pub clear_colour: u32,
}

/// Asset paths, relative to the asset root (`./assets/` natively, `<origin>/assets/` on the web).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub background: String,
    pub floor_texture: String,
    pub model: String,
    pub textures: PbrPaths,
}

/// One path per PBR channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PbrPaths {
    pub base_color: String,
    pub displacement: String,
    pub emission: String,
    pub metallic: String,
    pub normal: String,
    pub roughness: String,
    pub occlusion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
    pub position: [f32; 3],
    /// Orbit pivot.
    pub target: [f32; 3],
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub ambient_colour: u32,
    pub ambient_intensity: f32,
    pub directional_colour: u32,
    pub directional_intensity: f32,
    /// The directional light shines from here toward the origin.
    pub directional_position: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorConfig {
    /// Edge length of the square plane.
    pub size: f32,
    /// Texture repetitions along u and v.
    pub repeat: [f32; 2],
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub scale: [f32; 3],
    pub position: [f32; 3],
    /// Radians added to the model's y rotation every frame.
    pub rotation_speed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    pub displacement_scale: f32,
    pub emissive_colour: u32,
    pub emissive_intensity: f32,
    /// Multiplies the blue channel of the metallic map.
    pub metalness: f32,
    /// Multiplies the green channel of the roughness map.
    pub roughness: f32,
    pub transparent: bool,
    pub double_sided: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "flow-showcase".to_string(),
            canvas_id: "bg".to_string(),
            clear_colour: 0x000000,
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            background: "images/background.jpg".to_string(),
            floor_texture: "images/floor_texture.jpg".to_string(),
            // A glTF conversion of orange.fbx, FBX itself has no loader.
            model: "images/orange/orange.glb".to_string(),
            textures: PbrPaths::default(),
        }
    }
}

impl Default for PbrPaths {
    fn default() -> Self {
        let channel = |name: &str| format!("images/orange/Orange_Base_{name}.png");
        Self {
            base_color: channel("BaseColor"),
            displacement: channel("Displacement"),
            emission: channel("Emission"),
            metallic: channel("Metallic"),
            normal: channel("Normal"),
            roughness: channel("Roughness"),
            occlusion: channel("Alpha"),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fovy: 75.0,
            znear: 0.1,
            zfar: 1000.0,
            position: [0.0, 20.0, 50.0],
            target: [0.0, 0.0, 0.0],
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            ambient_colour: 0x404040,
            ambient_intensity: 2.0,
            directional_colour: 0xffffff,
            directional_intensity: 1.0,
            directional_position: [50.0, 50.0, 50.0],
        }
    }
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            size: 500.0,
            repeat: [10.0, 10.0],
            height: -0.5,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            scale: [0.1; 3],
            position: [0.0, 15.0, 0.0],
            rotation_speed: 0.01,
        }
    }
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            displacement_scale: 0.1,
            emissive_colour: 0x000000,
            emissive_intensity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
            transparent: true,
            double_sided: true,
        }
    }
}

impl SceneConfig {
    /// The variant with a sky backdrop and a dirt floor.
    pub fn sky_preset() -> Self {
        let mut config = Self::default();
        config.assets.background = "images/sky.png".to_string();
        config.assets.floor_texture = "images/dirt.jpg".to_string();
        config
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config file through the asset loader, so this also works on the web.
    pub async fn load(file_name: &str) -> anyhow::Result<Self> {
        let content = load_string(file_name).await?;
        Ok(Self::from_toml_str(&content)?)
    }

    pub async fn load_or_default(file_name: &str) -> Self {
        match Self::load(file_name).await {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Could not load scene config {file_name}, using defaults: {e}");
                Self::default()
            }
        }
    }
}

/// Converts a `0xRRGGBB` colour to linear RGB.
pub fn hex_to_linear(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_orange_scene() {
        let config = SceneConfig::default();
        assert_eq!(config.camera.fovy, 75.0);
        assert_eq!(config.camera.position, [0.0, 20.0, 50.0]);
        assert_eq!(config.floor.repeat, [10.0, 10.0]);
        assert_eq!(config.floor.size, 500.0);
        assert_eq!(config.model.scale, [0.1; 3]);
        assert_eq!(config.model.position, [0.0, 15.0, 0.0]);
        assert_eq!(config.model.rotation_speed, 0.01);
        assert_eq!(config.lights.ambient_colour, 0x404040);
        assert_eq!(config.window.canvas_id, "bg");
        assert_eq!(
            config.assets.textures.occlusion,
            "images/orange/Orange_Base_Alpha.png"
        );
    }

    #[test]
    fn sky_preset_only_swaps_backdrop_and_floor() {
        let default = SceneConfig::default();
        let sky = SceneConfig::sky_preset();
        assert_eq!(sky.assets.background, "images/sky.png");
        assert_eq!(sky.assets.floor_texture, "images/dirt.jpg");
        assert_eq!(sky.assets.textures, default.assets.textures);
        assert_eq!(sky.assets.model, default.assets.model);
        assert_eq!(sky.camera, default.camera);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = SceneConfig::from_toml_str(
            r#"
            [model]
            rotation_speed = -0.5

            [floor]
            repeat = [4.0, 2.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.model.rotation_speed, -0.5);
        assert_eq!(config.model.scale, [0.1; 3]);
        assert_eq!(config.floor.repeat, [4.0, 2.0]);
        assert_eq!(config.floor.size, 500.0);
        assert_eq!(config.lights, LightConfig::default());
    }

    #[test]
    fn broken_toml_is_an_error() {
        assert!(SceneConfig::from_toml_str("[model\nscale = 1").is_err());
    }

    #[test]
    fn hex_colours_convert_to_linear() {
        assert_eq!(hex_to_linear(0xffffff), [1.0, 1.0, 1.0]);
        assert_eq!(hex_to_linear(0x000000), [0.0, 0.0, 0.0]);
        let grey = hex_to_linear(0x404040);
        assert!(grey[0] > 0.05 && grey[0] < 0.06, "{grey:?}");
        assert_eq!(grey[0], grey[2]);
    }
}
