//! PBR texture channels.
//!
//! A [`PbrTextureSet`] holds exactly one texture per [`TextureChannel`], in the binding order
//! of the PBR material layout. Channels without an image are filled with a 1x1 texture of the
//! channel's neutral value, so shaders never branch on missing maps.

use crate::{config::PbrPaths, data_structures::texture::Texture};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureChannel {
    BaseColor,
    Displacement,
    Emission,
    Metallic,
    Normal,
    Roughness,
    Occlusion,
}

impl TextureChannel {
    /// Binding order of the material layout.
    pub const ALL: [TextureChannel; 7] = [
        TextureChannel::BaseColor,
        TextureChannel::Displacement,
        TextureChannel::Emission,
        TextureChannel::Metallic,
        TextureChannel::Normal,
        TextureChannel::Roughness,
        TextureChannel::Occlusion,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Colour channels are stored sRGB, everything else is data and stays linear.
    pub fn is_linear(self) -> bool {
        !matches!(self, TextureChannel::BaseColor | TextureChannel::Emission)
    }

    /// The value that leaves the material unchanged when the channel has no image.
    pub fn neutral(self) -> [u8; 4] {
        match self {
            TextureChannel::Normal => [128, 128, 255, 255],
            TextureChannel::Displacement => [0, 0, 0, 255],
            TextureChannel::BaseColor
            | TextureChannel::Emission
            | TextureChannel::Metallic
            | TextureChannel::Roughness
            | TextureChannel::Occlusion => [255, 255, 255, 255],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TextureChannel::BaseColor => "base colour",
            TextureChannel::Displacement => "displacement",
            TextureChannel::Emission => "emission",
            TextureChannel::Metallic => "metallic",
            TextureChannel::Normal => "normal",
            TextureChannel::Roughness => "roughness",
            TextureChannel::Occlusion => "occlusion",
        }
    }

    pub fn path(self, paths: &PbrPaths) -> &str {
        match self {
            TextureChannel::BaseColor => &paths.base_color,
            TextureChannel::Displacement => &paths.displacement,
            TextureChannel::Emission => &paths.emission,
            TextureChannel::Metallic => &paths.metallic,
            TextureChannel::Normal => &paths.normal,
            TextureChannel::Roughness => &paths.roughness,
            TextureChannel::Occlusion => &paths.occlusion,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PbrTextureSet {
    textures: [Texture; 7],
}

impl PbrTextureSet {
    pub fn new(textures: [Texture; 7]) -> Self {
        Self { textures }
    }

    /// Every channel neutral except `base_color`, the plain textured look of a floor.
    pub fn with_base_color(base_color: Texture, device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let mut set = Self::neutral(device, queue);
        set.set(TextureChannel::BaseColor, base_color);
        set
    }

    pub fn neutral(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::new(TextureChannel::ALL.map(|channel| {
            Texture::create_solid(
                channel.neutral(),
                channel.is_linear(),
                channel.label(),
                device,
                queue,
            )
        }))
    }

    pub fn set(&mut self, channel: TextureChannel, texture: Texture) {
        self.textures[channel.index()] = texture;
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureChannel, &Texture)> {
        TextureChannel::ALL.into_iter().zip(self.textures.iter())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn indices_follow_binding_order() {
        for (i, channel) in TextureChannel::ALL.into_iter().enumerate() {
            assert_eq!(channel.index(), i);
        }
    }

    #[test]
    fn only_colour_channels_are_srgb() {
        let srgb: Vec<_> = TextureChannel::ALL
            .into_iter()
            .filter(|c| !c.is_linear())
            .collect();
        assert_eq!(srgb, [TextureChannel::BaseColor, TextureChannel::Emission]);
    }

    #[test]
    fn every_channel_maps_to_its_own_path() {
        let paths = PbrPaths::default();
        let unique: HashSet<_> = TextureChannel::ALL
            .into_iter()
            .map(|c| c.path(&paths))
            .collect();
        assert_eq!(unique.len(), 7);
        assert!(TextureChannel::Occlusion.path(&paths).ends_with("_Alpha.png"));
    }

    #[test]
    fn neutral_normal_points_straight_out() {
        assert_eq!(TextureChannel::Normal.neutral(), [128, 128, 255, 255]);
        assert_eq!(TextureChannel::Displacement.neutral()[0], 0);
    }
}
