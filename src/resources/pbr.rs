use futures::future::join_all;

use crate::{
    config::PbrPaths,
    data_structures::{pbr::{PbrTextureSet, TextureChannel}, texture::Texture},
    resources::texture::load_texture,
};

/// Fetches all seven channel textures concurrently.
///
/// A channel whose image cannot be loaded is logged and replaced by its neutral 1x1 texture,
/// so the set is always complete.
pub async fn load_pbr_texture_set(
    paths: &PbrPaths,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> PbrTextureSet {
    let loads = TextureChannel::ALL.map(|channel| {
        let path = channel.path(paths);
        async move {
            (
                channel,
                load_texture(path, channel.is_linear(), device, queue, None).await,
            )
        }
    });
    let results = join_all(loads).await;

    let mut missing = 0;
    let mut set = PbrTextureSet::neutral(device, queue);
    for (channel, result) in results {
        match result {
            Ok(texture) => set.set(channel, texture),
            Err(e) => {
                missing += 1;
                log::warn!(
                    "Could not load the {} map {}: {}",
                    channel.label(),
                    channel.path(paths),
                    e
                );
            }
        }
    }
    if missing > 0 {
        log::warn!("{missing} of {} PBR maps fell back to neutral values", TextureChannel::ALL.len());
    }
    set
}

/// Loads a single colour texture, falling back to a solid texture of `fallback` when the
/// image is unavailable.
pub async fn load_texture_or_solid(
    file_name: &str,
    fallback: [u8; 4],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Texture {
    match load_texture(file_name, false, device, queue, None).await {
        Ok(texture) => texture,
        Err(e) => {
            log::warn!("Could not load texture {file_name}, using a solid colour instead: {e}");
            Texture::create_solid(fallback, false, file_name, device, queue)
        }
    }
}
