use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

// Copies the backdrop, floor, model and PBR maps next to the build output so the showcase
// binary can be started from there.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets/*");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    if !manifest_dir.join("assets").exists() {
        println!("cargo:warning=no assets/ directory, the showcase will fall back to plain textures");
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR")?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&[manifest_dir.join("assets")], out_dir, &copy_options)?;

    Ok(())
}
