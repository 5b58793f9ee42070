/// `flow-showcase [--sky | <scene.toml>]`
///
/// Without arguments the default scene is shown. A TOML path is resolved against `./assets/`.
#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use flow_showcase::{SceneConfig, init_logger, run_showcase};

    init_logger();

    let config = match std::env::args().nth(1).as_deref() {
        None => SceneConfig::default(),
        Some("--sky") => SceneConfig::sky_preset(),
        Some(file_name) => tokio::runtime::Runtime::new()?.block_on(SceneConfig::load(file_name))?,
    };
    run_showcase(config)
}

// The browser starts through `run_web` in the library.
#[cfg(target_arch = "wasm32")]
fn main() {}
