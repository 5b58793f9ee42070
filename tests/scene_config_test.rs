use flow_showcase::{
    SceneConfig,
    config::hex_to_linear,
    error::ConfigError,
    resources::{ModelFormat, mesh::plane, model_format},
};

#[test]
fn partial_toml_keeps_the_other_defaults() {
    let config = SceneConfig::from_toml_str(
        r#"
        [model]
        rotation_speed = -0.02

        [assets]
        background = "images/sky.png"
        "#,
    )
    .unwrap();

    let default = SceneConfig::default();
    assert_eq!(config.model.rotation_speed, -0.02);
    assert_eq!(config.model.position, default.model.position);
    assert_eq!(config.assets.background, "images/sky.png");
    assert_eq!(config.assets.floor_texture, default.assets.floor_texture);
    assert_eq!(config.camera, default.camera);
}

#[test]
fn empty_toml_is_the_default_scene() {
    assert_eq!(SceneConfig::from_toml_str("").unwrap(), SceneConfig::default());
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = SceneConfig::from_toml_str("[model\nscale = 1").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn default_config_survives_serialisation() {
    let default = SceneConfig::default();
    let text = toml::to_string(&default).unwrap();
    assert_eq!(SceneConfig::from_toml_str(&text).unwrap(), default);
}

#[test]
fn ambient_grey_is_linearised() {
    let [r, g, b] = hex_to_linear(0x404040);
    assert_eq!(r, g);
    assert_eq!(g, b);
    assert!((r - 0.0513).abs() < 1e-3, "{r}");
    assert_eq!(hex_to_linear(0xffffff), [1.0; 3]);
}

#[test]
fn configured_floor_tiles_ten_times() {
    let floor = SceneConfig::default().floor;
    let (vertices, _) = plane(floor.size, floor.repeat);
    let us: Vec<f32> = vertices.iter().map(|v| v.tex_coords[0]).collect();
    assert!(us.contains(&0.0));
    assert!(us.contains(&10.0));
}

#[test]
fn configured_model_has_a_loader() {
    let config = SceneConfig::default();
    assert_eq!(model_format(&config.assets.model).unwrap(), ModelFormat::Gltf);
}
