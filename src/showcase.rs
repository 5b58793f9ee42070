//! The showcase scene.
//!
//! A backdrop, a tiled floor, two lights and one model that spins around its y axis. The
//! model and its seven PBR maps load in the background; once both have arrived the maps are
//! bound to every mesh of the model and it starts rotating. A click anywhere reverses the
//! direction of the rotation.

use cgmath::One;
use futures::future::join;
use instant::Duration;
use winit::event::WindowEvent;

use crate::{
    config::{MaterialConfig, ModelConfig, SceneConfig, hex_to_linear},
    context::{Context, InitContext},
    data_structures::{
        instance::Instance,
        model::{Material, MaterialParams, Model},
        pbr::PbrTextureSet,
    },
    flow::{FlowConstructor, GraphicsFlow, Out, run},
    pipelines::background::mk_background_bind_group,
    render::Render,
    resources::{
        floor::mk_floor, load_model, pbr::load_pbr_texture_set, texture::load_texture,
        texture::pbr_material_layout,
    },
};

/// Results of the showcase's background tasks.
pub enum ShowcaseEvent {
    /// The model and its texture set, loaded concurrently. Fails when the model failed; the
    /// texture set itself always arrives complete.
    ModelLoaded(anyhow::Result<LoadedModel>),
}

pub struct LoadedModel {
    pub model: Model,
    pub textures: PbrTextureSet,
}

/// Signed rotation in radians per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationSpeed(f32);

impl RotationSpeed {
    pub fn new(radians_per_frame: f32) -> Self {
        Self(radians_per_frame)
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Reverses the direction, keeping the magnitude.
    pub fn toggle(&mut self) {
        self.0 = -self.0;
    }
}

/// A loaded model together with its placement and spin.
#[derive(Debug)]
pub struct RotatingModel<M = Model> {
    pub model: M,
    pub transform: Instance,
    pub speed: RotationSpeed,
}

impl<M> RotatingModel<M> {
    pub fn new(model: M, config: &ModelConfig) -> Self {
        Self {
            model,
            transform: Instance {
                position: config.position.into(),
                rotation: cgmath::Quaternion::one(),
                scale: config.scale.into(),
            },
            speed: RotationSpeed::new(config.rotation_speed),
        }
    }

    /// One frame of rotation.
    pub fn advance(&mut self) {
        self.transform.rotate_y(self.speed.value());
    }
}

impl RotatingModel<Model> {
    pub fn upload(&mut self, queue: &wgpu::Queue) {
        self.model.write_transforms(&self.transform, queue);
    }
}

/// State shared between the click handler and the frame update.
///
/// `model` stays `None` until the model finished loading, so neither a click nor a frame can
/// touch it earlier.
#[derive(Debug)]
pub struct ShowcaseState<M = Model> {
    pub model: Option<RotatingModel<M>>,
}

impl<M> Default for ShowcaseState<M> {
    fn default() -> Self {
        Self { model: None }
    }
}

impl<M> ShowcaseState<M> {
    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Reverses the rotation. Returns false while nothing is loaded.
    pub fn toggle_rotation(&mut self) -> bool {
        match &mut self.model {
            Some(rotating) => {
                rotating.speed.toggle();
                true
            }
            None => false,
        }
    }

    /// Rotates the model by one frame, if there is one.
    pub fn advance(&mut self) -> Option<&mut RotatingModel<M>> {
        let rotating = self.model.as_mut()?;
        rotating.advance();
        Some(rotating)
    }

    /// Installs a successfully loaded model; a failed load is logged and leaves the state as
    /// it was.
    pub fn on_model_loaded(&mut self, result: anyhow::Result<RotatingModel<M>>) {
        match result {
            Ok(rotating) => {
                log::info!("Model loaded, rotating at {} rad/frame", rotating.speed.value());
                self.model = Some(rotating);
            }
            Err(e) => log::error!("Error loading model: {:#}", e),
        }
    }
}

/// Material inputs for the model from the configured values.
pub fn material_params(config: &MaterialConfig) -> MaterialParams {
    MaterialParams {
        emissive: hex_to_linear(config.emissive_colour),
        emissive_intensity: config.emissive_intensity,
        displacement_scale: config.displacement_scale,
        metalness: config.metalness,
        roughness: config.roughness,
        opacity: 1.0,
    }
}

/// The parts of the scene a frame draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Backdrop,
    Floor,
    Model,
}

/// What a frame draws, back to front.
///
/// The floor is always drawn, so the scene keeps rendering whatever happened to the backdrop
/// and model loads.
pub fn layers(has_backdrop: bool, model_loaded: bool) -> Vec<Layer> {
    let mut layers = Vec::with_capacity(3);
    if has_backdrop {
        layers.push(Layer::Backdrop);
    }
    layers.push(Layer::Floor);
    if model_loaded {
        layers.push(Layer::Model);
    }
    layers
}

pub struct Showcase {
    config: SceneConfig,
    background: Option<wgpu::BindGroup>,
    floor: Model,
}

impl Showcase {
    /// Loads the backdrop and builds the floor. Neither can fail, missing images are logged
    /// and replaced.
    pub async fn new(ctx: InitContext, config: SceneConfig) -> Self {
        let InitContext { device, queue } = ctx;
        let (background, floor) = join(
            load_texture(&config.assets.background, false, &device, &queue, None),
            mk_floor(&config.floor, &config.assets.floor_texture, &device, &queue),
        )
        .await;
        let background = match background {
            Ok(texture) => Some(mk_background_bind_group(&device, &texture)),
            Err(e) => {
                log::warn!(
                    "Could not load background {}, keeping the clear colour: {}",
                    config.assets.background,
                    e
                );
                None
            }
        };
        Self {
            config,
            background,
            floor,
        }
    }

    /// Binds the loaded maps to every mesh of the model and places it.
    fn bind(&self, ctx: &Context, loaded: LoadedModel) -> RotatingModel {
        let LoadedModel { mut model, textures } = loaded;
        let material = Material::new(
            &ctx.device,
            "showcase material",
            textures,
            material_params(&self.config.material),
            &pbr_material_layout(&ctx.device),
        );
        let rebound = model.bind_material(material);
        log::info!("Bound the PBR material to {} mesh nodes", rebound);

        let mut rotating = RotatingModel::new(model, &self.config.model);
        rotating.upload(&ctx.queue);
        rotating
    }
}

impl GraphicsFlow<ShowcaseState, ShowcaseEvent> for Showcase {
    fn on_init(&mut self, ctx: &mut Context, _state: &mut ShowcaseState) -> Out<ShowcaseEvent> {
        ctx.configure_scene(&self.config);

        let device = ctx.device.clone();
        let queue = ctx.queue.clone();
        let model_file = self.config.assets.model.clone();
        let texture_paths = self.config.assets.textures.clone();
        Out::Spawn(vec![Box::pin(async move {
            let (model, textures) = join(
                load_model(&model_file, &device, &queue),
                load_pbr_texture_set(&texture_paths, &device, &queue),
            )
            .await;
            ShowcaseEvent::ModelLoaded(model.map(|model| LoadedModel { model, textures }))
        })])
    }

    fn on_click(&mut self, _ctx: &Context, state: &mut ShowcaseState) -> Out<ShowcaseEvent> {
        if !state.toggle_rotation() {
            log::debug!("Click ignored, the model is not loaded yet");
        }
        Out::Empty
    }

    fn on_update(
        &mut self,
        ctx: &Context,
        state: &mut ShowcaseState,
        _dt: Duration,
    ) -> Out<ShowcaseEvent> {
        if let Some(rotating) = state.advance() {
            rotating.upload(&ctx.queue);
        }
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _ctx: &Context,
        _state: &mut ShowcaseState,
        _event: &WindowEvent,
    ) -> Out<ShowcaseEvent> {
        Out::Empty
    }

    fn on_custom_events(
        &mut self,
        ctx: &Context,
        state: &mut ShowcaseState,
        event: ShowcaseEvent,
    ) -> Option<ShowcaseEvent> {
        match event {
            ShowcaseEvent::ModelLoaded(result) => {
                state.on_model_loaded(result.map(|loaded| self.bind(ctx, loaded)));
                None
            }
        }
    }

    fn on_render<'a>(&'a self, state: &'a ShowcaseState) -> Render<'a> {
        let renders = layers(self.background.is_some(), state.is_loaded())
            .into_iter()
            .map(|layer| match layer {
                Layer::Backdrop => self
                    .background
                    .as_ref()
                    .map_or(Render::None, Render::Background),
                Layer::Floor => Render::Opaque((&self.floor).into()),
                Layer::Model => state.model.as_ref().map_or(Render::None, |rotating| {
                    Render::Transparent((&rotating.model).into())
                }),
            })
            .collect();
        Render::Composed(renders)
    }
}

/// Opens the window (or attaches to the canvas) and runs the showcase until it is closed.
pub fn run_showcase(config: SceneConfig) -> anyhow::Result<()> {
    let scene = config.clone();
    let constructor: FlowConstructor<ShowcaseState, ShowcaseEvent> = Box::new(move |ctx| {
        Box::pin(async move {
            Box::new(Showcase::new(ctx, scene).await)
                as Box<dyn GraphicsFlow<ShowcaseState, ShowcaseEvent>>
        })
    });
    run(vec![constructor], config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> ShowcaseState<()> {
        ShowcaseState {
            model: Some(RotatingModel::new((), &ModelConfig::default())),
        }
    }

    #[test]
    fn model_is_placed_from_config() {
        let rotating = RotatingModel::new((), &ModelConfig::default());
        assert_eq!(rotating.transform.position, cgmath::Vector3::new(0.0, 15.0, 0.0));
        assert_eq!(rotating.transform.scale, cgmath::Vector3::new(0.1, 0.1, 0.1));
        assert_eq!(rotating.speed.value(), 0.01);
    }

    #[test]
    fn click_reverses_the_spin() {
        let mut state = loaded();
        assert!(state.toggle_rotation());
        assert_eq!(state.model.as_ref().unwrap().speed.value(), -0.01);
        assert!(state.toggle_rotation());
        assert_eq!(state.model.as_ref().unwrap().speed.value(), 0.01);
    }

    #[test]
    fn nothing_rotates_before_the_model_arrives() {
        let mut state = ShowcaseState::<()>::default();
        assert!(!state.toggle_rotation());
        assert!(state.advance().is_none());
        assert!(!state.is_loaded());
    }

    #[test]
    fn failed_load_keeps_the_state_empty() {
        let mut state = ShowcaseState::<()>::default();
        state.on_model_loaded(Err(anyhow::anyhow!("orange.glb not found")));
        assert!(!state.is_loaded());
        assert!(!state.toggle_rotation());
    }

    #[test]
    fn failed_load_still_draws_backdrop_and_floor() {
        let mut state = ShowcaseState::<()>::default();
        state.on_model_loaded(Err(anyhow::anyhow!("orange.glb not found")));
        assert_eq!(
            layers(true, state.is_loaded()),
            [Layer::Backdrop, Layer::Floor]
        );
    }

    #[test]
    fn loaded_model_is_drawn_last() {
        let state = loaded();
        assert_eq!(
            layers(true, state.is_loaded()),
            [Layer::Backdrop, Layer::Floor, Layer::Model]
        );
        assert_eq!(layers(false, state.is_loaded()), [Layer::Floor, Layer::Model]);
    }

    #[test]
    fn advancing_accumulates_the_signed_speed() {
        let mut state = loaded();
        state.advance();
        state.toggle_rotation();
        state.advance();
        state.advance();
        let rotation = state.model.as_ref().unwrap().transform.rotation;
        let mut expected = Instance::new();
        expected.rotate_y(-0.01);
        assert!((rotation.s - expected.rotation.s).abs() < 1e-6);
        assert!((rotation.v.y - expected.rotation.v.y).abs() < 1e-6);
    }

    #[test]
    fn material_params_follow_config() {
        let params = material_params(&MaterialConfig::default());
        assert_eq!(params.displacement_scale, 0.1);
        assert_eq!(params.emissive_intensity, 1.0);
        assert_eq!(params.emissive, [0.0; 3]);
        assert_eq!(params.metalness, 0.0);
        assert_eq!(params.roughness, 1.0);
        assert_eq!(params.opacity, 1.0);
    }
}
