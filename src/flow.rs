//! Flow control and application event loop.
//!
//! A "flow" is a self-contained scene that handles user input, updates its state and
//! describes what to render each frame. The app owns the GPU context, the shared state `S`
//! and the flows, and drives them from winit's event loop.
//!
//! # User-facing types
//!
//! - [`GraphicsFlow<S, E>`] is the trait for scenes that handle events and rendering
//! - [`Out<E>`] is the output of every hook: background tasks to spawn, or nothing
//! - [`FlowConstructor<S, E>`] builds a flow asynchronously before the first frame
//!
//! # Lifecycle
//!
//! Every redraw runs one tick (see [`TickPhase::ORDER`]):
//! 1. Deliver finished background tasks to `on_custom_events`
//! 2. `on_update` on all flows
//! 3. Apply the orbit controls to the camera
//! 4. Collect every flow's `on_render`, batch by pipeline, draw and present

use std::{
    fmt::Debug,
    iter,
    pin::Pin,
    sync::{
        Arc,
        mpsc::{self, Receiver, Sender},
    },
};

use instant::Duration;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    config::SceneConfig,
    context::{Context, InitContext},
    data_structures::{
        model::DrawModel,
        texture::{Texture, fit_within},
    },
    render::{Batches, Render},
    scheduler::{FrameClock, TickPhase},
};

/// A background task whose output is handed back to the flows as a custom event.
///
/// Native tasks run on the app's tokio runtime and therefore have to be `Send`; web tasks run
/// on the browser's event loop via `spawn_local`.
#[cfg(not(target_arch = "wasm32"))]
pub type Task<E> = Pin<Box<dyn Future<Output = E> + Send>>;
#[cfg(target_arch = "wasm32")]
pub type Task<E> = Pin<Box<dyn Future<Output = E>>>;

/// The output type of every lifecycle hook.
///
/// `Out::Spawn` runs the futures in the background. Each one resolves to an event that is
/// delivered to `on_custom_events` at the start of a later frame.
///
/// `Empty` is the default output used when nothing has to happen.
pub enum Out<E> {
    Spawn(Vec<Task<E>>),
    Empty,
}

impl<E> Default for Out<E> {
    fn default() -> Self {
        Self::Empty
    }
}

/// Trait for implementing a renderable scene.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once after the flow was constructed
/// 2. `on_window_events()` is called for each winit window event
/// 3. `on_click()` is called when the left mouse button is released inside the window
/// 4. `on_custom_events()` is called with the result of each spawned task
/// 5. `on_update()` is called every frame
/// 6. `on_render()` is called every frame and specifies how to render `self`
pub trait GraphicsFlow<S, E> {
    /// Initialize the flow and configure the context.
    fn on_init(&mut self, ctx: &mut Context, state: &mut S) -> Out<E>;

    /// Handle a click anywhere in the window.
    fn on_click(&mut self, ctx: &Context, state: &mut S) -> Out<E>;

    /// Update state every frame.
    ///
    /// Called every frame with the elapsed time `dt`.
    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: Duration) -> Out<E>;

    /// Handle window events (keyboard, mouse, window resizing, etc.).
    fn on_window_events(&mut self, ctx: &Context, state: &mut S, event: &WindowEvent) -> Out<E>;

    /// Handle custom application events.
    ///
    /// Returns the event if it was not consumed, allowing it to be passed to
    /// the next flow. Returning `None` means the event was consumed.
    fn on_custom_events(&mut self, ctx: &Context, state: &mut S, event: E) -> Option<E>;

    /// Return renderable objects for this flow.
    ///
    /// Called each frame. `state` is passed so that objects which live in the shared state
    /// can be drawn as well.
    fn on_render<'a>(&'a self, state: &'a S) -> Render<'a>;
}

impl<State, Event> Debug for dyn GraphicsFlow<State, Event> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Type alias for a flow constructor (factory function).
///
/// A flow constructor takes an `InitContext` and asynchronously returns a
/// boxed `GraphicsFlow`. This allows resource loading before the first frame.
pub type FlowConstructor<S, E> =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<S, E>>>>>>;

/// Application state bundle: GPU context, app state, and surface status.
#[derive(Debug)]
pub struct AppState<State: 'static> {
    pub(crate) ctx: Context,
    state: State,
    is_surface_configured: bool,
}

impl<State: Default> AppState<State> {
    async fn new(window: Arc<Window>, scene: &SceneConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, scene).await?;
        Ok(Self {
            ctx,
            state: State::default(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        let limit = self.ctx.device.limits().max_texture_dimension_2d;
        if let Some((surface_width, surface_height)) = surface_size(width, height, limit) {
            self.ctx.config.width = surface_width;
            self.ctx.config.height = surface_height;
            self.is_surface_configured = true;
            self.ctx.projection.resize(surface_width, surface_height);
            // Pointer deltas arrive in window pixels, not surface pixels.
            self.ctx.camera.controller.set_viewport_height(height);
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.depth_texture = Texture::create_depth_texture(
                &self.ctx.device,
                [surface_width, surface_height],
                "depth_texture",
            );
        }
    }

    fn render<Event>(
        &mut self,
        graphics_flows: &[Box<dyn GraphicsFlow<State, Event>>],
    ) -> Result<(), wgpu::CurrentSurfaceTexture> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(texture)
            | wgpu::CurrentSurfaceTexture::Suboptimal(texture) => texture,
            other => return Err(other),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });
        {
            let mut render_pass: wgpu::RenderPass<'_> =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.ctx.depth_texture.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                    multiview_mask: None,
                });

            let mut batches = Batches::default();
            graphics_flows.iter().for_each(|flow| {
                flow.on_render(&self.state).set_pipelines(&mut batches);
            });

            render_pass.set_pipeline(&self.ctx.pipelines.background);
            for group in batches.backgrounds {
                render_pass.set_bind_group(0, group, &[]);
                render_pass.draw(0..3, 0..1);
            }

            render_pass.set_pipeline(&self.ctx.pipelines.opaque);
            for instanced in batches.opaques {
                render_pass.draw_model(
                    instanced.model,
                    &self.ctx.camera.bind_group,
                    &self.ctx.light.bind_group,
                );
            }

            render_pass.set_pipeline(&self.ctx.pipelines.transparent);
            for instanced in batches.transparents {
                render_pass.draw_model(
                    instanced.model,
                    &self.ctx.camera.bind_group,
                    &self.ctx.light.bind_group,
                );
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

/// The surface size for a window of `width` x `height`, or `None` while it is minimised.
///
/// HiDPI canvases can exceed the device's texture limit; they are scaled down to fit and the
/// compositor stretches the result.
pub(crate) fn surface_size(width: u32, height: u32, limit: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    Some(fit_within((width, height), limit).unwrap_or((width, height)))
}

pub struct App<State: 'static, Event: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
    state: Option<AppState<State>>,
    // This will hold the fully initialized flows once they are ready.
    graphics_flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    // This holds the constructors at the start.
    // We use Option to `take()` it after use.
    constructors: Option<Vec<FlowConstructor<State, Event>>>,
    scene: SceneConfig,
    // Finished background tasks, drained once per frame.
    completed_tx: Sender<Event>,
    completed_rx: Receiver<Event>,
    clock: FrameClock,
}

impl<State, Event> App<State, Event>
where
    State: 'static + Default,
    Event: Send + 'static,
{
    fn new(
        event_loop: &EventLoop<FlowEvent<State, Event>>,
        constructors: Vec<FlowConstructor<State, Event>>,
        scene: SceneConfig,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        let (completed_tx, completed_rx) = mpsc::channel();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new()?,
            proxy,
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            scene,
            completed_tx,
            completed_rx,
            clock: FrameClock::new(),
        })
    }

    fn handle_flow_output(&self, out: Out<Event>) {
        match out {
            Out::Spawn(tasks) => {
                for task in tasks {
                    let tx = self.completed_tx.clone();
                    let fut = async move {
                        if tx.send(task.await).is_err() {
                            log::warn!("The app was closed before a background task finished");
                        }
                    };
                    #[cfg(not(target_arch = "wasm32"))]
                    self.async_runtime.spawn(fut);
                    #[cfg(target_arch = "wasm32")]
                    wasm_bindgen_futures::spawn_local(fut);
                }
            }
            Out::Empty => (),
        }
    }

    fn init_flows(&mut self, state: &mut AppState<State>) {
        let outputs: Vec<_> = self
            .graphics_flows
            .iter_mut()
            .map(|flow| flow.on_init(&mut state.ctx, &mut state.state))
            .collect();
        outputs
            .into_iter()
            .for_each(|out| self.handle_flow_output(out));
    }

    /// Hands every finished task to the flows, first come first served.
    fn deliver_completed(&mut self, state: &mut AppState<State>) {
        while let Ok(event) = self.completed_rx.try_recv() {
            let result = self
                .graphics_flows
                .iter_mut()
                .fold(Some(event), |event, flow| {
                    flow.on_custom_events(&state.ctx, &mut state.state, event?)
                });
            if result.is_some() {
                log::warn!("Custom event was not consumed by any flow");
            }
        }
    }

    fn click(&mut self, state: &mut AppState<State>) {
        let outputs: Vec<_> = self
            .graphics_flows
            .iter_mut()
            .map(|flow| flow.on_click(&state.ctx, &mut state.state))
            .collect();
        outputs
            .into_iter()
            .for_each(|out| self.handle_flow_output(out));
    }

    fn tick(&mut self, state: &mut AppState<State>) {
        let dt = self.clock.tick();
        self.deliver_completed(state);

        for phase in TickPhase::ORDER {
            match phase {
                TickPhase::Rotate => {
                    let outputs: Vec<_> = self
                        .graphics_flows
                        .iter_mut()
                        .map(|flow| flow.on_update(&state.ctx, &mut state.state, dt))
                        .collect();
                    outputs
                        .into_iter()
                        .for_each(|out| self.handle_flow_output(out));
                }
                TickPhase::Controls => {
                    let ctx = &mut state.ctx;
                    ctx.camera.update(&ctx.projection, &ctx.queue);
                }
                TickPhase::Render => match state.render(&self.graphics_flows) {
                    Ok(_) => (),
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {:?}", e);
                    }
                },
            }
        }
    }

    // The app state is taken out of `self` while flows run so both can be borrowed mutably.
    fn with_state(&mut self, f: impl FnOnce(&mut Self, &mut AppState<State>)) {
        if let Some(mut state) = self.state.take() {
            f(self, &mut state);
            self.state = Some(state);
        }
    }
}

pub(crate) enum FlowEvent<State: 'static, Event: 'static> {
    /// Sent by the web build once the context and flows were created asynchronously.
    #[allow(dead_code)]
    Initialized {
        state: AppState<State>,
        flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    },
}

impl<State, Event> Debug for FlowEvent<State, Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { state: _, flows } => {
                f.debug_struct("Initialized").field("flows", flows).finish()
            }
        }
    }
}

impl<State: 'static + Default, Event: Send + 'static> ApplicationHandler<FlowEvent<State, Event>>
    for App<State, Event>
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(constructors) = self.constructors.take() else {
            // Already initialized, e.g. when the app is resumed a second time.
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes =
            Window::default_attributes().with_title(self.scene.window.title.clone());

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let canvas = wgpu::web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(&self.scene.window.canvas_id));
            match canvas {
                Some(canvas) => {
                    window_attributes = window_attributes.with_canvas(Some(canvas.unchecked_into()));
                }
                None => {
                    log::error!("No canvas with id `{}` found", self.scene.window.canvas_id);
                    event_loop.exit();
                    return;
                }
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let scene = self.scene.clone();
        let init_future = async move {
            let app_state = AppState::new(window, &scene).await?;

            let flow_futures: Vec<_> = constructors
                .into_iter()
                // The clone in into() leverages the internal Arcs of Device and Queue and thus only clones the ref
                .map(|constructor| constructor((&app_state.ctx).into()))
                .collect();
            let flows: Vec<_> = futures::future::join_all(flow_futures).await;
            anyhow::Ok((app_state, flows))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok((mut app_state, flows)) => {
                    self.graphics_flows = flows;
                    let size = app_state.ctx.window.inner_size();
                    app_state.resize(size.width, size.height);
                    self.init_flows(&mut app_state);
                    app_state.ctx.window.request_redraw();
                    self.state = Some(app_state);
                }
                Err(e) => {
                    log::error!("App initialization failed. Cannot create the main context: {}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok((state, flows)) => {
                        if proxy
                            .send_event(FlowEvent::Initialized { state, flows })
                            .is_err()
                        {
                            log::error!("The event loop closed during initialization");
                        }
                    }
                    Err(e) => log::error!(
                        "App initialization failed. Cannot create the main context: {}",
                        e
                    ),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: FlowEvent<State, Event>) {
        match event {
            FlowEvent::Initialized {
                state: mut app_state,
                flows,
            } => {
                // This is the message from our wasm `spawn_local`
                self.graphics_flows = flows;

                // Important: Trigger a resize and redraw now that we are initialized
                let size = app_state.ctx.window.inner_size();
                app_state.resize(size.width, size.height);
                self.init_flows(&mut app_state);
                app_state.ctx.window.request_redraw();
                self.state = Some(app_state);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if self.state.is_none() && matches!(event, WindowEvent::CloseRequested) {
            event_loop.exit();
            return;
        }
        self.with_state(|app, state| {
            // general stuff
            state.ctx.camera.controller.handle_window_events(&event);

            let outputs: Vec<_> = app
                .graphics_flows
                .iter_mut()
                .map(|f| f.on_window_events(&state.ctx, &mut state.state, &event))
                .collect();
            outputs
                .into_iter()
                .for_each(|out| app.handle_flow_output(out));

            match event {
                WindowEvent::CloseRequested => state.ctx.stop.stop(),
                WindowEvent::Resized(size) => state.resize(size.width, size.height),
                WindowEvent::RedrawRequested => app.tick(state),
                WindowEvent::MouseInput {
                    state: ElementState::Released,
                    button: MouseButton::Left,
                    ..
                } => app.click(state),
                _ => {}
            }

            if state.ctx.stop.is_stopped() {
                event_loop.exit();
            }
        });
    }
}

/// Builds the event loop, the window (or canvas) and the context, constructs the flows and
/// runs them until the window is closed or the context's [`StopHandle`](crate::scheduler::StopHandle)
/// is triggered.
pub fn run<State: 'static + Default, Event: Send + 'static>(
    constructors: Vec<FlowConstructor<State, Event>>,
    scene: SceneConfig,
) -> anyhow::Result<()> {
    init_logger();

    let event_loop: EventLoop<FlowEvent<State, Event>> = EventLoop::with_user_event().build()?;

    #[allow(unused_mut)]
    let mut app: App<State, Event> = App::new(&event_loop, constructors, scene)?;

    #[cfg(not(target_arch = "wasm32"))]
    event_loop.run_app(&mut app)?;

    // The browser owns the loop; returning here keeps the page responsive.
    #[cfg(target_arch = "wasm32")]
    {
        use winit::platform::web::EventLoopExtWebSys;
        event_loop.spawn_app(app);
    }

    Ok(())
}

/// Sets up `env_logger` natively and `console_log` on the web. Safe to call more than once.
pub fn init_logger() {
    static LOGGER: std::sync::Once = std::sync::Once::new();
    LOGGER.call_once(|| {
        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Err(e) = env_logger::try_init() {
                eprintln!("Warning: Could not initialize logger: {}", e);
            };
        }

        #[cfg(target_arch = "wasm32")]
        {
            std::panic::set_hook(Box::new(|info| log::error!("{info}")));
            if let Err(e) = console_log::init_with_level(log::Level::Info) {
                wasm_bindgen::throw_str(&format!("Could not initialize logger: {e}"));
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimised_windows_keep_the_old_surface() {
        assert_eq!(surface_size(0, 600, 2048), None);
        assert_eq!(surface_size(800, 0, 2048), None);
    }

    #[test]
    fn surface_follows_the_window_within_the_limit() {
        assert_eq!(surface_size(800, 600, 2048), Some((800, 600)));
        assert_eq!(surface_size(2048, 1152, 2048), Some((2048, 1152)));
    }

    #[test]
    fn hidpi_canvas_is_scaled_to_the_texture_limit() {
        assert_eq!(surface_size(5120, 2880, 2048), Some((2048, 1152)));
        assert_eq!(surface_size(1440, 3200, 2048), Some((921, 2048)));
    }
}
