use flow_showcase::{
    config::ModelConfig,
    scheduler::{FrameClock, StopHandle, TickPhase},
    showcase::{RotatingModel, ShowcaseState},
};

fn angle(state: &ShowcaseState<()>) -> f32 {
    let rotation = state.model.as_ref().unwrap().transform.rotation;
    2.0 * rotation.v.y.atan2(rotation.s)
}

#[test]
fn clicks_and_frames_interleave() {
    let mut state = ShowcaseState::<()>::default();

    // Frames and clicks before the model arrives change nothing.
    assert!(state.advance().is_none());
    assert!(!state.toggle_rotation());

    state.on_model_loaded(Ok(RotatingModel::new((), &ModelConfig::default())));
    for _ in 0..10 {
        state.advance();
    }
    assert!((angle(&state) - 0.1).abs() < 1e-5);

    assert!(state.toggle_rotation());
    for _ in 0..4 {
        state.advance();
    }
    assert!((angle(&state) - 0.06).abs() < 1e-5);

    // An even number of clicks leaves the direction as it was.
    state.toggle_rotation();
    state.toggle_rotation();
    assert_eq!(state.model.as_ref().unwrap().speed.value(), -0.01);
}

#[test]
fn configured_speed_is_used_as_is() {
    let config = ModelConfig {
        rotation_speed: 0.5,
        ..ModelConfig::default()
    };
    let mut state = ShowcaseState::<()>::default();
    state.on_model_loaded(Ok(RotatingModel::new((), &config)));
    state.advance();
    assert!((angle(&state) - 0.5).abs() < 1e-5);
}

#[test]
fn a_tick_rotates_before_it_renders() {
    let rotate = TickPhase::ORDER.iter().position(|p| *p == TickPhase::Rotate);
    let render = TickPhase::ORDER.iter().position(|p| *p == TickPhase::Render);
    assert!(rotate < render);
}

#[test]
fn stop_is_shared_between_clones() {
    let stop = StopHandle::new();
    let clone = stop.clone();
    clone.stop();
    assert!(stop.is_stopped());

    let mut clock = FrameClock::new();
    clock.tick();
    clock.tick();
    assert_eq!(clock.frames(), 2);
}
