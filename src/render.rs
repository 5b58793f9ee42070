//! Render composition and pipeline batching.
//!
//! Flows describe what they want drawn each frame with a [`Render`] tree. The app sorts the
//! tree into one batch per pipeline with [`Render::set_pipelines`] and then draws the batches
//! in a fixed order: backdrops, opaque models, transparent models.

use crate::data_structures::model::Model;

/// A model drawn through its own instance buffer.
pub struct Instanced<'a> {
    pub model: &'a Model,
}

/// Specifies how a flow's objects should be rendered.
///
/// - `None` renders nothing
/// - `Background(bind_group)` fills the screen with a texture before anything else
/// - `Opaque(Instanced)` renders a single sided, non-blended model
/// - `Transparent(Instanced)` renders a model with the configured model material pipeline
/// - `Composed(Vec<Render>)` recursively renders a composition of multiple renders
pub enum Render<'a> {
    None,
    Background(&'a wgpu::BindGroup),
    Opaque(Instanced<'a>),
    Transparent(Instanced<'a>),
    Composed(Vec<Render<'a>>),
}

/// One frame's worth of draws, grouped by pipeline.
#[derive(Default)]
pub struct Batches<'a> {
    pub backgrounds: Vec<&'a wgpu::BindGroup>,
    pub opaques: Vec<Instanced<'a>>,
    pub transparents: Vec<Instanced<'a>>,
}

impl<'a> Batches<'a> {
    pub fn is_empty(&self) -> bool {
        self.backgrounds.is_empty() && self.opaques.is_empty() && self.transparents.is_empty()
    }
}

impl<'a> Render<'a> {
    pub fn set_pipelines(self, batches: &mut Batches<'a>) {
        match self {
            Render::Background(group) => batches.backgrounds.push(group),
            Render::Opaque(instanced) => batches.opaques.push(instanced),
            Render::Transparent(instanced) => batches.transparents.push(instanced),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(batches)),
            Render::None => (),
        }
    }
}

impl<'a> From<&'a Model> for Instanced<'a> {
    fn from(model: &'a Model) -> Self {
        Instanced { model }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_to_draw_leaves_every_batch_empty() {
        let mut batches = Batches::default();
        Render::Composed(vec![Render::None, Render::Composed(vec![Render::None])])
            .set_pipelines(&mut batches);
        assert!(batches.is_empty());
    }
}
