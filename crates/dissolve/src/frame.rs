//! Per-frame state.
//!
//! The frame step owns the animated values and writes them into the material's uniform
//! cells once per frame. Materials derived from the surface share those cells, so a
//! single write reaches the shadow material as well.
//!
//! Controls may edit `progress` through its cell between frames; [`FrameState::capture`]
//! takes such edits back before the next write.

use dissolve_core::{DissolveError, Result, SceneConfig};
use dissolve_render::ComposedMaterial;

/// Animated values written into the material every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    time: f32,
    progress: f32,
    time_step: f32,
}

impl FrameState {
    /// Creates frame state advancing `time` by `time_step` per frame.
    pub fn new(time_step: f32) -> Self {
        Self {
            time: 0.0,
            progress: 0.0,
            time_step,
        }
    }

    /// Creates frame state from the scene configuration.
    pub fn from_config(config: &SceneConfig) -> Self {
        Self::new(config.time_step)
    }

    /// Returns the accumulated time.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Returns the dissolve progress.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Returns the time step.
    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    /// Sets the dissolve progress, clamped to `[0, 1]`.
    pub fn set_progress(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    /// Advances time by one step.
    pub fn tick(&mut self) {
        self.time += self.time_step;
    }

    /// Takes the current `progress` from `material`, keeping edits made through its cell.
    pub fn capture(&mut self, material: &ComposedMaterial) -> Result<()> {
        let value = material
            .uniforms()
            .value("progress")
            .ok_or_else(|| DissolveError::UniformNotFound("progress".to_string()))?;
        let progress = value.as_float().ok_or(DissolveError::UniformTypeMismatch {
            name: "progress".to_string(),
            expected: "float",
            actual: value.kind_name(),
        })?;
        self.set_progress(progress);
        Ok(())
    }

    /// Writes `time` and `progress` into `material`.
    pub fn apply(&self, material: &ComposedMaterial) -> Result<()> {
        material.set_uniform("time", self.time)?;
        material.set_uniform("progress", self.progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dissolve_core::UniformValue;
    use dissolve_render::{dissolve_overrides, Overrides, TemplateCatalog, STANDARD};

    fn material() -> ComposedMaterial {
        TemplateCatalog::new()
            .compose(STANDARD, &dissolve_overrides())
            .unwrap()
    }

    #[test]
    fn test_tick_accumulates() {
        let mut frame = FrameState::new(0.01);
        for _ in 0..10 {
            frame.tick();
        }
        assert!((frame.time() - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_apply_writes_time_and_progress() {
        let material = material();
        let mut frame = FrameState::new(0.5);
        frame.tick();
        frame.tick();
        frame.set_progress(0.4);
        frame.apply(&material).unwrap();

        assert_eq!(material.uniforms().value("time"), Some(UniformValue::Float(1.0)));
        assert_eq!(material.uniforms().value("progress"), Some(UniformValue::Float(0.4)));
    }

    #[test]
    fn test_progress_clamped() {
        let mut frame = FrameState::new(0.01);
        frame.set_progress(1.5);
        assert_eq!(frame.progress(), 1.0);
        frame.set_progress(-2.0);
        assert_eq!(frame.progress(), 0.0);
    }

    #[test]
    fn test_capture_keeps_cell_edits() {
        let material = material();
        let mut frame = FrameState::new(0.01);

        material
            .uniform("progress")
            .unwrap()
            .cell()
            .set(UniformValue::Float(0.7));
        frame.capture(&material).unwrap();
        frame.tick();
        frame.apply(&material).unwrap();

        assert_eq!(frame.progress(), 0.7);
        assert_eq!(material.uniforms().value("progress"), Some(UniformValue::Float(0.7)));
    }

    #[test]
    fn test_apply_requires_effect_uniforms() {
        let plain = TemplateCatalog::new()
            .compose(STANDARD, &Overrides::new())
            .unwrap();
        assert!(FrameState::new(0.01).apply(&plain).is_err());
    }
}
