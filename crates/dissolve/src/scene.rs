//! Dissolve scene assembly.

use dissolve_core::{DissolveAttributes, MeshGeometry, Result, SceneConfig, UniformValue};
use dissolve_render::{
    dissolve_overrides, ComposedMaterial, Overrides, TemplateCatalog, DEPTH, STANDARD,
};
use rand::Rng;

use crate::controls::{dissolve_controls, ControlPanel};
use crate::frame::FrameState;

/// Name given to the derived shadow material.
pub const DEPTH_MATERIAL_NAME: &str = "dissolve-depth";

/// A flattened mesh and its dissolve attributes, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMesh {
    /// Non-indexed geometry.
    pub geometry: MeshGeometry,
    /// `aRandom` and `aCenter` per vertex.
    pub attributes: DissolveAttributes,
}

/// The surface and shadow materials of a dissolving subject, plus the controls and
/// frame state that drive them.
#[derive(Debug)]
pub struct DissolveScene {
    config: SceneConfig,
    surface: ComposedMaterial,
    depth: ComposedMaterial,
    controls: ControlPanel,
    frame: FrameState,
}

impl DissolveScene {
    /// Builds the scene materials from `catalog`.
    ///
    /// The surface is the `standard` template with the dissolve overrides and the
    /// configured diffuse color. The depth material derives from `depth` with the
    /// surface as its template, so it shares the surface's effect uniforms.
    pub fn build(config: SceneConfig, catalog: &TemplateCatalog) -> Result<Self> {
        config.validate()?;

        let surface = catalog.compose(STANDARD, &dissolve_overrides())?;
        surface.set_uniform("diffuse", UniformValue::Color(config.diffuse_color))?;

        let depth = catalog.compose(
            DEPTH,
            &Overrides::new().named(DEPTH_MATERIAL_NAME).template(&surface),
        )?;

        let controls = dissolve_controls(&surface)?;
        let frame = FrameState::from_config(&config);
        frame.apply(&surface)?;

        log::info!(
            "dissolve scene built: surface '{}' ({} uniforms), depth '{}' sharing {:?}",
            surface.name(),
            surface.uniforms().len(),
            depth.name(),
            depth.mixed_uniforms()
        );

        Ok(Self {
            config,
            surface,
            depth,
            controls,
            frame,
        })
    }

    /// Returns the scene configuration.
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Returns the surface material.
    pub fn surface(&self) -> &ComposedMaterial {
        &self.surface
    }

    /// Returns the shadow depth material.
    pub fn depth(&self) -> &ComposedMaterial {
        &self.depth
    }

    /// Returns the control panel.
    pub fn controls(&self) -> &ControlPanel {
        &self.controls
    }

    /// Returns the frame state.
    pub fn frame_state(&self) -> &FrameState {
        &self.frame
    }

    /// Sets the dissolve progress, clamped to `[0, 1]`, and writes it to the materials.
    pub fn set_progress(&mut self, progress: f32) -> Result<()> {
        self.frame.set_progress(progress);
        self.surface.set_uniform("progress", self.frame.progress())
    }

    /// Writes a value through the labelled control.
    pub fn set_control(&self, label: &str, value: impl Into<UniformValue>) -> Result<()> {
        self.controls.set(label, value)
    }

    /// Flattens `geometry` and derives its dissolve attributes.
    pub fn prepare_geometry(&self, geometry: &MeshGeometry) -> Result<PreparedMesh> {
        self.prepare_geometry_with(geometry, &mut rand::thread_rng())
    }

    /// Like [`prepare_geometry`](Self::prepare_geometry), with a caller-supplied
    /// random source.
    pub fn prepare_geometry_with<R: Rng>(
        &self,
        geometry: &MeshGeometry,
        rng: &mut R,
    ) -> Result<PreparedMesh> {
        let geometry = geometry.to_non_indexed()?;
        let attributes = dissolve_core::derive_dissolve_attributes(&geometry, rng)?;
        log::debug!(
            "prepared {} triangles for '{}'",
            geometry.triangle_count(),
            self.surface.name()
        );
        Ok(PreparedMesh {
            geometry,
            attributes,
        })
    }

    /// Advances one frame: takes any `progress` edit made through the controls, ticks
    /// time, and writes the frame state into the materials.
    pub fn frame(&mut self) -> Result<()> {
        self.frame.capture(&self.surface)?;
        self.frame.tick();
        self.frame.apply(&self.surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dissolve_core::{color_from_hex, Vec3};

    fn scene() -> DissolveScene {
        DissolveScene::build(SceneConfig::default(), &TemplateCatalog::new()).unwrap()
    }

    #[test]
    fn test_build() {
        let scene = scene();
        assert_eq!(scene.surface().name(), "dissolve");
        assert_eq!(scene.depth().name(), DEPTH_MATERIAL_NAME);
        assert_eq!(scene.depth().template_name(), DEPTH);
        assert_eq!(
            scene.surface().uniforms().value("diffuse"),
            Some(UniformValue::Color(color_from_hex(0xadadff)))
        );
        assert_eq!(scene.controls().len(), 4);
    }

    #[test]
    fn test_depth_deforms_with_surface() {
        let scene = scene();
        let vertex = scene.depth().vertex_source();
        assert!(vertex.contains("attribute vec3 aCenter;"));
        assert!(vertex.contains("transformed -= aCenter;"));
        assert!(!scene.depth().fragment_source().contains("mixcolor"));
    }

    #[test]
    fn test_frame_advances_shared_time() {
        let mut scene = scene();
        scene.frame().unwrap();
        scene.frame().unwrap();

        let time = scene.depth().uniforms().value("time").unwrap().as_float().unwrap();
        assert!((time - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_progress_control_survives_frame() {
        let mut scene = scene();
        scene.controls().set("progress", 0.6).unwrap();
        scene.frame().unwrap();

        assert!((scene.frame_state().progress() - 0.6).abs() < 1e-6);
        let progress = scene.depth().uniforms().value("progress").and_then(|v| v.as_float());
        assert!((progress.unwrap() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_direct_cell_write_survives_frame() {
        let mut scene = scene();
        scene
            .surface()
            .uniform("progress")
            .unwrap()
            .cell()
            .set(UniformValue::Float(0.25));
        scene.frame().unwrap();
        scene.frame().unwrap();

        assert_eq!(
            scene.surface().uniforms().value("progress"),
            Some(UniformValue::Float(0.25))
        );
    }

    #[test]
    fn test_set_progress_writes_materials() {
        let mut scene = scene();
        scene.set_progress(1.4).unwrap();

        assert_eq!(scene.frame_state().progress(), 1.0);
        assert_eq!(scene.depth().uniforms().value("progress"), Some(UniformValue::Float(1.0)));
        scene.frame().unwrap();
        assert_eq!(scene.depth().uniforms().value("progress"), Some(UniformValue::Float(1.0)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SceneConfig::default();
        config.camera.near = 200.0;
        assert!(DissolveScene::build(config, &TemplateCatalog::new()).is_err());
    }

    #[test]
    fn test_prepare_indexed_geometry() {
        let scene = scene();
        let quad = MeshGeometry::indexed(
            vec![
                Vec3::ZERO,
                Vec3::X,
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::Y,
            ],
            vec![0, 1, 2, 0, 2, 3],
        );
        let prepared = scene.prepare_geometry(&quad).unwrap();
        assert!(!prepared.geometry.is_indexed());
        assert_eq!(prepared.geometry.vertex_count(), 6);
        assert_eq!(prepared.attributes.len(), 6);
    }
}
