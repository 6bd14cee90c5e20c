//! dissolve-rs: shader material composition for a dissolving-mesh effect.
//!
//! A mesh breaks apart into its triangles as a `progress` uniform rises. The effect
//! is built by splicing custom shader code into a host engine's built-in materials
//! instead of replacing them, so lighting and shadows keep working.
//!
//! # Quick Start
//!
//! ```
//! use dissolve::*;
//!
//! fn main() -> Result<()> {
//!     let catalog = TemplateCatalog::new();
//!     let mut scene = DissolveScene::build(SceneConfig::default(), &catalog)?;
//!
//!     let triangle = MeshGeometry::new(vec![
//!         Vec3::new(0.0, 0.0, 0.0),
//!         Vec3::new(3.0, 0.0, 0.0),
//!         Vec3::new(0.0, 3.0, 0.0),
//!     ]);
//!     let prepared = scene.prepare_geometry(&triangle)?;
//!     assert_eq!(prepared.attributes.a_center[0], Vec3::new(1.0, 1.0, 0.0));
//!
//!     scene.set_progress(0.5)?;
//!     scene.frame()?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`MaterialTemplate`]s expose named splice anchors; [`compose`] inserts
//!   [`Overrides`] at those anchors and merges uniforms into a [`ComposedMaterial`]
//! - `mixed` uniforms are shared cells, so a material derived from a composed
//!   material (the shadow depth material) follows every write to the original
//! - [`MeshGeometry`] is flattened and given per-triangle `aRandom` and `aCenter`
//!   attributes
//! - [`DissolveScene`] assembles the surface and depth materials, a
//!   [`ControlPanel`], and the [`FrameState`] that writes `time` and `progress`

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::float_cmp)]

pub mod controls;
pub mod frame;
pub mod scene;

// Re-export core types
pub use dissolve_core::{
    color_from_hex, derive_dissolve_attributes, derive_dissolve_attributes_from_buffer,
    error::{DissolveError, Result},
    options::{
        AmbientLightConfig, CameraConfig, GroundConfig, RendererConfig, SceneConfig,
        ShadowConfig, SpotLightConfig, Subject,
    },
    DissolveAttributes, Mat4, MeshGeometry, Uniform, UniformCell, UniformSpec, UniformTable,
    UniformValue, Vec2, Vec3, Vec4, CENTER_ATTRIBUTE, RANDOM_ATTRIBUTE,
};

// Re-export material composition
pub use dissolve_render::{
    compose, depth_template, dissolve_overrides, parse_splice_override, standard_template,
    ComposedMaterial, Injection, MaterialBase, MaterialTemplate, Overrides, OverridesDef,
    ShaderSource, ShaderStage, SpliceAnchor, SpliceOverride, TemplateCatalog, UniformBlock,
    DEPTH, STANDARD,
};

pub use controls::{dissolve_controls, Control, ControlKind, ControlPanel};
pub use frame::FrameState;
pub use scene::{DissolveScene, PreparedMesh, DEPTH_MATERIAL_NAME};
