//! Core types for dissolve-rs.
//!
//! This crate provides the renderer-independent pieces of the dissolve effect:
//! - [`UniformValue`], [`UniformCell`] and [`UniformTable`] for material uniforms,
//!   including value cells shared between a material and its derivations
//! - [`MeshGeometry`] preprocessing that derives the per-triangle `aRandom` and
//!   `aCenter` attributes
//! - [`SceneConfig`] describing the scene around the dissolving subject

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Color channels are converted from bytes
#![allow(clippy::cast_precision_loss)]

pub mod error;
pub mod geometry;
pub mod options;
pub mod uniform;

pub use error::{DissolveError, Result};
pub use geometry::{
    derive_dissolve_attributes, derive_dissolve_attributes_from_buffer, DissolveAttributes,
    MeshGeometry, CENTER_ATTRIBUTE, RANDOM_ATTRIBUTE,
};
pub use options::{
    AmbientLightConfig, CameraConfig, GroundConfig, RendererConfig, SceneConfig, ShadowConfig,
    SpotLightConfig, Subject,
};
pub use uniform::{color_from_hex, Uniform, UniformCell, UniformSpec, UniformTable, UniformValue};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
