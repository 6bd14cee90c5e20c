//! Material composition for dissolve-rs.
//!
//! This crate extends built-in materials with custom shader code:
//! - [`MaterialTemplate`]s whose stage sources are addressable by [`SpliceAnchor`]
//! - a [`TemplateCatalog`] of the built-in `standard` and `depth` templates
//! - [`compose`], which splices [`Overrides`] into a base and merges uniforms
//! - [`UniformBlock`] std140 packing for upload
//! - the dissolve effect preset and JSON override definitions

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod compositor;
pub mod layout;
pub mod preset;
pub mod template;

pub use catalog::{depth_template, standard_template, TemplateCatalog, DEPTH, STANDARD};
pub use compositor::{
    compose, ComposedMaterial, Injection, MaterialBase, Overrides, SpliceOverride,
};
pub use layout::{BlockEntry, UniformBlock};
pub use preset::{dissolve_overrides, parse_splice_override, OverridesDef};
pub use template::{MaterialTemplate, Region, ShaderSource, ShaderStage, SpliceAnchor};
