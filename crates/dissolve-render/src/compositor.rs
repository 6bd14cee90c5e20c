//! Material composition.
//!
//! [`compose`] turns a base material plus [`Overrides`] into a [`ComposedMaterial`]:
//! header code goes right after each stage's preamble, splice code goes to named
//! anchors, and custom uniforms are merged over the base defaults.
//!
//! Uniforms declared `mixed` are shared by cell, not copied, with every material
//! derived from the one that declares them. Writing such a uniform on any of those
//! materials is visible on all of them.

use std::collections::BTreeMap;

use dissolve_core::{DissolveError, Result, Uniform, UniformSpec, UniformTable, UniformValue};

use crate::layout::UniformBlock;
use crate::template::{MaterialTemplate, ShaderSource, ShaderStage, SpliceAnchor};

/// Code to insert at splice anchors, keyed by anchor.
pub type SpliceOverride = BTreeMap<SpliceAnchor, String>;

/// Code a composition inserted at one anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    /// Where the code was inserted.
    pub anchor: SpliceAnchor,
    /// The inserted code.
    pub code: String,
}

/// Customizations applied on top of a base material.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Name for the composed material.
    pub name: Option<String>,
    /// Code inserted after the vertex preamble.
    pub vertex_header: Option<String>,
    /// Code inserted after the fragment preamble.
    pub fragment_header: Option<String>,
    /// Code inserted at splice anchors.
    pub splices: SpliceOverride,
    /// Custom uniforms, applied in order.
    pub uniforms: Vec<UniformSpec>,
    /// Parent material whose vertex injections and `mixed` uniforms are inherited.
    pub template: Option<ComposedMaterial>,
}

impl Overrides {
    /// Creates empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the composed material's name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the vertex header code.
    #[must_use]
    pub fn vertex_header(mut self, code: impl Into<String>) -> Self {
        self.vertex_header = Some(code.into());
        self
    }

    /// Sets the fragment header code.
    #[must_use]
    pub fn fragment_header(mut self, code: impl Into<String>) -> Self {
        self.fragment_header = Some(code.into());
        self
    }

    /// Sets the code for one splice anchor.
    #[must_use]
    pub fn splice(mut self, anchor: SpliceAnchor, code: impl Into<String>) -> Self {
        self.splices.insert(anchor, code.into());
        self
    }

    /// Adds a custom uniform.
    #[must_use]
    pub fn uniform(mut self, spec: UniformSpec) -> Self {
        self.uniforms.push(spec);
        self
    }

    /// Derives from `parent`: replays its vertex injections and shares its `mixed`
    /// uniform cells.
    ///
    /// The base of such a composition must be a [`MaterialTemplate`]. A composed base
    /// already carries its own injections, and replaying a parent's header on top of
    /// them would declare the same symbols twice, so [`compose`] rejects it.
    #[must_use]
    pub fn template(mut self, parent: &ComposedMaterial) -> Self {
        self.template = Some(parent.clone());
        self
    }
}

/// Base of a composition.
#[derive(Debug, Clone, Copy)]
pub enum MaterialBase<'a> {
    /// A built-in template: start from its default sources and uniforms.
    Template(&'a MaterialTemplate),
    /// A previous composition: start from its composed sources and inherit its uniforms.
    Composed(&'a ComposedMaterial),
}

impl<'a> From<&'a MaterialTemplate> for MaterialBase<'a> {
    fn from(template: &'a MaterialTemplate) -> Self {
        Self::Template(template)
    }
}

impl<'a> From<&'a ComposedMaterial> for MaterialBase<'a> {
    fn from(material: &'a ComposedMaterial) -> Self {
        Self::Composed(material)
    }
}

/// A material with composed shader sources and a merged uniform table.
///
/// Sources never change after composition; only uniform values do.
#[derive(Debug, Clone)]
pub struct ComposedMaterial {
    name: String,
    template_name: String,
    vertex: ShaderSource,
    fragment: ShaderSource,
    uniforms: UniformTable,
    injections: Vec<Injection>,
}

impl ComposedMaterial {
    /// Returns the material name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name of the template the sources were built from.
    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    /// Returns the composed source of a stage as regions.
    pub fn source(&self, stage: ShaderStage) -> &ShaderSource {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    /// Renders the composed vertex shader.
    pub fn vertex_source(&self) -> String {
        self.vertex.render()
    }

    /// Renders the composed fragment shader.
    pub fn fragment_source(&self) -> String {
        self.fragment.render()
    }

    /// Returns the merged uniform table.
    pub fn uniforms(&self) -> &UniformTable {
        &self.uniforms
    }

    /// Returns a uniform by name.
    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.get(name)
    }

    /// Writes a uniform value. Shared cells propagate the write to related materials.
    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) -> Result<()> {
        self.uniforms.set(name, value)
    }

    /// Returns the names of the uniforms shared with derived materials.
    pub fn mixed_uniforms(&self) -> Vec<&str> {
        self.uniforms.mixed().map(|(name, _)| name).collect()
    }

    /// Returns the names of the uniforms in the linked contract.
    pub fn linked_uniforms(&self) -> Vec<&str> {
        self.uniforms.linked().map(|(name, _)| name).collect()
    }

    /// Returns every injection applied to this material, in application order.
    pub fn injections(&self) -> &[Injection] {
        &self.injections
    }

    /// Packs the current uniform values into a std140 block.
    pub fn uniform_block(&self) -> UniformBlock {
        UniformBlock::from_table(&self.uniforms)
    }
}

/// Composes a material from `base` and `overrides`.
///
/// Steps, in order:
/// 1. resolve the base sources and uniforms (a composed base passes its `mixed`
///    cells through and copies the rest)
/// 2. with `overrides.template`, replay the parent's vertex injections and share its
///    `mixed` cells
/// 3. insert the headers, then the splices
/// 4. merge the uniform specs; a spec naming an inherited `mixed` uniform writes its
///    value into the shared cell, any other spec installs a fresh cell
///
/// Fails with [`DissolveError::UnknownSpliceAnchor`] if any requested or replayed
/// anchor is missing from the resolved base, with
/// [`DissolveError::InvalidBaseTemplate`] if `overrides.template` is combined with a
/// composed base, and with [`DissolveError::UniformTypeMismatch`] if a spec changes
/// the kind of a shared uniform. On error nothing is produced.
pub fn compose<'a>(
    base: impl Into<MaterialBase<'a>>,
    overrides: &Overrides,
) -> Result<ComposedMaterial> {
    let base = base.into();
    if let (MaterialBase::Composed(existing), Some(parent)) = (base, &overrides.template) {
        return Err(DissolveError::InvalidBaseTemplate(format!(
            "cannot derive from '{}' on top of composed material '{}'",
            parent.name, existing.name
        )));
    }

    let mut material = match base {
        MaterialBase::Template(template) => ComposedMaterial {
            name: String::new(),
            template_name: template.name().to_string(),
            vertex: template.source(ShaderStage::Vertex).clone(),
            fragment: template.source(ShaderStage::Fragment).clone(),
            uniforms: template.default_uniforms(),
            injections: Vec::new(),
        },
        MaterialBase::Composed(parent) => ComposedMaterial {
            name: String::new(),
            template_name: parent.template_name.clone(),
            vertex: parent.vertex.clone(),
            fragment: parent.fragment.clone(),
            uniforms: inherit_uniforms(&parent.uniforms),
            injections: parent.injections.clone(),
        },
    };

    if let Some(parent) = &overrides.template {
        for injection in parent
            .injections
            .iter()
            .filter(|i| i.anchor.stage() == ShaderStage::Vertex)
        {
            material.inject(injection.anchor, &injection.code)?;
        }
        for (name, uniform) in parent.uniforms.mixed() {
            material.uniforms.insert(name, uniform.clone());
        }
    }

    if let Some(code) = &overrides.vertex_header {
        material.inject(SpliceAnchor::VertexHeader, code)?;
    }
    if let Some(code) = &overrides.fragment_header {
        material.inject(SpliceAnchor::FragmentHeader, code)?;
    }
    for (anchor, code) in &overrides.splices {
        material.inject(*anchor, code)?;
    }

    for spec in &overrides.uniforms {
        material.check_shared_kind(spec)?;
    }
    for spec in &overrides.uniforms {
        material.merge_uniform(spec);
    }

    material.name = overrides
        .name
        .clone()
        .unwrap_or_else(|| format!("{}+extended", material.template_name));

    log::debug!(
        "composed material '{}' from '{}': {} injections, {} uniforms ({} mixed)",
        material.name,
        material.template_name,
        material.injections.len(),
        material.uniforms.len(),
        material.uniforms.mixed().count()
    );

    Ok(material)
}

impl ComposedMaterial {
    fn check_shared_kind(&self, spec: &UniformSpec) -> Result<()> {
        match self.uniforms.get(&spec.name) {
            Some(existing) if existing.is_mixed() && !existing.value().same_kind(&spec.value) => {
                Err(DissolveError::UniformTypeMismatch {
                    name: spec.name.clone(),
                    expected: existing.value().kind_name(),
                    actual: spec.value.kind_name(),
                })
            }
            _ => Ok(()),
        }
    }

    fn merge_uniform(&mut self, spec: &UniformSpec) {
        let uniform = match self.uniforms.get(&spec.name) {
            Some(existing) if existing.is_mixed() => {
                existing.cell().set(spec.value);
                Uniform::new(existing.cell().clone(), true, existing.is_linked() || spec.linked)
            }
            _ => Uniform::from(spec),
        };
        self.uniforms.insert(spec.name.clone(), uniform);
    }

    fn inject(&mut self, anchor: SpliceAnchor, code: &str) -> Result<()> {
        let source = match anchor.stage() {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::Fragment => &mut self.fragment,
        };
        if !source.insert_at(anchor, code) {
            return Err(DissolveError::UnknownSpliceAnchor {
                anchor: anchor.to_string(),
                template: self.template_name.clone(),
            });
        }
        self.injections.push(Injection {
            anchor,
            code: code.to_string(),
        });
        Ok(())
    }
}

/// Copies a composed material's uniforms for use as a new base: `mixed` cells are
/// shared, every other uniform gets its own cell holding the current value.
fn inherit_uniforms(table: &UniformTable) -> UniformTable {
    let mut inherited = UniformTable::new();
    for (name, uniform) in table.iter() {
        let uniform = if uniform.is_mixed() {
            uniform.clone()
        } else {
            Uniform::new(uniform.cell().detached(), false, uniform.is_linked())
        };
        inherited.insert(name, uniform);
    }
    inherited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{depth_template, standard_template};
    use proptest::prelude::*;

    fn progress_overrides() -> Overrides {
        Overrides::new()
            .splice(SpliceAnchor::VertexTransformEnd, "transformed += 1.0;")
            .uniform(UniformSpec::shared("progress", 0.0))
    }

    #[test]
    fn test_splice_after_transform_block() {
        let material = compose(&standard_template(), &progress_overrides()).unwrap();

        assert!(material
            .vertex_source()
            .contains("\tvec3 transformed = vec3( position );\ntransformed += 1.0;\n"));
        assert_eq!(
            material.uniforms().value("progress"),
            Some(UniformValue::Float(0.0))
        );
        assert_eq!(material.name(), "standard+extended");
        assert_eq!(material.template_name(), "standard");
    }

    #[test]
    fn test_base_defaults_kept_and_overridden() {
        let overrides = Overrides::new().uniform(UniformSpec::new("roughness", 0.35));
        let material = compose(&standard_template(), &overrides).unwrap();

        assert_eq!(material.uniforms().value("roughness"), Some(UniformValue::Float(0.35)));
        assert_eq!(material.uniforms().value("metalness"), Some(UniformValue::Float(0.0)));
        assert!(material.mixed_uniforms().is_empty());
    }

    #[test]
    fn test_headers_precede_splices() {
        let overrides = Overrides::new()
            .vertex_header("uniform float uWave;")
            .fragment_header("uniform vec3 uTint;")
            .splice(SpliceAnchor::VertexBegin, "float w = uWave;")
            .splice(SpliceAnchor::FragmentColorEnd, "gl_FragColor.rgb *= uTint;");
        let material = compose(&standard_template(), &overrides).unwrap();

        let vertex = material.vertex_source();
        let header = vertex.find("uniform float uWave;").unwrap();
        assert!(header < vertex.find("void main()").unwrap());
        assert!(header < vertex.find("float w = uWave;").unwrap());
        assert!(vertex.find("#include <common>").unwrap() < header);

        let fragment = material.fragment_source();
        let header = fragment.find("uniform vec3 uTint;").unwrap();
        assert!(header < fragment.find("gl_FragColor.rgb *= uTint;").unwrap());
    }

    #[test]
    fn test_unknown_anchor_is_error() {
        let overrides =
            Overrides::new().splice(SpliceAnchor::FragmentColorEnd, "gl_FragColor.r = 1.0;");
        let err = compose(&depth_template(), &overrides).unwrap_err();
        match err {
            DissolveError::UnknownSpliceAnchor { anchor, template } => {
                assert_eq!(anchor, "fragment-color-end");
                assert_eq!(template, "depth");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_derive_from_composed_shares_mixed_cells() {
        let base = compose(&standard_template(), &progress_overrides()).unwrap();
        let derived = compose(&base, &Overrides::new()).unwrap();

        derived.set_uniform("progress", 0.5).unwrap();
        assert_eq!(base.uniforms().value("progress"), Some(UniformValue::Float(0.5)));
        assert_eq!(derived.vertex_source(), base.vertex_source());

        // Plain uniforms are copied, not shared
        derived.set_uniform("roughness", 0.2).unwrap();
        assert_eq!(base.uniforms().value("roughness"), Some(UniformValue::Float(1.0)));
    }

    #[test]
    fn test_template_derivation_replays_vertex_only() {
        let surface = compose(
            &standard_template(),
            &progress_overrides().fragment_header("uniform vec3 mixcolor;"),
        )
        .unwrap();
        let depth = compose(&depth_template(), &Overrides::new().template(&surface)).unwrap();

        assert!(depth.vertex_source().contains("transformed += 1.0;"));
        assert!(!depth.fragment_source().contains("mixcolor"));
        assert!(depth.fragment_source().contains("packDepthToRGBA"));
        assert_eq!(depth.template_name(), "depth");

        let surface_cell = surface.uniform("progress").unwrap().cell();
        let depth_cell = depth.uniform("progress").unwrap().cell();
        assert!(surface_cell.shares_with(depth_cell));

        // Base-only uniforms of the parent are not inherited
        assert!(depth.uniform("roughness").is_none());
    }

    #[test]
    fn test_override_of_inherited_mixed_uniform_stays_shared() {
        let base = compose(&standard_template(), &progress_overrides()).unwrap();
        let overrides = Overrides::new().uniform(UniformSpec::new("progress", 0.25));
        let derived = compose(&base, &overrides).unwrap();

        assert_eq!(derived.uniforms().value("progress"), Some(UniformValue::Float(0.25)));
        assert_eq!(base.uniforms().value("progress"), Some(UniformValue::Float(0.25)));
        assert!(derived.uniform("progress").unwrap().is_mixed());

        base.set_uniform("progress", 0.5).unwrap();
        assert_eq!(derived.uniforms().value("progress"), Some(UniformValue::Float(0.5)));
    }

    #[test]
    fn test_override_of_template_shared_uniform_stays_shared() {
        let surface = compose(&standard_template(), &progress_overrides()).unwrap();
        let overrides = Overrides::new()
            .template(&surface)
            .uniform(UniformSpec::new("progress", 0.1));
        let depth = compose(&depth_template(), &overrides).unwrap();

        surface.set_uniform("progress", 0.9).unwrap();
        assert_eq!(depth.uniforms().value("progress"), Some(UniformValue::Float(0.9)));
    }

    #[test]
    fn test_override_of_plain_inherited_uniform_gets_new_cell() {
        let base = compose(&standard_template(), &progress_overrides()).unwrap();
        let overrides = Overrides::new().uniform(UniformSpec::new("roughness", 0.25));
        let derived = compose(&base, &overrides).unwrap();

        assert_eq!(derived.uniforms().value("roughness"), Some(UniformValue::Float(0.25)));
        assert_eq!(base.uniforms().value("roughness"), Some(UniformValue::Float(1.0)));
    }

    #[test]
    fn test_override_cannot_change_shared_kind() {
        let base = compose(&standard_template(), &progress_overrides()).unwrap();
        let overrides = Overrides::new().uniform(UniformSpec::new("progress", true));
        let err = compose(&base, &overrides).unwrap_err();

        assert!(matches!(err, DissolveError::UniformTypeMismatch { .. }));
        assert_eq!(base.uniforms().value("progress"), Some(UniformValue::Float(0.0)));
    }

    #[test]
    fn test_template_derivation_needs_template_base() {
        let surface = compose(&standard_template(), &progress_overrides()).unwrap();
        let derived = compose(&surface, &Overrides::new()).unwrap();

        let err = compose(&derived, &Overrides::new().template(&surface)).unwrap_err();
        assert!(matches!(err, DissolveError::InvalidBaseTemplate(_)));
    }

    #[test]
    fn test_repeated_composition_appends_at_anchor() {
        let first = compose(&standard_template(), &progress_overrides()).unwrap();
        let second = compose(
            &first,
            &Overrides::new().splice(SpliceAnchor::VertexTransformEnd, "transformed *= 2.0;"),
        )
        .unwrap();

        let vertex = second.vertex_source();
        let first_code = vertex.find("transformed += 1.0;").unwrap();
        let second_code = vertex.find("transformed *= 2.0;").unwrap();
        assert!(first_code < second_code);
        assert_eq!(second.injections().len(), 2);
    }

    fn anchor_strategy() -> impl Strategy<Value = SpliceAnchor> {
        prop::sample::select(SpliceAnchor::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn prop_compose_is_deterministic(
            anchor in anchor_strategy(),
            code in "[a-z ;=+.0-9]{0,40}",
            value in -10.0f32..10.0,
        ) {
            let overrides = Overrides::new()
                .splice(anchor, code)
                .uniform(UniformSpec::shared("u", value));
            let template = standard_template();
            let a = compose(&template, &overrides).unwrap();
            let b = compose(&template, &overrides).unwrap();

            prop_assert_eq!(a.vertex_source(), b.vertex_source());
            prop_assert_eq!(a.fragment_source(), b.fragment_source());
            prop_assert_eq!(a.uniforms().snapshot(), b.uniforms().snapshot());
        }

        #[test]
        fn prop_unknown_anchor_iff_absent(anchor in anchor_strategy()) {
            let template = depth_template();
            let overrides = Overrides::new().splice(anchor, "// probe");
            let present = template.source(anchor.stage()).has_anchor(anchor);
            let result = compose(&template, &overrides);

            prop_assert_eq!(result.is_ok(), present);
            if let Err(err) = result {
                let is_unknown_anchor = matches!(err, DissolveError::UnknownSpliceAnchor { .. });
                prop_assert!(is_unknown_anchor);
            }
        }
    }
}
