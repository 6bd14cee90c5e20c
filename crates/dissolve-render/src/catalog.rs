//! Built-in material templates.
//!
//! The catalog mirrors the host engine's material library: a physically based
//! `standard` surface and the `depth` material used when rendering shadow maps. Stage
//! sources keep the engine's `#include <chunk>` directives, which the engine expands
//! when it compiles the program.

use std::collections::HashMap;

use dissolve_core::{DissolveError, Result, UniformValue, Vec3};

use crate::compositor::{compose, ComposedMaterial, Overrides};
use crate::template::{MaterialTemplate, ShaderSource, ShaderStage, SpliceAnchor};

/// Name of the physically based surface template.
pub const STANDARD: &str = "standard";

/// Name of the shadow depth template.
pub const DEPTH: &str = "depth";

/// Registry of material templates by name.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: HashMap<String, MaterialTemplate>,
}

impl TemplateCatalog {
    /// Creates a catalog holding the built-in templates.
    #[must_use]
    pub fn new() -> Self {
        let mut catalog = Self::default();
        catalog.register(standard_template());
        catalog.register(depth_template());
        catalog
    }

    /// Registers a template, replacing any template of the same name.
    pub fn register(&mut self, template: MaterialTemplate) {
        self.templates.insert(template.name().to_string(), template);
    }

    /// Gets a template by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MaterialTemplate> {
        self.templates.get(name)
    }

    /// Gets a template by name, failing with `InvalidBaseTemplate` if it is unknown.
    pub fn require(&self, name: &str) -> Result<&MaterialTemplate> {
        self.get(name)
            .ok_or_else(|| DissolveError::InvalidBaseTemplate(format!("unknown template '{name}'")))
    }

    /// Composes `overrides` onto the template registered as `name`.
    pub fn compose(&self, name: &str, overrides: &Overrides) -> Result<ComposedMaterial> {
        compose(self.require(name)?, overrides)
    }

    /// Returns true if a template with the given name is registered.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Returns all template names, built-ins first, then custom templates sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        const BUILTIN_ORDER: &[&str] = &[STANDARD, DEPTH];
        let mut names: Vec<&str> = BUILTIN_ORDER
            .iter()
            .copied()
            .filter(|name| self.templates.contains_key(*name))
            .collect();
        let mut custom: Vec<&str> = self
            .templates
            .keys()
            .map(String::as_str)
            .filter(|n| !BUILTIN_ORDER.contains(n))
            .collect();
        custom.sort_unstable();
        names.extend(custom);
        names
    }

    /// Returns the number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if no templates are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// The physically based `standard` surface template.
///
/// # Panics
///
/// Never in practice: the built-in sources satisfy the template rules, which the
/// catalog tests check.
#[must_use]
pub fn standard_template() -> MaterialTemplate {
    let vertex = ShaderSource::new(ShaderStage::Vertex)
        .code(
            "#define STANDARD\n\
             varying vec3 vViewPosition;\n\
             #include <common>\n\
             #include <uv_pars_vertex>\n\
             #include <normal_pars_vertex>\n\
             #include <shadowmap_pars_vertex>\n",
        )
        .anchor(SpliceAnchor::VertexHeader)
        .code(
            "void main() {\n\
             \t#include <uv_vertex>\n\
             \t#include <beginnormal_vertex>\n\
             \t#include <defaultnormal_vertex>\n\
             \t#include <normal_vertex>\n",
        )
        .anchor(SpliceAnchor::VertexBegin)
        .code("\tvec3 transformed = vec3( position );\n")
        .anchor(SpliceAnchor::VertexTransformEnd)
        .code(
            "\t#include <project_vertex>\n\
             \tvViewPosition = - mvPosition.xyz;\n\
             \t#include <worldpos_vertex>\n\
             \t#include <shadowmap_vertex>\n",
        )
        .anchor(SpliceAnchor::VertexProjectEnd)
        .code("}\n");

    let fragment = ShaderSource::new(ShaderStage::Fragment)
        .code(
            "#define STANDARD\n\
             uniform vec3 diffuse;\n\
             uniform vec3 emissive;\n\
             uniform float roughness;\n\
             uniform float metalness;\n\
             uniform float opacity;\n\
             varying vec3 vViewPosition;\n\
             #include <common>\n\
             #include <packing>\n\
             #include <uv_pars_fragment>\n\
             #include <bsdfs>\n\
             #include <lights_pars_begin>\n\
             #include <normal_pars_fragment>\n\
             #include <lights_physical_pars_fragment>\n\
             #include <shadowmap_pars_fragment>\n",
        )
        .anchor(SpliceAnchor::FragmentHeader)
        .code("void main() {\n")
        .anchor(SpliceAnchor::FragmentBegin)
        .code(
            "\tvec4 diffuseColor = vec4( diffuse, opacity );\n\
             \tReflectedLight reflectedLight = ReflectedLight( vec3( 0.0 ), vec3( 0.0 ), vec3( 0.0 ), vec3( 0.0 ) );\n\
             \tvec3 totalEmissiveRadiance = emissive;\n\
             \t#include <roughnessmap_fragment>\n\
             \t#include <metalnessmap_fragment>\n\
             \t#include <normal_fragment_begin>\n\
             \t#include <lights_physical_fragment>\n\
             \t#include <lights_fragment_begin>\n\
             \t#include <lights_fragment_end>\n\
             \tvec3 outgoingLight = reflectedLight.directDiffuse + reflectedLight.indirectDiffuse + reflectedLight.directSpecular + reflectedLight.indirectSpecular + totalEmissiveRadiance;\n\
             \tgl_FragColor = vec4( outgoingLight, diffuseColor.a );\n",
        )
        .anchor(SpliceAnchor::FragmentColorEnd)
        .code(
            "\t#include <tonemapping_fragment>\n\
             \t#include <colorspace_fragment>\n\
             }\n",
        );

    let defaults = vec![
        ("diffuse".to_string(), UniformValue::Color(Vec3::ONE)),
        ("emissive".to_string(), UniformValue::Color(Vec3::ZERO)),
        ("roughness".to_string(), UniformValue::Float(1.0)),
        ("metalness".to_string(), UniformValue::Float(0.0)),
        ("opacity".to_string(), UniformValue::Float(1.0)),
    ];

    MaterialTemplate::new(STANDARD, vertex, fragment, defaults)
        .expect("built-in standard template is well-formed")
}

/// The `depth` template used by shadow map passes.
///
/// It has the same vertex anchors as [`standard_template`], so vertex deformation can
/// be replayed onto it, but its fragment stage writes packed depth and has no color
/// anchor.
///
/// # Panics
///
/// Never in practice: the built-in sources satisfy the template rules, which the
/// catalog tests check.
#[must_use]
pub fn depth_template() -> MaterialTemplate {
    let vertex = ShaderSource::new(ShaderStage::Vertex)
        .code(
            "#include <common>\n\
             #include <uv_pars_vertex>\n\
             varying vec2 vHighPrecisionZW;\n",
        )
        .anchor(SpliceAnchor::VertexHeader)
        .code(
            "void main() {\n\
             \t#include <uv_vertex>\n\
             \t#include <beginnormal_vertex>\n",
        )
        .anchor(SpliceAnchor::VertexBegin)
        .code("\tvec3 transformed = vec3( position );\n")
        .anchor(SpliceAnchor::VertexTransformEnd)
        .code(
            "\t#include <project_vertex>\n\
             \tvHighPrecisionZW = gl_Position.zw;\n",
        )
        .anchor(SpliceAnchor::VertexProjectEnd)
        .code("}\n");

    let fragment = ShaderSource::new(ShaderStage::Fragment)
        .code(
            "uniform float opacity;\n\
             #include <common>\n\
             #include <packing>\n\
             varying vec2 vHighPrecisionZW;\n",
        )
        .anchor(SpliceAnchor::FragmentHeader)
        .code("void main() {\n")
        .anchor(SpliceAnchor::FragmentBegin)
        .code(
            "\tvec4 diffuseColor = vec4( 1.0 );\n\
             \tdiffuseColor.a = opacity;\n\
             \tfloat fragCoordZ = 0.5 * vHighPrecisionZW[0] / vHighPrecisionZW[1] + 0.5;\n\
             \tgl_FragColor = packDepthToRGBA( fragCoordZ );\n\
             }\n",
        );

    let defaults = vec![("opacity".to_string(), UniformValue::Float(1.0))];

    MaterialTemplate::new(DEPTH, vertex, fragment, defaults)
        .expect("built-in depth template is well-formed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates() {
        let catalog = TemplateCatalog::new();
        assert!(catalog.has(STANDARD));
        assert!(catalog.has(DEPTH));
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get("phong").is_none());
    }

    #[test]
    fn test_require_unknown() {
        let catalog = TemplateCatalog::new();
        assert!(matches!(
            catalog.require("phong"),
            Err(DissolveError::InvalidBaseTemplate(_))
        ));
    }

    #[test]
    fn test_standard_anchors() {
        let standard = standard_template();
        for anchor in SpliceAnchor::ALL {
            assert!(standard.source(anchor.stage()).has_anchor(anchor), "{anchor}");
        }
        assert_eq!(
            standard.default_uniforms().value("roughness"),
            Some(UniformValue::Float(1.0))
        );
    }

    #[test]
    fn test_depth_has_no_color_anchor() {
        let depth = depth_template();
        let fragment = depth.source(ShaderStage::Fragment);
        assert!(!fragment.has_anchor(SpliceAnchor::FragmentColorEnd));
        assert!(fragment.has_anchor(SpliceAnchor::FragmentHeader));
        assert!(depth
            .source(ShaderStage::Vertex)
            .has_anchor(SpliceAnchor::VertexTransformEnd));
    }

    #[test]
    fn test_names_order() {
        let mut catalog = TemplateCatalog::new();
        let depth = depth_template();
        let vertex = depth.source(ShaderStage::Vertex).clone();
        let fragment = depth.source(ShaderStage::Fragment).clone();
        catalog.register(
            MaterialTemplate::new("zebra", vertex.clone(), fragment.clone(), Vec::new()).unwrap(),
        );
        catalog.register(MaterialTemplate::new("alpha", vertex, fragment, Vec::new()).unwrap());

        assert_eq!(catalog.names(), vec![STANDARD, DEPTH, "alpha", "zebra"]);
    }
}
