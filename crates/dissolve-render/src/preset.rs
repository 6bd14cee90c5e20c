//! The dissolve effect and serialized override definitions.
//!
//! [`dissolve_overrides`] breaks the surface into its triangles as `progress` rises:
//! each triangle shrinks toward its centroid (`aCenter`), drifts along its normal by
//! a random amount (`aRandom`), and spins about the Y axis, sweeping from bottom to
//! top. Fragments blend toward `mixcolor` as their triangle dissolves.

use std::collections::BTreeMap;

use dissolve_core::{Result, UniformSpec, UniformValue, Vec3};
use serde::{Deserialize, Serialize};

use crate::compositor::{Overrides, SpliceOverride};
use crate::template::SpliceAnchor;

/// Declarations and helpers shared by the dissolve vertex code.
pub const DISSOLVE_VERTEX_HEADER: &str = r"
attribute float aRandom;
attribute vec3 aCenter;
uniform float time;
uniform float progress;
uniform float factor1;
uniform float factor2;
varying vec3 vPos;
varying float vLocprog;

mat2 get2dRotateMatrix( float _angle ) {
	return mat2( cos( _angle ), - sin( _angle ), sin( _angle ), cos( _angle ) );
}

mat4 rotationMatrix( vec3 axis, float angle ) {
	axis = normalize( axis );
	float s = sin( angle );
	float c = cos( angle );
	float oc = 1.0 - c;

	return mat4( oc * axis.x * axis.x + c,          oc * axis.x * axis.y - axis.z * s, oc * axis.z * axis.x + axis.y * s, 0.0,
	             oc * axis.x * axis.y + axis.z * s, oc * axis.y * axis.y + c,          oc * axis.y * axis.z - axis.x * s, 0.0,
	             oc * axis.z * axis.x - axis.y * s, oc * axis.y * axis.z + axis.x * s, oc * axis.z * axis.z + c,          0.0,
	             0.0,                               0.0,                               0.0,                               1.0 );
}

vec3 rotate( vec3 v, vec3 axis, float angle ) {
	mat4 m = rotationMatrix( axis, angle );
	return ( m * vec4( v, 1.0 ) ).xyz;
}
";

/// Per-triangle deformation, spliced after the object-space transform.
pub const DISSOLVE_TRANSFORM_END: &str = r"
	vec4 modelPosition = modelMatrix * vec4( position, 1.0 );

	// height mapped so the sweep starts at the bottom of the subject
	float prog = modelPosition.y / 3.4 + 1.0;
	float locprog = clamp( ( progress * factor1 - prog ) / factor2, 0.0, 1.0 );

	mat2 rotateMatrix = get2dRotateMatrix( aRandom * locprog * PI );

	transformed -= aCenter;
	transformed += 2.0 * normal * aRandom * locprog;
	transformed *= ( 1.0 - locprog );
	transformed += aCenter;
	transformed.xz = rotateMatrix * transformed.xz;

	vPos = modelPosition.xyz;
	vLocprog = locprog;
";

/// Declarations for the dissolve fragment code.
pub const DISSOLVE_FRAGMENT_HEADER: &str = r"
uniform vec3 mixcolor;
varying vec3 vPos;
varying float vLocprog;
";

/// Color blend, spliced after the lit color is written.
pub const DISSOLVE_COLOR_END: &str = r"
	gl_FragColor = vec4( mix( gl_FragColor.rgb, mixcolor, vLocprog ), 1.0 );
";

/// Overrides for the dissolve surface material.
///
/// `roughness` overrides the base default; the effect uniforms are `mixed` and
/// `linked` so a derived shadow material deforms in step with the surface.
#[must_use]
pub fn dissolve_overrides() -> Overrides {
    Overrides::new()
        .named("dissolve")
        .vertex_header(DISSOLVE_VERTEX_HEADER)
        .fragment_header(DISSOLVE_FRAGMENT_HEADER)
        .splice(SpliceAnchor::VertexTransformEnd, DISSOLVE_TRANSFORM_END)
        .splice(SpliceAnchor::FragmentColorEnd, DISSOLVE_COLOR_END)
        .uniform(UniformSpec::new("roughness", 0.35))
        .uniform(UniformSpec::shared("factor1", 2.898))
        .uniform(UniformSpec::shared("factor2", 0.0))
        .uniform(UniformSpec::shared("mixcolor", UniformValue::Color(Vec3::ONE)))
        .uniform(UniformSpec::shared("time", 0.0))
        .uniform(UniformSpec::shared("progress", 0.0))
}

/// Serialized form of [`Overrides`], with splice anchors given by identifier.
///
/// ```json
/// {
///   "name": "wave",
///   "vertex_header": "uniform float amplitude;",
///   "splices": { "vertex-transform-end": "transformed.y += amplitude;" },
///   "uniforms": [ { "name": "amplitude", "value": { "type": "float", "value": 0.2 }, "mixed": true } ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverridesDef {
    /// Name for the composed material.
    pub name: Option<String>,
    /// Code inserted after the vertex preamble.
    pub vertex_header: Option<String>,
    /// Code inserted after the fragment preamble.
    pub fragment_header: Option<String>,
    /// Code keyed by splice identifier, e.g. `vertex-transform-end`.
    pub splices: BTreeMap<String, String>,
    /// Custom uniforms, applied in order.
    pub uniforms: Vec<UniformSpec>,
}

impl OverridesDef {
    /// Parses a definition from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Converts into [`Overrides`], resolving splice identifiers.
    ///
    /// Fails with `UnrecognizedSpliceKey` on an unknown identifier.
    pub fn into_overrides(self) -> Result<Overrides> {
        let splices = parse_splice_override(self.splices)?;
        Ok(Overrides {
            name: self.name,
            vertex_header: self.vertex_header,
            fragment_header: self.fragment_header,
            splices,
            uniforms: self.uniforms,
            template: None,
        })
    }
}

impl TryFrom<OverridesDef> for Overrides {
    type Error = dissolve_core::DissolveError;

    fn try_from(def: OverridesDef) -> Result<Self> {
        def.into_overrides()
    }
}

/// Resolves a splice map keyed by identifier into a [`SpliceOverride`].
pub fn parse_splice_override<I, K, V>(splices: I) -> Result<SpliceOverride>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    splices
        .into_iter()
        .map(|(key, code)| -> Result<(SpliceAnchor, String)> {
            Ok((key.as_ref().parse()?, code.into()))
        })
        .collect()
}
