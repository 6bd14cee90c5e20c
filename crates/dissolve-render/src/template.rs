//! Shader templates.
//!
//! A shader stage is stored as an ordered list of [`Region`]s: plain code, and named
//! [`SpliceAnchor`]s marking where custom code may be injected. Injection inserts a
//! code region directly before the anchor, so the anchor stays addressable for later
//! compositions and repeated injections keep their order.

use std::fmt;
use std::str::FromStr;

use dissolve_core::{DissolveError, Result, UniformTable, UniformValue};

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// A named location in a shader stage where custom code may be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpliceAnchor {
    /// After the vertex preamble, before `main`.
    VertexHeader,
    /// Start of the vertex `main` body, before `transformed` is declared.
    VertexBegin,
    /// After the object-space `transformed` position is set up.
    VertexTransformEnd,
    /// After the clip-space position is written.
    VertexProjectEnd,
    /// After the fragment preamble, before `main`.
    FragmentHeader,
    /// Start of the fragment `main` body.
    FragmentBegin,
    /// After `gl_FragColor` holds the lit color.
    FragmentColorEnd,
}

impl SpliceAnchor {
    /// Every recognized anchor.
    pub const ALL: [SpliceAnchor; 7] = [
        Self::VertexHeader,
        Self::VertexBegin,
        Self::VertexTransformEnd,
        Self::VertexProjectEnd,
        Self::FragmentHeader,
        Self::FragmentBegin,
        Self::FragmentColorEnd,
    ];

    /// Returns the stage this anchor belongs to.
    #[must_use]
    pub fn stage(self) -> ShaderStage {
        match self {
            Self::VertexHeader
            | Self::VertexBegin
            | Self::VertexTransformEnd
            | Self::VertexProjectEnd => ShaderStage::Vertex,
            Self::FragmentHeader | Self::FragmentBegin | Self::FragmentColorEnd => {
                ShaderStage::Fragment
            }
        }
    }

    /// Returns the header anchor of a stage.
    #[must_use]
    pub fn header(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => Self::VertexHeader,
            ShaderStage::Fragment => Self::FragmentHeader,
        }
    }

    /// Returns true for the per-stage header anchors.
    #[must_use]
    pub fn is_header(self) -> bool {
        matches!(self, Self::VertexHeader | Self::FragmentHeader)
    }

    /// Returns the kebab-case identifier of this anchor.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::VertexHeader => "vertex-header",
            Self::VertexBegin => "vertex-begin",
            Self::VertexTransformEnd => "vertex-transform-end",
            Self::VertexProjectEnd => "vertex-project-end",
            Self::FragmentHeader => "fragment-header",
            Self::FragmentBegin => "fragment-begin",
            Self::FragmentColorEnd => "fragment-color-end",
        }
    }
}

impl fmt::Display for SpliceAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SpliceAnchor {
    type Err = DissolveError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|anchor| anchor.key() == s)
            .ok_or_else(|| DissolveError::UnrecognizedSpliceKey(s.to_string()))
    }
}

/// One piece of a shader stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    /// Literal source text.
    Code(String),
    /// An injection point. Renders to nothing.
    Anchor(SpliceAnchor),
}

/// Source of one shader stage as a sequence of regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    stage: ShaderStage,
    regions: Vec<Region>,
}

impl ShaderSource {
    /// Creates an empty source for `stage`.
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            regions: Vec::new(),
        }
    }

    /// Appends a code region.
    #[must_use]
    pub fn code(mut self, text: impl Into<String>) -> Self {
        self.regions.push(Region::Code(text.into()));
        self
    }

    /// Appends an anchor region.
    #[must_use]
    pub fn anchor(mut self, anchor: SpliceAnchor) -> Self {
        self.regions.push(Region::Anchor(anchor));
        self
    }

    /// Returns the stage.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Returns the regions in order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Iterates over the anchors in order.
    pub fn anchors(&self) -> impl Iterator<Item = SpliceAnchor> + '_ {
        self.regions.iter().filter_map(|region| match region {
            Region::Anchor(anchor) => Some(*anchor),
            Region::Code(_) => None,
        })
    }

    /// Returns true if the source contains `anchor`.
    pub fn has_anchor(&self, anchor: SpliceAnchor) -> bool {
        self.anchors().any(|a| a == anchor)
    }

    /// Inserts `text` at `anchor`, after anything injected there before.
    ///
    /// Returns false if the anchor is not present.
    pub(crate) fn insert_at(&mut self, anchor: SpliceAnchor, text: &str) -> bool {
        let Some(index) = self
            .regions
            .iter()
            .position(|region| *region == Region::Anchor(anchor))
        else {
            return false;
        };
        self.regions.insert(index, Region::Code(text.to_string()));
        true
    }

    /// Renders the final source text. Every code region ends with a newline.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for region in &self.regions {
            if let Region::Code(text) = region {
                out.push_str(text);
                if !text.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
        out
    }

    /// Checks the structural rules for a template stage: the stage header anchor is
    /// present, every anchor belongs to this stage, and no anchor appears twice.
    fn validate(&self, template: &str) -> Result<()> {
        let header = SpliceAnchor::header(self.stage);
        if !self.has_anchor(header) {
            return Err(DissolveError::InvalidBaseTemplate(format!(
                "{template}: {} stage has no '{header}' anchor",
                self.stage
            )));
        }

        let mut seen = Vec::new();
        for anchor in self.anchors() {
            if anchor.stage() != self.stage {
                return Err(DissolveError::InvalidBaseTemplate(format!(
                    "{template}: anchor '{anchor}' placed in {} stage",
                    self.stage
                )));
            }
            if seen.contains(&anchor) {
                return Err(DissolveError::InvalidBaseTemplate(format!(
                    "{template}: anchor '{anchor}' appears more than once"
                )));
            }
            seen.push(anchor);
        }
        Ok(())
    }
}

/// A built-in lighting model: default stage sources and default uniforms.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialTemplate {
    name: String,
    vertex: ShaderSource,
    fragment: ShaderSource,
    defaults: Vec<(String, UniformValue)>,
}

impl MaterialTemplate {
    /// Creates a template, validating both stage sources.
    pub fn new(
        name: impl Into<String>,
        vertex: ShaderSource,
        fragment: ShaderSource,
        defaults: Vec<(String, UniformValue)>,
    ) -> Result<Self> {
        let name = name.into();
        if vertex.stage() != ShaderStage::Vertex || fragment.stage() != ShaderStage::Fragment {
            return Err(DissolveError::InvalidBaseTemplate(format!(
                "{name}: stage sources are swapped"
            )));
        }
        vertex.validate(&name)?;
        fragment.validate(&name)?;
        Ok(Self {
            name,
            vertex,
            fragment,
            defaults,
        })
    }

    /// Returns the template name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the source of a stage.
    pub fn source(&self, stage: ShaderStage) -> &ShaderSource {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    /// Returns the default uniform values in declaration order.
    pub fn defaults(&self) -> &[(String, UniformValue)] {
        &self.defaults
    }

    /// Builds a fresh uniform table holding the defaults.
    pub fn default_uniforms(&self) -> UniformTable {
        UniformTable::from_defaults(self.defaults.iter().cloned())
    }
}
