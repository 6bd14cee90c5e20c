//! Uniform values, shared value cells, and uniform tables.
//!
//! A [`UniformCell`] is the single backing storage of one uniform value. Cloning a
//! cell aliases it: every clone observes writes made through any other clone. This is
//! how `mixed` uniforms are shared between a material and the materials derived from
//! it (for example a surface material and its shadow depth material).

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::{DissolveError, Result};

/// A typed uniform value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum UniformValue {
    /// Scalar float.
    Float(f32),
    /// Signed integer.
    Int(i32),
    /// Boolean flag.
    Bool(bool),
    /// Two-component vector.
    Vec2(Vec2),
    /// Three-component vector.
    Vec3(Vec3),
    /// Four-component vector.
    Vec4(Vec4),
    /// Linear RGB color (declared as `vec3` in GLSL).
    Color(Vec3),
    /// 4x4 matrix.
    Mat4(Mat4),
}

impl UniformValue {
    /// Returns the GLSL type used to declare this value.
    #[must_use]
    pub fn glsl_type(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) | Self::Color(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat4(_) => "mat4",
        }
    }

    /// Returns a short name for the value kind, distinguishing colors from vectors.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Color(_) => "color",
            other => other.glsl_type(),
        }
    }

    /// Returns true if both values have the same kind.
    #[must_use]
    pub fn same_kind(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Returns the scalar value, if this is a float.
    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the RGB value, if this is a color.
    #[must_use]
    pub fn as_color(&self) -> Option<Vec3> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Creates a color value from a `0xRRGGBB` hex code.
    #[must_use]
    pub fn color_hex(hex: u32) -> Self {
        Self::Color(color_from_hex(hex))
    }
}

/// Converts a `0xRRGGBB` hex code into an RGB vector in `[0, 1]`.
#[must_use]
pub fn color_from_hex(hex: u32) -> Vec3 {
    let r = ((hex >> 16) & 0xff) as f32 / 255.0;
    let g = ((hex >> 8) & 0xff) as f32 / 255.0;
    let b = (hex & 0xff) as f32 / 255.0;
    Vec3::new(r, g, b)
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        Self::Mat4(v)
    }
}

/// Shared, mutable storage for one uniform value.
#[derive(Debug, Clone)]
pub struct UniformCell(Arc<RwLock<UniformValue>>);

impl UniformCell {
    /// Creates a new cell holding `value`.
    pub fn new(value: impl Into<UniformValue>) -> Self {
        Self(Arc::new(RwLock::new(value.into())))
    }

    /// Returns the current value.
    #[must_use]
    pub fn get(&self) -> UniformValue {
        match self.0.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                log::warn!("uniform cell lock poisoned, reading last value");
                *poisoned.into_inner()
            }
        }
    }

    /// Replaces the current value. Visible through every alias of this cell.
    pub fn set(&self, value: impl Into<UniformValue>) {
        let value = value.into();
        match self.0.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => {
                log::warn!("uniform cell lock poisoned, overwriting value");
                *poisoned.into_inner() = value;
            }
        }
    }

    /// Returns true if both cells share the same backing storage.
    #[must_use]
    pub fn shares_with(&self, other: &UniformCell) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns a new, unshared cell holding a copy of the current value.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self::new(self.get())
    }
}

/// Declaration of a custom uniform to add to (or override on) a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformSpec {
    /// Uniform name as used in shader source.
    pub name: String,
    /// Initial value.
    pub value: UniformValue,
    /// Share the value cell with materials derived from this one.
    #[serde(default)]
    pub mixed: bool,
    /// Surface the uniform as part of the contract seen by downstream consumers.
    #[serde(default)]
    pub linked: bool,
}

impl UniformSpec {
    /// Creates a plain (unshared, unlinked) uniform spec.
    pub fn new(name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            mixed: false,
            linked: false,
        }
    }

    /// Creates a spec that is both `mixed` and `linked`.
    pub fn shared(name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        Self::new(name, value).with_mixed(true).with_linked(true)
    }

    /// Sets the `mixed` flag.
    #[must_use]
    pub fn with_mixed(mut self, mixed: bool) -> Self {
        self.mixed = mixed;
        self
    }

    /// Sets the `linked` flag.
    #[must_use]
    pub fn with_linked(mut self, linked: bool) -> Self {
        self.linked = linked;
        self
    }
}

/// A uniform installed on a material: its value cell plus sharing flags.
#[derive(Debug, Clone)]
pub struct Uniform {
    cell: UniformCell,
    mixed: bool,
    linked: bool,
}

impl Uniform {
    /// Creates a uniform around an existing cell.
    pub fn new(cell: UniformCell, mixed: bool, linked: bool) -> Self {
        Self {
            cell,
            mixed,
            linked,
        }
    }

    /// Creates a plain uniform with a fresh cell.
    pub fn plain(value: impl Into<UniformValue>) -> Self {
        Self::new(UniformCell::new(value), false, false)
    }

    /// Returns the backing cell.
    pub fn cell(&self) -> &UniformCell {
        &self.cell
    }

    /// Returns the current value.
    pub fn value(&self) -> UniformValue {
        self.cell.get()
    }

    /// Returns whether the cell is shared with derived materials.
    pub fn is_mixed(&self) -> bool {
        self.mixed
    }

    /// Returns whether the uniform is part of the linked contract.
    pub fn is_linked(&self) -> bool {
        self.linked
    }
}

impl From<&UniformSpec> for Uniform {
    fn from(spec: &UniformSpec) -> Self {
        Self::new(UniformCell::new(spec.value), spec.mixed, spec.linked)
    }
}

/// Name-ordered table of uniforms.
#[derive(Debug, Clone, Default)]
pub struct UniformTable {
    uniforms: BTreeMap<String, Uniform>,
}

impl UniformTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table of plain uniforms from `(name, value)` defaults.
    pub fn from_defaults<I, S>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (S, UniformValue)>,
        S: Into<String>,
    {
        let uniforms = defaults
            .into_iter()
            .map(|(name, value)| (name.into(), Uniform::plain(value)))
            .collect();
        Self { uniforms }
    }

    /// Inserts or replaces a uniform.
    pub fn insert(&mut self, name: impl Into<String>, uniform: Uniform) {
        self.uniforms.insert(name.into(), uniform);
    }

    /// Gets a uniform by name.
    pub fn get(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.get(name)
    }

    /// Gets the backing cell of a uniform by name.
    pub fn cell(&self, name: &str) -> Option<&UniformCell> {
        self.uniforms.get(name).map(Uniform::cell)
    }

    /// Gets the current value of a uniform by name.
    pub fn value(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).map(Uniform::value)
    }

    /// Writes a new value into an existing uniform.
    ///
    /// The value must have the same kind as the current one.
    pub fn set(&self, name: &str, value: impl Into<UniformValue>) -> Result<()> {
        let value = value.into();
        let uniform = self
            .uniforms
            .get(name)
            .ok_or_else(|| DissolveError::UniformNotFound(name.to_string()))?;
        let current = uniform.value();
        if !current.same_kind(&value) {
            return Err(DissolveError::UniformTypeMismatch {
                name: name.to_string(),
                expected: current.kind_name(),
                actual: value.kind_name(),
            });
        }
        uniform.cell().set(value);
        Ok(())
    }

    /// Returns true if a uniform with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.uniforms.contains_key(name)
    }

    /// Returns the number of uniforms.
    pub fn len(&self) -> usize {
        self.uniforms.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.uniforms.is_empty()
    }

    /// Iterates over `(name, uniform)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Uniform)> {
        self.uniforms.iter().map(|(name, u)| (name.as_str(), u))
    }

    /// Returns all uniform names in name order.
    pub fn names(&self) -> Vec<&str> {
        self.uniforms.keys().map(String::as_str).collect()
    }

    /// Iterates over the `mixed` uniforms.
    pub fn mixed(&self) -> impl Iterator<Item = (&str, &Uniform)> {
        self.iter().filter(|(_, u)| u.is_mixed())
    }

    /// Iterates over the `linked` uniforms.
    pub fn linked(&self) -> impl Iterator<Item = (&str, &Uniform)> {
        self.iter().filter(|(_, u)| u.is_linked())
    }

    /// Captures the current values of all uniforms.
    pub fn snapshot(&self) -> BTreeMap<String, UniformValue> {
        self.uniforms
            .iter()
            .map(|(name, u)| (name.clone(), u.value()))
            .collect()
    }
}
