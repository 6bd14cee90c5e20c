//! Control panel bindings.
//!
//! A [`ControlPanel`] holds descriptors for editable controls, each bound to the value
//! cell of a named material uniform. A GUI layer draws the descriptors and routes edits
//! through [`ControlPanel::set`], which validates and writes the cell directly.

use dissolve_core::{DissolveError, Result, UniformCell, UniformValue, Vec3};
use dissolve_render::ComposedMaterial;

/// How a control edits its uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlKind {
    /// Numeric slider over a float uniform.
    Slider {
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
        /// Snapping increment (0 = continuous).
        step: f32,
    },
    /// Color picker over a color uniform.
    Color,
}

/// One editable control bound to a uniform cell.
#[derive(Debug, Clone)]
pub struct Control {
    label: String,
    uniform: String,
    kind: ControlKind,
    cell: UniformCell,
}

impl Control {
    /// Returns the display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Sets the display label.
    pub fn set_label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = label.into();
        self
    }

    /// Returns the name of the bound uniform.
    pub fn uniform_name(&self) -> &str {
        &self.uniform
    }

    /// Returns the control kind.
    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    /// Returns the current uniform value.
    pub fn value(&self) -> UniformValue {
        self.cell.get()
    }

    /// Writes a value. Slider values are snapped to the step and clamped to range.
    ///
    /// Non-finite input is rejected with `InvalidConfig`.
    pub fn set(&self, value: impl Into<UniformValue>) -> Result<()> {
        let value = value.into();
        match (self.kind, value) {
            (ControlKind::Slider { .. }, UniformValue::Float(v)) if !v.is_finite() => {
                Err(self.non_finite(&v.to_string()))
            }
            (ControlKind::Color, UniformValue::Color(c)) if !c.is_finite() => {
                Err(self.non_finite(&c.to_string()))
            }
            (ControlKind::Slider { min, max, step }, UniformValue::Float(v)) => {
                let snapped = if step > 0.0 {
                    min + ((v - min) / step).round() * step
                } else {
                    v
                };
                self.cell.set(snapped.clamp(min, max));
                Ok(())
            }
            (ControlKind::Color, UniformValue::Color(c)) => {
                self.cell.set(UniformValue::Color(c.clamp(Vec3::ZERO, Vec3::ONE)));
                Ok(())
            }
            (kind, other) => Err(DissolveError::UniformTypeMismatch {
                name: self.uniform.clone(),
                expected: expected_kind(kind),
                actual: other.kind_name(),
            }),
        }
    }

    fn non_finite(&self, value: &str) -> DissolveError {
        DissolveError::InvalidConfig(format!("non-finite value {value} for '{}'", self.uniform))
    }
}

fn expected_kind(kind: ControlKind) -> &'static str {
    match kind {
        ControlKind::Slider { .. } => "float",
        ControlKind::Color => "color",
    }
}

/// Ordered set of controls.
#[derive(Debug, Clone, Default)]
pub struct ControlPanel {
    controls: Vec<Control>,
}

impl ControlPanel {
    /// Creates an empty panel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a slider to a float uniform of `material`.
    pub fn bind_slider(
        &mut self,
        material: &ComposedMaterial,
        uniform: &str,
        min: f32,
        max: f32,
        step: f32,
    ) -> Result<&mut Control> {
        if min.is_nan() || max.is_nan() || min >= max || step < 0.0 {
            return Err(DissolveError::InvalidConfig(format!(
                "slider '{uniform}' has range [{min}, {max}] and step {step}"
            )));
        }
        self.bind(material, uniform, ControlKind::Slider { min, max, step })
    }

    /// Binds a color picker to a color uniform of `material`.
    pub fn bind_color(&mut self, material: &ComposedMaterial, uniform: &str) -> Result<&mut Control> {
        self.bind(material, uniform, ControlKind::Color)
    }

    fn bind(
        &mut self,
        material: &ComposedMaterial,
        uniform: &str,
        kind: ControlKind,
    ) -> Result<&mut Control> {
        let bound = material
            .uniform(uniform)
            .ok_or_else(|| DissolveError::UniformNotFound(uniform.to_string()))?;

        let value = bound.value();
        let compatible = matches!(
            (kind, value),
            (ControlKind::Slider { .. }, UniformValue::Float(_))
                | (ControlKind::Color, UniformValue::Color(_))
        );
        if !compatible {
            return Err(DissolveError::UniformTypeMismatch {
                name: uniform.to_string(),
                expected: expected_kind(kind),
                actual: value.kind_name(),
            });
        }

        log::debug!("bound {kind:?} control to uniform '{uniform}'");
        let index = self.controls.len();
        self.controls.push(Control {
            label: uniform.to_string(),
            uniform: uniform.to_string(),
            kind,
            cell: bound.cell().clone(),
        });
        Ok(&mut self.controls[index])
    }

    /// Gets a control by label.
    pub fn get(&self, label: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.label == label)
    }

    /// Writes a value through the control with the given label.
    pub fn set(&self, label: &str, value: impl Into<UniformValue>) -> Result<()> {
        self.get(label)
            .ok_or_else(|| DissolveError::UniformNotFound(label.to_string()))?
            .set(value)
    }

    /// Iterates over the controls in binding order.
    pub fn iter(&self) -> impl Iterator<Item = &Control> {
        self.controls.iter()
    }

    /// Returns the number of controls.
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    /// Returns true if the panel has no controls.
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

/// Binds the dissolve panel: `progress`, `factor`, `diffuse`, and `mixcolor`.
pub fn dissolve_controls(material: &ComposedMaterial) -> Result<ControlPanel> {
    let mut panel = ControlPanel::new();
    panel.bind_slider(material, "progress", 0.0, 1.0, 0.001)?;
    panel
        .bind_slider(material, "factor2", 0.0, 0.9, 0.001)?
        .set_label("factor");
    panel.bind_color(material, "diffuse")?;
    panel.bind_color(material, "mixcolor")?;
    Ok(panel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dissolve_render::{dissolve_overrides, TemplateCatalog, STANDARD};

    fn material() -> ComposedMaterial {
        TemplateCatalog::new()
            .compose(STANDARD, &dissolve_overrides())
            .unwrap()
    }

    #[test]
    fn test_dissolve_panel_layout() {
        let panel = dissolve_controls(&material()).unwrap();
        let labels: Vec<_> = panel.iter().map(Control::label).collect();
        assert_eq!(labels, vec!["progress", "factor", "diffuse", "mixcolor"]);
        assert_eq!(panel.get("factor").unwrap().uniform_name(), "factor2");
    }

    #[test]
    fn test_slider_writes_through_to_material() {
        let material = material();
        let panel = dissolve_controls(&material).unwrap();

        panel.set("progress", 0.25).unwrap();
        assert_eq!(material.uniforms().value("progress"), Some(UniformValue::Float(0.25)));
    }

    #[test]
    fn test_slider_clamps_and_snaps() {
        let material = material();
        let panel = dissolve_controls(&material).unwrap();

        panel.set("factor", 2.0).unwrap();
        let factor = panel.get("factor").unwrap().value().as_float().unwrap();
        assert!((factor - 0.9).abs() < 1e-6);

        panel.set("progress", 0.123_44).unwrap();
        let progress = panel.get("progress").unwrap().value().as_float().unwrap();
        assert!((progress - 0.123).abs() < 1e-5);
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let material = material();
        let panel = dissolve_controls(&material).unwrap();
        panel.set("progress", 0.5).unwrap();

        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert!(matches!(
                panel.set("progress", bad),
                Err(DissolveError::InvalidConfig(_))
            ));
        }
        assert!(matches!(
            panel.set("mixcolor", UniformValue::Color(Vec3::new(f32::NAN, 0.0, 0.0))),
            Err(DissolveError::InvalidConfig(_))
        ));
        assert_eq!(material.uniforms().value("progress"), Some(UniformValue::Float(0.5)));
    }

    #[test]
    fn test_color_control() {
        let material = material();
        let panel = dissolve_controls(&material).unwrap();

        panel
            .set("mixcolor", UniformValue::Color(Vec3::new(1.0, 0.0, 0.5)))
            .unwrap();
        assert_eq!(
            material.uniforms().value("mixcolor"),
            Some(UniformValue::Color(Vec3::new(1.0, 0.0, 0.5)))
        );

        let err = panel.set("mixcolor", 0.5).unwrap_err();
        assert!(matches!(err, DissolveError::UniformTypeMismatch { .. }));
    }

    #[test]
    fn test_bind_errors() {
        let material = material();
        let mut panel = ControlPanel::new();

        assert!(matches!(
            panel.bind_slider(&material, "missing", 0.0, 1.0, 0.1),
            Err(DissolveError::UniformNotFound(_))
        ));
        assert!(matches!(
            panel.bind_slider(&material, "mixcolor", 0.0, 1.0, 0.1),
            Err(DissolveError::UniformTypeMismatch { .. })
        ));
        assert!(matches!(
            panel.bind_color(&material, "progress"),
            Err(DissolveError::UniformTypeMismatch { .. })
        ));
        assert!(matches!(
            panel.bind_slider(&material, "progress", 1.0, 0.0, 0.1),
            Err(DissolveError::InvalidConfig(_))
        ));
        assert!(panel.is_empty());
        assert!(matches!(
            panel.set("progress", 0.5),
            Err(DissolveError::UniformNotFound(_))
        ));
    }
}
