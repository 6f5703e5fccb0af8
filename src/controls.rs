//! Live parameter editing.
//!
//! Each editable value is registered once in a static table of
//! [`ControlField`]s holding its name, range and accessors. The keyboard
//! driven [`ControlPanel`] walks these tables; nothing else needs to know
//! which fields exist.

use std::fmt;

use log::{info, warn};

use crate::{blob::Blob, component::PostProcessing, entity::Scene, points::MAX_PARTICLES};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlKind {
    Float { min: f32, max: f32, step: f32 },
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    Float(f32),
    Toggle(bool),
}

impl fmt::Display for ControlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlValue::Float(v) => write!(f, "{:.4}", v),
            ControlValue::Toggle(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlError {
    #[error("{field}: {value} is not a finite number")]
    NotFinite { field: &'static str, value: f32 },

    #[error("{field}: expected a {expected} value")]
    KindMismatch {
        field: &'static str,
        expected: &'static str,
    },
}

pub struct ControlField<T: 'static> {
    pub name: &'static str,
    pub group: &'static str,
    pub label: &'static str,
    pub kind: ControlKind,
    get: fn(&T) -> ControlValue,
    set: fn(&mut T, ControlValue),
}

impl<T> ControlField<T> {
    pub fn get(&self, target: &T) -> ControlValue {
        (self.get)(target)
    }

    /// Writes `value`, clamped to the field's range. Returns what was stored.
    pub fn set(&self, target: &mut T, value: ControlValue) -> Result<ControlValue, ControlError> {
        let value = match (self.kind, value) {
            (ControlKind::Float { min, max, .. }, ControlValue::Float(v)) => {
                if !v.is_finite() {
                    return Err(ControlError::NotFinite {
                        field: self.name,
                        value: v,
                    });
                }
                ControlValue::Float(v.clamp(min, max))
            }
            (ControlKind::Toggle, ControlValue::Toggle(v)) => ControlValue::Toggle(v),
            (ControlKind::Float { .. }, _) => {
                return Err(ControlError::KindMismatch {
                    field: self.name,
                    expected: "float",
                })
            }
            (ControlKind::Toggle, _) => {
                return Err(ControlError::KindMismatch {
                    field: self.name,
                    expected: "toggle",
                })
            }
        };
        (self.set)(target, value);
        Ok(self.get(target))
    }

    /// Moves a float by `steps` increments or flips a toggle.
    pub fn nudge(&self, target: &mut T, steps: i32) -> Result<ControlValue, ControlError> {
        let next = match (self.kind, self.get(target)) {
            (ControlKind::Float { step, .. }, ControlValue::Float(current)) => {
                let current = if current.is_finite() { current } else { 0.0 };
                ControlValue::Float(current + step * steps as f32)
            }
            (_, ControlValue::Toggle(current)) => ControlValue::Toggle(!current),
            (ControlKind::Toggle, value) => value,
        };
        self.set(target, next)
    }
}

impl<T> fmt::Debug for ControlField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlField")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("kind", &self.kind)
            .finish()
    }
}

macro_rules! float_field {
    ($name:literal, $group:literal, $label:literal, $min:expr, $max:expr, $step:expr, |$t:ident| $($field:tt)+) => {
        ControlField {
            name: $name,
            group: $group,
            label: $label,
            kind: ControlKind::Float {
                min: $min,
                max: $max,
                step: $step,
            },
            get: |$t| ControlValue::Float($($field)+),
            set: |$t, value| {
                if let ControlValue::Float(v) = value {
                    $($field)+ = v;
                }
            },
        }
    };
}

pub static BLOB_CONTROLS: &[ControlField<Blob>] = &[
    ControlField {
        name: "visible",
        group: "",
        label: "visible",
        kind: ControlKind::Toggle,
        get: |b| ControlValue::Toggle(b.visible),
        set: |b, value| {
            if let ControlValue::Toggle(v) = value {
                b.visible = v;
            }
        },
    },
    float_field!("blob_scale", "", "scale", 0.0, 5.0, 0.05, |b| b.blob_scale),
    float_field!("rotation_speed", "", "rotation", -0.01, 0.01, 0.0005, |b| b.rotation_speed),
    float_field!("translate_noise_amount", "Distortion", "amount", 0.0, 200.0, 5.0, |b| b.translate_noise.amount),
    float_field!("translate_noise_scale", "Distortion", "scale", 0.0, 0.01, 0.0001, |b| b.translate_noise.frequency),
    float_field!("translate_noise_speed", "Distortion", "speed", 0.0, 0.1, 0.0001, |b| b.translate_noise.speed),
    ControlField {
        name: "particles_count",
        group: "Particles",
        label: "count",
        kind: ControlKind::Float {
            min: 0.0,
            max: MAX_PARTICLES as f32,
            step: 500.0,
        },
        get: |b| ControlValue::Float(b.visible_count() as f32),
        set: |b, value| {
            if let ControlValue::Float(v) = value {
                b.set_particles_count(v.round() as i64);
            }
        },
    },
    float_field!("scale", "Particles/Scale", "scale", 0.0, 100.0, 0.5, |b| b.scale),
    float_field!("scale_noise_amount", "Particles/Scale/Noise", "amount", 0.0, 1.0, 0.01, |b| b.scale_noise.amount),
    float_field!("scale_noise_scale", "Particles/Scale/Noise", "scale", 0.0, 0.01, 0.0001, |b| b.scale_noise.frequency),
    float_field!("scale_noise_speed", "Particles/Scale/Noise", "speed", 0.0, 0.05, 0.0001, |b| b.scale_noise.speed),
    float_field!("color1_r", "Particles/Color", "color1 r", 0.0, 1.0, 0.02, |b| b.color1.r),
    float_field!("color1_g", "Particles/Color", "color1 g", 0.0, 1.0, 0.02, |b| b.color1.g),
    float_field!("color1_b", "Particles/Color", "color1 b", 0.0, 1.0, 0.02, |b| b.color1.b),
    float_field!("color2_r", "Particles/Color", "color2 r", 0.0, 1.0, 0.02, |b| b.color2.r),
    float_field!("color2_g", "Particles/Color", "color2 g", 0.0, 1.0, 0.02, |b| b.color2.g),
    float_field!("color2_b", "Particles/Color", "color2 b", 0.0, 1.0, 0.02, |b| b.color2.b),
    float_field!("color_noise_amount", "Particles/Color/Noise", "amount", 0.0, 1.0, 0.01, |b| b.color_noise.amount),
    float_field!("color_noise_scale", "Particles/Color/Noise", "scale", 0.0, 0.01, 0.0001, |b| b.color_noise.frequency),
    float_field!("color_noise_speed", "Particles/Color/Noise", "speed", 0.0, 0.05, 0.0001, |b| b.color_noise.speed),
    float_field!("alpha", "Particles/Alpha", "alpha", 0.0, 1.0, 0.02, |b| b.alpha),
    float_field!("alpha_noise_amount", "Particles/Alpha/Noise", "amount", 0.0, 1.0, 0.01, |b| b.alpha_noise.amount),
    float_field!("alpha_noise_scale", "Particles/Alpha/Noise", "scale", 0.0, 0.01, 0.0001, |b| b.alpha_noise.frequency),
    float_field!("alpha_noise_speed", "Particles/Alpha/Noise", "speed", 0.0, 0.05, 0.0001, |b| b.alpha_noise.speed),
    float_field!("alpha_noise_pow", "Particles/Alpha/Noise", "pow", 0.0, 10.0, 0.05, |b| b.alpha_noise_pow),
];

pub static POST_PROCESSING_CONTROLS: &[ControlField<PostProcessing>] = &[
    float_field!("clear_color_r", "", "background r", 0.0, 1.0, 0.01, |p| p.clear_color.r),
    float_field!("clear_color_g", "", "background g", 0.0, 1.0, 0.01, |p| p.clear_color.g),
    float_field!("clear_color_b", "", "background b", 0.0, 1.0, 0.01, |p| p.clear_color.b),
    float_field!("bloom_intensity", "Post Processing/Bloom", "intensity", 0.0, 5.0, 0.05, |p| p.bloom.intensity),
    float_field!("bloom_threshold", "Post Processing/Bloom", "threshold", 0.0, 1.0, 0.01, |p| p.bloom.threshold),
    float_field!("bloom_smoothing", "Post Processing/Bloom", "smoothing", 0.0, 1.0, 0.01, |p| p.bloom.smoothing),
    float_field!("vignette_offset", "Post Processing/Vignette", "offset", 0.0, 1.0, 0.01, |p| p.vignette.offset),
    float_field!("vignette_darkness", "Post Processing/Vignette", "darkness", 0.0, 1.0, 0.01, |p| p.vignette.darkness),
];

pub fn blob_control(name: &str) -> Option<&'static ControlField<Blob>> {
    BLOB_CONTROLS.iter().find(|field| field.name == name)
}

pub fn post_processing_control(name: &str) -> Option<&'static ControlField<PostProcessing>> {
    POST_PROCESSING_CONTROLS.iter().find(|field| field.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelTarget {
    PostProcessing,
    Blob(usize),
}

/// Selection state of the keyboard control panel.
#[derive(Debug, Clone)]
pub struct ControlPanel {
    visible: bool,
    target: PanelTarget,
    field: usize,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            visible: false,
            target: PanelTarget::PostProcessing,
            field: 0,
        }
    }
}

impl ControlPanel {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        info!(
            "Control panel {}",
            if self.visible { "shown" } else { "hidden" }
        );
        self.visible
    }

    pub fn target(&self) -> PanelTarget {
        self.target
    }

    pub fn field_index(&self) -> usize {
        self.field
    }

    /// Post-processing, then each live blob in order, then back around.
    pub fn cycle_target(&mut self, scene: &Scene) {
        self.target = match self.target {
            PanelTarget::PostProcessing if !scene.is_empty() => PanelTarget::Blob(0),
            PanelTarget::Blob(i) if i + 1 < scene.len() => PanelTarget::Blob(i + 1),
            _ => PanelTarget::PostProcessing,
        };
        self.field = 0;
    }

    pub fn select_next_field(&mut self) {
        self.field = (self.field + 1) % self.field_count();
    }

    pub fn select_previous_field(&mut self) {
        let count = self.field_count();
        self.field = (self.field + count - 1) % count;
    }

    /// Applies `steps` increments to the selected field and returns a
    /// description of the new value.
    pub fn nudge(&mut self, scene: &mut Scene, steps: i32) -> Option<String> {
        self.retarget_if_stale(scene);

        let result = match self.target {
            PanelTarget::PostProcessing => {
                let field = &POST_PROCESSING_CONTROLS[self.field];
                field
                    .nudge(&mut scene.post_processing, steps)
                    .map(|value| format!("Post processing {} = {}", describe(field), value))
            }
            PanelTarget::Blob(index) => {
                let field = &BLOB_CONTROLS[self.field];
                let blob = scene.blob_at_mut(index)?;
                let label = blob.label();
                field
                    .nudge(blob, steps)
                    .map(|value| format!("{} {} = {}", label, describe(field), value))
            }
        };

        match result {
            Ok(message) => {
                info!("{}", message);
                Some(message)
            }
            Err(e) => {
                warn!("Rejected control change: {}", e);
                None
            }
        }
    }

    /// Current selection and value, for logging.
    pub fn status(&mut self, scene: &Scene) -> String {
        self.retarget_if_stale(scene);
        match self.target {
            PanelTarget::PostProcessing => {
                let field = &POST_PROCESSING_CONTROLS[self.field];
                format!(
                    "Post processing {} = {}",
                    describe(field),
                    field.get(&scene.post_processing)
                )
            }
            PanelTarget::Blob(index) => {
                let field = &BLOB_CONTROLS[self.field];
                match scene.blobs().get(index) {
                    Some(blob) => format!("{} {} = {}", blob.label(), describe(field), field.get(blob)),
                    None => "No blob selected".to_owned(),
                }
            }
        }
    }

    fn field_count(&self) -> usize {
        match self.target {
            PanelTarget::PostProcessing => POST_PROCESSING_CONTROLS.len(),
            PanelTarget::Blob(_) => BLOB_CONTROLS.len(),
        }
    }

    /// Falls back to post-processing when the selected blob was pruned.
    fn retarget_if_stale(&mut self, scene: &Scene) {
        if let PanelTarget::Blob(index) = self.target {
            if index >= scene.len() {
                self.target = PanelTarget::PostProcessing;
                self.field = 0;
            }
        }
        self.field = self.field.min(self.field_count() - 1);
    }
}

fn describe<T>(field: &ControlField<T>) -> String {
    if field.group.is_empty() {
        field.label.to_owned()
    } else {
        format!("{} / {}", field.group, field.label)
    }
}
