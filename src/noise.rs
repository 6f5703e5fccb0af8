//! Coherent-noise animation channels.
//!
//! A [`NoiseChannel`] only keeps the parameters and the running time of one
//! noise driver. Sampling happens on the GPU (see `renderer/blob/blob.wgsl`),
//! which evaluates 4D simplex noise at `(offset * frequency, time)` and scales
//! the result by `amount`.

use bytemuck::{Pod, Zeroable};

use crate::error::{ensure_non_negative, ConfigError};

/// What a channel drives. Each role starts its clock at a different offset
/// so channels sharing the same speed never pulse in sync.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NoiseRole {
    Translate,
    Scale,
    Color,
    Alpha,
}

impl NoiseRole {
    pub const ALL: [NoiseRole; 4] = [
        NoiseRole::Translate,
        NoiseRole::Scale,
        NoiseRole::Color,
        NoiseRole::Alpha,
    ];

    pub fn initial_time(self) -> f32 {
        match self {
            NoiseRole::Translate => 100.0,
            NoiseRole::Scale => 200.0,
            NoiseRole::Color => 300.0,
            NoiseRole::Alpha => 400.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NoiseChannel {
    pub amount: f32,
    pub frequency: f32,
    pub speed: f32,
    time: f32,
}

impl NoiseChannel {
    pub fn new(amount: f32, frequency: f32, speed: f32, initial_time: f32) -> Self {
        Self {
            amount,
            frequency,
            speed,
            time: initial_time,
        }
    }

    /// Builds a channel for `role`, rejecting negative or non-finite parameters.
    pub fn for_role(
        role: NoiseRole,
        amount: f32,
        frequency: f32,
        speed: f32,
    ) -> Result<Self, ConfigError> {
        let (amount_field, frequency_field, speed_field) = match role {
            NoiseRole::Translate => (
                "translate_noise_amount",
                "translate_noise_scale",
                "translate_noise_speed",
            ),
            NoiseRole::Scale => (
                "scale_noise_amount",
                "scale_noise_scale",
                "scale_noise_speed",
            ),
            NoiseRole::Color => (
                "color_noise_amount",
                "color_noise_scale",
                "color_noise_speed",
            ),
            NoiseRole::Alpha => (
                "alpha_noise_amount",
                "alpha_noise_scale",
                "alpha_noise_speed",
            ),
        };
        ensure_non_negative(amount_field, amount)?;
        ensure_non_negative(frequency_field, frequency)?;
        ensure_non_negative(speed_field, speed)?;

        Ok(Self::new(amount, frequency, speed, role.initial_time()))
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn advance(&mut self) {
        self.time += self.speed;
    }

    /// Snapshot for the shader. Non-finite parameters collapse to zero so a
    /// bad live edit degrades to "no noise" instead of poisoning the frame.
    pub fn uniform(&self) -> NoiseUniform {
        NoiseUniform {
            amount: finite_or(self.amount, 0.0),
            frequency: finite_or(self.frequency, 0.0),
            time: finite_or(self.time, 0.0),
            _pad0: 0.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct NoiseUniform {
    pub amount: f32,
    pub frequency: f32,
    pub time: f32,
    pub _pad0: f32,
}

#[inline]
pub(crate) fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates_speed() {
        let mut channel = NoiseChannel::new(1.0, 0.01, 0.25, 100.0);
        let mut expected = 100.0_f32;
        for k in 0..1000 {
            assert_eq!(channel.time(), expected, "tick {}", k);
            channel.advance();
            expected += 0.25;
        }
        assert_eq!(channel.time(), 100.0 + 1000.0 * 0.25);
    }

    #[test]
    fn zero_ticks_keeps_initial_time() {
        let channel = NoiseChannel::new(1.0, 0.01, 0.5, 42.0);
        assert_eq!(channel.time(), 42.0);
    }

    #[test]
    fn role_offsets_are_distinct_and_non_zero() {
        for (i, a) in NoiseRole::ALL.iter().enumerate() {
            assert_ne!(a.initial_time(), 0.0);
            for b in &NoiseRole::ALL[i + 1..] {
                assert_ne!(a.initial_time(), b.initial_time(), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn channels_with_same_speed_stay_decorrelated() {
        let mut color = NoiseChannel::for_role(NoiseRole::Color, 1.0, 0.001, 0.5).unwrap();
        let mut alpha = NoiseChannel::for_role(NoiseRole::Alpha, 1.0, 0.001, 0.5).unwrap();
        for _ in 0..10_000 {
            assert_ne!(color.time(), alpha.time());
            color.advance();
            alpha.advance();
        }
    }

    #[test]
    fn parameters_are_live_tunable() {
        let mut channel = NoiseChannel::new(1.0, 0.01, 0.5, 0.0);
        channel.advance();
        channel.speed = 2.0;
        channel.amount = 10.0;
        channel.advance();
        assert_eq!(channel.time(), 2.5);
        assert_eq!(channel.uniform().amount, 10.0);
    }

    #[test]
    fn negative_parameters_are_rejected_with_field_name() {
        let err = NoiseChannel::for_role(NoiseRole::Scale, 1.0, -0.1, 0.0).unwrap_err();
        assert!(err.to_string().contains("scale_noise_scale"));

        let err = NoiseChannel::for_role(NoiseRole::Alpha, f32::NAN, 0.1, 0.0).unwrap_err();
        assert!(err.to_string().contains("alpha_noise_amount"));
    }

    #[test]
    fn uniform_guards_non_finite_values() {
        let mut channel = NoiseChannel::new(f32::NAN, f32::INFINITY, 0.0, 0.0);
        channel.speed = f32::NAN;
        channel.advance();
        let uniform = channel.uniform();
        assert_eq!(uniform.amount, 0.0);
        assert_eq!(uniform.frequency, 0.0);
        assert_eq!(uniform.time, 0.0);
    }
}
