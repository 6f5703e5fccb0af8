//! A blob is one animated particle cloud: a fixed shell of instance offsets
//! plus four noise channels and a handful of shading parameters.

use std::{fmt, time::Duration};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use log::{debug, info, warn};
use rand::Rng;
use serde::Deserialize;

use crate::{
    component::{Rgb, Transform},
    error::{ensure_finite, ensure_non_negative, ConfigError},
    noise::{finite_or, NoiseChannel, NoiseRole, NoiseUniform},
    points::{SphericalPointSet, MAX_PARTICLES},
};

/// Structural radius every spawned blob uses unless configured otherwise.
pub const DEFAULT_BLOB_SIZE: f32 = 500.0;

/// Upper bound on the number of updates a fade-out may take, whatever the
/// frame time and configured duration are.
pub const MAX_FADE_TICKS: u32 = 600;

const MIN_FADE_STEP: f32 = 1.0 / MAX_FADE_TICKS as f32;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobId(pub u64);

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One blob's creation parameters. Absent fields in a config record fall
/// back to [`BlobParams::default`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlobParams {
    pub name: Option<String>,
    pub blob_size: f32,
    pub blob_scale: f32,
    pub rotation_speed: f32,
    pub translate_noise_amount: f32,
    pub translate_noise_scale: f32,
    pub translate_noise_speed: f32,
    pub particles_count: u32,
    pub scale: f32,
    pub scale_noise_amount: f32,
    pub scale_noise_scale: f32,
    pub scale_noise_speed: f32,
    pub color1: Rgb,
    pub color2: Rgb,
    pub color_noise_amount: f32,
    pub color_noise_scale: f32,
    pub color_noise_speed: f32,
    pub alpha: f32,
    pub alpha_noise_amount: f32,
    pub alpha_noise_scale: f32,
    pub alpha_noise_speed: f32,
    pub alpha_noise_pow: f32,
}

impl Default for BlobParams {
    fn default() -> Self {
        Self {
            name: None,
            blob_size: DEFAULT_BLOB_SIZE,
            blob_scale: 1.0,
            rotation_speed: 0.002,
            translate_noise_amount: 70.0,
            translate_noise_scale: 0.0025,
            translate_noise_speed: 0.0043,
            particles_count: 10_000,
            scale: 15.0,
            scale_noise_amount: 1.0,
            scale_noise_scale: 0.0025,
            scale_noise_speed: 0.01,
            color1: Rgb::from_u8(0xdc, 0x00, 0xff),
            color2: Rgb::from_u8(0x00, 0xff, 0xf4),
            color_noise_amount: 1.0,
            color_noise_scale: 0.0004,
            color_noise_speed: 0.0065,
            alpha: 0.5,
            alpha_noise_amount: 1.0,
            alpha_noise_scale: 0.0007,
            alpha_noise_speed: 0.0114,
            alpha_noise_pow: 1.5,
        }
    }
}

impl BlobParams {
    /// Draws every field from its documented range. `blob_size` stays fixed.
    pub fn random<R>(rng: &mut R, blob_size: f32) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut color = || Rgb::new(rng.gen(), rng.gen(), rng.gen());
        let color1 = color();
        let color2 = color();

        Self {
            name: None,
            blob_size,
            blob_scale: 1.0,
            rotation_speed: rng.gen_range(0.0..=0.01),
            translate_noise_amount: rng.gen_range(0.0..=200.0),
            translate_noise_scale: rng.gen_range(0.0..=0.01),
            translate_noise_speed: rng.gen_range(0.0..=0.01),
            particles_count: rng.gen_range(0..=MAX_PARTICLES as u32),
            scale: rng.gen_range(5.0..=10.0),
            scale_noise_amount: rng.gen_range(0.0..=1.0),
            scale_noise_scale: rng.gen_range(0.0..=0.01),
            scale_noise_speed: rng.gen_range(0.0..=0.01),
            color1,
            color2,
            color_noise_amount: rng.gen_range(0.0..=1.0),
            color_noise_scale: rng.gen_range(0.0..=0.01),
            color_noise_speed: rng.gen_range(0.0..=0.01),
            alpha: rng.gen_range(0.5..=1.0),
            alpha_noise_amount: rng.gen_range(0.0..=1.0),
            alpha_noise_scale: rng.gen_range(0.0..=0.01),
            alpha_noise_speed: rng.gen_range(0.0..=0.01),
            alpha_noise_pow: rng.gen_range(0.0..=2.0),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.blob_size.is_finite() || self.blob_size <= 0.0 {
            return Err(ConfigError::invalid(
                "blob_size",
                format!("{} must be a positive number", self.blob_size),
            ));
        }
        ensure_non_negative("blob_scale", self.blob_scale)?;
        ensure_finite("rotation_speed", self.rotation_speed)?;
        ensure_non_negative("scale", self.scale)?;
        ensure_non_negative("alpha", self.alpha)?;
        ensure_non_negative("alpha_noise_pow", self.alpha_noise_pow)?;
        let noise = [
            ("translate_noise_amount", self.translate_noise_amount),
            ("translate_noise_scale", self.translate_noise_scale),
            ("translate_noise_speed", self.translate_noise_speed),
            ("scale_noise_amount", self.scale_noise_amount),
            ("scale_noise_scale", self.scale_noise_scale),
            ("scale_noise_speed", self.scale_noise_speed),
            ("color_noise_amount", self.color_noise_amount),
            ("color_noise_scale", self.color_noise_scale),
            ("color_noise_speed", self.color_noise_speed),
            ("alpha_noise_amount", self.alpha_noise_amount),
            ("alpha_noise_scale", self.alpha_noise_scale),
            ("alpha_noise_speed", self.alpha_noise_speed),
        ];
        for (field, value) in noise {
            ensure_non_negative(field, value)?;
        }
        for (field, color) in [("color1", self.color1), ("color2", self.color2)] {
            for c in [color.r, color.g, color.b] {
                ensure_non_negative(field, c)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BlobState {
    Alive,
    /// `fade` multiplies the effective alpha and only ever decreases.
    Dying {
        fade: f32,
    },
    Dead,
}

#[derive(Debug, Clone)]
pub struct Blob {
    id: BlobId,
    name: Option<String>,
    points: SphericalPointSet,
    state: BlobState,
    fade_out: Duration,
    orientation: f32,

    pub translate_noise: NoiseChannel,
    pub scale_noise: NoiseChannel,
    pub color_noise: NoiseChannel,
    pub alpha_noise: NoiseChannel,
    pub color1: Rgb,
    pub color2: Rgb,
    pub scale: f32,
    pub blob_scale: f32,
    pub rotation_speed: f32,
    pub alpha: f32,
    pub alpha_noise_pow: f32,
    pub position: Vec3,
    pub visible: bool,
}

impl Blob {
    /// Validates `params`, then generates the full point shell. Generation is
    /// the expensive part and completes before the blob is returned.
    pub fn create<R>(
        id: BlobId,
        params: &BlobParams,
        fade_out: Duration,
        rng: &mut R,
    ) -> Result<Self, ConfigError>
    where
        R: Rng + ?Sized,
    {
        params.validate()?;

        let translate_noise = NoiseChannel::for_role(
            NoiseRole::Translate,
            params.translate_noise_amount,
            params.translate_noise_scale,
            params.translate_noise_speed,
        )?;
        let scale_noise = NoiseChannel::for_role(
            NoiseRole::Scale,
            params.scale_noise_amount,
            params.scale_noise_scale,
            params.scale_noise_speed,
        )?;
        let color_noise = NoiseChannel::for_role(
            NoiseRole::Color,
            params.color_noise_amount,
            params.color_noise_scale,
            params.color_noise_speed,
        )?;
        let alpha_noise = NoiseChannel::for_role(
            NoiseRole::Alpha,
            params.alpha_noise_amount,
            params.alpha_noise_scale,
            params.alpha_noise_speed,
        )?;

        let mut points = SphericalPointSet::generate(MAX_PARTICLES, params.blob_size, rng)?;
        let requested = params.particles_count as usize;
        if requested > MAX_PARTICLES {
            warn!(
                "Blob {} requested {} particles, clamped to {}",
                id, requested, MAX_PARTICLES
            );
        }
        points.set_visible_count(params.particles_count as i64);

        info!(
            "Spawned blob {} ({}) with {} visible particles, radius {}",
            id,
            params.name.as_deref().unwrap_or("unnamed"),
            points.visible_count(),
            points.radius()
        );

        Ok(Self {
            id,
            name: params.name.clone(),
            points,
            state: BlobState::Alive,
            fade_out,
            orientation: 0.0,
            translate_noise,
            scale_noise,
            color_noise,
            alpha_noise,
            color1: params.color1,
            color2: params.color2,
            scale: params.scale,
            blob_scale: params.blob_scale,
            rotation_speed: params.rotation_speed,
            alpha: params.alpha,
            alpha_noise_pow: params.alpha_noise_pow,
            position: Vec3::ZERO,
            visible: true,
        })
    }

    pub fn id(&self) -> BlobId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("Blob {} {}", self.id, name),
            None => format!("Blob {}", self.id),
        }
    }

    pub fn state(&self) -> BlobState {
        self.state
    }

    pub fn is_dead(&self) -> bool {
        self.state == BlobState::Dead
    }

    pub fn points(&self) -> &SphericalPointSet {
        &self.points
    }

    pub fn orientation(&self) -> f32 {
        self.orientation
    }

    pub fn visible_count(&self) -> usize {
        self.points.visible_count()
    }

    /// Changes how many instances are drawn. Ignored once the blob is dead.
    pub fn set_particles_count(&mut self, count: i64) -> usize {
        if self.is_dead() {
            return self.points.visible_count();
        }
        self.points.set_visible_count(count)
    }

    /// Multiplier applied to the blob's alpha: 1 while alive, decaying to 0
    /// while dying.
    pub fn fade(&self) -> f32 {
        match self.state {
            BlobState::Alive => 1.0,
            BlobState::Dying { fade } => fade,
            BlobState::Dead => 0.0,
        }
    }

    pub fn effective_alpha(&self) -> f32 {
        finite_or(self.alpha, 0.0) * self.fade()
    }

    /// Starts the fade-out. Has no effect unless the blob is alive.
    pub fn request_removal(&mut self) {
        if self.state == BlobState::Alive {
            info!("Blob {} is fading out", self.id);
            self.state = BlobState::Dying { fade: 1.0 };
        }
    }

    pub fn update(&mut self, dt: Duration) {
        if self.is_dead() {
            return;
        }

        self.translate_noise.advance();
        self.scale_noise.advance();
        self.color_noise.advance();
        self.alpha_noise.advance();
        self.orientation += self.rotation_speed;

        if let BlobState::Dying { fade } = self.state {
            let fade = fade - self.fade_step(dt);
            // Snap the last partial step so accumulated rounding cannot add a tick.
            self.state = if fade < MIN_FADE_STEP * 0.5 {
                debug!("Blob {} finished fading out", self.id);
                BlobState::Dead
            } else {
                BlobState::Dying { fade }
            };
        }
    }

    fn fade_step(&self, dt: Duration) -> f32 {
        if self.fade_out.is_zero() {
            return 1.0;
        }
        let step = dt.as_secs_f32() / self.fade_out.as_secs_f32();
        finite_or(step, 1.0).clamp(MIN_FADE_STEP, 1.0)
    }

    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: Quat::from_rotation_y(finite_or(self.orientation, 0.0)),
            scale: Vec3::splat(finite_or(self.blob_scale, 1.0)),
        }
    }

    pub fn uniforms(&self) -> BlobUniforms {
        let color = |c: Rgb| {
            [
                finite_or(c.r, 0.0),
                finite_or(c.g, 0.0),
                finite_or(c.b, 0.0),
                1.0,
            ]
        };

        BlobUniforms {
            model: self.transform().matrix(),
            color1: color(self.color1),
            color2: color(self.color2),
            translate_noise: self.translate_noise.uniform(),
            scale_noise: self.scale_noise.uniform(),
            color_noise: self.color_noise.uniform(),
            alpha_noise: self.alpha_noise.uniform(),
            scale: finite_or(self.scale, 0.0),
            alpha: self.effective_alpha(),
            alpha_noise_pow: finite_or(self.alpha_noise_pow, 1.0),
            _pad0: 0.0,
        }
    }

    /// Everything the renderer needs to draw this blob for the current frame.
    pub fn drawable(&self) -> BlobDrawable<'_> {
        BlobDrawable {
            id: self.id,
            offsets: self.points.points(),
            instance_count: self.points.visible_count() as u32,
            uniforms: self.uniforms(),
            visible: self.visible && !self.is_dead(),
        }
    }
}

/// Per-blob shader parameters, laid out to match `BlobUniforms` in
/// `blob.wgsl`.
#[derive(Debug, Copy, Clone, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct BlobUniforms {
    pub model: Mat4,
    pub color1: [f32; 4],
    pub color2: [f32; 4],
    pub translate_noise: NoiseUniform,
    pub scale_noise: NoiseUniform,
    pub color_noise: NoiseUniform,
    pub alpha_noise: NoiseUniform,
    pub scale: f32,
    pub alpha: f32,
    pub alpha_noise_pow: f32,
    pub _pad0: f32,
}

impl BlobUniforms {
    pub fn is_finite(&self) -> bool {
        let noise = [
            self.translate_noise,
            self.scale_noise,
            self.color_noise,
            self.alpha_noise,
        ];
        self.model.is_finite()
            && self.color1.iter().chain(&self.color2).all(|c| c.is_finite())
            && noise
                .iter()
                .all(|n| n.amount.is_finite() && n.frequency.is_finite() && n.time.is_finite())
            && self.scale.is_finite()
            && self.alpha.is_finite()
            && self.alpha_noise_pow.is_finite()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BlobDrawable<'a> {
    pub id: BlobId,
    /// Full-capacity offset buffer; only the first `instance_count` are drawn.
    pub offsets: &'a [Vec3],
    pub instance_count: u32,
    pub uniforms: BlobUniforms,
    pub visible: bool,
}

impl BlobDrawable<'_> {
    pub fn should_draw(&self) -> bool {
        self.visible && self.instance_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    const FRAME: Duration = Duration::from_millis(16);

    fn spawn(params: &BlobParams) -> Blob {
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        Blob::create(BlobId(1), params, Duration::from_secs(1), &mut rng).unwrap()
    }

    #[test]
    fn update_advances_every_channel_and_orientation() {
        let mut blob = spawn(&BlobParams::default());
        let before = blob.clone();
        blob.update(FRAME);

        assert_eq!(
            blob.translate_noise.time(),
            before.translate_noise.time() + blob.translate_noise.speed
        );
        assert_eq!(
            blob.scale_noise.time(),
            before.scale_noise.time() + blob.scale_noise.speed
        );
        assert_eq!(
            blob.color_noise.time(),
            before.color_noise.time() + blob.color_noise.speed
        );
        assert_eq!(
            blob.alpha_noise.time(),
            before.alpha_noise.time() + blob.alpha_noise.speed
        );
        assert_eq!(blob.orientation(), 0.002);
        assert_eq!(blob.state(), BlobState::Alive);
    }

    #[test]
    fn over_capacity_particle_count_is_clamped() {
        let params = BlobParams {
            particles_count: 100_000,
            ..Default::default()
        };
        let blob = spawn(&params);
        assert_eq!(blob.visible_count(), MAX_PARTICLES);
        assert_eq!(blob.drawable().instance_count, MAX_PARTICLES as u32);
    }

    #[test]
    fn zero_particles_still_animates() {
        let params = BlobParams {
            particles_count: 0,
            ..Default::default()
        };
        let mut blob = spawn(&params);
        let time = blob.color_noise.time();
        blob.update(FRAME);
        assert!(blob.color_noise.time() > time);
        assert!(!blob.drawable().should_draw());
    }

    #[test]
    fn removal_fades_to_dead_in_bounded_ticks() {
        let mut blob = spawn(&BlobParams::default());
        blob.request_removal();
        assert!(!blob.is_dead());

        let mut previous = blob.fade();
        let mut ticks = 0;
        while !blob.is_dead() {
            blob.update(FRAME);
            ticks += 1;
            assert!(blob.fade() < previous || blob.is_dead());
            previous = blob.fade();
            assert!(ticks <= MAX_FADE_TICKS, "fade did not terminate");
        }
        assert!(ticks >= 1);
        assert_eq!(blob.fade(), 0.0);
        assert_eq!(blob.effective_alpha(), 0.0);
    }

    #[test]
    fn zero_frame_time_still_terminates() {
        let mut blob = spawn(&BlobParams::default());
        blob.request_removal();
        let mut ticks = 0;
        while !blob.is_dead() {
            blob.update(Duration::ZERO);
            ticks += 1;
        }
        assert_eq!(ticks, MAX_FADE_TICKS);
    }

    #[test]
    fn removal_is_idempotent() {
        let mut once = spawn(&BlobParams::default());
        let mut twice = once.clone();
        once.request_removal();
        twice.request_removal();
        twice.request_removal();

        for _ in 0..200 {
            assert_eq!(once.state(), twice.state());
            once.update(FRAME);
            twice.update(FRAME);
        }
    }

    #[test]
    fn dead_blob_is_frozen() {
        let mut blob = spawn(&BlobParams::default());
        blob.request_removal();
        blob.update(Duration::from_secs(10));
        assert!(blob.is_dead());

        let time = blob.translate_noise.time();
        blob.update(FRAME);
        blob.request_removal();
        assert_eq!(blob.translate_noise.time(), time);
        assert_eq!(blob.state(), BlobState::Dead);
        assert_eq!(blob.set_particles_count(5), blob.visible_count());
        assert!(!blob.drawable().visible);
    }

    #[test]
    fn particle_count_changes_while_dying() {
        let mut blob = spawn(&BlobParams::default());
        blob.request_removal();
        assert_eq!(blob.set_particles_count(123), 123);
        assert_eq!(blob.set_particles_count(-1), 0);
    }

    #[test]
    fn rejects_invalid_parameters() {
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        let cases = [
            (
                BlobParams {
                    blob_size: 0.0,
                    ..Default::default()
                },
                "blob_size",
            ),
            (
                BlobParams {
                    translate_noise_amount: -1.0,
                    ..Default::default()
                },
                "translate_noise_amount",
            ),
            (
                BlobParams {
                    color_noise_speed: -0.5,
                    ..Default::default()
                },
                "color_noise_speed",
            ),
            (
                BlobParams {
                    rotation_speed: f32::NAN,
                    ..Default::default()
                },
                "rotation_speed",
            ),
        ];
        for (params, field) in cases {
            let err = Blob::create(BlobId(9), &params, Duration::from_secs(1), &mut rng)
                .unwrap_err()
                .to_string();
            assert!(err.contains(field), "{} should mention {}", err, field);
        }
    }

    #[test]
    fn random_params_stay_in_documented_ranges() {
        let mut rng = Pcg64Mcg::seed_from_u64(99);
        for _ in 0..500 {
            let p = BlobParams::random(&mut rng, DEFAULT_BLOB_SIZE);
            assert!(p.validate().is_ok());
            assert_eq!(p.blob_size, DEFAULT_BLOB_SIZE);
            assert!((0.0..=0.01).contains(&p.rotation_speed));
            assert!((0.0..=200.0).contains(&p.translate_noise_amount));
            assert!(p.particles_count as usize <= MAX_PARTICLES);
            assert!((5.0..=10.0).contains(&p.scale));
            assert!((0.5..=1.0).contains(&p.alpha));
            assert!((0.0..=2.0).contains(&p.alpha_noise_pow));
            for c in [p.color1, p.color2] {
                assert!((0.0..=1.0).contains(&c.r));
                assert!((0.0..=1.0).contains(&c.g));
                assert!((0.0..=1.0).contains(&c.b));
            }
        }
    }

    #[test]
    fn uniforms_stay_finite_under_bad_live_edits() {
        let mut blob = spawn(&BlobParams::default());
        blob.scale_noise.frequency = f32::NAN;
        blob.translate_noise.amount = f32::INFINITY;
        blob.alpha = f32::NAN;
        blob.blob_scale = f32::INFINITY;
        blob.color1.g = f32::NEG_INFINITY;
        blob.update(FRAME);

        let uniforms = blob.uniforms();
        assert!(uniforms.is_finite(), "{:#?}", uniforms);
        assert_eq!(uniforms.alpha, 0.0);
    }

    #[test]
    fn transform_follows_orientation_and_scale() {
        let mut blob = spawn(&BlobParams {
            blob_scale: 2.0,
            rotation_speed: 0.5,
            ..Default::default()
        });
        blob.update(FRAME);
        let transform = blob.transform();
        assert_eq!(transform.scale, Vec3::splat(2.0));
        let expected = Quat::from_rotation_y(0.5);
        assert!(transform.rotation.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn uniform_block_size_matches_shader() {
        assert_eq!(std::mem::size_of::<BlobUniforms>(), 176);
    }
}
