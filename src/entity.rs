use std::time::{Duration, SystemTime};

use log::{debug, info};
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use crate::{
    blob::{Blob, BlobDrawable, BlobId, BlobParams, DEFAULT_BLOB_SIZE},
    component::{Camera, Orbit, PostProcessing},
    config::{CameraConfig, Config},
    error::ConfigError,
};

/// Owns the live blobs together with the camera and post-processing settings
/// the renderer reads every frame.
#[derive(Debug)]
pub struct Scene {
    pub camera: Camera,
    pub orbit: Orbit,
    pub post_processing: PostProcessing,
    blobs: Vec<Blob>,
    next_id: u64,
    blob_size: f32,
    fade_out: Duration,
    rng: Pcg64Mcg,
}

impl Scene {
    /// Empty scene with default camera and post-processing.
    pub fn new(seed: u64) -> Self {
        let camera_config = CameraConfig::default();
        Self {
            camera: camera_config.camera(16. / 9.),
            orbit: camera_config.orbit(),
            post_processing: PostProcessing::default(),
            blobs: Vec::new(),
            next_id: 0,
            blob_size: DEFAULT_BLOB_SIZE,
            fade_out: Duration::from_secs_f32(1.5),
            rng: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    /// Builds the scene described by `config` and spawns its blobs in order.
    pub fn from_config(config: &Config, aspect_ratio: f32) -> Result<Self, ConfigError> {
        let seed = config.scene.seed.unwrap_or_else(time_seed);
        info!("Seeded RNG with {}", seed);

        let mut scene = Self {
            camera: config.camera.camera(aspect_ratio),
            orbit: config.camera.orbit(),
            post_processing: PostProcessing {
                clear_color: config.scene.clear_color,
                bloom: config.bloom,
                vignette: config.vignette,
            },
            blob_size: config.scene.blob_size,
            fade_out: config.scene.fade_out()?,
            ..Self::new(seed)
        };

        for params in &config.blobs {
            scene.spawn_blob(Some(params))?;
        }
        if config.blobs.is_empty() && config.scene.spawn_random_when_empty {
            scene.spawn_blob(None)?;
        }

        Ok(scene)
    }

    /// Creates a blob from `params`, or from randomized parameters when
    /// `None`. The blob is fully generated before it joins the live set.
    pub fn spawn_blob(&mut self, params: Option<&BlobParams>) -> Result<BlobId, ConfigError> {
        let random;
        let params = match params {
            Some(params) => params,
            None => {
                random = BlobParams::random(&mut self.rng, self.blob_size);
                &random
            }
        };

        let id = BlobId(self.next_id + 1);
        let blob = Blob::create(id, params, self.fade_out, &mut self.rng)?;
        self.next_id += 1;
        self.blobs.push(blob);
        Ok(id)
    }

    /// Starts the fade-out of every live blob.
    pub fn remove_all_blobs(&mut self) {
        info!("Removing {} blobs", self.blobs.len());
        for blob in &mut self.blobs {
            blob.request_removal();
        }
    }

    /// Advances every blob, then drops the ones that finished dying, so a
    /// blob never reaches the renderer in the frame it died.
    pub fn update(&mut self, dt: Duration) {
        for blob in &mut self.blobs {
            blob.update(dt);
        }
        self.blobs.retain(|blob| {
            if blob.is_dead() {
                debug!("Pruned blob {}", blob.id());
            }
            !blob.is_dead()
        });
    }

    pub fn blobs(&self) -> &[Blob] {
        &self.blobs
    }

    pub fn blob(&self, id: BlobId) -> Option<&Blob> {
        self.blobs.iter().find(|blob| blob.id() == id)
    }

    pub fn blob_mut(&mut self, id: BlobId) -> Option<&mut Blob> {
        self.blobs.iter_mut().find(|blob| blob.id() == id)
    }

    pub fn blob_at_mut(&mut self, index: usize) -> Option<&mut Blob> {
        self.blobs.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn drawables(&self) -> impl Iterator<Item = BlobDrawable<'_>> {
        self.blobs.iter().map(Blob::drawable)
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.camera.aspect_ratio = aspect_ratio;
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::BlobState;

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn spawn_assigns_increasing_ids() {
        let mut scene = Scene::new(3);
        let a = scene.spawn_blob(None).unwrap();
        let b = scene.spawn_blob(Some(&BlobParams::default())).unwrap();
        assert!(b > a);
        assert_eq!(scene.len(), 2);
        assert!(scene.blob(a).is_some());
    }

    #[test]
    fn failed_spawn_leaves_scene_untouched() {
        let mut scene = Scene::new(3);
        let params = BlobParams {
            blob_size: -1.0,
            ..Default::default()
        };
        assert!(scene.spawn_blob(Some(&params)).is_err());
        assert!(scene.is_empty());
        let id = scene.spawn_blob(None).unwrap();
        assert_eq!(id, BlobId(1));
    }

    #[test]
    fn dead_blobs_are_pruned_in_the_frame_they_die() {
        let mut scene = Scene::new(5);
        let id = scene.spawn_blob(None).unwrap();
        scene.blob_mut(id).unwrap().request_removal();
        scene.update(Duration::from_secs(60));
        assert!(scene.blob(id).is_none());
        assert_eq!(scene.drawables().count(), 0);
    }

    #[test]
    fn removal_of_one_blob_keeps_others_alive() {
        let mut scene = Scene::new(5);
        let doomed = scene.spawn_blob(None).unwrap();
        let kept = scene.spawn_blob(None).unwrap();
        scene.blob_mut(doomed).unwrap().request_removal();
        for _ in 0..1_000 {
            scene.update(FRAME);
        }
        assert!(scene.blob(doomed).is_none());
        assert_eq!(scene.blob(kept).unwrap().state(), BlobState::Alive);
    }

    #[test]
    fn from_config_spawns_one_random_blob_when_list_is_empty() {
        let mut config = Config::default();
        config.scene.seed = Some(11);
        let scene = Scene::from_config(&config, 1.0).unwrap();
        assert_eq!(scene.len(), 1);

        config.scene.spawn_random_when_empty = false;
        let scene = Scene::from_config(&config, 1.0).unwrap();
        assert!(scene.is_empty());
    }

    #[test]
    fn from_config_reports_oversized_fade_out() {
        let mut config = Config::default();
        config.scene.seed = Some(1);
        config.scene.fade_out_secs = 1e30;
        let err = Scene::from_config(&config, 1.0).unwrap_err();
        assert!(err.to_string().contains("scene.fade_out_secs"), "{}", err);
    }

    #[test]
    fn from_config_keeps_record_order() {
        let mut config = Config::default();
        config.scene.seed = Some(11);
        config.blobs = ["a", "b", "c"]
            .iter()
            .map(|name| BlobParams {
                name: Some(name.to_string()),
                particles_count: 10,
                ..Default::default()
            })
            .collect();

        let scene = Scene::from_config(&config, 2.0).unwrap();
        let names: Vec<_> = scene.blobs().iter().filter_map(Blob::name).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(scene.camera.aspect_ratio, 2.0);
    }

    #[test]
    fn same_seed_generates_same_blobs() {
        let mut a = Scene::new(123);
        let mut b = Scene::new(123);
        a.spawn_blob(None).unwrap();
        b.spawn_blob(None).unwrap();
        assert_eq!(a.blobs()[0].points().points(), b.blobs()[0].points().points());
        assert_eq!(a.blobs()[0].visible_count(), b.blobs()[0].visible_count());
    }
}
