use std::time::Duration;

use celestial_body::{
    blob::{BlobParams, BlobState, MAX_FADE_TICKS},
    config::Config,
    entity::Scene,
    points::MAX_PARTICLES,
};

const FRAME: Duration = Duration::from_millis(16);

fn params(particles_count: u32) -> BlobParams {
    BlobParams {
        particles_count,
        ..Default::default()
    }
}

#[test]
fn oversized_particle_count_is_clamped() {
    let mut scene = Scene::new(1);
    let id = scene.spawn_blob(Some(&params(100_000))).unwrap();
    let blob = scene.blob(id).unwrap();
    assert_eq!(blob.visible_count(), MAX_PARTICLES);
    assert_eq!(blob.drawable().instance_count, 70_000);
}

#[test]
fn empty_blob_still_animates() {
    let mut scene = Scene::new(2);
    let id = scene.spawn_blob(Some(&params(0))).unwrap();
    let before = scene.blob(id).unwrap().translate_noise.time();

    scene.update(FRAME);

    let blob = scene.blob(id).unwrap();
    assert!(!blob.drawable().should_draw());
    assert!(blob.translate_noise.time() > before);
    assert_eq!(blob.state(), BlobState::Alive);
}

#[test]
fn remove_all_fades_every_blob_before_pruning() {
    let mut scene = Scene::new(3);
    let ids: Vec<_> = (0..3)
        .map(|_| scene.spawn_blob(Some(&params(500))).unwrap())
        .collect();

    scene.remove_all_blobs();
    for id in &ids {
        assert!(matches!(
            scene.blob(*id).unwrap().state(),
            BlobState::Dying { fade } if fade == 1.0
        ));
    }

    scene.update(FRAME);
    assert_eq!(scene.len(), 3, "pruned before the fade finished");
    for blob in scene.blobs() {
        let fade = blob.fade();
        assert!(fade > 0.0 && fade < 1.0, "fade {}", fade);
    }

    let mut frames = 1;
    while !scene.is_empty() {
        scene.update(FRAME);
        frames += 1;
        assert!(frames <= MAX_FADE_TICKS, "fade never completed");
    }
    assert!(ids.iter().all(|id| scene.blob(*id).is_none()));
}

#[test]
fn fade_alpha_decreases_monotonically() {
    let mut scene = Scene::new(4);
    let id = scene.spawn_blob(Some(&params(10))).unwrap();
    scene.blob_mut(id).unwrap().request_removal();

    let mut last = scene.blob(id).unwrap().effective_alpha();
    while let Some(blob) = scene.blob(id) {
        let alpha = blob.effective_alpha();
        assert!(alpha <= last);
        last = alpha;
        scene.update(FRAME);
    }
}

#[test]
fn blobs_spawned_after_remove_all_stay_alive() {
    let mut scene = Scene::new(5);
    scene.spawn_blob(None).unwrap();
    scene.remove_all_blobs();
    let fresh = scene.spawn_blob(None).unwrap();

    for _ in 0..MAX_FADE_TICKS {
        scene.update(FRAME);
    }

    assert_eq!(scene.len(), 1);
    assert_eq!(scene.blob(fresh).unwrap().state(), BlobState::Alive);
}

#[test]
fn configured_scene_starts_with_its_records() {
    let config = Config::from_toml_str(
        r##"
        [scene]
        seed = 9
        fade_out_secs = 0.5

        [[blobs]]
        name = "core"
        particles_count = 1000

        [[blobs]]
        name = "halo"
        particles_count = 250000
        "##,
    )
    .unwrap();

    let scene = Scene::from_config(&config, 16.0 / 9.0).unwrap();
    let counts: Vec<_> = scene.blobs().iter().map(|b| b.visible_count()).collect();
    assert_eq!(counts, [1000, MAX_PARTICLES]);
    assert_eq!(scene.blobs()[1].name(), Some("halo"));
}
