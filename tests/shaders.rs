use naga::valid::{Capabilities, ValidationFlags, Validator};

const SHADERS: &[(&str, &str)] = &[
    ("blob.wgsl", include_str!("../src/renderer/blob/blob.wgsl")),
    (
        "vs_fullscreen.wgsl",
        include_str!("../src/renderer/postprocessing/vs_fullscreen.wgsl"),
    ),
    (
        "fs_bright_pass.wgsl",
        include_str!("../src/renderer/postprocessing/fs_bright_pass.wgsl"),
    ),
    (
        "fs_blur.wgsl",
        include_str!("../src/renderer/postprocessing/fs_blur.wgsl"),
    ),
    (
        "fs_compose.wgsl",
        include_str!("../src/renderer/postprocessing/fs_compose.wgsl"),
    ),
];

fn validate(name: &str, source: &str) -> naga::Module {
    let module = naga::front::wgsl::parse_str(source)
        .unwrap_or_else(|e| panic!("{} failed to parse: {:?}", name, e));
    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .unwrap_or_else(|e| panic!("{} failed to validate: {:?}", name, e));
    module
}

fn entry_points(name: &str, source: &str) -> Vec<String> {
    validate(name, source)
        .entry_points
        .iter()
        .map(|ep| ep.name.clone())
        .collect()
}

#[test]
fn every_shader_parses_and_validates() {
    for &(name, source) in SHADERS {
        validate(name, source);
    }
}

#[test]
fn entry_points_match_pipelines() {
    let (name, source) = SHADERS[0];
    let blob = entry_points(name, source);
    assert!(blob.contains(&"vs_main".to_string()), "{:?}", blob);
    assert!(blob.contains(&"fs_main".to_string()), "{:?}", blob);

    for &(name, source) in &SHADERS[1..] {
        let names = entry_points(name, source);
        assert_eq!(names, ["main"], "{}", name);
    }
}
