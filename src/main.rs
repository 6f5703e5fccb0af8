use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use celestial_body::config::Config;
use clap::Parser;
use log::{error, info, trace};
use pollster::FutureExt as _;
use winit::{
    dpi::LogicalSize,
    event::{DeviceEvent, ElementState, Event, KeyboardInput, MouseButton, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

mod app;

use app::App;

/// Procedurally animated particle blobs.
#[derive(Parser, Debug)]
#[command(name = "celestial-body", version, about)]
struct Args {
    /// TOML scene file. Defaults apply when omitted.
    config: Option<PathBuf>,

    /// Fixed RNG seed, overriding the one in the config.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            info!("No config given, using defaults");
            Config::default()
        }
    };
    if let Some(seed) = args.seed {
        config.scene.seed = Some(seed);
    }

    let event_loop = EventLoop::new();

    let window = WindowBuilder::new()
        .with_title(&config.window.title)
        .with_inner_size(LogicalSize::<u32> {
            width: config.window.width,
            height: config.window.height,
        })
        .build(&event_loop)
        .context("Failed to build window")?;

    let mut last_render_inst = Instant::now();

    let mut app = Some(App::new(window, &config).block_on()?);

    event_loop.run(move |e, _, control_flow| {
        trace!("{:?}", e);

        if let Event::LoopDestroyed = e {
            if let Some(app) = app.take() {
                app.shutdown();
            }
            return;
        }

        let app = match app.as_mut() {
            Some(app) => app,
            None => return,
        };

        match e {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
                WindowEvent::Resized(size) => app.on_resize(size),
                WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                    app.on_resize(*new_inner_size)
                }
                WindowEvent::MouseInput {
                    state,
                    button: MouseButton::Left,
                    ..
                } => match state {
                    ElementState::Pressed => app.on_mouse_down(),
                    ElementState::Released => app.on_mouse_up(),
                },
                WindowEvent::MouseWheel { delta, .. } => app.on_mouse_scroll(delta),
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Released,
                            virtual_keycode: Some(keycode),
                            ..
                        },
                    ..
                } => app.on_key_up(keycode),
                _ => (),
            },
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => app.on_mouse_move(delta),
            Event::MainEventsCleared => {
                let target_frame_interval = Duration::from_secs_f64(1.0 / 60.0);
                let elapsed_from_last_draw = last_render_inst.elapsed();
                if target_frame_interval > elapsed_from_last_draw {
                    let wait = target_frame_interval - elapsed_from_last_draw;
                    *control_flow = ControlFlow::WaitUntil(Instant::now() + wait);
                    return;
                }

                if let Err(e) = app.render() {
                    error!("{:#}", e);
                    *control_flow = ControlFlow::Exit;
                }

                last_render_inst = Instant::now();
            }
            _ => (),
        }
    });
}
