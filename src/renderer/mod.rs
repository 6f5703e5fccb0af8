mod blob;
mod postprocessing;
mod render_target;
mod renderer;

pub use renderer::Renderer;
