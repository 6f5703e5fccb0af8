pub mod blob;
pub mod component;
pub mod config;
pub mod controls;
pub mod entity;
pub mod error;
pub mod noise;
pub mod points;
pub mod renderer;
pub mod window;
