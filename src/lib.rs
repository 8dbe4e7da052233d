//! Procedural parallax landscapes with a rotating menu artifact.
//!
//! A [`scheduler::ScenePipeline`] owns one page: the sky, the landscape for the
//! page kind and the artifact, drawn in that order onto a [`graphics::Canvas`]
//! every frame. Hosts present the canvas through a [`display::FrameSink`].

pub mod artifact;
pub mod assets;
pub mod color;
pub mod config;
pub mod display;
pub mod geometry;
pub mod graphics;
pub mod landscape;
pub mod math;
pub mod nav;
pub mod scheduler;
pub mod scroll;
pub mod sky;
pub mod snapshot;
pub mod state;
pub mod terminal;
pub mod vertex;
