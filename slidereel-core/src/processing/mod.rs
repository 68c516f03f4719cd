//! Slideshow orchestration.
//!
//! `SlideshowEngine` ties the pipeline together: prepare the pool, build the
//! seeded schedule, synthesize the filter graph, render and validate.

pub mod slideshow;

pub use slideshow::{RenderReport, SlideshowEngine};
