//! Ken Burns pan/zoom planning.
//!
//! Each slot gets a zoom direction and a pan anchor drawn from a seeded
//! stream that is separate from the schedule stream, so toggling motion never
//! changes which images or transitions are scheduled.

use super::Filter;
use crate::config::KenBurnsConfig;
use crate::schedule::motion_rng;
use crate::utils::format_decimal;

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    /// 1.0 to max zoom
    In,
    /// max zoom to 1.0
    Out,
}

/// Where the zoomed crop sits along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanAnchor {
    Start,
    Center,
    End,
}

impl PanAnchor {
    fn from_index(index: usize) -> Self {
        match index {
            0 => PanAnchor::Start,
            1 => PanAnchor::Center,
            _ => PanAnchor::End,
        }
    }

    /// zoompan position expression. `extent` is `iw` or `ih`; the offset is
    /// bounded by the zoomed crop so it never leaves the frame.
    fn expression(self, extent: &str) -> String {
        match self {
            PanAnchor::Start => "0".to_string(),
            PanAnchor::Center => format!("{extent}/2-({extent}/zoom/2)"),
            PanAnchor::End => format!("{extent}-{extent}/zoom"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionPlan {
    pub direction: ZoomDirection,
    pub horizontal: PanAnchor,
    pub vertical: PanAnchor,
}

impl MotionPlan {
    /// The `zoompan` filter for a clip of `frames` frames.
    pub fn zoompan(&self, max_zoom: f64, frames: u64, width: u32, height: u32, fps: u32) -> Filter {
        let frames = frames.max(1);
        let delta = format_decimal(max_zoom - 1.0);
        let peak = format_decimal(max_zoom);
        let zoom = match self.direction {
            ZoomDirection::In => format!("min(1+{delta}*on/{frames},{peak})"),
            ZoomDirection::Out => format!("max({peak}-{delta}*on/{frames},1)"),
        };

        Filter::new("zoompan")
            .named("z", zoom)
            .named("x", self.horizontal.expression("iw"))
            .named("y", self.vertical.expression("ih"))
            .named("d", 1)
            .named("s", format!("{width}x{height}"))
            .named("fps", fps)
    }
}

/// Draws one motion plan per slot from the seed's motion stream.
///
/// Draw order per slot: direction, then (when panning) horizontal and
/// vertical anchors. Without panning the crop stays centred.
pub fn plan_motion(seed: &str, slot_count: usize, config: &KenBurnsConfig) -> Vec<MotionPlan> {
    let mut rng = motion_rng(seed);
    (0..slot_count)
        .map(|_| {
            let direction = if rng.random_bool(0.5) {
                ZoomDirection::In
            } else {
                ZoomDirection::Out
            };
            let (horizontal, vertical) = if config.pan {
                (
                    PanAnchor::from_index(rng.random_range(0..3)),
                    PanAnchor::from_index(rng.random_range(0..3)),
                )
            } else {
                (PanAnchor::Center, PanAnchor::Center)
            };
            MotionPlan {
                direction,
                horizontal,
                vertical,
            }
        })
        .collect()
}
