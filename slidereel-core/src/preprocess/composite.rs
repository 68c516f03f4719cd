//! Composite graph for undersized sources.
//!
//! Background: the source cover-scaled to the target, cropped, blurred and
//! darkened. Foreground: the source contain-scaled and centred on a
//! transparent pad. The two are overlaid, then a corner vignette and light
//! grain are applied. The result is exactly `width` x `height`.

use crate::config::CompositeStyle;
use crate::filtergraph::{Filter, FilterChain, FilterGraph, input_label};

pub const COMPOSITE_OUTPUT_LABEL: &str = "composite";

/// Builds the single-input composite graph.
pub fn composite_graph(style: &CompositeStyle, width: u32, height: u32) -> FilterGraph {
    let split = FilterChain::new(
        [input_label(0)],
        vec![Filter::new("split").arg(2)],
        ["bg", "fg"],
    );

    let background = FilterChain::new(
        ["bg"],
        vec![
            Filter::new("scale")
                .arg(width)
                .arg(height)
                .named("force_original_aspect_ratio", "increase"),
            Filter::new("crop").arg(width).arg(height),
            Filter::new("gblur").decimal("sigma", style.blur_sigma),
            Filter::new("eq").decimal("brightness", style.brightness),
        ],
        ["bgd"],
    );

    let foreground = FilterChain::new(
        ["fg"],
        vec![
            Filter::new("scale")
                .arg(width)
                .arg(height)
                .named("force_original_aspect_ratio", "decrease"),
            Filter::new("format").arg("rgba"),
            Filter::new("pad")
                .arg(width)
                .arg(height)
                .arg("(ow-iw)/2")
                .arg("(oh-ih)/2")
                .named("color", "black@0"),
        ],
        ["fgp"],
    );

    let mut finish = vec![
        Filter::new("overlay").arg(0).arg(0),
        Filter::new("setsar").arg(1),
        Filter::new("vignette").decimal("angle", style.vignette_angle),
    ];
    if style.grain_strength > 0 {
        finish.push(Filter::new("noise").named("alls", style.grain_strength));
    }
    let compose = FilterChain::new(["bgd", "fgp"], finish, [COMPOSITE_OUTPUT_LABEL]);

    FilterGraph::new(
        vec![split, background, foreground, compose],
        COMPOSITE_OUTPUT_LABEL,
        1,
    )
}

/// Output options for a single high-quality JPEG frame.
pub fn composite_output_args() -> [&'static str; 4] {
    ["-frames:v", "1", "-q:v", "2"]
}
