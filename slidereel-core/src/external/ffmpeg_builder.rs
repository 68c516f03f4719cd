//! FFmpeg command builder utilities
//!
//! Assembles ffmpeg argument lists for the two invocations this crate makes:
//! the slideshow render and the single-frame composite render. Arguments are
//! plain strings so they can be logged, asserted on in tests, and handed to
//! any `FfmpegSpawner`.

use crate::filtergraph::FilterGraph;
use std::path::Path;

/// Builder for creating `FFmpeg` argument lists with common configurations
#[derive(Debug, Clone)]
pub struct FfmpegCommandBuilder {
    hide_banner: bool,
    overwrite: bool,
    inputs: Vec<String>,
    graph: Vec<String>,
    output_args: Vec<String>,
}

impl Default for FfmpegCommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegCommandBuilder {
    /// Creates a new builder that hides the banner and overwrites outputs
    #[must_use]
    pub fn new() -> Self {
        Self {
            hide_banner: true,
            overwrite: true,
            inputs: Vec::new(),
            graph: Vec::new(),
            output_args: Vec::new(),
        }
    }

    /// Sets whether to hide the `FFmpeg` banner
    #[must_use]
    pub fn with_hide_banner(mut self, hide: bool) -> Self {
        self.hide_banner = hide;
        self
    }

    /// Sets whether to overwrite an existing output (`-y`)
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Adds a plain input
    #[must_use]
    pub fn input(mut self, path: &Path) -> Self {
        self.inputs.push("-i".to_string());
        self.inputs.push(path.to_string_lossy().into_owned());
        self
    }

    /// Adds an image input looped into an endless stream at `fps`
    #[must_use]
    pub fn looped_image_input(mut self, path: &Path, fps: u32) -> Self {
        self.inputs.extend([
            "-loop".to_string(),
            "1".to_string(),
            "-framerate".to_string(),
            fps.to_string(),
        ]);
        self.input(path)
    }

    /// Sets `-filter_complex` and maps the graph's final label
    #[must_use]
    pub fn filter_graph(mut self, graph: &FilterGraph) -> Self {
        self.graph = vec![
            "-filter_complex".to_string(),
            graph.to_string(),
            "-map".to_string(),
            format!("[{}]", graph.output_label()),
        ];
        self
    }

    /// Adds an output option
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Adds several output options
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Builds the argument list with `output` last
    #[must_use]
    pub fn build(self, output: &Path) -> Vec<String> {
        let mut args = Vec::with_capacity(
            2 + self.inputs.len() + self.graph.len() + self.output_args.len() + 1,
        );
        if self.hide_banner {
            args.push("-hide_banner".to_string());
        }
        if self.overwrite {
            args.push("-y".to_string());
        }
        args.extend(self.inputs);
        args.extend(self.graph);
        args.extend(self.output_args);
        args.push(output.to_string_lossy().into_owned());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filtergraph::{Filter, FilterChain};

    #[test]
    fn test_argument_order() {
        let graph = FilterGraph::new(
            vec![FilterChain::new(
                ["0:v"],
                vec![Filter::new("format").arg("yuv420p")],
                ["out"],
            )],
            "out",
            1,
        );
        let args = FfmpegCommandBuilder::new()
            .looped_image_input(Path::new("a.jpg"), 30)
            .filter_graph(&graph)
            .args(["-frames:v", "1"])
            .build(Path::new("out.jpg"));

        assert_eq!(
            args,
            vec![
                "-hide_banner",
                "-y",
                "-loop",
                "1",
                "-framerate",
                "30",
                "-i",
                "a.jpg",
                "-filter_complex",
                "[0:v]format=yuv420p[out]",
                "-map",
                "[out]",
                "-frames:v",
                "1",
                "out.jpg",
            ]
        );
    }

    #[test]
    fn test_banner_and_overwrite_toggles() {
        let args = FfmpegCommandBuilder::new()
            .with_hide_banner(false)
            .with_overwrite(false)
            .input(Path::new("in.png"))
            .build(Path::new("out.png"));
        assert_eq!(args, vec!["-i", "in.png", "out.png"]);
    }
}
