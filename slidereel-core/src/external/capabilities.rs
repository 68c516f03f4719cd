//! Transition capability discovery.
//!
//! The set of `xfade` transitions differs between ffmpeg builds. The installed
//! set is read from `ffmpeg -h filter=xfade` once per process and cached.

use crate::error::{CoreError, CoreResult};
use once_cell::sync::OnceCell;
use std::process::Command;

static XFADE_TRANSITIONS: OnceCell<Vec<String>> = OnceCell::new();

/// Reports which xfade transitions the encoder supports.
///
/// An empty list means xfade itself is unavailable.
pub trait TransitionCapabilities {
    fn supported_transitions(&self) -> CoreResult<Vec<String>>;
}

/// Queries the installed ffmpeg.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegCapabilities;

impl TransitionCapabilities for FfmpegCapabilities {
    fn supported_transitions(&self) -> CoreResult<Vec<String>> {
        XFADE_TRANSITIONS
            .get_or_try_init(query_xfade_transitions)
            .cloned()
    }
}

/// A fixed transition set, for pinned environments and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticCapabilities(pub Vec<String>);

impl StaticCapabilities {
    pub fn new<I, S>(transitions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(transitions.into_iter().map(Into::into).collect())
    }
}

impl TransitionCapabilities for StaticCapabilities {
    fn supported_transitions(&self) -> CoreResult<Vec<String>> {
        Ok(self.0.clone())
    }
}

fn query_xfade_transitions() -> CoreResult<Vec<String>> {
    let ffmpeg = ffmpeg_sidecar::paths::ffmpeg_path();
    let output = Command::new(&ffmpeg)
        .args(["-hide_banner", "-h", "filter=xfade"])
        .output()
        .map_err(|e| {
            CoreError::Capability(format!(
                "cannot query {} for xfade support: {e}",
                ffmpeg.display()
            ))
        })?;

    // The help text goes to stdout; older builds print to stderr.
    let mut help = String::from_utf8_lossy(&output.stdout).into_owned();
    help.push_str(&String::from_utf8_lossy(&output.stderr));

    let transitions = parse_xfade_transitions(&help);
    if transitions.is_empty() {
        log::warn!("Installed ffmpeg reports no xfade transitions");
    } else {
        log::debug!("Installed ffmpeg supports {} xfade transitions", transitions.len());
    }
    Ok(transitions)
}

/// Extracts the named values of the `transition` option from xfade help text.
///
/// Values are the indented lines under the option whose second column is an
/// integer. `custom` is an expression hook, not a transition, and is skipped.
pub fn parse_xfade_transitions(help: &str) -> Vec<String> {
    let indent_of = |line: &str| line.len() - line.trim_start().len();

    let mut transitions = Vec::new();
    let mut option_indent: Option<usize> = None;

    for line in help.lines() {
        let mut columns = line.split_whitespace();
        let (Some(first), second) = (columns.next(), columns.next()) else {
            continue;
        };

        match option_indent {
            None => {
                if first == "transition" && second == Some("<int>") {
                    option_indent = Some(indent_of(line));
                }
            }
            Some(indent) => {
                if indent_of(line) <= indent {
                    break;
                }
                let is_value = second.is_some_and(|v| v.parse::<i64>().is_ok());
                if is_value && first != "custom" {
                    transitions.push(first.to_string());
                }
            }
        }
    }
    transitions
}
