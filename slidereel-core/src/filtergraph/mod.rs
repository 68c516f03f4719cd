// ============================================================================
// slidereel-core/src/filtergraph/mod.rs
// ============================================================================
//
// FILTER GRAPH: Typed IR for ffmpeg -filter_complex
//
// Graphs are built as values (filters, chains, labels) and turned into the
// ffmpeg textual syntax in exactly one place, the `Display` implementations
// below. Nothing else in the crate concatenates filter strings.
//
// KEY COMPONENTS:
// - Filter / FilterArg: one filter invocation and its options
// - FilterChain: labelled inputs, a comma-separated filter list, output labels
// - FilterGraph: chains plus the final output label and the input count
// - synthesize: slideshow graph from a schedule (see `slideshow`)
//
// AI-ASSISTANT-INFO: Filter graph IR, serializer and synthesizers

pub mod motion;
pub mod slideshow;

pub use motion::{MotionPlan, PanAnchor, ZoomDirection, plan_motion};
pub use slideshow::synthesize;

use crate::error::{CoreError, CoreResult};
use crate::utils::format_decimal;

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Characters that force a value to be quoted at the graph level.
const QUOTE_TRIGGERS: &[char] = &[',', ';', '[', ']', '\'', '\\'];

// ============================================================================
// FILTERS
// ============================================================================

/// One option of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterArg {
    Positional(String),
    Named(String, String),
}

/// A single filter invocation, e.g. `scale=1920:1080`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    name: String,
    args: Vec<FilterArg>,
}

impl Filter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            args: Vec::new(),
        }
    }

    /// Appends a positional option.
    #[must_use]
    pub fn arg(mut self, value: impl ToString) -> Self {
        self.args.push(FilterArg::Positional(value.to_string()));
        self
    }

    /// Appends a `key=value` option.
    #[must_use]
    pub fn named(mut self, key: &str, value: impl ToString) -> Self {
        self.args
            .push(FilterArg::Named(key.to_string(), value.to_string()));
        self
    }

    /// Appends a `key=value` option with a decimal value.
    #[must_use]
    pub fn decimal(self, key: &str, value: f64) -> Self {
        self.named(key, format_decimal(value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[FilterArg] {
        &self.args
    }

    /// Value of a named option.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.args.iter().find_map(|arg| match arg {
            FilterArg::Named(k, v) if k == key => Some(v.as_str()),
            _ => None,
        })
    }
}

fn escape_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| QUOTE_TRIGGERS.contains(&c) || c.is_whitespace());
    if needs_quotes {
        format!("'{}'", value.replace('\'', "'\\''"))
    } else {
        value.to_string()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            f.write_str(if i == 0 { "=" } else { ":" })?;
            match arg {
                FilterArg::Positional(value) => f.write_str(&escape_value(value))?,
                FilterArg::Named(key, value) => write!(f, "{key}={}", escape_value(value))?,
            }
        }
        Ok(())
    }
}

// ============================================================================
// CHAINS
// ============================================================================

/// `[in1][in2]filter,filter[out]`
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain {
    pub inputs: Vec<String>,
    pub filters: Vec<Filter>,
    pub outputs: Vec<String>,
}

impl FilterChain {
    pub fn new<I, O, S, T>(inputs: I, filters: Vec<Filter>, outputs: O) -> Self
    where
        I: IntoIterator<Item = S>,
        O: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            filters,
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in &self.inputs {
            write!(f, "[{label}]")?;
        }
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{filter}")?;
        }
        for label in &self.outputs {
            write!(f, "[{label}]")?;
        }
        Ok(())
    }
}

// ============================================================================
// GRAPHS
// ============================================================================

/// Label of input stream `index`'s video.
pub fn input_label(index: usize) -> String {
    format!("{index}:v")
}

/// A complete `-filter_complex` graph.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    chains: Vec<FilterChain>,
    output: String,
    input_count: usize,
}

impl FilterGraph {
    pub fn new(chains: Vec<FilterChain>, output: &str, input_count: usize) -> Self {
        Self {
            chains,
            output: output.to_string(),
            input_count,
        }
    }

    pub fn chains(&self) -> &[FilterChain] {
        &self.chains
    }

    /// The label mapped to the encoder output.
    pub fn output_label(&self) -> &str {
        &self.output
    }

    /// Number of `-i` inputs the graph expects.
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// All filters in chain order.
    pub fn filters(&self) -> impl Iterator<Item = &Filter> {
        self.chains.iter().flat_map(|chain| chain.filters.iter())
    }

    pub fn contains_filter(&self, name: &str) -> bool {
        self.filters().any(|filter| filter.name() == name)
    }

    /// Checks label wiring: every input stream is consumed exactly once,
    /// every intermediate label is produced once and consumed once, and
    /// the output label is produced and left unconsumed.
    pub fn validate(&self) -> CoreResult<()> {
        let mut produced: HashSet<&str> = HashSet::new();
        let mut consumed: HashMap<&str, usize> = HashMap::new();

        for chain in &self.chains {
            if chain.filters.is_empty() {
                return Err(CoreError::OperationFailed(
                    "filter chain without filters".to_string(),
                ));
            }
            for label in &chain.inputs {
                *consumed.entry(label.as_str()).or_default() += 1;
            }
            for label in &chain.outputs {
                if !produced.insert(label.as_str()) {
                    return Err(CoreError::OperationFailed(format!(
                        "label [{label}] produced more than once"
                    )));
                }
            }
        }

        let inputs: Vec<String> = (0..self.input_count).map(input_label).collect();
        for label in &inputs {
            if consumed.get(label.as_str()) != Some(&1) {
                return Err(CoreError::OperationFailed(format!(
                    "input [{label}] must be referenced exactly once"
                )));
            }
        }
        for (label, count) in &consumed {
            let is_input = inputs.iter().any(|i| i == label);
            if !is_input && !produced.contains(label) {
                return Err(CoreError::OperationFailed(format!(
                    "label [{label}] consumed but never produced"
                )));
            }
            if *count > 1 {
                return Err(CoreError::OperationFailed(format!(
                    "label [{label}] consumed {count} times"
                )));
            }
        }
        for label in &produced {
            let used = consumed.contains_key(label);
            if *label == self.output && used {
                return Err(CoreError::OperationFailed(format!(
                    "output label [{label}] is consumed inside the graph"
                )));
            }
            if *label != self.output && !used {
                return Err(CoreError::OperationFailed(format!(
                    "label [{label}] is produced but never used"
                )));
            }
        }
        if !produced.contains(self.output.as_str()) {
            return Err(CoreError::OperationFailed(format!(
                "output label [{}] is never produced",
                self.output
            )));
        }
        Ok(())
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chain) in self.chains.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{chain}")?;
        }
        Ok(())
    }
}
