//! Wait conditions and their evaluators
//!
//! A wait condition is either a minimum sample advance (`Skip`) or a pattern
//! handed to an injected [`ConditionEvaluator`]. The wait engine never looks
//! inside a pattern; it only asks the evaluator whether the transition from
//! the previous sample to the current one satisfies it.
//!
//! [`PinEvaluator`] implements the usual sigrok pin syntax (`l`, `h`, `r`,
//! `f`, `e`, `s` per channel) for callers that do not bring their own.

use crate::types::{Result, Sample, TraceError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

/// One condition a `wait` call blocks on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitCondition<P = PinPattern> {
    /// Satisfied once at least `n` samples have elapsed since the last match
    Skip(u64),
    /// Satisfied when the evaluator accepts the sample transition
    Pattern(P),
}

impl<P> WaitCondition<P> {
    pub fn skip(samples: u64) -> Self {
        WaitCondition::Skip(samples)
    }

    pub fn pattern(pattern: P) -> Self {
        WaitCondition::Pattern(pattern)
    }

    /// Sample count for `Skip` conditions
    pub fn skip_count(&self) -> Option<u64> {
        match self {
            WaitCondition::Skip(samples) => Some(*samples),
            WaitCondition::Pattern(_) => None,
        }
    }
}

/// Strategy deciding whether a pattern matches a sample transition
pub trait ConditionEvaluator {
    type Pattern;

    /// True if `pattern` holds for the step from `previous` to `current`
    fn matches(&self, pattern: &Self::Pattern, previous: Sample, current: Sample) -> bool;
}

/// Adapter turning a closure into a [`ConditionEvaluator`]
pub struct FnEvaluator<P, F> {
    func: F,
    _pattern: PhantomData<fn(&P)>,
}

impl<P, F> FnEvaluator<P, F>
where
    F: Fn(&P, Sample, Sample) -> bool,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            _pattern: PhantomData,
        }
    }
}

impl<P, F> ConditionEvaluator for FnEvaluator<P, F>
where
    F: Fn(&P, Sample, Sample) -> bool,
{
    type Pattern = P;

    fn matches(&self, pattern: &P, previous: Sample, current: Sample) -> bool {
        (self.func)(pattern, previous, current)
    }
}

/// Per-channel requirement in a [`PinPattern`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinCondition {
    /// Channel is low
    Low,
    /// Channel is high
    High,
    /// Channel went low -> high
    Rising,
    /// Channel went high -> low
    Falling,
    /// Channel changed in either direction
    Edge,
    /// Channel did not change
    Stable,
}

impl PinCondition {
    /// Evaluate this requirement for one channel
    pub fn holds(&self, previous: bool, current: bool) -> bool {
        match self {
            PinCondition::Low => !current,
            PinCondition::High => current,
            PinCondition::Rising => !previous && current,
            PinCondition::Falling => previous && !current,
            PinCondition::Edge => previous != current,
            PinCondition::Stable => previous == current,
        }
    }

    fn symbol(&self) -> char {
        match self {
            PinCondition::Low => 'l',
            PinCondition::High => 'h',
            PinCondition::Rising => 'r',
            PinCondition::Falling => 'f',
            PinCondition::Edge => 'e',
            PinCondition::Stable => 's',
        }
    }
}

impl TryFrom<char> for PinCondition {
    type Error = TraceError;

    fn try_from(symbol: char) -> Result<Self> {
        match symbol {
            'l' => Ok(PinCondition::Low),
            'h' => Ok(PinCondition::High),
            'r' => Ok(PinCondition::Rising),
            'f' => Ok(PinCondition::Falling),
            'e' => Ok(PinCondition::Edge),
            's' => Ok(PinCondition::Stable),
            other => Err(TraceError::InvalidConfig(format!(
                "Unknown pin condition '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Set of per-channel requirements that must all hold at once
///
/// An empty pattern matches every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinPattern {
    pins: BTreeMap<usize, PinCondition>,
}

impl PinPattern {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add a requirement for one channel
    pub fn pin(mut self, channel: usize, condition: PinCondition) -> Self {
        self.pins.insert(channel, condition);
        self
    }

    pub fn pins(&self) -> impl Iterator<Item = (usize, PinCondition)> + '_ {
        self.pins.iter().map(|(&channel, &condition)| (channel, condition))
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

impl FromStr for PinPattern {
    type Err = TraceError;

    /// Parse `channel:symbol` pairs separated by commas, e.g. `0:r,2:h`
    fn from_str(text: &str) -> Result<Self> {
        let mut pattern = PinPattern::new();
        for part in text.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            let (channel, symbol) = part.split_once(':').ok_or_else(|| {
                TraceError::InvalidConfig(format!("Expected channel:condition, got {:?}", part))
            })?;
            let channel: usize = channel.trim().parse().map_err(|_| {
                TraceError::InvalidConfig(format!("Invalid channel index {:?}", channel))
            })?;

            let mut symbols = symbol.trim().chars();
            let condition = match (symbols.next(), symbols.next()) {
                (Some(symbol), None) => PinCondition::try_from(symbol)?,
                _ => {
                    return Err(TraceError::InvalidConfig(format!(
                        "Invalid pin condition {:?}",
                        symbol
                    )))
                }
            };
            pattern = pattern.pin(channel, condition);
        }
        Ok(pattern)
    }
}

impl fmt::Display for PinPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .pins()
            .map(|(channel, condition)| format!("{}:{}", channel, condition))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Stock evaluator for [`PinPattern`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct PinEvaluator;

impl ConditionEvaluator for PinEvaluator {
    type Pattern = PinPattern;

    fn matches(&self, pattern: &PinPattern, previous: Sample, current: Sample) -> bool {
        pattern.pins().all(|(channel, condition)| {
            condition.holds(previous.is_high(channel), current.is_high(channel))
        })
    }
}
