//! Line style configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default arrowhead thickness in pixels.
pub const DEFAULT_ARROWHEAD_THICKNESS: f64 = 5.0;
/// Default line thickness in pixels.
pub const DEFAULT_LINE_THICKNESS: f64 = 2.5;
/// Default line color.
pub const DEFAULT_COLOR: &str = "coral";
/// Default dash length in pixels.
pub const DEFAULT_DASH_LENGTH: f64 = 10.0;
/// Default dash animation duration in seconds.
pub const DEFAULT_ANIMATION_DURATION: f64 = 0.5;

/// Curve of the connector path. Only straight lines are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Curve {
    #[default]
    Linear,
}

/// Interpolation mode of the dash animation (SVG `calcMode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timing {
    Discrete,
    #[default]
    Linear,
    Paced,
    Spline,
}

impl Timing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timing::Discrete => "discrete",
            Timing::Linear => "linear",
            Timing::Paced => "paced",
            Timing::Spline => "spline",
        }
    }
}

/// Number in JSON that may also be written as a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

/// Repeat count of the dash animation (SVG `repeatCount`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "NumberOrString", into = "NumberOrString")]
pub enum Repeat {
    #[default]
    Indefinite,
    Count(f64),
}

impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repeat::Indefinite => f.write_str("indefinite"),
            Repeat::Count(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for Repeat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "indefinite" {
            return Ok(Repeat::Indefinite);
        }
        s.parse::<f64>()
            .map(Repeat::Count)
            .map_err(|_| format!("invalid repeat count `{s}`"))
    }
}

impl TryFrom<NumberOrString> for Repeat {
    type Error = String;

    fn try_from(value: NumberOrString) -> Result<Self, Self::Error> {
        match value {
            NumberOrString::Number(n) => Ok(Repeat::Count(n)),
            NumberOrString::Text(s) => s.parse(),
        }
    }
}

impl From<Repeat> for NumberOrString {
    fn from(value: Repeat) -> Self {
        match value {
            Repeat::Indefinite => NumberOrString::Text("indefinite".into()),
            Repeat::Count(n) => NumberOrString::Number(n),
        }
    }
}

/// Duration in seconds, written as `"0.5s"` (or a bare number) in JSON.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "NumberOrString", into = "NumberOrString")]
pub struct Seconds(pub f64);

impl fmt::Display for Seconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl FromStr for Seconds {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_suffix('s')
            .unwrap_or(s)
            .trim()
            .parse::<f64>()
            .map(Seconds)
            .map_err(|_| format!("invalid duration `{s}`"))
    }
}

impl TryFrom<NumberOrString> for Seconds {
    type Error = String;

    fn try_from(value: NumberOrString) -> Result<Self, Self::Error> {
        match value {
            NumberOrString::Number(n) => Ok(Seconds(n)),
            NumberOrString::Text(s) => s.parse(),
        }
    }
}

impl From<Seconds> for NumberOrString {
    fn from(value: Seconds) -> Self {
        NumberOrString::Text(value.to_string())
    }
}

/// Resolved dash animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashAnimationConfig {
    pub duration: Seconds,
    pub timing: Timing,
    pub repeat: Repeat,
}

impl Default for DashAnimationConfig {
    fn default() -> Self {
        Self {
            duration: Seconds(DEFAULT_ANIMATION_DURATION),
            timing: Timing::default(),
            repeat: Repeat::default(),
        }
    }
}

/// Resolved dash style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashConfig {
    pub dash_length: f64,
    pub start_offset: f64,
    pub animate: Option<DashAnimationConfig>,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            dash_length: DEFAULT_DASH_LENGTH,
            start_offset: 0.0,
            animate: None,
        }
    }
}

/// Resolved style snapshot of a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleConfiguration {
    pub color: String,
    pub line_thickness: f64,
    pub arrowhead_thickness: f64,
    pub curve: Curve,
    pub dashed: Option<DashConfig>,
    pub text: Option<String>,
}

impl Default for StyleConfiguration {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            line_thickness: DEFAULT_LINE_THICKNESS,
            arrowhead_thickness: DEFAULT_ARROWHEAD_THICKNESS,
            curve: Curve::default(),
            dashed: None,
            text: None,
        }
    }
}

/// `true`/`false`, or an object with overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Toggle<T> {
    Enabled(bool),
    Custom(T),
}

/// Partial dash animation; missing fields take the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashAnimationUpdate {
    pub duration: Option<Seconds>,
    pub timing: Option<Timing>,
    pub repeat: Option<Repeat>,
}

/// Partial dash style; missing fields take the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashUpdate {
    pub dash_length: Option<f64>,
    pub start_offset: Option<f64>,
    pub animate: Option<Toggle<DashAnimationUpdate>>,
}

/// Partial style update.
///
/// Fields left out keep their current value. `dashed` and `animate` objects
/// are applied over the defaults, not over the previous object. An empty
/// `text` removes the label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleUpdate {
    pub color: Option<String>,
    pub line_thickness: Option<f64>,
    pub arrowhead_thickness: Option<f64>,
    pub curve: Option<Curve>,
    pub dashed: Option<Toggle<DashUpdate>>,
    pub text: Option<String>,
}

impl DashAnimationUpdate {
    fn resolve(&self) -> DashAnimationConfig {
        let defaults = DashAnimationConfig::default();
        DashAnimationConfig {
            duration: self.duration.unwrap_or(defaults.duration),
            timing: self.timing.unwrap_or(defaults.timing),
            repeat: self.repeat.unwrap_or(defaults.repeat),
        }
    }
}

impl DashUpdate {
    fn resolve(&self) -> DashConfig {
        let defaults = DashConfig::default();
        DashConfig {
            dash_length: self.dash_length.unwrap_or(defaults.dash_length),
            start_offset: self.start_offset.unwrap_or(defaults.start_offset),
            animate: match &self.animate {
                None | Some(Toggle::Enabled(false)) => None,
                Some(Toggle::Enabled(true)) => Some(DashAnimationConfig::default()),
                Some(Toggle::Custom(animation)) => Some(animation.resolve()),
            },
        }
    }
}

impl StyleConfiguration {
    /// Snapshot with `update` merged over `self`.
    pub fn merged(&self, update: &StyleUpdate) -> StyleConfiguration {
        StyleConfiguration {
            color: update.color.clone().unwrap_or_else(|| self.color.clone()),
            line_thickness: update.line_thickness.unwrap_or(self.line_thickness),
            arrowhead_thickness: update.arrowhead_thickness.unwrap_or(self.arrowhead_thickness),
            curve: update.curve.unwrap_or(self.curve),
            dashed: match &update.dashed {
                None => self.dashed.clone(),
                Some(Toggle::Enabled(false)) => None,
                Some(Toggle::Enabled(true)) => Some(DashConfig::default()),
                Some(Toggle::Custom(dash)) => Some(dash.resolve()),
            },
            text: match &update.text {
                None => self.text.clone(),
                Some(text) if text.is_empty() => None,
                Some(text) => Some(text.clone()),
            },
        }
    }
}
