//! Global and per-toolpath machining settings.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

use crate::error::{CamToolError, CamToolResult, ParameterError, ParameterResult};

/// How a feed value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    /// mm/min
    #[default]
    PerMinute,
    /// mm/rev
    PerRevolution,
}

impl fmt::Display for FeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerMinute => write!(f, "mm/min"),
            Self::PerRevolution => write!(f, "mm/rev"),
        }
    }
}

/// How a spindle value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedMode {
    /// Revolutions per minute.
    #[default]
    ConstantRpm,
    /// Surface speed in m/min; RPM follows the cutting radius.
    ConstantSurfaceSpeed,
}

impl fmt::Display for SpeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConstantRpm => write!(f, "rpm"),
            Self::ConstantSurfaceSpeed => write!(f, "m/min"),
        }
    }
}

/// What to do with the gap between the last full roughing step and the
/// finishing allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishingPolicy {
    /// Add one roughing pass exactly at the allowance so the final pass
    /// always removes `finalPassDepth`.
    #[default]
    AllowanceStep,
    /// Only whole `cutDepth` steps; the final pass takes whatever remains.
    FullStepsOnly,
}

/// Feed value tagged with its interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedRate {
    pub value: f64,
    pub mode: FeedMode,
}

impl FeedRate {
    /// Feed in mm/min at the given spindle speed.
    pub fn per_minute(&self, rpm: f64) -> f64 {
        match self.mode {
            FeedMode::PerMinute => self.value,
            FeedMode::PerRevolution => self.value * rpm,
        }
    }
}

/// Spindle value tagged with its interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpindleSpeed {
    pub value: f64,
    pub mode: SpeedMode,
}

impl SpindleSpeed {
    /// Spindle RPM when cutting at `radius`, clamped to `max_rpm`.
    pub fn rpm_at(&self, radius: f64, max_rpm: f64) -> f64 {
        match self.mode {
            SpeedMode::ConstantRpm => self.value.min(max_rpm),
            SpeedMode::ConstantSurfaceSpeed => {
                if radius <= f64::EPSILON {
                    return max_rpm;
                }
                (self.value * 1000.0 / (2.0 * PI * radius)).min(max_rpm)
            }
        }
    }
}

fn positive(name: &str, value: f64) -> ParameterResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange {
            name: name.to_string(),
            value,
            min: 0.0,
            max: f64::INFINITY,
        })
    }
}

/// Slowest feed accepted, in mm/min or mm/rev depending on the feed mode.
pub const MIN_FEED_VALUE: f64 = 1e-3;

fn at_least(name: &str, value: f64, min: f64) -> ParameterResult<()> {
    if value.is_finite() && value >= min {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange {
            name: name.to_string(),
            value,
            min,
            max: f64::INFINITY,
        })
    }
}

fn non_negative(name: &str, value: f64) -> ParameterResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange {
            name: name.to_string(),
            value,
            min: 0.0,
            max: f64::INFINITY,
        })
    }
}

/// Project-wide machining context shared by every toolpath.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GlobalSettings {
    /// Raw stock diameter; 0 means "same as the largest shape radius".
    pub material_diameter: f64,
    /// Raw stock length; 0 means "whole shape".
    pub material_length: f64,
    /// Axial lead-in before the cut starts.
    pub flight_distance: f64,
    /// Radial clearance above the stock for rapid moves.
    pub approach_distance: f64,
    pub curve_tolerance: f64,
    #[serde(default = "default_max_spindle_speed")]
    pub max_spindle_speed: f64,
    pub postprocessor_id: String,
}

fn default_max_spindle_speed() -> f64 {
    3000.0
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            material_diameter: 0.0,
            material_length: 0.0,
            flight_distance: 20.0,
            approach_distance: 2.0,
            curve_tolerance: 0.10,
            max_spindle_speed: default_max_spindle_speed(),
            postprocessor_id: "nccad8".to_string(),
        }
    }
}

impl GlobalSettings {
    /// Validate every value. The postprocessor id is checked at export time.
    pub fn validate(&self) -> CamToolResult<()> {
        if !(self.curve_tolerance.is_finite() && self.curve_tolerance > 0.0) {
            return Err(CamToolError::InvalidTolerance {
                tolerance: self.curve_tolerance,
            });
        }
        non_negative("materialDiameter", self.material_diameter)?;
        non_negative("materialLength", self.material_length)?;
        non_negative("flightDistance", self.flight_distance)?;
        non_negative("approachDistance", self.approach_distance)?;
        positive("maxSpindleSpeed", self.max_spindle_speed)?;
        Ok(())
    }

    /// Stock radius implied by `material_diameter`, if one was given.
    pub fn material_radius(&self) -> Option<f64> {
        (self.material_diameter > 0.0).then_some(self.material_diameter / 2.0)
    }
}

/// Per-toolpath parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ToolpathSettings {
    pub name: String,
    pub tool: u32,
    pub feed_value: f64,
    pub feed_mode: FeedMode,
    pub speed_value: f64,
    pub speed_mode: SpeedMode,
    /// Radial depth of each roughing pass.
    pub cut_depth: f64,
    /// Radial stock left for the final pass.
    pub final_pass_depth: f64,
    #[serde(default)]
    pub finishing: FinishingPolicy,
}

impl Default for ToolpathSettings {
    fn default() -> Self {
        Self {
            name: "Unnamed Toolpath".to_string(),
            tool: 0,
            feed_value: 10.0,
            feed_mode: FeedMode::PerMinute,
            speed_value: 2000.0,
            speed_mode: SpeedMode::ConstantRpm,
            cut_depth: 0.5,
            final_pass_depth: 0.2,
            finishing: FinishingPolicy::AllowanceStep,
        }
    }
}

impl ToolpathSettings {
    pub fn validate(&self) -> ParameterResult<()> {
        positive("cutDepth", self.cut_depth)?;
        non_negative("finalPassDepth", self.final_pass_depth)?;
        if self.final_pass_depth > self.cut_depth {
            return Err(ParameterError::Incompatible(format!(
                "finalPassDepth {} exceeds cutDepth {}",
                self.final_pass_depth, self.cut_depth
            )));
        }
        at_least("feedValue", self.feed_value, MIN_FEED_VALUE)?;
        positive("speedValue", self.speed_value)?;
        Ok(())
    }

    pub fn feed(&self) -> FeedRate {
        FeedRate {
            value: self.feed_value,
            mode: self.feed_mode,
        }
    }

    pub fn speed(&self) -> SpindleSpeed {
        SpindleSpeed {
            value: self.speed_value,
            mode: self.speed_mode,
        }
    }
}
