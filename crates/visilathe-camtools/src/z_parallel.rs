//! Z-parallel roughing and finishing.
//!
//! Material is removed in passes of constant radius running parallel to the
//! spindle axis, from the free end (high z) towards the chuck (low z). Each
//! roughing pass steps `cutDepth` deeper until the next step would reach the
//! finishing allowance above the smallest boundary radius; a final pass then
//! traces the boundary itself.
//!
//! On non-cylindrical shapes a pass is lifted locally wherever the boundary
//! plus its allowance rises above the pass radius, so no move ever enters
//! the finished part.

use visilathe_core::CancelToken;

use crate::error::{CamToolError, CamToolResult, ParameterError};
use crate::moves::{MachineMove, MachinePoint, MoveKind, MoveSequence};
use crate::settings::{FinishingPolicy, GlobalSettings, ToolpathSettings};
use crate::shape::{radius_at, BoundaryPoint, Shape};
use crate::toolpath::ToolpathStrategy;

const EPS: f64 = 1e-9;

/// Upper bound on planned passes; more than this means the cut depth is
/// unusably small for the stock.
pub const MAX_PASSES: usize = 100_000;

/// Radius and allowance of one planned pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassLevel {
    /// Nominal pass radius.
    pub radius: f64,
    /// Material kept above the boundary on this pass.
    pub allowance: f64,
    /// The last pass, which traces the boundary.
    pub finishing: bool,
}

/// Geometry shared by all passes of one toolpath.
#[derive(Debug, Clone)]
pub struct PassPlan {
    boundary: Vec<BoundaryPoint>,
    levels: Vec<PassLevel>,
    stock_radius: f64,
    safe_radius: f64,
    lead_in_z: f64,
}

impl PassPlan {
    /// Plan passes for `shape`. Inputs must already be validated.
    pub fn new(
        shape: &dyn Shape,
        settings: &ToolpathSettings,
        global: &GlobalSettings,
    ) -> CamToolResult<Self> {
        let boundary = shape.boundary(global.curve_tolerance)?;
        if boundary.len() < 2 || boundary.windows(2).any(|w| w[1].z <= w[0].z) {
            return Err(CamToolError::InvalidShape(format!(
                "{} boundary must have at least 2 points with increasing z",
                shape.name()
            )));
        }
        let boundary = clip_to_length(boundary, global.material_length);

        let r_min = boundary.iter().map(|p| p.r).fold(f64::INFINITY, f64::min);
        let r_max = boundary.iter().map(|p| p.r).fold(0.0, f64::max);
        let stock_radius = global.material_radius().unwrap_or(r_max);
        let allowance = settings.final_pass_depth;
        let floor = r_min + allowance;

        let mut levels = Vec::new();
        for k in 1.. {
            let radius = stock_radius - k as f64 * settings.cut_depth;
            if radius <= floor + EPS {
                break;
            }
            if levels.len() >= MAX_PASSES {
                return Err(ParameterError::Incompatible(format!(
                    "cutDepth {} needs more than {} passes",
                    settings.cut_depth, MAX_PASSES
                ))
                .into());
            }
            levels.push(PassLevel {
                radius,
                allowance,
                finishing: false,
            });
        }
        if settings.finishing == FinishingPolicy::AllowanceStep
            && allowance > EPS
            && floor < stock_radius - EPS
        {
            levels.push(PassLevel {
                radius: floor,
                allowance,
                finishing: false,
            });
        }
        levels.push(PassLevel {
            radius: r_min,
            allowance: 0.0,
            finishing: true,
        });

        let lead_in_z = boundary[boundary.len() - 1].z + global.flight_distance;
        Ok(Self {
            boundary,
            levels,
            stock_radius,
            safe_radius: stock_radius.max(r_max) + global.approach_distance,
            lead_in_z,
        })
    }

    pub fn levels(&self) -> &[PassLevel] {
        &self.levels
    }

    /// The sampled boundary after clipping to the material length.
    pub fn boundary(&self) -> &[BoundaryPoint] {
        &self.boundary
    }

    pub fn stock_radius(&self) -> f64 {
        self.stock_radius
    }

    /// Radius used for every rapid move.
    pub fn safe_radius(&self) -> f64 {
        self.safe_radius
    }

    fn z_lo(&self) -> f64 {
        self.boundary[0].z
    }

    /// Path of one pass, ordered from high z to low z.
    ///
    /// The radius at each z is `max(level, boundary(z) + allowance)`; points
    /// where the two cross are inserted and flat runs collapse to their end
    /// points.
    pub fn contour(&self, level: &PassLevel) -> Vec<BoundaryPoint> {
        let lifted = |p: &BoundaryPoint| p.r + level.allowance;
        let mut points = Vec::with_capacity(self.boundary.len() * 2);
        for pair in self.boundary.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let (ra, rb) = (lifted(a), lifted(b));
            points.push(BoundaryPoint::new(a.z, ra.max(level.radius)));
            if (ra - level.radius) * (rb - level.radius) < 0.0 {
                let t = (level.radius - ra) / (rb - ra);
                points.push(BoundaryPoint::new(a.z + t * (b.z - a.z), level.radius));
            }
        }
        let last = &self.boundary[self.boundary.len() - 1];
        points.push(BoundaryPoint::new(last.z, lifted(last).max(level.radius)));

        let mut collapsed: Vec<BoundaryPoint> = Vec::with_capacity(points.len());
        for p in points {
            let n = collapsed.len();
            if n >= 2
                && (collapsed[n - 2].r - collapsed[n - 1].r).abs() < EPS
                && (collapsed[n - 1].r - p.r).abs() < EPS
            {
                collapsed.pop();
            }
            collapsed.push(p);
        }
        collapsed.reverse();
        collapsed
    }
}

fn clip_to_length(boundary: Vec<BoundaryPoint>, material_length: f64) -> Vec<BoundaryPoint> {
    let (first, last) = (boundary[0], boundary[boundary.len() - 1]);
    let z_end = first.z + material_length;
    if material_length <= 0.0 || z_end >= last.z {
        return boundary;
    }
    let mut clipped: Vec<BoundaryPoint> = boundary.iter().copied().take_while(|p| p.z < z_end).collect();
    if let Some(r) = radius_at(&boundary, z_end) {
        clipped.push(BoundaryPoint::new(z_end, r));
    }
    clipped
}

/// Horizontal passes parallel to the spindle axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZParallelToolpath;

impl ToolpathStrategy for ZParallelToolpath {
    fn name(&self) -> &'static str {
        "Z-Parallel"
    }

    fn generate(
        &self,
        shape: &dyn Shape,
        settings: &ToolpathSettings,
        global: &GlobalSettings,
        cancel: &CancelToken,
    ) -> CamToolResult<MoveSequence> {
        settings.validate()?;
        global.validate()?;
        let plan = PassPlan::new(shape, settings, global)?;

        let (feed, speed, tool) = (settings.feed(), settings.speed(), settings.tool);
        let step = |kind: MoveKind, z: f64, r: f64| MachineMove {
            kind,
            target: MachinePoint::new(z, r),
            feed,
            speed,
            tool,
        };

        let mut moves = Vec::new();
        for level in plan.levels() {
            if cancel.is_cancelled() {
                tracing::debug!("'{}' superseded after {} moves", settings.name, moves.len());
                return Err(CamToolError::Superseded);
            }
            let contour = plan.contour(level);
            let entry = contour[0];

            moves.push(step(MoveKind::Rapid, plan.lead_in_z, plan.safe_radius));
            moves.push(step(MoveKind::Rapid, plan.lead_in_z, entry.r));
            if plan.lead_in_z > entry.z + EPS {
                moves.push(step(MoveKind::Cut, entry.z, entry.r));
            }
            moves.extend(contour[1..].iter().map(|p| step(MoveKind::Cut, p.z, p.r)));
            moves.push(step(MoveKind::Rapid, plan.z_lo(), plan.safe_radius));
        }

        tracing::debug!(
            "'{}' ({}): {} passes, {} moves",
            settings.name,
            shape.name(),
            plan.levels().len(),
            moves.len()
        );
        Ok(MoveSequence::new(moves))
    }
}
