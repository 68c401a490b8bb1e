//! Rotational stock shapes.
//!
//! A shape describes the finished part as its boundary curve in the (z, r)
//! half-plane: `z` is the axial position, `r` the distance from the spindle
//! axis. Sampling a shape yields a polyline with strictly increasing `z`.

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

use crate::error::{CamToolError, CamToolResult};

/// A vertex of a sampled boundary curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryPoint {
    /// Axial position (mm).
    pub z: f64,
    /// Radius from the spindle axis (mm).
    pub r: f64,
}

impl BoundaryPoint {
    pub fn new(z: f64, r: f64) -> Self {
        Self { z, r }
    }
}

/// Geometry a toolpath machines towards.
pub trait Shape: Send + Sync + std::fmt::Debug {
    /// Human readable kind of shape.
    fn name(&self) -> &'static str;

    /// Sample the boundary curve.
    ///
    /// `tolerance` is the maximum allowed deviation between the sampled
    /// polyline and the true curve. Points are ordered by strictly increasing
    /// `z` and every radius is finite and non-negative.
    fn boundary(&self, tolerance: f64) -> CamToolResult<Vec<BoundaryPoint>>;
}

/// Reject non-positive or non-finite sampling tolerances.
pub fn check_tolerance(tolerance: f64) -> CamToolResult<()> {
    if tolerance.is_finite() && tolerance > 0.0 {
        Ok(())
    } else {
        Err(CamToolError::InvalidTolerance { tolerance })
    }
}

/// Linearly interpolate the boundary radius at `z`.
///
/// Returns `None` when `z` lies outside the sampled span.
pub fn radius_at(boundary: &[BoundaryPoint], z: f64) -> Option<f64> {
    let first = boundary.first()?;
    let last = boundary.last()?;
    if z < first.z || z > last.z {
        return None;
    }
    for pair in boundary.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if z >= a.z && z <= b.z {
            let t = (z - a.z) / (b.z - a.z);
            return Some(a.r + t * (b.r - a.r));
        }
    }
    Some(last.r)
}

fn check_dimension(name: &str, value: f64) -> CamToolResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CamToolError::InvalidShape(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

/// Plain cylinder of constant diameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CylinderShape {
    pub diameter: f64,
    pub length: f64,
    #[serde(default)]
    pub start_z: f64,
}

impl CylinderShape {
    pub fn new(diameter: f64, length: f64, start_z: f64) -> Self {
        Self {
            diameter,
            length,
            start_z,
        }
    }
}

impl Default for CylinderShape {
    fn default() -> Self {
        Self::new(30.0, 50.0, 15.0)
    }
}

impl Shape for CylinderShape {
    fn name(&self) -> &'static str {
        "Cylinder"
    }

    fn boundary(&self, tolerance: f64) -> CamToolResult<Vec<BoundaryPoint>> {
        check_tolerance(tolerance)?;
        check_dimension("diameter", self.diameter)?;
        check_dimension("length", self.length)?;
        let r = self.diameter / 2.0;
        Ok(vec![
            BoundaryPoint::new(self.start_z, r),
            BoundaryPoint::new(self.start_z + self.length, r),
        ])
    }
}

/// Straight taper between two diameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConeShape {
    pub start_diameter: f64,
    pub end_diameter: f64,
    pub length: f64,
    #[serde(default)]
    pub start_z: f64,
}

impl Shape for ConeShape {
    fn name(&self) -> &'static str {
        "Cone"
    }

    fn boundary(&self, tolerance: f64) -> CamToolResult<Vec<BoundaryPoint>> {
        check_tolerance(tolerance)?;
        check_dimension("length", self.length)?;
        for (name, d) in [
            ("startDiameter", self.start_diameter),
            ("endDiameter", self.end_diameter),
        ] {
            if !d.is_finite() || d < 0.0 {
                return Err(CamToolError::InvalidShape(format!(
                    "{} must be non-negative, got {}",
                    name, d
                )));
            }
        }
        Ok(vec![
            BoundaryPoint::new(self.start_z, self.start_diameter / 2.0),
            BoundaryPoint::new(self.start_z + self.length, self.end_diameter / 2.0),
        ])
    }
}

/// Upper bound on chords sampled for a dome cap.
pub const MAX_CAP_SEGMENTS: usize = 100_000;

/// Cylinder ending in a hemispherical cap at the high-z end.
///
/// The cap is the only curved part, so it is the only part whose sample
/// count depends on the tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomeShape {
    pub diameter: f64,
    /// Total length including the cap.
    pub length: f64,
    #[serde(default)]
    pub start_z: f64,
}

impl DomeShape {
    /// Number of chords needed so the sagitta stays within `tolerance`.
    fn cap_segments(radius: f64, tolerance: f64) -> CamToolResult<usize> {
        if tolerance >= radius {
            return Ok(1);
        }
        let max_angle = 2.0 * (1.0 - tolerance / radius).acos();
        let segments = (FRAC_PI_2 / max_angle).ceil().max(1.0);
        if !segments.is_finite() || segments > MAX_CAP_SEGMENTS as f64 {
            return Err(CamToolError::InvalidShape(format!(
                "curve tolerance {} needs more than {} segments for a dome of radius {}",
                tolerance, MAX_CAP_SEGMENTS, radius
            )));
        }
        Ok(segments as usize)
    }
}

impl Shape for DomeShape {
    fn name(&self) -> &'static str {
        "Dome"
    }

    fn boundary(&self, tolerance: f64) -> CamToolResult<Vec<BoundaryPoint>> {
        check_tolerance(tolerance)?;
        check_dimension("diameter", self.diameter)?;
        check_dimension("length", self.length)?;
        let radius = self.diameter / 2.0;
        if self.length < radius {
            return Err(CamToolError::InvalidShape(format!(
                "dome length {} is shorter than its cap radius {}",
                self.length, radius
            )));
        }

        let cap_start = self.start_z + self.length - radius;
        let segments = Self::cap_segments(radius, tolerance)?;
        let mut points = Vec::with_capacity(segments + 2);
        if cap_start > self.start_z {
            points.push(BoundaryPoint::new(self.start_z, radius));
        }
        for j in 0..=segments {
            let phi = FRAC_PI_2 * j as f64 / segments as f64;
            let r = if j == segments { 0.0 } else { radius * phi.cos() };
            points.push(BoundaryPoint::new(cap_start + radius * phi.sin(), r));
        }
        Ok(points)
    }
}

/// Arbitrary profile given as a polyline.
///
/// Sampling simplifies the polyline with Ramer-Douglas-Peucker at the
/// requested tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileShape {
    pub points: Vec<BoundaryPoint>,
}

impl ProfileShape {
    pub fn new(points: Vec<BoundaryPoint>) -> Self {
        Self { points }
    }

    /// Check the polyline is a valid boundary.
    pub fn validate(&self) -> CamToolResult<()> {
        if self.points.len() < 2 {
            return Err(CamToolError::InvalidShape(format!(
                "profile needs at least 2 points, got {}",
                self.points.len()
            )));
        }
        for p in &self.points {
            if !p.z.is_finite() || !p.r.is_finite() || p.r < 0.0 {
                return Err(CamToolError::InvalidShape(format!(
                    "profile point ({}, {}) is not a finite non-negative radius",
                    p.z, p.r
                )));
            }
        }
        if let Some(pair) = self.points.windows(2).find(|w| w[1].z <= w[0].z) {
            return Err(CamToolError::InvalidShape(format!(
                "profile z must be strictly increasing ({} then {})",
                pair[0].z, pair[1].z
            )));
        }
        Ok(())
    }
}

fn distance_to_chord(p: BoundaryPoint, a: BoundaryPoint, b: BoundaryPoint) -> f64 {
    let (dz, dr) = (b.z - a.z, b.r - a.r);
    let len = (dz * dz + dr * dr).sqrt();
    if len == 0.0 {
        return ((p.z - a.z).powi(2) + (p.r - a.r).powi(2)).sqrt();
    }
    (dr * (p.z - a.z) - dz * (p.r - a.r)).abs() / len
}

fn simplify(points: &[BoundaryPoint], tolerance: f64, keep: &mut [bool]) {
    // Iterative to keep deep profiles off the call stack.
    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let (mut worst, mut worst_dist) = (start, 0.0);
        for i in start + 1..end {
            let d = distance_to_chord(points[i], points[start], points[end]);
            if d > worst_dist {
                worst = i;
                worst_dist = d;
            }
        }
        if worst_dist > tolerance {
            keep[worst] = true;
            stack.push((start, worst));
            stack.push((worst, end));
        }
    }
}

impl Shape for ProfileShape {
    fn name(&self) -> &'static str {
        "Profile"
    }

    fn boundary(&self, tolerance: f64) -> CamToolResult<Vec<BoundaryPoint>> {
        check_tolerance(tolerance)?;
        self.validate()?;
        let mut keep = vec![false; self.points.len()];
        keep[0] = true;
        keep[self.points.len() - 1] = true;
        simplify(&self.points, tolerance, &mut keep);
        Ok(self
            .points
            .iter()
            .zip(keep)
            .filter_map(|(p, k)| k.then_some(*p))
            .collect())
    }
}

/// Serializable closed set of shapes a toolpath can own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockShape {
    Cylinder(CylinderShape),
    Cone(ConeShape),
    Dome(DomeShape),
    Profile(ProfileShape),
}

impl StockShape {
    /// Freeze any shape into a profile of its sampled boundary.
    pub fn recorded(shape: &dyn Shape, tolerance: f64) -> CamToolResult<Self> {
        Ok(StockShape::Profile(ProfileShape::new(
            shape.boundary(tolerance)?,
        )))
    }

    fn inner(&self) -> &dyn Shape {
        match self {
            StockShape::Cylinder(s) => s,
            StockShape::Cone(s) => s,
            StockShape::Dome(s) => s,
            StockShape::Profile(s) => s,
        }
    }
}

impl Default for StockShape {
    fn default() -> Self {
        StockShape::Cylinder(CylinderShape::default())
    }
}

impl From<CylinderShape> for StockShape {
    fn from(shape: CylinderShape) -> Self {
        StockShape::Cylinder(shape)
    }
}

impl From<ConeShape> for StockShape {
    fn from(shape: ConeShape) -> Self {
        StockShape::Cone(shape)
    }
}

impl From<DomeShape> for StockShape {
    fn from(shape: DomeShape) -> Self {
        StockShape::Dome(shape)
    }
}

impl From<ProfileShape> for StockShape {
    fn from(shape: ProfileShape) -> Self {
        StockShape::Profile(shape)
    }
}

impl Shape for StockShape {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn boundary(&self, tolerance: f64) -> CamToolResult<Vec<BoundaryPoint>> {
        self.inner().boundary(tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cylinder_boundary() {
        let shape = CylinderShape::new(20.0, 40.0, 0.0);
        let boundary = shape.boundary(0.1).unwrap();
        assert_eq!(
            boundary,
            vec![BoundaryPoint::new(0.0, 10.0), BoundaryPoint::new(40.0, 10.0)]
        );
    }

    #[test]
    fn test_default_cylinder() {
        let shape = CylinderShape::default();
        assert_eq!(shape.diameter, 30.0);
        assert_eq!(shape.length, 50.0);
        assert_eq!(shape.start_z, 15.0);
    }

    #[test]
    fn test_rejects_non_positive_tolerance() {
        let shape = CylinderShape::default();
        for tol in [0.0, -0.1, f64::NAN] {
            assert!(matches!(
                shape.boundary(tol),
                Err(CamToolError::InvalidTolerance { .. })
            ));
        }
    }

    #[test]
    fn test_cylinder_rejects_zero_length() {
        let shape = CylinderShape::new(20.0, 0.0, 0.0);
        assert!(matches!(
            shape.boundary(0.1),
            Err(CamToolError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_dome_sampling_respects_tolerance() {
        let dome = DomeShape {
            diameter: 20.0,
            length: 30.0,
            start_z: 0.0,
        };
        let coarse = dome.boundary(1.0).unwrap();
        let fine = dome.boundary(0.01).unwrap();
        assert!(fine.len() > coarse.len());

        for boundary in [&coarse, &fine] {
            assert_eq!(boundary.first().unwrap().z, 0.0);
            assert_eq!(boundary.last().unwrap().z, 30.0);
            assert_eq!(boundary.last().unwrap().r, 0.0);
            assert!(boundary.windows(2).all(|w| w[1].z > w[0].z));
        }

        // Chord midpoints stay within tolerance of the true cap.
        let center_z = 20.0;
        for w in fine.windows(2).skip(1) {
            let mz = (w[0].z + w[1].z) / 2.0 - center_z;
            let mr = (w[0].r + w[1].r) / 2.0;
            let dist = 10.0 - (mz * mz + mr * mr).sqrt();
            assert!(dist <= 0.01 + 1e-9, "sagitta {}", dist);
        }
    }

    #[test]
    fn test_dome_shorter_than_radius() {
        let dome = DomeShape {
            diameter: 20.0,
            length: 5.0,
            start_z: 0.0,
        };
        assert!(dome.boundary(0.1).is_err());
    }

    #[test]
    fn test_dome_tiny_tolerance() {
        let dome = DomeShape {
            diameter: 20.0,
            length: 30.0,
            start_z: 0.0,
        };
        assert!(matches!(
            dome.boundary(1e-20),
            Err(CamToolError::InvalidShape(_))
        ));
        let fine = dome.boundary(1e-6).unwrap();
        assert!(fine.len() > 1000 && fine.len() <= MAX_CAP_SEGMENTS + 2);
    }

    #[test]
    fn test_profile_validation() {
        let too_short = ProfileShape::new(vec![BoundaryPoint::new(0.0, 5.0)]);
        assert!(too_short.validate().is_err());

        let backwards = ProfileShape::new(vec![
            BoundaryPoint::new(0.0, 5.0),
            BoundaryPoint::new(0.0, 6.0),
        ]);
        assert!(backwards.validate().is_err());

        let negative = ProfileShape::new(vec![
            BoundaryPoint::new(0.0, 5.0),
            BoundaryPoint::new(1.0, -1.0),
        ]);
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_profile_simplification() {
        let profile = ProfileShape::new(vec![
            BoundaryPoint::new(0.0, 10.0),
            BoundaryPoint::new(1.0, 10.01),
            BoundaryPoint::new(2.0, 10.0),
            BoundaryPoint::new(3.0, 8.0),
            BoundaryPoint::new(4.0, 8.0),
        ]);
        let simplified = profile.boundary(0.1).unwrap();
        assert_eq!(
            simplified,
            vec![
                BoundaryPoint::new(0.0, 10.0),
                BoundaryPoint::new(2.0, 10.0),
                BoundaryPoint::new(3.0, 8.0),
                BoundaryPoint::new(4.0, 8.0),
            ]
        );
        assert_eq!(profile.boundary(0.001).unwrap().len(), 5);
    }

    #[test]
    fn test_radius_at() {
        let boundary = vec![
            BoundaryPoint::new(0.0, 10.0),
            BoundaryPoint::new(10.0, 5.0),
        ];
        assert_eq!(radius_at(&boundary, 0.0), Some(10.0));
        assert_eq!(radius_at(&boundary, 5.0), Some(7.5));
        assert_eq!(radius_at(&boundary, 10.0), Some(5.0));
        assert_eq!(radius_at(&boundary, 11.0), None);
    }

    #[test]
    fn test_stock_shape_serde() {
        let shape = StockShape::from(CylinderShape::default());
        let json = serde_json::to_string(&shape).unwrap();
        assert!(json.contains("\"kind\":\"cylinder\""));
        assert!(json.contains("\"startZ\":15.0"));
        let back: StockShape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, shape);
        assert_eq!(back.name(), "Cylinder");
    }

    #[test]
    fn test_recorded_shape() {
        let dome = DomeShape {
            diameter: 10.0,
            length: 20.0,
            start_z: 0.0,
        };
        let recorded = StockShape::recorded(&dome, 0.05).unwrap();
        assert_eq!(
            recorded.boundary(0.05).unwrap().len(),
            dome.boundary(0.05).unwrap().len()
        );
    }
}
