//! Machined stock model for playback.
//!
//! The workpiece is a row of axial bins, each holding the remaining radius
//! at its center. A cut move lowers every bin it sweeps to the radius of the
//! move at that bin. Applying the same moves always yields the same profile
//! regardless of how the application is split into steps.

use visilathe_camtools::shape::Shape;
use visilathe_camtools::{GlobalSettings, MachinePoint, Toolpath};

/// Default axial resolution (mm per bin).
pub const DEFAULT_BIN_WIDTH: f64 = 0.1;

/// Upper bound on the number of bins.
pub const MAX_BINS: usize = 20_000;

#[derive(Debug, Clone, PartialEq)]
pub struct StockProfile {
    z_min: f64,
    bin_width: f64,
    radii: Vec<f64>,
}

impl StockProfile {
    /// Uniform stock of `radius` between `z_min` and `z_max`.
    pub fn new(z_min: f64, z_max: f64, radius: f64, bin_width: f64) -> Self {
        let span = (z_max - z_min).max(0.0);
        let bins = if bin_width > 0.0 {
            ((span / bin_width).ceil() as usize).clamp(1, MAX_BINS)
        } else {
            1
        };
        Self {
            z_min,
            bin_width: span.max(f64::EPSILON) / bins as f64,
            radii: vec![radius.max(0.0); bins],
        }
    }

    /// Raw stock covering every toolpath's boundary.
    ///
    /// The radius is the material radius, or the largest boundary radius
    /// when no material diameter is set. Returns `None` when no toolpath
    /// has a usable boundary.
    pub fn for_toolpaths(global: &GlobalSettings, toolpaths: &[Toolpath]) -> Option<Self> {
        let mut z_min = f64::INFINITY;
        let mut z_max = f64::NEG_INFINITY;
        let mut r_max: f64 = 0.0;
        for toolpath in toolpaths {
            let Ok(boundary) = toolpath.shape.boundary(global.curve_tolerance) else {
                continue;
            };
            for p in &boundary {
                z_min = z_min.min(p.z);
                z_max = z_max.max(p.z);
                r_max = r_max.max(p.r);
            }
        }
        if !(z_min.is_finite() && z_max > z_min) {
            return None;
        }
        if global.material_length > 0.0 {
            z_max = z_max.min(z_min + global.material_length);
        }
        let radius = global.material_radius().unwrap_or(r_max);
        Some(Self::new(z_min, z_max, radius, DEFAULT_BIN_WIDTH))
    }

    pub fn bins(&self) -> usize {
        self.radii.len()
    }

    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// Center z of bin `index`.
    pub fn bin_center(&self, index: usize) -> f64 {
        self.z_min + (index as f64 + 0.5) * self.bin_width
    }

    /// Remaining radius at `z`, if `z` lies on the stock.
    pub fn radius_at(&self, z: f64) -> Option<f64> {
        self.bin_index(z).map(|i| self.radii[i])
    }

    fn bin_index(&self, z: f64) -> Option<usize> {
        let offset = (z - self.z_min) / self.bin_width;
        if offset < 0.0 || offset > self.radii.len() as f64 {
            return None;
        }
        Some((offset as usize).min(self.radii.len() - 1))
    }

    /// Remove material swept by a cut from `from` to `to`.
    pub fn apply_cut(&mut self, from: MachinePoint, to: MachinePoint) {
        let (lo, hi) = if from.z <= to.z { (from, to) } else { (to, from) };
        let first = ((lo.z - self.z_min) / self.bin_width - 0.5).ceil().max(0.0) as usize;
        let mut swept = false;
        for i in first..self.radii.len() {
            let z = self.bin_center(i);
            if z > hi.z {
                break;
            }
            let t = if hi.z > lo.z { (z - lo.z) / (hi.z - lo.z) } else { 0.0 };
            let r = lo.r + t * (hi.r - lo.r);
            self.radii[i] = self.radii[i].min(r);
            swept = true;
        }
        // Short or purely radial moves still touch the bin they sit in.
        if !swept {
            if let Some(i) = self.bin_index((lo.z + hi.z) / 2.0) {
                self.radii[i] = self.radii[i].min(lo.r.min(hi.r));
            }
        }
    }

    /// Material removed so far relative to `original`, as a volume (mm³).
    pub fn removed_volume(&self, original: &StockProfile) -> f64 {
        self.radii
            .iter()
            .zip(&original.radii)
            .map(|(now, was)| std::f64::consts::PI * (was * was - now * now) * self.bin_width)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visilathe_camtools::{CylinderShape, ToolpathSettings};

    #[test]
    fn test_new_profile() {
        let stock = StockProfile::new(0.0, 10.0, 15.0, 1.0);
        assert_eq!(stock.bins(), 10);
        assert_eq!(stock.bin_center(0), 0.5);
        assert_eq!(stock.radius_at(9.99), Some(15.0));
        assert_eq!(stock.radius_at(-1.0), None);
    }

    #[test]
    fn test_axial_cut_lowers_swept_bins() {
        let mut stock = StockProfile::new(0.0, 10.0, 15.0, 1.0);
        stock.apply_cut(MachinePoint::new(10.0, 14.0), MachinePoint::new(5.0, 14.0));
        assert_eq!(stock.radius_at(7.5), Some(14.0));
        assert_eq!(stock.radius_at(2.5), Some(15.0));

        // A shallower later cut never adds material back.
        stock.apply_cut(MachinePoint::new(10.0, 14.5), MachinePoint::new(0.0, 14.5));
        assert_eq!(stock.radius_at(7.5), Some(14.0));
        assert_eq!(stock.radius_at(2.5), Some(14.5));
    }

    #[test]
    fn test_radial_cut() {
        let mut stock = StockProfile::new(0.0, 10.0, 15.0, 1.0);
        stock.apply_cut(MachinePoint::new(3.2, 15.0), MachinePoint::new(3.2, 12.0));
        assert_eq!(stock.radius_at(3.5), Some(12.0));
        assert_eq!(stock.radius_at(4.5), Some(15.0));
    }

    #[test]
    fn test_for_toolpaths() {
        let global = GlobalSettings {
            material_diameter: 30.0,
            ..Default::default()
        };
        let toolpaths = vec![Toolpath::new(
            CylinderShape::new(20.0, 40.0, 5.0),
            ToolpathSettings::default(),
        )];
        let stock = StockProfile::for_toolpaths(&global, &toolpaths).unwrap();
        assert_eq!(stock.bins(), 400);
        assert_eq!(stock.radius_at(5.0), Some(15.0));
        assert!(StockProfile::for_toolpaths(&global, &[]).is_none());
    }

    #[test]
    fn test_removed_volume() {
        let original = StockProfile::new(0.0, 10.0, 2.0, 1.0);
        let mut cut = original.clone();
        cut.apply_cut(MachinePoint::new(10.0, 1.0), MachinePoint::new(0.0, 1.0));
        let expected = std::f64::consts::PI * (4.0 - 1.0) * 10.0;
        assert!((cut.removed_volume(&original) - expected).abs() < 1e-9);
    }
}
