//! nccad 8 lathe output.
//!
//! The control works in radius coordinates and only understands feed in
//! mm/min at a fixed spindle RPM, so per-revolution feeds and constant
//! surface speed are resolved per move at the target radius.

use super::{coord, line, ModalState, Postprocessor};
use crate::moves::{MachineMove, MoveKind};
use crate::settings::GlobalSettings;

pub struct Nccad8Post {
    material_diameter: f64,
    material_length: f64,
    max_rpm: f64,
}

pub fn create(global: &GlobalSettings) -> Box<dyn Postprocessor> {
    Box::new(Nccad8Post {
        material_diameter: global.material_diameter,
        material_length: global.material_length,
        max_rpm: global.max_spindle_speed,
    })
}

impl Postprocessor for Nccad8Post {
    fn id(&self) -> &'static str {
        "nccad8"
    }

    fn file_extension(&self) -> &'static str {
        "knc"
    }

    fn header(&self) -> Vec<String> {
        vec![
            "; VisiLathe program for nccad 8".to_string(),
            format!(
                "; stock D{} L{}",
                coord(self.material_diameter),
                coord(self.material_length)
            ),
            "G90".to_string(),
        ]
    }

    fn footer(&self) -> Vec<String> {
        vec!["M05".to_string(), "M30".to_string()]
    }

    fn format_move(&self, modal: &mut ModalState, mv: &MachineMove) -> String {
        let tool = modal.changed("T", format!("T{}", mv.tool));
        let position = format!("X{} Z{}", coord(mv.target.r), coord(mv.target.z));
        match mv.kind {
            MoveKind::Rapid => line([tool, Some("G00".to_string()), Some(position)]),
            MoveKind::Cut => {
                let rpm = mv.speed.rpm_at(mv.target.r, self.max_rpm);
                let spindle = modal.changed("S", format!("S{:.0} M03", rpm));
                let feed = modal.changed("F", format!("F{:.1}", mv.feed.per_minute(rpm)));
                line([tool, spindle, Some("G01".to_string()), Some(position), feed])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::MachinePoint;
    use crate::settings::{FeedMode, FeedRate, SpeedMode, SpindleSpeed};

    fn cut(z: f64, r: f64, speed: SpindleSpeed) -> MachineMove {
        MachineMove {
            kind: MoveKind::Cut,
            target: MachinePoint::new(z, r),
            feed: FeedRate {
                value: 0.1,
                mode: FeedMode::PerRevolution,
            },
            speed,
            tool: 1,
        }
    }

    #[test]
    fn test_radius_coordinates_and_converted_feed() {
        let post = create(&GlobalSettings::default());
        let speed = SpindleSpeed {
            value: 1000.0,
            mode: SpeedMode::ConstantRpm,
        };
        let moves = vec![cut(10.0, 5.0, speed), cut(0.0, 5.0, speed)];
        let lines: Vec<String> = post.serialize(&moves).collect();
        assert_eq!(lines[3], "T1 S1000 M03 G01 X5.000 Z10.000 F100.0");
        assert_eq!(lines[4], "G01 X5.000 Z0.000");
        assert_eq!(lines.last().unwrap(), "M30");
    }

    #[test]
    fn test_surface_speed_resolved_per_move() {
        let post = create(&GlobalSettings::default());
        let speed = SpindleSpeed {
            value: 100.0,
            mode: SpeedMode::ConstantSurfaceSpeed,
        };
        let moves = vec![cut(10.0, 10.0, speed), cut(5.0, 5.0, speed)];
        let lines: Vec<String> = post.serialize(&moves).collect();
        assert!(lines[3].contains("S1592 M03"));
        assert!(lines[4].contains("S3000 M03"));
        assert!(!lines.iter().any(|l| l.contains("G96") || l.contains("G95")));
    }
}
