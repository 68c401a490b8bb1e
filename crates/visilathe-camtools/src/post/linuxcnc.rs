//! LinuxCNC lathe output.
//!
//! Diameter mode (G7) with native feed-per-revolution and constant surface
//! speed support.

use super::{coord, line, ModalState, Postprocessor};
use crate::moves::{MachineMove, MoveKind};
use crate::settings::{FeedMode, GlobalSettings, SpeedMode};

pub struct LinuxCncPost {
    max_rpm: f64,
}

pub fn create(global: &GlobalSettings) -> Box<dyn Postprocessor> {
    Box::new(LinuxCncPost {
        max_rpm: global.max_spindle_speed,
    })
}

impl Postprocessor for LinuxCncPost {
    fn id(&self) -> &'static str {
        "linuxcnc"
    }

    fn file_extension(&self) -> &'static str {
        "ngc"
    }

    fn header(&self) -> Vec<String> {
        vec![
            "%".to_string(),
            "(VisiLathe program for LinuxCNC)".to_string(),
            "G18 G21 G90 G7".to_string(),
            "G40 G49 G80".to_string(),
        ]
    }

    fn footer(&self) -> Vec<String> {
        vec!["M05".to_string(), "M30".to_string(), "%".to_string()]
    }

    fn format_move(&self, modal: &mut ModalState, mv: &MachineMove) -> String {
        let tool = modal.changed("T", format!("T{} M06", mv.tool));
        let position = format!("X{} Z{}", coord(2.0 * mv.target.r), coord(mv.target.z));
        match mv.kind {
            MoveKind::Rapid => line([tool, Some("G0".to_string()), Some(position)]),
            MoveKind::Cut => {
                let spindle = modal.changed(
                    "S",
                    match mv.speed.mode {
                        SpeedMode::ConstantRpm => format!("G97 S{:.0} M03", mv.speed.value),
                        SpeedMode::ConstantSurfaceSpeed => {
                            format!("G96 D{:.0} S{:.0} M03", self.max_rpm, mv.speed.value)
                        }
                    },
                );
                let feed_mode = modal.changed(
                    "G9x",
                    match mv.feed.mode {
                        FeedMode::PerMinute => "G94".to_string(),
                        FeedMode::PerRevolution => "G95".to_string(),
                    },
                );
                let feed = modal.changed(
                    "F",
                    match mv.feed.mode {
                        FeedMode::PerMinute => format!("F{:.1}", mv.feed.value),
                        FeedMode::PerRevolution => format!("F{:.3}", mv.feed.value),
                    },
                );
                line([tool, spindle, feed_mode, Some("G1".to_string()), Some(position), feed])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::MachinePoint;
    use crate::settings::{FeedRate, SpindleSpeed};

    #[test]
    fn test_diameter_mode_and_native_modes() {
        let post = create(&GlobalSettings::default());
        let mv = |kind, z, r| MachineMove {
            kind,
            target: MachinePoint::new(z, r),
            feed: FeedRate {
                value: 0.15,
                mode: FeedMode::PerRevolution,
            },
            speed: SpindleSpeed {
                value: 120.0,
                mode: SpeedMode::ConstantSurfaceSpeed,
            },
            tool: 3,
        };
        let moves = vec![
            mv(MoveKind::Rapid, 50.0, 12.0),
            mv(MoveKind::Cut, 30.0, 10.0),
            mv(MoveKind::Cut, 0.0, 10.0),
        ];
        let lines: Vec<String> = post.serialize(&moves).collect();
        assert_eq!(lines.len(), 4 + 3 + 3);
        assert_eq!(lines[4], "T3 M06 G0 X24.000 Z50.000");
        assert_eq!(lines[5], "G96 D3000 S120 M03 G95 G1 X20.000 Z30.000 F0.150");
        assert_eq!(lines[6], "G1 X20.000 Z0.000");
    }
}
