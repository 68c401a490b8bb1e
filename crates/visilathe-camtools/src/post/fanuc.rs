//! Fanuc-style lathe output.

use super::{coord, line, ModalState, Postprocessor};
use crate::moves::{MachineMove, MoveKind};
use crate::settings::{FeedMode, GlobalSettings, SpeedMode};

/// Program number written after the opening `%`.
pub const PROGRAM_NUMBER: u32 = 1;

pub struct FanucPost {
    max_rpm: f64,
}

pub fn create(global: &GlobalSettings) -> Box<dyn Postprocessor> {
    Box::new(FanucPost {
        max_rpm: global.max_spindle_speed,
    })
}

impl Postprocessor for FanucPost {
    fn id(&self) -> &'static str {
        "fanuc"
    }

    fn file_extension(&self) -> &'static str {
        "nc"
    }

    fn header(&self) -> Vec<String> {
        vec![
            "%".to_string(),
            format!("O{:04} (VISILATHE)", PROGRAM_NUMBER),
            "G18 G21 G40 G80".to_string(),
            format!("G50 S{:.0}", self.max_rpm),
        ]
    }

    fn footer(&self) -> Vec<String> {
        vec![
            "M05".to_string(),
            "G28 U0. W0.".to_string(),
            "M30".to_string(),
            "%".to_string(),
        ]
    }

    fn format_move(&self, modal: &mut ModalState, mv: &MachineMove) -> String {
        let tool = modal.changed("T", format!("T{:02}{:02}", mv.tool, mv.tool));
        let position = format!("X{} Z{}", coord(2.0 * mv.target.r), coord(mv.target.z));
        match mv.kind {
            MoveKind::Rapid => line([tool, Some("G00".to_string()), Some(position)]),
            MoveKind::Cut => {
                let spindle = modal.changed(
                    "S",
                    match mv.speed.mode {
                        SpeedMode::ConstantRpm => format!("G97 S{:.0} M03", mv.speed.value),
                        SpeedMode::ConstantSurfaceSpeed => {
                            format!("G96 S{:.0} M03", mv.speed.value)
                        }
                    },
                );
                let (feed_mode, feed) = match mv.feed.mode {
                    FeedMode::PerMinute => ("G98", format!("F{:.1}", mv.feed.value)),
                    FeedMode::PerRevolution => ("G99", format!("F{:.3}", mv.feed.value)),
                };
                let feed_mode = modal.changed("G9x", feed_mode.to_string());
                let feed = modal.changed("F", feed);
                line([tool, spindle, feed_mode, Some("G01".to_string()), Some(position), feed])
            }
        }
    }
}
