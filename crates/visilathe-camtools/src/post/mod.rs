//! Postprocessors for machine-specific output.
//!
//! Every controller dialect turns a move list into text lines: a fixed
//! header, exactly one line per move, and a fixed footer. Modal words
//! (tool, feed, spindle) are only written when they change, inline on the
//! move that needs them, so the line count never depends on the content.
//!
//! Dialects are looked up by identifier in a [`PostprocessorRegistry`]. The
//! built-in table is checked once on first use.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::{CamToolError, CamToolResult};
use crate::moves::MachineMove;
use crate::settings::GlobalSettings;

pub mod fanuc;
pub mod linuxcnc;
pub mod nccad8;

/// A controller dialect.
pub trait Postprocessor: Send + Sync {
    /// Registry identifier.
    fn id(&self) -> &'static str;

    /// File extension for exported programs, without the dot.
    fn file_extension(&self) -> &'static str;

    fn header(&self) -> Vec<String>;

    fn footer(&self) -> Vec<String>;

    fn header_len(&self) -> usize {
        self.header().len()
    }

    fn footer_len(&self) -> usize {
        self.footer().len()
    }

    /// Format a single move, updating the modal state.
    fn format_move(&self, modal: &mut ModalState, mv: &MachineMove) -> String;

    /// Serialize a move list into lines, lazily.
    ///
    /// Yields `header_len() + moves.len() + footer_len()` lines.
    fn serialize<'a>(&'a self, moves: &'a [MachineMove]) -> Box<dyn Iterator<Item = String> + 'a> {
        let mut modal = ModalState::default();
        Box::new(
            self.header()
                .into_iter()
                .chain(moves.iter().map(move |mv| self.format_move(&mut modal, mv)))
                .chain(self.footer()),
        )
    }
}

/// Last emitted value of each modal word.
#[derive(Debug, Clone, Default)]
pub struct ModalState {
    words: HashMap<&'static str, String>,
}

impl ModalState {
    /// Returns `Some(word)` if `word` differs from the last value recorded
    /// under `key`, and records it.
    pub fn changed(&mut self, key: &'static str, word: String) -> Option<String> {
        if self.words.get(key) == Some(&word) {
            return None;
        }
        self.words.insert(key, word.clone());
        Some(word)
    }
}

/// Format a coordinate with three decimals, without negative zero.
pub fn coord(value: f64) -> String {
    let s = format!("{:.3}", value);
    if s == "-0.000" {
        "0.000".to_string()
    } else {
        s
    }
}

/// Join non-empty words with single spaces.
pub(crate) fn line<I: IntoIterator<Item = Option<String>>>(words: I) -> String {
    words.into_iter().flatten().collect::<Vec<_>>().join(" ")
}

/// Creates a configured postprocessor.
pub type PostprocessorFactory = fn(&GlobalSettings) -> Box<dyn Postprocessor>;

/// One registry row.
#[derive(Debug, Clone, Copy)]
pub struct PostprocessorEntry {
    pub id: &'static str,
    pub description: &'static str,
    pub factory: PostprocessorFactory,
}

const BUILTIN_POSTPROCESSORS: &[PostprocessorEntry] = &[
    PostprocessorEntry {
        id: "nccad8",
        description: "nccad 8 lathe, radius programming",
        factory: nccad8::create,
    },
    PostprocessorEntry {
        id: "linuxcnc",
        description: "LinuxCNC lathe, diameter mode",
        factory: linuxcnc::create,
    },
    PostprocessorEntry {
        id: "fanuc",
        description: "Fanuc-style lathe control",
        factory: fanuc::create,
    },
];

/// Ordered table of available dialects.
#[derive(Debug, Clone)]
pub struct PostprocessorRegistry {
    entries: Vec<PostprocessorEntry>,
}

impl PostprocessorRegistry {
    /// Build a registry, rejecting empty or duplicate identifiers.
    pub fn from_entries(entries: Vec<PostprocessorEntry>) -> CamToolResult<Self> {
        if entries.is_empty() {
            return Err(CamToolError::InvalidRegistry(
                "no postprocessors registered".to_string(),
            ));
        }
        for (i, entry) in entries.iter().enumerate() {
            if entry.id.trim().is_empty() {
                return Err(CamToolError::InvalidRegistry(format!(
                    "entry {} has an empty identifier",
                    i
                )));
            }
            if entries[..i].iter().any(|e| e.id == entry.id) {
                return Err(CamToolError::InvalidRegistry(format!(
                    "duplicate identifier '{}'",
                    entry.id
                )));
            }
        }
        Ok(Self { entries })
    }

    /// The built-in dialects, validated on first access.
    pub fn builtin() -> CamToolResult<&'static Self> {
        static REGISTRY: OnceLock<Result<PostprocessorRegistry, String>> = OnceLock::new();
        REGISTRY
            .get_or_init(|| {
                Self::from_entries(BUILTIN_POSTPROCESSORS.to_vec()).map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|e| CamToolError::InvalidRegistry(e.clone()))
    }

    /// Identifiers in registration order.
    pub fn list_identifiers(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn entries(&self) -> &[PostprocessorEntry] {
        &self.entries
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn get_factory(&self, id: &str) -> CamToolResult<PostprocessorFactory> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.factory)
            .ok_or_else(|| CamToolError::UnknownPostprocessor(id.to_string()))
    }

    pub fn create(&self, id: &str, global: &GlobalSettings) -> CamToolResult<Box<dyn Postprocessor>> {
        let factory = self.get_factory(id)?;
        Ok(factory(global))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::CylinderShape;
    use crate::settings::ToolpathSettings;
    use crate::toolpath::Toolpath;

    #[test]
    fn test_builtin_identifiers() {
        let registry = PostprocessorRegistry::builtin().unwrap();
        assert_eq!(registry.list_identifiers(), vec!["nccad8", "linuxcnc", "fanuc"]);
        assert!(registry.contains("fanuc"));
        assert!(!registry.contains("haas"));
    }

    #[test]
    fn test_unknown_identifier() {
        let registry = PostprocessorRegistry::builtin().unwrap();
        assert!(matches!(
            registry.get_factory("haas"),
            Err(CamToolError::UnknownPostprocessor(id)) if id == "haas"
        ));
    }

    #[test]
    fn test_duplicate_rejected() {
        let entries = vec![BUILTIN_POSTPROCESSORS[0], BUILTIN_POSTPROCESSORS[0]];
        assert!(matches!(
            PostprocessorRegistry::from_entries(entries),
            Err(CamToolError::InvalidRegistry(_))
        ));
        assert!(PostprocessorRegistry::from_entries(Vec::new()).is_err());
    }

    #[test]
    fn test_every_dialect_keeps_line_count() {
        let global = GlobalSettings {
            material_diameter: 24.0,
            ..Default::default()
        };
        let moves = Toolpath::new(CylinderShape::new(20.0, 30.0, 0.0), ToolpathSettings::default())
            .generate(&global)
            .unwrap();
        let registry = PostprocessorRegistry::builtin().unwrap();
        for id in registry.list_identifiers() {
            let post = registry.create(id, &global).unwrap();
            assert_eq!(post.id(), id);
            let lines: Vec<String> = post.serialize(&moves).collect();
            assert_eq!(
                lines.len(),
                post.header().len() + moves.len() + post.footer().len(),
                "{}",
                id
            );
            assert!(lines.iter().all(|l| !l.contains('\n')));
        }
    }

    #[test]
    fn test_modal_state() {
        let mut modal = ModalState::default();
        assert_eq!(modal.changed("F", "F100".to_string()), Some("F100".to_string()));
        assert_eq!(modal.changed("F", "F100".to_string()), None);
        assert_eq!(modal.changed("F", "F50".to_string()), Some("F50".to_string()));
        assert_eq!(coord(-0.0001), "0.000");
        assert_eq!(coord(12.3456), "12.346");
    }
}
