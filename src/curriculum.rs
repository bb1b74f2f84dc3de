//! Ordered item universe. Order defines introduction order.

use std::collections::HashSet;

use thiserror::Error;

/// Sharp-spelled chromatic pitch classes, starting at C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Lowest and highest playable note of the default range (standard-tuned guitar,
/// open low E to the high E at the 12th fret).
pub const GUITAR_MIN_NOTE: &str = "E2";
pub const GUITAR_MAX_NOTE: &str = "E5";

/// Pitch orders accepted by [`note_range`]: C-1 (0) through G9 (127).
pub const MIN_NOTE_ORDER: i32 = 0;
pub const MAX_NOTE_ORDER: i32 = 127;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CurriculumError {
    #[error("duplicate curriculum item: {0}")]
    DuplicateItem(String),
    #[error("invalid note name: {0}")]
    InvalidNote(String),
    #[error("empty note range: {min} is above {max}")]
    EmptyRange { min: String, max: String },
    #[error("note out of range (C-1..G9): {0}")]
    NoteOutOfRange(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Curriculum {
    items: Vec<String>,
}

impl Curriculum {
    pub fn new<I, S>(items: I) -> Result<Self, CurriculumError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.as_str()) {
                return Err(CurriculumError::DuplicateItem(item.clone()));
            }
        }
        Ok(Self { items })
    }

    /// E2..=E5, 37 notes.
    pub fn guitar() -> Self {
        Self {
            items: note_range(GUITAR_MIN_NOTE, GUITAR_MAX_NOTE).unwrap_or_default(),
        }
    }

    pub fn notes(min: &str, max: &str) -> Result<Self, CurriculumError> {
        Ok(Self {
            items: note_range(min, max)?,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.iter().any(|i| i == item)
    }

    pub fn position(&self, item: &str) -> Option<usize> {
        self.items.iter().position(|i| i == item)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }
}

/// Absolute pitch order of a note name such as `"C#4"`: `(octave + 1) * 12 + index`.
/// Matches MIDI numbering, so `A4` is 69. `None` for unknown names and for
/// octaves whose order does not fit in an `i32`.
pub fn note_order(name: &str) -> Option<i32> {
    let split = name.find(|c: char| c.is_ascii_digit() || c == '-')?;
    let (pitch, octave) = name.split_at(split);
    let index = NOTE_NAMES.iter().position(|n| *n == pitch)? as i32;
    let octave: i32 = octave.parse().ok()?;
    octave.checked_add(1)?.checked_mul(12)?.checked_add(index)
}

/// Note name for an absolute pitch order, the inverse of [`note_order`].
pub fn note_name(order: i32) -> String {
    let index = order.rem_euclid(12) as usize;
    let octave = order.div_euclid(12) - 1;
    format!("{}{}", NOTE_NAMES[index], octave)
}

/// All notes from `min` to `max` inclusive, ascending by pitch.
pub fn note_range(min: &str, max: &str) -> Result<Vec<String>, CurriculumError> {
    let low = bounded_order(min)?;
    let high = bounded_order(max)?;
    if low > high {
        return Err(CurriculumError::EmptyRange {
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok((low..=high).map(note_name).collect())
}

fn bounded_order(name: &str) -> Result<i32, CurriculumError> {
    match note_order(name) {
        Some(order) if (MIN_NOTE_ORDER..=MAX_NOTE_ORDER).contains(&order) => Ok(order),
        Some(_) => Err(CurriculumError::NoteOutOfRange(name.to_string())),
        // Parsed pitch class with an octave too large to represent.
        None if parses_as_overflow(name) => {
            Err(CurriculumError::NoteOutOfRange(name.to_string()))
        }
        None => Err(CurriculumError::InvalidNote(name.to_string())),
    }
}

fn parses_as_overflow(name: &str) -> bool {
    let Some(split) = name.find(|c: char| c.is_ascii_digit() || c == '-') else {
        return false;
    };
    let (pitch, octave) = name.split_at(split);
    NOTE_NAMES.contains(&pitch) && octave.parse::<i64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guitar_range() {
        let curriculum = Curriculum::guitar();
        assert_eq!(curriculum.len(), 37);
        assert_eq!(curriculum.get(0), Some("E2"));
        assert_eq!(curriculum.get(1), Some("F2"));
        assert_eq!(curriculum.get(36), Some("E5"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = Curriculum::new(["A", "B", "A"]).unwrap_err();
        assert_eq!(err, CurriculumError::DuplicateItem("A".to_string()));
    }

    #[test]
    fn test_empty_curriculum_allowed() {
        let curriculum = Curriculum::new(Vec::<String>::new()).unwrap();
        assert!(curriculum.is_empty());
        assert_eq!(curriculum.get(0), None);
    }

    #[test]
    fn test_note_order() {
        assert_eq!(note_order("A4"), Some(69));
        assert_eq!(note_order("C4"), Some(60));
        assert_eq!(note_order("E2"), Some(40));
        assert_eq!(note_order("C#-1"), Some(1));
        assert_eq!(note_order("H2"), None);
        assert_eq!(note_order("Db3"), None);
        assert_eq!(note_order("E"), None);
    }

    #[test]
    fn test_note_name_inverse() {
        for order in 0..128 {
            assert_eq!(note_order(&note_name(order)), Some(order));
        }
    }

    #[test]
    fn test_note_range_errors() {
        assert!(matches!(
            note_range("E5", "E2"),
            Err(CurriculumError::EmptyRange { .. })
        ));
        assert_eq!(
            note_range("X1", "E2"),
            Err(CurriculumError::InvalidNote("X1".to_string()))
        );
        assert_eq!(note_range("B3", "C4").unwrap(), vec!["B3", "C4"]);
    }

    #[test]
    fn test_note_order_overflow_is_none() {
        assert_eq!(note_order("C2147483647"), None);
        assert_eq!(note_order("B178956970"), None);
        assert_eq!(note_order("C-2147483648"), None);
        assert_eq!(note_order("C99999999999"), None);
    }

    #[test]
    fn test_note_range_rejects_out_of_range_octaves() {
        assert_eq!(
            note_range("C-100000000", "C100000000"),
            Err(CurriculumError::NoteOutOfRange("C-100000000".to_string()))
        );
        assert_eq!(
            note_range("E2", "C2147483647"),
            Err(CurriculumError::NoteOutOfRange("C2147483647".to_string()))
        );
        assert_eq!(
            note_range("E2", "G#9"),
            Err(CurriculumError::NoteOutOfRange("G#9".to_string()))
        );
        assert!(matches!(
            Curriculum::notes("C-2", "E5"),
            Err(CurriculumError::NoteOutOfRange(_))
        ));

        let full = note_range("C-1", "G9").unwrap();
        assert_eq!(full.len(), 128);
        assert_eq!(full.last().map(String::as_str), Some("G9"));
    }

    #[test]
    fn test_position_and_contains() {
        let curriculum = Curriculum::new(["A", "B", "C"]).unwrap();
        assert_eq!(curriculum.position("C"), Some(2));
        assert!(curriculum.contains("B"));
        assert!(!curriculum.contains("D"));
    }
}
