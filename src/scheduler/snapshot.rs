//! Persisted form of the scheduler state.
//!
//! Deserialization never rejects a document because of a bad field: numbers that
//! are missing or malformed read as zero, timestamps read as `None` (the engine
//! substitutes the restore time), and array entries that are not objects are
//! skipped. `item` also accepts the legacy `noteValue` key.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::{LearningRecord, MasteredRecord, Stats};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, deserialize_with = "lenient_cards")]
    pub learning_cards: Vec<SnapshotCard>,
    #[serde(default, deserialize_with = "lenient_cards")]
    pub mastered_cards: Vec<SnapshotCard>,
    /// Next presentation id. Not part of item identity.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub card_id_counter: u64,
    /// Derived statistics at save time, for readers of the stored document.
    /// Ignored on restore.
    #[serde(
        default,
        deserialize_with = "lenient_stats",
        skip_serializing_if = "Option::is_none"
    )]
    pub stats: Option<Stats>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.learning_cards.is_empty() && self.mastered_cards.is_empty()
    }

    /// Lenient conversion from an arbitrary JSON value. Anything that is not an
    /// object yields an empty snapshot.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCard {
    #[serde(
        default,
        alias = "noteValue",
        deserialize_with = "lenient_item",
        skip_serializing_if = "Option::is_none"
    )]
    pub item: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub correct_streak: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub total_correct: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub total_incorrect: u32,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_seen: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub mastered_at: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub review_count: Option<u32>,
}

impl SnapshotCard {
    pub fn into_learning(self, item: String, now_ms: i64) -> LearningRecord {
        LearningRecord {
            item,
            correct_streak: self.correct_streak,
            total_correct: self.total_correct,
            total_incorrect: self.total_incorrect,
            last_seen: self.last_seen.unwrap_or(now_ms),
        }
    }

    pub fn into_mastered(self, item: String, now_ms: i64) -> MasteredRecord {
        MasteredRecord {
            item,
            correct_streak: self.correct_streak,
            total_correct: self.total_correct,
            total_incorrect: self.total_incorrect,
            last_seen: self.last_seen.unwrap_or(now_ms),
            mastered_at: self.mastered_at.unwrap_or(now_ms),
            review_count: self.review_count.unwrap_or(0),
        }
    }
}

impl From<&LearningRecord> for SnapshotCard {
    fn from(record: &LearningRecord) -> Self {
        Self {
            item: Some(record.item.clone()),
            correct_streak: record.correct_streak,
            total_correct: record.total_correct,
            total_incorrect: record.total_incorrect,
            last_seen: Some(record.last_seen),
            mastered_at: None,
            review_count: None,
        }
    }
}

impl From<&MasteredRecord> for SnapshotCard {
    fn from(record: &MasteredRecord) -> Self {
        Self {
            item: Some(record.item.clone()),
            correct_streak: record.correct_streak,
            total_correct: record.total_correct,
            total_incorrect: record.total_incorrect,
            last_seen: Some(record.last_seen),
            mastered_at: Some(record.mastered_at),
            review_count: Some(record.review_count),
        }
    }
}

// ==================== Lenient field readers ====================

fn lenient_cards<'de, D>(deserializer: D) -> Result<Vec<SnapshotCard>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(entries) = value else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

fn lenient_item<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(count_from_value(&Value::deserialize(deserializer)?)
        .map(|n| n.min(u32::MAX as u64) as u32)
        .unwrap_or(0))
}

fn lenient_optional_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(count_from_value(&Value::deserialize(deserializer)?).map(|n| n.min(u32::MAX as u64) as u32))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(count_from_value(&Value::deserialize(deserializer)?).unwrap_or(0))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn lenient_stats<'de, D>(deserializer: D) -> Result<Option<Stats>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn count_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialized_shape() {
        let learning = LearningRecord {
            item: "E2".to_string(),
            correct_streak: 1,
            total_correct: 2,
            total_incorrect: 3,
            last_seen: 1_000,
        };
        let snapshot = Snapshot {
            learning_cards: vec![SnapshotCard::from(&learning)],
            mastered_cards: Vec::new(),
            card_id_counter: 4,
            stats: None,
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value,
            json!({
                "learningCards": [{
                    "item": "E2",
                    "correctStreak": 1,
                    "totalCorrect": 2,
                    "totalIncorrect": 3,
                    "lastSeen": 1000
                }],
                "masteredCards": [],
                "cardIdCounter": 4
            })
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let snapshot: Snapshot = serde_json::from_value(json!({
            "masteredCards": [{ "item": "A2" }]
        }))
        .unwrap();

        assert!(snapshot.learning_cards.is_empty());
        let card = &snapshot.mastered_cards[0];
        assert_eq!(card.item.as_deref(), Some("A2"));
        assert_eq!(card.correct_streak, 0);
        assert_eq!(card.review_count, None);
        assert_eq!(card.last_seen, None);
        assert_eq!(snapshot.card_id_counter, 0);
    }

    #[test]
    fn test_malformed_fields_tolerated() {
        let snapshot: Snapshot = serde_json::from_value(json!({
            "learningCards": [
                { "item": "E2", "correctStreak": "2", "totalCorrect": -4, "lastSeen": "soon" },
                "garbage",
                42,
                { "item": 7, "totalCorrect": 1.0 }
            ],
            "masteredCards": { "not": "an array" },
            "cardIdCounter": null,
            "stats": "broken"
        }))
        .unwrap();

        assert_eq!(snapshot.learning_cards.len(), 2);
        let first = &snapshot.learning_cards[0];
        assert_eq!(first.correct_streak, 2);
        assert_eq!(first.total_correct, 0);
        assert_eq!(first.last_seen, None);

        let second = &snapshot.learning_cards[1];
        assert_eq!(second.item, None);
        assert_eq!(second.total_correct, 1);

        assert!(snapshot.mastered_cards.is_empty());
        assert_eq!(snapshot.card_id_counter, 0);
        assert!(snapshot.stats.is_none());
    }

    #[test]
    fn test_legacy_note_value_key() {
        let snapshot: Snapshot = serde_json::from_value(json!({
            "learningCards": [{ "noteValue": "F#3", "correctStreak": 1, "lastSeen": 1712.5 }]
        }))
        .unwrap();

        let card = &snapshot.learning_cards[0];
        assert_eq!(card.item.as_deref(), Some("F#3"));
        assert_eq!(card.last_seen, Some(1712));
    }

    #[test]
    fn test_from_value_non_object_is_empty() {
        assert!(Snapshot::from_value(json!([1, 2, 3])).is_empty());
        assert!(Snapshot::from_value(Value::Null).is_empty());
    }

    #[test]
    fn test_into_records_fill_timestamps() {
        let card = SnapshotCard {
            item: Some("B2".to_string()),
            total_correct: 5,
            ..SnapshotCard::default()
        };

        let mastered = card.clone().into_mastered("B2".to_string(), 9_000);
        assert_eq!(mastered.last_seen, 9_000);
        assert_eq!(mastered.mastered_at, 9_000);
        assert_eq!(mastered.review_count, 0);
        assert_eq!(mastered.total_correct, 5);

        let learning = card.into_learning("B2".to_string(), 7_000);
        assert_eq!(learning.last_seen, 7_000);
    }
}
