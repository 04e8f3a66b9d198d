//! ELEOT rubric shape.
//!
//! ELEOT groups classroom look-fors into seven learning environments
//! (A-G). Each item is rated on a four-point scale from "not observed" (1)
//! to "very evident" (4). Observation payloads may carry those ratings under
//! a `scores` object keyed by item code, e.g. `{"scores": {"A1": 3}}`.
//!
//! Validation here is opt-in: payloads without `scores` are always accepted.

use crate::model::observation::ObservationData;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// Payload key holding per-item ratings.
pub const SCORES_FIELD: &str = "scores";
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LearningEnvironment {
    /// Equitable Learning.
    A,
    /// High Expectations.
    B,
    /// Supportive Learning.
    C,
    /// Active Learning.
    D,
    /// Progress Monitoring and Feedback.
    E,
    /// Well-Managed Learning.
    F,
    /// Digital Learning.
    G,
}

impl LearningEnvironment {
    /// Number of rubric items in this environment.
    pub fn item_count(self) -> u8 {
        match self {
            Self::B => 5,
            Self::G => 3,
            _ => 4,
        }
    }

    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            'E' => Some(Self::E),
            'F' => Some(Self::F),
            'G' => Some(Self::G),
            _ => None,
        }
    }

    fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
            Self::F => 'F',
            Self::G => 'G',
        }
    }
}

/// One rubric item such as `B3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RubricItem {
    pub environment: LearningEnvironment,
    /// 1-based item number within the environment.
    pub number: u8,
}

impl FromStr for RubricItem {
    type Err = RubricError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let unknown = || RubricError::UnknownItem(code.to_string());
        let mut chars = code.chars();
        let environment = chars
            .next()
            .and_then(LearningEnvironment::from_letter)
            .ok_or_else(unknown)?;
        // Exactly one digit, so `A01` or `A+1` never alias `A1`.
        let number = match (chars.next(), chars.next()) {
            (Some(digit @ '1'..='9'), None) => digit as u8 - b'0',
            _ => return Err(unknown()),
        };
        if number > environment.item_count() {
            return Err(unknown());
        }
        Ok(Self {
            environment,
            number,
        })
    }
}

impl Display for RubricItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.environment.letter(), self.number)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RubricError {
    #[error("`scores` must be an object keyed by rubric item")]
    ScoresNotObject,
    #[error("unknown rubric item `{0}`")]
    UnknownItem(String),
    #[error("rating for `{item}` must be an integer between 1 and 4, got {value}")]
    RatingOutOfRange { item: String, value: Value },
}

/// Parses the optional `scores` object into validated item ratings.
///
/// Returns an empty map when the payload has no `scores` key.
pub fn parse_scores(data: &ObservationData) -> Result<BTreeMap<RubricItem, u8>, RubricError> {
    let Some(raw) = data.get(SCORES_FIELD) else {
        return Ok(BTreeMap::new());
    };
    let Value::Object(entries) = raw else {
        return Err(RubricError::ScoresNotObject);
    };

    let mut ratings = BTreeMap::new();
    for (code, value) in entries {
        let item: RubricItem = code.parse()?;
        let rating = value
            .as_u64()
            .and_then(|rating| u8::try_from(rating).ok())
            .filter(|rating| (MIN_RATING..=MAX_RATING).contains(rating))
            .ok_or_else(|| RubricError::RatingOutOfRange {
                item: code.clone(),
                value: value.clone(),
            })?;
        ratings.insert(item, rating);
    }
    Ok(ratings)
}

/// Mean rating per environment. Environments without ratings are omitted.
pub fn environment_averages(ratings: &BTreeMap<RubricItem, u8>) -> BTreeMap<LearningEnvironment, f64> {
    let mut totals: BTreeMap<LearningEnvironment, (u32, u32)> = BTreeMap::new();
    for (item, rating) in ratings {
        let entry = totals.entry(item.environment).or_default();
        entry.0 += u32::from(*rating);
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|(environment, (sum, count))| (environment, f64::from(sum) / f64::from(count)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        environment_averages, parse_scores, LearningEnvironment, RubricError, RubricItem,
    };
    use serde_json::{json, Value};

    fn data(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn parses_item_codes_within_environment_bounds() {
        let item: RubricItem = "B5".parse().expect("B5 exists");
        assert_eq!(item.environment, LearningEnvironment::B);
        assert_eq!(item.number, 5);
        assert_eq!(item.to_string(), "B5");

        for code in [
            "A5", "G4", "H1", "A0", "a1", "", "A", "A-1", "A+1", "A01", "B005", "A1 ", "A１",
        ] {
            assert!(
                matches!(code.parse::<RubricItem>(), Err(RubricError::UnknownItem(_))),
                "{code} should be rejected"
            );
        }
    }

    #[test]
    fn every_environment_has_items() {
        let total: u32 = "ABCDEFG"
            .chars()
            .map(|letter| {
                let env = LearningEnvironment::from_letter(letter).expect("known letter");
                assert_eq!(env.letter(), letter);
                u32::from(env.item_count())
            })
            .sum();
        assert_eq!(total, 28);
        assert!(LearningEnvironment::from_letter('H').is_none());
    }

    #[test]
    fn payload_without_scores_is_accepted() {
        let ratings = parse_scores(&data(json!({"notes": "good pacing"}))).unwrap();
        assert!(ratings.is_empty());
    }

    #[test]
    fn rejects_out_of_range_and_non_integer_ratings() {
        for bad in [json!(0), json!(5), json!(2.5), json!("3"), json!(-1)] {
            let err = parse_scores(&data(json!({"scores": {"A1": bad}}))).unwrap_err();
            assert!(matches!(err, RubricError::RatingOutOfRange { .. }));
        }

        let err = parse_scores(&data(json!({"scores": [1, 2]}))).unwrap_err();
        assert_eq!(err, RubricError::ScoresNotObject);
    }

    #[test]
    fn aliased_item_codes_do_not_collide() {
        let err = parse_scores(&data(json!({"scores": {"A01": 1, "A1": 4}}))).unwrap_err();
        assert_eq!(err, RubricError::UnknownItem("A01".to_string()));
    }

    #[test]
    fn averages_ratings_per_environment() {
        let ratings =
            parse_scores(&data(json!({"scores": {"A1": 4, "A2": 3, "D1": 2}}))).unwrap();
        let averages = environment_averages(&ratings);

        assert_eq!(averages.len(), 2);
        assert!((averages[&LearningEnvironment::A] - 3.5).abs() < f64::EPSILON);
        assert!((averages[&LearningEnvironment::D] - 2.0).abs() < f64::EPSILON);
        assert!(!averages.contains_key(&LearningEnvironment::G));
    }
}
