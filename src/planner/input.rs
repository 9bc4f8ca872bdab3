use crate::error::{AppError, Result};
use crate::models::{MovieDraft, MoviePatch};
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use validator::Validate;

/// Raw create/update payload as clients send it.
///
/// Field names follow the wire format (`release_date`, `is_hit`); the
/// camelCase spellings are accepted too.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MovieInput {
    #[validate(length(max = 500))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "releaseDate")]
    pub release_date: Option<String>,
    pub budget: Option<Numeral>,
    pub collection: Option<Numeral>,
    pub cast: Option<Vec<String>>,
    #[serde(alias = "isHit")]
    pub is_hit: Option<bool>,
}

/// A monetary amount sent either as a JSON number or as a string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Numeral {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
}

impl Numeral {
    /// Whole non-negative amount; an empty string means "not given"
    fn to_amount(&self, field: &str) -> Result<Option<u64>> {
        let invalid = || AppError::Validation(format!("{} must be a non-negative integer", field));

        match self {
            Numeral::Unsigned(v) => Ok(Some(*v)),
            Numeral::Signed(_) => Err(invalid()),
            Numeral::Float(v) => {
                if v.is_finite() && *v >= 0.0 && v.fract() == 0.0 && *v < u64::MAX as f64 {
                    Ok(Some(*v as u64))
                } else {
                    Err(invalid())
                }
            }
            Numeral::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(None);
                }
                s.parse::<u64>().map(Some).map_err(|_| invalid())
            }
        }
    }
}

fn amount(value: Option<&Numeral>, field: &str) -> Result<Option<u64>> {
    match value {
        Some(numeral) => numeral.to_amount(field),
        None => Ok(None),
    }
}

/// Accepts a calendar date or a full RFC 3339 timestamp; blank means "not given"
fn release_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Some(dt.date_naive()))
        .map_err(|_| AppError::Validation(format!("release_date '{}' is not a valid date", raw)))
}

fn title(raw: Option<String>) -> Result<Option<String>> {
    match raw {
        Some(t) if t.trim().is_empty() => {
            Err(AppError::Validation("title must not be empty".to_string()))
        }
        other => Ok(other),
    }
}

/// Validate a create payload. A title is required; everything else defaults.
pub fn draft_from_input(input: MovieInput) -> Result<MovieDraft> {
    input.validate()?;

    let budget = amount(input.budget.as_ref(), "budget")?;
    let collection = amount(input.collection.as_ref(), "collection")?;
    let release_date = release_date(input.release_date.as_deref())?;
    let title = title(input.title)?
        .ok_or_else(|| AppError::Validation("title is required".to_string()))?;

    Ok(MovieDraft {
        title,
        description: input.description.unwrap_or_default(),
        release_date,
        budget,
        collection,
        cast: input.cast.unwrap_or_default(),
        is_hit: input.is_hit.unwrap_or(false),
    })
}

/// Validate an update payload. Omitted fields stay `None` and are left unchanged.
pub fn patch_from_input(input: MovieInput) -> Result<MoviePatch> {
    input.validate()?;

    Ok(MoviePatch {
        budget: amount(input.budget.as_ref(), "budget")?,
        collection: amount(input.collection.as_ref(), "collection")?,
        release_date: release_date(input.release_date.as_deref())?,
        title: title(input.title)?,
        description: input.description,
        cast: input.cast,
        is_hit: input.is_hit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: serde_json::Value) -> MovieInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_draft_defaults() {
        let draft = draft_from_input(input(json!({ "title": "Up" }))).unwrap();

        assert_eq!(draft.title, "Up");
        assert_eq!(draft.description, "");
        assert!(draft.cast.is_empty());
        assert!(!draft.is_hit);
        assert_eq!(draft.budget, None);
    }

    #[test]
    fn test_numerals_as_numbers_or_strings() {
        let draft = draft_from_input(input(json!({
            "title": "Avatar",
            "budget": "237000000",
            "collection": 2_500_000_000u64,
            "release_date": "2009-12-18",
            "is_hit": true,
        })))
        .unwrap();

        assert_eq!(draft.budget, Some(237_000_000));
        assert_eq!(draft.collection, Some(2_500_000_000));
        assert_eq!(draft.release_date, NaiveDate::from_ymd_opt(2009, 12, 18));
        assert!(draft.is_hit);
    }

    #[test]
    fn test_float_amount_past_u64_range_is_rejected() {
        // u64::MAX as f64 rounds up to 2^64, which does not fit
        let too_wide = Numeral::Float(18_446_744_073_709_551_616.0);
        assert!(matches!(too_wide.to_amount("budget"), Err(AppError::Validation(_))));

        let widest = Numeral::Float(9_223_372_036_854_775_808.0);
        assert_eq!(widest.to_amount("budget").unwrap(), Some(1 << 63));
    }

    #[test]
    fn test_zero_budget_is_a_value() {
        let draft = draft_from_input(input(json!({ "title": "Free", "budget": 0 }))).unwrap();
        assert_eq!(draft.budget, Some(0));
    }

    #[test]
    fn test_timestamp_release_date() {
        let draft = draft_from_input(input(json!({
            "title": "Dune",
            "releaseDate": "2021-10-22T00:00:00.000Z",
        })))
        .unwrap();
        assert_eq!(draft.release_date, NaiveDate::from_ymd_opt(2021, 10, 22));
    }

    #[test]
    fn test_rejects_malformed_input() {
        let bad = [
            json!({ "description": "no title" }),
            json!({ "title": "   " }),
            json!({ "title": "X", "release_date": "not a date" }),
            json!({ "title": "X", "budget": -10 }),
            json!({ "title": "X", "budget": "ten" }),
            json!({ "title": "X", "collection": 1.5 }),
        ];

        for payload in bad {
            let result = draft_from_input(input(payload.clone()));
            assert!(
                matches!(result, Err(AppError::Validation(_))),
                "accepted {}",
                payload
            );
        }
    }

    #[test]
    fn test_patch_keeps_omitted_fields_unset() {
        let patch = patch_from_input(input(json!({ "description": "Recut" }))).unwrap();

        assert_eq!(patch.description.as_deref(), Some("Recut"));
        assert_eq!(patch.title, None);
        assert_eq!(patch.is_hit, None);
    }

    #[test]
    fn test_patch_explicit_false_hit() {
        let patch = patch_from_input(input(json!({ "is_hit": false }))).unwrap();
        assert_eq!(patch.is_hit, Some(false));
    }

    #[test]
    fn test_patch_rejects_empty_title() {
        let result = patch_from_input(input(json!({ "title": "" })));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
