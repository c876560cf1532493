use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::time::hours_to_duration;

use super::error::ValidationError;

/// Opaque identifier of a check-in. Generated once at insert and never reused.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CheckinId(String);

impl CheckinId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CheckinId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CheckinId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A single logged activity. The struct stored on disk, one JSON object per
/// line.
///
/// `record_date` names the day's log the entry belongs to and is deliberately
/// independent of the date component of `start_time`: a check-in can be logged
/// against a different day than the one it literally started on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkin {
    pub id: CheckinId,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub duration: f64,
    pub start_time: DateTime<Utc>,
    pub record_date: NaiveDate,
    pub tag: String,
    pub activities: String,
}

impl Checkin {
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + hours_to_duration(self.duration)
    }

    /// The user-mutable portion of the record, used as the draft handed to
    /// update closures.
    pub fn fields(&self) -> CheckinFields {
        CheckinFields {
            duration: self.duration,
            start_time: self.start_time,
            record_date: self.record_date,
            tag: self.tag.clone(),
            activities: self.activities.clone(),
        }
    }
}

/// User-settable fields of a check-in. Validated construction: the collection
/// only accepts fields for which [CheckinFields::validate] passes.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckinFields {
    /// Hours, strictly positive.
    pub duration: f64,
    pub start_time: DateTime<Utc>,
    pub record_date: NaiveDate,
    pub tag: String,
    pub activities: String,
}

impl CheckinFields {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(ValidationError::NonPositiveDuration(self.duration));
        }
        if self.tag.trim().is_empty() {
            return Err(ValidationError::EmptyTag);
        }
        if self.activities.trim().is_empty() {
            return Err(ValidationError::EmptyActivities);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;

    fn fields() -> CheckinFields {
        CheckinFields {
            duration: 1.5,
            start_time: Utc::now(),
            record_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            tag: "work".into(),
            activities: "standup, review".into(),
        }
    }

    #[test]
    fn accepts_valid_fields() {
        assert_eq!(fields().validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_duration() {
        let mut f = fields();
        f.duration = 0.0;
        assert_eq!(
            f.validate(),
            Err(ValidationError::NonPositiveDuration(0.0))
        );
        f.duration = -2.0;
        assert_eq!(
            f.validate(),
            Err(ValidationError::NonPositiveDuration(-2.0))
        );
        f.duration = f64::NAN;
        assert!(matches!(
            f.validate(),
            Err(ValidationError::NonPositiveDuration(_))
        ));
    }

    #[test]
    fn rejects_blank_tag_and_activities() {
        let mut f = fields();
        f.tag = "   ".into();
        assert_eq!(f.validate(), Err(ValidationError::EmptyTag));

        let mut f = fields();
        f.activities = "".into();
        assert_eq!(f.validate(), Err(ValidationError::EmptyActivities));
    }

    #[test]
    fn end_time_follows_duration() {
        let checkin = Checkin {
            id: CheckinId::generate(),
            created: Utc::now(),
            modified: Utc::now(),
            duration: 2.0,
            start_time: Utc::now(),
            record_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            tag: "work".into(),
            activities: "review".into(),
        };
        assert_eq!(
            checkin.end_time() - checkin.start_time,
            chrono::Duration::hours(2)
        );
    }
}
