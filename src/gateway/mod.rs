//! Validation and normalization layer between raw user input and the record
//! store. The gateway never retries a failed mutation: a validation error goes
//! straight back to the caller so the form can be corrected and resubmitted.

pub mod reconcile;

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

use crate::{
    store::{
        checkin::{CheckinFields, CheckinId},
        collection::CheckinCollection,
        error::{StoreError, StoreResult, ValidationError},
    },
    utils::clock::Clock,
};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Raw form input as the presentation layer supplies it: plain strings, not
/// yet trusted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckinForm {
    /// `YYYY-MM-DD`.
    pub record_date: String,
    /// Time of day, `HH:MM`. The date part of the final start time comes from
    /// the clock's today (insert) or the record's existing date (edit).
    pub start_time: String,
    /// Hours, decimal.
    pub duration: String,
    pub tag: String,
    pub activities: String,
}

/// Collapses internal whitespace of a tag to single hyphens, so
/// `"personal time"` confirms as `"personal-time"`.
pub fn normalize_tag(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join("-")
}

pub struct Gateway {
    collection: Arc<CheckinCollection>,
    clock: Box<dyn Clock>,
}

impl Gateway {
    pub fn new(collection: Arc<CheckinCollection>, clock: Box<dyn Clock>) -> Self {
        Self { collection, clock }
    }

    pub async fn create(&self, form: &CheckinForm) -> StoreResult<CheckinId> {
        let fields = self.normalize(form, None)?;
        self.collection.insert(fields).await
    }

    pub async fn edit(&self, id: &CheckinId, form: &CheckinForm) -> StoreResult<()> {
        let current = self
            .collection
            .get(id)
            .await
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let fields = self.normalize(form, Some(current.start_time.date_naive()))?;
        self.collection
            .update(id, move |draft| *draft = fields)
            .await
    }

    fn normalize(
        &self,
        form: &CheckinForm,
        date_context: Option<NaiveDate>,
    ) -> Result<CheckinFields, ValidationError> {
        let tag = normalize_tag(&form.tag);
        if tag.is_empty() {
            return Err(ValidationError::EmptyTag);
        }

        let activities = form.activities.trim().to_owned();
        if activities.is_empty() {
            return Err(ValidationError::EmptyActivities);
        }

        let duration: f64 = form
            .duration
            .trim()
            .parse()
            .map_err(|_| ValidationError::NonNumericDuration(form.duration.clone()))?;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(ValidationError::NonPositiveDuration(duration));
        }

        let record_date = NaiveDate::parse_from_str(form.record_date.trim(), DATE_FORMAT)
            .map_err(|_| ValidationError::MalformedDate(form.record_date.clone()))?;

        let time_of_day = NaiveTime::parse_from_str(form.start_time.trim(), TIME_FORMAT)
            .map_err(|_| ValidationError::MalformedTime(form.start_time.clone()))?;
        let date = date_context.unwrap_or_else(|| self.clock.today());
        let start_time = Utc.from_utc_datetime(&date.and_time(time_of_day));

        Ok(CheckinFields {
            duration,
            start_time,
            record_date,
            tag,
            activities,
        })
    }
}
