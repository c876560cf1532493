use chrono::{DateTime, NaiveDate, Utc};

/// Represents an entity responsible for providing dates across application. This can allow it to
/// be used for testing
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    /// Today as seen by this clock. Used as the date context when composing a
    /// start time from a bare time of day.
    fn today(&self) -> NaiveDate {
        self.time().date_naive()
    }
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
