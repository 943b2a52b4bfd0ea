use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use chrono_english::{parse_date_string, Dialect};

use crate::store::entities::NewTask;

use super::error::ValidationError;

pub const DEFAULT_PARTICIPANTS: u32 = 5;

/// Raw publish input as the user typed it.
#[derive(Debug, Clone)]
pub struct PublishForm {
    pub title: String,
    pub description: String,
    pub deadline: String,
    pub max_participants: u32,
}

impl PublishForm {
    /// Checks required fields and turns the form into a [NewTask]. Relative deadlines such as
    /// "tomorrow 18:00" are resolved against `now`.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewTask, ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if self.deadline.trim().is_empty() {
            return Err(ValidationError::MissingDeadline);
        }
        let deadline = parse_deadline(self.deadline.trim(), now)?;

        Ok(NewTask {
            title: self.title,
            description: self.description,
            deadline,
            max_participants: self.max_participants,
        })
    }
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DDTHH:MM` in local time and whatever
/// [chrono_english] understands, using day/month/year order.
pub fn parse_deadline(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(v) = DateTime::parse_from_rfc3339(input) {
        return Ok(v.with_timezone(&Utc));
    }
    if let Some(v) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M")
        .ok()
        .and_then(|v| Local.from_local_datetime(&v).earliest())
    {
        return Ok(v.with_timezone(&Utc));
    }
    parse_date_string(input, now.with_timezone(&Local), Dialect::Uk)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidDeadline(input.into()))
}
