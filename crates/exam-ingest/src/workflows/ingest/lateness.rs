use chrono::{Duration, NaiveDateTime};
use std::fmt;

pub const DEADLINE_FORMAT: &str = "%Y-%m-%d-%H-%M";

/// Seconds added to the stated deadline so that `16:00` admits anything stamped `16:00:xx`.
const GRACE_SECONDS: i64 = 59;

#[derive(Debug, thiserror::Error)]
#[error("failed to parse '{value}' as YYYY-MM-DD-HH-MM ({source})")]
pub struct DeadlineError {
    value: String,
    #[source]
    source: chrono::ParseError,
}

/// Submission deadline as stated to students (minute precision).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    stated: NaiveDateTime,
}

impl Deadline {
    pub fn parse(raw: &str) -> Result<Self, DeadlineError> {
        let stated = NaiveDateTime::parse_from_str(raw.trim(), DEADLINE_FORMAT).map_err(
            |source| DeadlineError {
                value: raw.to_string(),
                source,
            },
        )?;
        Ok(Self::new(stated))
    }

    pub fn new(stated: NaiveDateTime) -> Self {
        Self { stated }
    }

    /// Last instant that still counts as on time for a student with `extra_minutes`.
    pub fn effective_for(&self, extra_minutes: u32) -> NaiveDateTime {
        let graced = self.stated + Duration::seconds(GRACE_SECONDS);
        if extra_minutes > 0 {
            graced + Duration::minutes(i64::from(extra_minutes))
        } else {
            graced
        }
    }

    pub fn is_late(&self, submitted_at: NaiveDateTime, extra_minutes: u32) -> bool {
        submitted_at > self.effective_for(extra_minutes)
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stated.format("%Y-%m-%d at %H:%M"))
    }
}
