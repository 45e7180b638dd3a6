use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//--------------------------------------  NewMeetupRequest    --------------------------------------------------------
/// The opening proposal for an in-person handoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMeetupRequest {
    pub location: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub remarks: Option<String>,
}

impl NewMeetupRequest {
    pub fn new(scheduled_at: DateTime<Utc>) -> Self {
        Self { location: None, scheduled_at, remarks: None }
    }

    pub fn at_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }
}

//-------------------------------------- MeetupUpdateRequest  --------------------------------------------------------
/// A dual-purpose update. Including `scheduled_at` makes it a reschedule, which appends a new
/// version and voids prior confirmations; location/remarks alone are edited in place on the
/// current version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeetupUpdateRequest {
    pub scheduled_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub remarks: Option<String>,
}

impl MeetupUpdateRequest {
    pub fn reschedule(mut self, scheduled_at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(scheduled_at);
        self
    }

    pub fn at_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.scheduled_at.is_none() && self.location.is_none() && self.remarks.is_none()
    }
}
