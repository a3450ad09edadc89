use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use super::{non_blank, ProfileSummary};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Late,
    Absent,
    Leave,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub profile_id: String,
    pub work_date: NaiveDate,
    pub clock_in: DateTime<Utc>,
    pub clock_out: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Open a new shift for `profile_id` at `now`
    pub fn open(profile_id: &str, now: DateTime<Utc>, start_hour: u32, grace_minutes: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            profile_id: profile_id.to_string(),
            work_date: now.date_naive(),
            clock_in: now,
            clock_out: None,
            duration_minutes: None,
            status: status_for_clock_in(now, start_hour, grace_minutes),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }

    pub fn close(&mut self, now: DateTime<Utc>) {
        self.clock_out = Some(now);
        self.duration_minutes = Some(worked_minutes(self.clock_in, now));
        self.updated_at = now;
    }

    /// Manual correction by staff; duration follows the corrected stamps
    pub fn correct(&mut self, changes: &CorrectAttendanceRequest) -> Result<(), &'static str> {
        let clock_in = changes.clock_in.unwrap_or(self.clock_in);
        let clock_out = changes.clock_out.or(self.clock_out);
        if let Some(out) = clock_out {
            if out < clock_in {
                return Err("clock_out cannot be before clock_in");
            }
        }

        self.clock_in = clock_in;
        self.work_date = clock_in.date_naive();
        self.clock_out = clock_out;
        self.duration_minutes = clock_out.map(|out| worked_minutes(clock_in, out));
        if let Some(status) = changes.status {
            self.status = status;
        }
        if let Some(notes) = changes.notes.as_deref() {
            self.notes = non_blank(Some(notes));
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Whole minutes worked between two stamps
pub fn worked_minutes(clock_in: DateTime<Utc>, clock_out: DateTime<Utc>) -> i64 {
    (clock_out - clock_in).num_minutes()
}

/// Clock-ins after the start of the workday plus grace are late
pub fn status_for_clock_in(clock_in: DateTime<Utc>, start_hour: u32, grace_minutes: u32) -> AttendanceStatus {
    let minute_of_day = clock_in.hour() * 60 + clock_in.minute();
    if minute_of_day > start_hour * 60 + grace_minutes {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceView {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub profile: Option<ProfileSummary>,
}

/// Per-person totals over a date range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceTotals {
    pub profile_id: String,
    pub days: i64,
    pub total_minutes: i64,
    pub late_count: i64,
    pub profile: Option<ProfileSummary>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CorrectAttendanceRequest {
    pub clock_in: Option<DateTime<Utc>>,
    pub clock_out: Option<DateTime<Utc>>,
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AttendanceRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ListAttendanceQuery {
    pub profile_id: Option<String>,
    pub status: Option<AttendanceStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}
