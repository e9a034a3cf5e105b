use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::backend::{Backend, Collection, Query, Records};
use crate::common::{info, Time};
use crate::core::{Principal, PrincipalId};
use crate::portal::decode_all;
use crate::{Result, SiakadError};

pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Hadir,
    Sakit,
    Izin,
    Alpa,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Hadir,
        AttendanceStatus::Sakit,
        AttendanceStatus::Izin,
        AttendanceStatus::Alpa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Hadir => "Hadir",
            AttendanceStatus::Sakit => "Sakit",
            AttendanceStatus::Izin => "Izin",
            AttendanceStatus::Alpa => "Alpa",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = SiakadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AttendanceStatus::ALL
            .iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| SiakadError::validation(format!("unknown attendance status {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub user_id: PrincipalId,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Time>,
}

fn by_user(principal: &Principal) -> Query {
    Query::new().eq("user_id", principal.id().as_str())
}

/// Attendance already recorded for the date, if any.
pub async fn today(backend: &dyn Backend, principal: &Principal, date: NaiveDate) -> Result<Option<Attendance>> {
    let query = by_user(principal).eq("date", date.to_string());
    match backend.find_one(Collection::ATTENDANCE, &query).await? {
        Some(record) => Ok(Some(serde_json::from_value(record)?)),
        None => Ok(None),
    }
}

/// Most recent entries first.
pub async fn history(backend: &dyn Backend, principal: &Principal) -> Result<Vec<Attendance>> {
    let records = backend
        .select(
            Collection::ATTENDANCE,
            &by_user(principal)
                .order("date", false)
                .limit(HISTORY_LIMIT),
        )
        .await?;
    decode_all(records)
}

/// Record attendance once per day.
pub async fn record(
    backend: &dyn Backend,
    principal: &Principal,
    date: NaiveDate,
    status: AttendanceStatus,
) -> Result<Attendance> {
    if today(backend, principal, date).await?.is_some() {
        return Err(SiakadError::AlreadyRecorded { date });
    }

    let attendance = Attendance {
        user_id: principal.id().clone(),
        date,
        status,
        created_at: None,
    };
    match backend
        .insert(Collection::ATTENDANCE, serde_json::to_value(&attendance)?)
        .await
    {
        Ok(()) => {}
        // Lost a race with another submission for the same day.
        Err(SiakadError::Backend { code: Some(code), .. }) if code == "23505" => {
            return Err(SiakadError::AlreadyRecorded { date });
        }
        Err(err) => return Err(err),
    }
    info!(id=%principal.id(), %date, %status, "Attendance recorded");
    Ok(attendance)
}
