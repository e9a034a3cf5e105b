use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::backend::{Backend, Collection, Query, Records};
use crate::common::Time;
use crate::core::Principal;
use crate::portal::decode_all;
use crate::Result;

pub const OVERVIEW_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: serde_json::Value,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: Time,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: serde_json::Value,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub created_at: Time,
}

/// What the student dashboard shows on entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub upcoming: Vec<Assignment>,
    pub announcements: Vec<Announcement>,
    pub unread_notifications: u64,
}

pub async fn summary(backend: &dyn Backend, principal: &Principal, now: Time) -> Result<Overview> {
    let upcoming = backend
        .select(
            Collection::ASSIGNMENTS,
            &Query::new()
                .gt("due_date", now.to_rfc3339_opts(SecondsFormat::Secs, true))
                .order("due_date", true)
                .limit(OVERVIEW_LIMIT),
        )
        .await?;
    let announcements = backend
        .select(
            Collection::ANNOUNCEMENTS,
            &Query::new()
                .order("created_at", false)
                .limit(OVERVIEW_LIMIT),
        )
        .await?;
    let unread_notifications = backend
        .count(
            Collection::NOTIFICATIONS,
            &Query::new()
                .eq("user_id", principal.id().as_str())
                .eq("is_read", false),
        )
        .await?;

    Ok(Overview {
        upcoming: decode_all(upcoming)?,
        announcements: decode_all(announcements)?,
        unread_notifications,
    })
}

/// Whole days until `due`, rounded up. Zero or less means due today.
pub fn days_left(due: Time, now: Time) -> i64 {
    const DAY: i64 = 24 * 60 * 60;
    let seconds = (due - now).num_seconds();
    if seconds <= 0 {
        return seconds / DAY;
    }
    (seconds + DAY - 1) / DAY
}

pub fn due_label(due: Time, now: Time) -> String {
    match days_left(due, now) {
        d if d <= 0 => "due today".to_owned(),
        1 => "1 day left".to_owned(),
        d => format!("{} days left", d),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AccountEntry, Credentials, Identity, MemoryBackend};
    use crate::core::{Role, Status};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn now() -> Time {
        Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap()
    }

    fn stamp(t: Time) -> String {
        t.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    #[test]
    fn days_left_rounds_up() {
        let now = now();
        assert_eq!(days_left(now + Duration::hours(1), now), 1);
        assert_eq!(days_left(now + Duration::hours(25), now), 2);
        assert_eq!(days_left(now, now), 0);
        assert_eq!(due_label(now - Duration::hours(3), now), "due today");
        assert_eq!(due_label(now + Duration::days(3), now), "3 days left");
    }

    #[tokio::test]
    async fn overview() {
        let backend = MemoryBackend::new();
        backend.add_account(&AccountEntry {
            email: "budi@example.com".into(),
            password: "secret".into(),
            full_name: "Budi".into(),
            role: Role::Student,
            status: Status::Approved,
        });
        let principal = backend
            .sign_in(&Credentials::new("budi@example.com", "secret"))
            .await
            .unwrap();

        let now = now();
        for (id, offset) in [(1, -1), (2, 4), (3, 1), (4, 2), (5, 9)] {
            backend
                .insert(
                    Collection::ASSIGNMENTS,
                    json!({
                        "id": id,
                        "title": format!("Tugas {}", id),
                        "due_date": stamp(now + Duration::days(offset)),
                    }),
                )
                .await
                .unwrap();
        }
        for id in 1..=4 {
            backend
                .insert(
                    Collection::ANNOUNCEMENTS,
                    json!({
                        "id": id,
                        "title": format!("Info {}", id),
                        "content": "",
                        "created_at": stamp(now - Duration::days(10 - id)),
                    }),
                )
                .await
                .unwrap();
        }
        for (user, read) in [(principal.id().as_str(), false), (principal.id().as_str(), true), ("other", false)] {
            backend
                .insert(
                    Collection::NOTIFICATIONS,
                    json!({ "user_id": user, "is_read": read }),
                )
                .await
                .unwrap();
        }

        let overview = summary(&backend, &principal, now).await.unwrap();

        let upcoming: Vec<_> = overview.upcoming.iter().map(|a| a.id.clone()).collect();
        assert_eq!(upcoming, vec![json!(3), json!(4), json!(2)]);
        let announcements: Vec<_> = overview.announcements.iter().map(|a| a.id.clone()).collect();
        assert_eq!(announcements, vec![json!(4), json!(3), json!(2)]);
        assert_eq!(overview.unread_notifications, 1);
    }
}
