use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task users can check in against. Tasks are append-only: once published they are never
/// edited or removed.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub max_participants: u32,
    pub created_at: DateTime<Utc>,
}

/// Input for [Task] creation. Id and creation time are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub max_participants: u32,
}

/// Metadata of a registered file. Only metadata is persisted, `url` points at the local source
/// and might not resolve after the file is moved.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub url: String,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Checkin {
    pub id: String,
    pub task_id: String,
    /// Copied from the task at the moment of check-in.
    pub task_title: String,
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
}

/// Input for [Checkin] creation. The author is always the store's local user.
#[derive(Debug, Clone)]
pub struct NewCheckin {
    pub task_id: String,
    pub task_title: String,
    pub files: Vec<FileRecord>,
    pub notes: String,
}

#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// The whole persisted state. It is always read and written as one unit.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone, Default)]
pub struct Document {
    pub tasks: Vec<Task>,
    pub checkins: Vec<Checkin>,
    pub users: Vec<User>,
}

impl Document {
    /// Document written on the very first start.
    pub fn seed(now: DateTime<Utc>) -> Self {
        Document {
            tasks: vec![
                Task {
                    id: "1".into(),
                    title: "Daily reading".into(),
                    description: "Read for 30 minutes every day".into(),
                    deadline: now,
                    max_participants: 10,
                    created_at: now,
                },
                Task {
                    id: "2".into(),
                    title: "Workout".into(),
                    description: "Exercise for an hour every day".into(),
                    deadline: now,
                    max_participants: 15,
                    created_at: now,
                },
            ],
            checkins: vec![],
            users: vec![
                User {
                    id: "user1".into(),
                    name: "Me".into(),
                },
                User {
                    id: "user2".into(),
                    name: "Friend 1".into(),
                },
                User {
                    id: "user3".into(),
                    name: "Friend 2".into(),
                },
            ],
        }
    }
}

/// Name of the user with `user_id`, the id itself for unknown users.
pub fn display_name<'a>(users: &'a [User], user_id: &'a str) -> &'a str {
    users
        .iter()
        .find(|user| user.id == user_id)
        .map_or(user_id, |user| user.name.as_str())
}

/// Produces a time-derived id that is larger than every numeric id in `existing`. Plain
/// millisecond timestamps collide when two entities are created within the same millisecond.
pub fn next_id<'a>(now: DateTime<Utc>, existing: impl IntoIterator<Item = &'a str>) -> String {
    let millis = now.timestamp_millis().max(0) as u64;
    let last = existing
        .into_iter()
        .filter_map(|id| id.parse::<u64>().ok())
        .max();
    match last {
        Some(last) if last >= millis => (last + 1).to_string(),
        _ => millis.to_string(),
    }
}
