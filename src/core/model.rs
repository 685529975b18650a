use super::types::{EntityId, EntityRecord};
use super::{Result, SyncError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MoodType {
    Happy,
    Sad,
    Angry,
    Neutral,
    Anxious,
}

impl MoodType {
    pub const ALL: [MoodType; 5] = [
        MoodType::Happy,
        MoodType::Sad,
        MoodType::Angry,
        MoodType::Neutral,
        MoodType::Anxious,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodType::Happy => "HAPPY",
            MoodType::Sad => "SAD",
            MoodType::Angry => "ANGRY",
            MoodType::Neutral => "NEUTRAL",
            MoodType::Anxious => "ANXIOUS",
        }
    }
}

impl fmt::Display for MoodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoodType {
    type Err = SyncError;

    fn from_str(raw: &str) -> Result<Self> {
        let wanted = raw.trim().to_ascii_uppercase();
        MoodType::ALL
            .into_iter()
            .find(|mood| mood.as_str() == wanted)
            .ok_or_else(|| SyncError::Validation(format!("unknown mood '{raw}'")))
    }
}

/// Owner of an entry. The server only needs the id; `login` is display data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserRef {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoodEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<MoodType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRef>,
}

impl MoodEntry {
    pub fn new(date: NaiveDate, mood: MoodType) -> Self {
        Self {
            id: None,
            date: Some(date),
            mood: Some(mood),
            user: None,
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_user(mut self, user_id: EntityId) -> Self {
        self.user = Some(UserRef {
            id: user_id,
            login: None,
        });
        self
    }
}

impl EntityRecord for MoodEntry {
    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn cleaned(&self) -> Self {
        Self {
            user: self.user.as_ref().map(|user| UserRef {
                id: user.id,
                login: None,
            }),
            ..self.clone()
        }
    }
}
