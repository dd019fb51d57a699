use chrono::{DateTime, Local, Utc};

/// A note left for a user who is away
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memo {
    pub id: i64,
    pub user_to: String,
    pub user_from: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Memo {
    /// Creation date in local time, e.g. `19/10/2026 @ 14:05`
    pub fn date_label(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%d/%m/%Y @ %H:%M")
            .to_string()
    }
}
