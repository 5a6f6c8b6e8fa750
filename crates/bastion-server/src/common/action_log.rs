use chrono::{DateTime, Utc};

/// One recorded editor action.
#[derive(Debug, Clone)]
pub struct ActionLogEntry {
    pub campaign_id: uuid::Uuid,
    pub user_id: String,
    pub action: &'static str,
    pub payload: serde_json::Value,
    pub at: DateTime<Utc>,
}

#[derive(thiserror::Error, Debug)]
pub enum ActionLogError {
    #[error("Action log is full ({0} entries)")]
    Full(usize),
}

/// Bounded in-memory action log.
#[derive(Debug)]
pub struct ActionLog {
    entries: Vec<ActionLogEntry>,
    limit: usize,
}

impl ActionLog {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    pub fn append(&mut self, entry: ActionLogEntry) -> Result<(), ActionLogError> {
        if self.entries.len() >= self.limit {
            return Err(ActionLogError::Full(self.limit));
        }
        tracing::debug!(
            campaign_id = %entry.campaign_id,
            user_id = %entry.user_id,
            action = entry.action,
            payload = %entry.payload,
            at = %entry.at,
            "Action logged"
        );
        self.entries.push(entry);
        Ok(())
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[ActionLogEntry] {
        &self.entries
    }
}
