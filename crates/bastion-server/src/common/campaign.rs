use std::collections::HashMap;

use axum::http::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Owner,
    Editor,
    Viewer,
}

impl MemberRole {
    pub fn can_edit(self) -> bool {
        matches!(self, MemberRole::Owner | MemberRole::Editor)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CampaignError {
    #[error("Only the campaign owner or an editor can perform this action: {0}")]
    EditorOnly(&'static str),
}

impl CampaignError {
    pub fn to_status(&self) -> StatusCode {
        match self {
            CampaignError::EditorOnly(_) => StatusCode::FORBIDDEN,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Campaign {
    id: uuid::Uuid,
    name: String,
    owner_id: String,
    members: HashMap<String, MemberRole>,
}

impl Campaign {
    pub fn new(id: uuid::Uuid, name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner_id: owner_id.into(),
            members: HashMap::new(),
        }
    }

    pub fn id(&self) -> &uuid::Uuid {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_member(&mut self, user_id: impl Into<String>, role: MemberRole) {
        self.members.insert(user_id.into(), role);
    }

    pub fn role_of(&self, user_id: &str) -> Option<MemberRole> {
        if user_id == self.owner_id {
            return Some(MemberRole::Owner);
        }
        self.members.get(user_id).copied()
    }

    /// The owner, or a member with role owner/editor, may change placements.
    pub fn assert_editor(&self, user_id: &str, action: &'static str) -> Result<(), CampaignError> {
        match self.role_of(user_id) {
            Some(role) if role.can_edit() => Ok(()),
            _ => Err(CampaignError::EditorOnly(action)),
        }
    }
}
