use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    /// Member identifiers, unique, in order of first addition
    pub members: Vec<String>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn is_member(&self, member: &str) -> bool {
        self.members.iter().any(|m| m == member)
    }

    /// Adds members not already present, keeping existing order.
    pub fn add_members<'a, I>(&mut self, members: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for member in members {
            if !self.is_member(member) {
                self.members.push(member.clone());
            }
        }
    }
}
