//! Contact channel repository functions for domain layer.

use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};

use crate::adapters::channels_sea as channels_adapter;
use crate::entities::contact_channels;
use crate::errors::domain::DomainError;

/// Configured contact channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub phone: String,
    pub display_name: String,
    pub active: bool,
    pub role: String,
    /// Empty means the channel serves every raffle
    #[serde(default)]
    pub assigned_raffle_ids: Vec<i64>,
}

impl Channel {
    /// Active, matching role, and either unassigned or assigned to `raffle_id`.
    /// Without a raffle only unassigned channels qualify.
    pub fn serves(&self, role: &str, raffle_id: Option<i64>) -> bool {
        self.active
            && self.role == role
            && (self.assigned_raffle_ids.is_empty()
                || raffle_id.is_some_and(|id| self.assigned_raffle_ids.contains(&id)))
    }
}

impl From<contact_channels::Model> for Channel {
    fn from(model: contact_channels::Model) -> Self {
        // A malformed assignment list is treated as unassigned
        let assigned_raffle_ids =
            serde_json::from_value(model.assigned_raffle_ids).unwrap_or_default();
        Self {
            phone: model.phone,
            display_name: model.display_name,
            active: model.active,
            role: model.role,
            assigned_raffle_ids,
        }
    }
}

impl From<Channel> for channels_adapter::ChannelCreate {
    fn from(c: Channel) -> Self {
        Self {
            phone: c.phone,
            display_name: c.display_name,
            active: c.active,
            role: c.role,
            assigned_raffle_ids: c.assigned_raffle_ids,
        }
    }
}

pub async fn list_all<C: ConnectionTrait + Send + Sync>(conn: &C) -> Result<Vec<Channel>, DomainError> {
    let rows = channels_adapter::list_all(conn).await?;
    Ok(rows.into_iter().map(Channel::from).collect())
}

pub async fn list_by_role<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    role: &str,
) -> Result<Vec<Channel>, DomainError> {
    let rows = channels_adapter::list_by_role(conn, role).await?;
    Ok(rows.into_iter().map(Channel::from).collect())
}

pub async fn replace_all<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    channels: Vec<Channel>,
) -> Result<Vec<Channel>, DomainError> {
    let dtos = channels.into_iter().map(Into::into).collect();
    let rows = channels_adapter::replace_all(conn, dtos).await?;
    Ok(rows.into_iter().map(Channel::from).collect())
}

/// Atomically take the next rotation slot for `role` (pre-increment value).
pub async fn advance_rotation<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    role: &str,
) -> Result<i64, DomainError> {
    Ok(channels_adapter::advance_rotation(conn, role).await?)
}

/// Current `next_index` for `role`; zero before the first rotation.
pub async fn rotation_index<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    role: &str,
) -> Result<i64, DomainError> {
    let row = channels_adapter::current_rotation(conn, role).await?;
    Ok(row.map(|r| r.next_index).unwrap_or(0))
}
