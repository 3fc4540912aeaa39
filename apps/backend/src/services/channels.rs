//! Outbound contact channel rotation.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use tracing::debug;

use super::Engine;
use crate::config::engine::LegacyContact;
use crate::domain::phone::require_phone;
use crate::errors::domain::{DomainError, ValidationKind};
use crate::repos::channels::{self, Channel};

/// Contact handed out for an outbound link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelContact {
    pub phone: String,
    pub display_name: String,
}

impl From<Channel> for ChannelContact {
    fn from(c: Channel) -> Self {
        Self {
            phone: c.phone,
            display_name: c.display_name,
        }
    }
}

impl From<&LegacyContact> for ChannelContact {
    fn from(c: &LegacyContact) -> Self {
        Self {
            phone: c.phone.clone(),
            display_name: c.display_name.clone(),
        }
    }
}

/// Pick the next eligible channel for `raffle_id` in round-robin order.
///
/// Eligible channels are active, carry the configured contact role and are
/// either unassigned or assigned to `raffle_id`; with no raffle only
/// unassigned channels are eligible. The rotation counter only
/// moves when a configured channel is returned; with none eligible the
/// legacy contact (if any) is returned instead.
pub async fn next_channel<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    engine: &Engine,
    raffle_id: Option<i64>,
) -> Result<Option<ChannelContact>, DomainError> {
    let role = engine.config().contact_role.as_str();
    let mut eligible: Vec<Channel> = channels::list_by_role(conn, role)
        .await?
        .into_iter()
        .filter(|c| c.serves(role, raffle_id))
        .collect();

    if eligible.is_empty() {
        debug!(role, ?raffle_id, "no eligible channel, using legacy contact");
        return Ok(engine.config().legacy_contact.as_ref().map(ChannelContact::from));
    }

    let slot = channels::advance_rotation(conn, role).await?;
    let idx = slot.rem_euclid(eligible.len() as i64) as usize;
    debug!(role, ?raffle_id, slot, idx, eligible = eligible.len(), "channel selected");
    Ok(Some(eligible.swap_remove(idx).into()))
}

/// Replace the configured channel list. Phones are normalized; the rotation
/// counter is left alone.
pub async fn replace_channels<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    list: Vec<Channel>,
) -> Result<Vec<Channel>, DomainError> {
    let mut normalized = Vec::with_capacity(list.len());
    for mut channel in list {
        channel.phone = require_phone(&channel.phone)?;
        channel.display_name = channel.display_name.trim().to_string();
        if channel.role.trim().is_empty() {
            return Err(DomainError::validation(
                ValidationKind::Other("EMPTY_ROLE".into()),
                format!("Channel {} has no role", channel.display_name),
            ));
        }
        normalized.push(channel);
    }
    channels::replace_all(conn, normalized).await
}

pub async fn list_channels<C: ConnectionTrait + Send + Sync>(
    conn: &C,
) -> Result<Vec<Channel>, DomainError> {
    channels::list_all(conn).await
}

/// Current rotation counter for the configured contact role.
pub async fn rotation_index<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    engine: &Engine,
) -> Result<i64, DomainError> {
    channels::rotation_index(conn, &engine.config().contact_role).await
}
