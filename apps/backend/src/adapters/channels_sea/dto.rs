//! DTOs for channels_sea adapter.

/// One configured contact channel as supplied by the settings store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelCreate {
    pub phone: String,
    pub display_name: String,
    pub active: bool,
    pub role: String,
    pub assigned_raffle_ids: Vec<i64>,
}

impl ChannelCreate {
    pub fn new(phone: impl Into<String>, display_name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            display_name: display_name.into(),
            active: true,
            role: role.into(),
            assigned_raffle_ids: Vec::new(),
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn for_raffles(mut self, raffle_ids: Vec<i64>) -> Self {
        self.assigned_raffle_ids = raffle_ids;
        self
    }
}
