pub mod channel_rotation;
pub mod contact_channels;
pub mod customers;
pub mod orders;
pub mod raffles;
pub mod ticket_claims;

pub use channel_rotation::Entity as ChannelRotation;
pub use contact_channels::Entity as ContactChannels;
pub use contact_channels::Model as ContactChannel;
pub use customers::Entity as Customers;
pub use customers::Model as Customer;
pub use orders::Entity as Orders;
pub use orders::Model as Order;
pub use raffles::Entity as Raffles;
pub use raffles::Model as Raffle;
pub use ticket_claims::Entity as TicketClaims;
pub use ticket_claims::Model as TicketClaim;
