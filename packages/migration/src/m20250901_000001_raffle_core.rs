use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

// ----- Iden enums for tables & columns -----
#[derive(Iden)]
enum Raffles {
    Table,
    Id,
    Title,
    TicketCount,
    PriceCents,
    Sold,
    BonusEnabled,
    BonusMultiplier,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Customers {
    Table,
    Id,
    Name,
    Phone,
    Email,
    Region,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
    Folio,
    RaffleId,
    CustomerId,
    TicketNumbers,
    BaseTicketCount,
    TotalCents,
    Status,
    PaymentMethod,
    Notes,
    CreatedAt,
    ExpiresAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TicketClaims {
    Table,
    RaffleId,
    TicketNumber,
    OrderId,
    CreatedAt,
}

#[derive(Iden)]
enum ContactChannels {
    Table,
    Id,
    Phone,
    DisplayName,
    Active,
    Role,
    AssignedRaffleIds,
    Position,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ChannelRotation {
    Table,
    Role,
    NextIndex,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // raffles
        manager
            .create_table(
                Table::create()
                    .table(Raffles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Raffles::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(Raffles::Title).string().not_null())
                    .col(ColumnDef::new(Raffles::TicketCount).integer().not_null())
                    .col(ColumnDef::new(Raffles::PriceCents).big_integer().not_null())
                    .col(
                        ColumnDef::new(Raffles::Sold)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Raffles::BonusEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Raffles::BonusMultiplier)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Raffles::Status)
                            .string_len(16)
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(Raffles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Raffles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .check(
                        Expr::col(Raffles::Sold)
                            .gte(0)
                            .and(Expr::col(Raffles::Sold).lte(Expr::col(Raffles::TicketCount))),
                    )
                    .check(Expr::col(Raffles::TicketCount).gt(0))
                    .check(Expr::col(Raffles::BonusMultiplier).gte(1))
                    .to_owned(),
            )
            .await?;

        // customers
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(Customers::Name).string().not_null())
                    .col(ColumnDef::new(Customers::Phone).string().not_null())
                    .col(ColumnDef::new(Customers::Email).string().null())
                    .col(ColumnDef::new(Customers::Region).string().null())
                    .col(
                        ColumnDef::new(Customers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Customers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_customers_phone")
                    .table(Customers::Table)
                    .col(Customers::Phone)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_customers_email")
                    .table(Customers::Table)
                    .col(Customers::Email)
                    .to_owned(),
            )
            .await?;

        // orders
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(Orders::Folio).string_len(32).not_null())
                    .col(ColumnDef::new(Orders::RaffleId).big_integer().not_null())
                    .col(ColumnDef::new(Orders::CustomerId).big_integer().not_null())
                    .col(ColumnDef::new(Orders::TicketNumbers).json().not_null())
                    .col(ColumnDef::new(Orders::BaseTicketCount).integer().not_null())
                    .col(ColumnDef::new(Orders::TotalCents).big_integer().not_null())
                    .col(ColumnDef::new(Orders::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Orders::PaymentMethod).string().null())
                    .col(ColumnDef::new(Orders::Notes).text().null())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .check(Expr::col(Orders::BaseTicketCount).gte(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_raffle_id")
                            .from(Orders::Table, Orders::RaffleId)
                            .to(Raffles::Table, Raffles::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_customer_id")
                            .from(Orders::Table, Orders::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ux_orders_folio")
                    .table(Orders::Table)
                    .col(Orders::Folio)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_orders_raffle_status")
                    .table(Orders::Table)
                    .col(Orders::RaffleId)
                    .col(Orders::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_orders_status_expires")
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .col(Orders::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        // ticket_claims: one row per number held by a live order.
        // The composite primary key is the storage-level uniqueness guarantee.
        manager
            .create_table(
                Table::create()
                    .table(TicketClaims::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketClaims::RaffleId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketClaims::TicketNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TicketClaims::OrderId).big_integer().not_null())
                    .col(
                        ColumnDef::new(TicketClaims::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_ticket_claims")
                            .col(TicketClaims::RaffleId)
                            .col(TicketClaims::TicketNumber),
                    )
                    .check(Expr::col(TicketClaims::TicketNumber).gt(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_claims_raffle_id")
                            .from(TicketClaims::Table, TicketClaims::RaffleId)
                            .to(Raffles::Table, Raffles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_claims_order_id")
                            .from(TicketClaims::Table, TicketClaims::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_ticket_claims_order_id")
                    .table(TicketClaims::Table)
                    .col(TicketClaims::OrderId)
                    .to_owned(),
            )
            .await?;

        // contact_channels
        manager
            .create_table(
                Table::create()
                    .table(ContactChannels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContactChannels::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(ContactChannels::Phone).string().not_null())
                    .col(
                        ColumnDef::new(ContactChannels::DisplayName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContactChannels::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(ContactChannels::Role).string_len(32).not_null())
                    .col(
                        ColumnDef::new(ContactChannels::AssignedRaffleIds)
                            .json()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ContactChannels::Position).integer().not_null())
                    .col(
                        ColumnDef::new(ContactChannels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContactChannels::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // channel_rotation
        manager
            .create_table(
                Table::create()
                    .table(ChannelRotation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChannelRotation::Role)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ChannelRotation::NextIndex)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ChannelRotation::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // drop in reverse dependency order
        manager
            .drop_table(Table::drop().table(ChannelRotation::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContactChannels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TicketClaims::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Raffles::Table).to_owned())
            .await?;
        Ok(())
    }
}
