//! Bulk reconciliation importer.
//!
//! Turns operator-curated `(name, phone, region, ticket)` rows into one
//! PENDING order per distinct phone. Occupancy is read once per run and
//! every group is planned in memory against it in first-seen order, so a
//! number repeated across groups goes to the first group and fails for the
//! rest. Groups then run concurrently in batches of `import_batch_size`,
//! each in its own transaction; the claim table still has the final say
//! when a regular order grabs a number mid-run.
//!
//! Row problems are counted and reported, never raised. Only a missing
//! raffle fails the whole import.

use std::collections::{HashMap, HashSet};
use std::fmt;

use futures::future::join_all;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

use super::Engine;
use crate::adapters::customers_sea::CustomerCreate;
use crate::adapters::orders_sea::{OrderCreate, OrderUpdate};
use crate::db::txn::run_in_txn;
use crate::domain::phone::normalize_phone;
use crate::domain::TicketSpace;
use crate::entities::orders::OrderStatus;
use crate::error::AppError;
use crate::errors::domain::DomainError;
use crate::logging::pii::Redacted;
use crate::repos::customers::{self, Customer};
use crate::repos::raffles::{self, Raffle};
use crate::repos::{claims, orders};
use crate::services::orders::{insert_with_folio, total_for};

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRow {
    #[serde(default)]
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(alias = "ticket")]
    pub ticket_number: i32,
}

impl ImportRow {
    pub fn new(name: impl Into<String>, phone: impl Into<String>, ticket_number: i32) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            region: None,
            ticket_number,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Rows materialized into an order
    pub success: u32,
    /// Rows rejected
    pub failed: u32,
    pub errors: Vec<String>,
}

/// Why a single row was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowIssue {
    InvalidPhone,
    OutOfRange,
    Duplicate,
    AlreadyTaken,
    OrderFailed,
}

impl RowIssue {
    fn code(self) -> &'static str {
        match self {
            Self::InvalidPhone => "INVALID_PHONE",
            Self::OutOfRange => "TICKET_OUT_OF_RANGE",
            Self::Duplicate => "DUPLICATE_TICKET_IN_REQUEST",
            Self::AlreadyTaken => "ALREADY_TAKEN",
            Self::OrderFailed => "ORDER_FAILED",
        }
    }
}

/// A rejected row, rendered into `ImportSummary::errors`
struct RowError {
    row: usize,
    issue: RowIssue,
    ticket: i32,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: {} (ticket {})",
            self.row,
            self.issue.code(),
            self.ticket
        )
    }
}

#[derive(Default)]
struct Tally {
    success: u32,
    errors: Vec<RowError>,
}

impl Tally {
    fn reject(&mut self, row: usize, issue: RowIssue, ticket: i32) {
        self.errors.push(RowError { row, issue, ticket });
    }

    fn into_summary(mut self) -> ImportSummary {
        self.errors.sort_by_key(|e| e.row);
        ImportSummary {
            success: self.success,
            failed: self.errors.len() as u32,
            errors: self.errors.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Rows of one customer, in file order
struct Group {
    phone: String,
    name: String,
    region: Option<String>,
    /// `(row, ticket)` pairs
    tickets: Vec<(usize, i32)>,
}

/// What one group will try to write
#[derive(Clone)]
struct GroupPlan {
    customer_id: i64,
    tickets: Vec<(usize, i32)>,
}

struct GroupOutcome {
    imported: u32,
    rejected: Vec<RowError>,
}

/// Validate rows and group them by normalized phone, first-seen order.
fn group_rows(rows: Vec<ImportRow>, space: &TicketSpace, tally: &mut Tally) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut by_phone: HashMap<String, usize> = HashMap::new();

    for (i, row) in rows.into_iter().enumerate() {
        let row_no = i + 1;
        let Some(phone) = normalize_phone(&row.phone) else {
            tally.reject(row_no, RowIssue::InvalidPhone, row.ticket_number);
            continue;
        };
        if !space.is_base(row.ticket_number) {
            tally.reject(row_no, RowIssue::OutOfRange, row.ticket_number);
            continue;
        }

        let idx = *by_phone.entry(phone.clone()).or_insert_with(|| {
            groups.push(Group {
                phone: phone.clone(),
                name: row.name.trim().to_string(),
                region: row.region.clone().filter(|r| !r.trim().is_empty()),
                tickets: Vec::new(),
            });
            groups.len() - 1
        });
        groups[idx].tickets.push((row_no, row.ticket_number));
    }

    groups
}

/// Load existing customers for every phone in one query and create the rest.
async fn resolve_customers(
    db: &DatabaseConnection,
    groups: &[Group],
) -> Result<HashMap<String, Customer>, DomainError> {
    let phones: Vec<String> = groups.iter().map(|g| g.phone.clone()).collect();
    let mut by_phone: HashMap<String, Customer> = customers::find_by_phones(db, &phones)
        .await?
        .into_iter()
        .map(|c| (c.phone.clone(), c))
        .collect();

    for group in groups {
        if by_phone.contains_key(&group.phone) {
            continue;
        }
        let name = if group.name.is_empty() {
            group.phone.clone()
        } else {
            group.name.clone()
        };
        let mut dto = CustomerCreate::new(name, group.phone.clone());
        if let Some(region) = &group.region {
            dto = dto.with_region(region.clone());
        }
        match customers::ensure_by_phone(db, dto).await {
            Ok((customer, _)) => {
                by_phone.insert(group.phone.clone(), customer);
            }
            Err(e) => {
                // The group will fail as a whole below
                warn!(phone = %Redacted(&group.phone), error = %e, "could not resolve import customer");
            }
        }
    }

    Ok(by_phone)
}

/// Plan all groups sequentially against the occupancy snapshot plus the
/// numbers already planned for earlier groups.
fn plan_groups(
    groups: Vec<Group>,
    customers: &HashMap<String, Customer>,
    occupied: &HashSet<i32>,
    tally: &mut Tally,
) -> Vec<GroupPlan> {
    let mut planned: HashSet<i32> = HashSet::new();
    let mut plans = Vec::with_capacity(groups.len());

    for group in groups {
        let Some(customer) = customers.get(&group.phone) else {
            for (row, ticket) in group.tickets {
                tally.reject(row, RowIssue::OrderFailed, ticket);
            }
            continue;
        };

        let mut in_group: HashSet<i32> = HashSet::new();
        let mut keep = Vec::with_capacity(group.tickets.len());
        for (row, ticket) in group.tickets {
            if !in_group.insert(ticket) {
                tally.reject(row, RowIssue::Duplicate, ticket);
            } else if occupied.contains(&ticket) || planned.contains(&ticket) {
                tally.reject(row, RowIssue::AlreadyTaken, ticket);
            } else {
                planned.insert(ticket);
                keep.push((row, ticket));
            }
        }

        if !keep.is_empty() {
            plans.push(GroupPlan {
                customer_id: customer.id,
                tickets: keep,
            });
        }
    }

    plans
}

/// Create one group's order in its own transaction.
///
/// Numbers claimed concurrently since the snapshot are dropped from the
/// order and reported as `ALREADY_TAKEN`; if none survive, nothing is written.
async fn import_group(
    db: &DatabaseConnection,
    raffle: Raffle,
    expires_at: OffsetDateTime,
    plan: GroupPlan,
) -> GroupOutcome {
    let all_rows = plan.tickets.clone();
    let result = run_in_txn(db, move |txn| {
        Box::pin(async move {
            let numbers: Vec<i32> = plan.tickets.iter().map(|(_, t)| *t).collect();
            let base = numbers.len() as i32;
            let dto = OrderCreate {
                folio: String::new(),
                raffle_id: raffle.id,
                customer_id: plan.customer_id,
                ticket_numbers: numbers.clone(),
                base_ticket_count: base,
                total_cents: total_for(&raffle, base)?,
                status: OrderStatus::Pending,
                payment_method: None,
                notes: None,
                expires_at,
            };
            let order = insert_with_folio(txn, dto).await?;

            let outcome = claims::claim_numbers(txn, raffle.id, order.id, &numbers).await?;
            if outcome.claimed.is_empty() {
                return Err(DomainError::tickets_taken(outcome.lost).into());
            }
            let claimed = outcome.claimed.len() as i32;
            if !outcome.is_complete() {
                let total = total_for(&raffle, claimed)?;
                orders::update_details(
                    txn,
                    OrderUpdate::new(order.id)
                        .with_tickets(outcome.claimed.clone(), claimed)
                        .with_total_cents(total),
                )
                .await?;
            }
            raffles::adjust_sold(txn, raffle.id, claimed).await?;
            Ok::<_, AppError>(outcome)
        })
    })
    .await;

    match result {
        Ok(outcome) => {
            let lost: HashSet<i32> = outcome.lost.into_iter().collect();
            let mut rejected = Vec::new();
            let mut imported = 0;
            for (row, ticket) in all_rows {
                if lost.contains(&ticket) {
                    rejected.push(RowError {
                        row,
                        issue: RowIssue::AlreadyTaken,
                        ticket,
                    });
                } else {
                    imported += 1;
                }
            }
            GroupOutcome { imported, rejected }
        }
        Err(e) => {
            let issue = if e.taken_numbers().is_some() {
                RowIssue::AlreadyTaken
            } else {
                warn!(error = %e, "import group failed");
                RowIssue::OrderFailed
            };
            GroupOutcome {
                imported: 0,
                rejected: all_rows
                    .into_iter()
                    .map(|(row, ticket)| RowError { row, issue, ticket })
                    .collect(),
            }
        }
    }
}

/// Import `rows` into raffle `raffle_id`.
pub async fn import_tickets(
    db: &DatabaseConnection,
    engine: &Engine,
    raffle_id: i64,
    rows: Vec<ImportRow>,
) -> Result<ImportSummary, AppError> {
    let raffle = raffles::require_raffle(db, raffle_id).await?;
    let space = raffle.space();
    let row_count = rows.len();
    let mut tally = Tally::default();

    let groups = group_rows(rows, &space, &mut tally);
    let occupied: HashSet<i32> = claims::occupied_numbers(db, raffle.id, Some(space.base_range()))
        .await?
        .into_iter()
        .collect();
    let customers = resolve_customers(db, &groups).await?;
    let plans = plan_groups(groups, &customers, &occupied, &mut tally);

    let expires_at = OffsetDateTime::now_utc() + engine.config().import_ttl;
    let batch_size = engine.config().import_batch_size.max(1);
    let group_count = plans.len();

    for batch in plans.chunks(batch_size) {
        let outcomes = join_all(
            batch
                .iter()
                .cloned()
                .map(|plan| import_group(db, raffle.clone(), expires_at, plan)),
        )
        .await;
        for outcome in outcomes {
            tally.success += outcome.imported;
            tally.errors.extend(outcome.rejected);
        }
    }

    let summary = tally.into_summary();
    info!(
        raffle_id,
        rows = row_count,
        groups = group_count,
        success = summary.success,
        failed = summary.failed,
        "ticket import finished"
    );
    Ok(summary)
}
