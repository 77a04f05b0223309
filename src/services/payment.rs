// src/services/payment.rs

//! Payment transition: manual admin attestation that money arrived. The
//! core's job is to make that attestation atomic and idempotent, not to
//! verify that money actually moved.

use crate::db::MarkPaidOutcome;
use crate::errors::{AppError, Result};
use crate::state::AppState;
use tracing::{info, instrument};

/// pending → paid, with the correlated sale ledger entry created at most
/// once. Delegates the atomicity to the store's transaction primitive; see
/// `OrderStore::mark_paid`.
#[instrument(name = "payment::mark_paid", skip(state), fields(order_id = %order_id))]
pub async fn mark_paid(state: &AppState, order_id: &str) -> Result<MarkPaidOutcome> {
  let order_id = order_id.trim();
  if order_id.is_empty() {
    return Err(AppError::Validation("Missing orderId".to_string()));
  }

  let outcome = state.store.mark_paid(order_id).await?;
  match outcome {
    MarkPaidOutcome::Paid => info!(order_id, "order marked paid"),
    MarkPaidOutcome::AlreadyPaid => info!(order_id, "order already paid; no-op"),
  }
  Ok(outcome)
}
