//! Client credit ledger operations
//!
//! Entries never make the available balance negative: spending credit,
//! shrinking an entry and deleting one are refused when they would.

use rust_decimal::prelude::*;
use shared::models::{
    CreditAdjustment, CreditKind, CreditSource, CreditTransaction, CreditTransactionUpdate,
    CreditUse,
};
use shared::util::{new_id, now_millis};
use shared::{AppError, AppResult, ErrorCode};

use super::Ledger;
use crate::audit_log;
use crate::money::{to_decimal, to_f64};
use crate::reconciliation;

fn validate_credit_amount(amount: f64) -> AppResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        tracing::warn!(amount, "Rejected credit amount");
        return Err(AppError::validation(format!(
            "Credit amount must be a positive number, got {}",
            amount
        ))
        .with_detail("field", "amount"));
    }
    Ok(())
}

fn insufficient_credit(client_id: &str, available: Decimal, requested: Decimal) -> AppError {
    AppError::new(ErrorCode::ClientInsufficientCredit)
        .with_detail("client_id", client_id)
        .with_detail("available", to_f64(available.max(Decimal::ZERO)))
        .with_detail("requested", to_f64(requested))
}

impl Ledger {
    /// Available credit of a client before flooring
    fn credit_balance(&self, client_id: &str) -> Decimal {
        let snapshot = &self.snapshot;
        reconciliation::credit_balance(
            client_id,
            &snapshot.sales,
            &snapshot.payments,
            &snapshot.credit_transactions,
        )
    }

    /// Refuse a change of `delta` that would leave the balance negative
    ///
    /// A change that does not lower the balance always passes, so an
    /// already negative balance can still be repaired.
    fn ensure_credit_covers(&self, client_id: &str, delta: Decimal) -> AppResult<()> {
        if delta >= Decimal::ZERO {
            return Ok(());
        }
        let balance = self.credit_balance(client_id);
        if balance + delta < Decimal::ZERO {
            tracing::warn!(
                client_id = %client_id,
                balance = to_f64(balance),
                change = to_f64(delta),
                "Credit balance would go negative"
            );
            return Err(insufficient_credit(client_id, balance, -delta));
        }
        Ok(())
    }

    /// Record a refund or a manual adjustment
    pub fn add_credit_adjustment(&mut self, data: CreditAdjustment) -> AppResult<CreditTransaction> {
        self.ensure_client(&data.client_id)?;
        validate_credit_amount(data.amount)?;
        if !matches!(data.source, CreditSource::Refund | CreditSource::ManualAdjustment) {
            return Err(AppError::validation(format!(
                "Credit source {} is recorded by the ledger itself",
                data.source.as_str()
            ))
            .with_detail("field", "source"));
        }

        let entry = CreditTransaction {
            id: new_id(),
            client_id: data.client_id,
            amount: to_f64(to_decimal(data.amount)),
            kind: data.kind,
            source: data.source,
            source_id: None,
            date: data.date,
            notes: data.notes,
            created_at: now_millis(),
            updated_at: None,
        };
        self.ensure_credit_covers(&entry.client_id, reconciliation::entry_effect(&entry))?;

        self.snapshot.credit_transactions.push(entry.clone());
        audit_log!(
            "record",
            format!("credit:{}", entry.id),
            format!("{:.2} {} for client:{}", entry.amount, entry.source.as_str(), entry.client_id)
        );
        Ok(entry)
    }

    /// Spend part of a client's available credit
    pub fn use_client_credit(&mut self, data: CreditUse) -> AppResult<CreditTransaction> {
        self.ensure_client(&data.client_id)?;
        validate_credit_amount(data.amount)?;

        let amount = to_decimal(data.amount);
        self.ensure_credit_covers(&data.client_id, -amount)?;

        let entry = CreditTransaction {
            id: new_id(),
            client_id: data.client_id,
            amount: to_f64(amount),
            kind: CreditKind::Debit,
            source: CreditSource::CreditUse,
            source_id: data.source_id,
            date: data.date,
            notes: data.notes,
            created_at: now_millis(),
            updated_at: None,
        };

        self.snapshot.credit_transactions.push(entry.clone());
        audit_log!(
            "use",
            format!("credit:{}", entry.id),
            format!("{:.2} for client:{}", entry.amount, entry.client_id)
        );
        Ok(entry)
    }

    pub fn update_credit_transaction(
        &mut self,
        id: &str,
        update: CreditTransactionUpdate,
    ) -> AppResult<CreditTransaction> {
        let idx = self.credit_index(id)?;
        if let Some(amount) = update.amount {
            validate_credit_amount(amount)?;
        }

        let current = self.credit_at(idx);
        let mut edited = current.clone();
        if let Some(amount) = update.amount {
            edited.amount = to_f64(to_decimal(amount));
        }
        let delta = reconciliation::entry_effect(&edited) - reconciliation::entry_effect(current);
        self.ensure_credit_covers(&current.client_id, delta)?;

        if let Some(date) = update.date {
            edited.date = date;
        }
        if update.notes.is_some() {
            edited.notes = update.notes;
        }
        edited.updated_at = Some(now_millis());
        self.snapshot.credit_transactions[idx] = edited.clone();

        audit_log!("update", format!("credit:{}", id), format!("{:.2}", edited.amount));
        Ok(edited)
    }

    /// Remove a credit entry for good
    pub fn delete_credit_transaction(&mut self, id: &str) -> AppResult<CreditTransaction> {
        let idx = self.credit_index(id)?;
        let entry = self.credit_at(idx);
        self.ensure_credit_covers(&entry.client_id, -reconciliation::entry_effect(entry))?;

        let entry = self.snapshot.credit_transactions.remove(idx);
        audit_log!(
            "delete",
            format!("credit:{}", id),
            format!("{:.2} {}", entry.amount, entry.source.as_str())
        );
        Ok(entry)
    }
}
