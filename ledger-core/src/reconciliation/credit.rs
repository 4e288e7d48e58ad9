//! Client credit position
//!
//! Available credit combines the overpayment derived from payments with
//! the client's credit ledger. Credits recorded from payment excess are the
//! same money as the overpayment, so they are reported as pending and never
//! counted twice.

use rust_decimal::prelude::*;
use shared::models::{ClientCreditStatus, CreditKind, CreditSource, CreditTransaction, Payment, Sale};

use super::client_balance;
use crate::money::{sanitize, to_f64};

/// Credit entries of a client, newest first
pub fn credit_transactions_for_client<'a>(
    client_id: &str,
    credits: &'a [CreditTransaction],
) -> Vec<&'a CreditTransaction> {
    let mut entries: Vec<&CreditTransaction> =
        credits.iter().filter(|t| t.client_id == client_id).collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
    entries
}

/// Signed effect of one entry on available credit
pub(crate) fn entry_effect(entry: &CreditTransaction) -> Decimal {
    match (entry.kind, entry.source) {
        (CreditKind::Credit, CreditSource::Payment) => Decimal::ZERO,
        (CreditKind::Credit, _) => sanitize(entry.amount),
        (CreditKind::Debit, _) => -sanitize(entry.amount),
    }
}

/// Available credit before flooring at zero
pub(crate) fn credit_balance(
    client_id: &str,
    sales: &[Sale],
    payments: &[Payment],
    credits: &[CreditTransaction],
) -> Decimal {
    let overpayment = client_balance(client_id, sales, payments).credit();
    let entries: Decimal = credits
        .iter()
        .filter(|t| t.client_id == client_id)
        .map(entry_effect)
        .sum();
    overpayment + entries
}

/// Available, pending and used credit of a client
pub fn client_credit_status(
    client_id: &str,
    sales: &[Sale],
    payments: &[Payment],
    credits: &[CreditTransaction],
) -> ClientCreditStatus {
    let transactions = credit_transactions_for_client(client_id, credits);

    let mut pending = Decimal::ZERO;
    let mut used = Decimal::ZERO;
    for entry in &transactions {
        match (entry.kind, entry.source) {
            (CreditKind::Credit, CreditSource::Payment) => pending += sanitize(entry.amount),
            (CreditKind::Debit, CreditSource::CreditUse) => used += sanitize(entry.amount),
            _ => {}
        }
    }

    ClientCreditStatus {
        available_credit: to_f64(
            credit_balance(client_id, sales, payments, credits).max(Decimal::ZERO),
        ),
        pending_credits: to_f64(pending),
        used_credits: to_f64(used),
        transactions: transactions.into_iter().cloned().collect(),
    }
}
