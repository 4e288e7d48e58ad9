use super::*;
use chrono::NaiveDate;
use shared::ErrorCode;
use shared::models::{
    BulkPaymentDraft, ClientCreate, ClientUpdate, CreditAdjustment, CreditKind, CreditSource,
    CreditTransactionUpdate, CreditUse, InvoiceDraft, LineItemDraft, PaymentDraft, PaymentMethod,
    PaymentUpdate, SaleDraft, SaleUpdate,
};

use crate::store::{JsonFileStore, MemoryStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ledger() -> Ledger {
    Ledger::new(LedgerConfig::from_lookup(|_| None))
}

fn add_client(ledger: &mut Ledger, name: &str) -> String {
    ledger
        .add_client(ClientCreate {
            name: name.to_string(),
            ..Default::default()
        })
        .unwrap()
        .id
}

/// One line of `tons` at 1000/t, taxed at 19%
fn add_sale(ledger: &mut Ledger, client_id: &str, day: NaiveDate, tons: f64) -> Sale {
    ledger
        .add_sale(SaleDraft {
            client_id: client_id.to_string(),
            date: day,
            items: vec![LineItemDraft {
                description: "Prepainted coil".to_string(),
                coil_ref: Some("PPGI-0.5".to_string()),
                quantity: tons,
                unit_price: 1000.0,
                ..Default::default()
            }],
            transportation_fee: 0.0,
            tax_rate: Some(0.19),
            payment_method: None,
            notes: None,
        })
        .unwrap()
}

fn invoice_for(ledger: &mut Ledger, client_id: &str, sales: &[&Sale], due: NaiveDate) -> Invoice {
    ledger
        .create_invoice(InvoiceDraft {
            client_id: client_id.to_string(),
            sales_ids: sales.iter().map(|s| s.id.clone()).collect(),
            date: date(2024, 1, 31),
            due_date: Some(due),
            tax_rate: Some(0.19),
            payment_method: Some(PaymentMethod::BankTransfer),
        })
        .unwrap()
}

fn pay(ledger: &mut Ledger, sale_id: &str, amount: f64) -> Payment {
    ledger
        .record_payment(PaymentDraft {
            sale_id: sale_id.to_string(),
            amount,
            date: date(2024, 2, 10),
            method: PaymentMethod::BankTransfer,
            notes: None,
            check_number: None,
        })
        .unwrap()
}

fn invoice(ledger: &Ledger, id: &str) -> Invoice {
    ledger.view().invoice(id).unwrap().clone()
}

fn sale(ledger: &Ledger, id: &str) -> Sale {
    ledger.snapshot().sales.iter().find(|s| s.id == id).unwrap().clone()
}

// ========== Clients ==========

#[test]
fn test_client_requires_name() {
    let mut ledger = ledger();
    let err = ledger
        .add_client(ClientCreate {
            name: "   ".to_string(),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RequiredField);
}

#[test]
fn test_update_client() {
    let mut ledger = ledger();
    let id = add_client(&mut ledger, "Acme");

    let updated = ledger
        .update_client(
            &id,
            ClientUpdate {
                name: Some(" Acme Steel ".to_string()),
                tax_id: Some("TX-9".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(updated.name, "Acme Steel");
    assert_eq!(updated.tax_id.as_deref(), Some("TX-9"));
}

#[test]
fn test_delete_client_with_sales_refused() {
    let mut ledger = ledger();
    let id = add_client(&mut ledger, "Acme");
    let s = add_sale(&mut ledger, &id, date(2024, 1, 5), 1.0);

    let err = ledger.delete_client(&id).unwrap_err();
    assert_eq!(err.code, ErrorCode::ClientHasSales);

    ledger.delete_sale(&s.id).unwrap();
    ledger.delete_client(&id).unwrap();
    assert!(ledger.view().client(&id).is_err());
}

#[test]
fn test_delete_client_with_live_invoice_refused() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let inv = invoice_for(&mut ledger, &c, &[&s], date(2024, 2, 28));
    ledger.delete_sale(&s.id).unwrap();

    // The invoice is empty but still live
    let err = ledger.delete_client(&c).unwrap_err();
    assert_eq!(err.code, ErrorCode::ClientHasSales);
    assert_eq!(err.details.as_ref().unwrap()["invoices"], 1);

    ledger.delete_invoice(&inv.id).unwrap();
    ledger.delete_client(&c).unwrap();

    let err = ledger.restore_invoice(&inv.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::ClientNotFound);
    assert!(ledger.snapshot().invoices[0].is_deleted);
}

#[test]
fn test_delete_client_drops_credit_entries() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let other = add_client(&mut ledger, "Borealis");
    for client_id in [&c, &other] {
        ledger
            .add_credit_adjustment(CreditAdjustment {
                client_id: client_id.clone(),
                amount: 10.0,
                kind: CreditKind::Credit,
                source: CreditSource::Refund,
                date: date(2024, 1, 5),
                notes: None,
            })
            .unwrap();
    }

    ledger.delete_client(&c).unwrap();

    let remaining = &ledger.snapshot().credit_transactions;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].client_id, other);
}

// ========== Sales ==========

#[test]
fn test_add_sale_computes_totals() {
    let mut ledger = ledger();
    let client_id = add_client(&mut ledger, "Acme");

    let sale = ledger
        .add_sale(SaleDraft {
            client_id: client_id.clone(),
            date: date(2024, 1, 5),
            items: vec![
                LineItemDraft {
                    description: "Coil A".to_string(),
                    quantity: 10.0,
                    unit_price: 1000.0,
                    ..Default::default()
                },
                LineItemDraft {
                    description: "Coil B".to_string(),
                    quantity: 10.0,
                    unit_price: 1000.0,
                    ..Default::default()
                },
            ],
            transportation_fee: 1000.0,
            tax_rate: None,
            payment_method: Some(PaymentMethod::Check),
            notes: None,
        })
        .unwrap();

    assert_eq!(sale.tax_rate, 0.19);
    assert_eq!(sale.items[0].total_ht, 10000.0);
    assert_eq!(sale.items[0].total_ttc, 11900.0);
    assert_eq!(sale.total_ht, 21000.0);
    assert_eq!(sale.total_ttc, 24990.0);
    assert!(!sale.is_invoiced);
}

#[test]
fn test_add_sale_rejects_unknown_client_and_empty_items() {
    let mut ledger = ledger();
    let err = ledger
        .add_sale(SaleDraft {
            client_id: "nobody".to_string(),
            date: date(2024, 1, 5),
            items: vec![LineItemDraft::default()],
            transportation_fee: 0.0,
            tax_rate: None,
            payment_method: None,
            notes: None,
        })
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ClientNotFound);

    let client_id = add_client(&mut ledger, "Acme");
    let err = ledger
        .add_sale(SaleDraft {
            client_id,
            date: date(2024, 1, 5),
            items: vec![],
            transportation_fee: 0.0,
            tax_rate: None,
            payment_method: None,
            notes: None,
        })
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::SaleEmpty);
}

#[test]
fn test_update_sale_leaves_invoice_until_recomputed() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let inv = invoice_for(&mut ledger, &c, &[&s], date(2024, 2, 28));
    pay(&mut ledger, &s.id, 1190.0);
    assert!(invoice(&ledger, &inv.id).is_paid);

    let updated = ledger
        .update_sale(
            &s.id,
            SaleUpdate {
                items: Some(vec![LineItemDraft {
                    description: "Prepainted coil".to_string(),
                    quantity: 2.0,
                    unit_price: 1000.0,
                    ..Default::default()
                }]),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.total_ttc, 2380.0);

    // Stale until asked
    let stale = invoice(&ledger, &inv.id);
    assert!(stale.is_paid);
    assert_eq!(stale.total_ttc, 1190.0);

    let fresh = ledger.recompute_invoice(&inv.id).unwrap();
    assert!(!fresh.is_paid);
    assert_eq!(fresh.paid_at, None);
    assert_eq!(fresh.total_ht, 2000.0);
    assert_eq!(fresh.total_ttc, 2380.0);
}

#[test]
fn test_update_sale_rejects_empty_items_without_changes() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);

    let err = ledger
        .update_sale(
            &s.id,
            SaleUpdate {
                date: Some(date(2024, 6, 1)),
                items: Some(vec![]),
                ..Default::default()
            },
        )
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::SaleEmpty);
    assert_eq!(sale(&ledger, &s.id).date, date(2024, 1, 5));
}

#[test]
fn test_delete_and_restore_sale() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s1 = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let s2 = add_sale(&mut ledger, &c, date(2024, 1, 6), 2.0);
    let inv = invoice_for(&mut ledger, &c, &[&s1, &s2], date(2024, 2, 28));
    pay(&mut ledger, &s1.id, 1190.0);

    ledger.delete_sale(&s1.id).unwrap();

    let after_delete = invoice(&ledger, &inv.id);
    assert_eq!(after_delete.sales_ids, vec![s2.id.clone()]);
    assert_eq!(after_delete.total_ttc, 2380.0);
    assert!(!sale(&ledger, &s1.id).is_invoiced);
    assert_eq!(ledger.deleted_sales().len(), 1);
    // Payment archived along with the sale
    assert_eq!(ledger.archived_payments().len(), 1);
    assert_eq!(ledger.view().client_debt(&c), 2380.0);

    let err = ledger.delete_sale(&s1.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::SaleAlreadyDeleted);

    let restored = ledger.restore_sale(&s1.id).unwrap();
    assert!(!restored.is_deleted);
    assert!(!restored.is_invoiced);
    assert!(ledger.archived_payments().is_empty());
    assert_eq!(ledger.view().sale_payment_status(&s1.id).unwrap().total_paid, 1190.0);

    let err = ledger.restore_sale(&s1.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::SaleNotDeleted);
}

#[test]
fn test_restore_sale_of_removed_client_refused() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    ledger.delete_sale(&s.id).unwrap();
    ledger.delete_client(&c).unwrap();

    let err = ledger.restore_sale(&s.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::ClientNotFound);
    assert!(sale(&ledger, &s.id).is_deleted);
    assert!(ledger.view().sales_by_client(&c).is_empty());
}

#[test]
fn test_malformed_inputs_are_stored_as_zero() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s = ledger
        .add_sale(SaleDraft {
            client_id: c.clone(),
            date: date(2024, 1, 5),
            items: vec![
                LineItemDraft {
                    description: "Unweighed coil".to_string(),
                    quantity: f64::NAN,
                    unit_price: 1000.0,
                    coil_weight: Some(f64::INFINITY),
                    ..Default::default()
                },
                LineItemDraft {
                    description: "Galvanized coil".to_string(),
                    quantity: 1.0,
                    unit_price: 1000.0,
                    ..Default::default()
                },
            ],
            transportation_fee: -50.0,
            tax_rate: Some(0.19),
            payment_method: None,
            notes: None,
        })
        .unwrap();

    assert_eq!(s.items[0].quantity, 0.0);
    assert_eq!(s.items[0].total_ht, 0.0);
    assert_eq!(s.items[0].coil_weight, None);
    assert_eq!(s.transportation_fee, 0.0);
    assert_eq!(s.total_ht, 1000.0);
    assert_eq!(s.total_ttc, 1190.0);

    let updated = ledger
        .update_sale(
            &s.id,
            SaleUpdate {
                transportation_fee: Some(f64::NAN),
                items: Some(vec![LineItemDraft {
                    description: "Galvanized coil".to_string(),
                    quantity: 2.0,
                    unit_price: -3.0,
                    ..Default::default()
                }]),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.transportation_fee, 0.0);
    assert_eq!(updated.items[0].unit_price, 0.0);
    assert_eq!(updated.total_ttc, 0.0);
}

// ========== Invoices ==========

#[test]
fn test_create_invoice_links_sales() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s1 = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let s2 = add_sale(&mut ledger, &c, date(2024, 1, 6), 2.0);

    let inv = invoice_for(&mut ledger, &c, &[&s1, &s2], date(2024, 2, 28));

    assert!(inv.invoice_number.starts_with("INV-"));
    assert_eq!(inv.total_ht, 3000.0);
    assert_eq!(inv.total_ttc, 3570.0);
    assert!(!inv.is_paid);
    for id in [&s1.id, &s2.id] {
        let s = sale(&ledger, id);
        assert!(s.is_invoiced);
        assert_eq!(s.invoice_id.as_deref(), Some(inv.id.as_str()));
    }
}

#[test]
fn test_create_invoice_default_due_date() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);

    let inv = ledger
        .create_invoice(InvoiceDraft {
            client_id: c,
            sales_ids: vec![s.id],
            date: date(2024, 1, 31),
            due_date: None,
            tax_rate: None,
            payment_method: None,
        })
        .unwrap();

    assert_eq!(inv.due_date, date(2024, 3, 1));
}

#[test]
fn test_create_invoice_rejects_due_before_date() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");

    let err = ledger
        .create_invoice(InvoiceDraft {
            client_id: c,
            sales_ids: vec![],
            date: date(2024, 1, 31),
            due_date: Some(date(2024, 1, 1)),
            tax_rate: None,
            payment_method: None,
        })
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvoiceInvalidDueDate);
    assert!(ledger.snapshot().invoices.is_empty());
}

#[test]
fn test_invoice_rejects_other_client_sale() {
    let mut ledger = ledger();
    let c1 = add_client(&mut ledger, "Acme");
    let c2 = add_client(&mut ledger, "Globex");
    let own = add_sale(&mut ledger, &c1, date(2024, 1, 5), 1.0);
    let foreign = add_sale(&mut ledger, &c2, date(2024, 1, 5), 1.0);

    let err = ledger
        .create_invoice(InvoiceDraft {
            client_id: c1.clone(),
            sales_ids: vec![own.id.clone(), foreign.id.clone()],
            date: date(2024, 1, 31),
            due_date: None,
            tax_rate: None,
            payment_method: None,
        })
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvoiceSaleMismatch);
    assert!(ledger.snapshot().invoices.is_empty());
    assert!(!sale(&ledger, &own.id).is_invoiced);
}

#[test]
fn test_invoice_rejects_unknown_sale() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let inv = invoice_for(&mut ledger, &c, &[&s], date(2024, 2, 28));

    let err = ledger.add_sale_to_invoice(&inv.id, "missing").unwrap_err();

    assert_eq!(err.code, ErrorCode::SaleNotFound);
    assert_eq!(invoice(&ledger, &inv.id).sales_ids, vec![s.id.clone()]);
}

#[test]
fn test_membership_changes_keep_both_sides_in_sync() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s1 = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let s2 = add_sale(&mut ledger, &c, date(2024, 1, 6), 2.0);
    let inv = invoice_for(&mut ledger, &c, &[&s1], date(2024, 2, 28));

    let inv_after_add = ledger.add_sale_to_invoice(&inv.id, &s2.id).unwrap();
    assert_eq!(inv_after_add.sales_ids.len(), 2);
    assert_eq!(inv_after_add.total_ttc, 3570.0);
    assert!(sale(&ledger, &s2.id).is_invoiced);

    let inv_after_remove = ledger.remove_sale_from_invoice(&inv.id, &s1.id).unwrap();
    assert_eq!(inv_after_remove.sales_ids, vec![s2.id.clone()]);
    assert_eq!(inv_after_remove.total_ttc, 2380.0);
    assert!(!sale(&ledger, &s1.id).is_invoiced);
    assert!(sale(&ledger, &s1.id).invoice_id.is_none());

    // Duplicates collapse
    let replaced = ledger
        .set_invoice_sales(&inv.id, vec![s1.id.clone(), s1.id.clone()])
        .unwrap();
    assert_eq!(replaced.sales_ids, vec![s1.id.clone()]);
    assert!(!sale(&ledger, &s2.id).is_invoiced);
}

#[test]
fn test_moving_sale_between_invoices() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s1 = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let s2 = add_sale(&mut ledger, &c, date(2024, 1, 6), 2.0);
    let first = invoice_for(&mut ledger, &c, &[&s1, &s2], date(2024, 2, 28));
    pay(&mut ledger, &s1.id, 1190.0);

    let second = invoice_for(&mut ledger, &c, &[&s2], date(2024, 3, 31));

    let first = invoice(&ledger, &first.id);
    assert_eq!(first.sales_ids, vec![s1.id.clone()]);
    assert_eq!(first.total_ttc, 1190.0);
    // Only the paid sale is left on the first invoice
    assert!(first.is_paid);
    assert!(first.paid_at.is_some());

    assert_eq!(second.sales_ids, vec![s2.id.clone()]);
    assert_eq!(sale(&ledger, &s2.id).invoice_id.as_deref(), Some(second.id.as_str()));
}

#[test]
fn test_delete_and_restore_invoice() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s1 = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let s2 = add_sale(&mut ledger, &c, date(2024, 1, 6), 2.0);
    let inv = invoice_for(&mut ledger, &c, &[&s1, &s2], date(2024, 2, 28));

    ledger.delete_invoice(&inv.id).unwrap();

    assert!(ledger.view().invoice(&inv.id).is_err());
    assert_eq!(ledger.deleted_invoices().len(), 1);
    assert!(!sale(&ledger, &s1.id).is_invoiced);
    assert!(!sale(&ledger, &s2.id).is_invoiced);
    let err = ledger.delete_invoice(&inv.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvoiceAlreadyDeleted);

    // s2 gets invoiced elsewhere meanwhile
    let other = invoice_for(&mut ledger, &c, &[&s2], date(2024, 3, 31));

    let restored = ledger.restore_invoice(&inv.id).unwrap();
    assert_eq!(restored.sales_ids, vec![s1.id.clone()]);
    assert_eq!(restored.total_ttc, 1190.0);
    assert_eq!(sale(&ledger, &s1.id).invoice_id.as_deref(), Some(inv.id.as_str()));
    assert_eq!(sale(&ledger, &s2.id).invoice_id.as_deref(), Some(other.id.as_str()));

    let err = ledger.restore_invoice(&inv.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvoiceNotDeleted);
}

#[test]
fn test_deleted_invoice_untouched_when_sale_moves() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let old = invoice_for(&mut ledger, &c, &[&s], date(2024, 2, 28));
    ledger.delete_invoice(&old.id).unwrap();
    let archived = ledger.snapshot().invoices[0].clone();

    invoice_for(&mut ledger, &c, &[&s], date(2024, 3, 31));

    let after = &ledger.snapshot().invoices[0];
    assert!(after.sales_ids.is_empty());
    assert_eq!(after.total_ttc, archived.total_ttc);
    assert_eq!(after.is_paid, archived.is_paid);
    assert_eq!(after.updated_at, archived.updated_at);
}

#[test]
fn test_invoice_ttc_can_exceed_paid_sales_by_a_cent() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let mut sales = Vec::new();
    for day in [5, 6] {
        let s = ledger
            .add_sale(SaleDraft {
                client_id: c.clone(),
                date: date(2024, 1, day),
                items: vec![LineItemDraft {
                    description: "Offcut".to_string(),
                    quantity: 1.0,
                    unit_price: 0.02,
                    ..Default::default()
                }],
                transportation_fee: 0.0,
                tax_rate: Some(0.19),
                payment_method: None,
                notes: None,
            })
            .unwrap();
        assert_eq!(s.total_ttc, 0.02);
        sales.push(s);
    }
    let inv = invoice_for(&mut ledger, &c, &[&sales[0], &sales[1]], date(2024, 2, 28));
    assert_eq!(inv.total_ht, 0.04);
    assert_eq!(inv.total_ttc, 0.05);

    for s in &sales {
        pay(&mut ledger, &s.id, 0.02);
    }

    // Paid is sale based; the invoice's own tax rounding is left over
    assert!(invoice(&ledger, &inv.id).is_paid);
    let status = ledger.view().invoice_payment_status(&inv.id).unwrap();
    assert_eq!(status.total_paid, 0.04);
    assert_eq!(status.remaining_amount, 0.01);
    assert!(!status.is_fully_paid);
}

#[test]
fn test_invoice_numbers_are_unique() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let mut numbers: Vec<String> = (0..20)
        .map(|_| invoice_for(&mut ledger, &c, &[], date(2024, 2, 28)).invoice_number)
        .collect();
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 20);
}

// ========== Payments ==========

#[test]
fn test_paid_flag_follows_payments() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s1 = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let s2 = add_sale(&mut ledger, &c, date(2024, 1, 6), 2.0);
    let inv = invoice_for(&mut ledger, &c, &[&s1, &s2], date(2024, 2, 28));

    pay(&mut ledger, &s1.id, 1190.0);
    let status = ledger.view().invoice_payment_status(&inv.id).unwrap();
    assert_eq!(status.total_paid, 1190.0);
    assert_eq!(status.remaining_amount, 2380.0);
    assert!(!status.is_fully_paid);
    assert!(!invoice(&ledger, &inv.id).is_paid);

    let last = pay(&mut ledger, &s2.id, 2380.0);
    let paid = invoice(&ledger, &inv.id);
    assert!(paid.is_paid);
    let paid_at = paid.paid_at;
    assert!(paid_at.is_some());

    // Extra payment keeps the original timestamp
    pay(&mut ledger, &s2.id, 10.0);
    assert_eq!(invoice(&ledger, &inv.id).paid_at, paid_at);

    // Archive the big payment: no longer paid
    ledger.delete_payment(&last.id).unwrap();
    let unpaid = invoice(&ledger, &inv.id);
    assert!(!unpaid.is_paid);
    assert_eq!(unpaid.paid_at, None);

    ledger.restore_payment(&last.id).unwrap();
    assert!(invoice(&ledger, &inv.id).is_paid);
}

#[test]
fn test_record_payment_validation() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);

    for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
        let err = ledger
            .record_payment(PaymentDraft {
                sale_id: s.id.clone(),
                amount,
                date: date(2024, 2, 1),
                method: PaymentMethod::Cash,
                notes: None,
                check_number: None,
            })
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentInvalidAmount);
    }

    let err = ledger
        .record_payment(PaymentDraft {
            sale_id: "missing".to_string(),
            amount: 10.0,
            date: date(2024, 2, 1),
            method: PaymentMethod::Cash,
            notes: None,
            check_number: None,
        })
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::SaleNotFound);
    assert!(ledger.snapshot().payments.is_empty());
}

#[test]
fn test_payment_client_comes_from_sale() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);

    let payment = pay(&mut ledger, &s.id, 100.0);
    assert_eq!(payment.client_id, c);
}

#[test]
fn test_delete_payment_twice() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let p = pay(&mut ledger, &s.id, 100.0);

    ledger.delete_payment(&p.id).unwrap();
    let err = ledger.delete_payment(&p.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentAlreadyDeleted);

    let archived = ledger.archived_payments();
    assert_eq!(archived.len(), 1);
    assert!(archived[0].deleted_at.is_some());

    let err = ledger.restore_payment("missing").unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentNotFound);
}

#[test]
fn test_restore_payment_of_deleted_sale_refused() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let p = pay(&mut ledger, &s.id, 100.0);

    ledger.delete_sale(&s.id).unwrap();

    let err = ledger.restore_payment(&p.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::SaleNotFound);
}

#[test]
fn test_bulk_payment_oldest_first() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let newer = add_sale(&mut ledger, &c, date(2024, 1, 20), 2.0);
    let older = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let inv = invoice_for(&mut ledger, &c, &[&older], date(2024, 2, 28));
    pay(&mut ledger, &older.id, 190.0);

    let slices = ledger
        .record_bulk_payment(BulkPaymentDraft {
            client_id: c.clone(),
            amount: 1500.0,
            date: date(2024, 2, 15),
            method: PaymentMethod::Check,
            notes: None,
            check_number: Some("CHK-001".to_string()),
        })
        .unwrap();

    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].sale_id, older.id);
    assert_eq!(slices[0].amount, 1000.0);
    assert_eq!(slices[1].sale_id, newer.id);
    assert_eq!(slices[1].amount, 500.0);
    assert!(slices[0].bulk_payment_id.is_some());
    assert_eq!(slices[0].bulk_payment_id, slices[1].bulk_payment_id);
    assert_eq!(slices[1].check_number.as_deref(), Some("CHK-001"));

    assert!(invoice(&ledger, &inv.id).is_paid);
    assert_eq!(ledger.view().client_debt(&c), 1880.0);
}

#[test]
fn test_bulk_payment_excess_becomes_credit() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let first = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let last = add_sale(&mut ledger, &c, date(2024, 1, 20), 1.0);

    let slices = ledger
        .record_bulk_payment(BulkPaymentDraft {
            client_id: c.clone(),
            amount: 2500.0,
            date: date(2024, 2, 15),
            method: PaymentMethod::BankTransfer,
            notes: None,
            check_number: None,
        })
        .unwrap();

    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].sale_id, first.id);
    assert_eq!(slices[0].amount, 1190.0);
    assert_eq!(slices[1].sale_id, last.id);
    assert_eq!(slices[1].amount, 1310.0);

    let view = ledger.view();
    assert_eq!(view.client_debt(&c), 0.0);
    assert_eq!(view.client_credit_balance(&c), 120.0);
    assert_eq!(view.sale_payment_status(&last.id).unwrap().remaining_amount, 0.0);
}

#[test]
fn test_bulk_payment_without_sales() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");

    let err = ledger
        .record_bulk_payment(BulkPaymentDraft {
            client_id: c,
            amount: 100.0,
            date: date(2024, 2, 15),
            method: PaymentMethod::Cash,
            notes: None,
            check_number: None,
        })
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentNoTarget);
}

#[test]
fn test_payments_for_sale_lists_live_payments() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s1 = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let s2 = add_sale(&mut ledger, &c, date(2024, 1, 6), 1.0);
    let kept = pay(&mut ledger, &s1.id, 100.0);
    let archived = pay(&mut ledger, &s1.id, 200.0);
    pay(&mut ledger, &s2.id, 300.0);
    ledger.delete_payment(&archived.id).unwrap();

    let view = ledger.view();
    let listed = view.payments_for_sale(&s1.id);
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, kept.id);
    assert!(view.payments_for_sale("missing").is_empty());
}

#[test]
fn test_update_payment_moves_paid_flag() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s1 = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let s2 = add_sale(&mut ledger, &c, date(2024, 1, 6), 1.0);
    let first = invoice_for(&mut ledger, &c, &[&s1], date(2024, 2, 28));
    let second = invoice_for(&mut ledger, &c, &[&s2], date(2024, 2, 28));
    let p = pay(&mut ledger, &s1.id, 1190.0);
    assert!(invoice(&ledger, &first.id).is_paid);

    let moved = ledger
        .update_payment(
            &p.id,
            PaymentUpdate {
                sale_id: Some(s2.id.clone()),
                check_number: Some("0042".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(moved.sale_id, s2.id);
    assert_eq!(moved.amount, 1190.0);
    assert_eq!(moved.check_number.as_deref(), Some("0042"));
    assert!(moved.updated_at.is_some());
    let first = invoice(&ledger, &first.id);
    assert!(!first.is_paid);
    assert_eq!(first.paid_at, None);
    assert!(invoice(&ledger, &second.id).is_paid);

    let shrunk = ledger
        .update_payment(
            &p.id,
            PaymentUpdate {
                amount: Some(1000.0),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(shrunk.amount, 1000.0);
    assert!(!invoice(&ledger, &second.id).is_paid);
    assert_eq!(ledger.view().client_debt(&c), 1380.0);
}

#[test]
fn test_update_payment_to_other_client_sale() {
    let mut ledger = ledger();
    let acme = add_client(&mut ledger, "Acme");
    let borealis = add_client(&mut ledger, "Borealis");
    let s1 = add_sale(&mut ledger, &acme, date(2024, 1, 5), 1.0);
    let s2 = add_sale(&mut ledger, &borealis, date(2024, 1, 6), 1.0);
    let p = pay(&mut ledger, &s1.id, 1190.0);

    let moved = ledger
        .update_payment(
            &p.id,
            PaymentUpdate {
                sale_id: Some(s2.id.clone()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(moved.client_id, borealis);
    let view = ledger.view();
    assert_eq!(view.client_debt(&acme), 1190.0);
    assert_eq!(view.client_debt(&borealis), 0.0);
}

#[test]
fn test_update_payment_validation() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let s = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    let gone = add_sale(&mut ledger, &c, date(2024, 1, 6), 1.0);
    ledger.delete_sale(&gone.id).unwrap();
    let p = pay(&mut ledger, &s.id, 100.0);

    let err = ledger
        .update_payment(
            &p.id,
            PaymentUpdate {
                amount: Some(f64::NAN),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentInvalidAmount);

    let err = ledger
        .update_payment(
            &p.id,
            PaymentUpdate {
                sale_id: Some(gone.id.clone()),
                amount: Some(50.0),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::SaleNotFound);
    assert_eq!(ledger.view().payment(&p.id).unwrap().amount, 100.0);

    ledger.delete_payment(&p.id).unwrap();
    let err = ledger.update_payment(&p.id, PaymentUpdate::default()).unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentAlreadyDeleted);
}

// ========== Credits ==========

fn refund(ledger: &mut Ledger, client_id: &str, amount: f64) -> CreditTransaction {
    ledger
        .add_credit_adjustment(CreditAdjustment {
            client_id: client_id.to_string(),
            amount,
            kind: CreditKind::Credit,
            source: CreditSource::Refund,
            date: date(2024, 3, 1),
            notes: Some("Damaged coil".to_string()),
        })
        .unwrap()
}

fn use_credit(ledger: &mut Ledger, client_id: &str, amount: f64) -> AppResult<CreditTransaction> {
    ledger.use_client_credit(CreditUse {
        client_id: client_id.to_string(),
        amount,
        source_id: None,
        date: date(2024, 3, 2),
        notes: None,
    })
}

#[test]
fn test_credit_adjustment_and_use() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    refund(&mut ledger, &c, 50.0);

    let used = use_credit(&mut ledger, &c, 30.0).unwrap();
    assert_eq!(used.kind, CreditKind::Debit);
    assert_eq!(used.source, CreditSource::CreditUse);

    let status = ledger.view().client_credit_status(&c).unwrap();
    assert_eq!(status.available_credit, 20.0);
    assert_eq!(status.pending_credits, 0.0);
    assert_eq!(status.used_credits, 30.0);
    assert_eq!(status.transactions.len(), 2);
    // Newest first
    assert_eq!(status.transactions[0].id, used.id);

    let err = use_credit(&mut ledger, &c, 25.0).unwrap_err();
    assert_eq!(err.code, ErrorCode::ClientInsufficientCredit);
    assert_eq!(err.details.as_ref().unwrap()["available"], 20.0);
    assert_eq!(ledger.view().credit_transactions(&c).len(), 2);
}

#[test]
fn test_credit_adjustment_validation() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");

    let mut adjustment = CreditAdjustment {
        client_id: c.clone(),
        amount: -5.0,
        kind: CreditKind::Credit,
        source: CreditSource::ManualAdjustment,
        date: date(2024, 3, 1),
        notes: None,
    };
    let err = ledger.add_credit_adjustment(adjustment.clone()).unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    adjustment.amount = 5.0;
    adjustment.source = CreditSource::CreditUse;
    let err = ledger.add_credit_adjustment(adjustment.clone()).unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    // A debit needs credit to take from
    adjustment.source = CreditSource::ManualAdjustment;
    adjustment.kind = CreditKind::Debit;
    let err = ledger.add_credit_adjustment(adjustment.clone()).unwrap_err();
    assert_eq!(err.code, ErrorCode::ClientInsufficientCredit);

    adjustment.client_id = "missing".to_string();
    let err = ledger.add_credit_adjustment(adjustment).unwrap_err();
    assert_eq!(err.code, ErrorCode::ClientNotFound);
    assert!(ledger.snapshot().credit_transactions.is_empty());
}

#[test]
fn test_update_and_delete_credit_transaction() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    let credit = refund(&mut ledger, &c, 50.0);
    let debit = use_credit(&mut ledger, &c, 30.0).unwrap();

    let grown = ledger
        .update_credit_transaction(
            &debit.id,
            CreditTransactionUpdate {
                amount: Some(40.0),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(grown.amount, 40.0);
    assert!(grown.updated_at.is_some());
    assert_eq!(ledger.view().client_credit_status(&c).unwrap().available_credit, 10.0);

    let err = ledger
        .update_credit_transaction(
            &credit.id,
            CreditTransactionUpdate {
                amount: Some(20.0),
                notes: Some("Partial refund".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ClientInsufficientCredit);
    assert_eq!(ledger.view().credit_transactions(&c)[1].notes.as_deref(), Some("Damaged coil"));

    let err = ledger.delete_credit_transaction(&credit.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::ClientInsufficientCredit);

    ledger.delete_credit_transaction(&debit.id).unwrap();
    assert_eq!(ledger.view().client_credit_status(&c).unwrap().available_credit, 50.0);

    let err = ledger.delete_credit_transaction(&debit.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::CreditTransactionNotFound);
}

#[test]
fn test_bulk_excess_is_pending_credit() {
    let mut ledger = ledger();
    let c = add_client(&mut ledger, "Acme");
    add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);

    let slices = ledger
        .record_bulk_payment(BulkPaymentDraft {
            client_id: c.clone(),
            amount: 1290.0,
            date: date(2024, 2, 15),
            method: PaymentMethod::BankTransfer,
            notes: None,
            check_number: None,
        })
        .unwrap();

    let status = ledger.view().client_credit_status(&c).unwrap();
    assert_eq!(status.pending_credits, 100.0);
    // Same money as the overpayment, counted once
    assert_eq!(status.available_credit, 100.0);
    assert_eq!(status.transactions.len(), 1);
    assert_eq!(status.transactions[0].source, CreditSource::Payment);
    assert_eq!(status.transactions[0].source_id, slices[0].bulk_payment_id);

    use_credit(&mut ledger, &c, 60.0).unwrap();
    let status = ledger.view().client_credit_status(&c).unwrap();
    assert_eq!(status.available_credit, 40.0);
    assert_eq!(status.used_credits, 60.0);
    assert_eq!(ledger.view().client_credit_balance(&c), 100.0);

    let err = ledger.view().client_credit_status("missing").unwrap_err();
    assert_eq!(err.code, ErrorCode::ClientNotFound);
}

// ========== Store ==========

#[test]
fn test_open_and_persist() {
    let store = MemoryStore::new();
    let mut ledger = Ledger::open(&store, LedgerConfig::from_lookup(|_| None)).unwrap();
    let c = add_client(&mut ledger, "Acme");
    let s = add_sale(&mut ledger, &c, date(2024, 1, 5), 1.0);
    ledger.persist(&store).unwrap();

    let reopened = Ledger::open(&store, LedgerConfig::from_lookup(|_| None)).unwrap();
    assert_eq!(reopened.snapshot(), ledger.snapshot());
    assert_eq!(reopened.view().sale(&s.id).unwrap().total_ttc, 1190.0);
}

#[test]
fn test_coerced_inputs_survive_json_reload() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path());
    let mut ledger = Ledger::open(&store, LedgerConfig::from_lookup(|_| None)).unwrap();
    let c = add_client(&mut ledger, "Acme");
    let s = ledger
        .add_sale(SaleDraft {
            client_id: c,
            date: date(2024, 1, 5),
            items: vec![LineItemDraft {
                description: "Galvanized coil".to_string(),
                quantity: f64::NAN,
                unit_price: 1000.0,
                ..Default::default()
            }],
            transportation_fee: -50.0,
            tax_rate: None,
            payment_method: None,
            notes: None,
        })
        .unwrap();
    ledger
        .update_sale(
            &s.id,
            SaleUpdate {
                transportation_fee: Some(f64::NEG_INFINITY),
                ..Default::default()
            },
        )
        .unwrap();
    ledger.persist(&store).unwrap();

    let reopened = Ledger::open(&store, LedgerConfig::from_lookup(|_| None)).unwrap();
    let stored = reopened.view().sale(&s.id).unwrap().clone();
    assert_eq!(stored.items[0].quantity, 0.0);
    assert_eq!(stored.transportation_fee, 0.0);
    assert_eq!(stored.total_ttc, 0.0);
    assert_eq!(reopened.snapshot(), ledger.snapshot());
}
