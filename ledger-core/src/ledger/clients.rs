//! Client operations

use shared::models::{Client, ClientCreate, ClientUpdate};
use shared::util::{new_id, now_millis};
use shared::{AppError, AppResult, ErrorCode};

use super::Ledger;
use crate::audit_log;

fn required_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            "Client name is required",
        )
        .with_detail("field", "name"));
    }
    Ok(name.to_string())
}

impl Ledger {
    pub fn add_client(&mut self, data: ClientCreate) -> AppResult<Client> {
        let client = Client {
            id: new_id(),
            name: required_name(&data.name)?,
            email: data.email,
            phone: data.phone,
            address: data.address,
            tax_id: data.tax_id,
            created_at: now_millis(),
        };

        tracing::info!(client_id = %client.id, name = %client.name, "Client added");
        self.snapshot.clients.push(client.clone());
        Ok(client)
    }

    pub fn update_client(&mut self, id: &str, data: ClientUpdate) -> AppResult<Client> {
        let idx = self.client_index(id)?;
        let name = data.name.as_deref().map(required_name).transpose()?;

        let client = &mut self.snapshot.clients[idx];
        if let Some(name) = name {
            client.name = name;
        }
        if let Some(email) = data.email {
            client.email = Some(email);
        }
        if let Some(phone) = data.phone {
            client.phone = Some(phone);
        }
        if let Some(address) = data.address {
            client.address = Some(address);
        }
        if let Some(tax_id) = data.tax_id {
            client.tax_id = Some(tax_id);
        }

        tracing::debug!(client_id = %id, "Client updated");
        Ok(client.clone())
    }

    /// Remove a client that has no live sales or invoices
    ///
    /// Archived rows keep pointing at the removed id; restoring them fails
    /// with `ClientNotFound`. The client's credit entries go with it.
    pub fn delete_client(&mut self, id: &str) -> AppResult<()> {
        let idx = self.client_index(id)?;
        let live_sales = self
            .snapshot
            .sales
            .iter()
            .filter(|s| s.is_active() && s.client_id == id)
            .count();
        let live_invoices = self
            .snapshot
            .invoices
            .iter()
            .filter(|i| i.is_active() && i.client_id == id)
            .count();
        if live_sales > 0 || live_invoices > 0 {
            tracing::warn!(
                client_id = %id,
                live_sales,
                live_invoices,
                "Refusing to delete client with sales"
            );
            return Err(AppError::new(ErrorCode::ClientHasSales)
                .with_detail("client_id", id)
                .with_detail("sales", live_sales)
                .with_detail("invoices", live_invoices));
        }

        let client = self.snapshot.clients.remove(idx);
        self.snapshot.credit_transactions.retain(|t| t.client_id != id);
        audit_log!("delete", format!("client:{}", client.id), client.name);
        Ok(())
    }
}
