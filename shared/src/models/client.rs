//! Client Model

use serde::{Deserialize, Serialize};

/// Client - a buyer of steel coils
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Fiscal identifier printed on invoices
    pub tax_id: Option<String>,
    /// Unix millis
    pub created_at: i64,
}

/// Create client payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCreate {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}

/// Update client payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
}
