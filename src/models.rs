//! Domain model types shared across the cart, checkout and order modules

use serde::{Deserialize, Serialize};

/// What a line item sells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Uploaded print job priced per page
    Document,
    /// Custom-design merchandise at the policy-fixed price
    Merch,
    /// Catalog service at its listed price
    Service,
}

impl ItemKind {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Merch => "merch",
            Self::Service => "service",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "document" => Some(Self::Document),
            "merch" => Some(Self::Merch),
            "service" => Some(Self::Service),
            _ => None,
        }
    }
}

/// Order lifecycle status
///
/// PROCESSING -> COMPLETED is a manual staff action outside this service;
/// checkout creates orders directly at PROCESSING, so PENDING is only ever
/// seen for orders staged outside the checkout path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending = 1,
    Processing = 2,
    Completed = 3,
    Cancelled = 4,
}

impl OrderStatus {
    pub fn as_db(&self) -> i64 {
        *self as i64
    }

    pub fn from_db(v: i64) -> Option<Self> {
        match v {
            1 => Some(Self::Pending),
            2 => Some(Self::Processing),
            3 => Some(Self::Completed),
            4 => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Terminal states never regress, whatever events arrive afterwards
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Payment status strings stored on the payments table
pub mod payment_status {
    pub const PENDING: &str = "pending";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
}

/// Kind-specific line item options
///
/// Binary payloads (`file_data`, `design_data`) travel inside the session
/// cart only; they are stripped before anything is sent to the gateway or
/// written to the order_items table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemOptions {
    // document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copies: Option<i64>,
    /// Comma-separated page ranges, e.g. "1-3,5"; empty means whole document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub double_sided: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Raw uploaded file, base64
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,

    // merch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design_id: Option<String>,
    /// Generated design image, base64
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design_data: Option<String>,

    // service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ItemOptions {
    /// Copy with binary payloads removed; the only shape that may leave
    /// the session store.
    pub fn stripped(&self) -> Self {
        Self {
            file_data: None,
            design_data: None,
            ..self.clone()
        }
    }

    pub fn has_binary_payload(&self) -> bool {
        self.file_data.is_some() || self.design_data.is_some()
    }
}

/// One prospective purchase in a user's session cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub service_id: String,
    pub kind: ItemKind,
    pub name: String,
    pub unit_price: f64,
    pub quantity: i64,
    #[serde(default)]
    pub options: ItemOptions,
}

impl CartItem {
    pub fn stripped(&self) -> Self {
        Self {
            options: self.options.stripped(),
            ..self.clone()
        }
    }
}

/// Immutable cart snapshot taken when checkout begins; consumed exactly
/// once by order creation.
#[derive(Debug, Clone)]
pub struct PendingCart {
    pub items: Vec<CartItem>,
    /// Correlation token embedded in the gateway success URL
    pub token: String,
    pub created_at: i64,
}
