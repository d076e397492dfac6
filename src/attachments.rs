//! Attachment resolution
//!
//! Bridges order items (relational) to their binary files (blob store).
//! Documents resolve by the natural key written at order creation; merch
//! items prefer the design id assigned at upload time, falling back to the
//! natural key when that identifier is stale.

use crate::blob::{BlobKind, StoredBlob};
use crate::db::orders::OrderItemRow;
use crate::error::{AppError, AppResult};
use crate::models::{ItemKind, ItemOptions};
use crate::state::AppState;

/// Resolve the binary attachment of one order item.
pub fn resolve(state: &AppState, item: &OrderItemRow) -> AppResult<StoredBlob> {
    let kind = ItemKind::from_db(&item.kind)
        .ok_or_else(|| AppError::internal(format!("unknown item kind '{}'", item.kind)))?;

    let found = match kind {
        ItemKind::Document => {
            state
                .blob
                .find_by_natural_key(BlobKind::PrintFiles, &item.order_id, &item.id)?
        }
        ItemKind::Merch => {
            let options: ItemOptions = serde_json::from_str(&item.options)
                .map_err(|e| AppError::internal(format!("Corrupt item options: {e}")))?;
            state.blob.find_by_natural_key_or_design_id(
                BlobKind::MerchDesigns,
                &item.order_id,
                &item.id,
                options.design_id.as_deref(),
            )?
        }
        ItemKind::Service => None,
    };

    found.ok_or_else(|| AppError::not_found("attachment"))
}
