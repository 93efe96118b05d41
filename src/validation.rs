//! Classification of remote-authority failures into user-facing categories
//! and their reconciliation actions. Pure functions, no state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartItemIssueCode {
    ProductNotFound,
    ProductInactive,
    OutOfStock,
    InsufficientStock,
}

/// One problem the authority reported for a cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemIssue {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub code: CartItemIssueCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileAction {
    /// Drop the line from the cart on the next reconciliation.
    Remove,
    /// Clamp the line's quantity down to what is actually available.
    ClampQuantity(u32),
}

pub fn reconcile_action(issue: &CartItemIssue) -> ReconcileAction {
    match issue.code {
        CartItemIssueCode::ProductNotFound
        | CartItemIssueCode::ProductInactive
        | CartItemIssueCode::OutOfStock => ReconcileAction::Remove,
        // Quantity stays >= 1; a fully unavailable line arrives as out_of_stock.
        CartItemIssueCode::InsufficientStock => {
            ReconcileAction::ClampQuantity(issue.available_quantity.unwrap_or(1).max(1))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountErrorCode {
    InvalidCode,
    Expired,
    UsageLimitReached,
    MinPurchaseNotMet,
    NotApplicable,
    NotStarted,
    /// Anything the authority sends that we do not recognize.
    #[serde(other)]
    Unknown,
}

impl DiscountErrorCode {
    pub fn message(self) -> &'static str {
        match self {
            DiscountErrorCode::InvalidCode => "This discount code is not valid.",
            DiscountErrorCode::Expired => "This discount code has expired.",
            DiscountErrorCode::UsageLimitReached => {
                "This discount code has reached its usage limit."
            }
            DiscountErrorCode::MinPurchaseNotMet => {
                "Your order does not meet the minimum purchase for this code."
            }
            DiscountErrorCode::NotApplicable => {
                "This discount code cannot be applied to the items in your cart."
            }
            DiscountErrorCode::NotStarted => "This discount code is not active yet.",
            DiscountErrorCode::Unknown => "Unable to apply this discount code.",
        }
    }
}

/// A rejected discount code, classified for display.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountRejection {
    pub code: DiscountErrorCode,
    pub message: String,
}

/// Folds the authority's rejection into a display category. The raw server
/// message is logged but never shown; unrecognized codes fall back to the
/// generic category.
pub fn classify_discount_rejection(
    error_code: Option<DiscountErrorCode>,
    server_message: Option<&str>,
) -> DiscountRejection {
    let code = error_code.unwrap_or(DiscountErrorCode::Unknown);
    if let Some(raw) = server_message {
        tracing::debug!(?code, raw, "discount rejected by authority");
    }
    DiscountRejection {
        code,
        message: code.message().to_string(),
    }
}
