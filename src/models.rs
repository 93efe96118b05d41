use serde::{Deserialize, Serialize};

use crate::validation::CartItemIssue;

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Unit price in minor currency units.
    pub price: i64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Complimentary gift attached to this specific line, distinct from
    /// promotion-wide free gifts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_gift: Option<AttachedGift>,
}

impl CartLineItem {
    /// Cart identity of this line. No two lines in a cart share a key.
    pub fn key(&self) -> (&str, Option<&str>) {
        (self.product_id.as_str(), self.variant_id.as_deref())
    }

    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedGift {
    pub name: String,
    pub value: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// The one discount code the cart may carry, with its last-known amount.
/// The amount is optimistic between re-validations; the authority's
/// evaluation supersedes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountState {
    pub code: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeGift {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub value: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Candidate SKU in a promotion's selectable-gift set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftOption {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedPromotion {
    pub promotion_id: String,
    pub promotion_name: String,
    #[serde(default)]
    pub discount_amount: i64,
    #[serde(default)]
    pub free_gifts: Vec<FreeGift>,
    /// Selection quota for promotions that let the shopper choose.
    /// Absent (or zero) means gifts are granted without a choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_selections: Option<u32>,
    #[serde(default)]
    pub gift_options: Vec<GiftOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPricing {
    pub subtotal: i64,
    #[serde(default)]
    pub discount_amount: i64,
}

/// The authority's derived snapshot for the current cart contents.
/// Never persisted; recomputed after every cart mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionalCartResult {
    pub pricing: CartPricing,
    #[serde(default)]
    pub applied_promotions: Vec<AppliedPromotion>,
    #[serde(default)]
    pub free_gifts: Vec<FreeGift>,
    #[serde(default)]
    pub item_issues: Vec<CartItemIssue>,
}
