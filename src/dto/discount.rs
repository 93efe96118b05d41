use serde::{Deserialize, Serialize};

use crate::models::CartLineItem;
use crate::validation::DiscountErrorCode;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateDiscountRequest<'a> {
    pub code: &'a str,
    pub subtotal: i64,
    pub items: &'a [CartLineItem],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateDiscountResponse {
    pub is_valid: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub discount_amount: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_code: Option<DiscountErrorCode>,
}
