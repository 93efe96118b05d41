use serde::Serialize;

use crate::gifts::GiftSelectionSubmission;
use crate::models::CartLineItem;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibleGiftsRequest<'a> {
    pub items: &'a [CartLineItem],
    pub subtotal: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateCartRequest<'a> {
    pub items: &'a [CartLineItem],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<&'a str>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub gift_selections: &'a [GiftSelectionSubmission],
}
