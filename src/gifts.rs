//! Free-gift selection. Each promotion that offers a choice of gifts gets
//! its own quota-bounded selection; the set across promotions decides when
//! the choices may be submitted back into the evaluation cycle.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::{GiftOption, PromotionalCartResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Unfilled,
    PartiallyFilled,
    Filled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    Added,
    Removed,
    /// Quota exhausted; the selection set is unchanged. The UI disables the
    /// option rather than swapping out an existing choice.
    QuotaReached,
    AlreadySelected,
    NotSelected,
    UnknownOption,
    UnknownPromotion,
}

/// Finalized choices for one promotion, as sent to the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftSelectionSubmission {
    pub promotion_id: String,
    pub option_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GiftSelection {
    promotion_id: String,
    max_selections: u32,
    options: Vec<GiftOption>,
    selected: BTreeSet<String>,
}

impl GiftSelection {
    pub fn new(promotion_id: String, max_selections: u32, options: Vec<GiftOption>) -> Self {
        Self {
            promotion_id,
            max_selections,
            options,
            selected: BTreeSet::new(),
        }
    }

    pub fn promotion_id(&self) -> &str {
        &self.promotion_id
    }

    pub fn options(&self) -> &[GiftOption] {
        &self.options
    }

    pub fn state(&self) -> SelectionState {
        if self.selected.is_empty() {
            SelectionState::Unfilled
        } else if (self.selected.len() as u32) < self.max_selections {
            SelectionState::PartiallyFilled
        } else {
            SelectionState::Filled
        }
    }

    pub fn selections_remaining(&self) -> u32 {
        self.max_selections - self.selected.len() as u32
    }

    pub fn is_selected(&self, option_id: &str) -> bool {
        self.selected.contains(option_id)
    }

    pub fn select(&mut self, option_id: &str) -> SelectionOutcome {
        if !self.options.iter().any(|o| o.id == option_id) {
            return SelectionOutcome::UnknownOption;
        }
        if self.selected.contains(option_id) {
            return SelectionOutcome::AlreadySelected;
        }
        if self.selections_remaining() == 0 {
            return SelectionOutcome::QuotaReached;
        }
        self.selected.insert(option_id.to_string());
        SelectionOutcome::Added
    }

    pub fn deselect(&mut self, option_id: &str) -> SelectionOutcome {
        if self.selected.remove(option_id) {
            SelectionOutcome::Removed
        } else {
            SelectionOutcome::NotSelected
        }
    }

    pub fn submission(&self) -> GiftSelectionSubmission {
        GiftSelectionSubmission {
            promotion_id: self.promotion_id.clone(),
            option_ids: self.selected.iter().cloned().collect(),
        }
    }

    /// Carries over previously selected option ids that still exist in this
    /// option set, truncated to the quota. Everything else drops: a new
    /// cart state invalidates old option sets.
    fn carry_over(&mut self, previous: &GiftSelection) {
        for id in &previous.selected {
            if self.selections_remaining() == 0 {
                break;
            }
            if self.options.iter().any(|o| o.id == *id) {
                self.selected.insert(id.clone());
            }
        }
    }
}

/// Selection state across all promotions of the latest evaluation,
/// keyed by promotion id.
#[derive(Debug, Clone, Default)]
pub struct GiftSelectionSet {
    selections: BTreeMap<String, GiftSelection>,
}

impl GiftSelectionSet {
    /// Builds the set for a freshly applied result, carrying over whatever
    /// survives from the previous set.
    pub fn rebuild(previous: &GiftSelectionSet, result: &PromotionalCartResult) -> GiftSelectionSet {
        let mut selections = BTreeMap::new();
        for promotion in &result.applied_promotions {
            let quota = promotion.max_selections.unwrap_or(0);
            if quota == 0 || promotion.gift_options.is_empty() {
                continue;
            }
            let mut selection = GiftSelection::new(
                promotion.promotion_id.clone(),
                quota,
                promotion.gift_options.clone(),
            );
            if let Some(old) = previous.selections.get(&promotion.promotion_id) {
                selection.carry_over(old);
            }
            selections.insert(promotion.promotion_id.clone(), selection);
        }
        GiftSelectionSet { selections }
    }

    pub fn select(&mut self, promotion_id: &str, option_id: &str) -> SelectionOutcome {
        match self.selections.get_mut(promotion_id) {
            Some(selection) => selection.select(option_id),
            None => SelectionOutcome::UnknownPromotion,
        }
    }

    pub fn deselect(&mut self, promotion_id: &str, option_id: &str) -> SelectionOutcome {
        match self.selections.get_mut(promotion_id) {
            Some(selection) => selection.deselect(option_id),
            None => SelectionOutcome::UnknownPromotion,
        }
    }

    pub fn get(&self, promotion_id: &str) -> Option<&GiftSelection> {
        self.selections.get(promotion_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GiftSelection> {
        self.selections.values()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn all_filled(&self) -> bool {
        self.selections
            .values()
            .all(|s| s.state() == SelectionState::Filled)
    }

    /// The finalized submissions, only once every promotion offering a
    /// choice is `Filled`. An incomplete selection is never submitted.
    pub fn submissions(&self) -> Option<Vec<GiftSelectionSubmission>> {
        if !self.all_filled() {
            return None;
        }
        Some(self.selections.values().map(GiftSelection::submission).collect())
    }
}
