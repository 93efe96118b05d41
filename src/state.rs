//! The dependency-injected container the UI layer holds. Wires the store,
//! the remote client, and the orchestrator; every cart mutation goes
//! through here so the follow-up evaluation is never forgotten.

use std::sync::Arc;
use std::time::Duration;

use crate::backup::{CartBackup, merge_cart_items};
use crate::client::{HttpPricingClient, PricingClient};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::gifts::{GiftSelectionSet, SelectionOutcome};
use crate::models::{CartLineItem, DiscountState, FreeGift};
use crate::orchestrator::{PricingView, PromoOrchestrator};
use crate::storage::{CartStorage, JsonFileStorage};
use crate::store::PersistedCartStore;
use crate::validation::classify_discount_rejection;

pub struct CartEngine {
    store: Arc<PersistedCartStore>,
    backup: CartBackup,
    client: Arc<dyn PricingClient>,
    orchestrator: PromoOrchestrator,
}

impl CartEngine {
    pub fn new(
        storage: Arc<dyn CartStorage>,
        client: Arc<dyn PricingClient>,
        debounce: Duration,
    ) -> Arc<Self> {
        let store = Arc::new(PersistedCartStore::new(Arc::clone(&storage)));
        let orchestrator = PromoOrchestrator::new(Arc::clone(&store), Arc::clone(&client), debounce);
        Arc::new(Self {
            store,
            backup: CartBackup::new(storage),
            client,
            orchestrator,
        })
    }

    /// Production wiring: file-backed storage and the HTTP authority client,
    /// both driven by `EngineConfig`.
    pub fn with_http_authority(config: &EngineConfig) -> EngineResult<Arc<Self>> {
        let storage = Arc::new(JsonFileStorage::new(&config.storage_dir)?);
        let client = Arc::new(HttpPricingClient::new(config)?);
        Ok(Self::new(
            storage,
            client,
            Duration::from_millis(config.debounce_ms),
        ))
    }

    // ---- cart mutations ------------------------------------------------

    pub fn add_item(&self, item: CartLineItem) {
        self.store.add_item(item);
        self.orchestrator.schedule();
    }

    pub fn update_quantity(&self, product_id: &str, quantity: u32, variant_id: Option<&str>) {
        self.store.update_quantity(product_id, quantity, variant_id);
        self.orchestrator.schedule();
    }

    pub fn remove_item(&self, product_id: &str, variant_id: Option<&str>) {
        self.store.remove_item(product_id, variant_id);
        self.orchestrator.schedule();
    }

    pub fn clear_cart(&self) {
        self.store.clear();
        self.orchestrator.reset();
    }

    /// Validates the code with the authority before caching it. A rejected
    /// code comes back as `EngineError::DiscountRejected` with the
    /// classified category; the cart keeps its previous discount state.
    pub async fn apply_discount_code(&self, code: &str) -> EngineResult<DiscountState> {
        let items = self.store.items();
        let subtotal = self.store.subtotal();
        let response = self.client.validate_discount(code, subtotal, &items).await?;

        if !response.is_valid {
            return Err(EngineError::DiscountRejected(classify_discount_rejection(
                response.error_code,
                response.error.as_deref(),
            )));
        }

        let code = response.code.as_deref().unwrap_or(code);
        let amount = response.discount_amount.unwrap_or(0);
        self.store.apply_discount_code(code, amount);
        self.orchestrator.schedule();
        Ok(DiscountState {
            code: code.to_string(),
            amount,
        })
    }

    pub fn remove_discount_code(&self) {
        self.store.remove_discount_code();
        self.orchestrator.schedule();
    }

    // ---- reads ---------------------------------------------------------

    pub fn items(&self) -> Vec<CartLineItem> {
        self.store.items()
    }

    pub fn discount(&self) -> Option<DiscountState> {
        self.store.discount()
    }

    pub fn pricing_view(&self) -> PricingView {
        self.orchestrator.pricing_view()
    }

    /// The authority's subtotal when an evaluation has landed, else the
    /// local fallback sum.
    pub fn current_subtotal(&self) -> i64 {
        self.orchestrator
            .pricing_view()
            .result
            .map(|r| r.pricing.subtotal)
            .unwrap_or_else(|| self.store.subtotal())
    }

    pub async fn eligible_gifts(&self) -> EngineResult<Vec<FreeGift>> {
        let items = self.store.items();
        let subtotal = self.store.subtotal();
        self.client.eligible_gifts(&items, subtotal).await
    }

    // ---- gift selection ------------------------------------------------

    pub fn gift_selections(&self) -> GiftSelectionSet {
        self.orchestrator.gift_selections()
    }

    pub fn select_gift(&self, promotion_id: &str, option_id: &str) -> SelectionOutcome {
        self.orchestrator.select_gift(promotion_id, option_id)
    }

    pub fn deselect_gift(&self, promotion_id: &str, option_id: &str) -> SelectionOutcome {
        self.orchestrator.deselect_gift(promotion_id, option_id)
    }

    pub fn submit_gift_selections(&self) -> bool {
        self.orchestrator.submit_gift_selections()
    }

    // ---- auth-redirect safety net --------------------------------------

    /// Snapshots the cart into the backup slot before handing control to
    /// the authentication flow.
    pub fn backup_for_login(&self) {
        self.backup.save(&self.store.items());
    }

    /// Merges the backed-up device cart into whatever the store holds now
    /// (typically the account cart loaded after login), then clears the
    /// backup slot.
    pub fn restore_after_login(&self) {
        let Some(saved) = self.backup.restore() else {
            return;
        };
        let merged = merge_cart_items(&self.store.items(), &saved);
        self.store.replace_items(merged);
        self.backup.clear();
        self.orchestrator.schedule();
    }

    // ---- evaluation control --------------------------------------------

    pub async fn evaluate_now(&self) {
        self.orchestrator.evaluate_now().await;
    }

    /// Awaits any pending debounced evaluation.
    pub async fn flush(&self) {
        self.orchestrator.flush().await;
    }
}
