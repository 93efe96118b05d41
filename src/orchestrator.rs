//! Keeps a render-ready `PromotionalCartResult` in sync with the cart.
//! Mutations schedule a debounced evaluation; overlapping evaluations are
//! resolved by initiation order, so a slow stale response can never clobber
//! a fresher one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::client::PricingClient;
use crate::gifts::{GiftSelectionSet, GiftSelectionSubmission, SelectionOutcome};
use crate::models::PromotionalCartResult;
use crate::store::PersistedCartStore;

/// Snapshot handed to the UI. `result` is `None` until the first
/// evaluation lands; `evaluation_failed` flags a degraded (stale) price.
#[derive(Debug, Clone, Default)]
pub struct PricingView {
    pub result: Option<PromotionalCartResult>,
    pub evaluation_failed: bool,
}

#[derive(Default)]
struct ViewInner {
    result: Option<PromotionalCartResult>,
    evaluation_failed: bool,
    applied_seq: u64,
    gifts: GiftSelectionSet,
    finalized: Vec<GiftSelectionSubmission>,
}

struct PendingTask {
    handle: JoinHandle<()>,
    fired: Arc<AtomicBool>,
}

struct Inner {
    store: Arc<PersistedCartStore>,
    client: Arc<dyn PricingClient>,
    debounce: Duration,
    next_seq: AtomicU64,
    latest_seq: AtomicU64,
    view: Mutex<ViewInner>,
    pending: Mutex<Option<PendingTask>>,
}

pub struct PromoOrchestrator {
    inner: Arc<Inner>,
}

impl PromoOrchestrator {
    pub fn new(
        store: Arc<PersistedCartStore>,
        client: Arc<dyn PricingClient>,
        debounce: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                client,
                debounce,
                next_seq: AtomicU64::new(0),
                latest_seq: AtomicU64::new(0),
                view: Mutex::new(ViewInner::default()),
                pending: Mutex::new(None),
            }),
        }
    }

    /// Schedules a trailing-edge evaluation, replacing any previously
    /// scheduled task that has not fired yet. Rapid-fire mutations thus
    /// coalesce into one remote call.
    pub fn schedule(&self) {
        Inner::schedule(&self.inner);
    }

    /// Runs one evaluation immediately, outside the debounce window.
    pub async fn evaluate_now(&self) {
        let seq = self.inner.begin();
        Inner::run(Arc::clone(&self.inner), seq).await;
    }

    /// Awaits the most recently scheduled evaluation, if any.
    pub async fn flush(&self) {
        let task = { self.inner.pending.lock().unwrap().take() };
        if let Some(task) = task {
            let _ = task.handle.await;
        }
    }

    /// Drops all derived state and invalidates in-flight evaluations.
    pub fn reset(&self) {
        if let Some(prev) = self.inner.pending.lock().unwrap().take() {
            prev.handle.abort();
        }
        let seq = self.inner.begin();
        let mut view = self.inner.view.lock().unwrap();
        view.applied_seq = seq;
        view.result = None;
        view.evaluation_failed = false;
        view.gifts = GiftSelectionSet::default();
        view.finalized.clear();
    }

    pub fn pricing_view(&self) -> PricingView {
        let view = self.inner.view.lock().unwrap();
        PricingView {
            result: view.result.clone(),
            evaluation_failed: view.evaluation_failed,
        }
    }

    pub fn gift_selections(&self) -> GiftSelectionSet {
        self.inner.view.lock().unwrap().gifts.clone()
    }

    pub fn select_gift(&self, promotion_id: &str, option_id: &str) -> SelectionOutcome {
        self.inner
            .view
            .lock()
            .unwrap()
            .gifts
            .select(promotion_id, option_id)
    }

    pub fn deselect_gift(&self, promotion_id: &str, option_id: &str) -> SelectionOutcome {
        self.inner
            .view
            .lock()
            .unwrap()
            .gifts
            .deselect(promotion_id, option_id)
    }

    /// Submits the finalized gift choices into the next evaluation round.
    /// Returns false (and submits nothing) while any promotion offering a
    /// choice is still unfilled.
    pub fn submit_gift_selections(&self) -> bool {
        let ready = {
            let mut view = self.inner.view.lock().unwrap();
            match view.gifts.submissions() {
                Some(submissions) => {
                    view.finalized = submissions;
                    true
                }
                None => false,
            }
        };
        if ready {
            Inner::schedule(&self.inner);
        }
        ready
    }
}

impl Inner {
    /// Hands out the next sequence number and marks it as the most recently
    /// initiated evaluation. Only a result carrying the latest number may
    /// be applied.
    fn begin(&self) -> u64 {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest_seq.store(seq, Ordering::SeqCst);
        seq
    }

    fn schedule(this: &Arc<Inner>) {
        let fired = Arc::new(AtomicBool::new(false));
        let task_this = Arc::clone(this);
        let task_fired = Arc::clone(&fired);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(task_this.debounce).await;
            task_fired.store(true, Ordering::SeqCst);
            let seq = task_this.begin();
            Inner::run(task_this, seq).await;
        });

        let mut pending = this.pending.lock().unwrap();
        if let Some(prev) = pending.take()
            && !prev.fired.load(Ordering::SeqCst)
        {
            prev.handle.abort();
        }
        *pending = Some(PendingTask { handle, fired });
    }

    async fn run(this: Arc<Inner>, seq: u64) {
        let items = this.store.items();
        if items.is_empty() {
            // Nothing to price remotely; this also drops cached eligibility.
            let mut view = this.view.lock().unwrap();
            if seq == this.latest_seq.load(Ordering::SeqCst) && seq > view.applied_seq {
                view.applied_seq = seq;
                view.result = None;
                view.evaluation_failed = false;
                view.gifts = GiftSelectionSet::default();
                view.finalized.clear();
            }
            return;
        }

        let discount = this.store.discount();
        let finalized = { this.view.lock().unwrap().finalized.clone() };

        tracing::info!(seq, items = items.len(), "evaluating cart with pricing authority");
        match this
            .client
            .evaluate(&items, discount.as_ref().map(|d| d.code.as_str()), &finalized)
            .await
        {
            Ok(result) => Inner::apply(&this, seq, result),
            Err(err) => {
                // Keep the previous known-good pricing; just flag the view.
                if seq == this.latest_seq.load(Ordering::SeqCst) {
                    this.view.lock().unwrap().evaluation_failed = true;
                }
                tracing::warn!(seq, error = %err, "cart evaluation failed");
            }
        }
    }

    fn apply(this: &Arc<Inner>, seq: u64, result: PromotionalCartResult) {
        if seq != this.latest_seq.load(Ordering::SeqCst) {
            tracing::warn!(seq, "discarding superseded evaluation result");
            return;
        }
        {
            let mut view = this.view.lock().unwrap();
            if seq <= view.applied_seq {
                return;
            }
            view.applied_seq = seq;
            view.evaluation_failed = false;
            view.gifts = GiftSelectionSet::rebuild(&view.gifts, &result);
            view.finalized = view.gifts.submissions().unwrap_or_default();
            view.result = Some(result.clone());
        }

        // Stock and validity verdicts fold back into the cart; if that
        // changed anything the new contents need repricing.
        if this.store.apply_reconciliation(&result.item_issues) {
            tracing::info!(seq, "cart changed during reconciliation, re-evaluating");
            Inner::schedule(this);
        }
    }
}
