//! The listings view: loaded deals, live refresh and filter controls

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{watch, RwLock};
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::listings::deal::Deal;
use crate::listings::filter::{self, ALL_STATES};
use crate::listings::price::format_price;
use crate::listings::source::{ChangeCallback, ChangeFeed, ChangeSubscription, DealSource};

/// Everything needed to render the page at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct ListingsSnapshot {
    /// True until the first fetch settles
    pub loading: bool,
    /// Message from the most recent failed fetch, cleared on success
    pub error: Option<String>,
    pub deals: Vec<Deal>,
    pub search: String,
    pub selected_state: String,
}

impl ListingsSnapshot {
    /// Dropdown entries: `"All States"` then each distinct state
    pub fn state_options(&self) -> Vec<String> {
        filter::state_options(&self.deals)
    }

    /// Deals matching the current search text and state selection
    pub fn filtered_deals(&self) -> Vec<&Deal> {
        filter::filter_deals(&self.deals, &self.search, &self.selected_state)
    }

    /// Price label for a deal's asking value
    pub fn price_label(deal: &Deal) -> String {
        format_price(deal.asking.as_deref())
    }
}

#[derive(Debug)]
struct LoadState {
    loading: bool,
    error: Option<String>,
    deals: Vec<Deal>,
}

struct Shared {
    state: RwLock<LoadState>,
    /// Cleared on unmount; late notifications are ignored
    active: AtomicBool,
    /// Bumped every time a fetch result is applied
    revision: watch::Sender<u64>,
}

/// View over the public deals.
///
/// Mounting performs one fetch and registers one change listener; every
/// notification triggers a full refetch. Overlapping fetches are not
/// sequenced, so the one that resolves last wins.
pub struct ListingsView<S, F>
where
    S: DealSource + 'static,
    F: ChangeFeed,
{
    source: Arc<S>,
    feed: F,
    shared: Arc<Shared>,
    subscription: Option<Box<dyn ChangeSubscription>>,
    search: String,
    selected_state: String,
}

impl<S, F> ListingsView<S, F>
where
    S: DealSource + 'static,
    F: ChangeFeed,
{
    pub fn new(source: S, feed: F) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            source: Arc::new(source),
            feed,
            shared: Arc::new(Shared {
                state: RwLock::new(LoadState {
                    loading: true,
                    error: None,
                    deals: Vec::new(),
                }),
                active: AtomicBool::new(false),
                revision,
            }),
            subscription: None,
            search: String::new(),
            selected_state: ALL_STATES.to_string(),
        }
    }

    /// Register the change listener and load the deals.
    ///
    /// A listener that cannot be registered is logged and the view keeps
    /// working without live updates. Mounting twice is a no-op.
    pub async fn mount(&mut self) {
        if self.shared.active.swap(true, Ordering::SeqCst) {
            warn!("listings view already mounted");
            return;
        }

        match self.subscribe_to_changes() {
            Ok(subscription) => self.subscription = Some(subscription),
            Err(e) => warn!(error = %e, "live updates unavailable"),
        }

        self.fetch_all().await;
        info!("listings view mounted");
    }

    /// Deregister the change listener. Notifications arriving afterwards do
    /// not trigger fetches; in-flight fetches still complete.
    pub fn unmount(&mut self) {
        self.shared.active.store(false, Ordering::SeqCst);
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            info!("listings view unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Fetch all public deals and apply the result.
    ///
    /// Success replaces the loaded deals and clears the error; failure stores
    /// a display message and keeps the previous deals. Either way loading ends.
    pub async fn fetch_all(&self) {
        refresh(self.source.as_ref(), &self.shared).await;
    }

    /// Register a listener that refetches on every change notification
    pub fn subscribe_to_changes(&self) -> Result<Box<dyn ChangeSubscription>, Error> {
        let runtime = Handle::try_current()
            .map_err(|_| Error::general("change listener requires a Tokio runtime"))?;
        let source = Arc::clone(&self.source);
        let shared = Arc::clone(&self.shared);

        let callback: ChangeCallback = Arc::new(move || {
            if !shared.active.load(Ordering::SeqCst) {
                debug!("change notification ignored, view is not mounted");
                return;
            }
            let source = Arc::clone(&source);
            let shared = Arc::clone(&shared);
            runtime.spawn(async move {
                refresh(source.as_ref(), &shared).await;
            });
        });

        self.feed.on_change(callback)
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
    }

    pub fn select_state(&mut self, state: impl Into<String>) {
        self.selected_state = state.into();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn selected_state(&self) -> &str {
        &self.selected_state
    }

    /// Receiver whose value changes each time a fetch result is applied
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    pub async fn snapshot(&self) -> ListingsSnapshot {
        let state = self.shared.state.read().await;
        ListingsSnapshot {
            loading: state.loading,
            error: state.error.clone(),
            deals: state.deals.clone(),
            search: self.search.clone(),
            selected_state: self.selected_state.clone(),
        }
    }
}

impl<S, F> Drop for ListingsView<S, F>
where
    S: DealSource + 'static,
    F: ChangeFeed,
{
    fn drop(&mut self) {
        self.unmount();
    }
}

async fn refresh<S: DealSource + ?Sized>(source: &S, shared: &Shared) {
    let result = source.fetch_public_deals().await;

    {
        let mut state = shared.state.write().await;
        match result {
            Ok(deals) => {
                debug!(count = deals.len(), "deals loaded");
                state.deals = deals;
                state.error = None;
            }
            Err(e) => {
                error!(error = %e, "Error fetching deals");
                state.error = Some(e.user_message());
            }
        }
        state.loading = false;
    }

    shared.revision.send_modify(|revision| *revision += 1);
}
