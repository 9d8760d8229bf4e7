use async_trait::async_trait;
use portfolio_listings::error::FETCH_FAILURE_FALLBACK;
use portfolio_listings::listings::{ChangeCallback, ChangeSubscription};
use portfolio_listings::prelude::*;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

fn deal(id: &str, name: &str, city: &str, state: &str) -> Deal {
    serde_json::from_value(json!({
        "uuid": id,
        "deal_name": name,
        "city": city,
        "state": state,
        "deal_type": null,
        "needs": null,
        "asking": null,
        "public_status": true,
        "public_info": null,
        "created_at": "2024-01-01T00:00:00+00:00",
        "updated_at": "2024-01-01T00:00:00+00:00"
    }))
    .unwrap()
}

/// Source that replays scripted results and reports each call
struct ScriptedSource {
    calls: Arc<AtomicUsize>,
    responses: Mutex<VecDeque<Result<Vec<Deal>, Error>>>,
    fetched: mpsc::UnboundedSender<usize>,
}

impl ScriptedSource {
    fn new(
        responses: Vec<Result<Vec<Deal>, Error>>,
    ) -> (Self, Arc<AtomicUsize>, mpsc::UnboundedReceiver<usize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::unbounded_channel();
        let source = Self {
            calls: calls.clone(),
            responses: Mutex::new(responses.into()),
            fetched: tx,
        };
        (source, calls, rx)
    }
}

#[async_trait]
impl DealSource for ScriptedSource {
    async fn fetch_public_deals(&self) -> Result<Vec<Deal>, Error> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.fetched.send(n);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Feed that keeps the registered callback so tests can fire it by hand
#[derive(Clone, Default)]
struct ManualFeed {
    callback: Arc<Mutex<Option<ChangeCallback>>>,
    registrations: Arc<AtomicUsize>,
    unsubscribed: Arc<AtomicBool>,
}

impl ManualFeed {
    fn fire(&self) {
        let callback = self.callback.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

struct ManualSubscription {
    unsubscribed: Arc<AtomicBool>,
}

impl ChangeSubscription for ManualSubscription {
    fn unsubscribe(self: Box<Self>) {
        self.unsubscribed.store(true, Ordering::SeqCst);
    }
}

impl ChangeFeed for ManualFeed {
    fn on_change(&self, callback: ChangeCallback) -> Result<Box<dyn ChangeSubscription>, Error> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        *self.callback.lock().unwrap() = Some(callback);
        Ok(Box::new(ManualSubscription {
            unsubscribed: self.unsubscribed.clone(),
        }))
    }
}

struct BrokenFeed;

impl ChangeFeed for BrokenFeed {
    fn on_change(&self, _callback: ChangeCallback) -> Result<Box<dyn ChangeSubscription>, Error> {
        Err(Error::realtime("socket unavailable"))
    }
}

#[tokio::test]
async fn test_mount_loads_deals_and_registers_once() {
    let (source, calls, _rx) = ScriptedSource::new(vec![Ok(vec![
        deal("2", "Lakeside", "Madison", "WI"),
        deal("1", "Ridge", "Boise", "ID"),
    ])]);
    let feed = ManualFeed::default();
    let mut view = ListingsView::new(source, feed.clone());

    let before = view.snapshot().await;
    assert!(before.loading);
    assert!(before.deals.is_empty());
    assert_eq!(before.selected_state, ALL_STATES);

    view.mount().await;
    view.mount().await;

    let snapshot = view.snapshot().await;
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.deals.len(), 2);
    assert_eq!(snapshot.deals[0].name, "Lakeside");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(feed.registrations.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_fetch_keeps_previous_deals() {
    let (source, _calls, _rx) = ScriptedSource::new(vec![
        Ok(vec![deal("1", "Ridge", "Boise", "ID")]),
        Err(Error::database("permission denied for table deals")),
    ]);
    let mut view = ListingsView::new(source, ManualFeed::default());

    view.mount().await;
    let loaded = view.snapshot().await;

    view.fetch_all().await;
    let failed = view.snapshot().await;

    assert!(!failed.loading);
    assert_eq!(failed.error.as_deref(), Some("permission denied for table deals"));
    assert_eq!(failed.deals, loaded.deals);
}

#[tokio::test]
async fn test_first_fetch_failure_uses_fallback_message() {
    let (source, _calls, _rx) = ScriptedSource::new(vec![Err(Error::database(""))]);
    let mut view = ListingsView::new(source, ManualFeed::default());

    view.mount().await;
    let snapshot = view.snapshot().await;

    assert!(!snapshot.loading);
    assert_eq!(snapshot.error.as_deref(), Some(FETCH_FAILURE_FALLBACK));
    assert!(snapshot.deals.is_empty());
    assert!(render_page(&snapshot).contains("Please try again later."));
}

#[tokio::test]
async fn test_successful_fetch_clears_error() {
    let (source, _calls, _rx) = ScriptedSource::new(vec![
        Err(Error::database("timeout")),
        Ok(vec![deal("1", "Ridge", "Boise", "ID")]),
    ]);
    let mut view = ListingsView::new(source, ManualFeed::default());

    view.mount().await;
    assert!(view.snapshot().await.error.is_some());

    view.fetch_all().await;
    let snapshot = view.snapshot().await;
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.deals.len(), 1);
}

#[tokio::test]
async fn test_notification_triggers_exactly_one_fetch() {
    let (source, calls, mut fetched) = ScriptedSource::new(vec![
        Ok(vec![deal("1", "Ridge", "Boise", "ID")]),
        Ok(vec![
            deal("2", "Lakeside", "Madison", "WI"),
            deal("1", "Ridge", "Boise", "ID"),
        ]),
    ]);
    let feed = ManualFeed::default();
    let mut view = ListingsView::new(source, feed.clone());
    let mut revisions = view.watch();

    view.mount().await;
    assert_eq!(fetched.recv().await, Some(1));
    revisions.borrow_and_update();

    feed.fire();
    let second = timeout(Duration::from_secs(2), fetched.recv())
        .await
        .expect("notification should trigger a fetch");
    assert_eq!(second, Some(2));

    timeout(Duration::from_secs(2), revisions.changed())
        .await
        .expect("refetch should publish a new revision")
        .unwrap();
    assert_eq!(view.snapshot().await.deals.len(), 2);

    sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_no_fetch_after_unmount() {
    let (source, calls, _rx) = ScriptedSource::new(vec![Ok(Vec::new())]);
    let feed = ManualFeed::default();
    let mut view = ListingsView::new(source, feed.clone());

    view.mount().await;
    view.unmount();
    assert!(!view.is_mounted());
    assert!(feed.unsubscribed.load(Ordering::SeqCst));

    // a notification that was already in flight when the view unmounted
    feed.fire();
    sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_drop_deregisters_listener() {
    let (source, _calls, _rx) = ScriptedSource::new(Vec::new());
    let feed = ManualFeed::default();

    {
        let mut view = ListingsView::new(source, feed.clone());
        view.mount().await;
        assert!(!feed.unsubscribed.load(Ordering::SeqCst));
    }

    assert!(feed.unsubscribed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_view_works_without_live_updates() {
    let (source, calls, _rx) = ScriptedSource::new(vec![Ok(vec![deal("1", "Ridge", "Boise", "ID")])]);
    let mut view = ListingsView::new(source, BrokenFeed);

    view.mount().await;
    let snapshot = view.snapshot().await;
    assert!(!snapshot.loading);
    assert_eq!(snapshot.deals.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_snapshot_applies_search_and_state() {
    let (source, _calls, _rx) = ScriptedSource::new(vec![Ok(vec![
        deal("1", "Lakeside Flats", "Madison", "WI"),
        deal("2", "Lake Shore Retail", "Chicago", "IL"),
        deal("3", "Ridge", "Boise", "ID"),
        deal("4", "Capitol Offices", "Madison", "WI"),
    ])]);
    let mut view = ListingsView::new(source, ManualFeed::default());
    view.mount().await;

    view.set_search("LAKE");
    let names: Vec<String> = view
        .snapshot()
        .await
        .filtered_deals()
        .into_iter()
        .map(|d| d.name.clone())
        .collect();
    assert_eq!(names, vec!["Lakeside Flats", "Lake Shore Retail"]);

    view.select_state("WI");
    let snapshot = view.snapshot().await;
    let filtered = snapshot.filtered_deals();
    let names: Vec<&str> = filtered.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Lakeside Flats"]);
    assert_eq!(snapshot.state_options(), vec!["All States", "ID", "IL", "WI"]);

    view.set_search("");
    view.select_state(ALL_STATES);
    assert_eq!(view.snapshot().await.filtered_deals().len(), 4);
}
