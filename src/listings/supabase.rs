//! Supabase-backed collaborators for the listings view

use async_trait::async_trait;
use tracing::debug;

use crate::error::Error;
use crate::listings::deal::{Deal, DEALS_TABLE};
use crate::listings::source::{ChangeCallback, ChangeFeed, ChangeSubscription, DealSource};
use crate::postgrest::{Filter, SortOrder};
use crate::realtime::{PostgresChanges, RealtimeClient, Subscription};
use crate::Supabase;

/// Channel name used for deal change notifications
pub const DEALS_CHANNEL: &str = "deals_changes";

fn public_filter() -> Filter {
    Filter::eq("public_status", true)
}

/// Reads public deals through PostgREST
#[derive(Clone)]
pub struct PostgrestDealSource {
    supabase: Supabase,
}

impl PostgrestDealSource {
    pub fn new(supabase: &Supabase) -> Self {
        Self {
            supabase: supabase.clone(),
        }
    }
}

#[async_trait]
impl DealSource for PostgrestDealSource {
    async fn fetch_public_deals(&self) -> Result<Vec<Deal>, Error> {
        self.supabase
            .from(DEALS_TABLE)
            .select("*")
            .filter(&public_filter())
            .order("created_at", SortOrder::Descending)
            .execute::<Deal>()
            .await
    }
}

/// Change notifications from the realtime `deals_changes` channel
#[derive(Clone)]
pub struct RealtimeChangeFeed {
    realtime: RealtimeClient,
}

impl RealtimeChangeFeed {
    pub fn new(supabase: &Supabase) -> Self {
        Self {
            realtime: supabase.realtime(),
        }
    }
}

impl ChangeFeed for RealtimeChangeFeed {
    fn on_change(&self, callback: ChangeCallback) -> Result<Box<dyn ChangeSubscription>, Error> {
        let subscription = self
            .realtime
            .channel(DEALS_CHANNEL)
            .on_postgres_changes(
                PostgresChanges::new(DEALS_TABLE).filter(public_filter()),
                move |change| {
                    debug!(event_type = ?change.event_type, "deals changed");
                    callback();
                },
            )
            .subscribe()?;

        Ok(Box::new(subscription))
    }
}

impl ChangeSubscription for Subscription {
    fn unsubscribe(self: Box<Self>) {
        Subscription::unsubscribe(*self);
    }
}
