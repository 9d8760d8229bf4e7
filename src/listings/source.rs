//! Collaborators injected into the listings view

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Error;
use crate::listings::deal::Deal;

/// Read access to the public deals
#[async_trait]
pub trait DealSource: Send + Sync {
    /// All deals with `public_status = true`, newest first
    async fn fetch_public_deals(&self) -> Result<Vec<Deal>, Error>;
}

/// Invoked once per change notification; carries no row data
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Deregistration handle returned by [`ChangeFeed::on_change`]
pub trait ChangeSubscription: Send {
    fn unsubscribe(self: Box<Self>);
}

/// Push notifications for changes to the public deals
pub trait ChangeFeed: Send + Sync {
    fn on_change(&self, callback: ChangeCallback) -> Result<Box<dyn ChangeSubscription>, Error>;
}
