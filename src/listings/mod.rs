//! The Portfolio listings view
//!
//! Loads the public deals, refetches them whenever the `deals` table
//! changes, and derives the filtered list, state dropdown and price labels
//! shown on the page.

mod deal;
mod filter;
mod price;
mod render;
mod source;
mod supabase;
mod view;

pub use deal::{Deal, DEALS_TABLE};
pub use filter::{filter_deals, matches, state_options, ALL_STATES};
pub use price::{format_price, parse_number, CONTACT_FOR_DETAILS};
pub use render::{escape, render_page, CONTACT_PATH};
pub use source::{ChangeCallback, ChangeFeed, ChangeSubscription, DealSource};
pub use supabase::{PostgrestDealSource, RealtimeChangeFeed, DEALS_CHANNEL};
pub use view::{ListingsSnapshot, ListingsView};
