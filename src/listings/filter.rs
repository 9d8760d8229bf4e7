//! Search and state filtering over loaded deals

use crate::listings::deal::Deal;

/// Dropdown entry that disables state filtering
pub const ALL_STATES: &str = "All States";

/// `"All States"` followed by each distinct non-empty state in the loaded
/// deals, sorted by UTF-16 code units.
pub fn state_options(deals: &[Deal]) -> Vec<String> {
    let mut states: Vec<&str> = deals
        .iter()
        .filter_map(|deal| deal.state.as_deref())
        .filter(|state| !state.is_empty())
        .collect();
    states.sort_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));
    states.dedup();

    std::iter::once(ALL_STATES)
        .chain(states)
        .map(String::from)
        .collect()
}

/// Whether `deal` matches the search text and the selected state.
///
/// The search is a case-insensitive substring match against city, public
/// info and name; an empty search matches everything.
pub fn matches(deal: &Deal, search: &str, selected_state: &str) -> bool {
    let needle = search.to_lowercase();
    let contains = |field: Option<&str>| field.unwrap_or("").to_lowercase().contains(&needle);

    let matches_search = contains(deal.city.as_deref())
        || contains(deal.public_info.as_deref())
        || contains(Some(deal.name.as_str()));
    let matches_state = selected_state == ALL_STATES || deal.state.as_deref() == Some(selected_state);

    matches_search && matches_state
}

/// Deals passing [`matches`], in their loaded order
pub fn filter_deals<'a>(deals: &'a [Deal], search: &str, selected_state: &str) -> Vec<&'a Deal> {
    deals
        .iter()
        .filter(|deal| matches(deal, search, selected_state))
        .collect()
}
