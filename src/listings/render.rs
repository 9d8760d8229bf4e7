//! HTML markup for the listings page

use std::fmt::Write;

use crate::listings::deal::Deal;
use crate::listings::view::ListingsSnapshot;

/// Link target for every "Learn More" button
pub const CONTACT_PATH: &str = "/contact";

/// Escape text for use in element content and quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn opt(field: &Option<String>) -> String {
    escape(field.as_deref().unwrap_or(""))
}

/// Render the whole page for a snapshot
pub fn render_page(snapshot: &ListingsSnapshot) -> String {
    let mut html = String::new();

    html.push_str("<main class=\"portfolio\">\n");
    html.push_str("  <header>\n");
    html.push_str("    <h1>Investment Opportunities</h1>\n");
    html.push_str("    <p>Explore our curated collection of premium investment opportunities.</p>\n");
    html.push_str("  </header>\n");
    html.push_str("  <section class=\"listings\">\n");
    html.push_str(&render_controls(snapshot));

    if snapshot.loading {
        html.push_str("    <div class=\"loading\"><p>Loading investment opportunities...</p></div>\n");
    }

    if let Some(error) = &snapshot.error {
        let _ = writeln!(
            html,
            "    <div class=\"error\"><p>{}</p><p>Please try again later.</p></div>",
            escape(error)
        );
    }

    if !snapshot.loading && snapshot.error.is_none() {
        let deals = snapshot.filtered_deals();
        html.push_str("    <div class=\"grid\">\n");
        for deal in &deals {
            html.push_str(&render_card(deal));
        }
        html.push_str("    </div>\n");

        if deals.is_empty() {
            html.push_str(
                "    <div class=\"empty\"><p>No opportunities found matching your criteria.</p></div>\n",
            );
        }
    }

    html.push_str("  </section>\n");
    html.push_str("</main>\n");
    html
}

fn render_controls(snapshot: &ListingsSnapshot) -> String {
    let mut html = String::new();
    html.push_str("    <div class=\"controls\">\n");
    let _ = writeln!(
        html,
        "      <input type=\"text\" name=\"search\" placeholder=\"Search opportunities...\" value=\"{}\">",
        escape(&snapshot.search)
    );
    html.push_str("      <select name=\"state\">\n");
    for option in snapshot.state_options() {
        let selected = if option == snapshot.selected_state { " selected" } else { "" };
        let value = escape(&option);
        let _ = writeln!(html, "        <option value=\"{}\"{}>{}</option>", value, selected, value);
    }
    html.push_str("      </select>\n");
    html.push_str("    </div>\n");
    html
}

fn render_card(deal: &Deal) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "      <article class=\"deal\" data-id=\"{}\">", escape(&deal.id));
    let _ = writeln!(html, "        <h3>{}, {}</h3>", opt(&deal.city), opt(&deal.state));
    let _ = writeln!(html, "        <span class=\"deal-type\">{}</span>", opt(&deal.deal_type));
    let _ = writeln!(
        html,
        "        <div><p class=\"label\">Investment Needs</p><p>{}</p></div>",
        opt(&deal.needs)
    );
    let _ = writeln!(
        html,
        "        <div><p class=\"label\">Listed Price</p><p class=\"price\">${}</p></div>",
        escape(&ListingsSnapshot::price_label(deal))
    );
    let _ = writeln!(
        html,
        "        <div><p class=\"label\">Additional Information</p><p>{}</p></div>",
        opt(&deal.public_info)
    );
    let _ = writeln!(html, "        <a href=\"{}\">Learn More</a>", CONTACT_PATH);
    html.push_str("      </article>\n");
    html
}
