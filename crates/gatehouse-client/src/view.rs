//! Text rendering of the view state

use std::fmt::Write;

use crate::{ActionKind, ActionState, ViewState};

/// Render the view as plain text
///
/// Signed out renders a prompt only. Signed in renders either the billing
/// summary or the plan catalog (never both), then content and the action
/// line.
pub fn render(view: &ViewState) -> String {
    let mut out = String::new();

    let Some(identity) = &view.identity else {
        out.push_str("Not signed in.\n");
        return out;
    };

    let who = identity.email.as_deref().unwrap_or(identity.uid.as_str());
    let _ = writeln!(out, "Signed in as {who}");

    match &view.billing {
        Some(billing) => {
            let _ = writeln!(out, "\n{}", billing.message);
            if billing.subscription.cancel_at_period_end {
                if let Some(end) = billing.subscription.current_period_end {
                    let _ = writeln!(out, "Cancels on {}", end.format("%Y-%m-%d"));
                }
            }
        }
        None => render_catalog(view, &mut out),
    }

    for (tier, blocks) in &view.content {
        let _ = writeln!(out, "\n== {tier} content ==");
        if blocks.is_empty() {
            out.push_str("  (nothing here)\n");
        }
        for block in blocks {
            let _ = writeln!(out, "  - {}", block.summary());
        }
    }

    match &view.action {
        ActionState::Idle => {}
        ActionState::Loading(ActionKind::Checkout) => out.push_str("\nStarting checkout...\n"),
        ActionState::Loading(ActionKind::Portal) => out.push_str("\nOpening billing portal...\n"),
        ActionState::Navigated(url) => {
            let _ = writeln!(out, "\nRedirected to {url}");
        }
        ActionState::Failed(message) => {
            let _ = writeln!(out, "\nError: {message}");
        }
    }

    out
}

fn render_catalog(view: &ViewState, out: &mut String) {
    out.push_str("\n== Plans ==\n");
    let plans = view.visible_plans();
    if plans.is_empty() {
        out.push_str("  Loading...\n");
        return;
    }

    for listing in plans {
        match &listing.plan.description {
            Some(description) => {
                let _ = writeln!(out, "{}: {description}", listing.plan.name);
            }
            None => {
                let _ = writeln!(out, "{}", listing.plan.name);
            }
        }
        for tier in &listing.tiers {
            let _ = writeln!(out, "  [{}] {}", tier.tier.id, tier.display);
        }
    }
}
