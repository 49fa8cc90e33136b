//! Plain-text rendering of contracts, logs, assets, and counters.
//!
//! Contracts render as a vertical card grouped into sections; everything
//! else renders as fixed-width tables.

use tms_core::{Asset, Contract, ReceiptKey, StatusChangeLogEntry};
use tms_engine::StatusChange;

const MAX_LIST_ITEMS: usize = 10;

// ── Public API ──

/// Print one contract as a vertical card.
pub fn print_contract_card(c: &Contract) {
    println!("=== {} ===", c.id);
    println!("{}", c.name);
    println!();

    print_section(
        "Customer",
        &[
            ("name", c.name.clone()),
            ("phone", c.phone.clone()),
            ("plan", c.plan_type.clone()),
            ("date", c.date.clone()),
        ],
    );
    print_section("Status", &[("status", c.status.to_string())]);
    print_section(
        "Finance",
        &[
            ("total", money(c.total)),
            ("paid", money(c.paid)),
            ("outstanding", money(c.outstanding())),
            ("installments", c.installments.to_string()),
            ("cost", money(c.cost)),
            ("resale", money(c.resale)),
        ],
    );

    if !c.payments.is_empty() {
        println!("Payments");
        for p in c.payments.iter().take(MAX_LIST_ITEMS) {
            println!(
                "  {:<12} {:<8} {:>12}  {}",
                p.date,
                p.kind,
                money(p.amount),
                p.receipt.as_deref().unwrap_or("-")
            );
        }
        print_overflow(c.payments.len());
        println!();
    }

    if !c.attachments.is_empty() {
        println!("Attachments");
        for a in c.attachments.iter().take(MAX_LIST_ITEMS) {
            println!("  {:<26} {:>9} B  {}  {}", a.name, a.size, a.time, a.url);
        }
        print_overflow(c.attachments.len());
        println!();
    }
}

pub fn print_contract_table(contracts: &[Contract]) {
    if contracts.is_empty() {
        println!("No contracts. Run `tms init` to create demo data.");
        return;
    }
    println!(
        "{:<8} {:<24} {:<14} {:>12} {:>12}",
        "ID", "NAME", "STATUS", "PAID", "TOTAL"
    );
    for c in contracts {
        println!(
            "{:<8} {:<24} {:<14} {:>12} {:>12}",
            c.id,
            c.name,
            c.status.label(),
            money(c.paid),
            money(c.total)
        );
    }
}

pub fn print_status_change(change: &StatusChange) {
    let e = &change.entry;
    println!(
        "{}: {} -> {} (by {}, {:?})",
        e.contract_id, e.old_status, e.new_status, e.actor, e.authorization
    );
    for asset in &change.assets {
        println!("  registered asset {} ({})", asset.id, asset.name);
    }
}

pub fn print_status_log(log: &[StatusChangeLogEntry]) {
    if log.is_empty() {
        println!("No status changes recorded.");
        return;
    }
    for e in log {
        println!(
            "{}  {:<8} {:<14} -> {:<14} {:<12} {:?}",
            e.changed_at.format("%Y-%m-%d %H:%M:%S"),
            e.contract_id,
            e.old_status.label(),
            e.new_status.label(),
            e.actor,
            e.authorization
        );
    }
}

pub fn print_assets(assets: &[Asset]) {
    if assets.is_empty() {
        println!("No assets registered.");
        return;
    }
    for a in assets {
        println!(
            "{:<9} {:<8} {:<30} {:>12} {:>12}  {}",
            a.id,
            a.contract_id,
            a.name,
            money(a.cost),
            money(a.resale),
            a.registered_at.format("%Y-%m-%d")
        );
    }
}

pub fn print_counters(prefix: &str, counters: &[(ReceiptKey, u64)]) {
    if counters.is_empty() {
        println!("No receipts issued.");
        return;
    }
    for (key, count) in counters {
        println!("{key}  {count:>5} issued  last {prefix}-{key}-{count:04}");
    }
}

// ── Helpers ──

fn print_section(header: &str, rows: &[(&str, String)]) {
    if rows.iter().all(|(_, v)| v.is_empty()) {
        return;
    }
    println!("{header}");
    for (label, value) in rows {
        if !value.is_empty() {
            println!("  {:<26} {}", label, value);
        }
    }
    println!();
}

fn print_overflow(len: usize) {
    if len > MAX_LIST_ITEMS {
        println!("  ... and {} more", len - MAX_LIST_ITEMS);
    }
}

fn money(v: f64) -> String {
    format!("{v:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_has_two_decimals() {
        assert_eq!(money(500.0), "500.00");
        assert_eq!(money(1234.5), "1234.50");
    }
}
