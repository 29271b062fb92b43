//! Pure helpers for computing optimistic cart states and normalizing
//! snapshots returned by the remote authority.
//!
//! Everything here is side-effect free; the engine owns when and whether a
//! computed state becomes truth.

use std::collections::HashMap;

use tracing::warn;

use opaline_core::{CartLineItem, ProductId, Quantity};

/// Replace or append a line, keeping at most one line per product.
pub(crate) fn upsert_line(items: &[CartLineItem], line: CartLineItem) -> Vec<CartLineItem> {
    let mut next = items.to_vec();
    match next.iter_mut().find(|l| l.product_id == line.product_id) {
        Some(existing) => *existing = line,
        None => next.push(line),
    }
    next
}

/// Set an existing line's quantity. Lines for other products are untouched;
/// a missing line leaves the state unchanged (the engine rejects that case
/// before calling in).
pub(crate) fn set_line_quantity(
    items: &[CartLineItem],
    product_id: ProductId,
    quantity: Quantity,
) -> Vec<CartLineItem> {
    items
        .iter()
        .cloned()
        .map(|mut line| {
            if line.product_id == product_id {
                line.quantity = quantity;
            }
            line
        })
        .collect()
}

/// Drop the line for `product_id`, if present.
pub(crate) fn remove_line(items: &[CartLineItem], product_id: ProductId) -> Vec<CartLineItem> {
    items
        .iter()
        .filter(|line| line.product_id != product_id)
        .cloned()
        .collect()
}

/// Normalize a remote snapshot: collapse duplicate product lines into one,
/// accumulating quantity up to the per-line maximum.
///
/// A well-behaved server never sends duplicates, but the uniqueness
/// invariant has to hold for whatever comes back.
pub(crate) fn merge_duplicate_lines(lines: Vec<CartLineItem>) -> Vec<CartLineItem> {
    let mut merged: Vec<CartLineItem> = Vec::with_capacity(lines.len());
    let mut positions: HashMap<ProductId, usize> = HashMap::with_capacity(lines.len());

    for line in lines {
        if let Some(&pos) = positions.get(&line.product_id) {
            if let Some(existing) = merged.get_mut(pos) {
                let combined = existing.quantity.get() + line.quantity.get();
                let capped = combined.min(Quantity::MAX.get());
                if capped != combined {
                    warn!(
                        product_id = %line.product_id,
                        combined,
                        "duplicate remote lines exceed quantity bound, capping"
                    );
                }
                // Bound check above keeps this in range.
                if let Some(quantity) = Quantity::new(capped) {
                    existing.quantity = quantity;
                }
            }
        } else {
            positions.insert(line.product_id, merged.len());
            merged.push(line);
        }
    }

    merged
}
