use crate::error::{AppError, Result};

use super::Symbol;

/// `max(1, total / batch_count_target)`; a zero target is treated as one batch.
pub fn batch_size(total: usize, batch_count_target: usize) -> usize {
    (total / batch_count_target.max(1)).max(1)
}

/// Number of batches [`partition`] produces. May exceed the target when the
/// division is inexact.
pub fn batch_count(total: usize, batch_count_target: usize) -> usize {
    total.div_ceil(batch_size(total, batch_count_target))
}

/// Split the universe into contiguous batches, preserving order. The last batch
/// may be shorter.
pub fn partition(all_symbols: &[Symbol], batch_count_target: usize) -> Vec<Vec<Symbol>> {
    all_symbols
        .chunks(batch_size(all_symbols.len(), batch_count_target))
        .map(<[Symbol]>::to_vec)
        .collect()
}

/// Resolve a 1-based batch number against the partition of `all_symbols`.
pub fn select_batch(
    all_symbols: &[Symbol],
    batch_count_target: usize,
    batch_num: i64,
) -> Result<Vec<Symbol>> {
    let count = batch_count(all_symbols.len(), batch_count_target);
    let index = usize::try_from(batch_num)
        .ok()
        .filter(|num| (1..=count).contains(num))
        .ok_or_else(|| {
            AppError::invalid(format!("'batch_num' must be between 1 and {count}"))
        })?;

    let size = batch_size(all_symbols.len(), batch_count_target);
    let start = (index - 1) * size;
    let end = (start + size).min(all_symbols.len());
    Ok(all_symbols[start..end].to_vec())
}
