//! Sub-batching of lookup keys.

use crate::config::LookupConfig;
use crate::keys::KeyKind;

/// Split `items` into contiguous chunks of at most `size` items
///
/// Chunks preserve input order and the last one may be shorter. A size of zero
/// is treated as one.
pub fn batches<T>(items: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.max(1))
}

/// The invoice endpoint accepts a single invoice per query
pub const INVOICE_BATCH_SIZE: usize = 1;

/// Keys per remote query for the given key shape
pub fn batch_size(kind: KeyKind, config: &LookupConfig) -> usize {
    match kind {
        KeyKind::Invoice => INVOICE_BATCH_SIZE,
        KeyKind::Order => config.order_batch_size.max(1),
    }
}
