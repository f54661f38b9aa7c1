//! Keyed detail records to an ordered sequence.

use indexmap::IndexMap;

/// Convert a keyed mapping into its values, in insertion order.
///
/// Keys are dropped. No filtering or validation takes place.
pub fn transform<K, V>(data: IndexMap<K, V>) -> Vec<V> {
    data.into_values().collect()
}
