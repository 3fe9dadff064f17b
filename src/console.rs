//! Manual maintenance entry points for watch history.

use serde::Serialize;
use tracing::info;

use crate::history::{WatchHistory, WatchStore};
use crate::listing::Card;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryStats {
    /// Distinct videos with a record
    pub total: usize,
    /// Records at or over the watched threshold
    pub watched: usize,
    pub records: WatchHistory,
}

/// Empty the store and strip watched decoration from the given cards
pub fn clear_history<C: Card>(store: &dyn WatchStore, cards: &mut [C]) {
    store.clear();
    for card in cards.iter_mut() {
        card.clear_watched();
    }
    info!(cards = cards.len(), "watch history cleared");
}

pub fn history_stats(store: &dyn WatchStore) -> HistoryStats {
    let records = store.load();
    HistoryStats {
        total: records.len(),
        watched: records.watched_count(),
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryStore;
    use crate::listing::annotate_from_store;
    use crate::listing::tests::{TestCard, history_with};

    #[test]
    fn test_clear_removes_records_and_decoration() {
        let store = MemoryStore::new();
        store.save(&history_with(&[("1", 3.0), ("2", 1.0)]));

        let mut cards = vec![TestCard::new("1", "1:00:00"), TestCard::new("2", "30:00")];
        assert_eq!(annotate_from_store(&mut cards, &store), 2);

        clear_history(&store, &mut cards);

        assert!(cards.iter().all(|c| c.badge.is_none()));
        assert!(store.load().is_empty());
        assert_eq!(annotate_from_store(&mut cards, &store), 0);
    }

    #[test]
    fn test_stats_counts() {
        let store = MemoryStore::new();
        store.save(&history_with(&[("1", 3.0), ("2", 0.5), ("3", 1.0)]));

        let stats = history_stats(&store);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.watched, 2);
        assert_eq!(stats.records.get("2").unwrap().minutes_watched, 0.5);
    }

    #[test]
    fn test_stats_on_empty_store() {
        let stats = history_stats(&MemoryStore::new());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.watched, 0);
        assert!(stats.records.is_empty());
    }
}
