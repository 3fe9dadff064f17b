use crate::duration::remaining_minutes;
use crate::history::{WatchHistory, WatchRecord, WatchStore};

/// Watched decoration shown on a listing card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchBadge {
    /// Remaining minutes, rounded up
    pub remaining_minutes: u64,
}

impl WatchBadge {
    pub fn label(&self) -> String {
        format!("{}m left", self.remaining_minutes)
    }
}

/// A rendered entry in the listing view
pub trait Card {
    fn video_id(&self) -> Option<&str>;

    /// Duration text as displayed, e.g. `2:01:28`
    fn duration_label(&self) -> Option<&str>;

    fn mark_watched(&mut self, badge: WatchBadge);

    fn clear_watched(&mut self);
}

/// Badge for a record, or `None` while it is under the watched threshold
pub fn badge_for(record: &WatchRecord, duration_label: &str) -> Option<WatchBadge> {
    if !record.is_watched() {
        return None;
    }
    let remaining = remaining_minutes(duration_label, record.minutes_watched);
    Some(WatchBadge {
        remaining_minutes: remaining.ceil() as u64,
    })
}

/// Decorate every card whose video meets the watched threshold.
///
/// Cards below the threshold or without a record are left as they are.
/// Returns how many cards were marked.
pub fn annotate<C: Card>(cards: &mut [C], history: &WatchHistory) -> usize {
    let mut marked = 0;
    for card in cards.iter_mut() {
        let Some(video_id) = card.video_id() else {
            continue;
        };
        let Some(record) = history.get(video_id) else {
            continue;
        };
        let duration = card.duration_label().unwrap_or_default();
        if let Some(badge) = badge_for(record, duration) {
            card.mark_watched(badge);
            marked += 1;
        }
    }
    marked
}

/// Read the store once and annotate the cards
pub fn annotate_from_store<C: Card>(cards: &mut [C], store: &dyn WatchStore) -> usize {
    if cards.is_empty() {
        return 0;
    }
    let history = store.load();
    let marked = annotate(cards, &history);
    tracing::debug!(cards = cards.len(), marked, "annotated listing");
    marked
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::history::MemoryStore;
    use chrono::Utc;

    #[derive(Debug, Default)]
    pub(crate) struct TestCard {
        pub id: Option<String>,
        pub duration: Option<String>,
        pub badge: Option<WatchBadge>,
    }

    impl TestCard {
        pub(crate) fn new(id: &str, duration: &str) -> Self {
            Self {
                id: Some(id.to_string()),
                duration: Some(duration.to_string()),
                badge: None,
            }
        }
    }

    impl Card for TestCard {
        fn video_id(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn duration_label(&self) -> Option<&str> {
            self.duration.as_deref()
        }

        fn mark_watched(&mut self, badge: WatchBadge) {
            self.badge = Some(badge);
        }

        fn clear_watched(&mut self) {
            self.badge = None;
        }
    }

    pub(crate) fn history_with(entries: &[(&str, f64)]) -> WatchHistory {
        let mut history = WatchHistory::default();
        for (id, minutes) in entries {
            history.get_or_create(id, Utc::now()).0.minutes_watched = *minutes;
        }
        history
    }

    #[test]
    fn test_badge_label() {
        let badge = WatchBadge {
            remaining_minutes: 116,
        };
        assert_eq!(badge.label(), "116m left");
    }

    #[test]
    fn test_threshold_boundary() {
        let history = history_with(&[("1", 0.9), ("2", 1.0)]);
        let mut cards = vec![TestCard::new("1", "2:01:28"), TestCard::new("2", "2:01:28")];

        assert_eq!(annotate(&mut cards, &history), 1);
        assert!(cards[0].badge.is_none());
        assert_eq!(cards[1].badge.as_ref().unwrap().label(), "120m left");
    }

    #[test]
    fn test_remaining_label_uses_ceiling() {
        let history = history_with(&[("1", 5.25)]);
        let mut cards = vec![TestCard::new("1", "2:01:28")];

        annotate(&mut cards, &history);
        // 121 - 5.25 = 115.75
        assert_eq!(cards[0].badge.as_ref().unwrap().remaining_minutes, 116);
    }

    #[test]
    fn test_overwatched_and_bad_duration_show_zero() {
        let history = history_with(&[("1", 10.0), ("2", 3.0)]);
        let mut cards = vec![TestCard::new("1", "4:30"), TestCard::new("2", "bad")];

        annotate(&mut cards, &history);
        assert_eq!(cards[0].badge.as_ref().unwrap().label(), "0m left");
        assert_eq!(cards[1].badge.as_ref().unwrap().label(), "0m left");
    }

    #[test]
    fn test_cards_without_record_or_id_untouched() {
        let history = history_with(&[("1", 2.0)]);
        let mut cards = vec![
            TestCard::new("2", "1:00:00"),
            TestCard {
                id: None,
                duration: Some("1:00:00".to_string()),
                badge: None,
            },
        ];

        assert_eq!(annotate(&mut cards, &history), 0);
        assert!(cards.iter().all(|c| c.badge.is_none()));
    }

    #[test]
    fn test_annotate_from_store_is_read_only() {
        let store = MemoryStore::new();
        store.save(&history_with(&[("1", 1.5)]));
        let before = store.contents();

        let mut cards = vec![TestCard::new("1", "10:00"), TestCard::new("3", "10:00")];
        assert_eq!(annotate_from_store(&mut cards, &store), 1);
        assert_eq!(cards[0].badge.as_ref().unwrap().label(), "9m left");
        assert_eq!(store.contents(), before);
    }

    #[test]
    fn test_annotate_from_corrupt_store_marks_nothing() {
        let store = MemoryStore::with_contents("[1, 2");
        let mut cards = vec![TestCard::new("1", "10:00")];
        assert_eq!(annotate_from_store(&mut cards, &store), 0);
    }
}
