use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use crate::catalog::{Category, Video};
use crate::listing::{Card, WatchBadge};
use crate::server::VideoDetail;
use crate::tracker::{ClickOutcome, WatchTimer};

/// Two clicks on the same cell within this window form a double-click
const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    Listing,
    Watching,
}

/// A video entry in the listing view
#[derive(Debug, Clone)]
pub struct VideoCard {
    pub video: Video,
    pub badge: Option<WatchBadge>,
}

impl From<Video> for VideoCard {
    fn from(video: Video) -> Self {
        Self { video, badge: None }
    }
}

impl Card for VideoCard {
    fn video_id(&self) -> Option<&str> {
        Some(self.video.id.as_str()).filter(|id| !id.is_empty())
    }

    fn duration_label(&self) -> Option<&str> {
        Some(self.video.duration.as_str())
    }

    fn mark_watched(&mut self, badge: WatchBadge) {
        self.badge = Some(badge);
    }

    fn clear_watched(&mut self) {
        self.badge = None;
    }
}

/// The open playback view
pub struct Playback {
    /// Navigation path, e.g. `/watch/1`
    pub path: String,
    pub video: VideoDetail,
    /// Absent when the view could not be laid out
    pub timer: Option<WatchTimer>,
    pub last_click: Option<ClickOutcome>,
}

/// Counts consecutive clicks on the same terminal cell
#[derive(Debug, Default)]
pub struct ClickCounter {
    last: Option<(Instant, u16, u16)>,
    count: u8,
}

impl ClickCounter {
    /// Register a click and return its position in a multi-click sequence
    pub fn register(&mut self, at: Instant, column: u16, row: u16) -> u8 {
        let continues = self.last.is_some_and(|(prev, c, r)| {
            c == column && r == row && at.saturating_duration_since(prev) <= DOUBLE_CLICK_WINDOW
        });
        self.count = if continues {
            self.count.saturating_add(1)
        } else {
            1
        };
        self.last = Some((at, column, row));
        self.count
    }
}

pub struct App {
    pub view: View,
    pub should_quit: bool,
    /// Frame area from the last draw
    pub area: Rect,

    // Listing
    pub cards: Vec<VideoCard>,
    pub selected_index: usize,
    pub categories: Vec<Category>,
    /// Index into `categories`, `None` for all
    pub category_index: Option<usize>,
    pub search_input: String,
    pub is_editing_search: bool,
    pub is_loading: bool,
    pub error: Option<String>,
    pub status: Option<String>,

    // Playback
    pub playback: Option<Playback>,
    pub is_opening: bool,
    pub clicks: ClickCounter,
}

impl App {
    pub fn new() -> Self {
        Self {
            view: View::Listing,
            should_quit: false,
            area: Rect::default(),
            cards: Vec::new(),
            selected_index: 0,
            categories: Vec::new(),
            category_index: None,
            search_input: String::new(),
            is_editing_search: false,
            is_loading: false,
            error: None,
            status: None,
            playback: None,
            is_opening: false,
            clicks: ClickCounter::default(),
        }
    }

    pub fn select_next(&mut self) {
        if !self.cards.is_empty() {
            self.selected_index = (self.selected_index + 1) % self.cards.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.cards.is_empty() {
            self.selected_index = self
                .selected_index
                .checked_sub(1)
                .unwrap_or(self.cards.len() - 1);
        }
    }

    pub fn selected_card(&self) -> Option<&VideoCard> {
        self.cards.get(self.selected_index)
    }

    /// Replace the listing with freshly built, undecorated cards
    pub fn set_videos(&mut self, videos: Vec<Video>) {
        self.cards = videos.into_iter().map(VideoCard::from).collect();
        if self.selected_index >= self.cards.len() {
            self.selected_index = 0;
        }
    }

    pub fn current_category(&self) -> Option<&Category> {
        self.category_index.and_then(|i| self.categories.get(i))
    }

    /// All -> first category -> ... -> last category -> All
    pub fn cycle_category(&mut self) {
        self.category_index = match self.category_index {
            None if !self.categories.is_empty() => Some(0),
            Some(i) if i + 1 < self.categories.len() => Some(i + 1),
            _ => None,
        };
    }

    pub fn category_label(&self) -> &str {
        self.current_category()
            .map(|c| c.name.as_str())
            .unwrap_or("All")
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str) -> Video {
        Video {
            id: id.to_string(),
            title: format!("Video {}", id),
            description: String::new(),
            thumbnail: String::new(),
            video_url: String::new(),
            duration: "1:00:00".to_string(),
            category: "drama".to_string(),
        }
    }

    fn category(id: &str) -> Category {
        Category {
            id: id.to_string(),
            name: id.to_uppercase(),
            icon: String::new(),
        }
    }

    #[test]
    fn test_click_counter_detects_double_click() {
        let mut counter = ClickCounter::default();
        let start = Instant::now();

        assert_eq!(counter.register(start, 5, 5), 1);
        assert_eq!(counter.register(start + Duration::from_millis(200), 5, 5), 2);
        // Too slow
        assert_eq!(counter.register(start + Duration::from_millis(900), 5, 5), 1);
        // Different cell
        assert_eq!(counter.register(start + Duration::from_millis(950), 6, 5), 1);
    }

    #[test]
    fn test_selection_wraps() {
        let mut app = App::new();
        app.set_videos(vec![video("1"), video("2"), video("3")]);

        app.select_previous();
        assert_eq!(app.selected_index, 2);
        app.select_next();
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_set_videos_resets_out_of_range_selection() {
        let mut app = App::new();
        app.set_videos(vec![video("1"), video("2")]);
        app.selected_index = 1;
        app.set_videos(vec![video("1")]);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn test_cycle_category() {
        let mut app = App::new();
        app.cycle_category();
        assert_eq!(app.category_label(), "All");

        app.categories = vec![category("drama"), category("horror")];
        app.cycle_category();
        assert_eq!(app.category_label(), "DRAMA");
        app.cycle_category();
        assert_eq!(app.category_label(), "HORROR");
        app.cycle_category();
        assert_eq!(app.category_label(), "All");
    }
}
