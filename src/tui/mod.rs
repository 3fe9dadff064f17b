mod app;
mod ui;

pub use app::{App, ClickCounter, Playback, VideoCard, View};
pub use ui::{PlaybackLayout, playback_layout};

use std::io;
use std::sync::Arc;
use std::time::Instant;

use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::catalog::{Category, Video};
use crate::client::CatalogClient;
use crate::config::Config;
use crate::console;
use crate::history::WatchStore;
use crate::listing;
use crate::server::VideoDetail;
use crate::tracker::{Bounds, Click, ClickTarget, PlaybackSurface, WatchTimer};

/// Messages sent from background tasks to the UI
pub enum UiMessage {
    VideosLoaded(Vec<Video>),
    CategoriesLoaded(Vec<Category>),
    LoadError(String),
    VideoOpened(VideoDetail),
    OpenError(String),
}

/// Shared state for the event loop
struct Context {
    client: CatalogClient,
    store: Arc<dyn WatchStore>,
    cell_height_px: f64,
    tx: mpsc::Sender<UiMessage>,
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

pub async fn run(config: Config, store: Arc<dyn WatchStore>) -> io::Result<()> {
    // Set up panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        original_hook(panic_info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    let (tx, mut rx) = mpsc::channel::<UiMessage>(32);
    let ctx = Context {
        client: CatalogClient::new(&config.client.url),
        store,
        cell_height_px: config.tui.cell_height_px,
        tx,
    };

    let result = run_app(&mut terminal, &mut app, &ctx, &mut rx).await;

    // A session still open at exit gets its final write
    if let Some(timer) = app.playback.take().and_then(|p| p.timer) {
        timer.finish();
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    ctx: &Context,
    rx: &mut mpsc::Receiver<UiMessage>,
) -> io::Result<()> {
    let mut events = EventStream::new();

    load_categories(ctx);
    load_videos(app, ctx);

    loop {
        let completed = terminal.draw(|f| ui::draw(f, app))?;
        let area = completed.area;
        if area != app.area {
            app.area = area;
            relayout_playback(app, &ctx.store, ctx.cell_height_px);
        }

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => handle_key(app, ctx, key),
                Some(Ok(Event::Mouse(mouse))) => handle_mouse(app, ctx, mouse),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e),
                None => break,
            },
            Some(msg) = rx.recv() => handle_message(app, ctx, msg),
            _ = tick_playback(app) => {}
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Resolves on the open playback view's next watch tick
async fn tick_playback(app: &mut App) {
    match app.playback.as_mut().and_then(|p| p.timer.as_mut()) {
        Some(timer) => timer.tick().await,
        None => std::future::pending().await,
    }
}

fn handle_message(app: &mut App, ctx: &Context, msg: UiMessage) {
    match msg {
        UiMessage::VideosLoaded(videos) => {
            app.is_loading = false;
            app.error = None;
            app.set_videos(videos);
            listing::annotate_from_store(&mut app.cards, ctx.store.as_ref());
        }
        UiMessage::CategoriesLoaded(categories) => {
            app.categories = categories;
        }
        UiMessage::LoadError(e) => {
            app.is_loading = false;
            app.error = Some(e);
        }
        UiMessage::VideoOpened(video) => {
            app.is_opening = false;
            open_playback(app, ctx, video);
        }
        UiMessage::OpenError(e) => {
            app.is_opening = false;
            app.error = Some(e);
        }
    }
}

fn handle_key(app: &mut App, ctx: &Context, key: KeyEvent) {
    // Global quit
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.view {
        View::Listing if app.is_editing_search => match key.code {
            KeyCode::Esc => {
                app.is_editing_search = false;
            }
            KeyCode::Enter => {
                app.is_editing_search = false;
                load_videos(app, ctx);
            }
            KeyCode::Backspace => {
                app.search_input.pop();
            }
            KeyCode::Char(c) => {
                app.search_input.push(c);
            }
            _ => {}
        },

        View::Listing => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                app.should_quit = true;
            }
            KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            KeyCode::Char('/') => {
                app.is_editing_search = true;
            }
            KeyCode::Char('c') => {
                app.cycle_category();
                load_videos(app, ctx);
            }
            KeyCode::Char('r') => load_videos(app, ctx),
            KeyCode::Char('s') => {
                let stats = console::history_stats(ctx.store.as_ref());
                app.status = Some(format!(
                    "{} videos tracked, {} watched",
                    stats.total, stats.watched
                ));
            }
            KeyCode::Char('X') => {
                console::clear_history(ctx.store.as_ref(), &mut app.cards);
                app.status = Some("Watch history cleared".to_string());
            }
            KeyCode::Enter if !app.is_opening => {
                if let Some(card) = app.selected_card() {
                    let id = card.video.id.clone();
                    info!(video_id = %id, "opening video");
                    app.is_opening = true;
                    app.error = None;
                    let client = ctx.client.clone();
                    let tx = ctx.tx.clone();
                    tokio::spawn(async move {
                        let msg = match client.get_video(&id).await {
                            Ok(video) => UiMessage::VideoOpened(video),
                            Err(e) => {
                                error!(error = %e, video_id = %id, "failed to open video");
                                UiMessage::OpenError(e.to_string())
                            }
                        };
                        let _ = tx.send(msg).await;
                    });
                }
            }
            _ => {}
        },

        View::Watching => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => close_playback(app, ctx),
            _ => {}
        },
    }
}

fn handle_mouse(app: &mut App, ctx: &Context, mouse: MouseEvent) {
    if app.view != View::Watching || mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }

    let layout = playback_layout(app.area);
    // The click listener lives on the container; anything outside never reaches it
    let Some(target) = click_target(&layout, mouse.column, mouse.row) else {
        return;
    };
    let count = app.clicks.register(Instant::now(), mouse.column, mouse.row);

    // The back button
    if target == ClickTarget::Overlay && count == 1 {
        close_playback(app, ctx);
        return;
    }

    let Some(playback) = app.playback.as_mut() else {
        return;
    };
    if let Some(timer) = playback.timer.as_mut() {
        let click = Click {
            target,
            y: cell_center_px(mouse.row, ctx.cell_height_px),
            count,
        };
        playback.last_click = Some(timer.handle_click(&click));
    }
}

fn load_categories(ctx: &Context) {
    let client = ctx.client.clone();
    let tx = ctx.tx.clone();
    tokio::spawn(async move {
        match client.categories().await {
            Ok(categories) => {
                let _ = tx.send(UiMessage::CategoriesLoaded(categories)).await;
            }
            Err(e) => error!(error = %e, "failed to load categories"),
        }
    });
}

fn load_videos(app: &mut App, ctx: &Context) {
    app.is_loading = true;
    app.status = None;

    let client = ctx.client.clone();
    let tx = ctx.tx.clone();
    let search = app.search_input.trim().to_string();
    let category = app.current_category().map(|c| c.id.clone());

    tokio::spawn(async move {
        debug!(search = %search, category = ?category, "loading videos");
        let msg = match client
            .list_videos(Some(&search), category.as_deref())
            .await
        {
            Ok(videos) => {
                info!(count = videos.len(), "videos loaded");
                UiMessage::VideosLoaded(videos)
            }
            Err(e) => {
                error!(error = %e, "failed to load videos");
                UiMessage::LoadError(format!("Catalog error: {}", e))
            }
        };
        let _ = tx.send(msg).await;
    });
}

fn open_playback(app: &mut App, ctx: &Context, video: VideoDetail) {
    let path = format!("/watch/{}", video.video.id);
    let surface = playback_surface(app.area, ctx.cell_height_px);
    let timer = WatchTimer::attach(ctx.store.clone(), &path, surface);

    app.clicks = ClickCounter::default();
    app.playback = Some(Playback {
        path,
        video,
        timer,
        last_click: None,
    });
    app.view = View::Watching;
}

/// Tear down the playback view and return to a freshly annotated listing
fn close_playback(app: &mut App, ctx: &Context) {
    if let Some(timer) = app.playback.take().and_then(|p| p.timer) {
        timer.finish();
    }
    app.view = View::Listing;

    for card in app.cards.iter_mut() {
        listing::Card::clear_watched(card);
    }
    listing::annotate_from_store(&mut app.cards, ctx.store.as_ref());
}

/// Hand the new geometry to the open timer, attaching one if the view had
/// no room for a player when it opened
fn relayout_playback(app: &mut App, store: &Arc<dyn WatchStore>, cell_height_px: f64) {
    let Some(playback) = app.playback.as_mut() else {
        return;
    };
    let Some(surface) = playback_surface(app.area, cell_height_px) else {
        return;
    };
    match playback.timer.as_mut() {
        Some(timer) => timer.set_surface(surface),
        None => {
            playback.timer = WatchTimer::attach(store.clone(), &playback.path, Some(surface));
        }
    }
}

/// Pixel geometry of the playback view, `None` if there is no room for a player
pub fn playback_surface(area: Rect, cell_height_px: f64) -> Option<PlaybackSurface> {
    let layout = playback_layout(area);
    if layout.player.width == 0 || layout.player.height == 0 {
        return None;
    }
    Some(PlaybackSurface {
        container: rect_to_bounds(layout.container, cell_height_px),
    })
}

/// Terminal cells are roughly twice as tall as they are wide
fn rect_to_bounds(rect: Rect, cell_height_px: f64) -> Bounds {
    let cell_width_px = cell_height_px / 2.0;
    Bounds::new(
        rect.x as f64 * cell_width_px,
        rect.y as f64 * cell_height_px,
        rect.width as f64 * cell_width_px,
        rect.height as f64 * cell_height_px,
    )
}

fn cell_center_px(row: u16, cell_height_px: f64) -> f64 {
    (row as f64 + 0.5) * cell_height_px
}

fn contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

/// What a click at this cell lands on, `None` outside the player container
pub fn click_target(layout: &PlaybackLayout, column: u16, row: u16) -> Option<ClickTarget> {
    if contains(layout.overlay, column, row) {
        Some(ClickTarget::Overlay)
    } else if contains(layout.player, column, row) {
        Some(ClickTarget::Player)
    } else if contains(layout.container, column, row) {
        Some(ClickTarget::Container)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryStore;
    use crate::tracker::{CONTROL_BAR_HEIGHT_PX, classify_click};

    fn layout() -> PlaybackLayout {
        playback_layout(Rect::new(0, 0, 100, 40))
    }

    #[test]
    fn test_click_target_regions() {
        let layout = layout();
        let mid_column = 50;

        assert_eq!(
            click_target(&layout, mid_column, layout.overlay.y),
            Some(ClickTarget::Overlay)
        );
        assert_eq!(
            click_target(&layout, mid_column, layout.player.y + 2),
            Some(ClickTarget::Player)
        );
        // The border belongs to the container only
        assert_eq!(
            click_target(&layout, mid_column, layout.container.y),
            Some(ClickTarget::Container)
        );
        assert_eq!(click_target(&layout, mid_column, layout.header.y), None);
        assert_eq!(click_target(&layout, mid_column, layout.status.y + 1), None);
    }

    #[test]
    fn test_playback_surface_requires_room_for_player() {
        assert!(playback_surface(Rect::new(0, 0, 100, 40), 16.0).is_some());
        assert!(playback_surface(Rect::new(0, 0, 100, 8), 16.0).is_none());
        assert!(playback_surface(Rect::default(), 16.0).is_none());
    }

    fn playback_for(id: &str) -> Playback {
        let video = crate::catalog::Catalog::seeded().get(id).cloned().unwrap();
        Playback {
            path: format!("/watch/{}", id),
            video: VideoDetail {
                video,
                category_name: "Adventure".to_string(),
            },
            timer: None,
            last_click: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_attaches_timer_to_untracked_playback() {
        let store: Arc<dyn WatchStore> = Arc::new(MemoryStore::new());
        let mut app = App::new();
        app.view = View::Watching;
        app.area = Rect::new(0, 0, 100, 8);
        app.playback = Some(playback_for("1"));

        // Still too small for a player
        relayout_playback(&mut app, &store, 16.0);
        assert!(app.playback.as_ref().unwrap().timer.is_none());
        assert!(store.load().is_empty());

        app.area = Rect::new(0, 0, 100, 40);
        relayout_playback(&mut app, &store, 16.0);

        let timer = app.playback.as_ref().unwrap().timer.as_ref().unwrap();
        assert_eq!(timer.video_id(), "1");
        assert!(timer.is_active());
        assert!(store.load().get("1").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_updates_existing_timer_surface() {
        let store: Arc<dyn WatchStore> = Arc::new(MemoryStore::new());
        let mut app = App::new();
        app.area = Rect::new(0, 0, 100, 40);
        let mut playback = playback_for("2");
        playback.timer = WatchTimer::attach(
            store.clone(),
            &playback.path,
            playback_surface(app.area, 16.0),
        );
        app.playback = Some(playback);

        // Grow the terminal: a click that sat in the old control bar zone now toggles
        let old_bottom_row = 34;
        app.area = Rect::new(0, 0, 100, 60);
        relayout_playback(&mut app, &store, 16.0);

        let timer = app.playback.as_mut().unwrap().timer.as_mut().unwrap();
        let click = Click {
            target: ClickTarget::Player,
            y: cell_center_px(old_bottom_row, 16.0),
            count: 1,
        };
        assert_eq!(
            timer.handle_click(&click),
            crate::tracker::ClickOutcome::Paused
        );
    }

    #[test]
    fn test_bottom_rows_map_into_control_bar_zone() {
        let cell_height_px = 16.0;
        let layout = layout();
        let surface = playback_surface(Rect::new(0, 0, 100, 40), cell_height_px).unwrap();
        let bottom_row = layout.container.y + layout.container.height - 1;
        let zone_rows = (CONTROL_BAR_HEIGHT_PX / cell_height_px) as u16;

        let click_at = |row: u16| Click {
            target: ClickTarget::Player,
            y: cell_center_px(row, cell_height_px),
            count: 1,
        };

        assert!(classify_click(&surface, &click_at(bottom_row)).is_err());
        assert!(classify_click(&surface, &click_at(bottom_row + 1 - zone_rows)).is_err());
        assert!(classify_click(&surface, &click_at(bottom_row - zone_rows)).is_ok());
    }
}
