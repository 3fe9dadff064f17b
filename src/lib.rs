//! A small movie catalog: an HTTP server over an in-memory video list, and a
//! terminal browsing client that estimates watch progress for videos played
//! through an opaque embedded player.

pub mod catalog;
pub mod client;
pub mod config;
pub mod console;
pub mod duration;
pub mod history;
pub mod listing;
pub mod server;
pub mod tracker;
pub mod tui;
