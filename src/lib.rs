//! Restaurant browsing: a read-only restaurant API over a SQLite store and
//! the client-side view that keeps sort/filter state in sync with it.

pub mod client;
pub mod config;
pub mod data;
pub mod db;
pub mod table;
pub mod view;
