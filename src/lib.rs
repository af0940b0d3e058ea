//! News Digest - a film news digest page
//!
//! This crate renders a digest page from a single JSON feed document: a
//! featured top story with secondary stories, plus one list per category
//! section. It also ships the updater that builds that document from RSS
//! sources.

pub mod config;
pub mod loader;
pub mod model;
pub mod renderer;
pub mod routes;
pub mod translate;
pub mod updater;
pub mod view;
