//! Public transport timetable server.
//!
//! Loads a GTFS feed, keeps an in-memory index of it, and answers
//! "which direct trips run from here to there soon?" and "what leaves
//! this station next?" over HTTP.

pub mod cache;
pub mod config;
pub mod gtfs;
pub mod store;
pub mod timetable;
pub mod updater;
pub mod web;
