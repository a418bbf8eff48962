//! MusicBrainz recording search
//!
//! Finds recordings by free text and hands them to the catalog as track
//! records.
//!
//! API docs: https://musicbrainz.org/doc/MusicBrainz_API/Search

pub mod dto;
mod adapter;
mod client;

pub use adapter::{SOURCE, to_track_record};
pub use client::MusicBrainzClient;
