//! Downloader for the Anime-Lists AniDB↔TVDB dataset

pub mod client;

pub use client::{AnimeListsClient, MappingFetcher};
