use anisync_models::MediaItem;
use std::path::PathBuf;

/// Whether `item` lives in one of the user's monitored library folders
///
/// No configured folders means everything is monitored. Items without a
/// known path are skipped once folders are configured.
pub fn in_monitored_library(item: &MediaItem, library_paths: &[PathBuf]) -> bool {
    if library_paths.is_empty() {
        return true;
    }
    match item.path() {
        Some(path) => library_paths.iter().any(|root| path.starts_with(root)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anisync_models::{MovieItem, ProviderIds};

    fn movie(path: Option<&str>) -> MediaItem {
        MediaItem::Movie(MovieItem {
            name: "Perfect Blue".to_string(),
            ids: ProviderIds::new(),
            path: path.map(PathBuf::from),
        })
    }

    #[test]
    fn test_library_filter() {
        let roots = vec![PathBuf::from("/media/anime"), PathBuf::from("/media/films")];

        assert!(in_monitored_library(&movie(Some("/media/films/Perfect Blue.mkv")), &roots));
        assert!(!in_monitored_library(&movie(Some("/media/tv/Show/S01E01.mkv")), &roots));
        assert!(!in_monitored_library(&movie(None), &roots));
        // Component-wise, not string prefix
        assert!(!in_monitored_library(&movie(Some("/media/animeextra/x.mkv")), &roots));

        assert!(in_monitored_library(&movie(None), &[]));
    }
}
