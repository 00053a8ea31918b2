//! Playlist navigation
//!
//! Pure index arithmetic plus the ordered track list it operates on.
//! `next`/`prev` wrap at both ends; that is the defined behavior that gives
//! continuous playlist playback.

use crate::types::Track;
use tracing::warn;

/// Index after `current`, wrapping from the last track to the first
///
/// Returns 0 for an empty playlist.
pub fn next_index(current: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current + 1) % len
}

/// Index before `current`, wrapping from the first track to the last
///
/// Returns 0 for an empty playlist.
pub fn prev_index(current: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current % len + len - 1) % len
}

/// `index` if it addresses a track, otherwise `None` (callers keep their index)
pub fn select_index(index: usize, len: usize) -> Option<usize> {
    (index < len).then_some(index)
}

/// Ordered tracks plus the current position
///
/// Invariant: `current < tracks.len()` whenever the playlist is non-empty.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    tracks: Vec<Track>,
    current: usize,
}

impl Playlist {
    /// Create a playlist positioned at `initial_index`
    ///
    /// An out-of-range initial index falls back to the first track.
    pub fn new(tracks: Vec<Track>, initial_index: usize) -> Self {
        let current = match select_index(initial_index, tracks.len()) {
            Some(index) => index,
            None => {
                if !tracks.is_empty() {
                    warn!(
                        "Initial index {} out of range for {} tracks, starting at 0",
                        initial_index,
                        tracks.len()
                    );
                }
                0
            }
        };

        Self { tracks, current }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Current index, `None` for an empty playlist
    pub fn current_index(&self) -> Option<usize> {
        (!self.tracks.is_empty()).then_some(self.current)
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.current)
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Move to the next track; returns the new index
    pub fn advance(&mut self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }
        self.current = next_index(self.current, self.tracks.len());
        Some(self.current)
    }

    /// Move to the previous track; returns the new index
    pub fn retreat(&mut self) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }
        self.current = prev_index(self.current, self.tracks.len());
        Some(self.current)
    }

    /// Jump to `index`; out-of-range selections leave the position unchanged
    pub fn select(&mut self, index: usize) -> Option<usize> {
        let index = select_index(index, self.tracks.len())?;
        self.current = index;
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_track(id: &str) -> Track {
        Track::new(id, format!("Track {id}"), "Artist", format!("/music/{id}.m4a"))
    }

    fn abc() -> Playlist {
        Playlist::new(
            vec![
                create_test_track("a"),
                create_test_track("b"),
                create_test_track("c"),
            ],
            0,
        )
    }

    #[test]
    fn wraps_at_both_boundaries() {
        assert_eq!(next_index(2, 3), 0);
        assert_eq!(prev_index(0, 3), 2);
        assert_eq!(next_index(0, 1), 0);
        assert_eq!(prev_index(0, 1), 0);
    }

    #[test]
    fn empty_length_never_divides_by_zero() {
        assert_eq!(next_index(0, 0), 0);
        assert_eq!(prev_index(5, 0), 0);
        assert_eq!(select_index(0, 0), None);
    }

    #[test]
    fn select_rejects_out_of_range() {
        assert_eq!(select_index(2, 3), Some(2));
        assert_eq!(select_index(3, 3), None);

        let mut playlist = abc();
        playlist.select(1);
        assert_eq!(playlist.select(7), None);
        assert_eq!(playlist.current_index(), Some(1));
    }

    #[test]
    fn advance_and_retreat_move_current_track() {
        let mut playlist = abc();
        assert_eq!(playlist.current().unwrap().id, "a");

        assert_eq!(playlist.retreat(), Some(2));
        assert_eq!(playlist.current().unwrap().id, "c");

        assert_eq!(playlist.advance(), Some(0));
        assert_eq!(playlist.advance(), Some(1));
        assert_eq!(playlist.current().unwrap().id, "b");
    }

    #[test]
    fn out_of_range_initial_index_starts_at_first_track() {
        let playlist = Playlist::new(vec![create_test_track("a")], 4);
        assert_eq!(playlist.current_index(), Some(0));
    }

    #[test]
    fn empty_playlist_has_no_current_track() {
        let mut playlist = Playlist::new(Vec::new(), 0);
        assert!(playlist.is_empty());
        assert_eq!(playlist.current_index(), None);
        assert!(playlist.current().is_none());
        assert_eq!(playlist.advance(), None);
        assert_eq!(playlist.retreat(), None);
    }
}
