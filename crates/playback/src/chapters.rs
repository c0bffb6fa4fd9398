// FILE: crates/playback/src/chapters.rs
//! Chapter navigation and elapsed-time mapping

use audioteca_core::{AudioFormat, Chapter, Duration};

/// Returns the 0-based index of the chapter containing `position`
///
/// A position exactly on a boundary belongs to the chapter that starts there.
/// Positions at or past the end map to the last chapter. Returns `None` when
/// there are no chapters.
pub fn chapter_at(durations: &[Duration], position: Duration) -> Option<usize> {
    if durations.is_empty() {
        return None;
    }

    let mut end = Duration::ZERO;
    for (index, duration) in durations.iter().enumerate() {
        end += *duration;
        if end > position {
            return Some(index);
        }
    }

    Some(durations.len() - 1)
}

/// Returns the start of chapter `index`: the sum of every earlier chapter
pub fn chapter_start(durations: &[Duration], index: usize) -> Option<Duration> {
    if index >= durations.len() {
        return None;
    }
    Some(durations[..index].iter().sum())
}

/// Ordered chapters of the loaded audio
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterList {
    chapters: Vec<Chapter>,
    durations: Vec<Duration>,
}

impl ChapterList {
    /// Creates a chapter list with the given chapters
    pub fn new(chapters: Vec<Chapter>) -> Self {
        let durations = chapters.iter().map(|c| c.duration).collect();
        Self {
            chapters,
            durations,
        }
    }

    /// Chapters of an audio format, logging when they disagree with its total
    pub fn from_format(format: &AudioFormat) -> Self {
        let list = Self::new(format.chapters.clone());
        if list.has_chapters() && list.total() != format.total_duration {
            log::warn!(
                "Chapter durations sum to {}ms but the format reports {}ms",
                list.total().as_millis(),
                format.total_duration.as_millis()
            );
        }
        list
    }

    /// Returns the total number of chapters
    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Returns true if there are chapters
    pub fn has_chapters(&self) -> bool {
        !self.chapters.is_empty()
    }

    /// Gets a chapter by index
    pub fn get(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    /// Chapter durations in order
    pub fn durations(&self) -> &[Duration] {
        &self.durations
    }

    /// Sum of chapter durations
    pub fn total(&self) -> Duration {
        self.durations.iter().sum()
    }

    /// Index of the chapter containing `position`
    pub fn index_at(&self, position: Duration) -> Option<usize> {
        chapter_at(&self.durations, position)
    }

    /// Start position of chapter `index`
    pub fn start_of(&self, index: usize) -> Option<Duration> {
        chapter_start(&self.durations, index)
    }

    /// Position inside the chapter that contains `position`
    pub fn offset_in_chapter(&self, position: Duration) -> Option<Duration> {
        let index = self.index_at(position)?;
        let start = self.start_of(index)?;
        Some(position.saturating_sub(start))
    }

    /// Display title of chapter `index`
    pub fn title(&self, index: usize) -> Option<String> {
        self.get(index).map(Chapter::display_title)
    }

    /// Returns all chapters
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Returns formatted chapter info (e.g., "3/15")
    pub fn chapter_progress(&self, current: Option<usize>) -> String {
        match (current, self.chapter_count()) {
            (Some(idx), count) if count > 0 => format!("{}/{}", idx + 1, count),
            (None, count) if count > 0 => format!("?/{}", count),
            _ => "No chapters".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|s| Duration::from_seconds(*s)).collect()
    }

    fn create_test_chapters() -> ChapterList {
        ChapterList::new(vec![
            Chapter::new(1, Some("Introduction".to_string()), Duration::from_seconds(300)),
            Chapter::new(2, None, Duration::from_seconds(450)),
            Chapter::new(3, Some("Epilogue".to_string()), Duration::from_seconds(600)),
        ])
    }

    #[test]
    fn test_chapter_at_middle() {
        let durations = secs(&[300, 450, 600]);
        assert_eq!(chapter_at(&durations, Duration::from_seconds(700)), Some(1));
    }

    #[test]
    fn test_chapter_at_no_chapters() {
        assert_eq!(chapter_at(&[], Duration::from_seconds(120)), None);
    }

    #[test]
    fn test_chapter_at_boundary_belongs_to_next() {
        let durations = secs(&[300, 450, 600]);
        assert_eq!(chapter_at(&durations, Duration::ZERO), Some(0));
        assert_eq!(chapter_at(&durations, Duration::from_millis(299_999)), Some(0));
        assert_eq!(chapter_at(&durations, Duration::from_seconds(300)), Some(1));
        assert_eq!(chapter_at(&durations, Duration::from_seconds(750)), Some(2));
    }

    #[test]
    fn test_chapter_at_past_end_is_last() {
        let durations = secs(&[300, 450, 600]);
        assert_eq!(chapter_at(&durations, Duration::from_seconds(1350)), Some(2));
        assert_eq!(chapter_at(&durations, Duration::from_seconds(5000)), Some(2));
    }

    #[test]
    fn test_chapter_at_every_position_is_contained() {
        let durations = secs(&[3, 1, 4, 1, 5]);
        let total: Duration = durations.iter().sum();
        let mut ms = 0;
        while ms < total.as_millis() {
            let position = Duration::from_millis(ms);
            let index = chapter_at(&durations, position).expect("has chapters");
            let start = chapter_start(&durations, index).expect("valid index");
            assert!(start <= position);
            assert!(position < start + durations[index]);
            ms += 250;
        }
    }

    #[test]
    fn test_chapter_start() {
        let durations = secs(&[300, 450, 600]);
        assert_eq!(chapter_start(&durations, 0), Some(Duration::ZERO));
        assert_eq!(chapter_start(&durations, 1), Some(Duration::from_seconds(300)));
        assert_eq!(chapter_start(&durations, 2), Some(Duration::from_seconds(750)));
        assert_eq!(chapter_start(&durations, 3), None);
    }

    #[test]
    fn test_zero_length_chapter_is_skipped() {
        let durations = secs(&[10, 0, 10]);
        assert_eq!(chapter_at(&durations, Duration::from_seconds(10)), Some(2));
    }

    #[test]
    fn test_chapter_list_helpers() {
        let list = create_test_chapters();
        assert_eq!(list.chapter_count(), 3);
        assert_eq!(list.total(), Duration::from_seconds(1350));
        assert_eq!(list.index_at(Duration::from_seconds(700)), Some(1));
        assert_eq!(
            list.offset_in_chapter(Duration::from_seconds(700)),
            Some(Duration::from_seconds(400))
        );
        assert_eq!(list.title(1).as_deref(), Some("Chapter 2"));
        assert_eq!(list.title(2).as_deref(), Some("Epilogue"));
    }

    #[test]
    fn test_chapter_progress() {
        let list = create_test_chapters();
        assert_eq!(list.chapter_progress(Some(1)), "2/3");
        assert_eq!(list.chapter_progress(None), "?/3");
        assert_eq!(ChapterList::default().chapter_progress(None), "No chapters");
    }
}
