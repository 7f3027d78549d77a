use serde::{Deserialize, Serialize};

pub const ARCHIVE_VERSION: &str = "1.0";

/// One story exactly as the model returns it, before an id is attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryDraft {
    pub title: String,
    pub content: String,
    pub summary: String,
}

/// A story segment extracted from the pasted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedStory {
    pub id: String,
    pub title: String,
    pub content: String,
    pub summary: String,
}

impl ExtractedStory {
    pub fn from_draft(id: impl Into<String>, draft: StoryDraft) -> Self {
        Self {
            id: id.into(),
            title: draft.title,
            content: draft.content,
            summary: draft.summary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub original_word_count: usize,
    pub extracted_count: usize,
    pub processing_time_ms: u64,
}

impl ProcessingStats {
    pub fn new(source_text: &str, stories: &[ExtractedStory], processing_time_ms: u64) -> Self {
        Self {
            original_word_count: source_text.split_whitespace().count(),
            extracted_count: stories.len(),
            processing_time_ms,
        }
    }
}

/// A finished extraction run, saved as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionArchive {
    pub version: String,
    pub created_at: String,
    pub model: String,
    pub source_text: String,
    pub stats: ProcessingStats,
    pub stories: Vec<ExtractedStory>,
}

impl ExtractionArchive {
    pub fn new(
        model: impl Into<String>,
        source_text: impl Into<String>,
        stats: ProcessingStats,
        stories: Vec<ExtractedStory>,
    ) -> Self {
        Self {
            version: ARCHIVE_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            model: model.into(),
            source_text: source_text.into(),
            stats,
            stories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(id: &str) -> ExtractedStory {
        ExtractedStory {
            id: id.to_string(),
            title: "T".to_string(),
            content: "C".to_string(),
            summary: "S".to_string(),
        }
    }

    #[test]
    fn test_stats_count_words_and_stories() {
        let stats = ProcessingStats::new("one two\n\nthree  four ", &[story("a"), story("b")], 42);
        assert_eq!(stats.original_word_count, 4);
        assert_eq!(stats.extracted_count, 2);
        assert_eq!(stats.processing_time_ms, 42);
    }

    #[test]
    fn test_from_draft_keeps_fields() {
        let draft = StoryDraft {
            title: "A".to_string(),
            content: "Story A text.".to_string(),
            summary: "s1".to_string(),
        };
        let story = ExtractedStory::from_draft("story-1-0", draft);
        assert_eq!(story.id, "story-1-0");
        assert_eq!(story.title, "A");
        assert_eq!(story.content, "Story A text.");
        assert_eq!(story.summary, "s1");
    }

    #[test]
    fn test_archive_has_current_version() {
        let archive = ExtractionArchive::new(
            "gemini-2.5-flash",
            "text",
            ProcessingStats::new("text", &[], 0),
            Vec::new(),
        );
        assert_eq!(archive.version, ARCHIVE_VERSION);
        assert!(chrono::DateTime::parse_from_rfc3339(&archive.created_at).is_ok());
    }
}
