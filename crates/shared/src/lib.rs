// Public modules
pub mod cards;
pub mod config;
pub mod extraction;
pub mod io;
pub mod models;
pub mod render;
pub mod state;

// Re-export commonly used types
pub use cards::{AspectRatio, ArtStyle, IllustrationRequest, InputStats};
pub use config::Config;
pub use extraction::{ExtractionError, GeminiExtractor, StoryExtractor};
pub use io::{
    archive_filename, get_default_output_dir, get_default_stories_dir, list_archives,
    load_archive, save_archive, save_story_text,
};
pub use models::{ExtractedStory, ExtractionArchive, ProcessingStats, StoryDraft};
pub use render::StoryRenderer;
pub use state::{AppState, PendingRequest, View};
