//! Per-story presentation helpers: the text behind the copy, download and
//! illustration actions of a story card, and the counters shown next to the
//! input box.

use std::fmt;
use std::str::FromStr;

use crate::models::ExtractedStory;

const WORDS_PER_MINUTE: usize = 200;

/// Text placed on the clipboard and written to downloaded files.
pub fn clipboard_text(story: &ExtractedStory) -> String {
    format!("{}\n\n{}", story.title, story.content)
}

/// `{slug}.txt`, where the slug is the lowercased title with every
/// character outside `[a-z0-9]` replaced by `_`.
pub fn download_filename(title: &str) -> String {
    let slug: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.txt", slug)
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Minutes, rounded up, never below one.
pub fn reading_time_minutes(story: &ExtractedStory) -> usize {
    word_count(&story.content).div_ceil(WORDS_PER_MINUTE).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputStats {
    pub words: usize,
    pub chars: usize,
}

impl InputStats {
    pub fn of(text: &str) -> Self {
        Self {
            words: word_count(text),
            chars: text.chars().count(),
        }
    }
}

impl fmt::Display for InputStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} words | {} chars", self.words, self.chars)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtStyle {
    #[default]
    DigitalArt,
    Watercolor,
    OilPainting,
    MinimalistVector,
    Cyberpunk,
    PencilSketch,
}

impl ArtStyle {
    pub const ALL: [ArtStyle; 6] = [
        ArtStyle::DigitalArt,
        ArtStyle::Watercolor,
        ArtStyle::OilPainting,
        ArtStyle::MinimalistVector,
        ArtStyle::Cyberpunk,
        ArtStyle::PencilSketch,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ArtStyle::DigitalArt => "Digital Art",
            ArtStyle::Watercolor => "Watercolor",
            ArtStyle::OilPainting => "Oil Painting",
            ArtStyle::MinimalistVector => "Minimalist Vector",
            ArtStyle::Cyberpunk => "Cyberpunk",
            ArtStyle::PencilSketch => "Pencil Sketch",
        }
    }
}

impl FromStr for ArtStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown art style: {}", wanted))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    Landscape,
    Square,
    Portrait,
    Classic,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Landscape,
        AspectRatio::Square,
        AspectRatio::Portrait,
        AspectRatio::Classic,
    ];

    pub fn ratio(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Classic => "4:3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9 (Landscape)",
            AspectRatio::Square => "1:1 (Square)",
            AspectRatio::Portrait => "9:16 (Portrait)",
            AspectRatio::Classic => "4:3 (Classic)",
        }
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|ar| ar.ratio() == wanted || ar.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown aspect ratio: {}", wanted))
    }
}

/// Contents of the "Create Illustration" dialog for one story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllustrationRequest {
    pub prompt: String,
    pub style: ArtStyle,
    pub aspect_ratio: AspectRatio,
}

impl IllustrationRequest {
    pub fn for_story(story: &ExtractedStory) -> Self {
        Self {
            prompt: default_illustration_prompt(&story.title, &story.summary),
            style: ArtStyle::default(),
            aspect_ratio: AspectRatio::default(),
        }
    }

    /// The prompt as it would be sent to an image model.
    pub fn final_prompt(&self) -> String {
        format!(
            "{}\n\nArt style: {}\nAspect ratio: {}",
            self.prompt,
            self.style.label(),
            self.aspect_ratio.ratio()
        )
    }
}

pub fn default_illustration_prompt(title: &str, summary: &str) -> String {
    format!(
        "A digital illustration for a story titled \"{}\". \n\nScene description: {}",
        title, summary
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn story(title: &str, content: &str) -> ExtractedStory {
        ExtractedStory {
            id: "story-1-0".to_string(),
            title: title.to_string(),
            content: content.to_string(),
            summary: "A fox outwits a crow.".to_string(),
        }
    }

    #[test]
    fn test_clipboard_text_joins_title_and_content() {
        let s = story("The Fox", "Once there was a fox.");
        assert_eq!(clipboard_text(&s), "The Fox\n\nOnce there was a fox.");
    }

    #[test]
    fn test_download_filename_slug() {
        assert_eq!(download_filename("The Fox & The Crow!"), "the_fox___the_crow_.txt");
        assert_eq!(download_filename("Chapter 12"), "chapter_12.txt");
    }

    #[test]
    fn test_download_filename_replaces_non_ascii() {
        assert_eq!(download_filename("Café"), "caf_.txt");
    }

    #[test]
    fn test_reading_time_rounds_up() {
        assert_eq!(reading_time_minutes(&story("t", "word")), 1);
        assert_eq!(reading_time_minutes(&story("t", &"w ".repeat(200))), 1);
        assert_eq!(reading_time_minutes(&story("t", &"w ".repeat(201))), 2);
    }

    #[test]
    fn test_reading_time_of_empty_content() {
        assert_eq!(reading_time_minutes(&story("t", "")), 1);
        assert_eq!(reading_time_minutes(&story("t", "  \n ")), 1);
    }

    #[test]
    fn test_input_stats() {
        assert_eq!(InputStats::of(""), InputStats { words: 0, chars: 0 });
        assert_eq!(InputStats::of("   "), InputStats { words: 0, chars: 3 });
        let stats = InputStats::of("Once upon  a time");
        assert_eq!(stats.words, 4);
        assert_eq!(stats.to_string(), "4 words | 17 chars");
    }

    #[test]
    fn test_default_illustration_prompt() {
        let request = IllustrationRequest::for_story(&story("The Fox", "..."));
        assert_eq!(
            request.prompt,
            "A digital illustration for a story titled \"The Fox\". \n\nScene description: A fox outwits a crow."
        );
        assert_eq!(request.style, ArtStyle::DigitalArt);
        assert_eq!(request.aspect_ratio, AspectRatio::Landscape);
    }

    #[test]
    fn test_final_prompt_includes_choices() {
        let mut request = IllustrationRequest::for_story(&story("The Fox", "..."));
        request.style = ArtStyle::Watercolor;
        request.aspect_ratio = AspectRatio::Square;

        let prompt = request.final_prompt();
        assert!(prompt.ends_with("Art style: Watercolor\nAspect ratio: 1:1"));
    }

    #[test]
    fn test_parse_style_and_ratio() {
        assert_eq!("oil painting".parse::<ArtStyle>().unwrap(), ArtStyle::OilPainting);
        assert!("crayon".parse::<ArtStyle>().is_err());
        assert_eq!("9:16".parse::<AspectRatio>().unwrap(), AspectRatio::Portrait);
        assert_eq!(
            "4:3 (classic)".parse::<AspectRatio>().unwrap(),
            AspectRatio::Classic
        );
        assert!("2:1".parse::<AspectRatio>().is_err());
    }
}
