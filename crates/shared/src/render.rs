use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cards::{self, InputStats};
use crate::models::ExtractedStory;

const PREVIEW_CHARS: usize = 280;

pub struct StoryRenderer;

impl StoryRenderer {
    pub fn input_view(text: &str, is_loading: bool) -> String {
        let mut out = String::new();
        out.push_str("Narrative Extractor\n");
        out.push_str(
            "Paste your long narrative below. AI will intelligently separate distinct stories,\n\
             give them titles, and summarize them for you.\n\n",
        );
        out.push_str(&format!("[{}]\n", InputStats::of(text)));

        if text.trim().is_empty() {
            out.push_str("  (no text yet)\n");
        } else {
            out.push_str(&format!("  {}\n", Self::preview(text).replace('\n', "\n  ")));
        }

        if is_loading {
            out.push_str("\nAnalyzing narrative structure...\n");
            out.push_str("This might take a moment depending on the length of your story.\n");
        }

        out
    }

    pub fn error_banner(message: &str) -> String {
        format!("⚠ Processing Error\n  {}\n  (x to dismiss)\n", message)
    }

    pub fn results_view(stories: &[ExtractedStory]) -> String {
        let mut out = String::new();
        out.push_str("Extracted Stories\n");
        out.push_str(&format!("Found {} distinct segments\n\n", stories.len()));

        if stories.is_empty() {
            out.push_str("No stories found. Please try again with different text.\n");
            return out;
        }

        for (index, story) in stories.iter().enumerate() {
            out.push_str(&Self::card(index + 1, story));
            out.push('\n');
        }

        out
    }

    pub fn card(number: usize, story: &ExtractedStory) -> String {
        let words = cards::word_count(&story.content);
        let mut out = String::new();
        out.push_str(&format!(
            "{}. {}  [{} min read]\n",
            number,
            story.title,
            cards::reading_time_minutes(story)
        ));
        out.push_str(&format!("   > {}\n", story.summary));
        out.push_str(&format!(
            "   {}\n",
            Self::preview(&story.content).replace('\n', "\n   ")
        ));
        out.push_str(&format!("   ({} words)\n", words));
        out
    }

    /// First few hundred characters, cut on a char boundary.
    pub fn preview(text: &str) -> String {
        let text = text.trim();
        match text.char_indices().nth(PREVIEW_CHARS) {
            Some((end, _)) => format!("{}…", &text[..end]),
            None => text.to_string(),
        }
    }

    pub fn generate_html(stories: &[ExtractedStory], created_at: DateTime<Utc>) -> String {
        let mut html = String::new();

        let formatted_date = created_at.format("%A, %-d %B %Y").to_string();

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        html.push_str("  <meta charset=\"UTF-8\">\n");
        html.push_str(&format!(
            "  <title>Extracted Stories - {}</title>\n",
            formatted_date
        ));
        html.push_str("  <style>\n");
        html.push_str("    body { font-family: Arial, sans-serif; max-width: 1100px; margin: 40px auto; padding: 0 20px; line-height: 1.6; background: #f8fafc; }\n");
        html.push_str("    h1 { color: #0f172a; border-bottom: 3px solid #6366f1; padding-bottom: 10px; }\n");
        html.push_str("    .count { color: #64748b; margin-top: -10px; }\n");
        html.push_str("    .grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(420px, 1fr)); gap: 32px; }\n");
        html.push_str("    article { background: #fff; border: 1px solid #e2e8f0; border-radius: 12px; padding: 24px; }\n");
        html.push_str("    article h2 { margin: 0 0 12px 0; color: #1e293b; font-size: 1.25em; }\n");
        html.push_str("    .badge { font-size: 0.75em; color: #4338ca; background: #eef2ff; border-radius: 999px; padding: 2px 10px; white-space: nowrap; }\n");
        html.push_str("    .summary { color: #64748b; font-style: italic; border-left: 4px solid #c7d2fe; padding-left: 12px; }\n");
        html.push_str("    .content { white-space: pre-wrap; color: #334155; }\n");
        html.push_str("    .footer { font-size: 0.75em; color: #94a3b8; border-top: 1px solid #f1f5f9; padding-top: 12px; }\n");
        html.push_str("    .empty { text-align: center; padding: 80px 0; opacity: 0.5; }\n");
        html.push_str("  </style>\n");
        html.push_str("</head>\n<body>\n");

        html.push_str("<h1>Extracted Stories</h1>\n");
        html.push_str(&format!(
            "<p class=\"count\">Found {} distinct segments &middot; {}</p>\n",
            stories.len(),
            formatted_date
        ));

        if stories.is_empty() {
            html.push_str(
                "<p class=\"empty\">No stories found. Please try again with different text.</p>\n",
            );
        } else {
            html.push_str("<div class=\"grid\">\n");
            for story in stories {
                html.push_str(&format!(
                    "  <article id=\"{}\">\n",
                    Self::escape_html(&story.id)
                ));
                html.push_str(&format!(
                    "    <h2>{} <span class=\"badge\">{} min read</span></h2>\n",
                    Self::escape_html(&story.title),
                    cards::reading_time_minutes(story)
                ));
                html.push_str(&format!(
                    "    <p class=\"summary\">{}</p>\n",
                    Self::escape_html(&story.summary)
                ));
                html.push_str(&format!(
                    "    <p class=\"content\">{}</p>\n",
                    Self::escape_html(&story.content)
                ));
                html.push_str(&format!(
                    "    <div class=\"footer\">{} words &middot; {}</div>\n",
                    cards::word_count(&story.content),
                    Self::escape_html(&cards::download_filename(&story.title))
                ));
                html.push_str("  </article>\n");
            }
            html.push_str("</div>\n");
        }

        html.push_str("</body>\n</html>");
        html
    }

    fn escape_html(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }

    pub fn save_html(content: &str, output_dir: &Path, stem: &str) -> Result<PathBuf> {
        fs::create_dir_all(output_dir).context("Failed to create output directory")?;

        let filepath = output_dir.join(format!("{}.html", stem));
        fs::write(&filepath, content).context("Failed to write HTML file")?;

        Ok(filepath)
    }
}
