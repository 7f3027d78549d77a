use anyhow::{Context, Result};
use chrono::DateTime;
use clap::Parser;
use shared::{
    get_default_output_dir, get_default_stories_dir, list_archives, load_archive,
    save_story_text, StoryRenderer,
};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "export-stories")]
#[command(about = "Export a saved story archive as an HTML card page and text files")]
struct Args {
    /// Path to the archive JSON (if not provided, will list saved archives)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Directory to write into (default: Documents)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let archive_file = if let Some(path) = args.file {
        path
    } else {
        select_archive_file()?
    };

    println!("📖 Reading archive: {}", archive_file.display());
    let archive = load_archive(&archive_file)?;
    tracing::debug!(
        path = %archive_file.display(),
        version = %archive.version,
        stories = archive.stories.len(),
        "archive loaded"
    );
    println!(
        "✓ {} stories from {} words of text (model {})",
        archive.stories.len(),
        archive.stats.original_word_count,
        archive.model
    );

    let created_at = DateTime::parse_from_rfc3339(&archive.created_at)
        .with_context(|| format!("Invalid archive timestamp: {}", archive.created_at))?
        .with_timezone(&chrono::Utc);

    let output_dir = args.output_dir.unwrap_or_else(get_default_output_dir);
    let stem = archive_stem(&archive_file)?;
    tracing::debug!(output_dir = %output_dir.display(), %stem, "export target");

    println!("\n📝 Generating HTML cards...");
    let html = StoryRenderer::generate_html(&archive.stories, created_at);
    let html_path =
        StoryRenderer::save_html(&html, &output_dir, &stem).context("Failed to save HTML file")?;
    println!("✓ HTML saved to: {}", html_path.display());

    if !archive.stories.is_empty() {
        println!("\n📄 Writing story text files...");
        let text_dir = output_dir.join(&stem);
        for story in &archive.stories {
            let path = save_story_text(story, &text_dir)?;
            tracing::info!(id = %story.id, path = %path.display(), "story text written");
            println!("  ✓ {}", path.display());
        }
    }

    println!("\n✅ Done!");

    Ok(())
}

fn archive_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Invalid filename: {}", path.display()))
}

fn select_archive_file() -> Result<PathBuf> {
    let stories_dir = get_default_stories_dir()?;
    let archives = list_archives(&stories_dir)?;

    if archives.is_empty() {
        anyhow::bail!(
            "No story archives found in {}. Run split-stories first.",
            stories_dir.display()
        );
    }

    println!("Available archives:\n");
    for (i, (path, archive)) in archives.iter().enumerate() {
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_default();
        let created = DateTime::parse_from_rfc3339(&archive.created_at)
            .map(|dt| dt.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        println!(
            "  {}) {} ({} stories, created {})",
            i + 1,
            filename,
            archive.stories.len(),
            created
        );
    }

    print!("\nSelect archive (1-{}): ", archives.len());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let selection: usize = input
        .trim()
        .parse()
        .context("Invalid selection. Please enter a number.")?;

    if selection < 1 || selection > archives.len() {
        anyhow::bail!("Selection out of range. Please choose 1-{}", archives.len());
    }

    let selected = archives[selection - 1].0.clone();
    tracing::debug!(selection, path = %selected.display(), "archive selected");
    Ok(selected)
}
