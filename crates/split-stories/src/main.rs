use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use shared::{
    cards, get_default_output_dir, get_default_stories_dir, save_archive, save_story_text,
    AppState, AspectRatio, ArtStyle, Config, ExtractedStory, ExtractionArchive, GeminiExtractor,
    IllustrationRequest, ProcessingStats, StoryExtractor, StoryRenderer, View,
};
use std::fs;
use std::io::{self as stdio, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "split-stories")]
#[command(about = "Split a long narrative into titled, summarized stories with Gemini")]
struct Args {
    /// Text file to load into the input box (otherwise paste the text)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Gemini model id
    #[arg(short, long)]
    model: Option<String>,

    /// Directory for downloaded story files (default: Documents)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Do not save a JSON archive after each extraction
    #[arg(long)]
    no_archive: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum InputCommand {
    Process,
    Edit,
    DismissError,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
enum ResultsCommand {
    Read(usize),
    Copy(usize),
    Save(usize),
    Image(usize),
    SaveAll,
    Back,
    Quit,
}

fn parse_input_command(line: &str) -> Option<InputCommand> {
    match line.trim().to_lowercase().as_str() {
        "p" | "process" => Some(InputCommand::Process),
        "e" | "edit" => Some(InputCommand::Edit),
        "x" | "dismiss" => Some(InputCommand::DismissError),
        "q" | "quit" => Some(InputCommand::Quit),
        _ => None,
    }
}

fn parse_results_command(line: &str) -> Option<ResultsCommand> {
    let mut words = line.split_whitespace();
    let verb = words.next()?.to_lowercase();
    let number = words.next().and_then(|n| n.parse::<usize>().ok());

    match (verb.as_str(), number) {
        ("read", Some(n)) => Some(ResultsCommand::Read(n)),
        ("copy", Some(n)) => Some(ResultsCommand::Copy(n)),
        ("save", Some(n)) => Some(ResultsCommand::Save(n)),
        ("image", Some(n)) => Some(ResultsCommand::Image(n)),
        ("all", None) => Some(ResultsCommand::SaveAll),
        ("back" | "b", None) => Some(ResultsCommand::Back),
        ("q" | "quit", None) => Some(ResultsCommand::Quit),
        _ => None,
    }
}

/// Read one line; `None` on end of input.
fn prompt(message: &str) -> Result<Option<String>> {
    print!("{}", message);
    stdio::stdout().flush()?;

    let mut input = String::new();
    if stdio::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(['\r', '\n']).to_string()))
}

fn read_pasted_text() -> Result<String> {
    println!("Paste your full text, then finish with a line containing only '.' (or Ctrl-D):");

    let mut lines = Vec::new();
    for line in stdio::stdin().lock().lines() {
        let line = line.context("Failed to read text from stdin")?;
        if line.trim() == "." {
            break;
        }
        lines.push(line);
    }

    Ok(lines.join("\n"))
}

fn story_at(stories: &[ExtractedStory], number: usize) -> Option<&ExtractedStory> {
    number.checked_sub(1).and_then(|i| stories.get(i))
}

fn archive_run(state: &AppState, model: &str) -> Result<PathBuf> {
    let stats = state
        .stats()
        .unwrap_or_else(|| ProcessingStats::new(state.input_text(), state.stories(), 0));
    let data = ExtractionArchive::new(
        model,
        state.input_text(),
        stats,
        state.stories().to_vec(),
    );

    let dir = get_default_stories_dir()?;
    save_archive(&data, &dir, &shared::archive_filename(Utc::now()))
}

fn choose<T: Copy + std::str::FromStr<Err = String>>(
    message: &str,
    current: T,
) -> Result<T> {
    loop {
        let Some(answer) = prompt(message)? else {
            return Ok(current);
        };
        if answer.trim().is_empty() {
            return Ok(current);
        }
        match answer.parse::<T>() {
            Ok(value) => return Ok(value),
            Err(e) => println!("{}", e),
        }
    }
}

fn run_illustration_modal(story: &ExtractedStory) -> Result<()> {
    let mut request = IllustrationRequest::for_story(story);

    println!("\n🎨 Create Illustration");
    println!("Image Prompt (AI suggestion based on your story):\n");
    println!("{}\n", request.prompt);

    let styles: Vec<&str> = ArtStyle::ALL.iter().map(|s| s.label()).collect();
    println!("Art Style: {}", styles.join(", "));
    request.style = choose(
        &format!("Choose a style [{}]: ", request.style.label()),
        request.style,
    )?;

    let ratios: Vec<&str> = AspectRatio::ALL.iter().map(|a| a.label()).collect();
    println!("Aspect Ratio: {}", ratios.join(", "));
    request.aspect_ratio = choose(
        &format!("Choose an aspect ratio [{}]: ", request.aspect_ratio.ratio()),
        request.aspect_ratio,
    )?;

    println!("\n--- Final image prompt ---\n{}\n--------------------------", request.final_prompt());
    Ok(())
}

fn save_one(story: &ExtractedStory, output_dir: &Path) {
    match save_story_text(story, output_dir) {
        Ok(path) => println!("✓ Saved to {}", path.display()),
        Err(e) => println!("✗ Could not save \"{}\": {:#}", story.title, e),
    }
}

async fn process(
    state: &mut AppState,
    draft: &str,
    extractor: &dyn StoryExtractor,
) -> bool {
    let Some(request) = state.begin_submit(draft) else {
        return false;
    };

    println!("\n{}", StoryRenderer::input_view(state.input_text(), state.is_loading()));
    let outcome = extractor.extract(request.text()).await;
    state.complete(request, outcome);
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(stdio::stderr))
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(model) = args.model {
        config = config.with_model(model);
    }

    let extractor = GeminiExtractor::new(&config)?;
    let output_dir = args.output_dir.unwrap_or_else(get_default_output_dir);

    let mut draft = match args.file {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read text file: {}", path.display()))?,
        None => read_pasted_text()?,
    };

    let mut state = AppState::new();

    loop {
        match state.view() {
            View::Input => {
                println!();
                if let Some(error) = state.error() {
                    println!("{}", StoryRenderer::error_banner(error));
                }
                println!("{}", StoryRenderer::input_view(&draft, state.is_loading()));

                let Some(line) = prompt("[p]rocess  [e]dit text  [x] dismiss error  [q]uit: ")?
                else {
                    break;
                };

                match parse_input_command(&line) {
                    Some(InputCommand::Process) => {
                        if !process(&mut state, &draft, &extractor).await {
                            println!("Please paste some text first.");
                            continue;
                        }

                        if state.view() == View::Results {
                            if let Some(stats) = state.stats() {
                                println!(
                                    "✓ Found {} stories in {} words ({:.1}s)",
                                    stats.extracted_count,
                                    stats.original_word_count,
                                    stats.processing_time_ms as f64 / 1000.0
                                );
                            }
                            if !args.no_archive {
                                match archive_run(&state, extractor.model()) {
                                    Ok(path) => println!("✓ Archived to {}", path.display()),
                                    Err(e) => tracing::warn!("Could not archive run: {:#}", e),
                                }
                            }
                        }
                    }
                    Some(InputCommand::Edit) => draft = read_pasted_text()?,
                    Some(InputCommand::DismissError) => state.dismiss_error(),
                    Some(InputCommand::Quit) => break,
                    None => println!("Unknown command."),
                }
            }
            View::Results => {
                println!("\n{}", StoryRenderer::results_view(state.stories()));

                let Some(line) =
                    prompt("read N | copy N | save N | image N | all | back | q: ")?
                else {
                    break;
                };

                let stories = state.stories();
                match parse_results_command(&line) {
                    Some(ResultsCommand::Read(n)) => match story_at(stories, n) {
                        Some(story) => println!(
                            "\n{}\n\n> {}\n\n{}\n",
                            story.title, story.summary, story.content
                        ),
                        None => println!("No story #{}.", n),
                    },
                    Some(ResultsCommand::Copy(n)) => match story_at(stories, n) {
                        Some(story) => println!("\n{}\n", cards::clipboard_text(story)),
                        None => println!("No story #{}.", n),
                    },
                    Some(ResultsCommand::Save(n)) => match story_at(stories, n) {
                        Some(story) => save_one(story, &output_dir),
                        None => println!("No story #{}.", n),
                    },
                    Some(ResultsCommand::Image(n)) => match story_at(stories, n) {
                        Some(story) => run_illustration_modal(story)?,
                        None => println!("No story #{}.", n),
                    },
                    Some(ResultsCommand::SaveAll) => {
                        for story in stories {
                            save_one(story, &output_dir);
                        }
                    }
                    Some(ResultsCommand::Back) => {
                        // Keep the submitted text as the draft
                        draft = state.input_text().to_string();
                        state.back();
                    }
                    Some(ResultsCommand::Quit) => break,
                    None => println!("Unknown command."),
                }
            }
        }
    }

    Ok(())
}
