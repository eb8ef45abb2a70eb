use crate::config;
use crate::story::StoryVariables;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const STATE_FILE: &str = "book-state.json";
pub const CONTENT_FILE: &str = "content.md";
pub const IMAGES_DIR: &str = "images";

// --- Status state machine ---

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    NotGenerated,
    Generated,
    Wip,
    Accepted,
}

impl Status {
    /// Successful generation or regeneration. The only exit from
    /// `NotGenerated`; rejected once accepted.
    pub fn mark_generated(&mut self) -> Result<()> {
        if *self == Status::Accepted {
            bail!("already accepted; regeneration is not allowed");
        }
        *self = Status::Generated;
        Ok(())
    }

    pub fn mark_wip(&mut self) -> Result<()> {
        match self {
            Status::NotGenerated => bail!("nothing generated yet"),
            Status::Accepted => bail!("already accepted"),
            _ => {
                *self = Status::Wip;
                Ok(())
            }
        }
    }

    /// Terminal. Only reachable from `Generated` or `Wip`.
    pub fn mark_accepted(&mut self) -> Result<()> {
        match self {
            Status::NotGenerated => bail!("cannot accept before generating"),
            Status::Accepted => bail!("already accepted"),
            _ => {
                *self = Status::Accepted;
                Ok(())
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::NotGenerated => "not generated",
            Status::Generated => "generated",
            Status::Wip => "in progress",
            Status::Accepted => "accepted",
        }
    }
}

// --- Configuration ---

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatConfig {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: config::CHAT_MODELS[0].to_string(),
            temperature: 0.9,
            top_p: 1.0,
            frequency_penalty: 0.3,
            presence_penalty: 0.3,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImageProvider {
    Openai,
    Mystic,
}

impl FromStr for ImageProvider {
    type Err = anyhow::Error;

    // Strict: no default provider.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "openai" => Ok(ImageProvider::Openai),
            "mystic" => Ok(ImageProvider::Mystic),
            other => Err(anyhow!("unknown image provider: {}", other)),
        }
    }
}

impl std::fmt::Display for ImageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageProvider::Openai => write!(f, "openai"),
            ImageProvider::Mystic => write!(f, "mystic"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAiImageConfig {
    pub model: String,
    pub size: String,
}

impl Default for OpenAiImageConfig {
    fn default() -> Self {
        Self {
            model: config::OPENAI_IMAGE_MODELS[0].to_string(),
            size: config::OPENAI_IMAGE_SIZES[0].to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MysticConfig {
    pub model: String,
    pub engine: String,
    pub resolution: String,
    pub creative_detailing: u8,
}

impl Default for MysticConfig {
    fn default() -> Self {
        Self {
            model: config::MYSTIC_MODELS[0].to_string(),
            engine: config::MYSTIC_ENGINES[0].to_string(),
            resolution: config::MYSTIC_RESOLUTIONS[0].to_string(),
            creative_detailing: 33,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImageConfig {
    pub provider: ImageProvider,
    pub openai: Option<OpenAiImageConfig>,
    pub mystic: Option<MysticConfig>,
    pub style: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            provider: ImageProvider::Openai,
            openai: Some(OpenAiImageConfig::default()),
            mystic: None,
            style: config::STYLES[0].name.to_string(),
        }
    }
}

// --- Chapters ---

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LessonContext {
    pub example: String,
    pub summary: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ImageState {
    pub status: Status,
    pub prompt: Option<String>,
    pub temp_path: Option<String>,
    /// Monotonic; the uniqueness source for temp filenames.
    pub attempts: u32,
    pub style: Option<String>,
    pub preset: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub local_path: Option<String>,
}

/// Snapshot of the prompts and parameters that produced `Chapter::text`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationRecord {
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Chapter {
    pub id: String,
    pub topic: String,
    pub status: Status,
    pub text: Option<String>,
    pub lesson_context: Option<LessonContext>,
    #[serde(default)]
    pub image: ImageState,
    pub generation_config: Option<GenerationRecord>,
}

impl Chapter {
    fn new(id: &str, topic: &str, lesson_context: Option<LessonContext>) -> Self {
        Self {
            id: id.to_string(),
            topic: topic.to_string(),
            status: Status::NotGenerated,
            text: None,
            lesson_context,
            image: ImageState::default(),
            generation_config: None,
        }
    }
}

// --- BookState ---

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookState {
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub chat_config: ChatConfig,
    pub image_config: ImageConfig,
    pub story_variables: StoryVariables,
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub current_context: String,
}

impl BookState {
    /// Derives the chapter list deterministically from the lesson table:
    /// introduction, one chapter per (lesson x topic) in table order, conclusion.
    pub fn initialize(title: &str) -> Self {
        let mut chapters = vec![Chapter::new("introduction", "Introduction", None)];
        for lesson in config::LESSONS {
            for topic in lesson.topics {
                chapters.push(Chapter::new(
                    &format!("{}_{}", lesson.id, topic.key),
                    topic.title,
                    Some(LessonContext {
                        example: topic.example.to_string(),
                        summary: topic.summary.to_string(),
                    }),
                ));
            }
        }
        chapters.push(Chapter::new("conclusion", "Conclusion", None));

        Self {
            title: title.to_string(),
            created_at: Utc::now(),
            chat_config: ChatConfig::default(),
            image_config: ImageConfig::default(),
            story_variables: StoryVariables::default(),
            chapters,
            current_context: String::new(),
        }
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(STATE_FILE);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read book state at {:?}", path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse book state at {:?}", path))
    }

    // Whole-file overwrite; single interactive session per book directory.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create book directory {:?}", dir))?;
        let path = dir.join(STATE_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write book state at {:?}", path))?;
        Ok(())
    }

    /// First chapter still needing attention, in book order.
    pub fn next_pending(&self) -> Option<usize> {
        self.chapters.iter().position(|c| c.status != Status::Accepted)
    }
}

/// Appends one accepted chapter to `content.md`. Append-only and not
/// idempotent: accepting twice writes the section twice.
pub fn append_accepted(dir: &Path, topic: &str, text: &str) -> Result<()> {
    let path = dir.join(CONTENT_FILE);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open {:?}", path))?;
    write!(file, "\n\n## {}\n\n{}\n", topic, text)
        .with_context(|| format!("Failed to append to {:?}", path))?;
    Ok(())
}

// --- Book directory helpers ---

pub fn safe_name(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_underscore = false;
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_underscore = false;
        } else if !last_underscore && !out.is_empty() {
            out.push('_');
            last_underscore = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

pub fn books_root() -> PathBuf {
    PathBuf::from("books")
}

pub fn book_dir(root: &Path, title: &str) -> PathBuf {
    root.join(safe_name(title))
}

pub fn list_books(root: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    if !root.exists() {
        return Ok(names);
    }
    for entry in fs::read_dir(root).with_context(|| format!("Failed to list {:?}", root))? {
        let entry = entry?;
        if entry.path().is_dir() && entry.path().join(STATE_FILE).exists() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

pub fn delete_book(root: &Path, name: &str) -> Result<()> {
    let dir = root.join(name);
    fs::remove_dir_all(&dir).with_context(|| format!("Failed to delete book at {:?}", dir))
}
