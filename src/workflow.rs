use crate::book::{
    self, append_accepted, BookState, ImageConfig, ImageProvider, MysticConfig,
    OpenAiImageConfig, Status,
};
use crate::config;
use crate::image;
use crate::llm::{self, ChatClient};
use crate::prompts;
use crate::story;
use anyhow::{Context, Result};
use chrono::Utc;
use inquire::validator::Validation;
use inquire::{Confirm, CustomType, Editor, Select, Text};
use log::info;
use std::path::PathBuf;

/// How much accepted prose is kept as continuity input for later chapters.
const CONTEXT_WINDOW_CHARS: usize = 8000;

/// Top-level menu loop. Every error from a sub-flow is printed and the menu
/// is shown again; nothing is retried automatically.
pub async fn run() -> Result<()> {
    let root = book::books_root();
    loop {
        let choice = Select::new(
            "What would you like to do?",
            vec!["Create a new book", "Open a book", "Delete a book", "Exit"],
        )
        .prompt()?;

        let outcome = match choice {
            "Create a new book" => create_book(&root).await,
            "Open a book" => open_book(&root).await,
            "Delete a book" => delete_book(&root),
            _ => return Ok(()),
        };

        if let Err(e) = outcome {
            eprintln!("Error: {:#}", e);
        }
    }
}

async fn create_book(root: &PathBuf) -> Result<()> {
    let title = Text::new("Book title:")
        .with_validator(inquire::required!("The title cannot be empty"))
        .with_validator(validate_title)
        .prompt()?;
    let title = title.trim().to_string();

    let dir = book::book_dir(root, &title);
    if dir.join(book::STATE_FILE).exists() {
        anyhow::bail!("A book named '{}' already exists at {:?}", title, dir);
    }

    let mut state = BookState::initialize(&title);
    state.chat_config = prompt_chat_config(&state.chat_config)?;
    state.image_config = prompt_image_config(&state.image_config)?;

    if Confirm::new("Set up story variables now?")
        .with_default(true)
        .prompt()?
    {
        story::edit_story_variables(&mut state.story_variables)?;
    }

    state.save(&dir)?;
    info!("created book '{}' with {} chapters", title, state.chapters.len());
    println!(
        "Created '{}' with {} chapters (introduction through conclusion).",
        title,
        state.chapters.len()
    );

    run_book_session(dir, state).await
}

async fn open_book(root: &PathBuf) -> Result<()> {
    let books = book::list_books(root)?;
    if books.is_empty() {
        println!("No books yet. Create one first.");
        return Ok(());
    }

    let name = Select::new("Open which book?", books).prompt()?;
    let dir = root.join(&name);
    let state = BookState::load(&dir)?;
    run_book_session(dir, state).await
}

fn delete_book(root: &PathBuf) -> Result<()> {
    let books = book::list_books(root)?;
    if books.is_empty() {
        println!("No books to delete.");
        return Ok(());
    }

    let name = Select::new("Delete which book?", books).prompt()?;
    let confirmed = Confirm::new(&format!("Really delete '{}' and all its files?", name))
        .with_default(false)
        .prompt()?;
    if confirmed {
        book::delete_book(root, &name)?;
        println!("Deleted '{}'.", name);
    }
    Ok(())
}

// --- Book session ---

struct BookSession {
    dir: PathBuf,
    state: BookState,
    llm: Box<dyn ChatClient>,
}

async fn run_book_session(dir: PathBuf, state: BookState) -> Result<()> {
    // Text generation needs the key regardless of image provider; fail fast
    // before any menu work rather than mid-chapter.
    let api_key = config::openai_api_key()?;
    let llm = llm::create_chat_client(&api_key, &state.chat_config);

    let mut session = BookSession { dir, state, llm };
    session.run().await
}

impl BookSession {
    async fn run(&mut self) -> Result<()> {
        loop {
            let choice = Select::new(
                &format!("[{}] What next?", self.state.title),
                vec![
                    "Next chapter needing attention",
                    "Select a chapter",
                    "Book status",
                    "Edit story variables",
                    "Update configuration",
                    "Back",
                ],
            )
            .prompt()?;

            let outcome = match choice {
                "Next chapter needing attention" => match self.state.next_pending() {
                    Some(idx) => self.chapter_menu(idx).await,
                    None => {
                        println!("Every chapter is accepted. The book is complete!");
                        Ok(())
                    }
                },
                "Select a chapter" => self.select_chapter().await,
                "Book status" => {
                    self.print_status();
                    Ok(())
                }
                "Edit story variables" => {
                    if story::edit_story_variables(&mut self.state.story_variables)? {
                        self.save()?;
                    }
                    Ok(())
                }
                "Update configuration" => self.update_config(),
                _ => return Ok(()),
            };

            if let Err(e) = outcome {
                eprintln!("Error: {:#}", e);
            }
        }
    }

    fn save(&self) -> Result<()> {
        self.state.save(&self.dir)
    }

    fn print_status(&self) {
        println!("\n{} (created {})", self.state.title, self.state.created_at.format("%Y-%m-%d"));
        for chapter in &self.state.chapters {
            println!(
                "  {:<35} text: {:<13} image: {}",
                chapter.topic,
                chapter.status.label(),
                chapter.image.status.label()
            );
        }
        println!();
    }

    async fn select_chapter(&mut self) -> Result<()> {
        let options: Vec<String> = self
            .state
            .chapters
            .iter()
            .map(|c| format!("{} [{}]", c.topic, c.status.label()))
            .collect();
        let choice = Select::new("Which chapter?", options.clone()).prompt()?;
        let idx = options
            .iter()
            .position(|o| *o == choice)
            .context("chapter selection out of range")?;
        self.chapter_menu(idx).await
    }

    async fn chapter_menu(&mut self, idx: usize) -> Result<()> {
        loop {
            let chapter = &self.state.chapters[idx];
            let header = format!("Chapter: {} [{}]", chapter.topic, chapter.status.label());

            // Accepted is terminal: no regeneration or status changes offered.
            let mut options = Vec::new();
            if chapter.status == Status::Accepted {
                options.push("Review");
            } else if chapter.text.is_none() {
                options.push("Generate chapter");
            } else {
                options.push("Regenerate or personalize");
                options.push("Review");
                options.push("Mark as work in progress");
                options.push("Accept chapter");
            }
            options.push("Back");

            let choice = Select::new(&header, options).prompt()?;
            let outcome = match choice {
                "Generate chapter" => self.generate_text(idx, false).await,
                "Regenerate or personalize" => self.regenerate_menu(idx).await,
                "Review" => self.review(idx).await,
                "Mark as work in progress" => self.mark_wip(idx),
                "Accept chapter" => self.accept_chapter(idx),
                _ => return Ok(()),
            };

            if let Err(e) = outcome {
                eprintln!("Error: {:#}", e);
            }
        }
    }

    async fn regenerate_menu(&mut self, idx: usize) -> Result<()> {
        let choice = Select::new(
            "How?",
            vec![
                "Regenerate a fresh draft",
                "Personalize with story variables",
                "Cancel",
            ],
        )
        .prompt()?;
        match choice {
            "Regenerate a fresh draft" => self.generate_text(idx, false).await,
            "Personalize with story variables" => self.generate_text(idx, true).await,
            _ => Ok(()),
        }
    }

    /// One generation call. Initial mode builds a minimal-context prompt;
    /// personalization mode sends an edit directive over the existing text.
    /// A failed call leaves the chapter untouched.
    async fn generate_text(&mut self, idx: usize, personalize: bool) -> Result<()> {
        let chapter = &self.state.chapters[idx];
        let topic = chapter.topic.clone();
        let subtopics = chapter_subtopics(&chapter.id);
        let subtopic_refs: Vec<&str> = subtopics.iter().map(String::as_str).collect();

        let directive = if personalize {
            let text = chapter
                .text
                .clone()
                .context("nothing to personalize yet; generate the chapter first")?;
            Some(prompts::personalization_prompt(
                &text,
                &self.state.story_variables.pruned_context(),
                &self.state.story_variables.protagonist.gender,
            ))
        } else if self.state.current_context.is_empty() {
            None
        } else {
            Some(self.state.current_context.clone())
        };

        println!("Generating '{}'...", topic);
        let generated = llm::generate_chapter(
            self.llm.as_ref(),
            &topic,
            &subtopic_refs,
            &self.state.story_variables.protagonist.name,
            &self.state.story_variables.protagonist.age,
            directive.as_deref(),
        )
        .await?;

        let chapter = &mut self.state.chapters[idx];
        chapter.status.mark_generated()?;
        chapter.text = Some(generated.text);
        chapter.generation_config = Some(book::GenerationRecord {
            system_prompt: generated.system_prompt,
            user_prompt: generated.user_prompt,
            model: self.state.chat_config.model.clone(),
            temperature: self.state.chat_config.temperature,
        });
        self.save()?;
        println!("Done. Review the chapter when you are ready.");
        Ok(())
    }

    async fn review(&mut self, idx: usize) -> Result<()> {
        loop {
            let chapter = &self.state.chapters[idx];
            let text = chapter
                .text
                .clone()
                .context("nothing to review; generate the chapter first")?;

            println!("\n--- {} ---\n{}\n", chapter.topic, text);
            if let Some(path) = &chapter.image.local_path {
                println!("Illustration: {} ({})", path, chapter.image.status.label());
            } else if let Some(path) = &chapter.image.temp_path {
                println!("Draft illustration: {} ({})", path, chapter.image.status.label());
            }

            let mut options = Vec::new();
            if matches!(chapter.status, Status::Generated | Status::Wip) {
                options.push("Accept chapter");
                options.push("Mark as work in progress");
                options.push("Edit text in editor");
            }
            if chapter.image.status != Status::Accepted {
                options.push("Illustrate");
            }
            options.push("Back");

            let choice = Select::new("Review:", options).prompt()?;
            let outcome = match choice {
                "Accept chapter" => {
                    self.accept_chapter(idx)?;
                    return Ok(());
                }
                "Mark as work in progress" => {
                    self.mark_wip(idx)?;
                    return Ok(());
                }
                "Edit text in editor" => self.edit_text(idx),
                "Illustrate" => self.illustrate(idx).await,
                _ => return Ok(()),
            };

            if let Err(e) = outcome {
                eprintln!("Error: {:#}", e);
            }
        }
    }

    /// Opens $EDITOR / $VISUAL on the chapter text.
    fn edit_text(&mut self, idx: usize) -> Result<()> {
        let current = self.state.chapters[idx]
            .text
            .clone()
            .unwrap_or_default();
        let edited = Editor::new("Edit the chapter text:")
            .with_predefined_text(&current)
            .prompt()?;
        if edited != current {
            self.state.chapters[idx].text = Some(edited);
            self.save()?;
            println!("Text updated.");
        }
        Ok(())
    }

    fn mark_wip(&mut self, idx: usize) -> Result<()> {
        self.state.chapters[idx].status.mark_wip()?;
        self.save()?;
        println!("Marked as work in progress.");
        Ok(())
    }

    /// Terminal transition: sets accepted, appends to content.md, folds the
    /// prose into the continuity context. The append is not idempotent.
    fn accept_chapter(&mut self, idx: usize) -> Result<()> {
        let (topic, text) = {
            let chapter = &self.state.chapters[idx];
            (
                chapter.topic.clone(),
                chapter
                    .text
                    .clone()
                    .context("cannot accept a chapter with no text")?,
            )
        };

        self.state.chapters[idx].status.mark_accepted()?;
        append_accepted(&self.dir, &topic, &text)?;
        self.fold_context(&topic, &text);
        self.save()?;
        println!("Accepted '{}'. Appended to content.md.", topic);
        Ok(())
    }

    fn fold_context(&mut self, topic: &str, text: &str) {
        self.state
            .current_context
            .push_str(&format!("\n\n[{}]\n{}", topic, text));

        // Keep only the tail of the running narrative, on a char boundary.
        let ctx = &mut self.state.current_context;
        if ctx.len() > CONTEXT_WINDOW_CHARS {
            let mut cut = ctx.len() - CONTEXT_WINDOW_CHARS;
            while !ctx.is_char_boundary(cut) {
                cut += 1;
            }
            *ctx = ctx.split_off(cut);
        }
    }

    // --- Illustration flow ---

    async fn illustrate(&mut self, idx: usize) -> Result<()> {
        let (topic, text) = {
            let chapter = &self.state.chapters[idx];
            // Accepted illustrations are final; bail before any mutation or
            // provider call.
            if chapter.image.status == Status::Accepted {
                println!("The illustration for '{}' is already accepted.", chapter.topic);
                return Ok(());
            }
            (
                chapter.topic.clone(),
                chapter
                    .text
                    .clone()
                    .context("generate the chapter before illustrating it")?,
            )
        };

        println!("Asking the model for the most visual moment...");
        let Some(scene) = llm::select_scene(self.llm.as_ref(), &text, &topic).await? else {
            println!("Could not pick a scene from this chapter.");
            return Ok(());
        };
        println!("\nScene: {}\nImage summary: {}\n", scene.scene, scene.summary);

        let mut preset_options: Vec<&str> =
            config::PRESETS.iter().map(|p| p.name).collect();
        preset_options.push("none");
        let preset = Select::new("Composition preset:", preset_options).prompt()?;
        let preset = (preset != "none").then(|| preset.to_string());

        let built = prompts::illustration_prompt(
            Some(&self.state.image_config.style),
            preset.as_deref(),
            Some(&scene.summary),
        )?;
        let mut prompt = Text::new("Image prompt:").with_initial_value(&built).prompt()?;

        loop {
            println!(
                "Generating image (attempt {})...",
                self.state.chapters[idx].image.attempts + 1
            );
            match self.attempt_illustration(idx, &prompt, preset.as_deref()).await {
                Ok(path) => println!("Image written to {:?}", path),
                Err(e) => {
                    // Failed call: nothing was mutated or persisted.
                    eprintln!("Image generation failed: {:#}", e);
                    return Ok(());
                }
            }

            let choice = Select::new(
                "Image:",
                vec![
                    "Accept image",
                    "Retry with the same prompt",
                    "Modify prompt and retry",
                    "Decide later",
                ],
            )
            .prompt()?;

            match choice {
                "Accept image" => {
                    self.accept_image(idx)?;
                    return Ok(());
                }
                "Retry with the same prompt" => continue,
                "Modify prompt and retry" => {
                    prompt = Text::new("Image prompt:").with_initial_value(&prompt).prompt()?;
                    continue;
                }
                _ => {
                    self.state.chapters[idx].image.status.mark_wip()?;
                    self.save()?;
                    return Ok(());
                }
            }
        }
    }

    /// One provider call. The image record is only touched after the call
    /// succeeds, so a failure leaves status, metadata and the state file
    /// exactly as they were.
    async fn attempt_illustration(
        &mut self,
        idx: usize,
        prompt: &str,
        preset: Option<&str>,
    ) -> Result<PathBuf> {
        let chapter_id = self.state.chapters[idx].id.clone();
        let attempt = self.state.chapters[idx].image.attempts + 1;
        let temp = image::temp_image_path(
            &image::scratch_dir(),
            &book::safe_name(&self.state.title),
            &chapter_id,
            attempt,
            Utc::now(),
        );

        let path = image::generate_image(&self.state.image_config, prompt, &temp).await?;

        let chapter = &mut self.state.chapters[idx];
        chapter.image.status.mark_generated()?;
        chapter.image.attempts = attempt;
        chapter.image.prompt = Some(prompt.to_string());
        chapter.image.style = Some(self.state.image_config.style.clone());
        chapter.image.preset = preset.map(str::to_string);
        chapter.image.timestamp = Some(Utc::now());
        chapter.image.temp_path = Some(path.to_string_lossy().to_string());
        self.save()?;
        Ok(path)
    }

    /// Moves the accepted draft into the book's images directory.
    fn accept_image(&mut self, idx: usize) -> Result<()> {
        let chapter = &self.state.chapters[idx];
        let temp = chapter
            .image
            .temp_path
            .clone()
            .context("no generated image to accept")?;
        let dest = self
            .dir
            .join(book::IMAGES_DIR)
            .join(format!("chapter_{}_image.png", chapter.id));

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        std::fs::copy(&temp, &dest)
            .with_context(|| format!("Failed to copy {:?} to {:?}", temp, dest))?;

        let chapter = &mut self.state.chapters[idx];
        chapter.image.status.mark_accepted()?;
        chapter.image.local_path = Some(dest.to_string_lossy().to_string());
        self.save()?;
        println!("Illustration saved to {:?}", dest);
        Ok(())
    }

    // --- Configuration ---

    fn update_config(&mut self) -> Result<()> {
        let choice = Select::new(
            "Update what?",
            vec!["Chat model & sampling", "Image provider & style", "Back"],
        )
        .prompt()?;

        match choice {
            "Chat model & sampling" => {
                self.state.chat_config = prompt_chat_config(&self.state.chat_config)?;
                let api_key = config::openai_api_key()?;
                self.llm = llm::create_chat_client(&api_key, &self.state.chat_config);
                self.save()?;
            }
            "Image provider & style" => {
                self.state.image_config = prompt_image_config(&self.state.image_config)?;
                self.save()?;
            }
            _ => {}
        }
        Ok(())
    }
}

/// Introduction and conclusion get synthetic subtopic lists derived from the
/// lesson table; lesson chapters use their configured subtopics.
fn chapter_subtopics(chapter_id: &str) -> Vec<String> {
    let lesson_titles = || {
        config::LESSONS
            .iter()
            .map(|l| l.title.to_lowercase())
            .collect::<Vec<_>>()
            .join(", ")
    };

    match chapter_id {
        "introduction" => vec![
            "meeting the hero and their everyday world".to_string(),
            format!("a playful hint of the adventures ahead: {}", lesson_titles()),
            "why money questions pop up in the hero's life".to_string(),
        ],
        "conclusion" => vec![
            "looking back at the hero's journey".to_string(),
            format!("gently revisiting the big ideas: {}", lesson_titles()),
            "sending the reader off with confidence to try these ideas".to_string(),
        ],
        id => config::topic_for_chapter_id(id)
            .map(|t| t.subtopics.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default(),
    }
}

// --- Interactive config prompts ---

fn prompt_chat_config(current: &book::ChatConfig) -> Result<book::ChatConfig> {
    let model = Select::new("Chat model:", config::CHAT_MODELS.to_vec())
        .prompt()?
        .to_string();
    let temperature = prompt_f32("Temperature:", current.temperature, 0.0, 2.0)?;
    let top_p = prompt_f32("Top-p:", current.top_p, 0.0, 1.0)?;
    let frequency_penalty =
        prompt_f32("Frequency penalty:", current.frequency_penalty, -2.0, 2.0)?;
    let presence_penalty =
        prompt_f32("Presence penalty:", current.presence_penalty, -2.0, 2.0)?;

    Ok(book::ChatConfig {
        model,
        temperature,
        top_p,
        frequency_penalty,
        presence_penalty,
    })
}

fn prompt_image_config(current: &ImageConfig) -> Result<ImageConfig> {
    let provider: ImageProvider = Select::new("Image provider:", vec!["openai", "mystic"])
        .prompt()?
        .parse()?;

    let mut config_out = ImageConfig {
        provider,
        openai: current.openai.clone(),
        mystic: current.mystic.clone(),
        style: current.style.clone(),
    };

    match provider {
        ImageProvider::Openai => {
            let model = Select::new("Image model:", config::OPENAI_IMAGE_MODELS.to_vec())
                .prompt()?
                .to_string();
            let size = Select::new("Image size:", config::OPENAI_IMAGE_SIZES.to_vec())
                .prompt()?
                .to_string();
            config_out.openai = Some(OpenAiImageConfig { model, size });
        }
        ImageProvider::Mystic => {
            let model = Select::new("Mystic model:", config::MYSTIC_MODELS.to_vec())
                .prompt()?
                .to_string();
            let engine = Select::new("Mystic engine:", config::MYSTIC_ENGINES.to_vec())
                .prompt()?
                .to_string();
            let resolution = Select::new("Resolution:", config::MYSTIC_RESOLUTIONS.to_vec())
                .prompt()?
                .to_string();
            let creative_detailing = CustomType::<u8>::new("Creative detailing (0-100):")
                .with_default(33)
                .with_validator(|v: &u8| {
                    if *v <= config::MYSTIC_CREATIVE_DETAILING_MAX {
                        Ok(Validation::Valid)
                    } else {
                        Ok(Validation::Invalid("Enter a value between 0 and 100".into()))
                    }
                })
                .prompt()?;
            config_out.mystic = Some(MysticConfig {
                model,
                engine,
                resolution,
                creative_detailing,
            });
        }
    }

    let style_names: Vec<&str> = config::STYLES.iter().map(|s| s.name).collect();
    config_out.style = Select::new("Illustration style:", style_names)
        .prompt()?
        .to_string();

    Ok(config_out)
}

/// A title must survive slugification, otherwise its directory would
/// collapse into the books root. Rejected inline and re-prompted.
fn validate_title(input: &str) -> Result<Validation, inquire::CustomUserError> {
    if book::safe_name(input).is_empty() {
        Ok(Validation::Invalid(
            "The title needs at least one letter or number".into(),
        ))
    } else {
        Ok(Validation::Valid)
    }
}

/// Out-of-range input is rejected inline and re-prompted, never raised.
fn prompt_f32(message: &str, default: f32, min: f32, max: f32) -> Result<f32> {
    let value = CustomType::<f32>::new(message)
        .with_default(default)
        .with_validator(move |v: &f32| {
            if (min..=max).contains(v) {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid(
                    format!("Enter a value between {} and {}", min, max).into(),
                ))
            }
        })
        .prompt()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatReply;
    use async_trait::async_trait;
    use tempfile::tempdir;

    // Chat client that must never be reached.
    #[derive(Debug)]
    struct PanickingChat;

    #[async_trait]
    impl ChatClient for PanickingChat {
        async fn chat(&self, _system: &str, _user: &str) -> Result<ChatReply> {
            panic!("chat client was called");
        }
    }

    fn session_with_text(dir: std::path::PathBuf) -> BookSession {
        let mut state = BookState::initialize("Test Book");
        state.chapters[0].text = Some("Luna finds a coin.".to_string());
        state.chapters[0].status.mark_generated().unwrap();
        BookSession {
            dir,
            state,
            llm: Box::new(PanickingChat),
        }
    }

    #[tokio::test]
    async fn test_illustrate_accepted_image_makes_no_call_and_changes_nothing() {
        let tmp = tempdir().unwrap();
        let mut session = session_with_text(tmp.path().to_path_buf());
        let image = &mut session.state.chapters[0].image;
        image.status.mark_generated().unwrap();
        image.status.mark_accepted().unwrap();
        image.attempts = 3;

        // Returns without touching the chat client (it would panic) and
        // without mutating the record.
        session.illustrate(0).await.unwrap();

        let image = &session.state.chapters[0].image;
        assert_eq!(image.status, Status::Accepted);
        assert_eq!(image.attempts, 3);
    }

    #[tokio::test]
    async fn test_failed_illustration_attempt_persists_nothing() {
        std::env::remove_var("OPENAI_API_KEY");
        let tmp = tempdir().unwrap();
        let mut session = session_with_text(tmp.path().to_path_buf());

        let err = session
            .attempt_illustration(0, "a child counting coins", None)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("OPENAI_API_KEY"));

        let image = &session.state.chapters[0].image;
        assert_eq!(image.status, Status::NotGenerated);
        assert_eq!(image.attempts, 0);
        assert!(image.prompt.is_none());
        assert!(image.timestamp.is_none());
        assert!(image.temp_path.is_none());
        // Nothing was written to disk either.
        assert!(!session.dir.join(book::STATE_FILE).exists());
    }

    #[test]
    fn test_validate_title_rejects_unslugifiable_titles() {
        assert!(matches!(
            validate_title("!!!").unwrap(),
            Validation::Invalid(_)
        ));
        assert!(matches!(
            validate_title("---").unwrap(),
            Validation::Invalid(_)
        ));
        assert!(matches!(
            validate_title("My Book").unwrap(),
            Validation::Valid
        ));
    }

    #[test]
    fn test_chapter_subtopics_for_bookends() {
        let intro = chapter_subtopics("introduction");
        assert!(!intro.is_empty());
        assert!(intro.iter().any(|s| s.contains("money basics")));

        let outro = chapter_subtopics("conclusion");
        assert!(outro.iter().any(|s| s.contains("revisiting")));
    }

    #[test]
    fn test_chapter_subtopics_for_lesson_chapter() {
        let subs = chapter_subtopics("saving_why_save");
        let topic = config::find_lesson_topic("saving", "why_save").unwrap();
        assert_eq!(subs.len(), topic.subtopics.len());
        assert_eq!(subs[0], topic.subtopics[0]);
    }

    #[test]
    fn test_chapter_subtopics_unknown_id_is_empty() {
        assert!(chapter_subtopics("mystery_chapter").is_empty());
    }
}
