use crate::config;
use crate::story::pronouns_for;
use anyhow::{bail, Result};
use serde_json::Value;

/// Fixed header of every personalization prompt. The generator uses it to
/// recognize an already-complete edit directive and send it as-is.
pub const PERSONALIZATION_HEADER: &str =
    "REVISE the chapter below. Keep its story, structure and lesson intact.";

pub fn is_personalization_directive(text: &str) -> bool {
    text.trim_start().starts_with(PERSONALIZATION_HEADER)
}

/// Initial generation prompt. Built only from the topic, its subtopics and
/// the protagonist's name and age; everything else is held back on purpose
/// so the model keeps creative latitude.
pub fn initial_prompt(topic: &str, subtopics: &[&str], name: &str, age: &str) -> String {
    let bullets = subtopics
        .iter()
        .map(|s| format!("- {}", s))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Write one chapter of a children's book that teaches economics through a story.\n\
         \n\
         Chapter topic: {topic}\n\
         The chapter should cover:\n\
         {bullets}\n\
         \n\
         The hero of the book is {name}, who is {age} years old. Write in a warm, \
         playful tone a child of that age will enjoy, with short sentences and \
         concrete images. Avoid jargon; when an economic term is needed, have a \
         character explain it simply.\n\
         \n\
         Structure the chapter as:\n\
         1. A relatable scenario from the hero's everyday life.\n\
         2. A gentle explanation of the concept inside the story.\n\
         3. A concrete example the hero works through.\n\
         4. A small activity or question inviting the reader to try it themselves.\n\
         \n\
         Return only the chapter text, no headings or notes."
    )
}

/// Personalization pass: embeds the generated text and the pruned
/// story-variable context verbatim and asks for a preserving edit.
pub fn personalization_prompt(existing_text: &str, context: &Value, gender: &str) -> String {
    let pronouns = pronouns_for(gender);
    let context_json =
        serde_json::to_string_pretty(context).unwrap_or_else(|_| "{}".to_string());

    format!(
        "{header}\n\
         \n\
         You are given a chapter and background details about the reader's world. \
         Weave those details into the chapter only where they fit naturally. Do NOT \
         change the core narrative, the economic lesson, or the chapter structure. \
         Do not force every detail in; unused details are fine. Refer to the hero \
         with the pronouns {subject}/{object}/{possessive}.\n\
         \n\
         Background details (JSON):\n\
         {context_json}\n\
         \n\
         Chapter to revise:\n\
         {existing_text}\n\
         \n\
         Return only the revised chapter text.",
        header = PERSONALIZATION_HEADER,
        subject = pronouns.subject,
        object = pronouns.object,
        possessive = pronouns.possessive,
    )
}

// --- Scene selection ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneChoice {
    pub scene: String,
    pub summary: String,
}

pub fn scene_selection_prompt(chapter_text: &str, topic: &str) -> String {
    format!(
        "Below is a children's book chapter about \"{topic}\". Pick the single most \
         visually compelling moment in it.\n\
         \n\
         Reply with exactly two lines:\n\
         SCENE: a vivid 2-3 sentence description of that moment\n\
         SUMMARY: one concrete sentence suitable for an image generator, describing \
         only what is visible, with no text or lettering in the image\n\
         \n\
         Chapter:\n\
         {chapter_text}"
    )
}

/// Parses the model's reply. Tagged `SCENE:`/`SUMMARY:` lines are preferred;
/// when tags are absent, falls back to the first and last non-blank lines of
/// the reply. Returns None for a reply with no usable lines.
pub fn parse_scene_reply(reply: &str) -> Option<SceneChoice> {
    let mut scene = None;
    let mut summary = None;
    for line in reply.lines() {
        let trimmed = line.trim();
        if let Some(rest) = strip_tag(trimmed, "SCENE:") {
            scene = Some(rest.to_string());
        } else if let Some(rest) = strip_tag(trimmed, "SUMMARY:") {
            summary = Some(rest.to_string());
        }
    }
    if let (Some(scene), Some(summary)) = (scene, summary) {
        return Some(SceneChoice { scene, summary });
    }

    // Positional fallback for untagged replies.
    let lines: Vec<&str> = reply.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let first = lines.first()?;
    let last = lines.last()?;
    Some(SceneChoice {
        scene: first.to_string(),
        summary: last.to_string(),
    })
}

fn strip_tag<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    match line.get(..tag.len()) {
        Some(head) if head.eq_ignore_ascii_case(tag) => Some(line[tag.len()..].trim()),
        _ => None,
    }
}

// --- Illustration prompt ---

/// Decorates a scene description with the book's style and composition
/// preset. Unknown styles fall back to the first configured style; unknown
/// presets contribute nothing. A missing description is an error.
pub fn illustration_prompt(
    style: Option<&str>,
    preset: Option<&str>,
    description: Option<&str>,
) -> Result<String> {
    let description = match description {
        Some(d) if !d.trim().is_empty() => d.trim(),
        _ => bail!("illustration prompt requires a scene description"),
    };

    let style_prompt = style
        .and_then(config::find_style)
        .unwrap_or(&config::STYLES[0])
        .prompt;

    let addendum = preset
        .and_then(config::find_preset)
        .map(|p| format!(" {}", p.addendum))
        .unwrap_or_default();

    Ok(format!("{}{} Scene: {}", style_prompt, addendum, description))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initial_prompt_contents() {
        let prompt = initial_prompt(
            "What Is Money?",
            &["barter gets complicated", "coins and bills"],
            "Luna",
            "7",
        );
        assert!(prompt.contains("What Is Money?"));
        assert!(prompt.contains("- barter gets complicated"));
        assert!(prompt.contains("- coins and bills"));
        assert!(prompt.contains("Luna"));
        assert!(prompt.contains("7 years old"));
        // The initial prompt never becomes a personalization directive.
        assert!(!is_personalization_directive(&prompt));
    }

    #[test]
    fn test_personalization_prompt_embeds_text_and_context() {
        let ctx = json!({ "family": { "pets": ["Biscuit"] } });
        let prompt = personalization_prompt("Once upon a time.", &ctx, "girl");
        assert!(is_personalization_directive(&prompt));
        assert!(prompt.contains("Once upon a time."));
        assert!(prompt.contains("Biscuit"));
        assert!(prompt.contains("she/her/her"));
    }

    #[test]
    fn test_personalization_pronoun_fallback() {
        let prompt = personalization_prompt("text", &json!({}), "starfish");
        assert!(prompt.contains("they/them/their"));
    }

    #[test]
    fn test_parse_scene_reply_tagged() {
        let reply = "SCENE: Luna holds a coin to the light.\nSUMMARY: A girl holding a coin.";
        let choice = parse_scene_reply(reply).unwrap();
        assert_eq!(choice.scene, "Luna holds a coin to the light.");
        assert_eq!(choice.summary, "A girl holding a coin.");
    }

    #[test]
    fn test_parse_scene_reply_tags_case_insensitive_and_reordered() {
        let reply = "summary: A market stall.\n\nscene: The whole square bustles.";
        let choice = parse_scene_reply(reply).unwrap();
        assert_eq!(choice.scene, "The whole square bustles.");
        assert_eq!(choice.summary, "A market stall.");
    }

    #[test]
    fn test_parse_scene_reply_positional_fallback() {
        let reply = "\nThe lemonade stand sparkles.\nSome middle chatter.\nA stand with lemons.\n\n";
        let choice = parse_scene_reply(reply).unwrap();
        assert_eq!(choice.scene, "The lemonade stand sparkles.");
        assert_eq!(choice.summary, "A stand with lemons.");
    }

    #[test]
    fn test_parse_scene_reply_empty() {
        assert!(parse_scene_reply("").is_none());
        assert!(parse_scene_reply("  \n \n").is_none());
    }

    #[test]
    fn test_illustration_prompt_fallbacks() {
        let prompt =
            illustration_prompt(Some("unknown"), Some("unknown"), Some("x")).unwrap();
        assert!(prompt.starts_with(crate::config::STYLES[0].prompt));
        assert!(prompt.ends_with("Scene: x"));
        // Unknown preset adds nothing between style and scene.
        let expected = format!("{} Scene: x", crate::config::STYLES[0].prompt);
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_illustration_prompt_with_known_style_and_preset() {
        let prompt = illustration_prompt(
            Some("crayon"),
            Some("character_closeup"),
            Some("a child counting coins"),
        )
        .unwrap();
        assert!(prompt.contains("crayon") || prompt.contains("Crayon"));
        assert!(prompt.contains("Close-up on the main character"));
        assert!(prompt.ends_with("Scene: a child counting coins"));
    }

    #[test]
    fn test_illustration_prompt_requires_description() {
        assert!(illustration_prompt(Some("crayon"), None, None).is_err());
        assert!(illustration_prompt(Some("crayon"), None, Some("   ")).is_err());
    }
}
