use anyhow::Result;
use inquire::{Select, Text};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Protagonist {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub appearance: String,
    pub personality: String,
    pub interests: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SecondaryCharacter {
    pub name: String,
    pub relation: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Places {
    pub home: String,
    pub school: String,
    pub favorite_place: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Family {
    pub parents: Vec<String>,
    pub siblings: Vec<String>,
    pub pets: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StoryVariables {
    pub protagonist: Protagonist,
    pub secondary_characters: Vec<SecondaryCharacter>,
    pub places: Places,
    pub family: Family,
    pub circumstances: String,
    pub conflict: String,
    pub story_details: String,
}

impl StoryVariables {
    /// The personalization context: the full tree with every empty leaf and
    /// emptied container pruned away.
    pub fn pruned_context(&self) -> Value {
        let value = serde_json::to_value(self).unwrap_or(Value::Null);
        prune_context(&value).unwrap_or(Value::Object(Default::default()))
    }
}

/// Recursively drops nulls, blank strings, empty arrays and empty objects at
/// every depth. Total over the `Value` variants; numbers and booleans are
/// always kept. Idempotent.
pub fn prune_context(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            if s.trim().is_empty() {
                None
            } else {
                Some(Value::String(s.clone()))
            }
        }
        Value::Array(items) => {
            let kept: Vec<Value> = items.iter().filter_map(prune_context).collect();
            if kept.is_empty() {
                None
            } else {
                Some(Value::Array(kept))
            }
        }
        Value::Object(map) => {
            let mut kept = serde_json::Map::new();
            for (key, val) in map {
                if let Some(cleaned) = prune_context(val) {
                    kept.insert(key.clone(), cleaned);
                }
            }
            if kept.is_empty() {
                None
            } else {
                Some(Value::Object(kept))
            }
        }
        other => Some(other.clone()),
    }
}

// --- Pronouns ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PronounSet {
    pub subject: &'static str,
    pub object: &'static str,
    pub possessive: &'static str,
}

pub const PRONOUNS_SHE: PronounSet = PronounSet { subject: "she", object: "her", possessive: "her" };
pub const PRONOUNS_HE: PronounSet = PronounSet { subject: "he", object: "him", possessive: "his" };
pub const PRONOUNS_THEY: PronounSet =
    PronounSet { subject: "they", object: "them", possessive: "their" };

/// Unrecognized gender values silently fall back to they/them.
pub fn pronouns_for(gender: &str) -> PronounSet {
    match gender.trim().to_lowercase().as_str() {
        "female" | "girl" | "woman" => PRONOUNS_SHE,
        "male" | "boy" | "man" => PRONOUNS_HE,
        _ => PRONOUNS_THEY,
    }
}

// --- Interactive editing ---

/// Menu-driven editing of the story-variable tree. Returns whether anything
/// changed so the caller knows to save.
pub fn edit_story_variables(vars: &mut StoryVariables) -> Result<bool> {
    let mut changed = false;
    loop {
        let choice = Select::new(
            "Which part of the story setup?",
            vec![
                "Protagonist",
                "Secondary characters",
                "Places",
                "Family",
                "Circumstances",
                "Conflict",
                "Story details",
                "Done",
            ],
        )
        .prompt()?;

        match choice {
            "Protagonist" => {
                let p = &mut vars.protagonist;
                p.name = prompt_field("Protagonist name:", &p.name, true)?;
                p.age = prompt_field("Protagonist age:", &p.age, true)?;
                p.gender = prompt_field("Gender (free text):", &p.gender, false)?;
                p.appearance = prompt_field("Appearance:", &p.appearance, false)?;
                p.personality = prompt_field("Personality:", &p.personality, false)?;
                p.interests = prompt_list("Interests", &p.interests)?;
                changed = true;
            }
            "Secondary characters" => {
                edit_secondary_characters(&mut vars.secondary_characters)?;
                changed = true;
            }
            "Places" => {
                vars.places.home = prompt_field("Home:", &vars.places.home, false)?;
                vars.places.school = prompt_field("School:", &vars.places.school, false)?;
                vars.places.favorite_place =
                    prompt_field("Favorite place:", &vars.places.favorite_place, false)?;
                changed = true;
            }
            "Family" => {
                vars.family.parents = prompt_list("Parents", &vars.family.parents)?;
                vars.family.siblings = prompt_list("Siblings", &vars.family.siblings)?;
                vars.family.pets = prompt_list("Pets", &vars.family.pets)?;
                changed = true;
            }
            "Circumstances" => {
                vars.circumstances =
                    prompt_field("Family circumstances:", &vars.circumstances, false)?;
                changed = true;
            }
            "Conflict" => {
                vars.conflict = prompt_field("A conflict to weave in:", &vars.conflict, false)?;
                changed = true;
            }
            "Story details" => {
                vars.story_details =
                    prompt_field("Anything else the story should include:", &vars.story_details, false)?;
                changed = true;
            }
            _ => break,
        }
    }
    Ok(changed)
}

fn edit_secondary_characters(characters: &mut Vec<SecondaryCharacter>) -> Result<()> {
    loop {
        let mut options: Vec<String> = characters
            .iter()
            .map(|c| format!("Edit: {} ({})", c.name, c.relation))
            .collect();
        options.push("Add a character".to_string());
        options.push("Back".to_string());

        let choice = Select::new("Secondary characters:", options.clone()).prompt()?;
        if choice == "Back" {
            return Ok(());
        }
        if choice == "Add a character" {
            let mut c = SecondaryCharacter::default();
            c.name = prompt_field("Name:", "", true)?;
            c.relation = prompt_field("Relation to the protagonist:", "", false)?;
            c.description = prompt_field("Description:", "", false)?;
            characters.push(c);
            continue;
        }
        if let Some(idx) = options.iter().position(|o| *o == choice) {
            let c = &mut characters[idx];
            c.name = prompt_field("Name:", &c.name, true)?;
            c.relation = prompt_field("Relation to the protagonist:", &c.relation, false)?;
            c.description = prompt_field("Description:", &c.description, false)?;
        }
    }
}

/// Blank input is rejected inline and re-prompted when `required`, never
/// raised as an error.
fn prompt_field(message: &str, current: &str, required: bool) -> Result<String> {
    let mut text = Text::new(message).with_initial_value(current);
    if required {
        text = text.with_validator(inquire::required!("This field cannot be empty"));
    }
    Ok(text.prompt()?.trim().to_string())
}

fn prompt_list(label: &str, current: &[String]) -> Result<Vec<String>> {
    let joined = current.join(", ");
    let input = Text::new(&format!("{} (comma separated):", label))
        .with_initial_value(&joined)
        .prompt()?;
    Ok(input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}
