use anyhow::{Context, Result};
use std::env;

// --- Chat models ---

pub const CHAT_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo"];

// --- OpenAI image models ---

pub const OPENAI_IMAGE_MODELS: &[&str] = &["dall-e-3", "dall-e-2"];
pub const OPENAI_IMAGE_SIZES: &[&str] = &["1024x1024", "1792x1024", "1024x1792"];

// --- Freepik Mystic ---

pub const MYSTIC_MODELS: &[&str] = &["realism", "fluid", "zen"];
pub const MYSTIC_ENGINES: &[&str] = &[
    "automatic",
    "magnific_illusio",
    "magnific_sharpy",
    "magnific_sparkle",
];
pub const MYSTIC_RESOLUTIONS: &[&str] = &["1k", "2k", "4k"];
pub const MYSTIC_CREATIVE_DETAILING_MAX: u8 = 100;

// --- Illustration styles ---

#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub name: &'static str,
    pub prompt: &'static str,
}

/// First entry doubles as the fallback when a book references an unknown style.
pub const STYLES: &[Style] = &[
    Style {
        name: "watercolor",
        prompt: "Soft watercolor children's book illustration, gentle pastel palette, \
                 loose brush strokes, warm and inviting light.",
    },
    Style {
        name: "storybook_cartoon",
        prompt: "Classic storybook cartoon illustration, bold friendly outlines, \
                 bright saturated colors, expressive rounded characters.",
    },
    Style {
        name: "paper_collage",
        prompt: "Cut-paper collage illustration, layered textured shapes, \
                 visible paper grain, playful handmade feel.",
    },
    Style {
        name: "crayon",
        prompt: "Hand-drawn crayon illustration, waxy texture, cheerful primary \
                 colors, childlike but careful linework.",
    },
];

// --- Scene composition presets ---

#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub addendum: &'static str,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "wide_establishing",
        addendum: "Wide establishing shot showing the whole setting.",
    },
    Preset {
        name: "character_closeup",
        addendum: "Close-up on the main character's face and expression.",
    },
    Preset {
        name: "action_moment",
        addendum: "Mid-action moment, dynamic pose, sense of movement.",
    },
    Preset {
        name: "cozy_interior",
        addendum: "Cozy indoor scene, warm lamplight, intimate framing.",
    },
];

pub fn find_style(name: &str) -> Option<&'static Style> {
    STYLES.iter().find(|s| s.name == name)
}

pub fn find_preset(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}

// --- Lesson curriculum ---

#[derive(Debug, Clone, Copy)]
pub struct LessonTopic {
    pub key: &'static str,
    pub title: &'static str,
    pub subtopics: &'static [&'static str],
    pub example: &'static str,
    pub summary: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Lesson {
    pub id: &'static str,
    pub title: &'static str,
    pub topics: &'static [LessonTopic],
}

pub const LESSONS: &[Lesson] = &[
    Lesson {
        id: "money_basics",
        title: "Money Basics",
        topics: &[
            LessonTopic {
                key: "what_is_money",
                title: "What Is Money?",
                subtopics: &[
                    "why trading things directly (barter) gets complicated",
                    "coins, bills and digital money as different forms of the same idea",
                    "money works because everyone agrees it has value",
                ],
                example: "Two friends try to swap a toy dinosaur for help with a sandcastle \
                          and discover how hard it is to agree what a favor is worth.",
                summary: "Money is a shared promise that makes trading fair and simple.",
            },
            LessonTopic {
                key: "earning",
                title: "Earning Money",
                subtopics: &[
                    "people earn money by doing work others value",
                    "allowance and small jobs as a child's first earnings",
                    "effort and skill usually grow what you can earn",
                ],
                example: "A child sets up a lemonade stand and learns that squeezing more \
                          lemons and smiling at customers both matter.",
                summary: "Money is earned by helping others with work they value.",
            },
            LessonTopic {
                key: "spending",
                title: "Spending Wisely",
                subtopics: &[
                    "price tags tell you what a thing costs, not what it is worth to you",
                    "comparing before buying",
                    "every purchase means giving up something else you could have bought",
                ],
                example: "Choosing between two toys at the fair, a child realizes buying \
                          one means walking away from the other.",
                summary: "Spending wisely means comparing choices and knowing what you give up.",
            },
        ],
    },
    Lesson {
        id: "saving",
        title: "Saving",
        topics: &[
            LessonTopic {
                key: "why_save",
                title: "Why Save?",
                subtopics: &[
                    "saving means keeping some money for later instead of spending it now",
                    "saved money helps with surprises and big wishes",
                    "waiting can be hard but pays off",
                ],
                example: "A squeaky bicycle wheel breaks, and the coins in a jam jar save \
                          the day.",
                summary: "Saving keeps money ready for tomorrow's needs and dreams.",
            },
            LessonTopic {
                key: "saving_goals",
                title: "Saving Goals",
                subtopics: &[
                    "picking one thing you really want and finding out its price",
                    "saving a little at a time adds up",
                    "tracking progress makes waiting easier",
                ],
                example: "A paper thermometer on the fridge fills in week by week toward \
                          a telescope.",
                summary: "A clear goal turns saving from a chore into an adventure.",
            },
            LessonTopic {
                key: "how_savings_grow",
                title: "How Savings Grow",
                subtopics: &[
                    "banks keep money safe",
                    "interest is a small thank-you the bank pays for keeping money there",
                    "money left alone can slowly grow by itself",
                ],
                example: "A child plants a coin like a seed and a parent explains that banks, \
                          not gardens, are where money actually grows.",
                summary: "Savings in a bank stay safe and slowly grow through interest.",
            },
        ],
    },
    Lesson {
        id: "smart_choices",
        title: "Smart Choices",
        topics: &[
            LessonTopic {
                key: "needs_vs_wants",
                title: "Needs and Wants",
                subtopics: &[
                    "needs are things you must have to live and be healthy",
                    "wants are things that are nice but optional",
                    "taking care of needs first",
                ],
                example: "Packing for a camping trip, a child weighs a raincoat against \
                          a third stuffed animal.",
                summary: "Knowing needs from wants helps you choose what comes first.",
            },
            LessonTopic {
                key: "budgeting",
                title: "Making a Budget",
                subtopics: &[
                    "a budget is a plan for your money before you spend it",
                    "splitting money between spending, saving and sharing",
                    "plans can bend without breaking",
                ],
                example: "Three labeled jars on a shelf divide birthday money into spend, \
                          save and share.",
                summary: "A budget is a simple plan that puts your money to work on purpose.",
            },
            LessonTopic {
                key: "sharing_and_giving",
                title: "Sharing and Giving",
                subtopics: &[
                    "money can help people and causes you care about",
                    "giving feels good and builds community",
                    "even small gifts matter",
                ],
                example: "A class pools pocket change to buy seeds for the school garden \
                          and everyone gets tomatoes.",
                summary: "Sharing some of what you have makes your money mean more.",
            },
        ],
    },
];

pub fn find_lesson_topic(lesson_id: &str, topic_key: &str) -> Option<&'static LessonTopic> {
    LESSONS
        .iter()
        .find(|l| l.id == lesson_id)?
        .topics
        .iter()
        .find(|t| t.key == topic_key)
}

/// Resolves a chapter id of the form `<lessonId>_<topicKey>` back to its
/// topic. Lesson ids may themselves contain underscores, so this matches the
/// composed id rather than splitting it.
pub fn topic_for_chapter_id(chapter_id: &str) -> Option<&'static LessonTopic> {
    for lesson in LESSONS {
        for topic in lesson.topics {
            if format!("{}_{}", lesson.id, topic.key) == chapter_id {
                return Some(topic);
            }
        }
    }
    None
}

// --- API keys ---

pub fn openai_api_key() -> Result<String> {
    env::var("OPENAI_API_KEY")
        .context("OPENAI_API_KEY is not set. Export it before generating text or OpenAI images.")
}

pub fn freepik_api_key() -> Result<String> {
    env::var("FREEPIK_API_KEY")
        .context("FREEPIK_API_KEY is not set. It is required when the image provider is 'mystic'.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_lookup() {
        assert!(find_style("watercolor").is_some());
        assert!(find_style("oil_on_canvas").is_none());
    }

    #[test]
    fn test_lesson_topic_lookup() {
        let topic = find_lesson_topic("saving", "why_save").unwrap();
        assert_eq!(topic.title, "Why Save?");
        assert!(find_lesson_topic("saving", "nope").is_none());
        assert!(find_lesson_topic("nope", "why_save").is_none());
    }

    #[test]
    fn test_every_topic_has_subtopics_and_context() {
        for lesson in LESSONS {
            for topic in lesson.topics {
                assert!(!topic.subtopics.is_empty(), "{} has no subtopics", topic.key);
                assert!(!topic.example.is_empty());
                assert!(!topic.summary.is_empty());
            }
        }
    }
}
