use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const FRIENDLY_PROMPT: &str = "You are a warm and friendly gaming AI assistant. You are knowledgeable about video games, gaming hardware, esports, game strategies, and gaming culture.

    Personality traits:
    - Chat like a close gaming buddy
    - Use casual, warm language
    - Show genuine enthusiasm for gaming
    - Be supportive and encouraging
    - Use friendly emojis occasionally
    - Make the conversation feel cozy and comfortable";

const PROFESSIONAL_PROMPT: &str = "You are a professional gaming AI consultant. You are highly knowledgeable about video games, gaming hardware, esports, game strategies, and gaming culture.

    Personality traits:
    - Provide rigorous, well-researched advice
    - Use clear, precise language
    - Focus on facts and data
    - Give structured, organized responses
    - Maintain a professional but approachable tone
    - Cite specific examples and statistics when relevant";

const HUMOROUS_PROMPT: &str = "You are a fun and humorous gaming AI assistant. You are knowledgeable about video games, gaming hardware, esports, game strategies, and gaming culture.

    Personality traits:
    - Make gaming jokes and puns
    - Use playful, entertaining language
    - Reference gaming memes and culture
    - Keep things light and fun
    - Be witty but still helpful
    - Use humor to make explanations memorable";

/// Preset selecting the system instruction that sets the assistant's tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    /// Casual gaming buddy.
    #[default]
    Friendly,

    /// Rigorous, data-driven consultant.
    Professional,

    /// Jokes, puns, and memes.
    Humorous,
}

impl Personality {
    /// Every personality in selection order.
    pub const ALL: [Personality; 3] = [
        Personality::Friendly,
        Personality::Professional,
        Personality::Humorous,
    ];

    /// The system prompt for this personality.
    pub fn prompt(self) -> &'static str {
        match self {
            Personality::Friendly => FRIENDLY_PROMPT,
            Personality::Professional => PROFESSIONAL_PROMPT,
            Personality::Humorous => HUMOROUS_PROMPT,
        }
    }

    /// The label shown in the picker.
    pub fn label(self) -> &'static str {
        match self {
            Personality::Friendly => "😊 Friendly",
            Personality::Professional => "💼 Professional",
            Personality::Humorous => "😄 Humorous",
        }
    }

    /// A one-line description of the tone.
    pub fn description(self) -> &'static str {
        match self {
            Personality::Friendly => "Warm and friendly, like chatting with a gaming buddy!",
            Personality::Professional => "Rigorous and professional advice for serious gamers.",
            Personality::Humorous => "Fun and entertaining, with a touch of gaming humor!",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Personality::Friendly => "friendly",
            Personality::Professional => "professional",
            Personality::Humorous => "humorous",
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Personality {
    type Err = String;

    /// Accepts the bare name or the emoji label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Personality::ALL
            .into_iter()
            .find(|p| wanted == p.name() || wanted == p.label().to_lowercase())
            .ok_or_else(|| {
                format!("Unknown personality: {s}. Valid options: friendly, professional, humorous")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_friendly() {
        assert_eq!(Personality::default(), Personality::Friendly);
        assert_eq!(Personality::ALL[0], Personality::default());
    }

    #[test]
    fn prompts_are_distinct() {
        assert!(Personality::Friendly.prompt().contains("close gaming buddy"));
        assert!(Personality::Professional.prompt().contains("consultant"));
        assert!(Personality::Humorous.prompt().contains("jokes and puns"));
    }

    #[test]
    fn parse_names_and_labels() {
        assert_eq!("friendly".parse(), Ok(Personality::Friendly));
        assert_eq!("PROFESSIONAL".parse(), Ok(Personality::Professional));
        assert_eq!(" 😄 Humorous ".parse(), Ok(Personality::Humorous));
        assert!("grumpy".parse::<Personality>().is_err());
    }

    #[test]
    fn display_is_label() {
        assert_eq!(Personality::Professional.to_string(), "💼 Professional");
    }
}
