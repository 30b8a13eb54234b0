//! Prompt templates shared by every backend.

use std::fmt;
use std::str::FromStr;

use super::config::Persona;

/// Longest answer the chat front end can display in one message.
pub const MAX_ANSWER_CHARS: usize = 2000;

/// Harm categories blocked at medium probability and above.
pub const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
];

/// Threshold applied to every entry of [`SAFETY_CATEGORIES`].
pub const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

const PLAIN_TEXT_INSTRUCTION: &str = r"Read every piece of text contained in this image and output it exactly as written.
- Reproduce line breaks and layout as closely as possible.
- Mark unreadable passages as [illegible].
- Handle any language the image contains.
- If there is no text at all, say that no text was found.";

const TRANSLATE_INSTRUCTION: &str = r"Read the text contained in this image and translate it into {language}.
Output both parts in this layout:
[Original text]
(the extracted text)

[Translation]
(the translated text)
If the text is already in {language}, return the extracted text unchanged.";

const SUMMARIZE_INSTRUCTION: &str = r"Read the text contained in this image and summarize it in {language}.
Output in this layout:
[Extracted text]
(the original text)

[Summary]
(a short summary)

[Key points]
- three to five main points
Also state what kind of document it is (email, article, report, sign, menu...).";

const ANALYZE_INSTRUCTION: &str = r"Analyze this image in detail and answer in {language}. Cover:
1. All text it contains (OCR)
2. The content and composition of the image
3. The kind of document or object the text belongs to
4. Anything notable or important a reader should pay attention to";

const IMAGE_STYLE_MODIFIERS: &str = "Style: digital art, highly detailed, vibrant colors, professional quality, 8K resolution.\n\
Rendering: photorealistic details, balanced composition, cinematic lighting.";

/// What to do with the text found in an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExtractMode {
    /// Transcribe the text verbatim.
    #[default]
    PlainText,
    /// Transcribe and translate.
    Translate,
    /// Transcribe and summarize.
    Summarize,
    /// Detailed analysis of text and image content.
    Analyze,
}

impl ExtractMode {
    /// All modes, in menu order.
    pub const ALL: [Self; 4] = [Self::PlainText, Self::Translate, Self::Summarize, Self::Analyze];

    /// Stable machine name, also accepted by [`FromStr`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PlainText => "text",
            Self::Translate => "translate",
            Self::Summarize => "summarize",
            Self::Analyze => "analyze",
        }
    }

    const fn template(self) -> &'static str {
        match self {
            Self::PlainText => PLAIN_TEXT_INSTRUCTION,
            Self::Translate => TRANSLATE_INSTRUCTION,
            Self::Summarize => SUMMARIZE_INSTRUCTION,
            Self::Analyze => ANALYZE_INSTRUCTION,
        }
    }
}

impl fmt::Display for ExtractMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "plain" | "plain-text" | "ocr" => Ok(Self::PlainText),
            "translate" => Ok(Self::Translate),
            "summarize" | "summary" => Ok(Self::Summarize),
            "analyze" | "analysis" => Ok(Self::Analyze),
            other => Err(format!(
                "unknown extract mode '{other}' (expected text, translate, summarize or analyze)"
            )),
        }
    }
}

fn persona_guidelines(persona: &Persona) -> String {
    format!(
        "You are \"{name} AI\", the assistant built into the {name} chat bot.\n\n\
         Follow these guidelines when answering:\n\
         - Be friendly and knowledgeable, as {name} AI.\n\
         - Answer politely in {language}.\n\
         - Keep the answer under {MAX_ANSWER_CHARS} characters so it fits in one chat message.\n\
         - Use emoji sparingly where it makes the answer more approachable.\n\
         - Refer to yourself as \"{name} AI\" or \"I\"; never mention the underlying model name.",
        name = persona.name,
        language = persona.language,
    )
}

/// Builds the single-turn question prompt with the persona preamble.
pub fn ask_prompt(persona: &Persona, question: &str, user_id: &str) -> String {
    format!(
        "{}\n\nUser ID: {user_id}\nQuestion: {question}",
        persona_guidelines(persona)
    )
}

/// Builds the instruction sent next to an image for `mode`.
pub fn extract_prompt(persona: &Persona, mode: ExtractMode, user_id: &str) -> String {
    let instruction = mode.template().replace("{language}", &persona.language);
    format!(
        "You are \"{name} AI\", the OCR and image analysis feature of the {name} chat bot.\n\n\
         {instruction}\n\nUser ID: {user_id}",
        name = persona.name,
    )
}

/// Builds the prompt for a free-form question about an attached image.
pub fn image_question_prompt(persona: &Persona, question: &str) -> String {
    format!(
        "{}\n\nAnalyze the attached image and answer the following question about it.\n\
         Question: {question}",
        persona_guidelines(persona)
    )
}

/// Appends the fixed quality and style modifiers to an image prompt.
pub fn image_generation_prompt(prompt: &str) -> String {
    format!(
        "Generate a stunning, ultra-high-quality image based on this description: {}\n{IMAGE_STYLE_MODIFIERS}",
        prompt.trim()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn persona() -> Persona {
        Persona {
            name: "Nova".to_string(),
            language: "French".to_string(),
        }
    }

    #[test]
    fn ask_prompt_carries_persona_question_and_user() {
        let prompt = ask_prompt(&persona(), "What is Rust?", "user-42");
        assert!(prompt.contains("Nova AI"));
        assert!(prompt.contains("in French"));
        assert!(prompt.contains("2000 characters"));
        assert!(prompt.contains("User ID: user-42"));
        assert!(prompt.ends_with("Question: What is Rust?"));
    }

    #[test]
    fn every_extract_mode_has_its_own_instruction() {
        let prompts: HashSet<String> = ExtractMode::ALL
            .iter()
            .map(|mode| extract_prompt(&persona(), *mode, "u"))
            .collect();
        assert_eq!(prompts.len(), ExtractMode::ALL.len());
    }

    #[test]
    fn extract_prompt_substitutes_language() {
        let prompt = extract_prompt(&persona(), ExtractMode::Translate, "u");
        assert!(prompt.contains("translate it into French"));
        assert!(!prompt.contains("{language}"));
    }

    #[test]
    fn image_prompt_appends_modifiers() {
        let prompt = image_generation_prompt("  a cat on a skateboard ");
        assert!(prompt.contains("description: a cat on a skateboard\n"));
        assert!(prompt.contains("8K resolution"));
    }

    #[test]
    fn extract_mode_parses_aliases() {
        assert_eq!("text".parse::<ExtractMode>().unwrap(), ExtractMode::PlainText);
        assert_eq!("Summary".parse::<ExtractMode>().unwrap(), ExtractMode::Summarize);
        assert_eq!("analysis".parse::<ExtractMode>().unwrap(), ExtractMode::Analyze);
        assert!("describe".parse::<ExtractMode>().is_err());
        for mode in ExtractMode::ALL {
            assert_eq!(mode.as_str().parse::<ExtractMode>().unwrap(), mode);
        }
    }
}
