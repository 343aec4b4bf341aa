use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Exact phrase the model must use when the context does not contain the answer
pub const REFUSAL_PHRASE: &str =
    "I'm sorry, but I cannot answer that question based on the provided text.";

const CHAT_ACKNOWLEDGEMENT: &str =
    "Understood. I will answer questions based only on the provided text context.";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("AI service failed to generate a response.")]
    Unavailable { cause: String },

    #[error("AI service returned an invalid format for the quiz.")]
    InvalidFormat { raw: String },
}

impl GenerationError {
    pub fn unavailable(cause: impl Into<String>) -> Self {
        GenerationError::Unavailable {
            cause: cause.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "model")]
    Assistant,
}

/// One conversation turn. Accepts `{role, text}` as well as the
/// `{role, parts: [{text}]}` shape chat clients already hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTurn")]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

#[derive(Deserialize)]
struct RawTurn {
    role: Role,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    parts: Vec<RawPart>,
}

#[derive(Deserialize)]
struct RawPart {
    #[serde(default)]
    text: String,
}

impl From<RawTurn> for ChatTurn {
    fn from(raw: RawTurn) -> Self {
        let text = match raw.text {
            Some(text) => text,
            None => raw
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join(""),
        };
        Self {
            role: raw.role,
            text,
        }
    }
}

/// A single "generate text from these turns" capability. Implementations
/// talk to a hosted model; tests substitute a canned one.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, turns: &[ChatTurn]) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

pub type Quiz = Vec<QuizQuestion>;

pub const OPTIONS_PER_QUESTION: usize = 4;

/// Prompting and output normalization over a `Generator`.
#[derive(Clone)]
pub struct GenerationService {
    generator: Arc<dyn Generator>,
}

impl GenerationService {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    pub async fn summarize(&self, text: &str) -> Result<String, GenerationError> {
        tracing::info!("Requesting summary ({} chars of context)", text.len());
        self.generator
            .generate(&[ChatTurn::user(summary_prompt(text))])
            .await
    }

    /// Fails with `InvalidFormat` unless the reply is exactly `count`
    /// well-formed questions.
    pub async fn generate_quiz(&self, text: &str, count: usize) -> Result<Quiz, GenerationError> {
        tracing::info!("Requesting {}-question quiz", count);
        let raw = self
            .generator
            .generate(&[ChatTurn::user(quiz_prompt(text, count))])
            .await?;
        parse_quiz(&raw, count)
    }

    pub async fn answer(
        &self,
        context: &str,
        history: &[ChatTurn],
        question: &str,
    ) -> Result<String, GenerationError> {
        let mut turns = Vec::with_capacity(history.len() + 3);
        turns.push(ChatTurn::user(chat_instruction(context)));
        turns.push(ChatTurn::assistant(CHAT_ACKNOWLEDGEMENT));
        turns.extend(history.iter().cloned());
        turns.push(ChatTurn::user(question));

        tracing::info!("Requesting chat answer ({} prior turns)", history.len());
        self.generator.generate(&turns).await
    }
}

fn summary_prompt(text: &str) -> String {
    format!(
        "You are an expert academic assistant. Your task is to provide a high-quality, concise summary of the following text.\n\
         - Focus on the main arguments, key findings, and critical concepts.\n\
         - Ignore irrelevant details or filler content.\n\
         - The summary should be clear, easy to understand, and written in neutral, professional language.\n\
         - Add a list of key points and key takeaways from the text.\n\n\
         Here is the text to summarize:\n---\n{}\n---",
        text
    )
}

fn quiz_prompt(text: &str, count: usize) -> String {
    format!(
        "You are an expert quiz designer. Your task is to create a multiple-choice quiz based on the provided text.\n\
         Instructions:\n\
         1. Generate exactly {count} questions.\n\
         2. Each question must have exactly {options} options.\n\
         3. One of the options must be the correct answer.\n\
         4. The questions should test key concepts and important facts from the text.\n\
         You MUST respond with a valid JSON array of objects. Do not include any text, titles, or explanations before or after the JSON array. \
         Each object must have these exact keys: \"question\", \"options\" (an array of {options} strings), and \"correctAnswer\" (a string that exactly matches one of the options).\n\
         Example of the required JSON format:\n\
         [{{\"question\": \"What is the primary color of Mars?\",\"options\": [\"Blue\", \"Green\", \"Red\", \"Yellow\"],\"correctAnswer\": \"Red\"}}]\n\
         Here is the text to generate the quiz from:\n---\n{text}\n---",
        count = count,
        options = OPTIONS_PER_QUESTION,
        text = text
    )
}

fn chat_instruction(context: &str) -> String {
    format!(
        "You are an expert Q&A assistant. Your task is to answer questions based *only* on the provided text context. \
         If the answer CANNOT be found in the text, you MUST respond with the exact phrase: \"{}\" \
         Do not use any prior knowledge or make up information. Here is the context: --- {} ---",
        REFUSAL_PHRASE, context
    )
}

/// Removes markdown code fences (```` ```json ```` and ```` ``` ````) around a reply.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

pub fn parse_quiz(raw: &str, count: usize) -> Result<Quiz, GenerationError> {
    let invalid = || GenerationError::InvalidFormat {
        raw: raw.to_string(),
    };

    let quiz: Quiz = serde_json::from_str(&strip_code_fences(raw)).map_err(|e| {
        tracing::debug!("Quiz JSON did not parse: {}", e);
        invalid()
    })?;

    if let Err(problem) = validate_quiz(&quiz, count) {
        tracing::debug!("Quiz shape rejected: {}", problem);
        return Err(invalid());
    }
    Ok(quiz)
}

fn validate_quiz(quiz: &[QuizQuestion], count: usize) -> Result<(), String> {
    if quiz.len() != count {
        return Err(format!("expected {} questions, got {}", count, quiz.len()));
    }
    for (i, q) in quiz.iter().enumerate() {
        if q.options.len() != OPTIONS_PER_QUESTION {
            return Err(format!("question {} has {} options", i, q.options.len()));
        }
        if !q.options.contains(&q.correct_answer) {
            return Err(format!("question {} answer is not among its options", i));
        }
    }
    Ok(())
}
