//! services/api/src/adapters/groq_llm.rs
//!
//! This module contains the adapter for the study-assistant LLM. Groq exposes an
//! OpenAI-compatible chat-completions API, so the `async-openai` client is used
//! with a custom API base. It implements the `StudyAssistant` port from the
//! `core` crate.

const ANALYSIS_TEMPLATE: &str = r#"You are an expert academic assistant analyzing study material.

Input:
- Subject Name: {subject}
- Subject Description: {description}
- Uploaded File Name: {file_name}
- File Text Content: {text}

Tasks:
1. Comprehensive Analysis: Break down the content into a logical hierarchy of topics and subtopics.
2. Structured Summary: For each major topic, provide a concise summary (2-3 sentences).
3. Precise Citations: For every topic summary and key concept, include brief verbatim "citations" from the text that support the analysis.
4. Key Concepts: Identify at least 5 key concepts or definitions.

Output Format (STRICT JSON):
{
  "subject": "{subject}",
  "file_name": "{file_name}",
  "topics": [
    {
      "topic_name": "String",
      "subtopics": ["String"],
      "summary": "String",
      "citations": ["String segment from text"]
    }
  ],
  "key_concepts": [
    {
      "concept": "String",
      "definition": "String",
      "citation": "String segment from text"
    }
  ]
}

Constraints:
- Do NOT answer questions.
- Do NOT summarize the entire file as a single block.
- Be extremely precise with citations; they must exist in the input text.
- Ensure the JSON is valid and follows the structure exactly."#;

const CHAT_SYSTEM_TEMPLATE: &str = r#"You are a calm, clear, and professional academic teacher.

Context:
- Subject: {subject}
- Study Material: {text}

STRICT RULES:
1. STRICT SUBJECT SCOPE: Only answer questions using the provided Study Material.
2. KEYWORDS: Wrap important academic terms or keywords in <u>...</u> to underline them.
3. CITATIONS: Every claim MUST be followed by a citation in the format (File: [filename], Page: [number], Line: [approx_line]). If page/line info is missing, use (File: [filename], Section: [Topic]).
4. REFUSAL: If the answer is not ABSOLUTELY present in the material, use EXACTLY this phrase: "Not found in your notes for {subject}".
5. TONE: Calm, encouraging, and academic.

Output Format (STRICT JSON):
{
  "answer": "Your detailed answer here, with <u>keywords</u> and citations like (File: bio101.pdf, Page: 4, Line: 12).",
  "citations": ["List of verbatim quotes used for reference"],
  "confidence": 0.95,
  "evidence_snippets": ["Direct snippets from the text that exactly support the answer"]
}"#;

const PRACTICE_TEMPLATE: &str = r#"You are an expert academic examiner.

Context:
- Subject: {subject}
{topic_line}- Study Material: {text}

Tasks:
1. Generate 5 MULTIPLE CHOICE QUESTIONS (MCQs). Each must have 4 options, a correct option index (0-3), a clear explanation, a verbatim citation, and a confidence score (0-1).
2. Generate 3 SHORT ANSWER QUESTIONS. Each must have a model answer, a detailed explanation, a verbatim citation, and a confidence score (0-1).

STRICT RULES:
- All content must come STRICTLY from the provided Study Material.
- Do NOT use external knowledge.
- KEYWORDS: Wrap important academic terms or keywords in <u>...</u> to underline them in questions, options, model answers, and explanations.
- Test understanding and application, not just rote memorization.
- Vary difficulty (easy to challenging).

Output Format (STRICT JSON):
{
  "mcqs": [
    {
      "question": "String with <u>underlined</u> keywords",
      "options": ["Option 1", "Option 2 with <u>keyword</u>", "Option 3", "Option 4"],
      "correct_option_index": 0,
      "explanation": "String explaining why with <u>keywords</u>",
      "citation": "Verbatim quote from text",
      "confidence": 0.98
    }
  ],
  "short_answers": [
    {
      "question": "String with <u>underlined</u> keywords",
      "model_answer": "String model answer with <u>keywords</u>",
      "explanation": "String explanation with <u>keywords</u>",
      "citation": "Verbatim quote from text",
      "confidence": 0.95
    }
  ]
}"#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use askmynotes_core::domain::{
    AnalysisInput, AnalysisResult, ChatInput, ChatRole, KeyConcept, ModelReply, PracticeInput,
    Topic,
};
use askmynotes_core::ports::{PortError, PortResult, StudyAssistant};
use serde_json::Value;
use tracing::{debug, error};

//=========================================================================================
// Prompt Construction
//=========================================================================================

/// Substitutes `{name}` placeholders in a single left-to-right pass. Inserted
/// values are never rescanned, so user text that looks like a placeholder stays
/// literal. Braces that do not name a placeholder are copied through.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let placeholder = values.iter().find(|(name, _)| {
            tail[1..]
                .strip_prefix(*name)
                .is_some_and(|after| after.starts_with('}'))
        });
        match placeholder {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 2..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn analysis_prompt(input: &AnalysisInput) -> String {
    let description = input
        .optional_description
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or("N/A");
    fill_template(
        ANALYSIS_TEMPLATE,
        &[
            ("subject", &input.subject_name),
            ("description", description),
            ("file_name", &input.file_name),
            ("text", &input.extracted_text),
        ],
    )
}

pub fn chat_system_prompt(input: &ChatInput) -> String {
    fill_template(
        CHAT_SYSTEM_TEMPLATE,
        &[
            ("subject", &input.subject_name),
            ("text", &input.extracted_text),
        ],
    )
}

pub fn practice_prompt(input: &PracticeInput) -> String {
    let topic_line = match input.topic.as_deref().filter(|t| !t.is_empty()) {
        Some(topic) => format!("- Specific Topic: {}\n", topic),
        None => String::new(),
    };
    fill_template(
        PRACTICE_TEMPLATE,
        &[
            ("subject", &input.subject_name),
            ("topic_line", &topic_line),
            ("text", &input.extracted_text),
        ],
    )
}

//=========================================================================================
// Model Output
//=========================================================================================

/// Parses the body of a completion as JSON. A missing, blank or non-JSON body
/// is an error; any JSON value is accepted as-is.
fn parse_completion(content: Option<String>) -> PortResult<Value> {
    let content = content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| PortError::Unexpected("Empty response from Groq API".to_string()))?;
    serde_json::from_str(&content)
        .map_err(|e| PortError::Unexpected(format!("Groq API returned invalid JSON: {}", e)))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A string field; absent, null and structured values read as empty.
fn text_field(value: &Value, key: &str) -> String {
    value.get(key).and_then(scalar_text).unwrap_or_default()
}

/// A list of strings; a lone scalar counts as a one-element list.
fn text_list(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(other) => scalar_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

fn object_list<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|item| item.is_object())
}

/// Reads the analysis the upload flow stores. Each field falls back to its
/// empty value when the model leaves it out or gives it an unexpected type.
fn analysis_from_reply(reply: &Value) -> AnalysisResult {
    AnalysisResult {
        subject: text_field(reply, "subject"),
        file_name: text_field(reply, "file_name"),
        topics: object_list(reply, "topics")
            .map(|t| Topic {
                topic_name: text_field(t, "topic_name"),
                subtopics: text_list(t, "subtopics"),
                summary: text_field(t, "summary"),
                citations: text_list(t, "citations"),
            })
            .collect(),
        key_concepts: object_list(reply, "key_concepts")
            .map(|k| KeyConcept {
                concept: text_field(k, "concept"),
                definition: text_field(k, "definition"),
                citation: text_field(k, "citation"),
            })
            .collect(),
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `StudyAssistant` using Groq's OpenAI-compatible API.
#[derive(Clone)]
pub struct GroqStudyAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl GroqStudyAdapter {
    /// Creates a new `GroqStudyAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the `async-openai` client for a Groq endpoint.
    pub fn client_for(api_base: &str, api_key: &str) -> Client<OpenAIConfig> {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key(api_key);
        Client::with_config(config)
    }

    /// Sends one JSON-mode completion request and returns the raw message content.
    async fn complete_json(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
    ) -> PortResult<Option<String>> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Map the error manually, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

fn system_message(content: String) -> PortResult<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestSystemMessageArgs::default()
        .content(content)
        .build()
        .map_err(|e| PortError::Unexpected(e.to_string()))?
        .into())
}

fn user_message(content: String) -> PortResult<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestUserMessageArgs::default()
        .content(content)
        .build()
        .map_err(|e| PortError::Unexpected(e.to_string()))?
        .into())
}

fn assistant_message(content: String) -> PortResult<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestAssistantMessageArgs::default()
        .content(content)
        .build()
        .map_err(|e| PortError::Unexpected(e.to_string()))?
        .into())
}

//=========================================================================================
// `StudyAssistant` Trait Implementation
//=========================================================================================

#[async_trait]
impl StudyAssistant for GroqStudyAdapter {
    async fn analyze_material(&self, input: &AnalysisInput) -> PortResult<AnalysisResult> {
        debug!(subject = %input.subject_name, file = %input.file_name, "Analyzing study material");

        let result = async {
            let messages = vec![user_message(analysis_prompt(input))?];
            let content = self.complete_json(messages).await?;
            parse_completion(content)
        }
        .await;

        result.map(|reply| analysis_from_reply(&reply)).map_err(|e| {
            error!("Error calling Groq API: {:?}", e);
            PortError::Unexpected("Failed to analyze study material".to_string())
        })
    }

    async fn chat_with_material(&self, input: &ChatInput) -> PortResult<ModelReply> {
        debug!(subject = %input.subject_name, turns = input.history.len(), "Answering question");

        let result = async {
            let mut messages = Vec::with_capacity(input.history.len() + 2);
            messages.push(system_message(chat_system_prompt(input))?);
            for turn in &input.history {
                messages.push(match turn.role {
                    ChatRole::User => user_message(turn.content.clone())?,
                    ChatRole::Assistant => assistant_message(turn.content.clone())?,
                });
            }
            messages.push(user_message(input.question.clone())?);

            let content = self.complete_json(messages).await?;
            parse_completion(content)
        }
        .await;

        result.map_err(|e| {
            error!("Error in chat_with_material: {:?}", e);
            PortError::Unexpected("Failed to process chat message".to_string())
        })
    }

    async fn generate_practice(&self, input: &PracticeInput) -> PortResult<ModelReply> {
        debug!(subject = %input.subject_name, topic = ?input.topic, "Generating practice questions");

        let result = async {
            let messages = vec![user_message(practice_prompt(input))?];
            let content = self.complete_json(messages).await?;
            parse_completion(content)
        }
        .await;

        result.map_err(|e| {
            error!("Error in generate_practice: {:?}", e);
            PortError::Unexpected("Failed to generate practice questions".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_prompt_fills_every_placeholder() {
        let prompt = analysis_prompt(&AnalysisInput {
            subject_name: "Biology".to_string(),
            optional_description: None,
            file_name: "cells.pdf".to_string(),
            extracted_text: "Mitochondria make ATP.".to_string(),
        });

        assert!(prompt.contains("- Subject Name: Biology"));
        assert!(prompt.contains("- Subject Description: N/A"));
        assert!(prompt.contains("\"file_name\": \"cells.pdf\""));
        assert!(prompt.contains("Mitochondria make ATP."));
        assert!(!prompt.contains("{subject}"));
        assert!(!prompt.contains("{text}"));
    }

    #[test]
    fn chat_prompt_carries_refusal_phrase() {
        let prompt = chat_system_prompt(&ChatInput {
            subject_name: "Chemistry".to_string(),
            extracted_text: "Acids donate protons.".to_string(),
            question: "What is a base?".to_string(),
            history: vec![],
        });
        assert!(prompt.contains("\"Not found in your notes for Chemistry\""));
        assert!(prompt.contains("- Study Material: Acids donate protons."));
    }

    #[test]
    fn practice_prompt_topic_line_is_optional() {
        let mut input = PracticeInput {
            subject_name: "History".to_string(),
            topic: None,
            extracted_text: "Rome fell in 476.".to_string(),
        };
        assert!(!practice_prompt(&input).contains("Specific Topic"));

        input.topic = Some("Late Empire".to_string());
        assert!(practice_prompt(&input).contains("- Specific Topic: Late Empire\n- Study Material"));
    }

    #[test]
    fn placeholder_text_in_user_input_stays_literal() {
        let prompt = analysis_prompt(&AnalysisInput {
            subject_name: "Bio {text}".to_string(),
            optional_description: Some("see {file_name}".to_string()),
            file_name: "{description}.pdf".to_string(),
            extracted_text: "SECRET".to_string(),
        });

        assert!(prompt.contains("- Subject Name: Bio {text}\n"));
        assert!(prompt.contains("- Subject Description: see {file_name}\n"));
        assert!(prompt.contains("- Uploaded File Name: {description}.pdf\n"));
        assert_eq!(prompt.matches("SECRET").count(), 1);

        let practice = practice_prompt(&PracticeInput {
            subject_name: "History".to_string(),
            topic: Some("{subject} and {text}".to_string()),
            extracted_text: "Rome".to_string(),
        });
        assert!(practice.contains("- Specific Topic: {subject} and {text}\n"));
    }

    #[test]
    fn json_braces_in_templates_survive_filling() {
        let prompt = chat_system_prompt(&ChatInput {
            subject_name: "Chemistry".to_string(),
            extracted_text: "Acids.".to_string(),
            question: String::new(),
            history: vec![],
        });
        assert!(prompt.contains("Output Format (STRICT JSON):\n{\n  \"answer\""));
        assert!(prompt.ends_with('}'));
    }

    #[test]
    fn partial_analysis_reads_with_defaults() {
        let reply = parse_completion(Some(
            r#"{"topics":[{"topic_name":"Cells"}],"key_concepts":[{"concept":"ATP","definition":"energy"}]}"#
                .to_string(),
        ))
        .unwrap();
        let result = analysis_from_reply(&reply);

        assert_eq!(result.topics.len(), 1);
        assert_eq!(result.topics[0].topic_name, "Cells");
        assert!(result.topics[0].subtopics.is_empty());
        assert_eq!(result.key_concepts[0].citation, "");
    }

    #[test]
    fn analysis_tolerates_nulls_and_odd_types() {
        let reply = parse_completion(Some(
            r#"{"subject":null,"file_name":7,
                "topics":[{"topic_name":"Cells","subtopics":null,"summary":1.5,"citations":"one quote"},"stray"],
                "key_concepts":null}"#
                .to_string(),
        ))
        .unwrap();
        let result = analysis_from_reply(&reply);

        assert_eq!(result.subject, "");
        assert_eq!(result.file_name, "7");
        assert_eq!(result.topics.len(), 1);
        assert!(result.topics[0].subtopics.is_empty());
        assert_eq!(result.topics[0].summary, "1.5");
        assert_eq!(result.topics[0].citations, vec!["one quote".to_string()]);
        assert!(result.key_concepts.is_empty());

        let not_an_object = parse_completion(Some("[1,2]".to_string())).unwrap();
        assert_eq!(analysis_from_reply(&not_an_object), AnalysisResult::default());
    }

    #[test]
    fn chat_and_practice_replies_pass_through_unchanged() {
        let chat = parse_completion(Some(
            r#"{"answer":"x","citations":null,"confidence":"0.9","extra":{"k":1}}"#.to_string(),
        ))
        .unwrap();
        assert!(chat["citations"].is_null());
        assert_eq!(chat["confidence"], "0.9");
        assert_eq!(chat["extra"]["k"], 1);

        let practice = parse_completion(Some(
            r#"{"mcqs":[{"question":"Q","correct_option_index":1.0}],"short_answers":null}"#
                .to_string(),
        ))
        .unwrap();
        assert_eq!(practice["mcqs"][0]["correct_option_index"], 1.0);
        assert!(practice["short_answers"].is_null());
    }

    #[test]
    fn empty_or_invalid_completion_is_an_error() {
        assert!(parse_completion(None).is_err());
        assert!(parse_completion(Some("  ".to_string())).is_err());
        assert!(parse_completion(Some("not json".to_string())).is_err());
    }
}
