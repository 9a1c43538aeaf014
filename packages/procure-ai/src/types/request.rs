//! Generation requests, before and after normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GenerationError, Result};
use crate::types::schema::ResultSchema;

/// Largest output budget a request may ask for.
pub const MAX_OUTPUT_TOKENS: u32 = 8192;

/// Message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(Role::Tool, content)
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// What a caller asks the generation layer for.
///
/// Either `messages` or `prompt` (with an optional `system`) must be set.
/// When both are present, `messages` wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
    /// Falls back to the adapter's default model
    #[serde(default)]
    pub model: Option<String>,
    /// 0.0 to 2.0
    #[serde(default)]
    pub temperature: Option<f32>,
    /// 0.0 to 1.0
    #[serde(default)]
    pub top_p: Option<f32>,
    /// 1 to [`MAX_OUTPUT_TOKENS`]
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    #[serde(default)]
    pub stop: Vec<String>,
    #[serde(default)]
    pub tools: Vec<Value>,
    #[serde(default)]
    pub tool_choice: Option<Value>,
    /// Caller's preference, carried for serialized requests. The adapter
    /// operation decides: `generate` never streams, `stream_generate` always does.
    #[serde(default)]
    pub stream: bool,
}

impl GenerationRequest {
    /// Single-prompt request.
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Default::default()
        }
    }

    /// Multi-turn request.
    pub fn messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn with_stop(mut self, stop: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.stop = stop.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tools(mut self, tools: Vec<Value>, tool_choice: Option<Value>) -> Self {
        self.tools = tools;
        self.tool_choice = tool_choice;
        self
    }

    /// Reject out-of-range sampling parameters.
    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(invalid(format!("temperature {t} is outside 0.0..=2.0")));
            }
        }
        if let Some(p) = self.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(invalid(format!("top_p {p} is outside 0.0..=1.0")));
            }
        }
        if let Some(n) = self.max_output_tokens {
            if n == 0 || n > MAX_OUTPUT_TOKENS {
                return Err(invalid(format!(
                    "max_output_tokens {n} is outside 1..={MAX_OUTPUT_TOKENS}"
                )));
            }
        }
        Ok(())
    }

    /// Messages to send: `messages` verbatim, else `[system?, user=prompt]`.
    pub fn normalized_messages(&self) -> Result<Vec<Message>> {
        if !self.messages.is_empty() {
            return Ok(self.messages.clone());
        }

        let prompt = self
            .prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or(GenerationError::EmptyRequest)?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system.as_deref().filter(|s| !s.trim().is_empty()) {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(prompt));
        Ok(messages)
    }
}

fn invalid(reason: String) -> GenerationError {
    GenerationError::InvalidRequest { reason }
}

/// A fully resolved request as handed to a provider.
///
/// Optional fields are `None` when neither the request nor the adapter
/// defaults set them, so providers can omit them from the wire.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub stop: Option<Vec<String>>,
    pub tools: Option<Vec<Value>>,
    pub tool_choice: Option<Value>,
    pub schema: Option<ResultSchema>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_take_precedence_over_prompt() {
        let request = GenerationRequest {
            messages: vec![Message::assistant("earlier"), Message::user("now")],
            prompt: Some("ignored".into()),
            system: Some("ignored too".into()),
            ..Default::default()
        };

        let messages = request.normalized_messages().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::Assistant);
    }

    #[test]
    fn test_prompt_with_system_synthesizes_two_messages() {
        let messages = GenerationRequest::prompt("Compare these quotes")
            .with_system("You are an analyst")
            .normalized_messages()
            .unwrap();

        assert_eq!(
            messages,
            vec![
                Message::system("You are an analyst"),
                Message::user("Compare these quotes"),
            ]
        );
    }

    #[test]
    fn test_empty_request_is_rejected() {
        let err = GenerationRequest::default().normalized_messages().unwrap_err();
        assert!(matches!(err, GenerationError::EmptyRequest));

        let blank = GenerationRequest::prompt("   ").with_system("sys");
        assert!(matches!(
            blank.normalized_messages(),
            Err(GenerationError::EmptyRequest)
        ));
    }

    #[test]
    fn test_parameter_ranges() {
        assert!(GenerationRequest::prompt("x").with_temperature(2.0).validate().is_ok());
        assert!(GenerationRequest::prompt("x").with_temperature(2.1).validate().is_err());
        assert!(GenerationRequest::prompt("x").with_top_p(-0.1).validate().is_err());
        assert!(GenerationRequest::prompt("x").with_max_output_tokens(0).validate().is_err());
        assert!(GenerationRequest::prompt("x")
            .with_max_output_tokens(MAX_OUTPUT_TOKENS)
            .validate()
            .is_ok());
        assert!(GenerationRequest::prompt("x").with_temperature(f32::NAN).validate().is_err());
    }
}
