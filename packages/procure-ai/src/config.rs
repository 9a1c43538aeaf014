//! Configuration loaded from environment variables.
//!
//! The library never reads `.env` files itself; binaries call
//! `dotenvy::dotenv()` before [`AiConfig::from_env`].

use std::env;
use std::str::FromStr;
use std::time::Duration;

use llama_extract_client::LlamaExtractSettings;
use openai_client::OpenAIClient;

use crate::ai::{LlamaExtractService, OpenAiProvider};
use crate::error::{AgentResult, ConfigError};
use crate::generation::GenerationDefaults;
use crate::security::SecretString;
use crate::specs::DocumentSpecRegistry;
use crate::types::{DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_ALLOWED_MIME_TYPES};

const DEFAULT_MODEL: &str = "gpt-5-nano";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Settings for the generation provider, the extraction service and
/// upload validation.
///
/// Secrets are optional here; their absence is reported when the client
/// that needs them is built.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub openai_api_key: Option<SecretString>,
    pub openai_base_url: Option<String>,
    pub model: String,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub request_timeout: Duration,
    pub llama_api_key: Option<SecretString>,
    pub llama_organization_id: Option<String>,
    pub llama_project_id: Option<String>,
    pub llama_base_url: Option<String>,
    /// Push local schema changes to existing extraction agents
    pub update_extractor_schema: bool,
    /// Overrides the default extension allow-list
    pub allowed_extensions: Option<Vec<String>>,
    /// Overrides the default MIME allow-list
    pub allowed_mime_types: Option<Vec<String>>,
}

impl AiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            openai_api_key: var("OPENAI_API_KEY").map(SecretString::from),
            openai_base_url: var("OPENAI_BASE_URL"),
            model: var("ACTIVE_LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: parse(&var, "LLM_TEMPERATURE")?,
            top_p: parse(&var, "LLM_TOP_P")?,
            max_output_tokens: parse(&var, "LLM_MAX_OUTPUT_TOKENS")?,
            request_timeout: Duration::from_secs(
                parse(&var, "LLM_REQUEST_TIMEOUT_SECS")?.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            llama_api_key: var("LLAMA_CLOUD_API_KEY").map(SecretString::from),
            llama_organization_id: var("LLAMA_ORGANIZATION_ID"),
            llama_project_id: var("LLAMA_EXTRACT_PROJECT_ID"),
            llama_base_url: var("LLAMA_BASE_URL"),
            update_extractor_schema: parse_bool(&var, "UPDATE_EXTRACTOR_SCHEMA")?.unwrap_or(false),
            allowed_extensions: var("EXTRACTOR_ALLOWED_EXTENSIONS").map(|v| split_list(&v)),
            allowed_mime_types: var("EXTRACTOR_ALLOWED_MIME_TYPES").map(|v| split_list(&v)),
        })
    }

    /// Defaults applied to every generation request.
    pub fn generation_defaults(&self) -> GenerationDefaults {
        let mut defaults = GenerationDefaults::default()
            .with_model(self.model.clone())
            .with_request_timeout(Some(self.request_timeout));
        defaults.temperature = self.temperature;
        defaults.top_p = self.top_p;
        defaults.max_output_tokens = self.max_output_tokens;
        defaults
    }

    /// The OpenAI provider, or the missing key.
    pub fn openai_provider(&self) -> Result<OpenAiProvider, ConfigError> {
        let key = self
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ConfigError::Missing(vec!["OPENAI_API_KEY".to_string()]))?;

        let client = OpenAIClient::new(key.expose());
        let client = match &self.openai_base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        };
        Ok(OpenAiProvider::new(client))
    }

    /// Extraction service connection settings, listing every missing one.
    pub fn llama_settings(&self) -> Result<LlamaExtractSettings, ConfigError> {
        let settings = LlamaExtractSettings {
            api_key: self.llama_api_key.as_ref().map(|k| k.expose().to_string()),
            organization_id: self.llama_organization_id.clone(),
            project_id: self.llama_project_id.clone(),
            base_url: self.llama_base_url.clone(),
        };
        let missing = settings.missing();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing.into_iter().map(String::from).collect()));
        }
        Ok(settings)
    }

    pub fn extraction_service(&self) -> AgentResult<LlamaExtractService> {
        LlamaExtractService::from_settings(self.llama_settings()?)
    }

    /// Built-in document specs with the configured allow-lists applied.
    pub fn document_specs(&self) -> DocumentSpecRegistry {
        let registry = DocumentSpecRegistry::builtin();
        if self.allowed_extensions.is_none() && self.allowed_mime_types.is_none() {
            return registry;
        }

        let or_defaults = |list: &Option<Vec<String>>, defaults: &[&str]| {
            list.clone()
                .unwrap_or_else(|| defaults.iter().map(|s| s.to_string()).collect::<Vec<_>>())
        };
        let extensions = or_defaults(&self.allowed_extensions, DEFAULT_ALLOWED_EXTENSIONS);
        let mime_types = or_defaults(&self.allowed_mime_types, DEFAULT_ALLOWED_MIME_TYPES);
        registry.with_allowed_types(&extensions, &mime_types)
    }

    /// Every required setting that is absent, across both services.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.openai_api_key.is_none() {
            missing.push("OPENAI_API_KEY");
        }
        if self.llama_api_key.is_none() {
            missing.push("LLAMA_CLOUD_API_KEY");
        }
        if self.llama_organization_id.is_none() {
            missing.push("LLAMA_ORGANIZATION_ID");
        }
        if self.llama_project_id.is_none() {
            missing.push("LLAMA_EXTRACT_PROJECT_ID");
        }
        missing
    }
}

fn parse<T>(var: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                name: name.to_string(),
                reason: format!("'{raw}': {e}"),
            })
        })
        .transpose()
}

fn parse_bool(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<bool>, ConfigError> {
    var(name)
        .map(|raw| match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                name: name.to_string(),
                reason: format!("'{raw}' is not a boolean"),
            }),
        })
        .transpose()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
