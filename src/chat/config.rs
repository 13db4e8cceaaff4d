//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::path::PathBuf;

use arrrg_derive::CommandLine;

use crate::assets::{DEFAULT_FEMALE_ANIMATION, DEFAULT_MALE_ANIMATION};
use crate::error::{Error, Result};
use crate::relay::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, RelayOptions};
use crate::secrets::DEFAULT_SECRETS_FILE;
use crate::types::Gender;

/// Command-line arguments for the hfchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Model to use for chat.
    #[arrrg(optional, "Model to use (default: deepseek-ai/DeepSeek-R1-0528)", "MODEL")]
    pub model: Option<String>,

    /// Maximum tokens per response.
    #[arrrg(optional, "Max tokens per response (default: 1000)", "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Base URL of the inference router.
    #[arrrg(optional, "Inference router base URL", "URL")]
    pub base_url: Option<String>,

    /// Path of the YAML secrets file.
    #[arrrg(optional, "Secrets file (default: secrets.yaml)", "PATH")]
    pub secrets: Option<String>,

    /// Animation shown for the "Male" button.
    #[arrrg(optional, "Animation file for the Male button", "PATH")]
    pub male_animation: Option<String>,

    /// Animation shown for the "Female" button.
    #[arrrg(optional, "Animation file for the Female button", "PATH")]
    pub female_animation: Option<String>,

    /// Append requests and chunks to this JSONL file.
    #[arrrg(optional, "Log requests and chunks to a JSONL file", "PATH")]
    pub log_file: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat run.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: String,

    /// Maximum tokens per response.
    pub max_tokens: u32,

    /// Inference router base URL; `None` uses the client default.
    pub base_url: Option<String>,

    /// YAML file consulted for the API token.
    pub secrets_path: PathBuf,

    /// Animation file for the "Male" button.
    pub male_animation: PathBuf,

    /// Animation file for the "Female" button.
    pub female_animation: PathBuf,

    /// Optional JSONL request log.
    pub log_file: Option<PathBuf>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: deepseek-ai/DeepSeek-R1-0528
    /// - Max tokens: 1000
    /// - Secrets: secrets.yaml
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            base_url: None,
            secrets_path: PathBuf::from(DEFAULT_SECRETS_FILE),
            male_animation: PathBuf::from(DEFAULT_MALE_ANIMATION),
            female_animation: PathBuf::from(DEFAULT_FEMALE_ANIMATION),
            log_file: None,
            use_color: true,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the maximum tokens per response.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the inference router base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the secrets file.
    pub fn with_secrets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.secrets_path = path.into();
        self
    }

    /// Sets the animation file for `gender`.
    pub fn with_animation(mut self, gender: Gender, path: impl Into<PathBuf>) -> Self {
        match gender {
            Gender::Male => self.male_animation = path.into(),
            Gender::Female => self.female_animation = path.into(),
        }
        self
    }

    /// Sets the JSONL request log.
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Checks values that cannot be validated by the argument parser.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::validation(
                "model must not be empty",
                Some("model".to_string()),
            ));
        }
        if self.max_tokens == 0 {
            return Err(Error::validation(
                "max_tokens must be positive",
                Some("max_tokens".to_string()),
            ));
        }
        if let Some(base_url) = &self.base_url {
            url::Url::parse(base_url)
                .map_err(|err| Error::url(format!("invalid base URL {base_url}"), Some(err)))?;
        }
        Ok(())
    }

    /// The request parameters for every turn.
    pub fn relay_options(&self) -> RelayOptions {
        RelayOptions {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let defaults = ChatConfig::new();
        ChatConfig {
            model: args.model.unwrap_or(defaults.model),
            max_tokens: args.max_tokens.unwrap_or(defaults.max_tokens),
            base_url: args.base_url,
            secrets_path: args
                .secrets
                .map(PathBuf::from)
                .unwrap_or(defaults.secrets_path),
            male_animation: args
                .male_animation
                .map(PathBuf::from)
                .unwrap_or(defaults.male_animation),
            female_animation: args
                .female_animation
                .map(PathBuf::from)
                .unwrap_or(defaults.female_animation),
            log_file: args.log_file.map(PathBuf::from),
            use_color: !args.no_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert_eq!(config.model, "deepseek-ai/DeepSeek-R1-0528");
        assert_eq!(config.max_tokens, 1000);
        assert!(config.base_url.is_none());
        assert_eq!(config.secrets_path, PathBuf::from("secrets.yaml"));
        assert_eq!(
            config.male_animation,
            PathBuf::from("Animation - 1749394556693.json")
        );
        assert_eq!(
            config.female_animation,
            PathBuf::from("Animation - 1749395326494.json")
        );
        assert!(config.log_file.is_none());
        assert!(config.use_color);
        config.validate().unwrap();
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from(ChatArgs::default());
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            model: Some("meta-llama/Llama-3.1-8B-Instruct".to_string()),
            max_tokens: Some(256),
            base_url: Some("http://localhost:8080/v1".to_string()),
            secrets: Some("/etc/hfchat/secrets.yaml".to_string()),
            male_animation: Some("m.json".to_string()),
            female_animation: Some("f.json".to_string()),
            log_file: Some("chat.jsonl".to_string()),
            no_color: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(config.model, "meta-llama/Llama-3.1-8B-Instruct");
        assert_eq!(config.max_tokens, 256);
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080/v1"));
        assert_eq!(config.secrets_path, PathBuf::from("/etc/hfchat/secrets.yaml"));
        assert_eq!(config.male_animation, PathBuf::from("m.json"));
        assert_eq!(config.female_animation, PathBuf::from("f.json"));
        assert_eq!(config.log_file, Some(PathBuf::from("chat.jsonl")));
        assert!(!config.use_color);
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_model("test-model")
            .with_max_tokens(64)
            .with_base_url("http://127.0.0.1:9000/v1/")
            .with_secrets_path("local.yaml")
            .with_animation(Gender::Female, "spin.json")
            .with_log_file(Some(PathBuf::from("log.jsonl")))
            .without_color();

        assert_eq!(config.model, "test-model");
        assert_eq!(config.max_tokens, 64);
        assert_eq!(config.female_animation, PathBuf::from("spin.json"));
        assert_eq!(
            config.male_animation,
            PathBuf::from("Animation - 1749394556693.json")
        );
        assert!(!config.use_color);
        assert_eq!(
            config.relay_options(),
            RelayOptions {
                model: "test-model".to_string(),
                max_tokens: 64,
            }
        );
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_values() {
        let err = ChatConfig::new().with_max_tokens(0).validate().unwrap_err();
        assert!(err.is_validation());

        let err = ChatConfig::new().with_model("  ").validate().unwrap_err();
        assert!(err.is_validation());

        let err = ChatConfig::new()
            .with_base_url("not a url")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }
}
