//! Token estimation for catalog records
//!
//! Counts the tokens a language model's tokenizer would produce for a code
//! snippet. The BPE tables ship with `tiktoken-rs`, so counting needs no network.

use crate::error::TokenizerError;
use std::collections::HashSet;
use tiktoken_rs::{CoreBPE, get_bpe_from_model};

/// Trait for token counting
pub trait TokenCounter: Send + Sync {
    /// Count the tokens produced for `text`
    fn count_tokens(&self, text: &str) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Special tokens defined across the tiktoken BPEs
const SPECIAL_TOKENS: [&str; 5] = [
    "<|endoftext|>",
    "<|fim_prefix|>",
    "<|fim_middle|>",
    "<|fim_suffix|>",
    "<|endofprompt|>",
];

/// Token counter backed by a tiktoken BPE
pub struct TiktokenCounter {
    bpe: CoreBPE,
    model: String,
    allowed_special: HashSet<&'static str>,
}

impl TiktokenCounter {
    /// Load the tokenizer for `model`.
    ///
    /// Tokens listed in `allowed_special` are encoded as single control tokens;
    /// any other special marker is encoded as ordinary text.
    pub fn new(model: &str, allowed_special: Vec<String>) -> Result<Self, TokenizerError> {
        let bpe = get_bpe_from_model(model).map_err(|e| {
            tracing::debug!("Tokenizer lookup failed for {}: {}", model, e);
            TokenizerError::UnsupportedModel(model.to_string())
        })?;

        tracing::debug!("Loaded tokenizer for {}", model);

        Ok(Self {
            bpe,
            model: model.to_string(),
            allowed_special: resolve_special_tokens(&allowed_special),
        })
    }

    /// Special tokens encoded as single control tokens
    pub fn allowed_special(&self) -> &HashSet<&'static str> {
        &self.allowed_special
    }

    /// Build from the tokenizer section of the configuration
    pub fn from_config(config: &crate::config::TokenizerConfig) -> Result<Self, TokenizerError> {
        Self::new(&config.model, config.allowed_special.clone())
    }
}

/// Names that are not tiktoken special tokens could never match and are dropped
fn resolve_special_tokens(names: &[String]) -> HashSet<&'static str> {
    names
        .iter()
        .filter_map(|name| {
            let token = SPECIAL_TOKENS.into_iter().find(|token| *token == name.as_str());
            if token.is_none() {
                tracing::warn!("Ignoring unknown special token {:?}", name);
            }
            token
        })
        .collect()
}

impl TokenCounter for TiktokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode(text, self.allowed_special.clone()).len()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
