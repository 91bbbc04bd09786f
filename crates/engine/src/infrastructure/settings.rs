//! Engine settings loaded from the environment.
//!
//! `dotenvy` reads a `.env` file first, then each value is looked up
//! individually. Unset values use the defaults; values that fail to parse
//! fall back to the default with a warning rather than refusing to start.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rulewarden_domain::SessionLimits;
use serde::{Deserialize, Serialize};

use crate::infrastructure::openai_compat::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::infrastructure::resilience::RetryConfig;
use crate::stores::BusyPolicy;

/// Connection settings for the chat-completions server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub request_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            temperature: Some(0.2),
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Passages fetched per question.
    pub retrieval_top_k: usize,
    /// Transcript turns replayed into the prompt.
    pub max_history_turns: usize,
    pub session_limits: SessionLimits,
    /// Upper bound on retrieval plus generation for one ruling.
    pub ruling_deadline_secs: u64,
    pub busy_policy: BusyPolicy,
    pub retry: RetryConfig,
    pub llm: LlmSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            retrieval_top_k: 5,
            max_history_turns: 10,
            session_limits: SessionLimits::default(),
            ruling_deadline_secs: 120,
            busy_policy: BusyPolicy::Queue,
            retry: RetryConfig::default(),
            llm: LlmSettings::default(),
        }
    }
}

impl EngineSettings {
    pub fn ruling_deadline(&self) -> Duration {
        Duration::from_secs(self.ruling_deadline_secs)
    }

    /// Load from the process environment after reading `.env` if present.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Failed to read .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| lookup(*k))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let retrieval_top_k = parsed(
            get(&["RULEWARDEN_RETRIEVAL_TOP_K", "RETRIEVAL_TOP_K"]),
            "RETRIEVAL_TOP_K",
            defaults.retrieval_top_k,
        );
        let max_history_turns = parsed(
            get(&["RULEWARDEN_MAX_HISTORY_TURNS", "MAX_HISTORY_LENGTH"]),
            "MAX_HISTORY_LENGTH",
            defaults.max_history_turns,
        );
        let session_limits = SessionLimits {
            // Keep at least as much transcript as the prompt replays
            transcript_turns: parsed(
                get(&["RULEWARDEN_TRANSCRIPT_TURNS"]),
                "RULEWARDEN_TRANSCRIPT_TURNS",
                defaults.session_limits.transcript_turns,
            )
            .max(max_history_turns),
            action_log_entries: parsed(
                get(&["RULEWARDEN_ACTION_LOG_ENTRIES"]),
                "RULEWARDEN_ACTION_LOG_ENTRIES",
                defaults.session_limits.action_log_entries,
            ),
        };
        let ruling_deadline_secs = parsed(
            get(&["RULEWARDEN_RULING_DEADLINE_SECS"]),
            "RULEWARDEN_RULING_DEADLINE_SECS",
            defaults.ruling_deadline_secs,
        );
        let busy_policy = parsed(
            get(&["RULEWARDEN_BUSY_POLICY"]),
            "RULEWARDEN_BUSY_POLICY",
            defaults.busy_policy,
        );
        let retry = RetryConfig {
            max_retries: parsed(
                get(&["RULEWARDEN_MAX_RETRIES"]),
                "RULEWARDEN_MAX_RETRIES",
                defaults.retry.max_retries,
            ),
            base_delay_ms: parsed(
                get(&["RULEWARDEN_RETRY_BASE_DELAY_MS"]),
                "RULEWARDEN_RETRY_BASE_DELAY_MS",
                defaults.retry.base_delay_ms,
            ),
            max_delay_ms: parsed(
                get(&["RULEWARDEN_RETRY_MAX_DELAY_MS"]),
                "RULEWARDEN_RETRY_MAX_DELAY_MS",
                defaults.retry.max_delay_ms,
            ),
            jitter_factor: defaults.retry.jitter_factor,
        };
        let llm = LlmSettings {
            base_url: get(&["OPENAI_BASE_URL", "RULEWARDEN_LLM_BASE_URL"])
                .unwrap_or_else(|| defaults.llm.base_url.clone()),
            model: get(&["LLM_MODEL", "RULEWARDEN_LLM_MODEL"])
                .unwrap_or_else(|| defaults.llm.model.clone()),
            api_key: get(&["OPENAI_API_KEY"]),
            temperature: get(&["RULEWARDEN_LLM_TEMPERATURE"])
                .map(|raw| Some(parsed(Some(raw), "RULEWARDEN_LLM_TEMPERATURE", 0.2)))
                .unwrap_or(defaults.llm.temperature),
            request_timeout_secs: parsed(
                get(&["RULEWARDEN_LLM_TIMEOUT_SECS"]),
                "RULEWARDEN_LLM_TIMEOUT_SECS",
                defaults.llm.request_timeout_secs,
            ),
        };

        Self {
            retrieval_top_k,
            max_history_turns,
            session_limits,
            ruling_deadline_secs,
            busy_policy,
            retry,
            llm,
        }
    }
}

fn parsed<T>(raw: Option<String>, key: &str, default: T) -> T
where
    T: FromStr + fmt::Display,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = %raw, default = %default, "Invalid setting, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let settings = EngineSettings::from_lookup(lookup(&[]));
        assert_eq!(settings, EngineSettings::default());
        assert_eq!(settings.retrieval_top_k, 5);
        assert_eq!(settings.max_history_turns, 10);
        assert_eq!(settings.ruling_deadline(), Duration::from_secs(120));
    }

    #[test]
    fn reads_fallback_variable_names() {
        let settings = EngineSettings::from_lookup(lookup(&[
            ("RETRIEVAL_TOP_K", "8"),
            ("MAX_HISTORY_LENGTH", "4"),
            ("LLM_MODEL", "llama3.2"),
            ("OPENAI_BASE_URL", "http://localhost:11434/v1"),
            ("OPENAI_API_KEY", "sk-test"),
        ]));

        assert_eq!(settings.retrieval_top_k, 8);
        assert_eq!(settings.max_history_turns, 4);
        assert_eq!(settings.llm.model, "llama3.2");
        assert_eq!(settings.llm.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn prefixed_names_win() {
        let settings = EngineSettings::from_lookup(lookup(&[
            ("RULEWARDEN_RETRIEVAL_TOP_K", "3"),
            ("RETRIEVAL_TOP_K", "9"),
            ("RULEWARDEN_BUSY_POLICY", "reject"),
        ]));
        assert_eq!(settings.retrieval_top_k, 3);
        assert_eq!(settings.busy_policy, BusyPolicy::Reject);
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let settings = EngineSettings::from_lookup(lookup(&[
            ("RETRIEVAL_TOP_K", "lots"),
            ("RULEWARDEN_RULING_DEADLINE_SECS", "-1"),
        ]));
        assert_eq!(settings.retrieval_top_k, 5);
        assert_eq!(settings.ruling_deadline_secs, 120);
    }

    #[test]
    fn transcript_keeps_at_least_the_prompt_window() {
        let settings = EngineSettings::from_lookup(lookup(&[
            ("MAX_HISTORY_LENGTH", "25"),
            ("RULEWARDEN_TRANSCRIPT_TURNS", "5"),
        ]));
        assert_eq!(settings.session_limits.transcript_turns, 25);
    }

    #[test]
    fn api_key_is_not_serialized() {
        let mut settings = EngineSettings::default();
        settings.llm.api_key = Some("sk-secret".into());
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
