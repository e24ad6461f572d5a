//! Remote configuration for clients.
//!
//! Resolves the Supabase project a client talks to. Values come from a
//! client-owned config file and may be overridden from the environment.
//! Only public values (project URL, anon key) belong here.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const SUPABASE_URL_ENV: &str = "ELEGANT_SUPABASE_URL";
pub const SUPABASE_ANON_KEY_ENV: &str = "ELEGANT_SUPABASE_ANON_KEY";
pub const SHARE_BASE_URL_ENV: &str = "ELEGANT_SHARE_BASE_URL";

/// Unresolved settings as read from a file or the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RemoteSettings {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    /// Base URL of the share page, used to print public links
    #[serde(default)]
    pub share_base_url: Option<String>,
}

impl RemoteSettings {
    /// Settings taken from `ELEGANT_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            supabase_url: std::env::var(SUPABASE_URL_ENV).ok(),
            supabase_anon_key: std::env::var(SUPABASE_ANON_KEY_ENV).ok(),
            share_base_url: std::env::var(SHARE_BASE_URL_ENV).ok(),
        }
    }

    /// Field-wise override: non-empty values in `other` win.
    #[must_use]
    pub fn overridden_by(self, other: Self) -> Self {
        Self {
            supabase_url: normalize_text_option(other.supabase_url)
                .or_else(|| normalize_text_option(self.supabase_url)),
            supabase_anon_key: normalize_text_option(other.supabase_anon_key)
                .or_else(|| normalize_text_option(self.supabase_anon_key)),
            share_base_url: normalize_text_option(other.share_base_url)
                .or_else(|| normalize_text_option(self.share_base_url)),
        }
    }

    /// Validate into a usable config.
    ///
    /// `Ok(None)` means no remote is configured (local-only mode). A URL
    /// without a key, or the reverse, is a configuration error.
    pub fn resolve(self) -> Result<Option<RemoteConfig>> {
        let url = normalize_text_option(self.supabase_url);
        let anon_key = normalize_text_option(self.supabase_anon_key);
        let share_base_url = normalize_text_option(self.share_base_url);

        match (url, anon_key) {
            (None, None) => Ok(None),
            (Some(url), Some(anon_key)) => {
                let supabase_url = normalize_http_url(&url, "supabase_url")?;
                let share_base_url = share_base_url
                    .map(|value| normalize_http_url(&value, "share_base_url"))
                    .transpose()?;
                Ok(Some(RemoteConfig {
                    supabase_url,
                    supabase_anon_key: anon_key,
                    share_base_url,
                }))
            }
            _ => Err(Error::InvalidInput(
                "supabase_url and supabase_anon_key must be set together".to_string(),
            )),
        }
    }
}

/// Validated remote configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub share_base_url: Option<String>,
}

impl RemoteConfig {
    /// Public link for a slug, when a share page URL is configured
    pub fn share_url(&self, slug: &str) -> Option<String> {
        self.share_base_url
            .as_ref()
            .map(|base| format!("{base}/share/{slug}"))
    }
}

fn normalize_http_url(raw: &str, field: &str) -> Result<String> {
    let value = raw.trim();
    if is_http_url(value) {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(format!(
            "config field '{field}' must include http:// or https://"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: Option<&str>, key: Option<&str>) -> RemoteSettings {
        RemoteSettings {
            supabase_url: url.map(str::to_string),
            supabase_anon_key: key.map(str::to_string),
            share_base_url: None,
        }
    }

    #[test]
    fn resolve_without_values_is_local_only() {
        assert_eq!(settings(None, Some("  ")).resolve().unwrap(), None);
    }

    #[test]
    fn resolve_requires_both_values() {
        assert!(settings(Some("https://demo.supabase.co"), None)
            .resolve()
            .is_err());
        assert!(settings(None, Some("anon")).resolve().is_err());
    }

    #[test]
    fn resolve_rejects_non_http_url() {
        assert!(settings(Some("demo.supabase.co"), Some("anon"))
            .resolve()
            .is_err());
    }

    #[test]
    fn resolve_trims_trailing_slash() {
        let config = settings(Some("https://demo.supabase.co/"), Some("anon"))
            .resolve()
            .unwrap()
            .unwrap();
        assert_eq!(config.supabase_url, "https://demo.supabase.co");
        assert_eq!(config.share_url("abcd1234"), None);
    }

    #[test]
    fn override_prefers_non_empty_values() {
        let file = RemoteSettings {
            supabase_url: Some("https://file.supabase.co".to_string()),
            supabase_anon_key: Some("file-key".to_string()),
            share_base_url: Some("https://notes.example.com/".to_string()),
        };
        let env = settings(Some("https://env.supabase.co"), Some(" "));

        let config = file.overridden_by(env).resolve().unwrap().unwrap();
        assert_eq!(config.supabase_url, "https://env.supabase.co");
        assert_eq!(config.supabase_anon_key, "file-key");
        assert_eq!(
            config.share_url("abcd1234").as_deref(),
            Some("https://notes.example.com/share/abcd1234")
        );
    }

    #[test]
    fn settings_reject_unknown_fields() {
        let error = serde_json::from_str::<RemoteSettings>(r#"{"project_ref": "x"}"#).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }
}
