//! Supabase (PostgREST) implementation of the note gateway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::{NoteDraft, NoteGateway, RemotePatch};
use crate::error::{Error, Result};
use crate::models::{Note, NoteColor, NoteId};
use crate::util::{compact_text, is_http_url};

const NOTES_TABLE: &str = "notes";
const RETURN_REPRESENTATION: &str = "return=representation";
const UNIQUE_VIOLATION_CODE: &str = "23505";

/// Gateway backed by a Supabase project's `notes` table.
///
/// Row-level security on the project decides what the access token can see;
/// owner filters are added as well so a misconfigured policy cannot leak rows
/// into another user's list.
#[derive(Clone)]
pub struct SupabaseNoteGateway {
    rest_url: String,
    anon_key: String,
    access_token: Option<String>,
    client: Client,
}

impl std::fmt::Debug for SupabaseNoteGateway {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SupabaseNoteGateway")
            .field("rest_url", &self.rest_url)
            .field("anon_key", &"[REDACTED]")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

impl SupabaseNoteGateway {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>) -> Result<Self> {
        let rest_url = normalize_rest_url(url.as_ref())?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(Error::InvalidInput(
                "Supabase anon key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            rest_url,
            anon_key,
            access_token: None,
            client: Client::builder().build()?,
        })
    }

    /// Attach the signed-in user's access token
    #[must_use]
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        let token = access_token.into().trim().to_string();
        self.access_token = (!token.is_empty()).then_some(token);
        self
    }

    fn table_url(&self) -> String {
        format!("{}/{NOTES_TABLE}", self.rest_url)
    }

    fn authed_request(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| Error::Remote("User not authenticated".to_string()))?;
        Ok(request.header("apikey", &self.anon_key).bearer_auth(token))
    }

    fn public_request(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn read_rows(response: Response) -> Result<Vec<RemoteNoteRow>> {
        let response = ensure_success(response).await?;
        Ok(response.json::<Vec<RemoteNoteRow>>().await?)
    }
}

#[async_trait]
impl NoteGateway for SupabaseNoteGateway {
    async fn list(&self, owner: &str) -> Result<Vec<Note>> {
        let request = self.authed_request(self.client.get(self.table_url()).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{owner}")),
            ("order", "updated_at.desc".to_string()),
        ]))?;
        let rows = Self::read_rows(request.send().await?).await?;
        tracing::debug!("Fetched {} remote notes", rows.len());
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, draft: &NoteDraft, owner: &str) -> Result<Note> {
        let body = InsertNoteRow::new(draft, owner);
        let request = self.authed_request(
            self.client
                .post(self.table_url())
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&body),
        )?;
        let rows = Self::read_rows(request.send().await?).await?;
        rows.into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| Error::Remote("Insert did not return the created row".to_string()))
    }

    async fn update(&self, id: &NoteId, patch: &RemotePatch) -> Result<Note> {
        let body = UpdateNoteRow::from(patch);
        let request = self.authed_request(
            self.client
                .patch(self.table_url())
                .query(&[("id", format!("eq.{id}"))])
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&body),
        )?;
        let rows = Self::read_rows(request.send().await?).await?;
        rows.into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &NoteId) -> Result<()> {
        let request = self.authed_request(
            self.client
                .delete(self.table_url())
                .query(&[("id", format!("eq.{id}"))]),
        )?;
        ensure_success(request.send().await?).await?;
        Ok(())
    }

    async fn get_by_public_slug(&self, slug: &str) -> Result<Note> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(Error::NotFound(String::new()));
        }
        let request = self.public_request(self.client.get(self.table_url()).query(&[
            ("select", "*".to_string()),
            ("public_slug", format!("eq.{slug}")),
            ("is_public", "eq.true".to_string()),
        ]));
        let rows = Self::read_rows(request.send().await?).await?;
        rows.into_iter()
            .find(|row| row.is_public.unwrap_or(false))
            .map(Into::into)
            .ok_or_else(|| Error::NotFound(slug.to_string()))
    }
}

/// Row shape of the remote `notes` table.
#[derive(Debug, Deserialize)]
struct RemoteNoteRow {
    id: String,
    user_id: Option<String>,
    title: Option<String>,
    content: Option<String>,
    tags: Option<Vec<String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_pinned: Option<bool>,
    is_archived: Option<bool>,
    color: Option<String>,
    is_public: Option<bool>,
    public_slug: Option<String>,
}

impl From<RemoteNoteRow> for Note {
    fn from(row: RemoteNoteRow) -> Self {
        Self {
            id: NoteId::from(row.id),
            title: row.title.unwrap_or_default(),
            content: row.content.unwrap_or_default(),
            tags: row.tags.unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            is_pinned: row.is_pinned.unwrap_or(false),
            is_archived: row.is_archived.unwrap_or(false),
            color: NoteColor::from_remote(row.color.as_deref()),
            owner_ref: row.user_id,
            is_public: row.is_public.unwrap_or(false),
            public_slug: row.public_slug.filter(|slug| !slug.trim().is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
struct InsertNoteRow<'a> {
    user_id: &'a str,
    title: &'a str,
    content: &'a str,
    tags: &'a [String],
    is_pinned: bool,
    is_archived: bool,
    color: NoteColor,
}

impl<'a> InsertNoteRow<'a> {
    fn new(draft: &'a NoteDraft, owner: &'a str) -> Self {
        Self {
            user_id: owner,
            title: &draft.title,
            content: &draft.content,
            tags: &draft.tags,
            is_pinned: draft.is_pinned,
            is_archived: draft.is_archived,
            color: draft.color,
        }
    }
}

#[derive(Debug, Serialize)]
struct UpdateNoteRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<NoteColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_slug: Option<&'a str>,
    updated_at: DateTime<Utc>,
}

impl<'a> From<&'a RemotePatch> for UpdateNoteRow<'a> {
    fn from(patch: &'a RemotePatch) -> Self {
        let fields = &patch.fields;
        Self {
            title: fields.title.as_deref(),
            content: fields.content.as_deref(),
            tags: fields.tags.as_deref(),
            is_pinned: fields.is_pinned,
            is_archived: fields.is_archived,
            color: fields.color,
            is_public: patch.is_public,
            public_slug: patch.public_slug.as_deref(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PostgrestErrorResponse {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Remote(parse_api_error(status, &body)))
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<PostgrestErrorResponse>(body) {
        if payload.code.as_deref() == Some(UNIQUE_VIOLATION_CODE) {
            return format!(
                "unique constraint violated: {} ({})",
                payload.details.as_deref().unwrap_or("duplicate value").trim(),
                status.as_u16()
            );
        }
        if let Some(message) = payload.message {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

/// Normalize a Supabase project URL into its PostgREST base URL.
pub fn normalize_rest_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "Supabase URL must not be empty".to_string(),
        ));
    }
    if !is_http_url(trimmed) {
        return Err(Error::InvalidInput(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }
    if trimmed.ends_with("/rest/v1") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/rest/v1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotePatch;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_rest_url_appends_rest_path() {
        assert_eq!(
            normalize_rest_url("https://demo.supabase.co/").unwrap(),
            "https://demo.supabase.co/rest/v1"
        );
        assert_eq!(
            normalize_rest_url("https://demo.supabase.co/rest/v1").unwrap(),
            "https://demo.supabase.co/rest/v1"
        );
        assert!(normalize_rest_url("demo.supabase.co").is_err());
        assert!(normalize_rest_url("  ").is_err());
    }

    #[test]
    fn gateway_rejects_empty_anon_key() {
        assert!(SupabaseNoteGateway::new("https://demo.supabase.co", " ").is_err());
    }

    #[test]
    fn gateway_debug_redacts_keys() {
        let gateway = SupabaseNoteGateway::new("https://demo.supabase.co", "anon-secret")
            .unwrap()
            .with_access_token("access-secret");
        let rendered = format!("{gateway:?}");
        assert!(!rendered.contains("anon-secret"));
        assert!(!rendered.contains("access-secret"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn authed_calls_without_token_fail_before_sending() {
        let gateway = SupabaseNoteGateway::new("http://127.0.0.1:9", "anon").unwrap();
        let error = gateway.list("user-1").await.unwrap_err();
        assert!(matches!(error, Error::Remote(message) if message.contains("not authenticated")));
    }

    #[test]
    fn remote_row_maps_snake_case_fields() {
        let row: RemoteNoteRow = serde_json::from_str(
            r#"{
                "id": "6f1c6a8e-0000-4000-8000-000000000001",
                "user_id": "user-1",
                "title": "Groceries",
                "content": "milk, eggs",
                "tags": null,
                "created_at": "2024-05-01T10:00:00.123456+00:00",
                "updated_at": "2024-05-02T10:00:00+00:00",
                "is_pinned": true,
                "is_archived": false,
                "color": "mauve",
                "is_public": true,
                "public_slug": "abcd1234"
            }"#,
        )
        .unwrap();

        let note = Note::from(row);
        assert_eq!(note.id.as_str(), "6f1c6a8e-0000-4000-8000-000000000001");
        assert_eq!(note.owner_ref.as_deref(), Some("user-1"));
        assert!(note.tags.is_empty());
        assert!(note.is_pinned);
        assert_eq!(note.color, NoteColor::Default);
        assert_eq!(note.public_slug.as_deref(), Some("abcd1234"));
        assert!(note.created_at < note.updated_at);
    }

    #[test]
    fn update_row_serializes_only_present_fields() {
        let patch = RemotePatch::from(NotePatch {
            is_pinned: Some(true),
            ..NotePatch::default()
        });
        let value = serde_json::to_value(UpdateNoteRow::from(&patch)).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.get("is_pinned"), Some(&serde_json::Value::Bool(true)));
        assert!(object.get("title").is_none());
        assert!(object.get("public_slug").is_none());
        assert!(object.contains_key("updated_at"));
    }

    #[test]
    fn parse_api_error_reports_unique_violation() {
        let body = r#"{"code":"23505","message":"duplicate key value violates unique constraint \"notes_public_slug_key\"","details":"Key (public_slug)=(abcd1234) already exists."}"#;
        let message = parse_api_error(StatusCode::CONFLICT, body);
        assert!(message.starts_with("unique constraint violated"));
        assert!(message.contains("409"));
    }

    #[test]
    fn parse_api_error_falls_back_to_status() {
        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, "  "),
            "HTTP 502".to_string()
        );
    }
}
