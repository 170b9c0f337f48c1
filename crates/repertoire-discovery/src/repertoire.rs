//! PRO repertoire extraction through an OpenAI-compatible chat endpoint.
//!
//! The model is asked for strict JSON of the shape
//! `{"works": [{"title", "iswc", "writers", "publishers"}]}` scoped to one
//! PRO's public repertoire. Replies are often wrapped in Markdown fences, so
//! the text is unwrapped before parsing and every entry is narrowed into a
//! [`RawWork`] here.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use repertoire_core::model::{clean_iswc, Attribution, RawWork, SourceTag};

use crate::config::Config;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::services::RepertoireService;

const SOURCE_NAME: &str = "Repertoire extraction";

const SYSTEM_PROMPT: &str = "You extract songwriter repertoire from public performing rights \
organization databases. Answer with strict JSON only, no prose, shaped as \
{\"works\": [{\"title\": string, \"iswc\": string|null, \
\"writers\": [{\"name\": string, \"share\": number|null, \"ipi\": string|null}], \
\"publishers\": [{\"name\": string, \"share\": number|null}]}]}. \
Return {\"works\": []} when nothing is known.";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractedRepertoire {
    #[serde(default)]
    works: Vec<ExtractedWork>,
}

#[derive(Debug, Deserialize)]
struct ExtractedWork {
    #[serde(default)]
    title: String,
    #[serde(default)]
    iswc: Option<String>,
    #[serde(default)]
    writers: Vec<ExtractedCredit>,
    #[serde(default)]
    publishers: Vec<ExtractedCredit>,
}

/// Credits arrive either as bare names or as attribution objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ExtractedCredit {
    Name(String),
    Detailed(Attribution),
}

impl ExtractedCredit {
    fn into_attribution(self) -> Option<Attribution> {
        let credit = match self {
            Self::Name(name) => Attribution::new(name),
            Self::Detailed(attribution) => attribution,
        };
        (!credit.name.trim().is_empty()).then_some(credit)
    }
}

impl ExtractedWork {
    fn into_raw_work(self) -> Option<RawWork> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }

        let mut work = RawWork::new(title)
            .with_writers(credits(self.writers))
            .with_publishers(credits(self.publishers));
        if let Some(iswc) = clean_iswc(self.iswc) {
            work = work.with_iswc(iswc);
        }
        Some(work)
    }
}

pub(crate) fn credits(raw: Vec<ExtractedCredit>) -> Vec<Attribution> {
    raw.into_iter()
        .filter_map(ExtractedCredit::into_attribution)
        .collect()
}

/// Unwrap a reply that may be fenced in Markdown code blocks or surrounded
/// by prose, returning the JSON object text.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();

    if let Some(start) = text.find("```") {
        let after_fence = start + 3;
        let body_start = text[after_fence..]
            .find('\n')
            .map_or(after_fence, |i| after_fence + i + 1);
        if let Some(end) = text[body_start..].find("```") {
            return text[body_start..body_start + end].trim();
        }
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Parse an extraction reply into at most `limit` works.
///
/// # Errors
/// Returns [`DiscoveryError::Parse`] when the reply is not the expected JSON
/// even after unwrapping.
pub fn parse_repertoire(text: &str, limit: usize) -> DiscoveryResult<Vec<RawWork>> {
    let body = strip_code_fences(text);
    let parsed: ExtractedRepertoire =
        serde_json::from_str(body).map_err(|e| DiscoveryError::parse(SOURCE_NAME, e))?;

    Ok(parsed
        .works
        .into_iter()
        .filter_map(ExtractedWork::into_raw_work)
        .take(limit)
        .collect())
}

/// LLM-backed [`RepertoireService`].
#[derive(Debug, Clone)]
pub struct LlmRepertoireClient {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl LlmRepertoireClient {
    /// Create a new extraction client.
    ///
    /// A missing API key is not an error here; each extraction then fails
    /// with [`DiscoveryError::MissingCredential`].
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &Config) -> DiscoveryResult<Self> {
        let http = Client::builder().timeout(config.http_timeout()).build()?;

        Ok(Self {
            http,
            endpoint: config.extraction_api_url.clone(),
            api_key: config
                .extraction_api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            model: config.extraction_model.clone(),
        })
    }

    fn user_prompt(writer_name: &str, pro: SourceTag, limit: usize) -> String {
        let domain = pro.pro_domain().unwrap_or("the PRO's website");
        format!(
            "List up to {limit} musical works registered with {} ({domain}) that credit \
             {writer_name:?} as a writer. Use only data published on {domain}.",
            pro.display_name()
        )
    }

    async fn complete(&self, api_key: &str, prompt: String) -> DiscoveryResult<String> {
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::http(SOURCE_NAME, format!("HTTP {status}")));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| DiscoveryError::parse(SOURCE_NAME, e))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| DiscoveryError::parse(SOURCE_NAME, "empty completion"))
    }
}

#[async_trait]
impl RepertoireService for LlmRepertoireClient {
    async fn extract_repertoire(
        &self,
        writer_name: &str,
        pro: SourceTag,
        limit: usize,
    ) -> DiscoveryResult<Vec<RawWork>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| DiscoveryError::MissingCredential {
                source_name: pro.display_name().to_string(),
                setting: "extraction_api_key",
            })?;

        let reply = self
            .complete(api_key, Self::user_prompt(writer_name, pro, limit))
            .await?;
        let works = parse_repertoire(&reply, limit)?;

        log::debug!(
            "{} extraction returned {} works for {}",
            pro.display_name(),
            works.len(),
            writer_name
        );
        Ok(works)
    }
}
