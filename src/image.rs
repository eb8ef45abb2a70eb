use crate::book::{ImageConfig, ImageProvider, MysticConfig, OpenAiImageConfig};
use crate::config;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const MAX_POLL_ATTEMPTS: usize = 60;

/// Routes a finished illustration prompt to the configured provider and
/// downloads the result to `out_path`. Strict dispatch; the provider enum
/// has no default variant. Single attempt end to end.
pub async fn generate_image(
    image_config: &ImageConfig,
    prompt: &str,
    out_path: &Path,
) -> Result<PathBuf> {
    let client = reqwest::Client::new();
    let url = match image_config.provider {
        ImageProvider::Openai => {
            let api_key = config::openai_api_key()?;
            let cfg = image_config
                .openai
                .as_ref()
                .context("OpenAI image config missing")?;
            openai_image_url(&client, &api_key, cfg, prompt).await?
        }
        ImageProvider::Mystic => {
            let api_key = config::freepik_api_key()?;
            let cfg = image_config
                .mystic
                .as_ref()
                .context("Mystic image config missing")?;
            let mystic = MysticClient::new(&api_key, None);
            let task_id = mystic.create_task(&MysticCreateRequest::new(cfg, prompt)).await?;
            info!("mystic task created: {}", task_id);
            poll_task(&mystic, &task_id, POLL_INTERVAL, MAX_POLL_ATTEMPTS).await?
        }
    };

    download(&client, &url, out_path).await?;
    Ok(out_path.to_path_buf())
}

// --- OpenAI images ---

#[derive(Serialize)]
struct OpenAiImageRequest {
    model: String,
    prompt: String,
    n: u32,
    size: String,
}

#[derive(Deserialize)]
struct OpenAiImageResponse {
    data: Vec<OpenAiImageData>,
}

#[derive(Deserialize)]
struct OpenAiImageData {
    url: Option<String>,
}

async fn openai_image_url(
    client: &reqwest::Client,
    api_key: &str,
    cfg: &OpenAiImageConfig,
    prompt: &str,
) -> Result<String> {
    let request_body = OpenAiImageRequest {
        model: cfg.model.clone(),
        prompt: prompt.to_string(),
        n: 1,
        size: cfg.size.clone(),
    };

    debug!("openai image request: model={} size={}", cfg.model, cfg.size);

    let resp = client
        .post("https://api.openai.com/v1/images/generations")
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&request_body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let error_text = resp.text().await?;
        return Err(anyhow!("OpenAI image API error ({}): {}", status, error_text));
    }

    let result: OpenAiImageResponse = resp.json().await?;
    result
        .data
        .first()
        .and_then(|d| d.url.clone())
        .ok_or_else(|| anyhow!("OpenAI image response contained no URL"))
}

// --- Freepik Mystic ---

#[derive(Serialize, Debug, Clone)]
pub struct MysticCreateRequest {
    pub prompt: String,
    pub resolution: String,
    pub aspect_ratio: String,
    pub model: String,
    pub engine: String,
    pub creative_detailing: u8,
    pub fixed_generation: bool,
    pub filter_nsfw: bool,
}

impl MysticCreateRequest {
    pub fn new(cfg: &MysticConfig, prompt: &str) -> Self {
        Self {
            prompt: prompt.to_string(),
            resolution: cfg.resolution.clone(),
            // Book illustrations are always square.
            aspect_ratio: "square_1_1".to_string(),
            model: cfg.model.clone(),
            engine: cfg.engine.clone(),
            creative_detailing: cfg.creative_detailing,
            fixed_generation: false,
            filter_nsfw: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MysticTaskStatus {
    pub status: String,
    #[serde(default)]
    pub generated: Vec<String>,
}

/// The Mystic task endpoints, as a seam so the poll loop can be tested
/// against scripted status sequences.
#[async_trait]
pub trait MysticTasks: Send + Sync {
    async fn create_task(&self, request: &MysticCreateRequest) -> Result<String>;
    async fn task_status(&self, task_id: &str) -> Result<MysticTaskStatus>;
}

pub struct MysticClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl MysticClient {
    pub fn new(api_key: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or("https://api.freepik.com")
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct MysticCreateResponse {
    data: Option<MysticCreateData>,
}

#[derive(Deserialize)]
struct MysticCreateData {
    task_id: Option<String>,
}

#[derive(Deserialize)]
struct MysticStatusResponse {
    data: MysticTaskStatus,
}

#[async_trait]
impl MysticTasks for MysticClient {
    async fn create_task(&self, request: &MysticCreateRequest) -> Result<String> {
        let url = format!("{}/v1/ai/mystic", self.base_url);

        let resp = self
            .client
            .post(&url)
            .header("x-freepik-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await?;
            return Err(anyhow!("Mystic API error ({}): {}", status, error_text));
        }

        let result: MysticCreateResponse = resp.json().await?;
        result
            .data
            .and_then(|d| d.task_id)
            .ok_or_else(|| anyhow!("Mystic task response missing task_id"))
    }

    async fn task_status(&self, task_id: &str) -> Result<MysticTaskStatus> {
        let url = format!("{}/v1/ai/mystic/{}", self.base_url, task_id);

        let resp = self
            .client
            .get(&url)
            .header("x-freepik-api-key", &self.api_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await?;
            return Err(anyhow!("Mystic status error ({}): {}", status, error_text));
        }

        let result: MysticStatusResponse = resp.json().await?;
        Ok(result.data)
    }
}

/// Fixed-interval wait for a Mystic task. COMPLETED with a generated URL
/// succeeds, FAILED raises immediately with the raw status embedded, any
/// other status keeps polling up to `max_attempts`. No backoff; an error
/// while checking status aborts the whole wait.
pub async fn poll_task(
    api: &dyn MysticTasks,
    task_id: &str,
    interval: Duration,
    max_attempts: usize,
) -> Result<String> {
    for attempt in 1..=max_attempts {
        let status = api.task_status(task_id).await?;
        debug!("mystic task {} poll {}: {}", task_id, attempt, status.status);

        match status.status.as_str() {
            "COMPLETED" => {
                return status
                    .generated
                    .first()
                    .cloned()
                    .ok_or_else(|| anyhow!("Mystic task completed without a generated image"));
            }
            "FAILED" => bail!("Mystic task failed: {:?}", status),
            _ => {
                if attempt < max_attempts {
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
    bail!(
        "Mystic task {} timed out after {} polls",
        task_id,
        max_attempts
    )
}

// --- Shared download step ---

/// Fetches raw bytes and writes them to `path`, creating parent directories
/// as needed. No checksum or content-type validation.
pub async fn download(client: &reqwest::Client, url: &str, path: &Path) -> Result<()> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        bail!("image download failed ({}): {}", resp.status(), url);
    }
    let bytes = resp.bytes().await?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    fs::write(path, &bytes).with_context(|| format!("Failed to write image to {:?}", path))?;
    info!("downloaded image: {:?} ({} bytes)", path, bytes.len());
    Ok(())
}

// --- Temp files ---

pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join("econotales")
}

/// Attempts are the uniqueness source within a book; the timestamp keeps
/// separate runs apart. Never garbage-collected.
pub fn temp_image_path(
    scratch: &Path,
    safe_title: &str,
    chapter_id: &str,
    attempt: u32,
    at: DateTime<Utc>,
) -> PathBuf {
    scratch.join(format!(
        "{}_{}_attempt{}_{}.png",
        safe_title,
        chapter_id,
        attempt,
        at.format("%Y%m%d%H%M%S")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedTasks {
        statuses: Mutex<Vec<MysticTaskStatus>>,
        polls: Mutex<usize>,
    }

    impl ScriptedTasks {
        fn new(statuses: Vec<MysticTaskStatus>) -> Self {
            Self {
                statuses: Mutex::new(statuses),
                polls: Mutex::new(0),
            }
        }

        fn poll_count(&self) -> usize {
            *self.polls.lock().unwrap()
        }
    }

    #[async_trait]
    impl MysticTasks for ScriptedTasks {
        async fn create_task(&self, _request: &MysticCreateRequest) -> Result<String> {
            Ok("task-1".to_string())
        }

        async fn task_status(&self, _task_id: &str) -> Result<MysticTaskStatus> {
            *self.polls.lock().unwrap() += 1;
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.is_empty() {
                // Scripted sequence exhausted: keep reporting in-progress.
                return Ok(MysticTaskStatus {
                    status: "IN_PROGRESS".to_string(),
                    generated: vec![],
                });
            }
            Ok(statuses.remove(0))
        }
    }

    fn processing() -> MysticTaskStatus {
        MysticTaskStatus { status: "IN_PROGRESS".to_string(), generated: vec![] }
    }

    fn completed(url: &str) -> MysticTaskStatus {
        MysticTaskStatus {
            status: "COMPLETED".to_string(),
            generated: vec![url.to_string()],
        }
    }

    #[tokio::test]
    async fn test_poll_returns_url_on_completion() {
        let api = ScriptedTasks::new(vec![
            processing(),
            processing(),
            completed("https://img.example/1.png"),
        ]);

        let url = poll_task(&api, "task-1", Duration::ZERO, 60).await.unwrap();
        assert_eq!(url, "https://img.example/1.png");
        assert_eq!(api.poll_count(), 3);
    }

    #[tokio::test]
    async fn test_poll_fails_immediately_on_failed_status() {
        let api = ScriptedTasks::new(vec![
            processing(),
            MysticTaskStatus { status: "FAILED".to_string(), generated: vec![] },
            completed("https://never.reached/x.png"),
        ]);

        let err = poll_task(&api, "task-1", Duration::ZERO, 60).await.unwrap_err();
        assert!(err.to_string().contains("failed"));
        // No further polling after FAILED.
        assert_eq!(api.poll_count(), 2);
    }

    #[tokio::test]
    async fn test_poll_times_out_after_exactly_max_attempts() {
        let api = ScriptedTasks::new(vec![]);

        let err = poll_task(&api, "task-1", Duration::ZERO, 7).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert_eq!(api.poll_count(), 7);
    }

    #[tokio::test]
    async fn test_poll_completed_without_url_is_an_error() {
        let api = ScriptedTasks::new(vec![MysticTaskStatus {
            status: "COMPLETED".to_string(),
            generated: vec![],
        }]);

        let err = poll_task(&api, "task-1", Duration::ZERO, 60).await.unwrap_err();
        assert!(err.to_string().contains("without a generated image"));
    }

    struct ErroringTasks;

    #[async_trait]
    impl MysticTasks for ErroringTasks {
        async fn create_task(&self, _request: &MysticCreateRequest) -> Result<String> {
            Ok("task-1".to_string())
        }
        async fn task_status(&self, _task_id: &str) -> Result<MysticTaskStatus> {
            Err(anyhow!("connection reset"))
        }
    }

    #[tokio::test]
    async fn test_poll_aborts_on_status_check_error() {
        // Transport errors are not retried; the wait aborts.
        let err = poll_task(&ErroringTasks, "task-1", Duration::ZERO, 60)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_create_response_missing_task_id() {
        let with_id: MysticCreateResponse =
            serde_json::from_str(r#"{ "data": { "task_id": "abc" } }"#).unwrap();
        assert_eq!(with_id.data.unwrap().task_id.as_deref(), Some("abc"));

        let without: MysticCreateResponse = serde_json::from_str(r#"{ "data": {} }"#).unwrap();
        assert!(without.data.unwrap().task_id.is_none());
    }

    #[test]
    fn test_status_response_shape() {
        let json = r#"{ "data": { "status": "COMPLETED", "generated": ["https://x/y.png"] } }"#;
        let resp: MysticStatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.generated[0], "https://x/y.png");

        // In-progress responses omit the generated list.
        let json = r#"{ "data": { "status": "IN_PROGRESS" } }"#;
        let resp: MysticStatusResponse = serde_json::from_str(json).unwrap();
        assert!(resp.data.generated.is_empty());
    }

    #[test]
    fn test_mystic_request_fixed_fields() {
        let cfg = MysticConfig::default();
        let req = MysticCreateRequest::new(&cfg, "a cozy scene");
        assert_eq!(req.aspect_ratio, "square_1_1");
        assert!(!req.fixed_generation);
        assert!(req.filter_nsfw);
    }

    #[test]
    fn test_temp_image_path_uniqueness_by_attempt() {
        let at = DateTime::parse_from_rfc3339("2026-08-29T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let a = temp_image_path(Path::new("/tmp/s"), "my_book", "conclusion", 1, at);
        let b = temp_image_path(Path::new("/tmp/s"), "my_book", "conclusion", 2, at);
        assert_ne!(a, b);
        assert!(a
            .to_string_lossy()
            .ends_with("my_book_conclusion_attempt1_20260829100000.png"));
    }
}
