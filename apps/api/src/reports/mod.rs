//! Report Store: renders an interview scorecard and its proctoring flags into
//! a Markdown document and keeps it in S3 / MinIO under a stable key.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

use crate::interview::ai::Scorecard;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("S3 upload failed: {0}")]
    Upload(String),

    #[error("S3 download failed: {0}")]
    Download(String),
}

/// Carried in `AppState` as `Arc<dyn ReportStore>`.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Renders and stores the report, returning the path to retrieve it by.
    async fn render_and_persist(
        &self,
        scorecard: &Scorecard,
        proctoring_flags: &[String],
        application_id: i32,
    ) -> Result<String, ReportError>;

    /// `Ok(None)` when nothing is stored at `report_path`.
    async fn fetch(&self, report_path: &str) -> Result<Option<Bytes>, ReportError>;
}

pub struct S3ReportStore {
    s3: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ReportStore {
    pub fn new(s3: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { s3, bucket }
    }
}

pub fn report_key(application_id: i32) -> String {
    format!("reports/report_application_{application_id}.md")
}

#[async_trait]
impl ReportStore for S3ReportStore {
    async fn render_and_persist(
        &self,
        scorecard: &Scorecard,
        proctoring_flags: &[String],
        application_id: i32,
    ) -> Result<String, ReportError> {
        let document = render_report_md(scorecard, proctoring_flags);
        let key = report_key(application_id);

        self.s3
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(document.into_bytes()))
            .content_type("text/markdown")
            .send()
            .await
            .map_err(|e| ReportError::Upload(e.to_string()))?;

        info!("Uploaded interview report to s3://{}/{}", self.bucket, key);
        Ok(key)
    }

    async fn fetch(&self, report_path: &str) -> Result<Option<Bytes>, ReportError> {
        let output = match self
            .s3
            .get_object()
            .bucket(&self.bucket)
            .key(report_path)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    return Ok(None);
                }
                return Err(ReportError::Download(service_error.to_string()));
            }
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| ReportError::Download(e.to_string()))?;
        Ok(Some(body.into_bytes()))
    }
}

/// Renders the candidate performance report.
/// Flags are listed sorted and de-duplicated; the section is omitted when there are none.
pub fn render_report_md(scorecard: &Scorecard, proctoring_flags: &[String]) -> String {
    let mut md = String::from("# Candidate Performance Report\n\n");

    md.push_str("## Overall Summary\n\n");
    md.push_str(&or_na(&scorecard.overall_summary));
    md.push_str("\n\n");

    push_bullets(&mut md, "Key Strengths", &scorecard.strengths);
    push_bullets(&mut md, "Areas for Improvement", &scorecard.areas_for_improvement);

    md.push_str("## Final Recommendation\n\n");
    md.push_str(&format!("**{}**\n", or_na(&scorecard.final_recommendation)));

    let mut flags: Vec<&str> = proctoring_flags.iter().map(String::as_str).collect();
    flags.sort_unstable();
    flags.dedup();
    if !flags.is_empty() {
        md.push_str("\n---\n\n## Proctoring Flags\n\n");
        for flag in flags {
            md.push_str(&format!("- ⚠ {flag}\n"));
        }
    }
    md
}

fn push_bullets(md: &mut String, title: &str, items: &[String]) {
    md.push_str(&format!("## {title}\n\n"));
    if items.is_empty() {
        md.push_str("- N/A\n");
    }
    for item in items {
        md.push_str(&format!("- {item}\n"));
    }
    md.push('\n');
}

fn or_na(text: &str) -> String {
    if text.trim().is_empty() {
        "N/A".to_string()
    } else {
        text.to_string()
    }
}
