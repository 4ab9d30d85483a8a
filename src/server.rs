use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};

use crate::analysis::{AnalysisOutcome, Analyzer, RunOptions};
use crate::config::Config;
use crate::dispatch::http::EndpointClient;
use crate::error::GleanError;
use crate::ingest;
use crate::normalize::ResponseNormalizer;
use crate::normalize::profile::FieldProfile;
use crate::render;
use crate::response::{ToolMetadata, ToolResponse};
use crate::tools::analyze::{AnalyzeRequest, AnalyzeSummary};
use crate::tools::enums::{RecordFormat, ResponseFormat};
use crate::tools::normalize::NormalizeRequest;
use crate::tools::profiles::{ProfileInfo, ProfilesResponse};

#[derive(Clone)]
pub struct GleanerServer {
    config: Arc<Config>,
    /// `None` when no endpoint URL is configured; `analyze` then reports an error.
    client: Option<Arc<EndpointClient>>,
    tool_router: ToolRouter<Self>,
}

/// What a completed `analyze` run hands back to the tool handler.
struct AnalysisRun {
    summary: AnalyzeSummary,
    outcome: AnalysisOutcome,
    report_file: Option<String>,
    report_error: Option<String>,
}

#[tool_router]
impl GleanerServer {
    pub fn new(config: Config) -> Self {
        let client = config.endpoint.url.clone().and_then(|url| {
            EndpointClient::new(&config.endpoint, url)
                .inspect_err(|e| tracing::error!("endpoint client unavailable: {e}"))
                .ok()
                .map(Arc::new)
        });

        Self {
            config: Arc::new(config),
            client,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "normalize",
        description = "Turn raw analysis-endpoint output (JSON envelope, fenced JSON, or `Key: Value | Key: Value` text) into structured records with every profile field filled in. Never fails on malformed input: unusable output yields a record marked with the profile's diagnostic value.",
        annotations(read_only_hint = true)
    )]
    async fn normalize(
        &self,
        Parameters(req): Parameters<NormalizeRequest>,
    ) -> Result<CallToolResult, McpError> {
        req.validate().map_err(|msg| McpError::invalid_params(msg, None))?;
        let profile = self.profile(req.profile.as_deref())?;
        let start = Instant::now();

        let normalizer = ResponseNormalizer::new(profile);
        let records = normalizer.normalize(&req.raw).into_records();
        let format = req.format.unwrap_or_default();

        let content = match format {
            RecordFormat::Json => serde_json::to_string_pretty(&records)
                .map_err(|e| McpError::internal_error(e.to_string(), None))?,
            RecordFormat::Table => render::render_table(&records, normalizer.profile()),
            RecordFormat::Pipe => records
                .iter()
                .map(|r| r.to_pipe_string())
                .collect::<Vec<_>>()
                .join("\n"),
        };

        let response = ToolResponse::success(
            content,
            format.content_type(),
            ToolMetadata {
                tool_name: "normalize".to_string(),
                profile: normalizer.profile().name.clone(),
                records: records.len(),
                duration_seconds: start.elapsed().as_secs_f64(),
                ..Default::default()
            },
        );

        Ok(response.into_call_tool_result())
    }

    #[tool(
        name = "analyze",
        description = "Read a feedback file (.csv/.txt/.json/.xlsx), send its rows to the analysis endpoint in batches (one request at a time), normalize every response, and return a summary plus a markdown table. Pass `report_path` to also write a plain-text report. A failed batch gets a diagnostic record and the run continues."
    )]
    async fn analyze(
        &self,
        Parameters(req): Parameters<AnalyzeRequest>,
    ) -> Result<CallToolResult, McpError> {
        req.validate().map_err(|msg| McpError::invalid_params(msg, None))?;
        let profile = self.profile(req.profile.as_deref())?;
        let start = Instant::now();

        let mut metadata = ToolMetadata {
            tool_name: "analyze".to_string(),
            profile: profile.name.clone(),
            ..Default::default()
        };

        let response = match self.run_analysis(&req, &profile).await {
            Ok(run) => {
                metadata.records = run.outcome.records.len();
                metadata.failed_batches = Some(run.outcome.failures.len());
                metadata.report_file = run.report_file;
                metadata.duration_seconds = start.elapsed().as_secs_f64();

                let mut content = run.summary.to_markdown();
                if let Some(err) = run.report_error {
                    content.push_str(&format!("\n- report not written: {err}"));
                }
                if req.response_format.unwrap_or_default() == ResponseFormat::Detailed {
                    content.push_str("\n\n");
                    content.push_str(&render::render_table(&run.outcome.records, &profile));
                }

                let all_failed = run.outcome.batches_sent > 0
                    && run.outcome.failures.len() == run.outcome.batches_sent;
                if all_failed {
                    ToolResponse::error(content, metadata)
                } else if run.outcome.is_clean() {
                    ToolResponse::success(content, "markdown", metadata)
                } else {
                    ToolResponse::partial(content, "markdown", metadata)
                }
            }
            Err(e) => {
                tracing::warn!("analyze failed: {e}");
                metadata.duration_seconds = start.elapsed().as_secs_f64();
                ToolResponse::error(e.user_message(), metadata)
            }
        };

        Ok(response.into_call_tool_result())
    }

    #[tool(
        name = "profiles",
        description = "List the field profiles available to `normalize` and `analyze`, with each field's default value.",
        annotations(read_only_hint = true)
    )]
    async fn profiles(&self) -> Result<CallToolResult, McpError> {
        let mut profiles = Vec::new();
        for name in self.config.profile_names() {
            let profile = self.profile(Some(name.as_str()))?;
            profiles.push(ProfileInfo::new(&profile, name == self.config.profile));
        }
        let count = profiles.len();

        let list = ProfilesResponse { profiles };
        let response = ToolResponse::success(
            list.to_markdown(),
            "markdown",
            ToolMetadata {
                tool_name: "profiles".to_string(),
                profile: self.config.profile.clone(),
                records: count,
                ..Default::default()
            },
        );

        Ok(response.into_call_tool_result())
    }
}

impl GleanerServer {
    fn profile(&self, name: Option<&str>) -> Result<FieldProfile, McpError> {
        self.config
            .resolve_profile(name)
            .map_err(|e| McpError::invalid_params(e.user_message(), None))
    }

    async fn run_analysis(
        &self,
        req: &AnalyzeRequest,
        profile: &FieldProfile,
    ) -> Result<AnalysisRun, GleanError> {
        let client = self.client.as_deref().ok_or_else(|| {
            GleanError::Config("no analysis endpoint configured (set GLEANER_ENDPOINT_URL)".to_string())
        })?;

        let dataset = ingest::load_dataset(Path::new(&req.file_path)).await?;
        let batch = &self.config.batch;
        let options = RunOptions {
            mode: req.mode.unwrap_or(batch.mode),
            batch_size: req.batch_size.unwrap_or(batch.size),
            max_rows: match req.max_rows {
                Some(0) => None,
                Some(n) => Some(n),
                None => batch.max_rows,
            },
        };

        let normalizer = ResponseNormalizer::new(profile.clone());
        let outcome = Analyzer::new(client, &normalizer).run(&dataset, options).await;
        let summary = AnalyzeSummary::new(req.file_path.clone(), options.mode, dataset.len(), &outcome);

        let mut report_file = None;
        let mut report_error = None;
        if let Some(ref path) = req.report_path {
            let title = req
                .report_title
                .as_deref()
                .unwrap_or(&self.config.report_title);
            match render::write_report(Path::new(path), &outcome.records, profile, title).await {
                Ok(()) => report_file = Some(path.clone()),
                Err(e) => {
                    tracing::warn!("failed to write report: {e}");
                    report_error = Some(e.user_message());
                }
            }
        }

        Ok(AnalysisRun {
            summary,
            outcome,
            report_file,
            report_error,
        })
    }
}

#[tool_handler]
impl ServerHandler for GleanerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "gleaner".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Gleaner: batch feedback analysis through a remote text-analysis endpoint.\n\n\
                 Workflow:\n\
                 1. Call `profiles` to pick the field set your endpoint's model answers with.\n\
                 2. Call `analyze` with `file_path` (and `profile`, `report_path` as needed).\n\
                 3. Use `normalize` to parse a single raw endpoint response by hand.\n\n\
                 Missing fields are always filled with the profile default; unusable output is\n\
                 marked with the profile's diagnostic value instead of failing."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
