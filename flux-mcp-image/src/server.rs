//! MCP Server implementation for the Flux server.
//!
//! This module provides the MCP server handler that exposes:
//! - `flux_generate` tool for text-to-image generation
//! - Resources for models and aspect ratios

use crate::handler::FluxAdapter;
use crate::params::{
    DEFAULT_HEIGHT, DEFAULT_MODEL, DEFAULT_SAFETY_TOLERANCE, DEFAULT_WIDTH, GenerationSettings,
};
use crate::resources::{self, ASPECT_RATIOS_URI, MODELS_URI};
use flux_mcp_common::config::Config;
use flux_mcp_common::error::Error;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    model::{
        CallToolResult, Content, ListResourcesResult, ReadResourceResult, ResourceContents,
        ServerCapabilities, ServerInfo,
    },
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Name of the generation tool.
pub const GENERATE_TOOL: &str = "flux_generate";

/// MCP Server for Flux image generation.
#[derive(Clone, Debug)]
pub struct FluxServer {
    adapter: FluxAdapter,
}

/// Tool parameters for flux_generate.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FluxGenerateToolParams {
    /// Text description of the image to generate
    pub prompt: String,
    /// Flux model to use (default: flux-pro-1.1)
    #[serde(default)]
    pub model: Option<String>,
    /// Aspect ratio: 21:9, 16:9, 3:2, 4:3, 1:1, 3:4, 2:3, 9:16 or 9:21 (default: 16:9).
    /// Pass null to use width and height instead.
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: Option<String>,
    /// Image width in pixels, used only when aspect_ratio is null (default: 1024)
    #[serde(default)]
    pub width: Option<i64>,
    /// Image height in pixels, used only when aspect_ratio is null (default: 1024)
    #[serde(default)]
    pub height: Option<i64>,
    /// Less processed, more natural-looking output (default: false)
    #[serde(default)]
    pub raw: Option<bool>,
    /// Safety filter level from 0 (strict) to 10 (permissive) (default: 6)
    #[serde(default)]
    pub safety_tolerance: Option<i64>,
    /// Let the service expand the prompt for more detail (default: false)
    #[serde(default)]
    pub prompt_upsampling: Option<bool>,
}

fn default_aspect_ratio() -> Option<String> {
    GenerationSettings::default().aspect_ratio
}

impl From<&FluxGenerateToolParams> for GenerationSettings {
    fn from(params: &FluxGenerateToolParams) -> Self {
        Self {
            model: params.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            aspect_ratio: params.aspect_ratio.clone(),
            width: params.width.unwrap_or(DEFAULT_WIDTH),
            height: params.height.unwrap_or(DEFAULT_HEIGHT),
            raw: params.raw.unwrap_or(false),
            safety_tolerance: params.safety_tolerance.unwrap_or(DEFAULT_SAFETY_TOLERANCE),
            prompt_upsampling: params.prompt_upsampling.unwrap_or(false),
        }
    }
}

impl FluxServer {
    /// Create a new FluxServer talking to the configured service.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, Error> {
        let adapter = FluxAdapter::from_config(&config, GenerationSettings::default())?;
        Ok(Self::with_adapter(adapter))
    }

    /// Create a server around an existing adapter.
    pub fn with_adapter(adapter: FluxAdapter) -> Self {
        Self { adapter }
    }

    /// Generate an image from a text prompt.
    ///
    /// Never fails at the protocol level; generation errors come back as a
    /// tool result flagged `is_error`.
    pub async fn generate_image(
        &self,
        params: FluxGenerateToolParams,
        cancel: &CancellationToken,
    ) -> CallToolResult {
        info!(model = ?params.model, "Generating image");

        let adapter = self.adapter.with_settings(GenerationSettings::from(&params));
        let result = adapter.generate(&params.prompt, cancel).await;
        let content = vec![Content::text(result.to_value().to_string())];

        if result.is_success() {
            CallToolResult::success(content)
        } else {
            CallToolResult::error(content)
        }
    }
}

impl ServerHandler for FluxServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Image generation server using Black Forest Labs Flux models. \
                 Use flux_generate to create an image from a text prompt; \
                 the result carries the image URL and generation metadata."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    fn list_tools(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<rmcp::model::ListToolsResult, McpError>> + Send + '_ {
        async move {
            use rmcp::model::{ListToolsResult, Tool};
            use schemars::schema_for;

            let schema = schema_for!(FluxGenerateToolParams);
            let schema_value = serde_json::to_value(&schema).unwrap_or_default();
            let input_schema = match schema_value {
                serde_json::Value::Object(map) => Arc::new(map),
                _ => Arc::new(serde_json::Map::new()),
            };

            Ok(ListToolsResult {
                tools: vec![Tool {
                    name: Cow::Borrowed(GENERATE_TOOL),
                    description: Some(Cow::Borrowed(
                        "Generate an image from a text prompt using Black Forest Labs Flux. \
                         Submits the job, waits for it to finish and returns JSON with \
                         status, the image URL and metadata, or a classified error.",
                    )),
                    input_schema,
                    annotations: None,
                    icons: None,
                    meta: None,
                    output_schema: None,
                    title: None,
                }],
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        params: rmcp::model::CallToolRequestParam,
        context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            match params.name.as_ref() {
                GENERATE_TOOL => {
                    let tool_params: FluxGenerateToolParams = params
                        .arguments
                        .map(|args| serde_json::from_value(serde_json::Value::Object(args)))
                        .transpose()
                        .map_err(|e| McpError::invalid_params(format!("Invalid parameters: {}", e), None))?
                        .ok_or_else(|| McpError::invalid_params("Missing parameters", None))?;

                    Ok(self.generate_image(tool_params, &context.ct).await)
                }
                _ => Err(McpError::invalid_params(format!("Unknown tool: {}", params.name), None)),
            }
        }
    }

    fn list_resources(
        &self,
        _params: Option<rmcp::model::PaginatedRequestParam>,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move {
            debug!("Listing resources");

            let models_resource = rmcp::model::Resource {
                raw: rmcp::model::RawResource {
                    uri: MODELS_URI.to_string(),
                    name: "Available Flux Models".to_string(),
                    title: None,
                    description: Some("Flux models with their geometry limits and aliases".to_string()),
                    mime_type: Some("application/json".to_string()),
                    size: None,
                    icons: None,
                    meta: None,
                },
                annotations: None,
            };

            let aspect_ratios_resource = rmcp::model::Resource {
                raw: rmcp::model::RawResource {
                    uri: ASPECT_RATIOS_URI.to_string(),
                    name: "Aspect Ratios".to_string(),
                    title: None,
                    description: Some(
                        "Supported aspect ratios and the image size each produces".to_string(),
                    ),
                    mime_type: Some("application/json".to_string()),
                    size: None,
                    icons: None,
                    meta: None,
                },
                annotations: None,
            };

            Ok(ListResourcesResult {
                resources: vec![models_resource, aspect_ratios_resource],
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn read_resource(
        &self,
        params: rmcp::model::ReadResourceRequestParam,
        _context: rmcp::service::RequestContext<rmcp::service::RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let uri = &params.uri;
            debug!(uri = %uri, "Reading resource");

            let content = match uri.as_str() {
                MODELS_URI => resources::models_resource_json(),
                ASPECT_RATIOS_URI => resources::aspect_ratios_resource_json(),
                _ => {
                    return Err(McpError::resource_not_found(
                        format!("Unknown resource: {}", uri),
                        None,
                    ));
                }
            };

            Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(content, uri.clone())],
            })
        }
    }
}
