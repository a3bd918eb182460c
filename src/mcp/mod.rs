//! MCP (Model Context Protocol) server for chat clients.
//!
//! Exposes the study-log tools over JSON-RPC 2.0 on stdio: saving and
//! searching phrases, saving corrections, review ranking and weakness
//! analysis.

use std::io::{BufRead, Write};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::config::{Config, DigestConfig};
use crate::digest::{aggregate_patterns, rank_phrases};
use crate::error::Error;
use crate::store::{Database, RecordStore, SortOrder};
use crate::validate;

/// MCP protocol version.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server info.
const SERVER_NAME: &str = "tango";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default limits per tool, matching the tool descriptions.
const DEFAULT_LIST_LIMIT: usize = 50;
const DEFAULT_SEARCH_LIMIT: usize = 20;
const DEFAULT_REVIEW_LIMIT: usize = 20;
const DEFAULT_WEAKNESS_LIMIT: usize = 10;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: Value,
    id: Option<Value>,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
    id: Value,
}

/// JSON-RPC error.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    fn error(id: Value, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError { code, message }),
            id,
        }
    }
}

/// Tool definitions for MCP.
fn get_tools() -> Value {
    json!({
        "tools": [
            {
                "name": "save_phrase",
                "description": "Save a new English phrase with its Japanese translation.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "english": { "type": "string", "description": "English phrase" },
                        "japanese": { "type": "string", "description": "Japanese translation" },
                        "context": { "type": "string", "description": "Usage context" }
                    },
                    "required": ["english", "japanese"]
                }
            },
            {
                "name": "list_phrases",
                "description": "List saved phrases ordered by creation date.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "limit": { "type": "number", "description": "Number of phrases to return (default 50)" },
                        "order": { "type": "string", "enum": ["asc", "desc"], "description": "Sort order" }
                    }
                }
            },
            {
                "name": "search_phrases",
                "description": "Search phrases by keyword. Hits count as retrievals for review scheduling.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "keyword": { "type": "string", "description": "Search keyword" },
                        "limit": { "type": "number", "description": "Number of results (default 20)" }
                    },
                    "required": ["keyword"]
                }
            },
            {
                "name": "get_review_priority",
                "description": "Get phrases ranked by how urgently they need review.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "limit": { "type": "number", "description": "Number of phrases to return (default 20)" }
                    }
                }
            },
            {
                "name": "mark_phrase_reviewed",
                "description": "Record that a phrase was just reviewed, resetting its staleness.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "phrase_id": { "type": "string", "description": "ID of the reviewed phrase" }
                    },
                    "required": ["phrase_id"]
                }
            },
            {
                "name": "save_correction",
                "description": "Save an English correction with feedback and an optional error-pattern label.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "original_text": { "type": "string", "description": "Original text" },
                        "corrected_text": { "type": "string", "description": "Corrected text" },
                        "feedback": { "type": "string", "description": "Feedback" },
                        "error_pattern": { "type": "string", "description": "Error pattern/type" }
                    },
                    "required": ["original_text", "corrected_text", "feedback"]
                }
            },
            {
                "name": "list_corrections",
                "description": "List saved corrections ordered by creation date.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "limit": { "type": "number", "description": "Number of corrections to return (default 50)" },
                        "order": { "type": "string", "enum": ["asc", "desc"], "description": "Sort order" }
                    }
                }
            },
            {
                "name": "analyze_weaknesses",
                "description": "Analyze recurring grammar error patterns across saved corrections.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "limit": { "type": "number", "description": "Number of patterns to return (default 10)" }
                    }
                }
            }
        ]
    })
}

fn arg_str<'a>(params: &'a Value, name: &str) -> Result<&'a str, Error> {
    params
        .get("arguments")
        .and_then(|a| a.get(name))
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Validation(format!("Missing required argument: {}", name)))
}

fn arg_str_or<'a>(params: &'a Value, name: &str, default: &'a str) -> &'a str {
    params
        .get("arguments")
        .and_then(|a| a.get(name))
        .and_then(|v| v.as_str())
        .unwrap_or(default)
}

fn arg_limit(params: &Value, default: usize) -> Result<usize, Error> {
    let limit = params
        .get("arguments")
        .and_then(|a| a.get("limit"))
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .unwrap_or(default);
    validate::validate_limit(limit)
}

/// Wrap a JSON value as MCP text content.
fn text_content(value: Value) -> Result<Value, Error> {
    let text = serde_json::to_string_pretty(&value)?;
    Ok(json!({
        "content": [
            {
                "type": "text",
                "text": text
            }
        ]
    }))
}

fn handle_save_phrase(db: &Database, params: &Value) -> Result<Value, Error> {
    let english = arg_str(params, "english")?;
    let japanese = arg_str(params, "japanese")?;
    let context = arg_str_or(params, "context", "");
    validate::validate_phrase_input(english, japanese, context)?;

    let record = db.save_phrase(english, japanese, context, Utc::now())?;
    info!(phrase = %record.english, "phrase saved");
    text_content(json!({
        "message": format!("Phrase saved: {}", record.english),
        "phrase": record,
    }))
}

fn handle_list_phrases(db: &Database, params: &Value) -> Result<Value, Error> {
    let limit = arg_limit(params, DEFAULT_LIST_LIMIT)?;
    let order = SortOrder::parse_or_default(arg_str_or(params, "order", "desc"));

    let phrases = db.list_phrases(limit, order)?;
    text_content(json!({
        "count": phrases.len(),
        "phrases": phrases,
    }))
}

fn handle_search_phrases(db: &Database, params: &Value) -> Result<Value, Error> {
    let keyword = arg_str(params, "keyword")?;
    validate::validate_search_keyword(keyword)?;
    let limit = arg_limit(params, DEFAULT_SEARCH_LIMIT)?;

    let phrases = db.search_phrases(keyword, limit, Utc::now())?;
    text_content(json!({
        "count": phrases.len(),
        "keyword": keyword,
        "phrases": phrases,
    }))
}

fn handle_get_review_priority(
    db: &Database,
    digest_config: &DigestConfig,
    params: &Value,
) -> Result<Value, Error> {
    let limit = arg_limit(params, DEFAULT_REVIEW_LIMIT)?;

    let phrases = db.fetch_all_phrases()?;
    let mut ranked = rank_phrases(&phrases, Utc::now(), digest_config.staleness_horizon_days);
    ranked.truncate(limit);

    text_content(json!({
        "count": ranked.len(),
        "phrases": ranked,
    }))
}

fn handle_mark_phrase_reviewed(db: &Database, params: &Value) -> Result<Value, Error> {
    let phrase_id = arg_str(params, "phrase_id")?;

    if !db.mark_phrase_reviewed(phrase_id, Utc::now())? {
        return Err(Error::Validation(format!(
            "No phrase with id: {}",
            phrase_id
        )));
    }
    text_content(json!({
        "message": format!("Phrase marked as reviewed: {}", phrase_id),
    }))
}

fn handle_save_correction(db: &Database, params: &Value) -> Result<Value, Error> {
    let original_text = arg_str(params, "original_text")?;
    let corrected_text = arg_str(params, "corrected_text")?;
    let feedback = arg_str(params, "feedback")?;
    let error_pattern = arg_str_or(params, "error_pattern", "");
    validate::validate_correction_input(original_text, corrected_text, feedback, error_pattern)?;

    let record = db.save_correction(
        original_text,
        corrected_text,
        feedback,
        error_pattern,
        Utc::now(),
    )?;
    info!(pattern = %record.error_pattern, "correction saved");
    text_content(json!({
        "message": "Correction saved",
        "correction": record,
    }))
}

fn handle_list_corrections(db: &Database, params: &Value) -> Result<Value, Error> {
    let limit = arg_limit(params, DEFAULT_LIST_LIMIT)?;
    let order = SortOrder::parse_or_default(arg_str_or(params, "order", "desc"));

    let corrections = db.list_corrections(limit, order)?;
    text_content(json!({
        "count": corrections.len(),
        "corrections": corrections,
    }))
}

fn handle_analyze_weaknesses(db: &Database, params: &Value) -> Result<Value, Error> {
    let limit = arg_limit(params, DEFAULT_WEAKNESS_LIMIT)?;

    let corrections = db.fetch_all_corrections()?;
    let mut patterns = aggregate_patterns(&corrections);
    patterns.truncate(limit);

    let mut recent = corrections.clone();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(5);

    text_content(json!({
        "total_corrections": corrections.len(),
        "common_patterns": patterns,
        "recent_corrections": recent,
    }))
}

/// Dispatch one tool call. Returns None for an unknown tool name.
fn dispatch_tool(
    db: &Database,
    digest_config: &DigestConfig,
    tool_name: &str,
    params: &Value,
) -> Option<Result<Value, Error>> {
    let result = match tool_name {
        "save_phrase" => handle_save_phrase(db, params),
        "list_phrases" => handle_list_phrases(db, params),
        "search_phrases" => handle_search_phrases(db, params),
        "get_review_priority" => handle_get_review_priority(db, digest_config, params),
        "mark_phrase_reviewed" => handle_mark_phrase_reviewed(db, params),
        "save_correction" => handle_save_correction(db, params),
        "list_corrections" => handle_list_corrections(db, params),
        "analyze_weaknesses" => handle_analyze_weaknesses(db, params),
        _ => return None,
    };
    Some(result)
}

/// Handle incoming MCP request.
fn handle_request(
    db: &Database,
    digest_config: &DigestConfig,
    request: &JsonRpcRequest,
) -> JsonRpcResponse {
    let id = request.id.clone().unwrap_or(Value::Null);

    match request.method.as_str() {
        "initialize" => {
            info!("MCP initialize");
            JsonRpcResponse::success(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {
                        "tools": {}
                    },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": SERVER_VERSION
                    }
                }),
            )
        }

        "notifications/initialized" => {
            debug!("MCP initialized notification");
            JsonRpcResponse::success(id, json!({}))
        }

        "tools/list" => {
            debug!("MCP tools/list");
            JsonRpcResponse::success(id, get_tools())
        }

        "tools/call" => {
            let tool_name = request
                .params
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or("");

            debug!(tool = tool_name, "MCP tools/call");

            match dispatch_tool(db, digest_config, tool_name, &request.params) {
                Some(Ok(result)) => JsonRpcResponse::success(id, result),
                Some(Err(e)) => JsonRpcResponse::error(id, -32000, e.to_string()),
                None => JsonRpcResponse::error(id, -32601, format!("Unknown tool: {}", tool_name)),
            }
        }

        _ => {
            debug!(method = request.method, "Unknown MCP method");
            JsonRpcResponse::error(id, -32601, format!("Method not found: {}", request.method))
        }
    }
}

/// Run the MCP server (stdio mode).
pub fn run() -> Result<(), Error> {
    info!("Starting MCP server");

    let config = Config::load()?;
    let db_path = Config::db_path()?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::open(&db_path)?;

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }

        debug!(request = %line, "MCP request");

        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                error!(error = %e, "Failed to parse MCP request");
                let response =
                    JsonRpcResponse::error(Value::Null, -32700, format!("Parse error: {}", e));
                let response_str = serde_json::to_string(&response)?;
                writeln!(stdout, "{}", response_str)?;
                stdout.flush()?;
                continue;
            }
        };

        // Skip notifications (no id)
        if request.id.is_none() && request.method.starts_with("notifications/") {
            debug!(method = request.method, "Skipping notification");
            continue;
        }

        let response = handle_request(&db, &config.digest, &request);
        let response_str = serde_json::to_string(&response)?;

        debug!(response = %response_str, "MCP response");

        writeln!(stdout, "{}", response_str)?;
        stdout.flush()?;
    }

    info!("MCP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(tool: &str, arguments: Value) -> Value {
        json!({ "name": tool, "arguments": arguments })
    }

    #[test]
    fn test_save_then_list_phrases() {
        let db = Database::open_memory().unwrap();

        let params = call(
            "save_phrase",
            json!({ "english": "break the ice", "japanese": "打ち解ける" }),
        );
        handle_save_phrase(&db, &params).unwrap();

        let params = call("list_phrases", json!({}));
        let result = handle_list_phrases(&db, &params).unwrap();
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("break the ice"));
    }

    #[test]
    fn test_missing_required_argument() {
        let db = Database::open_memory().unwrap();
        let params = call("save_phrase", json!({ "english": "hello" }));
        let result = handle_save_phrase(&db, &params);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_unknown_tool_is_method_not_found() {
        let db = Database::open_memory().unwrap();
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: "tools/call".to_string(),
            params: call("no_such_tool", json!({})),
            id: Some(json!(1)),
        };
        let response = handle_request(&db, &DigestConfig::default(), &request);
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[test]
    fn test_analyze_weaknesses_excludes_unlabeled() {
        let db = Database::open_memory().unwrap();
        for pattern in ["article", "article", ""] {
            let params = call(
                "save_correction",
                json!({
                    "original_text": "a",
                    "corrected_text": "b",
                    "feedback": "c",
                    "error_pattern": pattern,
                }),
            );
            handle_save_correction(&db, &params).unwrap();
        }

        let params = call("analyze_weaknesses", json!({}));
        let result = handle_analyze_weaknesses(&db, &params).unwrap();
        let text = result["content"][0]["text"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["total_corrections"], 3);
        assert_eq!(parsed["common_patterns"].as_array().unwrap().len(), 1);
        assert_eq!(parsed["common_patterns"][0]["count"], 2);
    }
}
