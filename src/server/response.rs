// src/server/response.rs
// Helper functions for MCP tool responses

use rmcp::model::{CallToolResult, Content};

use crate::tools::Envelope;

/// Map an operation envelope onto an MCP tool result. The envelope body is
/// returned either way so clients see columns, rows and the message together.
pub fn envelope_response(envelope: Envelope) -> CallToolResult {
    let is_error = envelope.is_error();
    let body = serde_json::to_string_pretty(&envelope)
        .unwrap_or_else(|e| format!("{{\"status\": \"error\", \"message\": \"{e}\"}}"));
    if is_error {
        CallToolResult::error(vec![Content::text(body)])
    } else {
        CallToolResult::success(vec![Content::text(body)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelopes_become_error_results() {
        let result = envelope_response(Envelope::error("Site code is required"));
        assert_eq!(result.is_error, Some(true));
    }

    #[test]
    fn success_envelopes_become_success_results() {
        let table = crate::table::Table::new(vec!["site_no".to_string()], vec![]);
        let result = envelope_response(Envelope::success(table, "ok"));
        assert_ne!(result.is_error, Some(true));
    }
}
