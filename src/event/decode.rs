//! NDJSON decoding of engine event streams

use crate::error::{DeployViewError, Result};

use super::message::DeployEvent;

/// Parse a single NDJSON line (1-based `line_no` for error reporting).
///
/// Blank lines yield `Ok(None)`.
pub fn parse_event_line(line: &str, line_no: usize) -> Result<Option<DeployEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| DeployViewError::EventParse {
            line: line_no,
            details: e.to_string(),
        })
}

/// Parse a whole NDJSON document, stopping at the first malformed line
pub fn parse_events(content: &str) -> Result<Vec<DeployEvent>> {
    let mut events = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if let Some(event) = parse_event_line(line, idx + 1)? {
            events.push(event);
        }
    }
    Ok(events)
}

/// Encode events as NDJSON (used by the demo engine and tests)
pub fn to_ndjson(events: &[DeployEvent]) -> Result<String> {
    let mut out = String::new();
    for event in events {
        let line = serde_json::to_string(event).map_err(|e| DeployViewError::Engine {
            reason: format!("failed to encode event: {}", e),
        })?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_are_skipped() {
        assert!(parse_event_line("   ", 1).unwrap().is_none());

        let content = "\n{\"type\":\"instance\",\"instance_id\":\"i1\",\"status\":\"preparing\"}\n\n";
        let events = parse_events(content).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let content = "{\"type\":\"instance\",\"instance_id\":\"i1\",\"status\":\"preparing\"}\n{not json}\n";
        let err = parse_events(content).unwrap_err();
        match err {
            DeployViewError::EventParse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_type_is_an_error() {
        let err = parse_event_line("{\"type\":\"export\",\"name\":\"x\"}", 7).unwrap_err();
        assert!(err.to_string().contains("line 7"));
    }
}
