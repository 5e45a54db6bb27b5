//! Streaming report output (made by FontLab https://www.fontlab.com/)

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use crate::report::{CheckResult, Report};
use crate::status::Severity;

#[derive(Serialize)]
struct ReportDocument<'a> {
    profile: &'a str,
    verdict: Option<Severity>,
    summary: BTreeMap<Severity, usize>,
    results: &'a [CheckResult],
}

/// Write the report as one prettified JSON document with verdict and summary.
pub fn write_json_pretty(report: &Report, mut w: impl Write) -> Result<()> {
    let doc = ReportDocument {
        profile: report.profile(),
        verdict: report.verdict(),
        summary: report.summary(),
        results: report.results(),
    };
    let json = serde_json::to_string_pretty(&doc)?;
    w.write_all(json.as_bytes())?;
    w.write_all(b"\n")?;
    Ok(())
}

/// Write one check result per line (NDJSON).
pub fn write_ndjson(report: &Report, mut w: impl Write) -> Result<()> {
    for item in report.results() {
        let line = serde_json::to_string(item)?;
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Outcome;

    fn sample_report() -> Report {
        let result = CheckResult {
            check_id: "com.google.fonts/check/linegaps".to_string(),
            variant: None,
            section: "Universal".to_string(),
            target: "/fonts/A.ttf".to_string(),
            outcomes: vec![Outcome::warn("hhea", "hhea lineGap is not equal to 0.")],
        };
        Report::new("universal", vec![result.clone(), result])
    }

    #[test]
    fn ndjson_writes_one_line_per_result() {
        let mut buf = Vec::new();
        write_ndjson(&sample_report(), &mut buf).expect("write ndjson");

        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: CheckResult = serde_json::from_str(lines[0]).expect("parse");
        assert_eq!(parsed.outcomes[0].severity, Severity::Warn);
    }

    #[test]
    fn pretty_json_carries_verdict_and_summary() {
        let mut buf = Vec::new();
        write_json_pretty(&sample_report(), &mut buf).expect("write json");

        let doc: serde_json::Value = serde_json::from_slice(&buf).expect("parse");
        assert_eq!(doc["verdict"], "WARN");
        assert_eq!(doc["summary"]["WARN"], 2);
        assert_eq!(doc["results"].as_array().map(Vec::len), Some(2));
    }
}
