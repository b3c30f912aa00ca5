use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;

use crate::bandit::{PpdStats, PpdSummary};
use crate::error::Result;

#[derive(Serialize)]
pub struct RobotResponse<T> {
    pub status: RobotStatus,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub data: T,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotStatus {
    Ok,
}

pub fn robot_ok<T: Serialize>(data: T) -> RobotResponse<T> {
    RobotResponse {
        status: RobotStatus::Ok,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data,
    }
}

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)?;
    println!("{payload}");
    Ok(())
}

/// Error payload printed on stdout in robot mode.
#[must_use]
pub fn robot_error_json(code: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        "error": true,
        "code": code,
        "message": message,
    })
}

pub struct HumanLayout {
    lines: Vec<String>,
    key_width: usize,
}

impl Default for HumanLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanLayout {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            key_width: 18,
        }
    }

    pub fn title(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push(String::new());
        self
    }

    pub fn section(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push("-".repeat(text.len().max(3)));
        self
    }

    pub fn kv(&mut self, key: &str, value: &str) -> &mut Self {
        let key_style = style(key).dim().to_string();
        self.lines.push(format!(
            "{key_style:width$} {value}",
            width = self.key_width
        ));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    /// One `label  stats` line per arm.
    pub fn ppd(&mut self, summaries: &[PpdSummary]) -> &mut Self {
        for summary in summaries {
            let stats = match summary.stats {
                PpdStats::Binary { success, failure } => {
                    format!("success {success:.3}  failure {failure:.3}")
                }
                PpdStats::Interval { mean, lower, upper } => {
                    format!("mean {mean:.3}  95% [{lower:.3}, {upper:.3}]")
                }
            };
            self.kv(&summary.label, &stats);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> String {
        self.lines.join("\n")
    }
}

pub fn emit_human(layout: HumanLayout) {
    println!("{}", layout.build());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robot_envelope_carries_version() {
        let response = robot_ok(serde_json::json!({"arm": "option1"}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(value["data"]["arm"], "option1");
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["data", "status", "timestamp", "version"]);
    }

    #[test]
    fn human_layout_lists_ppd_rows() {
        let mut layout = HumanLayout::new();
        layout.ppd(&[PpdSummary {
            label: "option1".to_string(),
            draws: 10,
            stats: PpdStats::Interval {
                mean: 2.0,
                lower: 0.5,
                upper: 4.25,
            },
        }]);
        let text = layout.build();
        assert!(text.contains("option1"));
        assert!(text.contains("95% [0.500, 4.250]"));
    }

    #[test]
    fn robot_error_shape() {
        let value = robot_error_json("unknown_arm", "unknown arm: x");
        assert_eq!(value["error"], true);
        assert_eq!(value["code"], "unknown_arm");
    }
}
