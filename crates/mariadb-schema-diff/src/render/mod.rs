//! Textual rendering of plans into executable SQL scripts.
//!
//! The renderer owns everything cosmetic: the header, section banners,
//! `FOREIGN_KEY_CHECKS` wrapper, `DELIMITER` blocks, statement terminators,
//! and the footer. The generation timestamp is passed in by the caller so
//! the output is a pure function of its inputs.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::plan::{Plan, PlanEntry};

/// Script-level metadata rendered into the header.
#[derive(Debug, Clone)]
pub struct ScriptMeta<'a> {
    /// Script title, e.g. "Migration" or "Rollback".
    pub title: &'a str,
    pub source_schema: &'a str,
    pub dest_schema: &'a str,
    pub generated_at: DateTime<Utc>,
}

const BANNER_RULE: &str = "--------------------------------------------------";

/// Render a plan into the final SQL text.
pub fn render_script(plan: &Plan, meta: &ScriptMeta<'_>) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("-- {} script generated by mariadb-schema-diff", meta.title));
    lines.push(format!("-- Source schema: {}", meta.source_schema));
    lines.push(format!("-- Destination schema: {}", meta.dest_schema));
    lines.push(format!(
        "-- Generated: {}",
        meta.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    lines.push(String::new());
    lines.push("-- WARNING: Review this script carefully before executing!".to_string());
    lines.push("-- This script will modify the destination database structure.".to_string());
    lines.push(String::new());
    lines.push("SET FOREIGN_KEY_CHECKS = 0;".to_string());
    lines.push(String::new());

    for section in &plan.sections {
        lines.push(format!("-- {} CHANGES", section.kind.section_title()));
        lines.push(format!("--{}", BANNER_RULE));
        for entry in &section.entries {
            match entry {
                PlanEntry::Comment(text) => lines.push(format!("-- {}", text)),
                PlanEntry::Statement(sql) => lines.push(format!("{};", sql)),
                PlanEntry::DelimiterBlock(body) => {
                    lines.push("DELIMITER $$".to_string());
                    lines.push(format!("{}$$", body.trim_end().trim_end_matches(';')));
                    lines.push("DELIMITER ;".to_string());
                }
                PlanEntry::Blank => lines.push(String::new()),
            }
        }
        lines.push(String::new());
    }

    lines.push("SET FOREIGN_KEY_CHECKS = 1;".to_string());
    lines.push(String::new());
    lines.push("-- script completed.".to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
