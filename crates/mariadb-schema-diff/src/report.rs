//! Plain-text comparison summary written next to the SQL artifacts.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::core::object::ObjectKind;
use crate::diff::Diff;

/// Render the tabular comparison report.
pub fn comparison_report(
    diff: &Diff,
    source_schema: &str,
    dest_schema: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let mut lines = vec![
        "Schema Comparison Report".to_string(),
        "=".repeat(50),
        format!("Source schema: {}", source_schema),
        format!("Destination schema: {}", dest_schema),
        format!(
            "Generated: {}",
            generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        String::new(),
        "Schema Objects Summary".to_string(),
        "-".repeat(22),
        String::new(),
    ];

    let header = format!(
        "{:<12} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8}",
        "Object Type", "Source", "Dest", "Both", "Create", "Drop", "Modify", "Total"
    );
    let rule = "-".repeat(header.len());
    lines.push(header.clone());
    lines.push(rule.clone());

    let mut total_create = 0;
    let mut total_drop = 0;
    let mut total_modify = 0;

    for kind in ObjectKind::ALL {
        let kd = diff.kind(kind);
        let create = kd.only_in_source.len();
        let drop = kd.only_in_dest.len();
        let modify = kd.changed.len();
        total_create += create;
        total_drop += drop;
        total_modify += modify;

        lines.push(format!(
            "{:<12} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8}",
            title_case(kind.section_title()),
            kd.only_in_source.len() + kd.in_both.len(),
            kd.only_in_dest.len() + kd.in_both.len(),
            kd.in_both.len(),
            create,
            drop,
            modify,
            create + drop + modify
        ));
    }

    lines.push(rule);
    lines.push(format!(
        "{:<12} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8} {:<8}",
        "TOTAL",
        "",
        "",
        "",
        total_create,
        total_drop,
        total_modify,
        total_create + total_drop + total_modify
    ));
    lines.push(String::new());

    lines.extend(
        [
            "Column Descriptions:",
            "  Source:    Total objects in source schema",
            "  Dest:      Total objects in destination schema",
            "  Both:      Objects existing in both schemas",
            "  Create:    Objects to be created in destination",
            "  Drop:      Objects to be dropped from destination",
            "  Modify:    Objects to be modified (same name, different definition)",
            "  Total:     All operations for this object type",
        ]
        .map(str::to_string),
    );

    let mut detail = Vec::new();
    for kind in ObjectKind::ALL {
        let kd = diff.kind(kind);
        for name in &kd.only_in_source {
            detail.push(format!("  CREATE {}: {}", kind.label(), name));
        }
        for name in &kd.only_in_dest {
            detail.push(format!("  DROP {}: {}", kind.label(), name));
        }
        for name in &kd.changed {
            detail.push(format!("  MODIFY {}: {}", kind.label(), name));
        }
    }

    lines.push(String::new());
    if detail.is_empty() {
        lines.push("Schemas are in sync - no migration operations required".to_string());
    } else {
        lines.push("Detailed Changes:".to_string());
        lines.push("-".repeat(20));
        lines.extend(detail);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn title_case(upper: &str) -> String {
    let lower = upper.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => lower,
    }
}
