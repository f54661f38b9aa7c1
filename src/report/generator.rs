//! Markdown and JSON report generation.
//!
//! This module renders a ranking as a Markdown table or a JSON document.

use crate::analysis::ScoreMethod;
use crate::models::{RankingReport, RateLimitInfo, ReportMetadata, UserDetails};
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Generate a complete Markdown report.
///
/// `top` limits the number of table rows; the metadata still counts
/// every ranked follower.
pub fn generate_markdown_report(report: &RankingReport, top: Option<usize>) -> String {
    let mut output = String::new();

    output.push_str("# Follower Ranking\n\n");
    output.push_str(&generate_metadata_section(
        &report.metadata,
        report.rate_limit.as_ref(),
    ));
    output.push_str(&generate_ranking_section(report, top));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(
    metadata: &ReportMetadata,
    rate_limit: Option<&RateLimitInfo>,
) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **User:** {}\n",
        metadata
            .username
            .as_deref()
            .unwrap_or("authenticated user")
    ));
    section.push_str(&format!("- **Method:** `{}`\n", metadata.method));
    section.push_str(&format!("- **Order:** {}\n", metadata.order));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Followers Ranked:** {}\n", metadata.total));
    if let Some(info) = rate_limit {
        section.push_str(&format!("- **Rate Limit:** {}\n", info));
    }
    section.push('\n');

    section
}

/// Generate the ranking table.
fn generate_ranking_section(report: &RankingReport, top: Option<usize>) -> String {
    let mut section = String::new();

    section.push_str("## Ranking\n\n");

    if report.ranking.is_empty() {
        section.push_str("No followers to rank.\n\n");
        return section;
    }

    section.push_str("| # | Login | Score | Followers | Following | Repos | Gists | Created |\n");
    section.push_str("|---:|:---|---:|---:|---:|---:|---:|:---|\n");

    let total = report.ranking.len();
    let shown = top.map_or(total, |n| n.min(total));

    for (rank, (record, score)) in report.ranking.iter().take(shown).enumerate() {
        section.push_str(&generate_row(rank + 1, record, score, report.metadata.method));
    }
    section.push('\n');

    if shown < total {
        section.push_str(&format!("*Showing top {} of {}.*\n\n", shown, total));
    }

    section
}

/// Generate a single table row.
fn generate_row(rank: usize, record: &UserDetails, score: f64, method: ScoreMethod) -> String {
    let login = match record.extra.get("html_url").and_then(|v| v.as_str()) {
        Some(url) => format!("[{}]({})", record.login, url),
        None => record.login.clone(),
    };

    format!(
        "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
        rank,
        login,
        format_score(score, method),
        record.followers,
        record.following,
        record.public_repos,
        record.public_gists,
        record.created_at.format("%Y-%m-%d")
    )
}

/// Render a score for display.
pub fn format_score(score: f64, method: ScoreMethod) -> String {
    if score.is_infinite() {
        return if score > 0.0 { "∞" } else { "-∞" }.to_string();
    }

    match method {
        ScoreMethod::FfRatio => format!("{:.2}", score),
        ScoreMethod::Created => DateTime::<Utc>::from_timestamp(score as i64, 0)
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| score.to_string()),
        _ => format!("{}", score as u64),
    }
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by follower-rank*\n");

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &RankingReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
