use client_core::BoardColumn;
use shared::{
    domain::Candidate,
    error::ValidationError,
    protocol::Analytics,
};

pub const TOP_ROLE_LIMIT: usize = 8;
const BAR_WIDTH: usize = 20;

pub fn board(columns: &[BoardColumn]) -> String {
    let mut out = String::new();
    for column in columns {
        out.push_str(&format!("{} ({})\n", column.title, column.candidates.len()));
        if column.candidates.is_empty() {
            out.push_str("  (empty)\n");
        }
        for candidate in &column.candidates {
            out.push_str(&card(candidate));
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

pub fn card(candidate: &Candidate) -> String {
    let mut line = format!(
        "  - {} | {} | {} yrs [{}]",
        candidate.name,
        candidate.role,
        years(candidate.experience),
        candidate.id
    );
    if let Some(link) = &candidate.resume_link {
        line.push_str(&format!("\n    resume: {link}"));
    }
    line
}

pub fn analytics(analytics: &Analytics) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<18}{}\n", "Total candidates", analytics.total_candidates));
    out.push_str(&format!("{:<18}{}\n", "In interview", analytics.in_progress()));
    out.push_str(&format!("{:<18}{}\n", "Offers", analytics.offers()));
    out.push_str(&format!("{:<18}{}%\n", "Conversion rate", analytics.conversion_rate()));
    out.push_str(&format!(
        "{:<18}{:.1} yrs\n",
        "Avg experience", analytics.average_experience
    ));

    out.push_str("\nStatus\n");
    for entry in &analytics.status_breakdown {
        out.push_str(&format!(
            "  {:<10} {} {:>3}% ({})\n",
            entry.status.title(),
            bar(entry.percentage as usize, 100),
            entry.percentage,
            entry.count
        ));
    }

    out.push_str("\nTop roles\n");
    let roles = analytics.top_roles(TOP_ROLE_LIMIT);
    if roles.is_empty() {
        out.push_str("  No candidates yet\n");
    }
    let widest = roles.iter().map(|r| r.role.chars().count()).max().unwrap_or(0);
    let peak = roles.first().map_or(0, |r| r.count);
    for entry in roles {
        out.push_str(&format!(
            "  {:<width$} {} {}\n",
            entry.role,
            bar(entry.count, peak),
            entry.count,
            width = widest
        ));
    }
    out
}

pub fn field_errors(err: &ValidationError) -> String {
    err.errors
        .iter()
        .map(|error| format!("  {}: {}\n", error.field.as_str(), error.message))
        .collect()
}

pub fn connection_error(message: &str) -> String {
    format!("Connection error: {message}\nCheck BOARD_STORE_URL and BOARD_ACCESS_KEY, then retry.")
}

/// Whole years print without a fraction.
pub fn years(experience: f64) -> String {
    if experience.fract() == 0.0 {
        format!("{experience:.0}")
    } else {
        format!("{experience}")
    }
}

fn bar(value: usize, max: usize) -> String {
    let filled = if max == 0 {
        0
    } else {
        (value * BAR_WIDTH + max / 2) / max
    };
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
