use super::*;

pub mod review;

/// Shown in place of another student's code while the viewer holds an active
/// personal extension.
pub const RESTRICTED_TEXT: &str = "Access restricted: You have an active deadline extension. \
     You can only view your own code until all deadlines have passed.";

pub fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y %-I:%M %p UTC").to_string()
}

/// Value for a `datetime-local` input.
pub fn datetime_input(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M").to_string()
}

/// 1-based, inclusive line span for display.
pub fn line_span(anchor: &Anchor) -> String {
    if anchor.is_single_line() {
        format!("Line {}", anchor.start_line + 1)
    } else {
        format!("Lines {}–{}", anchor.start_line + 1, anchor.end_line + 1)
    }
}

pub fn notice(message: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = message {
            p.notice { (message) }
        }
    }
}
