//! Scheduled-report metrics and rendering.
//!
//! A report body is rendered twice from the same [`ReportMetrics`]: a rich
//! HTML document for email and a compact plain-text message for chat
//! delivery. Only the sections enabled in [`ContentFlags`] are included.

use serde::{Deserialize, Serialize};

/// Aggregate business counts for one merchant over a trailing window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMetrics {
    pub conversations: i64,
    pub messages: i64,
    pub orders: i64,
    pub revenue: f64,
    pub new_customers: i64,
}

/// Which sections a report includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFlags {
    pub conversations: bool,
    pub orders: bool,
    pub revenue: bool,
    pub customers: bool,
}

impl Default for ContentFlags {
    fn default() -> Self {
        Self {
            conversations: true,
            orders: true,
            revenue: true,
            customers: true,
        }
    }
}

impl ContentFlags {
    pub fn is_empty(&self) -> bool {
        !(self.conversations || self.orders || self.revenue || self.customers)
    }
}

/// Rendered report ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedReport {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Human label for a trailing window length.
pub fn period_label(days: u32) -> String {
    match days {
        1 => "the last 24 hours".to_string(),
        7 => "the last 7 days".to_string(),
        n => format!("the last {n} days"),
    }
}

/// Labelled rows for the enabled sections, in display order.
fn rows(metrics: &ReportMetrics, flags: &ContentFlags) -> Vec<(&'static str, String)> {
    let mut rows = Vec::new();
    if flags.conversations {
        rows.push(("Conversations", metrics.conversations.to_string()));
        rows.push(("Messages", metrics.messages.to_string()));
    }
    if flags.orders {
        rows.push(("Orders", metrics.orders.to_string()));
    }
    if flags.revenue {
        rows.push(("Revenue", format!("{:.2}", metrics.revenue)));
    }
    if flags.customers {
        rows.push(("New customers", metrics.new_customers.to_string()));
    }
    rows
}

/// Render a report in both delivery formats.
pub fn render(
    report_name: &str,
    trailing_days: u32,
    metrics: &ReportMetrics,
    flags: &ContentFlags,
) -> RenderedReport {
    let period = period_label(trailing_days);
    let rows = rows(metrics, flags);

    let subject = format!("{report_name}: activity for {period}");

    let mut text = format!("{report_name}\nActivity for {period}\n");
    if rows.is_empty() {
        text.push_str("No sections are enabled for this report.\n");
    }
    for (label, value) in &rows {
        text.push_str(&format!("- {label}: {value}\n"));
    }

    let name = html_escape::encode_text(report_name);
    let mut html = format!(
        "<!DOCTYPE html><html><body style=\"font-family:sans-serif\">\
         <h2>{name}</h2><p>Activity for {period}</p>"
    );
    if rows.is_empty() {
        html.push_str("<p>No sections are enabled for this report.</p>");
    } else {
        html.push_str("<table cellpadding=\"6\" style=\"border-collapse:collapse\">");
        for (label, value) in &rows {
            html.push_str(&format!(
                "<tr><td style=\"border-bottom:1px solid #eee\">{label}</td>\
                 <td style=\"border-bottom:1px solid #eee;text-align:right\"><strong>{value}</strong></td></tr>"
            ));
        }
        html.push_str("</table>");
    }
    html.push_str("</body></html>");

    RenderedReport {
        subject,
        html,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> ReportMetrics {
        ReportMetrics {
            conversations: 12,
            messages: 340,
            orders: 7,
            revenue: 1520.5,
            new_customers: 3,
        }
    }

    #[test]
    fn text_lists_enabled_sections() {
        let report = render("Daily summary", 1, &metrics(), &ContentFlags::default());
        assert!(report.text.contains("- Conversations: 12"));
        assert!(report.text.contains("- Messages: 340"));
        assert!(report.text.contains("- Orders: 7"));
        assert!(report.text.contains("- Revenue: 1520.50"));
        assert!(report.text.contains("- New customers: 3"));
        assert_eq!(report.subject, "Daily summary: activity for the last 24 hours");
    }

    #[test]
    fn disabled_sections_are_omitted() {
        let flags = ContentFlags {
            conversations: false,
            orders: true,
            revenue: false,
            customers: false,
        };
        let report = render("Orders", 7, &metrics(), &flags);
        assert!(report.text.contains("Orders: 7"));
        assert!(!report.text.contains("Revenue"));
        assert!(!report.html.contains("Conversations"));
    }

    #[test]
    fn html_escapes_report_name() {
        let report = render("<script>", 30, &metrics(), &ContentFlags::default());
        assert!(report.html.contains("&lt;script&gt;"));
        assert!(!report.html.contains("<script>"));
    }

    #[test]
    fn empty_flags_still_render_a_body() {
        let flags = ContentFlags {
            conversations: false,
            orders: false,
            revenue: false,
            customers: false,
        };
        assert!(flags.is_empty());
        let report = render("Nothing", 7, &metrics(), &flags);
        assert!(report.text.contains("No sections are enabled"));
    }
}
