//! Notification message templating
//!
//! `{field_path}` placeholders are replaced with the snapshot's value for that
//! path. Undefined and null fields render as empty text. A `{` without a
//! closing `}` is copied through unchanged.

use super::field_lookup::{resolve, Resolved};
use redzone_repository::CustomerSnapshot;

/// Render `template` against `snapshot`
pub fn render_message(template: &str, snapshot: &CustomerSnapshot) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let path = &after[..end];
                if let Resolved::Value(value) = resolve(snapshot, path) {
                    out.push_str(&value.to_comparable_string());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Alert reason for a rule: the rendered notification message, or a default
/// naming the rule when the message is absent or renders empty
pub fn alert_reason(rule_name: &str, notification_message: Option<&str>, snapshot: &CustomerSnapshot) -> String {
    notification_message
        .map(|template| render_message(template, snapshot))
        .map(|rendered| rendered.trim().to_string())
        .filter(|rendered| !rendered.is_empty())
        .unwrap_or_else(|| format!("Red zone rule \"{}\" triggered", rule_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> CustomerSnapshot {
        CustomerSnapshot::from_json(
            42,
            json!({ "name": "Acme", "nps_score": 4, "campaign_stats": { "sent": 3 } }),
        )
    }

    #[test]
    fn test_render_placeholders() {
        let rendered = render_message("{name} NPS dropped to {nps_score}", &snapshot());
        assert_eq!(rendered, "Acme NPS dropped to 4");

        let rendered = render_message("sent {campaign_stats.sent} emails", &snapshot());
        assert_eq!(rendered, "sent 3 emails");
    }

    #[test]
    fn test_render_missing_and_unclosed() {
        assert_eq!(render_message("owner: {csm_name}.", &snapshot()), "owner: .");
        assert_eq!(render_message("broken {name", &snapshot()), "broken {name");
        assert_eq!(render_message("no placeholders", &snapshot()), "no placeholders");
    }

    #[test]
    fn test_alert_reason() {
        assert_eq!(
            alert_reason("Low NPS", None, &snapshot()),
            "Red zone rule \"Low NPS\" triggered"
        );
        assert_eq!(
            alert_reason("Low NPS", Some("{name} is unhappy"), &snapshot()),
            "Acme is unhappy"
        );
        assert_eq!(
            alert_reason("Low NPS", Some("  {missing} "), &snapshot()),
            "Red zone rule \"Low NPS\" triggered"
        );
    }
}
