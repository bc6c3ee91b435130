//! Public link display formatting

use chrono::{DateTime, Utc};
use tabled::Tabled;

use super::{or_dash, table};
use crate::models::EstimatePublicLink;
use crate::services::IssuedLink;

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Code")]
    short_code: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Views")]
    views: u32,
    #[tabled(rename = "Last viewed")]
    last_viewed: String,
}

fn link_state(link: &EstimatePublicLink, now: DateTime<Utc>) -> &'static str {
    if link.is_revoked() {
        "revoked"
    } else if link.is_expired_at(now) {
        "expired"
    } else {
        "active"
    }
}

pub fn format_link_list(links: &[EstimatePublicLink], now: DateTime<Utc>) -> String {
    let rows = links
        .iter()
        .map(|l| LinkRow {
            id: l.id.to_string(),
            short_code: l.short_code.clone(),
            state: link_state(l, now).to_string(),
            expires: l.expires_at.format("%Y-%m-%d %H:%M").to_string(),
            views: l.access_count,
            last_viewed: or_dash(l.last_accessed_at.map(|t| t.format("%Y-%m-%d %H:%M"))),
        })
        .collect();
    table(rows, "No links issued.")
}

/// Shown once, right after issuing; the token cannot be displayed again
pub fn format_issued_link(issued: &IssuedLink) -> String {
    let mut output = String::new();
    output.push_str(&format!("Link {} issued\n", issued.link.id));
    output.push_str(&format!("  Token:       {}\n", issued.token));
    output.push_str(&format!("  Short code:  {}\n", issued.link.short_code));
    output.push_str(&format!(
        "  Expires:     {}\n",
        issued.link.expires_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output.push_str("\nThe token is not stored and cannot be shown again.\n");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EstimateId;
    use chrono::Duration;

    #[test]
    fn test_link_states() {
        let now = Utc::now();
        let active = EstimatePublicLink::new(
            EstimateId::new(),
            "aa".into(),
            "ABCD1234".into(),
            now + Duration::hours(1),
        );
        let expired = EstimatePublicLink::new(
            EstimateId::new(),
            "bb".into(),
            "EFGH5678".into(),
            now - Duration::hours(1),
        );
        let mut revoked = active.clone();
        revoked.revoke();

        assert_eq!(link_state(&active, now), "active");
        assert_eq!(link_state(&expired, now), "expired");
        assert_eq!(link_state(&revoked, now), "revoked");

        let list = format_link_list(&[active.clone(), expired], now);
        assert!(list.contains("ABCD1234"));
        assert!(list.contains("expired"));

        let issued = IssuedLink {
            link: active,
            token: "secret-token".into(),
        };
        assert!(format_issued_link(&issued).contains("secret-token"));
    }
}
