//! Bot deep-link handling: `t.me/<bot>?start=<payload>` extraction and the
//! referral grammar of `/start` payloads.

use regex::Regex;

use crate::core::errors::AppError;

/// Prefix marking a referral payload.
pub const REF_PREFIX: &str = "ref_";

/// Splits a `/start` payload into (referral tag, public file id).
///
/// `ref_<tag>` alone carries only a referral; `ref_<tag>-<id>` carries both,
/// split at the first `-`; any other non-empty payload is a plain file id.
pub fn split_start_payload(payload: &str) -> (Option<&str>, Option<&str>) {
    if payload.is_empty() {
        return (None, None);
    }
    match payload.strip_prefix(REF_PREFIX) {
        None => (None, Some(payload)),
        Some(rest) => match rest.split_once('-') {
            Some((tag, id)) => (Some(tag), Some(id)),
            None => (Some(rest), None),
        },
    }
}

/// Extracts public file ids from deep links pointing at `bot_username`.
///
/// Bare referral payloads are dropped; referral-with-file-id payloads keep
/// only the file id. Input order is preserved.
pub fn extract_deep_link_public_ids(bot_username: &str, urls: &[String]) -> Result<Vec<String>, AppError> {
    let pattern = format!(r"{}\?start=([A-Za-z_0-9-]+)", regex::escape(bot_username));
    let re = Regex::new(&pattern).map_err(|e| AppError::InvalidInput(format!("deep link pattern: {e}")))?;

    let mut ids = Vec::new();
    for url in urls {
        let Some(m) = re.captures(url).and_then(|c| c.get(1)) else {
            continue;
        };
        let (_, public_id) = split_start_payload(m.as_str());
        if let Some(id) = public_id {
            ids.push(id.to_owned());
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_ids_and_handles_referrals() {
        let urls = vec![
            "https://t.me/cleepy_bot?start=ref_teleblog".to_owned(),
            "https://t.me/cleepy_bot?start=dVQK8".to_owned(),
            "https://t.me/cleepy_bot?start=buJ9U30UdIMl1On6c0eUrxQ3UPKkinE1xcSGQPLT2BEcsDlVN9".to_owned(),
            "https://t.me/cleepy_bot?start=ref_crosser-HndVA".to_owned(),
        ];
        let ids = extract_deep_link_public_ids("cleepy_bot", &urls).ok();
        assert_eq!(
            ids,
            Some(vec![
                "dVQK8".to_owned(),
                "buJ9U30UdIMl1On6c0eUrxQ3UPKkinE1xcSGQPLT2BEcsDlVN9".to_owned(),
                "HndVA".to_owned(),
            ])
        );
    }

    #[test]
    fn ignores_links_to_other_bots() {
        let urls = vec!["https://t.me/other_bot?start=dVQK8".to_owned()];
        assert_eq!(extract_deep_link_public_ids("cleepy_bot", &urls).ok(), Some(vec![]));
    }

    #[test]
    fn splits_start_payloads() {
        assert_eq!(split_start_payload(""), (None, None));
        assert_eq!(split_start_payload("dVQK8"), (None, Some("dVQK8")));
        assert_eq!(split_start_payload("ref_teleblog"), (Some("teleblog"), None));
        assert_eq!(split_start_payload("ref_tgstat_1-LlOiU"), (Some("tgstat_1"), Some("LlOiU")));
    }
}
