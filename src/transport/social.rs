use serde_json::{Value, json};

use crate::domain::{CountryCode, PhoneNumber, SocialLink, SocialNetwork};

const SAVE_AUTH_TOKEN_PATH: &str = "/main/social/save-auth-token/";
const UPDATE_URL_PATH: &str = "/main/social/update-url/";

/// Endpoint path and body used to connect a social network.
pub fn encode_social_link(link: &SocialLink) -> (&'static str, Value) {
    match link {
        SocialLink::AuthCode { network, code } => (
            SAVE_AUTH_TOKEN_PATH,
            json!({"social_name": network.as_str(), "code_first": code}),
        ),
        SocialLink::ProfileUrl { network, url } => (
            UPDATE_URL_PATH,
            json!({"social_name": network.as_str(), "profile_id": url.as_str()}),
        ),
    }
}

pub fn encode_social_name(network: SocialNetwork) -> Value {
    json!({"social_name": network.as_str()})
}

pub fn encode_report_spam(
    country_code: &CountryCode,
    name: &str,
    phone_number: PhoneNumber,
) -> Value {
    json!({
        (CountryCode::FIELD): country_code.as_str(),
        "is_spam": true,
        "is_from_v": false,
        "name": name,
        (PhoneNumber::FIELD): phone_number.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_code_links_use_save_auth_token() {
        let link = SocialLink::auth_code(SocialNetwork::Spotify, "abc").unwrap();
        let (path, body) = encode_social_link(&link);
        assert_eq!(path, "/main/social/save-auth-token/");
        assert_eq!(body, json!({"social_name": "spotify", "code_first": "abc"}));
    }

    #[test]
    fn profile_url_links_use_update_url() {
        let link = SocialLink::profile_url(
            SocialNetwork::Linkedin,
            "https://www.linkedin.com/in/someone",
        )
        .unwrap();
        let (path, body) = encode_social_link(&link);
        assert_eq!(path, "/main/social/update-url/");
        assert_eq!(
            body,
            json!({
                "social_name": "linkedin",
                "profile_id": "https://www.linkedin.com/in/someone",
            })
        );
    }

    #[test]
    fn report_spam_body() {
        let body = encode_report_spam(
            &CountryCode::new("il").unwrap(),
            "Spammer",
            PhoneNumber::normalize("972551234567").unwrap(),
        );
        assert_eq!(
            body,
            json!({
                "country_code": "IL",
                "is_spam": true,
                "is_from_v": false,
                "name": "Spammer",
                "phone_number": "972551234567",
            })
        );
        assert_eq!(
            encode_social_name(SocialNetwork::Twitter),
            json!({"social_name": "twitter"})
        );
    }
}
