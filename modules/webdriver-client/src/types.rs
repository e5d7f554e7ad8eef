use fantoccini::cookies::Cookie;
use serde::{Deserialize, Serialize};

/// Persisted form of one browser cookie. This is the unit of the session
/// blob written to disk; the schema is an implementation detail of session
/// storage, not a stable format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

impl StoredCookie {
    pub fn from_cookie(cookie: &Cookie<'_>) -> Self {
        Self {
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
            domain: cookie.domain().map(str::to_string),
            path: cookie.path().map(str::to_string),
            secure: cookie.secure().unwrap_or(false),
            http_only: cookie.http_only().unwrap_or(false),
        }
    }

    pub fn to_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::new(self.name.clone(), self.value.clone());
        if let Some(domain) = &self.domain {
            cookie.set_domain(domain.clone());
        }
        if let Some(path) = &self.path {
            cookie.set_path(path.clone());
        }
        cookie.set_secure(self.secure);
        cookie.set_http_only(self.http_only);
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_cookie_round_trips_through_json() {
        let stored = StoredCookie {
            name: "sessionid".to_string(),
            value: "abc123".to_string(),
            domain: Some(".instagram.com".to_string()),
            path: Some("/".to_string()),
            secure: true,
            http_only: true,
        };
        let json = serde_json::to_string(&stored).unwrap();
        let back: StoredCookie = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stored);
    }

    #[test]
    fn conversion_preserves_attributes() {
        let stored = StoredCookie {
            name: "csrftoken".to_string(),
            value: "tok".to_string(),
            domain: Some(".instagram.com".to_string()),
            path: Some("/".to_string()),
            secure: true,
            http_only: false,
        };
        let cookie = stored.to_cookie();
        assert_eq!(StoredCookie::from_cookie(&cookie), stored);
    }

    #[test]
    fn missing_optional_fields_default() {
        let back: StoredCookie = serde_json::from_str(r#"{"name":"a","value":"b"}"#).unwrap();
        assert_eq!(back.domain, None);
        assert!(!back.secure);
        assert!(!back.http_only);
    }
}
