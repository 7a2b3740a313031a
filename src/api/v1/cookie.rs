use std::time::Duration;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
pub const LOGGED_IN_COOKIE: &str = "logged_in";

const EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Attributes shared by every session cookie. Always `SameSite=Strict`.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub access_max_age: Duration,
    pub refresh_max_age: Duration,
}

impl CookiePolicy {
    fn build(&self, name: &str, value: &str, max_age: Option<Duration>, http_only: bool) -> String {
        let mut cookie = format!("{}={}; Path={}", name, value, self.path);
        if !self.domain.is_empty() {
            cookie.push_str(&format!("; Domain={}", self.domain));
        }
        match max_age {
            Some(age) => cookie.push_str(&format!("; Max-Age={}", age.as_secs())),
            None => cookie.push_str(&format!("; Max-Age=0; Expires={}", EPOCH)),
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        if http_only {
            cookie.push_str("; HttpOnly");
        }
        cookie.push_str("; SameSite=Strict");
        cookie
    }

    pub fn access(&self, token: &str) -> String {
        self.build(ACCESS_COOKIE, token, Some(self.access_max_age), self.http_only)
    }

    pub fn refresh(&self, token: &str) -> String {
        self.build(REFRESH_COOKIE, token, Some(self.refresh_max_age), self.http_only)
    }

    /// Script-readable hint that a session exists; carries no credential.
    pub fn logged_in(&self) -> String {
        self.build(LOGGED_IN_COOKIE, "true", Some(self.access_max_age), false)
    }

    /// Already-expired replacements for all session cookies.
    pub fn cleared(&self) -> Vec<String> {
        vec![
            self.build(ACCESS_COOKIE, "", None, self.http_only),
            self.build(REFRESH_COOKIE, "", None, self.http_only),
            self.build(LOGGED_IN_COOKIE, "", None, false),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CookiePolicy {
        CookiePolicy {
            domain: "localhost".into(),
            path: "/".into(),
            secure: true,
            http_only: true,
            access_max_age: Duration::from_secs(900),
            refresh_max_age: Duration::from_secs(3600),
        }
    }

    #[test]
    fn access_cookie_carries_all_attributes() {
        assert_eq!(
            policy().access("abc.def.ghi"),
            "access_token=abc.def.ghi; Path=/; Domain=localhost; Max-Age=900; Secure; HttpOnly; SameSite=Strict"
        );
    }

    #[test]
    fn logged_in_cookie_is_script_readable() {
        let cookie = policy().logged_in();
        assert!(cookie.starts_with("logged_in=true;"));
        assert!(!cookie.contains("HttpOnly"));
    }

    #[test]
    fn cleared_cookies_expire_immediately() {
        let cleared = policy().cleared();
        assert_eq!(cleared.len(), 3);
        for cookie in cleared {
            assert!(cookie.contains("Max-Age=0"));
            assert!(cookie.contains(EPOCH));
        }
    }

    #[test]
    fn empty_domain_is_omitted() {
        let mut policy = policy();
        policy.domain.clear();
        assert!(!policy.refresh("t").contains("Domain="));
    }
}
