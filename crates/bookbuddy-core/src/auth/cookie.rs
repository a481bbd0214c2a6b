//! Cookie wire format for the token pair.
//!
//! On the web the tokens live in path-scoped `SameSite=Lax` cookies,
//! marked `Secure` for production builds served over TLS.

use url::form_urlencoded;

/// Attributes applied to every token cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    pub path: String,
    pub same_site: &'static str,
    pub secure: bool,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            same_site: "Lax",
            secure: false,
        }
    }
}

impl CookiePolicy {
    /// Secure-only when this is a production build served from an https origin
    pub fn for_origin(production: bool, app_url: &str) -> Self {
        Self {
            secure: production && app_url.starts_with("https://"),
            ..Self::default()
        }
    }
}

fn encode(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// `Set-Cookie` value storing `value` for `max_age_secs`
pub fn set_cookie(name: &str, value: &str, max_age_secs: i64, policy: &CookiePolicy) -> String {
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}; SameSite={}",
        encode(name),
        encode(value),
        policy.path,
        max_age_secs,
        policy.same_site
    );
    if policy.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that deletes the named cookie
pub fn delete_cookie(name: &str, policy: &CookiePolicy) -> String {
    format!("{}=; Path={}; Max-Age=0", encode(name), policy.path)
}

/// Look up a cookie in a `Cookie` header. Empty values count as absent.
pub fn read_cookie(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .filter(|pair| pair.contains('='))
        .find_map(|pair| {
            // form_urlencoded splits at the first '=' and decodes both halves
            let (key, value) = form_urlencoded::parse(pair.as_bytes()).next()?;
            (key == name && !value.is_empty()).then(|| value.into_owned())
        })
}
