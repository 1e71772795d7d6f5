//! Credential redaction for command lines and captured output.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Replacement for any credential segment.
pub const TOKEN_MASK: &str = "<TOKEN>";

/// `scheme://user:secret@` userinfo in any URL.
const CREDENTIAL_PATTERN: &str = r"(?P<prefix>[A-Za-z][A-Za-z0-9+.\-]*://[^:@/\s]+):[^@/\s]+@";

static CREDENTIAL_SEGMENT: OnceLock<Option<Regex>> = OnceLock::new();

fn credential_segment() -> Option<&'static Regex> {
    CREDENTIAL_SEGMENT
        .get_or_init(|| Regex::new(CREDENTIAL_PATTERN).ok())
        .as_ref()
}

/// Masks credentials before text reaches a log record or an error value.
///
/// URL userinfo passwords are always masked. Registered secrets are also
/// masked wherever they occur verbatim, which covers tools that echo the
/// token outside of a URL.
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    secrets: Vec<String>,
}

impl Redactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also mask every verbatim occurrence of `secret`. Empty secrets are ignored.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() {
            self.secrets.push(secret);
        }
        self
    }

    pub fn redact(&self, text: &str) -> String {
        let mut out = match credential_segment() {
            Some(re) => re.replace_all(text, format!("${{prefix}}:{}@", TOKEN_MASK)).into_owned(),
            None => text.to_string(),
        };
        for secret in &self.secrets {
            if out.contains(secret.as_str()) {
                out = out.replace(secret.as_str(), TOKEN_MASK);
            }
        }
        out
    }
}

/// A remote URL carrying inline credentials.
///
/// `Display` and `Debug` print the masked form; only [`RemoteUrl::expose`]
/// yields the usable URL.
#[derive(Clone)]
pub struct RemoteUrl {
    url: String,
    secret: String,
}

impl RemoteUrl {
    /// `https://{user}:{secret}@{rest}`
    pub fn with_credentials(user: &str, secret: &str, rest: &str) -> Self {
        let url = if secret.is_empty() {
            format!("https://{}@{}", user, rest)
        } else {
            format!("https://{}:{}@{}", user, secret, rest)
        };
        Self {
            url,
            secret: secret.to_string(),
        }
    }

    /// Wrap an already formed URL. Userinfo passwords are still masked.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            secret: String::new(),
        }
    }

    pub fn expose(&self) -> &str {
        &self.url
    }

    /// A redactor that masks this URL's credentials.
    pub fn redactor(&self) -> Redactor {
        Redactor::new().with_secret(self.secret.clone())
    }
}

impl fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redactor().redact(&self.url))
    }
}

impl fmt::Debug for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RemoteUrl").field(&self.to_string()).finish()
    }
}
