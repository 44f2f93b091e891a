//! Outbound request description.
//!
//! A [`RequestSpec`] is built once by an API binding, passed through the
//! transport's pre-dispatch stages and consumed by the transport.

use serde::Serialize;
use serde_json::Value;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload.
#[derive(Clone, PartialEq, Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// JSON document, sent as `application/json`.
    Json(Value),
    /// URL-encoded form, sent as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

// Form bodies carry passwords; only their field names are printed.
impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty"),
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::Form(fields) => {
                let names: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
                f.debug_tuple("Form").field(&names).finish()
            }
        }
    }
}

/// A single outbound API call.
///
/// Paths are relative to the configured base URL and start with `/`.
/// Builder methods consume and return the spec, so a spec is never mutated
/// after it has been handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Body,
    headers: Vec<(String, String)>,
    notify_expiry: bool,
    anonymous: bool,
}

impl RequestSpec {
    /// Create a request with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
            headers: Vec::new(),
            notify_expiry: true,
            anonymous: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a query parameter when `value` is present.
    pub fn query_opt<T: ToString>(self, key: impl Into<String>, value: Option<T>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Attach a JSON body.
    pub fn json(mut self, value: Value) -> Self {
        self.body = Body::Json(value);
        self
    }

    /// Attach a serializable value as a JSON body.
    pub fn json_from<T: Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        Ok(self.json(serde_json::to_value(value)?))
    }

    /// Attach a URL-encoded form body.
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = Body::Form(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Set a header, replacing any earlier value with the same name.
    ///
    /// Names compare case-insensitively.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Do not announce a session expiry detected on this call.
    ///
    /// The credential is still cleared and the caller still receives
    /// `SessionExpired`; only the redirect intent is withheld. Used by calls
    /// whose caller performs its own redirect, such as session verification.
    pub fn without_expiry_notice(mut self) -> Self {
        self.notify_expiry = false;
        self
    }

    /// Send without the session credential, even when one is stored.
    ///
    /// Used by login: a stale credential would otherwise make a rejected
    /// password look like an expired session.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Value of a header set on this request, by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn notify_expiry(&self) -> bool {
        self.notify_expiry
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}
