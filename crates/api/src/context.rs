use axum::http::{HeaderMap, header::AUTHORIZATION};

/// What a protected request brings to the guard, before anything is verified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Raw `Authorization` header value, scheme label included.
    credential: Option<String>,
    /// Raw `appid` path parameter of targeted routes.
    target_app_id: Option<String>,
}

impl RequestContext {
    pub fn new(credential: Option<String>, target_app_id: Option<String>) -> Self {
        Self {
            credential,
            target_app_id,
        }
    }

    /// A header that is not valid visible ASCII counts as absent.
    pub fn from_headers(headers: &HeaderMap, target_app_id: Option<String>) -> Self {
        let credential = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Self::new(credential, target_app_id)
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn target_app_id(&self) -> Option<&str> {
        self.target_app_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn reads_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));

        let ctx = RequestContext::from_headers(&headers, Some("u1".into()));
        assert_eq!(ctx.credential(), Some("Bearer abc"));
        assert_eq!(ctx.target_app_id(), Some("u1"));

        let ctx = RequestContext::from_headers(&HeaderMap::new(), None);
        assert_eq!(ctx.credential(), None);
        assert_eq!(ctx.target_app_id(), None);
    }
}
