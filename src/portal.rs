use reqwest::Url;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue,
    InvalidHeaderValue, REFERER, REFERRER_POLICY, UPGRADE_INSECURE_REQUESTS,
};

/// Headers of a Chromium 97 navigation on Linux, sent with every request.
const STATIC_HEADERS: &[(&str, &str)] = &[
    ("sec-ch-ua", "\"Chromium\";v=\"97\", \" Not;A Brand\";v=\"99\""),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Linux\""),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "same-origin"),
    ("sec-fetch-user", "?1"),
];

/// Endpoint table of the canteen portal, rooted at a base URL.
///
/// The base URL is parsed once, so every endpoint is in the same normalized
/// form reqwest reports for responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portal {
    base_url: Url,
    login_page: Url,
    login_submit: Url,
    logout: Url,
    report_form: Url,
}

impl Portal {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        let root = base_url.trim_end_matches('/');
        let endpoint = |path: &str| Url::parse(&format!("{root}{path}"));

        Ok(Self {
            base_url: Url::parse(root)?,
            login_page: endpoint("/login/")?,
            login_submit: endpoint("/login/?next=/login")?,
            logout: endpoint("/logout/")?,
            report_form: endpoint("/canteen/UserMinistatement/")?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Page that carries the login form and its CSRF token.
    pub fn login_page(&self) -> &Url {
        &self.login_page
    }

    pub fn login_submit(&self) -> &Url {
        &self.login_submit
    }

    pub fn logout(&self) -> &Url {
        &self.logout
    }

    /// Ministatement form; fetched for its token and posted to for the report.
    pub fn report_form(&self) -> &Url {
        &self.report_form
    }

    pub fn default_headers(&self) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers.insert(
            REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        );
        for (name, value) in STATIC_HEADERS {
            headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
        }

        let referer = HeaderValue::from_str(self.login_page.as_str())?;
        headers.insert(HeaderName::from_static("referrer"), referer.clone());
        headers.insert(REFERER, referer);

        Ok(headers)
    }
}

impl Default for Portal {
    fn default() -> Self {
        Self::new(crate::BASE_URL).expect("Invalid portal base URL")
    }
}
