use crate::cookies::{CookieCacheError, SessionCookies};
use crate::parser::{ParseError, extract_csrf_token, extract_table};
use crate::portal::Portal;
use crate::report::ReportQuery;

use reqwest::{Client, Url};
use reqwest::header::InvalidHeaderValue;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, io};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Invalid login credentials for {0}")]
    InvalidCredentials(String),
    #[error("Cookie cache {}: {}", .path.display(), .source)]
    CookieCache {
        path: PathBuf,
        source: CookieCacheError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
}

/// Source of the login password when no cookie cache exists.
pub trait PasswordPrompt {
    fn read_password(&self, user_id: &str) -> io::Result<String>;
}

/// Reads the password from the controlling terminal without echo.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn read_password(&self, user_id: &str) -> io::Result<String> {
        rpassword::prompt_password(format!("Password for {user_id}: "))
    }
}

/// A portal user and the HTTP session acting on their behalf.
///
/// Cookies are cached in `<data_dir>/<user_id>_cookies.json`. A cache file
/// that exists is trusted as-is: [`MessUser::login`] never checks whether
/// the server still accepts it.
#[derive(Debug)]
pub struct MessUser {
    user_id: String,
    portal: Portal,
    client: Client,
    cookies: Arc<SessionCookies>,
    data_dir: PathBuf,
    cookie_file: PathBuf,
    authenticated: bool,
}

impl MessUser {
    pub fn new(user_id: impl Into<String>) -> Result<Self, SessionError> {
        Self::with_portal(user_id, Portal::default(), ".")
    }

    pub fn with_portal(
        user_id: impl Into<String>,
        portal: Portal,
        data_dir: impl Into<PathBuf>,
    ) -> Result<Self, SessionError> {
        let user_id = user_id.into();
        let data_dir = data_dir.into();
        let cookies = Arc::new(SessionCookies::new());

        let client = Client::builder()
            .default_headers(portal.default_headers()?)
            .cookie_provider(Arc::clone(&cookies))
            .build()?;

        let cookie_file = data_dir.join(format!("{user_id}_cookies.json"));

        Ok(Self {
            user_id,
            portal,
            client,
            cookies,
            data_dir,
            cookie_file,
            authenticated: false,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn cookie_file(&self) -> &Path {
        &self.cookie_file
    }

    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Restores the cached cookies, or asks for a password and logs in.
    pub async fn login(
        &mut self,
        prompt: &impl PasswordPrompt,
    ) -> Result<&mut Self, SessionError> {
        if self.cookie_file.is_file() {
            self.cookies
                .load(&self.cookie_file)
                .map_err(|source| SessionError::CookieCache {
                    path: self.cookie_file.clone(),
                    source,
                })?;
            log::info!(
                target: self.user_id.as_str(),
                "Using existing login cookie {}",
                self.cookie_file.display()
            );
        } else {
            let password = prompt.read_password(&self.user_id)?;
            self.authenticate(&password).await?;
        }

        self.authenticated = true;
        Ok(self)
    }

    async fn authenticate(&self, password: &str) -> Result<(), SessionError> {
        let login_page = self.portal.login_page();
        let token = self.fetch_csrf_token(login_page).await?;

        let form = [
            ("csrfmiddlewaretoken", token.as_str()),
            ("userid", self.user_id.as_str()),
            ("password", password),
        ];
        let response = self
            .client
            .post(self.portal.login_submit().clone())
            .form(&form)
            .send()
            .await?
            .error_for_status()?;

        // a rejected login is bounced back to the form
        if response.url() == login_page {
            return Err(SessionError::InvalidCredentials(self.user_id.clone()));
        }
        log::info!(target: self.user_id.as_str(), "Login successful");

        self.cookies
            .save(&self.cookie_file)
            .map_err(|source| SessionError::CookieCache {
                path: self.cookie_file.clone(),
                source,
            })?;
        log::info!(
            target: self.user_id.as_str(),
            "Saved login cookies to {}",
            self.cookie_file.display()
        );

        Ok(())
    }

    /// Ends the portal session, closes the client and forgets the cached cookies.
    pub async fn logout(self) -> Result<(), SessionError> {
        self.client
            .get(self.portal.logout().clone())
            .send()
            .await?
            .error_for_status()?;

        let MessUser {
            user_id,
            client,
            cookie_file,
            ..
        } = self;
        drop(client);

        match fs::remove_file(&cookie_file) {
            Ok(()) => log::debug!(
                target: user_id.as_str(),
                "Removed cookie file {}",
                cookie_file.display()
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        log::info!(target: user_id.as_str(), "Logged out");

        Ok(())
    }

    /// Saves the first table of the ministatement for `query` as raw HTML.
    ///
    /// Returns `Ok(None)` without touching the file system when the portal
    /// answers with a page that has no table.
    pub async fn user_report(
        &self,
        query: &ReportQuery,
    ) -> Result<Option<PathBuf>, SessionError> {
        let form_url = self.portal.report_form();
        let token = self.fetch_csrf_token(form_url).await?;

        log::info!(
            target: self.user_id.as_str(),
            "Fetching user report for {} ({} to {})",
            query.roll_num,
            query.start,
            query.end
        );
        let html = self
            .client
            .post(form_url.clone())
            .form(&query.form_fields(&token))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        log::info!(target: self.user_id.as_str(), "Fetched data");

        let Some(table) = extract_table(&html) else {
            log::error!(target: self.user_id.as_str(), "Page didn't return table");
            return Ok(None);
        };

        let path = self.data_dir.join(query.output_file_name());
        fs::write(&path, table)?;
        log::info!(
            target: self.user_id.as_str(),
            "User report saved in '{}'",
            path.display()
        );

        Ok(Some(path))
    }

    async fn fetch_csrf_token(&self, url: &Url) -> Result<String, SessionError> {
        let html = self
            .client
            .get(url.clone())
            .send()
            .await
            .inspect_err(|e| {
                log::error!(target: self.user_id.as_str(), "HTTP error: {e:?}");
            })?
            .error_for_status()?
            .text()
            .await?;
        Ok(extract_csrf_token(&html, url.as_str())?)
    }
}
