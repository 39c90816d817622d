//! Browser-mediated passkey ceremony.
//!
//! Opens the provider's hosted page, waits for the provider to report
//! completion, then closes the page. The wait is bounded by a timeout and
//! can be cancelled through a shared [`Notify`].

use crate::browser::BrowserLauncher;
use crate::error::{SessionError, SessionResult};
use crate::provider::{WalletProvider, WebAuthKind, WebAuthRequest, WebCompletion};
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use url::Url;

/// Parse a provider URL, accepting only pages a browser can open.
pub fn parse_ceremony_url(raw: &str) -> SessionResult<Url> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(SessionError::UnsupportedUrlScheme(other.to_string())),
    }
}

pub(crate) struct BrowserCeremony<'a> {
    pub provider: &'a dyn WalletProvider,
    pub browser: &'a dyn BrowserLauncher,
    pub timeout: Duration,
    pub cancel: &'a Notify,
}

impl BrowserCeremony<'_> {
    /// Run the hosted ceremony for `request` to completion.
    ///
    /// A cancel sent at any point after this starts ends the ceremony,
    /// including while the URL is requested or the page is opening.
    pub async fn run(&self, request: &WebAuthRequest) -> SessionResult<WebCompletion> {
        let kind = request.kind();
        let cancelled = self.cancel.notified();
        tokio::pin!(cancelled);
        cancelled.as_mut().enable();

        let raw_url = tokio::select! {
            raw_url = self.provider.web_auth_url(request) => raw_url?,
            _ = cancelled.as_mut() => return Err(cancelled_error(kind)),
        };
        let url = parse_ceremony_url(&raw_url)?;

        info!(kind = ?kind, host = url.host_str().unwrap_or(""), "Opening hosted passkey ceremony");

        let opened = tokio::select! {
            opened = self.browser.open(&url) => Some(opened),
            _ = cancelled.as_mut() => None,
        };
        let outcome = match opened {
            Some(Ok(())) => self.wait(kind, cancelled).await,
            Some(Err(e)) => Err(e.into()),
            None => Err(cancelled_error(kind)),
        };

        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Failed to close hosted ceremony page");
        }

        outcome
    }

    async fn wait(
        &self,
        kind: WebAuthKind,
        cancelled: Pin<&mut Notified<'_>>,
    ) -> SessionResult<WebCompletion> {
        tokio::select! {
            result = tokio::time::timeout(self.timeout, self.provider.await_web_completion(kind)) => {
                match result {
                    Ok(completion) => Ok(completion?),
                    Err(_) => {
                        warn!(kind = ?kind, timeout_secs = self.timeout.as_secs(), "Hosted ceremony timed out");
                        Err(SessionError::LoginTimedOut(self.timeout.as_secs()))
                    }
                }
            }
            _ = cancelled => Err(cancelled_error(kind)),
        }
    }
}

fn cancelled_error(kind: WebAuthKind) -> SessionError {
    debug!(kind = ?kind, "Hosted ceremony cancelled");
    SessionError::Cancelled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ceremony_url_accepts_http_and_https() {
        assert!(parse_ceremony_url("https://wallet.example/auth/1").is_ok());
        assert!(parse_ceremony_url(" http://localhost:8080/auth ").is_ok());
    }

    #[test]
    fn test_parse_ceremony_url_rejects_other_schemes() {
        assert!(matches!(
            parse_ceremony_url("javascript:alert(1)"),
            Err(SessionError::UnsupportedUrlScheme(scheme)) if scheme == "javascript"
        ));
        assert!(matches!(
            parse_ceremony_url("file:///etc/passwd"),
            Err(SessionError::UnsupportedUrlScheme(_))
        ));
    }

    #[test]
    fn test_parse_ceremony_url_rejects_garbage() {
        assert!(matches!(
            parse_ceremony_url(""),
            Err(SessionError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_ceremony_url("wallet.example/auth"),
            Err(SessionError::InvalidUrl(_))
        ));
    }
}
