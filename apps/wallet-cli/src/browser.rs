//! Browser launchers for hosted passkey ceremonies.

use async_trait::async_trait;
use tracing::debug;
use url::Url;
use wallet_auth_session::{BrowserError, BrowserLauncher};

/// Opens ceremony pages in the system's default browser.
///
/// The launched browser belongs to the user, so `close` has nothing to do.
pub struct SystemBrowser;

#[async_trait]
impl BrowserLauncher for SystemBrowser {
    async fn open(&self, url: &Url) -> Result<(), BrowserError> {
        debug!(url = %url, "Opening system browser");
        open::that_detached(url.as_str()).map_err(|e| BrowserError::Open(e.to_string()))
    }

    async fn close(&self) -> Result<(), BrowserError> {
        Ok(())
    }
}

/// Prints ceremony URLs instead of launching anything.
pub struct PrintBrowser;

#[async_trait]
impl BrowserLauncher for PrintBrowser {
    async fn open(&self, url: &Url) -> Result<(), BrowserError> {
        println!("Open this page to continue: {}", url);
        Ok(())
    }

    async fn close(&self) -> Result<(), BrowserError> {
        debug!("Ceremony page finished");
        Ok(())
    }
}
