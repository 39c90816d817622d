//! Browser launcher seam for hosted passkey ceremonies.

use crate::error::BrowserError;
use async_trait::async_trait;
use url::Url;

/// Opens and closes the page a hosted ceremony runs in.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn open(&self, url: &Url) -> Result<(), BrowserError>;

    /// Called on every exit path of a ceremony, including failures.
    async fn close(&self) -> Result<(), BrowserError>;
}
