//! Hand-off to Shopify's hosted checkout.
//!
//! The cart only knows a checkout URL; completing the purchase happens on
//! Shopify. A [`CheckoutNavigator`] sends the shopper there, either by
//! replacing the current page or by opening an external handler.

use std::process::Command;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CheckoutMode;

/// Errors dispatching to checkout. Logged, never returned to session callers.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Invalid checkout URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to launch URL handler: {0}")]
    Launch(#[from] std::io::Error),
}

/// Something that can send the shopper to a URL.
pub trait CheckoutNavigator: Send + Sync {
    /// Dispatch to `url`. Returns once the hand-off is issued, not completed.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError` if the hand-off could not be issued.
    fn navigate(&self, url: &Url) -> Result<(), CheckoutError>;
}

/// Full-page navigation replacement.
///
/// The embedding shell follows [`subscribe`](Self::subscribe) and replaces
/// its current page with each published URL.
#[derive(Debug)]
pub struct RedirectNavigator {
    target: watch::Sender<Option<Url>>,
}

impl Default for RedirectNavigator {
    fn default() -> Self {
        Self {
            target: watch::channel(None).0,
        }
    }
}

impl RedirectNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Url>> {
        self.target.subscribe()
    }

    /// Last URL navigated to.
    #[must_use]
    pub fn current(&self) -> Option<Url> {
        self.target.borrow().clone()
    }
}

impl CheckoutNavigator for RedirectNavigator {
    fn navigate(&self, url: &Url) -> Result<(), CheckoutError> {
        debug!(url = %url, "Redirecting to checkout");
        self.target.send_replace(Some(url.clone()));
        Ok(())
    }
}

/// Opens the URL in the platform's default handler (usually a browser).
#[derive(Debug, Default, Clone, Copy)]
pub struct ExternalNavigator;

impl ExternalNavigator {
    fn command(url: &Url) -> Command {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(url.as_str());
            cmd
        } else if cfg!(windows) {
            // `start` treats the first quoted argument as a window title
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", "", url.as_str()]);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(url.as_str());
            cmd
        }
    }
}

impl CheckoutNavigator for ExternalNavigator {
    fn navigate(&self, url: &Url) -> Result<(), CheckoutError> {
        let mut child = Self::command(url).spawn()?;
        info!(url = %url, pid = child.id(), "Opened checkout in external handler");

        // Reap the launcher without blocking the caller
        std::thread::spawn(move || {
            if let Err(e) = child.wait() {
                warn!(error = %e, "URL handler did not exit cleanly");
            }
        });
        Ok(())
    }
}

/// Navigator for a configured checkout mode.
#[must_use]
pub fn navigator_for(mode: CheckoutMode) -> Arc<dyn CheckoutNavigator> {
    match mode {
        CheckoutMode::Redirect => Arc::new(RedirectNavigator::new()),
        CheckoutMode::External => Arc::new(ExternalNavigator),
    }
}

/// Send the shopper to `checkout_url`, if there is one.
///
/// Fire-and-forget: a missing URL is a no-op, and parse or dispatch failures
/// are logged. Returns whether a hand-off was issued.
pub fn hand_off(navigator: &dyn CheckoutNavigator, checkout_url: Option<&str>) -> bool {
    let Some(raw) = checkout_url else {
        debug!("No checkout URL, skipping hand-off");
        return false;
    };

    let result = Url::parse(raw)
        .map_err(CheckoutError::from)
        .and_then(|url| navigator.navigate(&url));

    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, url = raw, "Checkout hand-off failed");
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_no_url_is_noop() {
        let navigator = RedirectNavigator::new();
        assert!(!hand_off(&navigator, None));
        assert_eq!(navigator.current(), None);
    }

    #[test]
    fn test_redirect_publishes_url() {
        let navigator = RedirectNavigator::new();
        let rx = navigator.subscribe();

        assert!(hand_off(
            &navigator,
            Some("https://wildenflower.myshopify.com/cart/c/abc?key=1")
        ));

        let target = rx.borrow().clone().unwrap();
        assert_eq!(target.host_str(), Some("wildenflower.myshopify.com"));
        assert_eq!(target.path(), "/cart/c/abc");
    }

    #[test]
    fn test_invalid_url_is_logged_not_dispatched() {
        let navigator = RedirectNavigator::new();
        assert!(!hand_off(&navigator, Some("not a url")));
        assert_eq!(navigator.current(), None);
    }

    #[test]
    fn test_external_command_targets_url() {
        let url = Url::parse("https://wildenflower.myshopify.com/cart/c/abc").unwrap();
        let cmd = ExternalNavigator::command(&url);
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args.last().map(String::as_str), Some(url.as_str()));
    }
}
