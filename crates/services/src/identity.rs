//! Identity provider contract and a channel-backed local implementation.

use async_trait::async_trait;
use quiz_core::model::UserId;
use tokio::sync::watch;
use tracing::info;

use crate::error::IdentityError;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, or `None` when anonymous.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError` if the provider cannot be reached.
    async fn current_user(&self) -> Result<Option<UserId>, IdentityError>;

    /// Receiver that observes every sign-in and sign-out.
    fn subscribe(&self) -> watch::Receiver<Option<UserId>>;

    /// End the current session.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError` if the provider cannot be reached.
    async fn sign_out(&self) -> Result<(), IdentityError>;
}

/// Identity held in-process; the terminal driver signs in from a flag.
pub struct LocalIdentity {
    session: watch::Sender<Option<UserId>>,
}

impl LocalIdentity {
    #[must_use]
    pub fn new(user: Option<UserId>) -> Self {
        let (session, _) = watch::channel(user);
        Self { session }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn sign_in(&self, user: UserId) {
        info!(user = %user, "signed in");
        self.session.send_replace(Some(user));
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn current_user(&self) -> Result<Option<UserId>, IdentityError> {
        Ok(self.session.borrow().clone())
    }

    fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.session.subscribe()
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        info!("signed out");
        self.session.send_replace(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_see_sign_in_and_out() {
        let identity = LocalIdentity::anonymous();
        let mut rx = identity.subscribe();
        assert_eq!(identity.current_user().await.unwrap(), None);

        identity.sign_in(UserId::new("u1"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().clone(), Some(UserId::new("u1")));

        identity.sign_out().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().clone(), None);
        assert_eq!(identity.current_user().await.unwrap(), None);
    }
}
