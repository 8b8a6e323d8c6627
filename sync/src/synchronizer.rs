use log::{debug, error};
use tokio::sync::watch;

use crate::gateway::{IdentityGateway, SyncError, TokenSource};

/// The web session's externally observed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Transient read; acting on it would sync against incomplete data.
    Loading,
    Authenticated(String),
    Unauthenticated,
}

/// Two-state reconciliation loop with idempotent entry checks.
///
/// Each observed transition is converged into the identity gateway:
/// `Authenticated(uid)` means the gateway must hold a credential for
/// exactly that uid, `Unauthenticated` means it must hold none. Any
/// failure mid-sync triggers a defensive sign-out so the two states never
/// stay diverged. The `in_flight` flag makes the at-most-one-sync-at-a-
/// time property explicit rather than accidental; the run loop already
/// serializes transitions on top of it.
pub struct SessionSynchronizer<G, T> {
    gateway: G,
    tokens: T,
    in_flight: bool,
}

impl<G, T> SessionSynchronizer<G, T>
where
    G: IdentityGateway,
    T: TokenSource,
{
    pub fn new(gateway: G, tokens: T) -> Self {
        SessionSynchronizer {
            gateway,
            tokens,
            in_flight: false,
        }
    }

    /// Converges the gateway onto `state`. Errors never escape: a failed
    /// sync resolves to a signed-out gateway and a log line.
    pub async fn reconcile(&mut self, state: &SessionState) {
        if self.in_flight {
            debug!("Session sync already in flight; skipping transition");
            return;
        }
        self.in_flight = true;

        if let Err(e) = self.apply(state).await {
            error!("Session sync failed: {}", e);
            // Converge to signed-out rather than leaving the gateway
            // claiming an identity the session no longer vouches for.
            if self.gateway.current_uid().is_some() {
                if let Err(e) = self.gateway.sign_out().await {
                    error!("Defensive sign-out failed: {}", e);
                }
            }
        }

        self.in_flight = false;
    }

    async fn apply(&self, state: &SessionState) -> Result<(), SyncError> {
        match state {
            SessionState::Loading => Ok(()),
            SessionState::Authenticated(uid) => {
                // Re-renders replay the same state; re-authenticating every
                // time would hammer the token endpoint.
                if self.gateway.current_uid().as_deref() == Some(uid.as_str()) {
                    return Ok(());
                }
                let token = self.tokens.fetch_custom_token().await?;
                self.gateway.sign_in_with_custom_token(&token).await
            }
            SessionState::Unauthenticated => {
                if self.gateway.current_uid().is_some() {
                    self.gateway.sign_out().await
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Drives reconciliation from a push stream of session states until the
    /// sender side goes away. Transitions are handled strictly one at a
    /// time; intermediate states that arrive mid-sync collapse into the
    /// latest value.
    pub async fn run(mut self, mut states: watch::Receiver<SessionState>) {
        // borrow_and_update marks the value seen, so a transition that
        // arrived before the loop started is not reconciled twice.
        let initial = states.borrow_and_update().clone();
        self.reconcile(&initial).await;

        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            self.reconcile(&state).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MockIdentityGateway, MockTokenSource};
    use mockall::predicate::eq;

    #[tokio::test]
    async fn loading_performs_no_calls() {
        let gateway = MockIdentityGateway::new();
        let tokens = MockTokenSource::new();

        let mut sync = SessionSynchronizer::new(gateway, tokens);
        sync.reconcile(&SessionState::Loading).await;
        // Mocks panic on any unexpected call.
    }

    #[tokio::test]
    async fn already_signed_in_as_same_uid_is_a_no_op() {
        let mut gateway = MockIdentityGateway::new();
        gateway
            .expect_current_uid()
            .times(1)
            .returning(|| Some("uid123".to_string()));
        let tokens = MockTokenSource::new();

        let mut sync = SessionSynchronizer::new(gateway, tokens);
        sync.reconcile(&SessionState::Authenticated("uid123".to_string()))
            .await;
    }

    #[tokio::test]
    async fn signs_in_with_fetched_token_when_gateway_is_signed_out() {
        let mut gateway = MockIdentityGateway::new();
        gateway.expect_current_uid().returning(|| None);
        gateway
            .expect_sign_in_with_custom_token()
            .with(eq("tok-abc"))
            .times(1)
            .returning(|_| Ok(()));

        let mut tokens = MockTokenSource::new();
        tokens
            .expect_fetch_custom_token()
            .times(1)
            .returning(|| Ok("tok-abc".to_string()));

        let mut sync = SessionSynchronizer::new(gateway, tokens);
        sync.reconcile(&SessionState::Authenticated("uid123".to_string()))
            .await;
    }

    #[tokio::test]
    async fn signs_in_when_gateway_holds_a_different_uid() {
        let mut gateway = MockIdentityGateway::new();
        gateway
            .expect_current_uid()
            .returning(|| Some("someone-else".to_string()));
        gateway
            .expect_sign_in_with_custom_token()
            .with(eq("tok-xyz"))
            .times(1)
            .returning(|_| Ok(()));

        let mut tokens = MockTokenSource::new();
        tokens
            .expect_fetch_custom_token()
            .times(1)
            .returning(|| Ok("tok-xyz".to_string()));

        let mut sync = SessionSynchronizer::new(gateway, tokens);
        sync.reconcile(&SessionState::Authenticated("uid123".to_string()))
            .await;
    }

    #[tokio::test]
    async fn unauthenticated_signs_out_exactly_once() {
        let mut gateway = MockIdentityGateway::new();
        gateway
            .expect_current_uid()
            .returning(|| Some("uid123".to_string()));
        gateway.expect_sign_out().times(1).returning(|| Ok(()));
        let tokens = MockTokenSource::new();

        let mut sync = SessionSynchronizer::new(gateway, tokens);
        sync.reconcile(&SessionState::Unauthenticated).await;
    }

    #[tokio::test]
    async fn unauthenticated_with_signed_out_gateway_is_a_no_op() {
        let mut gateway = MockIdentityGateway::new();
        gateway.expect_current_uid().times(1).returning(|| None);
        let tokens = MockTokenSource::new();

        let mut sync = SessionSynchronizer::new(gateway, tokens);
        sync.reconcile(&SessionState::Unauthenticated).await;
    }

    #[tokio::test]
    async fn token_failure_triggers_defensive_sign_out() {
        let mut gateway = MockIdentityGateway::new();
        // First check inside apply (stale uid), second in the failure path.
        gateway
            .expect_current_uid()
            .returning(|| Some("stale-uid".to_string()));
        gateway.expect_sign_out().times(1).returning(|| Ok(()));

        let mut tokens = MockTokenSource::new();
        tokens
            .expect_fetch_custom_token()
            .times(1)
            .returning(|| Err(SyncError::TokenFetch("boom".to_string())));

        let mut sync = SessionSynchronizer::new(gateway, tokens);
        sync.reconcile(&SessionState::Authenticated("uid123".to_string()))
            .await;
    }

    #[tokio::test]
    async fn sign_in_failure_with_signed_out_gateway_stays_signed_out() {
        let mut gateway = MockIdentityGateway::new();
        gateway.expect_current_uid().returning(|| None);
        gateway
            .expect_sign_in_with_custom_token()
            .times(1)
            .returning(|_| Err(SyncError::Gateway("exchange rejected".to_string())));
        // No sign_out expectation: nothing to converge, nothing is called.

        let mut tokens = MockTokenSource::new();
        tokens
            .expect_fetch_custom_token()
            .returning(|| Ok("tok".to_string()));

        let mut sync = SessionSynchronizer::new(gateway, tokens);
        sync.reconcile(&SessionState::Authenticated("uid123".to_string()))
            .await;
    }

    #[tokio::test]
    async fn run_loop_reconciles_each_transition_in_order() {
        let mut gateway = MockIdentityGateway::new();
        let mut seq = mockall::Sequence::new();
        gateway
            .expect_current_uid()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| None);
        gateway
            .expect_sign_in_with_custom_token()
            .with(eq("tok"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        gateway
            .expect_current_uid()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Some("uid123".to_string()));
        gateway
            .expect_sign_out()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        let mut tokens = MockTokenSource::new();
        tokens
            .expect_fetch_custom_token()
            .times(1)
            .returning(|| Ok("tok".to_string()));

        let (tx, rx) = watch::channel(SessionState::Loading);
        let sync = SessionSynchronizer::new(gateway, tokens);
        let handle = tokio::spawn(sync.run(rx));

        tx.send(SessionState::Authenticated("uid123".to_string()))
            .unwrap();
        // Give the loop a chance to observe the first transition before
        // the next one replaces it in the watch slot.
        tokio::task::yield_now().await;
        tx.send(SessionState::Unauthenticated).unwrap();
        drop(tx);

        handle.await.unwrap();
    }
}
