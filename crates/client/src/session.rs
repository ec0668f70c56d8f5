//! Access-token state owned by a client.

use tokio::sync::RwLock;

/// The access token currently in use, plus a generation counter that
/// changes on every replacement or sign-out.
///
/// A request remembers the generation it was sent with; when it comes back
/// 401, a changed generation means some other request already refreshed
/// (or the session was cleared) and no second refresh is needed.
#[derive(Debug, Default)]
pub struct Session {
    state: RwLock<State>,
}

#[derive(Debug, Default, Clone)]
struct State {
    access_token: Option<String>,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.state.read().await.access_token.clone()
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Token and generation read under one lock.
    pub(crate) async fn snapshot(&self) -> (Option<String>, u64) {
        let state = self.state.read().await;
        (state.access_token.clone(), state.generation)
    }

    pub async fn set_access_token(&self, token: impl Into<String>) {
        let mut state = self.state.write().await;
        state.access_token = Some(token.into());
        state.generation += 1;
    }

    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.access_token = None;
        state.generation += 1;
    }

    pub async fn is_signed_in(&self) -> bool {
        self.state.read().await.access_token.is_some()
    }
}
