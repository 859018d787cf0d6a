//! Read access to the active credentials for components that call the
//! catalog on the user's behalf.

use crate::types::Credentials;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Source of the credentials used for authenticated catalog requests.
///
/// Returning `None` means "not signed in"; callers treat that as a reason to
/// skip the request, not as an error.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn credentials(&self) -> Option<Credentials>;
}

/// Provider backed by a fixed, replaceable value.
///
/// For hosts that authenticate outside the core and for tests.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    inner: RwLock<Option<Credentials>>,
}

impl StaticCredentials {
    pub fn new(credentials: Option<Credentials>) -> Self {
        Self {
            inner: RwLock::new(credentials),
        }
    }

    pub async fn replace(&self, credentials: Option<Credentials>) {
        *self.inner.write().await = credentials;
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentials {
    async fn credentials(&self) -> Option<Credentials> {
        self.inner.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_credentials_replace() {
        let provider = StaticCredentials::default();
        assert!(provider.credentials().await.is_none());

        provider
            .replace(Some(Credentials {
                server_url: "https://media.example.com".to_string(),
                username: "alice".to_string(),
                user_id: "u-1".to_string(),
                access_token: "tok".to_string(),
                device_id: "d-1".to_string(),
            }))
            .await;

        let current = provider.credentials().await.unwrap();
        assert_eq!(current.user_id, "u-1");
    }
}
