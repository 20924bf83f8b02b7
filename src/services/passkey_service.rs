//! Passkey storage and WebAuthn ceremony state.
//!
//! The WebAuthn protocol itself is handled by `webauthn-rs`. This module keeps:
//! - stored credentials (`passkeys` table, primary database)
//! - in-flight ceremony state in memory with a five minute lifetime
//!
//! Registrations are keyed by the (authenticated) user id. Logins are keyed by
//! their challenge, so any number of logins for one account can be pending and
//! a stranger cannot replace or consume someone else's.

use std::{
    borrow::Borrow,
    collections::HashMap,
    hash::Hash,
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use tokio::sync::Mutex;
use url::Url;
use webauthn_rs::prelude::{
    AuthenticationResult, Passkey, PasskeyAuthentication, PasskeyRegistration,
    RequestChallengeResponse, Webauthn, WebauthnBuilder,
};

use crate::{config::Config, db::DbPool, error::AppError, models::passkey::StoredPasskey};

pub const CEREMONY_TTL: Duration = Duration::from_secs(5 * 60);

/// Build the relying party from configuration.
pub fn build_webauthn(config: &Config) -> Result<Webauthn, AppError> {
    let origin = Url::parse(&config.webauthn_rp_origin)
        .map_err(|e| AppError::Internal(format!("invalid WEBAUTHN_RP_ORIGIN: {e}")))?;

    WebauthnBuilder::new(&config.webauthn_rp_id, &origin)
        .and_then(|builder| builder.rp_name(&config.webauthn_rp_name).build())
        .map_err(|e| AppError::Internal(format!("failed to configure WebAuthn: {e}")))
}

struct Pending<T> {
    state: T,
    created: Instant,
}

/// Ceremony states waiting for their `end` request. Expired entries are dropped.
pub struct CeremonyStore<K, T> {
    pending: Mutex<HashMap<K, Pending<T>>>,
}

impl<K, T> Default for CeremonyStore<K, T> {
    fn default() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, T> CeremonyStore<K, T> {
    pub async fn put(&self, key: K, state: T) {
        let mut map = self.pending.lock().await;
        prune(&mut map);
        map.insert(
            key,
            Pending {
                state,
                created: Instant::now(),
            },
        );
    }

    /// Remove and return the state if it has not expired.
    pub async fn take<Q>(&self, key: &Q) -> Option<T>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let mut map = self.pending.lock().await;
        map.remove(key)
            .filter(|pending| pending.created.elapsed() < CEREMONY_TTL)
            .map(|pending| pending.state)
    }

    /// Run `verify` against the pending state.
    ///
    /// The entry is removed only when `verify` succeeds; a failed attempt
    /// leaves it for the legitimate caller. `None` means nothing is pending.
    pub async fn complete<Q, R, E>(
        &self,
        key: &Q,
        verify: impl FnOnce(&T) -> Result<R, E>,
    ) -> Option<Result<R, E>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let mut map = self.pending.lock().await;
        prune(&mut map);
        let outcome = verify(&map.get(key)?.state);
        if outcome.is_ok() {
            map.remove(key);
        }
        Some(outcome)
    }
}

fn prune<K, T>(map: &mut HashMap<K, Pending<T>>) {
    map.retain(|_, pending| pending.created.elapsed() < CEREMONY_TTL);
}

/// A login waiting for its assertion.
pub struct PendingLogin {
    pub user_id: i32,
    pub state: PasskeyAuthentication,
}

/// In-memory store for ceremonies between their `begin` and `end` requests.
#[derive(Default)]
pub struct PasskeySessions {
    pub registrations: CeremonyStore<i32, PasskeyRegistration>,
    pub logins: CeremonyStore<String, PendingLogin>,
}

/// Base64url text without padding, the form browsers use for ids and challenges.
fn normalize_b64url(value: &str) -> String {
    value
        .trim_end_matches('=')
        .replace('+', "-")
        .replace('/', "_")
}

/// Key under which a credential id is stored and looked up.
///
/// Works for any of the binary wrappers `webauthn-rs` serializes as base64.
pub fn credential_key<T: Serialize + ?Sized>(id: &T) -> Result<String, AppError> {
    serde_json::to_value(id)
        .ok()
        .and_then(|value| value.as_str().map(normalize_b64url))
        .ok_or_else(|| AppError::Internal("credential id is not base64 text".to_string()))
}

/// Challenge of freshly issued request options.
pub fn options_challenge(options: &RequestChallengeResponse) -> Result<String, AppError> {
    serde_json::to_value(options)
        .ok()
        .and_then(|value| value["publicKey"]["challenge"].as_str().map(normalize_b64url))
        .ok_or_else(|| AppError::Internal("request options carry no challenge".to_string()))
}

#[derive(Deserialize)]
struct ClientData {
    challenge: String,
}

/// Challenge the authenticator signed, read from the raw `clientDataJSON`.
pub fn assertion_challenge(client_data_json: &[u8]) -> Result<String, AppError> {
    serde_json::from_slice::<ClientData>(client_data_json)
        .map(|data| normalize_b64url(&data.challenge))
        .map_err(|_| AppError::Passkey("Malformed client data".to_string()))
}

pub async fn list_passkeys(pool: &DbPool, user_id: i32) -> Result<Vec<StoredPasskey>, AppError> {
    let passkeys = sqlx::query_as::<_, StoredPasskey>(
        r#"
        SELECT id, passkey
        FROM passkeys
        WHERE user_id = $1
        ORDER BY created_at
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(passkeys)
}

/// Store a newly registered credential.
///
/// The lookup key is derived from the verified credential, never from the
/// id string the browser sent alongside it.
pub async fn save_passkey(
    pool: &DbPool,
    user_id: i32,
    passkey: &Passkey,
) -> Result<(), AppError> {
    let credential_id = credential_key(passkey.cred_id())?;

    sqlx::query(
        r#"
        INSERT INTO passkeys (user_id, credential_id, passkey)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(credential_id)
    .bind(Json(passkey))
    .execute(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Passkey("This passkey is already registered".to_string())
        }
        other => AppError::Database(other),
    })?;

    tracing::info!(target: "movies", user_id, "passkey registered");
    Ok(())
}

/// Owner of a credential id, if the credential is known.
pub async fn find_owner(pool: &DbPool, credential_id: &str) -> Result<Option<i32>, AppError> {
    let user_id = sqlx::query_scalar::<_, i32>(
        "SELECT user_id FROM passkeys WHERE credential_id = $1",
    )
    .bind(credential_id)
    .fetch_optional(pool)
    .await?;

    Ok(user_id)
}

/// Apply the signature counter / backup state from a successful login.
pub async fn record_authentication(
    pool: &DbPool,
    user_id: i32,
    result: &AuthenticationResult,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let stored = sqlx::query_as::<_, StoredPasskey>(
        r#"
        SELECT id, passkey
        FROM passkeys
        WHERE user_id = $1
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *tx)
    .await?;

    for row in stored {
        let mut passkey = row.passkey.0;
        if passkey.cred_id() != result.cred_id() {
            continue;
        }
        passkey.update_credential(result);
        sqlx::query("UPDATE passkeys SET passkey = $1, last_used = NOW() WHERE id = $2")
            .bind(Json(&passkey))
            .bind(row.id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_logins_for_one_user_are_kept_apart() {
        let store: CeremonyStore<String, i32> = CeremonyStore::default();
        store.put("challenge-a".to_string(), 1).await;
        store.put("challenge-b".to_string(), 1).await;

        assert_eq!(store.complete("challenge-a", |user| Ok::<_, ()>(*user)).await, Some(Ok(1)));
        assert_eq!(store.complete("challenge-b", |user| Ok::<_, ()>(*user)).await, Some(Ok(1)));
        assert_eq!(store.complete("challenge-a", |user| Ok::<_, ()>(*user)).await, None);
    }

    #[tokio::test]
    async fn test_failed_verification_keeps_the_ceremony() {
        let store: CeremonyStore<String, i32> = CeremonyStore::default();
        store.put("challenge".to_string(), 7).await;

        let failed = store.complete("challenge", |_| Err::<(), _>("bad signature")).await;
        assert_eq!(failed, Some(Err("bad signature")));
        assert_eq!(store.complete("challenge", |user| Ok::<_, ()>(*user)).await, Some(Ok(7)));
    }

    #[tokio::test]
    async fn test_take_is_single_use() {
        let store: CeremonyStore<i32, &str> = CeremonyStore::default();
        store.put(1, "registration").await;
        assert_eq!(store.take(&1).await, Some("registration"));
        assert_eq!(store.take(&1).await, None);
    }

    #[test]
    fn test_expired_state_is_dropped() {
        let mut map = HashMap::new();
        if let Some(created) = Instant::now().checked_sub(CEREMONY_TTL + Duration::from_secs(1)) {
            map.insert(7, Pending { state: 1u8, created });
            map.insert(
                8,
                Pending {
                    state: 2u8,
                    created: Instant::now(),
                },
            );
            prune(&mut map);
            assert!(!map.contains_key(&7));
            assert!(map.contains_key(&8));
        }
    }

    #[test]
    fn test_assertion_challenge_reads_client_data() {
        let client_data = br#"{"type":"webauthn.get","challenge":"q1w2-e3_r4","origin":"http://localhost:8080"}"#;
        assert_eq!(assertion_challenge(client_data).unwrap(), "q1w2-e3_r4");
        assert!(matches!(assertion_challenge(b"not json"), Err(AppError::Passkey(_))));
    }

    #[test]
    fn test_credential_key_is_unpadded_base64url() {
        assert_eq!(credential_key("ab+/cd==").unwrap(), "ab-_cd");
        assert_eq!(credential_key("AbC-_9").unwrap(), "AbC-_9");
        assert!(credential_key(&42).is_err());
    }

    #[test]
    fn test_build_webauthn_from_defaults() {
        let config = crate::config::test_config();
        assert!(build_webauthn(&config).is_ok());
    }

    #[test]
    fn test_build_webauthn_rejects_bad_origin() {
        let mut config = crate::config::test_config();
        config.webauthn_rp_origin = "not a url".into();
        assert!(build_webauthn(&config).is_err());
    }
}
