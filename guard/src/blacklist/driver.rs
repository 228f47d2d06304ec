/// Revocation store consulted by the controller.
///
/// Every driver, in-memory or backed by an external store, implements exactly
/// these two operations. Keys are raw token strings; `expires_at` is the
/// token's own `exp` claim in epoch seconds, so an entry never outlives the
/// token it revokes.
pub trait BlacklistDriver: Send + Sync {
    /// True if `key` is revoked and its entry has not expired yet.
    fn is_exists(&self, key: &str) -> bool;

    /// Revoke `key` until `expires_at`. Setting the same key again is harmless.
    fn set(&self, key: &str, expires_at: i64);
}
