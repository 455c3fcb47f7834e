use bcrypt::{hash, verify, BcryptError};

// bcrypt is CPU bound; keep it off the async workers.

pub async fn hash_password(plain: &str, cost: u32) -> Result<String, BcryptError> {
    let plain = plain.to_string();
    tokio::task::spawn_blocking(move || hash(plain.as_bytes(), cost))
        .await
        .unwrap_or(Err(BcryptError::InvalidHash("hashing task aborted".into())))
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(plain: &str, hashed: &str) -> bool {
    let plain = plain.to_string();
    let hashed = hashed.to_string();
    tokio::task::spawn_blocking(move || verify(plain.as_bytes(), &hashed).unwrap_or(false))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_roundtrip() {
        let hashed = hash_password("secreto", 4).await.unwrap();
        assert_ne!(hashed, "secreto");
        assert!(verify_password("secreto", &hashed).await);
        assert!(!verify_password("otro", &hashed).await);
        assert!(!verify_password("secreto", "not-a-hash").await);
    }
}
