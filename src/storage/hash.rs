use sha2::{Digest, Sha256};

pub fn compute_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

pub fn sign_object_key(signing_key: &str, key: &str, expires_at: i64) -> String {
    compute_hash(&format!("{signing_key}:{key}:{expires_at}"))
}
