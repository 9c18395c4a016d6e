// /////////////////////////////////////////////////////////////////////////////
// Fieldcrypt
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Shared fixtures for the integration suites: an in-process mock KMS, an
//! in-memory key-version repository, and record builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use fieldcrypt::application::EnvelopeCryptoBuilder;
use fieldcrypt::EnvelopeCrypto;
use fieldcrypt_domain::entities::{DynamicRecord, KekVersionRecord};
use fieldcrypt_domain::repositories::KekVersionRepository;
use fieldcrypt_domain::services::KmsService;
use fieldcrypt_domain::value_objects::{CanonicalValue, KekAlias, KeyVersion};
use fieldcrypt_domain::CryptoError;

pub const TEST_PEPPER: &[u8] = b"test-pepper-exactly-32-bytes-OK!";

/// In-process KMS double. "Wrapping" embeds the key id so unwrap can
/// verify the caller resolved the same key the DEK was wrapped under,
/// which is exactly the version-binding property the tests care about.
pub struct MockKms {
    keys: Mutex<HashMap<String, Vec<String>>>,
    secrets: Mutex<HashMap<String, Vec<u8>>>,
    key_seq: AtomicUsize,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl Default for MockKms {
    fn default() -> Self {
        Self::new()
    }
}

impl MockKms {
    pub fn new() -> Self {
        Self {
            keys: Mutex::new(HashMap::new()),
            secrets: Mutex::new(HashMap::new()),
            key_seq: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Starts failing every call with `KmsUnavailable`
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Total calls that reached the mock
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Seeds a secret for `get_secret`
    pub fn put_secret(&self, path: &str, value: Vec<u8>) {
        self.secrets.lock().insert(path.to_string(), value);
    }

    /// Pre-creates a key under the alias (exists-check adoption path)
    pub fn seed_key(&self, alias: &str) -> String {
        let id = format!("kms-{}-{}", alias, self.key_seq.fetch_add(1, Ordering::SeqCst));
        self.keys
            .lock()
            .entry(alias.to_string())
            .or_default()
            .push(id.clone());
        id
    }

    fn gate(&self) -> Result<(), CryptoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            Err(CryptoError::kms_unavailable("mock KMS is failing"))
        } else {
            Ok(())
        }
    }

    fn key_exists(&self, key_id: &str) -> bool {
        self.keys
            .lock()
            .values()
            .any(|ids| ids.iter().any(|id| id == key_id))
    }
}

#[async_trait]
impl KmsService for MockKms {
    async fn encrypt_dek(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.gate()?;
        if !self.key_exists(key_id) {
            return Err(CryptoError::AuthenticationFailed(format!(
                "unknown key id '{}'",
                key_id
            )));
        }
        let mut wrapped = vec![key_id.len() as u8];
        wrapped.extend_from_slice(key_id.as_bytes());
        wrapped.extend_from_slice(plaintext);
        Ok(wrapped)
    }

    async fn decrypt_dek(&self, key_id: &str, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        self.gate()?;
        let (len, rest) = ciphertext
            .split_first()
            .ok_or_else(|| CryptoError::decryption_failed("empty wrapped DEK"))?;
        let len = *len as usize;
        if rest.len() < len {
            return Err(CryptoError::decryption_failed("corrupt wrapped DEK"));
        }
        let (embedded, plaintext) = rest.split_at(len);
        if embedded != key_id.as_bytes() {
            return Err(CryptoError::AuthenticationFailed(format!(
                "wrapped under a different key than '{}'",
                key_id
            )));
        }
        Ok(plaintext.to_vec())
    }

    async fn create_key(&self, alias: &str) -> Result<String, CryptoError> {
        self.gate()?;
        Ok(self.seed_key(alias))
    }

    async fn get_key_id(&self, alias: &str) -> Result<Option<String>, CryptoError> {
        self.gate()?;
        Ok(self
            .keys
            .lock()
            .get(alias)
            .and_then(|ids| ids.last().cloned()))
    }

    async fn get_secret(&self, path: &str) -> Result<Vec<u8>, CryptoError> {
        self.gate()?;
        self.secrets
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| CryptoError::NotFound(format!("secret '{}' not found", path)))
    }
}

/// In-memory key-version store with the same transactional semantics as
/// the SQLite implementation.
#[derive(Default)]
pub struct InMemoryKekRepository {
    rows: Mutex<Vec<KekVersionRecord>>,
}

impl InMemoryKekRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<KekVersionRecord> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl KekVersionRepository for InMemoryKekRepository {
    async fn find_current(
        &self,
        alias: &KekAlias,
    ) -> Result<Option<KekVersionRecord>, CryptoError> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|r| &r.alias == alias && !r.is_deprecated)
            .cloned())
    }

    async fn find_by_version(
        &self,
        alias: &KekAlias,
        version: KeyVersion,
    ) -> Result<Option<KekVersionRecord>, CryptoError> {
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|r| &r.alias == alias && r.version == version)
            .cloned())
    }

    async fn insert(&self, record: &KekVersionRecord) -> Result<(), CryptoError> {
        let mut rows = self.rows.lock();
        if rows
            .iter()
            .any(|r| r.alias == record.alias && r.version == record.version)
        {
            return Err(CryptoError::storage_unavailable(format!(
                "duplicate (alias, version): ('{}', {})",
                record.alias, record.version
            )));
        }
        rows.push(record.clone());
        Ok(())
    }

    async fn rotate(
        &self,
        alias: &KekAlias,
        deprecate: KeyVersion,
        insert: &KekVersionRecord,
    ) -> Result<(), CryptoError> {
        let mut rows = self.rows.lock();
        if rows
            .iter()
            .any(|r| r.alias == insert.alias && r.version == insert.version)
        {
            return Err(CryptoError::storage_unavailable(format!(
                "duplicate (alias, version): ('{}', {})",
                insert.alias, insert.version
            )));
        }
        for row in rows.iter_mut() {
            if &row.alias == alias && row.version == deprecate {
                row.is_deprecated = true;
            }
        }
        rows.push(insert.clone());
        Ok(())
    }
}

/// Builds an engine over a fresh mock KMS and in-memory store.
pub async fn test_engine() -> (EnvelopeCrypto, Arc<MockKms>, Arc<InMemoryKekRepository>) {
    let kms = Arc::new(MockKms::new());
    let repo = Arc::new(InMemoryKekRepository::new());
    let crypto = EnvelopeCryptoBuilder::new()
        .kms_service(kms.clone())
        .kek_alias("app")
        .pepper(TEST_PEPPER.to_vec())
        .argon2_params(fast_argon2())
        .key_metadata_repository(repo.clone())
        .build()
        .await
        .expect("test engine builds");
    (crypto, kms, repo)
}

/// Argon2 profile at the validation floor; production costs would make
/// the suite crawl.
pub fn fast_argon2() -> fieldcrypt_domain::value_objects::Argon2Params {
    fieldcrypt_domain::value_objects::Argon2Params::new(8 * 1024, 1, 1, 16, 32).unwrap()
}

/// The three-field record of the round-trip scenario.
pub fn sample_record() -> DynamicRecord {
    DynamicRecord::builder()
        .field(
            "Email",
            "encrypt,hash_basic",
            CanonicalValue::from("user@example.com"),
        )
        .unwrap()
        .companion_fields("Email")
        .field("Name", "encrypt", CanonicalValue::from("John Doe"))
        .unwrap()
        .companion_fields("Name")
        .field("Phone", "hash_basic", CanonicalValue::from("+1-555-0123"))
        .unwrap()
        .companion_fields("Phone")
        .envelope()
        .build()
}

/// A record whose tagged field is missing its companion (fails
/// validation).
pub fn broken_record() -> DynamicRecord {
    DynamicRecord::builder()
        .field("Email", "encrypt", CanonicalValue::from("user@example.com"))
        .unwrap()
        .envelope()
        .build()
}
