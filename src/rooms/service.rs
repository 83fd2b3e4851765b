use bytes::Bytes;
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::rooms::dto::RoomForm;
use crate::rooms::repo::{self, Room};
use crate::state::AppState;

pub struct UploadItem {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Debug)]
struct Uploaded {
    keys: Vec<String>,
    urls: Vec<String>,
}

/// Create pipeline: upload every image, then perform exactly one insert.
/// Uploads run sequentially so the first failure aborts the submission
/// deterministically; on abort (upload or insert), blobs already uploaded
/// for this attempt are deleted best-effort rather than leaked.
pub async fn create_room_with_images(
    st: &AppState,
    owner_id: Uuid,
    form: RoomForm,
    images: Vec<UploadItem>,
) -> Result<Room, AppError> {
    let uploaded = upload_images(st, owner_id, images).await?;

    match repo::insert(&st.db, owner_id, &form, &uploaded.urls).await {
        Ok(room) => Ok(room),
        Err(e) => {
            remove_uploaded(st, &uploaded.keys).await;
            Err(AppError::Unexpected(e))
        }
    }
}

/// Zero files is a valid submission and yields an empty URL list.
async fn upload_images(
    st: &AppState,
    owner_id: Uuid,
    images: Vec<UploadItem>,
) -> Result<Uploaded, AppError> {
    let mut keys = Vec::with_capacity(images.len());
    let mut urls = Vec::with_capacity(images.len());

    for img in images {
        let key = object_key(owner_id, &img.content_type);
        if let Err(e) = st.storage.put_object(&key, img.bytes, &img.content_type).await {
            warn!(error = %e, key = %key, "image upload failed, aborting submission");
            remove_uploaded(st, &keys).await;
            return Err(AppError::Upload(e.to_string()));
        }
        urls.push(st.storage.public_url(&key));
        keys.push(key);
    }

    Ok(Uploaded { keys, urls })
}

/// Storage key scoped under the owner's identity with a random token, so
/// filenames cannot collide and paths cannot be guessed across tenants.
fn object_key(owner_id: Uuid, content_type: &str) -> String {
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    format!("{}/{}.{}", owner_id, Uuid::new_v4(), ext)
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

async fn remove_uploaded(st: &AppState, keys: &[String]) {
    for key in keys {
        if let Err(e) = st.storage.delete_object(key).await {
            warn!(error = %e, key = %key, "failed to remove uploaded image after abort");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageClient;
    use axum::async_trait;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    struct RecordingStorage {
        puts: Mutex<Vec<String>>,
        deletes: Mutex<Vec<String>>,
        attempts: AtomicUsize,
        fail_on: Option<usize>,
    }

    impl RecordingStorage {
        fn new(fail_on: Option<usize>) -> Arc<Self> {
            Arc::new(Self {
                puts: Mutex::new(Vec::new()),
                deletes: Mutex::new(Vec::new()),
                attempts: AtomicUsize::new(0),
                fail_on,
            })
        }
    }

    #[async_trait]
    impl StorageClient for RecordingStorage {
        async fn put_object(&self, key: &str, _b: Bytes, _ct: &str) -> anyhow::Result<()> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(n) {
                anyhow::bail!("bucket unavailable");
            }
            self.puts.lock().unwrap().push(key.to_string());
            Ok(())
        }

        async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
            self.deletes.lock().unwrap().push(key.to_string());
            Ok(())
        }

        fn public_url(&self, key: &str) -> String {
            format!("https://cdn.test/{}", key)
        }
    }

    fn state_with(storage: Arc<RecordingStorage>) -> AppState {
        let base = AppState::fake();
        AppState::from_parts(base.db, base.config, storage)
    }

    fn jpeg(bytes: &'static [u8]) -> UploadItem {
        UploadItem {
            bytes: Bytes::from_static(bytes),
            content_type: "image/jpeg".into(),
        }
    }

    #[tokio::test]
    async fn zero_images_yield_an_empty_url_list() {
        let storage = RecordingStorage::new(None);
        let st = state_with(storage.clone());
        let owner = Uuid::new_v4();

        let uploaded = upload_images(&st, owner, Vec::new()).await.unwrap();
        assert!(uploaded.urls.is_empty());
        assert!(storage.puts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn uploads_are_keyed_under_the_owner_in_order() {
        let storage = RecordingStorage::new(None);
        let st = state_with(storage.clone());
        let owner = Uuid::new_v4();

        let uploaded = upload_images(&st, owner, vec![jpeg(b"a"), jpeg(b"b")])
            .await
            .unwrap();

        assert_eq!(uploaded.urls.len(), 2);
        let puts = storage.puts.lock().unwrap();
        assert_eq!(puts.len(), 2);
        for (key, url) in puts.iter().zip(&uploaded.urls) {
            assert!(key.starts_with(&format!("{}/", owner)));
            assert!(key.ends_with(".jpg"));
            assert_eq!(url, &format!("https://cdn.test/{}", key));
        }
        // Random tokens, no collisions.
        assert_ne!(puts[0], puts[1]);
    }

    #[tokio::test]
    async fn one_failed_upload_aborts_and_rolls_back_the_attempt() {
        let storage = RecordingStorage::new(Some(1));
        let st = state_with(storage.clone());
        let owner = Uuid::new_v4();

        let err = upload_images(&st, owner, vec![jpeg(b"a"), jpeg(b"b"), jpeg(b"c")])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Upload(_)));
        let puts = storage.puts.lock().unwrap();
        let deletes = storage.deletes.lock().unwrap();
        // First blob went up, then the abort removed it; nothing after the
        // failure was attempted.
        assert_eq!(puts.len(), 1);
        assert_eq!(*deletes, *puts);
        assert_eq!(storage.attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn ext_follows_the_mime_type() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/gif"), Some("gif"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn unknown_mime_falls_back_to_bin() {
        let owner = Uuid::new_v4();
        let key = object_key(owner, "application/pdf");
        assert!(key.starts_with(&format!("{}/", owner)));
        assert!(key.ends_with(".bin"));
    }
}
