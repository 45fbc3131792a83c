use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

/// Wraps a store and counts calls that actually wrote.
struct CountingStore {
    inner: FsBlobStore,
    writes: AtomicUsize,
}

#[async_trait]
impl BlobStore for CountingStore {
    async fn put_if_absent(&self, name: &str, bytes: &[u8]) -> Result<bool, UploadError> {
        let wrote = self.inner.put_if_absent(name, bytes).await?;
        if wrote {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(wrote)
    }
}

fn service_in(dir: &Path) -> (UploadService, Arc<CountingStore>) {
    let store = Arc::new(CountingStore { inner: FsBlobStore::new(dir), writes: AtomicUsize::new(0) });
    (UploadService::new(store.clone(), "http://localhost:3000"), store)
}

fn files_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

// =============================================================================
// dedup
// =============================================================================

#[tokio::test]
async fn identical_uploads_share_url_and_write_once() {
    let dir = tempfile::tempdir().unwrap();
    let (svc, store) = service_in(dir.path());

    let first = svc.upload(PNG_BYTES, Some("holiday.png"), Some("image/png")).await.unwrap();
    let second = svc.upload(PNG_BYTES, Some("copy.PNG"), Some("image/png")).await.unwrap();

    assert_eq!(first.url, second.url);
    assert!(first.newly_stored);
    assert!(!second.newly_stored);
    assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    assert_eq!(files_in(dir.path()), 1);
}

#[tokio::test]
async fn different_bytes_get_different_urls() {
    let dir = tempfile::tempdir().unwrap();
    let (svc, store) = service_in(dir.path());

    let a = svc.upload(b"image-a", Some("a.jpg"), Some("image/jpeg")).await.unwrap();
    let b = svc.upload(b"image-b", Some("b.jpg"), Some("image/jpeg")).await.unwrap();

    assert_ne!(a.url, b.url);
    assert_eq!(store.writes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_identical_uploads_write_once() {
    let dir = tempfile::tempdir().unwrap();
    let (svc, store) = service_in(dir.path());

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let svc = svc.clone();
            tokio::spawn(async move { svc.upload(PNG_BYTES, Some("x.png"), Some("image/png")).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(store.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stored_file_holds_the_uploaded_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let (svc, _) = service_in(dir.path());
    let stored = svc.upload(PNG_BYTES, Some("p.png"), Some("image/png")).await.unwrap();
    let on_disk = std::fs::read(dir.path().join(&stored.file_name)).unwrap();
    assert_eq!(on_disk, PNG_BYTES);
    assert_eq!(stored.url, format!("http://localhost:3000/uploads/{}", stored.file_name));
}

// =============================================================================
// validation
// =============================================================================

#[tokio::test]
async fn non_image_mime_is_rejected_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let (svc, store) = service_in(dir.path());
    let err = svc.upload(b"%PDF-1.7", Some("doc.pdf"), Some("application/pdf")).await.unwrap_err();
    assert!(matches!(err, UploadError::UnsupportedMediaType));
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_mime_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (svc, _) = service_in(dir.path());
    let err = svc.upload(PNG_BYTES, Some("p.png"), None).await.unwrap_err();
    assert!(matches!(err, UploadError::UnsupportedMediaType));
}

#[tokio::test]
async fn empty_body_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (svc, _) = service_in(dir.path());
    let err = svc.upload(&[], Some("p.png"), Some("image/png")).await.unwrap_err();
    assert!(matches!(err, UploadError::Empty));
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (svc, store) = service_in(dir.path());
    let big = vec![0_u8; MAX_UPLOAD_BYTES + 1];
    let err = svc.upload(&big, Some("big.png"), Some("image/png")).await.unwrap_err();
    assert!(matches!(err, UploadError::TooLarge));
    assert_eq!(store.writes.load(Ordering::SeqCst), 0);
}

// =============================================================================
// naming
// =============================================================================

#[test]
fn content_file_name_is_sha256_plus_lowercase_extension() {
    // sha256("abc")
    let expected = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
    assert_eq!(content_file_name(b"abc", Some("Photo.JPG")), format!("{expected}.jpg"));
    assert_eq!(content_file_name(b"abc", None), expected);
}

#[test]
fn content_file_name_drops_unsafe_extensions() {
    let bare = content_file_name(b"abc", None);
    assert_eq!(content_file_name(b"abc", Some("evil.p/ng")), bare);
    assert_eq!(content_file_name(b"abc", Some("noext")), bare);
    assert_eq!(content_file_name(b"abc", Some("x.thisiswaytoolong")), bare);
}

#[test]
fn bytes_to_hex_pads_each_byte() {
    assert_eq!(bytes_to_hex(&[0x0a, 0xff, 0x00]), "0aff00");
    assert_eq!(bytes_to_hex(&[]), "");
}
