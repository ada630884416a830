//! The upload engine.

use atelier_core::models::{AttachmentRef, ErrorAccumulator, NewAttachment};
use atelier_core::UploadLimits;
use atelier_db::AttachmentRepository;
use atelier_storage::{generate_storage_key, Storage, StorageError};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::ImageReader;
use std::io::Cursor;
use std::sync::Arc;
use uuid::Uuid;

use super::error::UploadError;
use super::filename::{candidate_name, fallback_name};
use super::types::{TransportError, UploadFile, ValidatedImage};
use crate::image::{correct_extension, extension_of, normalize_jpeg_orientation, sniff, ImageKind};
use crate::limits::SizeCeiling;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Source of the wall-clock time mixed into generated filenames
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Result of storing a batch of gallery files
#[derive(Debug, Default)]
pub struct GalleryOutcome {
    /// Newly stored attachments, in submission order
    pub attachments: Vec<AttachmentRef>,
    /// Previously stored ids followed by the new ones
    pub gallery_ids: Vec<Uuid>,
    /// One entry per rejected file
    pub errors: ErrorAccumulator,
}

/// Validates uploaded images and stores the accepted ones as attachments
pub struct UploadEngine {
    storage: Arc<dyn Storage>,
    attachments: Arc<dyn AttachmentRepository>,
    ceiling: SizeCeiling,
    max_attempts: u32,
    clock: Clock,
}

impl UploadEngine {
    pub fn new(
        storage: Arc<dyn Storage>,
        attachments: Arc<dyn AttachmentRepository>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            storage,
            attachments,
            ceiling: SizeCeiling::new(limits),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            clock: Arc::new(Utc::now),
        }
    }

    /// Cap on content-addressed name candidates before falling back to a random name
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn ceiling(&self) -> &SizeCeiling {
        &self.ceiling
    }

    /// Run the intake checks on one file, in order, stopping at the first failure.
    ///
    /// `Ok(None)` means the slot was empty and nothing was submitted.
    pub async fn validate(&self, file: &UploadFile) -> Result<Option<ValidatedImage>, UploadError> {
        if file.is_empty_slot() {
            return Ok(None);
        }

        let name = display_name(file);

        match file.transport_error {
            TransportError::ExceedsLimit => {
                return Err(UploadError::TooLarge {
                    name,
                    limit: self.ceiling.describe(),
                })
            }
            TransportError::Partial => return Err(UploadError::Incomplete { name }),
            TransportError::Ok | TransportError::NoFile => {}
        }

        let kind = sniff(&file.data).ok_or_else(|| UploadError::UnsupportedFormat {
            name: name.clone(),
        })?;

        let corrected_name = correct_extension(&name, kind);
        if corrected_name != name {
            tracing::debug!(
                original = %name,
                corrected = %corrected_name,
                declared_mime = %file.declared_mime,
                detected_mime = kind.mime_type(),
                "Corrected upload extension to match content"
            );
        }

        // Image decode is CPU-bound; run off the async pool to avoid blocking other tasks.
        let data = file.data.clone();
        let dimensions = tokio::task::spawn_blocking(move || read_dimensions(&data, kind))
            .await
            .map_err(|e| UploadError::Internal(e.to_string()))?;
        let (width, height) = dimensions.ok_or_else(|| UploadError::Unreadable {
            name: name.clone(),
        })?;

        if self.ceiling.exceeds(file.size()) {
            return Err(UploadError::TooLarge {
                name,
                limit: self.ceiling.describe(),
            });
        }

        Ok(Some(ValidatedImage {
            original_name: name,
            corrected_name,
            declared_mime: file.declared_mime.clone(),
            kind,
            width,
            height,
            data: file.data.clone(),
        }))
    }

    /// Validate and store one file as an attachment of `parent_id`.
    ///
    /// `Ok(None)` signals the empty-slot no-op.
    #[tracing::instrument(skip(self, file), fields(parent_id = %parent_id, file_name = %file.name))]
    pub async fn store_single(
        &self,
        parent_id: Uuid,
        file: &UploadFile,
    ) -> Result<Option<AttachmentRef>, UploadError> {
        match self.validate(file).await? {
            None => Ok(None),
            Some(image) => self.store_validated(parent_id, image).await.map(Some),
        }
    }

    /// Store every file independently; one file's failure never stops the rest.
    ///
    /// `existing_ids` are placed ahead of the new attachments in `gallery_ids`.
    #[tracing::instrument(skip(self, files, existing_ids), fields(parent_id = %parent_id, files = files.len()))]
    pub async fn store_gallery(
        &self,
        parent_id: Uuid,
        files: &[UploadFile],
        existing_ids: &[Uuid],
    ) -> GalleryOutcome {
        let mut outcome = GalleryOutcome::default();

        for file in files {
            match self.store_single(parent_id, file).await {
                Ok(Some(attachment)) => outcome.attachments.push(attachment),
                Ok(None) => {}
                Err(err) => {
                    log_rejection(&err, file);
                    outcome.errors.push(err.category(), err.client_message());
                }
            }
        }

        for id in existing_ids
            .iter()
            .copied()
            .chain(outcome.attachments.iter().map(|a| a.id))
        {
            if !outcome.gallery_ids.contains(&id) {
                outcome.gallery_ids.push(id);
            }
        }

        outcome
    }

    async fn store_validated(
        &self,
        parent_id: Uuid,
        image: ValidatedImage,
    ) -> Result<AttachmentRef, UploadError> {
        let start = std::time::Instant::now();
        let hashed_size = image.data.len() as u64;
        let (data, width, height) = self.normalize(&image).await;

        let extension = extension_of(&image.corrected_name)
            .unwrap_or_else(|| image.kind.canonical_extension().to_string());
        let file_size = data.len() as i64;

        let (filename, storage_key, storage_url) = self
            .write_unique(
                hashed_size,
                &image.original_name,
                &extension,
                image.mime_type(),
                data.to_vec(),
            )
            .await?;

        let new = NewAttachment {
            parent_id,
            filename: filename.clone(),
            original_filename: image.original_name.clone(),
            storage_key: storage_key.clone(),
            storage_url,
            declared_mime: image.declared_mime.clone(),
            mime_type: image.mime_type().to_string(),
            file_size,
            width: width as i32,
            height: height as i32,
        };

        let attachment = match self.attachments.register(&new).await {
            Ok(attachment) => attachment,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    storage_key = %storage_key,
                    "Failed to register attachment, removing stored file"
                );
                if let Err(cleanup) = self.storage.delete(&storage_key).await {
                    tracing::warn!(
                        error = %cleanup,
                        storage_key = %storage_key,
                        "Failed to remove stored file after registration failure"
                    );
                }
                return Err(UploadError::Storage(e.to_string()));
            }
        };

        tracing::info!(
            attachment_id = %attachment.id,
            filename = %filename,
            mime_type = %attachment.mime_type,
            file_size = file_size,
            width = width,
            height = height,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Attachment stored"
        );

        Ok(AttachmentRef::from(&attachment))
    }

    /// Best-effort orientation fix for JPEGs. Failures keep the original bytes.
    async fn normalize(&self, image: &ValidatedImage) -> (Bytes, u32, u32) {
        let original = (image.data.clone(), image.width, image.height);
        if image.kind != ImageKind::Jpeg {
            return original;
        }

        let data = image.data.clone();
        match tokio::task::spawn_blocking(move || normalize_jpeg_orientation(&data)).await {
            Ok(Ok(Some((bytes, (width, height))))) => (Bytes::from(bytes), width, height),
            Ok(Ok(None)) => original,
            Ok(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    file_name = %image.original_name,
                    "Could not normalize JPEG orientation, keeping original"
                );
                original
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    file_name = %image.original_name,
                    "Orientation task failed, keeping original"
                );
                original
            }
        }
    }

    /// Write `data` under a name nobody else holds, regenerating on collision.
    ///
    /// Returns (filename, storage_key, storage_url).
    async fn write_unique(
        &self,
        size: u64,
        original_name: &str,
        extension: &str,
        mime_type: &str,
        data: Vec<u8>,
    ) -> Result<(String, String, String), UploadError> {
        for attempt in 1..=self.max_attempts {
            let filename = candidate_name(size, original_name, (self.clock)(), extension);
            let key = generate_storage_key(&filename);

            match self.storage.exists(&key).await {
                Ok(true) => {
                    tracing::debug!(attempt = attempt, filename = %filename, "Filename taken, regenerating");
                    continue;
                }
                Ok(false) => {}
                Err(e) => return Err(UploadError::Storage(e.to_string())),
            }

            match self.storage.upload(&filename, mime_type, data.clone()).await {
                Ok((key, url)) => return Ok((filename, key, url)),
                Err(StorageError::AlreadyExists(_)) => {
                    tracing::debug!(attempt = attempt, filename = %filename, "Lost filename race, regenerating");
                }
                Err(e) => return Err(UploadError::Storage(e.to_string())),
            }
        }

        let filename = fallback_name(extension);
        tracing::warn!(
            attempts = self.max_attempts,
            filename = %filename,
            "Filename candidates exhausted, using random name"
        );

        let (key, url) = self
            .storage
            .upload(&filename, mime_type, data)
            .await
            .map_err(|e| UploadError::Storage(e.to_string()))?;
        Ok((filename, key, url))
    }
}

fn display_name(file: &UploadFile) -> String {
    let name = file.name.trim();
    if name.is_empty() {
        "Untitled file".to_string()
    } else {
        name.to_string()
    }
}

fn read_dimensions(data: &[u8], kind: ImageKind) -> Option<(u32, u32)> {
    let reader = ImageReader::with_format(Cursor::new(data), kind.image_format());
    match reader.into_dimensions() {
        Ok((width, height)) if width > 0 && height > 0 => Some((width, height)),
        _ => None,
    }
}

fn log_rejection(err: &UploadError, file: &UploadFile) {
    match err {
        UploadError::Storage(_) | UploadError::Internal(_) => {
            tracing::error!(error = %err, file_name = %file.name, "Gallery upload failed")
        }
        _ => tracing::debug!(error = %err, file_name = %file.name, "Gallery file rejected"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{jpeg_with_orientation, png, unreadable_png};
    use atelier_db::InMemoryStore;
    use atelier_storage::{LocalStorage, StorageResult};
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{tempdir, TempDir};

    struct Harness {
        _dir: TempDir,
        storage: Arc<LocalStorage>,
        store: InMemoryStore,
    }

    async fn harness() -> Harness {
        let dir = tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:3000/files".to_string())
            .await
            .unwrap();
        Harness {
            _dir: dir,
            storage: Arc::new(storage),
            store: InMemoryStore::new(),
        }
    }

    fn engine(h: &Harness) -> UploadEngine {
        UploadEngine::new(
            h.storage.clone(),
            Arc::new(h.store.clone()),
            UploadLimits::from_megabytes(8, 8, 128),
        )
    }

    fn sequence_clock(times: Vec<DateTime<Utc>>) -> Clock {
        let next = Arc::new(AtomicUsize::new(0));
        Arc::new(move || {
            let i = next.fetch_add(1, Ordering::SeqCst);
            times[i.min(times.len() - 1)]
        })
    }

    fn t(seconds: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, seconds).unwrap()
    }

    #[tokio::test]
    async fn test_empty_slot_is_a_no_op() {
        let h = harness().await;
        let result = engine(&h)
            .store_single(Uuid::new_v4(), &UploadFile::empty())
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(h.store.attachment_count().await, 0);
    }

    #[tokio::test]
    async fn test_store_single_png() {
        let h = harness().await;
        let parent = Uuid::new_v4();
        let file = UploadFile::new("Sketch.PNG", "image/png", png(6, 3));

        let attachment = engine(&h).store_single(parent, &file).await.unwrap().unwrap();

        assert!(attachment.filename.ends_with(".png"));
        assert!(h
            .storage
            .exists(&generate_storage_key(&attachment.filename))
            .await
            .unwrap());

        let stored = AttachmentRepository::list_for_parent(&h.store, parent)
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].width, 6);
        assert_eq!(stored[0].height, 3);
        assert_eq!(stored[0].mime_type, "image/png");
        assert_eq!(stored[0].original_filename, "Sketch.PNG");
    }

    #[tokio::test]
    async fn test_declared_type_is_not_trusted() {
        let h = harness().await;
        let file = UploadFile::new("holiday.photo.gif", "image/gif", png(2, 2));

        let validated = engine(&h).validate(&file).await.unwrap().unwrap();
        assert_eq!(validated.kind, ImageKind::Png);
        assert_eq!(validated.corrected_name, "holiday.photo.png");
        assert_eq!(validated.mime_type(), "image/png");
        assert_eq!(validated.declared_mime, "image/gif");
    }

    #[tokio::test]
    async fn test_revalidating_corrected_file_is_stable() {
        let h = harness().await;
        let engine = engine(&h);
        let first = engine
            .validate(&UploadFile::new("scan.jpeg", "image/jpeg", png(2, 2)))
            .await
            .unwrap()
            .unwrap();

        let again = engine
            .validate(&UploadFile::new(
                first.corrected_name.clone(),
                first.mime_type(),
                first.data.clone(),
            ))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(again.corrected_name, first.corrected_name);
        assert_eq!(again.kind, first.kind);
        assert_eq!((again.width, again.height), (first.width, first.height));
    }

    #[tokio::test]
    async fn test_rejects_unsupported_format() {
        let h = harness().await;
        let file = UploadFile::new("notes.png", "image/png", b"%PDF-1.7".to_vec());
        let err = engine(&h).store_single(Uuid::new_v4(), &file).await.unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedFormat { ref name } if name == "notes.png"));
    }

    #[tokio::test]
    async fn test_rejects_unreadable_image() {
        let h = harness().await;
        let file = UploadFile::new("broken.png", "image/png", unreadable_png());
        let err = engine(&h).store_single(Uuid::new_v4(), &file).await.unwrap_err();
        assert!(matches!(err, UploadError::Unreadable { .. }));
        assert_eq!(h.store.attachment_count().await, 0);
    }

    #[tokio::test]
    async fn test_transport_limit_names_the_ceiling() {
        let h = harness().await;
        let mut file = UploadFile::new("big.png", "image/png", png(2, 2));
        file.transport_error = TransportError::ExceedsLimit;

        let err = engine(&h).store_single(Uuid::new_v4(), &file).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "big.png exceeds the maximum upload size for this site (8 MB)."
        );
    }

    #[tokio::test]
    async fn test_secondary_size_check() {
        let h = harness().await;
        let engine = UploadEngine::new(
            h.storage.clone(),
            Arc::new(h.store.clone()),
            UploadLimits {
                upload_max_filesize: 64,
                post_max_size: 0,
                memory_limit: 0,
            },
        );
        let file = UploadFile::new("wide.png", "image/png", png(64, 64));
        assert!(file.size() > 64);

        let err = engine.store_single(Uuid::new_v4(), &file).await.unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn test_gallery_partial_failure() {
        let h = harness().await;
        let parent = Uuid::new_v4();
        let existing = vec![Uuid::new_v4(), Uuid::new_v4()];
        let files = vec![
            UploadFile::new("one.png", "image/png", png(2, 2)),
            UploadFile::new("two.png", "image/png", unreadable_png()),
            UploadFile::new("three.png", "image/png", png(3, 3)),
        ];

        let outcome = engine(&h).store_gallery(parent, &files, &existing).await;

        assert_eq!(outcome.attachments.len(), 2);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors.images[0].contains("two.png"));
        assert_eq!(h.store.attachment_count().await, 2);

        let mut expected = existing.clone();
        expected.extend(outcome.attachments.iter().map(|a| a.id));
        assert_eq!(outcome.gallery_ids, expected);
    }

    #[tokio::test]
    async fn test_collision_moves_to_next_candidate() {
        let h = harness().await;
        let data = png(4, 4);
        let size = data.len() as u64;
        let first = candidate_name(size, "dup.png", t(1), "png");
        let second = candidate_name(size, "dup.png", t(2), "png");
        h.storage
            .upload(&first, "image/png", b"someone else".to_vec())
            .await
            .unwrap();

        let engine = engine(&h).with_clock(sequence_clock(vec![t(1), t(2)]));
        let attachment = engine
            .store_single(Uuid::new_v4(), &UploadFile::new("dup.png", "image/png", data))
            .await
            .unwrap()
            .unwrap();

        assert_ne!(attachment.filename, first);
        assert_eq!(attachment.filename, second);
    }

    #[tokio::test]
    async fn test_stored_name_hashes_the_uploaded_base_name() {
        let h = harness().await;
        let data = png(3, 3);
        let size = data.len() as u64;
        let expected = candidate_name(size, "scans/holiday.gif", t(3), "png");
        let from_corrected = candidate_name(size, "holiday.png", t(3), "png");

        let engine = engine(&h).with_clock(sequence_clock(vec![t(3)]));
        let attachment = engine
            .store_single(
                Uuid::new_v4(),
                &UploadFile::new("scans/holiday.gif", "image/gif", data),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(attachment.filename, expected);
        assert_ne!(attachment.filename, from_corrected);
    }

    /// Reports every name as free, as a concurrent writer would have seen it
    struct RacingStorage(Arc<LocalStorage>);

    #[async_trait::async_trait]
    impl Storage for RacingStorage {
        async fn upload(
            &self,
            filename: &str,
            content_type: &str,
            data: Vec<u8>,
        ) -> StorageResult<(String, String)> {
            self.0.upload(filename, content_type, data).await
        }

        async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
            self.0.download(storage_key).await
        }

        async fn delete(&self, storage_key: &str) -> StorageResult<()> {
            self.0.delete(storage_key).await
        }

        async fn exists(&self, _storage_key: &str) -> StorageResult<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_lost_race_is_treated_as_collision() {
        let h = harness().await;
        let data = png(4, 4);
        let first = candidate_name(data.len() as u64, "race.png", t(1), "png");
        h.storage
            .upload(&first, "image/png", b"winner".to_vec())
            .await
            .unwrap();

        let engine = UploadEngine::new(
            Arc::new(RacingStorage(h.storage.clone())),
            Arc::new(h.store.clone()),
            UploadLimits::from_megabytes(8, 8, 128),
        )
        .with_clock(sequence_clock(vec![t(1), t(2)]));

        let attachment = engine
            .store_single(Uuid::new_v4(), &UploadFile::new("race.png", "image/png", data))
            .await
            .unwrap()
            .unwrap();
        assert_ne!(attachment.filename, first);
        let winner = h.storage.download(&generate_storage_key(&first)).await.unwrap();
        assert_eq!(winner, b"winner".to_vec());
    }

    #[tokio::test]
    async fn test_exhausted_candidates_fall_back_to_random_name() {
        let h = harness().await;
        let data = png(4, 4);
        let frozen = candidate_name(data.len() as u64, "same.png", t(5), "png");
        h.storage
            .upload(&frozen, "image/png", b"taken".to_vec())
            .await
            .unwrap();

        let engine = engine(&h)
            .with_clock(sequence_clock(vec![t(5)]))
            .with_max_attempts(3);
        let attachment = engine
            .store_single(Uuid::new_v4(), &UploadFile::new("same.png", "image/png", data))
            .await
            .unwrap()
            .unwrap();

        assert_ne!(attachment.filename, frozen);
        assert!(attachment.filename.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_registration_failure_removes_stored_bytes() {
        let h = harness().await;
        h.store.fail_operation("register").await;
        let data = png(4, 4);
        let name = candidate_name(data.len() as u64, "orphan.png", t(7), "png");

        let engine = engine(&h).with_clock(sequence_clock(vec![t(7)]));
        let err = engine
            .store_single(Uuid::new_v4(), &UploadFile::new("orphan.png", "image/png", data))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Storage(_)));
        assert!(!h.storage.exists(&generate_storage_key(&name)).await.unwrap());
    }

    #[tokio::test]
    async fn test_jpeg_orientation_is_normalized() {
        let h = harness().await;
        let parent = Uuid::new_v4();
        let file = UploadFile::new("portrait.jpg", "image/jpeg", jpeg_with_orientation(8, 4, 6));

        engine(&h).store_single(parent, &file).await.unwrap().unwrap();

        let stored = AttachmentRepository::list_for_parent(&h.store, parent)
            .await
            .unwrap();
        assert_eq!((stored[0].width, stored[0].height), (4, 8));
        let bytes = h.storage.download(&stored[0].storage_key).await.unwrap();
        assert_eq!(crate::image::read_exif_orientation(&bytes), None);
    }
}
