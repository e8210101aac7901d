//! Sequential batch conversion.
//!
//! This module provides functionality for:
//! - Converting a list of uploads one after another with shared settings
//! - Isolating per-item failures so siblings still complete
//! - Cooperative cancellation between items
//! - Quota checks before the batch and usage recording after it
//!
//! # Architecture
//!
//! Each item is decoded once (`inspect_source`); the naming preview and the
//! WebP encode both come from that surface. The only suspension points are
//! the naming and quota collaborator calls. Item *i + 1* never starts before item *i* settles.
//!
//! # Examples
//!
//! ```ignore
//! use zoeconvert_core::batch::{BatchConverter, BatchItem, CancelToken};
//!
//! let converter = BatchConverter::new(namer, InMemoryQuota::new(), settings);
//! let report = converter.run(&session, items, &CancelToken::new()).await?;
//! println!("{} converted, {} failed", report.completed(), report.failed());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

use crate::config::ConversionSettings;
use crate::decode::inspect_source;
use crate::encode::{encode_decoded, EncodeError, EncodeResult};
use crate::format::{format_bytes, size_reduction_percent};
use crate::naming::{
    choose_name, compose_file_name, fallback_base_name, ChosenName, NamingPreview, NamingService,
};
use crate::quota::{QuotaError, QuotaService};
use crate::session::SessionContext;

/// Errors that refuse a whole batch before any item is converted.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("No images to convert")]
    Empty,

    #[error("Session expired, please sign in again")]
    SessionExpired,

    #[error("AI naming quota exceeded: {requested} requested, {remaining} remaining")]
    QuotaExceeded { requested: u32, remaining: u32 },

    #[error("Batch of {requested} images exceeds the plan limit of {max}")]
    BatchTooLarge { requested: u32, max: u32 },

    #[error("Invalid conversion settings: {0}")]
    InvalidSettings(#[from] EncodeError),

    #[error(transparent)]
    Quota(#[from] QuotaError),
}

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub file_name: String,
    /// Content type reported by the browser, if any.
    pub declared_type: Option<String>,
    pub bytes: Bytes,
}

impl BatchItem {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            declared_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_declared_type(mut self, mime_type: impl Into<String>) -> Self {
        self.declared_type = Some(mime_type.into());
        self
    }
}

/// Shared flag that stops a batch from starting further items.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A successfully converted item.
#[derive(Debug, Clone)]
pub struct ConvertedImage {
    /// Download name, `<prefix>-<base>.webp`.
    pub file_name: String,
    pub original_size_bytes: u64,
    /// Declared upload type, or the sniffed one.
    pub original_mime_type: String,
    pub original_width: u32,
    pub original_height: u32,
    pub result: EncodeResult,
    pub ai_named: bool,
}

impl ConvertedImage {
    pub fn size_reduction_percent(&self) -> i64 {
        size_reduction_percent(self.original_size_bytes, self.result.size_bytes)
    }

    /// e.g. `"2.4 MB -> 310.5 KB (-87%)"`.
    pub fn size_summary(&self) -> String {
        format!(
            "{} -> {} ({:+}%)",
            format_bytes(self.original_size_bytes, 2),
            format_bytes(self.result.size_bytes, 2),
            -self.size_reduction_percent()
        )
    }
}

#[derive(Debug, Clone)]
pub enum ItemStatus {
    Done(ConvertedImage),
    Failed { message: String },
    /// Not started because the batch was cancelled.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct ItemReport {
    /// Position in the submitted batch.
    pub index: usize,
    pub original_name: String,
    pub status: ItemStatus,
}

/// Outcome of a batch, in submission order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub items: Vec<ItemReport>,
    /// Items whose name came from the naming service.
    pub ai_named: u32,
    /// Whether a usage record was written for this batch.
    pub usage_recorded: bool,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Done(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ItemStatus::Skipped))
    }

    pub fn converted(&self) -> impl Iterator<Item = &ConvertedImage> {
        self.items.iter().filter_map(|item| match &item.status {
            ItemStatus::Done(converted) => Some(converted),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&ItemStatus) -> bool) -> usize {
        self.items.iter().filter(|item| pred(&item.status)).count()
    }
}

/// Converts batches with one settings bundle and one pair of collaborators.
pub struct BatchConverter<N, Q> {
    naming: N,
    quota: Q,
    settings: ConversionSettings,
}

impl<N: NamingService, Q: QuotaService> BatchConverter<N, Q> {
    pub fn new(naming: N, quota: Q, settings: ConversionSettings) -> Self {
        Self {
            naming,
            quota,
            settings,
        }
    }

    pub fn settings(&self) -> &ConversionSettings {
        &self.settings
    }

    pub fn quota(&self) -> &Q {
        &self.quota
    }

    /// Convert `items` in order.
    ///
    /// # Errors
    ///
    /// Only whole-batch refusals are errors: an empty batch, an expired
    /// session, invalid settings, or a quota refusal when AI naming is on.
    /// Per-item failures are reported as `ItemStatus::Failed`.
    pub async fn run(
        &self,
        session: &SessionContext,
        items: Vec<BatchItem>,
        cancel: &CancelToken,
    ) -> Result<BatchReport, BatchError> {
        if items.is_empty() {
            return Err(BatchError::Empty);
        }
        if session.is_expired() {
            return Err(BatchError::SessionExpired);
        }
        self.settings.validate()?;

        let use_ai = self.settings.naming.use_ai;
        let requested = u32::try_from(items.len()).unwrap_or(u32::MAX);
        if use_ai {
            self.ensure_quota(session, requested).await?;
        }

        let mut reports = Vec::with_capacity(items.len());
        let mut ai_named = 0u32;

        for (index, item) in items.into_iter().enumerate() {
            let status = if cancel.is_cancelled() {
                ItemStatus::Skipped
            } else {
                match self.convert_item(&item).await {
                    Ok(converted) => {
                        if converted.ai_named {
                            ai_named += 1;
                        }
                        log::debug!("{} -> {}", item.file_name, converted.file_name);
                        ItemStatus::Done(converted)
                    }
                    Err(e) => {
                        log::warn!("failed to convert {}: {e}", item.file_name);
                        ItemStatus::Failed {
                            message: e.to_string(),
                        }
                    }
                }
            };
            reports.push(ItemReport {
                index,
                original_name: item.file_name,
                status,
            });
        }

        let mut report = BatchReport {
            items: reports,
            ai_named,
            usage_recorded: false,
        };
        report.usage_recorded = self.record_usage(session, &report).await;

        log::info!(
            "batch finished: {} converted, {} failed, {} skipped, {} AI-named",
            report.completed(),
            report.failed(),
            report.skipped(),
            report.ai_named
        );
        Ok(report)
    }

    async fn ensure_quota(&self, session: &SessionContext, requested: u32) -> Result<(), BatchError> {
        let check = self
            .quota
            .check_quota(&session.user_id, requested, true)
            .await?;

        if requested > check.max_batch_size {
            return Err(BatchError::BatchTooLarge {
                requested,
                max: check.max_batch_size,
            });
        }
        if !check.allowed {
            return Err(BatchError::QuotaExceeded {
                requested,
                remaining: check.remaining,
            });
        }
        Ok(())
    }

    async fn convert_item(&self, item: &BatchItem) -> Result<ConvertedImage, EncodeError> {
        let (metadata, surface) = inspect_source(
            item.bytes.clone(),
            &item.file_name,
            item.declared_type.as_deref(),
        )?;
        let preview = self
            .settings
            .naming
            .use_ai
            .then(|| NamingPreview::from_image(&surface));
        let result = encode_decoded(surface, &self.settings.encode)?;
        let chosen = self.pick_name(preview, &item.file_name).await;

        Ok(ConvertedImage {
            file_name: compose_file_name(&self.settings.naming.prefix, &chosen.base_name),
            original_size_bytes: metadata.size_bytes,
            original_mime_type: metadata.mime_type,
            original_width: metadata.width,
            original_height: metadata.height,
            result,
            ai_named: chosen.ai_named,
        })
    }

    /// `preview` is `None` when AI naming is off.
    async fn pick_name(
        &self,
        preview: Option<Result<NamingPreview, EncodeError>>,
        file_name: &str,
    ) -> ChosenName {
        let fallback = || ChosenName {
            base_name: fallback_base_name(file_name),
            ai_named: false,
        };

        match preview {
            None => fallback(),
            Some(Ok(preview)) => {
                choose_name(
                    &self.naming,
                    &preview,
                    self.settings.naming.language,
                    file_name,
                )
                .await
            }
            Some(Err(e)) => {
                log::warn!("no naming preview for {file_name}: {e}; using file name");
                fallback()
            }
        }
    }

    /// AI-named items consume quota; otherwise the batch is logged as free.
    async fn record_usage(&self, session: &SessionContext, report: &BatchReport) -> bool {
        let (count, ai_used) = if report.ai_named > 0 {
            (report.ai_named, true)
        } else {
            (u32::try_from(report.completed()).unwrap_or(u32::MAX), false)
        };
        if count == 0 {
            return false;
        }

        match self
            .quota
            .record_usage(&session.user_id, count, ai_used)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                log::warn!("failed to record usage for {}: {e}", session.user_id);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::{Language, NamingError, NamingOptions};
    use crate::quota::{InMemoryQuota, Plan, QuotaCheck, UserProfile};
    use crate::test_support::{gradient, jpeg_bytes, png_bytes};
    use chrono::{Duration, Utc};
    use std::cell::RefCell;

    /// Names every image after its preview width, and remembers the calls.
    #[derive(Default)]
    struct WidthNamer {
        calls: RefCell<Vec<u32>>,
        cancel_on_first: Option<CancelToken>,
    }

    impl NamingService for WidthNamer {
        async fn suggest_name(
            &self,
            preview: &NamingPreview,
            language: Language,
        ) -> Result<String, NamingError> {
            self.calls.borrow_mut().push(preview.width);
            if let Some(token) = &self.cancel_on_first {
                token.cancel();
            }
            Ok(format!("{} Wide {}", language.as_str(), preview.width))
        }
    }

    struct OfflineNamer;

    impl NamingService for OfflineNamer {
        async fn suggest_name(
            &self,
            _preview: &NamingPreview,
            _language: Language,
        ) -> Result<String, NamingError> {
            Err(NamingError::Timeout)
        }
    }

    /// Allows everything but cannot persist usage.
    struct ReadOnlyQuota;

    impl QuotaService for ReadOnlyQuota {
        async fn check_quota(
            &self,
            _user_id: &str,
            _image_count: u32,
            _ai_requested: bool,
        ) -> Result<QuotaCheck, QuotaError> {
            Ok(QuotaCheck {
                allowed: true,
                remaining: 100,
                limit: 100,
                used: 0,
                max_batch_size: 100,
                plan: Plan::Agency,
            })
        }

        async fn record_usage(
            &self,
            _user_id: &str,
            _image_count: u32,
            _ai_used: bool,
        ) -> Result<(), QuotaError> {
            Err(QuotaError::Unavailable("read-only".to_string()))
        }
    }

    fn settings(use_ai: bool) -> ConversionSettings {
        ConversionSettings {
            naming: NamingOptions {
                use_ai,
                language: Language::English,
                prefix: String::new(),
            },
            ..ConversionSettings::default()
        }
    }

    fn png_item(name: &str, width: u32) -> BatchItem {
        BatchItem::new(name, png_bytes(&gradient(width, 8))).with_declared_type("image/png")
    }

    fn session() -> SessionContext {
        SessionContext::issue("user-1")
    }

    #[tokio::test]
    async fn test_items_processed_in_order() {
        let converter = BatchConverter::new(WidthNamer::default(), InMemoryQuota::new(), settings(true));
        let items = vec![png_item("a.png", 8), png_item("b.png", 16), png_item("c.png", 24)];

        let report = converter.run(&session(), items, &CancelToken::new()).await.unwrap();

        assert_eq!(*converter.naming.calls.borrow(), vec![8, 16, 24]);
        assert_eq!(report.completed(), 3);
        let names: Vec<_> = report.converted().map(|c| c.file_name.clone()).collect();
        assert_eq!(
            names,
            vec!["english-wide-8.webp", "english-wide-16.webp", "english-wide-24.webp"]
        );
        assert!(report.items.iter().enumerate().all(|(i, item)| item.index == i));
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let converter = BatchConverter::new(WidthNamer::default(), InMemoryQuota::new(), settings(false));
        let items = vec![
            png_item("good.png", 8),
            BatchItem::new("broken.jpg", &b"\xFF\xD8\xFF\xE0 truncated"[..]),
            BatchItem::new("empty.png", Vec::<u8>::new()),
            png_item("also-good.png", 16),
        ];

        let report = converter.run(&session(), items, &CancelToken::new()).await.unwrap();

        assert_eq!(report.completed(), 2);
        assert_eq!(report.failed(), 2);
        match &report.items[2].status {
            ItemStatus::Failed { message } => assert_eq!(message, "Image file is empty"),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(matches!(report.items[3].status, ItemStatus::Done(_)));
    }

    #[tokio::test]
    async fn test_without_ai_uses_file_name_and_prefix() {
        let mut settings = settings(false);
        settings.naming.prefix = "Mi Tienda".to_string();
        let converter = BatchConverter::new(WidthNamer::default(), InMemoryQuota::new(), settings);

        let item = BatchItem::new("Foto Playa.jpg", jpeg_bytes(&gradient(32, 16)));
        let report = converter.run(&session(), vec![item], &CancelToken::new()).await.unwrap();

        let converted = report.converted().next().unwrap();
        assert_eq!(converted.file_name, "mi-tienda-foto-playa.webp");
        assert!(!converted.ai_named);
        assert!(converter.naming.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_preview_and_encode_share_one_decode() {
        let converter = BatchConverter::new(WidthNamer::default(), InMemoryQuota::new(), settings(true));
        let items = vec![
            png_item("wide.png", 600),
            BatchItem::new("photo.jpg", jpeg_bytes(&gradient(40, 20))),
        ];

        let report = converter.run(&session(), items, &CancelToken::new()).await.unwrap();
        let converted: Vec<_> = report.converted().collect();

        assert_eq!(*converter.naming.calls.borrow(), vec![512, 40]);
        assert_eq!((converted[0].original_width, converted[0].original_height), (600, 8));
        assert_eq!(converted[0].original_mime_type, "image/png");
        assert_eq!((converted[0].result.width, converted[0].result.height), (600, 8));
        assert_eq!(converted[1].original_mime_type, "image/jpeg");
        assert_eq!(converted[1].file_name, "english-wide-40.webp");
    }

    #[tokio::test]
    async fn test_naming_failure_falls_back() {
        let converter = BatchConverter::new(OfflineNamer, InMemoryQuota::new(), settings(true));
        let report = converter
            .run(&session(), vec![png_item("IMG_0042.png", 8)], &CancelToken::new())
            .await
            .unwrap();

        let converted = report.converted().next().unwrap();
        assert_eq!(converted.file_name, "img-0042.webp");
        assert_eq!(report.ai_named, 0);
    }

    #[tokio::test]
    async fn test_cancel_skips_remaining_items() {
        let cancel = CancelToken::new();
        let namer = WidthNamer {
            cancel_on_first: Some(cancel.clone()),
            ..WidthNamer::default()
        };
        let converter = BatchConverter::new(namer, InMemoryQuota::new(), settings(true));
        let items = vec![png_item("a.png", 8), png_item("b.png", 16), png_item("c.png", 24)];

        let report = converter.run(&session(), items, &cancel).await.unwrap();

        assert_eq!(report.completed(), 1);
        assert_eq!(report.skipped(), 2);
        assert_eq!(*converter.naming.calls.borrow(), vec![8]);
    }

    #[tokio::test]
    async fn test_refuses_empty_and_expired() {
        let converter = BatchConverter::new(WidthNamer::default(), InMemoryQuota::new(), settings(false));

        let empty = converter.run(&session(), Vec::new(), &CancelToken::new()).await;
        assert!(matches!(empty, Err(BatchError::Empty)));

        let expired = SessionContext::new("user-1", Utc::now() - Duration::minutes(1));
        let result = converter
            .run(&expired, vec![png_item("a.png", 8)], &CancelToken::new())
            .await;
        assert!(matches!(result, Err(BatchError::SessionExpired)));
    }

    #[tokio::test]
    async fn test_refuses_invalid_settings() {
        let mut settings = settings(false);
        settings.encode.target_width = Some(0);
        let converter = BatchConverter::new(WidthNamer::default(), InMemoryQuota::new(), settings);

        let result = converter
            .run(&session(), vec![png_item("a.png", 8)], &CancelToken::new())
            .await;
        assert!(matches!(result, Err(BatchError::InvalidSettings(_))));
    }

    #[tokio::test]
    async fn test_quota_refusals() {
        let quota = InMemoryQuota::new();
        let mut profile = UserProfile::new("user-1", Plan::Starter, Utc::now());
        profile.ai_conversions_used = 49;
        quota.insert_profile(profile);
        let converter = BatchConverter::new(WidthNamer::default(), quota, settings(true));

        let too_many: Vec<_> = (0..6).map(|i| png_item(&format!("{i}.png"), 8)).collect();
        let result = converter.run(&session(), too_many, &CancelToken::new()).await;
        assert!(matches!(
            result,
            Err(BatchError::BatchTooLarge { requested: 6, max: 5 })
        ));

        let two = vec![png_item("a.png", 8), png_item("b.png", 8)];
        let result = converter.run(&session(), two, &CancelToken::new()).await;
        assert!(matches!(
            result,
            Err(BatchError::QuotaExceeded {
                requested: 2,
                remaining: 1
            })
        ));
        assert!(converter.naming.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_quota_ignored_without_ai() {
        let quota = InMemoryQuota::new();
        let mut profile = UserProfile::new("user-1", Plan::Starter, Utc::now());
        profile.ai_conversions_used = 50;
        quota.insert_profile(profile);
        let converter = BatchConverter::new(WidthNamer::default(), quota, settings(false));

        let items: Vec<_> = (0..6).map(|i| png_item(&format!("{i}.png"), 8)).collect();
        let report = converter.run(&session(), items, &CancelToken::new()).await.unwrap();
        assert_eq!(report.completed(), 6);
    }

    #[tokio::test]
    async fn test_usage_recorded_for_ai_names() {
        let converter = BatchConverter::new(WidthNamer::default(), InMemoryQuota::new(), settings(true));
        let items = vec![png_item("a.png", 8), png_item("b.png", 16)];

        let report = converter.run(&session(), items, &CancelToken::new()).await.unwrap();

        assert!(report.usage_recorded);
        assert_eq!(report.ai_named, 2);
        let profile = converter.quota().profile("user-1").unwrap();
        assert_eq!(profile.ai_conversions_used, 2);
        let history = converter.quota().history("user-1", 10);
        assert_eq!(history.len(), 1);
        assert!(history[0].ai_used);
    }

    #[tokio::test]
    async fn test_usage_recorded_as_free_without_ai() {
        let converter = BatchConverter::new(WidthNamer::default(), InMemoryQuota::new(), settings(false));
        let report = converter
            .run(&session(), vec![png_item("a.png", 8)], &CancelToken::new())
            .await
            .unwrap();

        assert!(report.usage_recorded);
        let history = converter.quota().history("user-1", 10);
        assert_eq!(history[0].file_count, 1);
        assert!(!history[0].ai_used);
        // Free conversions never touch the AI allowance.
        assert!(converter.quota().profile("user-1").is_none());
    }

    #[tokio::test]
    async fn test_nothing_recorded_when_all_fail() {
        let converter = BatchConverter::new(WidthNamer::default(), InMemoryQuota::new(), settings(false));
        let report = converter
            .run(&session(), vec![BatchItem::new("x.png", Vec::<u8>::new())], &CancelToken::new())
            .await
            .unwrap();

        assert!(!report.usage_recorded);
        assert!(converter.quota().history("user-1", 10).is_empty());
    }

    #[tokio::test]
    async fn test_usage_failure_is_not_fatal() {
        let converter = BatchConverter::new(WidthNamer::default(), ReadOnlyQuota, settings(true));
        let report = converter
            .run(&session(), vec![png_item("a.png", 8)], &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(report.completed(), 1);
        assert!(!report.usage_recorded);
    }

    #[test]
    fn test_size_summary() {
        let converted = ConvertedImage {
            file_name: "a.webp".to_string(),
            original_size_bytes: 4096,
            original_mime_type: "image/png".to_string(),
            original_width: 10,
            original_height: 10,
            result: EncodeResult {
                payload: vec![0; 1024],
                size_bytes: 1024,
                width: 10,
                height: 10,
                quality: 0.9,
                attempts: Vec::new(),
            },
            ai_named: false,
        };
        assert_eq!(converted.size_reduction_percent(), 75);
        assert_eq!(converted.size_summary(), "4 KB -> 1 KB (-75%)");
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
