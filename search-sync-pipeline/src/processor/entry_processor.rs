//! Entry processor implementation.
//!
//! Every stage runs over the whole batch and any failure aborts the batch:
//! nothing that failed a stage is ever indexed.

use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::adapter::prefix_documents;
use crate::config::{ConfigResolver, ResolvedTypeConfig};
use crate::errors::SyncError;
use crate::interfaces::EntryTransform;
use search_sync_shared::{EntityType, Entry, EntryKey, IndexDocument, ID_FIELD};

/// Fields never sent to the index.
pub const REDACTED_FIELDS: [&str; 2] = ["createdBy", "updatedBy"];

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn redact(entries: &mut [Entry]) {
    for entry in entries.iter_mut() {
        for field in REDACTED_FIELDS {
            entry.remove(field);
        }
    }
}

/// Log a batch the pipeline refused to index.
pub(crate) fn log_abort(entity_type: &EntityType, err: &SyncError) {
    error!(entity_type = %entity_type, "{}", err);
}

/// Processor turning entries of one entity type into index documents.
#[derive(Clone)]
pub struct EntryProcessor {
    resolver: Arc<ConfigResolver>,
}

impl EntryProcessor {
    pub fn new(resolver: Arc<ConfigResolver>) -> Self {
        Self { resolver }
    }

    /// Process a batch, returning no documents when any stage fails.
    ///
    /// The failure is logged; use [`EntryProcessor::try_process`] to tell an
    /// aborted batch from one whose entries were all filtered out.
    pub async fn process(&self, entity_type: &EntityType, entries: Vec<Entry>) -> Vec<IndexDocument> {
        match self.try_process(entity_type, entries).await {
            Ok(documents) => documents,
            Err(e) => {
                log_abort(entity_type, &e);
                Vec::new()
            }
        }
    }

    /// Process a batch, returning the stage failure that aborted it.
    #[instrument(skip(self, entity_type, entries), fields(entity_type = %entity_type, count = entries.len()))]
    pub async fn try_process(
        &self,
        entity_type: &EntityType,
        entries: Vec<Entry>,
    ) -> Result<Vec<IndexDocument>, SyncError> {
        let config = self.resolver.resolve(entity_type);
        let entries = Self::sanitize_with(&config, entity_type, entries).await?;

        let keyed = entries
            .into_iter()
            .map(|entry| Self::resolve_key(&config, entity_type, &entry).map(|key| (key, entry)))
            .collect::<Result<Vec<_>, SyncError>>()?;

        let documents = prefix_documents(&entity_type.collection_name, keyed);
        debug!(documents = documents.len(), "Processed entries");
        Ok(documents)
    }

    /// Run the transform and filter stages, without key resolution.
    pub async fn sanitize(
        &self,
        entity_type: &EntityType,
        entries: Vec<Entry>,
    ) -> Result<Vec<Entry>, SyncError> {
        let config = self.resolver.resolve(entity_type);
        Self::sanitize_with(&config, entity_type, entries).await
    }

    /// Key of an entry: the configured custom id field, or `id`.
    pub fn key_of(&self, entity_type: &EntityType, entry: &Entry) -> Result<EntryKey, SyncError> {
        let config = self.resolver.resolve(entity_type);
        Self::resolve_key(&config, entity_type, entry)
    }

    async fn sanitize_with(
        config: &ResolvedTypeConfig,
        entity_type: &EntityType,
        entries: Vec<Entry>,
    ) -> Result<Vec<Entry>, SyncError> {
        let mut entries = match &config.transform_entry {
            Some(transform) => Self::apply_transform(transform.as_ref(), entity_type, entries).await?,
            None => entries,
        };

        redact(&mut entries);

        if let Some(transform) = &config.transform_unpublished_entry {
            entries = Self::apply_transform(transform.as_ref(), entity_type, entries).await?;
            redact(&mut entries);
        }
        if !config.entries_query.is_preview() {
            entries.retain(|entry| !entry.is_unpublished());
        }

        if let Some(locale) = config.entries_query.locale_filter() {
            entries.retain(|entry| entry.locale() == Some(locale));
        }

        if let Some(filter) = &config.filter_entry {
            let mut kept = Vec::with_capacity(entries.len());
            for entry in entries {
                let keep = filter
                    .keep(&entry, entity_type)
                    .await
                    .map_err(|e| SyncError::filter(&entity_type.uid, e.to_string()))?;
                if keep {
                    kept.push(entry);
                }
            }
            entries = kept;
        }

        Ok(entries)
    }

    /// Apply `transform` to every entry concurrently, keeping input order.
    async fn apply_transform(
        transform: &dyn EntryTransform,
        entity_type: &EntityType,
        entries: Vec<Entry>,
    ) -> Result<Vec<Entry>, SyncError> {
        let values = try_join_all(
            entries
                .into_iter()
                .map(|entry| transform.transform(entry, entity_type)),
        )
        .await
        .map_err(|e| SyncError::transform(&entity_type.uid, e.to_string()))?;

        values
            .into_iter()
            .enumerate()
            .map(|(position, value)| {
                Entry::try_from(value).map_err(|value| {
                    SyncError::transform(
                        &entity_type.uid,
                        format!(
                            "transform returned {} instead of an object at position {}",
                            json_type(&value),
                            position
                        ),
                    )
                })
            })
            .collect()
    }

    fn resolve_key(
        config: &ResolvedTypeConfig,
        entity_type: &EntityType,
        entry: &Entry,
    ) -> Result<EntryKey, SyncError> {
        let field = config.custom_id.as_deref().unwrap_or(ID_FIELD);
        match entry.get(field) {
            Some(value) => EntryKey::from_value(value).ok_or_else(|| {
                SyncError::custom_id(
                    &entity_type.uid,
                    format!("field {} is {}, not a string or integer", field, json_type(value)),
                )
            }),
            None => Err(SyncError::custom_id(
                &entity_type.uid,
                format!("field {} is missing", field),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntityTypeConfig, SyncConfig};
    use crate::interfaces::{filter_fn, transform_fn, HookError};
    use async_trait::async_trait;
    use std::time::Duration;
    use crate::testing::{article, entry, posts, registry};
    use search_sync_shared::{EntriesQuery, PublicationState};
    use serde_json::json;

    fn processor(config: SyncConfig) -> EntryProcessor {
        let resolver = ConfigResolver::new(Arc::new(config), Arc::new(registry()));
        EntryProcessor::new(Arc::new(resolver))
    }

    fn ids(documents: &[IndexDocument]) -> Vec<&str> {
        documents.iter().map(|d| d.id.as_str()).collect()
    }

    fn mixed_entries() -> Vec<Entry> {
        vec![
            entry(json!({ "id": 1, "publishedAt": "2024-01-01", "locale": "en" })),
            entry(json!({ "id": 2, "publishedAt": null, "locale": "en" })),
            entry(json!({ "id": 3, "publishedAt": "2024-01-02", "locale": "fr" })),
            entry(json!({ "id": 4, "locale": "en" })),
        ]
    }

    #[tokio::test]
    async fn test_drafts_excluded_unless_preview() {
        let live = processor(SyncConfig::new()).process(&posts(), mixed_entries()).await;
        assert_eq!(ids(&live), vec!["posts-1", "posts-3", "posts-4"]);

        let preview_config = SyncConfig::new().with_type(
            "posts",
            EntityTypeConfig::new().with_entries_query(
                EntriesQuery::default().with_publication_state(PublicationState::Preview),
            ),
        );
        let preview = processor(preview_config).process(&posts(), mixed_entries()).await;
        assert_eq!(ids(&preview), vec!["posts-1", "posts-2", "posts-3", "posts-4"]);
    }

    #[tokio::test]
    async fn test_locale_filtering() {
        let config = |locale: &str| {
            SyncConfig::new().with_type(
                "posts",
                EntityTypeConfig::new()
                    .with_entries_query(EntriesQuery::default().with_locale(locale)),
            )
        };

        let english = processor(config("en")).process(&posts(), mixed_entries()).await;
        assert_eq!(ids(&english), vec!["posts-1", "posts-4"]);

        let all = processor(config("all")).process(&posts(), mixed_entries()).await;
        assert_eq!(ids(&all), vec!["posts-1", "posts-3", "posts-4"]);
    }

    #[tokio::test]
    async fn test_redaction_applies_after_transform() {
        let config = SyncConfig::new().with_type(
            "posts",
            EntityTypeConfig::new().with_transform(transform_fn(|entry, _| {
                Ok(Value::from(entry.with("createdBy", json!({ "id": 1 })).with("summary", "s")))
            })),
        );
        let entries = vec![entry(json!({ "id": 1, "updatedBy": { "id": 2 }, "title": "t" }))];

        let documents = processor(config).process(&posts(), entries).await;

        assert_eq!(documents.len(), 1);
        let fields = &documents[0].fields;
        assert!(!fields.contains_key("createdBy"));
        assert!(!fields.contains_key("updatedBy"));
        assert_eq!(fields["summary"], json!("s"));
        assert_eq!(fields["title"], json!("t"));
    }

    #[tokio::test]
    async fn test_redaction_applies_after_unpublished_transform() {
        let config = SyncConfig::new().with_type(
            "posts",
            EntityTypeConfig::new().with_unpublished_transform(transform_fn(|entry, _| {
                Ok(Value::from(
                    entry
                        .with("createdBy", json!({ "email": "a@b.c" }))
                        .with("updatedBy", json!({ "email": "d@e.f" })),
                ))
            })),
        );
        let entries = vec![entry(json!({ "id": 1, "publishedAt": "2024-01-01" }))];

        let documents = processor(config).process(&posts(), entries).await;

        assert_eq!(ids(&documents), vec!["posts-1"]);
        let fields = &documents[0].fields;
        assert!(!fields.contains_key("createdBy"));
        assert!(!fields.contains_key("updatedBy"));
        assert_eq!(fields["publishedAt"], json!("2024-01-01"));
    }

    /// Finishes later entries first: entry `n` takes `100 - 10n` ms.
    struct StaggeredTransform;

    #[async_trait]
    impl EntryTransform for StaggeredTransform {
        async fn transform(&self, entry: Entry, _entity_type: &EntityType) -> Result<Value, HookError> {
            let id = entry.get("id").and_then(Value::as_u64).unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(100 - id * 10)).await;
            Ok(Value::from(entry.with("rendered", true)))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_transform_keeps_input_order() {
        let config = SyncConfig::new().with_type(
            "posts",
            EntityTypeConfig::new().with_transform(Arc::new(StaggeredTransform)),
        );
        let entries = (1..=5).map(|id| entry(json!({ "id": id }))).collect();
        let started = tokio::time::Instant::now();

        let documents = processor(config).process(&posts(), entries).await;

        assert_eq!(
            ids(&documents),
            vec!["posts-1", "posts-2", "posts-3", "posts-4", "posts-5"]
        );
        assert!(documents.iter().all(|d| d.fields["rendered"] == json!(true)));
        // Run one after another, the transforms would take 350 ms.
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_custom_id() {
        let config =
            SyncConfig::new().with_type("article", EntityTypeConfig::new().with_custom_id("slug"));
        let entries = vec![entry(json!({ "id": 42, "slug": "intro" }))];

        let documents = processor(config).process(&article(), entries).await;

        assert_eq!(ids(&documents), vec!["article-intro"]);
    }

    #[tokio::test]
    async fn test_missing_custom_id_aborts() {
        let config =
            SyncConfig::new().with_type("article", EntityTypeConfig::new().with_custom_id("slug"));
        let entries = vec![
            entry(json!({ "id": 1, "slug": "first" })),
            entry(json!({ "id": 2 })),
        ];
        let processor = processor(config);

        let err = processor.try_process(&article(), entries.clone()).await.unwrap_err();
        assert!(matches!(err, SyncError::CustomIdError { .. }));
        assert!(processor.process(&article(), entries).await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_transform_yields_nothing() {
        let config = SyncConfig::new().with_type(
            "posts",
            EntityTypeConfig::new().with_transform(transform_fn(|entry, _| {
                if entry.id() == Some(EntryKey::from(2_i64)) {
                    return Err("cannot render".into());
                }
                Ok(Value::from(entry))
            })),
        );
        let entries = vec![
            entry(json!({ "id": 1 })),
            entry(json!({ "id": 2 })),
            entry(json!({ "id": 3 })),
        ];
        let processor = processor(config);

        assert!(processor.process(&posts(), entries.clone()).await.is_empty());
        let err = processor.try_process(&posts(), entries).await.unwrap_err();
        assert!(matches!(err, SyncError::TransformError { .. }));
        assert!(err.to_string().contains("cannot render"));
    }

    #[tokio::test]
    async fn test_non_object_transform_aborts() {
        let config = SyncConfig::new().with_type(
            "posts",
            EntityTypeConfig::new().with_transform(transform_fn(|_, _| Ok(json!("flat")))),
        );

        let err = processor(config)
            .try_process(&posts(), vec![entry(json!({ "id": 1 }))])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("a string instead of an object"));
    }

    #[tokio::test]
    async fn test_filter_keeps_matching_entries() {
        let config = SyncConfig::new().with_type(
            "posts",
            EntityTypeConfig::new().with_filter(filter_fn(|entry, _| {
                Ok(entry.get("featured") == Some(&json!(true)))
            })),
        );
        let entries = vec![
            entry(json!({ "id": 1, "featured": true })),
            entry(json!({ "id": 2, "featured": false })),
            entry(json!({ "id": 3, "featured": true })),
        ];

        let documents = processor(config).process(&posts(), entries).await;

        assert_eq!(ids(&documents), vec!["posts-1", "posts-3"]);
    }

    #[tokio::test]
    async fn test_filter_error_aborts() {
        let config = SyncConfig::new().with_type(
            "posts",
            EntityTypeConfig::new().with_filter(filter_fn(|_, _| Err("no verdict".into()))),
        );

        let err = processor(config)
            .try_process(&posts(), vec![entry(json!({ "id": 1 }))])
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::FilterError { .. }));
    }

    #[tokio::test]
    async fn test_unpublished_transform_runs_before_draft_filter() {
        // Drafts get a placeholder publication date and are kept.
        let config = SyncConfig::new().with_type(
            "posts",
            EntityTypeConfig::new().with_unpublished_transform(transform_fn(|entry, _| {
                if entry.is_unpublished() {
                    return Ok(Value::from(entry.with("publishedAt", "draft")));
                }
                Ok(Value::from(entry))
            })),
        );

        let documents = processor(config).process(&posts(), mixed_entries()).await;

        assert_eq!(ids(&documents), vec!["posts-1", "posts-2", "posts-3", "posts-4"]);
        assert_eq!(documents[1].fields["publishedAt"], json!("draft"));
    }

    #[tokio::test]
    async fn test_sanitize_and_key_of() {
        let processor = processor(SyncConfig::new());

        let entries = processor
            .sanitize(&posts(), vec![entry(json!({ "id": 5, "createdBy": 1 }))])
            .await
            .unwrap();
        assert_eq!(entries[0].get("createdBy"), None);

        assert_eq!(
            processor.key_of(&posts(), &entries[0]).unwrap(),
            EntryKey::from(5_i64)
        );
        assert!(processor.key_of(&posts(), &Entry::new()).is_err());
    }
}
