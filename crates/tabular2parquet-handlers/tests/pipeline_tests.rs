// Pipeline tests against in-memory storage and catalog
//
// Exercises the complete orchestration for both functions: key parsing,
// load, date detection, partition layout, catalog ordering, and the
// overwrite (idempotence) guarantee.

use arrow::array::{Array, Int64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use std::sync::Arc;
use tabular2parquet_catalog::MemoryCatalog;
use tabular2parquet_core::codec::{read_parquet, write_parquet, CompressionCodec};
use tabular2parquet_core::dates::{DateDetection, DateError};
use tabular2parquet_core::key::{KeyError, PathAnchor, PathConvention};
use tabular2parquet_core::partition::PartitionError;
use tabular2parquet_core::OnUnparseableDate;
use tabular2parquet_handlers::{PipelineError, TransformContext, TransformSettings};
use tabular2parquet_storage::{Location, OpenDalStore};

const LANDING_BUCKET: &str = "dataeng-landing-zone";
const CLEAN_BUCKET: &str = "dataeng-clean-zone";
const ORDERS_KEY: &str = "landing/non-partitioned-folder/salesdb/orders/file.parquet";

fn settings() -> TransformSettings {
    TransformSettings {
        convention: PathConvention {
            anchor: Some(PathAnchor {
                position: 1,
                literal: "non-partitioned-folder".to_string(),
            }),
            min_segments: 3,
        },
        detection: DateDetection::default(),
        on_unparseable_date: OnUnparseableDate::Drop,
        output_bucket: CLEAN_BUCKET.to_string(),
        output_prefix: None,
        compression: CompressionCodec::Snappy,
        large_input_warn_bytes: 100 * 1024 * 1024,
    }
}

fn context_with(
    settings: TransformSettings,
) -> (Arc<OpenDalStore>, Arc<MemoryCatalog>, TransformContext) {
    let store = Arc::new(OpenDalStore::new_memory());
    let catalog = Arc::new(MemoryCatalog::new());
    let context = TransformContext::new(store.clone(), catalog.clone(), settings);
    (store, catalog, context)
}

fn orders_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("order_id", DataType::Int64, false),
        Field::new("customer", DataType::Utf8, false),
        Field::new("transaction_date", DataType::Utf8, false),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3])),
            Arc::new(StringArray::from(vec!["alice", "bob", "carol"])),
            Arc::new(StringArray::from(vec![
                "2024-03-07",
                "2024-03-07",
                "2024-03-08",
            ])),
        ],
    )
    .unwrap()
}

async fn seed_parquet(store: &OpenDalStore, key: &str, batch: &RecordBatch) {
    let bytes = write_parquet(batch, CompressionCodec::Snappy).unwrap();
    store
        .write_object(&Location::new(LANDING_BUCKET, key), bytes)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_partition_end_to_end() {
    let (store, catalog, context) = context_with(settings());
    seed_parquet(&store, ORDERS_KEY, &orders_batch()).await;

    let report = context.partition(LANDING_BUCKET, ORDERS_KEY).await.unwrap();

    assert_eq!(report.namespace, "salesdb");
    assert_eq!(report.table, "orders");
    assert_eq!(report.rows_processed, 3);
    assert_eq!(report.date_column.as_deref(), Some("transaction_date"));
    assert_eq!(report.detection_method, Some("keyword_match"));
    assert_eq!(report.output_location, "dataeng-clean-zone/salesdb/orders");

    let mut keys = store.list_keys(CLEAN_BUCKET, "salesdb/orders/").await.unwrap();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            "salesdb/orders/year=2024/month=3/day=7/part-00000.parquet",
            "salesdb/orders/year=2024/month=3/day=8/part-00000.parquet",
        ]
    );

    // Rows for 2024-03-07 land in that partition, with the derived keys
    let bytes = store
        .read_object(&Location::new(
            CLEAN_BUCKET,
            "salesdb/orders/year=2024/month=3/day=7/part-00000.parquet",
        ))
        .await
        .unwrap();
    let day7 = read_parquet(bytes::Bytes::from(bytes)).unwrap();
    assert_eq!(day7.num_rows(), 2);
    assert!(day7.schema().column_with_name("year").is_some());

    // Catalog reflects the partition scheme, and ordering held: the
    // namespace existed before the write, registration came last
    let registration = catalog.table("salesdb", "orders").unwrap();
    assert_eq!(registration.partition_keys, vec!["year", "month", "day"]);
    assert_eq!(registration.location, "dataeng-clean-zone/salesdb/orders");
    assert_eq!(
        catalog.journal(),
        vec![
            "namespace_exists:salesdb",
            "create_namespace:salesdb",
            "register_table:salesdb/orders",
        ]
    );
}

#[tokio::test]
async fn test_partition_rewrite_is_idempotent() {
    let (store, _catalog, context) = context_with(settings());
    seed_parquet(&store, ORDERS_KEY, &orders_batch()).await;

    context.partition(LANDING_BUCKET, ORDERS_KEY).await.unwrap();
    context.partition(LANDING_BUCKET, ORDERS_KEY).await.unwrap();

    // One logical copy per partition, not an accumulation
    let keys = store
        .list_keys(CLEAN_BUCKET, "salesdb/orders/year=2024/month=3/day=7/")
        .await
        .unwrap();
    assert_eq!(keys.len(), 1);
}

#[tokio::test]
async fn test_partition_no_date_column_aborts_before_side_effects() {
    let (store, catalog, context) = context_with(settings());
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("label", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1, 2])),
            Arc::new(StringArray::from(vec!["a", "b"])),
        ],
    )
    .unwrap();
    seed_parquet(&store, ORDERS_KEY, &batch).await;

    let err = context.partition(LANDING_BUCKET, ORDERS_KEY).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Date(DateError::NoDateColumnFound)
    ));

    // No catalog mutation, no output: detection fails before step 5
    assert!(catalog.journal().is_empty());
    let keys = store.list_keys(CLEAN_BUCKET, "salesdb/").await.unwrap();
    assert!(keys.is_empty());
}

#[tokio::test]
async fn test_malformed_key_aborts_without_io() {
    let (_store, catalog, context) = context_with(settings());
    let err = context
        .partition(LANDING_BUCKET, "file.parquet")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Key(KeyError::MalformedKey { .. })));
    assert!(catalog.journal().is_empty());
}

#[tokio::test]
async fn test_explicit_override_missing_column() {
    let mut settings = settings();
    settings.detection.override_column = Some("order_date".to_string());
    let (store, _catalog, context) = context_with(settings);
    seed_parquet(&store, ORDERS_KEY, &orders_batch()).await;

    let err = context.partition(LANDING_BUCKET, ORDERS_KEY).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Date(DateError::ColumnNotFound(column)) if column == "order_date"
    ));
}

#[tokio::test]
async fn test_unparseable_rows_respect_policy() {
    let dirty = {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "transaction_date",
            DataType::Utf8,
            false,
        )]));
        RecordBatch::try_new(
            schema,
            vec![Arc::new(StringArray::from(vec!["2024-03-07", "soon"]))],
        )
        .unwrap()
    };

    // Default policy drops the bad row
    let (store, _catalog, context) = context_with(settings());
    seed_parquet(&store, ORDERS_KEY, &dirty).await;
    let report = context.partition(LANDING_BUCKET, ORDERS_KEY).await.unwrap();
    assert_eq!(report.rows_processed, 1);

    // Fail policy aborts the whole run
    let mut strict = settings();
    strict.on_unparseable_date = OnUnparseableDate::Fail;
    let (store, catalog, context) = context_with(strict);
    seed_parquet(&store, ORDERS_KEY, &dirty).await;
    let err = context.partition(LANDING_BUCKET, ORDERS_KEY).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Partition(PartitionError::Date(DateError::UnparseableDates { .. }))
    ));
    assert!(catalog.journal().is_empty());
}

#[tokio::test]
async fn test_convert_end_to_end() {
    let mut settings = settings();
    settings.convention.anchor = None;
    let (store, catalog, context) = context_with(settings);

    let key = "landing/salesdb/orders/data.csv";
    store
        .write_object(
            &Location::new(LANDING_BUCKET, key),
            b"order_id,customer\n1,alice\n2,bob\n".to_vec(),
        )
        .await
        .unwrap();

    let report = context.convert(LANDING_BUCKET, key).await.unwrap();

    assert_eq!(report.namespace, "salesdb");
    assert_eq!(report.table, "orders");
    assert_eq!(report.rows_processed, 2);
    assert_eq!(report.date_column, None);
    assert_eq!(report.files_written, vec!["salesdb/orders/part-00000.parquet"]);

    let bytes = store
        .read_object(&Location::new(CLEAN_BUCKET, "salesdb/orders/part-00000.parquet"))
        .await
        .unwrap();
    let written = read_parquet(bytes::Bytes::from(bytes)).unwrap();
    assert_eq!(written.num_rows(), 2);
    let ids = written
        .column(0)
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(ids.value(0), 1);

    let registration = catalog.table("salesdb", "orders").unwrap();
    assert!(registration.partition_keys.is_empty());
    assert_eq!(
        catalog.journal(),
        vec![
            "namespace_exists:salesdb",
            "create_namespace:salesdb",
            "register_table:salesdb/orders",
        ]
    );
}

#[tokio::test]
async fn test_convert_missing_source() {
    let mut settings = settings();
    settings.convention.anchor = None;
    let (_store, catalog, context) = context_with(settings);

    let err = context
        .convert(LANDING_BUCKET, "landing/salesdb/orders/data.csv")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Storage(_)));
    assert!(catalog.journal().is_empty());
}
