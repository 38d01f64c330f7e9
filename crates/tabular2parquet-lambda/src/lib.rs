// AWS Lambda runtime adapter
//
// Two functions share this adapter: `convert` (CSV to Parquet) and
// `partition` (Parquet to date-partitioned Parquet). Each upload event is
// processed record by record; any failure aborts the invocation and surfaces
// to Lambda's own retry/dead-letter policy.
//
// Philosophy: Use lambda_runtime's provided tokio
// We don't add our own tokio - lambda_runtime provides it

use aws_lambda_events::event::s3::S3Event;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::json;
use std::sync::Arc;
use tabular2parquet_catalog::{ReqwestHttpClient, RestCatalog};
use tabular2parquet_config::RuntimeConfig;
use tabular2parquet_handlers::{TransformContext, TransformSettings};
use tabular2parquet_storage::OpenDalStore;

mod event;

pub use event::{decode_object_key, object_records, ObjectRecord};

/// Which pipeline this binary runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Convert,
    Partition,
}

impl PipelineKind {
    fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Convert => "convert",
            PipelineKind::Partition => "partition",
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_target(false)
        .init();
}

/// Build the shared transform context from configuration
///
/// Storage credentials come from the Lambda execution role; OpenDAL discovers
/// them from the environment.
fn build_context() -> Result<TransformContext, Error> {
    let config = RuntimeConfig::load()?;

    let store = Arc::new(OpenDalStore::from_config(&config.storage)?);
    let http = ReqwestHttpClient::new()?;
    let catalog = Arc::new(RestCatalog::new(
        http,
        config.catalog.endpoint.clone(),
        config.catalog.token.clone(),
    ));
    let settings = TransformSettings::from_config(&config);

    Ok(TransformContext::new(store, catalog, settings))
}

async fn handle_event(
    lambda_event: LambdaEvent<S3Event>,
    context: Arc<TransformContext>,
    kind: PipelineKind,
) -> Result<serde_json::Value, Error> {
    let (s3_event, _lambda_context) = lambda_event.into_parts();
    let records = object_records(&s3_event)?;

    let mut reports = Vec::with_capacity(records.len());
    for record in records {
        let result = match kind {
            PipelineKind::Convert => context.convert(&record.bucket, &record.key).await,
            PipelineKind::Partition => context.partition(&record.bucket, &record.key).await,
        };

        match result {
            Ok(report) => reports.push(report),
            Err(err) => {
                tracing::error!(
                    pipeline = kind.as_str(),
                    bucket = %record.bucket,
                    key = %record.key,
                    error = %err,
                    "pipeline failed"
                );
                return Err(err.into());
            }
        }
    }

    Ok(json!({
        "status": "ok",
        "pipeline": kind.as_str(),
        "records_processed": reports.len(),
        "reports": reports,
    }))
}

/// Lambda runtime entry point shared by both binaries
pub async fn run(kind: PipelineKind) -> Result<(), Error> {
    init_tracing();
    tracing::info!(pipeline = kind.as_str(), "lambda function started");

    let context = Arc::new(build_context()?);

    lambda_runtime::run(service_fn(move |lambda_event: LambdaEvent<S3Event>| {
        let context = context.clone();
        async move { handle_event(lambda_event, context, kind).await }
    }))
    .await
}
