// AWS Lambda binary entry point for the date-partitioning function
//
// Build with: cargo build -p tabular2parquet-lambda --bin partition
//
// The lambda_runtime crate provides the tokio runtime, so we use #[tokio::main]

use tabular2parquet_lambda::PipelineKind;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    tabular2parquet_lambda::run(PipelineKind::Partition).await
}
