use futures::StreamExt;
use rowbin::{Config, DecodeError, Result, fetch::RowStream, io::ReadChunks, types::TimeMapper};
use std::sync::Arc;

use crate::fixture;

pub async fn main() -> Result<()> {
    let path = std::env::temp_dir().join("rowbin-example.bin");
    tokio::fs::write(&path, fixture::payload(1000)).await?;

    // small chunks, most values cross a chunk boundary
    let config = Config::from_env()
        .chunk_size(7)
        .mapper(Arc::new(TimeMapper));

    let file = tokio::fs::File::open(&path).await?;
    let mut rows = RowStream::new(ReadChunks::new(file, &config), &config);

    let mut total = 0;
    while let Some(batch) = rows.next().await {
        let batch = batch?;
        if total == 0 {
            if let Some(first) = batch.first() {
                let json = serde_json::to_string_pretty(&first.to_json()?)
                    .map_err(DecodeError::from)?;
                tracing::info!("first row {json}");
            }
        }
        total += batch.len();
    }

    let columns = rows.columns().map(|e|e.types().len());
    assert_eq!(columns, Some(fixture::COLUMNS.len()));
    assert_eq!(total, 1000);

    tokio::fs::remove_file(&path).await?;

    // truncated

    let payload = fixture::payload(2);
    let source = rowbin::transport::from_iter([payload.slice(..payload.len() - 1)]);
    let err = rowbin::fetch_all::<_, rowbin::Row>(source, &config).await.unwrap_err();

    assert!(err.is_truncated());

    Ok(())
}
