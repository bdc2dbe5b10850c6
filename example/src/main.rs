use tracing::{Instrument, trace_span};
use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use rowbin::Result;

mod fixture;
mod stream;
mod from_row;
mod decode;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::Registry::default()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    stream::main().instrument(trace_span!("stream")).await?;
    from_row::main().instrument(trace_span!("from_row")).await?;
    decode::main().instrument(trace_span!("decode")).await?;

    Ok(())
}
