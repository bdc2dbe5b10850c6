use rowbin::{Config, Decode, FromRow, Result, fetch_all, transport::from_iter, types::{Json, TimeMapper}};
use serde::Deserialize;
use std::sync::Arc;
use time::UtcDateTime;

use crate::fixture;

#[derive(Debug, PartialEq, Decode)]
enum Level {
    #[rowbin(rename = "low")]
    Low,
    #[rowbin(rename = "high")]
    High,
}

#[derive(Decode)]
struct UserId(u64);

#[derive(Debug, Deserialize, PartialEq, Eq)]
struct Payload {
    id: u64,
}

#[derive(FromRow)]
struct User {
    id: UserId,
    level: Level,
    joined: UtcDateTime,
    payload: Option<Json<Payload>>,
}

pub async fn main() -> Result<()> {
    let config = Config::from_env().mapper(Arc::new(TimeMapper));

    let users = fetch_all::<_, User>(from_iter([fixture::payload(4)]), &config).await?;

    assert_eq!(users[0].level, Level::Low);
    assert_eq!(users[1].level, Level::High);
    assert_eq!(users[1].id.0, 1);
    assert_eq!(users[2].joined.millisecond(), 2);
    assert!(users[2].payload.is_none());

    let Some(Json(payload)) = &users[3].payload else {
        unreachable!("odd user has payload")
    };

    assert_eq!(payload, &Payload { id: 3 });

    Ok(())
}
