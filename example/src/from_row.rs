#![allow(unused)]
use rowbin::{Config, FromRow, Result, fetch_all, fetch_one, transport::from_iter};

use crate::fixture;

#[derive(FromRow)]
struct User {
    id: u64,
    name: String,
    tags: Vec<String>,
    #[rowbin(rename = "payload")]
    json: Option<String>,
}

#[derive(FromRow)]
struct UserTuple(u64, String);

pub async fn main() -> Result<()> {
    let config = Config::from_env();
    let chunks = || {
        let payload = fixture::payload(10);
        (0..payload.len())
            .step_by(5)
            .map(|i|payload.slice(i..(i + 5).min(payload.len())))
            .collect::<Vec<_>>()
    };

    let users = fetch_all::<_, User>(from_iter(chunks()), &config).await?;

    assert_eq!(users.len(), 10);
    assert_eq!(users[4].tags, ["tag-0"]);
    assert_eq!(users[3].json.as_deref(), Some("{\"id\":3}"));

    let UserTuple(id, name) = fetch_one(from_iter(chunks()), &config).await?;

    assert_eq!(id, 0);
    assert_eq!(name, "user-0");

    let (id, name): (u8, String) = fetch_one(from_iter(chunks()), &config).await?;

    assert_eq!((id, name.as_str()), (0, "user-0"));

    Ok(())
}
