//! Delete command implementation.

use super::{emit, Target};
use serde_json::json;
use std::io::Write;
use tracing::info;

/// Destroys the entity with `id`. Succeeds if it does not exist.
pub async fn run<W: Write>(
    target: &Target,
    id: &str,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let collection = target.open()?;
    let result = collection.destroy(id).await;
    collection.close().await;
    result?;
    info!(id, "deleted");
    emit(out, &json!({ "deleted": id }))
}
