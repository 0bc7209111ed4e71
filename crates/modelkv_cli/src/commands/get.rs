//! Get command implementation.

use super::{emit, Target};
use std::io::Write;

/// Prints the entity with `id`, or `null` if there is none.
pub async fn run<W: Write>(
    target: &Target,
    id: &str,
    out: &mut W,
) -> Result<(), Box<dyn std::error::Error>> {
    let collection = target.open()?;
    let record = collection.load(id).await;
    collection.close().await;
    emit(out, &record?)
}
