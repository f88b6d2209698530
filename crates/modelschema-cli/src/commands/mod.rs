pub mod check;
pub mod inspect;
pub mod managed;

use anyhow::{Context, Result};
use modelschema_core::TypeKey;

/// Parses command-line type arguments such as `Node` or `"List<Node>"`.
pub(crate) fn parse_keys(texts: &[String]) -> Result<Vec<TypeKey>> {
    let mut keys = Vec::with_capacity(texts.len());
    for text in texts {
        let key = text
            .parse::<TypeKey>()
            .with_context(|| format!("Invalid type key '{text}'"))?;
        keys.push(key);
    }
    Ok(keys)
}
