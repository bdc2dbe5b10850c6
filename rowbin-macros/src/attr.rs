use syn::{Attribute, LitStr, Result};

/// Returns the `#[rowbin(rename = "..")]` value, if any.
pub fn rename(attrs: &[Attribute]) -> Result<Option<String>> {
    let mut rename = None;
    for attr in attrs.iter().filter(|e|e.path().is_ident("rowbin")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                rename = Some(meta.value()?.parse::<LitStr>()?.value());
                return Ok(());
            }
            Err(meta.error("unknown rowbin attribute"))
        })?;
    }
    Ok(rename)
}
