use serde::Serialize;

use crate::cli::OutputFormat;

/// Render a serializable result in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", render(value, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_is_single_line() {
        let value = json!({ "processed": 3, "failed": 0 });
        assert_eq!(render(&value, OutputFormat::Raw).unwrap(), r#"{"failed":0,"processed":3}"#);
        assert!(render(&value, OutputFormat::Json).unwrap().contains('\n'));
    }
}
