use super::ranked::ProbeResult;
use anyhow::Result;
use log::debug;
use std::path::Path;

/// Replaces the report file with the current pool snapshot as pretty JSON.
pub async fn write(path: impl AsRef<Path>, entries: &[ProbeResult]) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(entries)?;
    tokio::fs::write(path, json).await?;
    debug!("Wrote {} pool entries to {:?}", entries.len(), path);
    Ok(())
}

/// Reads a previously written report back into memory.
pub async fn read(path: impl AsRef<Path>) -> Result<Vec<ProbeResult>> {
    let json = tokio::fs::read_to_string(path.as_ref()).await?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ranked::ProbeStatus;

    fn entry(proxy: &str, response_time: f64) -> ProbeResult {
        ProbeResult {
            proxy: proxy.to_string(),
            status: ProbeStatus::Good,
            response_time,
            body_response: "1.2.3.4".to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let path = std::env::temp_dir().join("viaduct_report_roundtrip.json");
        let entries = vec![entry("socks5://10.0.0.1:1080", 0.25), entry("http://10.0.0.2:8080", 0.5)];
        write(&path, &entries).await.unwrap();

        let loaded = read(&path).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].proxy, "socks5://10.0.0.1:1080");
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_report_uses_wire_field_names() {
        let path = std::env::temp_dir().join("viaduct_report_fields.json");
        write(&path, &[entry("socks5://10.0.0.1:1080", 0.25)]).await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let first = &parsed[0];
        assert_eq!(first["Proxy"], "socks5://10.0.0.1:1080");
        assert_eq!(first["Status"], "good");
        assert!(first["ResponseTime"].is_number());
        assert_eq!(first["BodyResponse"], "1.2.3.4");
        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_write_truncates_previous_contents() {
        let path = std::env::temp_dir().join("viaduct_report_truncate.json");
        write(&path, &[entry("a://1", 1.0), entry("b://2", 2.0)]).await.unwrap();
        write(&path, &[entry("c://3", 3.0)]).await.unwrap();

        let loaded = read(&path).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].proxy, "c://3");
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
