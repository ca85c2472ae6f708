use super::ReportEntry;
use crate::error::Result;
use std::path::Path;

pub fn write_json(entries: &[ReportEntry], output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(entries)?;
    std::fs::write(output_path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_json_uses_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");
        let entries = vec![ReportEntry {
            index: 1,
            before: PathBuf::from("images/001_before.jpg"),
            after: PathBuf::from("images/001_after.jpg"),
            timestamp: "2024-06-03 02:07 PM".into(),
            description: "Blocked fire exit".into(),
            action: "Remove pallets".into(),
        }];

        write_json(&entries, &path).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"description\": \"Blocked fire exit\""));
        assert!(raw.contains("\"timestamp\""));

        let parsed: Vec<ReportEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, entries);
    }
}
