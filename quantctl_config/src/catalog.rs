//! Frequency catalog loading from a strict-header CSV, replacing the
//! dosing system's calibration CSV with a named list of candidate
//! frequencies for an assessment sweep.
//!
//! Expected headers: `frequency_hz,label`
//!
//! Example:
//! ```text
//! frequency_hz,label
//! 100.0,alpha
//! 440.0,reference tone
//! ```

#[derive(Debug, serde::Deserialize, Clone)]
pub struct CatalogRow {
    pub frequency_hz: f64,
    pub label: String,
}

pub fn load_catalog_csv(path: &std::path::Path) -> eyre::Result<Vec<CatalogRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open catalog CSV {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["frequency_hz", "label"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!("catalog CSV must have headers 'frequency_hz,label', got: {}", actual.join(","));
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<CatalogRow>().enumerate() {
        match rec {
            Ok(row) => {
                if !row.frequency_hz.is_finite() || row.frequency_hz <= 0.0 {
                    eyre::bail!("catalog CSV row {} has a non-positive frequency_hz", idx + 2);
                }
                rows.push(row);
            }
            Err(e) => eyre::bail!("invalid CSV row {}: {}", idx + 2, e),
        }
    }
    if rows.is_empty() {
        eyre::bail!("catalog CSV {:?} has no data rows", path);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_well_formed_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "frequency_hz,label").unwrap();
        writeln!(file, "100.0,alpha").unwrap();
        writeln!(file, "440.0,reference tone").unwrap();
        let rows = load_catalog_csv(file.path()).expect("load catalog");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].label, "reference tone");
    }

    #[test]
    fn rejects_wrong_headers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hz,name").unwrap();
        writeln!(file, "100.0,alpha").unwrap();
        assert!(load_catalog_csv(file.path()).is_err());
    }

    #[test]
    fn rejects_non_positive_frequency() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "frequency_hz,label").unwrap();
        writeln!(file, "-1.0,bad").unwrap();
        assert!(load_catalog_csv(file.path()).is_err());
    }
}
