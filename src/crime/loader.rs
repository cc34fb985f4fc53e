use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::normalize::{NameNormalizer, TrimWhitespace};
use crate::cache::MemoCache;
use crate::models::RegionCrimeAggregate;
use crate::{GuideError, Result};

pub const DISTRICT_COLUMN: &str = "District";
pub const YEAR_COLUMN: &str = "Year";

/// Identifier columns never counted as incidents
pub const EXCLUDED_COLUMNS: [&str; 4] = ["Year", "Code", "District", "Location"];

/// Cell markers read as a missing value
pub const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing(cell: &str) -> bool {
    cell.is_empty() || MISSING_MARKERS.contains(&cell)
}

/// Numeric value of a cell; missing markers and non-finite numbers count as absent
pub fn parse_count(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if is_missing(cell) {
        return None;
    }
    cell.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Memoizing crime statistics loader
pub struct CrimeLoader {
    normalizer: Arc<dyn NameNormalizer>,
    cache: MemoCache<PathBuf, Vec<RegionCrimeAggregate>>,
}

impl Default for CrimeLoader {
    fn default() -> Self {
        Self::new(Arc::new(TrimWhitespace))
    }
}

impl CrimeLoader {
    pub fn new(normalizer: Arc<dyn NameNormalizer>) -> Self {
        Self {
            normalizer,
            cache: MemoCache::new(),
        }
    }

    /// Load per-district totals, reporting why the overlay is unavailable.
    pub fn try_load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<RegionCrimeAggregate>> {
        let path = path.as_ref().to_path_buf();
        if let Some(cached) = self.cache.get(&path) {
            return Ok(cached);
        }

        info!("Loading crime statistics from: {:?}", path);
        let file = File::open(&path)?;
        let aggregates = aggregate(file, self.normalizer.as_ref())?;
        info!("Aggregated incidents for {} districts", aggregates.len());

        self.cache.put(path, aggregates.clone());
        Ok(aggregates)
    }

    /// Load per-district totals; any failure means "no overlay".
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Vec<RegionCrimeAggregate> {
        let path = path.as_ref();
        match self.try_load(path) {
            Ok(aggregates) => aggregates,
            Err(e) => {
                warn!("Crime overlay unavailable for {:?}: {}", path, e);
                Vec::new()
            }
        }
    }
}

/// Parsed table with rows padded to the header width
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// A column is numeric when every present cell parses as a number
    fn is_numeric(&self, column: usize) -> bool {
        self.rows.iter().all(|row| {
            let cell = row[column].trim();
            is_missing(cell) || cell.parse::<f64>().is_ok()
        })
    }
}

fn read_table<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let width = headers.len();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (line, record) in rdr.records().enumerate() {
        match record {
            Ok(record) if record.len() <= width => {
                let mut row: Vec<String> = record.iter().map(str::to_string).collect();
                row.resize(width, String::new());
                rows.push(row);
            }
            Ok(record) => {
                debug!(
                    "Skipping row {}: {} fields, expected {}",
                    line + 2,
                    record.len(),
                    width
                );
                skipped += 1;
            }
            Err(e) => {
                debug!("Skipping unreadable row {}: {}", line + 2, e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} malformed crime rows", skipped);
    }
    Ok(Table { headers, rows })
}

/// Keep only the rows of the most recent year
fn latest_year_rows(table: &Table, year: usize) -> Vec<&Vec<String>> {
    if table.is_numeric(year) {
        let value = |row: &Vec<String>| parse_count(&row[year]);
        let Some(latest) = table.rows.iter().filter_map(|row| value(row)).reduce(f64::max) else {
            return Vec::new();
        };
        debug!("Latest year in crime table: {}", latest);
        table
            .rows
            .iter()
            .filter(|row| value(*row) == Some(latest))
            .collect()
    } else {
        let Some(latest) = table.rows.iter().map(|row| row[year].trim()).max() else {
            return Vec::new();
        };
        let latest = latest.to_string();
        table
            .rows
            .iter()
            .filter(|row| row[year].trim() == latest)
            .collect()
    }
}

/// Aggregate a crime table into per-district incident totals.
///
/// Output is ordered by region name.
pub fn aggregate<R: Read>(
    reader: R,
    normalizer: &dyn NameNormalizer,
) -> Result<Vec<RegionCrimeAggregate>> {
    let table = read_table(reader)?;

    let district = table
        .column(DISTRICT_COLUMN)
        .ok_or_else(|| GuideError::missing_column(DISTRICT_COLUMN))?;

    let rows: Vec<&Vec<String>> = match table.column(YEAR_COLUMN) {
        Some(year) => latest_year_rows(&table, year),
        None => table.rows.iter().collect(),
    };

    let incident_columns: Vec<usize> = (0..table.headers.len())
        .filter(|&idx| !EXCLUDED_COLUMNS.contains(&table.headers[idx].as_str()))
        .filter(|&idx| table.is_numeric(idx))
        .collect();
    debug!(
        "Summing incident columns: {:?}",
        incident_columns
            .iter()
            .map(|&idx| table.headers[idx].as_str())
            .collect::<Vec<_>>()
    );

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for row in rows {
        let region = normalizer.normalize(&row[district]);
        if region.is_empty() {
            continue;
        }
        let row_total: f64 = incident_columns
            .iter()
            .filter_map(|&idx| parse_count(&row[idx]))
            .sum();
        *totals.entry(region).or_insert(0.0) += row_total;
    }

    Ok(totals
        .into_iter()
        .map(|(region_name, total_incidents)| RegionCrimeAggregate {
            region_name,
            total_incidents,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crime::normalize::Exact;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TWO_YEARS: &str = "\
Year,District,Code,Location,Robbery,Street_robbery,Injury
2011,Mitte,10111,Tiergarten Süd,70,46,586
2012,Mitte,10111,Tiergarten Süd,80,50,600
2012,Mitte,10112,Regierungsviertel,10,5,20
2012,Pankow,30101,Buch,3,1,40
";

    fn totals(aggregates: &[RegionCrimeAggregate]) -> Vec<(&str, f64)> {
        aggregates
            .iter()
            .map(|a| (a.region_name.as_str(), a.total_incidents))
            .collect()
    }

    #[test]
    fn test_latest_year_only() {
        let result = aggregate(TWO_YEARS.as_bytes(), &TrimWhitespace).unwrap();
        assert_eq!(
            totals(&result),
            vec![("Mitte", 80.0 + 50.0 + 600.0 + 10.0 + 5.0 + 20.0), ("Pankow", 44.0)]
        );
    }

    #[test]
    fn test_identifier_columns_excluded() {
        // Code and Year are numeric but never summed
        let csv = "District,Code,Year,Theft\nMitte,10111,2012,7\n";
        let result = aggregate(csv.as_bytes(), &TrimWhitespace).unwrap();
        assert_eq!(totals(&result), vec![("Mitte", 7.0)]);
    }

    #[test]
    fn test_missing_district_column() {
        let csv = "Year,Bezirk,Theft\n2012,Mitte,7\n";
        let err = aggregate(csv.as_bytes(), &TrimWhitespace).unwrap_err();
        assert!(matches!(err, GuideError::MissingColumn { .. }));
    }

    #[test]
    fn test_without_year_column_all_rows_count() {
        let csv = "District,Theft,Arson\nMitte,1,2\nMitte,3,4\n";
        let result = aggregate(csv.as_bytes(), &TrimWhitespace).unwrap();
        assert_eq!(totals(&result), vec![("Mitte", 10.0)]);
    }

    #[test]
    fn test_text_columns_not_summed() {
        let csv = "District,Note,Theft\nMitte,quiet,5\nMitte,12,5\n";
        let result = aggregate(csv.as_bytes(), &TrimWhitespace).unwrap();
        assert_eq!(totals(&result), vec![("Mitte", 10.0)]);
    }

    #[rstest]
    #[case("NaN")]
    #[case("NA")]
    #[case("N/A")]
    #[case("null")]
    #[case("nan")]
    #[case("-NaN")]
    #[case("inf")]
    #[case("")]
    fn test_missing_cells_count_as_absent(#[case] marker: &str) {
        let csv = format!("District,Theft,Arson\nMitte,5,{marker}\nMitte,3,2\n");
        let result = aggregate(csv.as_bytes(), &TrimWhitespace).unwrap();
        assert_eq!(totals(&result), vec![("Mitte", 10.0)]);
    }

    #[rstest]
    #[case("12", Some(12.0))]
    #[case(" 7.5 ", Some(7.5))]
    #[case("NULL", None)]
    #[case("infinity", None)]
    #[case("-inf", None)]
    #[case("many", None)]
    fn test_parse_count(#[case] cell: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_count(cell), expected);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let csv = "District,Theft\nMitte,5\nPankow,1,extra,fields\nSpandau\nMitte,2\n";
        let result = aggregate(csv.as_bytes(), &TrimWhitespace).unwrap();
        assert_eq!(totals(&result), vec![("Mitte", 7.0), ("Spandau", 0.0)]);
    }

    #[test]
    fn test_region_names_trimmed_and_merged() {
        let csv = "District,Theft\n Mitte ,5\nMitte,2\n  ,9\n";
        let result = aggregate(csv.as_bytes(), &TrimWhitespace).unwrap();
        assert_eq!(totals(&result), vec![("Mitte", 7.0)]);

        let exact = aggregate(csv.as_bytes(), &Exact).unwrap();
        assert_eq!(exact.len(), 3);
    }

    #[test]
    fn test_loader_fails_soft_and_memoizes() {
        let loader = CrimeLoader::default();
        assert!(loader.load("definitely/not/here.csv").is_empty());
        assert!(matches!(
            loader.try_load("definitely/not/here.csv"),
            Err(GuideError::Io { .. })
        ));

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(TWO_YEARS.as_bytes()).unwrap();
        let first = loader.load(file.path());
        assert_eq!(first.len(), 2);

        // Served from memory even after the file changes
        file.as_file().set_len(0).unwrap();
        assert_eq!(loader.load(file.path()), first);
    }

    #[test]
    fn test_loader_missing_district_is_empty() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Year,Theft\n2012,4\n").unwrap();
        assert!(CrimeLoader::default().load(file.path()).is_empty());
    }
}
