//! File classification: extension to category, plus year/date bucketing.
//!
//! Categories are derived solely from the file extension through a closed
//! mapping table; unknown extensions fall back to [`FileCategory::Other`].
//! The filing date comes from a date embedded in the filename when the
//! heuristic is enabled, otherwise from the file's modified timestamp, and
//! as a last resort from the epoch sentinel, so classification never fails.

use std::collections::HashMap;

use chrono::NaiveDate;
use regex::Regex;

/// Broad document category used as a directory level in the destination
/// structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    Pdf,
    Word,
    Excel,
    PowerPoint,
    Images,
    Video,
    Audio,
    Archives,
    Code,
    Other,
}

impl FileCategory {
    /// Directory name for this category.
    pub fn dir_name(&self) -> &'static str {
        match self {
            FileCategory::Pdf => "PDF",
            FileCategory::Word => "Word",
            FileCategory::Excel => "Excel",
            FileCategory::PowerPoint => "PowerPoint",
            FileCategory::Images => "Images",
            FileCategory::Video => "Video",
            FileCategory::Audio => "Audio",
            FileCategory::Archives => "Archives",
            FileCategory::Code => "Code",
            FileCategory::Other => "Other",
        }
    }

    /// Resolves a category from its directory label; used to validate
    /// extension overrides in the configuration.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "PDF" => Some(FileCategory::Pdf),
            "Word" => Some(FileCategory::Word),
            "Excel" => Some(FileCategory::Excel),
            "PowerPoint" => Some(FileCategory::PowerPoint),
            "Images" => Some(FileCategory::Images),
            "Video" => Some(FileCategory::Video),
            "Audio" => Some(FileCategory::Audio),
            "Archives" => Some(FileCategory::Archives),
            "Code" => Some(FileCategory::Code),
            "Other" => Some(FileCategory::Other),
            _ => None,
        }
    }
}

/// Maps file extensions to categories through a closed table.
#[derive(Debug, Clone)]
pub struct ExtensionMapper {
    extension_map: HashMap<String, FileCategory>,
}

impl ExtensionMapper {
    /// Creates a mapper with the standard extension table.
    pub fn new() -> Self {
        let mut mapper = Self {
            extension_map: HashMap::new(),
        };
        mapper.populate_standard_mappings();
        mapper
    }

    fn populate_standard_mappings(&mut self) {
        let table: &[(&str, FileCategory)] = &[
            ("pdf", FileCategory::Pdf),
            // Word processing
            ("doc", FileCategory::Word),
            ("docx", FileCategory::Word),
            ("docm", FileCategory::Word),
            ("dot", FileCategory::Word),
            ("dotx", FileCategory::Word),
            ("odt", FileCategory::Word),
            ("rtf", FileCategory::Word),
            // Spreadsheets
            ("xls", FileCategory::Excel),
            ("xlsx", FileCategory::Excel),
            ("xlsm", FileCategory::Excel),
            ("xlsb", FileCategory::Excel),
            ("xltx", FileCategory::Excel),
            ("ods", FileCategory::Excel),
            ("csv", FileCategory::Excel),
            // Presentations
            ("ppt", FileCategory::PowerPoint),
            ("pptx", FileCategory::PowerPoint),
            ("pptm", FileCategory::PowerPoint),
            ("pps", FileCategory::PowerPoint),
            ("ppsx", FileCategory::PowerPoint),
            ("odp", FileCategory::PowerPoint),
            // Images
            ("jpg", FileCategory::Images),
            ("jpeg", FileCategory::Images),
            ("png", FileCategory::Images),
            ("gif", FileCategory::Images),
            ("bmp", FileCategory::Images),
            ("tiff", FileCategory::Images),
            ("tif", FileCategory::Images),
            ("svg", FileCategory::Images),
            ("webp", FileCategory::Images),
            ("ico", FileCategory::Images),
            ("psd", FileCategory::Images),
            ("eps", FileCategory::Images),
            // Video
            ("mp4", FileCategory::Video),
            ("avi", FileCategory::Video),
            ("mkv", FileCategory::Video),
            ("mov", FileCategory::Video),
            ("wmv", FileCategory::Video),
            ("flv", FileCategory::Video),
            ("webm", FileCategory::Video),
            ("m4v", FileCategory::Video),
            ("mpg", FileCategory::Video),
            ("mpeg", FileCategory::Video),
            // Audio
            ("mp3", FileCategory::Audio),
            ("wav", FileCategory::Audio),
            ("flac", FileCategory::Audio),
            ("aac", FileCategory::Audio),
            ("ogg", FileCategory::Audio),
            ("wma", FileCategory::Audio),
            ("m4a", FileCategory::Audio),
            ("opus", FileCategory::Audio),
            // Archives
            ("zip", FileCategory::Archives),
            ("rar", FileCategory::Archives),
            ("7z", FileCategory::Archives),
            ("tar", FileCategory::Archives),
            ("gz", FileCategory::Archives),
            ("bz2", FileCategory::Archives),
            ("xz", FileCategory::Archives),
            // Code
            ("py", FileCategory::Code),
            ("rs", FileCategory::Code),
            ("js", FileCategory::Code),
            ("ts", FileCategory::Code),
            ("java", FileCategory::Code),
            ("c", FileCategory::Code),
            ("cpp", FileCategory::Code),
            ("h", FileCategory::Code),
            ("go", FileCategory::Code),
            ("sh", FileCategory::Code),
            ("json", FileCategory::Code),
            ("xml", FileCategory::Code),
            ("yaml", FileCategory::Code),
            ("yml", FileCategory::Code),
            ("toml", FileCategory::Code),
            ("html", FileCategory::Code),
            ("sql", FileCategory::Code),
        ];

        for (ext, category) in table {
            self.add_mapping(ext, *category);
        }
    }

    /// Adds or overrides a single extension mapping (lowercased).
    pub fn add_mapping(&mut self, ext: &str, category: FileCategory) {
        self.extension_map
            .insert(ext.trim_start_matches('.').to_lowercase(), category);
    }

    /// Case-insensitive category lookup; unknown extensions map to `Other`.
    pub fn categorize(&self, ext: Option<&str>) -> FileCategory {
        ext.and_then(|e| {
            self.extension_map
                .get(&e.trim_start_matches('.').to_lowercase())
                .copied()
        })
        .unwrap_or(FileCategory::Other)
    }
}

impl Default for ExtensionMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts a filing date embedded in a filename.
///
/// Patterns are tried in order; the first hit that survives calendar
/// validation (1900..=2100, real month/day) wins. Unparseable candidates
/// are skipped rather than reported as errors.
#[derive(Debug)]
pub struct DateExtractor {
    patterns: Vec<(Regex, DateOrder)>,
    bare_year: Regex,
}

#[derive(Debug, Clone, Copy)]
enum DateOrder {
    YearMonthDay,
    DayMonthYear,
    Compact,
    DayMonthShortYear,
}

impl DateExtractor {
    pub fn new() -> Self {
        let patterns = vec![
            (
                Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").expect("invalid date pattern"),
                DateOrder::YearMonthDay,
            ),
            (
                Regex::new(r"(\d{1,2})[/-](\d{1,2})[/-](\d{4})").expect("invalid date pattern"),
                DateOrder::DayMonthYear,
            ),
            (
                Regex::new(r"(\d{4})/(\d{1,2})/(\d{1,2})").expect("invalid date pattern"),
                DateOrder::YearMonthDay,
            ),
            (
                Regex::new(r"(\d{8})").expect("invalid date pattern"),
                DateOrder::Compact,
            ),
            (
                Regex::new(r"(\d{1,2})[/-](\d{1,2})[/-](\d{2})\b").expect("invalid date pattern"),
                DateOrder::DayMonthShortYear,
            ),
        ];
        Self {
            patterns,
            // \b treats underscores as word characters, so the year must be
            // anchored with an explicit separator class instead.
            bare_year: Regex::new(r"(?:^|[\W_])(19\d{2}|20\d{2})(?:[\W_]|$)")
                .expect("invalid year pattern"),
        }
    }

    /// Returns the first valid date found in `filename`, if any.
    pub fn extract_from_filename(&self, filename: &str) -> Option<NaiveDate> {
        for (pattern, order) in &self.patterns {
            if let Some(caps) = pattern.captures(filename)
                && let Some(date) = Self::parse_capture(&caps, *order)
            {
                return Some(date);
            }
        }
        None
    }

    /// Returns a standalone four-digit year from `filename` when no full
    /// date is present; used only as a year-bucket hint.
    pub fn extract_year_from_filename(&self, filename: &str) -> Option<i32> {
        self.bare_year
            .captures(filename)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    fn parse_capture(caps: &regex::Captures<'_>, order: DateOrder) -> Option<NaiveDate> {
        let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<i32>().ok());

        let (year, month, day) = match order {
            DateOrder::YearMonthDay => (field(1)?, field(2)?, field(3)?),
            DateOrder::DayMonthYear => (field(3)?, field(2)?, field(1)?),
            DateOrder::DayMonthShortYear => (2000 + field(3)?, field(2)?, field(1)?),
            DateOrder::Compact => {
                let digits = caps.get(1)?.as_str();
                (
                    digits[0..4].parse().ok()?,
                    digits[4..6].parse().ok()?,
                    digits[6..8].parse().ok()?,
                )
            }
        };

        if !(1900..=2100).contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month as u32, day as u32)
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of classifying one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: FileCategory,
    pub year: i32,
    pub date: NaiveDate,
}

/// Classifies files into (category, year, date) buckets.
#[derive(Debug)]
pub struct Classifier {
    mapper: ExtensionMapper,
    date_extractor: DateExtractor,
    /// Whether to look for a date embedded in the filename before falling
    /// back to the filesystem timestamp.
    date_from_filename: bool,
}

impl Classifier {
    pub fn new(mapper: ExtensionMapper, date_from_filename: bool) -> Self {
        Self {
            mapper,
            date_extractor: DateExtractor::new(),
            date_from_filename,
        }
    }

    /// Classifies a file. `modified` is the filesystem timestamp when
    /// available; when neither an embedded date nor a timestamp exists the
    /// epoch sentinel is used so classification always succeeds.
    pub fn classify(
        &self,
        filename: &str,
        extension: Option<&str>,
        modified: Option<NaiveDate>,
    ) -> Classification {
        let category = self.mapper.categorize(extension);

        let embedded = self
            .date_from_filename
            .then(|| self.date_extractor.extract_from_filename(filename))
            .flatten();
        let date = embedded.or(modified).unwrap_or_default();

        // A standalone year in the filename still decides the year bucket
        // when no full date could be extracted.
        let year = embedded
            .map(|d| chrono::Datelike::year(&d))
            .or_else(|| {
                self.date_from_filename
                    .then(|| self.date_extractor.extract_year_from_filename(filename))
                    .flatten()
            })
            .unwrap_or_else(|| chrono::Datelike::year(&date));

        Classification {
            category,
            year,
            date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(ExtensionMapper::new(), true)
    }

    #[test]
    fn test_extension_lookup_case_insensitive() {
        let mapper = ExtensionMapper::new();
        assert_eq!(mapper.categorize(Some("pdf")), FileCategory::Pdf);
        assert_eq!(mapper.categorize(Some("PDF")), FileCategory::Pdf);
        assert_eq!(mapper.categorize(Some(".Docx")), FileCategory::Word);
    }

    #[test]
    fn test_unknown_extension_is_other() {
        let mapper = ExtensionMapper::new();
        assert_eq!(mapper.categorize(Some("xyz")), FileCategory::Other);
        assert_eq!(mapper.categorize(None), FileCategory::Other);
    }

    #[test]
    fn test_custom_mapping_overrides() {
        let mut mapper = ExtensionMapper::new();
        mapper.add_mapping("csv", FileCategory::Other);
        assert_eq!(mapper.categorize(Some("csv")), FileCategory::Other);
    }

    #[test]
    fn test_category_labels_round_trip() {
        for category in [
            FileCategory::Pdf,
            FileCategory::Word,
            FileCategory::Excel,
            FileCategory::PowerPoint,
            FileCategory::Images,
            FileCategory::Video,
            FileCategory::Audio,
            FileCategory::Archives,
            FileCategory::Code,
            FileCategory::Other,
        ] {
            assert_eq!(FileCategory::from_label(category.dir_name()), Some(category));
        }
        assert_eq!(FileCategory::from_label("Documents"), None);
    }

    #[test]
    fn test_date_extraction_iso() {
        let ex = DateExtractor::new();
        assert_eq!(
            ex.extract_from_filename("fattura_2024-03-01.pdf"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn test_date_extraction_day_first() {
        let ex = DateExtractor::new();
        assert_eq!(
            ex.extract_from_filename("scan 01-03-2024.pdf"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(
            ex.extract_from_filename("scan 01/03/2024.pdf"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn test_date_extraction_compact() {
        let ex = DateExtractor::new();
        assert_eq!(
            ex.extract_from_filename("report_20240301.pdf"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn test_bare_year_found_between_underscores() {
        let ex = DateExtractor::new();
        assert_eq!(ex.extract_year_from_filename("fattura_acme_2024"), Some(2024));
        assert_eq!(ex.extract_year_from_filename("2024 report"), Some(2024));
        // Digits glued to the year are not a standalone year.
        assert_eq!(ex.extract_year_from_filename("serial_12024"), None);
    }

    #[test]
    fn test_invalid_embedded_date_ignored() {
        let ex = DateExtractor::new();
        // Month 13 never validates; 8 digits that are not a date neither.
        assert_eq!(ex.extract_from_filename("doc_2024-13-01.pdf"), None);
        assert_eq!(ex.extract_from_filename("serial_99999999.pdf"), None);
    }

    #[test]
    fn test_classify_prefers_filename_date() {
        let c = classifier();
        let modified = NaiveDate::from_ymd_opt(2020, 1, 1);
        let result = c.classify("fattura_acme_2024-06-15.pdf", Some("pdf"), modified);
        assert_eq!(result.category, FileCategory::Pdf);
        assert_eq!(result.year, 2024);
        assert_eq!(result.date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
    }

    #[test]
    fn test_classify_bare_year_decides_year_bucket() {
        let c = classifier();
        let modified = NaiveDate::from_ymd_opt(2026, 2, 10);
        let result = c.classify("fattura_acme_2024.pdf", Some("pdf"), modified);
        assert_eq!(result.category, FileCategory::Pdf);
        assert_eq!(result.year, 2024);
    }

    #[test]
    fn test_classify_falls_back_to_timestamp() {
        let c = classifier();
        let modified = NaiveDate::from_ymd_opt(2023, 5, 4);
        let result = c.classify("notes.txt", Some("txt"), modified);
        assert_eq!(result.year, 2023);
    }

    #[test]
    fn test_classify_epoch_sentinel_when_nothing_known() {
        let c = classifier();
        let result = c.classify("notes", None, None);
        assert_eq!(result.category, FileCategory::Other);
        assert_eq!(result.year, 1970);
    }

    #[test]
    fn test_classify_filename_heuristic_disabled() {
        let c = Classifier::new(ExtensionMapper::new(), false);
        let modified = NaiveDate::from_ymd_opt(2020, 1, 1);
        let result = c.classify("fattura_2024-06-15.pdf", Some("pdf"), modified);
        assert_eq!(result.year, 2020);
    }
}
