//! CSV parsing and row validation.
//!
//! The accepted format is a header row naming at least `title` and `artist`
//! (case-sensitive), optionally `album`, `duration` and `genre`, followed by
//! one song per line. Fields may be double-quoted; a doubled quote inside a
//! quoted field is a literal quote. Quoted fields cannot span lines.

use serde::{Deserialize, Serialize};

/// Columns every import file must name in its header.
pub const REQUIRED_COLUMNS: [&str; 2] = ["title", "artist"];

/// A single line could not be split into fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("Unterminated quoted field")]
    UnterminatedQuote,
}

/// One data row of an import file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRow {
    /// 1-based position among the lines after the header
    pub row: usize,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    /// Seconds; `None` when the cell is empty or unparseable
    pub duration: Option<u32>,
    pub genre: Option<String>,
    /// Problems found while parsing this row
    pub errors: Vec<String>,
}

impl ParsedRow {
    pub fn is_valid(&self) -> bool {
        !self.title.is_empty() && !self.artist.is_empty() && self.errors.is_empty()
    }
}

/// Result of parsing a whole file.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    /// False only when the file as a whole was rejected
    pub success: bool,
    /// Every data row, valid or not
    pub songs: Vec<ParsedRow>,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub errors: Vec<String>,
}

impl ParseResult {
    fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            errors: vec![message.into()],
            ..Default::default()
        }
    }
}

/// A row that failed validation, with every reason found.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidRow {
    pub row: usize,
    pub reasons: Vec<String>,
}

/// Rows split into those ready to commit and those that are not.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Validation {
    pub valid: Vec<ParsedRow>,
    pub invalid: Vec<InvalidRow>,
}

/// Column positions resolved from the header row.
struct Columns {
    title: usize,
    artist: usize,
    album: Option<usize>,
    duration: Option<usize>,
    genre: Option<usize>,
}

impl Columns {
    fn from_header(header: &[String]) -> Result<Self, String> {
        let find = |name: &str| header.iter().position(|h| h == name);

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|&c| find(c).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(format!("Missing required column(s): {}", missing.join(", ")));
        }

        Ok(Self {
            title: find("title").unwrap_or_default(),
            artist: find("artist").unwrap_or_default(),
            album: find("album"),
            duration: find("duration"),
            genre: find("genre"),
        })
    }
}

/// Parse CSV text into rows.
///
/// The file is rejected outright (with `success: false`) when it is empty or
/// its header lacks a required column. Otherwise every non-blank data line
/// yields a [`ParsedRow`], including rows that are missing a title or
/// artist, so the caller can report them.
///
/// Records are single-line: a quoted field may contain commas and doubled
/// quotes but not a line break. A quote left open at the end of a line makes
/// that row invalid.
pub fn parse_csv(text: &str) -> ParseResult {
    let mut lines = text.lines().skip_while(|l| l.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return ParseResult::rejected("CSV file is empty");
    };

    let header = match split_fields(header_line.trim_start_matches('\u{feff}')) {
        Ok(fields) => fields,
        Err(e) => return ParseResult::rejected(format!("Invalid header row: {}", e)),
    };
    let columns = match Columns::from_header(&header) {
        Ok(columns) => columns,
        Err(message) => return ParseResult::rejected(message),
    };

    let mut result = ParseResult {
        success: true,
        ..Default::default()
    };

    for (index, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parsed = parse_row(index + 1, line, &columns);

        if parsed.is_valid() {
            result.valid_rows += 1;
        } else {
            result.invalid_rows += 1;
            for error in &parsed.errors {
                result.errors.push(format!("Row {}: {}", parsed.row, error));
            }
        }
        result.songs.push(parsed);
    }

    result
}

fn parse_row(row: usize, line: &str, columns: &Columns) -> ParsedRow {
    let fields = match split_fields(line) {
        Ok(fields) => fields,
        Err(e) => {
            return ParsedRow {
                row,
                title: String::new(),
                artist: String::new(),
                album: None,
                duration: None,
                genre: None,
                errors: vec![e.to_string()],
            };
        }
    };

    let cell = |index: usize| fields.get(index).map(String::as_str).unwrap_or("");
    let optional = |index: Option<usize>| {
        index
            .map(cell)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    let title = cell(columns.title).to_string();
    let artist = cell(columns.artist).to_string();

    let mut errors = Vec::new();
    if title.is_empty() {
        errors.push("Missing title".to_string());
    }
    if artist.is_empty() {
        errors.push("Missing artist".to_string());
    }

    ParsedRow {
        row,
        title,
        artist,
        album: optional(columns.album),
        duration: columns.duration.map(cell).and_then(parse_duration),
        genre: optional(columns.genre),
        errors,
    }
}

/// Split one line into trimmed fields, honouring double quotes.
pub fn split_fields(line: &str) -> Result<Vec<String>, FieldError> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut field).trim().to_string()),
                _ => field.push(c),
            }
        }
    }

    if in_quotes {
        return Err(FieldError::UnterminatedQuote);
    }
    fields.push(field.trim().to_string());
    Ok(fields)
}

/// Parse a duration cell into seconds.
///
/// Accepts plain seconds (`334`), `M:SS` / `MM:SS` (`5:34`) and `XmYYs`
/// (`5m34s`). Anything else is `None`.
pub fn parse_duration(value: &str) -> Option<u32> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if value.bytes().all(|b| b.is_ascii_digit()) {
        return value.parse().ok();
    }

    if let Some((minutes, seconds)) = value.split_once(':') {
        return minutes_and_seconds(minutes, seconds);
    }

    let rest = value.strip_suffix('s')?;
    let (minutes, seconds) = rest.split_once('m')?;
    minutes_and_seconds(minutes, seconds)
}

fn minutes_and_seconds(minutes: &str, seconds: &str) -> Option<u32> {
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(minutes) || !all_digits(seconds) || seconds.len() > 2 {
        return None;
    }

    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    minutes.checked_mul(60)?.checked_add(seconds)
}

/// Split rows into committable and rejected ones.
///
/// A row is valid iff it has a title, an artist, and no parse errors.
pub fn validate_songs(rows: Vec<ParsedRow>) -> Validation {
    let mut validation = Validation::default();

    for row in rows {
        if row.is_valid() {
            validation.valid.push(row);
            continue;
        }

        let mut reasons = row.errors.clone();
        for (empty, reason) in [
            (row.title.is_empty(), "Missing title"),
            (row.artist.is_empty(), "Missing artist"),
        ] {
            if empty && !reasons.iter().any(|r| r == reason) {
                reasons.push(reason.to_string());
            }
        }
        validation.invalid.push(InvalidRow { row: row.row, reasons });
    }

    validation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_fields_keep_commas() {
        let result = parse_csv("title,artist\n\"Song, Part 1\",\"Artist, The\"\n");
        assert!(result.success);
        assert_eq!(result.songs.len(), 1);
        assert_eq!(result.songs[0].title, "Song, Part 1");
        assert_eq!(result.songs[0].artist, "Artist, The");
    }

    #[test]
    fn test_doubled_quote_is_literal() {
        let fields = split_fields(r#""Say ""Hello""",  plain  , " padded ""#).unwrap();
        assert_eq!(fields, vec![r#"Say "Hello""#, "plain", "padded"]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(
            split_fields("\"open,artist"),
            Err(FieldError::UnterminatedQuote)
        );

        let result = parse_csv("title,artist\n\"open,Someone\nGood,Band\n");
        assert!(result.success);
        assert_eq!(result.invalid_rows, 1);
        assert_eq!(result.valid_rows, 1);
        assert_eq!(result.songs[0].errors, vec!["Unterminated quoted field"]);
    }

    #[test]
    fn test_quoted_field_does_not_span_lines() {
        let result = parse_csv("title,artist\n\"Two\nLines\",Band\nGood,Band\n");
        assert!(result.success);
        assert_eq!(result.valid_rows, 1);
        assert_eq!(result.invalid_rows, 2);

        let rows: Vec<usize> = result.songs.iter().filter(|r| !r.is_valid()).map(|r| r.row).collect();
        assert_eq!(rows, vec![1, 2]);
        assert!(result.songs[..2].iter().all(|r| r.errors == vec!["Unterminated quoted field"]));
        assert_eq!(result.songs[2].title, "Good");
    }

    #[test]
    fn test_empty_input_is_rejected() {
        for text in ["", "   ", "\n\n"] {
            let result = parse_csv(text);
            assert!(!result.success);
            assert!(result.errors[0].contains("empty"));
        }
    }

    #[test]
    fn test_missing_header_names_title() {
        let result = parse_csv("name,performer\nSong,Band\n");
        assert!(!result.success);
        assert!(result.errors[0].contains("title"));
        assert!(result.songs.is_empty());
    }

    #[test]
    fn test_header_match_is_case_sensitive() {
        let result = parse_csv("Title,Artist\nSong,Band\n");
        assert!(!result.success);
    }

    #[test]
    fn test_optional_columns_in_any_order() {
        let result = parse_csv("genre,duration,artist,album,title\nrock,3:05,Band,Record,Song\n");
        let row = &result.songs[0];
        assert_eq!(row.title, "Song");
        assert_eq!(row.artist, "Band");
        assert_eq!(row.album.as_deref(), Some("Record"));
        assert_eq!(row.duration, Some(185));
        assert_eq!(row.genre.as_deref(), Some("rock"));
    }

    #[test]
    fn test_duration_formats() {
        assert_eq!(parse_duration("334"), Some(334));
        assert_eq!(parse_duration("5:34"), Some(334));
        assert_eq!(parse_duration("05:34"), Some(334));
        assert_eq!(parse_duration("5m34s"), Some(334));
        assert_eq!(parse_duration(" 3m5s "), Some(185));
        assert_eq!(parse_duration("invalid"), None);
        assert_eq!(parse_duration("5:75"), None);
        assert_eq!(parse_duration("5:"), None);
        assert_eq!(parse_duration("-3"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_unparseable_duration_does_not_fail_row() {
        let result = parse_csv("title,artist,duration\nSong,Band,invalid\n");
        assert_eq!(result.valid_rows, 1);
        assert_eq!(result.songs[0].duration, None);
        assert!(result.songs[0].errors.is_empty());
    }

    #[test]
    fn test_blank_lines_keep_row_numbers() {
        let text = "title,artist\nOne,A\n\n   \nTwo,\nThree,C\n";
        let result = parse_csv(text);

        let rows: Vec<usize> = result.songs.iter().map(|s| s.row).collect();
        assert_eq!(rows, vec![1, 4, 5]);
        assert_eq!(result.invalid_rows, 1);
        assert_eq!(result.errors, vec!["Row 4: Missing artist"]);
    }

    #[test]
    fn test_short_rows_are_flagged_not_dropped() {
        let result = parse_csv("title,artist,album\nLonely\n");
        assert_eq!(result.songs.len(), 1);
        assert_eq!(result.songs[0].errors, vec!["Missing artist"]);
    }

    #[test]
    fn test_validate_songs_splits_rows() {
        let result = parse_csv("title,artist\nOne,A\n,\nThree,C\n");
        let validation = validate_songs(result.songs);

        assert_eq!(validation.valid.len(), 2);
        assert_eq!(validation.invalid.len(), 1);
        assert_eq!(validation.invalid[0].row, 2);
        assert_eq!(
            validation.invalid[0].reasons,
            vec!["Missing title", "Missing artist"]
        );
    }

    #[test]
    fn test_validate_reports_missing_fields_on_hand_built_rows() {
        let row = ParsedRow {
            row: 7,
            title: "Song".to_string(),
            artist: String::new(),
            album: None,
            duration: None,
            genre: None,
            errors: vec![],
        };
        let validation = validate_songs(vec![row]);
        assert_eq!(validation.invalid[0].reasons, vec!["Missing artist"]);
    }
}
