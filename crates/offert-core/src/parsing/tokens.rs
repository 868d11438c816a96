use rust_decimal::Decimal;
use std::str::FromStr;

/// How a freeform text page separates its columns.
///
/// PDF and Word extractions hand the engine either real tab characters or
/// layout-preserving runs of spaces; the mode is detected page-locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    Tabs,
    SpaceRuns,
}

/// Pick the dominant column separator for a page, sampling its lines the
/// same way the delimiter detector samples a delimited file.
pub fn dominant_token_mode(lines: &[String]) -> TokenMode {
    let mut tab_lines = 0usize;
    let mut space_lines = 0usize;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if line.split('\t').filter(|t| !t.trim().is_empty()).count() > 1 {
            tab_lines += 1;
        } else if split_by_space_runs(line).len() > 1 {
            space_lines += 1;
        }
    }

    if tab_lines > 0 && tab_lines >= space_lines {
        TokenMode::Tabs
    } else {
        TokenMode::SpaceRuns
    }
}

/// Split one line into column tokens.
///
/// Tab mode keeps empty tokens so column positions survive; space-run mode
/// cannot represent empty columns and yields only the populated ones.
pub fn tokenize(line: &str, mode: TokenMode) -> Vec<String> {
    match mode {
        TokenMode::Tabs => line.split('\t').map(|t| t.trim().to_string()).collect(),
        TokenMode::SpaceRuns => split_by_space_runs(line)
            .into_iter()
            .map(|t| t.to_string())
            .collect(),
    }
}

/// Split a line by gaps of 2+ whitespace characters.
pub fn split_by_space_runs(line: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut segment_start: Option<usize> = None;
    let mut gap_start: Option<usize> = None;
    let mut gap_len = 0;

    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if gap_len == 0 {
                gap_start = Some(i);
            }
            gap_len += 1;
            if gap_len == 2 {
                if let (Some(s), Some(g)) = (segment_start, gap_start) {
                    segments.push(line[s..g].trim());
                    segment_start = None;
                }
            }
        } else {
            if segment_start.is_none() {
                segment_start = Some(i);
            }
            gap_len = 0;
        }
    }

    if let Some(s) = segment_start {
        segments.push(line[s..].trim());
    }

    segments
}

/// A calendar date in any of the source formats: `16.09.2020`, `16/09/20`,
/// `2020-09-16`. Separators are accepted, not normalized.
pub fn is_date_like(s: &str) -> bool {
    let s = s.trim();
    let sep = if s.contains('.') {
        '.'
    } else if s.contains('/') {
        '/'
    } else if s.contains('-') {
        '-'
    } else {
        return false;
    };

    let parts: Vec<&str> = s.split(sep).collect();
    if parts.len() != 3 || !parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit())) {
        return false;
    }

    let lens: Vec<usize> = parts.iter().map(|p| p.len()).collect();
    // day.month.year (or day/month/year) with a 2- or 4-digit year,
    // or ISO year-month-day.
    (lens[0] <= 2 && lens[1] <= 2 && (lens[2] == 2 || lens[2] == 4))
        || (lens[0] == 4 && lens[1] <= 2 && lens[2] <= 2)
}

/// A monetary or numeric amount: digits with optional comma/dot grouping
/// and decimal separators, optional sign. Dates are not amounts.
pub fn is_amount_like(s: &str) -> bool {
    !is_date_like(s) && parse_amount(s).is_some()
}

/// An amount that carries an explicit decimal separator, e.g. `55.00` or
/// `1.963,40`. Used to tell prices apart from bare quantities.
pub fn has_decimal_separator(s: &str) -> bool {
    let s = s.trim();
    match s.rfind([',', '.']) {
        Some(idx) => {
            let tail = &s[idx + 1..];
            !tail.is_empty() && tail.len() <= 2 && tail.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// A bare integer, the usual shape of a quantity column.
pub fn is_integer_like(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && s.len() <= 6 && s.chars().all(|c| c.is_ascii_digit())
}

/// A serial-number-shaped token: compact alphanumeric with both letters
/// and digits, like `CZJ8170VHN`.
pub fn is_serial_like(s: &str) -> bool {
    let s = s.trim();
    s.len() >= 6
        && s.chars().all(|c| c.is_ascii_alphanumeric())
        && s.chars().any(|c| c.is_ascii_digit())
        && s.chars().any(|c| c.is_ascii_alphabetic())
}

/// Parse an amount literal tolerating both locale conventions:
/// `1,963.40`, `1.963,40`, `55.00`, `1963`.
///
/// When both separators appear, the later one is the decimal point. A lone
/// separator followed by exactly three digits is read as grouping, which is
/// how the source documents overwhelmingly use it.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let mut s = s.trim();
    let negative = if let Some(rest) = s.strip_prefix('-') {
        s = rest.trim_start();
        true
    } else {
        false
    };

    // Grouping by spaces ("1 963,40") collapses before inspection.
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() || !compact.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.') {
        return None;
    }
    if !compact.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let comma = compact.rfind(',');
    let dot = compact.rfind('.');
    let normalized = match (comma, dot) {
        (Some(c), Some(d)) => {
            let (decimal_sep, group_sep) = if c > d { (',', '.') } else { ('.', ',') };
            let without_groups: String = compact.chars().filter(|&ch| ch != group_sep).collect();
            without_groups.replace(decimal_sep, ".")
        }
        (Some(idx), None) | (None, Some(idx)) => {
            let sep = compact.as_bytes()[idx] as char;
            if compact.matches(sep).count() > 1 || compact.len() - idx - 1 == 3 {
                // Multiple occurrences, or a 3-digit tail: grouping only.
                compact.chars().filter(|&ch| ch != sep).collect()
            } else {
                compact.replace(sep, ".")
            }
        }
        (None, None) => compact,
    };

    let value = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn space_run_split() {
        let segments = split_by_space_runs("818208-B21   HPE DL360 Gen10   55.00");
        assert_eq!(segments, vec!["818208-B21", "HPE DL360 Gen10", "55.00"]);
    }

    #[test]
    fn tab_mode_keeps_empty_columns() {
        let toks = tokenize("UJ558AC\t\t16.09.2020", TokenMode::Tabs);
        assert_eq!(toks, vec!["UJ558AC", "", "16.09.2020"]);
    }

    #[test]
    fn tab_lines_dominate_mode_detection() {
        let lines = vec![
            "Product\tQty\tPrice".to_string(),
            "818208-B21\t1\t55.00".to_string(),
        ];
        assert_eq!(dominant_token_mode(&lines), TokenMode::Tabs);
    }

    #[test]
    fn space_runs_when_no_tabs() {
        let lines = vec!["Product   Qty   Price".to_string()];
        assert_eq!(dominant_token_mode(&lines), TokenMode::SpaceRuns);
    }

    #[test]
    fn date_shapes() {
        assert!(is_date_like("16.09.2020"));
        assert!(is_date_like("1/9/20"));
        assert!(is_date_like("2020-09-16"));
        assert!(!is_date_like("1.963"));
        assert!(!is_date_like("1.963.40"));
        assert!(!is_date_like("55.00"));
    }

    #[test]
    fn amount_shapes() {
        assert!(is_amount_like("55.00"));
        assert!(is_amount_like("1,963.40"));
        assert!(is_amount_like("1963"));
        assert!(!is_amount_like("16.09.2020"));
        assert!(!is_amount_like("CZJ8170VHN"));
    }

    #[test]
    fn decimal_separator_detection() {
        assert!(has_decimal_separator("55.00"));
        assert!(has_decimal_separator("1.963,40"));
        assert!(!has_decimal_separator("1963"));
        assert!(!has_decimal_separator("1.963"));
    }

    #[test]
    fn serial_shape() {
        assert!(is_serial_like("CZJ8170VHN"));
        assert!(!is_serial_like("55.00"));
        assert!(!is_serial_like("HPE"));
        assert!(!is_serial_like("123456"));
    }

    #[test]
    fn amount_parsing_both_locales() {
        assert_eq!(parse_amount("1,963.40"), Some(dec!(1963.40)));
        assert_eq!(parse_amount("1.963,40"), Some(dec!(1963.40)));
        assert_eq!(parse_amount("55.00"), Some(dec!(55.00)));
        assert_eq!(parse_amount("1963"), Some(dec!(1963)));
        assert_eq!(parse_amount("1 963,40"), Some(dec!(1963.40)));
        assert_eq!(parse_amount("-12,50"), Some(dec!(-12.50)));
    }

    #[test]
    fn lone_separator_with_three_digit_tail_is_grouping() {
        assert_eq!(parse_amount("1,963"), Some(dec!(1963)));
        assert_eq!(parse_amount("1.963"), Some(dec!(1963)));
    }

    #[test]
    fn non_amounts_rejected() {
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("-"), None);
    }
}
