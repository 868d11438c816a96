use crate::error::IngestError;
use crate::model::Delimiter;
use std::collections::HashMap;

/// Fraction of non-empty sample lines that must split into the same field
/// count for a delimiter to qualify.
const CONSISTENCY_RATIO: f64 = 0.9;

/// Guess the field separator of a delimited text file from sample lines.
///
/// A candidate wins when it splits at least 90% of the non-empty sampled
/// lines into the same field count (>1). Among winners the one with the
/// largest modal field count is preferred: more columns means a more
/// specific, less accidental match. A file with a single non-empty line
/// falls back to counting delimiter occurrences on that line and never
/// fails; otherwise an inconsistent sample is `AmbiguousDelimiter`.
pub fn guess(sample_lines: &[&str]) -> Result<Delimiter, IngestError> {
    let non_empty: Vec<&str> = sample_lines
        .iter()
        .copied()
        .filter(|l| !l.trim().is_empty())
        .collect();

    if non_empty.is_empty() {
        return Err(IngestError::AmbiguousDelimiter);
    }

    if non_empty.len() == 1 {
        return Ok(guess_single_line(non_empty[0]));
    }

    let mut best: Option<(Delimiter, usize)> = None;
    for delim in Delimiter::ALL {
        if let Some(modal) = consistent_field_count(&non_empty, delim) {
            // Strictly-greater keeps candidate order as the tie-break.
            if best.map_or(true, |(_, m)| modal > m) {
                best = Some((delim, modal));
            }
        }
    }

    best.map(|(d, _)| d).ok_or(IngestError::AmbiguousDelimiter)
}

/// Modal field count for `delim` if it covers enough of the sample, else None.
fn consistent_field_count(lines: &[&str], delim: Delimiter) -> Option<usize> {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    for line in lines {
        let fields = line.split(delim.as_char()).count();
        *counts.entry(fields).or_insert(0) += 1;
    }

    let (modal_fields, occurrences) = counts
        .into_iter()
        .max_by_key(|(fields, occurrences)| (*occurrences, *fields))?;

    if modal_fields < 2 {
        return None;
    }

    let required = (lines.len() as f64 * CONSISTENCY_RATIO).ceil() as usize;
    if occurrences >= required {
        Some(modal_fields)
    } else {
        None
    }
}

/// Single-line fallback: the candidate occurring most often on the line.
fn guess_single_line(line: &str) -> Delimiter {
    let mut best = (Delimiter::ALL[0], 0usize);
    for delim in Delimiter::ALL {
        let occurrences = line.matches(delim.as_char()).count();
        if occurrences > best.1 {
            best = (delim, occurrences);
        }
    }
    best.0
}
