//! Page range expressions and split planning.

use std::collections::BTreeSet;

use crate::error::{DocumentError, DocumentResult};

/// How a document is cut into chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitMode {
    /// One chunk holding the pages named by a range expression.
    Range(String),
    /// Consecutive chunks of `n` pages.
    Every(usize),
    /// One chunk per page.
    All,
}

/// Parse `"a-b,c,d-e"` (1-based) into sorted, deduplicated zero-based
/// indices below `page_count`. Numbers outside the document are ignored.
pub fn parse_page_range(expression: &str, page_count: usize) -> DocumentResult<Vec<usize>> {
    let mut pages = BTreeSet::new();

    for part in expression.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start = page_number(start, part)?;
                let end = page_number(end, part)?.min(page_count);
                for number in start.max(1)..=end {
                    pages.insert(number - 1);
                }
            }
            None => {
                let number = page_number(part, part)?;
                if (1..=page_count).contains(&number) {
                    pages.insert(number - 1);
                }
            }
        }
    }

    Ok(pages.into_iter().collect())
}

fn page_number(token: &str, part: &str) -> DocumentResult<usize> {
    token.trim().parse::<usize>().map_err(|_| {
        DocumentError::InvalidOption(format!("Invalid page range segment '{part}'"))
    })
}

/// Zero-based page chunks for a split.
pub fn plan_chunks(mode: &SplitMode, page_count: usize) -> DocumentResult<Vec<Vec<usize>>> {
    let chunks = match mode {
        SplitMode::Range(expression) => {
            let pages = parse_page_range(expression, page_count)?;
            if pages.is_empty() {
                return Err(DocumentError::InvalidOption(format!(
                    "Page range '{expression}' selects no pages of a {page_count}-page document"
                )));
            }
            vec![pages]
        }
        SplitMode::Every(n) => {
            if *n == 0 {
                return Err(DocumentError::InvalidOption(
                    "Chunk size must be at least 1".to_string(),
                ));
            }
            (0..page_count)
                .collect::<Vec<_>>()
                .chunks(*n)
                .map(<[usize]>::to_vec)
                .collect()
        }
        SplitMode::All => (0..page_count).map(|i| vec![i]).collect(),
    };
    Ok(chunks)
}
