//! Block Scanner
//!
//! Line-oriented, two-stage scan. A fence state machine finds each query,
//! then the lines after its closing fence are checked for the output section
//! a previous run left behind.

use std::ops::Range;

pub const OPEN_FENCE: &str = "```inline dataview";
pub const CLOSE_FENCE: &str = "```";
pub const OUTPUT_START: &str = "<!--DATAVIEW INLINE START-->";
pub const OUTPUT_END: &str = "<!--DATAVIEW INLINE END-->";

/// One query block found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBlock<'a> {
    /// Byte range from the opening fence to the end of the output section
    /// (or the closing fence when there is none), excluding the final newline
    pub span: Range<usize>,
    /// Text strictly between the opening and closing fence lines
    pub query: &'a str,
    /// Previously rendered output, without the markers and the blank line
    /// that follows the start marker
    pub output: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    text: &'a str,
    start: usize,
    /// End of the line content, before the newline
    end: usize,
}

#[derive(Debug, Clone, Copy)]
enum ScanState {
    Outside,
    InBody { open: usize },
}

/// Location of an output section relative to the document lines
struct OutputSection {
    end_line: usize,
    body: Range<usize>,
}

fn split_lines(text: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for chunk in text.split_inclusive('\n') {
        let content = chunk.strip_suffix('\n').unwrap_or(chunk);
        lines.push(Line {
            text: content,
            start,
            end: start + content.len(),
        });
        start += chunk.len();
    }
    lines
}

/// Find every query block in `text`, left to right, without overlaps
pub fn scan(text: &str) -> Vec<QueryBlock<'_>> {
    let lines = split_lines(text);
    let mut blocks = Vec::new();
    let mut state = ScanState::Outside;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        match state {
            ScanState::Outside => {
                if line.text == OPEN_FENCE {
                    state = ScanState::InBody { open: i };
                }
                i += 1;
            }
            ScanState::InBody { open } => {
                // The body needs at least one line
                if line.text == CLOSE_FENCE && i > open + 1 {
                    let query = &text[lines[open + 1].start..lines[i - 1].end];
                    let (end_line, output) = match find_output(&lines, i + 1) {
                        Some(section) => (section.end_line, Some(&text[section.body])),
                        None => (i, None),
                    };
                    let output = output.map(|body| body.strip_prefix('\n').unwrap_or(body));

                    blocks.push(QueryBlock {
                        span: lines[open].start..lines[end_line].end,
                        query,
                        output,
                    });
                    state = ScanState::Outside;
                    i = end_line + 1;
                } else if line.text == OPEN_FENCE {
                    state = ScanState::InBody { open: i };
                    i += 1;
                } else if line.text.contains(CLOSE_FENCE) {
                    state = ScanState::Outside;
                    i += 1;
                } else {
                    i += 1;
                }
            }
        }
    }

    blocks
}

/// Look for an output section starting at line `from`, after optional blank lines
fn find_output(lines: &[Line<'_>], from: usize) -> Option<OutputSection> {
    let mut start = from;
    while start < lines.len() && lines[start].text.is_empty() {
        start += 1;
    }
    if lines.get(start)?.text != OUTPUT_START {
        return None;
    }

    for end in start + 1..lines.len() {
        match lines[end].text {
            OUTPUT_END => {
                let body_start = lines[start + 1].start;
                let body_end = if end > start + 1 {
                    lines[end - 1].end
                } else {
                    body_start
                };
                return Some(OutputSection {
                    end_line: end,
                    body: body_start..body_end,
                });
            }
            // Never swallow the next block
            OUTPUT_START | OPEN_FENCE => return None,
            _ => {}
        }
    }

    None
}
