// SPDX-License-Identifier: MIT OR Apache-2.0

//! Match-window highlighting.
//!
//! Selection and banding are separate passes. The first pass walks matched
//! lines in order and groups them into clusters (match, trailing context and
//! an optional bridged gap) until the line budget runs out. The second pass
//! gives clusters alternating color bands. Nothing already planned is
//! rewritten afterwards.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::output::paint_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightOptions {
    /// Matched lines shown before the excerpt is cut.
    pub budget: usize,
    /// Context lines shown after each match.
    pub radius: usize,
    /// Show every line of the document and ignore the budget.
    pub full_document: bool,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            budget: 50,
            radius: 2,
            full_document: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderLine {
    pub line_index: usize,
    pub text: String,
    pub show: bool,
    pub bold: bool,
    pub color_band: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderPlan {
    pub lines: Vec<RenderLine>,
    pub first_match: Option<usize>,
    pub line_number_width: usize,
}

impl RenderPlan {
    pub fn visible(&self) -> impl Iterator<Item = &RenderLine> {
        self.lines.iter().filter(|line| line.show)
    }

    pub fn visible_indexes(&self) -> Vec<usize> {
        self.visible().map(|line| line.line_index).collect()
    }

    /// Plain text, one `index | text` row per visible line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in self.visible() {
            out.push_str(&self.prefix(line.line_index));
            out.push_str(&line.text);
            out.push('\n');
        }
        out
    }

    /// Terminal rendering with bold matches and banded colors.
    pub fn render_colored(&self) -> String {
        let mut out = String::new();
        for line in self.visible() {
            let row = format!("{}{}", self.prefix(line.line_index), line.text);
            out.push_str(&paint_line(&row, line.bold, line.color_band).to_string());
            out.push('\n');
        }
        out
    }

    fn prefix(&self, index: usize) -> String {
        format!("{:>width$} | ", index, width = self.line_number_width)
    }
}

/// Contiguous run of planned lines, `start..=end`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Cluster {
    start: usize,
    end: usize,
    last_match: usize,
}

impl Cluster {
    fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Plan the excerpt for `content` given the engine's matched line indexes.
pub fn plan(content: &str, matched: &BTreeSet<usize>, options: &HighlightOptions) -> RenderPlan {
    let lines: Vec<&str> = content.lines().collect();
    plan_lines(&lines, matched, options)
}

pub fn plan_lines(lines: &[&str], matched: &BTreeSet<usize>, options: &HighlightOptions) -> RenderPlan {
    let line_number_width = digits(lines.len().saturating_sub(1));
    let in_range: Vec<usize> = matched.range(..lines.len()).copied().collect();

    let planned: Vec<RenderLine> = if options.full_document {
        // Whole document: only matched lines are colored, in a single band.
        (0..lines.len())
            .map(|index| {
                let bold = matched.contains(&index);
                RenderLine {
                    line_index: index,
                    text: lines[index].to_string(),
                    show: true,
                    bold,
                    color_band: bold.then_some(0),
                }
            })
            .collect()
    } else {
        let clusters = select(&in_range, lines.len(), options);
        let bands = band_of_line(&clusters, lines.len());
        clusters
            .iter()
            .flat_map(|cluster| cluster.start..=cluster.end)
            .map(|index| RenderLine {
                line_index: index,
                text: lines[index].to_string(),
                show: true,
                bold: matched.contains(&index),
                color_band: bands[index],
            })
            .collect()
    };

    RenderPlan {
        lines: planned,
        first_match: in_range.first().copied(),
        line_number_width,
    }
}

/// First pass: group matches into clusters within the budget.
fn select(matches: &[usize], line_count: usize, options: &HighlightOptions) -> Vec<Cluster> {
    let radius = options.radius;
    let last_line = line_count.saturating_sub(1);
    let mut budget = options.budget as i64;
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut visible = 0usize;

    for &line in matches {
        budget -= 1;
        let exhausted = budget < 0;
        // The match that exhausts the budget is shown without its context.
        let end = if exhausted {
            line
        } else {
            (line + radius).min(last_line)
        };

        let joins_previous = clusters
            .last()
            .is_some_and(|cluster| line <= cluster.last_match + radius);

        if joins_previous {
            if let Some(cluster) = clusters.last_mut() {
                visible -= cluster.len();
                // Context planned by earlier matches ends at the cut too.
                cluster.end = if exhausted { line } else { cluster.end.max(end) };
                cluster.last_match = line;
                visible += cluster.len();
            }
        } else {
            let mut start = line;
            if let Some(previous) = clusters.last() {
                let gap = line - previous.end - 1;
                if visible >= 2 && gap <= radius {
                    start = previous.end + 1;
                }
            }
            let cluster = Cluster {
                start,
                end,
                last_match: line,
            };
            visible += cluster.len();
            clusters.push(cluster);
        }

        if exhausted {
            break;
        }
    }

    clusters
}

/// Second pass: alternate bands per cluster, indexed by line.
fn band_of_line(clusters: &[Cluster], line_count: usize) -> Vec<Option<usize>> {
    let mut bands = vec![None; line_count];
    for (ordinal, cluster) in clusters.iter().enumerate() {
        for slot in &mut bands[cluster.start..=cluster.end] {
            *slot = Some(ordinal % 2);
        }
    }
    bands
}

fn digits(mut value: usize) -> usize {
    let mut count = 1;
    while value >= 10 {
        value /= 10;
        count += 1;
    }
    count
}
