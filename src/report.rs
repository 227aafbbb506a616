// File: report.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::factor::Change;
use crate::fanout::FanOutResult;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub index: usize,
    pub status_code: u16,
    pub content_length: usize,
    pub changes: Vec<Change>,
}

impl From<&FanOutResult> for ReportEntry {
    fn from(result: &FanOutResult) -> Self {
        ReportEntry {
            index: result.index,
            status_code: result.candidate.status_code(),
            content_length: result.candidate.content_length(),
            changes: result.changes.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

pub struct ReportGenerator;

impl ReportGenerator {
    /// Builds entries ordered by candidate index.
    pub fn entries(results: &[FanOutResult]) -> Vec<ReportEntry> {
        let mut entries: Vec<ReportEntry> = results.iter().map(ReportEntry::from).collect();
        entries.sort_by_key(|entry| entry.index);
        entries
    }

    pub fn render(entries: &[ReportEntry], format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(Self::render_text(entries)),
            ReportFormat::Json => Self::render_json(entries),
        }
    }

    pub fn generate_report(
        entries: &[ReportEntry],
        output_path: impl AsRef<Path>,
        format: ReportFormat,
    ) -> Result<()> {
        let output_path = output_path.as_ref();
        let rendered = Self::render(entries, format)?;
        let mut file = File::create(output_path)
            .with_context(|| format!("Failed to create report file {}", output_path.display()))?;
        writeln!(file, "{}", rendered).context("Failed to write report")?;
        Ok(())
    }

    pub fn render_text(entries: &[ReportEntry]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Candidates with changes: {}", entries.len());
        for entry in entries {
            let _ = writeln!(
                out,
                "\n#{} [HTTP {}] {} bytes, {} change(s)",
                entry.index,
                entry.status_code,
                entry.content_length,
                entry.changes.len()
            );
            for change in &entry.changes {
                for line in change.to_string().lines() {
                    let _ = writeln!(out, "  {}", line);
                }
            }
        }
        out
    }

    pub fn render_json(entries: &[ReportEntry]) -> Result<String> {
        serde_json::to_string_pretty(entries)
            .map_err(|e| anyhow::anyhow!("Failed to serialize report to JSON: {}", e))
    }
}
