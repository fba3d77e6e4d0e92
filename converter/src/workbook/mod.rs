//! Workbook input and output.
//!
//! A workbook is up to three named sheets: `survey`, `choices` and
//! `settings`. Two on-disk layouts are supported:
//!
//! - a directory holding `survey.csv`, `choices.csv`, `settings.csv`
//!   (missing files mean missing sheets)
//! - a single JSON document `{"survey": Table, "choices": Table, "settings": Table}`
//!
//! Sheets are written in the order survey, choices, settings.

pub mod sheet;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::WorkbookResult;
use crate::models::{SheetKind, Table};

pub use sheet::{
    decode_content, detect_delimiter, detect_encoding, parse_sheet, parse_sheet_bytes,
    write_sheet, ParsedSheet,
};

/// The three XLSForm sheets, any of which may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub survey: Option<Table>,
    #[serde(default)]
    pub choices: Option<Table>,
    #[serde(default)]
    pub settings: Option<Table>,
}

impl Workbook {
    /// A sheet by kind.
    pub fn sheet(&self, kind: SheetKind) -> Option<&Table> {
        match kind {
            SheetKind::Survey => self.survey.as_ref(),
            SheetKind::Choices => self.choices.as_ref(),
            SheetKind::Settings => self.settings.as_ref(),
        }
    }

    /// Replace a sheet.
    pub fn set_sheet(&mut self, kind: SheetKind, table: Table) {
        let slot = match kind {
            SheetKind::Survey => &mut self.survey,
            SheetKind::Choices => &mut self.choices,
            SheetKind::Settings => &mut self.settings,
        };
        *slot = Some(table);
    }

    /// Names of the sheets that are absent.
    pub fn missing_sheets(&self) -> Vec<SheetKind> {
        SheetKind::ALL
            .into_iter()
            .filter(|k| self.sheet(*k).is_none())
            .collect()
    }

    /// Parse a JSON workbook.
    pub fn from_json(content: &str) -> WorkbookResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> WorkbookResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read `<dir>/<sheet>.csv` for every sheet that exists.
    pub fn read_dir(dir: &Path) -> WorkbookResult<Self> {
        let mut workbook = Self::default();
        for kind in SheetKind::ALL {
            let path = sheet_path(dir, kind);
            if !path.is_file() {
                continue;
            }
            let bytes = fs::read(&path)?;
            let parsed = parse_sheet_bytes(kind.as_str(), &bytes)?;
            workbook.set_sheet(kind, parsed.table);
        }
        Ok(workbook)
    }

    /// Write every present sheet as `<dir>/<sheet>.csv`, creating `dir`.
    ///
    /// Returns the written paths in sheet order.
    pub fn write_dir(&self, dir: &Path) -> WorkbookResult<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        for kind in SheetKind::ALL {
            if let Some(table) = self.sheet(kind) {
                let path = sheet_path(dir, kind);
                fs::write(&path, write_sheet(kind.as_str(), table)?)?;
                written.push(path);
            }
        }
        Ok(written)
    }

    /// Read a workbook from a directory or a `.json` file.
    pub fn read(path: &Path) -> WorkbookResult<Self> {
        if path.is_dir() {
            Self::read_dir(path)
        } else {
            Self::from_json(&fs::read_to_string(path)?)
        }
    }

    /// Write to a `.json` file, or to a directory of CSV sheets otherwise.
    pub fn write(&self, path: &Path) -> WorkbookResult<Vec<PathBuf>> {
        if is_json_path(path) {
            fs::write(path, self.to_json()?)?;
            Ok(vec![path.to_path_buf()])
        } else {
            self.write_dir(path)
        }
    }
}

fn sheet_path(dir: &Path, kind: SheetKind) -> PathBuf {
    dir.join(format!("{}.csv", kind.as_str()))
}

fn is_json_path(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("json"))
}
