//! CSV tool table keyed by tool number.
//!
//! Rows carry the cutter type in column 0, diameter in 6, corner radius in 7,
//! taper angle in 9, flute length in 14 and the tool number in 16.

use std::fs;
use std::path::Path;

use hashbrown::HashMap;
use kerf_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::shape::ToolShape;

const COL_KIND: usize = 0;
const COL_DIAMETER: usize = 6;
const COL_CORNER_RADIUS: usize = 7;
const COL_TAPER_ANGLE: usize = 9;
const COL_FLUTE_LENGTH: usize = 14;
const COL_NUMBER: usize = 16;

/// Cutter family of a tool table row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    Square,
    Ball,
    Vee,
    Dovetail,
}

impl ToolKind {
    fn from_column(raw: &str) -> Option<Self> {
        match raw.trim() {
            "SQUARE" => Some(Self::Square),
            "BALL" => Some(Self::Ball),
            "VEE" => Some(Self::Vee),
            "DOVETAIL" => Some(Self::Dovetail),
            _ => None,
        }
    }
}

/// One row of the tool table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub kind: ToolKind,
    pub diameter: f64,
    pub corner_radius: f64,
    /// Half of the included angle, in degrees
    pub taper_angle: f64,
    pub flute_length: f64,
}

impl ToolSpec {
    /// Cutter profile for this tool.
    pub fn shape(&self) -> Result<ToolShape> {
        let radius = self.diameter / 2.0;
        let length = self.flute_length;
        match self.kind {
            ToolKind::Square => Ok(ToolShape::FlatMill { length, radius }),
            ToolKind::Ball => Ok(ToolShape::BallMill { length, radius }),
            ToolKind::Vee => Ok(ToolShape::VMill {
                length,
                radius,
                included_angle: self.taper_angle * 2.0,
            }),
            ToolKind::Dovetail => {
                Err(Error::UnknownTool("dovetail cutters are not modelled".into()))
            }
        }
    }
}

/// Tools loaded from a CSV table.
#[derive(Clone, Debug, Default)]
pub struct ToolLibrary {
    tools: HashMap<u32, ToolSpec>,
}

impl ToolLibrary {
    /// Load a tool table from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let library = Self::parse(&text);
        info!(path = %path.display(), tools = library.len(), "loaded tool table");
        Ok(library)
    }

    /// Parse table text. Rows that cannot be read are skipped with a warning.
    pub fn parse(text: &str) -> Self {
        let mut tools = HashMap::new();
        for (line_no, line) in text.lines().enumerate() {
            let fields = split_csv_line(line);
            if fields.len() <= 1 {
                continue;
            }
            match parse_row(&fields) {
                Ok(Some((number, spec))) => {
                    debug!(number, ?spec, "tool");
                    tools.insert(number, spec);
                }
                // header row
                Ok(None) => {}
                Err(err) => warn!(line = line_no + 1, %err, "skipping tool table row"),
            }
        }
        Self { tools }
    }

    pub fn get(&self, number: u32) -> Option<&ToolSpec> {
        self.tools.get(&number)
    }

    /// Cutter profile of tool `number`.
    pub fn shape(&self, number: u32) -> Result<ToolShape> {
        self.get(number)
            .ok_or_else(|| Error::UnknownTool(format!("tool number {number}")))?
            .shape()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn parse_row(fields: &[String]) -> Result<Option<(u32, ToolSpec)>> {
    let Some(kind) = fields.get(COL_KIND).and_then(|raw| ToolKind::from_column(raw)) else {
        let raw = fields.get(COL_KIND).map_or("", String::as_str);
        // A table header names its columns, data rows carry a number
        if fields.get(COL_NUMBER).is_some_and(|n| n.trim().parse::<u32>().is_err()) {
            return Ok(None);
        }
        return Err(Error::UnknownTool(format!("tool type '{raw}'")));
    };

    let number_field = |col: usize| -> Result<f64> {
        let raw = fields
            .get(col)
            .ok_or_else(|| Error::InvalidDirective(format!("missing column {col}")))?;
        raw.trim()
            .parse()
            .map_err(|_| Error::InvalidDirective(format!("column {col}: '{raw}' is not a number")))
    };

    let number = fields
        .get(COL_NUMBER)
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .ok_or_else(|| Error::InvalidDirective("missing tool number".into()))?;

    Ok(Some((
        number,
        ToolSpec {
            kind,
            diameter: number_field(COL_DIAMETER)?,
            corner_radius: number_field(COL_CORNER_RADIUS)?,
            taper_angle: number_field(COL_TAPER_ANGLE)?,
            flute_length: number_field(COL_FLUTE_LENGTH)?,
        },
    )))
}

/// Split one CSV line, honouring double quotes and `\` escapes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.trim_end_matches(['\r', '\n']).chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    field.push(next);
                }
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}
