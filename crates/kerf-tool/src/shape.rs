//! Tool shapes named by comment directives such as `(BallMill 25 3.175)`.

use std::fmt;
use std::str::FromStr;

use kerf_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::part::BitPart;

/// Tip radius of the point of a V mill.
const VMILL_TIP_RADIUS: f64 = 0.001;

/// Split a directive line on spaces, brackets, `=` and `,`.
pub fn directive_tokens(line: &str) -> Vec<&str> {
    line.split(|c: char| matches!(c, ' ' | '(' | ')' | '[' | ']' | '=' | ',') || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Numeric argument `index` of a directive.
pub(crate) fn number_arg(tokens: &[&str], index: usize) -> Result<f64> {
    let name = tokens.first().copied().unwrap_or_default();
    let raw = tokens.get(index).ok_or_else(|| {
        Error::InvalidDirective(format!("{name}: missing argument {index}"))
    })?;
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::InvalidDirective(format!("{name}: '{raw}' is not a number")))
}

/// A cutter profile, in the units of the toolpath.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ToolShape {
    /// Square end mill
    FlatMill { length: f64, radius: f64 },
    /// Ball nose mill
    BallMill { length: f64, radius: f64 },
    /// Engraving cutter with the given included angle in degrees
    VMill {
        length: f64,
        radius: f64,
        included_angle: f64,
    },
}

impl ToolShape {
    /// True when `line` names a tool shape, known or not.
    pub fn is_directive(line: &str) -> bool {
        directive_tokens(line)
            .first()
            .is_some_and(|word| word.ends_with("Mill"))
    }

    /// Primitive decomposition, tip at the local origin.
    pub fn parts(&self) -> Vec<BitPart> {
        match *self {
            Self::FlatMill { length, radius } => vec![BitPart::cylinder(0.0, length, radius)],
            Self::BallMill { length, radius } => vec![
                BitPart::cylinder(radius, length - radius, radius),
                BitPart::sphere(radius, radius),
            ],
            Self::VMill {
                length,
                radius,
                included_angle,
            } => {
                let height = radius / (included_angle / 2.0).to_radians().tan();
                vec![
                    BitPart::cylinder(height, length - height, radius),
                    BitPart::cone(0.0, height, VMILL_TIP_RADIUS, radius),
                ]
            }
        }
    }

    fn validate(self) -> Result<Self> {
        let (name, length, radius) = match self {
            Self::FlatMill { length, radius } => ("FlatMill", length, radius),
            Self::BallMill { length, radius } => ("BallMill", length, radius),
            Self::VMill {
                length,
                radius,
                included_angle,
            } => {
                if !(included_angle > 0.0 && included_angle < 180.0) {
                    return Err(Error::InvalidDirective(format!(
                        "VMill: included angle {included_angle} outside (0, 180)"
                    )));
                }
                ("VMill", length, radius)
            }
        };
        if radius <= 0.0 || length <= 0.0 {
            return Err(Error::InvalidDirective(format!(
                "{name}: length and radius must be positive"
            )));
        }
        Ok(self)
    }
}

impl FromStr for ToolShape {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let tokens = directive_tokens(line);
        let shape = match tokens.first().copied() {
            Some("FlatMill") => Self::FlatMill {
                length: number_arg(&tokens, 1)?,
                radius: number_arg(&tokens, 2)?,
            },
            Some("BallMill") => Self::BallMill {
                length: number_arg(&tokens, 1)?,
                radius: number_arg(&tokens, 2)?,
            },
            Some("VMill") => Self::VMill {
                length: number_arg(&tokens, 1)?,
                radius: number_arg(&tokens, 2)?,
                included_angle: number_arg(&tokens, 3)?,
            },
            Some(other) => return Err(Error::UnknownTool(other.to_string())),
            None => return Err(Error::UnknownTool(String::new())),
        };
        shape.validate()
    }
}

impl fmt::Display for ToolShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlatMill { length, radius } => write!(f, "FlatMill {length} {radius}"),
            Self::BallMill { length, radius } => write!(f, "BallMill {length} {radius}"),
            Self::VMill {
                length,
                radius,
                included_angle,
            } => write!(f, "VMill {length} {radius} {included_angle}"),
        }
    }
}
