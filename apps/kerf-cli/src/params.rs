//! Command line parameters.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use glam::DVec3;

/// Settings for one headless run (from CLI or defaults).
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    /// Grid origin
    pub start: DVec3,
    /// Stock size
    pub size: DVec3,
    /// True when any of `-X/-Y/-Z` was given
    pub explicit_size: bool,
    pub resolution: f64,
    pub toolpath: Option<PathBuf>,
    /// Tool directive such as `BallMill 20 1.5`
    pub tool: Option<String>,
    pub tool_file: Option<PathBuf>,
    pub tool_number: Option<u32>,
    pub load_grid: Option<PathBuf>,
    pub flip: bool,
    pub save_grid: Option<PathBuf>,
    pub burst_budget: Duration,
    pub help: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            start: DVec3::ZERO,
            size: DVec3::ONE,
            explicit_size: false,
            resolution: 0.01,
            toolpath: None,
            tool: None,
            tool_file: None,
            tool_number: None,
            load_grid: None,
            flip: false,
            save_grid: None,
            burst_budget: Duration::from_millis(500),
            help: false,
        }
    }
}

impl Params {
    /// Parse parameters from `args`, program name excluded.
    pub fn from_args<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut params = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| anyhow!("missing value for {arg}"))
            };
            match arg.as_str() {
                "-h" | "--help" => params.help = true,
                "-x" => params.start.x = number(&arg, &value()?)?,
                "-y" => params.start.y = number(&arg, &value()?)?,
                "-z" => params.start.z = number(&arg, &value()?)?,
                "-X" => {
                    params.size.x = number(&arg, &value()?)?;
                    params.explicit_size = true;
                }
                "-Y" => {
                    params.size.y = number(&arg, &value()?)?;
                    params.explicit_size = true;
                }
                "-Z" => {
                    params.size.z = number(&arg, &value()?)?;
                    params.explicit_size = true;
                }
                "-r" | "--resolution" => params.resolution = number(&arg, &value()?)?,
                "-p" | "--toolpath" => params.toolpath = Some(value()?.into()),
                "-t" | "--tool" => params.tool = Some(value()?),
                "--tool-file" => params.tool_file = Some(value()?.into()),
                "--tool-number" => params.tool_number = Some(number(&arg, &value()?)?),
                "--load-grid" => params.load_grid = Some(value()?.into()),
                "--flip" => params.flip = true,
                "--save-grid" => params.save_grid = Some(value()?.into()),
                "--burst-ms" => {
                    params.burst_budget = Duration::from_millis(number(&arg, &value()?)?);
                }
                other => bail!("unknown option {other}"),
            }
        }

        if params.tool_number.is_some() && params.tool_file.is_none() {
            bail!("--tool-number needs --tool-file");
        }
        if params.tool_file.is_some() && params.tool_number.is_none() {
            bail!("--tool-file needs --tool-number");
        }
        Ok(params)
    }
}

fn number<T>(flag: &str, raw: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse()
        .with_context(|| format!("invalid value '{raw}' for {flag}"))
}
