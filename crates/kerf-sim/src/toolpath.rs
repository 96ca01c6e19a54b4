//! Toolpaths: ordered tool poses, grouped into segments.

use glam::DVec3;
use kerf_core::{rotate_x, Error, Result, ToolPose};
use kerf_stock::StockSpec;
use kerf_tool::ToolShape;
use tracing::warn;

/// Default spacing between interpolated poses, in toolpath units.
pub const DEFAULT_MIN_STEP: f64 = 0.01;

/// Samples used to measure the length of a move with rotary motion.
const ROTARY_SAMPLES: u32 = 100;

/// Where a burst may end early.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StopPolicy {
    /// Yield no pose when one segment ends and the next begins
    pub after_segment: bool,
    /// Yield no pose after passing a comment line
    pub after_comment: bool,
}

impl StopPolicy {
    /// Run straight through every boundary.
    pub const NEVER: Self = Self {
        after_segment: false,
        after_comment: false,
    };
}

/// Source of tool poses for the simulation.
///
/// `next_pose` returning `None` is a normal control signal: either a stop
/// point chosen by the policy or the end of the path. [`Toolpath::has_more`]
/// tells the two apart.
pub trait Toolpath: Send {
    fn next_pose(&mut self, policy: StopPolicy) -> Option<ToolPose>;

    fn has_more(&self) -> bool;

    /// Move the cursor back to the first pose.
    fn rewind(&mut self);

    /// Tool change passed over since the last call, if any.
    fn take_tool_change(&mut self) -> Option<ToolShape> {
        None
    }

    /// Index of the segment under the cursor, for highlighting.
    fn current_segment(&self) -> usize {
        0
    }

    /// Index of the final segment.
    fn last_segment(&self) -> usize {
        0
    }
}

/// One line of a toolpath program.
#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    /// Straight move, `steps + 1` poses from `from` to `to` inclusive
    Linear {
        from: ToolPose,
        to: ToolPose,
        steps: u32,
    },
    /// Comment line, optionally naming a new tool
    Comment {
        text: String,
        tool: Option<ToolShape>,
    },
}

impl Segment {
    /// Straight move with poses at most `min_step` apart.
    pub fn linear(from: ToolPose, to: ToolPose, min_step: f64) -> Result<Self> {
        check_min_step(min_step)?;
        let length = travel_length(from, to);
        let steps = (length / min_step).ceil().clamp(0.0, f64::from(u32::MAX)) as u32;
        Ok(Self::Linear { from, to, steps })
    }

    /// Comment line; tool directives inside it are parsed, and a bad one is
    /// logged and dropped.
    pub fn comment(text: impl Into<String>) -> Self {
        let text = text.into();
        let tool = if ToolShape::is_directive(&text) {
            text.parse::<ToolShape>()
                .map_err(|err| warn!(comment = %text, %err, "ignoring tool directive"))
                .ok()
        } else {
            None
        };
        Self::Comment { text, tool }
    }

    /// Pose `step` of a linear move
    fn pose(&self, step: u32) -> Option<ToolPose> {
        match *self {
            Self::Linear { from, to, steps } if step <= steps => {
                if steps == 0 {
                    Some(from)
                } else {
                    Some(from.lerp(to, f64::from(step) / f64::from(steps)))
                }
            }
            _ => None,
        }
    }

    const fn is_move(&self) -> bool {
        matches!(self, Self::Linear { .. })
    }
}

fn check_min_step(min_step: f64) -> Result<()> {
    if min_step.is_finite() && min_step > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "step length must be positive, got {min_step}"
        )))
    }
}

/// Distance the tool travels in the world frame, rotary motion included.
fn travel_length(from: ToolPose, to: ToolPose) -> f64 {
    if (to.a - from.a).abs() < f64::EPSILON {
        return from.distance(to);
    }
    let world = |t: f64| {
        let pose = from.lerp(to, t);
        rotate_x(pose.position, pose.a)
    };
    (1..=ROTARY_SAMPLES)
        .map(|i| {
            let (t0, t1) = (
                f64::from(i - 1) / f64::from(ROTARY_SAMPLES),
                f64::from(i) / f64::from(ROTARY_SAMPLES),
            );
            world(t0).distance(world(t1))
        })
        .sum()
}

/// A toolpath held in memory as a list of segments.
#[derive(Clone, Debug, Default)]
pub struct SegmentedToolpath {
    segments: Vec<Segment>,
    current: usize,
    step: u32,
    pending_tool: Option<ToolShape>,
    stock: Option<StockSpec>,
}

impl SegmentedToolpath {
    pub fn new(segments: Vec<Segment>) -> Self {
        let stock = segments.iter().find_map(|segment| match segment {
            Segment::Comment { text, .. } if StockSpec::is_directive(text) => text.parse().ok(),
            _ => None,
        });
        let mut path = Self {
            segments,
            stock,
            ..Self::default()
        };
        path.rewind();
        path
    }

    /// Straight moves through `poses`, in order.
    pub fn from_poses(poses: &[ToolPose], min_step: f64) -> Result<Self> {
        check_min_step(min_step)?;
        let mut segments = Vec::with_capacity(poses.len());
        let mut last = None;
        for &pose in poses {
            segments.push(Segment::linear(last.unwrap_or(pose), pose, min_step)?);
            last = Some(pose);
        }
        Ok(Self::new(segments))
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Stock named by the first `RectSolid` comment
    #[inline]
    pub const fn stock(&self) -> Option<&StockSpec> {
        self.stock.as_ref()
    }

    /// First tool named in the program
    pub fn initial_tool(&self) -> Option<ToolShape> {
        self.segments.iter().find_map(|segment| match segment {
            Segment::Comment { tool, .. } => *tool,
            Segment::Linear { .. } => None,
        })
    }

    /// Total number of poses over every segment
    pub fn pose_count(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Linear { steps, .. } => *steps as usize + 1,
                Segment::Comment { .. } => 0,
            })
            .sum()
    }

    /// Advance to the next move, collecting tool changes on the way.
    /// Returns true if a comment line was passed.
    fn advance(&mut self) -> bool {
        let mut crossed_comment = false;
        while self.current < self.segments.len() {
            self.current += 1;
            self.step = 0;
            match self.segments.get(self.current) {
                Some(Segment::Comment { tool, .. }) => {
                    crossed_comment = true;
                    if let Some(tool) = tool {
                        self.pending_tool = Some(*tool);
                    }
                }
                Some(Segment::Linear { .. }) | None => break,
            }
        }
        crossed_comment
    }
}

impl Toolpath for SegmentedToolpath {
    fn next_pose(&mut self, policy: StopPolicy) -> Option<ToolPose> {
        if let Some(pose) = self.segments.get(self.current).and_then(|s| s.pose(self.step)) {
            self.step += 1;
            return Some(pose);
        }
        if self.current >= self.segments.len() {
            return None;
        }

        let crossed_comment = self.advance();
        if policy.after_segment || (policy.after_comment && crossed_comment) {
            return None;
        }
        let pose = self.segments.get(self.current)?.pose(0)?;
        self.step = 1;
        Some(pose)
    }

    fn has_more(&self) -> bool {
        let in_segment = self
            .segments
            .get(self.current)
            .is_some_and(|segment| segment.pose(self.step).is_some());
        in_segment
            || self
                .segments
                .get(self.current + 1..)
                .is_some_and(|rest| rest.iter().any(Segment::is_move))
    }

    fn rewind(&mut self) {
        self.pending_tool = None;
        self.current = 0;
        self.step = 0;
        // Tools named before the first move take effect on the first pose.
        while let Some(Segment::Comment { tool, .. }) = self.segments.get(self.current) {
            if let Some(tool) = tool {
                self.pending_tool = Some(*tool);
            }
            self.current += 1;
        }
    }

    fn take_tool_change(&mut self) -> Option<ToolShape> {
        self.pending_tool.take()
    }

    fn current_segment(&self) -> usize {
        self.current.min(self.last_segment())
    }

    fn last_segment(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }
}

/// Parse a plain-text pose program.
///
/// Each line is one of: a pose `X Y Z [A]` (whitespace or comma separated),
/// a comment in parentheses, a `#` remark, or blank. Consecutive poses are
/// joined by straight moves.
pub fn parse_pose_program(text: &str, min_step: f64) -> Result<SegmentedToolpath> {
    check_min_step(min_step)?;
    let mut segments = Vec::new();
    let mut last: Option<ToolPose> = None;

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('(') {
            segments.push(Segment::comment(line));
            continue;
        }

        let values = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(str::parse::<f64>)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| Error::InvalidData(format!("line {}: {err}", line_no + 1)))?;
        let pose = match values[..] {
            [x, y, z] => ToolPose::new(DVec3::new(x, y, z), 0.0),
            [x, y, z, a] => ToolPose::new(DVec3::new(x, y, z), a),
            _ => {
                return Err(Error::InvalidData(format!(
                    "line {}: expected X Y Z [A], found {} values",
                    line_no + 1,
                    values.len()
                )))
            }
        };
        if !pose.position.is_finite() || !pose.a.is_finite() {
            return Err(Error::InvalidData(format!("line {}: non-finite pose", line_no + 1)));
        }
        segments.push(Segment::linear(last.unwrap_or(pose), pose, min_step)?);
        last = Some(pose);
    }

    Ok(SegmentedToolpath::new(segments))
}
