//! Hitbox Definition Files
//!
//! Line-oriented text format, one hitbox per line:
//!
//! ```text
//! name;x,y,w,h;x,y,w,h;...;cx,cy
//! ```
//!
//! Rectangles are in sprite-local pixels and the last field is the
//! hitbox center. Animated sprites group lines under frame headers:
//!
//! ```text
//! # 3          <- the following set applies to the next 3 frames
//! body;0,0,16,16;8,8
//! # 1
//! body;0,0,16,16;8,8
//! sword;16,4,10,4;21,6
//! ```
//!
//! Blank lines are ignored. Any malformed content fails the whole load.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use super::hitbox::{Hitbox, HitboxFrames, HitboxSet};

/// Hitbox file errors. All are fatal for the load.
#[derive(Debug, Error)]
pub enum HitboxFileError {
    /// File could not be read.
    #[error("failed to read hitbox file {}: {source}", .path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Bad field count or non-integer value.
    #[error("line {line}: {reason}")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// What was wrong
        reason: String,
    },

    /// Same name twice within one set.
    #[error("line {line}: duplicate hitbox name '{name}'")]
    DuplicateName {
        /// 1-based line number
        line: usize,
        /// Repeated name
        name: String,
    },

    /// Data line before any `# N` header in an animation file.
    #[error("line {line}: hitbox data before the first frame header")]
    MissingFrameHeader {
        /// 1-based line number
        line: usize,
    },

    /// `# N` header in a file expected to hold a single set.
    #[error("line {line}: frame header in a static hitbox file")]
    HeaderInStaticFile {
        /// 1-based line number
        line: usize,
    },

    /// Headers expand to a different number of frames than the animation has.
    #[error("hitbox file defines {found} frames, animation has {expected}")]
    FrameCountMismatch {
        /// Frames in the animation
        expected: usize,
        /// Frames defined by the file
        found: usize,
    },
}

fn malformed(line: usize, reason: impl Into<String>) -> HitboxFileError {
    HitboxFileError::Malformed {
        line,
        reason: reason.into(),
    }
}

/// Non-blank lines with 1-based line numbers, trimmed.
fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

fn parse_ints<const N: usize>(line: usize, field: &str, what: &str) -> Result<[i32; N], HitboxFileError> {
    let parts: Vec<&str> = field.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(malformed(
            line,
            format!("{what} needs {N} values, found {} in '{field}'", parts.len()),
        ));
    }

    let mut out = [0i32; N];
    for (slot, part) in out.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| malformed(line, format!("'{part}' in {what} is not an integer")))?;
    }
    Ok(out)
}

/// Parse `name;x,y,w,h;...;cx,cy`.
fn parse_data_line(line: usize, text: &str) -> Result<(String, Hitbox), HitboxFileError> {
    let fields: Vec<&str> = text.split(';').map(str::trim).collect();
    if fields.len() < 2 {
        return Err(malformed(line, "expected 'name;rect;...;center'"));
    }

    let name = fields[0];
    if name.is_empty() {
        return Err(malformed(line, "empty hitbox name"));
    }

    let last = fields.len() - 1;
    let rectangles = fields[1..last]
        .iter()
        .map(|field| parse_ints::<4>(line, field, "rectangle").map(|[x, y, w, h]| Rect::new(x, y, w, h)))
        .collect::<Result<Vec<_>, _>>()?;

    let [cx, cy] = parse_ints::<2>(line, fields[last], "center")?;

    Ok((name.to_string(), Hitbox::new(rectangles, Vec2::new(cx as f32, cy as f32))))
}

fn parse_header(line: usize, text: &str) -> Option<Result<usize, HitboxFileError>> {
    let count = text.strip_prefix('#')?.trim();
    Some(
        count
            .parse()
            .map_err(|_| malformed(line, format!("frame count '{count}' is not a non-negative integer"))),
    )
}

fn insert_unique(set: &mut HitboxSet, line: usize, name: String, hitbox: Hitbox) -> Result<(), HitboxFileError> {
    if set.contains(&name) {
        return Err(HitboxFileError::DuplicateName { line, name });
    }
    set.insert(name, hitbox);
    Ok(())
}

/// Parse a static (single-set) hitbox definition.
pub fn parse_hitbox_set(text: &str) -> Result<HitboxSet, HitboxFileError> {
    let mut set = HitboxSet::new();
    for (line, content) in content_lines(text) {
        if content.starts_with('#') {
            return Err(HitboxFileError::HeaderInStaticFile { line });
        }
        let (name, hitbox) = parse_data_line(line, content)?;
        insert_unique(&mut set, line, name, hitbox)?;
    }
    Ok(set)
}

/// Parse an animation hitbox definition into one set per frame.
///
/// Each `# N` header's set is shared by its `N` frames. Every header
/// counts `N` frames toward `expected_frames`, including a header with no
/// data lines: its frames get an empty set rather than being skipped, so
/// later frames keep their sprite-sheet indices.
pub fn parse_frame_hitboxes(text: &str, expected_frames: usize) -> Result<Vec<Arc<HitboxSet>>, HitboxFileError> {
    let mut frames = Vec::new();
    let mut pending: Option<(usize, HitboxSet)> = None;

    for (line, content) in content_lines(text) {
        if let Some(header) = parse_header(line, content) {
            let count = header?;
            if let Some((n, set)) = pending.take() {
                let shared = Arc::new(set);
                frames.extend(std::iter::repeat(shared).take(n));
            }
            pending = Some((count, HitboxSet::new()));
            continue;
        }

        let Some((_, set)) = pending.as_mut() else {
            return Err(HitboxFileError::MissingFrameHeader { line });
        };
        let (name, hitbox) = parse_data_line(line, content)?;
        insert_unique(set, line, name, hitbox)?;
    }

    if let Some((n, set)) = pending {
        let shared = Arc::new(set);
        frames.extend(std::iter::repeat(shared).take(n));
    }

    if frames.len() != expected_frames {
        return Err(HitboxFileError::FrameCountMismatch {
            expected: expected_frames,
            found: frames.len(),
        });
    }

    Ok(frames)
}

fn read(path: &Path) -> Result<String, HitboxFileError> {
    fs::read_to_string(path).map_err(|source| HitboxFileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a static hitbox file.
pub fn load_hitbox_set(path: impl AsRef<Path>) -> Result<HitboxSet, HitboxFileError> {
    let path = path.as_ref();
    let set = parse_hitbox_set(&read(path)?)?;
    debug!(path = %path.display(), hitboxes = set.len(), "Hitbox file loaded");
    Ok(set)
}

/// Load an animation hitbox file for an animation of `expected_frames` frames.
pub fn load_frame_hitboxes(path: impl AsRef<Path>, expected_frames: usize) -> Result<HitboxFrames, HitboxFileError> {
    let path = path.as_ref();
    let frames = parse_frame_hitboxes(&read(path)?, expected_frames)?;
    debug!(path = %path.display(), frames = frames.len(), "Animation hitbox file loaded");
    Ok(HitboxFrames::new(frames))
}

// =============================================================================
// TESTS
// =============================================================================
