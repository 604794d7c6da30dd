//! OpenPose keypoint file handling.
//!
//! OpenPose writes one `<view>_keypoints.json` per input image, each
//! person carrying flat `[x, y, confidence]` triples for body, face, and
//! hand keypoints. The fitting tool consumes the files directly; this
//! module decodes them only to audit detection coverage, so a render set
//! full of failed detections is flagged before GPU time is spent fitting
//! to it.

use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::PipelineResult;

/// One person detected in a rendered view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Person {
    /// Flat `[x, y, confidence]` triples for the 25 body keypoints.
    #[serde(default)]
    pub pose_keypoints_2d: Vec<f64>,
    /// Flat triples for the 70 face keypoints.
    #[serde(default)]
    pub face_keypoints_2d: Vec<f64>,
    /// Flat triples for the 21 left-hand keypoints.
    #[serde(default)]
    pub hand_left_keypoints_2d: Vec<f64>,
    /// Flat triples for the 21 right-hand keypoints.
    #[serde(default)]
    pub hand_right_keypoints_2d: Vec<f64>,
}

/// A 2D keypoint with its detection confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// Pixel x coordinate.
    pub x: f64,
    /// Pixel y coordinate.
    pub y: f64,
    /// Detection confidence in `[0, 1]`; 0 marks an undetected joint.
    pub confidence: f64,
}

impl Person {
    /// Decode the body keypoint triples.
    #[must_use]
    pub fn pose_points(&self) -> Vec<Keypoint> {
        self.pose_keypoints_2d
            .chunks_exact(3)
            .map(|triple| Keypoint {
                x: triple[0],
                y: triple[1],
                confidence: triple[2],
            })
            .collect()
    }

    /// Mean confidence over the body keypoints, 0 when none were written.
    #[must_use]
    pub fn mean_pose_confidence(&self) -> f64 {
        let points = self.pose_points();
        if points.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        // Precision: keypoint counts are far below 2^52.
        let count = points.len() as f64;
        points.iter().map(|p| p.confidence).sum::<f64>() / count
    }
}

/// Contents of one OpenPose output file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeypointFile {
    /// Format version written by OpenPose, 1.3 for current builds.
    #[serde(default)]
    pub version: f64,
    /// People detected in the view, usually zero or one.
    #[serde(default)]
    pub people: Vec<Person>,
}

/// Read one keypoint file.
///
/// # Errors
///
/// Fails when the file cannot be opened or is not valid keypoint JSON.
pub fn read_keypoints(path: &Path) -> PipelineResult<KeypointFile> {
    let file = fs::File::open(path)?;
    Ok(serde_json::from_reader(io::BufReader::new(file))?)
}

/// Detection coverage over a keypoint directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeypointAudit {
    /// Views whose keypoint file contains at least one person.
    pub views_with_people: usize,
    /// Views whose keypoint file contains no people.
    pub empty_views: usize,
    /// Expected keypoint files that are missing entirely.
    pub missing_views: usize,
    /// Keypoint files that exist but could not be decoded.
    pub malformed_views: usize,
}

impl KeypointAudit {
    /// True when every expected view detected at least one person.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.empty_views == 0 && self.missing_views == 0 && self.malformed_views == 0
    }
}

/// Audit detection coverage over the expected test views.
///
/// Advisory only: fitting proceeds regardless, callers just log the
/// summary. Views are named `00_keypoints.json` through
/// `<expected_views - 1>_keypoints.json`.
#[must_use]
pub fn audit_keypoint_dir(dir: &Path, expected_views: usize) -> KeypointAudit {
    let mut audit = KeypointAudit::default();
    for view in 0..expected_views {
        let path = dir.join(format!("{view:02}_keypoints.json"));
        if !path.is_file() {
            audit.missing_views += 1;
            continue;
        }
        match read_keypoints(&path) {
            Ok(file) if file.people.is_empty() => audit.empty_views += 1,
            Ok(_) => audit.views_with_people += 1,
            Err(err) => {
                debug!("unreadable keypoint file {}: {err}", path.display());
                audit.malformed_views += 1;
            }
        }
    }
    audit
}
