//! Per-joint linear calibration between the arm's reference frame and servo input.
//!
//! Every joint carries exactly two anchor pairs, each recording the servo
//! input (`input`) that puts the joint at a measured angle in the arm's frame
//! (`actual`). The line through the two anchors maps any actual angle to the
//! input the driver expects. Values outside the anchor span are extrapolated,
//! never clamped; range limits belong to the actuator.

use crate::error::CalibrationError;
use crate::joint::JointId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Native input angle for the gripper when fully open.
pub const GRIPPER_OPEN: f64 = 80.0;
/// Native input angle for the gripper when fully closed.
pub const GRIPPER_CLOSED: f64 = 150.0;

// ---------------------------------------------------------------------------
// AnchorPair
// ---------------------------------------------------------------------------

/// One measured correspondence between a servo input and the resulting actual angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPair {
    pub input: f64,
    pub actual: f64,
}

impl AnchorPair {
    pub const fn new(input: f64, actual: f64) -> Self {
        Self { input, actual }
    }
}

// ---------------------------------------------------------------------------
// CalibrationEntry
// ---------------------------------------------------------------------------

/// Two-anchor affine transform for a single joint.
///
/// Anchors are kept sorted by actual angle, so the entry does not depend on
/// the order they were listed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationEntry {
    lo: AnchorPair,
    hi: AnchorPair,
}

impl CalibrationEntry {
    pub fn new(a: AnchorPair, b: AnchorPair) -> Result<Self, CalibrationError> {
        let finite = [a.input, a.actual, b.input, b.actual]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(CalibrationError::NonFiniteAnchor);
        }
        if a.actual == b.actual {
            return Err(CalibrationError::DegenerateAnchors { actual: a.actual });
        }
        let (lo, hi) = if a.actual < b.actual { (a, b) } else { (b, a) };
        Ok(Self { lo, hi })
    }

    pub fn from_pairs(pairs: &[AnchorPair; 2]) -> Result<Self, CalibrationError> {
        Self::new(pairs[0], pairs[1])
    }

    pub fn anchors(&self) -> [AnchorPair; 2] {
        [self.lo, self.hi]
    }

    /// Input degrees per actual degree.
    pub fn slope(&self) -> f64 {
        (self.hi.input - self.lo.input) / (self.hi.actual - self.lo.actual)
    }

    /// Input angle that corresponds to an actual angle of zero.
    pub fn intercept(&self) -> f64 {
        self.lo.input - self.slope() * self.lo.actual
    }

    /// Maps an actual angle to the servo input angle.
    pub fn to_native(&self, actual: f64) -> f64 {
        // Anchored form: both anchors map back exactly.
        self.lo.input
            + (actual - self.lo.actual) * (self.hi.input - self.lo.input)
                / (self.hi.actual - self.lo.actual)
    }

    /// Maps a servo input angle back to the actual angle it produces.
    ///
    /// `None` when both anchors share the same input.
    pub fn to_external(&self, input: f64) -> Option<f64> {
        let span = self.hi.input - self.lo.input;
        if span == 0.0 {
            return None;
        }
        Some(self.lo.actual + (input - self.lo.input) * (self.hi.actual - self.lo.actual) / span)
    }
}

// ---------------------------------------------------------------------------
// CalibrationModel
// ---------------------------------------------------------------------------

/// Calibration table for the whole arm. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CalibrationModel {
    entries: BTreeMap<JointId, CalibrationEntry>,
}

impl CalibrationModel {
    pub fn new(entries: BTreeMap<JointId, CalibrationEntry>) -> Self {
        Self { entries }
    }

    /// Builds the model from raw anchor pairs, rejecting the first bad entry.
    pub fn from_anchors<I>(anchors: I) -> Result<Self, (JointId, CalibrationError)>
    where
        I: IntoIterator<Item = (JointId, [AnchorPair; 2])>,
    {
        let mut entries = BTreeMap::new();
        for (joint, pairs) in anchors {
            let entry = CalibrationEntry::from_pairs(&pairs).map_err(|e| (joint, e))?;
            entries.insert(joint, entry);
        }
        Ok(Self { entries })
    }

    pub fn entry(&self, joint: JointId) -> Result<&CalibrationEntry, CalibrationError> {
        self.entries
            .get(&joint)
            .ok_or(CalibrationError::UnknownJoint(joint))
    }

    pub fn contains(&self, joint: JointId) -> bool {
        self.entries.contains_key(&joint)
    }

    pub fn iter(&self) -> impl Iterator<Item = (JointId, &CalibrationEntry)> {
        self.entries.iter().map(|(j, e)| (*j, e))
    }

    pub fn to_native(&self, joint: JointId, actual: f64) -> Result<f64, CalibrationError> {
        Ok(self.entry(joint)?.to_native(actual))
    }

    pub fn to_external(&self, joint: JointId, input: f64) -> Result<f64, CalibrationError> {
        self.entry(joint)?
            .to_external(input)
            .ok_or(CalibrationError::FlatTransform(joint))
    }
}

/// Anchor table measured on the stock arm.
pub fn default_anchors(joint: JointId) -> [AnchorPair; 2] {
    match joint {
        JointId::S0 => [AnchorPair::new(90.0, 0.0), AnchorPair::new(0.0, -70.0)],
        JointId::S1 => [AnchorPair::new(90.0, -5.0), AnchorPair::new(170.0, 65.0)],
        JointId::S2 => [AnchorPair::new(90.0, -100.0), AnchorPair::new(180.0, -40.0)],
        JointId::S3 => [AnchorPair::new(0.0, -45.0), AnchorPair::new(180.0, 90.0)],
        JointId::S5 => [
            AnchorPair::new(GRIPPER_OPEN, 0.0),
            AnchorPair::new(GRIPPER_CLOSED, 180.0),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock() -> CalibrationModel {
        CalibrationModel::from_anchors(JointId::all().iter().map(|j| (*j, default_anchors(*j))))
            .unwrap()
    }

    #[test]
    fn anchors_map_exactly() {
        let model = stock();
        for &joint in JointId::all() {
            for anchor in default_anchors(joint) {
                assert_eq!(
                    model.to_native(joint, anchor.actual).unwrap(),
                    anchor.input,
                    "joint {joint} anchor {anchor:?}"
                );
            }
        }
    }

    #[test]
    fn wrist_zero_is_sixty() {
        let model = stock();
        assert_eq!(model.to_native(JointId::S3, 0.0).unwrap(), 60.0);
    }

    #[test]
    fn transform_is_linear() {
        let model = stock();
        let (a, b) = (-130.0, 47.5);
        for &joint in JointId::all() {
            for t in [0.0, 0.25, 0.5, 0.9, 1.0, 1.7, -0.3] {
                let mixed = model.to_native(joint, t * a + (1.0 - t) * b).unwrap();
                let expected = t * model.to_native(joint, a).unwrap()
                    + (1.0 - t) * model.to_native(joint, b).unwrap();
                assert!((mixed - expected).abs() < 1e-9, "joint {joint} t={t}");
            }
        }
    }

    #[test]
    fn anchor_order_is_irrelevant() {
        for &joint in JointId::all() {
            let [a, b] = default_anchors(joint);
            let forward = CalibrationEntry::new(a, b).unwrap();
            let swapped = CalibrationEntry::new(b, a).unwrap();
            assert_eq!(forward, swapped);
            for x in [-200.0, -45.0, 0.0, 12.5, 90.0, 365.0] {
                assert_eq!(forward.to_native(x), swapped.to_native(x));
            }
        }
    }

    #[test]
    fn extrapolates_without_clamping() {
        let entry = CalibrationEntry::from_pairs(&default_anchors(JointId::S3)).unwrap();
        // slope 4/3 past the upper anchor
        assert!((entry.to_native(180.0) - 300.0).abs() < 1e-9);
        assert!(entry.to_native(-90.0) < 0.0);
    }

    #[test]
    fn slope_and_intercept_match_anchors() {
        let entry = CalibrationEntry::from_pairs(&default_anchors(JointId::S3)).unwrap();
        assert!((entry.slope() - 4.0 / 3.0).abs() < 1e-12);
        assert!((entry.intercept() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn inverse_round_trips() {
        let model = stock();
        for &joint in JointId::all() {
            for actual in [-60.0, -5.0, 0.0, 33.3, 120.0] {
                let native = model.to_native(joint, actual).unwrap();
                let back = model.to_external(joint, native).unwrap();
                assert!((back - actual).abs() < 1e-9, "joint {joint}");
            }
        }
    }

    #[test]
    fn equal_actual_angles_are_degenerate() {
        let err = CalibrationEntry::new(AnchorPair::new(0.0, 10.0), AnchorPair::new(90.0, 10.0))
            .unwrap_err();
        assert_eq!(err, CalibrationError::DegenerateAnchors { actual: 10.0 });
    }

    #[test]
    fn non_finite_anchor_rejected() {
        let err =
            CalibrationEntry::new(AnchorPair::new(f64::NAN, 0.0), AnchorPair::new(90.0, 10.0))
                .unwrap_err();
        assert_eq!(err, CalibrationError::NonFiniteAnchor);
    }

    #[test]
    fn flat_transform_has_no_inverse() {
        let mut entries = BTreeMap::new();
        entries.insert(
            JointId::S1,
            CalibrationEntry::new(AnchorPair::new(45.0, 0.0), AnchorPair::new(45.0, 90.0)).unwrap(),
        );
        let model = CalibrationModel::new(entries);
        assert_eq!(model.to_native(JointId::S1, 30.0).unwrap(), 45.0);
        assert_eq!(
            model.to_external(JointId::S1, 45.0),
            Err(CalibrationError::FlatTransform(JointId::S1))
        );
    }

    #[test]
    fn unknown_joint_reported() {
        let model = CalibrationModel::default();
        assert_eq!(
            model.to_native(JointId::S2, 0.0),
            Err(CalibrationError::UnknownJoint(JointId::S2))
        );
    }

    #[test]
    fn from_anchors_names_bad_joint() {
        let bad = [AnchorPair::new(0.0, 5.0), AnchorPair::new(10.0, 5.0)];
        let err = CalibrationModel::from_anchors([
            (JointId::S0, default_anchors(JointId::S0)),
            (JointId::S2, bad),
        ])
        .unwrap_err();
        assert_eq!(err.0, JointId::S2);
    }
}
