// Finger-gun pose classification from a single landmark frame.
//
// The aim pose is an extended index finger with at least `min_folded` of middle/ring/pinky
// curled in. The thumb acts as the hammer: up while aiming, dropping it fires.

use crate::domain::landmarks::{
    INDEX_MCP, INDEX_PIP, INDEX_TIP, LandmarkFrame, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP, PINKY_MCP,
    PINKY_PIP, PINKY_TIP, RING_MCP, RING_PIP, RING_TIP, THUMB_IP, THUMB_TIP, WRIST,
};
use crate::domain::tuning::GestureTuning;
use glam::Vec2;

const EXTENDED_WEIGHT: f32 = 0.4;
const FOLDED_WEIGHT: f32 = 0.2;

/// (mcp, pip, tip) for the fingers that must fold.
const FOLDING_FINGERS: [(usize, usize, usize); 3] = [
    (MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP),
    (RING_MCP, RING_PIP, RING_TIP),
    (PINKY_MCP, PINKY_PIP, PINKY_TIP),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureVerdict {
    pub is_aim_gesture: bool,
    pub is_thumb_up: bool,
    /// Index fingertip in normalized image coordinates.
    pub fingertip: Vec2,
    /// 0.0..=1.0, how much of the pose matched.
    pub confidence: f32,
}

pub fn classify(frame: &LandmarkFrame, tuning: &GestureTuning) -> GestureVerdict {
    let index_extended = is_index_extended(frame, tuning);
    let folded = FOLDING_FINGERS
        .iter()
        .filter(|finger| is_folded(frame, **finger, tuning))
        .count();

    let mut confidence = folded as f32 * FOLDED_WEIGHT;
    if index_extended {
        confidence += EXTENDED_WEIGHT;
    }

    let thumb_tip = frame.get(THUMB_TIP);
    let thumb_ip = frame.get(THUMB_IP);

    GestureVerdict {
        is_aim_gesture: index_extended && folded >= tuning.min_folded,
        is_thumb_up: thumb_tip.y < thumb_ip.y - tuning.thumb_up_offset,
        fingertip: frame.get(INDEX_TIP).screen(),
        confidence: confidence.min(1.0),
    }
}

fn is_index_extended(frame: &LandmarkFrame, tuning: &GestureTuning) -> bool {
    let mcp = frame.get(INDEX_MCP);
    let pip = frame.get(INDEX_PIP);
    let tip = frame.get(INDEX_TIP);

    let Some(ratio) = curl_ratio(
        tip.point().distance(pip.point()),
        pip.point().distance(mcp.point()),
        tuning.min_joint_distance,
    ) else {
        return false;
    };

    ratio > tuning.extended_ratio && tip.y < pip.y
}

fn is_folded(
    frame: &LandmarkFrame,
    (mcp, pip, tip): (usize, usize, usize),
    tuning: &GestureTuning,
) -> bool {
    let wrist = frame.get(WRIST).point();
    let mcp = frame.get(mcp);
    let pip = frame.get(pip);
    let tip = frame.get(tip);

    // Vertical order covers rotated hands where the wrist ratio is unreliable.
    let tip_below_pip = tip.y > pip.y;

    match curl_ratio(
        tip.point().distance(wrist),
        mcp.point().distance(wrist),
        tuning.min_joint_distance,
    ) {
        Some(ratio) => ratio < tuning.folded_ratio || tip_below_pip,
        None => tip_below_pip,
    }
}

/// `None` when the denominator is degenerate.
fn curl_ratio(numerator: f32, denominator: f32, min_distance: f32) -> Option<f32> {
    if denominator < min_distance {
        return None;
    }
    let ratio = numerator / denominator;
    ratio.is_finite().then_some(ratio)
}
