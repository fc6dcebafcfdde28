// src/simulation.rs - Scripted hand stream used when no native hand detector is available
use nalgebra::Vector2;

use crate::landmarks::{HandJoint, HandPose, JointPoint, LandmarkProvider, JOINT_COUNT};
use crate::video::CapturedFrame;

const WRIST: (f64, f64) = (0.5, 0.8);
const FINGER_MCP_Y: f64 = 0.6;
const SEGMENT: f64 = 0.05;
const SIM_CONFIDENCE: f32 = 0.9;
const CYCLE_SECONDS: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandShape {
    /// Fingers and thumb extended.
    Open,
    /// Thumb pressed against a half-curled middle finger, ready to snap.
    Pinch,
    /// Right after a snap: middle finger in the palm, thumb pushed away.
    Snapped,
    /// Middle finger up, everything else folded.
    MiddleFinger,
}

/// Fingers other than the thumb, by (mcp x, first joint of the chain).
const FINGERS: [(f64, HandJoint); 4] = [
    (0.44, HandJoint::IndexMcp),
    (0.48, HandJoint::MiddleMcp),
    (0.52, HandJoint::RingMcp),
    (0.56, HandJoint::LittleMcp),
];

fn finger_chain(mcp_x: f64, curl: f64) -> [Vector2<f64>; 4] {
    let mcp = Vector2::new(mcp_x, FINGER_MCP_Y);
    let extended = [
        mcp,
        mcp + Vector2::new(0.0, -SEGMENT),
        mcp + Vector2::new(0.0, -2.0 * SEGMENT),
        mcp + Vector2::new(0.0, -3.0 * SEGMENT),
    ];
    // Folded toward the camera: the tip drops back below the knuckle.
    let curled = [
        mcp,
        mcp + Vector2::new(0.0, -0.04),
        mcp + Vector2::new(0.0, -0.03),
        mcp + Vector2::new(0.0, 0.01),
    ];
    let mut chain = extended;
    for (i, joint) in chain.iter_mut().enumerate() {
        *joint = extended[i].lerp(&curled[i], curl);
    }
    chain
}

fn shape_positions(shape: HandShape) -> [Vector2<f64>; JOINT_COUNT] {
    let (curls, thumb_tip) = match shape {
        HandShape::Open => ([0.0, 0.0, 0.0, 0.0], Vector2::new(0.35, 0.63)),
        HandShape::Pinch => ([0.2, 0.5, 0.2, 0.2], Vector2::new(0.475, 0.525)),
        HandShape::Snapped => ([0.3, 1.0, 0.6, 0.6], Vector2::new(0.42, 0.50)),
        HandShape::MiddleFinger => ([1.0, 0.0, 1.0, 1.0], Vector2::new(0.47, 0.66)),
    };

    let mut positions = [Vector2::zeros(); JOINT_COUNT];
    let wrist = Vector2::new(WRIST.0, WRIST.1);
    positions[HandJoint::Wrist.index()] = wrist;

    let thumb_cmc = Vector2::new(0.44, 0.76);
    positions[HandJoint::ThumbCmc.index()] = thumb_cmc;
    positions[HandJoint::ThumbMcp.index()] = thumb_cmc.lerp(&thumb_tip, 1.0 / 3.0);
    positions[HandJoint::ThumbIp.index()] = thumb_cmc.lerp(&thumb_tip, 2.0 / 3.0);
    positions[HandJoint::ThumbTip.index()] = thumb_tip;

    for ((mcp_x, first), curl) in FINGERS.iter().zip(curls) {
        for (offset, point) in finger_chain(*mcp_x, curl).into_iter().enumerate() {
            positions[first.index() + offset] = point;
        }
    }

    positions
}

fn pose_from_positions(positions: &[Vector2<f64>; JOINT_COUNT]) -> HandPose {
    let mut pose = HandPose::new();
    for joint in HandJoint::ALL {
        let p = positions[joint.index()];
        pose.insert(joint, JointPoint::new(p.x, p.y, SIM_CONFIDENCE));
    }
    pose
}

/// A static hand in one of the scripted shapes.
pub fn synthesize_hand(shape: HandShape) -> HandPose {
    pose_from_positions(&shape_positions(shape))
}

/// Linear blend between two shapes, `t` in [0, 1].
pub fn blend_hands(from: HandShape, to: HandShape, t: f64) -> HandPose {
    let a = shape_positions(from);
    let b = shape_positions(to);
    let t = t.clamp(0.0, 1.0);
    let mut blended = [Vector2::zeros(); JOINT_COUNT];
    for i in 0..JOINT_COUNT {
        blended[i] = a[i].lerp(&b[i], t);
    }
    pose_from_positions(&blended)
}

/// Replays an eight second loop: rest, pinch, snap, middle finger hold,
/// then a short stretch with no hand in view.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHandProvider;

impl SimulatedHandProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn pose_at(&self, t: f64) -> Option<HandPose> {
        let phase = t.rem_euclid(CYCLE_SECONDS);
        let ramp = |start: f64, end: f64| (phase - start) / (end - start);

        let pose = match phase {
            p if p < 1.5 => synthesize_hand(HandShape::Open),
            p if p < 2.0 => blend_hands(HandShape::Open, HandShape::Pinch, ramp(1.5, 2.0)),
            p if p < 3.0 => synthesize_hand(HandShape::Pinch),
            p if p < 3.15 => blend_hands(HandShape::Pinch, HandShape::Snapped, ramp(3.0, 3.15)),
            p if p < 4.0 => synthesize_hand(HandShape::Snapped),
            p if p < 4.5 => blend_hands(HandShape::Snapped, HandShape::Open, ramp(4.0, 4.5)),
            p if p < 5.0 => blend_hands(HandShape::Open, HandShape::MiddleFinger, ramp(4.5, 5.0)),
            p if p < 7.0 => synthesize_hand(HandShape::MiddleFinger),
            p if p < 7.6 => blend_hands(HandShape::MiddleFinger, HandShape::Open, ramp(7.0, 7.6)),
            _ => return None,
        };
        Some(pose)
    }
}

impl LandmarkProvider for SimulatedHandProvider {
    type Frame = CapturedFrame;

    fn detect(&mut self, frame: &CapturedFrame) -> Vec<HandPose> {
        self.pose_at(frame.timestamp).into_iter().collect()
    }
}
