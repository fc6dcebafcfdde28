// src/landmarks.rs - Hand joints, per-frame poses and the landmark provider seam
use nalgebra::Vector2;
use std::collections::HashMap;

pub const JOINT_COUNT: usize = 21;

/// Fixed-size classifier input: 21 joints x (x, y, confidence).
pub type PoseTensor = [[f32; 3]; JOINT_COUNT];

/// Hand joints in the 21-point order the classifier is trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandJoint {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    LittleMcp,
    LittlePip,
    LittleDip,
    LittleTip,
}

impl HandJoint {
    pub const ALL: [HandJoint; JOINT_COUNT] = [
        HandJoint::Wrist,
        HandJoint::ThumbCmc,
        HandJoint::ThumbMcp,
        HandJoint::ThumbIp,
        HandJoint::ThumbTip,
        HandJoint::IndexMcp,
        HandJoint::IndexPip,
        HandJoint::IndexDip,
        HandJoint::IndexTip,
        HandJoint::MiddleMcp,
        HandJoint::MiddlePip,
        HandJoint::MiddleDip,
        HandJoint::MiddleTip,
        HandJoint::RingMcp,
        HandJoint::RingPip,
        HandJoint::RingDip,
        HandJoint::RingTip,
        HandJoint::LittleMcp,
        HandJoint::LittlePip,
        HandJoint::LittleDip,
        HandJoint::LittleTip,
    ];

    /// Row of this joint in a `PoseTensor`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb_cmc",
            Self::ThumbMcp => "thumb_mcp",
            Self::ThumbIp => "thumb_ip",
            Self::ThumbTip => "thumb_tip",
            Self::IndexMcp => "index_mcp",
            Self::IndexPip => "index_pip",
            Self::IndexDip => "index_dip",
            Self::IndexTip => "index_tip",
            Self::MiddleMcp => "middle_mcp",
            Self::MiddlePip => "middle_pip",
            Self::MiddleDip => "middle_dip",
            Self::MiddleTip => "middle_tip",
            Self::RingMcp => "ring_mcp",
            Self::RingPip => "ring_pip",
            Self::RingDip => "ring_dip",
            Self::RingTip => "ring_tip",
            Self::LittleMcp => "little_mcp",
            Self::LittlePip => "little_pip",
            Self::LittleDip => "little_dip",
            Self::LittleTip => "little_tip",
        }
    }
}

/// A joint position normalized to [0, 1] image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPoint {
    pub position: Vector2<f64>,
    pub confidence: f32,
}

impl JointPoint {
    pub fn new(x: f64, y: f64, confidence: f32) -> Self {
        Self {
            position: Vector2::new(x, y),
            confidence,
        }
    }

    pub fn distance_to(&self, other: &JointPoint) -> f64 {
        (self.position - other.position).norm()
    }
}

/// One detected hand: whatever joints the detector managed to place.
#[derive(Debug, Clone, Default)]
pub struct HandPose {
    joints: HashMap<HandJoint, JointPoint>,
}

impl HandPose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_joint(mut self, joint: HandJoint, point: JointPoint) -> Self {
        self.joints.insert(joint, point);
        self
    }

    pub fn insert(&mut self, joint: HandJoint, point: JointPoint) {
        self.joints.insert(joint, point);
    }

    pub fn get(&self, joint: HandJoint) -> Option<&JointPoint> {
        self.joints.get(&joint)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Flattens the pose into classifier order. Missing joints encode as zeros.
    pub fn encode(&self) -> PoseTensor {
        let mut tensor = [[0.0f32; 3]; JOINT_COUNT];
        for joint in HandJoint::ALL {
            if let Some(point) = self.joints.get(&joint) {
                tensor[joint.index()] = [
                    point.position.x as f32,
                    point.position.y as f32,
                    point.confidence,
                ];
            }
        }
        tensor
    }

    /// The three joints snap tracking needs, if the detector placed all of them.
    pub fn tracked_landmarks(&self) -> Option<HandLandmarks> {
        Some(HandLandmarks {
            thumb_tip: *self.get(HandJoint::ThumbTip)?,
            middle_tip: *self.get(HandJoint::MiddleTip)?,
            wrist: *self.get(HandJoint::Wrist)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandLandmarks {
    pub thumb_tip: JointPoint,
    pub middle_tip: JointPoint,
    pub wrist: JointPoint,
}

impl HandLandmarks {
    /// Every joint must strictly exceed `min_confidence`.
    pub fn all_confident(&self, min_confidence: f32) -> bool {
        [self.thumb_tip, self.middle_tip, self.wrist]
            .iter()
            .all(|joint| joint.confidence > min_confidence)
    }

    /// Thumb-to-middle distance divided by the wrist-to-middle hand scale.
    /// Falls back to the raw distance when the scale collapses to zero.
    pub fn normalized_distance(&self) -> f64 {
        let raw = self.thumb_tip.distance_to(&self.middle_tip);
        let scale = self.wrist.distance_to(&self.middle_tip);
        if scale > 0.0 {
            raw / scale
        } else {
            raw
        }
    }
}

/// Black-box hand-pose detector. Returns zero or more hands for one frame.
pub trait LandmarkProvider {
    type Frame;

    fn detect(&mut self, frame: &Self::Frame) -> Vec<HandPose>;
}
