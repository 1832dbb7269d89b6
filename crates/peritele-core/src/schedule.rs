use crate::Eye;

/// Stages of one frame, in the order the driver must run them.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FrameStage {
    LateUpdate = 1,
    PreRender = 2,
    OffscreenRender = 3,
    ResolveLeft = 4,
    ResolveRight = 5,
}

impl FrameStage {
    #[inline]
    pub fn resolve(eye: Eye) -> Self {
        match eye { Eye::Left => FrameStage::ResolveLeft, Eye::Right => FrameStage::ResolveRight }
    }
}

/// Stages strictly increase; a stage never repeats inside a frame.
pub fn is_ordered(stages: &[FrameStage]) -> bool {
    stages.windows(2).all(|w| (w[0] as u8) < (w[1] as u8))
}
