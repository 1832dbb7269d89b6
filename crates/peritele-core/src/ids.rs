use core::fmt;

/// Physical eye. The discriminant is the index the kernel sees.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Eye { Left = 0, Right = 1 }

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];
    #[inline] pub fn index(self) -> usize { self as usize }
    /// -1 for the left eye, +1 for the right; multiplies the half eye separation.
    #[inline] pub fn side(self) -> f32 { match self { Eye::Left => -1.0, Eye::Right => 1.0 } }
}
impl fmt::Display for Eye {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Eye::Left => write!(f, "left"), Eye::Right => write!(f, "right") }
    }
}

/// Which auxiliary rig. `Current` holds the last forecast, `Predicted` the new one.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RigSlot { Current = 0, Predicted = 1 }

impl RigSlot {
    pub const BOTH: [RigSlot; 2] = [RigSlot::Current, RigSlot::Predicted];
    #[inline] pub fn index(self) -> usize { self as usize }
}
impl fmt::Display for RigSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { RigSlot::Current => write!(f, "current"), RigSlot::Predicted => write!(f, "predicted") }
    }
}
