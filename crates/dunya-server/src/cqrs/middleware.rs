//! Marker traits separating writes from reads

/// A request that changes state
pub trait Command {}

/// A request that only reads state
pub trait Query {}
