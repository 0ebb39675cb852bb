//! Elaboration: flattening a set of parsed modules into one [`Design`]
//! ready for the scheduler VM builder.

pub mod context;
pub mod design;
pub mod errors;
mod flatten;

pub use context::ElaborationContext;
pub use design::{Design, FlatAlways, FlatAssign, FlatInitial, FlatModule, FlatNet, FlatPort, NetKind};
pub use flatten::elaborate;
