//! Lowers an elaborated [`vgk_elaborate::Design`] into scheduler VM bytecode
//! a stack-based, per-process instruction stream plus the side
//! tables (signals, conditions, case headers, assigns, services) the bytecode
//! references by index.

pub mod builder;
pub mod errors;
pub mod exprvm;
pub mod layout;
pub mod opcodes;
pub mod service_kind;

pub use builder::build;
pub use layout::SchedulerVmLayout;
