//! The side tables a built [`SchedulerVmLayout`] is made of.
//!
//! Every table is addressed by a plain `u32` index rather than a pointer
//! which is what makes the whole layout trivially
//! relocatable and `bincode`-roundtrippable (the "VM layout
//! round-trip" testable property).

use serde::{Deserialize, Serialize};

use crate::opcodes::{CaseKind, CaseStrategy, CondKind};

/// A flattened signal's storage location in the runtime's value arena.
///
/// `val_slot`/`xz_slot` mirror the original's `GpgaSchedVmSignalEntry`
/// (`val_offset`/`xz_offset` in `gpga_sched.h`): the device runtime keeps one
/// combined `x-or-z` plane rather than separate x/z planes, so a `1` bit in
/// `xz` at a position whose `val` bit is `0` means X, and `1` means Z. Only
/// the host-side constant folder (`vgk_fourstate`) keeps x and z distinct;
/// this collapse happens once, here, when a value is committed to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalEntry {
    /// Offset into the runtime's value-limb arena.
    pub val_slot: u32,
    /// Offset into the runtime's xz-limb arena.
    pub xz_slot: u32,
    /// Bit width.
    pub width: u32,
    /// Number of `u64` limbs reserved at each of the two slots above.
    pub limb_count: u32,
}

/// A branch/wait condition. One shared table serves both `jump_if`'s
/// branching and the `wait_*` family's blocking, per the single
/// "condition entries" side table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CondEntry {
    pub kind: CondKind,
    /// For `CondKind::Const`: the known value, low bit used as boolean.
    pub val: u32,
    /// For `CondKind::Const`: the known x/z plane.
    pub xz: u32,
    /// For `CondKind::Expr`: start offset into the expression word stream.
    pub expr_offset: u32,
    /// For `jump_if` uses: absolute word offset to branch to when the
    /// condition is false or unknown. Unused (`0`) for pure `wait_*` uses.
    ///
    /// This field has no counterpart in the original `SchedulerVmCondEntry`
    /// (see DESIGN.md) — reusing one table for both branches and waits needs
    /// somewhere to put the branch target, since `jump_if`'s own argument is
    /// fully spent addressing this entry.
    pub branch_target: u32,
    /// For `CondKind::Sensitivity`: first index into `sensitivity_items`.
    pub sensitivity_first: u32,
    /// For `CondKind::Sensitivity`: number of contiguous items from
    /// `sensitivity_first`. `0` alongside `CondKind::Dynamic` means "every
    /// signal the guarded body reads" (an implicit `@*`).
    pub sensitivity_count: u32,
}

/// One signal/edge pair named in an explicit sensitivity list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityItem {
    pub signal: u32,
    /// `0` = any change (level-triggered item, no edge keyword), `1` =
    /// `posedge`, `2` = `negedge`.
    pub edge: u32,
}

/// One `case`/`casex`/`casez` statement's dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseHeader {
    pub kind: CaseKind,
    pub strategy: CaseStrategy,
    /// Offset into the expression word stream computing the discriminator.
    pub selector_expr_offset: u32,
    /// First of this case's entries in the shared `case_entries` table.
    pub first_entry: u32,
    /// Number of entries (contiguous, starting at `first_entry`).
    pub entry_count: u32,
    /// Word offset to jump to when no entry matches and there's no
    /// `default`; `u32::MAX` marks "no default and no entries" (never
    /// produced by the builder, but kept distinguishable from a real offset).
    pub default_target: u32,
    /// Word offset for an explicit `default:` arm, or `default_target`
    /// mirrored here when there is one (decoders don't need to special-case
    /// the “fell through with no default” outcome differently from jumping
    /// past the whole case).
    pub has_default: bool,
}

/// One pattern arm of a `case` statement. Multiple entries may share a
/// `target` (comma-separated case-item patterns, e.g. `2, 3: ...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseEntry {
    /// Offset into the shared `case_words` pool where this pattern's `want`
    /// bits start (`limb_count` `u64` limbs).
    pub want_offset: u32,
    /// Offset into `case_words` where this pattern's `care` mask starts
    /// (limb-for-limb with `want`; a `0` bit means "don't care" there).
    pub care_offset: u32,
    pub limb_count: u32,
    /// Word offset of the matched arm's body.
    pub target: u32,
}

/// A blocking or non-blocking scalar assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignEntry {
    pub signal: u32,
    /// Offset into the expression word stream computing the RHS.
    pub rhs_expr_offset: u32,
    /// `ASSIGN_FLAG_*` bits from `opcodes`.
    pub flags: u32,
    /// For a part/bit-select LHS: the low bit index written, else `0`.
    pub lsb: u32,
    /// For a part/bit-select LHS: the bit width written, else the signal's
    /// full width.
    pub width: u32,
}

/// `#d lhs = rhs;` — captures the RHS immediately, commits after `d` time units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayAssignEntry {
    pub signal: u32,
    pub rhs_expr_offset: u32,
    /// Offset into the expression word stream computing the delay amount.
    pub delay_expr_offset: u32,
    pub flags: u32,
    pub lsb: u32,
    pub width: u32,
}

/// `force lhs = rhs;` (procedural) or `force lhs = rhs;` on a net
/// (continuous, re-evaluated whenever `rhs`'s dependencies change).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceEntry {
    pub signal: u32,
    pub rhs_expr_offset: u32,
    pub flags: u32,
}

/// `release lhs;`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEntry {
    pub signal: u32,
}

/// A `repeat (n) body` loop: the body is the `body_len` instruction words
/// immediately following the `repeat` instruction itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatEntry {
    /// Offset into the expression word stream computing the repeat count.
    pub count_expr_offset: u32,
    pub body_len: u32,
}

/// A system-task/function call with no captured return value
/// (`$display`, `$monitor`, `$finish`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// One of the `GPGA_SERVICE_KIND_*` values from `gpga_sched.h`.
    pub kind: u32,
    pub flags: u32,
    /// First of this call's arguments in the shared `service_args` table.
    pub first_arg: u32,
    pub arg_count: u32,
}

/// One argument to a service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceArg {
    pub kind: ServiceArgKind,
    /// For `Expr`: offset into the expression word stream.
    /// For `StringLiteral`: offset into the shared `string_pool`.
    pub payload: u32,
}

/// What a [`ServiceArg`]'s `payload` field means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceArgKind {
    Expr,
    StringLiteral,
    /// A signal passed by reference (e.g. `$readmemh`'s memory argument, or
    /// `$fscanf`'s out-parameters), carried as a signal-table index.
    SignalRef,
}

/// A return-valued service call (`$fopen`, `$fgetc`, ...) whose result is
/// committed to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRetAssignEntry {
    pub service: u32,
    pub dest_signal: u32,
    pub flags: u32,
}

/// A four-state constant used by [`crate::opcodes::ExprOp::PushConst`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstEntry {
    pub val_offset: u32,
    pub xz_offset: u32,
    pub width: u32,
    pub limb_count: u32,
}

/// A finished scheduler VM build: one flat module's worth of processes and
/// the side tables their bytecode references.
///
/// Every process's bytecode lives in one shared `main_words` stream and
/// every expression lives in one shared `expr_words` stream; a process (or
/// any instruction needing to evaluate an expression) only ever needs to
/// remember a starting word offset into the relevant stream, never a
/// pointer. That's what makes the whole thing `bincode`-serializable for
/// free and safe to copy verbatim into device memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerVmLayout {
    /// One entry per concurrent process (continuous assign, `always`, or
    /// `initial` block); the value is the word offset of its entry point
    /// into `main_words`.
    pub process_entry_points: Vec<u32>,
    /// The shared main bytecode stream every process's entry point indexes into.
    pub main_words: Vec<u32>,
    /// The shared expression-VM bytecode stream.
    pub expr_words: Vec<u32>,

    pub signals: Vec<SignalEntry>,
    pub conds: Vec<CondEntry>,
    pub sensitivity_items: Vec<SensitivityItem>,
    pub case_headers: Vec<CaseHeader>,
    pub case_entries: Vec<CaseEntry>,
    pub assigns: Vec<AssignEntry>,
    pub delay_assigns: Vec<DelayAssignEntry>,
    pub forces: Vec<ForceEntry>,
    pub releases: Vec<ReleaseEntry>,
    pub repeats: Vec<RepeatEntry>,
    pub services: Vec<ServiceEntry>,
    pub service_args: Vec<ServiceArg>,
    pub service_ret_assigns: Vec<ServiceRetAssignEntry>,
    pub consts: Vec<ConstEntry>,

    /// Backing storage for [`SignalEntry`]/[`ConstEntry`] value limbs.
    pub val_words: Vec<u64>,
    pub xz_words: Vec<u64>,
    /// Backing storage for [`CaseEntry`] want/care masks.
    pub case_words: Vec<u64>,
    /// UTF-8 bytes of every string literal a service call references,
    /// concatenated; [`ServiceArg::payload`] for a `StringLiteral` is a byte
    /// offset, its length found by scanning to the next NUL the builder inserts.
    pub string_pool: Vec<u8>,
}

impl SchedulerVmLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total instruction words across both shared streams, for diagnostics
    /// and the size-budget test.
    pub fn total_words(&self) -> usize {
        self.main_words.len() + self.expr_words.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_roundtrips_through_bincode() {
        let mut layout = SchedulerVmLayout::new();
        layout.main_words.push(0);
        layout.signals.push(SignalEntry { val_slot: 0, xz_slot: 0, width: 4, limb_count: 1 });
        layout.consts.push(ConstEntry { val_offset: 0, xz_offset: 0, width: 4, limb_count: 1 });
        layout.val_words.push(0xA);
        layout.xz_words.push(0x0);

        let config = bincode::config::standard();
        let encoded = bincode::serde::encode_to_vec(&layout, config).expect("encode");
        let (decoded, _): (SchedulerVmLayout, usize) =
            bincode::serde::decode_from_slice(&encoded, config).expect("decode");

        assert_eq!(decoded.signals.len(), 1);
        assert_eq!(decoded.signals[0].width, 4);
        assert_eq!(decoded.val_words, vec![0xA]);
    }
}
