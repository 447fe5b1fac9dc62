//! Memory map and frame calling convention.
//!
//! Two fixed cells hold `FRAME_PTR` (base of the active frame) and
//! `FRAME_TOP` (first free word of the frame arena). A frame is laid out as
//! `[saved FRAME_PTR, param 1..P, local 1..L]`. Calls bump `FRAME_TOP` and
//! returns rewind it, so recursion gets stack discipline without a hardware
//! stack for locals.

use crate::asm_writer::AsmWriter;

/// First global variable address.
pub const GLOBAL_BASE: u16 = 0x0100;
/// Cell holding the active frame's base address.
pub const FRAME_PTR: u16 = 0x00F0;
/// Cell holding the first free word of the frame arena.
pub const FRAME_TOP: u16 = 0x00F1;
/// Start of the frame arena.
pub const FRAME_HEAP_BASE: u16 = 0x1000;

/// `FRAME_TOP := FRAME_HEAP_BASE; FRAME_PTR := 0`.
pub fn write_bootstrap(out: &mut AsmWriter) {
    out.write_lit(FRAME_HEAP_BASE);
    out.write_lit(FRAME_TOP);
    out.write_instruction("!");
    out.write_lit(0);
    out.write_lit(FRAME_PTR);
    out.write_instruction("!");
}

/// Open a frame for a subprogram with `params` parameters and `locals`
/// locals. The arguments are on the data stack, last argument on top.
pub fn write_prologue(out: &mut AsmWriter, params: u16, locals: u16) {
    // base = FRAME_TOP; [base] = FRAME_PTR; FRAME_PTR = base
    out.write_lit(FRAME_TOP);
    out.write_instruction("@");
    out.write_instruction("DUP");
    out.write_lit(FRAME_PTR);
    out.write_instruction("@");
    out.write_instruction("SWAP");
    out.write_instruction("!");
    out.write_lit(FRAME_PTR);
    out.write_instruction("!");

    // Last argument fills the highest parameter slot.
    for offset in (1..=params).rev() {
        write_frame_address(out, offset);
        out.write_instruction("!");
    }

    // FRAME_TOP = base + 1 + P + L
    write_frame_address(out, 1 + params + locals);
    out.write_lit(FRAME_TOP);
    out.write_instruction("!");
}

/// Close the active frame and return. With `preserve_result` the top of
/// the data stack rides out the teardown on the return stack.
pub fn write_epilogue(out: &mut AsmWriter, preserve_result: bool) {
    if preserve_result {
        out.write_instruction(">R");
    }
    // FRAME_TOP = base; FRAME_PTR = [base]
    out.write_lit(FRAME_PTR);
    out.write_instruction("@");
    out.write_instruction("DUP");
    out.write_lit(FRAME_TOP);
    out.write_instruction("!");
    out.write_instruction("@");
    out.write_lit(FRAME_PTR);
    out.write_instruction("!");
    if preserve_result {
        out.write_instruction("R>");
    }
    out.write_instruction("EXIT");
}

/// Push `FRAME_PTR + offset`.
pub fn write_frame_address(out: &mut AsmWriter, offset: u16) {
    out.write_lit(FRAME_PTR);
    out.write_instruction("@");
    out.write_lit(offset);
    out.write_instruction("ADD");
}

/// Push the frame slot at `offset`.
pub fn write_frame_load(out: &mut AsmWriter, offset: u16) {
    write_frame_address(out, offset);
    out.write_instruction("@");
}

/// Pop the top of stack into the frame slot at `offset`.
pub fn write_frame_store(out: &mut AsmWriter, offset: u16) {
    write_frame_address(out, offset);
    out.write_instruction("!");
}

/// Push the global at `address`.
pub fn write_global_load(out: &mut AsmWriter, address: u16) {
    out.write_lit(address);
    out.write_instruction("@");
}

/// Pop the top of stack into the global at `address`.
pub fn write_global_store(out: &mut AsmWriter, address: u16) {
    out.write_lit(address);
    out.write_instruction("!");
}
