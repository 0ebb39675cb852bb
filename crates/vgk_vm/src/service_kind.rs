//! Numeric `GPGA_SERVICE_KIND_*` assignments a [`crate::layout::ServiceEntry`]
//! selects among, taken verbatim from `gpga_sched.h` so a decoder built
//! against either source agrees bit-for-bit. Same append-only stability
//! rule as the opcode tables in `opcodes.rs`.

pub const DISPLAY: u32 = 0;
pub const MONITOR: u32 = 1;
pub const FINISH: u32 = 2;
pub const DUMPFILE: u32 = 3;
pub const DUMPVARS: u32 = 4;
pub const READMEMH: u32 = 5;
pub const READMEMB: u32 = 6;
pub const STOP: u32 = 7;
pub const STROBE: u32 = 8;
pub const DUMPOFF: u32 = 9;
pub const DUMPON: u32 = 10;
pub const DUMPFLUSH: u32 = 11;
pub const DUMPALL: u32 = 12;
pub const DUMPLIMIT: u32 = 13;
pub const FWRITE: u32 = 14;
pub const FDISPLAY: u32 = 15;
pub const FOPEN: u32 = 16;
pub const FCLOSE: u32 = 17;
pub const FGETC: u32 = 18;
pub const FGETS: u32 = 19;
pub const FEOF: u32 = 20;
pub const FSCANF: u32 = 21;
pub const SSCANF: u32 = 22;
pub const FTELL: u32 = 23;
pub const REWIND: u32 = 24;
pub const WRITEMEMH: u32 = 25;
pub const WRITEMEMB: u32 = 26;
pub const FSEEK: u32 = 27;
pub const FFLUSH: u32 = 28;
pub const FERROR: u32 = 29;
pub const FUNGETC: u32 = 30;
pub const FREAD: u32 = 31;
pub const WRITE: u32 = 32;
pub const SFORMAT: u32 = 33;
pub const TIMEFORMAT: u32 = 34;
pub const PRINTTIMESCALE: u32 = 35;
pub const TESTPLUSARGS: u32 = 36;
pub const VALUEPLUSARGS: u32 = 37;
pub const ASYNC_AND_ARRAY: u32 = 38;
pub const SYNC_OR_PLANE: u32 = 39;
pub const ASYNC_NOR_PLANE: u32 = 40;
pub const SYNC_NAND_PLANE: u32 = 41;
pub const SHOWCANCELLED: u32 = 42;
