//! Structured MIPS assembly writer.
//!
//! Two buffers: the data segment (object images, constants, tables) and
//! the text segment (init routines and method bodies). Directives that
//! can appear in either (`.word`, `.globl`, labels) follow the current
//! segment mode; instructions always go to text. `end()` concatenates
//! data before text, so a label emitted in text mode before the `.text`
//! directive still lands at the tail of the data segment; that is how
//! `heap_start` is placed.
//!
//! All emit methods return `&mut Self` for chaining.

use std::fmt;

/// The registers the generated code uses. `$a0` is the accumulator:
/// every expression leaves its result object there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg {
    /// `$a0`, the accumulator / first argument.
    Acc,
    /// `$a1`, second runtime argument.
    A1,
    Fp,
    Sp,
    Ra,
    Zero,
    /// `$s0`, callee-saved; holds `self`.
    S0,
    T1,
    T2,
    /// `$t5`; carries the `class_objTab` entry across `Object.copy`.
    T5,
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg::Acc => "$a0",
            Reg::A1 => "$a1",
            Reg::Fp => "$fp",
            Reg::Sp => "$sp",
            Reg::Ra => "$ra",
            Reg::Zero => "$zero",
            Reg::S0 => "$s0",
            Reg::T1 => "$t1",
            Reg::T2 => "$t2",
            Reg::T5 => "$t5",
        };
        f.write_str(name)
    }
}

/// A base-plus-offset memory operand, `off($reg)`.
#[derive(Clone, Copy, Debug)]
pub struct Addr(pub Reg, pub i32);

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.1, self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Segment {
    Data,
    Text,
}

/// The assembly writer.
pub struct Mips {
    data: String,
    text: String,
    segment: Segment,
}

impl Default for Mips {
    fn default() -> Self {
        Self::new()
    }
}

impl Mips {
    pub fn new() -> Self {
        Self {
            data: String::new(),
            text: String::new(),
            segment: Segment::Data,
        }
    }

    pub fn set_data_mode(&mut self) -> &mut Self {
        self.segment = Segment::Data;
        self
    }

    pub fn set_text_mode(&mut self) -> &mut Self {
        self.segment = Segment::Text;
        self
    }

    fn current(&mut self) -> &mut String {
        match self.segment {
            Segment::Data => &mut self.data,
            Segment::Text => &mut self.text,
        }
    }

    fn emit(&mut self, line: String) -> &mut Self {
        let buffer = self.current();
        buffer.push_str(&line);
        buffer.push('\n');
        self
    }

    fn instr(&mut self, line: String) -> &mut Self {
        self.text.push_str(&line);
        self.text.push('\n');
        self
    }

    /// Finishes the module: data segment, blank line, text segment.
    pub fn end(self) -> String {
        format!("{}\n{}", self.data, self.text)
    }

    // ---- directives -----------------------------------------------------

    pub fn data(&mut self) -> &mut Self {
        self.data.push_str("\t.data\t\n");
        self
    }

    pub fn text(&mut self) -> &mut Self {
        self.text.push_str("\t.text\t\n");
        self
    }

    pub fn align(&mut self, alignment: usize) -> &mut Self {
        self.data.push_str(&format!("\t.align\t{alignment}\n"));
        self
    }

    pub fn word(&mut self, value: impl fmt::Display) -> &mut Self {
        self.emit(format!("\t.word\t{value}"))
    }

    pub fn global(&mut self, name: &str) -> &mut Self {
        self.emit(format!("\t.globl\t{name}"))
    }

    pub fn label(&mut self, name: &str) -> &mut Self {
        self.emit(format!("{name}:"))
    }

    pub fn ascii(&mut self, content: &str) -> &mut Self {
        self.data.push_str(&format!("\t.ascii\t\"{content}\"\n"));
        self
    }

    pub fn byte(&mut self, value: usize) -> &mut Self {
        self.data.push_str(&format!("\t.byte\t{value}\n"));
        self
    }

    // ---- instructions ---------------------------------------------------

    pub fn jal(&mut self, target: &str) -> &mut Self {
        self.instr(format!("\tjal\t{target}"))
    }

    pub fn jalr(&mut self, r: Reg) -> &mut Self {
        self.instr(format!("\tjalr\t{r}"))
    }

    pub fn jr(&mut self, r: Reg) -> &mut Self {
        self.instr(format!("\tjr\t{r}"))
    }

    pub fn addiu(&mut self, r1: Reg, r2: Reg, imm: i32) -> &mut Self {
        self.instr(format!("\taddiu\t{r1} {r2} {imm}"))
    }

    pub fn addu(&mut self, r1: Reg, r2: Reg, r3: Reg) -> &mut Self {
        self.instr(format!("\taddu\t{r1} {r2} {r3}"))
    }

    pub fn add(&mut self, r1: Reg, r2: Reg, r3: Reg) -> &mut Self {
        self.instr(format!("\tadd\t{r1} {r2} {r3}"))
    }

    pub fn sub(&mut self, r1: Reg, r2: Reg, r3: Reg) -> &mut Self {
        self.instr(format!("\tsub\t{r1} {r2} {r3}"))
    }

    pub fn mul(&mut self, r1: Reg, r2: Reg, r3: Reg) -> &mut Self {
        self.instr(format!("\tmul\t{r1} {r2} {r3}"))
    }

    pub fn div(&mut self, r1: Reg, r2: Reg, r3: Reg) -> &mut Self {
        self.instr(format!("\tdiv\t{r1} {r2} {r3}"))
    }

    /// Shift left logical by an immediate.
    pub fn sll(&mut self, r1: Reg, r2: Reg, imm: i32) -> &mut Self {
        self.instr(format!("\tsll\t{r1} {r2} {imm}"))
    }

    pub fn li(&mut self, r: Reg, value: u32) -> &mut Self {
        self.instr(format!("\tli\t{r} {value}"))
    }

    pub fn la(&mut self, r: Reg, address: &str) -> &mut Self {
        self.instr(format!("\tla\t{r} {address}"))
    }

    pub fn lw(&mut self, r: Reg, addr: Addr) -> &mut Self {
        self.instr(format!("\tlw\t{r} {addr}"))
    }

    pub fn sw(&mut self, r: Reg, addr: Addr) -> &mut Self {
        self.instr(format!("\tsw\t{r} {addr}"))
    }

    pub fn mov(&mut self, to: Reg, from: Reg) -> &mut Self {
        self.instr(format!("\tmove\t{to} {from}"))
    }

    pub fn b(&mut self, label: &str) -> &mut Self {
        self.instr(format!("\tb\t{label}"))
    }

    pub fn beq(&mut self, r1: Reg, r2: Reg, label: &str) -> &mut Self {
        self.instr(format!("\tbeq\t{r1} {r2} {label}"))
    }

    pub fn beqz(&mut self, r: Reg, label: &str) -> &mut Self {
        self.instr(format!("\tbeqz\t{r} {label}"))
    }

    pub fn bne(&mut self, r1: Reg, r2: Reg, label: &str) -> &mut Self {
        self.instr(format!("\tbne\t{r1} {r2} {label}"))
    }

    pub fn blt(&mut self, r1: Reg, r2: Reg, label: &str) -> &mut Self {
        self.instr(format!("\tblt\t{r1} {r2} {label}"))
    }

    pub fn ble(&mut self, r1: Reg, r2: Reg, label: &str) -> &mut Self {
        self.instr(format!("\tble\t{r1} {r2} {label}"))
    }

    /// Branch if register is less than an immediate.
    pub fn blti(&mut self, r: Reg, imm: usize, label: &str) -> &mut Self {
        self.instr(format!("\tblt\t{r} {imm} {label}"))
    }

    /// Branch if register is greater than an immediate.
    pub fn bgti(&mut self, r: Reg, imm: usize, label: &str) -> &mut Self {
        self.instr(format!("\tbgt\t{r} {imm} {label}"))
    }

    // ---- calling convention ---------------------------------------------

    /// Standard callee prolog: save `$fp`, `$s0`, `$ra`, set up the new
    /// frame, and load `self` from the accumulator.
    pub fn prolog(&mut self) -> &mut Self {
        self.addiu(Reg::Sp, Reg::Sp, -12)
            .sw(Reg::Fp, Addr(Reg::Sp, 12))
            .sw(Reg::S0, Addr(Reg::Sp, 8))
            .sw(Reg::Ra, Addr(Reg::Sp, 4))
            .addiu(Reg::Fp, Reg::Sp, 4)
            .mov(Reg::S0, Reg::Acc)
    }

    /// Callee epilog: restore saved registers, pop the frame and the
    /// `nargs` caller-pushed arguments, return.
    pub fn epilog(&mut self, nargs: usize) -> &mut Self {
        self.lw(Reg::Fp, Addr(Reg::Sp, 12))
            .lw(Reg::S0, Addr(Reg::Sp, 8))
            .lw(Reg::Ra, Addr(Reg::Sp, 4))
            .addiu(Reg::Sp, Reg::Sp, 12 + 4 * nargs as i32)
            .jr(Reg::Ra)
    }

    /// Pushes a register onto the stack.
    pub fn push(&mut self, r: Reg) -> &mut Self {
        self.sw(r, Addr(Reg::Sp, 0)).addiu(Reg::Sp, Reg::Sp, -4)
    }

    /// Pops the top of stack into a register.
    pub fn pop_into(&mut self, r: Reg) -> &mut Self {
        self.addiu(Reg::Sp, Reg::Sp, 4).lw(r, Addr(Reg::Sp, 0))
    }

    /// Drops the top of stack.
    pub fn pop(&mut self) -> &mut Self {
        self.addiu(Reg::Sp, Reg::Sp, 4)
    }

    /// Notifies the collector of a store into `offset($s0)`.
    pub fn gen_gc_assign(&mut self, offset: i32) -> &mut Self {
        self.addiu(Reg::A1, Reg::S0, offset)
            .jal(coolc_util::Names::GC_ASSIGN)
    }
}
