//! Deduplicated constant pools for integer, boolean and string literals.
//!
//! Every constant is emitted as a full object image the runtime can hand
//! out: `[-1 gc tag, class tag, size in words, dispatch pointer,
//! payload...]`. String constants additionally reference the integer
//! constant holding their length, and carry a NUL-terminated ASCII blob
//! padded to a word boundary.

use coolc_util::{unescaped_len, Names};
use indexmap::IndexSet;

use crate::mips::Mips;

/// The three constant pools. Strings are stored in their escaped form
/// (no surrounding quotes); their labels are `str_const<index>` in
/// first-use order, while integer labels embed the value itself.
pub struct ConstPool {
    ints: IndexSet<u32>,
    strings: IndexSet<String>,
}

impl Default for ConstPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstPool {
    /// A fresh pool holding the constants the backend always needs:
    /// `int_const0`, `str_const0` (the empty string) and both booleans.
    pub fn new() -> Self {
        let mut pool = Self {
            ints: IndexSet::new(),
            strings: IndexSet::new(),
        };
        pool.int_const(0);
        pool.str_const("");
        pool
    }

    /// Label of the integer constant for `value`, creating it on first
    /// use.
    pub fn int_const(&mut self, value: u32) -> String {
        self.ints.insert(value);
        format!("int_const{value}")
    }

    /// Label of one of the two boolean constants.
    pub fn bool_const(&self, value: bool) -> String {
        format!("bool_const{}", value as u32)
    }

    /// Label of the string constant for `escaped` (escaped form, no
    /// quotes), creating it (and the integer constant for its length)
    /// on first use.
    pub fn str_const(&mut self, escaped: &str) -> String {
        self.int_const(unescaped_len(escaped) as u32);
        let (index, _) = self.strings.insert_full(escaped.to_string());
        format!("str_const{index}")
    }

    /// Emits every pooled constant into the data segment. Needs the
    /// class tags, which are only known once prototypes are numbered.
    pub fn serialize(&self, mips: &mut Mips, int_tag: usize, bool_tag: usize, str_tag: usize) {
        for value in &self.ints {
            serialize_int(mips, *value, int_tag);
        }
        for value in [false, true] {
            serialize_bool(mips, value, bool_tag);
        }
        for (index, content) in self.strings.iter().enumerate() {
            serialize_str(mips, content, index, str_tag);
        }
    }
}

fn serialize_int(mips: &mut Mips, value: u32, int_tag: usize) {
    mips.word(-1)
        .label(&format!("int_const{value}"))
        .word(int_tag)
        .word(4)
        .word(Names::form_disp_table(Names::INT))
        .word(value);
}

fn serialize_bool(mips: &mut Mips, value: bool, bool_tag: usize) {
    mips.global(&format!("bool_const{}", value as u32))
        .word(-1)
        .label(&format!("bool_const{}", value as u32))
        .word(bool_tag)
        .word(4)
        .word(Names::form_disp_table(Names::BOOL))
        .word(value as u32);
}

fn serialize_str(mips: &mut Mips, escaped: &str, index: usize, str_tag: usize) {
    // 4 header-ish words (tag, size, dispatch, length pointer) plus the
    // blob rounded up to whole words with its terminating NUL.
    let size_words = 4 + (escaped.len() + 1).div_ceil(4);
    mips.word(-1)
        .label(&format!("str_const{index}"))
        .word(str_tag)
        .word(size_words)
        .word(Names::form_disp_table(Names::STRING))
        .word(format!("int_const{}", unescaped_len(escaped)));

    // `.ascii` runs split on literal `\\`; the assembler gets the raw
    // backslash byte between the runs.
    if !escaped.is_empty() {
        let segments = split_on_double_backslash(escaped);
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                mips.byte(92);
            }
            if !segment.is_empty() {
                mips.ascii(segment);
            }
        }
    }
    mips.byte(0).align(2);
}

/// Splits escaped string contents on `\\` pairs, leaving every other
/// escape sequence inside the segments.
fn split_on_double_backslash(escaped: &str) -> Vec<String> {
    let bytes = escaped.as_bytes();
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() && bytes[i + 1] == b'\\' {
            segments.push(std::mem::take(&mut current));
            i += 2;
        } else {
            current.push(bytes[i] as char);
            i += 1;
        }
    }
    segments.push(current);
    segments
}
