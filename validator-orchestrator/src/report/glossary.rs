//! Hover text for report vocabulary

/// Explanation for a keyword, matched on the exact token text
pub fn lookup(term: &str) -> Option<&'static str> {
    let text = match term {
        "noundef" => "value cannot be undefined",
        "i1" => "1-bit integer type (boolean)",
        "i8" => "8-bit integer type",
        "i16" => "16-bit integer type",
        "i32" => "32-bit integer type",
        "i64" => "64-bit integer type",
        "ptr" => "pointer type",
        "align" => "memory alignment requirement",
        "define" => "declare a function with definition",
        "declare" => "declare a function without definition",
        "extractvalue" => "extract a member from an aggregate value",
        "assume" => "tell optimizer to assume a condition is true",
        "call" => "call a function",
        "UB" => "Undefined Behavior in language specification",
        "gep" => "computes address of a subelement in an aggregate data structure",
        "inbounds" => "indicates pointer arithmetic will not overflow or go out of bounds",
        "noreturn" => "function never returns to caller",
        "nsw" => "no signed wrap: signed overflow produces poison",
        "nuw" => "no unsigned wrap: unsigned overflow produces poison",
        "offset" => "memory address offset",
        "block_id" => "memory block identifier",
        "address" => "memory location",
        "local" => "memory block allocated in current function's stack frame",
        "non-local" => "memory block allocated outside current function's stack frame",
        "const" => "constant value",
        "alive" => "memory block is still in use",
        "poison" => "value that causes undefined behavior when used in computations",
        "undef" => "value that may be any bit pattern at each use",
        "store" => "store value to memory location",
        "load" => "load value from memory location",
        "br" => "branch to different basic block",
        "ret" => "return value from function",
        "label" => "basic block identifier",
        "switch" => "multi-way branch based on value",
        "ule" => "unsigned less-than-or-equal comparison",
        "uge" => "unsigned greater-than-or-equal comparison",
        "ult" => "unsigned less-than comparison",
        "ugt" => "unsigned greater-than comparison",
        "icmp" => "integer comparison",
        "fcmp" => "floating-point comparison",
        "phi" => "select value based on predecessor block",
        "alloca" => "allocate memory on stack",
        "sext" => "extends a smaller integer to a larger one by copying the sign bit",
        "zext" => "extends a smaller integer to a larger one by padding with zeros",
        "trunc" => "converts a larger integer to a smaller one by dropping high-order bits",
        "signext" => "extends a smaller integer to a larger one by copying the sign bit",
        _ => return None,
    };
    Some(text)
}

/// Explanation for a global symbol, based on its mangling prefix
///
/// `name` excludes the leading `@`.
pub fn symbol_hover(name: &str) -> Option<&'static str> {
    if name.starts_with("_ZN") {
        // Rust's legacy mangling nests paths under _ZN
        Some(if name.contains("panic") {
            "Rust mangled function name (panic handler)"
        } else if name.contains("core") {
            "Rust mangled function name (core library function)"
        } else {
            "Rust mangled function name"
        })
    } else if name.starts_with("_Z") {
        Some("C++ mangled function name")
    } else if name.starts_with("alloc") {
        Some("memory allocation function")
    } else {
        None
    }
}

pub const TYPE_CHECK: &str =
    "whether the type of the two converted LLVM IR functions match with each other";
pub const DEFINED_STATE: &str =
    "a program state that does not trigger any undefined behavior (UB)";
pub const TIMED_OUT: &str = "verification process exceeds the time limit";
pub const TRIGGERED_UB: &str = "function execution resulted in Undefined Behavior";
pub const JUMP: &str = "Branch instruction to a labeled block";
