//! Built-in C++/Rust example pairs

use crate::model::Submission;
use serde::Serialize;

/// A named pair of equivalent-looking programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Example {
    pub name: &'static str,
    pub summary: &'static str,
    pub cpp: &'static str,
    pub rust: &'static str,
}

impl Example {
    pub fn to_submission(&self) -> Submission {
        Submission::new(self.cpp, self.rust)
    }
}

static EXAMPLES: &[Example] = &[
    Example {
        name: "add",
        summary: "Signed addition; the C++ side carries nsw",
        cpp: r#"int add(int a, int b) {
    return a + b;
}"#,
        rust: r#"pub fn add(a: i32, b: i32) -> i32 {
    a + b
}"#,
    },
    Example {
        name: "add_u32",
        summary: "Unsigned addition; C++ wraps while Rust panics on overflow",
        cpp: r#"unsigned int add(unsigned int a, unsigned int b) {
    return a + b;
}"#,
        rust: r#"pub fn add(a: u32, b: u32) -> u32 {
    a + b
}"#,
    },
    Example {
        name: "simple_struct",
        summary: "Returning a two-field struct by value",
        cpp: r#"struct Point {
    int x;
    int y;
};

Point create_point(int x, int y) {
    return Point { x, y };
}"#,
        rust: r#"#[repr(C)]
#[derive(Clone, Copy)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

pub fn create_point(x: i32, y: i32) -> Point {
    Point { x, y }
}"#,
    },
    Example {
        name: "simple_enum",
        summary: "Casting an integer into a C-like enum",
        cpp: r#"enum Color {
    Red,
    Green,
    Blue,
};

Color create_color(int x) {
    return static_cast<Color>(x);
}"#,
        rust: r#"#[repr(i32)]
#[derive(Clone, Copy)]
pub enum Color {
    Red = 0,
    Green = 1,
    Blue = 2,
}

pub fn create_color(x: i32) -> Color {
    unsafe { std::mem::transmute(x) }
}"#,
    },
    Example {
        name: "switch_case",
        summary: "Character classification with case ranges",
        cpp: r#"int classify_char(char c) {
    switch (c) {
        case ' ':
        case '\t':
        case '\n': return 0;
        case '0' ... '9': return 1;
        case 'a' ... 'z':
        case 'A' ... 'Z': return 2;
        default: return 3;
    }
}"#,
        rust: r#"pub extern "C" fn classify_char(c: i8) -> i32 {
    match c as u8 as char {
        ' ' | '\t' | '\n' => 0,
        '0'..='9' => 1,
        'a'..='z' | 'A'..='Z' => 2,
        _ => 3
    }
}"#,
    },
    Example {
        name: "factorial",
        summary: "Recursion, which the verifier treats as an opaque call",
        cpp: r#"int factorial(int n) {
    if (n <= 1) {
        return 1;
    }
    return n * factorial(n - 1);
}"#,
        rust: r#"pub fn factorial(n: i32) -> i32 {
    if n <= 1 {
        return 1;
    }
    n.wrapping_mul(factorial(n - 1))
}"#,
    },
    Example {
        name: "deref",
        summary: "Raw pointer versus reference dereference",
        cpp: r#"int deref(const int *ptr) {
    return *ptr;
}"#,
        rust: r#"pub fn deref(ptr: &i32) -> i32 {
    *ptr
}"#,
    },
    Example {
        name: "nested_switch",
        summary: "Nested switch with C++ fallthrough",
        cpp: r#"int process_tokens(char type, int value) {
    switch (type) {
        case 'n':
            switch (value) {
                case 0: return -1;
                case 1:
                case 2: return value * 10;
                default:
                    if (value > 100) return 100;
            }
        case 'c':
            if (value < 32) return 0;
        case 's':
            return value + 50;
        default:
            return -99;
    }
}"#,
        rust: r#"pub extern "C" fn process_tokens(type_: i8, value: i32) -> i32 {
    match type_ as u8 as char {
        'n' => {
            match value {
                0 => -1,
                1 | 2 => value.wrapping_mul(10),
                v if v > 100 => 100,
                v => {
                    if v < 32 { 0 }
                    else { v.wrapping_add(50) }
                }
            }
        }
        'c' => {
            if value < 32 { 0 }
            else { value.wrapping_add(50) }
        }
        's' => value.wrapping_add(50),
        _ => -99
    }
}"#,
    },
];

/// Every example, in catalog order
pub fn all() -> &'static [Example] {
    EXAMPLES
}

pub fn names() -> Vec<&'static str> {
    EXAMPLES.iter().map(|e| e.name).collect()
}

/// Look up an example by exact name
pub fn find(name: &str) -> Option<&'static Example> {
    EXAMPLES.iter().find(|e| e.name == name)
}
