/// An entry in the error code registry.
pub struct ErrorEntry {
    pub code: &'static str,
    pub short: &'static str,
    pub long: &'static str,
}

/// All stable error codes reported by liteexpr.
pub static REGISTRY: &[ErrorEntry] = &[
    // ── Syntax ───────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "LE-S001",
        short: "unexpected token",
        long: r#"## LE-S001: unexpected token

The source could not be tokenized or parsed. The first offending token is
reported; `<EOF>` means the input ended while an expression was still open.

**Examples:**

    a = (1 + 2      -- missing `)`
    x = 'a'         -- strings use double quotes
    1 +* 2          -- `*` cannot start an operand

Assignment targets must be variables, members or index expressions:

    1 = x           -- not assignable
"#,
    },
    ErrorEntry {
        code: "LE-S002",
        short: "wrong number of arguments",
        long: r#"## LE-S002: wrong number of arguments

A function was called with fewer or more arguments than it accepts. The
message lists the accepted range and the count that was passed.

**Example:**

    SQRT(1, 2)      -- SQRT takes exactly one argument

User functions declare their arity with the signature passed to
`FUNCTION`: each `?` is a required argument and a trailing `*` accepts any
number of extra arguments.
"#,
    },
    ErrorEntry {
        code: "LE-S003",
        short: "invalid numeric literal",
        long: r#"## LE-S003: invalid numeric literal

A decimal, hexadecimal or floating point literal could not be decoded.
Decimal and hexadecimal literals wrap on overflow; this error only comes
from malformed text.
"#,
    },
    ErrorEntry {
        code: "LE-S004",
        short: "invalid string escape",
        long: r#"## LE-S004: invalid string escape

A string literal contains a backslash sequence that is not recognised, or a
`\x`, `\u`, `\U` escape that is too short or names an invalid code point.

**Recognised escapes:** `\\` `\"` `\t` `\r` `\n`, `\xHH`, `\uHHHH`,
`\UHHHHHHHH`, and a backslash before a line break to continue the string.

**Example:**

    "tab\q"         -- `\q` is not an escape
"#,
    },

    // ── Runtime ──────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "LE-R001",
        short: "unsupported operand types",
        long: r#"## LE-R001: unsupported operand types

An operator was applied to values it does not support, or a value was used
as an array index or object key when it cannot be one.

**Examples:**

    "a" < 1         -- strings only compare with strings
    [1] * 2         -- arrays only support `+`
    1.5 % 2         -- `%` and bitwise operators are integer only
    -"text"         -- negation needs a number
    o[[1]]          -- arrays are not valid keys
"#,
    },
    ErrorEntry {
        code: "LE-R002",
        short: "division or modulus by zero",
        long: r#"## LE-R002: division or modulus by zero

An integer was divided by zero with `/`, `%`, `/=` or `%=`. Floating point
division by zero follows IEEE 754 and yields an infinity or NaN instead.

**Example:**

    n = 0; 10 / n
"#,
    },
    ErrorEntry {
        code: "LE-R003",
        short: "negative shift amount",
        long: r#"## LE-R003: negative shift amount

The right operand of `<<`, `>>` or `>>>` was negative. Shifts by 64 or more
are allowed and yield 0.
"#,
    },
    ErrorEntry {
        code: "LE-R004",
        short: "array index out of range",
        long: r#"## LE-R004: array index out of range

An array was read at an index that does not exist, or written past its end.
Writing at exactly the current length appends.

**Example:**

    a = [1, 2]; a[2] = 3     -- appends
    a[5]                     -- error: only indexes 0 to 2 exist
"#,
    },
    ErrorEntry {
        code: "LE-R005",
        short: "unknown symbol",
        long: r#"## LE-R005: unknown symbol

A variable or object member was read before it was assigned. Lookups walk
from the current scope up through enclosing scopes to the global scope.
"#,
    },
    ErrorEntry {
        code: "LE-R006",
        short: "value is not a container",
        long: r#"## LE-R006: value is not a container

Member access or indexing was applied to a value that is not an array,
object or scope.

**Example:**

    n = 1; n.x
"#,
    },
    ErrorEntry {
        code: "LE-R007",
        short: "value is not a function",
        long: r#"## LE-R007: value is not a function

A call was made on a value that is not a function.

**Example:**

    x = 1; x()
"#,
    },
    ErrorEntry {
        code: "LE-R008",
        short: "invalid argument",
        long: r#"## LE-R008: invalid argument

A built-in rejected one of its arguments: a non-numeric value passed to a
numeric function, a `FOREACH` over something that is not iterable, a loop
variable that is not assignable, or a `FUNCTION` signature containing a
character other than `?` and `*`.
"#,
    },
    ErrorEntry {
        code: "LE-R009",
        short: "evaluation depth exceeded",
        long: r#"## LE-R009: evaluation depth exceeded

Evaluation nested deeper than the configured limit, usually from unbounded
recursion through user functions or `EVAL`. The limit defaults to 10000
and can be changed with `--max-depth` or `EvalOptions::max_depth`.
"#,
    },
];

/// Look up an error entry by code (e.g. `"LE-R002"`).
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    REGISTRY.iter().find(|e| e.code.eq_ignore_ascii_case(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BasicError;

    #[test]
    fn lookup_known_code() {
        let e = lookup("LE-R002").expect("LE-R002 should be in registry");
        assert_eq!(e.code, "LE-R002");
        assert!(!e.short.is_empty());
        assert!(e.long.contains("LE-R002"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("le-s001").map(|e| e.code), Some("LE-S001"));
    }

    #[test]
    fn lookup_unknown_returns_none() {
        assert!(lookup("LE-X999").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn all_codes_unique() {
        let mut codes: Vec<&str> = REGISTRY.iter().map(|e| e.code).collect();
        codes.sort_unstable();
        let len_before = codes.len();
        codes.dedup();
        assert_eq!(codes.len(), len_before, "duplicate codes in registry");
    }

    #[test]
    fn every_error_code_is_registered() {
        let samples = [
            BasicError::UnsupportedOperation { op: "ivalue", ty: "STRING" },
            BasicError::DivisionByZero { left: 1, right: 0 },
            BasicError::NegativeShift { op: "<<", amount: -1 },
            BasicError::IndexOutOfRange { index: 3, len: 1 },
            BasicError::UnknownSymbol { key: "x".into() },
            BasicError::NotAContainer { access: "get", ty: "INTEGER" },
            BasicError::NotCallable { name: "x".into(), ty: "INTEGER" },
            BasicError::NotIterable { ty: "INTEGER" },
            BasicError::DepthExceeded(1),
            BasicError::ArgumentCount { min: 1, max: 1, got: 0 },
            BasicError::InvalidHex('g'),
            BasicError::InvalidEscape(0),
        ];
        for e in samples {
            assert!(lookup(e.code()).is_some(), "{} is not registered", e.code());
        }
    }
}
