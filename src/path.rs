//! Path geometry commands.
//!
//! `ofd:AbbreviatedData` holds a compact command string. Producers write
//! either the OFD command set (`S M L Q B A C`, where `C` closes and `B` is a
//! cubic Bézier) or SVG-style path data. Operations keep their operands as
//! written; nothing is resolved to absolute coordinates.

use crate::xml::tags::tag;
use crate::xml::Node;
use serde::Serialize;
use std::fmt::Write as _;

/// One decoded path command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum DrawingOperation {
    MoveTo {
        x: f64,
        y: f64,
        relative: bool,
    },
    LineTo {
        x: f64,
        y: f64,
        relative: bool,
    },
    HorizontalLineTo {
        x: f64,
        relative: bool,
    },
    VerticalLineTo {
        y: f64,
        relative: bool,
    },
    CubicBezier {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
        relative: bool,
    },
    SmoothCubicBezier {
        x2: f64,
        y2: f64,
        x: f64,
        y: f64,
        relative: bool,
    },
    QuadraticBezier {
        x1: f64,
        y1: f64,
        x: f64,
        y: f64,
        relative: bool,
    },
    SmoothQuadratic {
        x: f64,
        y: f64,
        relative: bool,
    },
    Arc {
        rx: f64,
        ry: f64,
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
        relative: bool,
    },
    Close,
}

impl DrawingOperation {
    /// True if the operands are relative to the current point.
    pub fn is_relative(&self) -> bool {
        match *self {
            DrawingOperation::MoveTo { relative, .. }
            | DrawingOperation::LineTo { relative, .. }
            | DrawingOperation::HorizontalLineTo { relative, .. }
            | DrawingOperation::VerticalLineTo { relative, .. }
            | DrawingOperation::CubicBezier { relative, .. }
            | DrawingOperation::SmoothCubicBezier { relative, .. }
            | DrawingOperation::QuadraticBezier { relative, .. }
            | DrawingOperation::SmoothQuadratic { relative, .. }
            | DrawingOperation::Arc { relative, .. } => relative,
            DrawingOperation::Close => false,
        }
    }
}

/// Command vocabulary of a path string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum PathDialect {
    /// OFD abbreviated commands: `S`/`M` move, `L` line, `Q` quadratic,
    /// `B` cubic, `A` arc, `C` close. Absolute only.
    #[default]
    Abbreviated,
    /// SVG path data: `M L H V C S Q T A Z`, lowercase relative.
    Svg,
}

const ABBREVIATED_COMMANDS: &[char] = &['S', 'M', 'L', 'Q', 'B', 'A', 'C'];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Command(char),
    Number(f64),
    Invalid,
}

/// Decodes a path string, detecting its dialect.
pub fn decode(command: &str) -> Vec<DrawingOperation> {
    let tokens = tokenize(command);
    let dialect = dialect_of(&tokens);
    decode_tokens(&tokens, dialect)
}

/// Decodes a path string in a known dialect.
pub fn decode_with(command: &str, dialect: PathDialect) -> Vec<DrawingOperation> {
    decode_tokens(&tokenize(command), dialect)
}

/// Decodes the first `ofd:AbbreviatedData` child of a path or clip node.
pub fn decode_path_object(node: &Node) -> Vec<DrawingOperation> {
    node.child_text(tag::ABBREVIATED_DATA)
        .map(decode)
        .unwrap_or_default()
}

/// Guesses the dialect of a path string.
///
/// Lowercase letters and letters outside the OFD set mean SVG. `B` only
/// exists in the OFD set. A `C` directly followed by a number can only be an
/// SVG curve, since the OFD close takes no operands.
pub fn detect_dialect(command: &str) -> PathDialect {
    dialect_of(&tokenize(command))
}

fn dialect_of(tokens: &[Token]) -> PathDialect {
    let mut has_cubic = false;
    let mut operand_after_c = false;

    for (i, token) in tokens.iter().enumerate() {
        if let Token::Command(c) = *token {
            if !ABBREVIATED_COMMANDS.contains(&c) {
                return PathDialect::Svg;
            }
            if c == 'B' {
                has_cubic = true;
            }
            if c == 'C' && matches!(tokens.get(i + 1), Some(Token::Number(_))) {
                operand_after_c = true;
            }
        }
    }

    if operand_after_c && !has_cubic {
        PathDialect::Svg
    } else {
        PathDialect::Abbreviated
    }
}

fn decode_tokens(tokens: &[Token], dialect: PathDialect) -> Vec<DrawingOperation> {
    let mut ops = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let command = match tokens[i] {
            Token::Command(c) => c,
            // Stray operands and garbage
            _ => {
                i += 1;
                continue;
            }
        };
        i += 1;

        let start = i;
        while matches!(tokens.get(i), Some(Token::Number(_))) {
            i += 1;
        }
        let operands: Vec<f64> = tokens[start..i]
            .iter()
            .filter_map(|t| match t {
                Token::Number(n) => Some(*n),
                _ => None,
            })
            .collect();

        match dialect {
            PathDialect::Abbreviated => abbreviated_op(command, &operands, &mut ops),
            PathDialect::Svg => svg_ops(command, &operands, &mut ops),
        }
    }

    ops
}

fn abbreviated_op(command: char, args: &[f64], ops: &mut Vec<DrawingOperation>) {
    let op = match command {
        'S' | 'M' => match args {
            [x, y, ..] => DrawingOperation::MoveTo {
                x: *x,
                y: *y,
                relative: false,
            },
            _ => return,
        },
        'L' => match args {
            [x, y, ..] => DrawingOperation::LineTo {
                x: *x,
                y: *y,
                relative: false,
            },
            _ => return,
        },
        'Q' => match args {
            [x1, y1, x, y, ..] => DrawingOperation::QuadraticBezier {
                x1: *x1,
                y1: *y1,
                x: *x,
                y: *y,
                relative: false,
            },
            _ => return,
        },
        'B' => match args {
            [x1, y1, x2, y2, x, y, ..] => DrawingOperation::CubicBezier {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
                x: *x,
                y: *y,
                relative: false,
            },
            // Truncated cubic closes the subpath
            _ => DrawingOperation::Close,
        },
        'A' => match args {
            [rx, ry, rotation, large, sweep, x, y, ..] => DrawingOperation::Arc {
                rx: *rx,
                ry: *ry,
                rotation: *rotation,
                large_arc: *large != 0.0,
                sweep: *sweep != 0.0,
                x: *x,
                y: *y,
                relative: false,
            },
            _ => return,
        },
        'C' => DrawingOperation::Close,
        _ => return,
    };
    ops.push(op);
}

fn svg_ops(command: char, args: &[f64], ops: &mut Vec<DrawingOperation>) {
    let relative = command.is_ascii_lowercase();
    let upper = command.to_ascii_uppercase();

    let arity = match upper {
        'M' | 'L' | 'T' => 2,
        'H' | 'V' => 1,
        'C' => 6,
        'S' | 'Q' => 4,
        'A' => 7,
        'Z' => {
            ops.push(DrawingOperation::Close);
            return;
        }
        _ => return,
    };

    for (n, a) in args.chunks_exact(arity).enumerate() {
        let op = match upper {
            // Extra pairs after a move are lines
            'M' if n == 0 => DrawingOperation::MoveTo {
                x: a[0],
                y: a[1],
                relative,
            },
            'M' | 'L' => DrawingOperation::LineTo {
                x: a[0],
                y: a[1],
                relative,
            },
            'T' => DrawingOperation::SmoothQuadratic {
                x: a[0],
                y: a[1],
                relative,
            },
            'H' => DrawingOperation::HorizontalLineTo { x: a[0], relative },
            'V' => DrawingOperation::VerticalLineTo { y: a[0], relative },
            'C' => DrawingOperation::CubicBezier {
                x1: a[0],
                y1: a[1],
                x2: a[2],
                y2: a[3],
                x: a[4],
                y: a[5],
                relative,
            },
            'S' => DrawingOperation::SmoothCubicBezier {
                x2: a[0],
                y2: a[1],
                x: a[2],
                y: a[3],
                relative,
            },
            'Q' => DrawingOperation::QuadraticBezier {
                x1: a[0],
                y1: a[1],
                x: a[2],
                y: a[3],
                relative,
            },
            _ => DrawingOperation::Arc {
                rx: a[0],
                ry: a[1],
                rotation: a[2],
                large_arc: a[3] != 0.0,
                sweep: a[4] != 0.0,
                x: a[5],
                y: a[6],
                relative,
            },
        };
        ops.push(op);
    }
}

/// Encodes operations as a path string in `dialect`.
///
/// Returns `None` when the OFD dialect cannot express an operation
/// (relative operands, horizontal/vertical lines, smooth curves).
pub fn encode(ops: &[DrawingOperation], dialect: PathDialect) -> Option<String> {
    let mut out = String::new();

    for op in ops {
        if !out.is_empty() {
            out.push(' ');
        }
        match dialect {
            PathDialect::Abbreviated => encode_abbreviated(op, &mut out)?,
            PathDialect::Svg => encode_svg(op, &mut out),
        }
    }

    Some(out)
}

fn encode_abbreviated(op: &DrawingOperation, out: &mut String) -> Option<()> {
    if op.is_relative() {
        return None;
    }
    match *op {
        DrawingOperation::MoveTo { x, y, .. } => push_command(out, 'M', &[x, y]),
        DrawingOperation::LineTo { x, y, .. } => push_command(out, 'L', &[x, y]),
        DrawingOperation::QuadraticBezier { x1, y1, x, y, .. } => {
            push_command(out, 'Q', &[x1, y1, x, y])
        }
        DrawingOperation::CubicBezier {
            x1, y1, x2, y2, x, y, ..
        } => push_command(out, 'B', &[x1, y1, x2, y2, x, y]),
        DrawingOperation::Arc {
            rx,
            ry,
            rotation,
            large_arc,
            sweep,
            x,
            y,
            ..
        } => push_command(
            out,
            'A',
            &[rx, ry, rotation, flag(large_arc), flag(sweep), x, y],
        ),
        DrawingOperation::Close => out.push('C'),
        DrawingOperation::HorizontalLineTo { .. }
        | DrawingOperation::VerticalLineTo { .. }
        | DrawingOperation::SmoothCubicBezier { .. }
        | DrawingOperation::SmoothQuadratic { .. } => return None,
    }
    Some(())
}

fn encode_svg(op: &DrawingOperation, out: &mut String) {
    let letter = |c: char| {
        if op.is_relative() {
            c.to_ascii_lowercase()
        } else {
            c
        }
    };
    match *op {
        DrawingOperation::MoveTo { x, y, .. } => push_command(out, letter('M'), &[x, y]),
        DrawingOperation::LineTo { x, y, .. } => push_command(out, letter('L'), &[x, y]),
        DrawingOperation::HorizontalLineTo { x, .. } => push_command(out, letter('H'), &[x]),
        DrawingOperation::VerticalLineTo { y, .. } => push_command(out, letter('V'), &[y]),
        DrawingOperation::CubicBezier {
            x1, y1, x2, y2, x, y, ..
        } => push_command(out, letter('C'), &[x1, y1, x2, y2, x, y]),
        DrawingOperation::SmoothCubicBezier { x2, y2, x, y, .. } => {
            push_command(out, letter('S'), &[x2, y2, x, y])
        }
        DrawingOperation::QuadraticBezier { x1, y1, x, y, .. } => {
            push_command(out, letter('Q'), &[x1, y1, x, y])
        }
        DrawingOperation::SmoothQuadratic { x, y, .. } => {
            push_command(out, letter('T'), &[x, y])
        }
        DrawingOperation::Arc {
            rx,
            ry,
            rotation,
            large_arc,
            sweep,
            x,
            y,
            ..
        } => push_command(
            out,
            letter('A'),
            &[rx, ry, rotation, flag(large_arc), flag(sweep), x, y],
        ),
        DrawingOperation::Close => out.push('Z'),
    }
}

fn push_command(out: &mut String, command: char, args: &[f64]) {
    out.push(command);
    for arg in args {
        let _ = write!(out, " {}", arg);
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Splits a path string into command letters and numbers.
///
/// Separators are whitespace and commas. Letters may touch numbers
/// (`M10 20`, `L-5-5`).
fn tokenize(input: &str) -> Vec<Token> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() || b == b',' {
            i += 1;
        } else if b.is_ascii_alphabetic() {
            tokens.push(Token::Command(b as char));
            i += 1;
        } else if let Some(end) = scan_number(bytes, i) {
            match input[i..end].parse::<f64>() {
                Ok(n) if n.is_finite() => tokens.push(Token::Number(n)),
                _ => tokens.push(Token::Invalid),
            }
            i = end;
        } else {
            tokens.push(Token::Invalid);
            // Skip the whole UTF-8 sequence
            i += input[i..].chars().next().map_or(1, char::len_utf8);
        }
    }

    tokens
}

/// Returns the end offset of a number starting at `start`.
fn scan_number(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start;
    if matches!(bytes.get(i), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    let mut digits = i - int_start;

    if bytes.get(i) == Some(&b'.') {
        i += 1;
        let frac_start = i;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        digits += i - frac_start;
    }

    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_start = j;
        while bytes.get(j).is_some_and(u8::is_ascii_digit) {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    Some(i)
}
