//! Parser for the textual instruction protocol.
//!
//! One instruction per logical line, `<KIND> <position> <value>`, with
//! `;` chaining several same-kind instructions on one line. Fields are
//! space-separated; a backslash escapes the separator, and the value
//! field is everything after the second separator, interior spaces
//! included.

use crate::block::{Block, InstructionKind};
use crate::error::OptimizerError;
use crate::Result;
use crate::expression::Expression;

/// Splits `input` on `delimiter`, honoring backslash escapes.
///
/// A backslash makes the following delimiter literal. Once
/// `max_fields` is reached (0 = unlimited) further delimiters are kept
/// literal in the final field, which is how the payload field keeps
/// its interior spaces. Empty fields are dropped.
fn split_fields(input: &str, delimiter: char, max_fields: usize) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for c in input.chars() {
        if c == '\\' {
            if escaped {
                current.push('\\');
                current.push(c);
                escaped = false;
                continue;
            }
            escaped = true;
            continue;
        }

        if c == delimiter {
            if max_fields > 0 && result.len() >= max_fields - 1 {
                if escaped {
                    current.push('\\');
                    escaped = false;
                }
                current.push(c);
                continue;
            }

            if escaped {
                current.push(c);
                escaped = false;
            } else if !current.is_empty() {
                result.push(std::mem::take(&mut current));
            }
            continue;
        }

        if escaped {
            current.push('\\');
            escaped = false;
        }
        current.push(c);
    }

    if !current.is_empty() {
        result.push(current);
    }
    result
}

/// Parses a single `<KIND> <position> <value>` instruction into a
/// block.
///
/// The kind word is case-insensitive. For REMOVE the value is the
/// inclusive end position; an end below the start yields an empty
/// block, which expressions discard. For INSERT and REPLACE the value
/// is the payload, taken literally.
pub fn parse_instruction(line: &str) -> Result<Block> {
    let parts = split_fields(line, ' ', 3);
    if parts.len() != 3 {
        return Err(OptimizerError::parse(
            line,
            "expected <KIND> <position> <value>",
        ));
    }

    let position: u64 = parts[1].parse().map_err(|_| {
        OptimizerError::parse(line, format!("invalid position {:?}", parts[1]))
    })?;

    let mut block = Block::new();
    match parts[0].to_ascii_uppercase().as_str() {
        "INSERT" => {
            block.add(position, parts[2].as_bytes().to_vec());
            block.set_kind(InstructionKind::Insert);
        }
        "REMOVE" => {
            let end: u64 = parts[2].parse().map_err(|_| {
                OptimizerError::parse(line, format!("invalid end position {:?}", parts[2]))
            })?;
            block.set_kind(InstructionKind::Remove);
            if end >= position {
                block.add_range(position, end);
            }
        }
        "REPLACE" => {
            block.add(position, parts[2].as_bytes().to_vec());
            block.set_kind(InstructionKind::Replace);
        }
        _ => return Err(OptimizerError::UnknownOperation(parts[0].clone())),
    }
    Ok(block)
}

/// Parses one logical line, expanding `;` chains.
///
/// The kind word appears once; each `;`-separated segment supplies
/// another position/value pair for the same kind, e.g.
/// `REMOVE 0 3; 0 2`.
pub fn parse_line(line: &str) -> Result<Vec<Block>> {
    let parts = split_fields(line, ';', 0);
    let Some(head) = parts.first() else {
        return Ok(Vec::new());
    };

    let kind_word = split_fields(head, ' ', 0)
        .into_iter()
        .next()
        .unwrap_or_default();

    let mut blocks = vec![parse_instruction(head)?];
    for segment in &parts[1..] {
        let chained = format!("{kind_word}{segment}");
        blocks.push(parse_instruction(&chained)?);
    }
    Ok(blocks)
}

/// Parses a whole instruction sequence: newline-separated logical
/// lines, each possibly `;`-chained.
pub fn parse_sequence(text: &str) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();
    for line in split_fields(text, '\n', 0) {
        blocks.extend(parse_line(&line)?);
    }
    Ok(blocks)
}

/// Parses `text` and appends every instruction to `expression`.
pub fn parse_into(text: &str, expression: &mut Expression) -> Result<()> {
    for block in parse_sequence(text)? {
        expression.append(block);
    }
    Ok(())
}
