//! Reference executor for instruction sequences.
//!
//! Applies instructions to a byte buffer in a single forward pass over
//! the sequence. This is the oracle the optimizer is tested against:
//! an optimized sequence must produce the same final bytes as the
//! sequence it replaced. Out-of-range positions are clipped to the
//! buffer rather than rejected, so degenerate fuzz inputs still
//! execute.

use crate::block::{Block, InstructionKind};

/// Applies `instructions` to `text`, returning the edited bytes.
///
/// INSERT splices its payload in at `start`; REMOVE deletes its
/// inclusive range; REPLACE overwrites in place, extending the buffer
/// when it runs past the end.
pub fn apply<'a, I>(instructions: I, text: &[u8]) -> Vec<u8>
where
    I: IntoIterator<Item = &'a Block>,
{
    let mut buffer = text.to_vec();
    for block in instructions {
        apply_block(block, &mut buffer);
    }
    buffer
}

fn apply_block(block: &Block, buffer: &mut Vec<u8>) {
    if block.is_empty() {
        return;
    }
    match block.kind() {
        InstructionKind::Insert => {
            let at = (block.start() as usize).min(buffer.len());
            buffer.splice(at..at, block.contents().iter().copied());
        }
        InstructionKind::Remove => {
            if buffer.is_empty() || block.start() as usize >= buffer.len() {
                return;
            }
            let from = block.start() as usize;
            let to = (block.end() as usize).min(buffer.len() - 1);
            buffer.drain(from..=to);
        }
        InstructionKind::Replace => {
            for (i, &byte) in block.contents().iter().enumerate() {
                let at = block.start() as usize + i;
                if at < buffer.len() {
                    buffer[at] = byte;
                } else {
                    buffer.push(byte);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(start: u64, bytes: &str) -> Block {
        let mut b = Block::with_bytes(start, bytes.as_bytes().to_vec());
        b.set_kind(InstructionKind::Insert);
        b
    }

    fn remove(start: u64, end: u64) -> Block {
        let mut b = Block::with_range(start, end);
        b.set_kind(InstructionKind::Remove);
        b
    }

    fn replace(start: u64, bytes: &str) -> Block {
        let mut b = Block::with_bytes(start, bytes.as_bytes().to_vec());
        b.set_kind(InstructionKind::Replace);
        b
    }

    #[test]
    fn test_insert_splices() {
        assert_eq!(apply(&[insert(2, "XY")], b"abcd"), b"abXYcd");
        assert_eq!(apply(&[insert(0, "XY")], b"ab"), b"XYab");
        assert_eq!(apply(&[insert(99, "XY")], b"ab"), b"abXY");
    }

    #[test]
    fn test_remove_deletes_range() {
        assert_eq!(apply(&[remove(1, 2)], b"abcd"), b"ad");
        assert_eq!(apply(&[remove(2, 99)], b"abcd"), b"ab");
        assert_eq!(apply(&[remove(9, 10)], b"ab"), b"ab");
    }

    #[test]
    fn test_replace_overwrites_and_extends() {
        assert_eq!(apply(&[replace(1, "XY")], b"abcd"), b"aXYd");
        assert_eq!(apply(&[replace(2, "XYZ")], b"abc"), b"abXYZ");
    }

    #[test]
    fn test_sequence_composes() {
        let program = [
            insert(0, "hello world"),
            remove(0, 4),
            insert(0, "goodbye"),
            replace(8, "abcde"),
            replace(8, "buddy"),
        ];
        assert_eq!(apply(&program, b""), b"goodbye buddy");
    }
}
