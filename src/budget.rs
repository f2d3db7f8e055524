use serde::Serialize;
use std::io;

use crate::models::Post;

pub const MAX_CONTEXT_LENGTH: usize = 30_000;

/// What a post is measured by when deciding whether it still fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeBasis {
    /// The post's JSON form as Python's `json.dumps` writes it. Only the raw
    /// text is appended, so the effective text budget is looser than the
    /// nominal one.
    #[default]
    Serialized,
    /// Exactly what gets appended: the text plus its line separator.
    Appended,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// `", "` / `": "` separators and `\uXXXX` for everything outside
/// printable ASCII, surrogate pairs above the BMP.
struct DumpsFormatter;

impl serde_json::ser::Formatter for DumpsFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Length of `post` as `json.dumps(post)` would print it. The output is pure
/// ASCII, so bytes and characters agree.
pub fn dumps_len(post: &Post) -> usize {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, DumpsFormatter);
    match post.serialize(&mut ser) {
        Ok(()) => buf.len(),
        // Post has no map keys or non-finite floats
        Err(_) => usize::MAX,
    }
}

fn post_size(post: &Post, basis: SizeBasis) -> usize {
    match basis {
        SizeBasis::Serialized => dumps_len(post),
        SizeBasis::Appended => char_len(post.text_or_empty()) + 1,
    }
}

/// Join post texts, one per line, for as long as the running length plus the
/// next post's size stays within `max_len`. The first post that does not fit
/// ends the context; later posts are never considered.
pub fn assemble_context(posts: &[Post], max_len: usize, basis: SizeBasis) -> String {
    let mut out = String::new();
    let mut len = 0usize;
    for post in posts {
        if len.saturating_add(post_size(post, basis)) > max_len {
            break;
        }
        let text = post.text_or_empty();
        out.push_str(text);
        out.push('\n');
        len += char_len(text) + 1;
    }
    out
}
