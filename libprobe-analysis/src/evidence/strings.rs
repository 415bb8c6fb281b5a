//! Printable string extraction, in the manner of `strings(1)`.

/// Runs of printable ASCII (plus tab) at least `min_len` bytes long, in file order.
pub fn extract_printable_strings(bytes: &[u8], min_len: usize) -> Vec<String> {
    let min_len = min_len.max(1);
    let mut out = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &b) in bytes.iter().enumerate() {
        if is_printable(b) {
            start.get_or_insert(i);
        } else if let Some(s) = start.take() {
            push_run(&mut out, &bytes[s..i], min_len);
        }
    }
    if let Some(s) = start {
        push_run(&mut out, &bytes[s..], min_len);
    }
    out
}

#[inline]
fn is_printable(b: u8) -> bool {
    b == b'\t' || (0x20..0x7f).contains(&b)
}

fn push_run(out: &mut Vec<String>, run: &[u8], min_len: usize) {
    if run.len() >= min_len {
        // Printable ASCII is always valid UTF-8.
        out.push(String::from_utf8_lossy(run).into_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_non_printable_bytes() {
        let bytes = b"\x00\x01package:foo@1.0.0\x00ab\x00kfun:Main\xff";
        let strings = extract_printable_strings(bytes, 4);
        assert_eq!(strings, vec!["package:foo@1.0.0", "kfun:Main"]);
    }

    #[test]
    fn test_trailing_run_is_kept() {
        let strings = extract_printable_strings(b"\x00tail", 4);
        assert_eq!(strings, vec!["tail"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_printable_strings(&[], 4).is_empty());
    }
}
