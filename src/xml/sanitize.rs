//! Element-name sanitizing for keys coming out of JSON objects.

/// Strip every character that is not an ASCII letter, digit, `-` or `_`.
///
/// There is no collision handling: `"a b"` and `"ab"` both become `ab`. The
/// result may be empty, in which case the serializer emits `<></>`.
pub fn sanitize(name: &str) -> String {
  name
    .chars()
    .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
    .collect()
}
