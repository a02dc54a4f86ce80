/// Strip every `<...>` span from the text.
///
/// This is deliberate markup-stripping, not HTML-safety, with greedy
/// `/<.*>/g` semantics: a span runs from a `<` to the *last* `>` that
/// follows it, so tag bodies and the text between tags go with it
/// (`<script>alert(1)</script>hi` -> `hi`). A `<` with no later `>` is
/// kept verbatim, as the regex would leave it.
pub fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        rest = &rest[open..];
        match rest.rfind('>') {
            Some(close) => rest = &rest[close + 1..],
            None => break, // unmatched '<', keep the tail as-is
        }
    }
    out.push_str(rest);
    out
}
