use std::borrow::Cow;
use std::char;

use ahash::HashMap;

use crate::error::Error;

/// Replacement texts for entity references, beyond the five predefined
/// ones. Fed from internal DTD subset declarations and from
/// [`Reader::define_entity_replacement`](crate::Reader::define_entity_replacement).
pub(crate) type EntityReplacements = HashMap<String, String>;

/// One run inside raw character data: either plain text or an entity
/// reference. Token mode surfaces each run as its own event.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum TextRun<'a> {
    Text(&'a str),
    EntityRef(&'a str),
}

/// Split raw character data on entity references. The text runs between
/// references are returned verbatim.
pub(crate) fn split_runs(content: &str) -> Result<Vec<TextRun<'_>>, Error> {
    let mut runs = Vec::new();
    let mut rest = content;
    while let Some(amp) = rest.find('&') {
        if amp > 0 {
            runs.push(TextRun::Text(&rest[..amp]));
        }
        let after = &rest[amp + 1..];
        let semi = after
            .find(';')
            .ok_or_else(|| Error::UnclosedEntity(after.to_string()))?;
        let name = &after[..semi];
        if name.is_empty() {
            return Err(Error::InvalidEntity(name.to_string()));
        }
        runs.push(TextRun::EntityRef(name));
        rest = &after[semi + 1..];
    }
    if !rest.is_empty() || runs.is_empty() {
        runs.push(TextRun::Text(rest));
    }
    Ok(runs)
}

/// The replacement text for an entity reference name, or `None` when the
/// name is neither predefined, a character reference, nor registered.
pub(crate) fn replacement<'a>(
    name: &str,
    replacements: &'a EntityReplacements,
) -> Result<Option<Cow<'a, str>>, Error> {
    let text = match name {
        "amp" => "&",
        "apos" => "'",
        "gt" => ">",
        "lt" => "<",
        "quot" => "\"",
        _ => {
            if let Some(digits) = name.strip_prefix('#') {
                let code = match digits.strip_prefix('x') {
                    Some(hex) => u32::from_str_radix(hex, 16),
                    None => digits.parse(),
                }
                .map_err(|_| Error::InvalidEntity(name.to_string()))?;
                let c =
                    char::from_u32(code).ok_or_else(|| Error::InvalidEntity(name.to_string()))?;
                return Ok(Some(c.to_string().into()));
            }
            return Ok(replacements.get(name).map(|s| Cow::Borrowed(s.as_str())));
        }
    };
    Ok(Some(text.into()))
}

/// Resolve every entity and character reference in `content`. Returns the
/// input unchanged when it contains no references.
pub(crate) fn resolve_references<'a>(
    content: Cow<'a, str>,
    replacements: &EntityReplacements,
) -> Result<Cow<'a, str>, Error> {
    if !content.contains('&') {
        return Ok(content);
    }
    let mut result = String::with_capacity(content.len());
    for run in split_runs(&content)? {
        match run {
            TextRun::Text(text) => result.push_str(text),
            TextRun::EntityRef(name) => match replacement(name, replacements)? {
                Some(text) => result.push_str(&text),
                None => return Err(Error::UnresolvedEntity(name.to_string())),
            },
        }
    }
    Ok(result.into())
}

/// Escape character data for element content.
pub(crate) fn serialize_text(content: Cow<str>) -> Cow<str> {
    if !content.contains(['&', '<', '>']) {
        return content;
    }
    let mut result = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result.into()
}

/// Escape character data for a double-quoted attribute value.
pub(crate) fn serialize_attribute(content: Cow<str>) -> Cow<str> {
    if !content.contains(['&', '<', '"']) {
        return content;
    }
    let mut result = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result.into()
}
