use regex::Regex;
use scraper::ElementRef;

pub fn extract_text(node: ElementRef) -> String {
    node.text().collect::<String>()
}

/// Pulls the entity id off a faculty/group tag. The site puts it either in a
/// `data-id` attribute or buried in the `onclick` javascript, so try the
/// attribute first and fall back to the first run of digits in the handler.
pub fn extract_entity_id(node: ElementRef, digits: &Regex) -> Option<String> {
    if let Some(id) = node.value().attr("data-id") {
        let id = id.trim();
        if !id.is_empty() {
            return Some(id.to_string());
        }
    }
    node.value()
        .attr("onclick")
        .and_then(|handler| digits.find(handler))
        .map(|m| m.as_str().to_string())
}

/// First name=value pair of a `Set-Cookie` header, attributes dropped.
pub fn parse_cookie_pair(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}
