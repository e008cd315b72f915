use std::collections::HashSet;

const DATE_DISPLAY_MARKER: &str = "#/DateDisplay/";
const DAY_ID_PREFIX: &str = "HANSARD-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HansardIds {
    pub day_id: String,
    pub topic_id: Option<String>,
}

/// Accepts `…#/DateDisplay/<pdfid>[/<docid>]` links, any URL with a
/// `HANSARD-…` path segment, or a bare `HANSARD-…` identifier.
pub fn parse_ids_from_url(input: &str) -> anyhow::Result<HansardIds> {
    let input = input.trim();

    if let Some((_, tail)) = input.split_once(DATE_DISPLAY_MARKER) {
        let mut parts = tail
            .split(['/', '?'])
            .map(str::trim)
            .filter(|p| !p.is_empty());
        if let Some(day_id) = parts.next() {
            return Ok(HansardIds {
                day_id: day_id.to_owned(),
                topic_id: parts.next().map(str::to_owned),
            });
        }
    }

    let segment = input
        .split(['/', '#', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .rev()
        .find(|s| s.starts_with(DAY_ID_PREFIX));
    if let Some(day_id) = segment {
        return Ok(HansardIds {
            day_id: day_id.to_owned(),
            topic_id: None,
        });
    }

    anyhow::bail!("unable to extract a day identifier (pdfid) from: {input}")
}

/// Day identifiers of `inputs`, first-seen order, duplicates removed.
pub fn unique_day_ids(inputs: &[String]) -> anyhow::Result<Vec<HansardIds>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for input in inputs {
        let ids = parse_ids_from_url(input)?;
        if seen.insert(ids.day_id.clone()) {
            out.push(ids);
        }
    }
    Ok(out)
}
