use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TocNode {
    /// Absent (or `null`) in the source stays absent; `""` is written back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type", alias = "kind", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(
        rename = "docid",
        alias = "topicId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub topic_id: Option<String>,

    /// Source fields this crate does not interpret (`id`, `pdfid`, `date`,
    /// `chamber`, `expanded`, `xref`, ...), carried through unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,

    #[serde(
        rename = "item",
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<TocNode>,

    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    pub content: Option<FragmentResult>,
}

impl TocNode {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: Some(kind.into()),
            topic_id: None,
            extra: serde_json::Map::new(),
            children: Vec::new(),
            content: None,
        }
    }

    pub fn topic(name: impl Into<String>, topic_id: impl Into<String>) -> Self {
        Self {
            topic_id: Some(topic_id.into()),
            ..Self::new(name, "Topic")
        }
    }

    pub fn with_children(mut self, children: Vec<TocNode>) -> Self {
        self.children = children;
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().map(str::trim).unwrap_or_default()
    }

    /// The topic identifier, if present and non-blank.
    pub fn fetchable_topic_id(&self) -> Option<&str> {
        self.topic_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<TocNode>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<TocNode>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentResult {
    #[serde(rename = "rawHTML")]
    pub raw_markup: String,
    pub parsed: ParsedFragment,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFragment {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub blocks: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Speech {
        speaker: String,
        time: Option<String>,
        text: String,
    },
    Paragraph {
        style: ParagraphStyle,
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParagraphStyle {
    #[serde(rename = "Normal")]
    Plain,
    #[serde(rename = "NormalBold")]
    Bold,
    #[serde(rename = "NormalItalics")]
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningKind {
    TransientExhausted,
    Permanent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub topic_id: String,
    pub name: String,
    pub kind: WarningKind,
    pub message: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchStats {
    pub topics: usize,
    pub fetched: usize,
    pub failed: usize,
    pub requests: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub day_id: String,
    pub roots: Vec<TocNode>,
    pub warnings: Vec<Warning>,
    pub stats: FetchStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toc_node_keeps_unknown_fields() -> anyhow::Result<()> {
        let raw = r#"{
            "pdfid": "HANSARD-1",
            "type": "Root",
            "date": "12/03/2024",
            "chamber": "Legislative Assembly",
            "draft": false,
            "item": [
                {"name": "Bills", "type": "Proceeding", "item": null, "expanded": true},
                {"name": "Question Time", "type": "Topic", "docid": "HANSARD-1-2", "id": null}
            ]
        }"#;

        let node: TocNode = serde_json::from_str(raw)?;
        assert_eq!(node.kind.as_deref(), Some("Root"));
        assert_eq!(node.name, None);
        assert_eq!(node.extra["pdfid"], "HANSARD-1");
        assert_eq!(node.extra["draft"], false);
        assert_eq!(node.children.len(), 2);
        assert!(node.children[0].children.is_empty());
        assert_eq!(node.children[1].topic_id.as_deref(), Some("HANSARD-1-2"));
        assert!(node.children[1].extra.contains_key("id"));

        let value = serde_json::to_value(&node)?;
        assert_eq!(value["chamber"], "Legislative Assembly");
        assert_eq!(value["item"][1]["docid"], "HANSARD-1-2");
        assert!(value.get("name").is_none());
        assert!(value.get("data").is_none());
        Ok(())
    }

    #[test]
    fn topic_id_alias_is_accepted() -> anyhow::Result<()> {
        let node: TocNode =
            serde_json::from_str(r#"{"name": "A", "kind": "Topic", "topicId": "T-1"}"#)?;
        assert_eq!(node.kind.as_deref(), Some("Topic"));
        assert_eq!(node.fetchable_topic_id(), Some("T-1"));
        Ok(())
    }

    #[test]
    fn null_and_empty_names_round_trip() -> anyhow::Result<()> {
        let raw = r#"[
            {"name": null, "type": "Topic", "docid": "X"},
            {"name": "", "type": "", "docid": "Y"}
        ]"#;
        let nodes: Vec<TocNode> = serde_json::from_str(raw)?;
        assert_eq!(nodes[0].name, None);
        assert_eq!(nodes[0].display_name(), "");
        assert_eq!(nodes[1].name.as_deref(), Some(""));

        let value = serde_json::to_value(&nodes)?;
        assert!(value[0].get("name").is_none());
        assert_eq!(value[0]["type"], "Topic");
        assert_eq!(value[1]["name"], "");
        assert_eq!(value[1]["type"], "");
        Ok(())
    }

    #[test]
    fn blank_topic_id_is_not_fetchable() {
        let mut node = TocNode::topic("A", "   ");
        assert_eq!(node.fetchable_topic_id(), None);
        node.topic_id = None;
        assert_eq!(node.fetchable_topic_id(), None);
    }

    #[test]
    fn content_serializes_as_data_object() -> anyhow::Result<()> {
        let mut node = TocNode::topic("Question Time", "D1");
        node.content = Some(FragmentResult {
            raw_markup: "<p>x</p>".to_owned(),
            parsed: ParsedFragment {
                title: Some("Question Time".to_owned()),
                subtitle: None,
                blocks: vec![
                    ContentBlock::Speech {
                        speaker: "MR SMITH".to_owned(),
                        time: Some("10:02".to_owned()),
                        text: "I move...".to_owned(),
                    },
                    ContentBlock::Paragraph {
                        style: ParagraphStyle::Italic,
                        text: "The House divided.".to_owned(),
                    },
                ],
            },
        });

        let value = serde_json::to_value(&node)?;
        assert_eq!(value["data"]["rawHTML"], "<p>x</p>");
        assert_eq!(value["data"]["parsed"]["subtitle"], serde_json::Value::Null);
        assert_eq!(value["data"]["parsed"]["blocks"][0]["type"], "speech");
        assert_eq!(value["data"]["parsed"]["blocks"][0]["speaker"], "MR SMITH");
        assert_eq!(value["data"]["parsed"]["blocks"][1]["type"], "paragraph");
        assert_eq!(value["data"]["parsed"]["blocks"][1]["style"], "NormalItalics");
        Ok(())
    }

    #[test]
    fn warning_kind_uses_kebab_case() -> anyhow::Result<()> {
        assert_eq!(
            serde_json::to_string(&WarningKind::TransientExhausted)?,
            "\"transient-exhausted\""
        );
        assert_eq!(serde_json::to_string(&WarningKind::Permanent)?, "\"permanent\"");
        Ok(())
    }
}
