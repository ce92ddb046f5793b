//! Token shapes exchanged with the persistence layer.
//!
//! Item ids in tokens are positions in the serialized sequence, not shallow ids.
//! Link endpoints refer to those positions too, which keeps a token sequence
//! independent of the session that produced it.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::portal::PortalToken;

/// A point on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Fields shared by every item token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ItemHeader {
    pub id: u32,
    pub left: f64,
    pub top: f64,
    #[serde(default)]
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BehaviourToken {
    #[serde(flatten)]
    pub header: ItemHeader,
    pub alias: String,
    #[serde(rename = "behaviourType")]
    pub behaviour_type: String,
    #[serde(default)]
    pub portals: Vec<PortalToken>,
}

impl BehaviourToken {
    pub fn has_portal(&self, name: &str) -> bool {
        self.portals.iter().any(|portal| portal.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CommentToken {
    #[serde(flatten)]
    pub header: ItemHeader,
    pub label: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LinkToken {
    #[serde(flatten)]
    pub header: ItemHeader,
    #[serde(rename = "startBehaviour")]
    pub start_behaviour: u32,
    #[serde(rename = "endBehaviour")]
    pub end_behaviour: u32,
    #[serde(rename = "startPortal")]
    pub start_portal: String,
    #[serde(rename = "endPortal")]
    pub end_portal: String,
    #[serde(default)]
    pub points: Vec<Point>,
}

/// Persisted form of a canvas item, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ItemToken {
    Behaviour(BehaviourToken),
    Asset(BehaviourToken),
    PortalBehaviour(BehaviourToken),
    Comment(CommentToken),
    Link(LinkToken),
}

impl ItemToken {
    pub fn header(&self) -> &ItemHeader {
        match self {
            ItemToken::Behaviour(token)
            | ItemToken::Asset(token)
            | ItemToken::PortalBehaviour(token) => &token.header,
            ItemToken::Comment(token) => &token.header,
            ItemToken::Link(token) => &token.header,
        }
    }

    pub fn id(&self) -> u32 {
        self.header().id
    }

    /// Behaviour payload for the three behaviour-like token types.
    pub fn behaviour(&self) -> Option<&BehaviourToken> {
        match self {
            ItemToken::Behaviour(token)
            | ItemToken::Asset(token)
            | ItemToken::PortalBehaviour(token) => Some(token),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_item_token_shapes() {
        let json = indoc! {r#"
            [
                { "id": 0, "type": "comment", "left": 5, "top": 6, "label": "Note", "width": 150, "height": 50 },
                { "id": 1, "type": "link", "left": 0, "top": 0, "selected": true,
                  "startBehaviour": 2, "endBehaviour": 3, "startPortal": "Out", "endPortal": "In",
                  "points": [{ "x": 1, "y": 2 }] },
                { "id": 2, "type": "portal-behaviour", "left": 0, "top": 0, "alias": "Exit",
                  "behaviourType": "Portal", "portals": [] }
            ]
        "#};

        let tokens: Vec<ItemToken> = serde_json::from_str(json).unwrap();
        assert_eq!(tokens.len(), 3);

        match &tokens[0] {
            ItemToken::Comment(comment) => {
                assert_eq!(comment.label, "Note");
                assert_eq!(comment.header.left, 5.0);
                assert!(!comment.header.selected);
            }
            other => panic!("expected a comment, got {:?}", other),
        }
        match &tokens[1] {
            ItemToken::Link(link) => {
                assert_eq!((link.start_behaviour, link.end_behaviour), (2, 3));
                assert_eq!(link.points, vec![Point::new(1.0, 2.0)]);
                assert!(link.header.selected);
            }
            other => panic!("expected a link, got {:?}", other),
        }
        assert!(tokens[2].behaviour().is_some());

        let back = serde_json::to_value(&tokens[2]).unwrap();
        assert_eq!(back["type"], "portal-behaviour");
        assert_eq!(back["behaviourType"], "Portal");
    }
}
