use colored::Colorize;
use serde::Serialize;

use behaviour_graph::{ContainerSchema, GraphDocument, ItemKind, PropertyToken};

/// Counts and per-behaviour portal listings of one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub name: String,
    pub items: usize,
    pub behaviours: usize,
    pub comments: usize,
    pub links: usize,
    pub selected: usize,
    pub entries: Vec<BehaviourSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BehaviourSummary {
    pub index: usize,
    pub alias: String,
    pub behaviour_type: String,
    pub portals: Vec<(String, String, PropertyToken)>,
}

pub fn summarize(document: &GraphDocument, schema: &ContainerSchema) -> Summary {
    let entries = schema
        .items()
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let behaviour = item.behaviour()?;
            Some(BehaviourSummary {
                index,
                alias: behaviour.alias.clone(),
                behaviour_type: behaviour.behaviour_type.clone(),
                portals: behaviour
                    .portals()
                    .iter()
                    .map(|portal| {
                        (
                            portal.name.clone(),
                            portal.direction.to_string(),
                            portal.property.tokenize(true),
                        )
                    })
                    .collect(),
            })
        })
        .collect();

    Summary {
        name: document.metadata.name.clone(),
        items: schema.len(),
        behaviours: schema.behaviours().count(),
        comments: schema
            .items()
            .iter()
            .filter(|item| matches!(item.kind, ItemKind::Comment(_)))
            .count(),
        links: schema.links().count(),
        selected: schema.selection().len(),
        entries,
    }
}

pub fn print_summary(summary: &Summary) {
    println!("{}", summary.name.bold().cyan());
    crate::logging::log_status("Items", summary.items, true);
    crate::logging::log_status("Behaviours", summary.behaviours, true);
    crate::logging::log_status("Comments", summary.comments, true);
    crate::logging::log_status("Links", summary.links, true);
    crate::logging::log_status("Selected", summary.selected, true);

    for entry in &summary.entries {
        println!(
            "\n{} {} {}",
            format!("[{}]", entry.index).dimmed(),
            entry.alias.bold(),
            format!("({})", entry.behaviour_type).dimmed()
        );
        for (name, direction, token) in &entry.portals {
            println!("  {:<10} {:<16} {}", direction.yellow(), name, token.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use behaviour_graph::{
        BehaviourCreated, CommentCreated, EditorSession, NoResources, SelectionChanged,
    };

    #[test]
    fn test_summary_counts() {
        let mut session = EditorSession::new("Summary");
        let template = session.templates().require("Asset").unwrap().clone();
        session
            .execute(BehaviourCreated::new(&template, "Hero", 0.0, 0.0).unwrap())
            .unwrap();
        session.execute(CommentCreated::new(0.0, 0.0)).unwrap();
        let select = SelectionChanged::new(session.schema(), &[1]).unwrap();
        session.execute(select).unwrap();

        let document = session.save().unwrap();
        let schema = document.to_schema(&NoResources).unwrap();
        let summary = summarize(&document, &schema);

        assert_eq!(summary.items, 2);
        assert_eq!(summary.behaviours, 1);
        assert_eq!(summary.comments, 1);
        assert_eq!(summary.links, 0);
        assert_eq!(summary.selected, 1);
        assert_eq!(summary.entries[0].portals[0].0, "Asset");
        assert!(summary.entries[0].portals[0].2.is_slim());
    }
}
