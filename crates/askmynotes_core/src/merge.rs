//! crates/askmynotes_core/src/merge.rs
//!
//! Rules for folding a new upload into an existing subject. The stored text
//! grows with every upload while the topic and concept lists are merged by
//! name and capped so they stay readable.

use crate::domain::{AnalysisResult, ChatSession, ChatSessionUpdate, KeyConcept, Topic};

/// Most topics kept on a subject after a merge.
pub const MAX_TOPICS: usize = 15;
/// Most key concepts kept on a subject after a merge.
pub const MAX_CONCEPTS: usize = 15;
/// Most citations kept on a single topic after a merge.
pub const MAX_TOPIC_CITATIONS: usize = 5;

pub fn combine_text(existing: &str, file_name: &str, new_text: &str) -> String {
    format!("{existing}\n\n--- Source: {file_name} ---\n{new_text}")
}

pub fn combine_file_names(existing: &str, new_name: &str) -> String {
    format!("{existing}, {new_name}")
}

/// Merges topics by lower-cased name, keeping first-seen order.
pub fn merge_topics(existing: &[Topic], incoming: Vec<Topic>) -> Vec<Topic> {
    let mut merged: Vec<Topic> = Vec::with_capacity(existing.len() + incoming.len());
    merged.extend(existing.iter().cloned());

    for topic in incoming {
        let key = topic.topic_name.to_lowercase();
        match merged
            .iter_mut()
            .find(|t| t.topic_name.to_lowercase() == key)
        {
            Some(current) => {
                for sub in topic.subtopics {
                    if !current.subtopics.contains(&sub) {
                        current.subtopics.push(sub);
                    }
                }
                current.citations.extend(topic.citations);
                current.citations = keep_last(std::mem::take(&mut current.citations), MAX_TOPIC_CITATIONS);
                if topic.summary.len() > current.summary.len() {
                    current.summary = topic.summary;
                }
            }
            None => merged.push(topic),
        }
    }

    keep_last(merged, MAX_TOPICS)
}

/// Merges concepts by lower-cased name. A newer definition replaces the older
/// one without moving it.
pub fn merge_concepts(existing: &[KeyConcept], incoming: Vec<KeyConcept>) -> Vec<KeyConcept> {
    let mut merged: Vec<KeyConcept> = existing.to_vec();

    for concept in incoming {
        let key = concept.concept.to_lowercase();
        match merged.iter_mut().find(|c| c.concept.to_lowercase() == key) {
            Some(current) => *current = concept,
            None => merged.push(concept),
        }
    }

    keep_last(merged, MAX_CONCEPTS)
}

/// Builds the update written back to `existing` after a new file is analysed.
pub fn build_update(
    existing: &ChatSession,
    analysis: AnalysisResult,
    file_name: &str,
    new_text: &str,
    description: Option<&str>,
) -> ChatSessionUpdate {
    let description = match description {
        Some(d) if !d.is_empty() => d.to_string(),
        _ => existing.description.clone(),
    };

    ChatSessionUpdate {
        topics: merge_topics(&existing.topics, analysis.topics),
        key_concepts: merge_concepts(&existing.key_concepts, analysis.key_concepts),
        extracted_text: combine_text(&existing.extracted_text, file_name, new_text),
        file_name: combine_file_names(&existing.file_name, file_name),
        description,
    }
}

fn keep_last<T>(mut items: Vec<T>, max: usize) -> Vec<T> {
    if items.len() > max {
        items.drain(..items.len() - max);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewChatSession;

    fn topic(name: &str, subtopics: &[&str], summary: &str, citations: &[&str]) -> Topic {
        Topic {
            topic_name: name.to_string(),
            subtopics: subtopics.iter().map(|s| s.to_string()).collect(),
            summary: summary.to_string(),
            citations: citations.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn concept(name: &str, definition: &str) -> KeyConcept {
        KeyConcept {
            concept: name.to_string(),
            definition: definition.to_string(),
            citation: String::new(),
        }
    }

    #[test]
    fn text_and_file_names_are_appended() {
        assert_eq!(
            combine_text("old notes", "week2.pdf", "new notes"),
            "old notes\n\n--- Source: week2.pdf ---\nnew notes"
        );
        assert_eq!(combine_file_names("week1.pdf", "week2.pdf"), "week1.pdf, week2.pdf");
    }

    #[test]
    fn colliding_topics_are_merged_case_insensitively() {
        let existing = vec![topic("Mitosis", &["Prophase"], "short", &["c1"])];
        let incoming = vec![topic(
            "MITOSIS",
            &["Prophase", "Anaphase"],
            "a much longer summary",
            &["c2"],
        )];

        let merged = merge_topics(&existing, incoming);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].topic_name, "Mitosis");
        assert_eq!(merged[0].subtopics, vec!["Prophase", "Anaphase"]);
        assert_eq!(merged[0].summary, "a much longer summary");
        assert_eq!(merged[0].citations, vec!["c1", "c2"]);
    }

    #[test]
    fn shorter_summary_does_not_replace_existing() {
        let existing = vec![topic("Cells", &[], "a detailed summary", &[])];
        let merged = merge_topics(&existing, vec![topic("cells", &[], "brief", &[])]);
        assert_eq!(merged[0].summary, "a detailed summary");
    }

    #[test]
    fn topic_citations_keep_last_five() {
        let existing = vec![topic("T", &[], "", &["1", "2", "3", "4"])];
        let merged = merge_topics(&existing, vec![topic("t", &[], "", &["5", "6", "7"])]);
        assert_eq!(merged[0].citations, vec!["3", "4", "5", "6", "7"]);
    }

    #[test]
    fn topics_are_capped_keeping_the_newest() {
        let existing: Vec<Topic> = (0..10).map(|i| topic(&format!("old{i}"), &[], "", &[])).collect();
        let incoming: Vec<Topic> = (0..10).map(|i| topic(&format!("new{i}"), &[], "", &[])).collect();

        let merged = merge_topics(&existing, incoming);

        assert_eq!(merged.len(), MAX_TOPICS);
        assert_eq!(merged[0].topic_name, "old5");
        assert_eq!(merged[MAX_TOPICS - 1].topic_name, "new9");
    }

    #[test]
    fn newer_concept_replaces_in_place() {
        let existing = vec![concept("ATP", "old"), concept("DNA", "helix")];
        let merged = merge_concepts(&existing, vec![concept("atp", "energy"), concept("RNA", "single")]);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].concept, "atp");
        assert_eq!(merged[0].definition, "energy");
        assert_eq!(merged[1].concept, "DNA");
        assert_eq!(merged[2].concept, "RNA");
    }

    #[test]
    fn update_falls_back_to_existing_description() {
        let existing = ChatSession::from_new(NewChatSession {
            subject: "Physics".to_string(),
            description: "mechanics".to_string(),
            extracted_text: "F = ma".to_string(),
            file_name: "a.txt".to_string(),
            topics: vec![],
            key_concepts: vec![],
        });
        let analysis = AnalysisResult::empty("Physics", "b.txt");

        let kept = build_update(&existing, analysis.clone(), "b.txt", "E = mc2", Some(""));
        assert_eq!(kept.description, "mechanics");
        assert_eq!(kept.file_name, "a.txt, b.txt");
        assert!(kept.extracted_text.ends_with("--- Source: b.txt ---\nE = mc2"));

        let replaced = build_update(&existing, analysis, "b.txt", "E = mc2", Some("relativity"));
        assert_eq!(replaced.description, "relativity");
    }
}
