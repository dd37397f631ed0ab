use async_trait::async_trait;

use super::{
    GeneratedBoard, GeneratedCard, GeneratedColumn, GeneratedProject, GenerationError,
    GenerationRequest, ProjectGenerator,
};
use crate::models::Priority;

const COLUMNS: [&str; 4] = ["To Do", "In Progress", "Review", "Done"];
const MAX_DESCRIPTION_TASKS: usize = 5;

/// Deterministic generator used when no AI provider is configured and in tests.
pub struct MockGenerator;

#[async_trait]
impl ProjectGenerator for MockGenerator {
    fn id(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedProject, GenerationError> {
        Ok(plan(request))
    }
}

fn plan(request: &GenerationRequest) -> GeneratedProject {
    let mut backlog = vec![
        card(&format!("Define scope for {}", request.name), Priority::High),
        card("Set up project workspace", Priority::Medium),
    ];
    backlog.extend(
        request
            .description
            .split(['.', '\n', ';'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(MAX_DESCRIPTION_TASKS)
            .map(|s| card(s, Priority::Medium)),
    );
    backlog.push(card("Review deliverables with stakeholders", Priority::Low));

    let columns = COLUMNS
        .iter()
        .enumerate()
        .map(|(i, name)| GeneratedColumn {
            name: name.to_string(),
            cards: if i == 0 { backlog.clone() } else { Vec::new() },
        })
        .collect();

    GeneratedProject {
        name: request.name.clone(),
        description: Some(request.description.clone()),
        boards: vec![GeneratedBoard {
            name: "Main Board".to_string(),
            description: Some(format!("Work plan for {}", request.name)),
            columns,
        }],
    }
}

fn card(title: &str, priority: Priority) -> GeneratedCard {
    GeneratedCard {
        title: title.to_string(),
        description: None,
        priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(description: &str) -> GenerationRequest {
        GenerationRequest {
            name: "Mobile App".to_string(),
            description: description.to_string(),
            organization_name: "Acme".to_string(),
            team_size: None,
            duration_weeks: None,
        }
    }

    #[tokio::test]
    async fn same_input_same_plan() {
        let a = MockGenerator.generate(&request("Build login. Ship beta.")).await.unwrap();
        let b = MockGenerator.generate(&request("Build login. Ship beta.")).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn description_sentences_become_backlog_cards() {
        let project = MockGenerator
            .generate(&request("Build login. Ship beta."))
            .await
            .unwrap();
        let board = &project.boards[0];
        let names: Vec<_> = board.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, COLUMNS);

        let titles: Vec<_> = board.columns[0].cards.iter().map(|c| c.title.as_str()).collect();
        assert!(titles.contains(&"Build login"));
        assert!(titles.contains(&"Ship beta"));
        assert!(board.columns[1..].iter().all(|c| c.cards.is_empty()));
    }
}
