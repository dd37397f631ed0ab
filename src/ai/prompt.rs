use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::GenerationRequest;

static TEMPLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("template regex is valid"));

pub const SYSTEM_PROMPT: &str = "You are a project planning assistant. \
Reply with a single JSON object and nothing else.";

pub const PROJECT_TEMPLATE: &str = "Plan a project for the organization \"{{organization}}\".
Project name: {{name}}
Description: {{description}}
Team size: {{team_size}}
Duration (weeks): {{duration_weeks}}

Return JSON of the form
{\"name\": string, \"description\": string, \"boards\": [{\"name\": string, \"description\": string,
 \"columns\": [{\"name\": string, \"cards\": [{\"title\": string, \"description\": string,
 \"priority\": \"low\"|\"medium\"|\"high\"|\"urgent\"}]}]}]}";

/// Replace `{{variable}}` placeholders. Unknown variables render empty.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    TEMPLATE_RE
        .replace_all(template, |caps: &regex::Captures| {
            vars.get(&caps[1]).cloned().unwrap_or_default()
        })
        .to_string()
}

pub fn project_prompt(request: &GenerationRequest) -> String {
    let vars = HashMap::from([
        ("organization", request.organization_name.clone()),
        ("name", request.name.clone()),
        ("description", request.description.clone()),
        (
            "team_size",
            request
                .team_size
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unspecified".to_string()),
        ),
        (
            "duration_weeks",
            request
                .duration_weeks
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unspecified".to_string()),
        ),
    ]);
    render(PROJECT_TEMPLATE, &vars)
}
