// Prompt templates. Form values are concatenated between a fixed prefix and
// postfix; the postfix asks for the reply layout the breakdown parser reads.

use crate::form::{ProjectDetails, ProjectSpec, Team};

pub const QUESTION_PREFIX: &str = "How much time will it take to build a software project with ";

pub const CONSTRUCTION_PREFIX: &str = "How much time will it take to complete a ";

pub const QUESTION_POSTFIX: &str = "Give the total estimated time on the first line, \
then one line per task in the format `task: time`, without any other text.";

pub const QUOTATION_PROMPT: &str = "Give me a quotation for this project with the cost of \
each task and the total cost.";

pub fn build_estimate_prompt(spec: &ProjectSpec) -> String {
    let noun = spec.kind().member_noun();
    let mut question = String::new();

    match &spec.details {
        ProjectDetails::Software { technologies } => {
            question.push_str(QUESTION_PREFIX);
            push_team(&mut question, &spec.team, noun);
            for (i, tech) in technologies.iter().enumerate() {
                question.push_str(if i == 0 { " using " } else { " and " });
                question.push_str(tech);
            }
        }
        ProjectDetails::Construction {
            construction_type,
            area,
        } => {
            question.push_str(CONSTRUCTION_PREFIX);
            question.push_str(&format!(
                "{} project of {} square feet of area if ",
                construction_type,
                area.unwrap_or(0.0)
            ));
            push_team(&mut question, &spec.team, noun);
        }
    }

    for task in &spec.tasks {
        question.push_str(&format!(", {}: {}", task.name, task.description));
    }

    question.push(' ');
    question.push_str(QUESTION_POSTFIX);
    question
}

fn push_team(question: &mut String, team: &Team, noun: &str) {
    for (level, count) in team.levels() {
        if count > 0 {
            question.push_str(&format!("{} {} {} working ", count, level, noun));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{ProjectKind, Task};

    #[test]
    fn test_software_prompt() {
        let spec = ProjectSpec {
            team: Team {
                beginner: 0,
                intermediate: 3,
                experienced: 1,
            },
            details: ProjectDetails::Software {
                technologies: vec!["React".to_string(), "Node.js".to_string()],
            },
            tasks: vec![
                Task::new("Login", "OAuth"),
                Task::new("Dashboard", "charts"),
            ],
        };

        let expected = format!(
            "{}3 intermediate developers working 1 experienced developers working  \
             using React and Node.js, Login: OAuth, Dashboard: charts {}",
            QUESTION_PREFIX, QUESTION_POSTFIX
        );
        assert_eq!(build_estimate_prompt(&spec), expected);
    }

    #[test]
    fn test_construction_prompt() {
        let spec = ProjectSpec {
            team: Team {
                beginner: 4,
                intermediate: 0,
                experienced: 0,
            },
            details: ProjectDetails::Construction {
                construction_type: "Residential".to_string(),
                area: Some(1200.0),
            },
            tasks: vec![Task::new("Foundation", "")],
        };

        let prompt = build_estimate_prompt(&spec);
        assert!(prompt.starts_with(
            "How much time will it take to complete a Residential project of 1200 square feet \
             of area if 4 beginner workers working , Foundation: "
        ));
        assert!(prompt.ends_with(QUESTION_POSTFIX));
    }

    #[test]
    fn test_empty_spec_keeps_prefix_and_postfix() {
        let prompt = build_estimate_prompt(&ProjectSpec::new(ProjectKind::Software));
        assert_eq!(prompt, format!("{} {}", QUESTION_PREFIX, QUESTION_POSTFIX));

        let prompt = build_estimate_prompt(&ProjectSpec::new(ProjectKind::Construction));
        assert!(prompt.contains(" project of 0 square feet"));
    }

    #[test]
    fn test_fractional_area_is_kept() {
        let mut spec = ProjectSpec::new(ProjectKind::Construction);
        spec.details = ProjectDetails::Construction {
            construction_type: "Renovation".to_string(),
            area: Some(1200.5),
        };
        assert!(build_estimate_prompt(&spec).contains("Renovation project of 1200.5 square feet"));
    }

    #[test]
    fn test_tasks_are_appended_verbatim() {
        let mut spec = ProjectSpec::new(ProjectKind::Software);
        spec.details = ProjectDetails::Software {
            technologies: vec!["Rust".to_string()],
        };
        spec.tasks.push(Task::new("  Login  ", "  OAuth\n"));
        assert!(build_estimate_prompt(&spec).contains(" using Rust,   Login  :   OAuth\n "));
    }
}
