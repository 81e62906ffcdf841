use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::constants::{CONSTRUCTION_TYPES, MAX_TEAM_MEMBERS, TECHNOLOGIES};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("Please enter a task")]
    MissingTaskName,
    #[error("no task at index {0}")]
    NoSuchTask(usize),
}

/// Which estimator a form belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Software,
    Construction,
}

impl ProjectKind {
    pub const ALL: [ProjectKind; 2] = [ProjectKind::Software, ProjectKind::Construction];

    pub fn slug(self) -> &'static str {
        match self {
            ProjectKind::Software => "software",
            ProjectKind::Construction => "construction",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ProjectKind::Software => "Software project",
            ProjectKind::Construction => "Construction project",
        }
    }

    /// Noun used for team members both on the page and in the prompt.
    pub fn member_noun(self) -> &'static str {
        match self {
            ProjectKind::Software => "developers",
            ProjectKind::Construction => "workers",
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Head count per experience level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub beginner: u32,
    #[serde(default)]
    pub intermediate: u32,
    #[serde(default)]
    pub experienced: u32,
}

impl Team {
    pub fn levels(&self) -> [(&'static str, u32); 3] {
        [
            ("beginner", self.beginner),
            ("intermediate", self.intermediate),
            ("experienced", self.experienced),
        ]
    }

    pub fn clamped(self) -> Self {
        Self {
            beginner: self.beginner.min(MAX_TEAM_MEMBERS),
            intermediate: self.intermediate.min(MAX_TEAM_MEMBERS),
            experienced: self.experienced.min(MAX_TEAM_MEMBERS),
        }
    }

    /// Sets one level from raw form input. Anything that is not a
    /// non-negative integer counts as zero.
    fn set_level(&mut self, level: &str, raw: &str) {
        let count = raw.trim().parse::<u32>().unwrap_or(0).min(MAX_TEAM_MEMBERS);
        match level {
            "beginner" => self.beginner = count,
            "intermediate" => self.intermediate = count,
            "experienced" => self.experienced = count,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Task {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProjectDetails {
    Software {
        #[serde(default)]
        technologies: Vec<String>,
    },
    Construction {
        #[serde(default)]
        construction_type: String,
        /// Square feet.
        #[serde(default)]
        area: Option<f64>,
    },
}

impl ProjectDetails {
    pub fn empty(kind: ProjectKind) -> Self {
        match kind {
            ProjectKind::Software => ProjectDetails::Software {
                technologies: Vec::new(),
            },
            ProjectKind::Construction => ProjectDetails::Construction {
                construction_type: String::new(),
                area: None,
            },
        }
    }

    pub fn kind(&self) -> ProjectKind {
        match self {
            ProjectDetails::Software { .. } => ProjectKind::Software,
            ProjectDetails::Construction { .. } => ProjectKind::Construction,
        }
    }
}

/// Everything the prompt is built from. This is also the JSON shape read by
/// the API and the CLI:
///
/// ```json
/// { "kind": "software", "technologies": ["Rust"],
///   "team": { "experienced": 2 },
///   "tasks": [{ "name": "Login", "description": "OAuth" }] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSpec {
    #[serde(default)]
    pub team: Team,
    #[serde(flatten)]
    pub details: ProjectDetails,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl ProjectSpec {
    pub fn new(kind: ProjectKind) -> Self {
        Self {
            team: Team::default(),
            details: ProjectDetails::empty(kind),
            tasks: Vec::new(),
        }
    }

    pub fn kind(&self) -> ProjectKind {
        self.details.kind()
    }

    /// A calculation needs at least one task plus a technology (software) or
    /// a construction type (construction).
    pub fn is_ready(&self) -> bool {
        if self.tasks.is_empty() {
            return false;
        }
        match &self.details {
            ProjectDetails::Software { technologies } => !technologies.is_empty(),
            ProjectDetails::Construction {
                construction_type, ..
            } => !construction_type.trim().is_empty(),
        }
    }

    /// Clamps team counts and drops repeated technologies. Used on specs that
    /// did not come through the HTML form.
    pub fn normalized(mut self) -> Self {
        self.team = self.team.clamped();
        if let ProjectDetails::Software { technologies } = &mut self.details {
            let mut seen: Vec<String> = Vec::with_capacity(technologies.len());
            for tech in technologies.drain(..) {
                if !seen.contains(&tech) {
                    seen.push(tech);
                }
            }
            *technologies = seen;
        }
        self
    }
}

/// Server-side state of one estimator page: the spec plus the inputs of the
/// "new task" row.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectForm {
    pub spec: ProjectSpec,
    pub pending_task: String,
    pub pending_description: String,
    pub show_input_error: bool,
}

impl ProjectForm {
    pub fn new(kind: ProjectKind) -> Self {
        Self {
            spec: ProjectSpec::new(kind),
            pending_task: String::new(),
            pending_description: String::new(),
            show_input_error: false,
        }
    }

    pub fn kind(&self) -> ProjectKind {
        self.spec.kind()
    }

    pub fn is_ready(&self) -> bool {
        self.spec.is_ready()
    }

    /// Moves the pending row into the task list. Name and description are
    /// kept exactly as typed; only an empty name is refused.
    pub fn add_task(&mut self) -> Result<(), FormError> {
        if self.pending_task.is_empty() {
            self.show_input_error = true;
            return Err(FormError::MissingTaskName);
        }
        let task = Task::new(
            std::mem::take(&mut self.pending_task),
            std::mem::take(&mut self.pending_description),
        );
        self.spec.tasks.push(task);
        self.show_input_error = false;
        Ok(())
    }

    pub fn delete_task(&mut self, index: usize) -> Result<Task, FormError> {
        if index >= self.spec.tasks.len() {
            return Err(FormError::NoSuchTask(index));
        }
        Ok(self.spec.tasks.remove(index))
    }

    /// Updates the form from submitted `application/x-www-form-urlencoded`
    /// pairs. The whole form is always submitted, so a missing
    /// `technologies` key means nothing is selected.
    pub fn apply_fields(&mut self, fields: &[(String, String)]) {
        self.show_input_error = false;
        let mut technologies: Vec<String> = Vec::new();

        for (key, value) in fields {
            match key.as_str() {
                "beginner" | "intermediate" | "experienced" => {
                    self.spec.team.set_level(key, value)
                }
                "task" => self.pending_task = value.clone(),
                "description" => self.pending_description = value.clone(),
                "technologies" => {
                    if TECHNOLOGIES.contains(&value.as_str()) && !technologies.contains(value) {
                        technologies.push(value.clone());
                    }
                }
                "construction_type" => {
                    if let ProjectDetails::Construction {
                        construction_type, ..
                    } = &mut self.spec.details
                    {
                        *construction_type = if CONSTRUCTION_TYPES.contains(&value.as_str()) {
                            value.clone()
                        } else {
                            String::new()
                        };
                    }
                }
                "area" => {
                    if let ProjectDetails::Construction { area, .. } = &mut self.spec.details {
                        *area = value
                            .trim()
                            .parse::<f64>()
                            .ok()
                            .filter(|a| a.is_finite() && *a >= 0.0);
                    }
                }
                _ => {}
            }
        }

        if let ProjectDetails::Software {
            technologies: selected,
        } = &mut self.spec.details
        {
            *selected = technologies;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_add_task_requires_name() {
        let mut form = ProjectForm::new(ProjectKind::Software);
        form.pending_description = "no name".to_string();
        assert_eq!(form.add_task(), Err(FormError::MissingTaskName));
        assert!(form.show_input_error);
        assert!(form.spec.tasks.is_empty());
        // The description survives so the user can fix the name.
        assert_eq!(form.pending_description, "no name");
    }

    #[test]
    fn test_add_task_clears_pending_inputs() {
        let mut form = ProjectForm::new(ProjectKind::Software);
        form.pending_task = "  Login page  ".to_string();
        form.pending_description = "  OAuth and email\n".to_string();
        form.add_task().unwrap();

        assert_eq!(
            form.spec.tasks,
            vec![Task::new("  Login page  ", "  OAuth and email\n")]
        );
        assert!(form.pending_task.is_empty());
        assert!(form.pending_description.is_empty());
        assert!(!form.show_input_error);
    }

    #[test]
    fn test_add_task_accepts_whitespace_name() {
        let mut form = ProjectForm::new(ProjectKind::Software);
        form.pending_task = " ".to_string();
        assert_eq!(form.add_task(), Ok(()));
        assert_eq!(form.spec.tasks, vec![Task::new(" ", "")]);
    }

    #[test]
    fn test_delete_task() {
        let mut form = ProjectForm::new(ProjectKind::Software);
        form.spec.tasks = vec![Task::new("a", ""), Task::new("b", ""), Task::new("c", "")];

        assert_eq!(form.delete_task(1).unwrap().name, "b");
        assert_eq!(form.delete_task(5), Err(FormError::NoSuchTask(5)));
        let names: Vec<_> = form.spec.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn test_apply_fields_software() {
        let mut form = ProjectForm::new(ProjectKind::Software);
        form.show_input_error = true;
        form.apply_fields(&pairs(&[
            ("beginner", "2"),
            ("intermediate", "abc"),
            ("experienced", "99"),
            ("technologies", "Rust"),
            ("technologies", "COBOL"),
            ("technologies", "React"),
            ("technologies", "Rust"),
            ("task", "API"),
            ("description", "REST endpoints"),
        ]));

        assert_eq!(
            form.spec.team,
            Team {
                beginner: 2,
                intermediate: 0,
                experienced: MAX_TEAM_MEMBERS
            }
        );
        assert_eq!(
            form.spec.details,
            ProjectDetails::Software {
                technologies: vec!["Rust".to_string(), "React".to_string()]
            }
        );
        assert_eq!(form.pending_task, "API");
        assert_eq!(form.pending_description, "REST endpoints");
        assert!(!form.show_input_error);
    }

    #[test]
    fn test_apply_fields_without_technologies_clears_selection() {
        let mut form = ProjectForm::new(ProjectKind::Software);
        form.apply_fields(&pairs(&[("technologies", "Go")]));
        form.apply_fields(&pairs(&[("beginner", "1")]));
        assert_eq!(
            form.spec.details,
            ProjectDetails::Software {
                technologies: vec![]
            }
        );
    }

    #[test]
    fn test_apply_fields_construction() {
        let mut form = ProjectForm::new(ProjectKind::Construction);
        form.apply_fields(&pairs(&[
            ("construction_type", "Commercial"),
            ("area", "2500.5"),
            ("technologies", "Rust"),
        ]));
        assert_eq!(
            form.spec.details,
            ProjectDetails::Construction {
                construction_type: "Commercial".to_string(),
                area: Some(2500.5)
            }
        );

        form.apply_fields(&pairs(&[("construction_type", "Spaceport"), ("area", "-4")]));
        assert_eq!(
            form.spec.details,
            ProjectDetails::Construction {
                construction_type: String::new(),
                area: None
            }
        );
    }

    #[test]
    fn test_is_ready() {
        let mut spec = ProjectSpec::new(ProjectKind::Software);
        assert!(!spec.is_ready());
        spec.tasks.push(Task::new("a", ""));
        assert!(!spec.is_ready());
        spec.details = ProjectDetails::Software {
            technologies: vec!["Go".to_string()],
        };
        assert!(spec.is_ready());

        let mut spec = ProjectSpec::new(ProjectKind::Construction);
        spec.tasks.push(Task::new("Foundation", ""));
        assert!(!spec.is_ready());
        spec.details = ProjectDetails::Construction {
            construction_type: "Residential".to_string(),
            area: None,
        };
        assert!(spec.is_ready());
    }

    #[test]
    fn test_spec_json_shape() {
        let json = r#"{
            "kind": "software",
            "technologies": ["Rust", "Rust", "React"],
            "team": { "experienced": 40 },
            "tasks": [{ "name": "Login" }]
        }"#;
        let spec: ProjectSpec = serde_json::from_str(json).unwrap();
        let spec = spec.normalized();

        assert_eq!(spec.kind(), ProjectKind::Software);
        assert_eq!(spec.team.experienced, MAX_TEAM_MEMBERS);
        assert_eq!(spec.team.beginner, 0);
        assert_eq!(spec.tasks, vec![Task::new("Login", "")]);
        assert_eq!(
            spec.details,
            ProjectDetails::Software {
                technologies: vec!["Rust".to_string(), "React".to_string()]
            }
        );
    }

    #[test]
    fn test_kind_from_path_segment() {
        let kind: ProjectKind = serde_json::from_str("\"construction\"").unwrap();
        assert_eq!(kind, ProjectKind::Construction);
        assert_eq!(kind.to_string(), "construction");
        assert_eq!(kind.member_noun(), "workers");
    }
}
