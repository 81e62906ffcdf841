// Settings loaded from the environment (after dotenvy has read `.env`) and
// the fixed catalogues offered on the forms.

use std::env;

lazy_static::lazy_static! {
    pub static ref OPENAI_API_KEY: String = env::var("OPENAI_API_KEY").unwrap_or_default();
    pub static ref OPENAI_BASE_URL: String = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
    pub static ref ESTIMATOR_MODEL: String = env::var("ESTIMATOR_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo-0125".to_string());
    pub static ref REQUEST_TIMEOUT_SECS: u64 = env::var("ESTIMATOR_REQUEST_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(60);
    pub static ref TEMPLATES_DIR: String = env::var("ESTIMATOR_TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_string());
    pub static ref STATIC_DIR: String = env::var("ESTIMATOR_STATIC_DIR").unwrap_or_else(|_| "static".to_string());
}

pub const DEFAULT_PORT: u16 = 9900;

/// Upper bound for each experience level on the team inputs.
pub const MAX_TEAM_MEMBERS: u32 = 20;

/// Shown in place of a result whenever the upstream call fails.
pub const ERROR_MESSAGE: &str = "Error while loading please try again";

pub const TECHNOLOGIES: &[&str] = &[
    "React",
    "Next.js",
    "Angular",
    "Vue.js",
    "Node.js",
    "Express",
    "Django",
    "Flask",
    "Ruby on Rails",
    "Spring Boot",
    ".NET",
    "Laravel",
    "PostgreSQL",
    "MySQL",
    "MongoDB",
    "Redis",
    "Docker",
    "Kubernetes",
    "AWS",
    "Flutter",
    "React Native",
    "Swift",
    "Kotlin",
    "Go",
    "Rust",
];

pub const CONSTRUCTION_TYPES: &[&str] = &[
    "Residential",
    "Commercial",
    "Industrial",
    "Infrastructure",
    "Renovation",
    "Landscaping",
];
