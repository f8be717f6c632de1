//! Fixed vocabularies used by extraction, formation detection and XP.

/// Role suffixes that may end an agent name (`python-pro`, `backend-architect`).
pub const ROLE_SUFFIXES: &[&str] = &[
    "pro",
    "elite",
    "engineer",
    "architect",
    "specialist",
    "analyst",
    "developer",
    "commander",
    "optimizer",
    "auditor",
];

/// Domain words accepted alongside role suffixes by the agent-name filter.
pub const DOMAIN_KEYWORDS: &[&str] = &[
    "python",
    "javascript",
    "golang",
    "rust",
    "frontend",
    "backend",
    "data",
    "ml",
    "ai",
    "devops",
    "cloud",
    "security",
    "test",
];

/// Words whose presence in a task raises its complexity score.
pub const COMPLEXITY_KEYWORDS: &[&str] = &[
    "architecture",
    "design",
    "refactor",
    "optimize",
    "debug",
    "implement",
    "deploy",
    "test",
    "analyze",
    "review",
];

/// Tool identifiers and the `name` value that marks their use in message content.
pub const KNOWN_TOOLS: &[(&str, &str)] = &[
    ("bash", "Bash"),
    ("edit", "Edit"),
    ("read", "Read"),
    ("write", "Write"),
    ("grep", "Grep"),
    ("glob", "Glob"),
    ("ls", "LS"),
    ("multiedit", "MultiEdit"),
    ("webfetch", "WebFetch"),
    ("websearch", "WebSearch"),
];

/// Specialization categories and their member agents, in lookup order.
pub const SPECIALIZATIONS: &[(&str, &[&str])] = &[
    (
        "python",
        &["python-elite", "python-pro", "data-engineer", "ai-engineer", "ml-engineer"],
    ),
    (
        "javascript",
        &["javascript-pro", "frontend-developer", "full-stack-architect"],
    ),
    (
        "backend",
        &["backend-architect", "golang-pro", "rust-pro", "sql-pro"],
    ),
    (
        "infrastructure",
        &[
            "devops-engineer",
            "cloud-architect",
            "deployment-engineer",
            "incident-commander",
        ],
    ),
    (
        "quality",
        &[
            "test-engineer",
            "code-reviewer",
            "performance-engineer",
            "quality-engineer",
        ],
    ),
    ("security", &["security-auditor"]),
    (
        "data",
        &["data-engineer", "data-ai-ml-engineer", "ml-engineer", "ai-engineer"],
    ),
    (
        "business",
        &["business-analyst", "content-marketer", "user-feedback-analyst"],
    ),
    (
        "product",
        &[
            "api-documenter",
            "dx-optimizer",
            "tech-portfolio-resume-review-specialist",
        ],
    ),
];

/// Named squad formations, each defined by a three-agent reference set.
pub const FORMATIONS: &[(&str, &[&str])] = &[
    (
        "full-stack",
        &["frontend-developer", "backend-architect", "database-optimizer"],
    ),
    (
        "data-pipeline",
        &["data-engineer", "ai-engineer", "devops-engineer"],
    ),
    (
        "security-audit",
        &["security-auditor", "code-reviewer", "devops-engineer"],
    ),
    (
        "performance-optimization",
        &["performance-engineer", "database-optimizer", "cloud-architect"],
    ),
    (
        "feature-development",
        &["frontend-developer", "backend-architect", "test-engineer"],
    ),
    (
        "ml-deployment",
        &["ml-engineer", "devops-engineer", "cloud-architect"],
    ),
    (
        "incident-response",
        &["incident-commander", "devops-troubleshooter", "security-auditor"],
    ),
];

/// All specialization categories an agent belongs to, in catalog order.
pub fn specializations_for(agent: &str) -> Vec<&'static str> {
    SPECIALIZATIONS
        .iter()
        .filter(|(_, members)| members.contains(&agent))
        .map(|(name, _)| *name)
        .collect()
}

/// The first specialization category an agent belongs to.
pub fn primary_specialization(agent: &str) -> Option<(&'static str, &'static [&'static str])> {
    SPECIALIZATIONS
        .iter()
        .find(|(_, members)| members.contains(&agent))
        .copied()
}
