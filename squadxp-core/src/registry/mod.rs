//! Registry of agent definition files
//!
//! Agents are described by markdown files, optionally with front matter,
//! kept in a handful of search directories:
//!
//! ```text
//! <search path>/
//! ├── development/          ← category "Development"
//! │   ├── python-pro.md
//! │   └── rust-pro.md
//! └── security/
//!     └── security-auditor.md
//! ```
//!
//! [`AgentRegistry::discover`] walks every search path and builds an index
//! keyed by agent name. The index is held in an injected [`TtlCache`], so
//! repeated queries within the TTL do not touch the filesystem.

mod cache;
pub mod frontmatter;

pub use cache::TtlCache;

use crate::config::Config;
use crate::error::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

// ============================================
// Metadata
// ============================================

/// Experience level an agent file presents itself at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
        Difficulty::Expert,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
            Difficulty::Expert => "expert",
        }
    }

    fn indicators(self) -> &'static [&'static str] {
        match self {
            Difficulty::Beginner => &["simple", "basic", "getting started", "intro"],
            Difficulty::Intermediate => &["experience", "skilled", "proficient"],
            Difficulty::Advanced => &["expert", "master", "elite", "senior", "architect"],
            Difficulty::Expert => &["elite", "battle-tested", "legendary", "guru"],
        }
    }

    /// First level, in [`Self::ALL`] order, with an indicator in `text`.
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.indicators().iter().any(|w| lower.contains(w)))
            .unwrap_or(Difficulty::Intermediate)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Config(format!("unknown difficulty: {}", s)))
    }
}

/// Everything known about one agent definition file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentMetadata {
    pub name: String,
    pub description: String,
    pub category: String,
    pub file_path: PathBuf,
    pub color: Option<String>,
    pub tools: Option<String>,
    pub tech_stack: BTreeSet<String>,
    /// At most five bullet points from the file's skills sections
    pub specialties: Vec<String>,
    pub difficulty: Difficulty,
    pub file_size: u64,
}

const DEFAULT_CATEGORY: &str = "Uncategorized";
const DEFAULT_DESCRIPTION: &str = "No description available";
const MAX_SPECIALTIES: usize = 5;
const MAX_SPECIALTY_CHARS: usize = 100;

const CATEGORY_NAMES: &[(&str, &str)] = &[
    ("business", "Business"),
    ("conductor", "Coordination"),
    ("data", "Data & AI"),
    ("development", "Development"),
    ("infrastructure", "Infrastructure"),
    ("product", "Product"),
    ("quality", "Quality Assurance"),
    ("security", "Security"),
];

static TECH_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("python", r"\b(?:python|django|fastapi|flask|pandas|numpy|pytorch)\b"),
        (
            "javascript",
            r"\b(?:javascript|typescript|node\.?js|react|vue|angular|next\.?js)\b",
        ),
        ("golang", r"\b(?:go|golang|gin|echo|fiber)\b"),
        ("rust", r"\b(?:rust|cargo|tokio|actix|warp)\b"),
        ("java", r"\b(?:java|spring|maven|gradle|junit)\b"),
        ("sql", r"\b(?:sql|postgresql|mysql|sqlite|mongodb|redis)\b"),
        ("cloud", r"\b(?:aws|azure|gcp|docker|kubernetes|terraform)\b"),
        ("frontend", r"\b(?:html|css|react|vue|angular|svelte|tailwind)\b"),
        ("backend", r"\b(?:api|rest|graphql|microservices|database)\b"),
        ("devops", r"\b(?:devops|ci/cd|jenkins|github actions|deployment)\b"),
        ("testing", r"\b(?:test|testing|jest|pytest|cypress|selenium)\b"),
    ]
    .into_iter()
    .map(|(tech, pattern)| {
        let re = Regex::new(&format!("(?i){}", pattern)).expect("valid tech pattern");
        (tech, re)
    })
    .collect()
});

/// Section headings whose bullets count as specialties, matched after `##`.
static SPECIALTY_HEADINGS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(?:core )?competenc",
        r"(?i)^(?:my )?specialt(?:ies|y)",
        r"(?i)^(?:my )?approach",
        r"(?i)^(?:key )?(?:skills?|expertise)",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("valid heading pattern"))
    .collect()
});

/// Tech keywords found anywhere in `text`.
pub fn extract_tech_stack(text: &str) -> BTreeSet<String> {
    TECH_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(tech, _)| tech.to_string())
        .collect()
}

/// Bullet points under skills-like `##` sections, headings in pattern order.
pub fn extract_specialties(body: &str) -> Vec<String> {
    // Text after each "##", up to the next one
    let sections: Vec<(&str, &str)> = body
        .split("##")
        .skip(1)
        .filter_map(|chunk| {
            let chunk = chunk.trim_start_matches('#');
            // "##" must be followed by a space to start a heading
            let chunk = chunk.strip_prefix(' ')?;
            let heading = chunk.lines().next().unwrap_or("").trim();
            Some((heading, chunk))
        })
        .collect();

    let mut specialties = Vec::new();
    for heading_re in SPECIALTY_HEADINGS.iter() {
        for (heading, section) in &sections {
            if !heading_re.is_match(heading) {
                continue;
            }
            for line in section.lines().skip(1) {
                let line = line.trim();
                let item = line.strip_prefix("- ").or_else(|| line.strip_prefix("* "));
                if let Some(item) = item {
                    let item = item.trim();
                    if !item.is_empty() && item.chars().count() < MAX_SPECIALTY_CHARS {
                        specialties.push(item.to_string());
                    }
                }
            }
        }
    }

    specialties.truncate(MAX_SPECIALTIES);
    specialties
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Display category for a directory name.
pub fn category_name(dir: &str) -> String {
    CATEGORY_NAMES
        .iter()
        .find(|(key, _)| *key == dir)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| title_case(dir))
}

/// Category of `path` from the first directory below a matching search path.
fn category_for(path: &Path, search_paths: &[PathBuf]) -> String {
    for root in search_paths {
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let mut components = relative.components();
        let first = components.next();
        // A file directly in the search path has no category directory
        if let (Some(dir), Some(_)) = (first, components.next()) {
            return category_name(&dir.as_os_str().to_string_lossy());
        }
        return DEFAULT_CATEGORY.to_string();
    }
    DEFAULT_CATEGORY.to_string()
}

/// Build [`AgentMetadata`] from one agent markdown file.
pub fn analyze_agent_file(path: &Path, search_paths: &[PathBuf]) -> Result<AgentMetadata> {
    let content = std::fs::read_to_string(path)?;
    let file_size = std::fs::metadata(path)?.len();
    let (front, body) = frontmatter::parse(&content);

    let name = match front.text("name") {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Parse {
                source_name: path.display().to_string(),
                message: "agent file has no name".to_string(),
            })?,
    };

    let description_text = front.text("description").unwrap_or_default();
    let full_content = format!("{} {}", description_text, body);
    let description = if description_text.is_empty() {
        DEFAULT_DESCRIPTION.to_string()
    } else {
        description_text
    };

    Ok(AgentMetadata {
        name,
        description,
        category: category_for(path, search_paths),
        file_path: path.to_path_buf(),
        color: front.text("color"),
        tools: front.text("tools"),
        tech_stack: extract_tech_stack(&full_content),
        specialties: extract_specialties(body),
        difficulty: Difficulty::detect(&full_content),
        file_size,
    })
}

// ============================================
// Registry
// ============================================

/// Agents keyed by name.
pub type AgentIndex = BTreeMap<String, AgentMetadata>;

/// Filters for [`AgentRegistry::search`]; empty filters match everything.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Agent category must be one of these (case-insensitive)
    pub categories: Vec<String>,
    /// Agent must use at least one of these
    pub tech_stack: Vec<String>,
    pub difficulty: Option<Difficulty>,
}

const SQUAD_TEMPLATES: &[(&str, &[&str])] = &[
    (
        "web-app",
        &["full-stack-architect", "frontend-developer", "backend-architect", "test-engineer"],
    ),
    (
        "api",
        &["backend-architect", "api-documenter", "security-auditor", "test-engineer"],
    ),
    (
        "data-pipeline",
        &["data-engineer", "python-elite", "cloud-architect", "performance-engineer"],
    ),
    (
        "mobile-app",
        &["frontend-developer", "backend-architect", "cloud-architect", "test-engineer"],
    ),
    (
        "devops",
        &["devops-engineer", "cloud-architect", "security-auditor", "incident-commander"],
    ),
    (
        "ai-ml",
        &["ai-engineer", "data-engineer", "python-elite", "ml-engineer"],
    ),
];

const DEFAULT_SQUAD: &[&str] = &["full-stack-architect", "test-engineer"];

const TECH_SPECIALISTS: &[(&str, &str)] = &[
    ("python", "python-elite"),
    ("javascript", "javascript-pro"),
    ("typescript", "javascript-pro"),
    ("golang", "golang-pro"),
    ("rust", "rust-pro"),
    ("sql", "sql-pro"),
    ("react", "frontend-developer"),
    ("security", "security-auditor"),
    ("cloud", "cloud-architect"),
    ("devops", "devops-engineer"),
];

const MAX_SQUAD_SIZE: usize = 6;

/// Discovers and queries agent definition files.
pub struct AgentRegistry {
    search_paths: Vec<PathBuf>,
    cache: Arc<TtlCache<String, Arc<AgentIndex>>>,
    ttl: Duration,
}

impl AgentRegistry {
    pub fn new(
        search_paths: Vec<PathBuf>,
        cache: Arc<TtlCache<String, Arc<AgentIndex>>>,
        ttl: Duration,
    ) -> Self {
        Self {
            search_paths,
            cache,
            ttl,
        }
    }

    /// Registry over the configured search paths with a private cache.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.agent_search_paths(),
            Arc::new(TtlCache::new()),
            Duration::from_secs(config.registry.cache_ttl_secs),
        )
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Add a search path; the cached index is dropped.
    pub fn add_search_path(&mut self, path: PathBuf) {
        if !self.search_paths.contains(&path) {
            self.cache.invalidate(&self.cache_key());
            self.search_paths.push(path);
        }
    }

    fn cache_key(&self) -> String {
        let paths: Vec<String> = self
            .search_paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        paths.join("\n")
    }

    /// Index of every agent under the search paths.
    ///
    /// A cached index younger than the TTL is returned unless
    /// `force_refresh` is set. Unreadable files are skipped with a warning;
    /// when two files share a name, the later one wins.
    pub fn discover(&self, force_refresh: bool) -> Arc<AgentIndex> {
        let key = self.cache_key();
        if !force_refresh {
            if let Some(index) = self.cache.get(&key) {
                return index;
            }
        }

        tracing::info!("Discovering agents from search paths");
        let mut index = AgentIndex::new();

        for root in &self.search_paths {
            if !root.is_dir() {
                tracing::debug!(path = %root.display(), "Search path does not exist");
                continue;
            }

            let pattern = format!("{}/**/*.md", glob::Pattern::escape(&root.to_string_lossy()));
            let paths = match glob::glob(&pattern) {
                Ok(paths) => paths,
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "Invalid agent glob");
                    continue;
                }
            };

            let mut files: Vec<PathBuf> = paths
                .filter_map(|p| p.ok())
                .filter(|p| p.is_file())
                .collect();
            files.sort();

            for file in files {
                match analyze_agent_file(&file, &self.search_paths) {
                    Ok(agent) => {
                        tracing::debug!(agent = %agent.name, "Discovered agent");
                        index.insert(agent.name.clone(), agent);
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %file.display(),
                            error = %e,
                            "Failed to analyze agent file"
                        );
                    }
                }
            }
        }

        tracing::info!(agents = index.len(), "Agent discovery complete");
        let index = Arc::new(index);
        self.cache.put(key, Arc::clone(&index), self.ttl);
        index
    }

    pub fn get(&self, name: &str) -> Option<AgentMetadata> {
        self.discover(false).get(name).cloned()
    }

    pub fn by_category(&self, category: &str) -> Vec<AgentMetadata> {
        self.discover(false)
            .values()
            .filter(|a| a.category.eq_ignore_ascii_case(category))
            .cloned()
            .collect()
    }

    /// Agents using any of `techs`.
    pub fn by_tech_stack(&self, techs: &[&str]) -> Vec<AgentMetadata> {
        self.discover(false)
            .values()
            .filter(|a| techs.iter().any(|t| a.tech_stack.contains(*t)))
            .cloned()
            .collect()
    }

    /// Agents whose name, description or specialties contain `query`
    /// (case-insensitive) and which pass `filters`.
    pub fn search(&self, query: &str, filters: &SearchFilters) -> Vec<AgentMetadata> {
        let query = query.to_lowercase();
        self.discover(false)
            .values()
            .filter(|a| {
                query.is_empty()
                    || a.name.to_lowercase().contains(&query)
                    || a.description.to_lowercase().contains(&query)
                    || a.specialties.iter().any(|s| s.to_lowercase().contains(&query))
            })
            .filter(|a| {
                filters.categories.is_empty()
                    || filters.categories.iter().any(|c| c.eq_ignore_ascii_case(&a.category))
            })
            .filter(|a| {
                filters.tech_stack.is_empty()
                    || filters.tech_stack.iter().any(|t| a.tech_stack.contains(t))
            })
            .filter(|a| filters.difficulty.map_or(true, |d| a.difficulty == d))
            .cloned()
            .collect()
    }

    pub fn categories(&self) -> Vec<String> {
        let categories: BTreeSet<String> =
            self.discover(false).values().map(|a| a.category.clone()).collect();
        categories.into_iter().collect()
    }

    pub fn tech_stacks(&self) -> Vec<String> {
        let techs: BTreeSet<String> = self
            .discover(false)
            .values()
            .flat_map(|a| a.tech_stack.iter().cloned())
            .collect();
        techs.into_iter().collect()
    }

    /// Up to `limit` agents most like `name`, best first.
    ///
    /// Same category scores 3, each shared tech 2, same difficulty 1; agents
    /// scoring 0 are left out. Ties keep name order.
    pub fn similar_agents(&self, name: &str, limit: usize) -> Vec<AgentMetadata> {
        let index = self.discover(false);
        let Some(target) = index.get(name) else {
            return vec![];
        };

        let mut scored: Vec<(usize, &AgentMetadata)> = index
            .values()
            .filter(|a| a.name != target.name)
            .map(|a| {
                let mut score = 0;
                if a.category == target.category {
                    score += 3;
                }
                score += a.tech_stack.intersection(&target.tech_stack).count() * 2;
                if a.difficulty == target.difficulty {
                    score += 1;
                }
                (score, a)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().take(limit).map(|(_, a)| a.clone()).collect()
    }

    /// Agent names for a project type, plus tech specialists present in the
    /// registry, at most six.
    pub fn recommended_squad(&self, project_type: &str, tech_stack: &[&str]) -> Vec<String> {
        let base = SQUAD_TEMPLATES
            .iter()
            .find(|(kind, _)| kind.eq_ignore_ascii_case(project_type))
            .map(|(_, agents)| *agents)
            .unwrap_or(DEFAULT_SQUAD);

        let mut squad: Vec<String> = base.iter().map(|s| s.to_string()).collect();

        let index = self.discover(false);
        for tech in tech_stack {
            let tech = tech.to_lowercase();
            let Some((_, specialist)) = TECH_SPECIALISTS.iter().find(|(t, _)| *t == tech) else {
                continue;
            };
            if index.contains_key(*specialist) && !squad.iter().any(|s| s == specialist) {
                squad.push(specialist.to_string());
            }
        }

        squad.truncate(MAX_SQUAD_SIZE);
        squad
    }
}
