use super::types::{TaskStatus, TaskStep, TaskType};

/// Step template family chosen from a task name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepCategory {
    Analysis,
    Research,
    Document,
    Default,
}

impl StepCategory {
    pub fn template(self) -> &'static [&'static str] {
        match self {
            Self::Analysis => &[
                "Parsing input data",
                "Identifying patterns",
                "Running analysis",
                "Generating insights",
                "Compiling report",
            ],
            Self::Research => &[
                "Gathering sources",
                "Reviewing documents",
                "Cross-referencing data",
                "Synthesizing findings",
                "Writing summary",
            ],
            Self::Document => &[
                "Reading document",
                "Extracting text",
                "Processing content",
                "Validating data",
                "Finalizing output",
            ],
            Self::Default => &[
                "Initializing",
                "Processing",
                "Analyzing",
                "Validating",
                "Completing",
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Research => "research",
            Self::Document => "document",
            Self::Default => "default",
        }
    }
}

/// A single classification rule: the category applies when the lowercased
/// name contains any of the keywords.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    pub category: StepCategory,
    pub keywords: &'static [&'static str],
}

impl ClassificationRule {
    pub fn matches(&self, lowered_name: &str) -> bool {
        self.keywords.iter().any(|k| lowered_name.contains(k))
    }
}

/// Evaluated in order; first match wins.
pub const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        category: StepCategory::Analysis,
        keywords: &["analysis", "analyze"],
    },
    ClassificationRule {
        category: StepCategory::Research,
        keywords: &["research", "find", "search"],
    },
    ClassificationRule {
        category: StepCategory::Document,
        keywords: &["document", "read", "process"],
    },
];

pub fn classify(task_name: &str) -> StepCategory {
    let lowered = task_name.to_lowercase();
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.category)
        .unwrap_or(StepCategory::Default)
}

/// Steps for the simulated driver: first step `queued`, the rest `idle`.
pub fn generate_steps(task_name: &str) -> Vec<TaskStep> {
    classify(task_name)
        .template()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let status = if idx == 0 {
                TaskStatus::Queued
            } else {
                TaskStatus::Idle
            };
            TaskStep::new(*name, status)
        })
        .collect()
}

fn ai_template(task_type: TaskType) -> &'static [&'static str] {
    match task_type {
        TaskType::Summarize => &[
            "Reading document",
            "Analyzing content structure",
            "Identifying key points",
            "Generating summary",
            "Formatting output",
        ],
        TaskType::Qa => &[
            "Processing question",
            "Scanning document",
            "Finding relevant sections",
            "Analyzing context",
            "Generating answer",
        ],
        TaskType::Extract => &[
            "Parsing document",
            "Identifying data fields",
            "Extracting values",
            "Validating data",
            "Structuring output",
        ],
        TaskType::Report => &[
            "Analyzing source data",
            "Creating outline",
            "Writing sections",
            "Adding insights",
            "Formatting report",
        ],
        TaskType::Research => &[
            "Processing topic",
            "Gathering information",
            "Analyzing perspectives",
            "Synthesizing findings",
            "Compiling report",
        ],
        TaskType::Analyze => &[
            "Loading document",
            "Running analysis",
            "Identifying patterns",
            "Drawing conclusions",
            "Preparing results",
        ],
        TaskType::Chat => &[
            "Processing context",
            "Understanding query",
            "Generating response",
        ],
    }
}

/// Steps for the AI-backed driver; all start `idle`.
pub fn generate_ai_steps(task_type: TaskType) -> Vec<TaskStep> {
    ai_template(task_type)
        .iter()
        .map(|name| TaskStep::new(*name, TaskStatus::Idle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(steps: &[TaskStep]) -> Vec<&str> {
        steps.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_analysis_name_gets_analysis_template() {
        let steps = generate_steps("Quarterly Financial Analysis");
        assert_eq!(
            names(&steps),
            vec![
                "Parsing input data",
                "Identifying patterns",
                "Running analysis",
                "Generating insights",
                "Compiling report",
            ]
        );
        assert_eq!(steps[0].status, TaskStatus::Queued);
        assert!(steps[1..].iter().all(|s| s.status == TaskStatus::Idle));
    }

    #[test]
    fn test_unmatched_name_gets_default_template() {
        let steps = generate_steps("Random Task");
        assert_eq!(names(&steps), StepCategory::Default.template().to_vec());
    }

    #[test]
    fn test_classification_priority() {
        // Contains both research and document keywords.
        assert_eq!(classify("Research the document"), StepCategory::Research);
        assert_eq!(classify("Analyze search results"), StepCategory::Analysis);
        assert_eq!(classify("Process invoices"), StepCategory::Document);
        assert_eq!(classify("FIND vendors"), StepCategory::Research);
        assert_eq!(classify(""), StepCategory::Default);
    }

    #[test]
    fn test_classification_is_substring_based() {
        // "spreadsheet" contains "read".
        assert_eq!(classify("Spreadsheet cleanup"), StepCategory::Document);
    }

    #[test]
    fn test_ai_steps_are_idle() {
        let steps = generate_ai_steps(TaskType::Qa);
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[0].name, "Processing question");
        assert!(steps.iter().all(|s| s.status == TaskStatus::Idle));

        assert_eq!(generate_ai_steps(TaskType::Chat).len(), 3);
    }
}
