//! The fixed tool catalog. One table drives both what the model is shown and
//! how each tool is invoked.

use crate::config::ScriptsConfig;
use crate::tools::{optional_arg, push_flag, required_arg};
use serde_json::{Map, Value, json};
use std::path::Path;
use std::time::Duration;

const SHORT: Duration = Duration::from_secs(30);
const ANALYSIS: Duration = Duration::from_secs(60);
const INGESTION: Duration = Duration::from_secs(300);

type Args = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptDir {
    Tasks,
    Rfp,
    Projects,
}

impl ScriptDir {
    pub fn resolve<'a>(&self, scripts: &'a ScriptsConfig) -> &'a Path {
        match self {
            Self::Tasks => &scripts.tasks_dir,
            Self::Rfp => &scripts.rfp_dir,
            Self::Projects => &scripts.projects_dir,
        }
    }
}

pub struct ToolEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub dir: ScriptDir,
    pub script: &'static str,
    pub timeout: Duration,
    pub parameters: fn() -> Value,
    pub build_args: fn(&Args) -> Result<Vec<String>, String>,
}

impl std::fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolEntry")
            .field("name", &self.name)
            .field("script", &self.script)
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub fn find(name: &str) -> Option<&'static ToolEntry> {
    CATALOG.iter().find(|entry| entry.name == name)
}

pub static CATALOG: &[ToolEntry] = &[
    ToolEntry {
        name: "get_tasks",
        description: "List tasks for a project, optionally filtered by urgency (due_today, due_this_week, overdue, upcoming, completed, all)",
        dir: ScriptDir::Tasks,
        script: "tasks.py",
        timeout: SHORT,
        parameters: || {
            json!({
                "type": "object",
                "properties": {
                    "project_slug": {"type": "string", "description": "Project identifier slug"},
                    "filter": {
                        "type": "string",
                        "enum": ["due_today", "due_this_week", "overdue", "upcoming", "completed", "all"],
                        "description": "Filter tasks by urgency. Defaults to 'all'"
                    }
                },
                "required": ["project_slug"]
            })
        },
        build_args: |args| {
            let mut argv = vec!["list".to_string(), required_arg(args, "project_slug")?];
            push_flag(&mut argv, args, "filter", "--filter");
            Ok(argv)
        },
    },
    ToolEntry {
        name: "get_task",
        description: "Get a single task by its ID with full details",
        dir: ScriptDir::Tasks,
        script: "tasks.py",
        timeout: SHORT,
        parameters: || task_id_schema("Task identifier"),
        build_args: |args| Ok(vec!["get".to_string(), required_arg(args, "task_id")?]),
    },
    ToolEntry {
        name: "analyze_task_document",
        description: "Analyze an uploaded document for task compatibility WITHOUT completing the task. Returns language detection, comprehensive analysis, and compatibility assessment. Use this BEFORE completing to show user analysis and ask for approval.",
        dir: ScriptDir::Tasks,
        script: "analyze_task_document.py",
        timeout: ANALYSIS,
        parameters: || task_id_schema("Task identifier to analyze document for"),
        build_args: |args| Ok(vec![required_arg(args, "task_id")?]),
    },
    ToolEntry {
        name: "complete_task",
        description: "Complete a task with full file upload workflow. Fetches task and deliverable details, finds latest uploaded file, validates content, creates document record, links document to deliverable, and marks task complete.",
        dir: ScriptDir::Tasks,
        script: "complete_task.py",
        timeout: ANALYSIS,
        parameters: || task_id_schema("Task identifier to complete"),
        build_args: |args| Ok(vec![required_arg(args, "task_id")?]),
    },
    ToolEntry {
        name: "create_task",
        description: "Create a single task with specified details",
        dir: ScriptDir::Tasks,
        script: "tasks.py",
        timeout: SHORT,
        parameters: || {
            json!({
                "type": "object",
                "properties": {
                    "topic_id": {"type": "integer", "description": "Topic ID to create task under"},
                    "title": {"type": "string", "description": "Task title/description"},
                    "due": {
                        "type": "string",
                        "description": "Due date in YYYY-MM-DD format",
                        "pattern": "^\\d{4}-\\d{2}-\\d{2}$"
                    },
                    "assignee_id": {"type": "integer", "description": "Team member ID to assign task to"},
                    "priority": {
                        "type": "string",
                        "enum": ["critical", "high", "medium", "low"],
                        "description": "Task priority level"
                    },
                    "description": {"type": "string", "description": "Detailed task description"},
                    "source": {"type": "string", "description": "Source reference (e.g., 'Section 2.1')"},
                    "deliverable_id": {"type": "integer", "description": "Deliverable ID to link task to"}
                },
                "required": ["topic_id", "title"]
            })
        },
        build_args: |args| {
            let mut argv = vec![
                "create".to_string(),
                "--topic-id".to_string(),
                required_arg(args, "topic_id")?,
                "--title".to_string(),
                required_arg(args, "title")?,
            ];
            push_flag(&mut argv, args, "due", "--due");
            push_flag(&mut argv, args, "assignee_id", "--assignee-id");
            push_flag(&mut argv, args, "priority", "--priority");
            push_flag(&mut argv, args, "description", "--description");
            push_flag(&mut argv, args, "source", "--source");
            push_flag(&mut argv, args, "deliverable_id", "--deliverable-id");
            Ok(argv)
        },
    },
    ToolEntry {
        name: "update_task",
        description: "Update an existing task's fields (title, due date, status, etc.)",
        dir: ScriptDir::Tasks,
        script: "tasks.py",
        timeout: SHORT,
        parameters: || {
            json!({
                "type": "object",
                "properties": {
                    "task_id": {"type": "integer", "description": "Task identifier to update"},
                    "title": {"type": "string", "description": "New task title"},
                    "due": {"type": "string", "description": "New due date in YYYY-MM-DD format"},
                    "status": {
                        "type": "string",
                        "enum": ["todo", "in_progress", "blocked", "complete"],
                        "description": "New task status"
                    }
                },
                "required": ["task_id"]
            })
        },
        build_args: |args| {
            let mut argv = vec!["update".to_string(), required_arg(args, "task_id")?];
            push_flag(&mut argv, args, "title", "--title");
            push_flag(&mut argv, args, "due", "--due");
            push_flag(&mut argv, args, "status", "--status");
            Ok(argv)
        },
    },
    ToolEntry {
        name: "delete_task",
        description: "Delete a task by its ID",
        dir: ScriptDir::Tasks,
        script: "tasks.py",
        timeout: SHORT,
        parameters: || task_id_schema("Task identifier to delete"),
        build_args: |args| Ok(vec!["delete".to_string(), required_arg(args, "task_id")?]),
    },
    ToolEntry {
        name: "process_rfp",
        description: "Process an RFP document and create project with all topics, requirements, deliverables, and tasks. Automatically uses the most recently uploaded file or accepts a specific file path.",
        dir: ScriptDir::Rfp,
        script: "process_rfp.py",
        timeout: INGESTION,
        parameters: || {
            json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Optional specific file path. If not provided, uses 'latest' to process the most recent upload from the media inbox"
                    }
                },
                "required": []
            })
        },
        build_args: |args| {
            Ok(vec![
                optional_arg(args, "file_path").unwrap_or_else(|| "latest".to_string()),
            ])
        },
    },
    ToolEntry {
        name: "get_project_stats",
        description: "Get project statistics including task counts, completion rates, and deadlines",
        dir: ScriptDir::Projects,
        script: "projects.py",
        timeout: SHORT,
        parameters: || project_slug_schema("Project identifier slug"),
        build_args: |args| Ok(vec!["stats".to_string(), required_arg(args, "project_slug")?]),
    },
    ToolEntry {
        name: "delete_project",
        description: "Delete a project by its slug. Use when user wants to replace a duplicate project.",
        dir: ScriptDir::Projects,
        script: "projects.py",
        timeout: SHORT,
        parameters: || project_slug_schema("Project slug to delete"),
        build_args: |args| Ok(vec!["delete".to_string(), required_arg(args, "project_slug")?]),
    },
    ToolEntry {
        name: "get_projects",
        description: "List all available projects. Use when user asks 'show me projects', 'list projects', 'my tasks' (to find current project), or when project slug is unknown.",
        dir: ScriptDir::Projects,
        script: "projects.py",
        timeout: SHORT,
        parameters: || json!({"type": "object", "properties": {}, "required": []}),
        build_args: |_| Ok(vec!["list".to_string()]),
    },
];

fn task_id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "task_id": {"type": "integer", "description": description}
        },
        "required": ["task_id"]
    })
}

fn project_slug_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "project_slug": {"type": "string", "description": description}
        },
        "required": ["project_slug"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn args(value: Value) -> Args {
        value.as_object().cloned().unwrap()
    }

    fn build(name: &str, value: Value) -> Result<Vec<String>, String> {
        (find(name).unwrap().build_args)(&args(value))
    }

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = CATALOG.iter().map(|e| e.name).collect();
        assert_eq!(names.len(), CATALOG.len());
        assert_eq!(CATALOG.len(), 11);
    }

    #[test]
    fn schemas_are_objects_listing_required_keys() {
        for entry in CATALOG {
            let schema = (entry.parameters)();
            assert_eq!(schema["type"], "object", "{}", entry.name);
            assert!(schema["required"].is_array(), "{}", entry.name);
        }
    }

    #[test]
    fn timeouts_follow_tool_weight() {
        assert_eq!(find("get_tasks").unwrap().timeout, Duration::from_secs(30));
        assert_eq!(find("complete_task").unwrap().timeout, Duration::from_secs(60));
        assert_eq!(
            find("analyze_task_document").unwrap().timeout,
            Duration::from_secs(60)
        );
        assert_eq!(find("process_rfp").unwrap().timeout, Duration::from_secs(300));
    }

    #[test]
    fn get_tasks_adds_filter_only_when_present() {
        assert_eq!(
            build("get_tasks", json!({"project_slug": "tower"})).unwrap(),
            vec!["list", "tower"]
        );
        assert_eq!(
            build("get_tasks", json!({"project_slug": "tower", "filter": "overdue"})).unwrap(),
            vec!["list", "tower", "--filter", "overdue"]
        );
    }

    #[test]
    fn numeric_ids_render_as_plain_text() {
        assert_eq!(
            build("complete_task", json!({"task_id": 20})).unwrap(),
            vec!["20"]
        );
        assert_eq!(
            build("update_task", json!({"task_id": 7, "status": "blocked"})).unwrap(),
            vec!["update", "7", "--status", "blocked"]
        );
    }

    #[test]
    fn create_task_flags_keep_declared_order() {
        let argv = build(
            "create_task",
            json!({
                "deliverable_id": 4,
                "title": "Pour footings",
                "topic_id": 3,
                "priority": "high",
                "due": "2026-11-02"
            }),
        )
        .unwrap();

        assert_eq!(
            argv,
            vec![
                "create",
                "--topic-id",
                "3",
                "--title",
                "Pour footings",
                "--due",
                "2026-11-02",
                "--priority",
                "high",
                "--deliverable-id",
                "4"
            ]
        );
    }

    #[test]
    fn process_rfp_defaults_to_latest_upload() {
        assert_eq!(build("process_rfp", json!({})).unwrap(), vec!["latest"]);
        assert_eq!(
            build("process_rfp", json!({"file_path": "/tmp/rfp.pdf"})).unwrap(),
            vec!["/tmp/rfp.pdf"]
        );
    }

    #[test]
    fn missing_required_argument_is_reported() {
        let err = build("get_task", json!({})).unwrap_err();
        assert!(err.contains("task_id"));
    }

    #[test]
    fn script_dirs_resolve_from_config() {
        let scripts = ScriptsConfig {
            interpreter: "python3".into(),
            tasks_dir: "/t".into(),
            rfp_dir: "/r".into(),
            projects_dir: "/p".into(),
        };
        assert_eq!(find("process_rfp").unwrap().dir.resolve(&scripts), Path::new("/r"));
        assert_eq!(find("get_projects").unwrap().dir.resolve(&scripts), Path::new("/p"));
    }
}
