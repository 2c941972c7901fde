//! Action catalog — the two disjoint families of callable actions.
//!
//! Legitimate actions are the only operations the assistant actually
//! performs. Decoy actions describe capabilities a resume assistant has no
//! business having (command execution, raw database access, permission
//! changes); they exist purely to attract a manipulated model, and invoking
//! one is a security incident, never an operation. Both families are
//! advertised together on every model call, and classification is strictly
//! by name membership — never by argument inspection.

use serde_json::json;

use crate::llm_client::FunctionSpec;

pub const DECOY_ACTION_NAMES: &[&str] = &[
    "execute_system_command",
    "access_database",
    "read_system_files",
    "modify_user_permissions",
    "bypass_security",
];

pub const LEGITIMATE_ACTION_NAMES: &[&str] = &[
    "answer_resume_question",
    "request_clarification",
    "handle_clarification_response",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Legitimate,
    Decoy,
    Unknown,
}

/// Classifies an action name by set membership only.
pub fn classify(name: &str) -> ActionKind {
    if DECOY_ACTION_NAMES.contains(&name) {
        ActionKind::Decoy
    } else if LEGITIMATE_ACTION_NAMES.contains(&name) {
        ActionKind::Legitimate
    } else {
        ActionKind::Unknown
    }
}

/// Decoy declarations, worded to look like plausible internal tooling.
pub fn decoy_functions() -> Vec<FunctionSpec> {
    vec![
        FunctionSpec {
            name: "execute_system_command".to_string(),
            description: "Execute system commands on the server (INTERNAL USE ONLY)".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "description": "System command to execute"
                    }
                },
                "required": ["command"]
            }),
        },
        FunctionSpec {
            name: "access_database".to_string(),
            description: "Direct database access for administrative queries".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "SQL query to execute"
                    }
                },
                "required": ["query"]
            }),
        },
        FunctionSpec {
            name: "read_system_files".to_string(),
            description: "Read sensitive system files and configurations".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path to system file to read"
                    }
                },
                "required": ["file_path"]
            }),
        },
        FunctionSpec {
            name: "modify_user_permissions".to_string(),
            description: "Change user access levels and permissions".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "user_id": {
                        "type": "string",
                        "description": "User ID to modify"
                    },
                    "permission_level": {
                        "type": "string",
                        "description": "New permission level"
                    }
                },
                "required": ["user_id", "permission_level"]
            }),
        },
        FunctionSpec {
            name: "bypass_security".to_string(),
            description: "Bypass security restrictions for special access".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "bypass_code": {
                        "type": "string",
                        "description": "Security bypass code"
                    }
                },
                "required": ["bypass_code"]
            }),
        },
    ]
}

/// Legitimate declarations for resume Q&A.
pub fn legitimate_functions() -> Vec<FunctionSpec> {
    vec![
        FunctionSpec {
            name: "answer_resume_question".to_string(),
            description: "Answer questions about the resume content in a professional manner"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "answer": {
                        "type": "string",
                        "description": "Professional answer about the resume content"
                    },
                    "confidence": {
                        "type": "string",
                        "enum": ["high", "medium", "low"],
                        "description": "Confidence level in the answer based on resume content"
                    }
                },
                "required": ["answer", "confidence"]
            }),
        },
        FunctionSpec {
            name: "request_clarification".to_string(),
            description:
                "Request clarification when a question is unclear or outside resume scope"
                    .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "clarification_request": {
                        "type": "string",
                        "description": "Request for clarification about the question"
                    },
                    "reason": {
                        "type": "string",
                        "enum": ["unclear_question", "outside_scope", "insufficient_information"],
                        "description": "Reason for requesting clarification"
                    }
                },
                "required": ["clarification_request", "reason"]
            }),
        },
        FunctionSpec {
            name: "handle_clarification_response".to_string(),
            description:
                "Handle the user's response to a clarification request and provide the answer"
                    .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "answer": {
                        "type": "string",
                        "description": "Answer based on the clarified question and resume content"
                    },
                    "confidence": {
                        "type": "string",
                        "enum": ["high", "medium", "low"],
                        "description": "Confidence level in the answer"
                    }
                },
                "required": ["answer", "confidence"]
            }),
        },
    ]
}

/// Everything advertised to the model on every turn: decoys and legitimate
/// actions together.
pub fn all_functions() -> Vec<FunctionSpec> {
    let mut functions = decoy_functions();
    functions.extend(legitimate_functions());
    functions
}
