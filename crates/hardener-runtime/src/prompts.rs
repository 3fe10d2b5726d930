//! Instruction text for the generative correction strategy.
//!
//! The instruction is one system message plus one user message. The user
//! message is assembled in a fixed order:
//! 1. Current score and target
//! 2. Prior-attempt context (only after the first correction)
//! 3. Prioritized assessor findings
//! 4. Lint findings
//! 5. Mandatory standards
//! 6. Current artifact text
//! 7. Output directive

use std::fmt::Write as _;

use hardener_core::{Artifact, Finding, PrioritizedFindings};

use crate::providers::ChatMessage;

/// System prompt for the generator.
pub const SYSTEM_PROMPT: &str = r#"
You are an expert API security architect hardening OpenAPI 3.0.3 specifications.

You receive a specification, the findings of a security audit, and a list of
mandatory standards. You return the complete improved specification.

## Output Rules
1. Return ONLY the YAML document - no prose, no explanations
2. Return the WHOLE document, never a fragment or a diff
3. Keep every existing path, operation and schema unless a finding requires a change
4. The result must parse as YAML and keep `openapi` as a 3.x string
"#;

/// Standards every corrected artifact must meet, regardless of findings.
pub const MANDATORY_STANDARDS: &[&str] = &[
    "Use HTTPS-only server URLs",
    "Define both an API key scheme (apiKeyAuth) and an OAuth2 scheme (oauth2Auth) and apply security globally",
    "Declare 400, 401, 403, 429 and 500 responses on every operation, backed by shared Error schemas",
    "Document rate limiting on 429 responses with X-RateLimit-Limit, X-RateLimit-Remaining and X-RateLimit-Reset headers",
    "Give every operation a unique operationId, a description and at least one tag",
    "Include contact information and a license in the info section",
    "Use examples that do not expose credentials, tokens or personal data",
    "Follow the OWASP API Security Top 10",
    "Constrain schemas with formats, patterns, lengths and numeric bounds",
];

/// Everything that goes into one instruction.
#[derive(Debug, Clone, Copy)]
pub struct InstructionInput<'a> {
    pub artifact: &'a Artifact,
    pub findings: &'a PrioritizedFindings,
    pub lint_findings: &'a [Finding],
    pub current_score: u8,
    pub target_score: u8,
    /// Number of corrections already attempted in this session
    pub attempt: u32,
}

fn push_findings(out: &mut String, heading: &str, findings: &[Finding]) {
    if findings.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}:", heading);
    for finding in findings {
        let _ = writeln!(out, "- {}", finding);
    }
    out.push('\n');
}

/// Build the user message.
pub fn build_user_prompt(input: &InstructionInput<'_>) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "CURRENT SECURITY SCORE: {}/100 (Target: {}+)\n",
        input.current_score, input.target_score
    );

    if input.attempt > 0 {
        let _ = writeln!(
            out,
            "PREVIOUS ATTEMPTS: {} correction(s) have already been applied and the target \
             is still not met. Focus on the findings below that remain unresolved.\n",
            input.attempt
        );
    }

    if input.findings.is_empty() {
        out.push_str("SECURITY ISSUES TO ADDRESS: none reported; apply the standards below.\n\n");
    } else {
        out.push_str("SECURITY ISSUES TO ADDRESS:\n\n");
        push_findings(&mut out, "CRITICAL", &input.findings.critical);
        push_findings(&mut out, "HIGH", &input.findings.high);
        push_findings(&mut out, "MEDIUM", &input.findings.medium);
    }

    push_findings(&mut out, "LINT ISSUES", input.lint_findings);

    out.push_str("MANDATORY STANDARDS:\n");
    for standard in MANDATORY_STANDARDS {
        let _ = writeln!(out, "- {}", standard);
    }

    let _ = write!(
        out,
        "\nCURRENT SPECIFICATION:\n```yaml\n{}\n```\n\n",
        input.artifact.text().trim_end()
    );

    out.push_str(
        "OUTPUT: Return ONLY the improved OpenAPI 3.0.3 YAML specification with no additional text.",
    );
    out
}

/// Build the full instruction: system role plus user role.
pub fn build_instruction(input: &InstructionInput<'_>) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT.trim()),
        ChatMessage::user(build_user_prompt(input)),
    ]
}
