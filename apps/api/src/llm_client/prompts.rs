// Cross-cutting prompt fragments shared by every LLM caller.
// Feature-specific prompts live next to the code that uses them.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps generated outreach honest about the candidate.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Only mention skills, projects and experience that appear in the resume text. \
    Do NOT invent employers, numbers or credentials. \
    If a section of the context is empty, write around it instead of guessing.";

/// Joins a role-specific system prompt with the JSON-only rules.
pub fn json_system(role_prompt: &str) -> String {
    format!("{role_prompt}\n\n{JSON_ONLY_SYSTEM}")
}
