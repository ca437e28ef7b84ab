// Prompt text for roadmap generation.
// The JSON-only system prompt lives in llm_client::prompts.

/// Roadmap prompt template.
/// Replace: {background}, {current_role}, {skills}, {goal}, {tech_stack}, {timeline_weeks}
pub const ROADMAP_PROMPT_TEMPLATE: &str = r#"Create a personalized learning roadmap for this learner.

Background: {background}
Current Role: {current_role}
Current Skills: {skills}
Target Role / Goal: {goal}
Tech Stack: {tech_stack}
Timeline: {timeline_weeks} weeks

Generate a structured learning path of 15-20 modules that progresses from beginner
to advanced. Order the modules in the sequence they should be studied.

Return a JSON object with this EXACT schema:
{
  "modules": [
    {
      "title": "SQL Fundamentals",
      "description": "One or two sentences on what the module covers.",
      "content": "A short outline of the material.",
      "difficulty": "beginner",
      "estimated_hours": 6,
      "prerequisites": [],
      "learning_objectives": ["Write SELECT queries with joins"],
      "resources": {"links": ["https://..."]}
    }
  ]
}

Rules:
- "difficulty" is one of "beginner", "intermediate", "advanced".
- "estimated_hours" is a number between 0.5 and 40.
- "prerequisites" lists the 0-based positions or exact titles of EARLIER modules only.
- Tailor examples and analogies to the learner's background."#;

/// Temperature for roadmap generation.
pub const ROADMAP_TEMPERATURE: f32 = 0.7;
