//! Prompt templates for question, flow and bot code generation

/// Clarifying questions for a chatbot idea (answer is a JSON array)
pub const QUESTION_GENERATION_PROMPT: &str = r#"You are helping a user design a chatbot. Read their idea and ask the clarifying questions that matter most for building it.

Chatbot idea:
{prompt}

Additional context:
{context}

Return a JSON array of 3 to 6 objects with this shape:
[
  {"question": "<question text>", "type": "text|email|phone|number|boolean|choice", "priority": <1-5>, "context": "<why this matters>", "choices": ["<only for type choice>"]}
]

Requirements:
1. Return ONLY the JSON array, no markdown, no explanations
2. Priority 5 is most important
3. Keep each question under 200 characters
"#;

/// Conversational flow from answered questions (answer is a JSON object)
pub const FLOW_GENERATION_PROMPT: &str = r#"You design conversational flows for chatbots as node/edge graphs.

Chatbot idea:
{prompt}

Questions and answers:
{answers}

Return a JSON object:
{
  "nodes": [{"id": "<unique>", "type": "start|question|condition|action|end", "data": {"label": "<short label>", "question": "<for question nodes>", "answerType": "text|email|phone|number|boolean|choice"}, "position": {"x": <number>, "y": <number>}}],
  "edges": [{"id": "<unique>", "source": "<node id>", "target": "<node id>", "label": "<optional>"}]
}

Requirements:
1. Exactly one start node and at least one end node
2. Every edge must connect existing node ids
3. Return ONLY the JSON object, no markdown, no explanations
"#;

/// Follow-up questions for bot code generation (answer is a JSON array of strings)
pub const BOT_QUESTIONS_PROMPT: &str = r#"A user wants a chatbot built from this description:
{prompt}

Ask 5 or 6 short follow-up questions that would change how the chatbot is implemented (audience, tone, data to collect, integrations, escalation).

Return ONLY a JSON array of question strings, for example:
["Who will use this chatbot?", "What tone should it use?"]
"#;

/// Express backend for the generated bot
pub const BACKEND_CODE_PROMPT: &str = r#"Write the backend for this chatbot as a single Node.js file using Express.

Chatbot description:
{prompt}

Requirements gathered from the user:
{requirements}

Training material (answer questions from it when relevant):
{training}

The server must:
1. require('express') and expose POST /api/chat accepting {"message": string, "history": array}
2. Answer with {"reply": string}
3. Expose GET /health
4. Read the port from process.env.PORT (default 3001) and call app.listen

Return ONLY the JavaScript code for server.js.
"#;

/// React frontend for the generated bot
pub const FRONTEND_CODE_PROMPT: &str = r#"Write the frontend for this chatbot as a single React component.

Chatbot description:
{prompt}

Requirements gathered from the user:
{requirements}

The component must:
1. import React and useState from 'react'
2. Keep the conversation in state and POST {"message", "history"} to /api/chat
3. Render the replies as a scrolling chat transcript with an input box
4. Be the default export of the file (export default function App)

Return ONLY the JSX code for App.jsx.
"#;

/// System message shared by every generation request
pub const SYSTEM_MESSAGE: &str = "You are an expert chatbot architect and full-stack developer. Follow the requested output format exactly.";

/// Fill `{name}` placeholders in a template
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{}}}", name), value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_every_placeholder() {
        let text = render(QUESTION_GENERATION_PROMPT, &[("prompt", "a quiz bot"), ("context", "none")]);
        assert!(text.contains("a quiz bot"));
        assert!(!text.contains("{prompt}"));
        assert!(!text.contains("{context}"));
    }

    #[test]
    fn test_code_prompts_ask_for_markers() {
        assert!(BACKEND_CODE_PROMPT.contains("app.listen"));
        assert!(FRONTEND_CODE_PROMPT.contains("export default"));
    }
}
