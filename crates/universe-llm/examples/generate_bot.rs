//! Example: Generate a chatbot with a scripted provider
//!
//! The mock provider answers each stage of the pipeline, and the first
//! model in the chain is overloaded so the fallback model takes over.
//!
//! Run with:
//! ```bash
//! cargo run --example generate_bot
//! ```

use std::sync::Arc;
use std::time::Duration;
use universe_llm::{
    BotGenerator, BotGeneratorConfig, BotRequest, MockProvider, MockReply, ModelChain, RetryPolicy,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== Chatbot Universe Bot Generator Example ===\n");

    let provider = MockProvider::new()
        .script("primary-model", vec![MockReply::Status(503); 3])
        .when_prompt_contains(
            "follow-up questions",
            MockReply::Text(r#"["Who will use the bot?", "What tone should it use?"]"#.into()),
        )
        .when_prompt_contains(
            "Write the backend",
            MockReply::Text(
                "```js\nconst express = require('express');\nconst app = express();\napp.listen(3001);\n```"
                    .into(),
            ),
        )
        .when_prompt_contains(
            "Write the frontend",
            MockReply::Text(
                "```jsx\nimport React, { useState } from 'react';\nexport default function App() { return null; }\n```"
                    .into(),
            ),
        );

    let chain = ModelChain::new(
        Arc::new(provider),
        vec!["primary-model".to_string()],
        vec!["fallback-model".to_string()],
    )
    .with_policy(RetryPolicy::new(3, Duration::from_millis(50)));

    let generator = BotGenerator::new(Some(chain), BotGeneratorConfig::default());
    let outcome = generator
        .run(BotRequest::new("A friendly FAQ assistant for a neighbourhood bakery"))
        .await;

    let bot = outcome.into_result()?;
    println!("Models used: {:?}\n", bot.summary.models_used);
    for path in bot.files.paths() {
        println!("  {}", path);
    }

    Ok(())
}
