//! Fenced code block extraction for generated source files

/// A fenced block found in model output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// First word of the info string, lowercased (`js`, `jsx`, ...)
    pub language: Option<String>,
    pub code: String,
}

/// Opening fence: three or more backticks or tildes, optional info string
fn fence_open(line: &str) -> Option<(String, Option<String>)> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let run = trimmed.chars().take_while(|c| *c == marker).count();
    if run < 3 {
        return None;
    }
    let fence = marker.to_string().repeat(run);
    let info = trimmed[run..].trim();
    let language = info
        .split_whitespace()
        .next()
        .map(|word| word.to_ascii_lowercase());
    Some((fence, language))
}

fn closes(line: &str, fence: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with(fence) && trimmed.chars().all(|c| Some(c) == fence.chars().next())
}

/// All fenced blocks in order. An unterminated fence runs to the end.
pub fn fenced_blocks(text: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<(String, Option<String>, Vec<&str>)> = None;

    for line in text.lines() {
        match current.as_mut() {
            Some((fence, _, lines)) => {
                if closes(line, fence) {
                    if let Some((_, language, lines)) = current.take() {
                        blocks.push(CodeBlock {
                            language,
                            code: lines.join("\n"),
                        });
                    }
                } else {
                    lines.push(line);
                }
            }
            None => {
                if let Some((fence, language)) = fence_open(line) {
                    current = Some((fence, language, Vec::new()));
                }
            }
        }
    }

    if let Some((_, language, lines)) = current {
        blocks.push(CodeBlock {
            language,
            code: lines.join("\n"),
        });
    }

    blocks
}

/// Source code from a model reply.
///
/// With fences present, returns the first block tagged with one of
/// `languages`, else the longest block. Without fences the trimmed reply is
/// returned as is.
pub fn clean_code(text: &str, languages: &[&str]) -> String {
    let blocks = fenced_blocks(text);
    if blocks.is_empty() {
        return text.trim().to_string();
    }

    let preferred = blocks.iter().find(|block| {
        block
            .language
            .as_deref()
            .is_some_and(|lang| languages.contains(&lang))
    });

    preferred
        .or_else(|| blocks.iter().max_by_key(|block| block.code.len()))
        .map(|block| block.code.trim().to_string())
        .unwrap_or_default()
}
