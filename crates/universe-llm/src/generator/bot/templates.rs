//! Fixed files shipped with every generated bot

use serde_json::json;
use std::collections::BTreeMap;

const DEFAULT_SLUG: &str = "universe-chatbot";
const MAX_SLUG_LEN: usize = 40;

/// Package name derived from the first words of the prompt
pub fn bot_slug(prompt: &str) -> String {
    let mut slug = String::new();
    for word in prompt
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .take(5)
    {
        let word = word.to_ascii_lowercase();
        if slug.len() + word.len() + 1 > MAX_SLUG_LEN {
            break;
        }
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(&word);
    }
    if slug.is_empty() {
        DEFAULT_SLUG.to_string()
    } else {
        slug
    }
}

fn pretty(value: serde_json::Value) -> String {
    serde_json::to_string_pretty(&value).unwrap_or_default()
}

/// `package.json` for the frontend (Vite + React)
pub fn frontend_manifest(slug: &str) -> String {
    pretty(json!({
        "name": format!("{}-frontend", slug),
        "private": true,
        "version": "0.1.0",
        "type": "module",
        "scripts": {
            "dev": "vite",
            "build": "vite build",
            "preview": "vite preview"
        },
        "dependencies": {
            "react": "^18.2.0",
            "react-dom": "^18.2.0"
        },
        "devDependencies": {
            "@vitejs/plugin-react": "^4.2.0",
            "vite": "^5.0.0"
        }
    }))
}

/// `package.json` for the Express backend
pub fn backend_manifest(slug: &str) -> String {
    pretty(json!({
        "name": format!("{}-backend", slug),
        "version": "0.1.0",
        "main": "server.js",
        "scripts": {
            "start": "node server.js",
            "dev": "node --watch server.js"
        },
        "dependencies": {
            "cors": "^2.8.5",
            "dotenv": "^16.3.1",
            "express": "^4.18.2"
        }
    }))
}

/// Frontend entry files around the generated `App.jsx`
pub fn frontend_scaffold(slug: &str) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    files.insert("package.json".to_string(), frontend_manifest(slug));
    files.insert(
        "index.html".to_string(),
        format!(
            "<!doctype html>\n<html lang=\"en\">\n  <head>\n    <meta charset=\"UTF-8\" />\n    <title>{}</title>\n  </head>\n  <body>\n    <div id=\"root\"></div>\n    <script type=\"module\" src=\"/src/main.jsx\"></script>\n  </body>\n</html>\n",
            slug
        ),
    );
    files.insert(
        "src/main.jsx".to_string(),
        "import React from 'react';\nimport ReactDOM from 'react-dom/client';\nimport App from './App.jsx';\n\nReactDOM.createRoot(document.getElementById('root')).render(\n  <React.StrictMode>\n    <App />\n  </React.StrictMode>\n);\n".to_string(),
    );
    files.insert(
        "vite.config.js".to_string(),
        "import { defineConfig } from 'vite';\nimport react from '@vitejs/plugin-react';\n\nexport default defineConfig({\n  plugins: [react()],\n  server: { proxy: { '/api': 'http://localhost:3001' } },\n});\n".to_string(),
    );
    files
}

/// Backend files around the generated `server.js`
pub fn backend_scaffold(slug: &str) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    files.insert("package.json".to_string(), backend_manifest(slug));
    files.insert(
        ".env.example".to_string(),
        "PORT=3001\nOPENROUTER_API_KEY=\n".to_string(),
    );
    files
}

/// Docs and deployment files
pub fn config_files(slug: &str, prompt: &str) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    files.insert(
        "README.md".to_string(),
        format!(
            "# {slug}\n\n{prompt}\n\n## Running locally\n\n```bash\ncd backend && npm install && npm start\ncd frontend && npm install && npm run dev\n```\n\nThe frontend proxies `/api` to the backend on port 3001.\n"
        ),
    );
    files.insert(
        "docker-compose.yml".to_string(),
        "services:\n  backend:\n    image: node:20-alpine\n    working_dir: /app\n    volumes:\n      - ./backend:/app\n    command: sh -c \"npm install && npm start\"\n    env_file: ./backend/.env\n    ports:\n      - \"3001:3001\"\n  frontend:\n    image: node:20-alpine\n    working_dir: /app\n    volumes:\n      - ./frontend:/app\n    command: sh -c \"npm install && npm run dev -- --host\"\n    ports:\n      - \"5173:5173\"\n    depends_on:\n      - backend\n".to_string(),
    );
    files.insert(
        ".gitignore".to_string(),
        "node_modules/\ndist/\n.env\n".to_string(),
    );
    files
}
