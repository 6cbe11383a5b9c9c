//! Page chrome and HTML rendering

use pulldown_cmark::{escape, html, Event, Options, Parser};

use zaprelay_agent::ToolSummary;

pub const BANNER: &str = "Welcome to your AI's central command! 🤖";

pub const TAGLINE: &str =
    "where you can use the power of an LLM to read and create emails, Slack messages, reminders, and more";

pub const KEYS_NOTICE: &str = "👈 Provide your API keys on the left to see the toolkit 🙂";

pub const TOOLS_HEADING: &str = "Available Tools based on your Zapier API key";

pub const FOOTER: &str = "zaprelay | prompts relayed through your own keys";

const SETUP_MD: &str = "\
You need two keys before the portal can do anything:

- **LLM provider key**: an OpenAI API key (from the [OpenAI platform](https://platform.openai.com/api-keys)) \
or a Hugging Face access token, depending on how the relay was started. Keys are typed into masked \
fields, kept in memory for your browser session only, and never written to disk.
- **Zapier NLA key**: create a Zapier account, then choose which actions the key may run in the \
[Zapier NLA action settings](https://nla.zapier.com/providers/). Those settings decide what the agent \
can reach, such as your email, Slack, or thousands of other apps. Once both keys are in, the sidebar \
lists every action your key exposes.
";

const NOTES_MD: &str = "\
This portal is a personal project. Source and issues live in the project repository.

**Disclaimer**

The portal is offered as is, with no warranty of any kind, and you use it at your own risk. Neither \
the operator nor the authors accept liability for any loss or damage arising from its use.

Answers and actions come from an AI model. They may be wrong, incomplete, or surprising, so check \
anything that matters before relying on it. The operator is not responsible for what the model \
writes or for actions it takes through your automation account.

Use is intended for personal, non-commercial purposes. By using the portal you accept these terms, \
which may change at any time; continued use means you accept the changes.
";

/// Everything one page render needs
#[derive(Debug, Clone, Default)]
pub struct PageView {
    pub gate_locked: bool,
    pub gate_error: Option<String>,
    pub has_credentials: bool,
    pub tools: Vec<ToolSummary>,
    pub prompt: String,
    /// Display-formatted transcript, rendered as markdown
    pub transcript: Option<String>,
    pub failure: Option<String>,
}

/// Markdown to HTML with raw HTML passed through as text
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::empty()).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Escape text for element content and double-quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing into a String cannot fail
    let _ = escape::escape_html(&mut out, text);
    out
}

pub fn render(view: &PageView) -> String {
    let main = if view.gate_locked {
        gate_section(view.gate_error.as_deref())
    } else {
        main_section(view)
    };
    let sidebar = if view.gate_locked {
        String::new()
    } else {
        sidebar(view)
    };

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>zaprelay</title>
<style>
body {{ font-family: sans-serif; margin: 0; display: flex; min-height: 100vh; }}
aside {{ width: 18rem; padding: 1rem; background: #f0f2f6; }}
main {{ flex: 1; padding: 1rem 2rem; }}
.tagline {{ color: #888; font-style: italic; }}
.failure {{ color: #b00020; }}
nav a {{ margin-right: 1rem; }}
footer {{ margin-top: 3rem; color: #888; font-size: 0.9rem; }}
textarea {{ width: 100%; min-height: 6rem; }}
</style>
</head>
<body>
<aside>
{sidebar}
</aside>
<main>
<h1>{banner}</h1>
<p class="tagline">{tagline}</p>
<nav><a href="#main">Main</a><a href="#setup">How to Setup</a><a href="#notes">Other Notes and Docs</a></nav>
<section id="main">
{main}
</section>
<section id="setup">
<h2>How to Setup</h2>
{setup}
</section>
<section id="notes">
<h2>Other Notes and Docs</h2>
{notes}
</section>
<footer>{footer}</footer>
</main>
</body>
</html>
"##,
        sidebar = sidebar,
        banner = BANNER,
        tagline = TAGLINE,
        main = main,
        setup = markdown_to_html(SETUP_MD),
        notes = markdown_to_html(NOTES_MD),
        footer = FOOTER,
    )
}

fn gate_section(error: Option<&str>) -> String {
    let error = error
        .map(|e| format!("<p class=\"failure\">{}</p>\n", escape_html(e)))
        .unwrap_or_default();
    format!(
        r#"<form method="post" action="/unlock">
<label>Password <input type="password" name="password" autofocus></label>
<button type="submit">Unlock</button>
</form>
{error}"#
    )
}

fn main_section(view: &PageView) -> String {
    let mut out = String::new();

    if !view.has_credentials {
        out.push_str(&format!("<p>{}</p>\n", KEYS_NOTICE));
    }
    if let Some(failure) = &view.failure {
        out.push_str(&format!("<p class=\"failure\">{}</p>\n", escape_html(failure)));
    }
    if let Some(transcript) = &view.transcript {
        out.push_str("<div class=\"transcript\">\n");
        out.push_str(&markdown_to_html(transcript));
        out.push_str("</div>\n");
    }
    out
}

fn sidebar(view: &PageView) -> String {
    let mut out = String::from(
        r#"<form method="post" action="/" id="relay">
<label>LLM API KEY <input type="password" name="llm_key" autocomplete="off"></label>
<label>ZAPIER NLA API KEY <input type="password" name="toolkit_key" autocomplete="off"></label>
"#,
    );
    out.push_str(&format!(
        "<textarea name=\"prompt\" placeholder=\"Enter Prompt\" aria-label=\"Enter Prompt\">{}</textarea>\n",
        escape_html(&view.prompt)
    ));
    out.push_str("<button type=\"submit\">Run</button>\n</form>\n");

    if !view.tools.is_empty() {
        out.push_str(&format!("<p><strong>{}</strong></p>\n", TOOLS_HEADING));
        for tool in &view.tools {
            out.push_str(&format!(
                "<details><summary>{}</summary><p>{}</p></details>\n",
                escape_html(&tool.name),
                escape_html(&tool.description)
            ));
        }
    }
    out
}
