use crate::oauth::ProviderRegistry;

/// Generate the anonymous landing page with one link per enabled provider
#[must_use]
pub fn generate_sign_in_page(registry: &ProviderRegistry) -> String {
    let provider_links = generate_provider_links(registry);
    let body = if provider_links.is_empty() {
        r#"<p class="hint">Sign in with your username and password via <code>POST /login</code>.</p>"#
            .to_string()
    } else {
        format!(
            r#"<p>Choose your authentication provider</p>
            <div class="button-container">
                {provider_links}
            </div>"#
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Sign In</title>
    <style>{}</style>
</head>
<body>
    <div class="container">
        <div class="login-box">
            <h1>Sign In</h1>
            {body}
        </div>
    </div>
</body>
</html>"#,
        get_sign_in_styles()
    )
}

fn generate_provider_links(registry: &ProviderRegistry) -> String {
    registry
        .iter()
        .map(|provider| {
            format!(
                r#"<a href="/auth/{name}" class="login-link provider-{name}">
                    <span>Continue with {display}</span>
                </a>"#,
                name = escape_html(&provider.name),
                display = escape_html(&provider.display_name)
            )
        })
        .collect::<Vec<_>>()
        .join("\n                ")
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const fn get_sign_in_styles() -> &'static str {
    r"
        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
            background: linear-gradient(135deg, #f5f7fa 0%, #c3cfe2 100%);
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            padding: 20px;
        }

        .container { width: 100%; max-width: 400px; }

        .login-box {
            background: white;
            border-radius: 10px;
            box-shadow: 0 14px 28px rgba(0,0,0,0.12), 0 10px 10px rgba(0,0,0,0.08);
            padding: 40px;
        }

        h1 { color: #333; font-size: 28px; text-align: center; margin-bottom: 10px; }

        p { color: #666; text-align: center; margin-bottom: 30px; }

        .button-container { display: flex; flex-direction: column; gap: 15px; }

        .login-link {
            display: flex;
            align-items: center;
            justify-content: center;
            padding: 12px 20px;
            border-radius: 6px;
            text-decoration: none;
            font-weight: 500;
            background: #24292e;
            color: white;
        }

        .provider-google { background: #4285f4; }
        .provider-microsoft { background: #00a4ef; }
    "
}
