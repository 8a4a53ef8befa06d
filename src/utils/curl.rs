use crate::services::header_resolver::has_header;
use crate::services::invocation::InvocationRequest;

/// Equivalent `curl` command for a resolved request. Audit output only; the
/// transport never reads it.
pub fn render_curl(request: &InvocationRequest) -> String {
    let mut parts = vec![
        "curl".to_string(),
        "-X".to_string(),
        request.method.clone(),
        shell_quote(&request.full_url()),
    ];
    for (name, value) in &request.headers {
        parts.push("-H".to_string());
        parts.push(shell_quote(&format!("{}: {}", name, value)));
    }
    if let Some(body) = &request.body {
        if !has_header(&request.headers, "content-type") {
            parts.push("-H".to_string());
            parts.push(shell_quote("Content-Type: application/json"));
        }
        let payload = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
        parts.push("--data".to_string());
        parts.push(shell_quote(&payload));
    }
    parts.join(" ")
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
