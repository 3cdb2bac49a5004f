/// Resolve the argument vector for one analyzer invocation.
use crate::tool::Tool;

/// Placeholder replaced by the analyzer's space-joined base command.
pub const ANALYZER_CMD_PLACEHOLDER: &str = "{analyzer_cmd}";
/// Placeholder replaced by the target path.
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Build the command for `tool` against `target`.
///
/// A non-empty `template` selects templated mode; an empty one, or a template
/// that renders to nothing, falls back to positional substitution.
pub fn build_command(tool: &Tool, target: &str, template: &str) -> Vec<String> {
    if !template.is_empty() {
        let argv = render_template(tool, target, template);
        if !argv.is_empty() {
            return argv;
        }
    }
    positional(tool, target)
}

fn render_template(tool: &Tool, target: &str, template: &str) -> Vec<String> {
    let analyzer_cmd = tool.command.join(" ");
    template
        .replace(ANALYZER_CMD_PLACEHOLDER, &analyzer_cmd)
        .replace(PATH_PLACEHOLDER, target)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn positional(tool: &Tool, target: &str) -> Vec<String> {
    let mut argv = tool.command.clone();
    if argv.len() <= tool.target_arg {
        argv.resize(tool.target_arg + 1, String::new());
    }
    argv[tool.target_arg] = target.to_string();
    argv
}
